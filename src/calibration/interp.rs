// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Interpolation helpers.

/// Linear interpolation between `(x1, y1)` and `(x2, y2)`. Coinciding
/// abscissae give `y1`.
pub(crate) fn linear(x: f64, x1: f64, x2: f64, y1: f64, y2: f64) -> f64 {
    if x1 == x2 {
        y1
    } else {
        y1 + (x - x1) * (y2 - y1) / (x2 - x1)
    }
}

/// Akima spline through the points `(xa, ya)`, evaluated at `x`.
///
/// `xa` must be monotonic; descending grids are handled by reversing them.
/// Points outside the grid are extrapolated with the polynomial of the
/// nearest interval. Fewer than two points give NaN.
pub(crate) fn akima(xa: &[f64], ya: &[f64], x: &[f64]) -> Vec<f64> {
    let n = xa.len().min(ya.len());
    if n < 2 {
        return vec![f64::NAN; x.len()];
    }
    let (xa, ya): (Vec<f64>, Vec<f64>) = if xa[0] > xa[n - 1] {
        (
            xa[..n].iter().rev().copied().collect(),
            ya[..n].iter().rev().copied().collect(),
        )
    } else {
        (xa[..n].to_vec(), ya[..n].to_vec())
    };

    // Slopes of the intervals, with two extra on either side.
    let mut m = vec![0.0; n + 3];
    for i in 0..n - 1 {
        let dx = xa[i + 1] - xa[i];
        m[i + 2] = if dx == 0.0 { 0.0 } else { (ya[i + 1] - ya[i]) / dx };
    }
    if n == 2 {
        m[1] = m[2];
        m[0] = m[2];
        m[3] = m[2];
        m[4] = m[2];
    } else {
        m[1] = 2.0 * m[2] - m[3];
        m[0] = 2.0 * m[1] - m[2];
        m[n + 1] = 2.0 * m[n] - m[n - 1];
        m[n + 2] = 2.0 * m[n + 1] - m[n];
    }

    // Derivative at every grid point.
    let t: Vec<f64> = (0..n)
        .map(|i| {
            let w1 = (m[i + 3] - m[i + 2]).abs();
            let w2 = (m[i + 1] - m[i]).abs();
            if w1 + w2 == 0.0 {
                0.5 * (m[i + 1] + m[i + 2])
            } else {
                (w1 * m[i + 1] + w2 * m[i + 2]) / (w1 + w2)
            }
        })
        .collect();

    x.iter()
        .map(|&xv| {
            let i = match xa.partition_point(|&v| v <= xv) {
                0 => 0,
                p => (p - 1).min(n - 2),
            };
            let h = xa[i + 1] - xa[i];
            if h == 0.0 {
                return ya[i];
            }
            let slope = m[i + 2];
            let c = (3.0 * slope - 2.0 * t[i] - t[i + 1]) / h;
            let d = (t[i] + t[i + 1] - 2.0 * slope) / (h * h);
            let dx = xv - xa[i];
            ya[i] + dx * (t[i] + dx * (c + dx * d))
        })
        .collect()
}

/// Evaluate the polynomial with `coeffs` (lowest order first) at `x`.
pub(crate) fn poly(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// First of the two consecutive records to interpolate between in a table
/// sorted by decreasing mirror angle: the one before the first record with
/// an angle at or below `x`, clamped to the table.
pub(crate) fn angle_record(angles: impl Iterator<Item = f32>, x: f64) -> usize {
    let mut count = 0;
    for (i, a) in angles.enumerate() {
        if x >= f64::from(a) {
            return i.saturating_sub(1);
        }
        count = i + 1;
    }
    count.saturating_sub(2)
}
