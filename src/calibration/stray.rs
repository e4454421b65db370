// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{CalibrationError, Mds1c};

/// Subtract the straylight estimated by the Level-1b processor. The encoded
/// values are scaled by a tenth of the channel's scale factor. A straylight
/// error above `f32::EPSILON` adds the error of the correction to the
/// variance.
pub(crate) fn correct_stray(stray_error: f32, records: &mut [Mds1c]) -> Result<(), CalibrationError> {
    for rec in records.iter_mut() {
        let scale = f32::from(rec.stray_scale) / 10.0;
        let stray = match rec.stray.as_ref() {
            Some(s) => s,
            None => continue,
        };
        if stray.dim() != rec.pixel_val.dim() {
            return Err(rec.bad("straylight does not match the readouts"));
        }
        rec.pixel_val
            .zip_mut_with(stray, |sig, &st| *sig -= scale * f32::from(st));
        if stray_error > f32::EPSILON {
            rec.pixel_err.zip_mut_with(stray, |e, &st| {
                let e_stray = f64::from(stray_error) * f64::from(scale) * f64::from(st);
                *e += (e_stray * e_stray) as f32;
            });
        }
    }
    Ok(())
}
