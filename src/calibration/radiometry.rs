// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Polarisation and radiance sensitivity corrections of nadir states.
//!
//! Both sensitivities are tabulated against the angle of the elevation scan
//! mirror (ESM) and interpolated linearly between the two records around
//! the angle of each readout. Limb, occultation and monitor states are left
//! alone.

use log::debug;
use ndarray::Array1;

use super::{
    dark::corrected_intg, interp::angle_record, CalibrationError, FileParams, KeyData, Mds1c,
    Source,
};

/// The ESM angle of a nadir readout \[deg\].
fn esm_angle(params: &FileParams, esm_pos: f32) -> f64 {
    f64::from(params.alpha0_esm - 360.0) + 0.5 * f64::from(esm_pos)
}

/// Interpolate pixel `id` of `values` between the records around `angle`.
fn interpolate<'a, T: 'a>(
    table: &'a [T],
    angle: f64,
    ang_esm: impl Fn(&T) -> f32,
    values: impl Fn(&'a T) -> &'a Array1<f32>,
    id: usize,
) -> f64 {
    let nr = angle_record(table.iter().map(&ang_esm), angle);
    let lo = &table[nr];
    let hi = table.get(nr + 1).unwrap_or(lo);
    let value = |t: &'a T| values(t).get(id).copied().map(f64::from).unwrap_or(f64::NAN);
    let (a1, a2) = (f64::from(ang_esm(lo)), f64::from(ang_esm(hi)));
    let frac = if a1 == a2 { 0.0 } else { (angle - a1) / (a2 - a1) };
    (1.0 - frac) * value(lo) + frac * value(hi)
}

/// Divide the nadir signal by the polarisation sensitivity of the
/// instrument to the fractional polarisation of the scene.
pub(crate) fn correct_polarisation(
    keydata: &dyn KeyData,
    params: &FileParams,
    records: &mut [Mds1c],
) -> Result<(), CalibrationError> {
    let pspn = keydata.pspn();
    for rec in records.iter_mut() {
        if rec.source != Source::Nadir {
            continue;
        }
        if pspn.is_empty() {
            return Err(CalibrationError::MissingKeyData("PSPN"));
        }
        let pol = match rec.polarisation.as_ref() {
            Some(p) => p,
            None => {
                debug!(
                    "no polarisation values for state {:02} cluster {}",
                    rec.state_id, rec.clus_id
                );
                continue;
            }
        };
        for (nobs, mut row) in rec.pixel_val.rows_mut().into_iter().enumerate() {
            let geo = rec.geometry.get(nobs).copied().unwrap_or_default();
            let angle = esm_angle(params, geo.esm_pos);
            for (np, sig) in row.iter_mut().enumerate() {
                let id = usize::from(rec.pixel_ids[np]);
                let mu2 = interpolate(pspn, angle, |p| p.ang_esm, |p| &p.mu2, id);
                let mu3 = interpolate(pspn, angle, |p| p.ang_esm, |p| &p.mu3, id);
                let q = pol.q.get((nobs, np)).copied().map(f64::from).unwrap_or(0.0);
                let u = pol.u.get((nobs, np)).copied().map(f64::from).unwrap_or(0.0);
                *sig /= (1.0 + mu2 * q + mu3 * u) as f32;
            }
        }
    }
    Ok(())
}

/// Convert the nadir signal to radiance: divide by the exposure time and by
/// the radiance sensitivity.
pub(crate) fn correct_radiance(
    keydata: &dyn KeyData,
    params: &FileParams,
    records: &mut [Mds1c],
) -> Result<(), CalibrationError> {
    let rspn = keydata.rspn();
    for rec in records.iter_mut() {
        if rec.source != Source::Nadir {
            continue;
        }
        if rspn.is_empty() {
            return Err(CalibrationError::MissingKeyData("RSPN"));
        }
        let intg = f64::from(corrected_intg(rec));
        for (nobs, mut row) in rec.pixel_val.rows_mut().into_iter().enumerate() {
            let geo = rec.geometry.get(nobs).copied().unwrap_or_default();
            let angle = esm_angle(params, geo.esm_pos);
            for (np, sig) in row.iter_mut().enumerate() {
                let id = usize::from(rec.pixel_ids[np]);
                let sens = interpolate(rspn, angle, |r| r.ang_esm, |r| &r.sensitivity, id);
                *sig = ((f64::from(*sig) / intg) / sens) as f32;
            }
        }
    }
    Ok(())
}
