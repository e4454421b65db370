// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Precision of the signal.

use super::{CalibContext, CalibrationError, FileParams, Mds1c, Stage};
use crate::sdmf::pet_to_state_id;

/// Photo-electrons per binary unit assumed for the shot noise of channel 8.
const CHAN8_ELECTRON_BU: f64 = 177.0;

/// Error given to pixels without a noise estimate.
const UNKNOWN_ERROR: f32 = 1e10;

/// Channel 8 noise from the dark states measured with exposure times of 0.5
/// and 1 second, plus shot noise. Replaces `pixel_err` (as a standard
/// deviation) of the channel 8 records.
pub(crate) fn sron_noise(
    ctx: &CalibContext,
    params: &FileParams,
    records: &mut [Mds1c],
) -> Result<(), CalibrationError> {
    if !records.iter().any(|r| r.chan_id == 8) {
        return Ok(());
    }
    let db = ctx
        .sdmf
        .ok_or(CalibrationError::MissingDatabase(Stage::Noise))?;
    let orbit = params.abs_orbit;

    let lookup = |pet: f32| -> Result<Option<Vec<f32>>, CalibrationError> {
        let state_id = match pet_to_state_id(orbit, 8, pet) {
            Some(s) => s,
            None => return Ok(None),
        };
        let dark = db.state_dark(state_id, 8, orbit)?;
        Ok(dark.found.then(|| dark.noise.to_vec()))
    };
    let (noise_05, noise_10) = match (lookup(0.5)?, lookup(1.0)?) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(CalibrationError::NoDarkParameters(orbit)),
    };

    for rec in records.iter_mut().filter(|r| r.chan_id == 8) {
        let noise = if rec.pet > 0.75 { &noise_10 } else { &noise_05 };
        let mean_noise: Vec<f32> = rec
            .pixel_ids
            .iter()
            .map(|&p| noise.get(usize::from(p) % noise.len().max(1)).copied().unwrap_or(0.0))
            .collect();
        for (row_val, mut row_err) in rec.pixel_val.rows().into_iter().zip(rec.pixel_err.rows_mut()) {
            for ((e, &sig), &mn) in row_err.iter_mut().zip(row_val.iter()).zip(mean_noise.iter()) {
                *e = if mn > 0.0 {
                    let mut var = f64::from(mn) * f64::from(mn);
                    if sig > 0.0 {
                        var += f64::from(sig) / CHAN8_ELECTRON_BU;
                    }
                    var.sqrt() as f32
                } else {
                    UNKNOWN_ERROR
                };
            }
        }
    }
    Ok(())
}

/// Turn the accumulated variance into a standard deviation.
pub(crate) fn spectral_accuracy(records: &mut [Mds1c]) {
    for rec in records.iter_mut() {
        rec.pixel_err.mapv_inplace(|e| e.max(0.0).sqrt());
    }
}
