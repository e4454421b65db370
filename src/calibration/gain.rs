// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pixel-to-pixel gain and etalon corrections.

use log::info;
use ndarray::{s, Array1};

use super::{
    dark::pixel_values, require, CalibContext, CalibFlags, CalibrationError, FileParams, Mds1c,
    PpgStrategy, Stage,
};
use crate::constants::{CHANNEL_SIZE, SCIENCE_PIXELS};

/// Gains closer to zero than this blank the pixel.
const MIN_PPG: f32 = 1e-3;

/// Divide the signal by the gain of each pixel.
fn apply_ppg(ppg: &Array1<f32>, ppg_error: Option<f32>, records: &mut [Mds1c]) {
    for rec in records.iter_mut() {
        let gain = pixel_values(ppg, rec);
        for (mut row_val, mut row_err) in rec.pixel_val.rows_mut().into_iter().zip(rec.pixel_err.rows_mut()) {
            for ((sig, e), &g) in row_val.iter_mut().zip(row_err.iter_mut()).zip(gain.iter()) {
                if let Some(rel) = ppg_error {
                    let derr = f64::from(rel) * f64::from(*sig);
                    *e += (derr * derr) as f32;
                }
                if g.abs() < MIN_PPG {
                    *sig = 0.0;
                } else {
                    *sig /= g;
                }
            }
        }
    }
}

/// The pixel-to-pixel gain correction.
pub(crate) fn correct_ppg(
    ctx: &CalibContext,
    strategy: PpgStrategy,
    params: &FileParams,
    flags: CalibFlags,
    records: &mut [Mds1c],
) -> Result<(), CalibrationError> {
    let mut ppg = match strategy {
        PpgStrategy::Atbd => require(ctx.keydata.ppg(), "PPG")?.ppg_fact.clone(),
        PpgStrategy::Sron => {
            let sdmf = ctx
                .sdmf_keydata
                .ok_or(CalibrationError::MissingDatabase(Stage::Ppg))?;
            match sdmf.ppg(params.abs_orbit)? {
                Some(p) => p,
                None => {
                    info!("no SDMF PPG data");
                    Array1::ones(SCIENCE_PIXELS)
                }
            }
        }
    };
    if strategy == PpgStrategy::Sron && flags.contains(CalibFlags::FIXED_PPG) && ppg.len() >= SCIENCE_PIXELS {
        ppg.slice_mut(s![7 * CHANNEL_SIZE..SCIENCE_PIXELS]).fill(1.0);
    }
    let ppg_error = flags
        .contains(CalibFlags::CALC_ERROR)
        .then_some(params.ppg_error);
    apply_ppg(&ppg, ppg_error, records);
    Ok(())
}

/// Divide the signal by the etalon factor of each pixel.
pub(crate) fn correct_etalon(ctx: &CalibContext, records: &mut [Mds1c]) -> Result<(), CalibrationError> {
    let etalon = &require(ctx.keydata.ppg(), "PPG")?.etalon_fact;
    for rec in records.iter_mut() {
        let fact = pixel_values(etalon, rec);
        for mut row in rec.pixel_val.rows_mut() {
            for (sig, &f) in row.iter_mut().zip(fact.iter()) {
                *sig /= f;
            }
        }
    }
    Ok(())
}
