// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use log::info;

use super::{require, BdpmStrategy, CalibContext, CalibrationError, FileParams, Mds1c, Stage};

/// The first orbit with an SDMF dead/bad pixel mask.
pub const FIRST_VALID_SDMF_BDPM: i32 = 3899;

/// Set every readout of a dead or bad pixel to NaN.
fn apply_mask(mask: &[u8], records: &mut [Mds1c]) {
    for rec in records.iter_mut() {
        let bad: Vec<bool> = rec
            .pixel_ids
            .iter()
            .map(|&p| mask.get(usize::from(p)).map_or(false, |&m| m != 0))
            .collect();
        for mut row in rec.pixel_val.rows_mut() {
            row.iter_mut()
                .zip(bad.iter())
                .filter(|(_, &b)| b)
                .for_each(|(sig, _)| *sig = f32::NAN);
        }
    }
}

/// Flag dead and bad pixels. The SRON variant uses the SDMF mask of the
/// orbit (never one older than [`FIRST_VALID_SDMF_BDPM`]) and falls back to
/// the mask of the product's PPG data set.
pub(crate) fn flag_bad_pixels(
    ctx: &CalibContext,
    strategy: BdpmStrategy,
    params: &FileParams,
    records: &mut [Mds1c],
) -> Result<(), CalibrationError> {
    let sdmf_mask = match strategy {
        BdpmStrategy::Atbd => None,
        BdpmStrategy::Sron => {
            let sdmf = ctx
                .sdmf_keydata
                .ok_or(CalibrationError::MissingDatabase(Stage::BadPixelMask))?;
            let mask = sdmf.bdpm(params.abs_orbit.max(FIRST_VALID_SDMF_BDPM))?;
            if mask.is_none() {
                info!("no SDMF BDPM for orbit {}, using the product mask", params.abs_orbit);
            }
            mask
        }
    };
    match sdmf_mask {
        Some(mask) => apply_mask(&mask, records),
        None => apply_mask(&require(ctx.keydata.ppg(), "PPG")?.bad_pixel, records),
    }
    Ok(())
}
