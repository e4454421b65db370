// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Transmission correction of channel 8.

use std::ops::RangeInclusive;

use log::{debug, info};

use super::{CalibContext, CalibrationError, FileParams, Mds1c, Stage};

/// The median of the transmission over `range`: NaNs are replaced by 1 and
/// 0 in turn, then the `(n + 1) / 2`-th smallest value is taken.
pub(crate) fn transmission_average(trans: &[f32], range: RangeInclusive<usize>) -> Option<f32> {
    let mut values = trans.get(range)?.to_vec();
    if values.is_empty() {
        return None;
    }
    let mut new_val = 1.0;
    for v in values.iter_mut().filter(|v| v.is_nan()) {
        *v = new_val;
        new_val = if new_val == 1.0 { 0.0 } else { 1.0 };
    }
    let k = (values.len() + 1) / 2;
    let (_, kth, _) = values.select_nth_unstable_by(k - 1, f32::total_cmp);
    Some(*kth)
}

/// Divide all records by the average SDMF transmission of channel 8.
pub(crate) fn correct_transmission(
    ctx: &CalibContext,
    params: &FileParams,
    records: &mut [Mds1c],
) -> Result<(), CalibrationError> {
    let sdmf = ctx
        .sdmf_keydata
        .ok_or(CalibrationError::MissingDatabase(Stage::Transmission))?;
    let trans = match sdmf.transmission(params.abs_orbit, 8)? {
        Some(t) => t,
        None => {
            info!("no SDMF Transmission data");
            return Ok(());
        }
    };
    let range = ctx.config.trans_range.clone();
    let avg = match trans
        .as_slice()
        .and_then(|t| transmission_average(t, range.clone()))
    {
        Some(a) => a,
        None => return Err(CalibrationError::IncompleteKeyData("SDMF Transmission")),
    };
    debug!(
        "transmission average over pixels {}-{}: {avg:.6}",
        range.start(),
        range.end()
    );
    for rec in records.iter_mut() {
        rec.pixel_val.mapv_inplace(|sig| sig / avg);
    }
    Ok(())
}
