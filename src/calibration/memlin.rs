// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Memory-effect (channels 1-5) and non-linearity (channels 6-8)
//! corrections.
//!
//! Records decoded from Level 1b carry the correction computed by the
//! Level-1b processor in encoded form; it is decoded with the scale of the
//! product's [`ScaleVariant`] and subtracted. Records without it (decoded
//! from Level 0) are corrected with the tabulated corrections.

use log::trace;

use super::{CalibrationError, Mds1c, ScaleVariant, Stage};
use crate::{
    constants::FIRST_INFRA_CHAN,
    sdmf::{round_us, MemNlinTables},
};

/// Set-up time \[ms\] of every state, after which the detector is reset.
const SETUP_IT: [f32; 70] = {
    let mut t = [421.875; 70];
    t[15] = 1269.53125;
    t[47] = 1269.53125;
    t[58] = 519.53125;
    t[60] = 1269.53125;
    t[64] = 335.9375;
    t[68] = 519.53125;
    t[69] = 1269.53125;
    t
};

/// Decode one encoded correction value of a channel.
pub(crate) fn decode_correction(scale: ScaleVariant, chan_id: u8, cval: i8) -> f32 {
    let c = f32::from(cval);
    match (scale, chan_id) {
        (ScaleVariant::Old, 1..=5) => 2.0 * c,
        (_, 1..=5) => 1.25 * (c + 37.0),
        (_, 6) => 1.25 * (c + 102.0),
        (_, 7) => 1.5 * (c - 126.0),
        (_, 8) => 1.25 * (c - 126.0),
        _ => 0.0,
    }
}

/// Subtract the encoded correction of every readout.
fn apply_encoded(scale: ScaleVariant, rec: &mut Mds1c) -> Result<(), CalibrationError> {
    let chan_id = rec.chan_id;
    let coaddf = f32::from(rec.coaddf);
    let corr = match rec.encoded_corr.as_ref() {
        Some(c) => c,
        None => return Ok(()),
    };
    if corr.dim() != rec.pixel_val.dim() {
        return Err(rec.bad("encoded correction does not match the readouts"));
    }
    rec.pixel_val.zip_mut_with(corr, |sig, &c| {
        *sig -= coaddf * decode_correction(scale, chan_id, c);
    });
    Ok(())
}

/// Memory correction of one visible record using the tabulated correction
/// of its channel. The correction of each readout depends on the signal of
/// the previous one; the first readout follows the detector reset at the
/// start of the state, limb readouts that start a new scan follow the reset
/// at the end of the previous scan.
pub(crate) fn apply_memory_table(tables: &dyn MemNlinTables, rec: &mut Mds1c) {
    let chan_id = rec.chan_id;
    let coaddf = f32::from(rec.coaddf.max(1));
    let num_obs = rec.num_obs();
    if num_obs == 0 {
        return;
    }
    let table = |v: f32| tables.memory(chan_id, round_us(v));

    let setup = SETUP_IT
        .get(usize::from(rec.state_id.max(1) - 1))
        .copied()
        .unwrap_or(SETUP_IT[0]);
    let scale_reset = setup / (1000.0 * coaddf * rec.pet);
    let mut mem_corr: Vec<f32> = rec
        .pixel_val
        .row(0)
        .iter()
        .map(|&s| table(scale_reset * s))
        .collect();

    let is_limb = rec.source == super::Source::Limb;
    let dark = rec.pixel_val.row(num_obs - 1).to_vec();
    for nobs in 0..num_obs {
        if is_limb && rec.geometry.get(nobs).map(|g| g.new_scan).unwrap_or(false) {
            for ((mc, &sig), &d) in mem_corr
                .iter_mut()
                .zip(rec.pixel_val.row(nobs).iter())
                .zip(dark.iter())
            {
                let mut val = d;
                if sig > d {
                    val += (3.0 / 16.0) * (sig - d);
                }
                *mc = table(val / coaddf);
            }
        }
        for (sig, mc) in rec.pixel_val.row_mut(nobs).iter_mut().zip(mem_corr.iter_mut()) {
            let sign_norm = table(*sig / coaddf);
            *sig -= *mc;
            if coaddf > 1.0 {
                *sig -= (coaddf - 1.0) * sign_norm;
            }
            *mc = sign_norm;
        }
    }
}

/// Non-linearity correction of one infra-red record using the tabulated
/// curve of every pixel.
pub(crate) fn apply_nlin_table(tables: &dyn MemNlinTables, rec: &mut Mds1c) {
    let coaddf = f32::from(rec.coaddf.max(1));
    let curves: Vec<u8> = rec
        .pixel_ids
        .iter()
        .map(|&p| tables.nlin_curve(usize::from(p)))
        .collect();
    for mut row in rec.pixel_val.rows_mut() {
        for (sig, &curve) in row.iter_mut().zip(curves.iter()) {
            *sig -= coaddf * tables.nonlinearity(curve, round_us(*sig / coaddf));
        }
    }
}

fn correct(
    stage: Stage,
    scale: ScaleVariant,
    tables: Option<&dyn MemNlinTables>,
    records: &mut [Mds1c],
    wanted: impl Fn(u8) -> bool,
) -> Result<(), CalibrationError> {
    for rec in records.iter_mut().filter(|r| wanted(r.chan_id)) {
        if rec.encoded_corr.is_some() {
            apply_encoded(scale, rec)?;
            continue;
        }
        let tables = tables.ok_or(CalibrationError::MissingTables(stage))?;
        trace!(
            "{stage} of state {:02} cluster {} from tables",
            rec.state_id,
            rec.clus_id
        );
        if stage == Stage::MemoryCorrection {
            apply_memory_table(tables, rec);
        } else {
            apply_nlin_table(tables, rec);
        }
    }
    Ok(())
}

/// Memory correction of the records of channels 1-5.
pub(crate) fn correct_memory(
    scale: ScaleVariant,
    tables: Option<&dyn MemNlinTables>,
    records: &mut [Mds1c],
) -> Result<(), CalibrationError> {
    correct(Stage::MemoryCorrection, scale, tables, records, |c| {
        c < FIRST_INFRA_CHAN
    })
}

/// Non-linearity correction of the records of channels 6-8.
pub(crate) fn correct_nonlinearity(
    scale: ScaleVariant,
    tables: Option<&dyn MemNlinTables>,
    records: &mut [Mds1c],
) -> Result<(), CalibrationError> {
    correct(Stage::Nonlinearity, scale, tables, records, |c| {
        c >= FIRST_INFRA_CHAN
    })
}
