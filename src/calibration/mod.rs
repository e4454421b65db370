// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calibration of Level-1c spectral records.
//!
//! [`calibrate_state`] applies the stages selected by a [`CalibFlags`] mask
//! to the records of one state, always in the same order:
//!
//! 1. memory correction (channels 1-5)
//! 2. non-linearity correction (channels 6-8)
//! 3. dark correction (state, SRON or ATBD)
//! 4. SRON noise (channel 8)
//! 5. pixel-to-pixel gain (SRON or ATBD)
//! 6. etalon
//! 7. straylight
//! 8. spectral accuracy, unless the SRON noise ran
//! 9. wavelength grid
//! 10. polarisation
//! 11. radiance
//! 12. reflectance (SRON or ATBD)
//! 13. dead/bad pixel mask (SRON or ATBD)
//! 14. transmission (SRON)
//!
//! Records are changed in place. An error stops the remaining stages but does
//! not undo the ones already applied.

mod bdpm;
mod dark;
mod error;
mod flags;
mod gain;
mod interp;
mod keydata;
mod memlin;
mod noise;
mod params;
mod radiometry;
mod records;
mod refl;
mod stray;
#[cfg(test)]
mod tests;
mod trans;
mod wave;

pub use bdpm::FIRST_VALID_SDMF_BDPM;
pub use error::CalibrationError;
pub use flags::{CalibFlags, FLAG_NAMES};
pub use keydata::*;
pub use params::*;
pub use records::*;
pub use wave::{WaveGrid, NUM_SPEC_COEFFS};

pub(crate) use keydata::require;

use log::{debug, trace};
use strum_macros::{Display, EnumIter};

use crate::{
    config::Config,
    sdmf::{DarkDatabase, MemNlinTables},
};

/// A calibration stage.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    #[strum(serialize = "memory correction")]
    MemoryCorrection,

    #[strum(serialize = "non-linearity correction")]
    Nonlinearity,

    #[strum(serialize = "dark correction")]
    Dark,

    #[strum(serialize = "SRON noise")]
    Noise,

    #[strum(serialize = "PPG correction")]
    Ppg,

    #[strum(serialize = "etalon correction")]
    Etalon,

    #[strum(serialize = "straylight correction")]
    Straylight,

    #[strum(serialize = "spectral accuracy")]
    Accuracy,

    #[strum(serialize = "wavelength calibration")]
    Wavelength,

    #[strum(serialize = "polarisation correction")]
    Polarisation,

    #[strum(serialize = "radiance correction")]
    Radiance,

    #[strum(serialize = "reflectance")]
    Reflectance,

    #[strum(serialize = "bad pixel mask")]
    BadPixelMask,

    #[strum(serialize = "transmission correction")]
    Transmission,
}

/// Which dark correction to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DarkStrategy {
    /// Subtract the average of the dark states (DARK_AVERAGE or SDMF).
    State,
    /// Fitted dark parameters of the SDMF.
    Sron,
    /// Fitted dark parameters of the product's CLCP/VLCP.
    Atbd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpgStrategy {
    Sron,
    Atbd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflStrategy {
    Sron,
    Atbd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BdpmStrategy {
    Sron,
    Atbd,
}

/// The stages selected by a calibration mask, with the variant of every
/// stage that has more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline {
    pub flags: CalibFlags,
    pub dark: DarkStrategy,
    pub ppg: PpgStrategy,
    pub refl: ReflStrategy,
    pub bdpm: BdpmStrategy,
}

impl Pipeline {
    pub fn from_flags(flags: CalibFlags) -> Pipeline {
        let dark = if flags.contains(CalibFlags::ADARK) {
            DarkStrategy::State
        } else if flags.contains(CalibFlags::SRON_DARK) {
            DarkStrategy::Sron
        } else {
            DarkStrategy::Atbd
        };
        let sron = |bit| flags.contains(bit);
        Pipeline {
            flags,
            dark,
            ppg: if sron(CalibFlags::SRON_PPG) {
                PpgStrategy::Sron
            } else {
                PpgStrategy::Atbd
            },
            refl: if sron(CalibFlags::SRON_SUN) {
                ReflStrategy::Sron
            } else {
                ReflStrategy::Atbd
            },
            bdpm: if sron(CalibFlags::SRON_BDPM) {
                BdpmStrategy::Sron
            } else {
                BdpmStrategy::Atbd
            },
        }
    }

    /// The stages that run, in the order they run.
    pub fn stages(&self) -> Vec<Stage> {
        let f = self.flags;
        let mut stages = vec![];
        let mut add = |cond: bool, stage| {
            if cond {
                stages.push(stage)
            }
        };
        add(f.contains(CalibFlags::VIS_MEM), Stage::MemoryCorrection);
        add(f.contains(CalibFlags::IR_NLIN), Stage::Nonlinearity);
        add(f.intersects(CalibFlags::ANY_DARK), Stage::Dark);
        add(f.contains(CalibFlags::SRON_NOISE), Stage::Noise);
        add(f.contains(CalibFlags::CORR_PPG), Stage::Ppg);
        add(f.contains(CalibFlags::ETALON), Stage::Etalon);
        add(f.contains(CalibFlags::STRAY), Stage::Straylight);
        add(
            !f.contains(CalibFlags::SRON_NOISE) && f.contains(CalibFlags::CALC_ERROR),
            Stage::Accuracy,
        );
        add(f.contains(CalibFlags::CALIB_WAVE), Stage::Wavelength);
        add(f.contains(CalibFlags::POL), Stage::Polarisation);
        add(f.contains(CalibFlags::RAD), Stage::Radiance);
        add(f.contains(CalibFlags::DIVIDE_SUN), Stage::Reflectance);
        add(f.contains(CalibFlags::MASK_BDPM), Stage::BadPixelMask);
        add(f.contains(CalibFlags::SRON_TRANS), Stage::Transmission);
        stages
    }
}

/// Everything the stages read but never change.
#[derive(Clone, Copy)]
pub struct CalibContext<'a> {
    pub config: &'a Config,
    pub keydata: &'a dyn KeyData,
    /// Needed by the SRON and SDMF state dark corrections and the SRON noise.
    pub sdmf: Option<&'a dyn DarkDatabase>,
    /// Needed by the SRON PPG, reflectance, BDPM and transmission stages.
    pub sdmf_keydata: Option<&'a dyn SdmfKeyData>,
    /// Needed by the memory and non-linearity corrections of records
    /// without an encoded correction.
    pub tables: Option<&'a dyn MemNlinTables>,
}

/// Calibrate the records of one state of the product described by `header`.
pub fn calibrate_state(
    ctx: &CalibContext,
    params: &mut FileParams,
    header: &ProductHeader,
    flags: CalibFlags,
    state: &StateInfo,
    records: &mut [Mds1c],
) -> Result<(), CalibrationError> {
    if flags.is_empty() {
        return Ok(());
    }
    params.init(header, flags, ctx.config.sdmf_version, ctx.keydata)?;
    let params: &FileParams = params;

    if flags.contains(CalibFlags::RAD) {
        for rec in records.iter_mut() {
            rec.rad_units = -1;
        }
    }

    let wave = if flags.intersects(CalibFlags::NEEDS_WAVE) {
        let grid = WaveGrid::new(ctx.keydata, state.orbit_phase).map_err(|err| {
            CalibrationError::Stage {
                stage: Stage::Wavelength,
                err: Box::new(err),
            }
        })?;
        Some(grid)
    } else {
        None
    };

    let pipeline = Pipeline::from_flags(flags);
    debug!(
        "calibrating state {:02} ({} clusters) with flags {flags}",
        state.state_id,
        records.len()
    );
    for stage in pipeline.stages() {
        trace!("{stage} of state {:02}", state.state_id);
        let result = match stage {
            Stage::MemoryCorrection => {
                memlin::correct_memory(params.mem_scale, ctx.tables, records)
            }
            Stage::Nonlinearity => {
                memlin::correct_nonlinearity(params.nlin_scale, ctx.tables, records)
            }
            Stage::Dark => match pipeline.dark {
                DarkStrategy::State => dark::correct_state(ctx, params, flags, records),
                DarkStrategy::Sron => match ctx.sdmf {
                    Some(db) => dark::correct_sron(ctx, db, params, flags, state, records),
                    None => Err(CalibrationError::MissingDatabase(Stage::Dark)),
                },
                DarkStrategy::Atbd => dark::correct_atbd(ctx, params, flags, state, records),
            },
            Stage::Noise => noise::sron_noise(ctx, params, records),
            Stage::Ppg => gain::correct_ppg(ctx, pipeline.ppg, params, flags, records),
            Stage::Etalon => gain::correct_etalon(ctx, records),
            Stage::Straylight => stray::correct_stray(params.stray_error, records),
            Stage::Accuracy => {
                noise::spectral_accuracy(records);
                Ok(())
            }
            Stage::Wavelength => {
                if let Some(grid) = &wave {
                    grid.apply(records);
                }
                Ok(())
            }
            Stage::Polarisation => radiometry::correct_polarisation(ctx.keydata, params, records),
            Stage::Radiance => radiometry::correct_radiance(ctx.keydata, params, records),
            Stage::Reflectance => refl::correct_reflectance(ctx, pipeline.refl, params, records),
            Stage::BadPixelMask => bdpm::flag_bad_pixels(ctx, pipeline.bdpm, params, records),
            Stage::Transmission => trans::correct_transmission(ctx, params, records),
        };
        result.map_err(|err| match err {
            e @ CalibrationError::Stage { .. } => e,
            err => CalibrationError::Stage {
                stage,
                err: Box::new(err),
            },
        })?;
    }
    Ok(())
}
