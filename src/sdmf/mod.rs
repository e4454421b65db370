// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Lookups in the SDMF calibration databases.
//!
//! Three generations of the database exist. Version 2.4 is a directory of
//! flat binary files indexed by `MonitorList.dat`; versions 3.0 and 3.1 are
//! HDF5 files with an orbit-indexed `metaTable` per group. All of them are
//! reached through [`DarkDatabase`]; [`open_database`] picks the adapter that
//! matches the configured [`SdmfVersion`].
//!
//! A lookup that finds nothing is not an error. The returned record has
//! `found == false` and zeroed arrays.

mod average;
mod clusconf;
mod error;
#[cfg(feature = "hdf5")]
mod h5;
mod memory;
mod phase;
mod search;
mod tables;
mod v24;
#[cfg(feature = "hdf5")]
mod v30;
#[cfg(feature = "hdf5")]
mod v31;

pub use average::{is_twilight, skip_readout, SAA_CHANNEL_LIMIT, TWILIGHT_PHASE, UNDETERMINED_NOISE};
pub use clusconf::{pet_to_state_id, state_count, state_pet, DARK_STATES};
pub use error::SdmfError;
pub use memory::{FittedRecord, MemoryDarkDb, StateReadout};
pub use phase::{ConstantPhaseDiff, OrbitPhaseCorrection, DEFAULT_ORBIT_PHASE_DIFF};
pub use search::{GOOD_QUALITY, MAX_FITTED_ORBIT_DISTANCE, MIN_QUALITY, STATE_ORBIT_RADIUS};
pub use tables::{round_us, CorrectionTables, MemNlinTables};
pub use v24::Sdmf24Db;
#[cfg(feature = "hdf5")]
pub use v30::Sdmf30Db;
#[cfg(feature = "hdf5")]
pub use v31::Sdmf31Db;

use std::ops::Range;
use std::sync::Arc;

use ndarray::Array1;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    config::Config,
    constants::{CHANNEL_SIZE, SCIENCE_CHANNELS, SCIENCE_PIXELS},
};

/// The generations of the SDMF database.
#[derive(Debug, Display, EnumIter, EnumString, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SdmfVersion {
    #[strum(serialize = "2.4")]
    V24,

    #[default]
    #[strum(serialize = "3.0")]
    V30,

    #[strum(serialize = "3.1")]
    V31,
}

impl SdmfVersion {
    /// Interpret the value of `USE_SDMF_VERSION`. Only the first three
    /// characters are significant, so "2.4.1" selects version 2.4. An unset
    /// variable selects version 3.0.
    pub fn from_env_value(value: Option<&str>) -> Result<SdmfVersion, SdmfError> {
        let value = match value {
            None => return Ok(SdmfVersion::default()),
            Some(v) => v,
        };
        match value.get(..3) {
            Some("2.4") => Ok(SdmfVersion::V24),
            Some("3.0") => Ok(SdmfVersion::V30),
            Some("3.1") => Ok(SdmfVersion::V31),
            _ => Err(SdmfError::InvalidVersion(value.to_string())),
        }
    }
}

/// Number of pixels of a lookup for `channel`; 0 means all channels.
pub fn pixel_count(channel: u8) -> usize {
    if channel == 0 {
        SCIENCE_PIXELS
    } else {
        CHANNEL_SIZE
    }
}

/// The absolute pixel range of `channel`; 0 means all channels.
pub fn pixel_range(channel: u8) -> Result<Range<usize>, SdmfError> {
    match channel {
        0 => Ok(0..SCIENCE_PIXELS),
        c if usize::from(c) <= SCIENCE_CHANNELS => {
            let start = usize::from(c - 1) * CHANNEL_SIZE;
            Ok(start..start + CHANNEL_SIZE)
        }
        c => Err(SdmfError::InvalidChannel(c)),
    }
}

/// Analog offset and leakage current fitted from the dark states of one
/// orbit.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedDark {
    pub found: bool,
    /// The orbit the record was taken from.
    pub orbit: Option<i32>,
    pub quality: Option<i32>,
    /// 0 for all channels.
    pub channel: u8,
    pub analog_offset: Array1<f32>,
    pub dark_current: Array1<f32>,
    pub analog_offset_error: Array1<f32>,
    pub dark_current_error: Array1<f32>,
    /// Only provided by version 3.1.
    pub mean_noise: Array1<f32>,
    pub chi_square: Array1<f32>,
    /// Only provided by version 3.1.
    pub probability: Array1<f32>,
}

impl FittedDark {
    pub fn not_found(channel: u8) -> FittedDark {
        let n = pixel_count(channel);
        FittedDark {
            found: false,
            orbit: None,
            quality: None,
            channel,
            analog_offset: Array1::zeros(n),
            dark_current: Array1::zeros(n),
            analog_offset_error: Array1::zeros(n),
            dark_current_error: Array1::zeros(n),
            mean_noise: Array1::zeros(n),
            chi_square: Array1::zeros(n),
            probability: Array1::zeros(n),
        }
    }
}

/// The average dark signal of one instrument state.
#[derive(Debug, Clone, PartialEq)]
pub struct StateDark {
    pub found: bool,
    pub orbit: Option<i32>,
    pub state_id: u8,
    /// 0 for all channels.
    pub channel: u8,
    /// Pixel exposure time per channel \[s\]. For a single-channel lookup only
    /// the entry of that channel is set.
    pub pet: [f32; SCIENCE_CHANNELS],
    /// Dark signal \[BU\], memory and non-linearity corrected.
    pub signal: Array1<f32>,
    /// Dark noise \[BU\]; [`UNDETERMINED_NOISE`] where no readout contributed.
    pub noise: Array1<f32>,
}

impl StateDark {
    pub fn not_found(state_id: u8, channel: u8) -> StateDark {
        let n = pixel_count(channel);
        StateDark {
            found: false,
            orbit: None,
            state_id,
            channel,
            pet: [0.0; SCIENCE_CHANNELS],
            signal: Array1::zeros(n),
            noise: Array1::zeros(n),
        }
    }
}

/// A versioned source of dark-current calibration data.
pub trait DarkDatabase {
    fn version(&self) -> SdmfVersion;

    /// The fitted analog offset and leakage current for `channel` (0 for all
    /// channels) nearest to `orbit`.
    fn resolve(&self, channel: u8, orbit: i32) -> Result<FittedDark, SdmfError>;

    /// The average dark signal of state `state_id` nearest to `orbit`.
    fn state_dark(&self, state_id: u8, channel: u8, orbit: i32) -> Result<StateDark, SdmfError>;

    /// Channel 8 analog offset and leakage current, including the variation
    /// of the leakage current along the orbit.
    fn orbital_dark(&self, orbit: i32, orbit_phase: f32) -> Result<FittedDark, SdmfError>;
}

/// Open the database selected by `config`. Versions 3.0 and 3.1 remove the
/// memory and non-linearity correction from state darks, so they need
/// `tables`; when none are given they are read from the files named in the
/// configuration.
pub fn open_database(
    config: &Config,
    tables: Option<Arc<dyn MemNlinTables>>,
) -> Result<Box<dyn DarkDatabase>, SdmfError> {
    match config.sdmf_version {
        SdmfVersion::V24 => Ok(Box::new(Sdmf24Db::new(
            config.sdmf24_path.clone(),
            config.sdmf24_select,
            Box::new(ConstantPhaseDiff::default()),
        ))),
        #[cfg(feature = "hdf5")]
        SdmfVersion::V30 => {
            let tables = match tables {
                Some(t) => t,
                None => Arc::new(CorrectionTables::from_hdf5(
                    &config.memcorr_path,
                    &config.nlcorr_path,
                )?),
            };
            Ok(Box::new(Sdmf30Db::new(config.sdmf30_path.clone(), tables)))
        }
        #[cfg(feature = "hdf5")]
        SdmfVersion::V31 => {
            drop(tables);
            Ok(Box::new(Sdmf31Db::new(config.sdmf31_path.clone())))
        }
        #[cfg(not(feature = "hdf5"))]
        v => {
            drop(tables);
            Err(SdmfError::NoHdf5(v))
        }
    }
}

/// The selection read from `SDMF24_SELECT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sdmf24Select {
    /// Only use records derived from near-real-time products.
    pub nrt: bool,
    /// Only use records derived from consolidated products.
    pub consolidated: bool,
    /// Average state darks with the alternative NaN and quality handling of
    /// the "mimic Hans Schrijver" monitoring path.
    pub mimic_hanss: bool,
}

impl Sdmf24Select {
    pub fn from_env_value(value: Option<&str>) -> Sdmf24Select {
        match value {
            None => Sdmf24Select::default(),
            Some(v) => Sdmf24Select {
                nrt: v.contains("NRT"),
                consolidated: v.contains("CONS"),
                mimic_hanss: v.contains("HANS"),
            },
        }
    }
}

/// The databases store channel 2 in detector pixel order, which is reversed
/// with respect to the Level 1b products. Undo that on data
/// covering all channels.
pub fn inverse_chan2(data: &mut [f32]) {
    if let Some(chan2) = data.get_mut(CHANNEL_SIZE..2 * CHANNEL_SIZE) {
        chan2.reverse();
    }
}
