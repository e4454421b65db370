// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calibration key data.
//!
//! [`KeyData`] provides the annotation and global data sets of a Level-1b
//! product; [`SdmfKeyData`] the monitoring products of the SDMF (PPG, bad
//! pixel mask, transmission and solar spectrum). Reading them from the
//! product files is the caller's business; [`MemoryKeyData`] and
//! [`MemorySdmfKeyData`] hold them once read.

use std::collections::BTreeMap;

use ndarray::Array1;

use super::{CalibrationError, Source};
use crate::constants::{IR_CHANNELS, SCIENCE_CHANNELS};

/// Which observations get a per-channel variable correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelScope {
    #[default]
    None,
    Limb,
    All,
}

impl ChannelScope {
    /// Decode one 4-character entry of the SIP `do_var_lc_cha` and
    /// `do_stray_lc_cha` strings.
    pub fn from_code(code: &str) -> ChannelScope {
        if code.starts_with("ALL") {
            ChannelScope::All
        } else if code.starts_with("LIMB") {
            ChannelScope::Limb
        } else {
            ChannelScope::None
        }
    }

    pub fn applies_to(self, source: Source) -> bool {
        match self {
            ChannelScope::All => true,
            ChannelScope::Limb => source == Source::Limb,
            ChannelScope::None => false,
        }
    }
}

/// Static instrument parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Sip {
    /// Photo-electrons per binary unit.
    pub electron_bu: [f32; SCIENCE_CHANNELS],
    pub ppg_error: f32,
    pub stray_error: f32,
    pub alpha0_asm: f32,
    pub alpha0_esm: f32,
    pub do_var_lc_cha: [ChannelScope; IR_CHANNELS],
    pub do_stray_lc_cha: [ChannelScope; SCIENCE_CHANNELS],
    pub level_2_smr: [u8; SCIENCE_CHANNELS],
}

impl Default for Sip {
    fn default() -> Self {
        Sip {
            electron_bu: [1.0; SCIENCE_CHANNELS],
            ppg_error: 0.0,
            stray_error: 0.0,
            alpha0_asm: 0.0,
            alpha0_esm: 0.0,
            do_var_lc_cha: [ChannelScope::None; IR_CHANNELS],
            do_stray_lc_cha: [ChannelScope::None; SCIENCE_CHANNELS],
            level_2_smr: [0; SCIENCE_CHANNELS],
        }
    }
}

/// Constant leakage current parameters; all arrays cover the science
/// pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Clcp {
    pub fpn: Array1<f32>,
    pub fpn_error: Array1<f32>,
    pub lc: Array1<f32>,
    pub lc_error: Array1<f32>,
    pub mean_noise: Array1<f32>,
}

/// Variable leakage current parameters at one orbit phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Vlcp {
    pub orbit_phase: f32,
    /// Channels 6-8 only.
    pub var_lc: Array1<f32>,
    pub var_lc_error: Array1<f32>,
    pub solar_stray: Array1<f32>,
    pub solar_stray_error: Array1<f32>,
}

/// Exposure setup of one channel during a dark state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSetup {
    pub channel: u8,
    pub pet: f32,
    pub coaddf: u8,
}

/// One DARK_AVERAGE record, joined with its state and SQADS entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DarkAverage {
    pub state_id: u8,
    pub saa: bool,
    /// In cluster order; a channel may appear more than once.
    pub setup: Vec<ChannelSetup>,
    pub dark_spec: Array1<f32>,
    pub sdev_dark_spec: Array1<f32>,
}

/// The pixel-to-pixel gain, etalon and bad pixel GADS.
#[derive(Debug, Clone, PartialEq)]
pub struct PpgGads {
    pub ppg_fact: Array1<f32>,
    pub etalon_fact: Array1<f32>,
    /// Non-zero for bad pixels.
    pub bad_pixel: Vec<u8>,
}

/// A solar reference spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct Srs {
    pub wvlen_sun: Array1<f32>,
    pub mean_sun: Array1<f32>,
    /// Doppler shift at 500 nm \[nm\].
    pub dopp_shift: f32,
}

/// Spectral calibration parameters at one orbit phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Scp {
    pub orbit_phase: f32,
    /// Five polynomial coefficients per channel.
    pub coeffs: [f64; 5 * SCIENCE_CHANNELS],
    /// Accuracy of the calibration per channel; a channel with an accuracy
    /// below `f32::EPSILON` is not calibrated.
    pub wv_error_calib: [f32; SCIENCE_CHANNELS],
}

/// Polarisation sensitivity (nadir) at one ESM angle.
#[derive(Debug, Clone, PartialEq)]
pub struct Pspn {
    pub ang_esm: f32,
    pub mu2: Array1<f32>,
    pub mu3: Array1<f32>,
}

/// Radiance sensitivity (nadir) at one ESM angle.
#[derive(Debug, Clone, PartialEq)]
pub struct Rspn {
    pub ang_esm: f32,
    pub sensitivity: Array1<f32>,
}

/// The key data of one Level-1b product.
pub trait KeyData {
    fn sip(&self) -> Option<&Sip>;
    fn clcp(&self) -> Option<&Clcp>;
    fn vlcp(&self) -> &[Vlcp];
    fn dark_averages(&self) -> &[DarkAverage];
    fn ppg(&self) -> Option<&PpgGads>;
    fn srs(&self) -> &[Srs];
    /// The detector pixel wavelengths of the BASE GADS.
    fn base(&self) -> Option<&Array1<f32>>;
    fn scp(&self) -> &[Scp];
    fn pspn(&self) -> &[Pspn];
    fn rspn(&self) -> &[Rspn];
}

/// Key data held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyData {
    pub sip: Option<Sip>,
    pub clcp: Option<Clcp>,
    pub vlcp: Vec<Vlcp>,
    pub dark_averages: Vec<DarkAverage>,
    pub ppg: Option<PpgGads>,
    pub srs: Vec<Srs>,
    pub base: Option<Array1<f32>>,
    pub scp: Vec<Scp>,
    pub pspn: Vec<Pspn>,
    pub rspn: Vec<Rspn>,
}

impl KeyData for MemoryKeyData {
    fn sip(&self) -> Option<&Sip> {
        self.sip.as_ref()
    }

    fn clcp(&self) -> Option<&Clcp> {
        self.clcp.as_ref()
    }

    fn vlcp(&self) -> &[Vlcp] {
        &self.vlcp
    }

    fn dark_averages(&self) -> &[DarkAverage] {
        &self.dark_averages
    }

    fn ppg(&self) -> Option<&PpgGads> {
        self.ppg.as_ref()
    }

    fn srs(&self) -> &[Srs] {
        &self.srs
    }

    fn base(&self) -> Option<&Array1<f32>> {
        self.base.as_ref()
    }

    fn scp(&self) -> &[Scp] {
        &self.scp
    }

    fn pspn(&self) -> &[Pspn] {
        &self.pspn
    }

    fn rspn(&self) -> &[Rspn] {
        &self.rspn
    }
}

/// Turn a missing data set into an error.
pub(crate) fn require<T>(value: Option<T>, name: &'static str) -> Result<T, CalibrationError> {
    value.ok_or(CalibrationError::MissingKeyData(name))
}

/// Monitoring products of the SDMF. A lookup that finds nothing returns
/// `None`.
pub trait SdmfKeyData {
    /// Pixel-to-pixel gain of all science pixels.
    fn ppg(&self, orbit: i32) -> Result<Option<Array1<f32>>, CalibrationError>;

    /// Bad and dead pixel mask of all science pixels; non-zero is bad.
    fn bdpm(&self, orbit: i32) -> Result<Option<Vec<u8>>, CalibrationError>;

    /// Transmission factors of one channel.
    fn transmission(&self, orbit: i32, channel: u8)
        -> Result<Option<Array1<f32>>, CalibrationError>;

    /// Solar mean reference spectrum of all science pixels.
    fn smr(&self, orbit: i32) -> Result<Option<Array1<f32>>, CalibrationError>;
}

/// SDMF products held in memory, keyed by orbit. A lookup returns the
/// product of the latest orbit at or before the requested one.
#[derive(Debug, Clone, Default)]
pub struct MemorySdmfKeyData {
    pub ppg: BTreeMap<i32, Array1<f32>>,
    pub bdpm: BTreeMap<i32, Vec<u8>>,
    /// Channel 8 only.
    pub transmission: BTreeMap<i32, Array1<f32>>,
    pub smr: BTreeMap<i32, Array1<f32>>,
}

fn latest<T: Clone>(map: &BTreeMap<i32, T>, orbit: i32) -> Option<T> {
    map.range(..=orbit).next_back().map(|(_, v)| v.clone())
}

impl SdmfKeyData for MemorySdmfKeyData {
    fn ppg(&self, orbit: i32) -> Result<Option<Array1<f32>>, CalibrationError> {
        Ok(latest(&self.ppg, orbit))
    }

    fn bdpm(&self, orbit: i32) -> Result<Option<Vec<u8>>, CalibrationError> {
        Ok(latest(&self.bdpm, orbit))
    }

    fn transmission(
        &self,
        orbit: i32,
        channel: u8,
    ) -> Result<Option<Array1<f32>>, CalibrationError> {
        if channel != 8 {
            return Ok(None);
        }
        Ok(latest(&self.transmission, orbit))
    }

    fn smr(&self, orbit: i32) -> Result<Option<Array1<f32>>, CalibrationError> {
        Ok(latest(&self.smr, orbit))
    }
}
