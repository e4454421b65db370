// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-product calibration parameters, initialised once per product.

use log::{debug, info};
use strum_macros::Display;

use super::{CalibFlags, CalibrationError, ChannelScope, KeyData};
use crate::{
    constants::{IR_CHANNELS, SCIENCE_CHANNELS},
    sdmf::SdmfVersion,
};

/// Processing stage letter of products patched with the SRON corrections.
pub const PATCH_PROC_STAGE: &str = "B";

/// The header values of a Level-1b product that the calibration depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductHeader {
    /// Product name from the MPH.
    pub product: String,
    pub proc_stage: String,
    /// The key-data version from the SPH; empty for products of processor
    /// versions 5.x and older.
    pub init_version: String,
    pub sensing_start: String,
    pub abs_orbit: i32,
}

/// Scale and offset of the memory and non-linearity corrections encoded in
/// the Level-1b readouts.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleVariant {
    /// Processor versions 5.x and older.
    #[default]
    #[strum(serialize = "old")]
    Old,

    #[strum(serialize = "ATBD")]
    Atbd,

    /// Products patched with the SRON corrections.
    #[strum(serialize = "patch")]
    Patch,
}

/// Choose the encoding of the memory (first) and non-linearity (second)
/// corrections of a product.
pub fn scale_variants(header: &ProductHeader, flags: CalibFlags) -> (ScaleVariant, ScaleVariant) {
    if !header.init_version.is_empty() {
        let sron = flags.contains(CalibFlags::SRON_MEM_NLIN);
        let mem = if flags.contains(CalibFlags::VIS_MEM) && sron {
            ScaleVariant::Patch
        } else {
            ScaleVariant::Atbd
        };
        let nlin = if flags.contains(CalibFlags::IR_NLIN) && sron {
            ScaleVariant::Patch
        } else {
            ScaleVariant::Atbd
        };
        (mem, nlin)
    } else if header.proc_stage == PATCH_PROC_STAGE {
        info!("assume this is a SRON patched Sciamachy product");
        (ScaleVariant::Patch, ScaleVariant::Patch)
    } else {
        info!("assume this is a Sciamachy product (version <= 5.x)");
        (ScaleVariant::Old, ScaleVariant::Old)
    }
}

/// Calibration parameters that stay the same for all states of a product.
///
/// The caller owns one of these for the lifetime of a batch and passes it to
/// every [`super::calibrate_state`] call. It is re-initialised whenever the
/// product, the calibration flags or the SDMF version change.
#[derive(Debug, Clone)]
pub struct FileParams {
    pub product: String,
    pub proc_stage: String,
    pub init_version: String,
    pub sensing_start: String,
    pub abs_orbit: i32,
    pub calib_flags: CalibFlags,
    pub sdmf_version: SdmfVersion,
    pub mem_scale: ScaleVariant,
    pub nlin_scale: ScaleVariant,
    /// Relative error of the PPG; -1 when errors are not calculated.
    pub ppg_error: f32,
    /// Relative error of the straylight; -1 when errors are not calculated.
    pub stray_error: f32,
    pub electron_bu: [f32; SCIENCE_CHANNELS],
    pub alpha0_asm: f32,
    pub alpha0_esm: f32,
    pub do_var_lc_cha: [ChannelScope; IR_CHANNELS],
    pub do_stray_lc_cha: [ChannelScope; SCIENCE_CHANNELS],
    /// Index of the solar spectrum used per channel.
    pub level_2_smr: [u8; SCIENCE_CHANNELS],
    /// Set when the parameters were (re-)initialised by the last call to
    /// [`FileParams::init`].
    pub init_file: bool,
    initialised: bool,
}

impl Default for FileParams {
    fn default() -> Self {
        FileParams {
            product: String::new(),
            proc_stage: String::new(),
            init_version: String::new(),
            sensing_start: String::new(),
            abs_orbit: -1,
            calib_flags: CalibFlags::NONE,
            sdmf_version: SdmfVersion::default(),
            mem_scale: ScaleVariant::default(),
            nlin_scale: ScaleVariant::default(),
            ppg_error: -1.0,
            stray_error: -1.0,
            electron_bu: [1e10; SCIENCE_CHANNELS],
            alpha0_asm: 0.0,
            alpha0_esm: 0.0,
            do_var_lc_cha: [ChannelScope::None; IR_CHANNELS],
            do_stray_lc_cha: [ChannelScope::None; SCIENCE_CHANNELS],
            level_2_smr: [0; SCIENCE_CHANNELS],
            init_file: true,
            initialised: false,
        }
    }
}

impl FileParams {
    pub fn new() -> FileParams {
        FileParams::default()
    }

    /// Do the cached parameters belong to another product or setup?
    pub fn needs_reinit(
        &self,
        header: &ProductHeader,
        flags: CalibFlags,
        sdmf_version: SdmfVersion,
    ) -> bool {
        !self.initialised
            || header.product != self.product
            || flags != self.calib_flags
            || sdmf_version != self.sdmf_version
    }

    /// Prepare the parameters for a state of the product described by
    /// `header`. The scale variants are always re-evaluated; everything else
    /// is only read again when [`FileParams::needs_reinit`] says so.
    pub fn init(
        &mut self,
        header: &ProductHeader,
        flags: CalibFlags,
        sdmf_version: SdmfVersion,
        keydata: &dyn KeyData,
    ) -> Result<(), CalibrationError> {
        let (mem_scale, nlin_scale) = scale_variants(header, flags);
        self.mem_scale = mem_scale;
        self.nlin_scale = nlin_scale;

        self.init_file = self.needs_reinit(header, flags, sdmf_version);
        if !self.init_file {
            return Ok(());
        }
        debug!(
            "initialising calibration parameters of {} (flags {flags})",
            header.product
        );
        self.product = header.product.clone();
        self.proc_stage = header.proc_stage.clone();
        self.init_version = header.init_version.clone();
        self.sensing_start = header.sensing_start.clone();
        self.abs_orbit = header.abs_orbit;
        self.calib_flags = flags;
        self.sdmf_version = sdmf_version;

        let sip = keydata.sip().ok_or(CalibrationError::MissingKeyData("SIP"))?;
        if flags.contains(CalibFlags::CALC_ERROR) {
            self.ppg_error = sip.ppg_error;
            self.stray_error = sip.stray_error;
        } else {
            self.ppg_error = -1.0;
            self.stray_error = -1.0;
        }
        self.electron_bu = sip.electron_bu;
        self.alpha0_asm = sip.alpha0_asm;
        self.alpha0_esm = sip.alpha0_esm;
        self.do_var_lc_cha = sip.do_var_lc_cha;
        self.do_stray_lc_cha = sip.do_stray_lc_cha;
        self.level_2_smr = sip.level_2_smr;
        self.initialised = true;
        Ok(())
    }
}
