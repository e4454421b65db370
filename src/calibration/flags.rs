// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The calibration bitmask.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use lazy_static::lazy_static;

use super::CalibrationError;

bitflags! {
    /// A set of calibration steps. The bit values are those of the
    /// calibration flag stored in Level-1c products.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CalibFlags: u32 {
        /// Reticon memory correction (chan 1-5)
        const VIS_MEM = 1 << 0;
        /// Memory/non-linearity calculated from the SRON tables
        const SRON_MEM_NLIN = 1 << 1;
        /// Epitaxx non-linearity correction (chan 6-8)
        const IR_NLIN = 1 << 2;
        /// Dark correction from the SDMF database
        const SRON_DARK = 1 << 3;
        /// Analog offset correction
        const AO = 1 << 4;
        /// (Constant) dark current correction
        const DARK = 1 << 5;
        /// (Variable) dark current correction
        const VDARK = 1 << 6;
        /// Solar straylight correction
        const VSTRAY = 1 << 7;
        /// Dark correction from the DARK_AVERAGE ADS or SDMF state darks
        const ADARK = 1 << 8;
        /// Use limb darks (limb states only)
        const LDARK = 1 << 9;
        /// PPG correction from the SDMF database
        const SRON_PPG = 1 << 10;
        /// Pixel-to-pixel gain correction
        const CORR_PPG = 1 << 11;
        const ETALON = 1 << 12;
        /// New straylight keydata (channel 2 only)
        const SRON_STRAY = 1 << 13;
        /// (Spectral) straylight correction
        const STRAY = 1 << 14;
        /// Fixed wavelength calibration for channels 6-8
        const SRON_WAVE = 1 << 15;
        const CALIB_WAVE = 1 << 16;
        /// Fixed PPG correction values (channel 8 only)
        const FIXED_PPG = 1 << 17;
        const POL = 1 << 18;
        /// SRON radiance sensitivity
        const SRON_RAD = 1 << 19;
        const RAD = 1 << 20;
        /// Bad/dead pixel mask from the SDMF database
        const SRON_BDPM = 1 << 21;
        const MASK_BDPM = 1 << 22;
        /// Calculate reflectances
        const DIVIDE_SUN = 1 << 23;
        /// Solar spectrum from the SDMF database
        const SRON_SUN = 1 << 24;
        /// Estimate the total relative accuracy of the signal
        const CALC_ERROR = 1 << 25;
        /// Estimate the measurement noise of channel 8
        const SRON_NOISE = 1 << 26;
        /// Transmission correction of channel 8
        const SRON_TRANS = 1 << 27;
        /// Multiply radiances in the Level-1c product
        const PATCH_L1C = 1 << 28;
        const KEYDATA_RAD = 1 << 29;
        const MFACTOR_RAD = 1 << 30;
        const MFAC_H5_RAD = 1 << 31;
    }
}

// The predefined sets live outside the macro so that name iteration only
// yields single bits.
impl CalibFlags {
    pub const NONE: CalibFlags = CalibFlags::empty();

    /// The calibration of the operational processor.
    pub const ATBD: CalibFlags = CalibFlags::VIS_MEM
        .union(CalibFlags::IR_NLIN)
        .union(CalibFlags::AO)
        .union(CalibFlags::DARK)
        .union(CalibFlags::VDARK)
        .union(CalibFlags::CORR_PPG)
        .union(CalibFlags::ETALON)
        .union(CalibFlags::STRAY)
        .union(CalibFlags::CALIB_WAVE)
        .union(CalibFlags::POL)
        .union(CalibFlags::RAD)
        .union(CalibFlags::MASK_BDPM);

    /// The calibration with the SRON monitoring data.
    pub const SRON: CalibFlags = CalibFlags::ATBD
        .union(CalibFlags::SRON_MEM_NLIN)
        .union(CalibFlags::SRON_DARK)
        .union(CalibFlags::SRON_PPG)
        .union(CalibFlags::SRON_WAVE)
        .union(CalibFlags::SRON_BDPM);

    /// Any of the dark corrections.
    pub const ANY_DARK: CalibFlags = CalibFlags::AO
        .union(CalibFlags::DARK)
        .union(CalibFlags::VDARK)
        .union(CalibFlags::VSTRAY);

    /// Steps that need the wavelength grid.
    pub const NEEDS_WAVE: CalibFlags = CalibFlags::CALIB_WAVE
        .union(CalibFlags::POL)
        .union(CalibFlags::RAD);

    /// The names of the set bits, in bit order.
    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

impl Default for CalibFlags {
    fn default() -> Self {
        CalibFlags::NONE
    }
}

impl fmt::Display for CalibFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", self.names().join(","))
        }
    }
}

impl FromStr for CalibFlags {
    type Err = CalibrationError;

    /// Parse a comma-separated list of flag names. "none", "atbd" (or "all")
    /// and "sron" select the predefined sets; names are case-insensitive.
    fn from_str(s: &str) -> Result<CalibFlags, CalibrationError> {
        let mut flags = CalibFlags::NONE;
        for word in s.split(',').map(str::trim).filter(|w| !w.is_empty()) {
            let upper = word.to_uppercase();
            flags |= match upper.as_str() {
                "NONE" => CalibFlags::NONE,
                "ATBD" | "ALL" => CalibFlags::ATBD,
                "SRON" => CalibFlags::SRON,
                name => CalibFlags::from_name(name)
                    .ok_or_else(|| CalibrationError::UnknownFlag(word.to_string()))?,
            };
        }
        Ok(flags)
    }
}

lazy_static! {
    /// All flag names, for help texts.
    pub static ref FLAG_NAMES: String = CalibFlags::all().names().join(", ");
}
