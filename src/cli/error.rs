// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all sciacal command-line errors. This should be the *only*
//! error enum that the binary sees.

use thiserror::Error;

use crate::{
    calibration::CalibrationError, error::SciaError, lv0::Lv0Error, quality::QualityError,
    sdmf::SdmfError,
};

#[derive(Error, Debug)]
pub enum SciacalError {
    /// An error related to lv0-dump.
    #[error("{0}")]
    Lv0Dump(String),

    /// An error related to calibration flags or stages.
    #[error("{0}")]
    Flags(String),

    /// An error related to orbit quality.
    #[error("{0}")]
    Quality(String),

    /// An error related to the SDMF configuration.
    #[error("{0}\n\nCheck the USE_SDMF_VERSION and SDMF*_PATH environment variables.")]
    Sdmf(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

impl From<CalibrationError> for SciacalError {
    fn from(e: CalibrationError) -> Self {
        Self::Flags(e.to_string())
    }
}

impl From<QualityError> for SciacalError {
    fn from(e: QualityError) -> Self {
        Self::Quality(e.to_string())
    }
}

impl From<Lv0Error> for SciacalError {
    fn from(e: Lv0Error) -> Self {
        Self::Lv0Dump(e.to_string())
    }
}

impl From<SdmfError> for SciacalError {
    fn from(e: SdmfError) -> Self {
        Self::Sdmf(e.to_string())
    }
}

impl From<SciaError> for SciacalError {
    fn from(e: SciaError) -> Self {
        match e {
            SciaError::Lv0(e) => Self::from(e),
            SciaError::Sdmf(e) => Self::from(e),
            SciaError::Calibration(e) => Self::from(e),
            SciaError::Quality(e) => Self::from(e),
            SciaError::Housekeeping(_) | SciaError::IO(_) => Self::Generic(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for SciacalError {
    fn from(e: serde_json::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<std::io::Error> for SciacalError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
