// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all sciacal-related errors.
//!
//! Every error carries a [`Severity`]. Only fatal errors stop the processing of
//! a product; warnings and informational conditions are normally logged where
//! they happen and never reach the caller as an `Err`, but the module errors
//! that can describe them still classify themselves so that a caller holding
//! one can decide what to do.

use strum_macros::Display;
use thiserror::Error;

use crate::{
    calibration::CalibrationError, housekeeping::HousekeepingError, lv0::Lv0Error,
    quality::QualityError, sdmf::SdmfError,
};

/// How bad an error is.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    #[strum(serialize = "info")]
    Info,

    #[strum(serialize = "warning")]
    Warning,

    /// Abort the current product.
    #[strum(serialize = "fatal")]
    Fatal,
}

#[derive(Error, Debug)]
pub enum SciaError {
    #[error("{0}")]
    Lv0(#[from] Lv0Error),

    #[error("{0}")]
    Housekeeping(#[from] HousekeepingError),

    #[error("{0}")]
    Sdmf(#[from] SdmfError),

    #[error("{0}")]
    Calibration(#[from] CalibrationError),

    #[error("{0}")]
    Quality(#[from] QualityError),

    #[error("{0}")]
    IO(#[from] std::io::Error),
}

impl SciaError {
    pub fn severity(&self) -> Severity {
        match self {
            SciaError::Lv0(e) => e.severity(),
            SciaError::Housekeeping(e) => e.severity(),
            SciaError::Sdmf(e) => e.severity(),
            SciaError::Calibration(e) => e.severity(),
            SciaError::Quality(e) => e.severity(),
            SciaError::IO(_) => Severity::Fatal,
        }
    }
}
