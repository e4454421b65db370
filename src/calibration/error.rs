// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all calibration-related errors.

use thiserror::Error;

use super::Stage;
use crate::{error::Severity, sdmf::SdmfError};

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("Unknown calibration flag '{0}'; valid names are: {names}", names = *super::FLAG_NAMES)]
    UnknownFlag(String),

    #[error("SCIA_TRANS_RANGE must be 'first,last' with 0 <= first <= last < 1024 (got '{0}')")]
    InvalidTransRange(String),

    #[error("The product has no {0} data set")]
    MissingKeyData(&'static str),

    #[error("The {0} data set of the product is incomplete")]
    IncompleteKeyData(&'static str),

    #[error("The {0} stage needs the memory and non-linearity tables, but none were given")]
    MissingTables(Stage),

    #[error("The {0} stage needs an SDMF database, but none was given")]
    MissingDatabase(Stage),

    #[error("No dark parameters found for channel 8 in orbit {0}")]
    NoDarkParameters(i32),

    #[error("No SDMF solar mean reference spectrum (SMR_v3.0) for orbit {0}")]
    NoSolarSpectrum(i32),

    #[error("Cluster {clus_id} of state {state_id:02}: {reason}")]
    BadRecord {
        state_id: u8,
        clus_id: u8,
        reason: String,
    },

    #[error("{stage} failed: {err}")]
    Stage { stage: Stage, err: Box<CalibrationError> },

    #[error(transparent)]
    Sdmf(#[from] SdmfError),
}

impl CalibrationError {
    pub fn severity(&self) -> Severity {
        match self {
            CalibrationError::Stage { err, .. } => err.severity(),
            CalibrationError::Sdmf(e) => e.severity(),
            _ => Severity::Fatal,
        }
    }
}
