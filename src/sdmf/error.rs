// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

use super::SdmfVersion;
use crate::error::Severity;

#[derive(Error, Debug)]
pub enum SdmfError {
    #[error("Valid values for USE_SDMF_VERSION: 2.4, 3.0 or 3.1 (got '{0}')")]
    InvalidVersion(String),

    #[error("Channel {0} is not a science channel (expected 0 for all channels, or 1-8)")]
    InvalidChannel(u8),

    #[error("Undefined cluster configuration for state {0:02}")]
    UndefinedClusConf(u8),

    #[error("Couldn't open SDMF file {path}: {err}")]
    Open {
        path: PathBuf,
        err: std::io::Error,
    },

    #[error("Short read of {what} in SDMF file {path}")]
    Truncated { what: &'static str, path: PathBuf },

    #[error("No fitted dark entry found in SDMF (v{0}) for orbit {1}")]
    NoFittedDark(SdmfVersion, i32),

    #[error("SDMF v{0} needs HDF5, but sciacal was compiled without HDF5 support")]
    NoHdf5(SdmfVersion),

    #[error("SDMF v{version}: dataset '{name}' has an unexpected shape {shape:?}")]
    BadShape {
        version: SdmfVersion,
        name: String,
        shape: Vec<usize>,
    },

    #[cfg(feature = "hdf5")]
    #[error("Couldn't open SDMF database {path}: {err}")]
    Hdf5Open { path: PathBuf, err: hdf5::Error },

    #[cfg(feature = "hdf5")]
    #[error(transparent)]
    Hdf5(#[from] hdf5::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

impl SdmfError {
    /// Every SDMF error aborts the product. A lookup that finds nothing is
    /// not an error; it returns a record with `found == false`.
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}
