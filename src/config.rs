// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run-time configuration taken from the environment.
//!
//! The environment is read once per product with [`Config::from_env`]; the
//! rest of the crate only sees the resulting [`Config`].

use std::ops::RangeInclusive;
use std::path::PathBuf;

use log::debug;

use crate::{
    calibration::CalibrationError,
    error::SciaError,
    sdmf::{Sdmf24Select, SdmfVersion},
};

pub const SDMF_VERSION_ENV: &str = "USE_SDMF_VERSION";
pub const SDMF24_PATH_ENV: &str = "SDMF24_PATH";
pub const SDMF30_PATH_ENV: &str = "SDMF30_PATH";
pub const SDMF31_PATH_ENV: &str = "SDMF31_PATH";
pub const SDMF24_SELECT_ENV: &str = "SDMF24_SELECT";
pub const MEMCORR_DB_ENV: &str = "SCIA_MEMCORR_DB";
pub const NLCORR_DB_ENV: &str = "SCIA_NLCORR_DB";
pub const NO_CLUSTER_CORRECTION_ENV: &str = "NO_CLUSTER_CORRECTION";
pub const TRANS_RANGE_ENV: &str = "SCIA_TRANS_RANGE";

const DEFAULT_SDMF24_PATH: &str = "/SCIA/SDMF241";
const DEFAULT_SDMF30_PATH: &str = "/SCIA/SDMF30";
const DEFAULT_SDMF31_PATH: &str = "/SCIA/SDMF31";
const DEFAULT_MEMCORR_DB: &str = "/SCIA/share/nadc_tools/MEMcorr.h5";
const DEFAULT_NLCORR_DB: &str = "/SCIA/share/nadc_tools/NLcorr.h5";

/// Channel 8 pixels averaged by the transmission correction.
pub const DEFAULT_TRANS_RANGE: RangeInclusive<usize> = 505..=615;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub sdmf_version: SdmfVersion,
    pub sdmf24_path: PathBuf,
    pub sdmf30_path: PathBuf,
    pub sdmf31_path: PathBuf,
    pub sdmf24_select: Sdmf24Select,
    pub memcorr_path: PathBuf,
    pub nlcorr_path: PathBuf,
    /// The raw value of `NO_CLUSTER_CORRECTION`; see
    /// [`crate::lv0::cluster_correction_enabled`].
    pub no_cluster_correction: Option<String>,
    pub trans_range: RangeInclusive<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sdmf_version: SdmfVersion::default(),
            sdmf24_path: PathBuf::from(DEFAULT_SDMF24_PATH),
            sdmf30_path: PathBuf::from(DEFAULT_SDMF30_PATH),
            sdmf31_path: PathBuf::from(DEFAULT_SDMF31_PATH),
            sdmf24_select: Sdmf24Select::default(),
            memcorr_path: PathBuf::from(DEFAULT_MEMCORR_DB),
            nlcorr_path: PathBuf::from(DEFAULT_NLCORR_DB),
            no_cluster_correction: None,
            trans_range: DEFAULT_TRANS_RANGE,
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Config, SciaError> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key-value source. Unset keys take
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, SciaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str, default: &str| {
            PathBuf::from(lookup(key).unwrap_or_else(|| default.to_string()))
        };
        let config = Config {
            sdmf_version: SdmfVersion::from_env_value(lookup(SDMF_VERSION_ENV).as_deref())?,
            sdmf24_path: path(SDMF24_PATH_ENV, DEFAULT_SDMF24_PATH),
            sdmf30_path: path(SDMF30_PATH_ENV, DEFAULT_SDMF30_PATH),
            sdmf31_path: path(SDMF31_PATH_ENV, DEFAULT_SDMF31_PATH),
            sdmf24_select: Sdmf24Select::from_env_value(lookup(SDMF24_SELECT_ENV).as_deref()),
            memcorr_path: path(MEMCORR_DB_ENV, DEFAULT_MEMCORR_DB),
            nlcorr_path: path(NLCORR_DB_ENV, DEFAULT_NLCORR_DB),
            no_cluster_correction: lookup(NO_CLUSTER_CORRECTION_ENV),
            trans_range: match lookup(TRANS_RANGE_ENV) {
                Some(s) => parse_trans_range(&s)?,
                None => DEFAULT_TRANS_RANGE,
            },
        };
        debug!("{config:?}");
        Ok(config)
    }
}

/// Parse "first,last" (inclusive) channel 8 pixel numbers.
pub fn parse_trans_range(s: &str) -> Result<RangeInclusive<usize>, CalibrationError> {
    let err = || CalibrationError::InvalidTransRange(s.to_string());
    let (first, last) = s.split_once(',').ok_or_else(err)?;
    let first: usize = first.trim().parse().map_err(|_| err())?;
    let last: usize = last.trim().parse().map_err(|_| err())?;
    if first > last || last >= crate::constants::CHANNEL_SIZE {
        return Err(err());
    }
    Ok(first..=last)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serial_test::serial;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.sdmf_version, SdmfVersion::V30);
        assert_eq!(config.trans_range, 505..=615);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (SDMF_VERSION_ENV, "2.4"),
            (SDMF24_PATH_ENV, "/tmp/sdmf"),
            (SDMF24_SELECT_ENV, "NRT"),
            (TRANS_RANGE_ENV, "10, 20"),
        ]))
        .unwrap();
        assert_eq!(config.sdmf_version, SdmfVersion::V24);
        assert_eq!(config.sdmf24_path, PathBuf::from("/tmp/sdmf"));
        assert!(config.sdmf24_select.nrt);
        assert!(!config.sdmf24_select.consolidated);
        assert_eq!(config.trans_range, 10..=20);
    }

    #[test]
    fn test_invalid_version_is_fatal() {
        let err = Config::from_lookup(lookup(&[(SDMF_VERSION_ENV, "4.0")])).unwrap_err();
        assert_eq!(err.severity(), crate::error::Severity::Fatal);
    }

    #[test]
    fn test_invalid_trans_range() {
        assert!(parse_trans_range("20,10").is_err());
        assert!(parse_trans_range("10").is_err());
        assert!(parse_trans_range("0,1024").is_err());
        assert!(parse_trans_range("a,b").is_err());
        assert_eq!(parse_trans_range("0,1023").unwrap(), 0..=1023);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var(SDMF_VERSION_ENV, "3.1");
        std::env::set_var(NO_CLUSTER_CORRECTION_ENV, "1");
        let config = Config::from_env();
        std::env::remove_var(SDMF_VERSION_ENV);
        std::env::remove_var(NO_CLUSTER_CORRECTION_ENV);

        let config = config.unwrap();
        assert_eq!(config.sdmf_version, SdmfVersion::V31);
        assert_eq!(config.no_cluster_correction.as_deref(), Some("1"));
    }
}
