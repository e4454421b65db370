// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Known periods of degraded SCIAMACHY data.
//!
//! An orbit is checked against the unavailable, decontamination and recovery
//! tables in that order; the first period containing it decides its class.

mod error;
mod tables;

pub use error::QualityError;

use std::str::FromStr;

use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString};

/// The quality of the data of an orbit.
#[derive(
    Debug, Display, EnumIter, EnumString, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord,
)]
#[repr(u8)]
pub enum QualityClass {
    #[strum(serialize = "OK")]
    #[serde(rename = "OK")]
    Ok = 0,

    /// Decontamination of the detectors.
    #[strum(serialize = "DECON")]
    #[serde(rename = "DECON")]
    Decon = 1,

    /// Recovery after a decontamination or a switch-off.
    #[strum(serialize = "RECOVER")]
    #[serde(rename = "RECOVER")]
    Recover = 2,

    #[strum(serialize = "UNAVAIL")]
    #[serde(rename = "UNAVAIL")]
    Unavail = 3,

    /// Not a valid orbit.
    #[strum(serialize = "UNKNOWN")]
    #[serde(rename = "UNKNOWN")]
    Unknown = 255,
}

impl QualityClass {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for QualityClass {
    type Error = QualityError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(QualityClass::Ok),
            1 => Ok(QualityClass::Decon),
            2 => Ok(QualityClass::Recover),
            3 => Ok(QualityClass::Unavail),
            255 => Ok(QualityClass::Unknown),
            _ => Err(QualityError::UnknownCode(code)),
        }
    }
}

/// An inclusive range of absolute orbits.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: i32,
    pub end: i32,
}

impl Period {
    pub fn contains(&self, orbit: i32) -> bool {
        (self.start..=self.end).contains(&orbit)
    }
}

/// The tables an orbit is classified against.
#[derive(Debug, Clone, Copy)]
pub struct QualityTables<'a> {
    pub unavailable: &'a [Period],
    pub decontamination: &'a [Period],
    pub recovery: &'a [Period],
}

impl QualityTables<'static> {
    /// The compiled-in mission history.
    pub const fn mission() -> QualityTables<'static> {
        QualityTables {
            unavailable: tables::UNAVAILABLE,
            decontamination: tables::DECONTAMINATION,
            recovery: tables::RECOVERY,
        }
    }
}

/// The classification of one orbit.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Quality {
    pub orbit: i32,
    pub class: QualityClass,
    /// The period that decided the class; `None` for OK and unknown orbits.
    pub period: Option<Period>,
}

/// Classify an orbit against the compiled-in tables.
pub fn classify(orbit: i32) -> Quality {
    classify_with(&QualityTables::mission(), orbit)
}

pub fn classify_with(tables: &QualityTables, orbit: i32) -> Quality {
    if orbit < 1 {
        return Quality {
            orbit,
            class: QualityClass::Unknown,
            period: None,
        };
    }
    let ordered = [
        (QualityClass::Unavail, tables.unavailable),
        (QualityClass::Decon, tables.decontamination),
        (QualityClass::Recover, tables.recovery),
    ];
    for (class, periods) in ordered {
        if let Some(period) = periods.iter().find(|p| p.contains(orbit)) {
            return Quality {
                orbit,
                class,
                period: Some(*period),
            };
        }
    }
    Quality {
        orbit,
        class: QualityClass::Ok,
        period: None,
    }
}

/// Parse an orbit given on the command line.
pub fn parse_orbit(s: &str) -> Result<i32, QualityError> {
    let orbit = i32::from_str(s.trim()).map_err(|_| QualityError::InvalidOrbit(s.to_string()))?;
    if orbit < 1 {
        return Err(QualityError::OrbitOutOfRange(orbit));
    }
    Ok(orbit)
}
