// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::error::Severity;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QualityError {
    #[error("'{0}' is not an absolute orbit number")]
    InvalidOrbit(String),

    #[error("Absolute orbit {0} is before the first orbit of the mission")]
    OrbitOutOfRange(i32),

    #[error("{0} is not a quality class code (expected 0-3 or 255)")]
    UnknownCode(u8),
}

impl QualityError {
    pub fn severity(&self) -> Severity {
        match self {
            QualityError::InvalidOrbit(_) | QualityError::UnknownCode(_) => Severity::Fatal,
            QualityError::OrbitOutOfRange(_) => Severity::Warning,
        }
    }
}
