// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::error::Severity;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HousekeepingError {
    #[error("State ID {0} is outside 1-70; no readout delay is known")]
    InvalidStateId(u8),

    #[error("Detector packet holds channel ID {0}, which is not a science channel")]
    InvalidChannelId(u8),

    #[error("Incorrect channel sync value 0x{0:04X}; pixel exposure time unknown")]
    ChannelSync(u16),
}

impl HousekeepingError {
    pub fn severity(&self) -> Severity {
        match self {
            HousekeepingError::InvalidStateId(_) => Severity::Fatal,
            HousekeepingError::InvalidChannelId(_) | HousekeepingError::ChannelSync(_) => {
                Severity::Warning
            }
        }
    }
}
