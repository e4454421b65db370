// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors and warnings from decoding Level-0 packets.

use thiserror::Error;

use super::PacketType;
use crate::error::Severity;

#[derive(Error, Debug)]
pub enum Lv0Error {
    #[error("Short read of {what} in packet {index}")]
    Truncated { what: &'static str, index: usize },

    #[error("Packet {index} is not a {expected} packet (packet ID {found})")]
    WrongPacketType {
        index: usize,
        expected: PacketType,
        found: u8,
    },

    #[error("Detector packet {index}: DSR size mismatch, consumed {consumed} bytes instead of {declared}")]
    SizeMismatch {
        index: usize,
        consumed: usize,
        declared: usize,
    },

    #[error("Packet {index} declares a length of {length} bytes, which is shorter than its header")]
    BadLength { index: usize, length: usize },

    #[error("Detector packet {index}: incorrect sync value 0x{sync:04X} in the first channel header, so the packet has no time stamp")]
    NoTimeSource { index: usize, sync: u16 },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

impl Lv0Error {
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

/// Conditions that degrade a decoded packet but don't stop the read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Lv0Warning {
    #[error("packet {index}: incorrect AUX sync value 0x{sync:04X} in frame {frame}, BCP {bcp}")]
    AuxSync {
        index: usize,
        frame: usize,
        bcp: usize,
        sync: u16,
    },

    #[error("packet {index}: incorrect PMD sync value 0x{sync:04X} in sub-packet {packet}")]
    PmdSync {
        index: usize,
        packet: usize,
        sync: u16,
    },

    #[error("packet {index}: incorrect channel sync value 0x{sync:04X}, remainder skipped")]
    ChannelSync { index: usize, sync: u16 },

    #[error("packet {index}: corrupted cluster sync 0x{sync:04X} in channel {channel}, remainder skipped")]
    ClusterSync { index: usize, channel: u8, sync: u16 },

    #[error("packet {index}: corrupted cluster block in channel {channel}, remainder skipped")]
    ClusterBlock { index: usize, channel: u8 },

    #[error("packet {index}: corrected {field} of cluster from {from} to {to}")]
    ClusterRepaired {
        index: usize,
        field: &'static str,
        from: u16,
        to: u16,
    },
}

impl Lv0Warning {
    pub fn severity(&self) -> Severity {
        match self {
            Lv0Warning::ClusterRepaired { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }
}
