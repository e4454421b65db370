// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pixel exposure times from detector channel headers.

use log::warn;
use serde::Serialize;

use super::HousekeepingError;
use crate::{
    constants::VIS_CHANNELS,
    lv0::{ChannelHeader, CHANNEL_SYNC},
};

/// Pixel exposure time of a channel.
///
/// A visible channel may be split in two virtual channels with their own
/// exposure times. `pet[0]` then belongs to the pixels before `vir_chan_b`
/// and `pet[1]` to the rest. Without a virtual channel, `vir_chan_b` is 0 and
/// `pet[1]` is NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pet {
    pub pet: [f32; 2],
    pub vir_chan_b: u16,
}

impl Pet {
    fn unknown() -> Pet {
        Pet {
            pet: [f32::NAN; 2],
            vir_chan_b: 0,
        }
    }
}

/// Exposure time for an exposure time factor; a factor of 0 selects the
/// shortest exposure.
fn etf_exposure(etf: u16) -> f64 {
    if etf == 0 {
        31.25e-3
    } else {
        62.5e-3 * f64::from(etf)
    }
}

/// Derive the pixel exposure time from a channel header. A header with a bad
/// sync word gives NaN exposure times and a warning.
pub fn det_pet(hdr: &ChannelHeader) -> Pet {
    let mut out = Pet::unknown();
    if hdr.sync != CHANNEL_SYNC {
        warn!("{}", HousekeepingError::ChannelSync(hdr.sync));
        return out;
    }

    if usize::from(hdr.id()) <= VIS_CHANNELS {
        let cmd = hdr.command_vis();
        let mut pet = etf_exposure(cmd.etf());
        if cmd.sec() > 1 {
            out.pet[1] = pet as f32;
            out.vir_chan_b = 2 * cmd.sec();
            if cmd.ratio() > 1 {
                pet *= f64::from(cmd.ratio());
            }
        }
        out.pet[0] = pet as f32;
    } else {
        let cmd = hdr.command_ir();
        match cmd.mode() {
            // normal mode
            0 => out.pet[0] = etf_exposure(cmd.etf()) as f32,
            // hot mode
            1 => out.pet[0] = (28.125e-6 * 2f64.powi(i32::from(cmd.pet()))) as f32,
            _ => (),
        }
    }
    out
}
