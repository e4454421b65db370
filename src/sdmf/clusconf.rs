// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pixel exposure times of the dark states over the mission.

use super::SdmfError;
use crate::constants::SCIENCE_CHANNELS;

/// States that measure the dark signal.
pub const DARK_STATES: [u8; 5] = [8, 26, 46, 63, 67];

struct ClusConf {
    /// First orbit of this configuration.
    orbit: i32,
    /// Number of readouts of the state.
    count: u16,
    pet: [f32; SCIENCE_CHANNELS],
}

const STATE_08: &[ClusConf] = &[
    ClusConf {
        orbit: 4151,
        count: 40,
        pet: [5.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 1.0],
    },
    ClusConf {
        orbit: 7268,
        count: 40,
        pet: [5.0, 1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0],
    },
    ClusConf {
        orbit: 43362,
        count: 80,
        pet: [0.25, 0.25, 1.0, 1.0, 0.25, 0.5, 0.125, 0.125],
    },
];

const STATE_26: &[ClusConf] = &[
    ClusConf {
        orbit: 4151,
        count: 60,
        pet: [0.25, 0.25, 0.03125, 0.03125, 0.25, 0.03125, 0.03125, 0.125],
    },
    ClusConf {
        orbit: 43362,
        count: 60,
        pet: [1.0, 1.5, 0.75, 0.75, 1.5, 1.5, 0.5, 0.5],
    },
];

const STATE_46: &[ClusConf] = &[
    ClusConf {
        orbit: 1572,
        count: 20,
        pet: [0.0625; SCIENCE_CHANNELS],
    },
    ClusConf {
        orbit: 4144,
        count: 20,
        pet: [0.0625, 0.0625, 0.0625, 0.0625, 0.125, 0.25, 0.0625, 0.0625],
    },
    ClusConf {
        orbit: 43362,
        count: 20,
        pet: [0.0625, 0.0625, 0.0625, 0.0625, 0.125, 0.0625, 0.0625, 0.0625],
    },
];

const STATE_63: &[ClusConf] = &[
    ClusConf {
        orbit: 1990,
        count: 30,
        pet: [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.5, 0.5],
    },
    ClusConf {
        orbit: 4144,
        count: 60,
        pet: [1.0, 0.5, 0.25, 0.25, 0.5, 0.5, 0.5, 0.5],
    },
    ClusConf {
        orbit: 43362,
        count: 80,
        pet: [0.375, 0.75, 0.375, 0.375, 0.375, 0.375, 0.375, 0.375],
    },
];

const STATE_67: &[ClusConf] = &[
    ClusConf {
        orbit: 1990,
        count: 40,
        pet: [5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 2.0, 2.0],
    },
    ClusConf {
        orbit: 4144,
        count: 40,
        pet: [10.0, 10.0, 2.0, 2.0, 10.0, 5.0, 2.0, 2.0],
    },
    ClusConf {
        orbit: 7268,
        count: 640,
        pet: [10.0, 10.0, 0.125, 0.125, 10.0, 0.125, 2.0, 2.0],
    },
    ClusConf {
        orbit: 43362,
        count: 320,
        pet: [0.5, 0.5, 0.125, 0.125, 0.5, 0.125, 1.0, 1.0],
    },
];

fn table(state_id: u8) -> Result<&'static [ClusConf], SdmfError> {
    match state_id {
        8 => Ok(STATE_08),
        26 => Ok(STATE_26),
        46 => Ok(STATE_46),
        63 => Ok(STATE_63),
        67 => Ok(STATE_67),
        s => Err(SdmfError::UndefinedClusConf(s)),
    }
}

/// The configuration in use at `orbit`: the last one starting at or before
/// it.
fn lookup(state_id: u8, orbit: i32) -> Result<Option<&'static ClusConf>, SdmfError> {
    Ok(table(state_id)?.iter().rev().find(|c| orbit >= c.orbit))
}

/// Pixel exposure times of a dark state at `orbit`, or `None` before the
/// first configuration of that state.
pub fn state_pet(state_id: u8, orbit: i32) -> Result<Option<[f32; SCIENCE_CHANNELS]>, SdmfError> {
    Ok(lookup(state_id, orbit)?.map(|c| c.pet))
}

/// Number of readouts of a dark state at `orbit`.
pub fn state_count(state_id: u8, orbit: i32) -> Result<Option<u16>, SdmfError> {
    Ok(lookup(state_id, orbit)?.map(|c| c.count))
}

/// The dark state measuring `channel` (1-8) with exposure time `pet` at
/// `orbit`, if any.
pub fn pet_to_state_id(orbit: i32, channel: u8, pet: f32) -> Option<u8> {
    if channel == 0 || usize::from(channel) > SCIENCE_CHANNELS {
        return None;
    }
    let ch = usize::from(channel - 1);
    DARK_STATES.iter().copied().find(|&state_id| {
        matches!(lookup(state_id, orbit), Ok(Some(c)) if (pet - c.pet[ch]).abs() < 1e-3)
    })
}
