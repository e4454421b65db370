// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Instrument constants.

Pixel values are kept in single precision, as they are on the instrument and
in the Level-1b products. Intermediate sums (averages, interpolations) are
done in double precision where it matters.
 */

/// Number of science channels of the spectrometer.
pub const SCIENCE_CHANNELS: usize = 8;

/// Number of visible channels (1-5).
pub const VIS_CHANNELS: usize = 5;

/// Number of infra-red channels (6-8).
pub const IR_CHANNELS: usize = 3;

/// The first infra-red channel (1-based).
pub const FIRST_INFRA_CHAN: u8 = 6;

/// Number of detector pixels per channel.
pub const CHANNEL_SIZE: usize = 1024;

/// Number of detector pixels of all science channels.
pub const SCIENCE_PIXELS: usize = SCIENCE_CHANNELS * CHANNEL_SIZE;

/// Number of detector pixels of the visible channels.
pub const VIS_SCIENCE_PIXELS: usize = VIS_CHANNELS * CHANNEL_SIZE;

/// Number of PMD channels.
pub const PMD_NUMBER: usize = 7;

/// Maximum number of clusters in a state.
pub const MAX_CLUSTER: usize = 64;

/// Number of instrument states (state IDs run from 1 to 70).
pub const MAX_NUM_STATE: usize = 70;

/// Seconds per day.
pub const SEC_PER_DAY: f64 = 86400.0;

pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;

pub use std::f64::consts::PI;
