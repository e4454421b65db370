// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Orbit phases in version 2.4 records start at a different point of the
/// orbit than the ones in Level-1b products. This is the usual difference.
pub const DEFAULT_ORBIT_PHASE_DIFF: f32 = 0.092;

/// The difference between the product orbit phase and the SDMF orbit phase
/// of an orbit.
pub trait OrbitPhaseCorrection {
    fn phase_diff(&self, orbit: i32) -> f32;
}

/// The same phase difference for every orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantPhaseDiff(pub f32);

impl Default for ConstantPhaseDiff {
    fn default() -> Self {
        ConstantPhaseDiff(DEFAULT_ORBIT_PHASE_DIFF)
    }
}

impl ConstantPhaseDiff {
    /// Derive the difference from the orbit period and the eclipse entry and
    /// exit times (all in seconds, counted from the ascending node).
    pub fn from_eclipse(period: f64, eclipse_entry: f64, eclipse_exit: f64) -> ConstantPhaseDiff {
        ConstantPhaseDiff((((eclipse_entry - eclipse_exit) / period - 0.5) / 2.0) as f32)
    }
}

impl OrbitPhaseCorrection for ConstantPhaseDiff {
    fn phase_diff(&self, _orbit: i32) -> f32 {
        self.0
    }
}
