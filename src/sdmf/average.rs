// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-pixel averaging of dark readouts.

use ndarray::Array1;

/// Readouts with an orbit phase strictly inside this window are taken in
/// twilight and are not used for state darks.
pub const TWILIGHT_PHASE: (f32, f32) = (0.4, 0.975);

/// Readouts inside the South Atlantic Anomaly are not used for channels
/// below this one.
pub const SAA_CHANNEL_LIMIT: u8 = 6;

/// Noise of a pixel without any valid readout.
pub const UNDETERMINED_NOISE: f32 = -1.0;

pub fn is_twilight(orbit_phase: f32) -> bool {
    orbit_phase > TWILIGHT_PHASE.0 && orbit_phase < TWILIGHT_PHASE.1
}

/// Should a dark readout be skipped? `channel` 0 means all channels.
pub fn skip_readout(channel: u8, saa: bool, orbit_phase: f32) -> bool {
    (channel < SAA_CHANNEL_LIMIT && saa) || is_twilight(orbit_phase)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AverageMode {
    /// A pixel counts when its signal is normal; the noise of that readout is
    /// added as a square, and the result is the RMS.
    Joint,

    /// Like `Joint`, but the noise is averaged as it is.
    JointPlainNoise,

    /// Signal and noise are counted separately, each when it is normal.
    Separate,
}

#[derive(Debug)]
pub(crate) struct Averaged {
    pub signal: Array1<f32>,
    pub noise: Array1<f32>,
    /// Number of readouts that contributed to each pixel's signal.
    pub signal_count: Vec<u16>,
}

pub(crate) struct ReadoutAverager {
    mode: AverageMode,
    signal: Vec<f32>,
    noise: Vec<f32>,
    signal_count: Vec<u16>,
    noise_count: Vec<u16>,
}

impl ReadoutAverager {
    pub(crate) fn new(mode: AverageMode, num_pixels: usize) -> ReadoutAverager {
        ReadoutAverager {
            mode,
            signal: vec![0.0; num_pixels],
            noise: vec![0.0; num_pixels],
            signal_count: vec![0; num_pixels],
            noise_count: vec![0; num_pixels],
        }
    }

    pub(crate) fn add(&mut self, signal: &[f32], noise: &[f32]) {
        for (i, (&s, &n)) in signal.iter().zip(noise).enumerate().take(self.signal.len()) {
            match self.mode {
                AverageMode::Joint | AverageMode::JointPlainNoise => {
                    if s.is_normal() {
                        self.signal[i] += s;
                        self.noise[i] += if self.mode == AverageMode::Joint {
                            n * n
                        } else {
                            n
                        };
                        self.signal_count[i] += 1;
                        self.noise_count[i] += 1;
                    }
                }
                AverageMode::Separate => {
                    if s.is_normal() {
                        self.signal[i] += s;
                        self.signal_count[i] += 1;
                    }
                    if n.is_normal() {
                        self.noise[i] += n * n;
                        self.noise_count[i] += 1;
                    }
                }
            }
        }
    }

    pub(crate) fn finish(self) -> Averaged {
        let ReadoutAverager {
            mode,
            mut signal,
            mut noise,
            signal_count,
            noise_count,
        } = self;
        for (s, &c) in signal.iter_mut().zip(&signal_count) {
            if c > 0 {
                *s /= f32::from(c);
            }
        }
        for (n, &c) in noise.iter_mut().zip(&noise_count) {
            *n = match (c, mode) {
                (0, _) => UNDETERMINED_NOISE,
                (c, AverageMode::JointPlainNoise) => *n / f32::from(c),
                (c, _) => (*n / f32::from(c)).sqrt(),
            };
        }
        Averaged {
            signal: Array1::from(signal),
            noise: Array1::from(noise),
            signal_count,
        }
    }
}
