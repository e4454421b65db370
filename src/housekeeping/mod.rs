// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Housekeeping: physical quantities derived from decoded Level-0 packets.
//!
//! Per-packet conversions live in the submodules. The `state_*` functions
//! average them over all packets of one state execution; samples that are
//! NaN are skipped, and an average without any valid sample is NaN.

mod angles;
mod error;
mod pet;
mod temperature;
#[cfg(test)]
mod tests;
mod time;

pub use angles::{scan_angles, state_angles};
pub use error::HousekeepingError;
pub use pet::{det_pet, Pet};
pub use temperature::{
    aux_temperatures, bench_temperature, det_temperatures, detector_temperature,
    pmd_temperature, BenchSensor,
};
pub use time::{aux_time, aux_times, det_time, jday_to_epoch, pmd_time, pmd_times, readout_delay};

use serde::Serialize;

use crate::{
    constants::SCIENCE_CHANNELS,
    lv0::{Mds0Aux, Mds0Det, Mds0Pmd},
};

/// How the optical bench (OBM) temperature of a state is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObmMode {
    /// The mean of the azimuth and elevation thermistors, minus 2.2 K.
    Sost,

    /// The radiator word converted with the azimuth coefficients, plus 0.7 K.
    /// Databases before SDMF v3.1 were built this way.
    Legacy,
}

fn mean(sum: f64, count: u32) -> f32 {
    if count == 0 {
        f32::NAN
    } else {
        (sum / f64::from(count)) as f32
    }
}

/// Average optical bench temperature over the auxiliary packets of a state.
pub fn state_obm_temperature(aux: &[Mds0Aux], mode: ObmMode) -> f32 {
    let mut sum = 0.0;
    let mut count = 0;
    for frame in aux.iter().flat_map(|a| a.frames.iter()) {
        match mode {
            ObmMode::Sost => {
                let az = bench_temperature(BenchSensor::Azimuth, frame.bench_az);
                let elv = bench_temperature(BenchSensor::Elevation, frame.bench_elv);
                if az.is_normal() && elv.is_normal() {
                    sum += (az + elv) / 2.0;
                    count += 1;
                }
            }
            ObmMode::Legacy => {
                let rad = bench_temperature(BenchSensor::Azimuth, frame.bench_rad);
                if rad.is_normal() {
                    sum += rad;
                    count += 1;
                }
            }
        }
    }
    let avg = mean(sum, count);
    match mode {
        ObmMode::Sost => avg - 2.2,
        ObmMode::Legacy => 0.7 + avg,
    }
}

/// Average detector block temperatures over the detector packets of a state.
pub fn state_det_temperatures(det: &[Mds0Det]) -> [f32; SCIENCE_CHANNELS] {
    let mut sums = [0.0f64; SCIENCE_CHANNELS];
    let mut counts = [0u32; SCIENCE_CHANNELS];
    for packet in det {
        let temps = det_temperatures(packet);
        for ((t, sum), count) in temps.iter().zip(sums.iter_mut()).zip(counts.iter_mut()) {
            if t.is_normal() {
                *sum += f64::from(*t);
                *count += 1;
            }
        }
    }
    let mut out = [f32::NAN; SCIENCE_CHANNELS];
    for (o, (sum, count)) in out.iter_mut().zip(sums.into_iter().zip(counts)) {
        *o = mean(sum, count);
    }
    out
}

/// Average PMD block temperature over the PMD packets of a state.
pub fn state_pmd_temperature(pmd: &[Mds0Pmd]) -> f32 {
    let (sum, count) = pmd
        .iter()
        .map(pmd_temperature)
        .filter(|t| t.is_normal())
        .fold((0.0, 0), |(s, c), t| (s + f64::from(t), c + 1));
    mean(sum, count)
}

/// Housekeeping of one state execution.
#[derive(Debug, Clone, Serialize)]
pub struct StateHousekeeping {
    pub state_id: u8,
    /// MJD2000 of the first detector packet.
    pub jday: f64,
    pub obm_temp: f32,
    pub det_temp: [f32; SCIENCE_CHANNELS],
    pub pmd_temp: f32,
    pub asm_angle: f32,
    pub esm_angle: f32,
}

impl StateHousekeeping {
    /// Summarise the packets of one state. `det` must hold at least one
    /// packet to give the state ID and time; otherwise `None` is returned.
    pub fn new(
        aux: &[Mds0Aux],
        det: &[Mds0Det],
        pmd: &[Mds0Pmd],
        obm_mode: ObmMode,
    ) -> Result<Option<StateHousekeeping>, HousekeepingError> {
        let first = match det.first() {
            Some(d) => d,
            None => return Ok(None),
        };
        let (asm_angle, esm_angle) = state_angles(aux);
        Ok(Some(StateHousekeeping {
            state_id: first.data_hdr.state_id,
            jday: det_time(first)?,
            obm_temp: state_obm_temperature(aux, obm_mode),
            det_temp: state_det_temperatures(det),
            pmd_temp: state_pmd_temperature(pmd),
            asm_angle,
            esm_angle,
        }))
    }
}
