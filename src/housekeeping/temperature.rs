// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Temperatures of the optical bench, the detector blocks and the PMD block.

use log::warn;

use super::HousekeepingError;
use crate::{
    constants::SCIENCE_CHANNELS,
    lv0::{BenchWord, Mds0Aux, Mds0Det, Mds0Pmd, NUM_LV0_AUX_PMTC_FRAME},
};

/// One of the three thermistors on the optical bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchSensor {
    Radiator,
    Elevation,
    Azimuth,
}

/// Read-out electronics and Steinhart-Hart coefficients of a thermistor.
struct Thermistor {
    co: f64,
    ff: f64,
    a: f64,
    b: f64,
    c: f64,
}

impl BenchSensor {
    fn thermistor(self) -> Thermistor {
        match self {
            BenchSensor::Radiator => Thermistor {
                co: 74423.0912,
                ff: 0.183497965,
                a: 9.3809e-4,
                b: 2.2099e-4,
                c: 1.2655e-7,
            },
            BenchSensor::Elevation => Thermistor {
                co: 74439.72096,
                ff: 0.184288384,
                a: 9.2998e-4,
                b: 2.2188e-4,
                c: 1.2568e-7,
            },
            BenchSensor::Azimuth => Thermistor {
                co: 74419.32288,
                ff: 0.184583046,
                a: 9.3590e-4,
                b: 2.2119e-4,
                c: 1.2683e-7,
            },
        }
    }
}

/// Convert a raw bench temperature word with the coefficients of `sensor`.
/// The result is in Kelvin, or NaN if the status bit is set or the
/// resistance is not positive.
pub fn bench_temperature(sensor: BenchSensor, word: BenchWord) -> f64 {
    const QP: f64 = 8.0 / 65536.0;

    let t = sensor.thermistor();
    let r_l = t.co * (2.0 * f64::from(word.temp()) * QP - t.ff);
    let r_t = (1e6 * r_l) / (1e6 - r_l);
    if word.stat() != 0 || r_t < 1e-12 {
        return f64::NAN;
    }
    let ln_r = r_t.ln();
    1.0 / (t.a + t.b * ln_r + t.c * ln_r.powi(3))
}

/// Linear interpolation in a 16-point table. `xs` must be increasing; values
/// outside the table get the temperature of the nearest end point.
pub(crate) fn interpolate(xs: &[u16; 16], ys: &[f64; 16], x: u16) -> f64 {
    match xs.iter().position(|&xi| x < xi) {
        Some(0) => ys[0],
        None => ys[15],
        Some(i) => {
            let dx = f64::from(xs[i] - x) / f64::from(xs[i] - xs[i - 1]);
            ys[i] - (ys[i] - ys[i - 1]) * dx
        }
    }
}

/// Radiator temperature of each PMTC frame of an auxiliary packet.
pub fn aux_temperatures(aux: &Mds0Aux) -> [f32; NUM_LV0_AUX_PMTC_FRAME] {
    let mut temps = [f32::NAN; NUM_LV0_AUX_PMTC_FRAME];
    for (t, frame) in temps.iter_mut().zip(aux.frames.iter()) {
        let rad = bench_temperature(BenchSensor::Radiator, frame.bench_rad);
        if rad.is_normal() {
            *t = (0.7 + rad) as f32;
        }
    }
    temps
}

const DET_TAB_TM: [[u16; 16]; SCIENCE_CHANNELS] = [
    [
        0, 17876, 18312, 18741, 19161, 19574, 19980, 20379, 20771, 21157, 21908, 22636, 24684,
        26550, 28259, 65535,
    ],
    [
        0, 18018, 18456, 18886, 19309, 19724, 20131, 20532, 20926, 21313, 22068, 22798, 24852,
        26724, 28436, 65535,
    ],
    [
        0, 20601, 20996, 21384, 21765, 22140, 22509, 22872, 23229, 23581, 23927, 24932, 26201,
        27396, 28523, 65535,
    ],
    [
        0, 20333, 20725, 21110, 21490, 21863, 22230, 22591, 22946, 23295, 23640, 24640, 25905,
        27097, 28222, 65535,
    ],
    [
        0, 20548, 20942, 21330, 21711, 22086, 22454, 22817, 23174, 23525, 23871, 24875, 26144,
        27339, 28466, 65535,
    ],
    [
        0, 17893, 18329, 18758, 19179, 19593, 20000, 20399, 20792, 21178, 21931, 22659, 24709,
        26578, 28289, 65535,
    ],
    [
        0, 12994, 13526, 14046, 14555, 15054, 15543, 16022, 16492, 17850, 20352, 22609, 24656,
        26523, 28232, 65535,
    ],
    [
        0, 13129, 13664, 14188, 14702, 15204, 15697, 16180, 16653, 18019, 20536, 22804, 24860,
        26733, 28447, 65535,
    ],
];

const DET_TEMP_1_2_6: [f64; 16] = [
    179., 180., 185., 190., 195., 200., 205., 210., 215., 220., 230., 240., 270., 300., 330., 331.,
];
const DET_TEMP_3_4_5: [f64; 16] = [
    209., 210., 215., 220., 225., 230., 235., 240., 245., 250., 255., 270., 290., 310., 330., 331.,
];
const DET_TEMP_7_8: [f64; 16] = [
    129., 130., 135., 140., 145., 150., 155., 160., 165., 180., 210., 240., 270., 300., 330., 331.,
];

const DET_TAB_TEMP: [&[f64; 16]; SCIENCE_CHANNELS] = [
    &DET_TEMP_1_2_6,
    &DET_TEMP_1_2_6,
    &DET_TEMP_3_4_5,
    &DET_TEMP_3_4_5,
    &DET_TEMP_3_4_5,
    &DET_TEMP_1_2_6,
    &DET_TEMP_7_8,
    &DET_TEMP_7_8,
];

/// Temperature of a detector block from its raw ADC code. `channel` is
/// 1-based.
pub fn detector_temperature(channel: u8, raw: u16) -> Result<f64, HousekeepingError> {
    let i = usize::from(channel)
        .checked_sub(1)
        .filter(|&i| i < SCIENCE_CHANNELS)
        .ok_or(HousekeepingError::InvalidChannelId(channel))?;
    Ok(interpolate(&DET_TAB_TM[i], DET_TAB_TEMP[i], raw))
}

/// Detector block temperatures of a detector packet, indexed by channel.
/// Channels absent from the packet, or whose header carries an ID outside
/// 1-8, are NaN.
pub fn det_temperatures(det: &Mds0Det) -> [f32; SCIENCE_CHANNELS] {
    let mut temps = [f32::NAN; SCIENCE_CHANNELS];
    for src in det.data_src.iter().take(SCIENCE_CHANNELS) {
        let id = src.hdr.id();
        match detector_temperature(id, src.hdr.temp) {
            Ok(t) => temps[usize::from(id) - 1] = t as f32,
            Err(e) => warn!("state {:02}: {e}", det.data_hdr.state_id),
        }
    }
    temps
}

const PMD_TAB_TM: [u16; 16] = [
    1008, 1762, 2167, 3448, 5446, 8971, 13940, 14871, 15828, 16809, 17812, 20761, 23208, 25944,
    27960, 30884,
];
const PMD_TAB_TEMP: [f64; 16] = [
    60., 45., 41., 27., 13., -2., -16., -18., -20., -22., -24., -30., -35., -41., -46., -55.,
];

/// Temperature of the PMD block in Kelvin.
pub fn pmd_temperature(pmd: &Mds0Pmd) -> f32 {
    (273.15 + interpolate(&PMD_TAB_TM, &PMD_TAB_TEMP, pmd.temp)) as f32
}
