// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A dark database held in memory.
//!
//! Lookups follow the rules of the version 3.0 database. Callers that have
//! already loaded their calibration data (and tests) use this instead of the
//! files.

use std::sync::Arc;

use log::{debug, info};
use ndarray::{s, Array1, Array2};

use super::{
    average::{skip_readout, AverageMode, ReadoutAverager},
    pixel_range,
    search::{search_offsets, select_fitted, FitCandidate, SearchOrder, STATE_ORBIT_RADIUS},
    v24::{interpolate_orbit_dark, NUM_ORBIT_DARK},
    tables::{round_us, MemNlinTables},
    DarkDatabase, FittedDark, SdmfError, SdmfVersion, StateDark,
};
use crate::constants::{CHANNEL_SIZE, FIRST_INFRA_CHAN, SCIENCE_CHANNELS};

/// A fitted dark of one orbit, covering all science pixels.
#[derive(Debug, Clone)]
pub struct FittedRecord {
    pub orbit: i32,
    pub quality: i32,
    pub saa: bool,
    pub analog_offset: Array1<f32>,
    pub dark_current: Array1<f32>,
    pub analog_offset_error: Array1<f32>,
    pub dark_current_error: Array1<f32>,
}

/// The averaged readouts of one execution of a dark state, covering all
/// science pixels.
#[derive(Debug, Clone)]
pub struct StateReadout {
    pub state_id: u8,
    pub orbit: i32,
    pub saa: bool,
    pub orbit_phase: f32,
    pub pet: [f32; SCIENCE_CHANNELS],
    pub signal: Array1<f32>,
    pub noise: Array1<f32>,
}

#[derive(Default)]
pub struct MemoryDarkDb {
    fitted: Vec<FittedRecord>,
    readouts: Vec<StateReadout>,
    /// Channel 8 leakage current variation, one row per orbit phase bin.
    orbital: Option<Array2<f32>>,
    tables: Option<Arc<dyn MemNlinTables>>,
}

impl MemoryDarkDb {
    pub fn new() -> MemoryDarkDb {
        MemoryDarkDb::default()
    }

    pub fn with_fitted(mut self, record: FittedRecord) -> Self {
        self.fitted.push(record);
        self
    }

    pub fn with_readout(mut self, readout: StateReadout) -> Self {
        self.readouts.push(readout);
        self
    }

    /// Use this orbital variation (72 phase bins by 1024 pixels) for
    /// [`DarkDatabase::orbital_dark`].
    pub fn with_orbital_variation(mut self, table: Array2<f32>) -> Self {
        self.orbital = Some(table);
        self
    }

    /// Remove memory and non-linearity corrections from averaged state darks.
    pub fn with_tables(mut self, tables: Arc<dyn MemNlinTables>) -> Self {
        self.tables = Some(tables);
        self
    }
}

impl DarkDatabase for MemoryDarkDb {
    fn version(&self) -> SdmfVersion {
        SdmfVersion::V30
    }

    fn resolve(&self, channel: u8, orbit: i32) -> Result<FittedDark, SdmfError> {
        let range = pixel_range(channel)?;
        let best = select_fitted(orbit, true, |o| -> Result<_, SdmfError> {
            Ok(self
                .fitted
                .iter()
                .filter(|r| r.orbit == o)
                .take(1)
                .map(|r| FitCandidate {
                    orbit: r.orbit,
                    quality: r.quality,
                    saa: r.saa,
                    item: r,
                })
                .collect())
        })?;

        let mut dark = FittedDark::not_found(channel);
        if let Some(c) = best {
            let r = c.item;
            let slice = |a: &Array1<f32>| a.slice(s![range.clone()]).to_owned();
            dark.found = true;
            dark.orbit = Some(c.orbit);
            dark.quality = Some(c.quality);
            dark.analog_offset = slice(&r.analog_offset);
            dark.dark_current = slice(&r.dark_current);
            dark.analog_offset_error = slice(&r.analog_offset_error);
            dark.dark_current_error = slice(&r.dark_current_error);
            info!("applied SDMF Dark data (in memory) of orbit: {}", c.orbit);
        }
        Ok(dark)
    }

    fn state_dark(&self, state_id: u8, channel: u8, orbit: i32) -> Result<StateDark, SdmfError> {
        let range = pixel_range(channel)?;
        let mut dark = StateDark::not_found(state_id, channel);

        let mut rows: Vec<&StateReadout> = vec![];
        for delta in search_offsets(SearchOrder::LaterFirst, STATE_ORBIT_RADIUS - 1) {
            rows = self
                .readouts
                .iter()
                .filter(|r| r.state_id == state_id && r.orbit == orbit + delta)
                .collect();
            if !rows.is_empty() {
                dark.orbit = Some(orbit + delta);
                break;
            }
        }
        if rows.is_empty() {
            debug!("no state {state_id:02} darks near orbit {orbit}");
            return Ok(dark);
        }
        dark.found = true;

        let mut averager = ReadoutAverager::new(AverageMode::Separate, range.len());
        for r in rows
            .iter()
            .filter(|r| !skip_readout(channel, r.saa, r.orbit_phase))
        {
            for (ch, p) in dark.pet.iter_mut().enumerate() {
                if channel == 0 || usize::from(channel) == ch + 1 {
                    *p = r.pet[ch];
                }
            }
            let signal = r.signal.slice(s![range.clone()]).to_vec();
            let noise = r.noise.slice(s![range.clone()]).to_vec();
            averager.add(&signal, &noise);
        }
        let averaged = averager.finish();
        dark.signal = averaged.signal;
        dark.noise = averaged.noise;

        if let Some(tables) = &self.tables {
            remove_mem_nlin(
                tables.as_ref(),
                range.start,
                &averaged.signal_count,
                dark.signal.as_slice_mut().unwrap_or(&mut []),
            );
        }
        info!(
            "applied SDMF Dark data (in memory) of orbit: {} ({})",
            dark.orbit.unwrap_or(orbit),
            rows.len()
        );
        Ok(dark)
    }

    fn orbital_dark(&self, orbit: i32, orbit_phase: f32) -> Result<FittedDark, SdmfError> {
        let mut dark = self.resolve(8, orbit)?;
        let table = match (&self.orbital, dark.found) {
            (Some(t), true) if t.dim() == (NUM_ORBIT_DARK, CHANNEL_SIZE) => t,
            _ => return Ok(dark),
        };
        let flat: Vec<f32> = table.iter().copied().collect();
        let variation = interpolate_orbit_dark(&flat, orbit_phase);
        for (dc, v) in dark.dark_current.iter_mut().zip(variation) {
            if dc.is_normal() && v.is_normal() {
                *dc += v;
            }
        }
        Ok(dark)
    }
}

/// Averaged dark signals still contain the memory effect (visible
/// channels) or the non-linearity (infra-red channels) of the readouts.
/// Subtract it from every pixel that had a valid readout.
pub(crate) fn remove_mem_nlin(
    tables: &dyn MemNlinTables,
    first_pixel: usize,
    counts: &[u16],
    signal: &mut [f32],
) {
    for (i, (s, &n)) in signal.iter_mut().zip(counts).enumerate() {
        if n == 0 {
            continue;
        }
        let pixel = first_pixel + i;
        let channel = (pixel / CHANNEL_SIZE + 1) as u8;
        let index = round_us(*s);
        *s -= if channel < FIRST_INFRA_CHAN {
            tables.memory(channel, index)
        } else {
            tables.nonlinearity(tables.nlin_curve(pixel), index)
        };
    }
}
