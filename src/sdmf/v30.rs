// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The version 3.0 database.
//!
//! `sdmf_dark.h5` holds the fitted darks, `sdmf_simudark.h5` the orbital
//! variation of channel 8 and `sdmf_extract_calib.h5` the readouts of the
//! calibration states.

#![allow(non_snake_case)]

use std::path::PathBuf;
use std::sync::Arc;

use hdf5::H5Type;
use log::info;

use super::{
    average::{skip_readout, AverageMode, ReadoutAverager},
    h5,
    memory::remove_mem_nlin,
    pixel_range,
    search::{search_offsets, select_fitted, FitCandidate, SearchOrder, STATE_ORBIT_RADIUS},
    DarkDatabase, FittedDark, MemNlinTables, SdmfError, SdmfVersion, StateDark,
};
use crate::constants::{CHANNEL_SIZE, PI};

const VERSION: SdmfVersion = SdmfVersion::V30;

#[derive(H5Type, Clone, Copy, Debug)]
#[repr(C)]
struct DarkMeta {
    absOrbit: i32,
    saaFlag: u8,
    quality: i16,
    orbitPhase: f32,
}

#[derive(H5Type, Clone, Copy, Debug)]
#[repr(C)]
struct CalibMeta {
    absOrbit: i32,
    saaFlag: u8,
    orbitPhase: f32,
}

#[derive(H5Type, Clone, Copy, Debug)]
#[repr(C)]
struct SimuDarkMeta {
    absOrbit: i32,
    orbitPhase: f32,
    phase2: f32,
    amp2: f32,
    sig_amp2: f32,
}

pub struct Sdmf30Db {
    root: PathBuf,
    tables: Arc<dyn MemNlinTables>,
}

impl Sdmf30Db {
    pub fn new(root: PathBuf, tables: Arc<dyn MemNlinTables>) -> Sdmf30Db {
        Sdmf30Db { root, tables }
    }
}

impl DarkDatabase for Sdmf30Db {
    fn version(&self) -> SdmfVersion {
        VERSION
    }

    fn resolve(&self, channel: u8, orbit: i32) -> Result<FittedDark, SdmfError> {
        let range = pixel_range(channel)?;
        let file = h5::open(&self.root.join("sdmf_dark.h5"))?;
        let meta: Vec<DarkMeta> = h5::meta_table(&file)?;

        let best = select_fitted(orbit, true, |o| {
            Ok::<_, SdmfError>(
                h5::meta_index(&file, o)?
                    .into_iter()
                    .take(1)
                    .filter_map(|i| meta.get(i).map(|m| (i, m)))
                    .map(|(i, m)| FitCandidate {
                        orbit: m.absOrbit,
                        quality: i32::from(m.quality),
                        saa: m.saaFlag != 0,
                        item: i,
                    })
                    .collect(),
            )
        })?;
        let best = match best {
            Some(b) => b,
            None => return Ok(FittedDark::not_found(channel)),
        };
        info!("applied SDMF Dark data (v3.0) of orbit: {}", best.orbit);

        let read = |name: &str| h5::read_column(VERSION, &file, name, range.clone(), best.item);
        let mut dark = FittedDark::not_found(channel);
        dark.analog_offset = read("analogOffset")?;
        dark.dark_current = read("darkCurrent")?;
        dark.analog_offset_error = read("analogOffsetError")?;
        dark.dark_current_error = read("darkCurrentError")?;
        dark.chi_square = read("chiSquareFit")?;
        dark.found = true;
        dark.orbit = Some(best.orbit);
        dark.quality = Some(best.quality);
        Ok(dark)
    }

    fn state_dark(&self, state_id: u8, channel: u8, orbit: i32) -> Result<StateDark, SdmfError> {
        let range = pixel_range(channel)?;
        let mut dark = StateDark::not_found(state_id, channel);
        let file = h5::open(&self.root.join("sdmf_extract_calib.h5"))?;
        let group = file.group(&format!("State_{state_id:02}"))?;

        let mut rows = vec![];
        for delta in search_offsets(SearchOrder::LaterFirst, STATE_ORBIT_RADIUS - 1) {
            rows = h5::meta_index(&group, orbit + delta)?;
            if !rows.is_empty() {
                dark.orbit = Some(orbit + delta);
                break;
            }
        }
        if rows.is_empty() {
            return Ok(dark);
        }
        dark.found = true;
        info!(
            "applied SDMF Dark data (v3.0) of orbit: {} ({})",
            dark.orbit.unwrap_or(orbit),
            rows.len()
        );

        let meta: Vec<CalibMeta> = h5::meta_table(&group)?;
        let mut averager = ReadoutAverager::new(AverageMode::Separate, range.len());
        for &row in &rows {
            let m = match meta.get(row) {
                Some(m) => m,
                None => continue,
            };
            if skip_readout(channel, m.saaFlag == 1, m.orbitPhase) {
                continue;
            }
            let pet = h5::read_column(VERSION, &group, "readoutPet", range.clone(), row)?;
            for (ch, p) in dark.pet.iter_mut().enumerate() {
                if channel == 0 {
                    *p = pet[ch * CHANNEL_SIZE];
                } else if usize::from(channel) == ch + 1 {
                    *p = pet[0];
                }
            }
            let signal = h5::read_column(VERSION, &group, "readoutMean", range.clone(), row)?;
            let noise = h5::read_column(VERSION, &group, "readoutNoise", range.clone(), row)?;
            averager.add(&signal.to_vec(), &noise.to_vec());
        }
        let averaged = averager.finish();
        dark.signal = averaged.signal;
        dark.noise = averaged.noise;
        remove_mem_nlin(
            self.tables.as_ref(),
            range.start,
            &averaged.signal_count,
            dark.signal.as_slice_mut().unwrap_or(&mut []),
        );
        Ok(dark)
    }

    fn orbital_dark(&self, orbit: i32, orbit_phase: f32) -> Result<FittedDark, SdmfError> {
        let mut dark = FittedDark::not_found(8);
        let file = h5::open(&self.root.join("sdmf_simudark.h5"))?;
        let group = file.group("ch8")?;
        let row = match h5::meta_index(&group, orbit)?.first() {
            Some(&r) => r,
            None => return Ok(dark),
        };
        let meta: Vec<SimuDarkMeta> = h5::meta_table(&group)?;
        let m = match meta.get(row) {
            Some(m) => *m,
            None => return Ok(dark),
        };

        let read = |name: &str| h5::read_column(VERSION, &group, name, 0..CHANNEL_SIZE, row);
        dark.analog_offset = read("ao")?;
        dark.dark_current = read("lc")?;
        dark.analog_offset_error = read("sig_ao")?;
        dark.dark_current_error = read("sig_lc")?;
        let amp1 = read("amp1")?;
        let sig_amp1 = read("sig_amp1")?;

        let phase = f64::from(orbit_phase);
        let first = (2.0 * PI * (f64::from(m.orbitPhase) + phase)).cos();
        let second = (4.0 * PI * (f64::from(m.phase2) + phase)).cos();
        let orbvar = (first + f64::from(m.amp2) * second) as f32;
        let orbsig = (first + f64::from(m.sig_amp2) * second) as f32;
        dark.dark_current.scaled_add(orbvar, &amp1);
        dark.dark_current_error.scaled_add(orbsig, &sig_amp1);

        dark.found = true;
        dark.orbit = Some(m.absOrbit);
        info!("applied SDMF SimuDark (v3.0) of orbit: {}", m.absOrbit);
        Ok(dark)
    }
}
