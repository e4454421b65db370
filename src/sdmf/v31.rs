// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The version 3.1 database, `sdmf_dark.h5`.
//!
//! Its metaTables have one row per orbit (row `orbit - 1`). A row is usable
//! when enough dark states went into it.

#![allow(non_snake_case)]

use std::path::PathBuf;

use hdf5::{Group, H5Type};
use log::{debug, info};

use super::{
    clusconf::state_pet, h5, pixel_range, DarkDatabase, FittedDark, SdmfError, SdmfVersion,
    StateDark,
};
const VERSION: SdmfVersion = SdmfVersion::V31;

/// Rows built from fewer dark states than this are not used.
const MIN_STATE_COUNT: u16 = 3;

#[derive(H5Type, Clone, Copy, Debug)]
#[repr(C)]
struct Dark2Meta {
    absOrbit: u16,
    quality: u16,
    stateCount: u16,
}

/// Walk outward from the row of `orbit` until a row with enough states is
/// found. The walk ends at the first row outside the table.
fn find_row(group: &Group, orbit: i32) -> Result<Option<(usize, Dark2Meta)>, SdmfError> {
    let meta: Vec<Dark2Meta> = h5::meta_table(group)?;
    let mut delta = 0i32;
    loop {
        let index = orbit - 1 + delta;
        if index <= 0 || index as usize >= meta.len() {
            return Ok(None);
        }
        let m = meta[index as usize];
        if m.stateCount >= MIN_STATE_COUNT {
            return Ok(Some((index as usize, m)));
        }
        delta = if delta > 0 { -delta } else { 1 - delta };
    }
}

pub struct Sdmf31Db {
    root: PathBuf,
}

impl Sdmf31Db {
    pub fn new(root: PathBuf) -> Sdmf31Db {
        Sdmf31Db { root }
    }
}

impl DarkDatabase for Sdmf31Db {
    fn version(&self) -> SdmfVersion {
        VERSION
    }

    fn resolve(&self, channel: u8, orbit: i32) -> Result<FittedDark, SdmfError> {
        let range = pixel_range(channel)?;
        let file = h5::open(&self.root.join("sdmf_dark.h5"))?;
        let group = file.group("/DarkFit")?;
        let (row, m) = match find_row(&group, orbit)? {
            Some(r) => r,
            None => return Ok(FittedDark::not_found(channel)),
        };
        info!(
            "applied SDMF Dark data (v3.1) of orbit: {} [{}]",
            m.absOrbit, m.stateCount
        );

        let read = |name: &str| h5::read_row(VERSION, &group, name, range.clone(), row);
        let mut dark = FittedDark::not_found(channel);
        dark.analog_offset = read("analogOffset")?;
        dark.dark_current = read("darkCurrent")?;
        dark.analog_offset_error = read("analogOffsetError")?;
        dark.dark_current_error = read("darkCurrentError")?;
        dark.mean_noise = read("meanNoise")?;
        dark.chi_square = read("chiSquareFit")?;
        dark.probability = read("probabilityFit")?;
        dark.found = true;
        dark.orbit = Some(i32::from(m.absOrbit));
        dark.quality = Some(i32::from(m.quality));
        Ok(dark)
    }

    fn state_dark(&self, state_id: u8, channel: u8, orbit: i32) -> Result<StateDark, SdmfError> {
        let range = pixel_range(channel)?;
        let mut dark = StateDark::not_found(state_id, channel);
        let file = h5::open(&self.root.join("sdmf_dark.h5"))?;
        let group = file.group(&format!("State_{state_id:02}"))?;
        let (row, m) = match find_row(&group, orbit)? {
            Some(r) => r,
            None => return Ok(dark),
        };
        info!(
            "applied SDMF Dark data (v3.1) of orbit: {} ({})",
            m.absOrbit, m.stateCount
        );

        dark.signal = h5::read_row(VERSION, &group, "darkSignal", range.clone(), row)?;
        dark.noise = h5::read_row(VERSION, &group, "darkNoise", range, row)?;
        dark.found = true;
        dark.orbit = Some(i32::from(m.absOrbit));

        // The database has no exposure times; take them from the state
        // configuration.
        match state_pet(state_id, i32::from(m.absOrbit)) {
            Ok(Some(pet)) => {
                for (ch, (p, q)) in dark.pet.iter_mut().zip(pet).enumerate() {
                    if channel == 0 || usize::from(channel) == ch + 1 {
                        *p = q;
                    }
                }
            }
            _ => debug!("no exposure times for state {state_id:02} in orbit {}", m.absOrbit),
        }
        Ok(dark)
    }

    fn orbital_dark(&self, _orbit: i32, _orbit_phase: f32) -> Result<FittedDark, SdmfError> {
        // The fitted darks of this version already include the orbital
        // variation.
        Ok(FittedDark::not_found(8))
    }
}
