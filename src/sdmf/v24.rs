// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The version 2.4 database: flat files listed in `MonitorList.dat`.
//!
//! All files are little endian.

use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info};
use ndarray::Array1;

use super::{
    average::{is_twilight, AverageMode, ReadoutAverager},
    pixel_range,
    search::{
        search_offsets, SearchOrder, GOOD_QUALITY, MAX_FITTED_ORBIT_DISTANCE, MIN_QUALITY,
        STATE_ORBIT_RADIUS,
    },
    DarkDatabase, FittedDark, OrbitPhaseCorrection, Sdmf24Select, SdmfError, SdmfVersion,
    StateDark,
};
use crate::constants::{CHANNEL_SIZE, SCIENCE_CHANNELS, SCIENCE_PIXELS};

/// Size of one entry of `MonitorList.dat`.
pub(crate) const MONITOR_ENTRY_SIZE: usize = 182;
const FILE_NAME_SIZE: usize = 70;
const NUM_ENTRY_INTS: usize = 28;

/// Size of one record of a `.monitor` file.
pub(crate) const MONITOR_RECORD_SIZE: usize = 131148;
const MONITOR_HEADER_SIZE: usize = MONITOR_RECORD_SIZE - 4 * SCIENCE_PIXELS * 4;

/// Offset of the quality word in a `.darkcurrent` file.
pub(crate) const DARKCURRENT_QUALITY_OFFSET: usize = 56;

/// Number of orbit phase bins of an `.orbital` file.
pub(crate) const NUM_ORBIT_DARK: usize = 72;

/// State IDs in the order of [`MonitorEntry::state_count`].
const STATE_LIST: [u8; 16] = [65, 46, 63, 67, 26, 8, 16, 48, 39, 61, 62, 52, 59, 69, 70, 1];

/// At most this many monitor records are averaged into a state dark.
const MAX_MONITOR_RECORDS: usize = 10;

/// Quality a monitor entry needs for the mimic-hanss state dark.
const HANSS_MIN_QUALITY: i32 = 90;

/// Maximum orbit distance of an orbital dark entry.
const MAX_ORBITAL_ORBIT_DISTANCE: i32 = 50;

/// One entry of `MonitorList.dat`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MonitorEntry {
    pub(crate) file_name: String,
    pub(crate) orbit: i32,
    pub(crate) magic_number: i32,
    pub(crate) state_count: [i32; 16],
    pub(crate) quality: i32,
    pub(crate) quality_smooth_mask: i32,
    pub(crate) consolidated: i32,
    pub(crate) transmission: i32,
    pub(crate) wls_transmission: i32,
    pub(crate) pixel_gain: i32,
    pub(crate) orbital: i32,
    pub(crate) orbital_data: i32,
    pub(crate) orbital_fit: i32,
    pub(crate) smr: i32,
}

impl MonitorEntry {
    pub(crate) fn parse(buf: &[u8]) -> MonitorEntry {
        let file_name = String::from_utf8_lossy(&buf[..FILE_NAME_SIZE])
            .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
            .to_string();
        let mut ints = [0i32; NUM_ENTRY_INTS];
        LittleEndian::read_i32_into(&buf[FILE_NAME_SIZE..MONITOR_ENTRY_SIZE], &mut ints);
        let mut state_count = [0; 16];
        state_count.copy_from_slice(&ints[2..18]);
        MonitorEntry {
            file_name,
            orbit: ints[0],
            magic_number: ints[1],
            state_count,
            quality: ints[18],
            quality_smooth_mask: ints[19],
            consolidated: ints[20],
            transmission: ints[21],
            wls_transmission: ints[22],
            pixel_gain: ints[23],
            orbital: ints[24],
            orbital_data: ints[25],
            orbital_fit: ints[26],
            smr: ints[27],
        }
    }

    #[cfg(test)]
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0; MONITOR_ENTRY_SIZE];
        let name = self.file_name.as_bytes();
        let n = name.len().min(FILE_NAME_SIZE);
        buf[..n].copy_from_slice(&name[..n]);
        let mut ints = vec![self.orbit, self.magic_number];
        ints.extend_from_slice(&self.state_count);
        ints.extend_from_slice(&[
            self.quality,
            self.quality_smooth_mask,
            self.consolidated,
            self.transmission,
            self.wls_transmission,
            self.pixel_gain,
            self.orbital,
            self.orbital_data,
            self.orbital_fit,
            self.smr,
        ]);
        LittleEndian::write_i32_into(&ints, &mut buf[FILE_NAME_SIZE..MONITOR_ENTRY_SIZE]);
        buf
    }
}

/// The databases indexed by `MonitorList.dat` that are used here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MonitorDb {
    Fitted,
    Orbital,
}

impl MonitorDb {
    fn description(self) -> &'static str {
        match self {
            MonitorDb::Fitted => "Fitted Dark correction",
            MonitorDb::Orbital => "Orbital Dark correction",
        }
    }

    fn max_orbit_distance(self) -> i32 {
        match self {
            MonitorDb::Fitted => MAX_FITTED_ORBIT_DISTANCE,
            MonitorDb::Orbital => MAX_ORBITAL_ORBIT_DISTANCE,
        }
    }

    fn location(self) -> (&'static str, &'static str) {
        match self {
            MonitorDb::Fitted => ("DarkCurrent", "darkcurrent"),
            MonitorDb::Orbital => ("OrbitalVariation/Transmission", "orbital"),
        }
    }

    fn accepts(self, entry: &MonitorEntry) -> bool {
        match self {
            MonitorDb::Fitted => entry.quality > MIN_QUALITY,
            MonitorDb::Orbital => entry.orbital != 0,
        }
    }
}

/// One record of a `.monitor` file.
struct MonitorRecord {
    state_id: i32,
    phase: f32,
    pet: Vec<f32>,
    signal: Vec<f32>,
    noise: Vec<f32>,
}

impl MonitorRecord {
    fn parse(buf: &[u8]) -> MonitorRecord {
        let array = |n: usize| {
            let start = MONITOR_HEADER_SIZE + n * SCIENCE_PIXELS * 4;
            let mut out = vec![0.0; SCIENCE_PIXELS];
            LittleEndian::read_f32_into(&buf[start..start + SCIENCE_PIXELS * 4], &mut out);
            out
        };
        MonitorRecord {
            state_id: LittleEndian::read_i32(&buf[12..16]),
            phase: LittleEndian::read_f32(&buf[24..28]),
            pet: array(0),
            signal: array(1),
            // array 2 holds the errors, which are not used
            noise: array(3),
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, SdmfError> {
    std::fs::read(path).map_err(|err| SdmfError::Open {
        path: path.to_path_buf(),
        err,
    })
}

fn read_f32_block(
    buf: &[u8],
    offset: usize,
    len: usize,
    what: &'static str,
    path: &Path,
) -> Result<Vec<f32>, SdmfError> {
    let bytes = buf.get(offset..offset + 4 * len).ok_or_else(|| SdmfError::Truncated {
        what,
        path: path.to_path_buf(),
    })?;
    let mut out = vec![0.0; len];
    LittleEndian::read_f32_into(bytes, &mut out);
    Ok(out)
}

/// The version 2.4 database below `root`.
pub struct Sdmf24Db {
    root: PathBuf,
    select: Sdmf24Select,
    phase: Box<dyn OrbitPhaseCorrection + Send + Sync>,
}

impl Sdmf24Db {
    pub fn new(
        root: PathBuf,
        select: Sdmf24Select,
        phase: Box<dyn OrbitPhaseCorrection + Send + Sync>,
    ) -> Sdmf24Db {
        Sdmf24Db {
            root,
            select,
            phase,
        }
    }

    /// Entries of `MonitorList.dat` within `max_distance` orbits of `orbit`
    /// that pass the NRT/consolidated selection.
    fn monitor_list(&self, orbit: i32, max_distance: i32) -> Result<Vec<MonitorEntry>, SdmfError> {
        let path = self.root.join("MonitorList.dat");
        let buf = read_file(&path)?;
        Ok(buf
            .chunks_exact(MONITOR_ENTRY_SIZE)
            .map(MonitorEntry::parse)
            .filter(|e| (e.orbit - orbit).abs() <= max_distance)
            .filter(|e| !self.select.nrt || e.consolidated == 0)
            .filter(|e| !self.select.consolidated || e.consolidated == 1)
            .collect())
    }

    /// The file of database `db` to use for `orbit`, with its orbit.
    fn file_entry(&self, db: MonitorDb, orbit: i32) -> Result<Option<(PathBuf, i32)>, SdmfError> {
        let max_distance = db.max_orbit_distance();
        let entries: Vec<MonitorEntry> = self
            .monitor_list(orbit, max_distance)?
            .into_iter()
            .filter(|e| db.accepts(e))
            .collect();

        let (dir, ext) = db.location();
        let mut found: Option<(PathBuf, i32)> = None;
        let mut best_quality = MIN_QUALITY;
        'search: for delta in search_offsets(SearchOrder::LaterFirst, max_distance) {
            for e in entries.iter().filter(|e| e.orbit == orbit + delta) {
                if e.quality > best_quality {
                    best_quality = e.quality;
                    let path = self.root.join(dir).join(format!("{}.{ext}", e.file_name));
                    found = Some((path, e.orbit));
                    if db != MonitorDb::Fitted || best_quality >= GOOD_QUALITY {
                        break 'search;
                    }
                }
            }
        }
        match &found {
            Some((path, _)) => info!(
                "SDMF(2.4): {} read from file: {}",
                db.description(),
                path.display()
            ),
            None => info!(
                "SDMF(2.4): {} - no applicable data for orbit {orbit}",
                db.description()
            ),
        }
        Ok(found)
    }

    /// Monitor files holding state `state_id` for the orbit nearest to
    /// `orbit`.
    fn monitor_files(&self, state_id: u8, orbit: i32) -> Result<(Vec<PathBuf>, i32), SdmfError> {
        let state_index = STATE_LIST.iter().position(|&s| s == state_id);
        let hanss = self.select.mimic_hanss;
        let entries: Vec<MonitorEntry> = self
            .monitor_list(orbit, STATE_ORBIT_RADIUS)?
            .into_iter()
            .filter(|e| {
                if hanss {
                    e.quality > HANSS_MIN_QUALITY
                } else {
                    state_index.map(|i| e.state_count[i] != 0).unwrap_or(false)
                }
            })
            .collect();

        let max_files = if hanss { 1 } else { MAX_MONITOR_RECORDS };
        let mut files = vec![];
        let mut fnd_orbit = orbit;
        for delta in search_offsets(SearchOrder::EarlierFirst, STATE_ORBIT_RADIUS - 1) {
            for e in entries.iter().filter(|e| e.orbit == orbit + delta) {
                files.push(
                    self.root
                        .join("Data")
                        .join(format!("{}.monitor", e.file_name)),
                );
                if files.len() == max_files {
                    break;
                }
            }
            if !files.is_empty() {
                fnd_orbit = orbit + delta;
                break;
            }
        }
        if files.is_empty() {
            info!("SDMF(2.4): State Dark correction - no applicable data for orbit {orbit}");
        } else {
            for f in &files {
                info!("SDMF(2.4): State Dark correction applied from file {}", f.display());
            }
        }
        Ok((files, fnd_orbit))
    }
}

impl DarkDatabase for Sdmf24Db {
    fn version(&self) -> SdmfVersion {
        SdmfVersion::V24
    }

    fn resolve(&self, channel: u8, orbit: i32) -> Result<FittedDark, SdmfError> {
        let range = pixel_range(channel)?;
        let (path, fnd_orbit) = match self.file_entry(MonitorDb::Fitted, orbit)? {
            Some(e) => e,
            None => return Ok(FittedDark::not_found(channel)),
        };
        let buf = read_file(&path)?;
        let quality = buf
            .get(DARKCURRENT_QUALITY_OFFSET..DARKCURRENT_QUALITY_OFFSET + 4)
            .map(LittleEndian::read_i32)
            .ok_or_else(|| SdmfError::Truncated {
                what: "quality",
                path: path.clone(),
            })?;

        let read = |n: usize, what: &'static str| -> Result<Array1<f32>, SdmfError> {
            let offset = DARKCURRENT_QUALITY_OFFSET + 4 + n * SCIENCE_PIXELS * 4;
            let all = read_f32_block(&buf, offset, SCIENCE_PIXELS, what, &path)?;
            Ok(Array1::from(all[range.clone()].to_vec()))
        };
        let mut dark = FittedDark::not_found(channel);
        dark.analog_offset = read(0, "analogOffs")?;
        dark.dark_current = read(1, "darkCurrent")?;
        dark.analog_offset_error = read(2, "analogOffsError")?;
        dark.dark_current_error = read(3, "darkCurrentError")?;
        dark.chi_square = read(4, "chiSquareFit")?;
        dark.found = true;
        dark.orbit = Some(fnd_orbit);
        dark.quality = Some(quality);
        Ok(dark)
    }

    fn state_dark(&self, state_id: u8, channel: u8, orbit: i32) -> Result<StateDark, SdmfError> {
        let range = pixel_range(channel)?;
        let mut dark = StateDark::not_found(state_id, channel);
        let (files, fnd_orbit) = self.monitor_files(state_id, orbit)?;
        if files.is_empty() {
            return Ok(dark);
        }

        let hanss = self.select.mimic_hanss;
        let phase_diff = self.phase.phase_diff(orbit);
        let mut records: Vec<MonitorRecord> = vec![];
        'files: for path in &files {
            let buf = read_file(path)?;
            for chunk in buf.chunks_exact(MONITOR_RECORD_SIZE) {
                let mut rec = MonitorRecord::parse(chunk);
                if rec.state_id != i32::from(state_id) {
                    continue;
                }
                rec.phase += phase_diff;
                if !hanss {
                    if is_twilight(rec.phase) {
                        continue;
                    }
                    if records.iter().any(|r| r.phase == rec.phase) {
                        continue;
                    }
                }
                records.push(rec);
                if records.len() == MAX_MONITOR_RECORDS {
                    break 'files;
                }
            }
        }
        if records.is_empty() {
            return Ok(dark);
        }
        debug!("SDMF(2.4): averaging {} monitor records of state {state_id:02}", records.len());

        let mode = if hanss {
            AverageMode::JointPlainNoise
        } else {
            AverageMode::Joint
        };
        let mut averager = ReadoutAverager::new(mode, range.len());
        let mut pet = [0.0f32; SCIENCE_CHANNELS];
        for rec in &records {
            for (ch, p) in pet.iter_mut().enumerate() {
                *p += rec.pet[ch * CHANNEL_SIZE];
            }
            averager.add(&rec.signal[range.clone()], &rec.noise[range.clone()]);
        }
        let num = records.len() as f32;
        for (ch, p) in pet.iter_mut().enumerate() {
            let selected = channel == 0 || usize::from(channel) == ch + 1;
            *p = if selected { *p / num } else { 0.0 };
        }
        let averaged = averager.finish();
        dark.found = true;
        dark.orbit = Some(fnd_orbit);
        dark.pet = pet;
        dark.signal = averaged.signal;
        dark.noise = averaged.noise;
        Ok(dark)
    }

    fn orbital_dark(&self, orbit: i32, orbit_phase: f32) -> Result<FittedDark, SdmfError> {
        let mut dark = self.resolve(8, orbit)?;
        if !dark.found {
            return Err(SdmfError::NoFittedDark(SdmfVersion::V24, orbit));
        }

        let mut phase = orbit_phase - self.phase.phase_diff(orbit);
        if phase < 0.0 {
            phase += 1.0;
        }

        let (path, _) = match self.file_entry(MonitorDb::Orbital, orbit)? {
            Some(e) => e,
            None => {
                dark.found = false;
                return Ok(dark);
            }
        };
        let buf = read_file(&path)?;
        let table = read_f32_block(&buf, 0, NUM_ORBIT_DARK * CHANNEL_SIZE, "orbitDark", &path)?;

        let variation = interpolate_orbit_dark(&table, phase);
        for (dc, v) in dark.dark_current.iter_mut().zip(variation) {
            if dc.is_normal() && v.is_normal() {
                *dc += v;
            }
        }
        Ok(dark)
    }
}

/// Interpolate the table of `.orbital` files (one channel per orbit phase
/// bin) at `phase`.
pub(crate) fn interpolate_orbit_dark(table: &[f32], phase: f32) -> Vec<f32> {
    let bins = NUM_ORBIT_DARK as f32;
    let nd = (0..NUM_ORBIT_DARK)
        .find(|&nd| phase <= nd as f32 / bins)
        .unwrap_or(NUM_ORBIT_DARK);
    let lo = nd.saturating_sub(1);
    let hi = nd.min(NUM_ORBIT_DARK - 1);
    let row = |n: usize| &table[n * CHANNEL_SIZE..(n + 1) * CHANNEL_SIZE];
    if lo == hi {
        return row(lo).to_vec();
    }
    let (x0, x1) = (lo as f32 / bins, hi as f32 / bins);
    let frac = (phase - x0) / (x1 - x0);
    row(lo)
        .iter()
        .zip(row(hi))
        .map(|(&a, &b)| a + frac * (b - a))
        .collect()
}
