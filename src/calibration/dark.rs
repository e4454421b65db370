// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Dark-signal corrections.
//!
//! Three variants exist:
//! - [`DarkStrategy::State`](super::DarkStrategy::State) subtracts the
//!   average signal of the dark states, measured with the same exposure
//!   time (or interpolated between two others);
//! - [`DarkStrategy::Sron`](super::DarkStrategy::Sron) subtracts the analog
//!   offset and leakage current fitted by the SDMF;
//! - [`DarkStrategy::Atbd`](super::DarkStrategy::Atbd) subtracts the analog
//!   offset and leakage current of the product's CLCP, plus the orbit
//!   dependent part from the VLCP.
//!
//! When errors are calculated, `pixel_err` receives the shot noise before
//! the correction and the error of the correction after it; both are
//! variances.

use log::{debug, info, warn};
use ndarray::{s, Array1, ArrayView1};

use super::{
    interp::linear, require, CalibContext, CalibFlags, CalibrationError, FileParams, KeyData,
    Mds1c, Source, StateInfo, Vlcp,
};
use crate::{
    constants::{
        CHANNEL_SIZE, FIRST_INFRA_CHAN, IR_CHANNELS, SCIENCE_CHANNELS, SCIENCE_PIXELS,
        VIS_SCIENCE_PIXELS,
    },
    sdmf::{inverse_chan2, DarkDatabase, SdmfVersion, DARK_STATES},
};

/// Delay of the Epitaxx detectors (channels 6-8) between reset and readout
/// \[s\], which does not add to the exposure.
pub(crate) const EPITAXX_DELAY: f32 = 1.18125e-3;

/// Number of exposure times kept per channel by the state dark.
const NUM_DARK_SLOTS: usize = 5;

/// Weights of dark states measured outside and inside the SAA.
const WEIGHT_NO_SAA: u16 = 10;
const WEIGHT_SAA: u16 = 1;

/// The limb state whose dark readouts are at the start of the state.
const LIMB_DARK_FIRST_STATE: u8 = 27;

/// The exposure time of a record corrected for the detector delay.
pub(crate) fn corrected_intg(rec: &Mds1c) -> f32 {
    let intg = f32::from(rec.coaddf) * rec.pet;
    if rec.chan_id >= FIRST_INFRA_CHAN {
        (intg - EPITAXX_DELAY).max(0.0)
    } else {
        intg
    }
}

fn electron_bu(params: &FileParams, rec: &Mds1c) -> f32 {
    params
        .electron_bu
        .get(usize::from(rec.chan_id.max(1) - 1))
        .copied()
        .unwrap_or(1e10)
}

/// Analog offset and leakage current of all science pixels.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DarkData {
    pub(crate) analog_offs: Array1<f32>,
    pub(crate) dark_current: Array1<f32>,
    pub(crate) analog_offs_error: Array1<f32>,
    pub(crate) dark_current_error: Array1<f32>,
    pub(crate) mean_noise: Array1<f32>,
}

impl DarkData {
    fn zeros() -> DarkData {
        DarkData {
            analog_offs: Array1::zeros(SCIENCE_PIXELS),
            dark_current: Array1::zeros(SCIENCE_PIXELS),
            analog_offs_error: Array1::zeros(SCIENCE_PIXELS),
            dark_current_error: Array1::zeros(SCIENCE_PIXELS),
            mean_noise: Array1::zeros(SCIENCE_PIXELS),
        }
    }

    /// Drop the parts of the correction that are not selected.
    fn select(&mut self, flags: CalibFlags) {
        if !flags.contains(CalibFlags::AO) {
            self.analog_offs.fill(0.0);
            self.analog_offs_error.fill(0.0);
        }
        if !flags.contains(CalibFlags::DARK) {
            self.dark_current.fill(0.0);
            self.dark_current_error.fill(0.0);
        }
    }

    /// The constant dark of the product's CLCP.
    pub(crate) fn from_clcp(keydata: &dyn KeyData, flags: CalibFlags) -> Result<DarkData, CalibrationError> {
        let clcp = require(keydata.clcp(), "CLCP")?;
        let mut dark = DarkData::zeros();
        let copy = |dst: &mut Array1<f32>, src: &Array1<f32>| {
            for (d, &v) in dst.iter_mut().zip(src.iter()) {
                *d = v;
            }
        };
        copy(&mut dark.analog_offs, &clcp.fpn);
        copy(&mut dark.analog_offs_error, &clcp.fpn_error);
        copy(&mut dark.dark_current, &clcp.lc);
        copy(&mut dark.dark_current_error, &clcp.lc_error);
        copy(&mut dark.mean_noise, &clcp.mean_noise);
        dark.select(flags);
        Ok(dark)
    }

    /// The constant dark fitted by the SDMF. `None` when the database has
    /// no fit near `orbit`.
    pub(crate) fn from_sdmf(
        db: &dyn DarkDatabase,
        keydata: &dyn KeyData,
        orbit: i32,
        flags: CalibFlags,
    ) -> Result<Option<DarkData>, CalibrationError> {
        let fitted = db.resolve(0, orbit)?;
        if !fitted.found {
            info!("no SDMF Dark data");
            return Ok(None);
        }
        let mut dark = DarkData {
            analog_offs: fitted.analog_offset,
            dark_current: fitted.dark_current,
            analog_offs_error: fitted.analog_offset_error,
            dark_current_error: fitted.dark_current_error,
            mean_noise: fitted.mean_noise,
        };
        for a in [
            &mut dark.analog_offs,
            &mut dark.analog_offs_error,
            &mut dark.dark_current,
            &mut dark.dark_current_error,
        ] {
            if let Some(v) = a.as_slice_mut() {
                inverse_chan2(v);
            }
        }
        if db.version() == SdmfVersion::V31 {
            if let Some(v) = dark.mean_noise.as_slice_mut() {
                inverse_chan2(v);
            }
        } else {
            let clcp = require(keydata.clcp(), "CLCP")?;
            dark.mean_noise = clcp.mean_noise.clone();
        }
        dark.select(flags);
        Ok(Some(dark))
    }

    /// Replace channel 8 by the SDMF dark at this orbit phase. Version 2.4
    /// provides the leakage current only.
    pub(crate) fn add_orbital_sdmf(
        &mut self,
        db: &dyn DarkDatabase,
        orbit: i32,
        orbit_phase: f32,
    ) -> Result<(), CalibrationError> {
        let orbital = db.orbital_dark(orbit, orbit_phase)?;
        if !orbital.found {
            info!("no SDMF orbitalDark data");
            return Ok(());
        }
        let ch8 = s![7 * CHANNEL_SIZE..SCIENCE_PIXELS];
        self.dark_current.slice_mut(ch8).assign(&orbital.dark_current);
        if db.version() != SdmfVersion::V24 {
            self.analog_offs.slice_mut(ch8).assign(&orbital.analog_offset);
            self.analog_offs_error
                .slice_mut(ch8)
                .assign(&orbital.analog_offset_error);
            self.dark_current_error
                .slice_mut(ch8)
                .assign(&orbital.dark_current_error);
        }
        Ok(())
    }

    /// Add the variable leakage current (channels 6-8, VDARK) and the solar
    /// straylight (all channels, VSTRAY) of the VLCP at this orbit phase.
    pub(crate) fn add_orbital_vlcp(
        &mut self,
        vlcp: &[Vlcp],
        params: &FileParams,
        flags: CalibFlags,
        source: Source,
        orbit_phase: f32,
    ) -> Result<(), CalibrationError> {
        let (low, high, frac) =
            vlcp_interval(vlcp, orbit_phase).ok_or(CalibrationError::MissingKeyData("VLCP"))?;
        if vlcp.iter().any(|v| {
            v.var_lc.len() < IR_CHANNELS * CHANNEL_SIZE
                || v.var_lc_error.len() < IR_CHANNELS * CHANNEL_SIZE
                || v.solar_stray.len() < SCIENCE_PIXELS
                || v.solar_stray_error.len() < SCIENCE_PIXELS
        }) {
            return Err(CalibrationError::IncompleteKeyData("VLCP"));
        }
        let (low, high) = (&vlcp[low], &vlcp[high]);

        let add = |dst: &mut [f32], err: &mut [f32], lo: ArrayView1<f32>, hi: ArrayView1<f32>, lo_err: ArrayView1<f32>| {
            for (((d, e), (&l, &h)), &le) in dst
                .iter_mut()
                .zip(err.iter_mut())
                .zip(lo.iter().zip(hi.iter()))
                .zip(lo_err.iter())
            {
                *d += (1.0 - frac) * l + frac * h;
                *e += le;
            }
        };

        if flags.contains(CalibFlags::VDARK) {
            for (nch, scope) in params.do_var_lc_cha.iter().enumerate() {
                if !scope.applies_to(source) {
                    continue;
                }
                let chan = s![nch * CHANNEL_SIZE..(nch + 1) * CHANNEL_SIZE];
                let pix = VIS_SCIENCE_PIXELS + nch * CHANNEL_SIZE;
                let pix = pix..pix + CHANNEL_SIZE;
                let (dc, dce) = (
                    self.dark_current.as_slice_mut(),
                    self.dark_current_error.as_slice_mut(),
                );
                if let (Some(dc), Some(dce)) = (dc, dce) {
                    add(
                        &mut dc[pix.clone()],
                        &mut dce[pix],
                        low.var_lc.slice(chan),
                        high.var_lc.slice(chan),
                        low.var_lc_error.slice(chan),
                    );
                }
            }
        }
        if flags.contains(CalibFlags::VSTRAY) {
            for (nch, scope) in params.do_stray_lc_cha.iter().enumerate() {
                if !scope.applies_to(source) {
                    continue;
                }
                let pix = nch * CHANNEL_SIZE..(nch + 1) * CHANNEL_SIZE;
                let chan = s![pix.clone()];
                let (dc, dce) = (
                    self.dark_current.as_slice_mut(),
                    self.dark_current_error.as_slice_mut(),
                );
                if let (Some(dc), Some(dce)) = (dc, dce) {
                    add(
                        &mut dc[pix.clone()],
                        &mut dce[pix],
                        low.solar_stray.slice(chan),
                        high.solar_stray.slice(chan),
                        low.solar_stray_error.slice(chan),
                    );
                }
            }
        }
        Ok(())
    }
}

/// The two VLCP records to interpolate between at `orbit_phase`, and the
/// weight of the second.
///
/// The records are taken to describe the intervals between consecutive
/// phases; the table is closed over the orbit by repeating the last record
/// in front and the first at the end.
pub(crate) fn vlcp_interval(vlcp: &[Vlcp], orbit_phase: f32) -> Option<(usize, usize, f32)> {
    let n = vlcp.len();
    if n == 0 {
        return None;
    }
    // Extended table: [last, all..., first].
    let index: Vec<usize> = std::iter::once(n - 1)
        .chain(0..n)
        .chain(std::iter::once(0))
        .collect();
    let num = index.len();
    let mut phase: Vec<f32> = index.iter().map(|&i| vlcp[i].orbit_phase).collect();
    phase[num - 1] = 1.0;
    for nd in 1..num - 1 {
        phase[nd] = (phase[nd] + phase[nd + 1]) / 2.0;
    }
    phase[0] = phase[num - 2] - 1.0;
    phase[num - 1] = phase[1] + 1.0;

    let nd_low = match phase.iter().position(|&p| orbit_phase < p) {
        None => num - 2,
        Some(0) => 0,
        Some(nd) => nd - 1,
    };
    let width = phase[nd_low + 1] - phase[nd_low];
    let frac = if width == 0.0 {
        0.0
    } else {
        (orbit_phase - phase[nd_low]) / width
    };
    Some((index[nd_low], index[nd_low + 1], frac))
}

/// Shot noise of the signal, as a variance.
fn shot_noise(rec: &mut Mds1c, electron_bu: f32, offset: &[f32], noise: &[f32]) {
    let coaddf = f32::from(rec.coaddf);
    for (row_val, mut row_err) in rec.pixel_val.rows().into_iter().zip(rec.pixel_err.rows_mut()) {
        for (((e, &sig), &ao), &mn) in row_err
            .iter_mut()
            .zip(row_val.iter())
            .zip(offset.iter())
            .zip(noise.iter())
        {
            *e = (sig - coaddf * ao).abs() / electron_bu + coaddf * mn * mn;
        }
    }
}

/// Values of the record's pixels from an array covering all science pixels.
pub(crate) fn pixel_values(data: &Array1<f32>, rec: &Mds1c) -> Vec<f32> {
    rec.pixel_ids
        .iter()
        .map(|&p| data.get(usize::from(p)).copied().unwrap_or(0.0))
        .collect()
}

/// Values of the record's pixels from an array covering one channel.
fn channel_values(data: &Array1<f32>, rec: &Mds1c) -> Vec<f32> {
    rec.pixel_ids
        .iter()
        .map(|&p| data.get(usize::from(p) % CHANNEL_SIZE).copied().unwrap_or(0.0))
        .collect()
}

/// Subtract the dark of limb readouts measured at the top of the
/// atmosphere: the last readouts of the state, or the first of state 27.
/// Returns the number of readouts averaged.
pub(crate) fn apply_limb_dark(rec: &mut Mds1c) -> usize {
    let num_obs = rec.num_obs();
    if num_obs == 0 {
        return 0;
    }
    let n = ((0.5 + 1.5 / (f32::from(rec.coaddf) * rec.pet)) as usize).clamp(1, num_obs);
    let rows: Vec<usize> = if rec.state_id == LIMB_DARK_FIRST_STATE {
        (0..n).collect()
    } else {
        (num_obs - n..num_obs).rev().collect()
    };
    let mut limb_dark = Array1::<f32>::zeros(rec.num_pixels());
    for &r in &rows {
        limb_dark += &rec.pixel_val.row(r);
    }
    limb_dark /= n as f32;
    for mut row in rec.pixel_val.rows_mut() {
        row -= &limb_dark;
    }
    n
}

/// Subtract the analog offset and leakage current.
fn apply_fitted(dark: &DarkData, intg: f32, rec: &mut Mds1c) {
    let coaddf = f32::from(rec.coaddf);
    let ao = pixel_values(&dark.analog_offs, rec);
    let dc = pixel_values(&dark.dark_current, rec);
    for mut row in rec.pixel_val.rows_mut() {
        for ((sig, &a), &d) in row.iter_mut().zip(ao.iter()).zip(dc.iter()) {
            *sig -= coaddf * a + intg * d;
        }
    }
}

/// Apply a fitted dark (SRON or ATBD) to all records of a state.
pub(crate) fn correct_fitted(
    dark: &DarkData,
    params: &FileParams,
    flags: CalibFlags,
    records: &mut [Mds1c],
) {
    let calc_error = flags.contains(CalibFlags::CALC_ERROR);
    for rec in records.iter_mut() {
        let limb = rec.source == Source::Limb && flags.contains(CalibFlags::LDARK);
        let mn = pixel_values(&dark.mean_noise, rec);
        if calc_error {
            let ao = pixel_values(&dark.analog_offs, rec);
            shot_noise(rec, electron_bu(params, rec), &ao, &mn);
        }
        let coaddf = f32::from(rec.coaddf);
        if limb {
            let n = apply_limb_dark(rec) as f32;
            if calc_error {
                for mut row in rec.pixel_err.rows_mut() {
                    for (e, &m) in row.iter_mut().zip(mn.iter()) {
                        *e += coaddf * m * m / n;
                    }
                }
            }
        } else {
            let intg = corrected_intg(rec);
            apply_fitted(dark, intg, rec);
            if calc_error {
                let ao_err = pixel_values(&dark.analog_offs_error, rec);
                let dc_err = pixel_values(&dark.dark_current_error, rec);
                for mut row in rec.pixel_err.rows_mut() {
                    for ((e, &a), &d) in row.iter_mut().zip(ao_err.iter()).zip(dc_err.iter()) {
                        *e += coaddf * a * a + intg * intg * d * d;
                    }
                }
            }
        }
    }
}

/// The ATBD dark correction.
pub(crate) fn correct_atbd(
    ctx: &CalibContext,
    params: &FileParams,
    flags: CalibFlags,
    state: &StateInfo,
    records: &mut [Mds1c],
) -> Result<(), CalibrationError> {
    let mut dark = DarkData::from_clcp(ctx.keydata, flags)?;
    if flags.intersects(CalibFlags::VDARK | CalibFlags::VSTRAY) {
        dark.add_orbital_vlcp(
            ctx.keydata.vlcp(),
            params,
            flags,
            state.source,
            state.orbit_phase,
        )?;
    }
    correct_fitted(&dark, params, flags, records);
    Ok(())
}

/// The SRON dark correction.
pub(crate) fn correct_sron(
    ctx: &CalibContext,
    db: &dyn DarkDatabase,
    params: &FileParams,
    flags: CalibFlags,
    state: &StateInfo,
    records: &mut [Mds1c],
) -> Result<(), CalibrationError> {
    let mut dark = match DarkData::from_sdmf(db, ctx.keydata, params.abs_orbit, flags)? {
        Some(d) => d,
        None => return Ok(()),
    };
    if flags.intersects(CalibFlags::VDARK | CalibFlags::VSTRAY) {
        dark.add_orbital_sdmf(db, params.abs_orbit, state.orbit_phase)?;
    }
    correct_fitted(&dark, params, flags, records);
    Ok(())
}

/// Average dark signal of the dark states at one exposure time.
#[derive(Debug, Clone)]
struct DarkSlot {
    num: u16,
    saa: u16,
    pet: f32,
    val: Array1<f32>,
    sdev: Array1<f32>,
}

/// State darks at up to five exposure times per channel.
#[derive(Debug, Clone)]
pub(crate) struct StateDarkTable {
    /// Indexed by channel, then slot.
    slots: Vec<Vec<DarkSlot>>,
}

impl StateDarkTable {
    fn new() -> StateDarkTable {
        let slot = DarkSlot {
            num: 0,
            saa: 0,
            pet: 0.0,
            val: Array1::zeros(CHANNEL_SIZE),
            sdev: Array1::zeros(CHANNEL_SIZE),
        };
        StateDarkTable {
            slots: vec![vec![slot; NUM_DARK_SLOTS]; SCIENCE_CHANNELS],
        }
    }

    /// Weighted average of the DARK_AVERAGE records of the product.
    pub(crate) fn from_keydata(keydata: &dyn KeyData) -> StateDarkTable {
        let mut table = StateDarkTable::new();
        let averages = keydata.dark_averages();
        if averages.is_empty() {
            warn!("no DARK_AVERAGE found");
            return table;
        }
        for avg in averages {
            if avg.dark_spec.len() < SCIENCE_PIXELS || avg.sdev_dark_spec.len() < SCIENCE_PIXELS {
                warn!("incomplete DARK_AVERAGE of state {:02} skipped", avg.state_id);
                continue;
            }
            let mut channel = 0;
            for setup in &avg.setup {
                if setup.channel == channel {
                    continue;
                }
                channel = setup.channel;
                if channel == 0 || usize::from(channel) > SCIENCE_CHANNELS {
                    continue;
                }
                let ch = usize::from(channel - 1);
                let slot = match table.slots[ch]
                    .iter_mut()
                    .find(|s| s.num == 0 || s.pet == setup.pet)
                {
                    Some(s) => s,
                    None => continue,
                };
                let wght = if avg.saa {
                    slot.saa += 1;
                    WEIGHT_SAA
                } else {
                    WEIGHT_NO_SAA
                };
                slot.num += wght;
                slot.pet = setup.pet;

                let w = f32::from(wght);
                let coaddf = f32::from(setup.coaddf.max(1));
                let offs = ch * CHANNEL_SIZE;
                let dark = avg.dark_spec.slice(s![offs..offs + CHANNEL_SIZE]);
                let sdev = avg.sdev_dark_spec.slice(s![offs..offs + CHANNEL_SIZE]);
                for ((v, sd), (&d, &n)) in slot
                    .val
                    .iter_mut()
                    .zip(slot.sdev.iter_mut())
                    .zip(dark.iter().zip(sdev.iter()))
                {
                    let r = w * n;
                    *v += w * d / coaddf;
                    *sd += r * r / coaddf;
                }
            }
        }
        for slot in table.slots.iter_mut().flatten().filter(|s| s.num > 0) {
            let num = f32::from(slot.num);
            slot.val /= num;
            slot.sdev.mapv_inplace(|v| (v / num).sqrt());
        }
        table
    }

    /// The state darks of the SDMF.
    pub(crate) fn from_sdmf(db: &dyn DarkDatabase, orbit: i32) -> Result<StateDarkTable, CalibrationError> {
        let mut table = StateDarkTable::new();
        let mut num_dark = 0;
        for &state_id in DARK_STATES.iter() {
            let dark = db.state_dark(state_id, 0, orbit)?;
            if !dark.found {
                info!("no SDMF state_{state_id:02}");
                continue;
            }
            let mut signal = dark.signal.to_vec();
            inverse_chan2(&mut signal);
            for (ch, slots) in table.slots.iter_mut().enumerate() {
                let slot = &mut slots[num_dark];
                let pix = ch * CHANNEL_SIZE..(ch + 1) * CHANNEL_SIZE;
                slot.num = 1;
                slot.pet = dark.pet[ch];
                for (v, &d) in slot.val.iter_mut().zip(&signal[pix.clone()]) {
                    *v = d;
                }
                for (v, &d) in slot.sdev.iter_mut().zip(dark.noise.slice(s![pix]).iter()) {
                    *v = d;
                }
            }
            num_dark += 1;
        }
        Ok(table)
    }

    fn filled(&self, chan_id: u8) -> impl Iterator<Item = &DarkSlot> {
        self.slots
            .get(usize::from(chan_id.max(1) - 1))
            .into_iter()
            .flatten()
            .filter(|s| s.num > 0)
    }

    /// The dark of one record per coadded readout, `None` when the channel
    /// has no dark.
    fn dark_for(&self, rec: &Mds1c) -> Option<Vec<f32>> {
        if let Some(slot) = self.filled(rec.chan_id).find(|s| s.pet == rec.pet) {
            return Some(channel_values(&slot.val, rec));
        }

        let below = self
            .filled(rec.chan_id)
            .filter(|s| s.pet < rec.pet)
            .min_by(|a, b| (rec.pet - a.pet).total_cmp(&(rec.pet - b.pet)));
        let above = self
            .filled(rec.chan_id)
            .filter(|s| s.pet > rec.pet)
            .min_by(|a, b| (a.pet - rec.pet).total_cmp(&(b.pet - rec.pet)));
        let (lo, hi) = match (below, above) {
            (Some(lo), Some(hi)) => (lo, hi),
            (Some(s), None) | (None, Some(s)) => (s, s),
            (None, None) => return None,
        };
        warn!(
            "state/cluster [{},{}] required interpolation for PET: {:.4}",
            rec.state_id, rec.clus_id, rec.pet
        );
        Some(
            channel_values(&lo.val, rec)
                .into_iter()
                .zip(channel_values(&hi.val, rec))
                .map(|(y1, y2)| {
                    linear(
                        f64::from(rec.pet),
                        f64::from(lo.pet),
                        f64::from(hi.pet),
                        f64::from(y1),
                        f64::from(y2),
                    ) as f32
                })
                .collect(),
        )
    }

    /// The slot with the shortest exposure time, for the shot noise.
    fn shortest(&self, chan_id: u8) -> Option<&DarkSlot> {
        self.filled(chan_id)
            .filter(|s| s.pet < 100.0)
            .min_by(|a, b| a.pet.total_cmp(&b.pet))
    }
}

/// The state dark correction.
pub(crate) fn correct_state(
    ctx: &CalibContext,
    params: &FileParams,
    flags: CalibFlags,
    records: &mut [Mds1c],
) -> Result<(), CalibrationError> {
    let table = if flags.contains(CalibFlags::SRON_DARK) {
        let db = ctx
            .sdmf
            .ok_or(CalibrationError::MissingDatabase(super::Stage::Dark))?;
        StateDarkTable::from_sdmf(db, params.abs_orbit)?
    } else {
        StateDarkTable::from_keydata(ctx.keydata)
    };
    let calc_error = flags.contains(CalibFlags::CALC_ERROR);

    for rec in records.iter_mut() {
        if calc_error {
            if let Some(slot) = table.shortest(rec.chan_id) {
                let val = channel_values(&slot.val, rec);
                let sdev = channel_values(&slot.sdev, rec);
                shot_noise(rec, electron_bu(params, rec), &val, &sdev);
            }
        }
        let dark = match table.dark_for(rec) {
            Some(d) => d,
            None => {
                warn!(
                    "no state dark for channel {} of state {:02}",
                    rec.chan_id, rec.state_id
                );
                continue;
            }
        };
        let coaddf = f32::from(rec.coaddf);
        for mut row in rec.pixel_val.rows_mut() {
            for (sig, &d) in row.iter_mut().zip(dark.iter()) {
                *sig -= coaddf * d;
            }
        }
        if calc_error {
            rec.pixel_err.mapv_inplace(|e| e * 5.0);
        }
        debug!(
            "state dark applied to state {:02} cluster {}",
            rec.state_id, rec.clus_id
        );
    }
    Ok(())
}
