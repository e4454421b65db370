// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Level-1c records: the readouts of one cluster during one state
//! execution, calibrated in place.

use log::trace;
use ndarray::{Array1, Array2};
use strum_macros::Display;

use super::CalibrationError;
use crate::{
    constants::CHANNEL_SIZE,
    housekeeping::det_pet,
    lv0::Mds0Det,
};

/// The viewing geometry of a state.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    #[strum(serialize = "nadir")]
    Nadir,
    #[strum(serialize = "limb")]
    Limb,
    #[strum(serialize = "occultation")]
    Occultation,
    #[strum(serialize = "monitor")]
    Monitor,
}

/// Geometry of one readout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ObsGeometry {
    /// Solar zenith angle at the surface \[deg\]; nadir only.
    pub sun_zenith: f32,
    /// Position of the elevation scan mirror \[deg\].
    pub esm_pos: f32,
    /// Limb only: the readout starts a scan at a new tangent height.
    pub new_scan: bool,
}

/// Fractional polarisation (Stokes Q/I and U/I) per readout and pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Polarisation {
    pub q: Array2<f32>,
    pub u: Array2<f32>,
}

/// The state a set of records belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateInfo {
    pub state_id: u8,
    pub source: Source,
    pub orbit_phase: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mds1c {
    pub state_id: u8,
    pub clus_id: u8,
    /// 1-8.
    pub chan_id: u8,
    pub source: Source,
    pub coaddf: u8,
    /// Pixel exposure time \[s\].
    pub pet: f32,
    /// Absolute pixel numbers (0-8191).
    pub pixel_ids: Vec<u16>,
    /// Signal, one row per readout.
    pub pixel_val: Array2<f32>,
    /// Error on the signal, one row per readout. It holds a variance until
    /// the precision is calculated.
    pub pixel_err: Array2<f32>,
    pub pixel_wv: Array1<f32>,
    pub pixel_wv_err: Array1<f32>,
    pub geometry: Vec<ObsGeometry>,
    /// Memory or non-linearity correction encoded by the Level-1b processor,
    /// one row per readout. Absent for data decoded from Level 0.
    pub encoded_corr: Option<Array2<i8>>,
    /// Straylight encoded by the Level-1b processor, one row per readout.
    pub stray: Option<Array2<u8>>,
    /// Scale factor of the encoded straylight of this channel.
    pub stray_scale: u8,
    pub polarisation: Option<Polarisation>,
    /// -1 once radiance units are applied.
    pub rad_units: i8,
}

impl Mds1c {
    /// A record with `num_obs` zeroed readouts of `num_pixels` pixels
    /// starting at detector pixel `start` of `chan_id`.
    pub fn new(
        state_id: u8,
        clus_id: u8,
        chan_id: u8,
        start: u16,
        num_pixels: usize,
        num_obs: usize,
    ) -> Mds1c {
        let first = usize::from(chan_id.max(1) - 1) * CHANNEL_SIZE + usize::from(start);
        Mds1c {
            state_id,
            clus_id,
            chan_id,
            source: Source::Nadir,
            coaddf: 1,
            pet: 1.0,
            pixel_ids: (first..first + num_pixels).map(|p| p as u16).collect(),
            pixel_val: Array2::zeros((num_obs, num_pixels)),
            pixel_err: Array2::zeros((num_obs, num_pixels)),
            pixel_wv: Array1::zeros(num_pixels),
            pixel_wv_err: Array1::zeros(num_pixels),
            geometry: vec![ObsGeometry::default(); num_obs],
            encoded_corr: None,
            stray: None,
            stray_scale: 0,
            polarisation: None,
            rad_units: 0,
        }
    }

    pub fn num_obs(&self) -> usize {
        self.pixel_val.nrows()
    }

    pub fn num_pixels(&self) -> usize {
        self.pixel_ids.len()
    }

    /// Channel pixel (0-1023) of the first pixel.
    pub fn first_channel_pixel(&self) -> usize {
        self.pixel_ids
            .first()
            .map(|&p| usize::from(p) % CHANNEL_SIZE)
            .unwrap_or(0)
    }

    /// Absolute pixel number of the first pixel.
    pub fn first_pixel(&self) -> usize {
        self.pixel_ids.first().map(|&p| usize::from(p)).unwrap_or(0)
    }

    pub(crate) fn bad(&self, reason: impl Into<String>) -> CalibrationError {
        CalibrationError::BadRecord {
            state_id: self.state_id,
            clus_id: self.clus_id,
            reason: reason.into(),
        }
    }

    /// Build one record per cluster from the detector packets of one state
    /// execution. The cluster layout is taken from the first packet; every
    /// following packet adds one readout.
    pub fn from_det_state(det: &[Mds0Det], source: Source) -> Result<Vec<Mds1c>, CalibrationError> {
        let first = match det.first() {
            Some(d) => d,
            None => return Ok(vec![]),
        };
        let state_id = first.data_hdr.state_id;

        let mut records = vec![];
        for chan in &first.data_src {
            let pet = det_pet(&chan.hdr).pet[0];
            for clus in &chan.clusters {
                let mut rec = Mds1c::new(
                    state_id,
                    clus.hdr.cluster_id,
                    chan.hdr.id(),
                    clus.hdr.start,
                    usize::from(clus.hdr.length),
                    det.len(),
                );
                rec.source = source;
                rec.coaddf = clus.hdr.co_adding.max(1);
                rec.pet = pet;
                records.push(rec);
            }
        }

        for (nobs, packet) in det.iter().enumerate() {
            for rec in records.iter_mut() {
                let clus = packet
                    .data_src
                    .iter()
                    .filter(|c| c.hdr.id() == rec.chan_id)
                    .flat_map(|c| c.clusters.iter())
                    .find(|c| c.hdr.cluster_id == rec.clus_id)
                    .ok_or_else(|| rec.bad(format!("missing from readout {nobs}")))?;
                let samples = clus.samples();
                if samples.len() != rec.num_pixels() {
                    return Err(rec.bad(format!(
                        "readout {nobs} has {} pixels, expected {}",
                        samples.len(),
                        rec.num_pixels()
                    )));
                }
                for (v, s) in rec.pixel_val.row_mut(nobs).iter_mut().zip(samples) {
                    *v = s as f32;
                }
            }
        }
        trace!(
            "state {state_id:02}: {} clusters, {} readouts",
            records.len(),
            det.len()
        );
        Ok(records)
    }
}
