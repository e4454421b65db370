// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Wavelength calibration.

use log::debug;
use ndarray::Array1;

use super::{interp::poly, require, CalibrationError, KeyData, Mds1c, Scp};
use crate::constants::{CHANNEL_SIZE, SCIENCE_CHANNELS, SCIENCE_PIXELS};

/// Number of polynomial coefficients per channel of the SCP.
pub const NUM_SPEC_COEFFS: usize = 5;

/// Wavelength and its error of every science pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveGrid {
    pub science: Array1<f32>,
    pub error: Array1<f32>,
}

/// The SCP record in use at `orbit_phase`: the last one whose phase is
/// below it, or the first.
fn select_scp(scp: &[Scp], orbit_phase: f32) -> Option<&Scp> {
    let mut nd = scp.len().checked_sub(1)?;
    while nd > 0 && orbit_phase <= scp[nd].orbit_phase {
        nd -= 1;
    }
    scp.get(nd)
}

impl WaveGrid {
    /// The detector pixel wavelengths of the BASE GADS, corrected with the
    /// spectral calibration polynomial of every channel with a calibration
    /// accuracy.
    pub fn new(keydata: &dyn KeyData, orbit_phase: f32) -> Result<WaveGrid, CalibrationError> {
        let base = require(keydata.base(), "BASE")?;
        if base.len() < SCIENCE_PIXELS {
            return Err(CalibrationError::IncompleteKeyData("BASE"));
        }
        let scp = select_scp(keydata.scp(), orbit_phase).ok_or(CalibrationError::MissingKeyData("SCP"))?;
        debug!("wavelength calibration of orbit phase {:.3}", scp.orbit_phase);

        let mut science = base.clone();
        let mut error = Array1::zeros(SCIENCE_PIXELS);
        for ch in 0..SCIENCE_CHANNELS {
            let accuracy = scp.wv_error_calib[ch];
            if accuracy < f32::EPSILON {
                continue;
            }
            let coeffs = &scp.coeffs[ch * NUM_SPEC_COEFFS..(ch + 1) * NUM_SPEC_COEFFS];
            for np in 0..CHANNEL_SIZE {
                let pix = ch * CHANNEL_SIZE + np;
                science[pix] += poly(coeffs, np as f64) as f32;
                error[pix] = accuracy;
            }
        }
        Ok(WaveGrid { science, error })
    }

    /// Give every record the wavelengths of its pixels.
    pub fn apply(&self, records: &mut [Mds1c]) {
        for rec in records.iter_mut() {
            for (np, &id) in rec.pixel_ids.iter().enumerate() {
                let id = usize::from(id);
                rec.pixel_wv[np] = self.science.get(id).copied().unwrap_or(f32::NAN);
                rec.pixel_wv_err[np] = self.error.get(id).copied().unwrap_or(f32::NAN);
            }
        }
    }
}
