// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Time stamps of Level-0 packets.
//!
//! All times are Julian days since 2000-01-01 (MJD2000). A packet's time is
//! its ISP sensing time, plus the read-out delay of its state, plus the
//! broadcast counter of the sub-record the time refers to.

use hifitime::Epoch;

use super::HousekeepingError;
use crate::{
    constants::MAX_NUM_STATE,
    lv0::{
        Mds0Aux, Mds0Det, Mds0Pmd, PmdPacket, AUX_SYNC, NUM_LV0_AUX_BCP, NUM_LV0_AUX_PMTC_FRAME,
        PMD_SYNC,
    },
};

/// Read-out delay of each state in units of 1/256 s.
const READOUT_DELAY: [u16; MAX_NUM_STATE] = [
    86, 86, 86, 86, 86, 86, 86, 86, 86, 86, //
    86, 86, 86, 86, 86, 86, 86, 86, 86, 86, //
    86, 86, 86, 86, 86, 86, 86, 86, 86, 86, //
    86, 86, 86, 86, 86, 86, 86, 86, 86, 86, //
    86, 86, 86, 86, 86, 86, 86, 86, 86, 86, //
    86, 86, 86, 86, 86, 86, 86, 86, 111, 86, //
    303, 86, 86, 86, 86, 86, 86, 86, 111, 303,
];

/// MJD2000 epoch expressed as a modified Julian date.
const MJD2000_OFFSET: f64 = 51544.0;

/// The read-out delay of a state, in seconds.
pub fn readout_delay(state_id: u8) -> Result<f64, HousekeepingError> {
    usize::from(state_id)
        .checked_sub(1)
        .and_then(|i| READOUT_DELAY.get(i))
        .map(|&ri| f64::from(ri) / 256.0)
        .ok_or(HousekeepingError::InvalidStateId(state_id))
}

/// Seconds between the broadcast counter and the assembly of a PMD
/// sub-packet.
fn pmd_delay(packet: &PmdPacket) -> f64 {
    (f64::from(packet.time_delta()) / 500.0 - 12.5) / 1e3 + f64::from(packet.bcps) / 16.0
}

/// Time of the first BCP with a valid sync word; NaN when there is none.
pub fn aux_time(aux: &Mds0Aux) -> Result<f64, HousekeepingError> {
    let delay = readout_delay(aux.data_hdr.state_id)?;
    let first = aux
        .frames
        .iter()
        .flat_map(|f| f.bcp.iter())
        .find(|bcp| bcp.sync == AUX_SYNC);
    Ok(match first {
        Some(bcp) => aux
            .annotation
            .isp
            .julian_day(delay + f64::from(bcp.bcps) / 16.0),
        None => f64::NAN,
    })
}

/// Time of a detector packet, taken from the broadcast counter of its first
/// channel.
pub fn det_time(det: &Mds0Det) -> Result<f64, HousekeepingError> {
    let delay = readout_delay(det.data_hdr.state_id)?;
    let bcps = det.data_src.first().map(|c| c.hdr.bcps).unwrap_or(det.bcps);
    Ok(det.annotation.isp.julian_day(delay + f64::from(bcps) / 16.0))
}

/// Time of the first PMD sub-packet with a valid sync word; NaN when there is
/// none.
pub fn pmd_time(pmd: &Mds0Pmd) -> Result<f64, HousekeepingError> {
    let delay = readout_delay(pmd.data_hdr.state_id)?;
    Ok(match pmd.packets.iter().find(|p| p.sync == PMD_SYNC) {
        Some(p) => pmd.annotation.isp.julian_day(delay + pmd_delay(p)),
        None => f64::NAN,
    })
}

/// Time of every BCP of an auxiliary packet, frame by frame. BCPs without a
/// valid sync word are NaN.
pub fn aux_times(aux: &Mds0Aux) -> Result<Vec<f64>, HousekeepingError> {
    let delay = readout_delay(aux.data_hdr.state_id)?;
    let mut times = Vec::with_capacity(NUM_LV0_AUX_PMTC_FRAME * NUM_LV0_AUX_BCP);
    for bcp in aux.frames.iter().flat_map(|f| f.bcp.iter()) {
        times.push(if bcp.sync == AUX_SYNC {
            aux.annotation
                .isp
                .julian_day(delay + f64::from(bcp.bcps) / 16.0)
        } else {
            f64::NAN
        });
    }
    Ok(times)
}

/// Time of every PMD sub-packet. Sub-packets without a valid sync word are
/// NaN.
pub fn pmd_times(pmd: &Mds0Pmd) -> Result<Vec<f64>, HousekeepingError> {
    let delay = readout_delay(pmd.data_hdr.state_id)?;
    Ok(pmd
        .packets
        .iter()
        .map(|p| {
            if p.sync == PMD_SYNC {
                pmd.annotation.isp.julian_day(delay + pmd_delay(p))
            } else {
                f64::NAN
            }
        })
        .collect())
}

/// Convert an MJD2000 Julian day to an [`Epoch`]. NaN gives `None`.
pub fn jday_to_epoch(jday: f64) -> Option<Epoch> {
    if jday.is_finite() {
        Some(Epoch::from_mjd_utc(jday + MJD2000_OFFSET))
    } else {
        None
    }
}
