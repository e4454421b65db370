// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Headers common to all three Level-0 packet types.

use serde::Serialize;

use super::{
    bitfield::{api, packet_id, pmtc_1, rdv, scan_param},
    endian::{Normalize, RawReader, WireRecord},
};

/// ENVISAT time: days since 2000-01-01, seconds and microseconds of the day.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mjd {
    pub days: i32,
    pub secnd: u32,
    pub musec: u32,
}

impl Mjd {
    /// Julian day (MJD2000) with the given extra seconds added.
    pub fn julian_day(self, extra_seconds: f64) -> f64 {
        self.days as f64
            + (self.secnd as f64 + self.musec as f64 / 1e6 + extra_seconds)
                / crate::constants::SEC_PER_DAY
    }
}

impl Normalize for Mjd {
    fn normalize(&mut self) {
        self.days.normalize();
        self.secnd.normalize();
        self.musec.normalize();
    }
}

impl WireRecord for Mjd {
    const SIZE: usize = 12;

    fn read_raw(r: &mut RawReader) -> Option<Mjd> {
        Some(Mjd {
            days: r.i32()?,
            secnd: r.u32()?,
            musec: r.u32()?,
        })
    }
}

/// Front-end processor annotation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FepHeader {
    /// Ground station reception time.
    pub gsrt: Mjd,
    pub isp_length: u16,
    pub crc_errs: u16,
    pub rs_errs: u16,
}

/// The 32-byte annotation preceding every packet: ISP sensing time and the
/// FEP header (plus 2 spare bytes).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub isp: Mjd,
    pub fep: FepHeader,
}

impl Normalize for Annotation {
    fn normalize(&mut self) {
        self.isp.normalize();
        self.fep.gsrt.normalize();
        self.fep.isp_length.normalize();
        self.fep.crc_errs.normalize();
        self.fep.rs_errs.normalize();
    }
}

impl WireRecord for Annotation {
    const SIZE: usize = 32;

    fn read_raw(r: &mut RawReader) -> Option<Annotation> {
        let isp = Mjd::read_raw(r)?;
        let fep = FepHeader {
            gsrt: Mjd::read_raw(r)?,
            isp_length: r.u16()?,
            crc_errs: r.u16()?,
            rs_errs: r.u16()?,
        };
        r.skip(2)?;
        Some(Annotation { isp, fep })
    }
}

/// CCSDS packet header.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub api: u16,
    pub seq_cntrl: u16,
    /// Length of the packet data field minus one.
    pub length: u16,
}

impl PacketHeader {
    pub fn vcid(&self) -> u8 {
        api::VCID.get(self.api.into()) as u8
    }

    pub fn op_mode(&self) -> u8 {
        api::OP_MODE.get(self.api.into()) as u8
    }

    /// Number of bytes in the packet data field (data-field header included).
    pub fn data_field_len(&self) -> usize {
        self.length as usize + 1
    }
}

impl Normalize for PacketHeader {
    fn normalize(&mut self) {
        self.api.normalize();
        self.seq_cntrl.normalize();
        self.length.normalize();
    }
}

impl WireRecord for PacketHeader {
    const SIZE: usize = 6;

    fn read_raw(r: &mut RawReader) -> Option<PacketHeader> {
        Some(PacketHeader {
            api: r.u16()?,
            seq_cntrl: r.u16()?,
            length: r.u16()?,
        })
    }
}

/// The data-field header shared by the detector, auxiliary and PMD packets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    pub length: u16,
    pub category: u8,
    pub state_id: u8,
    pub on_board_time: u32,
    pub rdv: u16,
    pub id: u16,
}

impl DataHeader {
    pub fn hsm(&self) -> u8 {
        rdv::HSM.get(self.rdv.into()) as u8
    }

    pub fn atc_id(&self) -> u8 {
        rdv::ATC_ID.get(self.rdv.into()) as u8
    }

    pub fn config_id(&self) -> u8 {
        rdv::CONFIG_ID.get(self.rdv.into()) as u8
    }

    /// The packet ID (1: detector, 2: auxiliary, 3: PMD).
    pub fn packet(&self) -> u8 {
        packet_id::PACKET.get(self.id.into()) as u8
    }

    pub fn overflow(&self) -> u8 {
        packet_id::OVERFLOW.get(self.id.into()) as u8
    }
}

impl Normalize for DataHeader {
    fn normalize(&mut self) {
        self.length.normalize();
        self.on_board_time.normalize();
        self.rdv.normalize();
        self.id.normalize();
    }
}

impl WireRecord for DataHeader {
    const SIZE: usize = 12;

    fn read_raw(r: &mut RawReader) -> Option<DataHeader> {
        Some(DataHeader {
            length: r.u16()?,
            category: r.u8()?,
            state_id: r.u8()?,
            on_board_time: r.u32()?,
            rdv: r.u16()?,
            id: r.u16()?,
        })
    }
}

/// Scanner parameters of the PMTC header, one for azimuth and one for
/// elevation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanParam(pub u32);

impl ScanParam {
    pub fn scan_type(self) -> u8 {
        scan_param::TYPE.get(self.0) as u8
    }
    pub fn centre(self) -> u8 {
        scan_param::CENTRE.get(self.0) as u8
    }
    pub fn filter(self) -> u8 {
        scan_param::FILTER.get(self.0) as u8
    }
    pub fn invert(self) -> u8 {
        scan_param::INVERT.get(self.0) as u8
    }
    pub fn corr(self) -> u8 {
        scan_param::CORR.get(self.0) as u8
    }
    pub fn rel(self) -> u8 {
        scan_param::REL.get(self.0) as u8
    }
    pub fn h_w(self) -> u8 {
        scan_param::H_W.get(self.0) as u8
    }
    pub fn basic(self) -> u8 {
        scan_param::BASIC.get(self.0) as u8
    }
    pub fn repeat(self) -> u16 {
        scan_param::REPEAT.get(self.0) as u16
    }
}

/// Platform/scanner (PMTC) settings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PmtcHeader {
    pub pmtc_1: u16,
    pub scanner_mode: u16,
    pub az_param: ScanParam,
    pub elv_param: ScanParam,
    pub factor: [u8; 6],
}

impl PmtcHeader {
    pub fn phase(&self) -> u8 {
        pmtc_1::PHASE.get(self.pmtc_1.into()) as u8
    }
    pub fn ndfm(&self) -> u8 {
        pmtc_1::NDFM.get(self.pmtc_1.into()) as u8
    }
    pub fn ncwm(&self) -> u8 {
        pmtc_1::NCWM.get(self.pmtc_1.into()) as u8
    }
    pub fn apsm(&self) -> u8 {
        pmtc_1::APSM.get(self.pmtc_1.into()) as u8
    }
    pub fn wls(&self) -> u8 {
        pmtc_1::WLS.get(self.pmtc_1.into()) as u8
    }
    pub fn sls(&self) -> u8 {
        pmtc_1::SLS.get(self.pmtc_1.into()) as u8
    }
}

impl Normalize for PmtcHeader {
    fn normalize(&mut self) {
        self.pmtc_1.normalize();
        self.scanner_mode.normalize();
        self.az_param.0.normalize();
        self.elv_param.0.normalize();
    }
}

impl WireRecord for PmtcHeader {
    const SIZE: usize = 18;

    fn read_raw(r: &mut RawReader) -> Option<PmtcHeader> {
        let pmtc_1 = r.u16()?;
        let scanner_mode = r.u16()?;
        let az_param = ScanParam(r.u32()?);
        let elv_param = ScanParam(r.u32()?);
        let mut factor = [0; 6];
        factor.copy_from_slice(r.take(6)?);
        Some(PmtcHeader {
            pmtc_1,
            scanner_mode,
            az_param,
            elv_param,
            factor,
        })
    }
}
