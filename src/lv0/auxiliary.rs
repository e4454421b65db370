// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Auxiliary packets: the PMTC header followed by 5 PMTC frames, each
//! holding 16 basic calibration packets (BCPs) and the optical bench
//! temperatures.

use byteorder::{BigEndian, ByteOrder};
use log::warn;
use static_assertions::const_assert_eq;

use super::{
    bitfield::{bcp_flags, bench, encoder},
    endian::{decode, Normalize, RawReader, WireRecord},
    Annotation, DataHeader, Lv0Error, Lv0Warning, PacketHeader, PacketType, PmtcHeader,
};

pub const AUX_SYNC: u16 = 0xDDDD;
pub const NUM_LV0_AUX_BCP: usize = 16;
pub const NUM_LV0_AUX_PMTC_FRAME: usize = 5;
pub const AUX_DATA_SRC_LENGTH: usize = 1630;

const BCP_LENGTH: usize = 20;
const PMTC_FRAME_LENGTH: usize = NUM_LV0_AUX_BCP * BCP_LENGTH + 3 * 2;
const_assert_eq!(NUM_LV0_AUX_PMTC_FRAME * PMTC_FRAME_LENGTH, AUX_DATA_SRC_LENGTH);

/// One basic calibration packet.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Bcp {
    pub sync: u16,
    pub bcps: u16,
    pub flags: u16,
    /// Azimuth and elevation encoder counters, 20 bits each. Kept in wire
    /// order; see [`Bcp::azi_encode_cntr`].
    pub encoder: [u8; 6],
    pub azi_cntr_error: u16,
    pub ele_cntr_error: u16,
    pub azi_scan_error: u16,
    pub ele_scan_error: u16,
}

impl Bcp {
    pub fn au(&self) -> bool {
        bcp_flags::AU.get(self.flags.into()) == 1
    }
    pub fn eu(&self) -> bool {
        bcp_flags::EU.get(self.flags.into()) == 1
    }
    pub fn d(&self) -> bool {
        bcp_flags::D.get(self.flags.into()) == 1
    }
    pub fn m(&self) -> bool {
        bcp_flags::M.get(self.flags.into()) == 1
    }
    pub fn phase(&self) -> u8 {
        bcp_flags::PHASE.get(self.flags.into()) as u8
    }
    pub fn pointing(&self) -> u8 {
        bcp_flags::POINTING.get(self.flags.into()) as u8
    }

    pub fn azi_encode_cntr(&self) -> u32 {
        encoder::AZI.get(BigEndian::read_u32(&self.encoder[0..4]))
    }

    pub fn ele_encode_cntr(&self) -> u32 {
        encoder::ELE.get(BigEndian::read_u32(&self.encoder[2..6]))
    }
}

impl Normalize for Bcp {
    fn normalize(&mut self) {
        self.sync.normalize();
        self.bcps.normalize();
        self.flags.normalize();
        self.azi_cntr_error.normalize();
        self.ele_cntr_error.normalize();
        self.azi_scan_error.normalize();
        self.ele_scan_error.normalize();
    }
}

impl WireRecord for Bcp {
    const SIZE: usize = BCP_LENGTH;

    fn read_raw(r: &mut RawReader) -> Option<Bcp> {
        let sync = r.u16()?;
        let bcps = r.u16()?;
        let flags = r.u16()?;
        let mut encoder = [0; 6];
        encoder.copy_from_slice(r.take(6)?);
        Some(Bcp {
            sync,
            bcps,
            flags,
            encoder,
            azi_cntr_error: r.u16()?,
            ele_cntr_error: r.u16()?,
            azi_scan_error: r.u16()?,
            ele_scan_error: r.u16()?,
        })
    }
}

/// A raw optical bench temperature word: a 15-bit ADC code and a status bit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BenchWord(pub u16);

impl BenchWord {
    pub fn temp(self) -> u16 {
        bench::TEMP.get(self.0.into()) as u16
    }

    pub fn stat(self) -> u8 {
        bench::STAT.get(self.0.into()) as u8
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PmtcFrame {
    pub bcp: [Bcp; NUM_LV0_AUX_BCP],
    pub bench_rad: BenchWord,
    pub bench_elv: BenchWord,
    pub bench_az: BenchWord,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Mds0Aux {
    pub annotation: Annotation,
    pub packet_hdr: PacketHeader,
    pub data_hdr: DataHeader,
    pub pmtc_hdr: PmtcHeader,
    pub frames: [PmtcFrame; NUM_LV0_AUX_PMTC_FRAME],
}

/// Parse the data field of an auxiliary packet. A BCP with a sync word other
/// than 0 or [`AUX_SYNC`] ends the decoding of its frame; the rest of that
/// frame stays zeroed.
pub(super) fn parse_aux(
    annotation: Annotation,
    packet_hdr: PacketHeader,
    data_field: &[u8],
    index: usize,
    warnings: &mut Vec<Lv0Warning>,
) -> Result<Mds0Aux, Lv0Error> {
    let mut r = RawReader::new(data_field);
    let data_hdr: DataHeader = decode(&mut r, "AUX data header", index)?;
    if data_hdr.packet() != PacketType::Aux as u8 {
        return Err(Lv0Error::WrongPacketType {
            index,
            expected: PacketType::Aux,
            found: data_hdr.packet(),
        });
    }
    let pmtc_hdr = decode(&mut r, "AUX PMTC header", index)?;

    let mut aux = Mds0Aux {
        annotation,
        packet_hdr,
        data_hdr,
        pmtc_hdr,
        ..Default::default()
    };
    for (i_frame, frame) in aux.frames.iter_mut().enumerate() {
        let bytes = r.take(PMTC_FRAME_LENGTH).ok_or(Lv0Error::Truncated {
            what: "AUX PMTC frame",
            index,
        })?;
        if let Some(w) = parse_frame(bytes, frame, index, i_frame)? {
            warn!("{w}");
            warnings.push(w);
        }
    }

    Ok(aux)
}

fn parse_frame(
    bytes: &[u8],
    frame: &mut PmtcFrame,
    index: usize,
    i_frame: usize,
) -> Result<Option<Lv0Warning>, Lv0Error> {
    let mut r = RawReader::new(bytes);
    for (i_bcp, bcp) in frame.bcp.iter_mut().enumerate() {
        let decoded: Bcp = decode(&mut r, "AUX BCP", index)?;
        if decoded.sync != 0 && decoded.sync != AUX_SYNC {
            return Ok(Some(Lv0Warning::AuxSync {
                index,
                frame: i_frame,
                bcp: i_bcp,
                sync: decoded.sync,
            }));
        }
        *bcp = decoded;
    }
    let mut words = [0u16; 3];
    for w in words.iter_mut() {
        *w = r.u16().ok_or(Lv0Error::Truncated {
            what: "AUX bench temperatures",
            index,
        })?;
    }
    words.normalize();
    frame.bench_rad = BenchWord(words[0]);
    frame.bench_elv = BenchWord(words[1]);
    frame.bench_az = BenchWord(words[2]);
    Ok(None)
}
