// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! PMD packets: a temperature word followed by 200 PMD sub-packets.

use log::warn;
use static_assertions::const_assert_eq;

use super::{
    bitfield::pmd_time,
    endian::{decode, Normalize, RawReader, WireRecord},
    Annotation, DataHeader, Lv0Error, Lv0Warning, PacketHeader, PacketType,
};
use crate::constants::PMD_NUMBER;

pub const PMD_SYNC: u16 = 0xEEEE;
pub const NUM_LV0_PMD_PACKET: usize = 200;
pub const PMD_DATA_SRC_LENGTH: usize = 6802;

const PMD_PACKET_LENGTH: usize = 2 + 2 * PMD_NUMBER * 2 + 2 + 2;
const_assert_eq!(2 + NUM_LV0_PMD_PACKET * PMD_PACKET_LENGTH, PMD_DATA_SRC_LENGTH);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PmdPacket {
    pub sync: u16,
    /// Two readouts of each PMD.
    pub data: [[u16; PMD_NUMBER]; 2],
    pub bcps: u16,
    pub time: u16,
}

impl PmdPacket {
    pub fn time_is(&self) -> u8 {
        pmd_time::IS.get(self.time.into()) as u8
    }

    pub fn time_delta(&self) -> u16 {
        pmd_time::DELTA.get(self.time.into()) as u16
    }
}

impl Normalize for PmdPacket {
    fn normalize(&mut self) {
        self.sync.normalize();
        self.data.iter_mut().for_each(Normalize::normalize);
        self.bcps.normalize();
        self.time.normalize();
    }
}

impl WireRecord for PmdPacket {
    const SIZE: usize = PMD_PACKET_LENGTH;

    fn read_raw(r: &mut RawReader) -> Option<PmdPacket> {
        let sync = r.u16()?;
        let mut data = [[0; PMD_NUMBER]; 2];
        for v in data.iter_mut().flatten() {
            *v = r.u16()?;
        }
        Some(PmdPacket {
            sync,
            data,
            bcps: r.u16()?,
            time: r.u16()?,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Mds0Pmd {
    pub annotation: Annotation,
    pub packet_hdr: PacketHeader,
    pub data_hdr: DataHeader,
    /// Raw PMD block temperature.
    pub temp: u16,
    pub packets: Vec<PmdPacket>,
}

/// Parse the data field of a PMD packet. A sub-packet with a sync word other
/// than 0 or [`PMD_SYNC`] ends the decoding; the remaining sub-packets stay
/// zeroed.
pub(super) fn parse_pmd(
    annotation: Annotation,
    packet_hdr: PacketHeader,
    data_field: &[u8],
    index: usize,
    warnings: &mut Vec<Lv0Warning>,
) -> Result<Mds0Pmd, Lv0Error> {
    let mut r = RawReader::new(data_field);
    let data_hdr: DataHeader = decode(&mut r, "PMD data header", index)?;
    if data_hdr.packet() != PacketType::Pmd as u8 {
        return Err(Lv0Error::WrongPacketType {
            index,
            expected: PacketType::Pmd,
            found: data_hdr.packet(),
        });
    }
    let src = r.take(PMD_DATA_SRC_LENGTH).ok_or(Lv0Error::Truncated {
        what: "PMD source data",
        index,
    })?;
    let mut r = RawReader::new(src);
    let mut temp = r.u16().ok_or(Lv0Error::Truncated {
        what: "PMD temperature",
        index,
    })?;
    temp.normalize();

    let mut packets = vec![PmdPacket::default(); NUM_LV0_PMD_PACKET];
    for (i_packet, packet) in packets.iter_mut().enumerate() {
        let decoded: PmdPacket = decode(&mut r, "PMD packet", index)?;
        if decoded.sync != 0 && decoded.sync != PMD_SYNC {
            let w = Lv0Warning::PmdSync {
                index,
                packet: i_packet,
                sync: decoded.sync,
            };
            warn!("{w}");
            warnings.push(w);
            break;
        }
        *packet = decoded;
    }

    Ok(Mds0Pmd {
        annotation,
        packet_hdr,
        data_hdr,
        temp,
        packets,
    })
}
