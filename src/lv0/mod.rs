// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Decoding of SCIAMACHY Level-0 instrument source packets.
//!
//! A Level-0 measurement data set is a sequence of packets, each being a
//! 32-byte annotation, a 6-byte packet header and a packet data field. The
//! data field starts with a common data-field header; its packet ID tells
//! whether the packet is a detector, auxiliary or PMD packet.
//!
//! Reading happens in two passes. [`scan_packets`] walks a stream and records
//! where every packet is ([`Mds0Info`]). The `read_*` functions then decode
//! the requested packets from those positions.

mod auxiliary;
mod bitfield;
mod clusdef;
mod det;
mod endian;
mod error;
mod headers;
mod pmd;

pub use auxiliary::*;
pub use bitfield::BitField;
pub use clusdef::*;
pub use det::*;
pub use endian::{Normalize, RawReader, WireRecord};
pub use error::{Lv0Error, Lv0Warning};
pub use headers::*;
pub use pmd::*;

use std::io::{Read, Seek, SeekFrom};
use std::ops::{Deref, DerefMut};

use byteorder::{BigEndian, ByteOrder};
use log::{debug, trace};
use strum_macros::{Display, EnumIter};

use endian::decode;

/// The three kinds of Level-0 packets, with their packet IDs.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    #[strum(serialize = "detector")]
    Det = 1,

    #[strum(serialize = "auxiliary")]
    Aux = 2,

    #[strum(serialize = "PMD")]
    Pmd = 3,
}

impl PacketType {
    pub fn from_id(id: u8) -> Option<PacketType> {
        match id {
            1 => Some(PacketType::Det),
            2 => Some(PacketType::Aux),
            3 => Some(PacketType::Pmd),
            _ => None,
        }
    }
}

/// Where a packet lives in the stream, and what it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mds0Info {
    /// Byte offset of the packet annotation.
    pub offset: u64,
    /// `None` if the packet ID is not one of the known types.
    pub packet_type: Option<PacketType>,
    pub category: u8,
    pub state_id: u8,
    pub length: u16,
    pub bcps: u16,
    pub on_board_time: u32,
    pub isp: Mjd,
    /// 1-based counter of the state executions in the stream.
    pub state_index: u16,
}

/// Who owns the buffer that decoded records are written into.
pub enum AllocStrategy<'a, T> {
    /// Return records in a new `Vec`.
    CalleeAllocates,

    /// Write records into this buffer. It is cleared first; its capacity is
    /// kept.
    CallerProvides(&'a mut Vec<T>),
}

/// Records decoded with an [`AllocStrategy`].
#[derive(Debug)]
pub enum Records<'a, T> {
    Owned(Vec<T>),
    Borrowed(&'a mut Vec<T>),
}

impl<'a, T> AllocStrategy<'a, T> {
    fn into_records(self, capacity: usize) -> Records<'a, T> {
        match self {
            AllocStrategy::CalleeAllocates => Records::Owned(Vec::with_capacity(capacity)),
            AllocStrategy::CallerProvides(buf) => {
                buf.clear();
                buf.reserve(capacity);
                Records::Borrowed(buf)
            }
        }
    }
}

impl<T> Deref for Records<'_, T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        match self {
            Records::Owned(v) => v,
            Records::Borrowed(v) => v,
        }
    }
}

impl<T> DerefMut for Records<'_, T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        match self {
            Records::Owned(v) => v,
            Records::Borrowed(v) => v,
        }
    }
}

/// The result of reading packets: the records and the non-fatal problems
/// encountered along the way.
#[derive(Debug)]
pub struct Lv0Read<'a, T> {
    pub records: Records<'a, T>,
    pub warnings: Vec<Lv0Warning>,
}

/// Access to the ISP sensing time of a record.
pub trait IspTime {
    fn isp_mut(&mut self) -> &mut Mjd;
}

impl IspTime for Mds0Aux {
    fn isp_mut(&mut self) -> &mut Mjd {
        &mut self.annotation.isp
    }
}

impl IspTime for Mds0Det {
    fn isp_mut(&mut self) -> &mut Mjd {
        &mut self.annotation.isp
    }
}

impl IspTime for Mds0Pmd {
    fn isp_mut(&mut self) -> &mut Mjd {
        &mut self.annotation.isp
    }
}

impl IspTime for Mds0Info {
    fn isp_mut(&mut self) -> &mut Mjd {
        &mut self.isp
    }
}

/// Replace missing ISP times (zero days) with the time of the previous
/// record, or of the next record for the first one.
pub fn fill_isp_times<T: IspTime>(records: &mut [T]) {
    for i in 0..records.len() {
        if records[i].isp_mut().days != 0 {
            continue;
        }
        let source = if i > 0 {
            *records[i - 1].isp_mut()
        } else if let Some(next) = records.get_mut(1) {
            *next.isp_mut()
        } else {
            continue;
        };
        debug!("Filled the ISP time of record {i}");
        *records[i].isp_mut() = source;
    }
}

const PACKET_PREFIX_LENGTH: usize = Annotation::SIZE + PacketHeader::SIZE;

fn read_exact_or<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    what: &'static str,
    index: usize,
) -> Result<(), Lv0Error> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => Lv0Error::Truncated { what, index },
        _ => Lv0Error::IO(e),
    })
}

/// Read the annotation, packet header and data field of one packet.
fn read_packet<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    index: usize,
) -> Result<(Annotation, PacketHeader, Vec<u8>), Lv0Error> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut prefix = [0; PACKET_PREFIX_LENGTH];
    read_exact_or(reader, &mut prefix, "packet annotation", index)?;
    let mut r = RawReader::new(&prefix);
    let annotation: Annotation = decode(&mut r, "packet annotation", index)?;
    let packet_hdr: PacketHeader = decode(&mut r, "packet header", index)?;

    let mut data_field = vec![0; packet_hdr.data_field_len()];
    read_exact_or(reader, &mut data_field, "packet data field", index)?;
    Ok((annotation, packet_hdr, data_field))
}

/// Walk the packets of a measurement data set starting at `offset`. When
/// `size` is given, the scan stops after that many bytes, otherwise at the
/// end of the stream.
pub fn scan_packets<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    size: Option<u64>,
) -> Result<Vec<Mds0Info>, Lv0Error> {
    let end = size.map(|s| offset + s);
    let mut infos: Vec<Mds0Info> = vec![];
    let mut pos = offset;
    loop {
        if end.map(|e| pos >= e).unwrap_or(false) {
            break;
        }
        // A clean end of the stream between packets ends the scan.
        reader.seek(SeekFrom::Start(pos))?;
        let mut probe = [0u8; 1];
        if reader.read(&mut probe)? == 0 {
            break;
        }

        let index = infos.len();
        let (annotation, packet_hdr, data_field) = read_packet(reader, pos, index)?;
        let mut r = RawReader::new(&data_field);
        let data_hdr: DataHeader = decode(&mut r, "data header", index)?;
        let packet_type = PacketType::from_id(data_hdr.packet());
        let bcps_offset = match packet_type {
            Some(PacketType::Det) => Some(DataHeader::SIZE),
            Some(PacketType::Aux) => Some(DataHeader::SIZE + PmtcHeader::SIZE + 2),
            Some(PacketType::Pmd) => Some(DataHeader::SIZE + 4),
            None => None,
        };
        let bcps = bcps_offset
            .and_then(|o| data_field.get(o..o + 2))
            .map(BigEndian::read_u16)
            .unwrap_or(0);

        trace!(
            "packet {index} at {pos}: {:?}, state {}",
            packet_type,
            data_hdr.state_id
        );
        infos.push(Mds0Info {
            offset: pos,
            packet_type,
            category: data_hdr.category,
            state_id: data_hdr.state_id,
            length: packet_hdr.length,
            bcps,
            on_board_time: data_hdr.on_board_time,
            isp: annotation.isp,
            state_index: 0,
        });
        pos += (PACKET_PREFIX_LENGTH + data_field.len()) as u64;
    }

    fill_isp_times(&mut infos);
    assign_state_index(&mut infos);
    Ok(infos)
}

/// Number the state executions: all packets of one state execution carry
/// the ISP sensing time of the state start.
fn assign_state_index(infos: &mut [Mds0Info]) {
    let mut starts: Vec<Mjd> = vec![];
    for info in infos.iter_mut() {
        let position = match starts.iter().position(|m| *m == info.isp) {
            Some(p) => p,
            None => {
                starts.push(info.isp);
                starts.len() - 1
            }
        };
        info.state_index = (position + 1) as u16;
    }
}

fn read_all<'a, R, T, F>(
    reader: &mut R,
    infos: &[Mds0Info],
    alloc: AllocStrategy<'a, T>,
    mut parse: F,
) -> Result<Lv0Read<'a, T>, Lv0Error>
where
    R: Read + Seek,
    T: IspTime,
    F: FnMut(Annotation, PacketHeader, &[u8], usize, &mut Vec<Lv0Warning>) -> Result<T, Lv0Error>,
{
    let mut records = alloc.into_records(infos.len());
    let mut warnings = vec![];
    for (index, info) in infos.iter().enumerate() {
        let (annotation, packet_hdr, data_field) = read_packet(reader, info.offset, index)?;
        records.push(parse(
            annotation,
            packet_hdr,
            &data_field,
            index,
            &mut warnings,
        )?);
    }
    fill_isp_times(&mut records);
    Ok(Lv0Read { records, warnings })
}

/// Read the auxiliary packets described by `infos`.
pub fn read_aux<'a, R: Read + Seek>(
    reader: &mut R,
    infos: &[Mds0Info],
    alloc: AllocStrategy<'a, Mds0Aux>,
) -> Result<Lv0Read<'a, Mds0Aux>, Lv0Error> {
    read_all(reader, infos, alloc, parse_aux)
}

/// Read the detector packets described by `infos`.
pub fn read_det<'a, R: Read + Seek>(
    reader: &mut R,
    infos: &[Mds0Info],
    opts: &DetReadOptions,
    alloc: AllocStrategy<'a, Mds0Det>,
) -> Result<Lv0Read<'a, Mds0Det>, Lv0Error> {
    read_all(reader, infos, alloc, |a, p, d, i, w| {
        parse_det(a, p, d, i, opts, w)
    })
}

/// Read the PMD packets described by `infos`.
pub fn read_pmd<'a, R: Read + Seek>(
    reader: &mut R,
    infos: &[Mds0Info],
    alloc: AllocStrategy<'a, Mds0Pmd>,
) -> Result<Lv0Read<'a, Mds0Pmd>, Lv0Error> {
    read_all(reader, infos, alloc, parse_pmd)
}

/// The subset of `infos` holding packets of the given type.
pub fn select_packets(infos: &[Mds0Info], packet_type: PacketType) -> Vec<Mds0Info> {
    infos
        .iter()
        .filter(|i| i.packet_type == Some(packet_type))
        .copied()
        .collect()
}
