// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Detector packets.
//!
//! After the fixed 66-byte header (data-field header, BCPS, PMTC header,
//! orbit vector and channel count) follow a variable number of channels, each
//! with its own header and clusters. A cluster holds `length` samples of 2
//! bytes (no co-adding) or 3 bytes (co-added; padded to an even byte count).
//! The bytes consumed by the channels must add up exactly to the length
//! declared in the packet header.

use byteorder::{BigEndian, ByteOrder};
use log::{debug, warn};
use static_assertions::const_assert_eq;

use super::{
    bitfield::{channel, command_ir, command_vis, ratio_hdr},
    clusdef::{check_cluster, ClusterCheck, ClusterDef, ClusterDefTable, ClusterKey},
    endian::{decode, Normalize, RawReader, WireRecord},
    Annotation, DataHeader, Lv0Error, Lv0Warning, PacketHeader, PacketType, PmtcHeader,
};

pub const CHANNEL_SYNC: u16 = 0xAAAA;
pub const CLUSTER_SYNC: u16 = 0xBBBB;

/// Bytes of the packet data field in front of the channel data.
pub const DET_DATA_HDR_LENGTH: usize = 66;
const_assert_eq!(
    DET_DATA_HDR_LENGTH,
    DataHeader::SIZE + 2 + PmtcHeader::SIZE + 8 * 4 + 2
);

/// Selects all channels.
pub const BAND_ALL: u8 = 0xFF;

/// Is channel `chan_id` (1-8) selected by `chan_mask`?
pub fn selected_channel(chan_mask: u8, chan_id: u8) -> bool {
    chan_mask == BAND_ALL || ((1..=8).contains(&chan_id) && chan_mask & (1 << (chan_id - 1)) != 0)
}

/// The command word of a channel header, interpreted for a visible channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisCommand(pub u32);

impl VisCommand {
    pub fn etf(self) -> u16 {
        command_vis::ETF.get(self.0) as u16
    }
    pub fn mode(self) -> u8 {
        command_vis::MODE.get(self.0) as u8
    }
    pub fn sec(self) -> u16 {
        command_vis::SEC.get(self.0) as u16
    }
    pub fn ratio(self) -> u8 {
        command_vis::RATIO.get(self.0) as u8
    }
    pub fn cntrl(self) -> u8 {
        command_vis::CNTRL.get(self.0) as u8
    }
}

/// The command word of a channel header, interpreted for an infra-red
/// channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrCommand(pub u32);

impl IrCommand {
    pub fn etf(self) -> u16 {
        command_ir::ETF.get(self.0) as u16
    }
    pub fn mode(self) -> u8 {
        command_ir::MODE.get(self.0) as u8
    }
    pub fn comp(self) -> u8 {
        command_ir::COMP.get(self.0) as u8
    }
    pub fn bias(self) -> u8 {
        command_ir::BIAS.get(self.0) as u8
    }
    pub fn pet(self) -> u8 {
        command_ir::PET.get(self.0) as u8
    }
    pub fn cntrl(self) -> u8 {
        command_ir::CNTRL.get(self.0) as u8
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChannelHeader {
    pub sync: u16,
    pub channel: u16,
    pub bcps: u16,
    pub command: u32,
    pub ratio_hdr: u16,
    pub bias: u16,
    pub temp: u16,
}

impl ChannelHeader {
    pub fn id(&self) -> u8 {
        channel::ID.get(self.channel.into()) as u8
    }

    pub fn set_id(&mut self, id: u8) {
        self.channel = channel::ID.set(self.channel.into(), id.into()) as u16;
    }

    /// Interface status.
    pub fn interface_status(&self) -> u8 {
        channel::IS.get(self.channel.into()) as u8
    }

    pub fn latch_up(&self) -> u8 {
        channel::LU.get(self.channel.into()) as u8
    }

    pub fn clusters(&self) -> u8 {
        channel::CLUSTERS.get(self.channel.into()) as u8
    }

    pub fn set_clusters(&mut self, n: u8) {
        self.channel = channel::CLUSTERS.set(self.channel.into(), n.into()) as u16;
    }

    pub fn command_vis(&self) -> VisCommand {
        VisCommand(self.command)
    }

    pub fn command_ir(&self) -> IrCommand {
        IrCommand(self.command)
    }

    pub fn ratio(&self) -> u8 {
        ratio_hdr::RATIO.get(self.ratio_hdr.into()) as u8
    }

    pub fn status(&self) -> u8 {
        ratio_hdr::STATUS.get(self.ratio_hdr.into()) as u8
    }

    pub fn frame(&self) -> u8 {
        ratio_hdr::FRAME.get(self.ratio_hdr.into()) as u8
    }
}

impl Normalize for ChannelHeader {
    fn normalize(&mut self) {
        self.sync.normalize();
        self.channel.normalize();
        self.bcps.normalize();
        self.command.normalize();
        self.ratio_hdr.normalize();
        self.bias.normalize();
        self.temp.normalize();
    }
}

impl WireRecord for ChannelHeader {
    const SIZE: usize = 16;

    fn read_raw(r: &mut RawReader) -> Option<ChannelHeader> {
        Some(ChannelHeader {
            sync: r.u16()?,
            channel: r.u16()?,
            bcps: r.u16()?,
            command: r.u32()?,
            ratio_hdr: r.u16()?,
            bias: r.u16()?,
            temp: r.u16()?,
        })
    }
}

/// The header in front of the samples of one cluster.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClusterHeader {
    pub sync: u16,
    pub block_nr: u16,
    pub cluster_id: u8,
    pub co_adding: u8,
    pub start: u16,
    pub length: u16,
}

impl Normalize for ClusterHeader {
    fn normalize(&mut self) {
        self.sync.normalize();
        self.block_nr.normalize();
        self.start.normalize();
        self.length.normalize();
    }
}

impl WireRecord for ClusterHeader {
    const SIZE: usize = 10;

    fn read_raw(r: &mut RawReader) -> Option<ClusterHeader> {
        Some(ClusterHeader {
            sync: r.u16()?,
            block_nr: r.u16()?,
            cluster_id: r.u8()?,
            co_adding: r.u8()?,
            start: r.u16()?,
            length: r.u16()?,
        })
    }
}

/// Size of the packed samples of a cluster.
pub fn payload_len(co_adding: u8, length: u16) -> usize {
    let length = usize::from(length);
    if co_adding == 1 {
        2 * length
    } else {
        3 * length + length % 2
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClusterSrc {
    pub hdr: ClusterHeader,
    /// Packed samples, in wire order.
    pub data: Vec<u8>,
}

impl ClusterSrc {
    /// Unpack the raw detector counts of this cluster.
    pub fn samples(&self) -> Vec<u32> {
        let n = usize::from(self.hdr.length);
        if self.hdr.co_adding == 1 {
            self.data
                .chunks_exact(2)
                .take(n)
                .map(|c| u32::from(BigEndian::read_u16(c)))
                .collect()
        } else {
            self.data
                .chunks_exact(3)
                .take(n)
                .map(BigEndian::read_u24)
                .collect()
        }
    }
}

/// One channel of a detector packet.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DetSrc {
    pub hdr: ChannelHeader,
    pub clusters: Vec<ClusterSrc>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Mds0Det {
    pub annotation: Annotation,
    pub packet_hdr: PacketHeader,
    pub data_hdr: DataHeader,
    pub bcps: u16,
    pub pmtc_hdr: PmtcHeader,
    pub orbit_vector: [i32; 8],
    /// Number of channels declared in the packet.
    pub num_chan: u16,
    /// The selected channels that have clusters.
    pub data_src: Vec<DetSrc>,
}

/// How detector packets are read.
#[derive(Debug, Clone, Copy)]
pub struct DetReadOptions<'a> {
    /// One bit per channel; see [`selected_channel`].
    pub chan_mask: u8,
    /// Check clusters against `cluster_defs` and repair them.
    pub cluster_correction: bool,
    pub cluster_defs: Option<&'a ClusterDefTable>,
}

impl Default for DetReadOptions<'_> {
    fn default() -> Self {
        DetReadOptions {
            chan_mask: BAND_ALL,
            cluster_correction: false,
            cluster_defs: None,
        }
    }
}

pub(super) fn parse_det(
    annotation: Annotation,
    packet_hdr: PacketHeader,
    data_field: &[u8],
    index: usize,
    opts: &DetReadOptions,
    warnings: &mut Vec<Lv0Warning>,
) -> Result<Mds0Det, Lv0Error> {
    let mut r = RawReader::new(data_field);
    let data_hdr: DataHeader = decode(&mut r, "DET data header", index)?;
    if data_hdr.packet() != PacketType::Det as u8 {
        return Err(Lv0Error::WrongPacketType {
            index,
            expected: PacketType::Det,
            found: data_hdr.packet(),
        });
    }
    let bcps: u16 = decode(&mut r, "DET BCPS", index)?;
    let pmtc_hdr = decode(&mut r, "DET PMTC header", index)?;
    let orbit_vector: [i32; 8] = decode(&mut r, "DET orbit vector", index)?;
    let num_chan: u16 = decode(&mut r, "DET channel count", index)?;

    let det_length = packet_hdr
        .data_field_len()
        .checked_sub(DET_DATA_HDR_LENGTH)
        .ok_or(Lv0Error::BadLength {
            index,
            length: packet_hdr.data_field_len(),
        })?;
    let src = r.take(det_length).ok_or(Lv0Error::Truncated {
        what: "DET source data",
        index,
    })?;

    let defs = opts
        .cluster_defs
        .map(|t| t.get(data_hdr.state_id))
        .unwrap_or_default();
    let data_src = parse_channels(src, num_chan, index, opts, defs, warnings)?;

    Ok(Mds0Det {
        annotation,
        packet_hdr,
        data_hdr,
        bcps,
        pmtc_hdr,
        orbit_vector,
        num_chan,
        data_src,
    })
}

fn parse_channels(
    src: &[u8],
    num_chan: u16,
    index: usize,
    opts: &DetReadOptions,
    defs: &[ClusterDef],
    warnings: &mut Vec<Lv0Warning>,
) -> Result<Vec<DetSrc>, Lv0Error> {
    let mut r = RawReader::new(src);
    let mut channels = Vec::with_capacity(num_chan.into());
    let mut push_warning = |w: Lv0Warning| {
        match w.severity() {
            crate::error::Severity::Info => debug!("{w}"),
            _ => warn!("{w}"),
        }
        warnings.push(w);
    };

    for i_chan in 0..num_chan {
        let mut hdr: ChannelHeader = decode(&mut r, "DET channel header", index)?;
        // The broadcast counter of the first channel dates the packet.
        if i_chan == 0 && hdr.sync != CHANNEL_SYNC {
            return Err(Lv0Error::NoTimeSource {
                index,
                sync: hdr.sync,
            });
        }
        if hdr.sync != CHANNEL_SYNC {
            push_warning(Lv0Warning::ChannelSync {
                index,
                sync: hdr.sync,
            });
            // The remainder can't be trusted, so the size check is moot.
            return Ok(channels);
        }

        let selected = selected_channel(opts.chan_mask, hdr.id());
        let num_clusters = hdr.clusters();
        let mut clusters = Vec::with_capacity(num_clusters.into());
        for _ in 0..num_clusters {
            let mut cl: ClusterHeader = decode(&mut r, "DET cluster header", index)?;
            if cl.sync != CLUSTER_SYNC {
                push_warning(Lv0Warning::ClusterSync {
                    index,
                    channel: hdr.id(),
                    sync: cl.sync,
                });
                if selected {
                    hdr.set_clusters(0);
                    channels.push(DetSrc {
                        hdr,
                        clusters: vec![],
                    });
                }
                return Ok(channels);
            }
            cl.cluster_id &= 0x0F;

            let key = ClusterKey {
                chan_id: hdr.id(),
                clus_id: cl.cluster_id,
                start: cl.start,
                length: cl.length,
            };
            match check_cluster(key, defs, opts.cluster_correction) {
                ClusterCheck::Unchanged => (),
                ClusterCheck::Repaired {
                    field,
                    from,
                    to,
                    fixed,
                } => {
                    push_warning(Lv0Warning::ClusterRepaired {
                        index,
                        field,
                        from,
                        to,
                    });
                    hdr.set_id(fixed.chan_id);
                    cl.cluster_id = fixed.clus_id;
                    cl.start = fixed.start;
                    cl.length = fixed.length;
                }
                ClusterCheck::Failed => {
                    push_warning(Lv0Warning::ClusterBlock {
                        index,
                        channel: hdr.id(),
                    });
                    if selected {
                        hdr.set_clusters(0);
                        channels.push(DetSrc {
                            hdr,
                            clusters: vec![],
                        });
                    }
                    return Ok(channels);
                }
            }

            let num_byte = payload_len(cl.co_adding, cl.length);
            let data = r.take(num_byte).ok_or(Lv0Error::SizeMismatch {
                index,
                consumed: r.position() + num_byte,
                declared: src.len(),
            })?;
            if selected {
                clusters.push(ClusterSrc {
                    hdr: cl,
                    data: data.to_vec(),
                });
            }
        }
        if selected && num_clusters > 0 {
            channels.push(DetSrc { hdr, clusters });
        }
    }

    if r.remaining() != 0 {
        return Err(Lv0Error::SizeMismatch {
            index,
            consumed: r.position(),
            declared: src.len(),
        });
    }
    Ok(channels)
}
