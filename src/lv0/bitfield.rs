// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Explicit layouts of the packed header words.
//!
//! All words are stored MSB-first on the wire. After endian normalisation a
//! field is extracted from the 16- or 32-bit word with `(word >> shift) & mask`,
//! so nothing depends on how a compiler would lay out bit-fields.

/// A contiguous run of bits inside a 16- or 32-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub shift: u32,
    pub width: u32,
}

impl BitField {
    pub const fn new(shift: u32, width: u32) -> BitField {
        BitField { shift, width }
    }

    /// The mask of this field, before shifting.
    pub const fn mask(self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1 << self.width) - 1
        }
    }

    pub const fn get(self, word: u32) -> u32 {
        (word >> self.shift) & self.mask()
    }

    /// Return `word` with this field replaced by `value` (excess bits of
    /// `value` are dropped).
    pub const fn set(self, word: u32, value: u32) -> u32 {
        let m = self.mask() << self.shift;
        (word & !m) | ((value << self.shift) & m)
    }
}

/// Packet header, application process ID (16 bits).
pub mod api {
    use super::BitField;

    pub const VCID: BitField = BitField::new(5, 5);
    pub const OP_MODE: BitField = BitField::new(0, 5);
}

/// Data-field header, redundancy/ATC word (16 bits).
pub mod rdv {
    use super::BitField;

    pub const HSM: BitField = BitField::new(14, 2);
    pub const ATC_ID: BitField = BitField::new(8, 6);
    pub const CONFIG_ID: BitField = BitField::new(0, 8);
}

/// Data-field header, packet ID word (16 bits).
pub mod packet_id {
    use super::BitField;

    pub const PACKET: BitField = BitField::new(12, 4);
    pub const OVERFLOW: BitField = BitField::new(0, 4);
}

/// PMTC header, first word (16 bits).
pub mod pmtc_1 {
    use super::BitField;

    pub const PHASE: BitField = BitField::new(12, 4);
    pub const NDFM: BitField = BitField::new(8, 2);
    pub const NCWM: BitField = BitField::new(6, 2);
    pub const APSM: BitField = BitField::new(4, 2);
    pub const WLS: BitField = BitField::new(2, 2);
    pub const SLS: BitField = BitField::new(0, 2);
}

/// PMTC header, azimuth and elevation scan parameters (32 bits). The
/// elevation word leaves `TYPE` and `H_W` as spare.
pub mod scan_param {
    use super::BitField;

    pub const TYPE: BitField = BitField::new(31, 1);
    pub const CENTRE: BitField = BitField::new(30, 1);
    pub const FILTER: BitField = BitField::new(29, 1);
    pub const INVERT: BitField = BitField::new(28, 1);
    pub const CORR: BitField = BitField::new(24, 4);
    pub const REL: BitField = BitField::new(20, 4);
    pub const H_W: BitField = BitField::new(16, 4);
    pub const BASIC: BitField = BitField::new(12, 4);
    pub const REPEAT: BitField = BitField::new(0, 12);
}

/// Optical bench temperature words of the AUX PMTC frames (16 bits).
pub mod bench {
    use super::BitField;

    pub const TEMP: BitField = BitField::new(1, 15);
    pub const STAT: BitField = BitField::new(0, 1);
}

/// BCP flags (16 bits).
pub mod bcp_flags {
    use super::BitField;

    pub const AU: BitField = BitField::new(15, 1);
    pub const EU: BitField = BitField::new(14, 1);
    pub const D: BitField = BitField::new(13, 1);
    pub const M: BitField = BitField::new(12, 1);
    pub const PHASE: BitField = BitField::new(8, 4);
    pub const POINTING: BitField = BitField::new(0, 6);
}

/// BCP encoder counters. Azimuth lives in the first 32 bits of the 6-byte
/// block, elevation in the last 32 bits (the two overlap by 2 bytes).
pub mod encoder {
    use super::BitField;

    pub const AZI: BitField = BitField::new(4, 20);
    pub const ELE: BitField = BitField::new(0, 20);
}

/// Detector channel header word (16 bits).
pub mod channel {
    use super::BitField;

    pub const ID: BitField = BitField::new(12, 4);
    pub const IS: BitField = BitField::new(10, 2);
    pub const LU: BitField = BitField::new(8, 2);
    pub const CLUSTERS: BitField = BitField::new(0, 8);
}

/// Detector ratio header (16 bits).
pub mod ratio_hdr {
    use super::BitField;

    pub const RATIO: BitField = BitField::new(11, 5);
    pub const STATUS: BitField = BitField::new(8, 3);
    pub const FRAME: BitField = BitField::new(0, 8);
}

/// Detector command word, visible channel view (32 bits).
pub mod command_vis {
    use super::BitField;

    pub const ETF: BitField = BitField::new(18, 14);
    pub const MODE: BitField = BitField::new(16, 2);
    pub const SEC: BitField = BitField::new(7, 9);
    pub const RATIO: BitField = BitField::new(2, 5);
    pub const CNTRL: BitField = BitField::new(0, 2);
}

/// Detector command word, infra-red channel view (32 bits).
pub mod command_ir {
    use super::BitField;

    pub const ETF: BitField = BitField::new(18, 14);
    pub const MODE: BitField = BitField::new(16, 2);
    pub const COMP: BitField = BitField::new(14, 2);
    pub const BIAS: BitField = BitField::new(8, 3);
    pub const PET: BitField = BitField::new(2, 4);
    pub const CNTRL: BitField = BitField::new(0, 2);
}

/// PMD packet time word (16 bits).
pub mod pmd_time {
    use super::BitField;

    pub const IS: BitField = BitField::new(15, 1);
    pub const DELTA: BitField = BitField::new(0, 15);
}
