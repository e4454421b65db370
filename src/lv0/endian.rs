// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Endian normalisation of Level-0 records.
//!
//! Records are first filled with a verbatim copy of the wire bytes (native
//! byte order, no conversion), then [`Normalize::normalize`] converts every
//! multi-byte field from big-endian in a single pass. On a big-endian host the
//! pass is a no-op.

use byteorder::{ByteOrder, NativeEndian};

use super::Lv0Error;

pub trait Normalize {
    fn normalize(&mut self);
}

impl Normalize for u8 {
    fn normalize(&mut self) {}
}

impl Normalize for u16 {
    fn normalize(&mut self) {
        *self = u16::from_be(*self);
    }
}

impl Normalize for u32 {
    fn normalize(&mut self) {
        *self = u32::from_be(*self);
    }
}

impl Normalize for i32 {
    fn normalize(&mut self) {
        *self = i32::from_be(*self);
    }
}

impl<T: Normalize, const N: usize> Normalize for [T; N] {
    fn normalize(&mut self) {
        self.iter_mut().for_each(Normalize::normalize);
    }
}

impl<T: Normalize> Normalize for Vec<T> {
    fn normalize(&mut self) {
        self.iter_mut().for_each(Normalize::normalize);
    }
}

/// A fixed-size record that can be copied verbatim off the wire.
pub trait WireRecord: Normalize + Sized {
    /// Number of bytes occupied on the wire.
    const SIZE: usize;

    /// Copy the record without any byte-order conversion.
    fn read_raw(r: &mut RawReader) -> Option<Self>;
}

impl WireRecord for u16 {
    const SIZE: usize = 2;

    fn read_raw(r: &mut RawReader) -> Option<u16> {
        r.u16()
    }
}

impl WireRecord for u32 {
    const SIZE: usize = 4;

    fn read_raw(r: &mut RawReader) -> Option<u32> {
        r.u32()
    }
}

impl WireRecord for i32 {
    const SIZE: usize = 4;

    fn read_raw(r: &mut RawReader) -> Option<i32> {
        r.i32()
    }
}

impl<T: WireRecord + Copy + Default, const N: usize> WireRecord for [T; N] {
    const SIZE: usize = N * T::SIZE;

    fn read_raw(r: &mut RawReader) -> Option<[T; N]> {
        let mut a = [T::default(); N];
        for v in a.iter_mut() {
            *v = T::read_raw(r)?;
        }
        Some(a)
    }
}

/// Copy one record off the wire and normalise it.
pub fn decode<T: WireRecord>(
    r: &mut RawReader,
    what: &'static str,
    index: usize,
) -> Result<T, Lv0Error> {
    let mut rec = T::read_raw(r).ok_or(Lv0Error::Truncated { what, index })?;
    rec.normalize();
    Ok(rec)
}

/// Cursor over a byte buffer that yields integers in native order.
pub struct RawReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> RawReader<'a> {
    pub fn new(buf: &'a [u8]) -> RawReader<'a> {
        RawReader { buf, pos: 0 }
    }

    /// The number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    pub fn skip(&mut self, n: usize) -> Option<()> {
        self.take(n).map(|_| ())
    }

    pub fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    pub fn u16(&mut self) -> Option<u16> {
        self.take(2).map(NativeEndian::read_u16)
    }

    pub fn u32(&mut self) -> Option<u32> {
        self.take(4).map(NativeEndian::read_u32)
    }

    pub fn i32(&mut self) -> Option<i32> {
        self.take(4).map(NativeEndian::read_i32)
    }
}
