// Copyright (c) 2026 the caravel developers.
// Licensed under the MIT License:
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

//! Little-endian primitive access at arbitrary byte offsets.
//!
//! Everything on the wire is little-endian and unaligned; [`WireValue`]
//! gives each fixed-width primitive its read/write routine, and the
//! free functions add bounds checking on top.

use byteorder::{ByteOrder, LittleEndian};

use crate::{Error, ErrorKind, Result};

/// A fixed-width primitive with a little-endian wire representation.
pub trait WireValue: Copy {
    const BYTES: usize;

    /// Reads from the first `Self::BYTES` bytes of `buf`.
    fn read(buf: &[u8]) -> Self;

    /// Writes into the first `Self::BYTES` bytes of `buf`.
    fn write(self, buf: &mut [u8]);
}

impl WireValue for () {
    const BYTES: usize = 0;
    fn read(_buf: &[u8]) -> Self {}
    fn write(self, _buf: &mut [u8]) {}
}

impl WireValue for u8 {
    const BYTES: usize = 1;
    fn read(buf: &[u8]) -> Self {
        buf[0]
    }
    fn write(self, buf: &mut [u8]) {
        buf[0] = self;
    }
}

impl WireValue for i8 {
    const BYTES: usize = 1;
    fn read(buf: &[u8]) -> Self {
        buf[0] as i8
    }
    fn write(self, buf: &mut [u8]) {
        buf[0] = self as u8;
    }
}

macro_rules! wire_value {
    ($ty:ty, $bytes:expr, $read:path, $write:path) => {
        impl WireValue for $ty {
            const BYTES: usize = $bytes;
            fn read(buf: &[u8]) -> Self {
                $read(buf)
            }
            fn write(self, buf: &mut [u8]) {
                $write(buf, self)
            }
        }
    };
}

wire_value!(u16, 2, LittleEndian::read_u16, LittleEndian::write_u16);
wire_value!(i16, 2, LittleEndian::read_i16, LittleEndian::write_i16);
wire_value!(u32, 4, LittleEndian::read_u32, LittleEndian::write_u32);
wire_value!(i32, 4, LittleEndian::read_i32, LittleEndian::write_i32);
wire_value!(u64, 8, LittleEndian::read_u64, LittleEndian::write_u64);
wire_value!(i64, 8, LittleEndian::read_i64, LittleEndian::write_i64);
wire_value!(f32, 4, LittleEndian::read_f32, LittleEndian::write_f32);
wire_value!(f64, 8, LittleEndian::read_f64, LittleEndian::write_f64);

/// XOR masking against a schema default.
///
/// Cap'n Proto stores primitive fields XORed with their default, so a
/// zero-filled slot reads back as the default. Integer masks are the
/// default value itself; float masks are the default's raw bit pattern.
pub trait Mask: WireValue {
    type MaskT: Copy;

    fn mask(self, mask: Self::MaskT) -> Self;
}

macro_rules! int_mask {
    ($ty:ty) => {
        impl Mask for $ty {
            type MaskT = $ty;
            fn mask(self, mask: $ty) -> $ty {
                self ^ mask
            }
        }
    };
}

int_mask!(u8);
int_mask!(i8);
int_mask!(u16);
int_mask!(i16);
int_mask!(u32);
int_mask!(i32);
int_mask!(u64);
int_mask!(i64);

impl Mask for f32 {
    type MaskT = u32;
    fn mask(self, mask: u32) -> f32 {
        f32::from_bits(self.to_bits() ^ mask)
    }
}

impl Mask for f64 {
    type MaskT = u64;
    fn mask(self, mask: u64) -> f64 {
        f64::from_bits(self.to_bits() ^ mask)
    }
}

/// Reads a `T` at `offset` bytes into `buf`.
pub fn read_value<T: WireValue>(buf: &[u8], offset: usize) -> Result<T> {
    let end = offset
        .checked_add(T::BYTES)
        .ok_or_else(|| Error::from_kind(ErrorKind::OutOfBounds))?;
    if end > buf.len() {
        return Err(Error::from_kind_context(
            ErrorKind::OutOfBounds,
            format!("read of {} bytes at {} exceeds {}", T::BYTES, offset, buf.len()),
        ));
    }
    Ok(T::read(&buf[offset..end]))
}

/// Writes a `T` at `offset` bytes into `buf`.
pub fn write_value<T: WireValue>(buf: &mut [u8], offset: usize, value: T) -> Result<()> {
    let end = offset
        .checked_add(T::BYTES)
        .ok_or_else(|| Error::from_kind(ErrorKind::OutOfBounds))?;
    if end > buf.len() {
        return Err(Error::from_kind_context(
            ErrorKind::OutOfBounds,
            format!("write of {} bytes at {} exceeds {}", T::BYTES, offset, buf.len()),
        ));
    }
    value.write(&mut buf[offset..end]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_little_endian() {
        let mut buf = [0u8; 16];
        write_value::<u32>(&mut buf, 3, 0xdead_beef).unwrap();
        assert_eq!(buf[3..7], [0xef, 0xbe, 0xad, 0xde]);
        assert_eq!(read_value::<u32>(&buf, 3).unwrap(), 0xdead_beef);

        write_value::<i64>(&mut buf, 8, -2).unwrap();
        assert_eq!(read_value::<i64>(&buf, 8).unwrap(), -2);

        write_value::<f64>(&mut buf, 0, 1.5).unwrap();
        assert_eq!(read_value::<f64>(&buf, 0).unwrap(), 1.5);
    }

    #[test]
    fn rejects_out_of_range_access() {
        let mut buf = [0u8; 8];
        let err = read_value::<u64>(&buf, 1).unwrap_err();
        assert_eq!(err.kind, ErrorKind::OutOfBounds);
        let err = write_value::<u16>(&mut buf, 7, 1).unwrap_err();
        assert_eq!(err.kind, ErrorKind::OutOfBounds);
    }

    #[test]
    fn masks_apply_defaults() {
        // A zero slot XORed with the default yields the default.
        assert_eq!(0i64.mask(42), 42);
        assert_eq!(42i64.mask(42), 0);
        assert_eq!(0f32.mask(1.25f32.to_bits()), 1.25);
    }
}
