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

//! The 64-bit pointer word codec.
//!
//! A pointer's low two bits select the kind; the rest of the word packs a
//! signed 30-bit offset plus kind-specific payload. Offsets are measured in
//! words from the position *immediately after* the pointer, so the target
//! byte address of a struct or list pointer at byte `p` is
//! `p + 8 + offset * 8`.

use crate::buffer;
use crate::message::ReaderSegments;
use crate::{BYTES_PER_WORD, Error, ErrorKind, Result};

/// The 3-bit size tag of a list pointer: how each element is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSize {
    Void = 0,
    Bit = 1,
    Byte = 2,
    TwoBytes = 3,
    FourBytes = 4,
    EightBytes = 5,
    Pointer = 6,
    InlineComposite = 7,
}

impl ElementSize {
    pub fn from_tag(tag: u8) -> Self {
        match tag & 7 {
            0 => Self::Void,
            1 => Self::Bit,
            2 => Self::Byte,
            3 => Self::TwoBytes,
            4 => Self::FourBytes,
            5 => Self::EightBytes,
            6 => Self::Pointer,
            _ => Self::InlineComposite,
        }
    }

    /// Storage for one element, in bits. Zero for void and composite
    /// elements (composite storage comes from the tag word instead).
    pub fn bits(self) -> u32 {
        match self {
            Self::Void | Self::InlineComposite => 0,
            Self::Bit => 1,
            Self::Byte => 8,
            Self::TwoBytes => 16,
            Self::FourBytes => 32,
            Self::EightBytes | Self::Pointer => 64,
        }
    }

    /// The tag for a scalar of `bytes` width.
    pub fn for_byte_width(bytes: usize) -> Self {
        match bytes {
            0 => Self::Void,
            1 => Self::Byte,
            2 => Self::TwoBytes,
            4 => Self::FourBytes,
            _ => Self::EightBytes,
        }
    }
}

/// A decoded pointer word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WirePointer {
    /// The all-zero word: no target.
    Null,
    /// Kind 0. `offset` is in words; sizes are section lengths in words.
    Struct {
        offset: i32,
        data_words: u16,
        ptr_words: u16,
    },
    /// Kind 1. For `InlineComposite`, `count` is the total word length of
    /// the body (excluding the tag word); the element count lives in the
    /// tag word at the target.
    List {
        offset: i32,
        element_size: ElementSize,
        count: u32,
    },
    /// Kind 2. Redirects to `landing_pad` (a word index) in `segment`.
    Far {
        double_far: bool,
        landing_pad: u32,
        segment: u32,
    },
}

impl WirePointer {
    /// Decodes one word. The all-zero word is `Null`; kind 3 (reserved for
    /// the capability layer) is a `MalformedPointer` error.
    pub fn decode(word: u64) -> Result<Self> {
        if word == 0 {
            return Ok(Self::Null);
        }
        match (word & 3) as u8 {
            0 => Ok(Self::Struct {
                offset: (word as u32 as i32) >> 2,
                data_words: (word >> 32) as u16,
                ptr_words: (word >> 48) as u16,
            }),
            1 => Ok(Self::List {
                offset: (word as u32 as i32) >> 2,
                element_size: ElementSize::from_tag((word >> 32) as u8),
                count: ((word >> 35) & 0x1fff_ffff) as u32,
            }),
            2 => Ok(Self::Far {
                double_far: (word >> 2) & 1 == 1,
                landing_pad: ((word >> 3) & 0x1fff_ffff) as u32,
                segment: (word >> 32) as u32,
            }),
            _ => Err(Error::from_kind_context(
                ErrorKind::MalformedPointer,
                "pointer kind 3 is not part of the serialisation kernel",
            )),
        }
    }

    pub fn encode(&self) -> u64 {
        match *self {
            Self::Null => 0,
            Self::Struct {
                offset,
                data_words,
                ptr_words,
            } => {
                ((offset as u32) << 2) as u64
                    | (data_words as u64) << 32
                    | (ptr_words as u64) << 48
            }
            Self::List {
                offset,
                element_size,
                count,
            } => {
                (((offset as u32) << 2) | 1) as u64
                    | (element_size as u64) << 32
                    | (count as u64 & 0x1fff_ffff) << 35
            }
            Self::Far {
                double_far,
                landing_pad,
                segment,
            } => {
                2u64 | (double_far as u64) << 2
                    | (landing_pad as u64 & 0x1fff_ffff) << 3
                    | (segment as u64) << 32
            }
        }
    }
}

fn segment<'a>(segments: &'a dyn ReaderSegments, id: u32) -> Result<&'a [u8]> {
    segments.get_segment(id).ok_or_else(|| {
        Error::from_kind_context(ErrorKind::MalformedPointer, format!("no segment {id}"))
    })
}

fn read_word(segments: &dyn ReaderSegments, segment_id: u32, offset: usize) -> Result<u64> {
    buffer::read_value::<u64>(segment(segments, segment_id)?, offset)
}

/// The byte address `offset` words past the word following the pointer at
/// `ptr_offset`, bounds-checked against the segment length.
fn target_addr(seg_len: usize, ptr_offset: usize, offset: i32) -> Result<usize> {
    let addr = ptr_offset as i64 + BYTES_PER_WORD as i64 + offset as i64 * BYTES_PER_WORD as i64;
    if addr < 0 || addr > seg_len as i64 {
        return Err(Error::from_kind_context(
            ErrorKind::MalformedPointer,
            format!("pointer offset {offset} escapes segment of {seg_len} bytes"),
        ));
    }
    Ok(addr as usize)
}

/// Resolves the pointer word at `(segment_id, ptr_offset)` to the segment
/// and byte address of its content, following far pointers through one or
/// two hops. The returned pointer is always `Null`, `Struct`, or `List`
/// (with any far indirection already collapsed; its own offset field is no
/// longer meaningful).
pub fn follow_fars(
    segments: &dyn ReaderSegments,
    segment_id: u32,
    ptr_offset: usize,
) -> Result<(u32, usize, WirePointer)> {
    let word = read_word(segments, segment_id, ptr_offset)?;
    match WirePointer::decode(word)? {
        WirePointer::Null => Ok((segment_id, ptr_offset + BYTES_PER_WORD, WirePointer::Null)),
        ptr @ (WirePointer::Struct { offset, .. } | WirePointer::List { offset, .. }) => {
            let len = segment(segments, segment_id)?.len();
            Ok((segment_id, target_addr(len, ptr_offset, offset)?, ptr))
        }
        WirePointer::Far {
            double_far,
            landing_pad,
            segment: far_segment,
        } => {
            let pad_offset = landing_pad as usize * BYTES_PER_WORD;
            let pad_words = if double_far { 2 } else { 1 };
            let far_buf = segment(segments, far_segment)?;
            if pad_offset + pad_words * BYTES_PER_WORD > far_buf.len() {
                return Err(Error::from_kind_context(
                    ErrorKind::OutOfBounds,
                    format!("landing pad at word {landing_pad} escapes segment {far_segment}"),
                ));
            }
            if !double_far {
                match WirePointer::decode(buffer::read_value::<u64>(far_buf, pad_offset)?)? {
                    WirePointer::Null => {
                        Ok((far_segment, pad_offset + BYTES_PER_WORD, WirePointer::Null))
                    }
                    ptr @ (WirePointer::Struct { offset, .. }
                    | WirePointer::List { offset, .. }) => Ok((
                        far_segment,
                        target_addr(far_buf.len(), pad_offset, offset)?,
                        ptr,
                    )),
                    WirePointer::Far { .. } => Err(Error::from_kind_context(
                        ErrorKind::MalformedPointer,
                        "single-far landing pad holds another far pointer",
                    )),
                }
            } else {
                // A double-far pad is two words: a single-far pointer giving
                // the content's exact position, and a tag word giving its
                // shape with the offset field unused.
                let hop = WirePointer::decode(buffer::read_value::<u64>(far_buf, pad_offset)?)?;
                let tag = WirePointer::decode(buffer::read_value::<u64>(
                    far_buf,
                    pad_offset + BYTES_PER_WORD,
                )?)?;
                let WirePointer::Far {
                    double_far: false,
                    landing_pad: content_pad,
                    segment: content_segment,
                } = hop
                else {
                    return Err(Error::from_kind_context(
                        ErrorKind::MalformedPointer,
                        "double-far landing pad must start with a single far pointer",
                    ));
                };
                if !matches!(tag, WirePointer::Struct { .. } | WirePointer::List { .. }) {
                    return Err(Error::from_kind_context(
                        ErrorKind::MalformedPointer,
                        "double-far tag word must describe struct or list content",
                    ));
                }
                let content = content_pad as usize * BYTES_PER_WORD;
                if content > segment(segments, content_segment)?.len() {
                    return Err(Error::from_kind(ErrorKind::OutOfBounds));
                }
                Ok((content_segment, content, tag))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen, TestResult, quickcheck};

    #[test]
    fn null_word_is_null_not_error() {
        assert_eq!(WirePointer::decode(0).unwrap(), WirePointer::Null);
    }

    #[test]
    fn struct_pointer_round_trip() {
        // Offset 0, two data words, no pointers: 00 00 00 00 02 00 00 00.
        let word = u64::from_le_bytes([0, 0, 0, 0, 2, 0, 0, 0]);
        let ptr = WirePointer::decode(word).unwrap();
        assert_eq!(
            ptr,
            WirePointer::Struct {
                offset: 0,
                data_words: 2,
                ptr_words: 0
            }
        );
        assert_eq!(ptr.encode(), word);
    }

    #[test]
    fn negative_offsets_sign_extend() {
        let ptr = WirePointer::Struct {
            offset: -3,
            data_words: 1,
            ptr_words: 2,
        };
        assert_eq!(WirePointer::decode(ptr.encode()).unwrap(), ptr);
    }

    #[test]
    fn list_pointer_fields() {
        let ptr = WirePointer::List {
            offset: 5,
            element_size: ElementSize::Byte,
            count: 6,
        };
        let word = ptr.encode();
        assert_eq!(word & 3, 1);
        assert_eq!((word >> 32) & 7, 2);
        assert_eq!(word >> 35, 6);
        assert_eq!(WirePointer::decode(word).unwrap(), ptr);
    }

    #[test]
    fn kind_three_is_malformed() {
        let err = WirePointer::decode(3).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedPointer);
    }

    impl Arbitrary for WirePointer {
        fn arbitrary(g: &mut Gen) -> Self {
            let offset = (i32::arbitrary(g) << 2) >> 2;
            match u8::arbitrary(g) % 4 {
                0 => Self::Null,
                1 => Self::Struct {
                    offset,
                    data_words: u16::arbitrary(g),
                    ptr_words: u16::arbitrary(g),
                },
                2 => Self::List {
                    offset,
                    element_size: ElementSize::from_tag(u8::arbitrary(g)),
                    count: u32::arbitrary(g) & 0x1fff_ffff,
                },
                _ => Self::Far {
                    double_far: bool::arbitrary(g),
                    landing_pad: u32::arbitrary(g) & 0x1fff_ffff,
                    segment: u32::arbitrary(g),
                },
            }
        }
    }

    quickcheck! {
        fn decode_inverts_encode(ptr: WirePointer) -> bool {
            // A Struct/List with every field zero encodes to the null word.
            let word = ptr.encode();
            if word == 0 {
                return WirePointer::decode(word).unwrap() == WirePointer::Null;
            }
            WirePointer::decode(word).unwrap() == ptr
        }

        fn encode_inverts_decode(word: u64) -> TestResult {
            if word & 3 == 3 {
                return TestResult::discard();
            }
            match WirePointer::decode(word) {
                Ok(ptr) => TestResult::from_bool(ptr.encode() == word),
                Err(_) => TestResult::failed(),
            }
        }
    }

    #[test]
    fn follows_a_single_far_pointer() {
        // Segment 0: far pointer -> segment 1 word 0.
        // Segment 1: landing pad (struct ptr, offset 0) then one data word.
        let seg0 = WirePointer::Far {
            double_far: false,
            landing_pad: 0,
            segment: 1,
        }
        .encode()
        .to_le_bytes();
        let mut seg1 = [0u8; 16];
        seg1[..8].copy_from_slice(
            &WirePointer::Struct {
                offset: 0,
                data_words: 1,
                ptr_words: 0,
            }
            .encode()
            .to_le_bytes(),
        );
        seg1[8] = 7;
        let segments: &[&[u8]] = &[&seg0, &seg1];
        let (seg, addr, ptr) = follow_fars(&segments, 0, 0).unwrap();
        assert_eq!(seg, 1);
        assert_eq!(addr, 8);
        assert!(matches!(ptr, WirePointer::Struct { data_words: 1, .. }));
    }

    #[test]
    fn rejects_missing_far_segment() {
        let seg0 = WirePointer::Far {
            double_far: false,
            landing_pad: 0,
            segment: 9,
        }
        .encode()
        .to_le_bytes();
        let segments: &[&[u8]] = &[&seg0];
        let err = follow_fars(&segments, 0, 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedPointer);
    }
}
