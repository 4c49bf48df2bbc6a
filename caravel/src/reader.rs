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

//! Zero-copy views over an existing message.
//!
//! [`PointerReader`] sits on a pointer word and materialises the view it
//! targets; [`StructReader`] and [`ListReader`] give field-level access the
//! generated accessors are written against. Views are `Copy`, never mutate,
//! and borrow the segments they were created from. Far pointers are
//! followed transparently, so a view reached through another segment is
//! indistinguishable from one reached directly.

use crate::buffer::{self, Mask, WireValue};
use crate::message::ReaderSegments;
use crate::pointer::{ElementSize, WirePointer, follow_fars};
use crate::{BYTES_PER_WORD, Error, ErrorKind, Result};

const ZEROES: [u8; BYTES_PER_WORD] = [0; BYTES_PER_WORD];

/// A view of one pointer word within a message, or the canonical null
/// pointer detached from any message.
#[derive(Clone, Copy)]
pub struct PointerReader<'a> {
    segments: Option<&'a dyn ReaderSegments>,
    segment: u32,
    offset: usize,
    nesting_limit: i32,
}

impl<'a> PointerReader<'a> {
    /// A pointer with no message behind it. Reads through it produce
    /// defaults: the empty struct, the empty list, `""`.
    pub fn null() -> Self {
        Self {
            segments: None,
            segment: 0,
            offset: 0,
            nesting_limit: 0,
        }
    }

    pub(crate) fn get_root(
        segments: &'a dyn ReaderSegments,
        segment: u32,
        offset: usize,
        nesting_limit: i32,
    ) -> Result<Self> {
        let buf = segments.get_segment(segment).ok_or_else(|| {
            Error::from_kind_context(ErrorKind::OutOfBounds, "message has no root segment")
        })?;
        if offset + BYTES_PER_WORD > buf.len() {
            return Err(Error::from_kind_context(
                ErrorKind::OutOfBounds,
                "segment too short to hold a root pointer",
            ));
        }
        Ok(Self {
            segments: Some(segments),
            segment,
            offset,
            nesting_limit,
        })
    }

    pub(crate) fn at(
        segments: &'a dyn ReaderSegments,
        segment: u32,
        offset: usize,
        nesting_limit: i32,
    ) -> Self {
        Self {
            segments: Some(segments),
            segment,
            offset,
            nesting_limit,
        }
    }

    fn word(&self) -> u64 {
        let Some(segments) = self.segments else {
            return 0;
        };
        segments
            .get_segment(self.segment)
            .and_then(|buf| buffer::read_value::<u64>(buf, self.offset).ok())
            .unwrap_or(0)
    }

    pub fn is_null(&self) -> bool {
        self.word() == 0
    }

    /// The pointer's target: `None` for null, otherwise the content's
    /// segment, byte address, and shape with far hops collapsed.
    pub(crate) fn resolve(&self) -> Result<Option<(u32, usize, WirePointer)>> {
        let Some(segments) = self.segments else {
            return Ok(None);
        };
        let (segment, addr, ptr) = follow_fars(segments, self.segment, self.offset)?;
        match ptr {
            WirePointer::Null => Ok(None),
            _ => Ok(Some((segment, addr, ptr))),
        }
    }

    fn check_nesting(&self) -> Result<()> {
        if self.nesting_limit <= 0 {
            Err(Error::from_kind_context(
                ErrorKind::MalformedPointer,
                "nesting limit exceeded",
            ))
        } else {
            Ok(())
        }
    }

    /// Interprets the target as a struct. Null yields the empty struct,
    /// whose every field reads as its default.
    pub fn get_struct(&self) -> Result<StructReader<'a>> {
        let Some(segments) = self.segments else {
            return Ok(StructReader::empty());
        };
        self.check_nesting()?;
        let (segment, addr, ptr) = follow_fars(segments, self.segment, self.offset)?;
        match ptr {
            WirePointer::Null => Ok(StructReader::empty()),
            WirePointer::Struct {
                data_words,
                ptr_words,
                ..
            } => {
                let len = segments.get_segment(segment).map(<[u8]>::len).unwrap_or(0);
                let words = data_words as usize + ptr_words as usize;
                if addr + words * BYTES_PER_WORD > len {
                    return Err(Error::from_kind_context(
                        ErrorKind::OutOfBounds,
                        "struct body escapes its segment",
                    ));
                }
                Ok(StructReader {
                    segments: Some(segments),
                    segment,
                    data_start: addr,
                    data_words,
                    ptr_words,
                    nesting_limit: self.nesting_limit - 1,
                })
            }
            WirePointer::List { .. } => Err(Error::from_kind_context(
                ErrorKind::TypeMismatch,
                "expected a struct pointer, found a list pointer",
            )),
            WirePointer::Far { .. } => unreachable!("follow_fars returns no far pointers"),
        }
    }

    /// Interprets the target as a list. Null yields the empty list. When
    /// `expected` is given, the wire element size must be compatible with
    /// it; inline-composite encodings of scalar or pointer lists are
    /// accepted (list upgrades).
    pub fn get_list(&self, expected: Option<ElementSize>) -> Result<ListReader<'a>> {
        let Some(segments) = self.segments else {
            return Ok(ListReader::empty(expected.unwrap_or(ElementSize::Void)));
        };
        self.check_nesting()?;
        let (segment, addr, ptr) = follow_fars(segments, self.segment, self.offset)?;
        match ptr {
            WirePointer::Null => Ok(ListReader::empty(expected.unwrap_or(ElementSize::Void))),
            WirePointer::List {
                element_size,
                count,
                ..
            } => list_from_parts(
                segments,
                segment,
                addr,
                element_size,
                count,
                expected,
                self.nesting_limit - 1,
            ),
            WirePointer::Struct { .. } => Err(Error::from_kind_context(
                ErrorKind::TypeMismatch,
                "expected a list pointer, found a struct pointer",
            )),
            WirePointer::Far { .. } => unreachable!("follow_fars returns no far pointers"),
        }
    }

    /// Reads the target as text: a byte list whose final byte is NUL. The
    /// logical value excludes the terminator. Null yields `""`.
    pub fn get_text(&self) -> Result<&'a str> {
        self.get_text_or("")
    }

    pub fn get_text_or(&self, default: &'a str) -> Result<&'a str> {
        match self.byte_list_body()? {
            None => Ok(default),
            Some(bytes) => {
                let Some((&0, contents)) = bytes.split_last() else {
                    return Err(Error::failed("text blob missing NUL terminator"));
                };
                ::core::str::from_utf8(contents)
                    .map_err(|e| Error::failed(format!("text blob is not UTF-8: {e}")))
            }
        }
    }

    /// Reads the target as a data blob: a byte list, no NUL requirement.
    /// Null yields the empty blob.
    pub fn get_data(&self) -> Result<&'a [u8]> {
        self.get_data_or(&[])
    }

    pub fn get_data_or(&self, default: &'a [u8]) -> Result<&'a [u8]> {
        match self.byte_list_body()? {
            None => Ok(default),
            Some(bytes) => Ok(bytes),
        }
    }

    fn byte_list_body(&self) -> Result<Option<&'a [u8]>> {
        let Some(segments) = self.segments else {
            return Ok(None);
        };
        let (segment, addr, ptr) = follow_fars(segments, self.segment, self.offset)?;
        match ptr {
            WirePointer::Null => Ok(None),
            WirePointer::List {
                element_size: ElementSize::Byte,
                count,
                ..
            } => {
                let buf = segments.get_segment(segment).unwrap_or(&[]);
                let end = addr + count as usize;
                if end > buf.len() {
                    return Err(Error::from_kind_context(
                        ErrorKind::OutOfBounds,
                        "blob body escapes its segment",
                    ));
                }
                Ok(Some(&buf[addr..end]))
            }
            _ => Err(Error::from_kind_context(
                ErrorKind::TypeMismatch,
                "expected a byte list pointer",
            )),
        }
    }

    /// The byte offset just past everything reachable from this pointer,
    /// within the pointer's own segment. Used for list body-end
    /// calculation; content in another segment has no meaningful offset
    /// here and is an error.
    pub(crate) fn target_end(&self) -> Result<usize> {
        self.check_nesting()?;
        let Some((segment, addr, ptr)) = self.resolve()? else {
            return Err(Error::from_kind(ErrorKind::MalformedPointer));
        };
        if segment != self.segment {
            return Err(Error::failed(
                "cannot compute a byte range across segment boundaries",
            ));
        }
        let segments = self.segments.expect("resolved pointer has segments");
        match ptr {
            WirePointer::Struct {
                data_words,
                ptr_words,
                ..
            } => {
                let len = segments.get_segment(segment).map(<[u8]>::len).unwrap_or(0);
                let words = data_words as usize + ptr_words as usize;
                if addr + words * BYTES_PER_WORD > len {
                    return Err(Error::from_kind(ErrorKind::OutOfBounds));
                }
                let view = StructReader {
                    segments: Some(segments),
                    segment,
                    data_start: addr,
                    data_words,
                    ptr_words,
                    nesting_limit: self.nesting_limit - 1,
                };
                match view.extra_end_maybe()? {
                    Some(end) => Ok(end),
                    None => Ok(view.body_end()),
                }
            }
            WirePointer::List {
                element_size,
                count,
                ..
            } => list_from_parts(
                segments,
                segment,
                addr,
                element_size,
                count,
                None,
                self.nesting_limit - 1,
            )?
            .body_end(),
            _ => Err(Error::from_kind(ErrorKind::MalformedPointer)),
        }
    }
}

/// A read-only view of one struct: a data section of `data_words` words
/// followed by a pointer section of `ptr_words` words.
///
/// Reads past either section yield defaults rather than errors; that is
/// how messages written by an older schema stay readable.
#[derive(Clone, Copy)]
pub struct StructReader<'a> {
    segments: Option<&'a dyn ReaderSegments>,
    segment: u32,
    data_start: usize,
    data_words: u16,
    ptr_words: u16,
    nesting_limit: i32,
}

impl std::fmt::Debug for StructReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructReader")
            .field("segment", &self.segment)
            .field("data_start", &self.data_start)
            .field("data_words", &self.data_words)
            .field("ptr_words", &self.ptr_words)
            .field("nesting_limit", &self.nesting_limit)
            .finish()
    }
}

impl<'a> StructReader<'a> {
    /// The zero-sized struct every field of which reads as its default.
    pub fn empty() -> Self {
        Self {
            segments: None,
            segment: 0,
            data_start: 0,
            data_words: 0,
            ptr_words: 0,
            nesting_limit: 0,
        }
    }

    pub fn data_words(&self) -> u16 {
        self.data_words
    }

    pub fn ptr_words(&self) -> u16 {
        self.ptr_words
    }

    pub(crate) fn data_section(&self) -> &'a [u8] {
        let Some(segments) = self.segments else {
            return &[];
        };
        let buf = segments.get_segment(self.segment).unwrap_or(&[]);
        &buf[self.data_start..self.data_start + self.data_words as usize * BYTES_PER_WORD]
    }

    /// Reads the primitive at `offset` (measured in units of `T`) in the
    /// data section. Out-of-section reads yield zero, which the XOR mask
    /// variants turn into the schema default.
    pub fn get_data_field<T: WireValue>(&self, offset: usize) -> T {
        let data = self.data_section();
        let byte = offset * T::BYTES;
        if T::BYTES > 0 && byte + T::BYTES <= data.len() {
            T::read(&data[byte..byte + T::BYTES])
        } else {
            T::read(&ZEROES[..T::BYTES])
        }
    }

    pub fn get_data_field_mask<T: Mask>(&self, offset: usize, mask: T::MaskT) -> T {
        self.get_data_field::<T>(offset).mask(mask)
    }

    /// Reads the bit at `offset` (measured in bits) in the data section.
    pub fn get_bool_field(&self, offset: usize) -> bool {
        let data = self.data_section();
        let byte = offset / 8;
        byte < data.len() && data[byte] & (1 << (offset % 8)) != 0
    }

    pub fn get_bool_field_mask(&self, offset: usize, mask: bool) -> bool {
        self.get_bool_field(offset) ^ mask
    }

    /// The pointer at `index` in the pointer section; null when the index
    /// is past the section.
    pub fn get_pointer_field(&self, index: u16) -> PointerReader<'a> {
        match self.segments {
            Some(segments) if index < self.ptr_words => PointerReader {
                segments: Some(segments),
                segment: self.segment,
                offset: self.data_start
                    + (self.data_words as usize + index as usize) * BYTES_PER_WORD,
                nesting_limit: self.nesting_limit,
            },
            _ => PointerReader::null(),
        }
    }

    pub(crate) fn body_end(&self) -> usize {
        self.data_start + (self.data_words as usize + self.ptr_words as usize) * BYTES_PER_WORD
    }

    /// The end of the out-of-body data referenced by this struct's pointer
    /// section: the target end of the last non-null pointer, or `None` if
    /// every pointer is null.
    pub(crate) fn extra_end_maybe(&self) -> Result<Option<usize>> {
        for index in (0..self.ptr_words).rev() {
            let pointer = self.get_pointer_field(index);
            if !pointer.is_null() {
                return pointer.target_end().map(Some);
            }
        }
        Ok(None)
    }
}

fn list_from_parts<'a>(
    segments: &'a dyn ReaderSegments,
    segment: u32,
    addr: usize,
    element_size: ElementSize,
    count: u32,
    expected: Option<ElementSize>,
    nesting_limit: i32,
) -> Result<ListReader<'a>> {
    let seg_len = segments.get_segment(segment).map(<[u8]>::len).unwrap_or(0);
    let list = if element_size == ElementSize::InlineComposite {
        // `count` is the total body length in words; the element count and
        // shape come from the tag word at the front of the body.
        let total_words = count as usize;
        if addr + (1 + total_words) * BYTES_PER_WORD > seg_len {
            return Err(Error::from_kind_context(
                ErrorKind::OutOfBounds,
                "composite list body escapes its segment",
            ));
        }
        let buf = segments.get_segment(segment).unwrap_or(&[]);
        let tag = WirePointer::decode(buffer::read_value::<u64>(buf, addr)?)?;
        let WirePointer::Struct {
            offset: element_count,
            data_words,
            ptr_words,
        } = tag
        else {
            return Err(Error::from_kind_context(
                ErrorKind::MalformedPointer,
                "composite list tag is not a struct pointer",
            ));
        };
        if element_count < 0 {
            return Err(Error::from_kind_context(
                ErrorKind::MalformedPointer,
                "composite list tag claims a negative element count",
            ));
        }
        let per_element = data_words as usize + ptr_words as usize;
        if element_count as usize * per_element > total_words {
            return Err(Error::from_kind_context(
                ErrorKind::MalformedPointer,
                "composite list tag overruns the claimed body length",
            ));
        }
        ListReader {
            segments: Some(segments),
            segment,
            start: addr,
            element_size,
            count: element_count as u32,
            data_words,
            ptr_words,
            nesting_limit,
        }
    } else {
        let bits = element_size.bits() as u64 * count as u64;
        let bytes = bits.div_ceil(8) as usize;
        if addr + bytes > seg_len {
            return Err(Error::from_kind_context(
                ErrorKind::OutOfBounds,
                "list body escapes its segment",
            ));
        }
        ListReader {
            segments: Some(segments),
            segment,
            start: addr,
            element_size,
            count,
            data_words: 0,
            ptr_words: 0,
            nesting_limit,
        }
    };
    match expected {
        None => Ok(list),
        Some(expected) => list.checked_against(expected),
    }
}

/// A read-only view of one list.
#[derive(Clone, Copy)]
pub struct ListReader<'a> {
    segments: Option<&'a dyn ReaderSegments>,
    segment: u32,
    /// For composite lists this is the tag word; elements begin one word
    /// later. For everything else it is the first element.
    start: usize,
    element_size: ElementSize,
    count: u32,
    /// Element shape, for composite lists (and for struct views of
    /// upgraded scalar/pointer encodings).
    data_words: u16,
    ptr_words: u16,
    nesting_limit: i32,
}

impl<'a> ListReader<'a> {
    pub fn empty(element_size: ElementSize) -> Self {
        Self {
            segments: None,
            segment: 0,
            start: 0,
            element_size,
            count: 0,
            data_words: 0,
            ptr_words: 0,
            nesting_limit: 0,
        }
    }

    /// Checks this list against the element size the schema expects,
    /// recording the element struct shape for upgraded encodings.
    fn checked_against(mut self, expected: ElementSize) -> Result<Self> {
        use ElementSize::*;
        let actual = self.element_size;
        let compatible = match (expected, actual) {
            _ if expected == actual => true,
            (Void, _) => true,
            // A struct list may arrive in a scalar or pointer encoding
            // written before the struct grew.
            (InlineComposite, Void) => true,
            (InlineComposite, EightBytes) => {
                self.data_words = 1;
                true
            }
            (InlineComposite, Pointer) => {
                self.ptr_words = 1;
                true
            }
            // Scalar and pointer reads out of a composite encoding take
            // the front of each element's matching section.
            (Byte | TwoBytes | FourBytes | EightBytes, InlineComposite) => self.data_words >= 1,
            (Pointer, InlineComposite) => self.ptr_words >= 1,
            _ => false,
        };
        if compatible {
            Ok(self)
        } else {
            Err(Error::from_kind_context(
                ErrorKind::TypeMismatch,
                format!("list of {actual:?} elements where {expected:?} was expected"),
            ))
        }
    }

    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get_element_size(&self) -> ElementSize {
        self.element_size
    }

    fn buf(&self) -> &'a [u8] {
        self.segments
            .and_then(|s| s.get_segment(self.segment))
            .unwrap_or(&[])
    }

    fn step_bytes(&self) -> usize {
        match self.element_size {
            ElementSize::InlineComposite => {
                (self.data_words as usize + self.ptr_words as usize) * BYTES_PER_WORD
            }
            other => (other.bits() / 8) as usize,
        }
    }

    fn items_start(&self) -> usize {
        if self.element_size == ElementSize::InlineComposite {
            self.start + BYTES_PER_WORD
        } else {
            self.start
        }
    }

    fn items_end(&self) -> usize {
        if self.element_size == ElementSize::Bit {
            self.items_start() + (self.count as usize).div_ceil(8)
        } else {
            self.items_start() + self.count as usize * self.step_bytes()
        }
    }

    /// Normalises an index that may count from the end.
    pub fn at_index(&self, index: i64) -> Result<u32> {
        let len = self.count as i64;
        let normalised = if index < 0 { index + len } else { index };
        if (0..len).contains(&normalised) {
            Ok(normalised as u32)
        } else {
            Err(Error::from_kind_context(
                ErrorKind::IndexOutOfRange,
                format!("index {index} into a list of {len}"),
            ))
        }
    }

    /// Reads the scalar element at `index`. The index must be in range.
    pub fn read_primitive<T: WireValue>(&self, index: u32) -> T {
        debug_assert!(index < self.count);
        let offset = self.items_start() + index as usize * self.step_bytes();
        let available = match self.element_size {
            ElementSize::InlineComposite => self.data_words as usize * BYTES_PER_WORD,
            other => (other.bits() / 8) as usize,
        };
        let buf = self.buf();
        if T::BYTES > 0 && T::BYTES <= available && offset + T::BYTES <= buf.len() {
            T::read(&buf[offset..offset + T::BYTES])
        } else {
            T::read(&ZEROES[..T::BYTES])
        }
    }

    /// Reads the bit element at `index` of a bit list.
    pub fn get_bool_element(&self, index: u32) -> bool {
        debug_assert!(index < self.count);
        let buf = self.buf();
        let byte = self.items_start() + index as usize / 8;
        byte < buf.len() && buf[byte] & (1 << (index % 8)) != 0
    }

    /// The struct view of element `index`.
    pub fn get_struct_element(&self, index: u32) -> StructReader<'a> {
        debug_assert!(index < self.count);
        StructReader {
            segments: self.segments,
            segment: self.segment,
            data_start: self.items_start() + index as usize * self.step_bytes(),
            data_words: self.data_words,
            ptr_words: self.ptr_words,
            nesting_limit: self.nesting_limit,
        }
    }

    /// The pointer element at `index` of a pointer list, or the first
    /// pointer of a composite element.
    pub fn get_pointer_element(&self, index: u32) -> PointerReader<'a> {
        debug_assert!(index < self.count);
        let Some(segments) = self.segments else {
            return PointerReader::null();
        };
        let offset = match self.element_size {
            ElementSize::Pointer => self.items_start() + index as usize * BYTES_PER_WORD,
            ElementSize::InlineComposite if self.ptr_words > 0 => {
                self.items_start()
                    + index as usize * self.step_bytes()
                    + self.data_words as usize * BYTES_PER_WORD
            }
            _ => return PointerReader::null(),
        };
        PointerReader::at(segments, self.segment, offset, self.nesting_limit)
    }

    /// Element struct shape: meaningful for composite lists and for struct
    /// views of upgraded encodings, `(0, 0)` otherwise.
    pub(crate) fn element_shape(&self) -> (u16, u16) {
        (self.data_words, self.ptr_words)
    }

    /// The raw element storage, excluding any tag word.
    pub(crate) fn items_bytes(&self) -> &'a [u8] {
        if self.segments.is_none() {
            return &[];
        }
        &self.buf()[self.items_start()..self.items_end()]
    }

    pub fn body_start(&self) -> usize {
        self.start
    }

    /// Where the list's body ends, for equality and serialisation by
    /// range: scalar lists end after their elements; pointer lists end
    /// where the last non-null pointer's target ends; composite lists end
    /// after the extra bytes of the last element that references
    /// out-of-body data, or after the element block when none does.
    pub fn body_end(&self) -> Result<usize> {
        match self.element_size {
            ElementSize::InlineComposite => {
                if self.ptr_words == 0 {
                    return Ok(self.items_end());
                }
                for index in (0..self.count).rev() {
                    if let Some(end) = self.get_struct_element(index).extra_end_maybe()? {
                        return Ok(end);
                    }
                }
                Ok(self.items_end())
            }
            ElementSize::Pointer => {
                for index in (0..self.count).rev() {
                    let pointer = self.get_pointer_element(index);
                    if !pointer.is_null() {
                        return pointer.target_end();
                    }
                }
                Ok(self.items_end())
            }
            _ => Ok(self.items_end()),
        }
    }

    /// The raw bytes of the body range, tag word included for composite
    /// lists.
    pub fn raw_body(&self) -> Result<&'a [u8]> {
        let end = self.body_end()?;
        let buf = self.buf();
        if self.segments.is_none() {
            return Ok(&[]);
        }
        if end > buf.len() || self.start > end {
            return Err(Error::from_kind(ErrorKind::OutOfBounds));
        }
        Ok(&buf[self.start..end])
    }
}

/// Lists compare by content: same element count, same wire element size,
/// and byte-identical body ranges. There is deliberately no ordering.
impl PartialEq for ListReader<'_> {
    fn eq(&self, other: &Self) -> bool {
        if self.count != other.count || self.element_size != other.element_size {
            return false;
        }
        match (self.raw_body(), other.raw_body()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Reader, ReaderOptions};

    fn words(words: &[u64]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn reads_struct_fields_and_defaults() {
        // Root struct pointer, two data words, then x=1, y=2.
        let seg = words(&[
            WirePointer::Struct {
                offset: 0,
                data_words: 2,
                ptr_words: 0,
            }
            .encode(),
            1,
            2,
        ]);
        let segs: &[&[u8]] = &[&seg];
        let message = Reader::new(segs, ReaderOptions::new());
        let root = message.root().unwrap().get_struct().unwrap();
        assert_eq!(root.get_data_field::<i64>(0), 1);
        assert_eq!(root.get_data_field::<i64>(1), 2);
        // Past the data section: zero, or the default through a mask.
        assert_eq!(root.get_data_field::<i64>(5), 0);
        assert_eq!(root.get_data_field_mask::<i64>(5, 42), 42);
        assert!(!root.get_bool_field(200));
        assert!(root.get_pointer_field(3).is_null());
    }

    #[test]
    fn null_root_gives_empty_struct() {
        let seg = words(&[0]);
        let segs: &[&[u8]] = &[&seg];
        let message = Reader::new(segs, ReaderOptions::new());
        let root = message.root().unwrap().get_struct().unwrap();
        assert_eq!(root.get_data_field::<u32>(0), 0);
        assert!(root.get_pointer_field(0).get_text().unwrap().is_empty());
    }

    #[test]
    fn reads_text_with_nul_terminator() {
        let mut seg = words(&[
            WirePointer::List {
                offset: 0,
                element_size: ElementSize::Byte,
                count: 6,
            }
            .encode(),
            0,
        ]);
        seg[8..14].copy_from_slice(b"hello\0");
        let segs: &[&[u8]] = &[&seg];
        let message = Reader::new(segs, ReaderOptions::new());
        assert_eq!(message.root().unwrap().get_text().unwrap(), "hello");
    }

    #[test]
    fn text_without_terminator_is_an_error() {
        let mut seg = words(&[
            WirePointer::List {
                offset: 0,
                element_size: ElementSize::Byte,
                count: 5,
            }
            .encode(),
            0,
        ]);
        seg[8..13].copy_from_slice(b"hello");
        let segs: &[&[u8]] = &[&seg];
        let message = Reader::new(segs, ReaderOptions::new());
        assert!(message.root().unwrap().get_text().is_err());
    }

    #[test]
    fn normalises_negative_indices() {
        let seg = words(&[
            WirePointer::List {
                offset: 0,
                element_size: ElementSize::EightBytes,
                count: 3,
            }
            .encode(),
            10,
            20,
            30,
        ]);
        let segs: &[&[u8]] = &[&seg];
        let message = Reader::new(segs, ReaderOptions::new());
        let list = message.root().unwrap().get_list(None).unwrap();
        assert_eq!(list.at_index(-1).unwrap(), 2);
        assert_eq!(list.read_primitive::<u64>(list.at_index(-3).unwrap()), 10);
        assert_eq!(
            list.at_index(3).unwrap_err().kind,
            ErrorKind::IndexOutOfRange
        );
        assert_eq!(
            list.at_index(-4).unwrap_err().kind,
            ErrorKind::IndexOutOfRange
        );
    }

    #[test]
    fn list_equality_is_content_based() {
        let make = |values: [u64; 2]| {
            words(&[
                WirePointer::List {
                    offset: 0,
                    element_size: ElementSize::EightBytes,
                    count: 2,
                }
                .encode(),
                values[0],
                values[1],
            ])
        };
        let a = make([7, 8]);
        let b = make([7, 8]);
        let c = make([7, 9]);
        let (sa, sb, sc): (&[&[u8]], &[&[u8]], &[&[u8]]) = (&[&a], &[&b], &[&c]);
        let ma = Reader::new(sa, ReaderOptions::new());
        let mb = Reader::new(sb, ReaderOptions::new());
        let mc = Reader::new(sc, ReaderOptions::new());
        let la = ma.root().unwrap().get_list(None).unwrap();
        let lb = mb.root().unwrap().get_list(None).unwrap();
        let lc = mc.root().unwrap().get_list(None).unwrap();
        assert!(la == la);
        assert!(la == lb);
        assert!(lb == la);
        assert!(la != lc);
    }

    #[test]
    fn truncated_struct_is_out_of_bounds() {
        let seg = words(&[
            WirePointer::Struct {
                offset: 0,
                data_words: 4,
                ptr_words: 0,
            }
            .encode(),
            1,
        ]);
        let segs: &[&[u8]] = &[&seg];
        let message = Reader::new(segs, ReaderOptions::new());
        let err = message.root().unwrap().get_struct().unwrap_err();
        assert_eq!(err.kind, ErrorKind::OutOfBounds);
    }

    #[test]
    fn cyclic_message_hits_nesting_limit() {
        // A struct whose pointer points back at itself.
        let seg = words(&[
            WirePointer::Struct {
                offset: 0,
                data_words: 0,
                ptr_words: 1,
            }
            .encode(),
            WirePointer::Struct {
                offset: -1,
                data_words: 0,
                ptr_words: 1,
            }
            .encode(),
        ]);
        let segs: &[&[u8]] = &[&seg];
        let message = Reader::new(segs, ReaderOptions::new());
        let mut view = message.root().unwrap().get_struct().unwrap();
        let mut result = Ok(());
        for _ in 0..100 {
            match view.get_pointer_field(0).get_struct() {
                Ok(next) => view = next,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        assert_eq!(result.unwrap_err().kind, ErrorKind::MalformedPointer);
    }
}
