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

//! The message builder: segment allocation and packing.
//!
//! A [`Builder`] owns a growable sequence of zeroed, word-aligned segments.
//! Every allocation returns an [`Address`], a `(segment, byte offset)`
//! handle that the caller (normally generated code) fills through the
//! primitive write and pointer-set operations. Word 0 of segment 0 is the
//! root pointer and is reserved the moment the first segment exists.

use smallvec::SmallVec;

use crate::buffer::{Mask, WireValue};
use crate::message::{OutputSegments, ReaderSegments};
use crate::pointer::{ElementSize, WirePointer};
use crate::reader::{ListReader, PointerReader, StructReader};
use crate::traits::IntoInternalStructReader;
use crate::{BYTES_PER_WORD, Error, ErrorKind, Result};

/// An object that provides zeroed memory for message segments as they are
/// needed. Returned segments must be a whole number of words long and at
/// least `minimum_words` of them.
pub trait Allocator {
    fn allocate_segment(&mut self, minimum_words: u32) -> Vec<u8>;
}

impl<A: Allocator> Allocator for &mut A {
    fn allocate_segment(&mut self, minimum_words: u32) -> Vec<u8> {
        (*self).allocate_segment(minimum_words)
    }
}

#[derive(Clone, Copy, Debug)]
pub enum AllocationStrategy {
    /// Allocates the same number of words for each segment, to the extent
    /// possible. Primarily useful for testing cross-segment pointers.
    FixedSize,

    /// Doubles the allocation for each subsequent segment.
    GrowHeuristically,
}

pub const SUGGESTED_FIRST_SEGMENT_WORDS: u32 = 1024;
pub const SUGGESTED_ALLOCATION_STRATEGY: AllocationStrategy = AllocationStrategy::GrowHeuristically;

/// Standard segment allocator.
#[derive(Debug)]
pub struct HeapAllocator {
    // Minimum number of words in the next allocation.
    next_size: u32,

    // How to update next_size after an allocation.
    allocation_strategy: AllocationStrategy,

    // Maximum number of words to allocate.
    max_segment_words: u32,
}

impl Default for HeapAllocator {
    fn default() -> Self {
        Self {
            next_size: SUGGESTED_FIRST_SEGMENT_WORDS,
            allocation_strategy: SUGGESTED_ALLOCATION_STRATEGY,
            max_segment_words: 1 << 29,
        }
    }
}

impl HeapAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the size of the initial segment in words, where 1 word = 8 bytes.
    pub fn first_segment_words(mut self, value: u32) -> Self {
        assert!(value <= self.max_segment_words);
        self.next_size = value.max(1);
        self
    }

    /// Sets the allocation strategy for segments after the first one.
    pub fn allocation_strategy(mut self, value: AllocationStrategy) -> Self {
        self.allocation_strategy = value;
        self
    }
}

impl Allocator for HeapAllocator {
    fn allocate_segment(&mut self, minimum_words: u32) -> Vec<u8> {
        let size = minimum_words.max(self.next_size);
        match self.allocation_strategy {
            AllocationStrategy::GrowHeuristically => {
                if size < self.max_segment_words - self.next_size {
                    self.next_size += size;
                } else {
                    self.next_size = self.max_segment_words;
                }
            }
            AllocationStrategy::FixedSize => {}
        }
        vec![0; size as usize * BYTES_PER_WORD]
    }
}

/// A word-aligned location inside a message under construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Address {
    pub segment: u32,
    pub offset: u32,
}

impl Address {
    /// The location of pointer `index` in the pointer section of the
    /// struct allocated at `self`.
    pub fn pointer_slot(self, data_words: u16, index: u16) -> Address {
        Address {
            segment: self.segment,
            offset: self.offset + (data_words as u32 + index as u32) * BYTES_PER_WORD as u32,
        }
    }
}

struct Segment {
    data: Vec<u8>,
    used_words: u32,
}

impl Segment {
    fn capacity_words(&self) -> u32 {
        (self.data.len() / BYTES_PER_WORD) as u32
    }
}

/// A container used to build a message.
pub struct Builder<A: Allocator = HeapAllocator> {
    allocator: A,
    segments: Vec<Segment>,
}

impl Builder<HeapAllocator> {
    /// A builder whose first segment has length
    /// [`SUGGESTED_FIRST_SEGMENT_WORDS`].
    pub fn new_default() -> Self {
        Self::new(HeapAllocator::new())
    }
}

impl<A: Allocator> Builder<A> {
    pub fn new(allocator: A) -> Self {
        Self {
            allocator,
            segments: Vec::new(),
        }
    }

    fn ensure_root_segment(&mut self) {
        if self.segments.is_empty() {
            let data = self.allocator.allocate_segment(1);
            self.segments.push(Segment {
                data,
                used_words: 1, // word 0 holds the root pointer
            });
        }
    }

    fn try_allocate_in(&mut self, segment: u32, words: u32) -> Option<Address> {
        let seg = self.segments.get_mut(segment as usize)?;
        if seg.capacity_words() - seg.used_words >= words {
            let offset = seg.used_words * BYTES_PER_WORD as u32;
            seg.used_words += words;
            Some(Address { segment, offset })
        } else {
            None
        }
    }

    /// Allocates `words` zeroed words, extending the message with a new
    /// segment when the current one cannot satisfy the request.
    pub fn allocate(&mut self, words: u32) -> Address {
        self.ensure_root_segment();
        let last = (self.segments.len() - 1) as u32;
        if let Some(address) = self.try_allocate_in(last, words) {
            return address;
        }
        let data = self.allocator.allocate_segment(words.max(1));
        self.segments.push(Segment {
            data,
            used_words: words,
        });
        Address {
            segment: (self.segments.len() - 1) as u32,
            offset: 0,
        }
    }

    pub fn allocate_struct(&mut self, data_words: u16, ptr_words: u16) -> Address {
        self.allocate(data_words as u32 + ptr_words as u32)
    }

    /// Allocates the body of a scalar, bit, or pointer list. Composite
    /// lists carry a tag word and go through [`Self::allocate_struct_list`].
    pub fn allocate_list(&mut self, element_size: ElementSize, count: u32) -> Result<Address> {
        if element_size == ElementSize::InlineComposite {
            return Err(Error::from_kind_context(
                ErrorKind::TypeMismatch,
                "struct elements need a tag word; use allocate_struct_list",
            ));
        }
        let bits = element_size.bits() as u64 * count as u64;
        Ok(self.allocate(bits.div_ceil(64) as u32))
    }

    /// Allocates a composite list: one tag word encoding the element count
    /// and shape, followed by `count` inline struct bodies. The returned
    /// address is that of the tag word.
    pub fn allocate_struct_list(
        &mut self,
        count: u32,
        data_words: u16,
        ptr_words: u16,
    ) -> Result<Address> {
        let per_element = data_words as u32 + ptr_words as u32;
        let total = count
            .checked_mul(per_element)
            .filter(|total| *total < 1 << 29 && count < 1 << 29)
            .ok_or_else(|| {
                Error::from_kind_context(ErrorKind::OutOfBounds, "composite list too long")
            })?;
        let address = self.allocate(1 + total);
        self.write_word(
            address,
            WirePointer::Struct {
                offset: count as i32,
                data_words,
                ptr_words,
            }
            .encode(),
        )?;
        Ok(address)
    }

    /// Allocates `value` plus its NUL terminator as a byte-list body.
    pub fn allocate_text(&mut self, value: &str) -> Result<Address> {
        let bytes = value.as_bytes();
        let address = self.allocate(((bytes.len() + 1) as u64).div_ceil(8) as u32);
        self.write_bytes(address, 0, bytes)?;
        Ok(address)
    }

    pub fn allocate_data(&mut self, value: &[u8]) -> Result<Address> {
        let address = self.allocate((value.len() as u64).div_ceil(8) as u32);
        self.write_bytes(address, 0, value)?;
        Ok(address)
    }

    fn slice_mut(&mut self, address: Address, byte_offset: usize, len: usize) -> Result<&mut [u8]> {
        let seg = self
            .segments
            .get_mut(address.segment as usize)
            .ok_or_else(|| Error::from_kind(ErrorKind::OutOfBounds))?;
        let start = address.offset as usize + byte_offset;
        let limit = seg.used_words as usize * BYTES_PER_WORD;
        if start + len > limit {
            return Err(Error::from_kind_context(
                ErrorKind::OutOfBounds,
                format!("write of {len} bytes at {start} exceeds allocation of {limit}"),
            ));
        }
        Ok(&mut seg.data[start..start + len])
    }

    fn write_bytes(&mut self, address: Address, byte_offset: usize, bytes: &[u8]) -> Result<()> {
        self.slice_mut(address, byte_offset, bytes.len())?
            .copy_from_slice(bytes);
        Ok(())
    }

    fn write_word(&mut self, address: Address, word: u64) -> Result<()> {
        word.write(self.slice_mut(address, 0, BYTES_PER_WORD)?);
        Ok(())
    }

    /// Writes the primitive at `offset` (in units of `T`) into the
    /// allocation at `address`.
    pub fn write_data<T: WireValue>(
        &mut self,
        address: Address,
        offset: usize,
        value: T,
    ) -> Result<()> {
        value.write(self.slice_mut(address, offset * T::BYTES, T::BYTES)?);
        Ok(())
    }

    /// Like [`Self::write_data`], XORing with the field's default first.
    pub fn write_data_mask<T: Mask>(
        &mut self,
        address: Address,
        offset: usize,
        value: T,
        mask: T::MaskT,
    ) -> Result<()> {
        self.write_data(address, offset, value.mask(mask))
    }

    /// Writes the bit at `offset` (in bits) into the allocation at
    /// `address`.
    pub fn write_bool(&mut self, address: Address, offset: usize, value: bool) -> Result<()> {
        let byte = self.slice_mut(address, offset / 8, 1)?;
        if value {
            byte[0] |= 1 << (offset % 8);
        } else {
            byte[0] &= !(1 << (offset % 8));
        }
        Ok(())
    }

    pub fn write_bool_mask(
        &mut self,
        address: Address,
        offset: usize,
        value: bool,
        mask: bool,
    ) -> Result<()> {
        self.write_bool(address, offset, value ^ mask)
    }

    /// Writes the pointer at `slot` so that it reaches `target`. A
    /// same-segment target gets a direct pointer; otherwise a one-word
    /// landing pad goes into the target's segment, or, when that segment
    /// is full, a two-word double-far pad goes wherever there is room.
    fn write_pointer(&mut self, slot: Address, target: Address, shape: WirePointer) -> Result<()> {
        fn with_offset(shape: WirePointer, offset: i32) -> WirePointer {
            match shape {
                WirePointer::Struct {
                    data_words,
                    ptr_words,
                    ..
                } => WirePointer::Struct {
                    offset,
                    data_words,
                    ptr_words,
                },
                WirePointer::List {
                    element_size, count, ..
                } => WirePointer::List {
                    offset,
                    element_size,
                    count,
                },
                other => other,
            }
        }
        // An empty struct directly after its pointer would encode as the
        // null word; pointing one word back keeps it distinguishable.
        fn encode_at(shape: WirePointer, offset: i32) -> u64 {
            let word = with_offset(shape, offset).encode();
            if word == 0 {
                with_offset(shape, -1).encode()
            } else {
                word
            }
        }
        let word_delta = |from: Address| {
            (target.offset as i64 - (from.offset as i64 + BYTES_PER_WORD as i64))
                / BYTES_PER_WORD as i64
        };
        if slot.segment == target.segment {
            return self.write_word(slot, encode_at(shape, word_delta(slot) as i32));
        }
        if let Some(pad) = self.try_allocate_in(target.segment, 1) {
            self.write_word(pad, encode_at(shape, word_delta(pad) as i32))?;
            return self.write_word(
                slot,
                WirePointer::Far {
                    double_far: false,
                    landing_pad: pad.offset / BYTES_PER_WORD as u32,
                    segment: target.segment,
                }
                .encode(),
            );
        }
        let pad = self.allocate(2);
        self.write_word(
            pad,
            WirePointer::Far {
                double_far: false,
                landing_pad: target.offset / BYTES_PER_WORD as u32,
                segment: target.segment,
            }
            .encode(),
        )?;
        self.write_word(
            Address {
                segment: pad.segment,
                offset: pad.offset + BYTES_PER_WORD as u32,
            },
            encode_at(shape, 0),
        )?;
        self.write_word(
            slot,
            WirePointer::Far {
                double_far: true,
                landing_pad: pad.offset / BYTES_PER_WORD as u32,
                segment: pad.segment,
            }
            .encode(),
        )
    }

    pub fn set_struct_pointer(
        &mut self,
        slot: Address,
        target: Address,
        data_words: u16,
        ptr_words: u16,
    ) -> Result<()> {
        self.write_pointer(
            slot,
            target,
            WirePointer::Struct {
                offset: 0,
                data_words,
                ptr_words,
            },
        )
    }

    /// For composite lists, `count` is the total body length in words; the
    /// element count lives in the tag word written at allocation.
    pub fn set_list_pointer(
        &mut self,
        slot: Address,
        target: Address,
        element_size: ElementSize,
        count: u32,
    ) -> Result<()> {
        self.write_pointer(
            slot,
            target,
            WirePointer::List {
                offset: 0,
                element_size,
                count,
            },
        )
    }

    /// Stamps the root pointer (segment 0, word 0) with a struct pointer
    /// to `target`.
    pub fn set_root_struct(
        &mut self,
        target: Address,
        data_words: u16,
        ptr_words: u16,
    ) -> Result<()> {
        self.ensure_root_segment();
        self.set_struct_pointer(
            Address {
                segment: 0,
                offset: 0,
            },
            target,
            data_words,
            ptr_words,
        )
    }

    pub fn set_root_list(
        &mut self,
        target: Address,
        element_size: ElementSize,
        count: u32,
    ) -> Result<()> {
        self.ensure_root_segment();
        self.set_list_pointer(
            Address {
                segment: 0,
                offset: 0,
            },
            target,
            element_size,
            count,
        )
    }

    /// Allocates `value` and points `slot` at it with a byte-list pointer
    /// counting the NUL terminator.
    pub fn set_text(&mut self, slot: Address, value: &str) -> Result<()> {
        let target = self.allocate_text(value)?;
        self.set_list_pointer(slot, target, ElementSize::Byte, value.len() as u32 + 1)
    }

    pub fn set_data(&mut self, slot: Address, value: &[u8]) -> Result<()> {
        let target = self.allocate_data(value)?;
        self.set_list_pointer(slot, target, ElementSize::Byte, value.len() as u32)
    }

    pub fn set_primitive_list<T: WireValue>(&mut self, slot: Address, values: &[T]) -> Result<()> {
        let element_size = ElementSize::for_byte_width(T::BYTES);
        let target = self.allocate_list(element_size, values.len() as u32)?;
        for (index, value) in values.iter().enumerate() {
            self.write_data::<T>(target, index, *value)?;
        }
        self.set_list_pointer(slot, target, element_size, values.len() as u32)
    }

    pub fn set_bool_list(&mut self, slot: Address, values: &[bool]) -> Result<()> {
        let target = self.allocate_list(ElementSize::Bit, values.len() as u32)?;
        for (index, value) in values.iter().enumerate() {
            self.write_bool(target, index, *value)?;
        }
        self.set_list_pointer(slot, target, ElementSize::Bit, values.len() as u32)
    }

    pub fn set_enum_list<T: Copy + Into<u16>>(&mut self, slot: Address, values: &[T]) -> Result<()> {
        let target = self.allocate_list(ElementSize::TwoBytes, values.len() as u32)?;
        for (index, value) in values.iter().enumerate() {
            self.write_data::<u16>(target, index, (*value).into())?;
        }
        self.set_list_pointer(slot, target, ElementSize::TwoBytes, values.len() as u32)
    }

    pub fn set_text_list(&mut self, slot: Address, values: &[&str]) -> Result<()> {
        let target = self.allocate_list(ElementSize::Pointer, values.len() as u32)?;
        for (index, value) in values.iter().enumerate() {
            let element_slot = Address {
                segment: target.segment,
                offset: target.offset + index as u32 * BYTES_PER_WORD as u32,
            };
            self.set_text(element_slot, value)?;
        }
        self.set_list_pointer(slot, target, ElementSize::Pointer, values.len() as u32)
    }

    /// Deep-copies `value` into this message and points `slot` at the copy.
    pub fn set_struct_field(&mut self, slot: Address, value: &StructReader<'_>) -> Result<()> {
        let address = self.copy_struct_from(value)?;
        self.set_struct_pointer(slot, address, value.data_words(), value.ptr_words())
    }

    /// Packs `values` as a composite list of the given element shape,
    /// deep-copying each element, and points `slot` at it.
    pub fn set_struct_list<'a, T>(
        &mut self,
        slot: Address,
        data_words: u16,
        ptr_words: u16,
        values: &[T],
    ) -> Result<()>
    where
        T: IntoInternalStructReader<'a> + Copy,
    {
        let per_element = data_words as u32 + ptr_words as u32;
        let target = self.allocate_struct_list(values.len() as u32, data_words, ptr_words)?;
        for (index, value) in values.iter().enumerate() {
            let element = Address {
                segment: target.segment,
                offset: target.offset
                    + (1 + index as u32 * per_element) * BYTES_PER_WORD as u32,
            };
            let src = (*value).into_internal_struct_reader();
            self.copy_struct_into(element, data_words, ptr_words, &src)?;
        }
        self.set_list_pointer(
            slot,
            target,
            ElementSize::InlineComposite,
            values.len() as u32 * per_element,
        )
    }

    /// Reproduces `src` in this message: data bytes verbatim, pointers
    /// recursively, far indirections collapsed.
    pub fn copy_struct_from(&mut self, src: &StructReader<'_>) -> Result<Address> {
        let address = self.allocate_struct(src.data_words(), src.ptr_words());
        self.copy_struct_into(address, src.data_words(), src.ptr_words(), src)?;
        Ok(address)
    }

    fn copy_struct_into(
        &mut self,
        dst: Address,
        data_words: u16,
        ptr_words: u16,
        src: &StructReader<'_>,
    ) -> Result<()> {
        let data = src.data_section();
        let n = data.len().min(data_words as usize * BYTES_PER_WORD);
        self.write_bytes(dst, 0, &data[..n])?;
        for index in 0..ptr_words.min(src.ptr_words()) {
            let pointer = src.get_pointer_field(index);
            if !pointer.is_null() {
                self.copy_pointer_from(dst.pointer_slot(data_words, index), &pointer)?;
            }
        }
        Ok(())
    }

    /// Deep-copies whatever `src` targets and points `slot` at the copy.
    /// A null source leaves `slot` null.
    pub fn copy_pointer_from(&mut self, slot: Address, src: &PointerReader<'_>) -> Result<()> {
        let Some((_, _, ptr)) = src.resolve()? else {
            return Ok(());
        };
        match ptr {
            WirePointer::Struct { .. } => {
                let view = src.get_struct()?;
                self.set_struct_field(slot, &view)
            }
            WirePointer::List { .. } => {
                let view = src.get_list(None)?;
                let address = self.copy_list_from(&view)?;
                let element_size = view.get_element_size();
                let count = if element_size == ElementSize::InlineComposite {
                    let (d, p) = view.element_shape();
                    view.len() * (d as u32 + p as u32)
                } else {
                    view.len()
                };
                self.set_list_pointer(slot, address, element_size, count)
            }
            _ => Err(Error::from_kind(ErrorKind::MalformedPointer)),
        }
    }

    pub fn copy_list_from(&mut self, src: &ListReader<'_>) -> Result<Address> {
        let count = src.len();
        match src.get_element_size() {
            ElementSize::InlineComposite => {
                let (data_words, ptr_words) = src.element_shape();
                let per_element = data_words as u32 + ptr_words as u32;
                let target = self.allocate_struct_list(count, data_words, ptr_words)?;
                for index in 0..count {
                    let element = Address {
                        segment: target.segment,
                        offset: target.offset
                            + (1 + index * per_element) * BYTES_PER_WORD as u32,
                    };
                    self.copy_struct_into(
                        element,
                        data_words,
                        ptr_words,
                        &src.get_struct_element(index),
                    )?;
                }
                Ok(target)
            }
            ElementSize::Pointer => {
                let target = self.allocate_list(ElementSize::Pointer, count)?;
                for index in 0..count {
                    let pointer = src.get_pointer_element(index);
                    if !pointer.is_null() {
                        let element_slot = Address {
                            segment: target.segment,
                            offset: target.offset + index * BYTES_PER_WORD as u32,
                        };
                        self.copy_pointer_from(element_slot, &pointer)?;
                    }
                }
                Ok(target)
            }
            element_size => {
                let target = self.allocate_list(element_size, count)?;
                self.write_bytes(target, 0, src.items_bytes())?;
                Ok(target)
            }
        }
    }

    /// The finished segments, trimmed to their allocated words.
    pub fn segments_for_output(&self) -> OutputSegments<'_> {
        OutputSegments::new(
            self.segments
                .iter()
                .map(|s| &s.data[..s.used_words as usize * BYTES_PER_WORD])
                .collect::<SmallVec<_>>(),
        )
    }
}

impl<A: Allocator> ReaderSegments for Builder<A> {
    fn get_segment(&self, id: u32) -> Option<&[u8]> {
        self.segments
            .get(id as usize)
            .map(|s| &s.data[..s.used_words as usize * BYTES_PER_WORD])
    }

    fn len(&self) -> usize {
        self.segments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Reader, ReaderOptions};

    #[test]
    fn first_allocation_lands_after_the_root_word() {
        let mut message = Builder::new_default();
        let address = message.allocate_struct(2, 0);
        assert_eq!(
            address,
            Address {
                segment: 0,
                offset: 8
            }
        );
    }

    #[test]
    fn builds_and_reads_back_a_struct() {
        let mut message = Builder::new_default();
        let address = message.allocate_struct(2, 1);
        message.write_data::<i64>(address, 0, -7).unwrap();
        message.write_data::<u32>(address, 3, 9).unwrap();
        message.set_text(address.pointer_slot(2, 0), "hi").unwrap();
        message.set_root_struct(address, 2, 1).unwrap();

        let reader = Reader::new(&message, ReaderOptions::new());
        let root = reader.root().unwrap().get_struct().unwrap();
        assert_eq!(root.get_data_field::<i64>(0), -7);
        assert_eq!(root.get_data_field::<u32>(3), 9);
        assert_eq!(root.get_pointer_field(0).get_text().unwrap(), "hi");
    }

    #[test]
    fn composite_list_allocation_writes_the_tag() {
        let mut message = Builder::new_default();
        let list = message.allocate_struct_list(2, 2, 0).unwrap();
        message.set_root_list(list, ElementSize::InlineComposite, 4).unwrap();
        let reader = Reader::new(&message, ReaderOptions::new());
        let view = reader.root().unwrap().get_list(None).unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(view.element_shape(), (2, 0));
    }

    #[test]
    fn scalar_list_allocator_rejects_composite() {
        let mut message = Builder::new_default();
        let err = message
            .allocate_list(ElementSize::InlineComposite, 3)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn cross_segment_pointers_become_far_pointers() {
        // A one-word first segment holds only the root pointer, so the
        // struct must land in segment 1 behind a far pointer.
        let allocator = HeapAllocator::new()
            .first_segment_words(1)
            .allocation_strategy(AllocationStrategy::FixedSize);
        let mut message = Builder::new(allocator);
        let address = message.allocate_struct(1, 0);
        assert_eq!(address.segment, 1);
        message.write_data::<u64>(address, 0, 99).unwrap();
        message.set_root_struct(address, 1, 0).unwrap();

        let reader = Reader::new(&message, ReaderOptions::new());
        let root = reader.root().unwrap().get_struct().unwrap();
        assert_eq!(root.get_data_field::<u64>(0), 99);
    }

    #[test]
    fn deep_copy_preserves_text_behind_pointers() {
        let mut source = Builder::new_default();
        let address = source.allocate_struct(1, 1);
        source.write_data::<u64>(address, 0, 5).unwrap();
        source.set_text(address.pointer_slot(1, 0), "copied").unwrap();
        source.set_root_struct(address, 1, 1).unwrap();

        let source_reader = Reader::new(&source, ReaderOptions::new());
        let root = source_reader.root().unwrap().get_struct().unwrap();

        let mut dest = Builder::new_default();
        let copy = dest.copy_struct_from(&root).unwrap();
        dest.set_root_struct(copy, 1, 1).unwrap();

        let dest_reader = Reader::new(&dest, ReaderOptions::new());
        let copied = dest_reader.root().unwrap().get_struct().unwrap();
        assert_eq!(copied.get_data_field::<u64>(0), 5);
        assert_eq!(copied.get_pointer_field(0).get_text().unwrap(), "copied");
    }
}
