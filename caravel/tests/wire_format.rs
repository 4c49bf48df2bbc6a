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

//! End-to-end wire-format scenarios, driven through accessor modules
//! written exactly the way caravel-gen emits them.

use caravel::ErrorKind;
use caravel::builder::{AllocationStrategy, Builder, HeapAllocator};
use caravel::message::{Reader, ReaderOptions};
use caravel::pointer::{ElementSize, WirePointer};
use caravel::serialize;

/// `struct Point { x @0 :Int64; y @1 :Int64; }`
pub mod point {
    pub const DATA_WORDS: u16 = 2;
    pub const PTR_WORDS: u16 = 0;

    #[derive(Clone, Copy)]
    pub struct Reader<'a> {
        reader: ::caravel::reader::StructReader<'a>,
    }

    impl<'a> ::caravel::traits::FromStructReader<'a> for Reader<'a> {
        fn new(reader: ::caravel::reader::StructReader<'a>) -> Self {
            Self { reader }
        }
    }

    impl<'a> ::caravel::traits::IntoInternalStructReader<'a> for Reader<'a> {
        fn into_internal_struct_reader(self) -> ::caravel::reader::StructReader<'a> {
            self.reader
        }
    }

    impl<'a> ::caravel::traits::FromPointerReader<'a> for Reader<'a> {
        fn get_from_pointer(
            reader: &::caravel::reader::PointerReader<'a>,
        ) -> ::caravel::Result<Self> {
            ::core::result::Result::Ok(Self {
                reader: reader.get_struct()?,
            })
        }
    }

    impl<'a> Reader<'a> {
        pub fn get_x(self) -> i64 {
            self.reader.get_data_field::<i64>(0)
        }
        pub fn get_y(self) -> i64 {
            self.reader.get_data_field::<i64>(1)
        }
    }

    pub fn new<A: ::caravel::builder::Allocator>(
        message: &mut ::caravel::builder::Builder<A>,
        x: i64,
        y: i64,
    ) -> ::caravel::Result<::caravel::builder::Address> {
        let address = message.allocate_struct(DATA_WORDS, PTR_WORDS);
        message.write_data::<i64>(address, 0, x)?;
        message.write_data::<i64>(address, 1, y)?;
        ::core::result::Result::Ok(address)
    }
}

/// `struct Shape { union { circle @0 :Void; square @1 :Int64; } }`
pub mod shape {
    pub const DATA_WORDS: u16 = 2;
    pub const PTR_WORDS: u16 = 0;
    pub const TAG_OFFSET: usize = 4;

    #[derive(Clone, Copy)]
    pub struct Reader<'a> {
        reader: ::caravel::reader::StructReader<'a>,
    }

    impl<'a> ::caravel::traits::FromStructReader<'a> for Reader<'a> {
        fn new(reader: ::caravel::reader::StructReader<'a>) -> Self {
            Self { reader }
        }
    }

    impl<'a> ::caravel::traits::FromPointerReader<'a> for Reader<'a> {
        fn get_from_pointer(
            reader: &::caravel::reader::PointerReader<'a>,
        ) -> ::caravel::Result<Self> {
            ::core::result::Result::Ok(Self {
                reader: reader.get_struct()?,
            })
        }
    }

    impl<'a> Reader<'a> {
        pub fn which(self) -> ::core::result::Result<Which, ::caravel::NotInSchema> {
            ::core::convert::TryFrom::try_from(self.reader.get_data_field::<u16>(TAG_OFFSET))
        }
        pub fn get_circle(self) -> () {
            ()
        }
        pub fn get_square(self) -> i64 {
            if self.reader.get_data_field::<u16>(TAG_OFFSET) == 1 {
                self.reader.get_data_field::<i64>(0)
            } else {
                0i64
            }
        }
    }

    #[repr(u16)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Which {
        Circle = 0,
        Square = 1,
    }

    impl ::core::convert::TryFrom<u16> for Which {
        type Error = ::caravel::NotInSchema;

        fn try_from(value: u16) -> ::core::result::Result<Self, Self::Error> {
            match value {
                0 => ::core::result::Result::Ok(Self::Circle),
                1 => ::core::result::Result::Ok(Self::Square),
                _ => ::core::result::Result::Err(::caravel::NotInSchema(value)),
            }
        }
    }

    pub fn new_circle<A: ::caravel::builder::Allocator>(
        message: &mut ::caravel::builder::Builder<A>,
    ) -> ::caravel::Result<::caravel::builder::Address> {
        let address = message.allocate_struct(DATA_WORDS, PTR_WORDS);
        message.write_data::<u16>(address, TAG_OFFSET, 0)?;
        ::core::result::Result::Ok(address)
    }

    pub fn new_square<A: ::caravel::builder::Allocator>(
        message: &mut ::caravel::builder::Builder<A>,
        square: i64,
    ) -> ::caravel::Result<::caravel::builder::Address> {
        let address = message.allocate_struct(DATA_WORDS, PTR_WORDS);
        message.write_data::<i64>(address, 0, square)?;
        message.write_data::<u16>(address, TAG_OFFSET, 1)?;
        ::core::result::Result::Ok(address)
    }

    pub fn try_new<A: ::caravel::builder::Allocator>(
        message: &mut ::caravel::builder::Builder<A>,
        circle: ::core::option::Option<()>,
        square: ::core::option::Option<i64>,
    ) -> ::caravel::Result<::caravel::builder::Address> {
        match (circle, square) {
            (::core::option::Option::Some(()), ::core::option::Option::None) => {
                new_circle(message)
            }
            (::core::option::Option::None, ::core::option::Option::Some(square)) => {
                new_square(message, square)
            }
            _ => ::core::result::Result::Err(::caravel::Error::from_kind_context(
                ::caravel::ErrorKind::UnionArmConflict,
                "exactly one of the following must be given: circle, square",
            )),
        }
    }
}

/// `struct Label { text @0 :Text; }`
pub mod label {
    pub const DATA_WORDS: u16 = 0;
    pub const PTR_WORDS: u16 = 1;

    #[derive(Clone, Copy)]
    pub struct Reader<'a> {
        reader: ::caravel::reader::StructReader<'a>,
    }

    impl<'a> ::caravel::traits::FromPointerReader<'a> for Reader<'a> {
        fn get_from_pointer(
            reader: &::caravel::reader::PointerReader<'a>,
        ) -> ::caravel::Result<Self> {
            ::core::result::Result::Ok(Self {
                reader: reader.get_struct()?,
            })
        }
    }

    impl<'a> Reader<'a> {
        pub fn get_text(self) -> ::caravel::Result<&'a str> {
            self.reader.get_pointer_field(0).get_text()
        }
    }

    pub fn new<A: ::caravel::builder::Allocator>(
        message: &mut ::caravel::builder::Builder<A>,
        text: &str,
    ) -> ::caravel::Result<::caravel::builder::Address> {
        let address = message.allocate_struct(DATA_WORDS, PTR_WORDS);
        message.set_text(address.pointer_slot(DATA_WORDS, 0), text)?;
        ::core::result::Result::Ok(address)
    }
}

/// `struct Cluster { points @0 :List(Point); }`
pub mod cluster {
    pub const DATA_WORDS: u16 = 0;
    pub const PTR_WORDS: u16 = 1;

    #[derive(Clone, Copy)]
    pub struct Reader<'a> {
        reader: ::caravel::reader::StructReader<'a>,
    }

    impl<'a> ::caravel::traits::FromPointerReader<'a> for Reader<'a> {
        fn get_from_pointer(
            reader: &::caravel::reader::PointerReader<'a>,
        ) -> ::caravel::Result<Self> {
            ::core::result::Result::Ok(Self {
                reader: reader.get_struct()?,
            })
        }
    }

    impl<'a> Reader<'a> {
        pub fn get_points(
            self,
        ) -> ::caravel::Result<::caravel::struct_list::Reader<'a, crate::point::Reader<'a>>>
        {
            ::caravel::traits::FromPointerReader::get_from_pointer(
                &self.reader.get_pointer_field(0),
            )
        }
    }

    pub fn new<A: ::caravel::builder::Allocator>(
        message: &mut ::caravel::builder::Builder<A>,
        points: &[crate::point::Reader<'_>],
    ) -> ::caravel::Result<::caravel::builder::Address> {
        let address = message.allocate_struct(DATA_WORDS, PTR_WORDS);
        message.set_struct_list(
            address.pointer_slot(DATA_WORDS, 0),
            crate::point::DATA_WORDS,
            crate::point::PTR_WORDS,
            points,
        )?;
        ::core::result::Result::Ok(address)
    }
}

/// `struct Pair { first @0 :Point; second @1 :Point; }`
pub mod pair {
    pub const DATA_WORDS: u16 = 0;
    pub const PTR_WORDS: u16 = 2;

    #[derive(Clone, Copy)]
    pub struct Reader<'a> {
        reader: ::caravel::reader::StructReader<'a>,
    }

    impl<'a> ::caravel::traits::FromPointerReader<'a> for Reader<'a> {
        fn get_from_pointer(
            reader: &::caravel::reader::PointerReader<'a>,
        ) -> ::caravel::Result<Self> {
            ::core::result::Result::Ok(Self {
                reader: reader.get_struct()?,
            })
        }
    }

    impl<'a> Reader<'a> {
        pub fn get_first(self) -> ::caravel::Result<crate::point::Reader<'a>> {
            ::caravel::traits::FromPointerReader::get_from_pointer(
                &self.reader.get_pointer_field(0),
            )
        }
        pub fn get_second(self) -> ::caravel::Result<crate::point::Reader<'a>> {
            ::caravel::traits::FromPointerReader::get_from_pointer(
                &self.reader.get_pointer_field(1),
            )
        }
    }

    pub fn new<A: ::caravel::builder::Allocator>(
        message: &mut ::caravel::builder::Builder<A>,
        first: crate::point::Reader<'_>,
        second: crate::point::Reader<'_>,
    ) -> ::caravel::Result<::caravel::builder::Address> {
        let address = message.allocate_struct(DATA_WORDS, PTR_WORDS);
        message.set_struct_field(
            address.pointer_slot(DATA_WORDS, 0),
            &::caravel::traits::IntoInternalStructReader::into_internal_struct_reader(first),
        )?;
        message.set_struct_field(
            address.pointer_slot(DATA_WORDS, 1),
            &::caravel::traits::IntoInternalStructReader::into_internal_struct_reader(second),
        )?;
        ::core::result::Result::Ok(address)
    }
}

fn serialized(message: &Builder) -> Vec<u8> {
    let mut bytes = Vec::new();
    serialize::write_message(&mut bytes, message).unwrap();
    bytes
}

fn word_at(bytes: &[u8], index: usize) -> u64 {
    u64::from_le_bytes(bytes[index * 8..index * 8 + 8].try_into().unwrap())
}

// S1: a two-field struct has the documented pointer word and body, and
// reads back what was built.
#[test]
fn two_field_struct_wire_shape_and_round_trip() {
    let mut message = Builder::new_default();
    let address = point::new(&mut message, 1, 2).unwrap();
    message
        .set_root_struct(address, point::DATA_WORDS, point::PTR_WORDS)
        .unwrap();

    let bytes = serialized(&message);
    // After the 8-byte framing header: the root struct pointer (offset 0,
    // data = 2, ptrs = 0), then the two data words.
    assert_eq!(&bytes[8..16], &[0, 0, 0, 0, 2, 0, 0, 0]);
    assert_eq!(word_at(&bytes[8..], 1), 1);
    assert_eq!(word_at(&bytes[8..], 2), 2);

    let decoded = serialize::read_message(&mut &bytes[..], ReaderOptions::new()).unwrap();
    let p: point::Reader = decoded.get_root().unwrap();
    assert_eq!(p.get_x(), 1);
    assert_eq!(p.get_y(), 2);
}

// S2: union constructors stamp the tag; the inactive arm reads as its
// default, never an error.
#[test]
fn union_arms_stamp_and_check_the_tag() {
    let mut message = Builder::new_default();
    let address = shape::new_square(&mut message, 5).unwrap();
    message
        .set_root_struct(address, shape::DATA_WORDS, shape::PTR_WORDS)
        .unwrap();

    let bytes = serialized(&message);
    let body = &bytes[8..];
    assert_eq!(word_at(body, 1), 5); // data word
    // The tag sits at discriminant_offset * 2 = byte 8 of the struct.
    assert_eq!(u16::from_le_bytes(body[16..18].try_into().unwrap()), 1);

    let reader = Reader::new(&message, ReaderOptions::new());
    let shape: shape::Reader = reader.get_root().unwrap();
    assert_eq!(shape.which().unwrap(), shape::Which::Square);
    assert_eq!(shape.get_square(), 5);
    #[allow(clippy::let_unit_value)]
    let _ = shape.get_circle(); // void default, not an error

    let mut message = Builder::new_default();
    let address = shape::new_circle(&mut message).unwrap();
    message
        .set_root_struct(address, shape::DATA_WORDS, shape::PTR_WORDS)
        .unwrap();
    let reader = Reader::new(&message, ReaderOptions::new());
    let shape: shape::Reader = reader.get_root().unwrap();
    assert_eq!(shape.which().unwrap(), shape::Which::Circle);
    assert_eq!(shape.get_square(), 0); // inactive arm: default
}

#[test]
fn unified_initialiser_requires_exactly_one_arm() {
    let mut message = Builder::new_default();
    let err = shape::try_new(&mut message, None, None).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnionArmConflict);
    let err = shape::try_new(&mut message, Some(()), Some(5)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnionArmConflict);

    let address = shape::try_new(&mut message, None, Some(7)).unwrap();
    message
        .set_root_struct(address, shape::DATA_WORDS, shape::PTR_WORDS)
        .unwrap();
    let reader = Reader::new(&message, ReaderOptions::new());
    let shape: shape::Reader = reader.get_root().unwrap();
    assert_eq!(shape.get_square(), 7);
}

// S3: a string field is a BYTE list counting its NUL terminator.
#[test]
fn string_fields_are_nul_terminated_byte_lists() {
    let mut message = Builder::new_default();
    let address = label::new(&mut message, "hello").unwrap();
    message
        .set_root_struct(address, label::DATA_WORDS, label::PTR_WORDS)
        .unwrap();

    let bytes = serialized(&message);
    let body = &bytes[8..];
    // Word 1 is the label's single pointer slot.
    let pointer = WirePointer::decode(word_at(body, 1)).unwrap();
    assert_eq!(
        pointer,
        WirePointer::List {
            offset: 0,
            element_size: ElementSize::Byte,
            count: 6,
        }
    );
    assert_eq!(&body[16..22], &[0x68, 0x65, 0x6c, 0x6c, 0x6f, 0x00]);

    let reader = Reader::new(&message, ReaderOptions::new());
    let label: label::Reader = reader.get_root().unwrap();
    assert_eq!(label.get_text().unwrap(), "hello");
}

// S4: a list of structs is an inline-composite list: total words in the
// pointer, element count and shape in the tag word.
#[test]
fn composite_lists_carry_a_tag_word() {
    let mut scratch = Builder::new_default();
    let a = point::new(&mut scratch, 1, 2).unwrap();
    scratch.set_root_struct(a, point::DATA_WORDS, point::PTR_WORDS).unwrap();
    let scratch2 = {
        let mut m = Builder::new_default();
        let b = point::new(&mut m, 3, 4).unwrap();
        m.set_root_struct(b, point::DATA_WORDS, point::PTR_WORDS).unwrap();
        m
    };

    let reader_a = Reader::new(&scratch, ReaderOptions::new());
    let reader_b = Reader::new(&scratch2, ReaderOptions::new());
    let pa: point::Reader = reader_a.get_root().unwrap();
    let pb: point::Reader = reader_b.get_root().unwrap();

    let mut message = Builder::new_default();
    let address = cluster::new(&mut message, &[pa, pb]).unwrap();
    message
        .set_root_struct(address, cluster::DATA_WORDS, cluster::PTR_WORDS)
        .unwrap();

    let bytes = serialized(&message);
    let body = &bytes[8..];
    // Word 1: the cluster's pointer slot -> composite list, 4 total words.
    assert_eq!(
        WirePointer::decode(word_at(body, 1)).unwrap(),
        WirePointer::List {
            offset: 0,
            element_size: ElementSize::InlineComposite,
            count: 4,
        }
    );
    // Word 2: the tag -- two elements of two data words each.
    assert_eq!(
        WirePointer::decode(word_at(body, 2)).unwrap(),
        WirePointer::Struct {
            offset: 2,
            data_words: 2,
            ptr_words: 0,
        }
    );
    assert_eq!(
        [word_at(body, 3), word_at(body, 4), word_at(body, 5), word_at(body, 6)],
        [1, 2, 3, 4]
    );

    let reader = Reader::new(&message, ReaderOptions::new());
    let cluster: cluster::Reader = reader.get_root().unwrap();
    let points = cluster.get_points().unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points.get(0).get_x(), 1);
    assert_eq!(points.get(1).get_y(), 4);
}

// Property 3: list equality is reflexive, symmetric, and content-based.
#[test]
fn struct_list_equality_is_content_based() {
    let build = |values: [(i64, i64); 2]| {
        let mut scratch_a = Builder::new_default();
        let a = point::new(&mut scratch_a, values[0].0, values[0].1).unwrap();
        scratch_a
            .set_root_struct(a, point::DATA_WORDS, point::PTR_WORDS)
            .unwrap();
        let mut scratch_b = Builder::new_default();
        let b = point::new(&mut scratch_b, values[1].0, values[1].1).unwrap();
        scratch_b
            .set_root_struct(b, point::DATA_WORDS, point::PTR_WORDS)
            .unwrap();

        let reader_a = Reader::new(&scratch_a, ReaderOptions::new());
        let reader_b = Reader::new(&scratch_b, ReaderOptions::new());
        let pa: point::Reader = reader_a.get_root().unwrap();
        let pb: point::Reader = reader_b.get_root().unwrap();

        let mut message = Builder::new_default();
        let address = cluster::new(&mut message, &[pa, pb]).unwrap();
        message
            .set_root_struct(address, cluster::DATA_WORDS, cluster::PTR_WORDS)
            .unwrap();
        message
    };

    let m1 = build([(1, 2), (3, 4)]);
    let m2 = build([(1, 2), (3, 4)]);
    let m3 = build([(1, 2), (3, 5)]);
    let r1 = Reader::new(&m1, ReaderOptions::new());
    let r2 = Reader::new(&m2, ReaderOptions::new());
    let r3 = Reader::new(&m3, ReaderOptions::new());
    let l1 = r1.get_root::<cluster::Reader>().unwrap().get_points().unwrap();
    let l2 = r2.get_root::<cluster::Reader>().unwrap().get_points().unwrap();
    let l3 = r3.get_root::<cluster::Reader>().unwrap().get_points().unwrap();
    assert!(l1 == l1);
    assert!(l1 == l2);
    assert!(l2 == l1);
    assert!(l1 != l3);
}

// S5: exhausting a segment forces far pointers; views reached through
// them are indistinguishable from direct ones.
#[test]
fn cross_segment_builds_read_back_transparently() {
    let allocator = HeapAllocator::new()
        .first_segment_words(3)
        .allocation_strategy(AllocationStrategy::FixedSize);
    let mut scratch = Builder::new_default();
    let a = point::new(&mut scratch, 1, 2).unwrap();
    scratch.set_root_struct(a, point::DATA_WORDS, point::PTR_WORDS).unwrap();
    let mut scratch2 = Builder::new_default();
    let b = point::new(&mut scratch2, 3, 4).unwrap();
    scratch2.set_root_struct(b, point::DATA_WORDS, point::PTR_WORDS).unwrap();

    let reader_a = Reader::new(&scratch, ReaderOptions::new());
    let reader_b = Reader::new(&scratch2, ReaderOptions::new());
    let pa: point::Reader = reader_a.get_root().unwrap();
    let pb: point::Reader = reader_b.get_root().unwrap();

    let mut message = Builder::new(allocator);
    let address = pair::new(&mut message, pa, pb).unwrap();
    message
        .set_root_struct(address, pair::DATA_WORDS, pair::PTR_WORDS)
        .unwrap();
    assert!(message.segments_for_output().len() > 1);

    let bytes = serialized(&message);
    let decoded = serialize::read_message(&mut &bytes[..], ReaderOptions::new()).unwrap();
    let pair: pair::Reader = decoded.get_root().unwrap();
    assert_eq!(pair.get_first().unwrap().get_x(), 1);
    assert_eq!(pair.get_first().unwrap().get_y(), 2);
    assert_eq!(pair.get_second().unwrap().get_x(), 3);
    assert_eq!(pair.get_second().unwrap().get_y(), 4);
}

// S6: three framed messages decode to exactly three values and a clean
// end of stream; a truncated tail is an error instead.
#[test]
fn framed_streams_end_cleanly_or_loudly() {
    let mut stream = Vec::new();
    for value in 1..=3 {
        let mut message = Builder::new_default();
        let address = point::new(&mut message, value, -value).unwrap();
        message
            .set_root_struct(address, point::DATA_WORDS, point::PTR_WORDS)
            .unwrap();
        serialize::write_message(&mut stream, &message).unwrap();
    }

    let mut cursor = &stream[..];
    let mut seen = Vec::new();
    while let Some(reader) = serialize::try_read_message(&mut cursor, ReaderOptions::new()).unwrap()
    {
        let p: point::Reader = reader.get_root().unwrap();
        seen.push((p.get_x(), p.get_y()));
    }
    assert_eq!(seen, vec![(1, -1), (2, -2), (3, -3)]);

    // Chop the last message short: truncation, not clean EOF.
    let mut cursor = &stream[..stream.len() - 4];
    let mut failures = 0;
    loop {
        match serialize::try_read_message(&mut cursor, ReaderOptions::new()) {
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                assert_eq!(e.kind, ErrorKind::OutOfBounds);
                failures += 1;
                break;
            }
        }
    }
    assert_eq!(failures, 1);
}

// Property 2: whatever is built and serialised reads back equal.
#[test]
fn round_trip_preserves_every_field_kind() {
    let mut message = Builder::new_default();
    let address = message.allocate_struct(2, 3);
    message.write_data::<u32>(address, 0, 77).unwrap();
    message.write_bool(address, 32, true).unwrap();
    message.write_data::<f64>(address, 1, -2.5).unwrap();
    message.set_text(address.pointer_slot(2, 0), "around").unwrap();
    message.set_data(address.pointer_slot(2, 1), &[9, 8, 7]).unwrap();
    message
        .set_primitive_list::<u16>(address.pointer_slot(2, 2), &[10, 20, 30])
        .unwrap();
    message.set_root_struct(address, 2, 3).unwrap();

    let bytes = serialized(&message);
    let decoded = serialize::read_message(&mut &bytes[..], ReaderOptions::new()).unwrap();
    let root: caravel::reader::StructReader = decoded.get_root().unwrap();
    assert_eq!(root.get_data_field::<u32>(0), 77);
    assert!(root.get_bool_field(32));
    assert_eq!(root.get_data_field::<f64>(1), -2.5);
    assert_eq!(root.get_pointer_field(0).get_text().unwrap(), "around");
    assert_eq!(root.get_pointer_field(1).get_data().unwrap(), &[9, 8, 7]);
    let list: caravel::primitive_list::Reader<u16> =
        caravel::traits::FromPointerReader::get_from_pointer(&root.get_pointer_field(2)).unwrap();
    assert_eq!(list.iter().collect::<Vec<_>>(), vec![10, 20, 30]);
}
