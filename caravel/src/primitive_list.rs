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

//! List of primitives.

use core::marker;

use crate::Result;
use crate::buffer::WireValue;
use crate::pointer::ElementSize;
use crate::reader::{ListReader, PointerReader};
use crate::traits::{FromPointerReader, IndexMove, ListIter};

/// An element type a primitive list can hold: the fixed-width numbers,
/// `bool` (stored as bits), and `()` (stored as nothing).
pub trait PrimitiveElement: Copy {
    fn element_size() -> ElementSize;
    fn get(list: &ListReader<'_>, index: u32) -> Self;
}

impl PrimitiveElement for bool {
    fn element_size() -> ElementSize {
        ElementSize::Bit
    }
    fn get(list: &ListReader<'_>, index: u32) -> Self {
        list.get_bool_element(index)
    }
}

macro_rules! primitive_element {
    ($ty:ty) => {
        impl PrimitiveElement for $ty {
            fn element_size() -> ElementSize {
                ElementSize::for_byte_width(<$ty as WireValue>::BYTES)
            }
            fn get(list: &ListReader<'_>, index: u32) -> Self {
                list.read_primitive::<$ty>(index)
            }
        }
    };
}

primitive_element!(());
primitive_element!(u8);
primitive_element!(i8);
primitive_element!(u16);
primitive_element!(i16);
primitive_element!(u32);
primitive_element!(i32);
primitive_element!(u64);
primitive_element!(i64);
primitive_element!(f32);
primitive_element!(f64);

pub struct Reader<'a, T>
where
    T: PrimitiveElement,
{
    marker: marker::PhantomData<T>,
    reader: ListReader<'a>,
}

// Have to do this manually because derive(Copy) doesn't know about PhantomData.
impl<T: PrimitiveElement> Copy for Reader<'_, T> {}

impl<T: PrimitiveElement> Clone for Reader<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: PrimitiveElement> Reader<'a, T> {
    pub fn len(&self) -> u32 {
        self.reader.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(self) -> ListIter<Reader<'a, T>, T> {
        let l = self.len();
        ListIter::new(self, l)
    }

    /// Gets the `T` at position `index`. Panics if `index` is greater than
    /// or equal to `len()`.
    pub fn get(&self, index: u32) -> T {
        assert!(index < self.len());
        T::get(&self.reader, index)
    }

    /// Gets the `T` at position `index`. Returns `None` if `index`
    /// is greater than or equal to `len()`.
    pub fn try_get(&self, index: u32) -> Option<T> {
        if index < self.len() {
            Some(T::get(&self.reader, index))
        } else {
            None
        }
    }

    /// Gets the `T` at a position that may count from the end of the list.
    pub fn at(&self, index: i64) -> Result<T> {
        Ok(T::get(&self.reader, self.reader.at_index(index)?))
    }
}

impl<'a, T: PrimitiveElement> FromPointerReader<'a> for Reader<'a, T> {
    fn get_from_pointer(reader: &PointerReader<'a>) -> Result<Reader<'a, T>> {
        Ok(Reader {
            reader: reader.get_list(Some(T::element_size()))?,
            marker: marker::PhantomData,
        })
    }
}

impl<T: PrimitiveElement> IndexMove<u32, T> for Reader<'_, T> {
    fn index_move(&self, index: u32) -> T {
        self.get(index)
    }
}

impl<'a, T: PrimitiveElement> IntoIterator for Reader<'a, T> {
    type Item = T;
    type IntoIter = ListIter<Reader<'a, T>, Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PrimitiveElement> PartialEq for Reader<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.reader == other.reader
    }
}
