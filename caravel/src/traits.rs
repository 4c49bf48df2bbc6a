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

//! The seams between the runtime and generated code.

use crate::Result;
use crate::reader::{PointerReader, StructReader};

/// Types constructible from a pointer slot: generated struct readers, the
/// typed list readers, and the raw views themselves.
pub trait FromPointerReader<'a>: Sized {
    fn get_from_pointer(reader: &PointerReader<'a>) -> Result<Self>;
}

/// Types that wrap a struct view: generated struct readers and group
/// readers.
pub trait FromStructReader<'a> {
    fn new(reader: StructReader<'a>) -> Self;
}

/// The inverse seam: generated readers expose their raw struct view so the
/// builder can deep-copy them into another message.
pub trait IntoInternalStructReader<'a> {
    fn into_internal_struct_reader(self) -> StructReader<'a>;
}

impl<'a> FromPointerReader<'a> for StructReader<'a> {
    fn get_from_pointer(reader: &PointerReader<'a>) -> Result<Self> {
        reader.get_struct()
    }
}

impl<'a> FromStructReader<'a> for StructReader<'a> {
    fn new(reader: StructReader<'a>) -> Self {
        reader
    }
}

impl<'a> IntoInternalStructReader<'a> for StructReader<'a> {
    fn into_internal_struct_reader(self) -> StructReader<'a> {
        self
    }
}

/// An index-addressable container whose elements move out by value.
pub trait IndexMove<I, T> {
    fn index_move(&self, index: I) -> T;
}

/// Iterator over any `IndexMove` list.
pub struct ListIter<L, T>
where
    L: IndexMove<u32, T>,
{
    list: L,
    index: u32,
    size: u32,
    marker: ::core::marker::PhantomData<T>,
}

impl<L, T> ListIter<L, T>
where
    L: IndexMove<u32, T>,
{
    pub fn new(list: L, size: u32) -> Self {
        Self {
            list,
            index: 0,
            size,
            marker: ::core::marker::PhantomData,
        }
    }
}

impl<L, T> Iterator for ListIter<L, T>
where
    L: IndexMove<u32, T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.index < self.size {
            let result = self.list.index_move(self.index);
            self.index += 1;
            Some(result)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.size - self.index) as usize;
        (remaining, Some(remaining))
    }
}

impl<L, T> ExactSizeIterator for ListIter<L, T> where L: IndexMove<u32, T> {}
