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

//! List of enums, stored as 16-bit values. Unknown values surface as
//! [`NotInSchema`] so messages from a newer schema stay readable.

use core::marker;

use crate::pointer::ElementSize;
use crate::reader::{ListReader, PointerReader};
use crate::traits::{FromPointerReader, IndexMove, ListIter};
use crate::{NotInSchema, Result};

pub struct Reader<'a, T>
where
    T: TryFrom<u16, Error = NotInSchema>,
{
    marker: marker::PhantomData<T>,
    reader: ListReader<'a>,
}

impl<T: TryFrom<u16, Error = NotInSchema>> Copy for Reader<'_, T> {}

impl<T: TryFrom<u16, Error = NotInSchema>> Clone for Reader<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: TryFrom<u16, Error = NotInSchema>> Reader<'a, T> {
    pub fn len(&self) -> u32 {
        self.reader.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(self) -> ListIter<Reader<'a, T>, ::core::result::Result<T, NotInSchema>> {
        let l = self.len();
        ListIter::new(self, l)
    }

    /// Gets the value at position `index`. Panics if `index` is greater
    /// than or equal to `len()`.
    pub fn get(&self, index: u32) -> ::core::result::Result<T, NotInSchema> {
        assert!(index < self.len());
        T::try_from(self.reader.read_primitive::<u16>(index))
    }

    pub fn try_get(&self, index: u32) -> Option<::core::result::Result<T, NotInSchema>> {
        if index < self.len() {
            Some(T::try_from(self.reader.read_primitive::<u16>(index)))
        } else {
            None
        }
    }

    /// Gets the value at a position that may count from the end.
    pub fn at(&self, index: i64) -> Result<T> {
        let index = self.reader.at_index(index)?;
        Ok(T::try_from(self.reader.read_primitive::<u16>(index))?)
    }
}

impl<'a, T: TryFrom<u16, Error = NotInSchema>> FromPointerReader<'a> for Reader<'a, T> {
    fn get_from_pointer(reader: &PointerReader<'a>) -> Result<Reader<'a, T>> {
        Ok(Reader {
            reader: reader.get_list(Some(ElementSize::TwoBytes))?,
            marker: marker::PhantomData,
        })
    }
}

impl<T: TryFrom<u16, Error = NotInSchema>> IndexMove<u32, ::core::result::Result<T, NotInSchema>>
    for Reader<'_, T>
{
    fn index_move(&self, index: u32) -> ::core::result::Result<T, NotInSchema> {
        self.get(index)
    }
}

impl<T: TryFrom<u16, Error = NotInSchema>> PartialEq for Reader<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.reader == other.reader
    }
}
