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

//! List of structs, stored inline behind a tag word.

use core::marker;

use crate::Result;
use crate::pointer::ElementSize;
use crate::reader::{ListReader, PointerReader};
use crate::traits::{FromPointerReader, FromStructReader, IndexMove, ListIter};

pub struct Reader<'a, T>
where
    T: FromStructReader<'a>,
{
    marker: marker::PhantomData<&'a T>,
    reader: ListReader<'a>,
}

impl<'a, T: FromStructReader<'a>> Copy for Reader<'a, T> {}

impl<'a, T: FromStructReader<'a>> Clone for Reader<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: FromStructReader<'a>> Reader<'a, T> {
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

    /// Gets the element at position `index`. Panics if `index` is greater
    /// than or equal to `len()`.
    pub fn get(&self, index: u32) -> T {
        assert!(index < self.len());
        T::new(self.reader.get_struct_element(index))
    }

    pub fn try_get(&self, index: u32) -> Option<T> {
        if index < self.len() {
            Some(T::new(self.reader.get_struct_element(index)))
        } else {
            None
        }
    }

    /// Gets the element at a position that may count from the end.
    pub fn at(&self, index: i64) -> Result<T> {
        Ok(T::new(
            self.reader.get_struct_element(self.reader.at_index(index)?),
        ))
    }
}

impl<'a, T: FromStructReader<'a>> FromPointerReader<'a> for Reader<'a, T> {
    fn get_from_pointer(reader: &PointerReader<'a>) -> Result<Reader<'a, T>> {
        Ok(Reader {
            reader: reader.get_list(Some(ElementSize::InlineComposite))?,
            marker: marker::PhantomData,
        })
    }
}

impl<'a, T: FromStructReader<'a>> IndexMove<u32, T> for Reader<'a, T> {
    fn index_move(&self, index: u32) -> T {
        self.get(index)
    }
}

impl<'a, T: FromStructReader<'a>> IntoIterator for Reader<'a, T> {
    type Item = T;
    type IntoIter = ListIter<Reader<'a, T>, Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T: FromStructReader<'a>> PartialEq for Reader<'a, T> {
    fn eq(&self, other: &Self) -> bool {
        self.reader == other.reader
    }
}
