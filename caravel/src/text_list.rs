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

//! List of strings: a pointer list whose targets are NUL-terminated byte
//! lists.

use crate::Result;
use crate::pointer::ElementSize;
use crate::reader::{ListReader, PointerReader};
use crate::traits::{FromPointerReader, IndexMove, ListIter};

#[derive(Clone, Copy)]
pub struct Reader<'a> {
    reader: ListReader<'a>,
}

impl<'a> Reader<'a> {
    pub fn len(&self) -> u32 {
        self.reader.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(self) -> ListIter<Reader<'a>, Result<&'a str>> {
        let l = self.len();
        ListIter::new(self, l)
    }

    /// Gets the string at position `index`. Panics if `index` is greater
    /// than or equal to `len()`. A null element reads as `""`.
    pub fn get(&self, index: u32) -> Result<&'a str> {
        assert!(index < self.len());
        self.reader.get_pointer_element(index).get_text()
    }

    pub fn try_get(&self, index: u32) -> Option<Result<&'a str>> {
        if index < self.len() {
            Some(self.reader.get_pointer_element(index).get_text())
        } else {
            None
        }
    }

    /// Gets the string at a position that may count from the end.
    pub fn at(&self, index: i64) -> Result<&'a str> {
        self.reader
            .get_pointer_element(self.reader.at_index(index)?)
            .get_text()
    }
}

impl<'a> FromPointerReader<'a> for Reader<'a> {
    fn get_from_pointer(reader: &PointerReader<'a>) -> Result<Reader<'a>> {
        Ok(Reader {
            reader: reader.get_list(Some(ElementSize::Pointer))?,
        })
    }
}

impl<'a> IndexMove<u32, Result<&'a str>> for Reader<'a> {
    fn index_move(&self, index: u32) -> Result<&'a str> {
        self.get(index)
    }
}

impl PartialEq for Reader<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.reader == other.reader
    }
}
