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

//! Untyped root container for a message being read.
//!
//! A message is an ordered sequence of word-aligned segments; the root
//! pointer lives in the first word of segment 0. Anything that can hand out
//! segment slices ([`ReaderSegments`]) can back a [`Reader`].

use smallvec::SmallVec;

use crate::reader::PointerReader;
use crate::traits::FromPointerReader;
use crate::Result;

/// Options controlling how data is read.
#[derive(Clone, Copy, Debug)]
pub struct ReaderOptions {
    /// Limits how deeply nested a message structure can be, e.g. structs
    /// containing other structs or lists of structs.
    ///
    /// This limit exists for security reasons. Since it is common to use
    /// recursive code to traverse recursive data structures, an attacker
    /// could easily cause a stack overflow with a deeply-nested (or even
    /// cyclic) message that is small on the wire. The default of 64 is low
    /// enough to prevent any chance of stack overflow, yet high enough that
    /// it is never a problem in practice.
    pub nesting_limit: i32,
}

pub const DEFAULT_READER_OPTIONS: ReaderOptions = ReaderOptions { nesting_limit: 64 };

impl Default for ReaderOptions {
    fn default() -> Self {
        DEFAULT_READER_OPTIONS
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        DEFAULT_READER_OPTIONS
    }

    pub fn nesting_limit(&mut self, value: i32) -> &mut Self {
        self.nesting_limit = value;
        self
    }
}

/// Access to the segments backing a message being read.
///
/// A reader works against anything that can produce segment slices by
/// index and say how many there are: a borrowed slice of slices, the
/// owned buffer behind [`crate::serialize::OwnedSegments`], or a
/// [`crate::builder::Builder`] whose output is being re-read. Returned
/// slices must stay valid for as long as the implementation is borrowed.
pub trait ReaderSegments {
    /// The segment with index `idx`, or `None` when `idx` is out of range.
    fn get_segment(&self, idx: u32) -> Option<&[u8]>;

    /// The number of segments in the message.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: ReaderSegments + ?Sized> ReaderSegments for &S {
    fn get_segment(&self, idx: u32) -> Option<&[u8]> {
        S::get_segment(*self, idx)
    }

    fn len(&self) -> usize {
        S::len(*self)
    }
}

/// A borrowed slice of segments is itself a readable message.
impl<'b> ReaderSegments for [&'b [u8]] {
    fn get_segment(&self, idx: u32) -> Option<&[u8]> {
        self.get(idx as usize).copied()
    }

    fn len(&self) -> usize {
        <[&'b [u8]]>::len(self)
    }
}

/// A container used to read a message.
#[derive(Debug)]
pub struct Reader<S>
where
    S: ReaderSegments,
{
    segments: S,
    nesting_limit: i32,
}

impl<S> Reader<S>
where
    S: ReaderSegments,
{
    pub fn new(segments: S, options: ReaderOptions) -> Self {
        Self {
            segments,
            nesting_limit: options.nesting_limit,
        }
    }

    /// The pointer in the first word of segment 0.
    pub fn root(&self) -> Result<PointerReader<'_>> {
        PointerReader::get_root(&self.segments, 0, 0, self.nesting_limit)
    }

    /// Gets the root of the message, interpreting it as the given type.
    pub fn get_root<'a, T: FromPointerReader<'a>>(&'a self) -> Result<T> {
        T::get_from_pointer(&self.root()?)
    }

    pub fn into_segments(self) -> S {
        self.segments
    }
}

/// The trimmed segment slices of a finished message, in index order.
///
/// Single-segment messages are by far the most common, so the backing
/// storage is inline for that case.
pub struct OutputSegments<'a> {
    segments: SmallVec<[&'a [u8]; 1]>,
}

impl<'a> OutputSegments<'a> {
    pub(crate) fn new(segments: SmallVec<[&'a [u8]; 1]>) -> Self {
        Self { segments }
    }
}

impl<'a> ::core::ops::Deref for OutputSegments<'a> {
    type Target = [&'a [u8]];

    fn deref(&self) -> &[&'a [u8]] {
        &self.segments
    }
}

impl ReaderSegments for OutputSegments<'_> {
    fn get_segment(&self, id: u32) -> Option<&[u8]> {
        self.segments.get(id as usize).copied()
    }

    fn len(&self) -> usize {
        self.segments.len()
    }
}
