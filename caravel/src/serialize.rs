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

//! Stream framing: the segment table and message bytes.
//!
//! A framed message is a little-endian `u32` holding `segment_count - 1`,
//! one little-endian `u32` word-length per segment, zero padding to 8-byte
//! alignment, then each segment's bytes in order.

use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian};

use crate::builder::{Allocator, Builder};
use crate::message::{Reader, ReaderOptions, ReaderSegments};
use crate::{BYTES_PER_WORD, Error, ErrorKind, Result};

/// Refuse headers claiming more segments than any sane message carries.
const SEGMENT_COUNT_LIMIT: u32 = 512;

/// Given the number of segments of a message, returns the length of the
/// segment table in bytes, padding included.
fn segment_table_length(segment_count: usize) -> usize {
    segment_count * 4 + if segment_count % 2 == 0 { 8 } else { 4 }
}

/// Frames and writes a finished message.
pub fn write_message<W, A>(write: &mut W, message: &Builder<A>) -> Result<()>
where
    W: Write,
    A: Allocator,
{
    let segments = message.segments_for_output();
    write_message_segments(write, &segments)
}

/// Frames and writes raw segment slices.
pub fn write_message_segments<W: Write>(write: &mut W, segments: &[&[u8]]) -> Result<()> {
    if segments.is_empty() {
        // An untouched builder still frames as one empty segment.
        write.write_all(&[0u8; 8])?;
        return Ok(());
    }
    let mut table = vec![0u8; segment_table_length(segments.len())];
    LittleEndian::write_u32(&mut table[0..4], segments.len() as u32 - 1);
    for (index, segment) in segments.iter().enumerate() {
        LittleEndian::write_u32(
            &mut table[4 + index * 4..8 + index * 4],
            (segment.len() / BYTES_PER_WORD) as u32,
        );
    }
    write.write_all(&table)?;
    for segment in segments {
        write.write_all(segment)?;
    }
    Ok(())
}

/// The owned backing store of a message read from a stream.
#[derive(Debug)]
pub struct OwnedSegments {
    segment_ranges: Vec<::core::ops::Range<usize>>,
    owned_space: Vec<u8>,
}

impl ReaderSegments for OwnedSegments {
    fn get_segment(&self, id: u32) -> Option<&[u8]> {
        self.segment_ranges
            .get(id as usize)
            .map(|range| &self.owned_space[range.clone()])
    }

    fn len(&self) -> usize {
        self.segment_ranges.len()
    }
}

/// Reads the next framed message. Clean end of stream (no bytes where a
/// header should start) is [`ErrorKind::EndOfStream`]; running dry
/// anywhere after that is truncation, [`ErrorKind::OutOfBounds`].
pub fn read_message<R: Read>(read: &mut R, options: ReaderOptions) -> Result<Reader<OwnedSegments>> {
    let mut first = [0u8; 4];
    read_header_word(read, &mut first)?;
    let segment_count = LittleEndian::read_u32(&first).wrapping_add(1);
    if segment_count == 0 || segment_count >= SEGMENT_COUNT_LIMIT {
        return Err(Error::from_kind_context(
            ErrorKind::MalformedPointer,
            format!("segment table claims {segment_count} segments"),
        ));
    }

    let mut rest = vec![0u8; segment_table_length(segment_count as usize) - 4];
    read.read_exact(&mut rest)?;
    let mut segment_ranges = Vec::with_capacity(segment_count as usize);
    let mut offset = 0usize;
    for index in 0..segment_count as usize {
        let words = LittleEndian::read_u32(&rest[index * 4..index * 4 + 4]) as usize;
        segment_ranges.push(offset..offset + words * BYTES_PER_WORD);
        offset += words * BYTES_PER_WORD;
    }

    let mut owned_space = vec![0u8; offset];
    read.read_exact(&mut owned_space)?;
    Ok(Reader::new(
        OwnedSegments {
            segment_ranges,
            owned_space,
        },
        options,
    ))
}

/// Like [`read_message`], mapping clean end of stream to `Ok(None)`.
pub fn try_read_message<R: Read>(
    read: &mut R,
    options: ReaderOptions,
) -> Result<Option<Reader<OwnedSegments>>> {
    match read_message(read, options) {
        Ok(message) => Ok(Some(message)),
        Err(e) if e.kind == ErrorKind::EndOfStream => Ok(None),
        Err(e) => Err(e),
    }
}

/// Reads the first header word, separating "nothing more to read" from a
/// header cut off mid-word.
fn read_header_word<R: Read>(read: &mut R, buf: &mut [u8; 4]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match read.read(&mut buf[filled..])? {
            0 if filled == 0 => return Err(Error::from_kind(ErrorKind::EndOfStream)),
            0 => {
                return Err(Error::from_kind_context(
                    ErrorKind::OutOfBounds,
                    "message truncated inside the segment table",
                ));
            }
            n => filled += n,
        }
    }
    Ok(())
}
