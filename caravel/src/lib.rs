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

//! # caravel
//!
//! Runtime library for the Cap'n Proto binary serialisation format: the
//! zero-copy reader, the segment-allocating message builder, stream framing,
//! and the compiled-schema object model that drives `caravel-gen`.
//!
//! Messages are read through views ([`reader::StructReader`],
//! [`reader::ListReader`]) that borrow the underlying segments and never
//! copy. Messages are built through [`builder::Builder`], which hands out
//! word-aligned [`builder::Address`] handles that generated code fills in.

pub mod buffer;
pub mod builder;
pub mod dynamic;
pub mod enum_list;
pub mod message;
pub mod pointer;
pub mod primitive_list;
pub mod reader;
pub mod schema;
pub mod serialize;
pub mod struct_list;
pub mod text_list;
pub mod traits;

/// Size of a Cap'n Proto word. Pointers, struct sections, and segments are
/// all measured in these.
pub const BYTES_PER_WORD: usize = 8;

/// Things that can go wrong while reading or building a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A pointer word whose kind, offset, size tag, or landing pad is out
    /// of range for the message that contains it.
    MalformedPointer,

    /// A read or write past the end of a segment. Also reported when a
    /// framed message is truncated mid-stream.
    OutOfBounds,

    /// A value of one wire type found where another was required, e.g. a
    /// list pointer in a struct slot, or a composite list handed to the
    /// scalar list allocator.
    TypeMismatch,

    /// A union initialiser received no arm, or more than one.
    UnionArmConflict,

    /// A schema inconsistency: missing node, unresolved scope id, or an
    /// unknown field kind.
    SchemaError,

    /// Clean end of stream between framed messages. Callers iterating a
    /// stream treat this as termination, not failure.
    EndOfStream,

    /// A list index outside `-len..len`.
    IndexOutOfRange,

    /// Anything else.
    Failed,
}

impl ErrorKind {
    fn label(self) -> &'static str {
        match self {
            Self::MalformedPointer => "malformed pointer",
            Self::OutOfBounds => "out of bounds",
            Self::TypeMismatch => "type mismatch",
            Self::UnionArmConflict => "union arm conflict",
            Self::SchemaError => "schema error",
            Self::EndOfStream => "end of stream",
            Self::IndexOutOfRange => "index out of range",
            Self::Failed => "failed",
        }
    }
}

/// An error with a kind and optional context.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub extra: String,
}

impl Error {
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            extra: String::new(),
        }
    }

    pub fn from_kind_context<S: Into<String>>(kind: ErrorKind, extra: S) -> Self {
        Self {
            kind,
            extra: extra.into(),
        }
    }

    pub fn failed<S: Into<String>>(extra: S) -> Self {
        Self::from_kind_context(ErrorKind::Failed, extra)
    }
}

impl ::core::fmt::Display for Error {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        if self.extra.is_empty() {
            write!(f, "{}", self.kind.label())
        } else {
            write!(f, "{}: {}", self.kind.label(), self.extra)
        }
    }
}

impl ::std::error::Error for Error {}

impl From<::std::io::Error> for Error {
    fn from(err: ::std::io::Error) -> Self {
        let kind = match err.kind() {
            // read_exact() reports truncation this way; a partial message is
            // an OutOfBounds condition, distinct from clean EndOfStream.
            ::std::io::ErrorKind::UnexpectedEof => ErrorKind::OutOfBounds,
            _ => ErrorKind::Failed,
        };
        Self::from_kind_context(kind, format!("{err}"))
    }
}

/// A numeric value found on the wire that the schema's enum does not define.
///
/// Generated `TryFrom<u16>` impls for schema enums use this as their error
/// type; the raw value is preserved so callers can handle messages written
/// by a newer schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotInSchema(pub u16);

impl ::core::fmt::Display for NotInSchema {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "enum value or union discriminant {} not in schema", self.0)
    }
}

impl ::std::error::Error for NotInSchema {}

impl From<NotInSchema> for Error {
    fn from(e: NotInSchema) -> Self {
        Self::from_kind_context(ErrorKind::SchemaError, format!("{e}"))
    }
}

pub type Result<T> = ::core::result::Result<T, Error>;
