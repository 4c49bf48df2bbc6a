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

//! The compiled-schema object model.
//!
//! A `CodeGeneratorRequest` produced by the external schema front-end is
//! itself a Cap'n Proto message; [`Schema::parse`] bootstraps it through
//! the caravel reader into an owned, immutable node graph. Nodes are keyed
//! by their 64-bit id and refer to each other by id only; a separate
//! scope-to-children index reconstructs nesting.
//!
//! The layout constants hard-wired below are the `schema.capnp` wire
//! shapes of `Node`, `Field`, `Type`, `Value`, and friends: the one place
//! where this crate knows the schema of schemas.

use std::collections::HashMap;

use crate::message::{Reader, ReaderSegments};
use crate::pointer::ElementSize;
use crate::reader::{ListReader, PointerReader, StructReader};
use crate::{Error, ErrorKind, Result};

/// `discriminantValue` of a field outside any union.
pub const NO_DISCRIMINANT: u16 = 0xffff;

/// An immutable table of schema nodes plus the request's file list.
#[derive(Debug)]
pub struct Schema {
    pub(crate) nodes: HashMap<u64, Node>,
    pub(crate) children: HashMap<u64, Vec<u64>>,
    pub(crate) requested_files: Vec<RequestedFile>,
}

#[derive(Debug)]
pub struct RequestedFile {
    pub id: u64,
    pub filename: String,
}

#[derive(Debug)]
pub struct Node {
    pub id: u64,
    pub display_name: String,
    pub display_name_prefix_length: u32,
    pub scope_id: u64,
    pub nested: Vec<NestedNode>,
    pub kind: NodeKind,
}

impl Node {
    /// The node's name without its file prefix, e.g. `Outer.Inner`.
    pub fn local_name(&self) -> &str {
        let prefix = self.display_name_prefix_length as usize;
        self.display_name.get(prefix..).unwrap_or(&self.display_name)
    }
}

#[derive(Debug)]
pub struct NestedNode {
    pub name: String,
    pub id: u64,
}

#[derive(Debug)]
pub enum NodeKind {
    File,
    Struct(StructNode),
    Enum(EnumNode),
    Interface,
    Const(ConstNode),
    Annotation,
}

#[derive(Debug)]
pub struct StructNode {
    pub data_words: u16,
    pub ptr_words: u16,
    pub is_group: bool,
    pub discriminant_count: u16,
    /// Offset of the 16-bit union tag, in 16-bit units.
    pub discriminant_offset: u32,
    pub fields: Vec<Field>,
}

impl StructNode {
    pub fn union_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .filter(|f| f.discriminant_value != NO_DISCRIMINANT)
    }
}

#[derive(Debug)]
pub struct EnumNode {
    pub enumerants: Vec<String>,
}

#[derive(Debug)]
pub struct ConstNode {
    pub ty: Type,
    pub value: Value,
}

#[derive(Debug)]
pub struct Field {
    pub name: String,
    pub code_order: u16,
    pub discriminant_value: u16,
    pub kind: FieldKind,
}

#[derive(Debug)]
pub enum FieldKind {
    Slot {
        /// In units of the field's own size: bits for `Bool`, multiples of
        /// the scalar width for numbers, pointer indices for pointer types.
        offset: u32,
        ty: Type,
        default: Value,
        had_explicit_default: bool,
    },
    Group {
        type_id: u64,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Void,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Text,
    Data,
    List(Box<Type>),
    Enum(u64),
    Struct(u64),
    Interface(u64),
    AnyPointer,
}

impl Type {
    /// How a list of this type stores its elements.
    pub fn element_size(&self) -> ElementSize {
        match self {
            Type::Void => ElementSize::Void,
            Type::Bool => ElementSize::Bit,
            Type::Int8 | Type::Uint8 => ElementSize::Byte,
            Type::Int16 | Type::Uint16 | Type::Enum(_) => ElementSize::TwoBytes,
            Type::Int32 | Type::Uint32 | Type::Float32 => ElementSize::FourBytes,
            Type::Int64 | Type::Uint64 | Type::Float64 => ElementSize::EightBytes,
            Type::Struct(_) => ElementSize::InlineComposite,
            Type::Text | Type::Data | Type::List(_) | Type::Interface(_) | Type::AnyPointer => {
                ElementSize::Pointer
            }
        }
    }

    /// Whether the field lives in the pointer section.
    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            Type::Text
                | Type::Data
                | Type::List(_)
                | Type::Struct(_)
                | Type::Interface(_)
                | Type::AnyPointer
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Void,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Data(Vec<u8>),
    List,
    Enum(u16),
    Struct,
    Interface,
    AnyPointer,
}

fn schema_error<S: Into<String>>(extra: S) -> Error {
    Error::from_kind_context(ErrorKind::SchemaError, extra)
}

impl Schema {
    /// Bootstraps the node graph out of a `CodeGeneratorRequest` message.
    pub fn parse<S: ReaderSegments>(message: &Reader<S>) -> Result<Schema> {
        let root: StructReader<'_> = message.get_root()?;
        // CodeGeneratorRequest: nodes @0, requestedFiles @1.
        let mut nodes = Vec::new();
        let node_list = composite_list(root.get_pointer_field(0))?;
        for index in 0..node_list.len() {
            nodes.push(parse_node(node_list.get_struct_element(index))?);
        }

        let mut requested_files = Vec::new();
        let file_list = composite_list(root.get_pointer_field(1))?;
        for index in 0..file_list.len() {
            // RequestedFile: id @0 (word 0), filename @1 (ptr 0).
            let view = file_list.get_struct_element(index);
            requested_files.push(RequestedFile {
                id: view.get_data_field::<u64>(0),
                filename: view.get_pointer_field(0).get_text()?.to_string(),
            });
        }

        Self::from_parts(nodes, requested_files)
    }

    /// Assembles a schema from already-parsed nodes, building the
    /// scope-to-children index and checking that every scope id resolves.
    pub fn from_parts(nodes: Vec<Node>, requested_files: Vec<RequestedFile>) -> Result<Schema> {
        let ids: Vec<(u64, u64)> = nodes.iter().map(|n| (n.id, n.scope_id)).collect();
        let nodes: HashMap<u64, Node> = nodes.into_iter().map(|n| (n.id, n)).collect();
        let mut children: HashMap<u64, Vec<u64>> = HashMap::new();
        for (id, scope_id) in ids {
            if scope_id != 0 {
                if !nodes.contains_key(&scope_id) {
                    return Err(schema_error(format!(
                        "node {id:#x} has unresolved scope id {scope_id:#x}"
                    )));
                }
                children.entry(scope_id).or_default().push(id);
            }
        }
        Ok(Schema {
            nodes,
            children,
            requested_files,
        })
    }

    pub fn node(&self, id: u64) -> Result<&Node> {
        self.nodes
            .get(&id)
            .ok_or_else(|| schema_error(format!("missing node {id:#x}")))
    }

    pub fn struct_node(&self, id: u64) -> Result<&StructNode> {
        match &self.node(id)?.kind {
            NodeKind::Struct(s) => Ok(s),
            _ => Err(schema_error(format!("node {id:#x} is not a struct"))),
        }
    }

    pub fn enum_node(&self, id: u64) -> Result<&EnumNode> {
        match &self.node(id)?.kind {
            NodeKind::Enum(e) => Ok(e),
            _ => Err(schema_error(format!("node {id:#x} is not an enum"))),
        }
    }

    /// Ids directly scoped under `scope_id`, in node-table order.
    pub fn children_of(&self, scope_id: u64) -> &[u64] {
        self.children.get(&scope_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn requested_files(&self) -> &[RequestedFile] {
        &self.requested_files
    }

    /// Finds a node by the name a user would type: the display name with
    /// its file prefix stripped, so nested structs read `Outer.Inner`.
    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.values().find(|node| node.local_name() == name)
    }
}

fn composite_list(pointer: PointerReader<'_>) -> Result<ListReader<'_>> {
    pointer.get_list(Some(ElementSize::InlineComposite))
}

fn parse_node(view: StructReader<'_>) -> Result<Node> {
    // Node: id @0 (word 0), displayName @1 (ptr 0),
    // displayNamePrefixLength @2 (u32 index 2), union tag (u16 index 6),
    // scopeId @3 (word 2), nestedNodes @4 (ptr 1).
    let id = view.get_data_field::<u64>(0);
    let tag = view.get_data_field::<u16>(6);
    let kind = match tag {
        0 => NodeKind::File,
        1 => NodeKind::Struct(parse_struct_node(view)?),
        2 => {
            // enumerants @14 (ptr 3); Enumerant: name @0 (ptr 0).
            let list = composite_list(view.get_pointer_field(3))?;
            let mut enumerants = Vec::with_capacity(list.len() as usize);
            for index in 0..list.len() {
                enumerants.push(
                    list.get_struct_element(index)
                        .get_pointer_field(0)
                        .get_text()?
                        .to_string(),
                );
            }
            NodeKind::Enum(EnumNode { enumerants })
        }
        3 => NodeKind::Interface,
        4 => NodeKind::Const(ConstNode {
            // const: type @16 (ptr 3), value @17 (ptr 4).
            ty: parse_type(view.get_pointer_field(3).get_struct()?)?,
            value: parse_value(view.get_pointer_field(4).get_struct()?)?,
        }),
        5 => NodeKind::Annotation,
        other => return Err(schema_error(format!("unknown node kind {other}"))),
    };

    let nested_list = composite_list(view.get_pointer_field(1))?;
    let mut nested = Vec::with_capacity(nested_list.len() as usize);
    for index in 0..nested_list.len() {
        // NestedNode: name @0 (ptr 0), id @1 (word 0).
        let entry = nested_list.get_struct_element(index);
        nested.push(NestedNode {
            name: entry.get_pointer_field(0).get_text()?.to_string(),
            id: entry.get_data_field::<u64>(0),
        });
    }

    Ok(Node {
        id,
        display_name: view.get_pointer_field(0).get_text()?.to_string(),
        display_name_prefix_length: view.get_data_field::<u32>(2),
        scope_id: view.get_data_field::<u64>(2),
        nested,
        kind,
    })
}

fn parse_struct_node(view: StructReader<'_>) -> Result<StructNode> {
    // struct group: dataWordCount @7 (u16 index 7), pointerCount @8
    // (u16 index 12), isGroup @10 (bit 224), discriminantCount @11
    // (u16 index 15), discriminantOffset @12 (u32 index 8), fields @13
    // (ptr 3).
    let field_list = composite_list(view.get_pointer_field(3))?;
    let mut fields = Vec::with_capacity(field_list.len() as usize);
    for index in 0..field_list.len() {
        fields.push(parse_field(field_list.get_struct_element(index))?);
    }
    Ok(StructNode {
        data_words: view.get_data_field::<u16>(7),
        ptr_words: view.get_data_field::<u16>(12),
        is_group: view.get_bool_field(224),
        discriminant_count: view.get_data_field::<u16>(15),
        discriminant_offset: view.get_data_field::<u32>(8),
        fields,
    })
}

fn parse_field(view: StructReader<'_>) -> Result<Field> {
    // Field: name @0 (ptr 0), codeOrder @1 (u16 index 0),
    // discriminantValue @3 (u16 index 1, default NO_DISCRIMINANT),
    // union tag (u16 index 4).
    let kind = match view.get_data_field::<u16>(4) {
        0 => FieldKind::Slot {
            // slot: offset @4 (u32 index 1), type @5 (ptr 2),
            // defaultValue @6 (ptr 3), hadExplicitDefault @7 (bit 128).
            offset: view.get_data_field::<u32>(1),
            ty: parse_type(view.get_pointer_field(2).get_struct()?)?,
            default: parse_value(view.get_pointer_field(3).get_struct()?)?,
            had_explicit_default: view.get_bool_field(128),
        },
        1 => FieldKind::Group {
            // group: typeId @8 (word 2).
            type_id: view.get_data_field::<u64>(2),
        },
        other => return Err(schema_error(format!("unknown field kind {other}"))),
    };
    Ok(Field {
        name: view.get_pointer_field(0).get_text()?.to_string(),
        code_order: view.get_data_field::<u16>(0),
        discriminant_value: view.get_data_field_mask::<u16>(1, NO_DISCRIMINANT),
        kind,
    })
}

fn parse_type(view: StructReader<'_>) -> Result<Type> {
    // Type: union tag (u16 index 0); list.elementType @14 (ptr 0);
    // enum/struct/interface typeId (word 1).
    Ok(match view.get_data_field::<u16>(0) {
        0 => Type::Void,
        1 => Type::Bool,
        2 => Type::Int8,
        3 => Type::Int16,
        4 => Type::Int32,
        5 => Type::Int64,
        6 => Type::Uint8,
        7 => Type::Uint16,
        8 => Type::Uint32,
        9 => Type::Uint64,
        10 => Type::Float32,
        11 => Type::Float64,
        12 => Type::Text,
        13 => Type::Data,
        14 => Type::List(Box::new(parse_type(
            view.get_pointer_field(0).get_struct()?,
        )?)),
        15 => Type::Enum(view.get_data_field::<u64>(1)),
        16 => Type::Struct(view.get_data_field::<u64>(1)),
        17 => Type::Interface(view.get_data_field::<u64>(1)),
        18 => Type::AnyPointer,
        other => return Err(schema_error(format!("unknown type tag {other}"))),
    })
}

fn parse_value(view: StructReader<'_>) -> Result<Value> {
    // Value: union tag (u16 index 0); scalars start at byte 2, widening
    // to their natural alignment; pointer payloads at ptr 0.
    Ok(match view.get_data_field::<u16>(0) {
        0 => Value::Void,
        1 => Value::Bool(view.get_bool_field(16)),
        2 => Value::Int8(view.get_data_field::<i8>(2)),
        3 => Value::Int16(view.get_data_field::<i16>(1)),
        4 => Value::Int32(view.get_data_field::<i32>(1)),
        5 => Value::Int64(view.get_data_field::<i64>(1)),
        6 => Value::Uint8(view.get_data_field::<u8>(2)),
        7 => Value::Uint16(view.get_data_field::<u16>(1)),
        8 => Value::Uint32(view.get_data_field::<u32>(1)),
        9 => Value::Uint64(view.get_data_field::<u64>(1)),
        10 => Value::Float32(view.get_data_field::<f32>(1)),
        11 => Value::Float64(view.get_data_field::<f64>(1)),
        12 => Value::Text(view.get_pointer_field(0).get_text()?.to_string()),
        13 => Value::Data(view.get_pointer_field(0).get_data()?.to_vec()),
        14 => Value::List,
        15 => Value::Enum(view.get_data_field::<u16>(1)),
        16 => Value::Struct,
        17 => Value::Interface,
        18 => Value::AnyPointer,
        other => return Err(schema_error(format!("unknown value tag {other}"))),
    })
}
