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

//! Schema-driven field access, no generated code required.
//!
//! The `decode` command reads messages whose accessor classes were never
//! compiled into the binary; this module walks a [`Schema`] and a raw
//! [`StructReader`] together instead, applying the same default and union
//! semantics the generated accessors would, and renders the one-line
//! `short_repr` form.

use core::fmt::Write as _;

use crate::reader::StructReader;
use crate::schema::{Field, FieldKind, NO_DISCRIMINANT, Schema, StructNode, Type, Value};
use crate::{Error, ErrorKind, NotInSchema, Result};

/// A struct view coupled with its schema node.
#[derive(Clone, Copy)]
pub struct DynamicStruct<'a> {
    schema: &'a Schema,
    node: &'a StructNode,
    reader: StructReader<'a>,
}

/// A list view coupled with its element type.
#[derive(Clone, Copy)]
pub struct DynamicList<'a> {
    schema: &'a Schema,
    element: &'a Type,
    list: crate::reader::ListReader<'a>,
}

pub enum DynamicValue<'a> {
    Void,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float32(f32),
    Float64(f64),
    Enum { value: u16, name: Option<&'a str> },
    Text(&'a str),
    Data(&'a [u8]),
    Struct(DynamicStruct<'a>),
    List(DynamicList<'a>),
}

fn type_error<S: Into<String>>(extra: S) -> Error {
    Error::from_kind_context(ErrorKind::TypeMismatch, extra)
}

/// The default of a signed integer field, as the widest type; narrower
/// fields truncate back down at the use site.
fn int_mask(default: &Value) -> i64 {
    match default {
        Value::Int8(v) => *v as i64,
        Value::Int16(v) => *v as i64,
        Value::Int32(v) => *v as i64,
        Value::Int64(v) => *v,
        _ => 0,
    }
}

fn uint_mask(default: &Value) -> u64 {
    match default {
        Value::Uint8(v) => *v as u64,
        Value::Uint16(v) => *v as u64,
        Value::Uint32(v) => *v as u64,
        Value::Uint64(v) => *v,
        _ => 0,
    }
}

impl<'a> DynamicStruct<'a> {
    pub fn new(schema: &'a Schema, node_id: u64, reader: StructReader<'a>) -> Result<Self> {
        Ok(Self {
            schema,
            node: schema.struct_node(node_id)?,
            reader,
        })
    }

    pub fn fields(&self) -> &'a [Field] {
        &self.node.fields
    }

    /// The active union arm, or `None` for a struct without a union.
    pub fn which(&self) -> Result<Option<&'a Field>> {
        if self.node.discriminant_count == 0 {
            return Ok(None);
        }
        let tag = self
            .reader
            .get_data_field::<u16>(self.node.discriminant_offset as usize);
        match self
            .node
            .union_fields()
            .find(|f| f.discriminant_value == tag)
        {
            Some(field) => Ok(Some(field)),
            None => Err(NotInSchema(tag).into()),
        }
    }

    /// Reads one field. An inactive union arm reads as its default, the
    /// same answer the generated accessors give.
    pub fn get(&self, field: &'a Field) -> Result<DynamicValue<'a>> {
        let active = field.discriminant_value == NO_DISCRIMINANT
            || self
                .reader
                .get_data_field::<u16>(self.node.discriminant_offset as usize)
                == field.discriminant_value;
        if active {
            self.read_field(field, self.reader)
        } else {
            self.read_field(field, StructReader::empty())
        }
    }

    fn read_field(&self, field: &'a Field, reader: StructReader<'a>) -> Result<DynamicValue<'a>> {
        let FieldKind::Slot {
            offset,
            ty,
            default,
            ..
        } = &field.kind
        else {
            let FieldKind::Group { type_id } = field.kind else {
                unreachable!()
            };
            return Ok(DynamicValue::Struct(DynamicStruct::new(
                self.schema,
                type_id,
                reader,
            )?));
        };
        let offset = *offset as usize;
        Ok(match ty {
            Type::Void => DynamicValue::Void,
            Type::Bool => DynamicValue::Bool(
                reader.get_bool_field_mask(offset, matches!(default, Value::Bool(true))),
            ),
            Type::Int8 => {
                DynamicValue::Int(reader.get_data_field_mask::<i8>(offset, int_mask(default) as i8)
                    as i64)
            }
            Type::Int16 => DynamicValue::Int(
                reader.get_data_field_mask::<i16>(offset, int_mask(default) as i16) as i64,
            ),
            Type::Int32 => DynamicValue::Int(
                reader.get_data_field_mask::<i32>(offset, int_mask(default) as i32) as i64,
            ),
            Type::Int64 => {
                DynamicValue::Int(reader.get_data_field_mask::<i64>(offset, int_mask(default)))
            }
            Type::Uint8 => DynamicValue::Uint(
                reader.get_data_field_mask::<u8>(offset, uint_mask(default) as u8) as u64,
            ),
            Type::Uint16 => DynamicValue::Uint(
                reader.get_data_field_mask::<u16>(offset, uint_mask(default) as u16) as u64,
            ),
            Type::Uint32 => DynamicValue::Uint(
                reader.get_data_field_mask::<u32>(offset, uint_mask(default) as u32) as u64,
            ),
            Type::Uint64 => {
                DynamicValue::Uint(reader.get_data_field_mask::<u64>(offset, uint_mask(default)))
            }
            Type::Float32 => {
                let mask = match default {
                    Value::Float32(f) => f.to_bits(),
                    _ => 0,
                };
                DynamicValue::Float32(reader.get_data_field_mask::<f32>(offset, mask))
            }
            Type::Float64 => {
                let mask = match default {
                    Value::Float64(f) => f.to_bits(),
                    _ => 0,
                };
                DynamicValue::Float64(reader.get_data_field_mask::<f64>(offset, mask))
            }
            Type::Enum(enum_id) => {
                let mask = match default {
                    Value::Enum(v) => *v,
                    _ => 0,
                };
                let value = reader.get_data_field_mask::<u16>(offset, mask);
                let name = self
                    .schema
                    .enum_node(*enum_id)?
                    .enumerants
                    .get(value as usize)
                    .map(String::as_str);
                DynamicValue::Enum { value, name }
            }
            Type::Text => {
                let default = match default {
                    Value::Text(s) => s.as_str(),
                    _ => "",
                };
                DynamicValue::Text(
                    reader
                        .get_pointer_field(offset as u16)
                        .get_text_or(default)?,
                )
            }
            Type::Data => {
                let default = match default {
                    Value::Data(d) => d.as_slice(),
                    _ => &[],
                };
                DynamicValue::Data(
                    reader
                        .get_pointer_field(offset as u16)
                        .get_data_or(default)?,
                )
            }
            Type::Struct(struct_id) => DynamicValue::Struct(DynamicStruct::new(
                self.schema,
                *struct_id,
                reader.get_pointer_field(offset as u16).get_struct()?,
            )?),
            Type::List(element) => DynamicValue::List(DynamicList {
                schema: self.schema,
                element: &**element,
                list: reader
                    .get_pointer_field(offset as u16)
                    .get_list(Some(element.element_size()))?,
            }),
            Type::Interface(_) | Type::AnyPointer => {
                return Err(Error::from_kind_context(
                    ErrorKind::SchemaError,
                    format!("field {} has a kind outside the serialisation kernel", field.name),
                ));
            }
        })
    }

    /// The compact one-line rendering the `decode` verb prints: fields in
    /// declaration order, inactive union arms omitted.
    pub fn short_repr(&self) -> Result<String> {
        let mut out = String::new();
        self.write_repr(&mut out)?;
        Ok(out)
    }

    fn write_repr(&self, out: &mut String) -> Result<()> {
        out.push('(');
        let mut first = true;
        for field in self.fields() {
            if field.discriminant_value != NO_DISCRIMINANT {
                let active = self.which()?.map(|f| f.discriminant_value);
                if active != Some(field.discriminant_value) {
                    continue;
                }
            }
            if !first {
                out.push_str(", ");
            }
            first = false;
            let _ = write!(out, "{} = ", field.name);
            self.get(field)?.write_repr(out)?;
        }
        out.push(')');
        Ok(())
    }
}

impl<'a> DynamicList<'a> {
    pub fn len(&self) -> u32 {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Reads the element at a position that may count from the end.
    pub fn at(&self, index: i64) -> Result<DynamicValue<'a>> {
        self.get(self.list.at_index(index)?)
    }

    pub fn get(&self, index: u32) -> Result<DynamicValue<'a>> {
        if index >= self.list.len() {
            return Err(Error::from_kind(ErrorKind::IndexOutOfRange));
        }
        Ok(match self.element {
            Type::Void => DynamicValue::Void,
            Type::Bool => DynamicValue::Bool(self.list.get_bool_element(index)),
            Type::Int8 => DynamicValue::Int(self.list.read_primitive::<i8>(index) as i64),
            Type::Int16 => DynamicValue::Int(self.list.read_primitive::<i16>(index) as i64),
            Type::Int32 => DynamicValue::Int(self.list.read_primitive::<i32>(index) as i64),
            Type::Int64 => DynamicValue::Int(self.list.read_primitive::<i64>(index)),
            Type::Uint8 => DynamicValue::Uint(self.list.read_primitive::<u8>(index) as u64),
            Type::Uint16 => DynamicValue::Uint(self.list.read_primitive::<u16>(index) as u64),
            Type::Uint32 => DynamicValue::Uint(self.list.read_primitive::<u32>(index) as u64),
            Type::Uint64 => DynamicValue::Uint(self.list.read_primitive::<u64>(index)),
            Type::Float32 => DynamicValue::Float32(self.list.read_primitive::<f32>(index)),
            Type::Float64 => DynamicValue::Float64(self.list.read_primitive::<f64>(index)),
            Type::Enum(enum_id) => {
                let value = self.list.read_primitive::<u16>(index);
                DynamicValue::Enum {
                    value,
                    name: self
                        .schema
                        .enum_node(*enum_id)?
                        .enumerants
                        .get(value as usize)
                        .map(String::as_str),
                }
            }
            Type::Text => DynamicValue::Text(self.list.get_pointer_element(index).get_text()?),
            Type::Data => DynamicValue::Data(self.list.get_pointer_element(index).get_data()?),
            Type::Struct(struct_id) => DynamicValue::Struct(DynamicStruct::new(
                self.schema,
                *struct_id,
                self.list.get_struct_element(index),
            )?),
            Type::List(inner) => DynamicValue::List(DynamicList {
                schema: self.schema,
                element: &**inner,
                list: self
                    .list
                    .get_pointer_element(index)
                    .get_list(Some(inner.element_size()))?,
            }),
            Type::Interface(_) | Type::AnyPointer => {
                return Err(type_error("list elements outside the serialisation kernel"));
            }
        })
    }
}

impl DynamicValue<'_> {
    fn write_repr(&self, out: &mut String) -> Result<()> {
        match self {
            DynamicValue::Void => out.push_str("void"),
            DynamicValue::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            DynamicValue::Int(i) => {
                let _ = write!(out, "{i}");
            }
            DynamicValue::Uint(u) => {
                let _ = write!(out, "{u}");
            }
            DynamicValue::Float32(f) => {
                let _ = write!(out, "{f}");
            }
            DynamicValue::Float64(f) => {
                let _ = write!(out, "{f}");
            }
            DynamicValue::Enum { value, name } => match name {
                Some(name) => out.push_str(name),
                None => {
                    let _ = write!(out, "{value}");
                }
            },
            DynamicValue::Text(s) => {
                let _ = write!(out, "{s:?}");
            }
            DynamicValue::Data(bytes) => {
                out.push_str("0x\"");
                for byte in *bytes {
                    let _ = write!(out, "{byte:02x}");
                }
                out.push('"');
            }
            DynamicValue::Struct(s) => s.write_repr(out)?,
            DynamicValue::List(list) => {
                out.push('[');
                for index in 0..list.len() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    list.get(index)?.write_repr(out)?;
                }
                out.push(']');
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::message::{Reader, ReaderOptions};
    use crate::schema::{Node, NodeKind, RequestedFile};
    use std::collections::HashMap;

    fn slot(name: &str, offset: u32, ty: Type, discriminant: u16) -> Field {
        Field {
            name: name.to_string(),
            code_order: 0,
            discriminant_value: discriminant,
            kind: FieldKind::Slot {
                offset,
                ty,
                default: Value::Void,
                had_explicit_default: false,
            },
        }
    }

    /// `struct Shape { name :Text; union { circle :Void; square :Int64 } }`
    /// with the tag in the second data word.
    fn shape_schema() -> Schema {
        let mut nodes = HashMap::new();
        nodes.insert(
            2,
            Node {
                id: 2,
                display_name: "demo.capnp:Shape".into(),
                display_name_prefix_length: 11,
                scope_id: 1,
                nested: vec![],
                kind: NodeKind::Struct(StructNode {
                    data_words: 2,
                    ptr_words: 1,
                    is_group: false,
                    discriminant_count: 2,
                    discriminant_offset: 4,
                    fields: vec![
                        slot("name", 0, Type::Text, NO_DISCRIMINANT),
                        slot("circle", 0, Type::Void, 0),
                        slot("square", 0, Type::Int64, 1),
                    ],
                }),
            },
        );
        Schema {
            nodes,
            children: HashMap::new(),
            requested_files: vec![RequestedFile {
                id: 1,
                filename: "demo.capnp".into(),
            }],
        }
    }

    fn build_square(value: i64) -> Builder {
        let mut message = Builder::new_default();
        let address = message.allocate_struct(2, 1);
        message.write_data::<i64>(address, 0, value).unwrap();
        message.write_data::<u16>(address, 4, 1).unwrap();
        message.set_text(address.pointer_slot(2, 0), "sq").unwrap();
        message.set_root_struct(address, 2, 1).unwrap();
        message
    }

    #[test]
    fn reads_the_active_union_arm() {
        let schema = shape_schema();
        let message = build_square(5);
        let reader = Reader::new(&message, ReaderOptions::new());
        let root = DynamicStruct::new(&schema, 2, reader.get_root().unwrap()).unwrap();

        let active = root.which().unwrap().unwrap();
        assert_eq!(active.name, "square");
        let DynamicValue::Int(v) = root.get(active).unwrap() else {
            panic!("expected an int");
        };
        assert_eq!(v, 5);
    }

    #[test]
    fn inactive_arm_reads_as_default() {
        let schema = shape_schema();
        let message = build_square(5);
        let reader = Reader::new(&message, ReaderOptions::new());
        let root = DynamicStruct::new(&schema, 2, reader.get_root().unwrap()).unwrap();

        let circle = &root.fields()[1];
        assert!(matches!(root.get(circle).unwrap(), DynamicValue::Void));
    }

    #[test]
    fn short_repr_renders_one_line() {
        let schema = shape_schema();
        let message = build_square(5);
        let reader = Reader::new(&message, ReaderOptions::new());
        let root = DynamicStruct::new(&schema, 2, reader.get_root().unwrap()).unwrap();
        assert_eq!(root.short_repr().unwrap(), "(name = \"sq\", square = 5)");
    }
}
