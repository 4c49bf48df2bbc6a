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

//! The accessor code generator.
//!
//! Turns a parsed [`Schema`] into Rust source: one module per struct with a
//! `Reader` over the caravel runtime, a `Which` enum and tag constant for
//! unions, and constructors that pack a complete value through the message
//! builder. Emission happens in two passes: a naming pass that resolves
//! every type's module path (so sibling and recursive references need no
//! forward declarations), then a definition pass that writes the text.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use caravel::schema::{
    Field, FieldKind, NO_DISCRIMINANT, NodeKind, Schema, StructNode, Type, Value,
};
use caravel::{Error, ErrorKind, Result, message, serialize};
use convert_case::{Case, Casing};
use log::info;

use self::FormattedText::{BlankLine, Branch, Indent, Line};
use crate::convert_io_err;

/// An invocation of the caravel code generator.
pub struct CodeGenerationCommand {
    output_directory: PathBuf,
    convert_case: bool,
    caravel_root: String,
}

impl Default for CodeGenerationCommand {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::new(),
            convert_case: true,
            caravel_root: "::caravel".into(),
        }
    }
}

impl CodeGenerationCommand {
    /// Creates a new code generation command with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output directory.
    pub fn output_directory<P>(&mut self, path: P) -> &mut Self
    where
        P: AsRef<Path>,
    {
        self.output_directory = path.as_ref().to_path_buf();
        self
    }

    /// Whether camelCase schema names become snake_case accessors.
    /// Defaults to true.
    pub fn convert_case(&mut self, value: bool) -> &mut Self {
        self.convert_case = value;
        self
    }

    /// Sets the root path for referencing the `caravel` crate from the
    /// generated code. Usually this is `::caravel`; set it when renaming
    /// the crate on import.
    pub fn caravel_root(&mut self, caravel_root: &str) -> &mut Self {
        self.caravel_root = caravel_root.into();
        self
    }

    /// Generates Rust code for a `CodeGeneratorRequest` read from `inp`,
    /// one `<stem>.rs` per requested file.
    pub fn run<T>(&mut self, mut inp: T) -> Result<()>
    where
        T: std::io::Read,
    {
        let request = serialize::read_message(&mut inp, message::ReaderOptions::new())?;
        let schema = Schema::parse(&request)?;
        self.generate(&schema)
    }

    /// Like [`Self::run`], for an already-parsed schema.
    pub fn generate(&mut self, schema: &Schema) -> Result<()> {
        let ctx = GeneratorContext::new(schema, self.convert_case, self.caravel_root.clone())?;
        for requested_file in schema.requested_files() {
            let text = stringify(&generate_file(&ctx, requested_file.id)?);
            let stem = path_to_stem_string(&requested_file.filename)?;
            let filepath = self.output_directory.join(format!("{stem}.rs"));
            std::fs::write(&filepath, text.as_bytes()).map_err(convert_io_err)?;
            info!("generated {}", filepath.display());
        }
        Ok(())
    }
}

pub struct GeneratorContext<'a> {
    pub schema: &'a Schema,
    /// Module path segments per node id, rooted at `crate`.
    pub scope_map: HashMap<u64, Vec<String>>,
    convert_case: bool,
    caravel_root: String,
}

/// Like `format!(...)`, but adds a `caravel=ctx.caravel_root` argument.
macro_rules! fmt(
    ($ctx:ident, $($arg:tt)*) => ( format!($($arg)*, caravel=$ctx.caravel_root) )
);

impl<'a> GeneratorContext<'a> {
    pub fn new(
        schema: &'a Schema,
        convert_case: bool,
        caravel_root: String,
    ) -> Result<GeneratorContext<'a>> {
        let mut ctx = GeneratorContext {
            schema,
            scope_map: HashMap::new(),
            convert_case,
            caravel_root,
        };
        for requested_file in schema.requested_files() {
            let root_mod = path_to_stem_string(&requested_file.filename)?;
            let scope = vec!["crate".to_string(), root_mod];
            ctx.scope_map.insert(requested_file.id, scope.clone());
            ctx.populate_scope_map(&scope, requested_file.id)?;
        }
        Ok(ctx)
    }

    fn populate_scope_map(&mut self, scope: &[String], node_id: u64) -> Result<()> {
        let node = self.schema.node(node_id)?;
        let mut seen = HashSet::new();
        for nested in &node.nested {
            let child = self.schema.node(nested.id)?;
            // Enums become types and keep their given casing; everything
            // else becomes a module.
            let segment = match child.kind {
                NodeKind::Enum(_) => disambiguate(&mut seen, nested.name.to_case(Case::Pascal)),
                _ => disambiguate(&mut seen, module_name(&nested.name)),
            };
            let mut child_scope = scope.to_vec();
            child_scope.push(segment);
            self.scope_map.insert(nested.id, child_scope.clone());
            self.populate_scope_map(&child_scope, nested.id)?;
        }
        if let NodeKind::Struct(st) = &node.kind {
            for field in &st.fields {
                if let FieldKind::Group { type_id } = field.kind {
                    let segment = disambiguate(&mut seen, module_name(&field.name));
                    let mut child_scope = scope.to_vec();
                    child_scope.push(segment);
                    self.scope_map.insert(type_id, child_scope.clone());
                    self.populate_scope_map(&child_scope, type_id)?;
                }
            }
        }
        Ok(())
    }

    pub fn get_qualified_module(&self, type_id: u64) -> Result<String> {
        self.scope_map
            .get(&type_id)
            .map(|scope| scope.join("::"))
            .ok_or_else(|| {
                Error::from_kind_context(
                    ErrorKind::SchemaError,
                    format!("no scope resolved for node {type_id:#x}"),
                )
            })
    }

    /// A field accessor or parameter identifier, case-converted when the
    /// option is on and kept clear of Rust keywords either way.
    fn member_name(&self, name: &str) -> String {
        let base = if self.convert_case {
            snake_name(name)
        } else {
            name.to_string()
        };
        escape_keyword(base)
    }

    /// Accessor names for every field of `st`, in declaration order, with
    /// collisions resolved by a numeric suffix.
    fn field_names(&self, st: &StructNode) -> Vec<String> {
        let mut seen = HashSet::new();
        st.fields
            .iter()
            .map(|f| disambiguate(&mut seen, self.member_name(&f.name)))
            .collect()
    }
}

/// The text sink the emitter writes into: lines, blank lines, one level
/// of nesting, and grouping. Rendered to source text in a single
/// depth-tracking pass; two spaces per level.
pub enum FormattedText {
    Line(String),
    BlankLine,
    Indent(Box<FormattedText>),
    Branch(Vec<FormattedText>),
}

impl FormattedText {
    fn render(&self, depth: usize, out: &mut String) {
        match self {
            Line(content) => {
                for _ in 0..depth {
                    out.push_str("  ");
                }
                out.push_str(content);
                out.push('\n');
            }
            BlankLine => out.push('\n'),
            Indent(inner) => inner.render(depth + 1, out),
            Branch(parts) => {
                for part in parts {
                    part.render(depth, out);
                }
            }
        }
    }
}

pub fn line(text: impl AsRef<str>) -> FormattedText {
    Line(text.as_ref().to_string())
}

pub fn indent(inner: FormattedText) -> FormattedText {
    Indent(Box::new(inner))
}

pub fn indent_all(parts: Vec<FormattedText>) -> FormattedText {
    Indent(Box::new(Branch(parts)))
}

pub fn stringify(text: &FormattedText) -> String {
    let mut out = String::new();
    text.render(0, &mut out);
    out
}

/// camelCase or PascalCase to snake_case. Schema identifiers are plain
/// ASCII, which the front-end already enforces.
fn snake_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() && !out.is_empty() {
            out.push('_');
        }
        out.push(ch.to_ascii_lowercase());
    }
    out
}

/// Strict and reserved Rust keywords, plus the contextual ones that can
/// open an item.
fn is_rust_keyword(name: &str) -> bool {
    matches!(
        name,
        "abstract" | "as" | "async" | "await" | "become" | "box" | "break" | "const"
            | "continue" | "crate" | "do" | "dyn" | "else" | "enum" | "extern" | "false"
            | "final" | "fn" | "for" | "if" | "impl" | "in" | "let" | "loop" | "macro"
            | "match" | "mod" | "move" | "mut" | "override" | "priv" | "pub" | "ref"
            | "return" | "self" | "static" | "struct" | "super" | "trait" | "true" | "try"
            | "type" | "typeof" | "union" | "unsafe" | "unsized" | "use" | "virtual"
            | "where" | "while" | "yield"
    )
}

fn escape_keyword(mut name: String) -> String {
    if is_rust_keyword(&name) {
        name.push('_');
    }
    name
}

fn module_name(name: &str) -> String {
    escape_keyword(snake_name(name))
}

fn snake_to_upper_case(s: &str) -> String {
    s.chars().map(|c| c.to_ascii_uppercase()).collect()
}

/// Appends a numeric suffix until `name` is unique within `seen`.
fn disambiguate(seen: &mut HashSet<String>, name: String) -> String {
    if seen.insert(name.clone()) {
        return name;
    }
    for n in 2.. {
        let candidate = format!("{name}{n}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
    }
    unreachable!()
}

fn path_to_stem_string(path: &str) -> Result<String> {
    match Path::new(path).file_stem().and_then(|s| s.to_str()) {
        None => Err(Error::failed(format!("file has no stem: {path:?}"))),
        Some(stem) => Ok(stem.replace('-', "_")),
    }
}

fn schema_error<S: Into<String>>(extra: S) -> Error {
    Error::from_kind_context(ErrorKind::SchemaError, extra)
}

pub fn generate_file(ctx: &GeneratorContext, file_id: u64) -> Result<FormattedText> {
    let node = ctx.schema.node(file_id)?;
    let mut output = vec![
        Line("// @generated by caravel-gen, the Cap'n Proto accessor generator.".into()),
        line("// DO NOT EDIT."),
        Line(format!("// source: {}", node.display_name)),
        BlankLine,
    ];
    if !ctx.convert_case {
        output.push(Line("#![allow(non_snake_case)]".into()));
        output.push(BlankLine);
    }
    for nested in &node.nested {
        output.push(generate_node(ctx, nested.id, &nested.name)?);
    }
    Ok(Branch(output))
}

fn generate_node(ctx: &GeneratorContext, node_id: u64, name: &str) -> Result<FormattedText> {
    let node = ctx.schema.node(node_id)?;
    match &node.kind {
        NodeKind::Struct(_) => generate_struct(ctx, node_id),
        NodeKind::Enum(_) => generate_enum(ctx, node_id),
        NodeKind::Const(_) => generate_const(ctx, node_id, name),
        // The serialisation kernel has nothing to emit for these.
        NodeKind::File | NodeKind::Interface | NodeKind::Annotation => Ok(Branch(vec![])),
    }
}

fn generate_struct<'s>(ctx: &GeneratorContext<'s>, node_id: u64) -> Result<FormattedText> {
    let node = ctx.schema.node(node_id)?;
    let NodeKind::Struct(st) = &node.kind else {
        return Err(schema_error(format!("node {node_id:#x} is not a struct")));
    };
    let scope = ctx.get_qualified_module(node_id)?;
    let mod_name = scope.rsplit("::").next().unwrap().to_string();
    let names = ctx.field_names(st);

    let mut interior: Vec<FormattedText> = Vec::new();

    // Nested types and groups recurse first.
    for nested in &node.nested {
        interior.push(generate_node(ctx, nested.id, &nested.name)?);
    }
    for field in &st.fields {
        if let FieldKind::Group { type_id } = field.kind {
            interior.push(generate_struct(ctx, type_id)?);
        }
    }

    if !st.is_group {
        interior.push(Line(format!("pub const DATA_WORDS: u16 = {};", st.data_words)));
        interior.push(Line(format!("pub const PTR_WORDS: u16 = {};", st.ptr_words)));
        interior.push(BlankLine);
    }
    if st.discriminant_count > 0 {
        // The 16-bit union tag, in 16-bit units from the data section.
        interior.push(Line(format!(
            "pub const TAG_OFFSET: usize = {};",
            st.discriminant_offset
        )));
        interior.push(BlankLine);
    }

    interior.push(generate_reader(ctx, st, &names)?);

    if st.discriminant_count > 0 {
        interior.push(BlankLine);
        interior.push(generate_which_enum(ctx, st, &names)?);
    }

    if !st.is_group {
        interior.push(BlankLine);
        interior.push(generate_constructors(ctx, st, &names)?);
    }

    Ok(Branch(vec![
        BlankLine,
        Line(format!("pub mod {mod_name} {{")),
        indent_all(interior),
        Line("}".into()),
    ]))
}

fn generate_reader(
    ctx: &GeneratorContext,
    st: &StructNode,
    names: &[String],
) -> Result<FormattedText> {
    let mut impl_body: Vec<FormattedText> = Vec::new();
    if st.discriminant_count > 0 {
        impl_body.push(Branch(vec![
            Line(fmt!(
                ctx,
                "pub fn which(self) -> ::core::result::Result<Which, {caravel}::NotInSchema> {{"
            )),
            indent(line(
                "::core::convert::TryFrom::try_from(self.reader.get_data_field::<u16>(TAG_OFFSET))",
            )),
            Line("}".into()),
        ]));
    }
    for (field, name) in st.fields.iter().zip(names) {
        impl_body.push(generate_getter(ctx, field, name)?);
    }

    let mut text = vec![
        Line("#[derive(Clone, Copy)]".into()),
        Line("pub struct Reader<'a> {".into()),
        indent(line(fmt!(ctx, "reader: {caravel}::reader::StructReader<'a>,"))),
        Line("}".into()),
        BlankLine,
        Line(fmt!(
            ctx,
            "impl <'a> {caravel}::traits::FromStructReader<'a> for Reader<'a> {{"
        )),
        indent_all(vec![
            Line(fmt!(
                ctx,
                "fn new(reader: {caravel}::reader::StructReader<'a>) -> Self {{"
            )),
            indent(line("Self { reader }")),
            Line("}".into()),
        ]),
        Line("}".into()),
        BlankLine,
        Line(fmt!(
            ctx,
            "impl <'a> {caravel}::traits::IntoInternalStructReader<'a> for Reader<'a> {{"
        )),
        indent_all(vec![
            Line(fmt!(
                ctx,
                "fn into_internal_struct_reader(self) -> {caravel}::reader::StructReader<'a> {{"
            )),
            indent(line("self.reader")),
            Line("}".into()),
        ]),
        Line("}".into()),
        BlankLine,
    ];
    if !st.is_group {
        text.push(Branch(vec![
            Line(fmt!(
                ctx,
                "impl <'a> {caravel}::traits::FromPointerReader<'a> for Reader<'a> {{"
            )),
            indent_all(vec![
                Line(fmt!(
                    ctx,
                    "fn get_from_pointer(reader: &{caravel}::reader::PointerReader<'a>) -> {caravel}::Result<Self> {{"
                )),
                indent(line("::core::result::Result::Ok(Self { reader: reader.get_struct()? })")),
                Line("}".into()),
            ]),
            Line("}".into()),
            BlankLine,
        ]));
    }
    text.push(Branch(vec![
        Line("impl <'a> Reader<'a> {".into()),
        indent_all(impl_body),
        Line("}".into()),
    ]));
    Ok(Branch(text))
}

/// The scalar Rust type behind a primitive schema type.
fn prim_type_str(ty: &Type) -> Result<&'static str> {
    match ty {
        Type::Void => Ok("()"),
        Type::Bool => Ok("bool"),
        Type::Int8 => Ok("i8"),
        Type::Int16 => Ok("i16"),
        Type::Int32 => Ok("i32"),
        Type::Int64 => Ok("i64"),
        Type::Uint8 => Ok("u8"),
        Type::Uint16 => Ok("u16"),
        Type::Uint32 => Ok("u32"),
        Type::Uint64 => Ok("u64"),
        Type::Float32 => Ok("f32"),
        Type::Float64 => Ok("f64"),
        _ => Err(schema_error("not a primitive type")),
    }
}

/// The nonzero default as a literal for the masked accessor, `None` when
/// the default is zero. Float masks are raw bit patterns, the way defaults
/// are XORed on the wire.
fn prim_default(value: &Value) -> Result<Option<String>> {
    match value {
        Value::Void
        | Value::Bool(false)
        | Value::Int8(0)
        | Value::Int16(0)
        | Value::Int32(0)
        | Value::Int64(0)
        | Value::Uint8(0)
        | Value::Uint16(0)
        | Value::Uint32(0)
        | Value::Uint64(0)
        | Value::Enum(0) => Ok(None),
        Value::Bool(true) => Ok(Some("true".to_string())),
        Value::Int8(i) => Ok(Some(format!("{i}i8"))),
        Value::Int16(i) => Ok(Some(format!("{i}i16"))),
        Value::Int32(i) => Ok(Some(format!("{i}i32"))),
        Value::Int64(i) => Ok(Some(format!("{i}i64"))),
        Value::Uint8(i) => Ok(Some(format!("{i}u8"))),
        Value::Uint16(i) => Ok(Some(format!("{i}u16"))),
        Value::Uint32(i) => Ok(Some(format!("{i}u32"))),
        Value::Uint64(i) => Ok(Some(format!("{i}u64"))),
        Value::Float32(f) => match f.classify() {
            ::std::num::FpCategory::Zero => Ok(None),
            _ => Ok(Some(format!("{}u32", f.to_bits()))),
        },
        Value::Float64(f) => match f.classify() {
            ::std::num::FpCategory::Zero => Ok(None),
            _ => Ok(Some(format!("{}u64", f.to_bits()))),
        },
        Value::Enum(v) => Ok(Some(format!("{v}u16"))),
        _ => Err(schema_error(
            "non-primitive value found where a primitive was expected",
        )),
    }
}

/// The plain (unmasked) default value as an expression, for inactive union
/// arms.
fn prim_default_expr(ty: &Type, value: &Value) -> Result<String> {
    let tstr = prim_type_str(ty)?;
    Ok(match prim_default(value)? {
        None => match ty {
            Type::Void => "()".into(),
            Type::Bool => "false".into(),
            Type::Float32 => "0f32".into(),
            Type::Float64 => "0f64".into(),
            _ => format!("0{tstr}"),
        },
        Some(literal) => match ty {
            Type::Float32 => format!("f32::from_bits({literal})"),
            Type::Float64 => format!("f64::from_bits({literal})"),
            _ => literal,
        },
    })
}

/// The typed list reader for an element type.
fn list_reader_string(ctx: &GeneratorContext, element: &Type) -> Result<String> {
    match element {
        Type::Struct(id) => {
            let the_mod = ctx.get_qualified_module(*id)?;
            Ok(fmt!(
                ctx,
                "{caravel}::struct_list::Reader<'a, {the_mod}::Reader<'a>>"
            ))
        }
        Type::Enum(id) => {
            let the_mod = ctx.get_qualified_module(*id)?;
            Ok(fmt!(ctx, "{caravel}::enum_list::Reader<'a, {the_mod}>"))
        }
        Type::Text => Ok(fmt!(ctx, "{caravel}::text_list::Reader<'a>")),
        Type::Data | Type::List(_) | Type::Interface(_) | Type::AnyPointer => Err(schema_error(
            format!("unsupported list element type {element:?}"),
        )),
        prim => {
            let tstr = prim_type_str(prim)?;
            Ok(fmt!(ctx, "{caravel}::primitive_list::Reader<'a, {tstr}>"))
        }
    }
}

fn generate_getter(ctx: &GeneratorContext, field: &Field, name: &str) -> Result<FormattedText> {
    let (return_type, expr, arm_default): (String, String, String) = match &field.kind {
        FieldKind::Group { type_id } => {
            let the_mod = ctx.get_qualified_module(*type_id)?;
            (
                format!("{the_mod}::Reader<'a>"),
                fmt!(ctx, "{caravel}::traits::FromStructReader::new(self.reader)"),
                fmt!(
                    ctx,
                    "{caravel}::traits::FromStructReader::new({caravel}::reader::StructReader::empty())"
                ),
            )
        }
        FieldKind::Slot {
            offset,
            ty,
            default,
            had_explicit_default,
        } => {
            let offset = *offset as usize;
            match ty {
                Type::Void => ("()".into(), "()".into(), "()".into()),
                Type::Bool => {
                    let expr = match prim_default(default)? {
                        None => format!("self.reader.get_bool_field({offset})"),
                        Some(_) => format!("self.reader.get_bool_field_mask({offset}, true)"),
                    };
                    ("bool".into(), expr, prim_default_expr(ty, default)?)
                }
                Type::Int8
                | Type::Int16
                | Type::Int32
                | Type::Int64
                | Type::Uint8
                | Type::Uint16
                | Type::Uint32
                | Type::Uint64
                | Type::Float32
                | Type::Float64 => {
                    let tstr = prim_type_str(ty)?;
                    let expr = match prim_default(default)? {
                        None => format!("self.reader.get_data_field::<{tstr}>({offset})"),
                        Some(mask) => format!(
                            "self.reader.get_data_field_mask::<{tstr}>({offset}, {mask})"
                        ),
                    };
                    (tstr.into(), expr, prim_default_expr(ty, default)?)
                }
                Type::Enum(id) => {
                    let the_mod = ctx.get_qualified_module(*id)?;
                    let read = match prim_default(default)? {
                        None => format!("self.reader.get_data_field::<u16>({offset})"),
                        Some(mask) => {
                            format!("self.reader.get_data_field_mask::<u16>({offset}, {mask})")
                        }
                    };
                    let default_value = match default {
                        Value::Enum(v) => *v,
                        _ => 0,
                    };
                    (
                        fmt!(
                            ctx,
                            "::core::result::Result<{the_mod}, {caravel}::NotInSchema>"
                        ),
                        format!("::core::convert::TryFrom::try_from({read})"),
                        format!("::core::convert::TryFrom::try_from({default_value}u16)"),
                    )
                }
                Type::Text => {
                    let (expr, default_literal) = match default {
                        Value::Text(s) if !s.is_empty() => (
                            format!(
                                "self.reader.get_pointer_field({offset}).get_text_or({s:?})"
                            ),
                            format!("{s:?}"),
                        ),
                        _ => (
                            format!("self.reader.get_pointer_field({offset}).get_text()"),
                            "\"\"".to_string(),
                        ),
                    };
                    (
                        fmt!(ctx, "{caravel}::Result<&'a str>"),
                        expr,
                        format!("::core::result::Result::Ok({default_literal})"),
                    )
                }
                Type::Data => {
                    let (expr, default_literal) = match default {
                        Value::Data(bytes) if !bytes.is_empty() => {
                            let literal = format!(
                                "&[{}]",
                                bytes
                                    .iter()
                                    .map(|b| format!("{b}u8"))
                                    .collect::<Vec<_>>()
                                    .join(", ")
                            );
                            (
                                format!(
                                    "self.reader.get_pointer_field({offset}).get_data_or({literal})"
                                ),
                                literal,
                            )
                        }
                        _ => (
                            format!("self.reader.get_pointer_field({offset}).get_data()"),
                            "&[]".to_string(),
                        ),
                    };
                    (
                        fmt!(ctx, "{caravel}::Result<&'a [u8]>"),
                        expr,
                        format!("::core::result::Result::Ok({default_literal})"),
                    )
                }
                Type::Struct(id) => {
                    if *had_explicit_default {
                        return Err(schema_error(format!(
                            "field {} has an explicit struct default, which the generator \
                             does not materialise",
                            field.name
                        )));
                    }
                    let the_mod = ctx.get_qualified_module(*id)?;
                    (
                        fmt!(ctx, "{caravel}::Result<{the_mod}::Reader<'a>>"),
                        fmt!(
                            ctx,
                            "{caravel}::traits::FromPointerReader::get_from_pointer(&self.reader.get_pointer_field({offset}))"
                        ),
                        fmt!(
                            ctx,
                            "{caravel}::traits::FromPointerReader::get_from_pointer(&{caravel}::reader::PointerReader::null())"
                        ),
                    )
                }
                Type::List(element) => {
                    if *had_explicit_default {
                        return Err(schema_error(format!(
                            "field {} has an explicit list default, which the generator \
                             does not materialise",
                            field.name
                        )));
                    }
                    let list_type = list_reader_string(ctx, element)?;
                    (
                        fmt!(ctx, "{caravel}::Result<{list_type}>"),
                        fmt!(
                            ctx,
                            "{caravel}::traits::FromPointerReader::get_from_pointer(&self.reader.get_pointer_field({offset}))"
                        ),
                        fmt!(
                            ctx,
                            "{caravel}::traits::FromPointerReader::get_from_pointer(&{caravel}::reader::PointerReader::null())"
                        ),
                    )
                }
                Type::Interface(_) | Type::AnyPointer => {
                    return Err(schema_error(format!(
                        "field {} has a kind outside the serialisation kernel",
                        field.name
                    )));
                }
            }
        }
    };

    let body = if field.discriminant_value == NO_DISCRIMINANT || return_type == "()" {
        line(&expr)
    } else {
        Branch(vec![
            Line(format!(
                "if self.reader.get_data_field::<u16>(TAG_OFFSET) == {} {{",
                field.discriminant_value
            )),
            indent(line(&expr)),
            Line("} else {".into()),
            indent(line(&arm_default)),
            Line("}".into()),
        ])
    };
    Ok(Branch(vec![
        Line(format!("pub fn get_{name}(self) -> {return_type} {{")),
        indent(body),
        Line("}".into()),
    ]))
}

fn generate_which_enum(
    ctx: &GeneratorContext,
    st: &StructNode,
    names: &[String],
) -> Result<FormattedText> {
    let mut arms: Vec<(u16, String)> = st
        .fields
        .iter()
        .zip(names)
        .filter(|(f, _)| f.discriminant_value != NO_DISCRIMINANT)
        .map(|(f, n)| (f.discriminant_value, n.to_case(Case::Pascal)))
        .collect();
    arms.sort_by_key(|(d, _)| *d);

    let variants: Vec<FormattedText> = arms
        .iter()
        .map(|(d, n)| Line(format!("{n} = {d},")))
        .collect();
    let match_arms: Vec<FormattedText> = arms
        .iter()
        .map(|(d, n)| Line(format!("{d} => ::core::result::Result::Ok(Self::{n}),")))
        .collect();

    Ok(Branch(vec![
        Line("#[repr(u16)]".into()),
        Line("#[derive(Clone, Copy, Debug, PartialEq, Eq)]".into()),
        Line("pub enum Which {".into()),
        indent_all(variants),
        Line("}".into()),
        BlankLine,
        Line("impl ::core::convert::TryFrom<u16> for Which {".into()),
        indent_all(vec![
            Line(fmt!(ctx, "type Error = {caravel}::NotInSchema;")),
            BlankLine,
            Line(
                "fn try_from(value: u16) -> ::core::result::Result<Self, Self::Error> {".into(),
            ),
            indent_all(vec![
                Line("match value {".into()),
                indent_all(match_arms),
                indent(line(fmt!(
                    ctx,
                    "_ => ::core::result::Result::Err({caravel}::NotInSchema(value)),"
                ))),
                Line("}".into()),
            ]),
            Line("}".into()),
        ]),
        Line("}".into()),
    ]))
}

fn generate_enum(ctx: &GeneratorContext, node_id: u64) -> Result<FormattedText> {
    let node = ctx.schema.node(node_id)?;
    let NodeKind::Enum(e) = &node.kind else {
        return Err(schema_error(format!("node {node_id:#x} is not an enum")));
    };
    let scope = ctx.get_qualified_module(node_id)?;
    let enum_name = scope.rsplit("::").next().unwrap().to_string();

    let mut seen = HashSet::new();
    let variants: Vec<String> = e
        .enumerants
        .iter()
        .map(|n| disambiguate(&mut seen, n.to_case(Case::Pascal)))
        .collect();

    let variant_lines: Vec<FormattedText> = variants
        .iter()
        .enumerate()
        .map(|(i, n)| Line(format!("{n} = {i},")))
        .collect();
    let match_arms: Vec<FormattedText> = variants
        .iter()
        .enumerate()
        .map(|(i, n)| Line(format!("{i} => ::core::result::Result::Ok(Self::{n}),")))
        .collect();

    Ok(Branch(vec![
        BlankLine,
        Line("#[repr(u16)]".into()),
        Line("#[derive(Clone, Copy, Debug, PartialEq, Eq)]".into()),
        Line(format!("pub enum {enum_name} {{")),
        indent_all(variant_lines),
        Line("}".into()),
        BlankLine,
        Line(format!("impl ::core::convert::TryFrom<u16> for {enum_name} {{")),
        indent_all(vec![
            Line(fmt!(ctx, "type Error = {caravel}::NotInSchema;")),
            BlankLine,
            Line(
                "fn try_from(value: u16) -> ::core::result::Result<Self, Self::Error> {".into(),
            ),
            indent_all(vec![
                Line("match value {".into()),
                indent_all(match_arms),
                indent(line(fmt!(
                    ctx,
                    "_ => ::core::result::Result::Err({caravel}::NotInSchema(value)),"
                ))),
                Line("}".into()),
            ]),
            Line("}".into()),
        ]),
        Line("}".into()),
        BlankLine,
        Line(format!("impl ::core::convert::From<{enum_name}> for u16 {{")),
        indent_all(vec![
            Line(format!("fn from(value: {enum_name}) -> u16 {{")),
            indent(line("value as u16")),
            Line("}".into()),
        ]),
        Line("}".into()),
    ]))
}

fn generate_const(ctx: &GeneratorContext, node_id: u64, name: &str) -> Result<FormattedText> {
    let node = ctx.schema.node(node_id)?;
    let NodeKind::Const(c) = &node.kind else {
        return Err(schema_error(format!("node {node_id:#x} is not a const")));
    };
    let const_name = snake_to_upper_case(&module_name(name));
    let (tstr, literal): (String, String) = match (&c.ty, &c.value) {
        (Type::Text, Value::Text(s)) => ("&str".into(), format!("{s:?}")),
        (Type::Data, Value::Data(bytes)) => (
            "&[u8]".into(),
            format!(
                "&[{}]",
                bytes
                    .iter()
                    .map(|b| format!("{b}u8"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ),
        (Type::Bool, Value::Bool(b)) => ("bool".into(), b.to_string()),
        (ty, value) => {
            let tstr = prim_type_str(ty).map_err(|_| {
                schema_error(format!("constant {name} has an unsupported type"))
            })?;
            (tstr.into(), prim_default_expr(ty, value)?)
        }
    };
    Ok(Branch(vec![
        BlankLine,
        Line(format!("pub const {const_name}: {tstr} = {literal};")),
    ]))
}

/// A constructor argument backed by one leaf slot, groups flattened.
struct LeafSlot<'a> {
    param: String,
    offset: usize,
    ty: &'a Type,
    default: &'a Value,
}

fn collect_leaf_slots<'s>(
    ctx: &GeneratorContext<'s>,
    st: &'s StructNode,
    prefix: &str,
    include_union_arms: bool,
    out: &mut Vec<LeafSlot<'s>>,
) -> Result<()> {
    let names = ctx.field_names(st);
    for (field, name) in st.fields.iter().zip(&names) {
        if !include_union_arms && field.discriminant_value != NO_DISCRIMINANT {
            continue;
        }
        match &field.kind {
            FieldKind::Slot {
                offset, ty, default, ..
            } => {
                if matches!(ty, Type::Void) {
                    continue;
                }
                out.push(LeafSlot {
                    param: format!("{prefix}{name}"),
                    offset: *offset as usize,
                    ty,
                    default,
                });
            }
            FieldKind::Group { type_id } => {
                let group = ctx.schema.struct_node(*type_id)?;
                if group.discriminant_count > 0 {
                    return Err(schema_error(format!(
                        "group {} carries its own union; constructors cannot flatten it",
                        field.name
                    )));
                }
                collect_leaf_slots(ctx, group, &format!("{prefix}{name}_"), true, out)?;
            }
        }
    }
    Ok(())
}

/// The parameter type a leaf slot contributes to a constructor.
fn param_type_string(ctx: &GeneratorContext, ty: &Type) -> Result<String> {
    Ok(match ty {
        Type::Enum(id) => ctx.get_qualified_module(*id)?,
        Type::Text => "&str".into(),
        Type::Data => "&[u8]".into(),
        Type::Struct(id) => format!("{}::Reader<'_>", ctx.get_qualified_module(*id)?),
        Type::List(element) => match &**element {
            Type::Struct(id) => {
                format!("&[{}::Reader<'_>]", ctx.get_qualified_module(*id)?)
            }
            Type::Enum(id) => format!("&[{}]", ctx.get_qualified_module(*id)?),
            Type::Text => "&[&str]".into(),
            other => format!("&[{}]", prim_type_str(other)?),
        },
        other => prim_type_str(other)?.into(),
    })
}

/// The statement that writes one leaf slot of a freshly-allocated struct.
fn write_statement(ctx: &GeneratorContext, leaf: &LeafSlot) -> Result<String> {
    let LeafSlot {
        param,
        offset,
        ty,
        default,
    } = leaf;
    Ok(match ty {
        Type::Bool => match prim_default(default)? {
            None => format!("message.write_bool(address, {offset}, {param})?;"),
            Some(_) => format!("message.write_bool_mask(address, {offset}, {param}, true)?;"),
        },
        Type::Int8
        | Type::Int16
        | Type::Int32
        | Type::Int64
        | Type::Uint8
        | Type::Uint16
        | Type::Uint32
        | Type::Uint64
        | Type::Float32
        | Type::Float64 => {
            let tstr = prim_type_str(ty)?;
            match prim_default(default)? {
                None => format!("message.write_data::<{tstr}>(address, {offset}, {param})?;"),
                Some(mask) => format!(
                    "message.write_data_mask::<{tstr}>(address, {offset}, {param}, {mask})?;"
                ),
            }
        }
        Type::Enum(_) => match prim_default(default)? {
            None => format!("message.write_data::<u16>(address, {offset}, {param} as u16)?;"),
            Some(mask) => format!(
                "message.write_data_mask::<u16>(address, {offset}, {param} as u16, {mask})?;"
            ),
        },
        Type::Text => format!(
            "message.set_text(address.pointer_slot(DATA_WORDS, {offset}), {param})?;"
        ),
        Type::Data => format!(
            "message.set_data(address.pointer_slot(DATA_WORDS, {offset}), {param})?;"
        ),
        Type::Struct(_) => fmt!(
            ctx,
            "message.set_struct_field(address.pointer_slot(DATA_WORDS, {offset}), &{caravel}::traits::IntoInternalStructReader::into_internal_struct_reader({param}))?;"
        ),
        Type::List(element) => match &**element {
            Type::Struct(id) => {
                let the_mod = ctx.get_qualified_module(*id)?;
                format!(
                    "message.set_struct_list(address.pointer_slot(DATA_WORDS, {offset}), {the_mod}::DATA_WORDS, {the_mod}::PTR_WORDS, {param})?;"
                )
            }
            Type::Enum(_) => format!(
                "message.set_enum_list(address.pointer_slot(DATA_WORDS, {offset}), {param})?;"
            ),
            Type::Text => format!(
                "message.set_text_list(address.pointer_slot(DATA_WORDS, {offset}), {param})?;"
            ),
            Type::Bool => format!(
                "message.set_bool_list(address.pointer_slot(DATA_WORDS, {offset}), {param})?;"
            ),
            other => {
                let tstr = prim_type_str(other)?;
                format!(
                    "message.set_primitive_list::<{tstr}>(address.pointer_slot(DATA_WORDS, {offset}), {param})?;"
                )
            }
        },
        Type::Void | Type::Interface(_) | Type::AnyPointer => {
            return Err(schema_error("slot cannot be written by a constructor"));
        }
    })
}

/// Emits one constructor: signature, allocation, writes, tag stamp.
fn emit_ctor(
    ctx: &GeneratorContext,
    ctor_name: &str,
    leaves: &[LeafSlot],
    tag: Option<u16>,
) -> Result<FormattedText> {
    let mut signature = vec![
        Line(format!("pub fn {ctor_name}<A: {}::builder::Allocator>(", ctx.caravel_root)),
        indent(line(fmt!(
            ctx,
            "message: &mut {caravel}::builder::Builder<A>,"
        ))),
    ];
    for leaf in leaves {
        signature.push(indent(Line(format!(
            "{}: {},",
            leaf.param,
            param_type_string(ctx, leaf.ty)?
        ))));
    }
    signature.push(Line(fmt!(
        ctx,
        ") -> {caravel}::Result<{caravel}::builder::Address> {{"
    )));

    let mut body = vec![line("let address = message.allocate_struct(DATA_WORDS, PTR_WORDS);")];
    for leaf in leaves {
        body.push(line(write_statement(ctx, leaf)?));
    }
    if let Some(tag) = tag {
        body.push(Line(format!(
            "message.write_data::<u16>(address, TAG_OFFSET, {tag})?;"
        )));
    }
    body.push(line("::core::result::Result::Ok(address)"));

    let mut text = signature;
    text.push(indent_all(body));
    text.push(Line("}".into()));
    Ok(Branch(text))
}

fn generate_constructors<'s>(
    ctx: &GeneratorContext<'s>,
    st: &'s StructNode,
    names: &[String],
) -> Result<FormattedText> {
    if st.discriminant_count == 0 {
        let mut leaves = Vec::new();
        collect_leaf_slots(ctx, st, "", true, &mut leaves)?;
        return emit_ctor(ctx, "new", &leaves, None);
    }

    // A union gets one constructor per arm plus a unified initialiser
    // that insists on exactly one arm.
    let mut std_leaves = Vec::new();
    collect_leaf_slots(ctx, st, "", false, &mut std_leaves)?;

    let arms: Vec<(&Field, &String)> = st
        .fields
        .iter()
        .zip(names)
        .filter(|(f, _)| f.discriminant_value != NO_DISCRIMINANT)
        .collect();

    let mut text: Vec<FormattedText> = Vec::new();
    let mut unified_possible = true;
    for &(field, name) in &arms {
        let mut leaves = Vec::new();
        collect_leaf_slots_for_arm(ctx, field, name, &mut leaves)?;
        if matches!(field.kind, FieldKind::Group { .. }) {
            unified_possible = false;
        }
        let mut all = Vec::new();
        all.extend(std_leaves.iter().map(clone_leaf));
        all.extend(leaves);
        text.push(emit_ctor(
            ctx,
            &format!("new_{name}"),
            &all,
            Some(field.discriminant_value),
        )?);
        text.push(BlankLine);
    }

    if unified_possible {
        text.push(generate_unified_ctor(ctx, &std_leaves, &arms)?);
    }
    Ok(Branch(text))
}

fn clone_leaf<'s>(leaf: &LeafSlot<'s>) -> LeafSlot<'s> {
    LeafSlot {
        param: leaf.param.clone(),
        offset: leaf.offset,
        ty: leaf.ty,
        default: leaf.default,
    }
}

fn collect_leaf_slots_for_arm<'s>(
    ctx: &GeneratorContext<'s>,
    field: &'s Field,
    name: &str,
    out: &mut Vec<LeafSlot<'s>>,
) -> Result<()> {
    match &field.kind {
        FieldKind::Slot {
            offset, ty, default, ..
        } => {
            if !matches!(ty, Type::Void) {
                out.push(LeafSlot {
                    param: name.to_string(),
                    offset: *offset as usize,
                    ty,
                    default,
                });
            }
            Ok(())
        }
        FieldKind::Group { type_id } => {
            let group = ctx.schema.struct_node(*type_id)?;
            if group.discriminant_count > 0 {
                return Err(schema_error(format!(
                    "group {} carries its own union; constructors cannot flatten it",
                    field.name
                )));
            }
            collect_leaf_slots(ctx, group, &format!("{name}_"), true, out)
        }
    }
}

/// `try_new`: one `Option` per arm, exactly one of which must be `Some`.
fn generate_unified_ctor(
    ctx: &GeneratorContext,
    std_leaves: &[LeafSlot],
    arms: &[(&Field, &String)],
) -> Result<FormattedText> {
    let mut signature = vec![
        Line(format!(
            "pub fn try_new<A: {}::builder::Allocator>(",
            ctx.caravel_root
        )),
        indent(line(fmt!(
            ctx,
            "message: &mut {caravel}::builder::Builder<A>,"
        ))),
    ];
    for leaf in std_leaves {
        signature.push(indent(Line(format!(
            "{}: {},",
            leaf.param,
            param_type_string(ctx, leaf.ty)?
        ))));
    }
    for (field, name) in arms {
        let FieldKind::Slot { ty, .. } = &field.kind else {
            unreachable!("group arms exclude the unified constructor");
        };
        let inner = match ty {
            Type::Void => "()".to_string(),
            other => param_type_string(ctx, other)?,
        };
        signature.push(indent(Line(format!(
            "{name}: ::core::option::Option<{inner}>,"
        ))));
    }
    signature.push(Line(fmt!(
        ctx,
        ") -> {caravel}::Result<{caravel}::builder::Address> {{"
    )));

    let tuple = arms
        .iter()
        .map(|(_, name)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let std_args: String = std_leaves
        .iter()
        .map(|l| format!(", {}", l.param))
        .collect();

    let mut match_arms: Vec<FormattedText> = Vec::new();
    for (index, (field, name)) in arms.iter().enumerate() {
        let FieldKind::Slot { ty, .. } = &field.kind else {
            unreachable!()
        };
        let pattern = arms
            .iter()
            .enumerate()
            .map(|(i, _)| {
                if i != index {
                    "::core::option::Option::None".to_string()
                } else if matches!(ty, Type::Void) {
                    "::core::option::Option::Some(())".to_string()
                } else {
                    format!("::core::option::Option::Some({name})")
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let value_arg = if matches!(ty, Type::Void) {
            String::new()
        } else {
            format!(", {name}")
        };
        match_arms.push(Line(format!(
            "({pattern}) => new_{name}(message{std_args}{value_arg}),"
        )));
    }
    let arm_names = arms
        .iter()
        .map(|(_, name)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    match_arms.push(Line(fmt!(
        ctx,
        "_ => ::core::result::Result::Err({caravel}::Error::from_kind_context("
    )));
    match_arms.push(indent_all(vec![
        Line(fmt!(ctx, "{caravel}::ErrorKind::UnionArmConflict,")),
        Line(format!(
            "\"exactly one of the following must be given: {arm_names}\","
        )),
    ]));
    match_arms.push(Line(")),".into()));

    let mut text = signature;
    text.push(indent_all(vec![
        Line(format!("match ({tuple}) {{")),
        indent_all(match_arms),
        Line("}".into()),
    ]));
    text.push(Line("}".into()));
    Ok(Branch(text))
}
