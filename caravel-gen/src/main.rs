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

//! The `caravel` command line: `decode` a framed stream against a schema,
//! or `compile` a schema into Rust accessor source.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, bail};
use caravel::dynamic::DynamicStruct;
use caravel::schema::NodeKind;
use caravel::{message, serialize};
use caravel_gen::{CompilerCommand, load_schema};
use log::{debug, info};

const USAGE: &str = "usage: caravel decode <stream-file> <schema-file> <class>\n\
                     \x20      caravel compile <schema-file> [--convert-case=no]";

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("decode") => decode(&args[1..]),
        Some("compile") => compile(&args[1..]),
        _ => bail!("{USAGE}"),
    }
}

/// Reads framed messages from `stream-file` and prints one short-repr per
/// line. A clean end of stream exits 0; a truncated message is an error.
fn decode(args: &[String]) -> anyhow::Result<()> {
    let [stream_file, schema_file, class] = args else {
        bail!("{USAGE}");
    };
    let loaded = load_schema(Path::new(schema_file))?;
    let node = loaded
        .schema
        .find_by_name(class)
        .with_context(|| format!("schema {schema_file} defines no type named {class}"))?;
    if !matches!(node.kind, NodeKind::Struct(_)) {
        bail!("{class} is not a struct type");
    }
    let node_id = node.id;

    info!("decoding stream...");
    let started = Instant::now();
    let mut stream = BufReader::new(
        File::open(stream_file).with_context(|| format!("cannot open {stream_file}"))?,
    );
    let mut count = 0u64;
    while let Some(reader) =
        serialize::try_read_message(&mut stream, message::ReaderOptions::new())?
    {
        let root = DynamicStruct::new(&loaded.schema, node_id, reader.get_root()?)?;
        println!("{}", root.short_repr()?);
        count += 1;
        if count % 10000 == 0 {
            debug!("{count}");
        }
    }
    info!(
        "stream decoded in {:.2} secs ({count} messages)",
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Generates accessor source next to the input, same basename.
fn compile(args: &[String]) -> anyhow::Result<()> {
    let mut convert_case = true;
    let mut schema_file: Option<PathBuf> = None;
    for arg in args {
        match arg.as_str() {
            "--convert-case=no" => convert_case = false,
            other if schema_file.is_none() && !other.starts_with("--") => {
                schema_file = Some(PathBuf::from(other));
            }
            other => bail!("unexpected argument `{other}`\n{USAGE}"),
        }
    }
    let Some(schema_file) = schema_file else {
        bail!("{USAGE}");
    };

    let output = match schema_file.parent() {
        Some(parent) if parent != Path::new("") => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut command = CompilerCommand::new();
    command
        .file(&schema_file)
        .output_path(&output)
        .convert_case(convert_case)
        .src_prefix(&output);
    command.run()?;
    Ok(())
}
