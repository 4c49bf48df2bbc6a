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

//! # Cap'n Proto code generation for the caravel runtime
//!
//! Schema files are compiled by the external `capnp` front-end; this crate
//! consumes the resulting binary `CodeGeneratorRequest` and emits Rust
//! accessor source. In a build script:
//!
//! ```ignore
//! caravel_gen::CompilerCommand::new()
//!     .file("schema/foo.capnp")
//!     .output_path(std::env::var("OUT_DIR").unwrap())
//!     .run()
//!     .expect("schema compiler command");
//! ```
//!
//! and in your lib.rs:
//!
//! ```ignore
//! mod foo {
//!     include!(concat!(env!("OUT_DIR"), "/foo.rs"));
//! }
//! ```

pub mod codegen;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;

use caravel::schema::Schema;
use caravel::{Error, Result, message, serialize};
use log::{debug, info};

pub(crate) fn convert_io_err(err: std::io::Error) -> Error {
    Error::from(err)
}

/// A builder object for schema compiler commands.
#[derive(Default)]
pub struct CompilerCommand {
    files: Vec<PathBuf>,
    src_prefixes: Vec<PathBuf>,
    import_paths: Vec<PathBuf>,
    no_standard_import: bool,
    output_path: Option<PathBuf>,
    convert_case: bool,
}

impl CompilerCommand {
    /// Creates a new, empty command with case conversion on.
    pub fn new() -> Self {
        Self {
            convert_case: true,
            ..Self::default()
        }
    }

    /// Adds a file to be compiled.
    pub fn file<P>(&mut self, path: P) -> &mut Self
    where
        P: AsRef<Path>,
    {
        self.files.push(path.as_ref().to_path_buf());
        self
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Adds a --src-prefix flag. For all files specified for compilation
    /// that start with `prefix`, removes the prefix when computing output
    /// filenames.
    pub fn src_prefix<P>(&mut self, prefix: P) -> &mut Self
    where
        P: AsRef<Path>,
    {
        self.src_prefixes.push(prefix.as_ref().to_path_buf());
        self
    }

    /// Adds an --import-path flag. Adds `dir` to the list of directories
    /// searched for absolute imports.
    pub fn import_path<P>(&mut self, dir: P) -> &mut Self
    where
        P: AsRef<Path>,
    {
        self.import_paths.push(dir.as_ref().to_path_buf());
        self
    }

    /// Adds the --no-standard-import flag, indicating that the default
    /// import paths of /usr/include and /usr/local/include should not be
    /// included.
    pub fn no_standard_import(&mut self) -> &mut Self {
        self.no_standard_import = true;
        self
    }

    /// Sets the output directory of generated code. Default is OUT_DIR.
    pub fn output_path<P>(&mut self, path: P) -> &mut Self
    where
        P: AsRef<Path>,
    {
        self.output_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Whether camelCase schema names become snake_case accessors.
    pub fn convert_case(&mut self, value: bool) -> &mut Self {
        self.convert_case = value;
        self
    }

    /// Runs the command. Returns an error if `OUT_DIR` or a custom output
    /// directory was not set, or if `capnp compile` fails.
    pub fn run(&mut self) -> Result<()> {
        for file in &self.files {
            std::fs::metadata(file).map_err(|error| {
                let current_dir = match std::env::current_dir() {
                    Ok(current_dir) => format!("`{}`", current_dir.display()),
                    Err(..) => "<unknown working directory>".to_string(),
                };

                Error::failed(format!(
                    "Unable to stat capnp input file `{}` in working directory {}: {}.  \
                     Please check that the file exists and is accessible for read.",
                    file.display(),
                    current_dir,
                    error
                ))
            })?;
        }

        let output_path = if let Some(output_path) = &self.output_path {
            output_path.clone()
        } else {
            PathBuf::from(std::env::var("OUT_DIR").map_err(|error| {
                Error::failed(format!(
                    "Could not access `OUT_DIR` environment variable: {error}. \
                     You might need to set it up or instead create your own output \
                     structure using `CompilerCommand::output_path`"
                ))
            })?)
        };

        let request = invoke_frontend(
            &self.files,
            &self.import_paths,
            &self.src_prefixes,
            !self.no_standard_import,
        )?;
        codegen::CodeGenerationCommand::new()
            .output_directory(output_path)
            .convert_case(self.convert_case)
            .run(request.as_slice())
    }
}

/// Runs `capnp compile -o-` and returns the binary
/// `CodeGeneratorRequest` it writes to stdout.
fn invoke_frontend(
    files: &[PathBuf],
    import_paths: &[PathBuf],
    src_prefixes: &[PathBuf],
    standard_import: bool,
) -> Result<Vec<u8>> {
    let mut command = Command::new("capnp");
    command.arg("compile").arg("-o-");
    for prefix in src_prefixes {
        command.arg(format!("--src-prefix={}", prefix.display()));
    }
    for dir in import_paths {
        command.arg(format!("--import-path={}", dir.display()));
    }
    if !standard_import {
        command.arg("--no-standard-import");
    }
    for file in files {
        command.arg(file);
    }
    debug!("running {command:?}");
    let output = command.output().map_err(|error| {
        Error::failed(format!(
            "Failed to execute `capnp compile`: {error}. \
             Please verify that the capnp schema front-end is installed and on PATH."
        ))
    })?;
    if !output.status.success() {
        return Err(Error::failed(format!(
            "capnp compile failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    Ok(output.stdout)
}

/// A schema compiled and parsed from disk.
pub struct LoadedSchema {
    pub schema: Schema,
}

static SCHEMA_CACHE: OnceLock<Mutex<HashMap<PathBuf, Arc<LoadedSchema>>>> = OnceLock::new();

/// Compiles and parses the schema at `path`, memoised for the life of the
/// process and keyed by canonical path. Concurrent loads of the same path
/// serialise on the cache lock, and every caller gets the same parsed
/// schema back.
pub fn load_schema(path: &Path) -> Result<Arc<LoadedSchema>> {
    let key = path.canonicalize().map_err(convert_io_err)?;
    let cache = SCHEMA_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache = cache
        .lock()
        .map_err(|_| Error::failed("schema cache poisoned"))?;
    if let Some(hit) = cache.get(&key) {
        debug!("schema cache hit for {}", key.display());
        return Ok(Arc::clone(hit));
    }

    info!("loading schema {}...", key.display());
    let started = Instant::now();
    let request = invoke_frontend(std::slice::from_ref(&key), &[], &[], true)?;
    let reader = serialize::read_message(&mut request.as_slice(), message::ReaderOptions::new())?;
    let schema = Schema::parse(&reader)?;
    info!("schema loaded in {:.2} secs", started.elapsed().as_secs_f64());

    let loaded = Arc::new(LoadedSchema { schema });
    cache.insert(key, Arc::clone(&loaded));
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_files_fail_before_the_frontend_runs() {
        let err = CompilerCommand::new()
            .file("definitely/not/a/real/schema.capnp")
            .output_path("/tmp")
            .run()
            .unwrap_err();
        assert!(err.extra.contains("Unable to stat capnp input file"));
    }
}
