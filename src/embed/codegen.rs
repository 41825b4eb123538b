//! Source generator for embedded resources.
//!
//! Turns a set of binary files into two Rust source artifacts:
//!
//! - [`DEFINITIONS_FILE`] holds one `static` byte array per file, written as
//!   octal integer literals, [`BYTES_PER_LINE`] per line.
//! - [`DECLARATIONS_FILE`] holds the `ENTRIES` lookup table (sorted by file
//!   name) and an `embedded_resource!` macro with one arm per known name. Its
//!   fallback arm expands to `compile_error!`, so a literal name outside the
//!   embedded set never builds.
//!
//! Both files are meant to be `include!`d into the same module. This file is
//! also compiled into `build.rs`, so it only depends on `std` and `thiserror`.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// File name of the declarations artifact (lookup table + macro).
pub const DECLARATIONS_FILE: &str = "embed_resources.rs";
/// File name of the definitions artifact (byte arrays).
pub const DEFINITIONS_FILE: &str = "embed_resources_data.rs";
/// Maximum number of byte literals per generated line.
pub const BYTES_PER_LINE: usize = 21;
/// Module path used in macro arms when none is configured.
pub const DEFAULT_MODULE_PATH: &str = "embedded";

/// Errors raised while generating the embedding sources.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("can't open directory: {}", .0.display())]
    OutputDir(PathBuf),

    #[error("can't open file: {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can't write file: {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file name is not valid UTF-8: {}", .0.display())]
    InvalidName(PathBuf),

    #[error("invalid module path `{0}`")]
    ModulePath(String),
}

/// One file that will be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedEntry {
    /// File name (directory stripped); the lookup key.
    pub name: String,
    /// Rust identifier suffix derived from `name`, unique within a plan.
    pub ident: String,
    /// Where the bytes are read from.
    pub path: PathBuf,
}

impl EmbedEntry {
    /// Name of the generated `static` holding this entry's bytes.
    pub fn static_name(&self) -> String {
        format!("resource_{}", self.ident)
    }
}

/// The deduplicated, identifier-resolved set of inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedPlan {
    /// Retained entries, sorted by file name.
    pub entries: Vec<EmbedEntry>,
    /// Inputs dropped because an earlier input had the same file name.
    pub duplicates: Vec<PathBuf>,
    /// `(file name, identifier)` pairs that needed a numeric suffix to stay
    /// unique after sanitization.
    pub renamed: Vec<(String, String)>,
}

impl EmbedPlan {
    /// Sorts `inputs` by file name (stable), drops later inputs sharing a
    /// file name with an earlier one and assigns unique identifiers.
    pub fn new<P: AsRef<Path>>(inputs: &[P]) -> Result<Self, EncodeError> {
        let mut named = inputs
            .iter()
            .map(|path| {
                let path = path.as_ref();
                file_name(path).map(|name| (name, path.to_path_buf()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        named.sort_by(|a, b| a.0.cmp(&b.0));

        let mut plan = EmbedPlan::default();
        let mut taken = HashSet::new();
        for (name, path) in named {
            if plan.entries.last().is_some_and(|e| e.name == name) {
                plan.duplicates.push(path);
                continue;
            }

            let base = sanitize_identifier(&name);
            let mut ident = base.clone();
            let mut suffix = 2usize;
            while !taken.insert(ident.clone()) {
                ident = format!("{base}_{suffix}");
                suffix += 1;
            }
            if ident != base {
                plan.renamed.push((name.clone(), ident.clone()));
            }

            plan.entries.push(EmbedEntry { name, ident, path });
        }
        Ok(plan)
    }
}

/// Summary of a finished encode run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeReport {
    pub plan: EmbedPlan,
    /// Sum of the sizes of all embedded files.
    pub total_bytes: u64,
    pub declarations: PathBuf,
    pub definitions: PathBuf,
}

impl EncodeReport {
    /// Human-readable warnings for dropped duplicates and renamed identifiers.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for path in &self.plan.duplicates {
            warnings.push(format!(
                "found files with identical names, only the first one is embedded; skipped {}",
                path.display()
            ));
        }
        for (name, ident) in &self.plan.renamed {
            warnings.push(format!(
                "`{name}` collides with another name after sanitization; using identifier `resource_{ident}`"
            ));
        }
        warnings
    }
}

/// Writes the declarations and definitions artifacts for a set of files.
#[derive(Debug, Clone)]
pub struct Encoder {
    module_path: String,
}

impl Default for Encoder {
    fn default() -> Self {
        Self {
            module_path: DEFAULT_MODULE_PATH.to_string(),
        }
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Crate-relative module path the artifacts will be included into, e.g.
    /// `registry::embedded`. Macro arms name statics through it.
    pub fn with_module_path(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = module_path.into();
        self
    }

    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    /// Generates both artifacts inside `out_dir`.
    pub fn encode<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        out_dir: &Path,
    ) -> Result<EncodeReport, EncodeError> {
        if !is_valid_module_path(&self.module_path) {
            return Err(EncodeError::ModulePath(self.module_path.clone()));
        }
        if !out_dir.is_dir() {
            return Err(EncodeError::OutputDir(out_dir.to_path_buf()));
        }

        let plan = EmbedPlan::new(inputs)?;

        // Every input is read before either artifact is touched; a failed run
        // leaves neither file behind.
        let (data_text, total_bytes) = render_definitions(&plan.entries)?;
        let decl_text = render_declarations(&plan.entries, &self.module_path);

        let declarations = out_dir.join(DECLARATIONS_FILE);
        let definitions = out_dir.join(DEFINITIONS_FILE);
        write_artifact(&declarations, decl_text.as_bytes())?;
        if let Err(e) = write_artifact(&definitions, &data_text) {
            let _ = fs::remove_file(&declarations);
            return Err(e);
        }

        Ok(EncodeReport {
            plan,
            total_bytes,
            declarations,
            definitions,
        })
    }
}

/// Maps a file name onto `[0-9a-zA-Z_]`: every other character becomes `_`
/// and a leading decimal digit gets a `_` prefix.
pub fn sanitize_identifier(name: &str) -> String {
    let mut ident = String::with_capacity(name.len() + 1);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        ident.push('_');
    }
    ident.extend(name.chars().map(|c| {
        if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '_'
        }
    }));
    ident
}

/// Writes `bytes` as comma-terminated octal literals, [`BYTES_PER_LINE`] per
/// line, each line indented by four spaces. Writes nothing for empty input.
pub fn write_octal_bytes<W: Write>(out: &mut W, bytes: &[u8]) -> io::Result<()> {
    for chunk in bytes.chunks(BYTES_PER_LINE) {
        out.write_all(b"   ")?;
        for byte in chunk {
            write!(out, " 0o{byte:03o},")?;
        }
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Renders the declarations artifact for already-planned entries.
pub fn render_declarations(entries: &[EmbedEntry], module_path: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "// @generated by forge-embed from {} file(s). Do not edit.\n",
        entries.len()
    );

    out.push_str("/// Embedded resources as `(file name, bytes)`, sorted by file name.\n");
    out.push_str("pub static ENTRIES: &[(&str, &[u8])] = &[\n");
    for entry in entries {
        let _ = writeln!(out, "    ({:?}, &{}),", entry.name, entry.static_name());
    }
    out.push_str("];\n\n");

    out.push_str("/// Resolves a literal resource name to its bytes at compile time.\n");
    out.push_str("/// Names outside the embedded set fail to build.\n");
    out.push_str("#[allow(unused_macros)]\n");
    out.push_str("macro_rules! embedded_resource {\n");
    for entry in entries {
        let _ = writeln!(
            out,
            "    ({:?}) => {{\n        $crate::{}::{}.as_slice()\n    }};",
            entry.name,
            module_path,
            entry.static_name()
        );
    }
    out.push_str(
        "    ($other:literal) => {\n        \
         compile_error!(concat!(\"embedded resource not found: \", $other))\n    \
         };\n",
    );
    out.push_str("}\n");
    out
}

/// Reads every entry and renders the definitions artifact. Returns the text
/// and the total number of embedded bytes.
fn render_definitions(entries: &[EmbedEntry]) -> Result<(Vec<u8>, u64), EncodeError> {
    let mut out = Vec::new();
    // Writes into a Vec can't fail.
    let _ = writeln!(
        out,
        "// @generated by forge-embed from {} file(s). Do not edit.",
        entries.len()
    );

    let mut total = 0u64;
    for entry in entries {
        let bytes = fs::read(&entry.path).map_err(|source| EncodeError::Read {
            path: entry.path.clone(),
            source,
        })?;
        total += bytes.len() as u64;
        let _ = write_definition(&mut out, entry, &bytes);
    }
    Ok((out, total))
}

/// Writes one artifact; a partially written file is removed.
fn write_artifact(path: &Path, contents: &[u8]) -> Result<(), EncodeError> {
    let result = File::create(path).and_then(|file| {
        let mut out = BufWriter::new(file);
        out.write_all(contents)?;
        out.flush()
    });
    result.map_err(|source| {
        let _ = fs::remove_file(path);
        EncodeError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn write_definition<W: Write>(out: &mut W, entry: &EmbedEntry, bytes: &[u8]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "/// `{}` ({} bytes)", entry.name, bytes.len())?;
    writeln!(out, "#[allow(non_upper_case_globals)]")?;
    writeln!(
        out,
        "pub static {}: [u8; {}] = [",
        entry.static_name(),
        bytes.len()
    )?;
    write_octal_bytes(out, bytes)?;
    writeln!(out, "];")
}

fn file_name(path: &Path) -> Result<String, EncodeError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| EncodeError::InvalidName(path.to_path_buf()))
}

fn is_valid_module_path(path: &str) -> bool {
    !path.is_empty()
        && path.split("::").all(|segment| {
            !segment.is_empty()
                && !segment.starts_with(|c: char| c.is_ascii_digit())
                && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
