//! Extraction – materialises the embedded interpreter and library in the
//! scratch directory.
//!
//! A resource is written only when its target file does not exist yet, so
//! running [`Extractor::ensure_extracted`] again against an unchanged scratch
//! directory writes nothing and runs nothing.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::process::{CommandRunner, ExternalCommand};
use crate::registry::Registry;
use crate::scratch::Context;
use crate::script::{unzip_script, UNZIP_SCRIPT};

/// File name of the embedded PHP interpreter.
#[cfg(windows)]
pub const INTERPRETER: &str = "php.exe";
/// File name of the embedded PHP interpreter.
#[cfg(not(windows))]
pub const INTERPRETER: &str = "php";

/// File name of the embedded dompdf archive.
pub const LIBRARY_ARCHIVE: &str = "dompdf.zip";
/// Directory the dompdf archive unpacks to.
pub const LIBRARY_DIR: &str = "dompdf";
/// Interpreter configuration written next to the interpreter.
pub const PHP_INI: &str = "php.ini";

/// How a resource is handled once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Plain data file.
    Data,
    /// Marked executable on Unix.
    Executable,
    /// Executable that also gets a `php.ini`.
    Interpreter,
    /// Zip archive unpacked into `unpack_to` by the interpreter.
    Archive { unpack_to: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredResource {
    pub name: &'static str,
    pub kind: ResourceKind,
}

/// Resources every conversion needs.
pub const REQUIRED_RESOURCES: &[RequiredResource] = &[
    RequiredResource {
        name: INTERPRETER,
        kind: ResourceKind::Interpreter,
    },
    RequiredResource {
        name: LIBRARY_ARCHIVE,
        kind: ResourceKind::Archive {
            unpack_to: LIBRARY_DIR,
        },
    },
];

/// What one extraction pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Files written in this pass.
    pub written: Vec<PathBuf>,
    /// Directories unpacked in this pass.
    pub unpacked: Vec<PathBuf>,
}

impl ExtractReport {
    pub fn is_empty(&self) -> bool {
        self.written.is_empty() && self.unpacked.is_empty()
    }
}

pub struct Extractor<'a> {
    registry: &'a Registry,
    context: &'a Context,
    runner: &'a dyn CommandRunner,
    resources: &'a [RequiredResource],
}

impl<'a> Extractor<'a> {
    pub fn new(registry: &'a Registry, context: &'a Context, runner: &'a dyn CommandRunner) -> Self {
        Self {
            registry,
            context,
            runner,
            resources: REQUIRED_RESOURCES,
        }
    }

    /// Replaces the required resource set.
    pub fn with_resources(mut self, resources: &'a [RequiredResource]) -> Self {
        self.resources = resources;
        self
    }

    /// Writes every missing resource into the scratch directory.
    ///
    /// All names are resolved before anything is written, so a binary built
    /// without one of them fails here without touching the disk.
    pub fn ensure_extracted(&self) -> Result<ExtractReport> {
        let resolved = self
            .resources
            .iter()
            .map(|required| -> Result<_> { Ok((required, self.registry.lookup(required.name)?)) })
            .collect::<Result<Vec<_>>>()?;

        let scratch = &self.context.scratch;
        scratch.ensure()?;

        let mut report = ExtractReport::default();
        for (required, resource) in resolved {
            let target = scratch.join(required.name);
            if target.exists() {
                log::debug!("{} already extracted", target.display());
                continue;
            }

            log::info!("extracting {} ({} bytes)", required.name, resource.len());
            write_file(&target, resource.data())?;
            report.written.push(target.clone());

            match required.kind {
                ResourceKind::Data => {}
                ResourceKind::Executable => make_executable(&target)?,
                ResourceKind::Interpreter => {
                    make_executable(&target)?;
                    let ini = scratch.join(PHP_INI);
                    let contents = format!("memory_limit={}\n", self.context.php_memory_limit);
                    write_file(&ini, contents.as_bytes())?;
                    report.written.push(ini);
                }
                ResourceKind::Archive { unpack_to } => {
                    if let Some(dir) = self.unpack(required.name, unpack_to, &mut report)? {
                        report.unpacked.push(dir);
                    }
                }
            }
        }
        Ok(report)
    }

    /// Unpacks `archive` unless `unpack_to` already is a directory. Returns
    /// the directory when the unpack step ran.
    fn unpack(
        &self,
        archive: &str,
        unpack_to: &str,
        report: &mut ExtractReport,
    ) -> Result<Option<PathBuf>> {
        let scratch = &self.context.scratch;
        let dir = scratch.join(unpack_to);
        if dir.exists() && !dir.is_dir() {
            log::warn!("removing non-directory {}", dir.display());
            fs::remove_file(&dir).map_err(|e| Error::io("remove", &dir, e))?;
        }
        if dir.is_dir() {
            return Ok(None);
        }

        let script = scratch.join(UNZIP_SCRIPT);
        write_file(&script, unzip_script(archive).as_bytes())?;
        report.written.push(script);

        ExternalCommand::new(scratch.join(INTERPRETER))
            .arg(UNZIP_SCRIPT)
            .current_dir(scratch.path())
            .execute(self.runner)
            .map_err(|e| {
                log::error!("can't unzip `{archive}`");
                e
            })?;
        Ok(Some(dir))
    }
}

/// Writes `data` to a new file. A partially written file is removed so the
/// next run does not mistake it for a finished extraction.
fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| Error::io("open", path, e))?;
    if let Err(e) = file.write_all(data).and_then(|()| file.flush()) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(Error::io("write to", path, e));
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|e| Error::io("stat", path, e))?;
    let mut perms = metadata.permissions();
    // owner and group get rwx, others are left alone
    perms.set_mode(perms.mode() | 0o770);
    fs::set_permissions(path, perms).map_err(|e| Error::io("set permissions on", path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
