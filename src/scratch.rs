//! Scratch directory and the per-run context threaded through extraction
//! and conversion.

use std::fs;
use std::path::{Path, PathBuf};

use crate::build_info::BUILD_ID;
use crate::error::{Error, Result};

/// Prefix of the scratch directory name.
pub const APP_PREFIX: &str = "dompdf-forge";

/// Default `memory_limit` written to the interpreter's `php.ini` (256 MiB).
pub const DEFAULT_PHP_MEMORY_LIMIT: u64 = 268_435_456;

/// Per-build working directory: `<temp root>/<prefix>_<build id>`.
///
/// Different builds never share a directory; repeated runs of one build reuse
/// it. Two concurrent runs of the same build are not coordinated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn for_build(temp_root: impl AsRef<Path>, prefix: &str, build_id: &str) -> Self {
        Self {
            path: temp_root.as_ref().join(format!("{prefix}_{build_id}")),
        }
    }

    /// Scratch directory of the running build under the system temp root.
    pub fn current() -> Self {
        Self::for_build(std::env::temp_dir(), APP_PREFIX, BUILD_ID)
    }

    /// Uses `path` as-is.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }

    /// Creates the directory if it does not exist yet.
    pub fn ensure(&self) -> Result<()> {
        if self.path.is_dir() {
            return Ok(());
        }
        log::debug!("creating scratch directory {}", self.path.display());
        fs::create_dir_all(&self.path).map_err(|e| Error::io("create directory", &self.path, e))
    }

    /// Deletes the directory and everything in it; missing is fine.
    pub fn remove(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        log::debug!("removing scratch directory {}", self.path.display());
        fs::remove_dir_all(&self.path).map_err(|e| Error::io("remove directory", &self.path, e))
    }
}

/// Settings shared by every step of one run.
#[derive(Debug, Clone)]
pub struct Context {
    pub scratch: ScratchDir,
    /// Keep the scratch directory when the run ends.
    pub keep_scratch: bool,
    /// Bytes written as `memory_limit` into `php.ini`.
    pub php_memory_limit: u64,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(ScratchDir::current())
    }
}

impl Context {
    pub fn new(scratch: ScratchDir) -> Self {
        Self {
            scratch,
            keep_scratch: false,
            php_memory_limit: DEFAULT_PHP_MEMORY_LIMIT,
        }
    }

    /// Removes the scratch directory unless it should be kept.
    pub fn finish(&self) -> Result<()> {
        if self.keep_scratch {
            log::info!("keeping scratch directory {}", self.scratch.path().display());
            return Ok(());
        }
        self.scratch.remove()
    }
}
