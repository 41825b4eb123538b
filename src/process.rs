//! External process invocation.
//!
//! Commands run synchronously with an explicit working directory; there is no
//! shell in between. [`CommandRunner`] is the seam tests use to stand in for
//! the interpreter.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Runs the command and turns anything but exit status 0 into
    /// [`Error::Process`].
    pub fn execute(&self, runner: &dyn CommandRunner) -> Result<()> {
        log::debug!("running {self}");
        let reason = match runner.run(self) {
            Ok(Some(0)) => return Ok(()),
            Ok(Some(code)) => format!("exited with status {code}"),
            Ok(None) => "was terminated by a signal".to_string(),
            Err(e) => format!("could not be started: {e}"),
        };
        Err(Error::Process {
            command: self.to_string(),
            reason,
        })
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        if let Some(dir) = &self.current_dir {
            write!(f, " (in {})", dir.display())?;
        }
        Ok(())
    }
}

/// Runs a command to completion.
pub trait CommandRunner {
    /// Returns the exit code, or `None` when the process had none (killed by
    /// a signal).
    fn run(&self, command: &ExternalCommand) -> io::Result<Option<i32>>;
}

/// Spawns real child processes and waits for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ExternalCommand) -> io::Result<Option<i32>> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }
        let status = cmd.status()?;
        Ok(status.code())
    }
}
