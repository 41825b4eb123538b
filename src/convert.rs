//! Conversion driver – stages documents in the scratch directory, runs the
//! generated script with the embedded interpreter and copies the PDFs out.
//!
//! Every document is converted by one blocking child process; batch runs go
//! strictly one file after another and stop at the first failure.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::extract::INTERPRETER;
use crate::options::ConvertOptions;
use crate::process::{CommandRunner, ExternalCommand};
use crate::scratch::Context;
use crate::script::{conversion_script, ScriptIo, BATCH_SCRIPT, SINGLE_SCRIPT};

/// One document to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Job {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Converts `input` to `<out_dir>/<input stem>.pdf`.
    pub fn into_dir(input: impl Into<PathBuf>, out_dir: &Path) -> Result<Self> {
        let input = input.into();
        let stem = input
            .file_stem()
            .ok_or_else(|| Error::config(format!("`{}` has no file name", input.display())))?;
        let mut name = stem.to_os_string();
        name.push(".pdf");
        let output = out_dir.join(name);
        Ok(Self { input, output })
    }
}

/// Name every input is staged under inside the scratch directory.
pub const STAGED_INPUT: &str = "input.html";
/// Name the script writes its PDF to inside the scratch directory.
pub const STAGED_OUTPUT: &str = "output.pdf";

/// Fails when two jobs would write the same output file.
pub fn check_distinct_outputs(jobs: &[Job]) -> Result<()> {
    let mut seen: HashMap<&Path, &Path> = HashMap::with_capacity(jobs.len());
    for job in jobs {
        if let Some(first) = seen.insert(&job.output, &job.input) {
            return Err(Error::config(format!(
                "`{}` and `{}` would both be written to `{}`",
                first.display(),
                job.input.display(),
                job.output.display()
            )));
        }
    }
    Ok(())
}

pub struct Converter<'a> {
    context: &'a Context,
    options: &'a ConvertOptions,
    runner: &'a dyn CommandRunner,
}

impl<'a> Converter<'a> {
    pub fn new(
        context: &'a Context,
        options: &'a ConvertOptions,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            context,
            options,
            runner,
        }
    }

    /// Converts one document with its own script. Returns the PDF size in
    /// bytes.
    pub fn convert(&self, job: &Job) -> Result<u64> {
        self.options.validate()?;
        self.stage(job)?;

        let script = conversion_script(
            self.options,
            ScriptIo::Files {
                input: STAGED_INPUT,
                output: STAGED_OUTPUT,
            },
        );
        self.write_script(SINGLE_SCRIPT, &script)?;

        self.php()
            .arg(SINGLE_SCRIPT)
            .execute(self.runner)?;
        self.collect(job, SINGLE_SCRIPT)
    }

    /// Converts every job with one shared script, sequentially. Returns the
    /// PDF sizes in job order. Jobs sharing an output path are rejected
    /// before anything runs.
    pub fn convert_batch(&self, jobs: &[Job]) -> Result<Vec<u64>> {
        self.options.validate()?;
        check_distinct_outputs(jobs)?;
        let script = conversion_script(self.options, ScriptIo::Arguments);
        self.write_script(BATCH_SCRIPT, &script)?;

        let mut sizes = Vec::with_capacity(jobs.len());
        for (i, job) in jobs.iter().enumerate() {
            log::info!(
                "[{}/{}] converting {}",
                i + 1,
                jobs.len(),
                job.input.display()
            );
            self.stage(job)?;
            self.php()
                .args([BATCH_SCRIPT, STAGED_INPUT, STAGED_OUTPUT])
                .execute(self.runner)?;
            sizes.push(self.collect(job, BATCH_SCRIPT)?);
        }
        Ok(sizes)
    }

    fn php(&self) -> ExternalCommand {
        let scratch = &self.context.scratch;
        ExternalCommand::new(scratch.join(INTERPRETER))
            .args(["-c", "."])
            .current_dir(scratch.path())
    }

    fn write_script(&self, name: &str, script: &str) -> Result<()> {
        let path = self.context.scratch.join(name);
        log::debug!("writing {}", path.display());
        fs::write(&path, script).map_err(|e| Error::io("write to", path, e))
    }

    /// Copies the input into the scratch directory under [`STAGED_INPUT`]
    /// and clears any output left by an earlier run. User file names never
    /// reach the scratch directory, so runtime files can't be overwritten.
    fn stage(&self, job: &Job) -> Result<()> {
        if !job.input.is_file() {
            return Err(Error::config(format!(
                "file `{}` not found",
                job.input.display()
            )));
        }

        let scratch = &self.context.scratch;
        let staged_input = scratch.join(STAGED_INPUT);
        fs::copy(&job.input, &staged_input).map_err(|e| Error::io("write to", staged_input, e))?;

        let staged_output = scratch.join(STAGED_OUTPUT);
        if staged_output.exists() {
            fs::remove_file(&staged_output).map_err(|e| Error::io("remove", staged_output, e))?;
        }
        Ok(())
    }

    fn collect(&self, job: &Job, script: &str) -> Result<u64> {
        let produced = self.context.scratch.join(STAGED_OUTPUT);
        if !produced.is_file() {
            return Err(Error::Process {
                command: script.to_string(),
                reason: format!(
                    "finished without writing `{}`",
                    produced.display()
                ),
            });
        }

        if let Some(parent) = job.output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
            }
        }
        let size = fs::copy(&produced, &job.output)
            .map_err(|e| Error::io("write to", &job.output, e))?;
        log::info!("wrote {} ({size} bytes)", job.output.display());
        Ok(size)
    }
}
