//! forge – command-line HTML → PDF converter.
//!
//! Usage:
//!   forge [OPTIONS] <input.html> <output.pdf>
//!   forge [OPTIONS] --batch --output-dir <dir> <input.html>...
//!
//! The PHP interpreter and dompdf are embedded in the binary and unpacked
//! into a per-build scratch directory on first use.

use std::process;

use clap::Parser;

use dompdf_forge::build_info::version_report;
use dompdf_forge::cli::Cli;
use dompdf_forge::convert::Converter;
use dompdf_forge::extract::Extractor;
use dompdf_forge::process::SystemRunner;
use dompdf_forge::registry::Registry;
use dompdf_forge::{Context, ConvertOptions, Job, Result};

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let registry = Registry::embedded();
    if cli.version {
        print!("{}", version_report(registry));
        return Ok(());
    }

    let options = cli.convert_options()?;
    if cli.print_options {
        println!("{}", options.to_json()?);
        return Ok(());
    }

    let jobs = cli.jobs()?;
    let context = cli.context();

    // The scratch directory goes away on every exit path unless --no-clean.
    let converted = convert(cli, &context, registry, &options, &jobs);
    let cleaned = context.finish();
    converted.and(cleaned)
}

fn convert(
    cli: &Cli,
    context: &Context,
    registry: &Registry,
    options: &ConvertOptions,
    jobs: &[Job],
) -> Result<()> {
    let runner = SystemRunner;

    let extracted = Extractor::new(registry, context, &runner).ensure_extracted()?;
    if !extracted.is_empty() {
        log::info!(
            "unpacked runtime into {}",
            context.scratch.path().display()
        );
    }

    let converter = Converter::new(context, options, &runner);
    let sizes = if cli.batch {
        converter.convert_batch(jobs)?
    } else {
        vec![converter.convert(&jobs[0])?]
    };
    for (job, size) in jobs.iter().zip(sizes) {
        eprintln!("Wrote '{}' ({size} bytes)", job.output.display());
    }
    Ok(())
}
