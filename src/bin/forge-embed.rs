//! forge-embed – turns binary files into Rust sources that embed them.
//!
//! Usage:
//!   forge-embed --output-dir <dir> [--module-path <path>] <file>...
//!
//! Writes `embed_resources.rs` (entry table and `embedded_resource!` macro)
//! and `embed_resources_data.rs` (one byte array per file) into `<dir>`.
//! Warnings and errors go to standard output.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

use dompdf_forge::embed::{self, Encoder, DEFAULT_MODULE_PATH};

/// Generate Rust sources embedding binary files
#[derive(Parser, Debug)]
#[command(name = "forge-embed", version, about, long_about = None)]
struct Args {
    /// Directory receiving the generated sources (must exist)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    output_dir: PathBuf,

    /// Path of the module that will include the definitions, relative to the
    /// crate root
    #[arg(long, default_value = DEFAULT_MODULE_PATH)]
    module_path: String,

    /// Files to embed; later files with an already seen name are dropped
    #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
    inputs: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            println!("Error: {}", e.render());
            return ExitCode::FAILURE;
        }
    };

    let encoder = Encoder::new().with_module_path(args.module_path);
    match embed::encode(&encoder, &args.inputs, &args.output_dir) {
        Ok(report) => {
            for warning in report.warnings() {
                println!("Warning: {warning}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
