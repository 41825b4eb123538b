//! Command-line interface of the `forge` converter.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser};

use crate::convert::{check_distinct_outputs, Job};
use crate::error::{Error, Result};
use crate::options::{ConvertOptions, PaperOrientation};
use crate::scratch::{Context, ScratchDir, DEFAULT_PHP_MEMORY_LIMIT};

/// HTML to PDF Converter
#[derive(Parser, Debug, Clone)]
#[command(name = "forge", about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// INPUT-FILE OUTPUT-FILE, or every input file with --batch
    #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub files: Vec<PathBuf>,

    /// Convert every FILE into --output-dir, reusing one script
    #[arg(short, long, requires = "output_dir")]
    pub batch: bool,

    /// Directory receiving <stem>.pdf for every input (batch mode)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// Don't clean temp files on exit
    #[arg(short, long)]
    pub no_clean: bool,

    /// Limits the amount of memory (in bytes) the interpreter can use
    #[arg(short = 'm', long, value_name = "BYTES", default_value_t = DEFAULT_PHP_MEMORY_LIMIT)]
    pub php_memory_limit: u64,

    /// Load dompdf options from a JSON file; flags below override it
    #[arg(long, value_name = "JSON", value_hint = clap::ValueHint::FilePath)]
    pub options_file: Option<PathBuf>,

    /// Print the effective dompdf options as JSON and exit
    #[arg(long)]
    pub print_options: bool,

    /// Print version and embedded resource information
    #[arg(short = 'v', long)]
    pub version: bool,

    #[command(flatten)]
    pub dompdf: DompdfArgs,
}

/// Dompdf options. Boolean flags accept an optional `true`/`false` value.
#[derive(Args, Debug, Clone, Default)]
#[command(next_help_heading = "Dompdf options")]
pub struct DompdfArgs {
    #[arg(long, alias = "isPhpEnabled", value_name = "BOOL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub php_enabled: Option<bool>,

    #[arg(long, alias = "isRemoteEnabled", value_name = "BOOL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub remote_enabled: Option<bool>,

    #[arg(long, alias = "isPdfAEnabled", value_name = "BOOL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub pdfa_enabled: Option<bool>,

    #[arg(long, alias = "isJavascriptEnabled", value_name = "BOOL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub javascript_enabled: Option<bool>,

    #[arg(long, alias = "isHtml5ParserEnabled", value_name = "BOOL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub html5_parser_enabled: Option<bool>,

    #[arg(long, alias = "isFontSubsettingEnabled", value_name = "BOOL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub font_subsetting_enabled: Option<bool>,

    #[arg(long, alias = "debugPng", value_name = "BOOL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub debug_png: Option<bool>,

    #[arg(long, alias = "debugKeepTemp", value_name = "BOOL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub debug_keep_temp: Option<bool>,

    #[arg(long, alias = "debugCss", value_name = "BOOL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub debug_css: Option<bool>,

    #[arg(long, alias = "debugLayout", value_name = "BOOL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub debug_layout: Option<bool>,

    #[arg(long, alias = "debugLayoutLines", value_name = "BOOL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub debug_layout_lines: Option<bool>,

    #[arg(long, alias = "debugLayoutBlocks", value_name = "BOOL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub debug_layout_blocks: Option<bool>,

    #[arg(long, alias = "debugLayoutInline", value_name = "BOOL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub debug_layout_inline: Option<bool>,

    #[arg(long, alias = "debugLayoutPaddingBox", value_name = "BOOL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub debug_layout_padding_box: Option<bool>,

    /// Image and font DPI [default: 96]
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Font height multiplier [default: 1.1]
    #[arg(long, alias = "fontHeightRatio", value_name = "RATIO")]
    pub font_height_ratio: Option<f32>,

    #[arg(long, alias = "rootDir", value_name = "DIR")]
    pub root_dir: Option<String>,

    #[arg(long, alias = "tempDir", value_name = "DIR")]
    pub temp_dir: Option<String>,

    #[arg(long, alias = "fontDir", value_name = "DIR")]
    pub font_dir: Option<String>,

    #[arg(long, alias = "fontCache", value_name = "DIR")]
    pub font_cache: Option<String>,

    #[arg(long, alias = "logOutputFile", value_name = "FILE")]
    pub log_output_file: Option<String>,

    /// [default: screen]
    #[arg(long, alias = "defaultMediaType", value_name = "TYPE")]
    pub default_media_type: Option<String>,

    /// [default: a4]
    #[arg(long, alias = "defaultPaperSize", value_name = "SIZE")]
    pub default_paper_size: Option<String>,

    /// [default: portrait]
    #[arg(long, alias = "defaultPaperOrientation", value_name = "ORIENTATION")]
    pub default_paper_orientation: Option<PaperOrientation>,

    /// [default: dejavu serif]
    #[arg(long, alias = "defaultFont", value_name = "FONT")]
    pub default_font: Option<String>,

    /// CPDF, PDFLib, GD or auto [default: CPDF]
    #[arg(long, alias = "pdfBackend", value_name = "BACKEND")]
    pub pdf_backend: Option<String>,

    #[arg(long, alias = "pdflibLicense", value_name = "KEY")]
    pub pdflib_license: Option<String>,

    /// Readable directories; repeat or separate with `;` or `,`
    #[arg(long, value_name = "DIRS")]
    pub chroot: Vec<String>,

    /// Hosts remote resources may come from; repeat or separate with `;` or `,`
    #[arg(long, alias = "allowedRemoteHosts", value_name = "HOSTS")]
    pub allowed_remote_hosts: Vec<String>,
}

macro_rules! override_fields {
    ($args:expr, $options:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = $args.$field.clone() {
                $options.$field = value;
            }
        )*
    };
}

macro_rules! override_optional_fields {
    ($args:expr, $options:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = $args.$field.clone() {
                $options.$field = Some(value);
            }
        )*
    };
}

impl DompdfArgs {
    /// Applies every option given on the command line on top of `options`.
    pub fn apply(&self, options: &mut ConvertOptions) {
        override_fields!(self, options, [
            php_enabled,
            remote_enabled,
            pdfa_enabled,
            javascript_enabled,
            html5_parser_enabled,
            font_subsetting_enabled,
            debug_png,
            debug_keep_temp,
            debug_css,
            debug_layout,
            debug_layout_lines,
            debug_layout_blocks,
            debug_layout_inline,
            debug_layout_padding_box,
            dpi,
            font_height_ratio,
            default_media_type,
            default_paper_size,
            default_paper_orientation,
            default_font,
            pdf_backend,
        ]);
        override_optional_fields!(self, options, [
            root_dir,
            temp_dir,
            font_dir,
            font_cache,
            log_output_file,
            pdflib_license,
        ]);
        if !self.chroot.is_empty() {
            options.chroot = self.chroot.clone();
        }
        if !self.allowed_remote_hosts.is_empty() {
            options.allowed_remote_hosts = self.allowed_remote_hosts.clone();
        }
    }
}

impl Cli {
    /// Options file (or defaults) with command-line flags applied.
    pub fn convert_options(&self) -> Result<ConvertOptions> {
        let mut options = match &self.options_file {
            Some(path) => ConvertOptions::load(path)?,
            None => ConvertOptions::default(),
        };
        self.dompdf.apply(&mut options);
        options.validate()?;
        Ok(options)
    }

    /// The documents to convert. Inputs must exist.
    pub fn jobs(&self) -> Result<Vec<Job>> {
        let jobs = if self.batch {
            let out_dir = self
                .output_dir
                .as_deref()
                .ok_or_else(|| Error::config("--batch requires --output-dir"))?;
            if self.files.is_empty() {
                return Err(Error::config("at least one INPUT-FILE is required"));
            }
            let jobs = self
                .files
                .iter()
                .map(|input| Job::into_dir(input, out_dir))
                .collect::<Result<Vec<_>>>()?;
            check_distinct_outputs(&jobs)?;
            jobs
        } else {
            match self.files.as_slice() {
                [input, output] => vec![Job::new(input, output)],
                _ => {
                    return Err(Error::config(
                        "the options 'INPUT-FILE' and 'OUTPUT-FILE' are required",
                    ))
                }
            }
        };

        if let Some(missing) = jobs.iter().find(|job| !job.input.is_file()) {
            return Err(Error::config(format!(
                "file '{}' not found",
                missing.input.display()
            )));
        }
        Ok(jobs)
    }

    /// Run context for the current build's scratch directory.
    pub fn context(&self) -> Context {
        Context {
            scratch: ScratchDir::current(),
            keep_scratch: self.no_clean,
            php_memory_limit: self.php_memory_limit,
        }
    }
}
