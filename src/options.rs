//! Conversion options – the dompdf `Options` a generated script sets.
//!
//! Serialisable so a set of options can be kept in a JSON file and loaded
//! with `--options-file`; fields missing from the file keep their defaults.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Paper orientation for the rendered document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PaperOrientation {
    /// Height > width (default).
    #[default]
    Portrait,
    /// Width > height.
    Landscape,
}

impl PaperOrientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperOrientation::Portrait => "portrait",
            PaperOrientation::Landscape => "landscape",
        }
    }
}

impl fmt::Display for PaperOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub php_enabled: bool,
    pub remote_enabled: bool,
    pub pdfa_enabled: bool,
    pub javascript_enabled: bool,
    pub html5_parser_enabled: bool,
    pub font_subsetting_enabled: bool,

    pub debug_png: bool,
    pub debug_keep_temp: bool,
    pub debug_css: bool,
    pub debug_layout: bool,
    pub debug_layout_lines: bool,
    pub debug_layout_blocks: bool,
    pub debug_layout_inline: bool,
    pub debug_layout_padding_box: bool,

    /// Image and font resolution in dots per inch (default: 96).
    pub dpi: u32,
    /// Multiplier applied to font heights when laying out lines (default: 1.1).
    pub font_height_ratio: f32,

    pub root_dir: Option<String>,
    pub temp_dir: Option<String>,
    pub font_dir: Option<String>,
    pub font_cache: Option<String>,
    pub log_output_file: Option<String>,

    pub default_media_type: String,
    pub default_paper_size: String,
    pub default_paper_orientation: PaperOrientation,
    pub default_font: String,
    /// `CPDF`, `PDFLib`, `GD` or `auto`.
    pub pdf_backend: String,
    pub pdflib_license: Option<String>,

    /// Directories dompdf may read local files from.
    pub chroot: Vec<String>,
    pub allowed_remote_hosts: Vec<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            php_enabled: false,
            remote_enabled: false,
            pdfa_enabled: false,
            javascript_enabled: true,
            html5_parser_enabled: true,
            font_subsetting_enabled: true,
            debug_png: false,
            debug_keep_temp: false,
            debug_css: false,
            debug_layout: false,
            debug_layout_lines: true,
            debug_layout_blocks: true,
            debug_layout_inline: true,
            debug_layout_padding_box: true,
            dpi: 96,
            font_height_ratio: 1.1,
            root_dir: None,
            temp_dir: None,
            font_dir: None,
            font_cache: None,
            log_output_file: None,
            default_media_type: "screen".to_string(),
            default_paper_size: "a4".to_string(),
            default_paper_orientation: PaperOrientation::Portrait,
            default_font: "dejavu serif".to_string(),
            pdf_backend: "CPDF".to_string(),
            pdflib_license: None,
            chroot: Vec::new(),
            allowed_remote_hosts: Vec::new(),
        }
    }
}

impl ConvertOptions {
    /// Serialise to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::config(format!("can't serialise options: {e}")))
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads options from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io("read", path, e))?;
        Self::from_json(&text).map_err(|source| Error::Options {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rejects values the script template cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(Error::config("dpi must be greater than zero"));
        }
        if !(self.font_height_ratio.is_finite() && self.font_height_ratio > 0.0) {
            return Err(Error::config(format!(
                "font height ratio must be a positive number, got {}",
                self.font_height_ratio
            )));
        }
        Ok(())
    }
}
