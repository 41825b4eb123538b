//! # dompdf-forge – self-contained HTML → PDF converter
//!
//! The binary carries a PHP interpreter and the dompdf library as embedded
//! resources. A conversion goes through these stages:
//!
//! 1. **Embed** – at build time, resource files become generated Rust
//!    sources ([`embed`], also available as the `forge-embed` tool)
//! 2. **Lookup** – the generated table is served by name ([`registry`])
//! 3. **Extract** – resources are written once into a per-build scratch
//!    directory ([`scratch`], [`extract`])
//! 4. **Convert** – a dompdf script is generated ([`options`], [`script`])
//!    and run by the interpreter ([`process`], [`convert`])
//!
//! The `forge` binary wires these together behind the [`cli`] module.

pub mod build_info;
pub mod cli;
pub mod convert;
pub mod embed;
pub mod error;
pub mod extract;
pub mod options;
pub mod process;
pub mod registry;
pub mod scratch;
pub mod script;

// Re-exports for convenience
pub use convert::{Converter, Job};
pub use error::{Error, Result};
pub use extract::Extractor;
pub use options::{ConvertOptions, PaperOrientation};
pub use registry::{Registry, Resource};
pub use scratch::{Context, ScratchDir};
