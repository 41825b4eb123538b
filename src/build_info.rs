//! Build metadata baked in by `build.rs`.

use std::fmt::Write as _;

use crate::registry::Registry;

/// Identifies this build; namespaces the scratch directory.
pub const BUILD_ID: &str = env!("FORGE_BUILD_ID");

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the embedded interpreter, when the packager provided it.
pub const PHP_VERSION: Option<&str> = option_env!("FORGE_PHP_VERSION");

/// Version of the embedded dompdf archive, when the packager provided it.
pub const DOMPDF_VERSION: Option<&str> = option_env!("FORGE_DOMPDF_VERSION");

/// Multi-line text printed by `forge --version`.
pub fn version_report(registry: &Registry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "HTML to PDF Converter {VERSION}");
    let _ = writeln!(out, "build id: {BUILD_ID}");
    if let Some(php) = PHP_VERSION {
        let _ = writeln!(out, "php-cli v{php}");
    }
    if let Some(dompdf) = DOMPDF_VERSION {
        let _ = writeln!(out, "dompdf v{dompdf}");
    }
    if registry.is_empty() {
        out.push_str("embedded resources: none\n");
    } else {
        let _ = writeln!(
            out,
            "embedded resources ({} bytes):",
            registry.total_size()
        );
        for resource in registry.iter() {
            let _ = writeln!(out, "  {} ({} bytes)", resource.name(), resource.len());
        }
    }
    out
}
