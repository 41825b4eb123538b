use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use sha2::{Digest, Sha256};

#[allow(dead_code)]
#[path = "src/embed/codegen.rs"]
mod codegen;

fn main() {
    println!("cargo:rerun-if-changed=src/embed/codegen.rs");
    println!("cargo:rerun-if-env-changed=FORGE_RESOURCE_DIR");
    println!("cargo:rerun-if-env-changed=FORGE_BUILD_ID");
    println!("cargo:rerun-if-env-changed=FORGE_PHP_VERSION");
    println!("cargo:rerun-if-env-changed=FORGE_DOMPDF_VERSION");

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));

    // Resources shipped in the binary. A missing directory gives an empty registry.
    let resource_dir = env::var_os("FORGE_RESOURCE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| crate_dir.join("resources"));
    println!("cargo:rerun-if-changed={}", resource_dir.display());
    let resources = collect_files(&resource_dir);
    generate(&resources, &out_dir.join("resources"), "registry::embedded", true);

    // Test-only registry compiled from the fixtures. The fixtures hold a
    // duplicate name and a sanitization collision; those warnings stay quiet.
    let fixture_dir = crate_dir.join("tests").join("fixtures").join("embed");
    println!("cargo:rerun-if-changed={}", fixture_dir.display());
    let fixtures = collect_files(&fixture_dir);
    generate(&fixtures, &out_dir.join("fixtures"), "registry::fixtures", false);

    let build_id = build_id(&crate_dir, &resources);
    println!("cargo:rustc-env=FORGE_BUILD_ID={build_id}");
}

fn generate(inputs: &[PathBuf], out_dir: &Path, module_path: &str, report_warnings: bool) {
    fs::create_dir_all(out_dir).expect("failed to create generated source directory");
    for input in inputs {
        println!("cargo:rerun-if-changed={}", input.display());
    }

    let report = codegen::Encoder::new()
        .with_module_path(module_path)
        .encode(inputs, out_dir)
        .unwrap_or_else(|e| panic!("failed to embed resources: {e}"));
    if report_warnings {
        for warning in report.warnings() {
            println!("cargo:warning={warning}");
        }
    }
}

/// Regular files under `dir`, each directory's files (sorted) before its
/// subdirectories (sorted). Hidden entries are skipped.
fn collect_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(read_dir) = fs::read_dir(dir) else {
        return files;
    };

    let mut entries: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            !path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'))
        })
        .collect();
    entries.sort();

    let (dirs, plain): (Vec<PathBuf>, Vec<PathBuf>) = entries.into_iter().partition(|p| p.is_dir());
    files.extend(plain.into_iter().filter(|p| p.is_file()));
    for sub in dirs {
        files.extend(collect_files(&sub));
    }
    files
}

/// `FORGE_BUILD_ID` if set, else the short git commit, else a digest of the
/// embedded resources.
fn build_id(crate_dir: &Path, resources: &[PathBuf]) -> String {
    if let Some(id) = env::var("FORGE_BUILD_ID").ok().filter(|id| !id.trim().is_empty()) {
        return dir_safe(id.trim());
    }

    let git_head = crate_dir.join(".git").join("HEAD");
    if git_head.exists() {
        println!("cargo:rerun-if-changed={}", git_head.display());
    }
    let git = Command::new("git")
        .args(["rev-parse", "--short=12", "HEAD"])
        .current_dir(crate_dir)
        .output();
    if let Ok(output) = git {
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if output.status.success() && !hash.is_empty() {
            return dir_safe(&hash);
        }
    }

    let mut hasher = Sha256::new();
    for path in resources {
        hasher.update(path.file_name().map(|n| n.as_encoded_bytes()).unwrap_or_default());
        hasher.update([0]);
        hasher.update(fs::read(path).unwrap_or_default());
    }
    hasher
        .finalize()
        .iter()
        .take(6)
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn dir_safe(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '-' })
        .collect()
}
