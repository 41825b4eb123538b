//! Integration tests for dompdf-forge.
//!
//! These tests validate:
//! - `forge-embed` writes both generated files and reports duplicates
//! - `forge` option handling, version output and input errors
//! - Single and batch conversion against a stand-in interpreter
//! - Scratch directory naming

use std::cell::RefCell;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use dompdf_forge::embed::{DECLARATIONS_FILE, DEFINITIONS_FILE};
use dompdf_forge::extract::INTERPRETER;
use dompdf_forge::process::{CommandRunner, ExternalCommand};
use dompdf_forge::scratch::APP_PREFIX;
use dompdf_forge::script::{BATCH_SCRIPT, SINGLE_SCRIPT};
use dompdf_forge::{
    Context, ConvertOptions, Converter, Error, Job, PaperOrientation, Registry, ScratchDir,
};

// =====================================================================
// Helper
// =====================================================================

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("embed")
        .join(name)
}

fn forge_embed(args: &[&OsStr]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_forge-embed"))
        .args(args)
        .output()
        .expect("run forge-embed")
}

fn forge(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_forge"))
        .args(args)
        .output()
        .expect("run forge")
}

/// Stands in for the interpreter: reads the file names the way the generated
/// scripts would and writes a fake PDF. Inputs containing `FAIL` exit with 3.
#[derive(Default)]
struct FakeDompdf {
    calls: RefCell<Vec<ExternalCommand>>,
}

impl FakeDompdf {
    fn quoted_after<'a>(script: &'a str, marker: &str) -> &'a str {
        let start = script.find(marker).expect("marker in script") + marker.len();
        let rest = &script[start..];
        &rest[..rest.find('\'').expect("closing quote")]
    }
}

impl CommandRunner for FakeDompdf {
    fn run(&self, command: &ExternalCommand) -> io::Result<Option<i32>> {
        self.calls.borrow_mut().push(command.clone());
        let dir = command.get_current_dir().expect("working directory");
        let args: Vec<String> = command
            .get_args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let (input, output) = match args.as_slice() {
            [c, dot, script] if c == "-c" && dot == "." && script == SINGLE_SCRIPT => {
                let script = fs::read_to_string(dir.join(SINGLE_SCRIPT))?;
                (
                    Self::quoted_after(&script, "file_get_contents('").to_string(),
                    Self::quoted_after(&script, "file_put_contents('").to_string(),
                )
            }
            [c, dot, script, input, output] if c == "-c" && dot == "." && script == BATCH_SCRIPT => {
                assert!(dir.join(BATCH_SCRIPT).is_file());
                (input.clone(), output.clone())
            }
            _ => return Ok(Some(64)),
        };

        let html = fs::read_to_string(dir.join(&input))?;
        if html.contains("FAIL") {
            return Ok(Some(3));
        }
        fs::write(dir.join(output), format!("%PDF-{html}"))?;
        Ok(Some(0))
    }
}

struct Workspace {
    temp: tempfile::TempDir,
    context: Context,
}

impl Workspace {
    fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let context = Context::new(ScratchDir::at(temp.path().join("scratch")));
        context.scratch.ensure().unwrap();
        Self { temp, context }
    }

    fn input(&self, name: &str, html: &str) -> PathBuf {
        let path = self.temp.path().join("in").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, html).unwrap();
        path
    }

    fn out(&self) -> PathBuf {
        self.temp.path().join("out")
    }
}

// =====================================================================
// forge-embed tests
// =====================================================================

#[test]
fn embed_writes_declarations_and_definitions() {
    let out = tempfile::tempdir().unwrap();
    let a = fixture("a.bin");
    let b = fixture("b.bin");
    let output = forge_embed(&[
        OsStr::new("--output-dir"),
        out.path().as_os_str(),
        a.as_os_str(),
        b.as_os_str(),
    ]);
    assert!(output.status.success(), "{output:?}");
    assert!(output.stdout.is_empty());

    let decls = fs::read_to_string(out.path().join(DECLARATIONS_FILE)).unwrap();
    assert!(decls.contains("(\"a.bin\", &resource_a_bin),"));
    assert!(decls.contains("(\"b.bin\", &resource_b_bin),"));
    assert!(decls.contains("$crate::embedded::resource_a_bin.as_slice()"));
    assert!(!decls.contains("c.bin"));

    let defs = fs::read_to_string(out.path().join(DEFINITIONS_FILE)).unwrap();
    assert!(defs.contains("pub static resource_a_bin: [u8; 3] = [\n    0o000, 0o377, 0o177,\n];"));
    assert!(defs.contains("pub static resource_b_bin: [u8; 0] = [\n];"));
}

#[test]
fn embed_uses_module_path() {
    let out = tempfile::tempdir().unwrap();
    let a = fixture("a.bin");
    let output = forge_embed(&[
        OsStr::new("-o"),
        out.path().as_os_str(),
        OsStr::new("--module-path"),
        OsStr::new("assets::generated"),
        a.as_os_str(),
    ]);
    assert!(output.status.success(), "{output:?}");
    let decls = fs::read_to_string(out.path().join(DECLARATIONS_FILE)).unwrap();
    assert!(decls.contains("$crate::assets::generated::resource_a_bin.as_slice()"));
}

#[test]
fn embed_warns_about_duplicate_names() {
    let out = tempfile::tempdir().unwrap();
    let a = fixture("a.bin");
    let shadow = fixture("shadow/a.bin");
    let output = forge_embed(&[
        OsStr::new("--output-dir"),
        out.path().as_os_str(),
        a.as_os_str(),
        shadow.as_os_str(),
    ]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Warning:"), "{stdout}");
    assert!(stdout.contains("a.bin"), "{stdout}");

    let defs = fs::read_to_string(out.path().join(DEFINITIONS_FILE)).unwrap();
    assert_eq!(defs.matches("pub static resource_a_bin").count(), 1);
    assert!(defs.contains("[u8; 3]"));
}

#[test]
fn embed_reports_each_duplicate_once() {
    let out = tempfile::tempdir().unwrap();
    let a = fixture("a.bin");
    let shadow = fixture("shadow/a.bin");
    let output = Command::new(env!("CARGO_BIN_EXE_forge-embed"))
        .env("RUST_LOG", "warn")
        .arg("--output-dir")
        .arg(out.path())
        .arg(&a)
        .arg(&shadow)
        .output()
        .expect("run forge-embed");
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let skipped = shadow.display().to_string();
    assert_eq!(stdout.matches(skipped.as_str()).count(), 1, "{stdout}");
    assert_eq!(stderr.matches(skipped.as_str()).count(), 0, "{stderr}");
}

#[test]
fn embed_fails_without_output_dir() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("missing");
    let a = fixture("a.bin");
    let output = forge_embed(&[OsStr::new("--output-dir"), missing.as_os_str(), a.as_os_str()]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Error:"), "{stdout}");
}

#[test]
fn embed_fails_on_unreadable_input() {
    let out = tempfile::tempdir().unwrap();
    let missing = fixture("c.bin");
    let output = forge_embed(&[OsStr::new("--output-dir"), out.path().as_os_str(), missing.as_os_str()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Error:"));
}

// =====================================================================
// forge CLI tests
// =====================================================================

#[test]
fn print_options_reflects_flags() {
    let output = forge(&["--print-options", "--dpi", "120", "--default-paper-orientation", "landscape"]);
    assert!(output.status.success(), "{output:?}");

    let options = ConvertOptions::from_json(&String::from_utf8_lossy(&output.stdout)).unwrap();
    assert_eq!(options.dpi, 120);
    assert_eq!(options.default_paper_orientation, PaperOrientation::Landscape);
    assert_eq!(options.default_font, "dejavu serif");
}

#[test]
fn version_reports_build_id() {
    let output = forge(&["--version"]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("HTML to PDF Converter "), "{stdout}");
    assert!(stdout.contains(&format!("build id: {}", dompdf_forge::build_info::BUILD_ID)));
}

#[test]
fn missing_input_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("nope.html");
    let output_pdf = temp.path().join("nope.pdf");
    let output = forge(&[input.to_str().unwrap(), output_pdf.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "{stderr}");
    assert!(stderr.contains("not found"), "{stderr}");
    assert!(!output_pdf.exists());
}

#[test]
fn bad_options_file_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let options = temp.path().join("options.json");
    fs::write(&options, "not json").unwrap();
    let output = forge(&["--print-options", "--options-file", options.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid options file"));
}

// =====================================================================
// Conversion tests
// =====================================================================

#[test]
fn single_conversion_copies_pdf_out() {
    let ws = Workspace::new();
    let input = ws.input("report.html", "<h1>Report</h1>");
    let output = ws.out().join("nested").join("report.pdf");
    let options = ConvertOptions::default();
    let runner = FakeDompdf::default();

    let size = Converter::new(&ws.context, &options, &runner)
        .convert(&Job::new(&input, &output))
        .unwrap();

    let pdf = fs::read_to_string(&output).unwrap();
    assert_eq!(pdf, "%PDF-<h1>Report</h1>");
    assert_eq!(size, pdf.len() as u64);

    let calls = runner.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].get_current_dir(), Some(ws.context.scratch.path()));
    let script = fs::read_to_string(ws.context.scratch.join(SINGLE_SCRIPT)).unwrap();
    assert!(script.contains("$options->setDpi(96);"));
}

#[test]
fn single_conversion_with_same_file_names() {
    let ws = Workspace::new();
    let input = ws.input("page", "same");
    let output = ws.out().join("page");
    let runner = FakeDompdf::default();
    let options = ConvertOptions::default();

    Converter::new(&ws.context, &options, &runner)
        .convert(&Job::new(&input, &output))
        .unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "%PDF-same");
    assert_eq!(fs::read_to_string(&input).unwrap(), "same");
}

#[test]
fn failed_conversion_is_a_process_error() {
    let ws = Workspace::new();
    let input = ws.input("bad.html", "FAIL");
    let output = ws.out().join("bad.pdf");
    let runner = FakeDompdf::default();
    let options = ConvertOptions::default();

    let err = Converter::new(&ws.context, &options, &runner)
        .convert(&Job::new(&input, &output))
        .unwrap_err();
    match err {
        Error::Process { command, reason } => {
            assert!(command.contains(SINGLE_SCRIPT), "{command}");
            assert_eq!(reason, "exited with status 3");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!output.exists());
}

#[test]
fn missing_input_is_a_config_error() {
    let ws = Workspace::new();
    let runner = FakeDompdf::default();
    let options = ConvertOptions::default();
    let err = Converter::new(&ws.context, &options, &runner)
        .convert(&Job::new(ws.temp.path().join("gone.html"), ws.out().join("gone.pdf")))
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("not found"));
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn batch_conversion_shares_one_script() {
    let ws = Workspace::new();
    let out_dir = ws.out();
    let jobs: Vec<Job> = [("a.html", "A"), ("b.htm", "B"), ("c", "C")]
        .into_iter()
        .map(|(name, html)| Job::into_dir(ws.input(name, html), &out_dir).unwrap())
        .collect();
    let options = ConvertOptions {
        default_paper_orientation: PaperOrientation::Landscape,
        ..ConvertOptions::default()
    };
    let runner = FakeDompdf::default();

    let sizes = Converter::new(&ws.context, &options, &runner)
        .convert_batch(&jobs)
        .unwrap();

    assert_eq!(sizes, vec![6, 6, 6]);
    for (name, html) in [("a.pdf", "A"), ("b.pdf", "B"), ("c.pdf", "C")] {
        assert_eq!(fs::read_to_string(out_dir.join(name)).unwrap(), format!("%PDF-{html}"));
    }
    assert_eq!(runner.calls.borrow().len(), 3);
    let script = fs::read_to_string(ws.context.scratch.join(BATCH_SCRIPT)).unwrap();
    assert!(script.contains("$options->setDefaultPaperOrientation('landscape');"));
    assert!(script.contains("$argv[1]"));
}

#[test]
fn batch_conversion_stops_at_first_failure() {
    let ws = Workspace::new();
    let out_dir = ws.out();
    let jobs: Vec<Job> = [("one.html", "1"), ("two.html", "FAIL"), ("three.html", "3")]
        .into_iter()
        .map(|(name, html)| Job::into_dir(ws.input(name, html), &out_dir).unwrap())
        .collect();
    let runner = FakeDompdf::default();
    let options = ConvertOptions::default();

    let err = Converter::new(&ws.context, &options, &runner)
        .convert_batch(&jobs)
        .unwrap_err();
    assert!(matches!(err, Error::Process { .. }));
    assert!(out_dir.join("one.pdf").is_file());
    assert!(!out_dir.join("two.pdf").exists());
    assert!(!out_dir.join("three.pdf").exists());
    assert_eq!(runner.calls.borrow().len(), 2);
}

#[test]
fn file_named_like_the_interpreter_leaves_runtime_alone() {
    let ws = Workspace::new();
    let interpreter = ws.context.scratch.join(INTERPRETER);
    fs::write(&interpreter, "INTERPRETER-BINARY").unwrap();
    let options = ConvertOptions::default();
    let runner = FakeDompdf::default();
    let converter = Converter::new(&ws.context, &options, &runner);

    let input = ws.input(INTERPRETER, "<p>user html</p>");
    let output = ws.out().join("from_input.pdf");
    converter.convert(&Job::new(&input, &output)).unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "%PDF-<p>user html</p>");
    assert_eq!(fs::read_to_string(&interpreter).unwrap(), "INTERPRETER-BINARY");

    let input = ws.input("x.html", "x");
    let output = ws.out().join(INTERPRETER);
    converter.convert(&Job::new(&input, &output)).unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "%PDF-x");
    assert_eq!(fs::read_to_string(&interpreter).unwrap(), "INTERPRETER-BINARY");
}

#[test]
fn batch_conversion_rejects_shared_outputs() {
    let ws = Workspace::new();
    let out_dir = ws.out();
    let jobs = vec![
        Job::into_dir(ws.input("a/x.html", "FIRST"), &out_dir).unwrap(),
        Job::into_dir(ws.input("b/x.htm", "SECOND"), &out_dir).unwrap(),
    ];
    let runner = FakeDompdf::default();
    let options = ConvertOptions::default();

    let err = Converter::new(&ws.context, &options, &runner)
        .convert_batch(&jobs)
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)), "{err}");
    assert!(runner.calls.borrow().is_empty());
    assert!(!out_dir.join("x.pdf").exists());
}

#[test]
fn invalid_options_are_rejected_before_running() {
    let ws = Workspace::new();
    let input = ws.input("x.html", "x");
    let runner = FakeDompdf::default();
    let options = ConvertOptions {
        dpi: 0,
        ..ConvertOptions::default()
    };
    let result = Converter::new(&ws.context, &options, &runner).convert(&Job::new(&input, ws.out().join("x.pdf")));
    assert!(matches!(result, Err(Error::Config(_))));
    assert!(runner.calls.borrow().is_empty());
}

// =====================================================================
// Registry and scratch tests
// =====================================================================

#[test]
fn embedded_registry_rejects_unknown_names() {
    let registry = Registry::embedded();
    let err = registry.lookup("c.bin").unwrap_err();
    assert!(matches!(err, Error::UnknownResource(ref name) if name == "c.bin"));
    assert_eq!(err.to_string(), "embedded resource not found: c.bin");
}

#[test]
fn scratch_dir_is_named_after_build() {
    let scratch = ScratchDir::for_build("/var/tmp", APP_PREFIX, "abc123");
    assert_eq!(scratch.path(), Path::new("/var/tmp/dompdf-forge_abc123"));
}

#[test]
fn finish_respects_keep_scratch() {
    let ws = Workspace::new();
    fs::write(ws.context.scratch.join("leftover"), "x").unwrap();

    let mut keep = ws.context.clone();
    keep.keep_scratch = true;
    keep.finish().unwrap();
    assert!(ws.context.scratch.path().is_dir());

    ws.context.finish().unwrap();
    assert!(!ws.context.scratch.path().exists());
    // Removing twice is fine.
    ws.context.finish().unwrap();
}
