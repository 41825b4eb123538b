//! PHP script templates run by the embedded interpreter.

use crate::options::ConvertOptions;

/// Script converting one staged document.
pub const SINGLE_SCRIPT: &str = "html2pdf.php";
/// Script shared by a batch run; takes `INPUT OUTPUT` as arguments.
pub const BATCH_SCRIPT: &str = "html2pdf_batch.php";
/// Script unpacking the dompdf archive.
pub const UNZIP_SCRIPT: &str = "unzip.php";

/// Where the conversion script finds its input and output file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptIo<'a> {
    /// Names fixed in the script, relative to the scratch directory.
    Files { input: &'a str, output: &'a str },
    /// Names read from `$argv[1]` and `$argv[2]`.
    Arguments,
}

/// Renders the conversion script for `options`.
pub fn conversion_script(options: &ConvertOptions, io: ScriptIo<'_>) -> String {
    let mut out = String::from(
        "<?php\n\
         require_once 'dompdf/autoload.inc.php';\n\
         \n\
         use Dompdf\\Dompdf;\n\
         use Dompdf\\Options;\n\
         \n",
    );

    let (input, output) = match io {
        ScriptIo::Files { input, output } => (php_string(input), php_string(output)),
        ScriptIo::Arguments => {
            out.push_str(
                "if ($argc < 3) {\n    \
                 fwrite(STDERR, \"usage: html2pdf_batch.php INPUT OUTPUT\\n\");\n    \
                 exit(2);\n\
                 }\n\n",
            );
            ("$argv[1]".to_string(), "$argv[2]".to_string())
        }
    };

    out.push_str("$options = new Options();\n");
    let mut set = |name: &str, value: String| {
        out.push_str(&format!("$options->set{name}({value});\n"));
    };

    set("IsPhpEnabled", php_bool(options.php_enabled));
    set("IsRemoteEnabled", php_bool(options.remote_enabled));
    set("IsPdfAEnabled", php_bool(options.pdfa_enabled));
    set("IsJavascriptEnabled", php_bool(options.javascript_enabled));
    set("IsHtml5ParserEnabled", php_bool(options.html5_parser_enabled));
    set("IsFontSubsettingEnabled", php_bool(options.font_subsetting_enabled));
    set("DebugPng", php_bool(options.debug_png));
    set("DebugKeepTemp", php_bool(options.debug_keep_temp));
    set("DebugCss", php_bool(options.debug_css));
    set("DebugLayout", php_bool(options.debug_layout));
    set("DebugLayoutLines", php_bool(options.debug_layout_lines));
    set("DebugLayoutBlocks", php_bool(options.debug_layout_blocks));
    set("DebugLayoutInline", php_bool(options.debug_layout_inline));
    set("DebugLayoutPaddingBox", php_bool(options.debug_layout_padding_box));
    set("Dpi", options.dpi.to_string());
    set("FontHeightRatio", options.font_height_ratio.to_string());

    let optional = [
        ("RootDir", &options.root_dir),
        ("TempDir", &options.temp_dir),
        ("FontDir", &options.font_dir),
        ("FontCache", &options.font_cache),
        ("LogOutputFile", &options.log_output_file),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            set(name, php_string(value));
        }
    }

    set("DefaultMediaType", php_string(&options.default_media_type));
    set("DefaultPaperSize", php_string(&options.default_paper_size));
    set(
        "DefaultPaperOrientation",
        php_string(options.default_paper_orientation.as_str()),
    );
    set("DefaultFont", php_string(&options.default_font));
    set("PdfBackend", php_string(&options.pdf_backend));
    if let Some(license) = &options.pdflib_license {
        set("PdflibLicense", php_string(license));
    }
    if let Some(list) = php_list(&options.chroot) {
        set("Chroot", list);
    }
    if let Some(list) = php_list(&options.allowed_remote_hosts) {
        set("AllowedRemoteHosts", list);
    }

    out.push_str(&format!(
        "\n$dompdf = new Dompdf($options);\n\
         $html = file_get_contents({input});\n\
         if ($html === false) {{\n    \
         exit(1);\n\
         }}\n\
         $dompdf->loadHtml($html);\n\
         $dompdf->render();\n\
         if (file_put_contents({output}, $dompdf->output()) === false) {{\n    \
         exit(1);\n\
         }}\n"
    ));
    out
}

/// Renders the script extracting `archive` into the working directory.
pub fn unzip_script(archive: &str) -> String {
    format!(
        "<?php\n\
         $zip = new ZipArchive;\n\
         if ($zip->open({}) === TRUE) {{\n    \
         $zip->extractTo('.');\n    \
         $zip->close();\n\
         }} else {{\n    \
         exit(1);\n\
         }}\n",
        php_string(archive)
    )
}

fn php_bool(value: bool) -> String {
    String::from(if value { "true" } else { "false" })
}

/// Single-quoted PHP literal; only `\` and `'` need escaping.
fn php_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// PHP array of every entry, each value split on `;` and `,`. `None` when no
/// non-empty entry remains.
fn php_list(values: &[String]) -> Option<String> {
    let items: Vec<String> = values
        .iter()
        .flat_map(|v| v.split([';', ',']))
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(php_string)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(format!("[{}]", items.join(", ")))
    }
}
