//! Document emission: render LaTeX source and convert it with external tools
//!
//! Each export works inside a per-request `TempDir`, so the `.tex` source
//! and compiler byproducts (`.aux`, `.log`, the raw artifact) disappear when
//! the request ends, whether it succeeded or failed. The finished artifact
//! is staged next to the output path and renamed into place, so a previous
//! export is never replaced by a partial file.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, bail};

use crate::config::EquatexConfig;

/// Output document format for an export request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    /// Fixed artifact name, overwritten on repeated export.
    pub fn file_name(self) -> String {
        format!("output_equation.{}", self.extension())
    }
}

/// Render the markup into a minimal LaTeX document with one display-math
/// block. Degenerate OCR output is not validated; an empty string still
/// yields a compilable document with an empty block.
pub fn render_document(markup: &str) -> String {
    format!(
        "\\documentclass{{article}}\n\
         \\usepackage{{amsmath}}\n\
         \\begin{{document}}\n\
         \\[\n\
         {markup}\n\
         \\]\n\
         \\end{{document}}\n"
    )
}

/// External conversion capability: turn a `.tex` source into an artifact
/// inside the scratch directory, returning the artifact path.
///
/// Failure handling and cleanup live in [`export`] and are testable with a
/// stub impl, independent of the actual binaries being installed.
pub trait TexCompiler {
    fn compile(&self, source: &Path, scratch: &Path) -> anyhow::Result<PathBuf>;
}

/// PDF conversion via a TeX compiler (`pdflatex` by default).
pub struct PdfLatex {
    command: String,
}

impl PdfLatex {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl TexCompiler for PdfLatex {
    fn compile(&self, source: &Path, scratch: &Path) -> anyhow::Result<PathBuf> {
        run_tool(
            Command::new(&self.command)
                .arg("-interaction=nonstopmode")
                .arg("-halt-on-error")
                .arg("-output-directory")
                .arg(scratch)
                .arg(source),
            &self.command,
        )?;

        // pdflatex names the artifact after the source stem
        let artifact = source
            .with_extension("pdf")
            .file_name()
            .map(|name| scratch.join(name))
            .context("source path has no file name")?;
        if !artifact.exists() {
            bail!(
                "'{}' reported success but produced no '{}'",
                self.command,
                artifact.display()
            );
        }
        Ok(artifact)
    }
}

/// DOCX conversion via a document converter (`pandoc` by default).
pub struct Pandoc {
    command: String,
}

impl Pandoc {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl TexCompiler for Pandoc {
    fn compile(&self, source: &Path, scratch: &Path) -> anyhow::Result<PathBuf> {
        let artifact = scratch.join("equation.docx");
        run_tool(
            Command::new(&self.command)
                .arg(source)
                .arg("-o")
                .arg(&artifact),
            &self.command,
        )?;
        Ok(artifact)
    }
}

/// Pick the converter for the requested format from the configured commands.
pub fn compiler_for(format: ExportFormat, config: &EquatexConfig) -> Box<dyn TexCompiler> {
    match format {
        ExportFormat::Pdf => Box::new(PdfLatex::new(&config.pdflatex_command)),
        ExportFormat::Docx => Box::new(Pandoc::new(&config.pandoc_command)),
    }
}

/// Render `markup`, convert it with `compiler`, and finalize the artifact
/// at `output`. Scratch files are removed on every path; `output` is only
/// touched after a successful conversion.
pub fn export(markup: &str, compiler: &dyn TexCompiler, output: &Path) -> anyhow::Result<()> {
    let scratch = tempfile::tempdir().context("failed to create export scratch dir")?;
    let source = scratch.path().join("equation.tex");
    std::fs::write(&source, render_document(markup))
        .with_context(|| format!("failed to write LaTeX source '{}'", source.display()))?;

    let artifact = compiler.compile(&source, scratch.path())?;
    persist_artifact(&artifact, output)?;
    log::info!("Saved {}", output.display());
    Ok(())
}

/// Stage the artifact in the output directory and rename it over the output
/// path, so a prior artifact stays intact if anything fails mid-copy.
fn persist_artifact(artifact: &Path, output: &Path) -> anyhow::Result<()> {
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let staged = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to stage artifact in '{}'", dir.display()))?;
    std::fs::copy(artifact, staged.path())
        .with_context(|| format!("failed to copy artifact '{}'", artifact.display()))?;
    staged
        .persist(output)
        .map_err(|e| anyhow::anyhow!("failed to replace '{}': {}", output.display(), e.error))?;
    Ok(())
}

fn run_tool(command: &mut Command, name: &str) -> anyhow::Result<()> {
    log::debug!("Running {:?}", command);
    let output = command
        .output()
        .with_context(|| format!("failed to run '{}'; is it installed?", name))?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "'{}' exited with {}\n{}\n{}",
            name,
            output.status,
            log_tail(&stdout),
            stderr.trim()
        );
    }
    Ok(())
}

/// Last lines of a tool's stdout; pdflatex dumps pages of log and only the
/// end is useful in an error dialog.
fn log_tail(text: &str) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(15);
    lines[start..].join("\n")
}
