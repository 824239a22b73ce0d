//! Equation OCR module wrapping the pix2tex command-line model

use std::path::Path;
use std::process::Command;

use anyhow::{Context, bail};
use image::RgbImage;

/// Image-to-LaTeX recognition capability.
///
/// The model is an opaque dependency: one synchronous, seconds-scale call
/// per export, no caching and no retries. The trait seam lets the export
/// flow run against the real command or a test stub.
pub trait LatexOcr {
    fn recognize(&self, image: &RgbImage) -> anyhow::Result<String>;
}

/// Recognizer backed by the `pix2tex` CLI installed on the system.
pub struct Pix2TexCli {
    command: String,
}

impl Pix2TexCli {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl LatexOcr for Pix2TexCli {
    fn recognize(&self, image: &RgbImage) -> anyhow::Result<String> {
        log::info!(
            "Running {} on {}x{} image...",
            self.command,
            image.width(),
            image.height()
        );

        // The CLI reads from disk, so hand it a scratch PNG.
        let scratch = tempfile::tempdir().context("failed to create recognition scratch dir")?;
        let png = scratch.path().join("equation.png");
        image
            .save(&png)
            .with_context(|| format!("failed to write scratch image '{}'", png.display()))?;

        let output = Command::new(&self.command)
            .arg(&png)
            .output()
            .with_context(|| format!("failed to run '{}'; is it installed?", self.command))?;

        if !output.status.success() {
            bail!(
                "'{}' exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let prediction = parse_prediction(&String::from_utf8_lossy(&output.stdout), &png);
        log::info!("Extracted LaTeX: {}", prediction);
        Ok(prediction)
    }
}

/// Extract the prediction from CLI stdout.
///
/// pix2tex echoes the input path before the prediction
/// (`/tmp/xyz/equation.png: \frac{1}{2}`), so strip it when present.
fn parse_prediction(stdout: &str, image_path: &Path) -> String {
    let text = stdout.trim();
    let prefix = format!("{}:", image_path.display());
    match text.strip_prefix(&prefix) {
        Some(rest) => rest.trim().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prediction_strips_path_prefix() {
        let path = Path::new("/tmp/work/equation.png");
        assert_eq!(
            parse_prediction("/tmp/work/equation.png: \\frac{1}{2}\n", path),
            "\\frac{1}{2}"
        );
    }

    #[test]
    fn test_parse_prediction_bare_output() {
        let path = Path::new("/tmp/work/equation.png");
        assert_eq!(
            parse_prediction("x^2 + y^2 = z^2\n", path),
            "x^2 + y^2 = z^2"
        );
    }

    #[test]
    fn test_parse_prediction_empty_output() {
        let path = Path::new("/tmp/work/equation.png");
        assert_eq!(parse_prediction("\n", path), "");
        assert_eq!(parse_prediction("/tmp/work/equation.png:\n", path), "");
    }
}
