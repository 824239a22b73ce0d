//! Configuration persistence for equatex settings

use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::emit::ExportFormat;

/// Where exported documents are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SaveLocation {
    #[default]
    WorkingDir,
    Documents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, CosmicConfigEntry)]
#[version = 1]
pub struct EquatexConfig {
    /// Where to write exported documents
    pub save_location: SaveLocation,
    /// Command invoked for image-to-LaTeX recognition
    pub pix2tex_command: String,
    /// Command invoked to compile LaTeX to PDF
    pub pdflatex_command: String,
    /// Command invoked to convert LaTeX to DOCX
    pub pandoc_command: String,
}

impl EquatexConfig {
    /// Configuration ID for cosmic-config
    pub const ID: &'static str = "io.github.equatex.equatex";

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        match cosmic_config::Config::new(Self::ID, Self::VERSION) {
            Ok(config) => match Self::get_entry(&config) {
                Ok(entry) => entry,
                Err((errs, entry)) => {
                    log::warn!("Error loading config, using defaults: {:?}", errs);
                    entry
                }
            },
            Err(err) => {
                log::warn!("Could not create config handler: {:?}", err);
                Self::default()
            }
        }
    }

    /// Directory exported artifacts are written to
    pub fn output_dir(&self) -> PathBuf {
        match self.save_location {
            SaveLocation::WorkingDir => PathBuf::from("."),
            SaveLocation::Documents => dirs::document_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join("Documents")))
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    /// Fixed-name output path for the requested format
    pub fn output_path(&self, format: ExportFormat) -> PathBuf {
        self.output_dir().join(format.file_name())
    }
}

impl Default for EquatexConfig {
    fn default() -> Self {
        Self {
            // The original tool wrote next to the process working directory
            save_location: SaveLocation::WorkingDir,
            pix2tex_command: "pix2tex".to_string(),
            pdflatex_command: "pdflatex".to_string(),
            pandoc_command: "pandoc".to_string(),
        }
    }
}
