//! Configuration for the receipt processing service.
//!
//! Settings come from an optional TOML file with per-field defaults;
//! the server and CLI paths share one `Settings` value for the job's
//! lifetime.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default fixed cell box: 2.8 x 3.5 inches at 150 dpi.
pub const DEFAULT_CELL_WIDTH_PX: u32 = 420;
pub const DEFAULT_CELL_HEIGHT_PX: u32 = 525;

/// Runtime settings for uploads, output, OCR, and layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding per-job upload subdirectories.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Directory where finished documents are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Tesseract language code.
    #[serde(default = "default_language")]
    pub ocr_language: String,
    /// Maximum number of jobs processed concurrently; further
    /// submissions queue for a worker permit.
    #[serde(default = "default_max_jobs")]
    pub max_concurrent_jobs: usize,
    /// Target cell width in pixels for page-grid images.
    #[serde(default = "default_cell_width")]
    pub cell_width_px: u32,
    /// Target cell height in pixels for page-grid images.
    #[serde(default = "default_cell_height")]
    pub cell_height_px: u32,
    /// Letterbox padding color for normalized cells (RGB).
    #[serde(default = "default_padding")]
    pub padding_color: [u8; 3],
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("temp_uploads")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_max_jobs() -> usize {
    4
}

fn default_cell_width() -> u32 {
    DEFAULT_CELL_WIDTH_PX
}

fn default_cell_height() -> u32 {
    DEFAULT_CELL_HEIGHT_PX
}

fn default_padding() -> [u8; 3] {
    [255, 255, 255]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            output_dir: default_output_dir(),
            ocr_language: default_language(),
            max_concurrent_jobs: default_max_jobs(),
            cell_width_px: default_cell_width(),
            cell_height_px: default_cell_height(),
            padding_color: default_padding(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let settings = match path {
            Some(p) => {
                let raw = fs::read_to_string(p)
                    .map_err(|e| anyhow::anyhow!("cannot read config {}: {}", p.display(), e))?;
                toml::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("invalid config {}: {}", p.display(), e))?
            }
            None => Settings::default(),
        };
        Ok(settings)
    }

    /// Create the upload and output directories if missing.
    pub fn ensure_dirs(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.upload_dir)?;
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_cell_box() {
        let settings = Settings::default();
        assert_eq!(settings.cell_width_px, 420);
        assert_eq!(settings.cell_height_px, 525);
        assert_eq!(settings.padding_color, [255, 255, 255]);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_concurrent_jobs = 2\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.max_concurrent_jobs, 2);
        assert_eq!(settings.ocr_language, "eng");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_concurrent_jobs = [nope").unwrap();

        assert!(Settings::load(Some(&path)).is_err());
    }
}
