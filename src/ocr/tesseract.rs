//! Tesseract OCR engine.
//!
//! Runs the system `tesseract` binary on a temporary PNG rendering of
//! the variant. Traditional, widely available, CPU-based.

use std::process::Command;

use image::DynamicImage;
use tempfile::TempDir;

use super::backend::{EngineMode, OcrEngine, OcrError};

/// OCR engine backed by the `tesseract` command-line binary.
pub struct TesseractEngine {
    language: String,
}

impl TesseractEngine {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    fn run_tesseract(&self, image_path: &std::path::Path, mode: EngineMode) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .args(mode.tesseract_args())
            .output();

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr)))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::EngineNotAvailable(
                "tesseract not found (install tesseract-ocr)".to_string(),
            )),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("eng")
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &DynamicImage, mode: EngineMode) -> Result<String, OcrError> {
        // Tesseract reads from disk; render the variant to a temp PNG.
        let temp_dir = TempDir::new()?;
        let image_path = temp_dir.path().join("variant.png");
        image
            .save(&image_path)
            .map_err(|e| OcrError::ImageEncoding(e.to_string()))?;

        self.run_tesseract(&image_path, mode)
    }

    fn is_available(&self) -> bool {
        which::which("tesseract").is_ok()
    }

    fn availability_hint(&self) -> String {
        if self.is_available() {
            "Tesseract is available".to_string()
        } else {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        }
    }
}
