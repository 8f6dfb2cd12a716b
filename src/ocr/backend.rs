//! OCR engine trait and the fixed engine mode sequence.

use image::DynamicImage;
use thiserror::Error;

/// Errors from a single OCR invocation. Each failure degrades that one
/// attempt to empty text at the call site; it never aborts the attempt
/// loop.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineNotAvailable(String),
    #[error("OCR failed: {0}")]
    OcrFailed(String),
    #[error("image encoding failed: {0}")]
    ImageEncoding(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A named OCR operating mode affecting text-segmentation assumptions.
///
/// The attempt multiplexer tries these in [`EngineMode::ALL`] order for
/// every preprocessing variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// Uniform block of text.
    Block,
    /// Single column of variable-width text.
    SingleColumn,
    /// Fully automatic page segmentation.
    Auto,
    /// Sparse text, no particular order.
    Sparse,
    /// Neural-net (LSTM) engine only, block segmentation.
    NeuralOnly,
}

impl EngineMode {
    /// The fixed attempt order.
    pub const ALL: [EngineMode; 5] = [
        EngineMode::Block,
        EngineMode::SingleColumn,
        EngineMode::Auto,
        EngineMode::Sparse,
        EngineMode::NeuralOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineMode::Block => "block",
            EngineMode::SingleColumn => "single_column",
            EngineMode::Auto => "auto",
            EngineMode::Sparse => "sparse",
            EngineMode::NeuralOnly => "neural_only",
        }
    }

    /// Tesseract engine/segmentation arguments for this mode.
    pub fn tesseract_args(&self) -> [&'static str; 4] {
        match self {
            EngineMode::Block => ["--oem", "3", "--psm", "6"],
            EngineMode::SingleColumn => ["--oem", "3", "--psm", "4"],
            EngineMode::Auto => ["--oem", "3", "--psm", "3"],
            EngineMode::Sparse => ["--oem", "3", "--psm", "11"],
            EngineMode::NeuralOnly => ["--oem", "1", "--psm", "6"],
        }
    }
}

/// Black-box OCR function: pixel buffer + mode -> raw text.
pub trait OcrEngine: Send + Sync {
    /// Recognize text in one image rendering. May fail per call.
    fn recognize(&self, image: &DynamicImage, mode: EngineMode) -> Result<String, OcrError>;

    /// Whether the engine can run at all in this environment.
    fn is_available(&self) -> bool {
        true
    }

    /// Human-readable install/availability hint.
    fn availability_hint(&self) -> String {
        "OCR engine is available".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_order_is_fixed() {
        let names: Vec<_> = EngineMode::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(
            names,
            ["block", "single_column", "auto", "sparse", "neural_only"]
        );
    }

    #[test]
    fn neural_only_uses_lstm_engine() {
        assert_eq!(
            EngineMode::NeuralOnly.tesseract_args(),
            ["--oem", "1", "--psm", "6"]
        );
    }
}
