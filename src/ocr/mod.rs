//! OCR engine boundary.
//!
//! The pipeline treats OCR as a black-box function from a pixel buffer
//! and an engine mode to raw text. [`TesseractEngine`] shells out to
//! the system `tesseract` binary; [`OcrEngine`] is the seam for
//! swapping engines (and for scripted engines in tests).

mod backend;
mod tesseract;

pub use backend::{EngineMode, OcrEngine, OcrError};
pub use tesseract::TesseractEngine;
