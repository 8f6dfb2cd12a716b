//! Document writer boundary.
//!
//! Consumes an ordered sequence of page blocks (heading + 2x2 image
//! grids) and produces one binary document artifact. [`DocxWriter`] is
//! the shipped implementation; the [`DocumentWriter`] trait is the
//! seam for swapping formats.

mod docx;

use std::path::Path;

use thiserror::Error;

use crate::models::PageBlock;

pub use docx::DocxWriter;

#[derive(Debug, Error)]
pub enum DocWriterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Black-box document writer: ordered page blocks -> binary artifact.
pub trait DocumentWriter: Send + Sync {
    fn write(&self, blocks: &[PageBlock], output: &Path) -> Result<(), DocWriterError>;
}
