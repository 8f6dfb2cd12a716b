//! Receipt images, resolved dates, and page layout blocks.

use std::path::PathBuf;

use chrono::NaiveDate;

/// Sentinel group label for images with no resolvable date.
pub const UNKNOWN_DATE_LABEL: &str = "Unknown Date";

/// Immutable handle to one input image. The raw bytes live on disk in
/// the owning job's working directory; the handle is never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptImage {
    /// Original filename (basename only).
    pub name: String,
    /// Location of the stored upload.
    pub path: PathBuf,
}

impl ReceiptImage {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// The single authoritative date decision for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateDecision {
    /// A date was resolved from OCR text.
    Resolved(NaiveDate),
    /// No candidate survived extraction; the image goes to the
    /// "Unknown Date" group.
    Unknown,
}

impl DateDecision {
    /// Canonical label: `"Month DD, YYYY"` with the day zero-padded,
    /// or the sentinel. The label doubles as the grouping and sort key.
    pub fn label(&self) -> String {
        match self {
            DateDecision::Resolved(date) => date.format("%B %d, %Y").to_string(),
            DateDecision::Unknown => UNKNOWN_DATE_LABEL.to_string(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, DateDecision::Resolved(_))
    }
}

/// Number of image cells per grid row.
pub const CELLS_PER_ROW: usize = 2;
/// Number of rows per grid block.
pub const ROWS_PER_GRID: usize = 2;
/// Images per full grid block.
pub const GRID_CAPACITY: usize = CELLS_PER_ROW * ROWS_PER_GRID;

/// One cell of a page grid: a normalized image or an error marker for
/// an image that could not be rendered.
#[derive(Debug, Clone)]
pub enum Cell {
    /// Normalized image, encoded as PNG at the fixed cell dimensions.
    Image { name: String, png: Vec<u8> },
    /// The source image could not be decoded at layout time; rendered
    /// as an error caption so the slot is still accounted for.
    Error { name: String },
}

/// One 2x2 grid of cells (the final grid of a group may hold fewer).
#[derive(Debug, Clone)]
pub struct GridBlock {
    pub cells: Vec<Cell>,
}

/// One date group on the page: a heading followed by its grids.
/// A page break separates consecutive blocks, never grids within one.
#[derive(Debug, Clone)]
pub struct PageBlock {
    pub heading: String,
    pub grids: Vec<GridBlock>,
}
