//! Core data model: receipt images, date decisions, page layout blocks,
//! and job progress events.

mod job;
mod receipt;

pub use job::{ImageOutcome, JobState, ProgressEvent};
pub use receipt::{
    Cell, DateDecision, GridBlock, PageBlock, ReceiptImage, CELLS_PER_ROW, GRID_CAPACITY,
    ROWS_PER_GRID, UNKNOWN_DATE_LABEL,
};
