//! ReceiptSort - bulk receipt digitization and organization.
//!
//! Ingests batches of scanned receipt images, determines the transaction
//! date printed on each via OCR, groups images by date, and assembles a
//! paginated document with a fixed 2x2 image grid per date group.
//!
//! The core of the crate is the date disambiguation engine: preprocessing
//! variants ([`preprocess`]), the multi-pass OCR attempt policy
//! ([`pipeline`]), regex-based candidate extraction and confidence-tiered
//! selection ([`dates`]). Downstream, [`layout`] and [`docwriter`] turn
//! grouped images into the output document, and [`jobs`] runs the whole
//! pipeline as one unit of work per submitted batch.

pub mod cli;
pub mod config;
pub mod dates;
pub mod docwriter;
pub mod jobs;
pub mod layout;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod preprocess;
pub mod server;
