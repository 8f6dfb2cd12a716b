//! Per-image date resolution and batch grouping.
//!
//! The attempt multiplexer drives the OCR engine across the variant
//! sequence (outer loop) and the fixed engine mode sequence (inner
//! loop). The first per-attempt extraction that yields a date wins and
//! short-circuits the search; after exhausting every combination, one
//! final extraction runs over the concatenation of all collected text.
//! The search is deliberately sequential - parallelizing it would
//! change which combination "wins" when several succeed with
//! different dates.

use std::collections::BTreeMap;

use image::DynamicImage;

use crate::dates::extract_date;
use crate::models::{DateDecision, ReceiptImage};
use crate::ocr::{EngineMode, OcrEngine};
use crate::preprocess::generate_variants;

/// Resolve the single authoritative date for one image.
///
/// Engine failures are logged and degrade that one attempt to empty
/// text; they never abort the loop. Always returns a decision.
pub fn resolve_date(engine: &dyn OcrEngine, image: &DynamicImage, name: &str) -> DateDecision {
    let variants = generate_variants(image);
    let mut pooled = String::new();

    for variant in &variants {
        for mode in EngineMode::ALL {
            let text = match engine.recognize(&variant.image, mode) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(
                        image = name,
                        variant = variant.name,
                        mode = mode.as_str(),
                        "OCR attempt failed: {}",
                        e
                    );
                    String::new()
                }
            };

            pooled.push(' ');
            pooled.push_str(&text);

            if let Some(date) = extract_date(&text) {
                tracing::info!(
                    image = name,
                    variant = variant.name,
                    mode = mode.as_str(),
                    "date resolved: {}",
                    date
                );
                return DateDecision::Resolved(date);
            }
        }
    }

    // Last resort: one extraction over everything collected.
    match extract_date(&pooled) {
        Some(date) => {
            tracing::info!(image = name, "date resolved from pooled text: {}", date);
            DateDecision::Resolved(date)
        }
        None => {
            tracing::info!(image = name, "no date found, assigning to unknown group");
            DateDecision::Unknown
        }
    }
}

/// Partition images by canonical date label, preserving processing
/// order within each group. BTreeMap iteration gives the lexicographic
/// label order used for page sequencing (note: this is string order,
/// not chronological order - "April ..." sorts before "January ...").
pub fn group_by_label(
    assignments: Vec<(ReceiptImage, DateDecision)>,
) -> BTreeMap<String, Vec<ReceiptImage>> {
    let mut groups: BTreeMap<String, Vec<ReceiptImage>> = BTreeMap::new();
    for (image, decision) in assignments {
        groups.entry(decision.label()).or_default().push(image);
    }
    groups
}
