//! Date candidate extraction and disambiguation.
//!
//! OCR text from a receipt usually contains several date-like substrings
//! of very different trustworthiness: printed timestamps, numeric dates
//! with ambiguous day/month order, stray digit runs. This module turns a
//! text block into typed [`DateCandidate`]s via a fixed, ordered set of
//! pattern families ([`extract`]), validates each against a closed list
//! of strict format templates ([`parse`]), and selects one winner by
//! confidence tier and textual position ([`resolve_candidates`]).

mod extract;
mod parse;

pub use extract::{extract_candidates, normalize_whitespace};
pub use parse::{parse_date_strict, MAX_YEAR, MIN_YEAR};

use chrono::NaiveDate;

/// Coarse trust ranking of a date pattern family. Higher tiers always
/// outrank lower ones regardless of position in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Sort rank: lower is more trusted.
    pub fn rank(&self) -> u8 {
        match self {
            ConfidenceTier::VeryHigh => 0,
            ConfidenceTier::High => 1,
            ConfidenceTier::Medium => 2,
            ConfidenceTier::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::VeryHigh => "very_high",
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

/// Which pattern family produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternFamily {
    /// `D[-/]D[-/]YYYY`, ambiguous day/month order.
    Numeric,
    /// `YYYY[-/]M[-/]D`.
    Iso,
    /// Month name + day + year.
    MonthName,
    /// Month name + day + year + time of day.
    MonthNameTime,
    /// Weekday name + month name + day + year.
    WeekdayMonthName,
}

impl PatternFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternFamily::Numeric => "numeric",
            PatternFamily::Iso => "iso",
            PatternFamily::MonthName => "month_name",
            PatternFamily::MonthNameTime => "month_name_time",
            PatternFamily::WeekdayMonthName => "weekday_month_name",
        }
    }
}

/// One validated date candidate found in a text block.
///
/// Invariant: `date.year()` lies in [`MIN_YEAR`], [`MAX_YEAR`] - candidates
/// outside the range are never constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateCandidate {
    /// The substring the pattern matched.
    pub matched: String,
    /// Strictly parsed calendar date.
    pub date: NaiveDate,
    pub tier: ConfidenceTier,
    pub family: PatternFamily,
    /// 0-based offset of the match start in the normalized text.
    pub offset: usize,
}

/// Pick the winning candidate: sort by (tier rank, match offset)
/// ascending and take the first. Returns `None` for an empty list -
/// the caller renders the "Unknown Date" sentinel.
pub fn resolve_candidates(mut candidates: Vec<DateCandidate>) -> Option<DateCandidate> {
    if candidates.is_empty() {
        return None;
    }
    candidates.sort_by_key(|c| (c.tier.rank(), c.offset));
    candidates.into_iter().next()
}

/// Extract and disambiguate in one step: the best date in `text`, if any.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    let candidates = extract_candidates(text);
    match resolve_candidates(candidates) {
        Some(winner) => {
            tracing::debug!(
                matched = %winner.matched,
                tier = winner.tier.as_str(),
                family = winner.family.as_str(),
                offset = winner.offset,
                "selected date candidate"
            );
            Some(winner.date)
        }
        None => {
            tracing::debug!("no valid date candidates in text block");
            None
        }
    }
}
