//! Regex pattern families for locating date candidates in OCR text.

use std::sync::LazyLock;

use regex::Regex;

use super::parse::parse_date_strict;
use super::{ConfidenceTier, DateCandidate, PatternFamily};

/// Month-name alternation shared by the name-based families.
const MONTH: &str = "Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?\
|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?";

/// Family 1: numeric `D[-/]D[-/]YYYY`, ambiguous day/month order.
static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[-/](\d{1,2})[-/](20\d{2})\b").unwrap());

/// Family 2: ISO `YYYY[-/]M[-/]D`.
static ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(20\d{2})[-/](\d{1,2})[-/](\d{1,2})\b").unwrap());

/// Family 3: month name + day (+ ordinal suffix) + year.
static MONTH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTH})\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(20\d{{2}})\b"
    ))
    .unwrap()
});

/// Family 4: month name form followed by a time of day.
static MONTH_NAME_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTH})\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(20\d{{2}})\s+(\d{{1,2}}):(\d{{2}})(?::(\d{{2}}))?\b"
    ))
    .unwrap()
});

/// Family 5: weekday name + month name + day + year.
static WEEKDAY_MONTH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday),?\s+({MONTH})\s+(\d{{1,2}}),?\s+(20\d{{2}})\b"
    ))
    .unwrap()
});

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Scan a text block with the five pattern families, in fixed order,
/// and return every candidate that survives strict parsing. A single
/// block may yield candidates from multiple families; failures are
/// discarded silently.
pub fn extract_candidates(text: &str) -> Vec<DateCandidate> {
    let text = normalize_whitespace(text);
    let mut candidates = Vec::new();

    // Family 1: both day-first and month-first interpretations are
    // attempted; day-first wins when both parse.
    for caps in NUMERIC.captures_iter(&text) {
        let whole = caps.get(0).unwrap();
        let (d1, d2, year) = (&caps[1], &caps[2], &caps[3]);

        for attempt in [format!("{d1}-{d2}-{year}"), format!("{d2}-{d1}-{year}")] {
            if let Some(date) = parse_date_strict(&attempt) {
                candidates.push(DateCandidate {
                    matched: whole.as_str().to_string(),
                    date,
                    tier: ConfidenceTier::Medium,
                    family: PatternFamily::Numeric,
                    offset: whole.start(),
                });
                break;
            }
        }
    }

    for (regex, tier, family) in [
        (&*ISO, ConfidenceTier::High, PatternFamily::Iso),
        (&*MONTH_NAME, ConfidenceTier::High, PatternFamily::MonthName),
        (
            &*MONTH_NAME_TIME,
            ConfidenceTier::VeryHigh,
            PatternFamily::MonthNameTime,
        ),
        (
            &*WEEKDAY_MONTH_NAME,
            ConfidenceTier::VeryHigh,
            PatternFamily::WeekdayMonthName,
        ),
    ] {
        for m in regex.find_iter(&text) {
            if let Some(date) = parse_date_strict(m.as_str()) {
                candidates.push(DateCandidate {
                    matched: m.as_str().to_string(),
                    date,
                    tier,
                    family,
                    offset: m.start(),
                });
            }
        }
    }

    candidates
}
