//! Strict date-string parsing against a closed template list.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Earliest admissible transaction year.
pub const MIN_YEAR: i32 = 2020;
/// Latest admissible transaction year.
pub const MAX_YEAR: i32 = 2026;

/// The closed list of accepted format templates, in trial order.
/// `true` marks templates that carry a time of day.
const DATE_FORMATS: &[(&str, bool)] = &[
    // Numeric formats with time
    ("%d-%m-%Y %H:%M:%S", true),
    ("%d/%m/%Y %H:%M:%S", true),
    ("%m-%d-%Y %H:%M:%S", true),
    ("%m/%d/%Y %H:%M:%S", true),
    ("%Y-%m-%d %H:%M:%S", true),
    ("%d-%m-%Y %H:%M", true),
    ("%d/%m/%Y %H:%M", true),
    ("%m-%d-%Y %H:%M", true),
    ("%m/%d/%Y %H:%M", true),
    // Numeric formats without time
    ("%d-%m-%Y", false),
    ("%d/%m/%Y", false),
    ("%m-%d-%Y", false),
    ("%m/%d/%Y", false),
    ("%Y-%m-%d", false),
    // Month name formats with time
    ("%b %d, %Y %H:%M:%S", true),
    ("%B %d, %Y %H:%M:%S", true),
    ("%d %b %Y %H:%M:%S", true),
    ("%d %B %Y %H:%M:%S", true),
    ("%b %dst, %Y %H:%M:%S", true),
    ("%b %dnd, %Y %H:%M:%S", true),
    ("%b %drd, %Y %H:%M:%S", true),
    ("%b %dth, %Y %H:%M:%S", true),
    // Month name formats without time
    ("%b %d, %Y", false),
    ("%B %d, %Y", false),
    ("%d %b %Y", false),
    ("%d %B %Y", false),
    ("%b %dst, %Y", false),
    ("%b %dnd, %Y", false),
    ("%b %drd, %Y", false),
    ("%b %dth, %Y", false),
    // With day names
    ("%A, %B %d, %Y", false),
    ("%a, %b %d, %Y", false),
];

/// Parse a date string against the closed template list.
///
/// Returns the calendar date only when a template matches the whole
/// string AND the year lies in [`MIN_YEAR`], [`MAX_YEAR`]. Anything
/// else yields `None`; failure to parse is not an error.
pub fn parse_date_strict(input: &str) -> Option<NaiveDate> {
    let input = input.trim();

    for (format, has_time) in DATE_FORMATS {
        let parsed = if *has_time {
            NaiveDateTime::parse_from_str(input, format)
                .ok()
                .map(|dt| dt.date())
        } else {
            NaiveDate::parse_from_str(input, format).ok()
        };

        if let Some(date) = parsed {
            if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
                return Some(date);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_day_first_before_month_first() {
        // 3-4 is valid both ways; day-first template is tried first.
        let date = parse_date_strict("3-4-2024").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 4, 3).unwrap());
    }

    #[test]
    fn numeric_month_first_when_day_first_invalid() {
        // Day-first would need month 14; falls through to %m-%d-%Y.
        let date = parse_date_strict("3-14-2024").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
    }

    #[test]
    fn iso_date() {
        let date = parse_date_strict("2024-03-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn iso_with_slashes_has_no_template() {
        assert!(parse_date_strict("2024/03/15").is_none());
    }

    #[test]
    fn month_name_with_seconds() {
        let date = parse_date_strict("June 10, 2024 14:23:05").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    }

    #[test]
    fn ordinal_suffixes() {
        let date = parse_date_strict("Jun 3rd, 2024").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        let date = parse_date_strict("Aug 21st, 2023").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 8, 21).unwrap());
    }

    #[test]
    fn weekday_form() {
        let date = parse_date_strict("Monday, June 10, 2024").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    }

    #[test]
    fn year_below_range_rejected_for_every_template() {
        for input in [
            "15-03-2019",
            "03/15/2019",
            "2019-03-15",
            "March 15, 2019",
            "15 Mar 2019",
            "Mar 3rd, 2019",
            "Friday, March 15, 2019",
            "March 15, 2019 10:30:00",
        ] {
            assert!(parse_date_strict(input).is_none(), "accepted {input}");
        }
    }

    #[test]
    fn year_above_range_rejected() {
        assert!(parse_date_strict("2027-01-01").is_none());
        assert!(parse_date_strict("January 01, 2027").is_none());
    }

    #[test]
    fn range_boundaries_accepted() {
        assert!(parse_date_strict("2020-01-01").is_some());
        assert!(parse_date_strict("2026-12-31").is_some());
    }

    #[test]
    fn invalid_calendar_dates_rejected() {
        assert!(parse_date_strict("31-02-2024").is_none());
        assert!(parse_date_strict("2024-13-01").is_none());
        assert!(parse_date_strict("not a date").is_none());
    }

    #[test]
    fn input_is_trimmed() {
        assert!(parse_date_strict("  2024-03-15  ").is_some());
    }
}
