//! Draw date normalization
//!
//! The results page renders dates like `"Fri, Dec 19, 2025"`, sometimes
//! captured twice back-to-back with irregular spacing. This module turns
//! such text into a calendar date without any timezone conversion.

use chrono::NaiveDate;

use crate::utils::error::ParseError;
use crate::utils::{collapse_repeated_phrase, normalize_whitespace};

/// Formats tried in order after cleaning
///
/// chrono accepts both short and long names for `%a` and `%b`.
const DATE_FORMATS: &[&str] = &[
    "%a, %b %d, %Y", // Fri, Dec 19, 2025
    "%a %b %d, %Y",  // Fri Dec 19, 2025
    "%b %d, %Y",     // Dec 19, 2025
    "%m/%d/%Y",      // 12/19/2025
    "%Y-%m-%d",      // 2025-12-19
];

/// Clean raw label text: collapse whitespace, then a duplicated phrase
pub fn clean_date_text(raw: &str) -> String {
    let collapsed = normalize_whitespace(raw);
    collapse_repeated_phrase(&collapsed).to_string()
}

/// Normalize a loosely formatted date string into a calendar date
///
/// # Errors
///
/// Returns `ParseError::InvalidDate` when no known format yields a valid date.
pub fn normalize_date(raw: &str) -> Result<NaiveDate, ParseError> {
    let cleaned = clean_date_text(raw);
    if cleaned.is_empty() {
        return Err(ParseError::InvalidDate(raw.to_string()));
    }

    if let Some(date) = parse_known_formats(&cleaned) {
        return Ok(date);
    }

    // A weekday that disagrees with the date is ignored; the date wins.
    if let Some((_, rest)) = cleaned.split_once(' ') {
        if let Some(date) = parse_known_formats(rest) {
            tracing::debug!(raw = %cleaned, "Ignoring weekday that does not match date");
            return Ok(date);
        }
    }

    Err(ParseError::InvalidDate(cleaned))
}

/// Normalize into the canonical `YYYY-MM-DD` text
pub fn normalize_date_iso(raw: &str) -> Result<String, ParseError> {
    normalize_date(raw).map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_known_formats(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_simple() {
        assert_eq!(normalize_date_iso("Fri, Dec 19, 2025").unwrap(), "2025-12-19");
    }

    #[test]
    fn test_normalize_duplicated_with_spacing() {
        assert_eq!(
            normalize_date_iso("Fri, Dec 19, 2025  Fri, Dec 19, 2025").unwrap(),
            "2025-12-19"
        );
        assert_eq!(
            normalize_date_iso("\n   Fri,  Dec 19,\t2025 \n Fri, Dec 19, 2025 ").unwrap(),
            "2025-12-19"
        );
    }

    #[test]
    fn test_normalize_long_names() {
        assert_eq!(
            normalize_date_iso("Friday, December 19, 2025").unwrap(),
            "2025-12-19"
        );
    }

    #[test]
    fn test_normalize_other_formats() {
        assert_eq!(normalize_date_iso("Dec 19, 2025").unwrap(), "2025-12-19");
        assert_eq!(normalize_date_iso("12/19/2025").unwrap(), "2025-12-19");
        assert_eq!(normalize_date_iso("2025-12-19").unwrap(), "2025-12-19");
    }

    #[test]
    fn test_mismatched_weekday_keeps_date() {
        assert_eq!(normalize_date_iso("Mon, Dec 19, 2025").unwrap(), "2025-12-19");
    }

    #[test]
    fn test_invalid_dates() {
        assert!(matches!(
            normalize_date("Fri, Feb 30, 2025"),
            Err(ParseError::InvalidDate(_))
        ));
        assert!(normalize_date("").is_err());
        assert!(normalize_date("   ").is_err());
        assert!(normalize_date("not a date").is_err());
    }

    #[test]
    fn test_different_dates_are_not_collapsed() {
        // Two distinct dates stay ambiguous and must not parse
        assert!(normalize_date("Fri, Dec 19, 2025 Sat, Dec 20, 2025").is_err());
    }

    proptest! {
        #[test]
        fn prop_duplicate_matches_single(
            days in 0i64..20_000,
            gap in 1usize..6,
            pad in 0usize..4,
        ) {
            let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
            let date = base + chrono::Duration::days(days);
            let phrase = date.format("%a, %b %d, %Y").to_string();
            let doubled = format!(
                "{}{}{}{}",
                " ".repeat(pad),
                phrase,
                " ".repeat(gap),
                phrase
            );

            prop_assert_eq!(normalize_date(&doubled).unwrap(), date);
            prop_assert_eq!(normalize_date(&phrase).unwrap(), date);
        }
    }
}
