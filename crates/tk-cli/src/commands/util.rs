//! Shared utilities for CLI commands.

use chrono::NaiveDate;

/// Accepted `DATE` formats, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Parse a calendar day.
///
/// Supports:
/// - "2025-01-15", "2025/01/15"
/// - "15-01-2025", "15/01/2025"
pub fn parse_day(s: &str) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .ok_or_else(|| anyhow::anyhow!("Could not parse date '{s}'. Please use format YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_parse_day_accepts_supported_formats() {
        for input in ["2025-01-15", "2025/01/15", "15-01-2025", "15/01/2025", " 2025-01-15 "] {
            assert_eq!(parse_day(input).unwrap(), jan_15(), "{input}");
        }
    }

    #[test]
    fn test_parse_day_rejects_garbage() {
        let err = parse_day("next tuesday").unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
        assert!(parse_day("2025-13-01").is_err());
    }
}
