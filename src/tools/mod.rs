//! MCP tool implementations

pub mod adherence;
pub mod logs;
pub mod medications;
pub mod status;

use chrono::NaiveDate;

/// Parse a `YYYY-MM-DD` tool argument
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Parse an optional date argument, defaulting to `today`
pub(crate) fn date_or(s: Option<&str>, today: NaiveDate) -> Result<NaiveDate, String> {
    s.map(parse_date).unwrap_or(Ok(today))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2026-05-10"),
            Ok(NaiveDate::from_ymd_opt(2026, 5, 10).unwrap())
        );
        assert!(parse_date("05/10/2026").is_err());
        assert!(parse_date("2026-02-30").is_err());
    }

    #[test]
    fn test_date_or_defaults() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();
        assert_eq!(date_or(None, today), Ok(today));
        assert!(date_or(Some("nope"), today).is_err());
    }
}
