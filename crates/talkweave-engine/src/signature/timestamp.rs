use std::ops::Range;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use regex::Regex;

use crate::error::ParseError;

/// Locale facts needed to read signature timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Locale {
    /// Month names, January first.
    pub months: Vec<String>,
    /// Label printed in parentheses after the date, e.g. `UTC`.
    pub timezone: String,
    pub utc_offset_minutes: i32,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            months: [
                "January",
                "February",
                "March",
                "April",
                "May",
                "June",
                "July",
                "August",
                "September",
                "October",
                "November",
                "December",
            ]
            .map(String::from)
            .to_vec(),
            timezone: "UTC".to_string(),
            utc_offset_minutes: 0,
        }
    }
}

/// Reads `HH:MM, D Month YYYY (TZ)` timestamps.
#[derive(Debug, Clone)]
pub struct TimestampParser {
    months: Vec<String>,
    offset: FixedOffset,
    /// Non-capturing source, embedded into signature patterns.
    pattern: String,
    scan: Regex,
    exact: Regex,
}

impl TimestampParser {
    pub fn new(locale: &Locale) -> Result<Self, ParseError> {
        let invalid = |message: String| ParseError::InvalidPattern {
            name: "timestamp".to_string(),
            message,
        };
        if locale.months.len() != 12 || locale.months.iter().any(|m| m.trim().is_empty()) {
            return Err(invalid(format!(
                "expected 12 month names, got {}",
                locale.months.len()
            )));
        }
        let offset = FixedOffset::east_opt(locale.utc_offset_minutes * 60)
            .ok_or_else(|| invalid(format!("offset {} out of range", locale.utc_offset_minutes)))?;

        let months = locale
            .months
            .iter()
            .map(|m| regex::escape(m))
            .collect::<Vec<_>>()
            .join("|");
        let tz = regex::escape(&locale.timezone);
        let pattern = format!(r"\d{{1,2}}:\d{{2}}, \d{{1,2}} (?:{months}) \d{{4}} \({tz}\)");
        let exact = format!(r"^(\d{{1,2}}):(\d{{2}}), (\d{{1,2}}) ({months}) (\d{{4}}) \({tz}\)$");

        Ok(Self {
            months: locale.months.clone(),
            offset,
            scan: Regex::new(&pattern).map_err(|e| invalid(e.to_string()))?,
            exact: Regex::new(&exact).map_err(|e| invalid(e.to_string()))?,
            pattern,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Byte ranges of every timestamp in `text`.
    pub fn find_all<'h>(&'h self, text: &'h str) -> impl Iterator<Item = Range<usize>> + 'h {
        self.scan.find_iter(text).map(|m| m.range())
    }

    /// Converts a timestamp literal to UTC; `None` for impossible dates.
    pub fn parse(&self, text: &str) -> Option<DateTime<Utc>> {
        let caps = self.exact.captures(text.trim())?;
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        let month = self.months.iter().position(|m| m == &caps[4])? as u32 + 1;
        let year: i32 = caps[5].parse().ok()?;

        let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
        let local = self.offset.from_local_datetime(&naive).single()?;
        Some(local.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parser() -> TimestampParser {
        TimestampParser::new(&Locale::default()).unwrap()
    }

    #[rstest]
    #[case("12:00, 1 January 2020 (UTC)", "2020-01-01T12:00:00Z")]
    #[case("09:05, 29 February 2024 (UTC)", "2024-02-29T09:05:00Z")]
    #[case("23:59, 31 December 1999 (UTC)", "1999-12-31T23:59:00Z")]
    fn parses_valid_timestamps(#[case] text: &str, #[case] expected: &str) {
        let parsed = parser().parse(text).unwrap();
        assert_eq!(parsed.format("%Y-%m-%dT%H:%M:%SZ").to_string(), expected);
    }

    #[rstest]
    #[case("12:00, 30 February 2020 (UTC)")]
    #[case("25:00, 1 January 2020 (UTC)")]
    #[case("12:00, 1 Janvier 2020 (UTC)")]
    #[case("12:00, 1 January 2020 (CET)")]
    fn rejects_invalid_timestamps(#[case] text: &str) {
        assert_eq!(parser().parse(text), None);
    }

    #[test]
    fn applies_configured_offset() {
        let locale = Locale {
            timezone: "CET".to_string(),
            utc_offset_minutes: 60,
            ..Locale::default()
        };
        let parser = TimestampParser::new(&locale).unwrap();
        let parsed = parser.parse("12:00, 1 January 2020 (CET)").unwrap();
        assert_eq!(parsed.format("%H:%M").to_string(), "11:00");
    }

    #[test]
    fn finds_all_occurrences() {
        let text = "a 12:00, 1 January 2020 (UTC) b 13:30, 2 March 2021 (UTC)";
        let found: Vec<_> = parser().find_all(text).map(|r| &text[r]).collect();
        assert_eq!(
            found,
            ["12:00, 1 January 2020 (UTC)", "13:30, 2 March 2021 (UTC)"]
        );
    }

    #[test]
    fn rejects_wrong_month_count() {
        let locale = Locale {
            months: vec!["January".to_string()],
            ..Locale::default()
        };
        assert!(matches!(
            TimestampParser::new(&locale),
            Err(ParseError::InvalidPattern { .. })
        ));
    }
}
