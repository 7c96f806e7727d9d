//! Date parsing for text-typed `Date` columns.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Formats tried, in order, when a date is stored as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateFormatConfig {
    /// Plain date formats
    pub date_formats: Vec<String>,
    /// Date-time formats; only the date part is kept
    pub datetime_formats: Vec<String>,
    /// Enable heuristic format detection after the listed formats fail
    pub enable_format_detection: bool,
}

impl Default for DateFormatConfig {
    fn default() -> Self {
        Self {
            date_formats: vec![
                "%Y-%m-%d".to_string(), // ISO format: 2024-01-15
                "%d-%m-%Y".to_string(), // 15-01-2024
                "%d/%m/%Y".to_string(), // 15/01/2024
                "%m/%d/%Y".to_string(), // 01/15/2024
                "%d.%m.%Y".to_string(), // 15.01.2024
                "%Y/%m/%d".to_string(), // 2024/01/15
                "%d %b %Y".to_string(), // 15 Jan 2024
                "%d %B %Y".to_string(), // 15 January 2024
            ],
            datetime_formats: vec![
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%S%.f".to_string(),
                "%Y-%m-%d %H:%M:%S%.f".to_string(),
            ],
            enable_format_detection: true,
        }
    }
}

/// Parse a date string with multiple format attempts
#[must_use]
pub fn parse_date_string(s: &str, config: &DateFormatConfig) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for format in &config.date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    for format in &config.datetime_formats {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
            return Some(datetime.date());
        }
    }

    if config.enable_format_detection {
        if let Some(format) = detect_date_format(s) {
            if let Ok(date) = NaiveDate::parse_from_str(s, format) {
                return Some(date);
            }
        }
        // Longer ISO strings with a zone or odd precision: keep the date prefix
        if s.len() > 10 && s.is_char_boundary(10) {
            if let Ok(date) = NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d") {
                return Some(date);
            }
        }
    }

    None
}

/// Guess a date format from the shape of the string
#[must_use]
pub fn detect_date_format(s: &str) -> Option<&'static str> {
    let bytes = s.as_bytes();

    if bytes.len() == 8 && bytes.iter().all(u8::is_ascii_digit) {
        return Some("%Y%m%d");
    }

    for separator in ['-', '/', '.'] {
        let parts: Vec<&str> = s.split(separator).collect();
        if parts.len() != 3 {
            continue;
        }
        if parts[0].len() == 4 {
            return Some(match separator {
                '-' => "%Y-%m-%d",
                '/' => "%Y/%m/%d",
                _ => "%Y.%m.%d",
            });
        }
        if parts[2].len() == 4 {
            // Day-first unless the first part cannot be a day
            let first = parts[0].parse::<u8>().ok()?;
            let second = parts[1].parse::<u8>().ok()?;
            let month_first = first <= 12 && second > 12;
            return Some(match (separator, month_first) {
                ('-', false) => "%d-%m-%Y",
                ('-', true) => "%m-%d-%Y",
                ('/', false) => "%d/%m/%Y",
                ('/', true) => "%m/%d/%Y",
                (_, false) => "%d.%m.%Y",
                (_, true) => "%m.%d.%Y",
            });
        }
    }

    None
}
