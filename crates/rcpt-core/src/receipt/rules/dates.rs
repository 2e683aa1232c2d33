//! Date extraction for receipts.
//!
//! Extraction is purely textual: the first date rule that matches wins and
//! its first occurrence is returned as printed. Impossible dates such as
//! `32/13/2024` are accepted. [`calendar_date`] is a separate, lenient
//! interpretation for callers that need a real date.

use chrono::NaiveDate;

use super::patterns::DATE_RULES;
use super::{ExtractionMatch, FieldExtractor};
use crate::receipt::text::ReceiptText;

/// Date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }

    /// True if any date rule matches the line.
    pub fn looks_like_date(&self, line: &str) -> bool {
        DATE_RULES.iter().any(|rule| rule.pattern.is_match(line))
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn confidence(rule: &str) -> f32 {
    if rule.contains("month-name") {
        0.95
    } else {
        0.9
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &ReceiptText<'_>) -> Option<Self::Output> {
        DATE_RULES.iter().find_map(|rule| {
            rule.pattern.find(text.raw()).map(|m| {
                ExtractionMatch::new(m.as_str().to_string(), confidence(rule.name), m.as_str())
                    .with_position(m.start(), m.end())
                    .with_rule(rule.name)
            })
        })
    }

    fn extract_all(&self, text: &ReceiptText<'_>) -> Vec<Self::Output> {
        DATE_RULES
            .iter()
            .flat_map(|rule| {
                rule.pattern.find_iter(text.raw()).map(|m| {
                    ExtractionMatch::new(m.as_str().to_string(), confidence(rule.name), m.as_str())
                        .with_position(m.start(), m.end())
                        .with_rule(rule.name)
                })
            })
            .collect()
    }
}

/// Interpret a printed date as a calendar date.
///
/// Numeric dates are read day-first unless they start with a four-digit
/// year. Month names may be English or French, full or abbreviated.
/// Returns `None` for anything that is not a real date.
pub fn calendar_date(s: &str) -> Option<NaiveDate> {
    let tokens: Vec<&str> = s
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let words: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| t.chars().all(char::is_alphabetic))
        .collect();
    let numbers: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| t.chars().all(|c| c.is_ascii_digit()))
        .collect();

    let (year, month, day): (i32, u32, u32) = match (words.as_slice(), numbers.as_slice()) {
        ([month], [day, year]) => (parse_year(year)?, month_number(month)?, day.parse().ok()?),
        ([], [first, second, third]) if first.len() == 4 => {
            (parse_year(first)?, second.parse().ok()?, third.parse().ok()?)
        }
        ([], [day, month, year]) => (parse_year(year)?, month.parse().ok()?, day.parse().ok()?),
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    match s.len() {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        2 if year <= 50 => Some(2000 + year),
        2 => Some(1900 + year),
        4 => Some(year),
        _ => None,
    }
}

const MONTH_PREFIXES: &[(&str, u32)] = &[
    ("jan", 1),
    ("feb", 2),
    ("fév", 2),
    ("fev", 2),
    ("mar", 3),
    ("apr", 4),
    ("avr", 4),
    ("may", 5),
    ("mai", 5),
    ("jun", 6),
    ("juin", 6),
    ("jul", 7),
    ("juil", 7),
    ("aug", 8),
    ("aoû", 8),
    ("aou", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
    ("déc", 12),
];

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTH_PREFIXES
        .iter()
        .find(|(prefix, _)| lower.starts_with(prefix))
        .map(|(_, month)| *month)
}
