//! Total amount extraction.
//!
//! Two strategies: amounts on lines carrying a total label keyword, and,
//! when no labeled line yields one, the largest amount anywhere in the text.
//! Both honour the optional plausibility bounds.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::patterns::{currency_code, AMOUNT_NUMBER, DEFAULT_TOTAL_KEYWORDS, LINE_AMOUNT_RULES};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::config::{AmountBounds, LabelPrecedence};
use crate::receipt::text::{ReceiptLine, ReceiptText};

/// Which strategy produced the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountStrategy {
    /// Found on a line with a total label.
    Labeled,
    /// Largest amount in the transcript.
    Largest,
}

impl AmountStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Labeled => "labeled",
            Self::Largest => "largest",
        }
    }
}

/// An extracted total amount.
#[derive(Debug, Clone, PartialEq)]
pub struct Total {
    pub amount: Decimal,
    /// ISO code of the currency printed next to the amount.
    pub currency: Option<&'static str>,
    pub strategy: AmountStrategy,
}

/// Amount field extractor.
pub struct AmountExtractor {
    /// Lowercased label keywords.
    keywords: Vec<String>,
    precedence: LabelPrecedence,
    bounds: Option<AmountBounds>,
}

impl AmountExtractor {
    pub fn new() -> Self {
        Self {
            keywords: DEFAULT_TOTAL_KEYWORDS.iter().map(|k| k.to_lowercase()).collect(),
            precedence: LabelPrecedence::default(),
            bounds: Some(AmountBounds::default()),
        }
    }

    /// Replace the label keyword set. Blank keywords are ignored.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    pub fn with_precedence(mut self, precedence: LabelPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_bounds(mut self, bounds: Option<AmountBounds>) -> Self {
        self.bounds = bounds;
        self
    }

    /// True if the line contains a total label keyword.
    pub fn is_label_line(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    fn plausible(&self, amount: Decimal) -> bool {
        self.bounds.is_none_or(|b| b.contains(amount))
    }

    /// First plausible amount on a labeled line, trying line rules in order.
    fn line_amount(&self, line: &ReceiptLine<'_>) -> Option<ExtractionMatch<Total>> {
        for rule in LINE_AMOUNT_RULES.iter() {
            for caps in rule.pattern.captures_iter(line.text) {
                let Some(m) = caps.name("amount") else {
                    continue;
                };
                if !is_standalone(line.text, m.start(), m.end()) {
                    continue;
                }
                let Some(amount) = parse_amount(m.as_str()) else {
                    continue;
                };
                if !self.plausible(amount) {
                    continue;
                }

                let currency = caps.name("currency").and_then(|c| currency_code(c.as_str()));
                let total = Total {
                    amount,
                    currency,
                    strategy: AmountStrategy::Labeled,
                };
                let start = line.offset + m.start();
                let end = line.offset + m.end();
                return Some(
                    ExtractionMatch::new(total, 0.9, m.as_str())
                        .with_position(start, end)
                        .with_rule(rule.name),
                );
            }
        }
        None
    }

    /// Amounts from every labeled line, top to bottom.
    pub fn labeled_candidates(&self, text: &ReceiptText<'_>) -> Vec<ExtractionMatch<Total>> {
        text.lines()
            .iter()
            .filter(|line| self.is_label_line(line.text))
            .filter_map(|line| self.line_amount(line))
            .collect()
    }

    /// Keyword-anchored strategy.
    pub fn labeled(&self, text: &ReceiptText<'_>) -> Option<ExtractionMatch<Total>> {
        let mut candidates = self.labeled_candidates(text).into_iter();
        match self.precedence {
            LabelPrecedence::First => candidates.next(),
            LabelPrecedence::Last => candidates.last(),
        }
    }

    /// Every standalone, parseable, plausible amount in the transcript.
    pub fn all_amounts(&self, text: &ReceiptText<'_>) -> Vec<ExtractionMatch<Total>> {
        let raw = text.raw();
        AMOUNT_NUMBER
            .find_iter(raw)
            .filter(|m| is_standalone(raw, m.start(), m.end()))
            .filter_map(|m| {
                let amount = parse_amount(m.as_str())?;
                if !self.plausible(amount) {
                    return None;
                }
                let total = Total {
                    amount,
                    currency: None,
                    strategy: AmountStrategy::Largest,
                };
                Some(
                    ExtractionMatch::new(total, 0.5, m.as_str())
                        .with_position(m.start(), m.end())
                        .with_rule("largest-amount"),
                )
            })
            .collect()
    }

    /// Largest-amount fallback; the earliest occurrence wins ties.
    pub fn largest(&self, text: &ReceiptText<'_>) -> Option<ExtractionMatch<Total>> {
        let mut best: Option<ExtractionMatch<Total>> = None;
        for candidate in self.all_amounts(text) {
            if best
                .as_ref()
                .is_none_or(|b| candidate.value.amount > b.value.amount)
            {
                best = Some(candidate);
            }
        }
        best
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Total>;

    fn extract(&self, text: &ReceiptText<'_>) -> Option<Self::Output> {
        self.labeled(text).or_else(|| self.largest(text))
    }

    fn extract_all(&self, text: &ReceiptText<'_>) -> Vec<Self::Output> {
        let mut results = self.labeled_candidates(text);
        results.extend(self.all_amounts(text));
        results
    }
}

/// True if `haystack[start..end]` is not glued to further digits, either
/// directly or through a `.`/`,` separator.
fn is_standalone(haystack: &str, start: usize, end: usize) -> bool {
    let mut before = haystack[..start].chars().rev();
    let mut after = haystack[end..].chars();

    !(glued(before.next(), before.next()) || glued(after.next(), after.next()))
}

fn glued(neighbour: Option<char>, next: Option<char>) -> bool {
    match (neighbour, next) {
        (Some(c), _) if c.is_ascii_digit() => true,
        (Some('.' | ','), Some(c)) => c.is_ascii_digit(),
        _ => false,
    }
}

/// Canonical dot-decimal form of an amount string.
///
/// The last separator is decimal when exactly two digits follow it; every
/// other separator is grouping and dropped. Characters other than digits
/// and separators are ignored.
pub fn normalize_amount(s: &str) -> Option<String> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let decimal_pos = cleaned.rfind(['.', ',']).filter(|&pos| {
        let tail = &cleaned[pos + 1..];
        tail.len() == 2 && tail.bytes().all(|b| b.is_ascii_digit())
    });

    let mut normalized = String::with_capacity(cleaned.len() + 1);
    for (i, c) in cleaned.char_indices() {
        if c.is_ascii_digit() {
            normalized.push(c);
        } else if Some(i) == decimal_pos {
            if normalized.is_empty() {
                normalized.push('0');
            }
            normalized.push('.');
        }
    }

    if normalized.bytes().any(|b| b.is_ascii_digit()) {
        Some(normalized)
    } else {
        None
    }
}

/// Parse an amount as printed on a receipt (e.g. "1 234,56", "1,234.56", "45.00 DH").
pub fn parse_amount(s: &str) -> Option<Decimal> {
    normalize_amount(s).and_then(|n| Decimal::from_str(&n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn extract(extractor: &AmountExtractor, raw: &str) -> Option<ExtractionMatch<Total>> {
        extractor.extract(&ReceiptText::new(raw))
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1 234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("12 345 678,90"), Some(dec("12345678.90")));
        assert_eq!(parse_amount("45.00 MAD"), Some(dec("45.00")));
        assert_eq!(parse_amount("1.234"), Some(dec("1234")));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_normalize_amount() {
        assert_eq!(normalize_amount("€12,50").as_deref(), Some("12.50"));
        assert_eq!(normalize_amount(",50").as_deref(), Some("0.50"));
        assert_eq!(normalize_amount(".,"), None);
    }

    #[test]
    fn test_overlong_digits_are_skipped() {
        assert_eq!(parse_amount(&"9".repeat(60)), None);
    }

    #[test]
    fn test_labeled_beats_largest() {
        let extractor = AmountExtractor::new();
        let total = extract(&extractor, "Item A 999.00\nTOTAL: 45.00 MAD").unwrap();

        assert_eq!(total.source, "45.00");
        assert_eq!(total.value.amount, dec("45.00"));
        assert_eq!(total.value.currency, Some("MAD"));
        assert_eq!(total.value.strategy, AmountStrategy::Labeled);
        assert_eq!(total.rule, "amount-currency");
    }

    #[test]
    fn test_largest_fallback() {
        let extractor = AmountExtractor::new();
        let total = extract(&extractor, "12.50\n3.00\n45.75").unwrap();

        assert_eq!(total.source, "45.75");
        assert_eq!(total.value.strategy, AmountStrategy::Largest);
        assert_eq!(total.position, Some((11, 16)));
    }

    #[test]
    fn test_largest_keeps_original_text() {
        let extractor = AmountExtractor::new();
        let total = extract(&extractor, "Pain 3,50\nLait 12,90").unwrap();

        assert_eq!(total.source, "12,90");
        assert_eq!(total.value.amount, dec("12.90"));
    }

    #[test]
    fn test_largest_tie_prefers_first() {
        let extractor = AmountExtractor::new();
        let total = extract(&extractor, "A 10.00\nB 10,00").unwrap();

        assert_eq!(total.source, "10.00");
    }

    #[test]
    fn test_last_label_wins_by_default() {
        let extractor = AmountExtractor::new();
        let text = "Sous-total 40,00\nTVA 5,00\nTotal TTC 45,00 DH";
        let total = extract(&extractor, text).unwrap();

        assert_eq!(total.source, "45,00");
    }

    #[test]
    fn test_first_label_precedence() {
        let extractor = AmountExtractor::new().with_precedence(LabelPrecedence::First);
        let text = "Sous-total 40,00\nTVA 5,00\nTotal TTC 45,00 DH";
        let total = extract(&extractor, text).unwrap();

        assert_eq!(total.source, "40,00");
    }

    #[test]
    fn test_currency_before_amount() {
        let extractor = AmountExtractor::new();
        let total = extract(&extractor, "Balance due $ 18.20").unwrap();

        assert_eq!(total.source, "18.20");
        assert_eq!(total.value.currency, Some("USD"));
        assert_eq!(total.rule, "currency-amount");
    }

    #[test]
    fn test_arabic_label() {
        let extractor = AmountExtractor::new();
        let total = extract(&extractor, "خبز 5.00\nالمجموع 87.50 DH\nشكرا").unwrap();

        assert_eq!(total.source, "87.50");
        assert_eq!(total.value.strategy, AmountStrategy::Labeled);
    }

    #[test]
    fn test_bounds_reject_implausible_amount() {
        let extractor = AmountExtractor::new();
        assert!(extract(&extractor, "999999.99").is_none());

        let unbounded = AmountExtractor::new().with_bounds(None);
        let total = extract(&unbounded, "999999.99").unwrap();
        assert_eq!(total.source, "999999.99");
    }

    #[test]
    fn test_bounds_skip_noise_on_labeled_line() {
        let extractor = AmountExtractor::new();
        let total = extract(&extractor, "Total 0.05 250.00").unwrap();

        assert_eq!(total.source, "250.00");
    }

    #[test]
    fn test_out_of_bounds_label_falls_back_to_largest() {
        let extractor = AmountExtractor::new();
        let total = extract(&extractor, "Coffee 4.20\nTotal 0.50").unwrap();

        assert_eq!(total.source, "4.20");
        assert_eq!(total.value.strategy, AmountStrategy::Largest);
    }

    #[test]
    fn test_dates_and_long_decimals_are_not_amounts() {
        let extractor = AmountExtractor::new();
        assert!(extract(&extractor, "31.12.2024\n2024.12.05\n12.345").is_none());
    }

    #[test]
    fn test_custom_keywords() {
        let extractor = AmountExtractor::new().with_keywords(["Summe", " "]);
        let total = extract(&extractor, "Brot 2.50\nSUMME 7,80\nBar 100.00").unwrap();

        assert_eq!(total.source, "7,80");
        assert!(!extractor.is_label_line("Total 5.00"));
    }

    #[test]
    fn test_extract_all_lists_labeled_first() {
        let extractor = AmountExtractor::new();
        let all = extractor.extract_all(&ReceiptText::new("Item 5.00\nTotal 9.00"));
        let sources: Vec<&str> = all.iter().map(|m| m.source.as_str()).collect();

        assert_eq!(sources, vec!["9.00", "5.00", "9.00"]);
    }

    #[test]
    fn test_no_amounts() {
        let extractor = AmountExtractor::new();
        assert!(extract(&extractor, "").is_none());
        assert!(extract(&extractor, "Total: n/a").is_none());
    }
}
