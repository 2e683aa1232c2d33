//! Merchant name extraction.

use super::patterns::{
    ADDRESS, AMOUNT_NUMBER, BOILERPLATE_WORDS, CONTACT_MARKERS, LETTERS, PHONE, STORE_RULES,
};
use super::{DateExtractor, ExtractionMatch, FieldExtractor};
use crate::models::config::ExtractionConfig;
use crate::receipt::text::{ReceiptLine, ReceiptText};

/// Why a line was not taken as the merchant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRejection {
    TooShort,
    TooLong,
    DateShape,
    AmountShape,
    /// E-mail, web or phone line.
    Contact,
    NoLetters,
    Address,
    DigitHeavy,
    Boilerplate,
}

/// Merchant name extractor.
///
/// Known stores are looked up in the whole transcript first. Otherwise the
/// first leading line that survives the line filters is used. As a last
/// resort the first line is taken when it has letters and is neither a
/// contact, date nor amount line.
pub struct MerchantExtractor {
    use_allowlist: bool,
    candidate_lines: usize,
    min_line_length: usize,
    max_line_length: usize,
    max_length: usize,
    strict: bool,
    fallback_first_line: bool,
    dates: DateExtractor,
}

impl MerchantExtractor {
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            use_allowlist: config.use_store_allowlist,
            candidate_lines: config.merchant_candidate_lines,
            min_line_length: config.merchant_min_line_length,
            max_line_length: config.merchant_max_line_length,
            max_length: config.merchant_max_length,
            strict: config.strict_merchant_filters,
            fallback_first_line: config.merchant_fallback_first_line,
            dates: DateExtractor::new(),
        }
    }

    pub fn with_allowlist(mut self, enabled: bool) -> Self {
        self.use_allowlist = enabled;
        self
    }

    pub fn with_candidate_lines(mut self, lines: usize) -> Self {
        self.candidate_lines = lines;
        self
    }

    pub fn with_line_length(mut self, min: usize, max: usize) -> Self {
        self.min_line_length = min;
        self.max_line_length = max;
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_strict_filters(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_fallback_first_line(mut self, enabled: bool) -> Self {
        self.fallback_first_line = enabled;
        self
    }

    /// First reason the line cannot name the merchant, if any.
    pub fn rejection(&self, line: &ReceiptLine<'_>) -> Option<LineRejection> {
        let text = line.text;
        let len = line.char_len();

        if len < self.min_line_length {
            return Some(LineRejection::TooShort);
        }
        if len > self.max_line_length {
            return Some(LineRejection::TooLong);
        }
        if self.dates.looks_like_date(text) {
            return Some(LineRejection::DateShape);
        }
        if AMOUNT_NUMBER.is_match(text) {
            return Some(LineRejection::AmountShape);
        }
        if is_contact(text) {
            return Some(LineRejection::Contact);
        }
        if !LETTERS.is_match(text) {
            return Some(LineRejection::NoLetters);
        }

        if self.strict {
            if ADDRESS.is_match(text) {
                return Some(LineRejection::Address);
            }
            let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
            if digits * 2 > len {
                return Some(LineRejection::DigitHeavy);
            }
            let lower = text.to_lowercase();
            if BOILERPLATE_WORDS.iter().any(|w| lower.contains(w)) {
                return Some(LineRejection::Boilerplate);
            }
        }

        None
    }

    /// Known stores found anywhere in the transcript, in table order.
    pub fn known_stores(&self, text: &ReceiptText<'_>) -> Vec<ExtractionMatch<String>> {
        if !self.use_allowlist {
            return Vec::new();
        }

        STORE_RULES
            .iter()
            .filter_map(|rule| {
                rule.pattern.find(text.raw()).map(|m| {
                    ExtractionMatch::new(m.as_str().to_uppercase(), 0.95, m.as_str())
                        .with_position(m.start(), m.end())
                        .with_rule(rule.name)
                })
            })
            .collect()
    }

    fn line_match(
        &self,
        line: &ReceiptLine<'_>,
        confidence: f32,
        rule: &'static str,
    ) -> ExtractionMatch<String> {
        ExtractionMatch::new(self.truncate(line.text), confidence, line.text)
            .with_position(line.offset, line.offset + line.text.len())
            .with_rule(rule)
    }

    /// Leading lines that pass every filter, top to bottom.
    pub fn candidates(&self, text: &ReceiptText<'_>) -> Vec<ExtractionMatch<String>> {
        text.lines()
            .iter()
            .take(self.candidate_lines)
            .filter(|line| self.rejection(line).is_none())
            .map(|line| self.line_match(line, 0.7, "leading-line"))
            .collect()
    }

    fn fallback(&self, text: &ReceiptText<'_>) -> Option<ExtractionMatch<String>> {
        if !self.fallback_first_line {
            return None;
        }

        let first = text.lines().first()?;
        let usable = !is_contact(first.text)
            && LETTERS.is_match(first.text)
            && !self.dates.looks_like_date(first.text)
            && !AMOUNT_NUMBER.is_match(first.text);

        usable.then(|| self.line_match(first, 0.3, "first-line"))
    }

    fn truncate(&self, name: &str) -> String {
        let truncated: String = name.chars().take(self.max_length).collect();
        truncated.trim_end().to_string()
    }
}

impl Default for MerchantExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for MerchantExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &ReceiptText<'_>) -> Option<Self::Output> {
        if text.is_blank() {
            return None;
        }

        self.known_stores(text)
            .into_iter()
            .next()
            .or_else(|| self.candidates(text).into_iter().next())
            .or_else(|| self.fallback(text))
    }

    fn extract_all(&self, text: &ReceiptText<'_>) -> Vec<Self::Output> {
        let mut results = self.known_stores(text);
        results.extend(self.candidates(text));
        results
    }
}

fn is_contact(line: &str) -> bool {
    let lower = line.to_lowercase();
    CONTACT_MARKERS.iter().any(|m| lower.contains(m)) || PHONE.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(extractor: &MerchantExtractor, raw: &str) -> Option<String> {
        extractor.extract(&ReceiptText::new(raw)).map(|m| m.value)
    }

    fn rejection(extractor: &MerchantExtractor, line: &str) -> Option<LineRejection> {
        let text = ReceiptText::new(line);
        extractor.rejection(&text.lines()[0])
    }

    #[test]
    fn test_known_store_wins_over_first_line() {
        let extractor = MerchantExtractor::new();
        let raw = "Bienvenue\nCarrefour Ain Sebaa\n12/03/2024\nTOTAL 45.00 MAD";
        let result = extractor.extract(&ReceiptText::new(raw)).unwrap();

        assert_eq!(result.value, "CARREFOUR");
        assert_eq!(result.rule, "CARREFOUR");
        assert_eq!(result.source, "Carrefour");
    }

    #[test]
    fn test_store_table_order_decides() {
        let extractor = MerchantExtractor::new();
        assert_eq!(
            extract(&extractor, "Hanouty express\nproduits Marjane").as_deref(),
            Some("MARJANE")
        );
    }

    #[test]
    fn test_store_needs_whole_word() {
        let extractor = MerchantExtractor::new();
        assert_eq!(extract(&extractor, "Bimbo Bakery\nTotal 3.00").as_deref(), Some("Bimbo Bakery"));
    }

    #[test]
    fn test_allowlist_can_be_disabled() {
        let extractor = MerchantExtractor::new().with_allowlist(false);
        let raw = "Bienvenue\nCarrefour Ain Sebaa";
        assert_eq!(extract(&extractor, raw).as_deref(), Some("Bienvenue"));
    }

    #[test]
    fn test_contact_lines_are_never_the_merchant() {
        let extractor = MerchantExtractor::new();
        let raw = "+212 522 48 48 48\nwww.amal.ma\ncontact@amal.ma\nBoulangerie Amal\nTotal 12.00";

        assert_eq!(extract(&extractor, raw).as_deref(), Some("Boulangerie Amal"));
    }

    #[test]
    fn test_contact_only_text_has_no_merchant() {
        let extractor = MerchantExtractor::new();
        assert_eq!(extract(&extractor, "+212 522 48 48 48\nhttp://shop.example"), None);
    }

    #[test]
    fn test_unsupported_script_has_no_merchant() {
        let extractor = MerchantExtractor::new();
        assert_eq!(extract(&extractor, "驚くべき文字列"), None);
        assert_eq!(extract(&extractor, ""), None);
        assert_eq!(extract(&extractor, "  \n \n"), None);
    }

    #[test]
    fn test_strict_filters() {
        let strict = MerchantExtractor::new();
        let lenient = MerchantExtractor::new().with_strict_filters(false);
        let raw = "12 Rue Allal Ben Abdellah\nEpicerie Nour";

        assert_eq!(extract(&strict, raw).as_deref(), Some("Epicerie Nour"));
        assert_eq!(extract(&lenient, raw).as_deref(), Some("12 Rue Allal Ben Abdellah"));
    }

    #[test]
    fn test_rejection_reasons() {
        let extractor = MerchantExtractor::new();

        assert_eq!(rejection(&extractor, "AB"), Some(LineRejection::TooShort));
        assert_eq!(rejection(&extractor, &"x".repeat(41)), Some(LineRejection::TooLong));
        assert_eq!(rejection(&extractor, "Le 12/03/2024"), Some(LineRejection::DateShape));
        assert_eq!(rejection(&extractor, "Pain 3,50"), Some(LineRejection::AmountShape));
        assert_eq!(rejection(&extractor, "www.shop.ma"), Some(LineRejection::Contact));
        assert_eq!(rejection(&extractor, "*** --- ***"), Some(LineRejection::NoLetters));
        assert_eq!(rejection(&extractor, "221 Baker Street"), Some(LineRejection::Address));
        assert_eq!(rejection(&extractor, "No 1234567"), Some(LineRejection::DigitHeavy));
        assert_eq!(rejection(&extractor, "Ticket de caisse"), Some(LineRejection::Boilerplate));
        assert_eq!(rejection(&extractor, "Café Hafa"), None);
    }

    #[test]
    fn test_truncation() {
        let raw = "Boulangerie Patisserie Du Centre Ville";

        let extractor = MerchantExtractor::new();
        assert_eq!(extract(&extractor, raw).as_deref(), Some("Boulangerie Patisserie Du Cent"));

        let short = MerchantExtractor::new().with_max_length(12);
        assert_eq!(extract(&short, raw).as_deref(), Some("Boulangerie"));
    }

    #[test]
    fn test_fallback_first_line() {
        let extractor = MerchantExtractor::new();
        let raw = "RECEIPT\n12/03/2024\nTotal 45.00";
        let result = extractor.extract(&ReceiptText::new(raw)).unwrap();

        assert_eq!(result.value, "RECEIPT");
        assert_eq!(result.rule, "first-line");

        let no_fallback = MerchantExtractor::new().with_fallback_first_line(false);
        assert_eq!(extract(&no_fallback, raw), None);
    }

    #[test]
    fn test_fallback_only_considers_first_line() {
        let extractor = MerchantExtractor::new();

        assert_eq!(extract(&extractor, "+212 522 48 48 48\n12/03/2024\nTotal 45.00 MAD"), None);
        assert_eq!(extract(&extractor, "www.shop.ma\nLe 12/03/2024 14:00\nTotal 45.00"), None);
        assert_eq!(extract(&extractor, "Le 12/03/2024 14:00\nTotal 45.00"), None);
        assert_eq!(extract(&extractor, "Total 45.00 MAD\n12/03/2024"), None);
    }

    #[test]
    fn test_line_length_bounds() {
        let raw = "Epicerie Nour Quartier Maarif\nNour\nTotal 10.00";

        assert_eq!(
            extract(&MerchantExtractor::new(), raw).as_deref(),
            Some("Epicerie Nour Quartier Maarif")
        );

        let narrow = MerchantExtractor::new().with_line_length(3, 10);
        let result = narrow.extract(&ReceiptText::new(raw)).unwrap();
        assert_eq!(result.value, "Nour");
        assert_eq!(result.rule, "leading-line");

        assert_eq!(
            rejection(&narrow, "Epicerie Nour Quartier Maarif"),
            Some(LineRejection::TooLong)
        );
        assert_eq!(rejection(&narrow, "Nour"), None);
    }

    #[test]
    fn test_candidate_line_limit() {
        let extractor = MerchantExtractor::new()
            .with_candidate_lines(2)
            .with_fallback_first_line(false);

        assert_eq!(extract(&extractor, "12.00\n3.50\nEpicerie Nour"), None);
        assert_eq!(
            extract(&extractor.with_candidate_lines(3), "12.00\n3.50\nEpicerie Nour").as_deref(),
            Some("Epicerie Nour")
        );
    }

    #[test]
    fn test_extract_all_lists_stores_then_lines() {
        let extractor = MerchantExtractor::new();
        let all = extractor.extract_all(&ReceiptText::new("Bim\nEpicerie Nour"));
        let values: Vec<&str> = all.iter().map(|m| m.value.as_str()).collect();

        assert_eq!(values, vec!["BIM", "Bim", "Epicerie Nour"]);
    }
}
