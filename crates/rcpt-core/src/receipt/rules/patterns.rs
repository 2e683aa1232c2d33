//! Ordered pattern tables for receipt field extraction.
//!
//! Table order is precedence order. Extractors walk these tables front to
//! back, so tests can enumerate and target each rule by name.

use lazy_static::lazy_static;
use regex::Regex;

/// A named regular expression in an ordered rule table.
#[derive(Debug)]
pub struct PatternRule {
    pub name: &'static str,
    pub pattern: Regex,
}

impl PatternRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
        }
    }
}

/// Decimal amount: digits with optional `.`, `,`, space or no-break space
/// grouping, then a separator and exactly two decimals.
///
/// Space grouping must start at a word boundary so the tail of a date or
/// code (`2024 100,00`) is not read as a leading group.
pub const AMOUNT_NUMBER_SRC: &str =
    r"(?:\d{1,3}(?:[.,]\d{3})+|\b[1-9]\d{0,2}(?:[ \x{00A0}]\d{3})+|\d+)[.,]\d{2}";

const MONTHS_EN: &str = r"(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)";
const MONTHS_FR: &str = r"(?:janv|f[ée]v|mars|avr|mai|juin|juil|ao[uû]t|sept|oct|nov|d[ée]c)";

/// Label keywords marking the total line (English, French, Arabic).
pub const DEFAULT_TOTAL_KEYWORDS: &[&str] = &[
    "total",
    "totale",
    "total ttc",
    "ttc",
    "somme",
    "montant",
    "amount",
    "grand total",
    "net à payer",
    "net a payer",
    "à payer",
    "a payer",
    "total due",
    "balance due",
    "المجموع",
    "الإجمالي",
];

/// Header and contact words that never name the merchant.
pub const BOILERPLATE_WORDS: &[&str] = &[
    "receipt",
    "reçu",
    "ticket",
    "facture",
    "invoice",
    "tel:",
    "tél:",
    "phone:",
    "fax:",
    "فاتورة",
    "وصل",
];

/// Substrings marking e-mail and web lines.
pub const CONTACT_MARKERS: &[&str] = &["@", "www", "http"];

lazy_static! {
    /// Known stores, checked against the whole transcript before line heuristics.
    pub static ref STORE_RULES: Vec<PatternRule> = vec![
        PatternRule::new("MARJANE", r"(?i)\bmarjane\b"),
        PatternRule::new("CARREFOUR", r"(?i)\bcarrefour\b"),
        PatternRule::new("ACIMA", r"(?i)\bacima\b"),
        PatternRule::new("BIM", r"(?i)\bbim\b"),
        PatternRule::new("LABEL'VIE", r"(?i)\blabel\s?['’]?\s?vie\b"),
        PatternRule::new("ATACADAO", r"(?i)\batacad[aã]o\b"),
        PatternRule::new("ASWAK ASSALAM", r"(?i)\baswak\s+assalam\b"),
        PatternRule::new("HANOUTY", r"(?i)\bhanouty\b"),
    ];

    /// Date shapes. Numeric rules are word-bounded so `2024-03-12` is never
    /// read as `24-03-12`.
    pub static ref DATE_RULES: Vec<PatternRule> = vec![
        PatternRule::new("dmy-slash", r"\b\d{1,2}/\d{1,2}/(?:\d{4}|\d{2})\b"),
        PatternRule::new("dmy-dash", r"\b\d{1,2}-\d{1,2}-(?:\d{4}|\d{2})\b"),
        PatternRule::new("dmy-dot", r"\b\d{1,2}\.\d{1,2}\.(?:\d{4}|\d{2})\b"),
        PatternRule::new("ymd-dash", r"\b\d{4}-\d{1,2}-\d{1,2}\b"),
        PatternRule::new("ymd-slash", r"\b\d{4}/\d{1,2}/\d{1,2}\b"),
        PatternRule::new(
            "day-month-name",
            &format!(r"(?i)\b\d{{1,2}}\s+{MONTHS_EN}[a-z]*\.?\s+(?:\d{{4}}|\d{{2}})\b"),
        ),
        PatternRule::new(
            "day-month-name-fr",
            &format!(r"(?i)\b\d{{1,2}}\s+{MONTHS_FR}[a-zéû]*\.?\s+(?:\d{{4}}|\d{{2}})\b"),
        ),
        PatternRule::new(
            "month-name-day",
            &format!(r"(?i)\b{MONTHS_EN}[a-z]*\.?\s+\d{{1,2}},?\s+(?:\d{{4}}|\d{{2}})\b"),
        ),
    ];

    /// Amount shapes tried on a labeled line. Each has an `amount` group and
    /// optionally a `currency` group.
    pub static ref LINE_AMOUNT_RULES: Vec<PatternRule> = vec![
        PatternRule::new(
            "amount-currency",
            &format!(r"(?i)(?P<amount>{AMOUNT_NUMBER_SRC})\s*(?P<currency>DH|MAD|EUR|USD|€|\$|£)"),
        ),
        PatternRule::new(
            "currency-amount",
            &format!(r"(?i)(?P<currency>€|\$|£|MAD|DH)\s*(?P<amount>{AMOUNT_NUMBER_SRC})"),
        ),
        PatternRule::new("bare-amount", &format!(r"(?P<amount>{AMOUNT_NUMBER_SRC})")),
    ];

    pub static ref AMOUNT_NUMBER: Regex = Regex::new(AMOUNT_NUMBER_SRC).unwrap();

    // A number, then later a street-type word
    pub static ref ADDRESS: Regex = Regex::new(
        r"(?i)\d+\s+.*\b(?:rue|avenue|av|bd|blvd|boulevard|street|st|road|rd|route)\b"
    ).unwrap();

    pub static ref PHONE: Regex = Regex::new(
        r"\+?\d[\d\s().\-]{6,}\d"
    ).unwrap();

    // At least two letters of a script the keyword tables cover
    pub static ref LETTERS: Regex = Regex::new(
        r"[\p{Latin}\p{Arabic}]{2,}"
    ).unwrap();
}

/// Map a currency token found next to an amount to its ISO code.
pub fn currency_code(token: &str) -> Option<&'static str> {
    match token.to_uppercase().as_str() {
        "DH" | "MAD" => Some("MAD"),
        "€" | "EUR" => Some("EUR"),
        "$" | "USD" => Some("USD"),
        "£" => Some("GBP"),
        _ => None,
    }
}
