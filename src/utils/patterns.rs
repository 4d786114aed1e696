// src/utils/patterns.rs

//! Text patterns shared by both extraction tiers.

use std::sync::LazyLock;

use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
}

/// An email address anywhere in a text.
pub static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"));

/// A string that is exactly one email address.
static EMAIL_EXACT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$"));

/// Australian phone formats: +61 prefixed, 10 digits, or `(0x) xxxx xxxx`.
pub static PHONE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(\+61\d{9}|\d{10}|\(\d{2}\)\s?\d{4}\s?\d{4})"));

/// An http(s) or www-prefixed URL.
pub static WEBSITE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(https?://[^\s]+|www\.[^\s]+)"));

/// A capitalized personal name of two or more tokens, allowing initials.
pub static NAME_LINE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^([A-Z][a-z]+(?:\s[A-Z]\.?\s?[a-z]*)*\s[A-Z][a-z]+)$"));

/// A state or territory abbreviation token.
pub static STATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(?:VIC|NSW|QLD|SA|WA|TAS|NT|ACT)\b"));

/// A full line containing a state or territory token.
pub static ADDRESS_LINE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"[^\n]*\b(?:VIC|NSW|QLD|SA|WA|TAS|NT|ACT)\b[^\n]*"));

/// Professional designations recognised inside free text.
pub static DESIGNATION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(FCPA|FCCA|ACCA|FCA|CPA|CTA|CA)\b"));

/// Designations accepted when a whole line is just the designation.
pub const DESIGNATIONS: [&str; 4] = ["CA", "FCA", "CPA", "FCPA"];

/// Keywords that mark a line as a company name.
pub const COMPANY_KEYWORDS: [&str; 8] = [
    "Pty Ltd",
    "& Associates",
    "Limited",
    "Partners",
    "Group",
    "Accounting",
    "Advisory",
    "Chartered",
];

/// Whether `s` is exactly one syntactically valid email address.
pub fn is_valid_email(s: &str) -> bool {
    EMAIL_EXACT.is_match(s)
}

/// First email address found in `text`.
pub fn find_email(text: &str) -> Option<&str> {
    EMAIL.find(text).map(|m| m.as_str())
}

/// First phone number found in `text`.
pub fn find_phone(text: &str) -> Option<&str> {
    PHONE.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// First URL found in `text`.
pub fn find_website(text: &str) -> Option<&str> {
    WEBSITE.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Whether a line looks like a company name.
pub fn is_company_line(line: &str) -> bool {
    line.len() < 100
        && !line.contains('@')
        && !line.contains("http")
        && COMPANY_KEYWORDS.iter().any(|k| line.contains(k))
}

/// The name held by a line, if the line is name-shaped.
pub fn name_in_line(line: &str) -> Option<&str> {
    if line.contains('@') || line.contains("http") || line.contains("www") {
        return None;
    }
    if line.len() >= 60 || line.len() <= 5 {
        return None;
    }
    NAME_LINE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
