// src/services/heuristics.rs

//! Line-scan extraction over a page's visible text.
//!
//! Used when a results page has no usable member containers. An email on a
//! line starts a new record; the name is looked for just above it and the
//! other fields in the lines that follow. Fields can bleed between adjacent
//! listings on irregular pages.

use crate::models::{ExtractionConfig, MemberRecord};
use crate::utils::patterns::{
    DESIGNATIONS, STATE_TOKEN, find_email, find_phone, find_website, is_company_line,
    name_in_line,
};

/// Tunables for the line scan.
#[derive(Debug, Clone)]
pub struct LineRules {
    /// Lines containing any of these are skipped as page chrome
    pub boilerplate: Vec<String>,
    /// Number of lines above an email searched for a name
    pub name_window: usize,
}

impl LineRules {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            boilerplate: config.boilerplate.clone(),
            name_window: config.name_window,
        }
    }

    fn is_boilerplate(&self, line: &str) -> bool {
        self.boilerplate.iter().any(|k| line.contains(k.as_str()))
    }
}

impl Default for LineRules {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

/// Split rendered text into trimmed, non-empty lines.
pub fn text_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Scan `lines` for member records.
pub fn scan_lines(lines: &[&str], rules: &LineRules) -> Vec<MemberRecord> {
    let mut members = Vec::new();
    let mut current: Option<MemberRecord> = None;

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() || rules.is_boilerplate(line) {
            continue;
        }

        if let Some(record) = find_email(line).and_then(MemberRecord::with_email) {
            members.extend(current.take());
            current = Some(start_record(record, lines, i, rules.name_window));
        }

        if let Some(record) = current.as_mut() {
            fill_fields(record, line);
        }
    }

    members.extend(current);
    members
}

/// Attach the closest name-shaped line within `window` lines above `at`.
fn start_record(mut record: MemberRecord, lines: &[&str], at: usize, window: usize) -> MemberRecord {
    let from = at.saturating_sub(window);
    if let Some(name) = lines[from..at]
        .iter()
        .rev()
        .find_map(|l| name_in_line(l.trim()))
    {
        record.set_name(name);
    }
    record
}

/// First match wins for every field.
fn fill_fields(record: &mut MemberRecord, line: &str) {
    if record.phone.is_empty() {
        if let Some(phone) = find_phone(line) {
            record.phone = phone.to_string();
        }
    }

    if record.business_address.is_empty() && STATE_TOKEN.is_match(line) {
        record.business_address = line.to_string();
    }

    if record.company.is_empty() && is_company_line(line) {
        record.company = line.to_string();
    }

    if record.designation.is_empty() && DESIGNATIONS.contains(&line) {
        record.designation = line.to_string();
    }

    if record.website.is_none() {
        record.website = find_website(line).map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> Vec<MemberRecord> {
        scan_lines(&text_lines(text), &LineRules::default())
    }

    #[test]
    fn test_two_listings() {
        let members = scan(
            "Skip to content\n\
             Jane Smith\n\
             a@x.com\n\
             \n\
             John Paul Doe\n\
             b@y.com\n",
        );

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].email, "a@x.com");
        assert_eq!(members[0].first_name, "Jane");
        assert_eq!(members[0].last_name, "Smith");
        assert_eq!(members[1].email, "b@y.com");
        assert_eq!(members[1].first_name, "John");
        assert_eq!(members[1].middle_name, "Paul");
        assert_eq!(members[1].last_name, "Doe");
    }

    #[test]
    fn test_fields_after_email() {
        let members = scan(
            "Mary Jones\n\
             mary@jonesca.com.au\n\
             Jones Accounting Pty Ltd\n\
             Level 2, 10 Queen St, Brisbane QLD 4000\n\
             (07) 3000 1234\n\
             FCA\n\
             www.jonesca.com.au\n\
             0712345678\n",
        );

        assert_eq!(members.len(), 1);
        let m = &members[0];
        assert_eq!(m.name, "Mary Jones");
        assert_eq!(m.company, "Jones Accounting Pty Ltd");
        assert_eq!(m.business_address, "Level 2, 10 Queen St, Brisbane QLD 4000");
        assert_eq!(m.phone, "(07) 3000 1234");
        assert_eq!(m.designation, "FCA");
        assert_eq!(m.website.as_deref(), Some("www.jonesca.com.au"));
    }

    #[test]
    fn test_closest_name_wins() {
        let members = scan("Alice Brown\nBob Green\nbob@green.com\n");
        assert_eq!(members[0].name, "Bob Green");
    }

    #[test]
    fn test_name_outside_window_ignored() {
        let mut text = String::from("Carol White\n");
        for i in 0..8 {
            text.push_str(&format!("line {i}\n"));
        }
        text.push_str("carol@white.com\n");

        let members = scan(&text);
        assert_eq!(members.len(), 1);
        assert!(members[0].name.is_empty());
    }

    #[test]
    fn test_boilerplate_email_line_skipped() {
        let members = scan("Filter results by admin@site.com\nDan Lee\ndan@lee.com\n");
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].email, "dan@lee.com");
    }

    #[test]
    fn test_designation_must_be_whole_line() {
        let members = scan("Eve Adams\neve@adams.com\nCA ANZ member\nCPA\n");
        assert_eq!(members[0].designation, "CPA");
    }

    #[test]
    fn test_no_email_no_records() {
        assert!(scan("Jane Smith\nSmith Accounting Pty Ltd\n").is_empty());
        assert!(scan("").is_empty());
    }
}
