// src/services/extraction.rs

//! Member extraction from a results page.
//!
//! Structured containers are tried first. The line scan in
//! [`heuristics`](super::heuristics) runs only when no container yields a record.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{ExtractionConfig, MemberRecord};
use crate::services::heuristics::{LineRules, scan_lines, text_lines};
use crate::utils::patterns::{ADDRESS_LINE, DESIGNATION_TOKEN, find_email, find_phone, find_website};
use crate::utils::{normalize_whitespace, resolve};

/// Which tier produced a page's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionTier {
    Structured,
    LineScan,
}

/// Records found on a page and the tier that found them.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub members: Vec<MemberRecord>,
    pub tier: ExtractionTier,
}

/// Compiled extraction rules.
pub struct ExtractionEngine {
    containers: Vec<(String, Selector)>,
    name: Vec<Selector>,
    company: Vec<Selector>,
    phone: Vec<Selector>,
    address: Vec<Selector>,
    designation: Vec<Selector>,
    website: Vec<Selector>,
    rules: LineRules,
}

impl ExtractionEngine {
    /// Compile every configured selector. Fails on the first invalid one.
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let containers = config
            .container_selectors
            .iter()
            .map(|s| Ok((s.clone(), Self::parse_selector(s)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            containers,
            name: Self::parse_all(&config.name_selectors)?,
            company: Self::parse_all(&config.company_selectors)?,
            phone: Self::parse_all(&config.phone_selectors)?,
            address: Self::parse_all(&config.address_selectors)?,
            designation: Self::parse_all(&config.designation_selectors)?,
            website: Self::parse_all(&config.website_selectors)?,
            rules: LineRules::from_config(config),
        })
    }

    /// Extract records from a page, falling back to the line scan only when
    /// containers yield nothing.
    pub fn extract(&self, html: &str, visible_text: &str, page_url: &str) -> Extraction {
        let members = self.extract_structured(html, page_url);
        if !members.is_empty() {
            return Extraction {
                members,
                tier: ExtractionTier::Structured,
            };
        }

        log::debug!("No structured members, scanning visible text");
        Extraction {
            members: scan_lines(&text_lines(visible_text), &self.rules),
            tier: ExtractionTier::LineScan,
        }
    }

    /// Structured extraction. The first container selector with any match
    /// is used alone.
    pub fn extract_structured(&self, html: &str, page_url: &str) -> Vec<MemberRecord> {
        let document = Html::parse_document(html);

        let Some((selector_str, containers)) = self.containers.iter().find_map(|(s, sel)| {
            let found: Vec<ElementRef> = document.select(sel).collect();
            (!found.is_empty()).then_some((s, found))
        }) else {
            return Vec::new();
        };

        let members: Vec<MemberRecord> = containers
            .iter()
            .filter_map(|c| self.parse_container(c, page_url))
            .collect();

        log::debug!(
            "{} containers matched '{}', {} with email",
            containers.len(),
            selector_str,
            members.len()
        );
        members
    }

    fn parse_container(&self, container: &ElementRef, page_url: &str) -> Option<MemberRecord> {
        let text = element_lines(container);
        let mut record = find_email(&text).and_then(MemberRecord::with_email)?;

        let name = first_text(container, &self.name).unwrap_or_default();
        record.set_name(&name);

        record.company = first_text(container, &self.company).unwrap_or_default();

        record.phone = first_text(container, &self.phone)
            .or_else(|| find_phone(&text).map(str::to_string))
            .unwrap_or_default();

        record.business_address = first_text(container, &self.address)
            .or_else(|| {
                ADDRESS_LINE
                    .find(&text)
                    .map(|m| m.as_str().trim().to_string())
            })
            .unwrap_or_default();

        record.designation = first_text(container, &self.designation)
            .or_else(|| {
                DESIGNATION_TOKEN
                    .captures(&text)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
            })
            .unwrap_or_default();

        record.website = first_href(container, &self.website)
            .map(|href| resolve(page_url, &href))
            .or_else(|| find_website(&text).map(str::to_string));

        Some(record)
    }

    fn parse_all(selectors: &[String]) -> Result<Vec<Selector>> {
        selectors.iter().map(|s| Self::parse_selector(s)).collect()
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

/// Text nodes of an element, one per line.
fn element_lines(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of the first non-empty element matched by the chain.
fn first_text(container: &ElementRef, chain: &[Selector]) -> Option<String> {
    chain.iter().find_map(|sel| {
        container
            .select(sel)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
            .filter(|t| !t.is_empty())
    })
}

fn first_href(container: &ElementRef, chain: &[Selector]) -> Option<String> {
    chain.iter().find_map(|sel| {
        container
            .select(sel)
            .find_map(|el| el.value().attr("href"))
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://www.charteredaccountantsanz.com/find-a-ca";

    fn engine() -> ExtractionEngine {
        ExtractionEngine::new(&ExtractionConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let config = ExtractionConfig {
            name_selectors: vec!["[[invalid".to_string()],
            ..ExtractionConfig::default()
        };
        assert!(matches!(
            ExtractionEngine::new(&config),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn test_structured_fields() {
        let html = r#"
            <div class="member-card">
              <h3>Jane  Q Citizen</h3>
              <div class="company">Citizen Advisory</div>
              <a href="tel:0398765432">(03) 9876 5432</a>
              <p>Level 1, 100 Collins St, Melbourne VIC 3000</p>
              <span>CA</span>
              <a href="mailto:jane@citizen.com.au">jane@citizen.com.au</a>
              <a href="https://citizen.com.au/about">Website</a>
            </div>
            <div class="member-card"><h3>No Email</h3></div>
        "#;

        let members = engine().extract_structured(html, PAGE_URL);
        assert_eq!(members.len(), 1);

        let m = &members[0];
        assert_eq!(m.email, "jane@citizen.com.au");
        assert_eq!(m.name, "Jane Q Citizen");
        assert_eq!(m.first_name, "Jane");
        assert_eq!(m.middle_name, "Q");
        assert_eq!(m.last_name, "Citizen");
        assert_eq!(m.company, "Citizen Advisory");
        assert_eq!(m.phone, "(03) 9876 5432");
        assert_eq!(m.business_address, "Level 1, 100 Collins St, Melbourne VIC 3000");
        assert_eq!(m.designation, "CA");
        assert_eq!(m.website.as_deref(), Some("https://citizen.com.au/about"));
    }

    #[test]
    fn test_first_matching_container_class_used_alone() {
        let html = r#"
            <div class="search-result"><h3>Only Result</h3>x@result.com</div>
            <div class="card"><h3>Card Person</h3>y@card.com</div>
        "#;

        let members = engine().extract_structured(html, PAGE_URL);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].email, "x@result.com");
    }

    #[test]
    fn test_structured_wins_over_line_scan() {
        let html = r#"<div class="member"><h4>Tom Reed</h4>tom@reed.com</div>"#;
        let text = "Ann Lake\nann@lake.com\nBen Hill\nben@hill.com";

        let extraction = engine().extract(html, text, PAGE_URL);
        assert_eq!(extraction.tier, ExtractionTier::Structured);
        assert_eq!(extraction.members.len(), 1);
        assert_eq!(extraction.members[0].email, "tom@reed.com");
    }

    #[test]
    fn test_falls_back_to_line_scan() {
        let html = "<html><body><p>Results</p></body></html>";
        let text = "Ann Lake\na@x.com\nBen Hill\nb@y.com";

        let extraction = engine().extract(html, text, PAGE_URL);
        assert_eq!(extraction.tier, ExtractionTier::LineScan);
        assert_eq!(extraction.members.len(), 2);
        assert_eq!(extraction.members[0].last_name, "Lake");
        assert_eq!(extraction.members[1].first_name, "Ben");
    }

    #[test]
    fn test_containers_without_email_fall_back() {
        let html = r#"<div class="card"><h3>Contact us</h3></div>"#;
        let extraction = engine().extract(html, "Cat Moss\ncat@moss.com", PAGE_URL);
        assert_eq!(extraction.tier, ExtractionTier::LineScan);
        assert_eq!(extraction.members[0].name, "Cat Moss");
    }

    #[test]
    fn test_relative_website_resolved() {
        let html = r#"<div class="card">a@x.com <a href="http-guide/profile">Profile</a></div>"#;
        let members = engine().extract_structured(html, PAGE_URL);
        assert_eq!(
            members[0].website.as_deref(),
            Some("https://www.charteredaccountantsanz.com/http-guide/profile")
        );
    }
}
