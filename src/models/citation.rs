//! Citation result contract shared by every transport.
//!
//! All transports (network API, local resolver process) normalize their
//! outcome into a [`CitationResult`] so the insertion engine and the
//! recent-lookup cache never care where a citation came from.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// The kind of identifier a lookup was keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierType {
    Pmid,
    Doi,
    Pmcid,
    Title,
    Url,
    Unknown,
}

impl IdentifierType {
    /// Classify a raw user input into an identifier type.
    ///
    /// PMIDs are 4-9 digit numbers, PMCIDs carry a `PMC` prefix, DOIs start
    /// with a `10.` registrant prefix (optionally behind `doi:` or a
    /// doi.org URL), anything that looks like a URL is a URL, and the rest
    /// is treated as a title query.
    pub fn classify(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return IdentifierType::Unknown;
        }

        static PMID_RE: OnceLock<Regex> = OnceLock::new();
        static PMCID_RE: OnceLock<Regex> = OnceLock::new();
        static DOI_RE: OnceLock<Regex> = OnceLock::new();

        let pmid = PMID_RE.get_or_init(|| Regex::new(r"^\d{4,9}$").expect("valid regex"));
        let pmcid =
            PMCID_RE.get_or_init(|| Regex::new(r"(?i)^PMC\d+$").expect("valid regex"));
        let doi = DOI_RE.get_or_init(|| {
            Regex::new(r"(?i)^(?:doi:\s*|https?://(?:dx\.)?doi\.org/)?10\.\d{4,}/\S+$")
                .expect("valid regex")
        });

        if pmid.is_match(input) {
            IdentifierType::Pmid
        } else if pmcid.is_match(input) {
            IdentifierType::Pmcid
        } else if doi.is_match(input) {
            IdentifierType::Doi
        } else if input.starts_with("http://") || input.starts_with("https://") {
            IdentifierType::Url
        } else {
            IdentifierType::Title
        }
    }

    /// Short identifier string (matches the wire format)
    pub fn id(&self) -> &'static str {
        match self {
            IdentifierType::Pmid => "pmid",
            IdentifierType::Doi => "doi",
            IdentifierType::Pmcid => "pmcid",
            IdentifierType::Title => "title",
            IdentifierType::Url => "url",
            IdentifierType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl Default for IdentifierType {
    fn default() -> Self {
        IdentifierType::Unknown
    }
}

/// Structured bibliographic metadata attached to a successful lookup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CitationMetadata {
    #[serde(default)]
    pub title: Option<String>,

    /// Authors in citation order
    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub journal: Option<String>,

    #[serde(default)]
    pub year: Option<String>,

    #[serde(default)]
    pub volume: Option<String>,

    #[serde(default)]
    pub issue: Option<String>,

    #[serde(default)]
    pub pages: Option<String>,

    #[serde(default)]
    pub doi: Option<String>,

    #[serde(default)]
    pub pmid: Option<String>,

    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
}

/// Normalized outcome of a citation lookup
///
/// Invariant: a successful result carries a non-empty inline mark and
/// endnote text; a failed result carries empty marks and a populated error.
/// Results are constructed once per lookup and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationResult {
    pub success: bool,

    /// The identifier that was looked up
    pub identifier: String,

    #[serde(default)]
    pub identifier_type: IdentifierType,

    /// Short footnote-style token inserted at the citation site
    #[serde(default)]
    pub inline_mark: String,

    /// Full formatted citation text for the references section.
    /// The resolver CLI emits this as `endnote_citation` (older builds used
    /// `full_citation`).
    #[serde(default, alias = "endnote_citation", alias = "full_citation")]
    pub endnote_text: String,

    #[serde(default)]
    pub metadata: Option<CitationMetadata>,

    #[serde(default)]
    pub error: Option<String>,
}

impl CitationResult {
    /// Construct a failed result for an identifier
    pub fn failure(identifier: impl Into<String>, error: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self {
            success: false,
            identifier_type: IdentifierType::classify(&identifier),
            identifier,
            inline_mark: String::new(),
            endnote_text: String::new(),
            metadata: None,
            error: Some(error.into()),
        }
    }

    /// Error message for a failed result, or a generic fallback
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("unknown error")
    }
}

/// One row of a search result list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchArticle {
    pub pmid: String,
    pub title: String,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub journal: Option<String>,

    #[serde(default)]
    pub year: Option<String>,

    #[serde(default)]
    pub doi: Option<String>,
}

impl SearchArticle {
    /// Compact single-line summary for terminal display
    pub fn summary(&self) -> String {
        let mut line = format!("{} — {}", self.pmid, self.title);
        if let Some(journal) = &self.journal {
            line.push_str(&format!(" ({}", journal));
            if let Some(year) = &self.year {
                line.push_str(&format!(", {}", year));
            }
            line.push(')');
        } else if let Some(year) = &self.year {
            line.push_str(&format!(" ({})", year));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_pmid() {
        assert_eq!(IdentifierType::classify("37622666"), IdentifierType::Pmid);
        assert_eq!(IdentifierType::classify("1234"), IdentifierType::Pmid);
        // Too short or too long for a PMID
        assert_ne!(IdentifierType::classify("123"), IdentifierType::Pmid);
        assert_ne!(IdentifierType::classify("1234567890"), IdentifierType::Pmid);
    }

    #[test]
    fn test_classify_pmcid() {
        assert_eq!(IdentifierType::classify("PMC9378600"), IdentifierType::Pmcid);
        assert_eq!(IdentifierType::classify("pmc123"), IdentifierType::Pmcid);
    }

    #[test]
    fn test_classify_doi() {
        assert_eq!(
            IdentifierType::classify("10.1056/NEJMoa2034577"),
            IdentifierType::Doi
        );
        assert_eq!(
            IdentifierType::classify("doi:10.1056/NEJMoa2034577"),
            IdentifierType::Doi
        );
        assert_eq!(
            IdentifierType::classify("https://doi.org/10.1056/NEJMoa2034577"),
            IdentifierType::Doi
        );
    }

    #[test]
    fn test_classify_url_and_title() {
        assert_eq!(
            IdentifierType::classify("https://example.com/article"),
            IdentifierType::Url
        );
        assert_eq!(
            IdentifierType::classify("mRNA vaccine efficacy"),
            IdentifierType::Title
        );
        assert_eq!(IdentifierType::classify("  "), IdentifierType::Unknown);
    }

    #[test]
    fn test_failure_result_shape() {
        let result = CitationResult::failure("bad-id", "no match");
        assert!(!result.success);
        assert!(result.inline_mark.is_empty());
        assert!(result.endnote_text.is_empty());
        assert_eq!(result.error_message(), "no match");
        assert_eq!(result.identifier_type, IdentifierType::Title);
    }

    #[test]
    fn test_deserialize_cli_field_alias() {
        // The resolver CLI emits `endnote_citation`; older builds emitted
        // `full_citation`. Both must land in `endnote_text`.
        let json = r#"{
            "success": true,
            "identifier": "37622666",
            "identifier_type": "pmid",
            "inline_mark": "[^SmithJ-2023-37622666]",
            "endnote_citation": "[^SmithJ-2023-37622666]: Smith J. et al.",
            "metadata": null,
            "error": null
        }"#;
        let result: CitationResult = serde_json::from_str(json).unwrap();
        assert!(result.success);
        assert_eq!(result.endnote_text, "[^SmithJ-2023-37622666]: Smith J. et al.");

        let legacy = r#"{"success": true, "identifier": "x", "inline_mark": "[^x]", "full_citation": "[^x]: text"}"#;
        let result: CitationResult = serde_json::from_str(legacy).unwrap();
        assert_eq!(result.endnote_text, "[^x]: text");
    }
}
