//! Idempotent, section-aware citation insertion.
//!
//! The inline mark always replaces the current selection. Endnote text is
//! deduplicated by exact content match and routed to an existing references
//! heading, or to a fresh `## References` section appended at the end.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::document::DocumentSurface;
use crate::error::ClientError;
use crate::models::CitationResult;

/// What part(s) of a citation to insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertFormat {
    /// Inline mark only
    Inline,
    /// Endnote text only, as a self-contained citation
    Endnote,
    /// Inline mark at the selection plus the endnote in the references section
    Full,
}

impl Default for InsertFormat {
    fn default() -> Self {
        InsertFormat::Full
    }
}

impl std::fmt::Display for InsertFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InsertFormat::Inline => "inline",
            InsertFormat::Endnote => "endnote",
            InsertFormat::Full => "full",
        };
        write!(f, "{}", s)
    }
}

/// What an insertion actually did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    /// The text placed at the selection site
    pub inserted: String,

    /// Whether the endnote was added (false when it already existed or the
    /// format did not call for one)
    pub endnote_added: bool,
}

/// A line reading `#`/`##` + one of the recognized references-section names
fn references_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^#{1,2}\s*(references|sources|citations|bibliography)\s*$")
            .expect("valid regex")
    })
}

/// Insert a citation into the document.
///
/// A failed [`CitationResult`] is rejected with [`ClientError::Lookup`]; the
/// caller decides how to surface it. For [`InsertFormat::Full`], the endnote
/// is only added when the document does not already contain it verbatim, so
/// repeated insertion of the same result stays idempotent on the references
/// section. Matching is exact text: the same source re-resolved in another
/// style produces different endnote text and is appended again.
pub fn insert_citation(
    result: &CitationResult,
    format: InsertFormat,
    doc: &mut dyn DocumentSurface,
) -> Result<InsertOutcome, ClientError> {
    if !result.success {
        return Err(ClientError::Lookup(result.error_message().to_string()));
    }

    match format {
        InsertFormat::Inline => {
            doc.replace_selection(&result.inline_mark);
            Ok(InsertOutcome {
                inserted: result.inline_mark.clone(),
                endnote_added: false,
            })
        }
        InsertFormat::Endnote => {
            doc.replace_selection(&result.endnote_text);
            Ok(InsertOutcome {
                inserted: result.endnote_text.clone(),
                endnote_added: false,
            })
        }
        InsertFormat::Full => {
            doc.replace_selection(&result.inline_mark);
            let endnote_added = append_endnote(doc, &result.endnote_text);
            Ok(InsertOutcome {
                inserted: result.endnote_text.clone(),
                endnote_added,
            })
        }
    }
}

/// Add `endnote` to the references section unless it is already present.
///
/// Returns whether the document was modified.
fn append_endnote(doc: &mut dyn DocumentSurface, endnote: &str) -> bool {
    let content = doc.value();
    if content.contains(endnote) {
        tracing::debug!("endnote already present, skipping duplicate");
        return false;
    }

    let updated = match references_heading_re().find(content) {
        Some(heading) => {
            // Insert immediately after the heading line
            let after_heading = content[heading.end()..]
                .find('\n')
                .map(|i| heading.end() + i + 1)
                .unwrap_or(content.len());
            let mut updated = String::with_capacity(content.len() + endnote.len() + 2);
            updated.push_str(&content[..after_heading]);
            if !updated.ends_with('\n') {
                updated.push('\n');
            }
            updated.push_str(endnote);
            updated.push('\n');
            updated.push_str(&content[after_heading..]);
            updated
        }
        None => {
            let mut updated = content.to_string();
            if !updated.is_empty() && !updated.ends_with('\n') {
                updated.push('\n');
            }
            updated.push_str("\n## References\n");
            updated.push_str(endnote);
            updated.push('\n');
            updated
        }
    };

    doc.set_value(updated);
    true
}
