//! Sequential batch resolution and whole-document processing.
//!
//! Batches run strictly one identifier at a time, in input order, so
//! progress reports deterministically and the resolver service is never
//! hammered concurrently. An individual failure never aborts the batch.

use std::path::Path;

use crate::config::ClientSettings;
use crate::document::backup_document;
use crate::error::ClientError;
use crate::models::CitationResult;
use crate::transport::{CitationResolver, HttpTransport};
use crate::ui::{ConfirmationPrompt, NotificationSink};

/// Ordered outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    results: Vec<CitationResult>,
}

impl BatchReport {
    pub fn results(&self) -> &[CitationResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Successful results, in processing order
    pub fn successes(&self) -> Vec<&CitationResult> {
        self.results.iter().filter(|r| r.success).collect()
    }

    /// Failed results paired with their original identifier
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| (r.identifier.as_str(), r.error_message()))
            .collect()
    }
}

/// Trim lines, dropping blanks and `#`-prefixed comments
pub fn filter_identifiers(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Resolve a list of identifiers strictly sequentially.
///
/// Every identifier produces exactly one entry in the report, so the report
/// length always equals the input length.
pub async fn process_batch(
    identifiers: &[String],
    resolver: &CitationResolver,
    style: &str,
    notifier: &dyn NotificationSink,
) -> BatchReport {
    let mut report = BatchReport::default();

    for (index, identifier) in identifiers.iter().enumerate() {
        tracing::debug!("batch item {}/{}: {}", index + 1, identifiers.len(), identifier);
        let result = resolver.lookup(identifier, style).await;
        if result.success {
            notifier.notify(&format!(
                "[{}/{}] resolved {}",
                index + 1,
                identifiers.len(),
                identifier
            ));
        } else {
            notifier.notify(&format!(
                "[{}/{}] failed {}: {}",
                index + 1,
                identifiers.len(),
                identifier,
                result.error_message()
            ));
        }
        report.results.push(result);
    }

    report
}

/// Outcome of a whole-document rewrite
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The document was rewritten
    Processed {
        statistics: Option<serde_json::Value>,
        failed_references: Vec<String>,
    },
    /// The user declined at a confirmation step
    Cancelled,
}

/// Send a whole document through the resolver service and rewrite it in
/// place.
///
/// This is the one destructive operation in the client: it requires
/// confirmation, snapshots the document first when the backup preference is
/// on, and never touches the file when the server reports failure. A failed
/// backup stops the rewrite unless the user explicitly chooses to proceed
/// without one.
pub async fn process_document(
    server: &HttpTransport,
    document_path: &Path,
    settings: &mut ClientSettings,
    prompt: &dyn ConfirmationPrompt,
    notifier: &dyn NotificationSink,
) -> Result<ProcessOutcome, ClientError> {
    let content = std::fs::read_to_string(document_path)?;

    if !prompt.ask(&format!(
        "Process and rewrite {}? This replaces the whole document.",
        document_path.display()
    )) {
        return Ok(ProcessOutcome::Cancelled);
    }

    if settings.backup_before_processing {
        match backup_document(document_path, &content, settings) {
            Ok(path) => notifier.notify(&format!("backup written to {}", path.display())),
            Err(e) => {
                tracing::warn!("backup failed: {}", e);
                if !prompt.ask(&format!("Backup failed ({}). Proceed without backup?", e)) {
                    return Ok(ProcessOutcome::Cancelled);
                }
            }
        }
    }

    let response = server
        .process_document(&content, &settings.citation_style)
        .await?;

    if !response.success {
        return Err(ClientError::Lookup(
            response
                .error
                .unwrap_or_else(|| "document processing failed".to_string()),
        ));
    }

    let processed = response.processed_content.ok_or_else(|| {
        ClientError::Parse("server reported success without processed content".to_string())
    })?;
    std::fs::write(document_path, processed)?;

    Ok(ProcessOutcome::Processed {
        statistics: response.statistics,
        failed_references: response.failed_references,
    })
}
