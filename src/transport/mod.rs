//! Dual-transport request layer.
//!
//! Lookups prefer the network transport against the configured resolver
//! service and fall back to a local resolver process when the network path
//! fails at the transport level. Both transports produce the same
//! [`CitationResult`] contract, so callers never see where an answer came
//! from. An application-level failure (the service answered
//! `success: false`) is NOT a transport failure and is returned as-is.
//!
//! Search has no process fallback; when the configured server is
//! unreachable it degrades to one best-effort NCBI E-utilities round trip.

mod http;
mod process;
mod pubmed;

pub use http::HttpTransport;
pub use process::ProcessTransport;
pub use pubmed::PubMedFallback;

use async_trait::async_trait;

use crate::config::ClientSettings;
use crate::error::ClientError;
use crate::models::{CitationResult, SearchArticle};

/// A mechanism capable of producing a [`CitationResult`] for an identifier
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Short identifier for log lines ("server", "process")
    fn id(&self) -> &str;

    /// Resolve one identifier into a citation.
    ///
    /// `Err` means the transport itself failed and the next transport should
    /// be tried; `Ok` with `success: false` means the resolver answered and
    /// declined, which is final.
    async fn lookup(&self, identifier: &str, style: &str) -> Result<CitationResult, ClientError>;
}

/// Sequences the transports and guarantees a well-formed outcome.
///
/// [`CitationResolver::lookup`] never fails: every error path terminates in
/// a `CitationResult` carrying the terminal error message.
#[derive(Debug)]
pub struct CitationResolver {
    network: Option<Box<dyn Transport>>,
    process: Box<dyn Transport>,
    search_server: Option<HttpTransport>,
    search_fallback: PubMedFallback,
}

impl CitationResolver {
    /// Build the resolver the settings describe
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ClientError> {
        let server = HttpTransport::new(&settings.server_url)?;
        let network: Option<Box<dyn Transport>> = if settings.server_enabled {
            Some(Box::new(server.clone()))
        } else {
            None
        };
        let search_server = settings.server_enabled.then_some(server);

        Ok(Self {
            network,
            process: Box::new(ProcessTransport::new(&settings.resolver_cli_path)),
            search_server,
            search_fallback: PubMedFallback::new(),
        })
    }

    /// Resolver over explicit transports (tests)
    pub fn with_transports(
        network: Option<Box<dyn Transport>>,
        process: Box<dyn Transport>,
    ) -> Self {
        Self {
            network,
            process,
            search_server: None,
            search_fallback: PubMedFallback::new(),
        }
    }

    /// Resolve one identifier, trying the network transport first and the
    /// local process on transport-level failure.
    pub async fn lookup(&self, identifier: &str, style: &str) -> CitationResult {
        if let Some(network) = &self.network {
            match network.lookup(identifier, style).await {
                Ok(result) => return result,
                Err(e) => {
                    tracing::debug!(
                        "{} transport failed ({}), falling back to {}",
                        network.id(),
                        e,
                        self.process.id()
                    );
                }
            }
        }

        match self.process.lookup(identifier, style).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("all transports exhausted for {}: {}", identifier, e);
                CitationResult::failure(identifier, e.to_string())
            }
        }
    }

    /// Search for articles, degrading to the public NCBI API when the
    /// configured server is unreachable. Zero hits is an empty list, not an
    /// error.
    pub async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<SearchArticle>, ClientError> {
        if let Some(server) = &self.search_server {
            match server.search(query, max_results).await {
                Ok(articles) => return Ok(articles),
                Err(e) => {
                    tracing::debug!("server search failed ({}), trying NCBI directly", e);
                }
            }
        }

        self.search_fallback.search(query, max_results).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Transport scripted to fail or answer, counting invocations
    #[derive(Debug)]
    struct ScriptedTransport {
        id: &'static str,
        calls: Arc<AtomicUsize>,
        outcome: Result<CitationResult, &'static str>,
    }

    impl ScriptedTransport {
        fn failing(id: &'static str, message: &'static str, calls: Arc<AtomicUsize>) -> Self {
            Self {
                id,
                calls,
                outcome: Err(message),
            }
        }

        fn answering(id: &'static str, result: CitationResult, calls: Arc<AtomicUsize>) -> Self {
            Self {
                id,
                calls,
                outcome: Ok(result),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        fn id(&self) -> &str {
            self.id
        }

        async fn lookup(
            &self,
            _identifier: &str,
            _style: &str,
        ) -> Result<CitationResult, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Ok(result) => Ok(result.clone()),
                Err(message) => Err(ClientError::Transport(message.to_string())),
            }
        }
    }

    fn ok_result(identifier: &str) -> CitationResult {
        CitationResult {
            success: true,
            identifier: identifier.to_string(),
            identifier_type: crate::models::IdentifierType::Pmid,
            inline_mark: format!("[^{}]", identifier),
            endnote_text: format!("[^{}]: citation", identifier),
            metadata: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_network_failure_invokes_fallback_exactly_once() {
        let network_calls = Arc::new(AtomicUsize::new(0));
        let process_calls = Arc::new(AtomicUsize::new(0));

        let resolver = CitationResolver::with_transports(
            Some(Box::new(ScriptedTransport::failing(
                "server",
                "connection refused",
                network_calls.clone(),
            ))),
            Box::new(ScriptedTransport::answering(
                "process",
                ok_result("37622666"),
                process_calls.clone(),
            )),
        );

        let result = resolver.lookup("37622666", "vancouver").await;
        assert!(result.success);
        assert_eq!(network_calls.load(Ordering::SeqCst), 1);
        assert_eq!(process_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_application_level_failure_does_not_fall_back() {
        let process_calls = Arc::new(AtomicUsize::new(0));
        let declined = CitationResult::failure("bad-id", "no match found");

        let resolver = CitationResolver::with_transports(
            Some(Box::new(ScriptedTransport::answering(
                "server",
                declined,
                Arc::new(AtomicUsize::new(0)),
            ))),
            Box::new(ScriptedTransport::answering(
                "process",
                ok_result("bad-id"),
                process_calls.clone(),
            )),
        );

        let result = resolver.lookup("bad-id", "vancouver").await;
        // The server's answer is final even though the process would succeed
        assert!(!result.success);
        assert_eq!(result.error_message(), "no match found");
        assert_eq!(process_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_both_transports_failing_yields_wellformed_failure() {
        let resolver = CitationResolver::with_transports(
            Some(Box::new(ScriptedTransport::failing(
                "server",
                "timeout",
                Arc::new(AtomicUsize::new(0)),
            ))),
            Box::new(ScriptedTransport::failing(
                "process",
                "spawn failed",
                Arc::new(AtomicUsize::new(0)),
            )),
        );

        let result = resolver.lookup("37622666", "vancouver").await;
        assert!(!result.success);
        assert!(result.inline_mark.is_empty());
        assert!(result.endnote_text.is_empty());
        assert!(result.error_message().contains("spawn failed"));
    }

    #[tokio::test]
    async fn test_disabled_network_skips_to_process() {
        let process_calls = Arc::new(AtomicUsize::new(0));
        let resolver = CitationResolver::with_transports(
            None,
            Box::new(ScriptedTransport::answering(
                "process",
                ok_result("123456"),
                process_calls.clone(),
            )),
        );

        let result = resolver.lookup("123456", "vancouver").await;
        assert!(result.success);
        assert_eq!(process_calls.load(Ordering::SeqCst), 1);
    }
}
