//! Network transport against the resolver service HTTP contract.

use async_trait::async_trait;
use url::Url;

use crate::error::ClientError;
use crate::models::{
    CitationResult, HealthStatus, ProcessDocumentRequest, ProcessDocumentResponse, RemoteSettings,
    SearchEnvelope, SettingsEnvelope, SyncedFieldsPayload,
};
use crate::transport::Transport;
use crate::utils::HttpClient;

/// Client for the resolver service endpoints under one base URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: HttpClient,
    base_url: String,
}

impl HttpTransport {
    /// Validate and store the base URL
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Url::parse(base_url)
            .map_err(|e| ClientError::Config(format!("invalid server URL {:?}: {}", base_url, e)))?;
        Ok(Self {
            client: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Transport with an injected HTTP client (tests)
    pub fn with_client(base_url: &str, client: HttpClient) -> Result<Self, ClientError> {
        let mut transport = Self::new(base_url)?;
        transport.client = client;
        Ok(transport)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let url = self.endpoint("/health");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Transport(format!(
                "health check returned {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    /// `GET /api/search`
    pub async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<crate::models::SearchArticle>, ClientError> {
        let url = format!(
            "{}?q={}&max={}",
            self.endpoint("/api/search"),
            urlencoding::encode(query),
            max_results
        );
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Transport(format!(
                "search returned {}",
                response.status()
            )));
        }
        let envelope: SearchEnvelope = response.json().await?;
        Ok(envelope.results)
    }

    /// `GET /api/settings`
    pub async fn fetch_settings(&self) -> Result<RemoteSettings, ClientError> {
        let url = self.endpoint("/api/settings");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Sync(format!(
                "settings fetch returned {}",
                response.status()
            )));
        }
        let envelope: SettingsEnvelope = response
            .json()
            .await
            .map_err(|e| ClientError::Sync(format!("malformed settings response: {}", e)))?;
        Ok(envelope.settings)
    }

    /// `POST /api/settings` — pushes the synced fields, returns the echoed
    /// settings carrying the new `last_modified` marker
    pub async fn push_settings(
        &self,
        payload: &SyncedFieldsPayload,
    ) -> Result<RemoteSettings, ClientError> {
        let url = self.endpoint("/api/settings");
        let response = self.client.post(&url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Sync(format!(
                "settings push returned {}",
                response.status()
            )));
        }
        let envelope: SettingsEnvelope = response
            .json()
            .await
            .map_err(|e| ClientError::Sync(format!("malformed settings response: {}", e)))?;
        Ok(envelope.settings)
    }

    /// `POST /api/process-document`
    pub async fn process_document(
        &self,
        content: &str,
        style: &str,
    ) -> Result<ProcessDocumentResponse, ClientError> {
        let url = self.endpoint("/api/process-document");
        let request = ProcessDocumentRequest {
            content: content.to_string(),
            style: style.to_string(),
        };
        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Transport(format!(
                "process-document returned {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn id(&self) -> &str {
        "server"
    }

    /// `GET /api/lookup`. Any transport-level problem (connect, timeout,
    /// non-2xx, body that is not CitationResult JSON) is an `Err` so the
    /// resolver falls back; a parsed `success: false` body is `Ok`.
    async fn lookup(&self, identifier: &str, style: &str) -> Result<CitationResult, ClientError> {
        let url = format!(
            "{}?id={}&style={}",
            self.endpoint("/api/lookup"),
            urlencoding::encode(identifier),
            urlencoding::encode(style)
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Transport(format!(
                "lookup returned {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
