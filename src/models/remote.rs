//! Wire types for the resolver service HTTP contract.

use serde::{Deserialize, Serialize};

use crate::models::SearchArticle;

/// Response of `GET /health`
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,

    #[serde(default)]
    pub version: Option<String>,
}

/// Envelope of `GET /api/search`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchEnvelope {
    #[serde(default)]
    pub results: Vec<SearchArticle>,
}

/// Synced settings as the server stores them.
///
/// Every field is optional so conflict resolution can apply the payload
/// field-by-field: a field the server omits never clobbers the local value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteSettings {
    #[serde(default)]
    pub default_citation_style: Option<String>,

    #[serde(default)]
    pub create_backup_on_process: Option<bool>,

    #[serde(default)]
    pub max_search_results: Option<u32>,

    /// Opaque change-detection marker attached by the server
    #[serde(default)]
    pub last_modified: Option<String>,
}

/// Envelope wrapping the settings object on both GET and POST
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsEnvelope {
    pub settings: RemoteSettings,
}

/// Body of `POST /api/settings` (synced fields only)
#[derive(Debug, Clone, Serialize)]
pub struct SyncedFieldsPayload {
    pub default_citation_style: String,
    pub create_backup_on_process: bool,
    pub max_search_results: u32,
}

/// Body of `POST /api/process-document`
#[derive(Debug, Clone, Serialize)]
pub struct ProcessDocumentRequest {
    pub content: String,
    pub style: String,
}

/// Response of `POST /api/process-document`
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessDocumentResponse {
    pub success: bool,

    #[serde(default)]
    pub processed_content: Option<String>,

    /// Server-side counters (reference totals etc.), shape left to the server
    #[serde(default)]
    pub statistics: Option<serde_json::Value>,

    #[serde(default)]
    pub failed_references: Vec<String>,

    #[serde(default)]
    pub error: Option<String>,
}
