//! Core data models for citation lookups and the resolver wire contract.

mod citation;
mod remote;

pub use citation::{CitationMetadata, CitationResult, IdentifierType, SearchArticle};
pub use remote::{
    HealthStatus, ProcessDocumentRequest, ProcessDocumentResponse, RemoteSettings, SearchEnvelope,
    SettingsEnvelope, SyncedFieldsPayload,
};
