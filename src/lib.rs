//! # citemark
//!
//! A resilient citation lookup-and-sync client. Resolves bibliographic
//! identifiers (PMID, DOI, PMCID, title, URL) into footnote-style citations,
//! inserts them idempotently into markdown documents, and keeps a small set
//! of behavioral settings mirrored with the remote resolver service.
//!
//! ## Architecture
//!
//! - [`models`]: Core data structures (CitationResult, SearchArticle, wire types)
//! - [`transport`]: Dual-transport request layer (network API with local
//!   resolver-process fallback) and the public NCBI search fallback
//! - [`document`]: Document surface abstraction, citation insertion, backup
//! - [`batch`]: Sequential multi-identifier resolution and whole-document processing
//! - [`sync`]: Settings synchronization engine and its poll scheduler
//! - [`history`]: Bounded, deduplicated recent-lookup store
//! - [`config`]: Client settings, persistence, and the settings controller
//! - [`ui`]: Host capability traits (notifications, prompts, clipboard)
//! - [`utils`]: Shared HTTP client

pub mod batch;
pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod models;
pub mod sync;
pub mod transport;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use config::{ClientSettings, SettingsController, SettingsStore};
pub use error::ClientError;
pub use models::{CitationResult, IdentifierType};
pub use transport::CitationResolver;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
