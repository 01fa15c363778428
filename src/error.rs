//! Error taxonomy for the citation client.
//!
//! Transport-level failures are recovered internally by falling back to the
//! next transport; everything else surfaces to the caller through
//! [`ClientError`]. Background sync failures are swallowed at debug log
//! level by the sync engine rather than bubbling up.

/// Errors that can occur while resolving, inserting, or syncing citations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Network unreachable, non-2xx status, or malformed response body
    #[error("Transport error: {0}")]
    Transport(String),

    /// The resolver service answered but reported a lookup failure
    #[error("Lookup failed: {0}")]
    Lookup(String),

    /// The local resolver process could not be spawned or produced garbage
    #[error("Resolver process error: {0}")]
    ProcessSpawn(String),

    /// Settings pull or push could not complete
    #[error("Settings sync error: {0}")]
    Sync(String),

    /// Snapshot before a destructive rewrite could not be written
    #[error("Backup failed: {0}")]
    Backup(String),

    /// No backup recorded, or the recorded backup file no longer exists
    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    /// Parsing error (JSON body, settings file)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration could not be loaded or persisted
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(format!("JSON: {}", err))
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Config(err.to_string())
    }
}
