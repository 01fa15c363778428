//! Client settings and their persistence.
//!
//! A single [`ClientSettings`] value holds both purely local fields (paths,
//! insertion preferences, recent lookups, backup bookkeeping) and the fields
//! mirrored to the resolver service (citation style, backup-on-process flag,
//! search result cap). Synced fields are only ever overwritten by a sync
//! operation; local writes go through [`SettingsStore::save`] so every
//! mutation is persisted.
//!
//! Settings load from a TOML file in the platform config directory, merged
//! over the hard-coded defaults, with `CITEMARK_*` environment variables
//! layered on top.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::InsertFormat;
use crate::error::ClientError;
use crate::history::RecentLookups;
use crate::models::SyncedFieldsPayload;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Base URL of the resolver service
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Whether the network transport is tried at all
    #[serde(default = "default_true")]
    pub server_enabled: bool,

    /// Resolver CLI executable used as the local-process fallback
    #[serde(default = "default_resolver_cli")]
    pub resolver_cli_path: String,

    /// Citation style requested from the resolver (synced field)
    #[serde(default = "default_citation_style")]
    pub citation_style: String,

    /// Snapshot the document before a whole-document rewrite (synced field)
    #[serde(default = "default_true")]
    pub backup_before_processing: bool,

    /// Result cap passed to search requests (synced field)
    #[serde(default = "default_max_search_results")]
    pub max_search_results: u32,

    /// Format used when a command does not specify one
    #[serde(default)]
    pub default_insert_format: InsertFormat,

    /// Copy inserted citation text to the system clipboard
    #[serde(default)]
    pub auto_copy: bool,

    /// Whether the background settings poll runs
    #[serde(default = "default_true")]
    pub sync_enabled: bool,

    /// Seconds between background polls
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,

    /// Server-supplied change marker from the last applied sync.
    /// Used only for conflict detection, never displayed.
    #[serde(default)]
    pub last_known_server_modified: Option<String>,

    /// Wall-clock timestamp of the last completed sync, for display
    #[serde(default)]
    pub last_server_sync: Option<String>,

    /// One-slot pointer to the most recent document backup
    #[serde(default)]
    pub last_backup_path: Option<PathBuf>,

    /// Bounded store of recent successful lookups
    #[serde(default)]
    pub recent_lookups: RecentLookups,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            server_enabled: true,
            resolver_cli_path: default_resolver_cli(),
            citation_style: default_citation_style(),
            backup_before_processing: true,
            max_search_results: default_max_search_results(),
            default_insert_format: InsertFormat::default(),
            auto_copy: false,
            sync_enabled: true,
            sync_interval_secs: default_sync_interval(),
            last_known_server_modified: None,
            last_server_sync: None,
            last_backup_path: None,
            recent_lookups: RecentLookups::new(),
        }
    }
}

impl ClientSettings {
    /// The synced fields as the push payload
    pub fn synced_fields(&self) -> SyncedFieldsPayload {
        SyncedFieldsPayload {
            default_citation_style: self.citation_style.clone(),
            create_backup_on_process: self.backup_before_processing,
            max_search_results: self.max_search_results,
        }
    }
}

fn default_server_url() -> String {
    "http://127.0.0.1:8765".to_string()
}

fn default_resolver_cli() -> String {
    "citation-resolver".to_string()
}

fn default_citation_style() -> String {
    "vancouver".to_string()
}

fn default_max_search_results() -> u32 {
    20
}

fn default_sync_interval() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Loads and persists the settings file.
///
/// All mutation flows through [`SettingsStore::save`]; components receive
/// the settings value by reference and never write the file themselves.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at the platform config directory
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("citemark");
        Self {
            path: config_dir.join("settings.toml"),
        }
    }

    /// Store at an explicit path (tests, `--config` flag)
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings merged over defaults, with `CITEMARK_*` environment
    /// overrides. A missing file yields the defaults.
    pub fn load(&self) -> Result<ClientSettings, ClientError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(self.path.as_path()).required(false))
            .add_source(config::Environment::with_prefix("CITEMARK"));

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Persist the settings as TOML, creating the parent directory if needed
    pub fn save(&self, settings: &ClientSettings) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(settings)
            .map_err(|e| ClientError::Config(format!("failed to serialize settings: {}", e)))?;
        fs::write(&self.path, rendered)?;
        tracing::debug!("settings saved to {}", self.path.display());
        Ok(())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Owner of the in-memory settings value.
///
/// Components hold a clone of the controller and read or mutate through it;
/// every mutation is persisted before the lock is released, so the file
/// never lags the in-memory state. The lock is never held across an await
/// point.
#[derive(Debug, Clone)]
pub struct SettingsController {
    settings: std::sync::Arc<std::sync::Mutex<ClientSettings>>,
    store: SettingsStore,
}

impl SettingsController {
    pub fn new(settings: ClientSettings, store: SettingsStore) -> Self {
        Self {
            settings: std::sync::Arc::new(std::sync::Mutex::new(settings)),
            store,
        }
    }

    /// Load from the store and wrap the result
    pub fn load(store: SettingsStore) -> Result<Self, ClientError> {
        let settings = store.load()?;
        Ok(Self::new(settings, store))
    }

    /// Read access
    pub fn with<R>(&self, f: impl FnOnce(&ClientSettings) -> R) -> R {
        let guard = self.settings.lock().expect("settings lock poisoned");
        f(&guard)
    }

    /// Owned copy of the current settings
    pub fn snapshot(&self) -> ClientSettings {
        self.with(|s| s.clone())
    }

    /// Mutate and persist in one step
    pub fn update<R>(&self, f: impl FnOnce(&mut ClientSettings) -> R) -> Result<R, ClientError> {
        let mut guard = self.settings.lock().expect("settings lock poisoned");
        let value = f(&mut guard);
        self.store.save(&guard)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ClientSettings::default();
        assert!(settings.server_enabled);
        assert!(settings.sync_enabled);
        assert_eq!(settings.sync_interval_secs, 30);
        assert_eq!(settings.citation_style, "vancouver");
        assert_eq!(settings.max_search_results, 20);
        assert!(settings.last_known_server_modified.is_none());
        assert!(settings.recent_lookups.is_empty());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("settings.toml"));
        let settings = store.load().unwrap();
        assert_eq!(settings.citation_style, "vancouver");
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("settings.toml"));

        let mut settings = ClientSettings::default();
        settings.citation_style = "apa".to_string();
        settings.auto_copy = true;
        settings.recent_lookups.record("37622666", "[^SmithJ-2023]");
        settings.last_known_server_modified = Some("2026-01-05T10:00:00Z".to_string());
        store.save(&settings).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.citation_style, "apa");
        assert!(reloaded.auto_copy);
        assert_eq!(reloaded.recent_lookups.len(), 1);
        assert_eq!(
            reloaded.last_known_server_modified.as_deref(),
            Some("2026-01-05T10:00:00Z")
        );
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "citation_style = \"mla\"\n").unwrap();

        let settings = SettingsStore::at(&path).load().unwrap();
        assert_eq!(settings.citation_style, "mla");
        // Everything else keeps its default
        assert!(settings.server_enabled);
        assert_eq!(settings.max_search_results, 20);
    }
}
