//! Bidirectional settings synchronization.
//!
//! A subset of the settings (citation style, backup-on-process flag, search
//! result cap) is mirrored between this client and the resolver service.
//! Change detection rides on the server's opaque `last_modified` marker:
//! a poll that sees a marker differing from the locally recorded one applies
//! the remote values field-by-field, then records the new marker. Pushes go
//! the other way and record the marker the server echoes back. The policy is
//! last-writer-wins with the server as tiebreaker; concurrent edits to the
//! same field are not merged, the later write observed by the server wins.
//!
//! Background polling is owned by [`SyncScheduler`], which guarantees at
//! most one timer task per process and never lets polls overlap.

use chrono::Utc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::{ClientSettings, SettingsController};
use crate::error::ClientError;
use crate::models::RemoteSettings;
use crate::transport::HttpTransport;

/// Apply a fetched remote settings object to the local copy.
///
/// No-op when the server's marker equals the locally recorded one. When the
/// markers differ the remote is authoritative: every synced field the
/// payload supplies overwrites the local value, fields the payload omits are
/// left alone, and the local marker takes the server's value. Returns
/// whether anything was applied.
pub fn apply_remote(settings: &mut ClientSettings, remote: &RemoteSettings) -> bool {
    if remote.last_modified == settings.last_known_server_modified {
        return false;
    }

    if let Some(style) = &remote.default_citation_style {
        settings.citation_style = style.clone();
    }
    if let Some(backup) = remote.create_backup_on_process {
        settings.backup_before_processing = backup;
    }
    if let Some(max) = remote.max_search_results {
        settings.max_search_results = max;
    }

    settings.last_known_server_modified = remote.last_modified.clone();
    settings.last_server_sync = Some(Utc::now().to_rfc3339());
    true
}

/// One pull/push endpoint pair against the resolver service
#[derive(Debug, Clone)]
pub struct SyncEngine {
    server: HttpTransport,
}

impl SyncEngine {
    pub fn new(server: HttpTransport) -> Self {
        Self { server }
    }

    /// Fetch the remote settings and apply them locally.
    ///
    /// Returns whether anything changed. Persists through the controller
    /// only when a change was applied.
    pub async fn pull(&self, controller: &SettingsController) -> Result<bool, ClientError> {
        let remote = self.server.fetch_settings().await?;

        let changed = controller.with(|s| {
            remote.last_modified != s.last_known_server_modified
        });
        if !changed {
            return Ok(false);
        }

        controller.update(|s| apply_remote(s, &remote))
    }

    /// Push the local synced fields and record the marker the server echoes
    pub async fn push(&self, controller: &SettingsController) -> Result<bool, ClientError> {
        let payload = controller.with(|s| s.synced_fields());
        let echoed = self.server.push_settings(&payload).await?;

        controller.update(|s| {
            s.last_known_server_modified = echoed.last_modified.clone();
            s.last_server_sync = Some(Utc::now().to_rfc3339());
        })?;
        Ok(true)
    }
}

/// Owner of the single background poll timer.
///
/// The poll loop awaits each pull before sleeping again, so a slow server
/// never causes overlapping polls. `start` cancels any previous timer first,
/// keeping the at-most-one-timer invariant; an in-flight request is allowed
/// to finish and its result is discarded with the aborted task.
#[derive(Debug, Default)]
pub struct SyncScheduler {
    handle: Option<JoinHandle<()>>,
}

impl SyncScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start polling at the interval the settings specify.
    ///
    /// Background poll failures are swallowed at debug level; the timer just
    /// tries again next interval.
    pub fn start(&mut self, engine: SyncEngine, controller: SettingsController) {
        self.stop();

        let interval_secs = controller.with(|s| s.sync_interval_secs).max(1);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() fires immediately; consume that tick so the first
            // poll happens one full interval after start
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match engine.pull(&controller).await {
                    Ok(true) => tracing::debug!("settings updated from server"),
                    Ok(false) => tracing::trace!("settings unchanged"),
                    Err(e) => tracing::debug!("background settings poll failed: {}", e),
                }
            }
        });

        self.handle = Some(handle);
        tracing::debug!("sync scheduler started ({}s interval)", interval_secs);
    }

    /// Cancel the pending timer, if any
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("sync scheduler stopped");
        }
    }

    /// Apply a changed interval or enable flag by cycling the timer
    pub fn restart(&mut self, engine: SyncEngine, controller: SettingsController) {
        self.start(engine, controller);
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(
        style: Option<&str>,
        backup: Option<bool>,
        max: Option<u32>,
        marker: Option<&str>,
    ) -> RemoteSettings {
        RemoteSettings {
            default_citation_style: style.map(str::to_string),
            create_backup_on_process: backup,
            max_search_results: max,
            last_modified: marker.map(str::to_string),
        }
    }

    #[test]
    fn test_newer_marker_applies_all_supplied_fields() {
        let mut settings = ClientSettings::default();
        settings.last_known_server_modified = Some("T1".to_string());

        let changed = apply_remote(
            &mut settings,
            &remote(Some("apa"), Some(false), Some(5), Some("T2")),
        );

        assert!(changed);
        assert_eq!(settings.citation_style, "apa");
        assert!(!settings.backup_before_processing);
        assert_eq!(settings.max_search_results, 5);
        assert_eq!(settings.last_known_server_modified.as_deref(), Some("T2"));
        assert!(settings.last_server_sync.is_some());
    }

    #[test]
    fn test_equal_marker_changes_nothing() {
        let mut settings = ClientSettings::default();
        settings.last_known_server_modified = Some("T1".to_string());
        let before = settings.clone();

        let changed = apply_remote(
            &mut settings,
            &remote(Some("apa"), Some(false), Some(5), Some("T1")),
        );

        assert!(!changed);
        assert_eq!(settings.citation_style, before.citation_style);
        assert_eq!(
            settings.backup_before_processing,
            before.backup_before_processing
        );
        assert_eq!(settings.max_search_results, before.max_search_results);
        assert!(settings.last_server_sync.is_none());
    }

    #[test]
    fn test_fields_apply_field_by_field() {
        let mut settings = ClientSettings::default();
        settings.citation_style = "vancouver".to_string();
        settings.max_search_results = 20;
        settings.last_known_server_modified = Some("T1".to_string());

        // Payload only carries the style; the other synced fields survive
        let changed = apply_remote(&mut settings, &remote(Some("mla"), None, None, Some("T2")));

        assert!(changed);
        assert_eq!(settings.citation_style, "mla");
        assert_eq!(settings.max_search_results, 20);
        assert!(settings.backup_before_processing);
    }

    #[test]
    fn test_first_poll_with_no_local_marker_applies() {
        let mut settings = ClientSettings::default();
        assert!(settings.last_known_server_modified.is_none());

        let changed = apply_remote(&mut settings, &remote(Some("apa"), None, None, Some("T1")));
        assert!(changed);
        assert_eq!(settings.last_known_server_modified.as_deref(), Some("T1"));
    }
}
