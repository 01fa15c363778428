//! One-slot document backup before destructive rewrites.

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ClientSettings;
use crate::error::ClientError;

/// Snapshot `content` to a timestamped sibling of `document_path` and record
/// it as the single last-backup pointer (overwriting any prior pointer).
pub fn backup_document(
    document_path: &Path,
    content: &str,
    settings: &mut ClientSettings,
) -> Result<PathBuf, ClientError> {
    let stem = document_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let timestamp = Local::now().format("%Y-%m-%dT%H-%M-%S");
    let backup_name = format!("{}_backup_{}.md", stem, timestamp);
    let backup_path = document_path
        .parent()
        .map(|p| p.join(&backup_name))
        .unwrap_or_else(|| PathBuf::from(&backup_name));

    fs::write(&backup_path, content)
        .map_err(|e| ClientError::Backup(format!("{}: {}", backup_path.display(), e)))?;

    settings.last_backup_path = Some(backup_path.clone());
    tracing::info!("backed up {} to {}", document_path.display(), backup_path.display());
    Ok(backup_path)
}

/// Read back the content of the recorded backup.
///
/// Fails with [`ClientError::BackupNotFound`] when no backup was ever
/// recorded or the recorded file no longer exists; never silently no-ops.
pub fn restore_document(settings: &ClientSettings) -> Result<String, ClientError> {
    let path = settings
        .last_backup_path
        .as_ref()
        .ok_or_else(|| ClientError::BackupNotFound("no backup recorded".to_string()))?;

    if !path.exists() {
        return Err(ClientError::BackupNotFound(path.display().to_string()));
    }

    Ok(fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_restore_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("paper.md");
        let content = "# Draft\n\nSome text with a citation.[^A-1]\n";

        let mut settings = ClientSettings::default();
        let backup_path = backup_document(&doc_path, content, &mut settings).unwrap();

        assert!(backup_path.starts_with(dir.path()));
        let name = backup_path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("paper_backup_"));
        assert!(name.ends_with(".md"));
        assert_eq!(settings.last_backup_path.as_deref(), Some(backup_path.as_path()));

        let restored = restore_document(&settings).unwrap();
        assert_eq!(restored, content);
    }

    #[test]
    fn test_backup_pointer_is_one_slot() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = ClientSettings::default();

        backup_document(&dir.path().join("a.md"), "first", &mut settings).unwrap();
        let second = backup_document(&dir.path().join("b.md"), "second", &mut settings).unwrap();

        assert_eq!(settings.last_backup_path.as_deref(), Some(second.as_path()));
        assert_eq!(restore_document(&settings).unwrap(), "second");
    }

    #[test]
    fn test_restore_without_backup_fails() {
        let settings = ClientSettings::default();
        let err = restore_document(&settings).unwrap_err();
        assert!(matches!(err, ClientError::BackupNotFound(_)));
    }

    #[test]
    fn test_restore_with_vanished_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = ClientSettings::default();
        let backup_path = backup_document(&dir.path().join("a.md"), "x", &mut settings).unwrap();
        fs::remove_file(&backup_path).unwrap();

        let err = restore_document(&settings).unwrap_err();
        assert!(matches!(err, ClientError::BackupNotFound(_)));
    }
}
