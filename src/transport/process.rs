//! Local-process fallback transport.
//!
//! Invokes the resolver CLI with its auto-detect flag and one identifier,
//! expecting a single CitationResult-shaped JSON object on stdout. The
//! resolver formats the citation itself, so the requested style is not part
//! of the CLI contract.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::ClientError;
use crate::models::CitationResult;
use crate::transport::Transport;

/// Resolver CLI invocation
#[derive(Debug, Clone)]
pub struct ProcessTransport {
    program: String,
}

impl ProcessTransport {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    fn id(&self) -> &str {
        "process"
    }

    async fn lookup(&self, identifier: &str, _style: &str) -> Result<CitationResult, ClientError> {
        let output = Command::new(&self.program)
            .arg("--auto")
            .arg(identifier)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                ClientError::ProcessSpawn(format!("failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClientError::ProcessSpawn(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(stdout.trim()).map_err(|e| {
            ClientError::ProcessSpawn(format!("unparsable resolver output: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let transport = ProcessTransport::new("/nonexistent/citation-resolver");
        let err = transport.lookup("37622666", "vancouver").await.unwrap_err();
        assert!(matches!(err, ClientError::ProcessSpawn(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_parses_resolver_stdout() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script_path = dir.path().join("fake-resolver");
        let mut script = std::fs::File::create(&script_path).unwrap();
        writeln!(
            script,
            "#!/bin/sh\necho '{{\"success\": true, \"identifier\": \"'\"$2\"'\", \"identifier_type\": \"pmid\", \"inline_mark\": \"[^X-1]\", \"endnote_citation\": \"[^X-1]: cited\"}}'"
        )
        .unwrap();
        drop(script);
        std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let transport = ProcessTransport::new(script_path.to_str().unwrap());
        let result = transport.lookup("37622666", "vancouver").await.unwrap();
        assert!(result.success);
        assert_eq!(result.identifier, "37622666");
        assert_eq!(result.endnote_text, "[^X-1]: cited");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_spawn_error() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script_path = dir.path().join("broken-resolver");
        let mut script = std::fs::File::create(&script_path).unwrap();
        writeln!(script, "#!/bin/sh\necho 'boom' >&2\nexit 3").unwrap();
        drop(script);
        std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let transport = ProcessTransport::new(script_path.to_str().unwrap());
        let err = transport.lookup("37622666", "vancouver").await.unwrap_err();
        match err {
            ClientError::ProcessSpawn(message) => assert!(message.contains("boom")),
            other => panic!("expected ProcessSpawn, got {:?}", other),
        }
    }
}
