//! Host capability interfaces and their terminal implementations.
//!
//! The core logic never talks to a concrete UI toolkit. Notifications,
//! confirmation prompts, and the clipboard are reached through the traits
//! below; the terminal front end supplies the implementations here, and an
//! embedding editor can supply its own.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::io::{BufRead, Write};

use crate::error::ClientError;

/// Transient, non-blocking user notification
pub trait NotificationSink {
    fn notify(&self, message: &str);
}

/// Blocking yes/no confirmation before a destructive action
pub trait ConfirmationPrompt {
    fn ask(&self, message: &str) -> bool;
}

/// Destination for auto-copied citation text
pub trait ClipboardSink {
    fn copy(&mut self, text: &str) -> Result<(), ClientError>;
}

/// Notifier printing styled status lines to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl NotificationSink for TerminalNotifier {
    fn notify(&self, message: &str) {
        if std::io::stdout().is_terminal() {
            println!("{} {}", "✓".green().bold(), message);
        } else {
            println!("{}", message);
        }
    }
}

/// Prompt reading a y/n answer from stdin
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl ConfirmationPrompt for TerminalPrompt {
    fn ask(&self, message: &str) -> bool {
        print!("{} [y/N] ", message);
        let _ = std::io::stdout().flush();
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Prompt that answers every question the same way, without asking.
/// Used for `--yes` flags and in tests.
#[derive(Debug, Clone, Copy)]
pub struct PresetPrompt(pub bool);

impl ConfirmationPrompt for PresetPrompt {
    fn ask(&self, _message: &str) -> bool {
        self.0
    }
}

/// System clipboard via arboard
pub struct SystemClipboard {
    clipboard: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClientError> {
        let clipboard = arboard::Clipboard::new()
            .map_err(|e| ClientError::Config(format!("clipboard unavailable: {}", e)))?;
        Ok(Self { clipboard })
    }
}

impl ClipboardSink for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<(), ClientError> {
        self.clipboard
            .set_text(text)
            .map_err(|e| ClientError::Config(format!("clipboard write failed: {}", e)))
    }
}

/// No-op clipboard for headless environments
#[derive(Debug, Clone, Copy, Default)]
pub struct NullClipboard;

impl ClipboardSink for NullClipboard {
    fn copy(&mut self, _text: &str) -> Result<(), ClientError> {
        tracing::debug!("clipboard unavailable, auto-copy skipped");
        Ok(())
    }
}

/// The system clipboard when one exists, otherwise the no-op sink
pub fn clipboard() -> Box<dyn ClipboardSink> {
    match SystemClipboard::new() {
        Ok(clipboard) => Box::new(clipboard),
        Err(e) => {
            tracing::debug!("{}", e);
            Box::new(NullClipboard)
        }
    }
}
