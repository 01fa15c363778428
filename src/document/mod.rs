//! Document abstraction and mutation.
//!
//! The insertion engine and the whole-document processor operate on the
//! [`DocumentSurface`] capability trait rather than any concrete editor, so
//! the same logic drives an editor buffer, a file on disk, or a test
//! fixture. [`TextBuffer`] is the in-process implementation used by the
//! terminal front end.

mod backup;
mod insert;

pub use backup::{backup_document, restore_document};
pub use insert::{insert_citation, InsertFormat, InsertOutcome};

/// Minimal editing surface the core logic depends on
pub trait DocumentSurface {
    /// The currently selected text (empty when the selection is a caret)
    fn selection(&self) -> &str;

    /// Replace the current selection with `text`, leaving the caret after it
    fn replace_selection(&mut self, text: &str);

    /// Full document content
    fn value(&self) -> &str;

    /// Replace the full document content, collapsing the selection to the end
    fn set_value(&mut self, content: String);
}

/// In-memory document with a byte-range selection
#[derive(Debug, Clone)]
pub struct TextBuffer {
    content: String,
    sel_start: usize,
    sel_end: usize,
}

impl TextBuffer {
    /// Buffer with the caret at the end of the content
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let end = content.len();
        Self {
            content,
            sel_start: end,
            sel_end: end,
        }
    }

    /// Select a byte range. Out-of-range or reversed bounds are clamped.
    pub fn select(&mut self, start: usize, end: usize) {
        let len = self.content.len();
        let start = start.min(len);
        let end = end.min(len);
        self.sel_start = start.min(end);
        self.sel_end = start.max(end);
    }

    /// Place the caret at a byte offset
    pub fn set_cursor(&mut self, offset: usize) {
        self.select(offset, offset);
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

impl DocumentSurface for TextBuffer {
    fn selection(&self) -> &str {
        &self.content[self.sel_start..self.sel_end]
    }

    fn replace_selection(&mut self, text: &str) {
        self.content
            .replace_range(self.sel_start..self.sel_end, text);
        self.sel_start += text.len();
        self.sel_end = self.sel_start;
    }

    fn value(&self) -> &str {
        &self.content
    }

    fn set_value(&mut self, content: String) {
        self.content = content;
        self.sel_start = self.content.len();
        self.sel_end = self.sel_start;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_selection_at_range() {
        let mut buffer = TextBuffer::new("hello world");
        buffer.select(6, 11);
        assert_eq!(buffer.selection(), "world");
        buffer.replace_selection("there");
        assert_eq!(buffer.value(), "hello there");
        // Caret collapses after the inserted text
        assert_eq!(buffer.selection(), "");
    }

    #[test]
    fn test_caret_insert() {
        let mut buffer = TextBuffer::new("ab");
        buffer.set_cursor(1);
        buffer.replace_selection("X");
        assert_eq!(buffer.value(), "aXb");
    }

    #[test]
    fn test_select_clamps_out_of_range() {
        let mut buffer = TextBuffer::new("abc");
        buffer.select(10, 2);
        assert_eq!(buffer.selection(), "c");
    }
}
