//! Open-document store
//!
//! Tracks the full text and version of every open document, updated from
//! full-sync change notifications only. Everything else reads snapshots.

use std::collections::HashMap;
use std::sync::Mutex;

use tower_lsp::lsp_types::{Position, Url};

#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub version: i32,
}

#[derive(Default)]
pub struct DocumentStore {
    documents: Mutex<HashMap<Url, Document>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, uri: Url, text: String, version: i32) {
        self.documents
            .lock()
            .unwrap()
            .insert(uri, Document { text, version });
    }

    /// Full-sync update: the new text replaces the document wholesale.
    pub fn update(&self, uri: &Url, text: String, version: i32) {
        self.documents
            .lock()
            .unwrap()
            .insert(uri.clone(), Document { text, version });
    }

    pub fn text(&self, uri: &Url) -> Option<String> {
        self.documents
            .lock()
            .unwrap()
            .get(uri)
            .map(|d| d.text.clone())
    }

    pub fn version(&self, uri: &Url) -> Option<i32> {
        self.documents.lock().unwrap().get(uri).map(|d| d.version)
    }
}

/// Converts a position to a flat character offset, clamping out-of-range
/// lines and columns to the nearest valid offset.
pub fn offset_at(text: &str, position: Position) -> usize {
    let mut offset = 0usize;
    let mut line = 0u32;
    let mut chars = text.chars().peekable();

    while line < position.line {
        match chars.next() {
            Some('\n') => {
                line += 1;
                offset += 1;
            }
            Some(_) => offset += 1,
            None => return offset,
        }
    }

    let mut character = 0u32;
    while character < position.character {
        match chars.peek() {
            Some('\n') | None => break,
            Some(_) => {
                chars.next();
                offset += 1;
                character += 1;
            }
        }
    }

    offset
}

/// Converts a flat character offset back to a position.
pub fn position_at(text: &str, offset: usize) -> Position {
    let mut line = 0u32;
    let mut character = 0u32;
    for (i, ch) in text.chars().enumerate() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            character = 0;
        } else {
            character += 1;
        }
    }
    Position::new(line, character)
}
