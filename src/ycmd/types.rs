//! ycmd wire types
//!
//! Lines and columns are 1-based on the wire; conversion from zero-based
//! LSP positions happens in the client.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::Position;

/// Snapshot of one open file as sent to ycmd with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSnapshot {
    pub filepath: String,
    pub contents: String,
    pub filetypes: Vec<String>,
}

impl FileSnapshot {
    pub fn new(filepath: impl Into<String>, contents: impl Into<String>) -> Self {
        let filepath = filepath.into();
        let filetypes = filetypes_for(&filepath);
        Self {
            filepath,
            contents: contents.into(),
            filetypes,
        }
    }
}

fn filetypes_for(path: &str) -> Vec<String> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let filetype = match ext {
        "c" => "c",
        "h" | "hh" | "hpp" | "hxx" | "cc" | "cpp" | "cxx" => "cpp",
        "py" => "python",
        "rs" => "rust",
        "go" => "go",
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        _ => "general",
    };
    vec![filetype.to_string()]
}

#[derive(Debug, Serialize)]
pub struct FileEntry<'a> {
    pub contents: &'a str,
    pub filetypes: &'a [String],
}

/// Common request body shared by every ycmd endpoint.
#[derive(Debug, Serialize)]
pub struct SimpleRequest<'a> {
    pub filepath: &'a str,
    pub line_num: u32,
    pub column_num: u32,
    pub file_data: HashMap<&'a str, FileEntry<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_arguments: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_semantic: Option<bool>,
}

impl<'a> SimpleRequest<'a> {
    pub fn new(file: &'a FileSnapshot, position: Position) -> Self {
        let mut file_data = HashMap::new();
        file_data.insert(
            file.filepath.as_str(),
            FileEntry {
                contents: &file.contents,
                filetypes: &file.filetypes,
            },
        );
        Self {
            filepath: &file.filepath,
            line_num: position.line + 1,
            column_num: position.character + 1,
            file_data,
            event_name: None,
            command_arguments: None,
            force_semantic: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    pub filepath: String,
    pub line_num: u32,
    pub column_num: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Extent {
    pub start: Location,
    pub end: Location,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WireDiagnostic {
    pub location: Location,
    #[serde(default)]
    pub location_extent: Option<Extent>,
    pub text: String,
    pub kind: String,
    #[serde(default)]
    pub fixit_available: bool,
}

/// One completion candidate. `detailed_info` is free-form documentation
/// that may embed `name(params)` signature lines.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Candidate {
    pub insertion_text: String,
    #[serde(default)]
    pub menu_text: Option<String>,
    #[serde(default)]
    pub extra_menu_info: Option<String>,
    #[serde(default)]
    pub detailed_info: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionsResponse {
    pub completions: Vec<Candidate>,
    #[serde(default)]
    pub completion_start_column: u32,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GoTo responses are a bare location for a single target and a list
/// otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GoToResponse {
    Single(Location),
    Many(Vec<Location>),
}

impl GoToResponse {
    pub fn into_locations(self) -> Vec<Location> {
        match self {
            GoToResponse::Single(location) => vec![location],
            GoToResponse::Many(locations) => locations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixItChunk {
    pub replacement_text: String,
    pub range: Extent,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixIt {
    #[serde(default)]
    pub text: String,
    pub chunks: Vec<FixItChunk>,
}

#[derive(Debug, Deserialize)]
pub struct FixItResponse {
    pub fixits: Vec<FixIt>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_detects_filetype_from_extension() {
        assert_eq!(FileSnapshot::new("/a/b.cc", "").filetypes, vec!["cpp"]);
        assert_eq!(FileSnapshot::new("/a/b.py", "").filetypes, vec!["python"]);
        assert_eq!(FileSnapshot::new("/a/b.txt", "").filetypes, vec!["general"]);
    }

    #[test]
    fn simple_request_converts_to_one_based() {
        let file = FileSnapshot::new("/a/b.cpp", "int x;");
        let request = SimpleRequest::new(&file, Position::new(0, 4));

        assert_eq!(request.line_num, 1);
        assert_eq!(request.column_num, 5);
        assert!(request.file_data.contains_key("/a/b.cpp"));
    }

    #[test]
    fn goto_response_accepts_single_and_many() {
        let single: GoToResponse =
            serde_json::from_str(r#"{"filepath": "/a.cpp", "line_num": 2, "column_num": 3}"#)
                .unwrap();
        assert_eq!(single.into_locations().len(), 1);

        let many: GoToResponse = serde_json::from_str(
            r#"[{"filepath": "/a.cpp", "line_num": 2, "column_num": 3},
               {"filepath": "/b.cpp", "line_num": 5, "column_num": 1}]"#,
        )
        .unwrap();
        assert_eq!(many.into_locations().len(), 2);
    }

    #[test]
    fn diagnostic_tolerates_missing_extent() {
        let diagnostic: WireDiagnostic = serde_json::from_str(
            r#"{
                "location": {"filepath": "/a.cpp", "line_num": 1, "column_num": 1},
                "text": "expected ';'",
                "kind": "ERROR"
            }"#,
        )
        .unwrap();

        assert!(diagnostic.location_extent.is_none());
        assert!(!diagnostic.fixit_available);
    }
}
