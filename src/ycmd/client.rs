//! HTTP client for a running ycmd process

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tower_lsp::lsp_types::Position;
use tracing::warn;

use crate::config::YcmdSettings;
use crate::ycmd::SemanticBackend;
use crate::ycmd::error::YcmdError;
use crate::ycmd::process::YcmdProcess;
use crate::ycmd::types::{
    Candidate, CompletionsResponse, FileSnapshot, FixIt, FixItResponse, GoToResponse, Location,
    MessageResponse, SimpleRequest, WireDiagnostic,
};

const READY_POLL_ATTEMPTS: usize = 50;
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Client for the ycmd HTTP API.
///
/// [`YcmdClient::start`] spawns the backend process and owns it; the process
/// dies with the client. [`YcmdClient::new`] attaches to an already-running
/// endpoint and is what the tests use.
pub struct YcmdClient {
    client: reqwest::Client,
    base_url: String,
    process: Option<YcmdProcess>,
}

impl YcmdClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("ycmd-lsp")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            process: None,
        }
    }

    /// Spawns ycmd per the settings and waits until it answers `/ready`.
    pub async fn start(
        settings: &YcmdSettings,
        workspace_root: &str,
    ) -> Result<Self, YcmdError> {
        let process = YcmdProcess::spawn(&settings.path, workspace_root, settings.debug)?;
        let mut client = Self::new(&format!("http://127.0.0.1:{}", process.port()));
        client.process = Some(process);
        client.wait_ready().await?;
        Ok(client)
    }

    async fn wait_ready(&self) -> Result<(), YcmdError> {
        for _ in 0..READY_POLL_ATTEMPTS {
            let url = format!("{}/ready", self.base_url);
            match self.client.get(&url).send().await {
                Ok(response) if response.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(READY_POLL_INTERVAL).await,
            }
        }
        Err(YcmdError::NeverReady)
    }

    async fn post<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, YcmdError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("ycmd returned status {} for {}", status, path);
            return Err(YcmdError::Status(status));
        }

        Ok(response)
    }

    async fn completions(
        &self,
        file: &FileSnapshot,
        position: Position,
        force_semantic: bool,
    ) -> Result<Vec<Candidate>, YcmdError> {
        let mut request = SimpleRequest::new(file, position);
        if force_semantic {
            request.force_semantic = Some(true);
        }

        let response = self.post("/completions", &request).await?;
        let parsed: CompletionsResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse completions response: {}", e);
            YcmdError::Decode(e.to_string())
        })?;

        Ok(parsed.completions)
    }

    async fn completer_command(
        &self,
        file: &FileSnapshot,
        position: Position,
        command: &'static str,
    ) -> Result<reqwest::Response, YcmdError> {
        let mut request = SimpleRequest::new(file, position);
        request.command_arguments = Some(vec![command]);
        self.post("/run_completer_command", &request).await
    }
}

#[async_trait::async_trait]
impl SemanticBackend for YcmdClient {
    async fn completion(
        &self,
        file: &FileSnapshot,
        position: Position,
    ) -> Result<Vec<Candidate>, YcmdError> {
        self.completions(file, position, false).await
    }

    async fn exact_match_completion(
        &self,
        file: &FileSnapshot,
        position: Position,
    ) -> Result<Vec<Candidate>, YcmdError> {
        self.completions(file, position, true).await
    }

    async fn type_info(
        &self,
        file: &FileSnapshot,
        position: Position,
        imprecise: bool,
    ) -> Result<String, YcmdError> {
        let command = if imprecise {
            "GetTypeImprecise"
        } else {
            "GetType"
        };
        let response = self.completer_command(file, position, command).await?;
        let parsed: MessageResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse {} response: {}", command, e);
            YcmdError::Decode(e.to_string())
        })?;

        Ok(parsed.message)
    }

    async fn definition(
        &self,
        file: &FileSnapshot,
        position: Position,
    ) -> Result<Vec<Location>, YcmdError> {
        let response = self.completer_command(file, position, "GoTo").await?;
        let parsed: GoToResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse GoTo response: {}", e);
            YcmdError::Decode(e.to_string())
        })?;

        Ok(parsed.into_locations())
    }

    async fn fix_it(
        &self,
        file: &FileSnapshot,
        position: Position,
    ) -> Result<Vec<FixIt>, YcmdError> {
        let response = self.completer_command(file, position, "FixIt").await?;
        let parsed: FixItResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse FixIt response: {}", e);
            YcmdError::Decode(e.to_string())
        })?;

        Ok(parsed.fixits)
    }

    async fn parse_ready(&self, file: &FileSnapshot) -> Result<Vec<WireDiagnostic>, YcmdError> {
        let mut request = SimpleRequest::new(file, Position::new(0, 0));
        request.event_name = Some("FileReadyToParse");

        let response = self.post("/event_notification", &request).await?;
        let value: Value = response.json().await.map_err(|e| {
            warn!("Failed to read parse response: {}", e);
            YcmdError::Decode(e.to_string())
        })?;

        // Filetypes without a semantic completer answer with a bare object
        match value {
            Value::Array(_) => {
                serde_json::from_value(value).map_err(|e| YcmdError::Decode(e.to_string()))
            }
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;

    fn test_file() -> FileSnapshot {
        FileSnapshot::new("/test/main.cpp", "int main() {}\n")
    }

    #[tokio::test]
    async fn completion_parses_candidates() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/completions")
            .match_body(Matcher::PartialJson(json!({
                "filepath": "/test/main.cpp",
                "line_num": 1,
                "column_num": 5
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "completions": [
                        {"insertion_text": "main", "kind": "FUNCTION"},
                        {"insertion_text": "malloc", "extra_menu_info": "void *"}
                    ],
                    "completion_start_column": 1
                }"#,
            )
            .create_async()
            .await;

        let client = YcmdClient::new(&server.url());
        let candidates = client
            .completion(&test_file(), Position::new(0, 4))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].insertion_text, "main");
        assert_eq!(candidates[1].extra_menu_info.as_deref(), Some("void *"));
    }

    #[tokio::test]
    async fn exact_match_completion_forces_semantic() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/completions")
            .match_body(Matcher::PartialJson(json!({"force_semantic": true})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"completions": [], "completion_start_column": 1}"#)
            .create_async()
            .await;

        let client = YcmdClient::new(&server.url());
        let candidates = client
            .exact_match_completion(&test_file(), Position::new(0, 0))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn type_info_returns_message() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/run_completer_command")
            .match_body(Matcher::PartialJson(json!({"command_arguments": ["GetType"]})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "int (int, char **)"}"#)
            .create_async()
            .await;

        let client = YcmdClient::new(&server.url());
        let message = client
            .type_info(&test_file(), Position::new(0, 4), false)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(message, "int (int, char **)");
    }

    #[tokio::test]
    async fn type_info_imprecise_selects_imprecise_command() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/run_completer_command")
            .match_body(Matcher::PartialJson(
                json!({"command_arguments": ["GetTypeImprecise"]}),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "int"}"#)
            .create_async()
            .await;

        let client = YcmdClient::new(&server.url());
        client
            .type_info(&test_file(), Position::new(0, 4), true)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn definition_accepts_single_location() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/run_completer_command")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"filepath": "/test/lib.hpp", "line_num": 12, "column_num": 6}"#)
            .create_async()
            .await;

        let client = YcmdClient::new(&server.url());
        let locations = client
            .definition(&test_file(), Position::new(0, 4))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].filepath, "/test/lib.hpp");
    }

    #[tokio::test]
    async fn parse_ready_decodes_diagnostics() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/event_notification")
            .match_body(Matcher::PartialJson(
                json!({"event_name": "FileReadyToParse"}),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{
                    "location": {"filepath": "/test/main.cpp", "line_num": 1, "column_num": 5},
                    "text": "use of undeclared identifier",
                    "kind": "ERROR"
                }]"#,
            )
            .create_async()
            .await;

        let client = YcmdClient::new(&server.url());
        let diagnostics = client.parse_ready(&test_file()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, "ERROR");
    }

    #[tokio::test]
    async fn parse_ready_treats_non_array_as_empty() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/event_notification")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{}"#)
            .create_async()
            .await;

        let client = YcmdClient::new(&server.url());
        let diagnostics = client.parse_ready(&test_file()).await.unwrap();

        mock.assert_async().await;
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn error_status_maps_to_status_error() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/completions")
            .with_status(500)
            .with_body(r#"{"exception": {"TYPE": "RuntimeError"}}"#)
            .create_async()
            .await;

        let client = YcmdClient::new(&server.url());
        let result = client.completion(&test_file(), Position::new(0, 0)).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(YcmdError::Status(_))));
    }
}
