use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::lsp::diagnostics::{extent_range, point, to_lsp_diagnostics};
use crate::lsp::documents::DocumentStore;
use crate::lsp::signature;
use crate::session::{Session, SessionCoordinator, SessionFactory, YcmdSessionFactory};
use crate::ycmd::types as wire;
use crate::ycmd::types::FileSnapshot;

/// Parameters of the custom `ycmd/lint` notification.
#[derive(Debug, Deserialize)]
pub struct LintParams {
    pub uri: Url,
}

pub struct Backend {
    client: Client,
    documents: DocumentStore,
    coordinator: SessionCoordinator,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self::build(client, Arc::new(YcmdSessionFactory))
    }

    /// Constructor with an injectable session factory, used by tests.
    pub fn build(client: Client, factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            client,
            documents: DocumentStore::new(),
            coordinator: SessionCoordinator::new(factory),
        }
    }

    pub fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(
                TextDocumentSyncKind::FULL,
            )),
            completion_provider: Some(CompletionOptions {
                resolve_provider: Some(true),
                trigger_characters: Some(vec![".".to_string(), "->".to_string()]),
                ..Default::default()
            }),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            definition_provider: Some(OneOf::Left(true)),
            signature_help_provider: Some(SignatureHelpOptions {
                trigger_characters: Some(vec!["(".to_string()]),
                retrigger_characters: None,
                work_done_progress_options: Default::default(),
            }),
            code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
            ..Default::default()
        }
    }

    /// The current session, or `None` after a reported startup failure.
    async fn session(&self) -> Option<Arc<Session>> {
        match self.coordinator.get().await {
            Ok(session) => Some(session),
            Err(e) => {
                error!("no usable ycmd session: {}", e);
                self.client
                    .show_message(MessageType::ERROR, e.to_string())
                    .await;
                None
            }
        }
    }

    fn snapshot(&self, uri: &Url) -> Option<FileSnapshot> {
        let text = self.documents.text(uri)?;
        let filepath = uri
            .to_file_path()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| uri.path().to_string());
        Some(FileSnapshot::new(filepath, text))
    }

    /// Parse the document and publish its diagnostics: one publish per
    /// invocation on success, none when the backend call fails.
    async fn publish_parse_diagnostics(&self, uri: Url) {
        let Some(file) = self.snapshot(&uri) else {
            warn!("no document text for {}", uri);
            return;
        };
        let Some(session) = self.session().await else {
            return;
        };

        match session.backend().parse_ready(&file).await {
            Ok(diagnostics) => {
                let diagnostics = to_lsp_diagnostics(&diagnostics);
                debug!("publishing {} diagnostics for {}", diagnostics.len(), uri);
                self.client.publish_diagnostics(uri, diagnostics, None).await;
            }
            Err(e) => error!("parse failed for {}: {}", uri, e),
        }
    }

    pub async fn lint(&self, params: LintParams) {
        info!("lint requested for {}", params.uri);
        self.publish_parse_diagnostics(params.uri).await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let root = params
            .root_uri
            .and_then(|uri| uri.to_file_path().ok())
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string());
        self.coordinator.set_workspace_root(root).await;

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "ycmd-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "ycmd-lsp initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("shutting down, discarding ycmd session");
        self.coordinator.reset().await;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("did_open: {}", uri);
        self.documents
            .open(uri.clone(), params.text_document.text, params.text_document.version);
        self.publish_parse_diagnostics(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        // full sync: the last change carries the whole document
        let Some(change) = params.content_changes.into_iter().next_back() else {
            return;
        };
        self.documents
            .update(&uri, change.text, params.text_document.version);
        self.publish_parse_diagnostics(uri).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        match Settings::from_value(params.settings) {
            Ok(settings) => {
                info!("configuration updated");
                self.coordinator.set_settings(settings.ycmd).await;
                let _ = self.session().await;
            }
            Err(e) => {
                warn!("rejected configuration: {}", e);
                self.client
                    .show_message(MessageType::ERROR, e.to_string())
                    .await;
            }
        }
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        debug!("completion: {}", uri);

        let Some(file) = self.snapshot(&uri) else {
            return Ok(None);
        };
        let Some(session) = self.session().await else {
            return Ok(None);
        };

        match session.backend().completion(&file, position).await {
            Ok(candidates) => Ok(Some(CompletionResponse::Array(
                candidates.into_iter().map(to_completion_item).collect(),
            ))),
            Err(e) => {
                error!("completion failed for {}: {}", uri, e);
                Ok(None)
            }
        }
    }

    async fn completion_resolve(&self, item: CompletionItem) -> Result<CompletionItem> {
        Ok(item)
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        debug!("hover: {}", uri);

        let Some(file) = self.snapshot(&uri) else {
            return Ok(None);
        };
        let Some(session) = self.session().await else {
            return Ok(None);
        };

        let imprecise = session.settings().use_imprecise_get_type;
        match session.backend().type_info(&file, position, imprecise).await {
            Ok(message) if !message.is_empty() => Ok(Some(Hover {
                contents: HoverContents::Scalar(MarkedString::String(message)),
                range: None,
            })),
            Ok(_) => Ok(None),
            Err(e) => {
                error!("type lookup failed for {}: {}", uri, e);
                Ok(None)
            }
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        debug!("goto_definition: {}", uri);

        let Some(file) = self.snapshot(&uri) else {
            return Ok(None);
        };
        let Some(session) = self.session().await else {
            return Ok(None);
        };

        match session.backend().definition(&file, position).await {
            Ok(locations) => {
                let locations: Vec<Location> =
                    locations.iter().filter_map(to_lsp_location).collect();
                if locations.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(GotoDefinitionResponse::Array(locations)))
                }
            }
            Err(e) => {
                error!("definition lookup failed for {}: {}", uri, e);
                Ok(None)
            }
        }
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        debug!("signature_help: {}", uri);

        let Some(file) = self.snapshot(&uri) else {
            return Ok(None);
        };
        let Some(session) = self.session().await else {
            return Ok(None);
        };

        match signature::signature_help(session.backend(), &file, position).await {
            Ok(help) => Ok(help),
            Err(e) => {
                error!("signature help failed for {}: {}", uri, e);
                Ok(None)
            }
        }
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;
        let position = params.range.start;
        debug!("code_action: {}", uri);

        let Some(file) = self.snapshot(&uri) else {
            return Ok(None);
        };
        let Some(session) = self.session().await else {
            return Ok(None);
        };

        match session.backend().fix_it(&file, position).await {
            Ok(fixits) => Ok(Some(to_code_actions(fixits))),
            Err(e) => {
                error!("fix-it lookup failed for {}: {}", uri, e);
                Ok(None)
            }
        }
    }
}

fn to_completion_item(candidate: wire::Candidate) -> CompletionItem {
    CompletionItem {
        label: candidate.insertion_text,
        kind: completion_kind(candidate.kind.as_deref()),
        detail: candidate.extra_menu_info,
        documentation: candidate.detailed_info.map(Documentation::String),
        ..Default::default()
    }
}

fn completion_kind(kind: Option<&str>) -> Option<CompletionItemKind> {
    match kind? {
        "FUNCTION" => Some(CompletionItemKind::FUNCTION),
        "CLASS" | "STRUCT" | "UNION" => Some(CompletionItemKind::CLASS),
        "MEMBER" => Some(CompletionItemKind::FIELD),
        "VARIABLE" | "PARAMETER" => Some(CompletionItemKind::VARIABLE),
        "MACRO" => Some(CompletionItemKind::CONSTANT),
        "NAMESPACE" => Some(CompletionItemKind::MODULE),
        "TYPEDEF" => Some(CompletionItemKind::INTERFACE),
        "IDENTIFIER" => Some(CompletionItemKind::TEXT),
        _ => None,
    }
}

fn to_lsp_location(location: &wire::Location) -> Option<Location> {
    let uri = Url::from_file_path(&location.filepath).ok()?;
    let position = point(location);
    Some(Location {
        uri,
        range: Range::new(position, position),
    })
}

fn to_code_actions(fixits: Vec<wire::FixIt>) -> CodeActionResponse {
    fixits
        .into_iter()
        .filter_map(|fixit| {
            let mut changes: HashMap<Url, Vec<TextEdit>> = HashMap::new();
            for chunk in &fixit.chunks {
                let Ok(uri) = Url::from_file_path(&chunk.range.start.filepath) else {
                    continue;
                };
                changes.entry(uri).or_default().push(TextEdit {
                    range: extent_range(&chunk.range),
                    new_text: chunk.replacement_text.clone(),
                });
            }
            if changes.is_empty() {
                return None;
            }

            let title = if fixit.text.is_empty() {
                "Apply fix-it".to_string()
            } else {
                fixit.text
            };
            Some(CodeActionOrCommand::CodeAction(CodeAction {
                title,
                kind: Some(CodeActionKind::QUICKFIX),
                edit: Some(WorkspaceEdit {
                    changes: Some(changes),
                    ..Default::default()
                }),
                ..Default::default()
            }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(filepath: &str, line: u32, column: u32) -> wire::Location {
        wire::Location {
            filepath: filepath.to_string(),
            line_num: line,
            column_num: column,
        }
    }

    #[test]
    fn completion_kind_maps_known_tags() {
        assert_eq!(
            completion_kind(Some("FUNCTION")),
            Some(CompletionItemKind::FUNCTION)
        );
        assert_eq!(
            completion_kind(Some("STRUCT")),
            Some(CompletionItemKind::CLASS)
        );
        assert_eq!(completion_kind(Some("???")), None);
        assert_eq!(completion_kind(None), None);
    }

    #[test]
    fn candidate_maps_to_completion_item() {
        let item = to_completion_item(wire::Candidate {
            insertion_text: "push_back".to_string(),
            menu_text: None,
            extra_menu_info: Some("void".to_string()),
            detailed_info: Some("push_back(const T &value)".to_string()),
            kind: Some("FUNCTION".to_string()),
        });

        assert_eq!(item.label, "push_back");
        assert_eq!(item.kind, Some(CompletionItemKind::FUNCTION));
        assert_eq!(item.detail.as_deref(), Some("void"));
    }

    #[test]
    fn fixit_chunks_group_into_workspace_edit_by_file() {
        let fixit = wire::FixIt {
            text: "insert ';'".to_string(),
            chunks: vec![wire::FixItChunk {
                replacement_text: ";".to_string(),
                range: wire::Extent {
                    start: location("/test/main.cpp", 2, 10),
                    end: location("/test/main.cpp", 2, 10),
                },
            }],
        };

        let actions = to_code_actions(vec![fixit]);
        assert_eq!(actions.len(), 1);
        let CodeActionOrCommand::CodeAction(action) = &actions[0] else {
            panic!("expected a code action");
        };
        assert_eq!(action.title, "insert ';'");
        let changes = action.edit.as_ref().unwrap().changes.as_ref().unwrap();
        let edits = changes
            .get(&Url::from_file_path("/test/main.cpp").unwrap())
            .unwrap();
        assert_eq!(edits[0].new_text, ";");
        assert_eq!(edits[0].range.start, Position::new(1, 9));
    }

    #[test]
    fn fixit_without_applicable_chunks_is_dropped() {
        let fixit = wire::FixIt {
            text: String::new(),
            chunks: vec![wire::FixItChunk {
                replacement_text: ";".to_string(),
                range: wire::Extent {
                    start: location("not-a-path", 1, 1),
                    end: location("not-a-path", 1, 1),
                },
            }],
        };

        assert!(to_code_actions(vec![fixit]).is_empty());
    }
}
