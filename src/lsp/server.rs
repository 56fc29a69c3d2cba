use tower_lsp::{LspService, Server};
use tracing::info;

use crate::log::init;
use crate::lsp::backend::Backend;

pub async fn run_server(log_level: Option<&str>) -> anyhow::Result<()> {
    init(log_level)?;

    info!("Starting ycmd-lsp server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(Backend::new)
        .custom_method("ycmd/lint", Backend::lint)
        .finish();
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("ycmd-lsp server stopped");
    Ok(())
}
