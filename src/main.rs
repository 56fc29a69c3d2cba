use clap::Parser;

/// LSP adapter for the ycmd semantic completion engine.
#[derive(Debug, Parser)]
#[command(name = "ycmd-lsp", version)]
struct Args {
    /// Communicate over stdio. Accepted for client compatibility; stdio is
    /// the only supported transport.
    #[arg(long)]
    stdio: bool,

    /// Log level filter for the log file (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Args { stdio: _, log_level } = Args::parse();
    ycmd_lsp::lsp::server::run_server(log_level.as_deref()).await
}
