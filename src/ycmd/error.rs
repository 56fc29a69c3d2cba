use thiserror::Error;

#[derive(Debug, Error)]
pub enum YcmdError {
    #[error("Failed to spawn ycmd: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ycmd did not become ready in time")]
    NeverReady,

    #[error("Request to ycmd failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ycmd returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to decode ycmd response: {0}")]
    Decode(String),
}
