use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to start ycmd: {0}")]
    Startup(String),
}
