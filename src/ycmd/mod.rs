//! ycmd backend layer
//! - client.rs: HTTP client for a running ycmd process
//! - process.rs: process spawn and port selection
//! - types.rs: wire types
//! - error.rs: error taxonomy

pub mod client;
pub mod error;
pub mod process;
pub mod types;

pub use client::YcmdClient;
pub use error::YcmdError;

use tower_lsp::lsp_types::Position;

use crate::ycmd::types::{Candidate, FileSnapshot, FixIt, Location, WireDiagnostic};

/// Operations the semantic backend exposes to the protocol layer.
///
/// Positions are zero-based LSP positions; implementations convert to
/// whatever the backend expects on the wire.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SemanticBackend: Send + Sync {
    /// Completion candidates at a position.
    async fn completion(
        &self,
        file: &FileSnapshot,
        position: Position,
    ) -> Result<Vec<Candidate>, YcmdError>;

    /// Semantic-only completion, used to resolve an identifier to its
    /// documented candidate.
    async fn exact_match_completion(
        &self,
        file: &FileSnapshot,
        position: Position,
    ) -> Result<Vec<Candidate>, YcmdError>;

    /// Type of the entity at a position. `imprecise` selects the variant
    /// that skips a recompile.
    async fn type_info(
        &self,
        file: &FileSnapshot,
        position: Position,
        imprecise: bool,
    ) -> Result<String, YcmdError>;

    /// Definition location(s) of the entity at a position.
    async fn definition(
        &self,
        file: &FileSnapshot,
        position: Position,
    ) -> Result<Vec<Location>, YcmdError>;

    /// Available fix-its at a position.
    async fn fix_it(
        &self,
        file: &FileSnapshot,
        position: Position,
    ) -> Result<Vec<FixIt>, YcmdError>;

    /// Parses the file and returns its diagnostics.
    async fn parse_ready(&self, file: &FileSnapshot) -> Result<Vec<WireDiagnostic>, YcmdError>;
}
