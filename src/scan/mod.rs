//! Heuristic text scanning layer
//! - mask.rs: literal and comment masking
//! - scope.rs: balanced bracket scanning
//!
//! Everything here operates on plain text and character offsets, with no
//! protocol types, so it can be tested against arbitrary bracket/quote
//! combinations in isolation.

pub mod mask;
pub mod scope;

pub use mask::mask;
pub use scope::{count_top_level_commas, enclosing_open_paren};
