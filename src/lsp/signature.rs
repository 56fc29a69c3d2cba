//! Signature-help extraction engine
//!
//! ycmd has no signature-help endpoint, so this is recovered from text: find
//! the call enclosing the cursor in the masked document prefix, resolve the
//! called identifier to its completion candidate, and mine the candidate's
//! documentation for `name(params)` signature lines. The active parameter is
//! computed from the cursor's position inside the call either way.

use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::lsp_types::{
    ParameterInformation, ParameterLabel, Position, SignatureHelp, SignatureInformation,
};
use tracing::debug;

use crate::lsp::documents::{offset_at, position_at};
use crate::scan::{count_top_level_commas, enclosing_open_paren, mask};
use crate::ycmd::types::FileSnapshot;
use crate::ycmd::{SemanticBackend, YcmdError};

static SIGNATURE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((.*)\)").expect("signature line regex"));

/// Computes signature help for the call enclosing `cursor`.
///
/// Returns `Ok(None)` when there is no enclosing call or no completion
/// candidate matches the called identifier. A candidate whose documentation
/// yields no parseable signature still produces a result with an empty
/// signature list and a computed active parameter.
pub async fn signature_help(
    backend: &dyn SemanticBackend,
    file: &FileSnapshot,
    cursor: Position,
) -> Result<Option<SignatureHelp>, YcmdError> {
    let offset = offset_at(&file.contents, cursor);
    let prefix: String = file.contents.chars().take(offset).collect();
    let masked: Vec<char> = mask(&prefix).chars().collect();

    let Some(paren) = enclosing_open_paren(&masked, masked.len()) else {
        return Ok(None);
    };
    let Some(name) = identifier_before(&masked, paren) else {
        return Ok(None);
    };
    debug!("signature help for call to '{}'", name);

    let lookup = position_at(&prefix, paren);
    let candidates = backend.exact_match_completion(file, lookup).await?;
    let Some(candidate) = candidates.into_iter().find(|c| c.insertion_text == name) else {
        return Ok(None);
    };

    let signatures = candidate
        .detailed_info
        .as_deref()
        .map(parse_signatures)
        .unwrap_or_default();

    // Argument 0 starts right after the opening parenthesis
    let active = count_top_level_commas(&masked, paren + 2, masked.len());

    Ok(Some(SignatureHelp {
        signatures,
        active_signature: Some(0),
        active_parameter: Some(active as u32),
    }))
}

/// The identifier ending directly at `paren`, if any.
fn identifier_before(chars: &[char], paren: usize) -> Option<String> {
    let mut start = paren;
    while start > 0 {
        let c = chars[start - 1];
        if c.is_ascii_alphanumeric() || c == '_' {
            start -= 1;
        } else {
            break;
        }
    }
    if start == paren || chars[start].is_ascii_digit() {
        return None;
    }
    Some(chars[start..paren].iter().collect())
}

/// Mines signature lines out of a candidate's documentation.
///
/// Only the first blank-line-delimited block is considered. Each line with a
/// parenthesized section becomes one signature; its parameters are split on
/// plain commas, so a parameter type that itself contains commas inside
/// nested brackets is mis-split. That limitation is intentional.
fn parse_signatures(documentation: &str) -> Vec<SignatureInformation> {
    let block = documentation.split("\n\n").next().unwrap_or_default();

    let mut signatures = Vec::new();
    for line in block.lines() {
        let Some(captures) = SIGNATURE_LINE.captures(line) else {
            continue;
        };
        let inner = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        let parameters: Vec<ParameterInformation> = inner
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| ParameterInformation {
                label: ParameterLabel::Simple(p.to_string()),
                documentation: None,
            })
            .collect();

        signatures.push(SignatureInformation {
            label: line.trim().to_string(),
            documentation: None,
            parameters: Some(parameters),
            active_parameter: None,
        });
    }
    signatures
}
