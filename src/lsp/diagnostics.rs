//! ycmd diagnostic conversion

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};

use crate::ycmd::types as wire;

pub fn to_lsp_diagnostics(diagnostics: &[wire::WireDiagnostic]) -> Vec<Diagnostic> {
    diagnostics.iter().map(convert).collect()
}

fn convert(diagnostic: &wire::WireDiagnostic) -> Diagnostic {
    let range = match &diagnostic.location_extent {
        Some(extent) if extent.start.line_num > 0 => extent_range(extent),
        _ => {
            let p = point(&diagnostic.location);
            Range::new(p, p)
        }
    };

    let severity = match diagnostic.kind.as_str() {
        "ERROR" => DiagnosticSeverity::ERROR,
        "WARNING" => DiagnosticSeverity::WARNING,
        _ => DiagnosticSeverity::INFORMATION,
    };

    Diagnostic {
        range,
        severity: Some(severity),
        message: diagnostic.text.clone(),
        source: Some("ycmd".to_string()),
        ..Default::default()
    }
}

/// ycmd locations are 1-based.
pub(crate) fn point(location: &wire::Location) -> Position {
    Position::new(
        location.line_num.saturating_sub(1),
        location.column_num.saturating_sub(1),
    )
}

pub(crate) fn extent_range(extent: &wire::Extent) -> Range {
    Range::new(point(&extent.start), point(&extent.end))
}
