use crate::isa::diagnostic::{DiagnosticPhase, IsaDiagnostic};

/// Represents any failure that can occur while loading, parsing, building, or validating an
/// instruction description.
#[derive(Debug, thiserror::Error)]
pub enum IsaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parser error: {0}")]
    Parser(String),
    #[error("build error: {0}")]
    Build(String),
    #[error("{phase:?} produced {} issue(s):\n{}", .diagnostics.len(), render(.diagnostics))]
    Diagnostics {
        phase: DiagnosticPhase,
        diagnostics: Vec<IsaDiagnostic>,
    },
}

impl IsaError {
    /// Diagnostics carried by the error, empty for the single-message variants.
    pub fn diagnostics(&self) -> &[IsaDiagnostic] {
        match self {
            IsaError::Diagnostics { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

fn render(diagnostics: &[IsaDiagnostic]) -> String {
    diagnostics
        .iter()
        .map(|diag| format!("  - {}", diag.format_human()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_display_lists_every_issue() {
        let err = IsaError::Diagnostics {
            phase: DiagnosticPhase::Validation,
            diagnostics: vec![
                IsaDiagnostic::error(DiagnosticPhase::Validation, "a", "first", None),
                IsaDiagnostic::error(DiagnosticPhase::Validation, "b", "second", None),
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("Validation produced 2 issue(s):"));
        assert!(text.contains("first"));
        assert!(text.contains("second"));
        assert_eq!(err.diagnostics().len(), 2);
    }
}
