//! Validation types for PromQL Language Tools

use serde::{Deserialize, Serialize};

/// Result of validating a PromQL query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the query parsed without errors
    pub valid: bool,
    /// Diagnostics (errors and warnings)
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Build a result from parser diagnostics
    #[must_use]
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            valid: !diagnostics.iter().any(Diagnostic::is_error),
            diagnostics,
        }
    }

    /// Check if the validation passed (no errors)
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid && !self.has_errors()
    }

    /// Check if there are any errors
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Get all diagnostics
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get only error diagnostics
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }
}

/// A diagnostic message produced while parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The diagnostic message
    pub message: String,
    /// Severity level
    pub severity: DiagnosticSeverity,
    /// Start offset in the query (0-based, byte position)
    pub start: usize,
    /// End offset in the query (exclusive)
    pub end: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, in characters)
    pub column: usize,
    /// Short machine-readable code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic, resolving line and column against `text`
    #[must_use]
    pub fn error(
        text: &str,
        code: &str,
        message: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Self {
        let start = start.min(text.len());
        let (line, column) = line_column(text, start);
        Self {
            message: message.into(),
            severity: DiagnosticSeverity::Error,
            start,
            end: end.max(start),
            line,
            column,
            code: Some(code.to_string()),
        }
    }

    /// Get the length of the diagnostic span
    #[must_use]
    pub fn length(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if this is an error
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (i, ch) in text.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DiagnosticSeverity {
    /// An error that prevents the query from being valid
    Error,
    /// A warning about potential issues
    Warning,
}

impl std::fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "Error"),
            Self::Warning => write!(f, "Warning"),
        }
    }
}
