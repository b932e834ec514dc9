//! Diagnostics attached to analyzed documents.

use awk_grammar::Severity;

use crate::SourceRange;

/// A diagnostic attached to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    severity: Severity,
    /// The source range the diagnostic covers.
    range: SourceRange,
    /// The diagnostic message.
    message: String,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(message: impl Into<String>, range: SourceRange) -> Self {
        Self {
            severity: Severity::Error,
            range,
            message: message.into(),
        }
    }

    /// Creates a new warning diagnostic.
    pub fn warning(message: impl Into<String>, range: SourceRange) -> Self {
        Self {
            severity: Severity::Warning,
            range,
            message: message.into(),
        }
    }

    /// Creates a new diagnostic with the given severity.
    pub fn new(severity: Severity, message: impl Into<String>, range: SourceRange) -> Self {
        Self {
            severity,
            range,
            message: message.into(),
        }
    }

    /// Gets the severity of the diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Gets the source range of the diagnostic.
    pub fn range(&self) -> SourceRange {
        self.range
    }

    /// Gets the message of the diagnostic.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Converts the diagnostic into its LSP representation.
    pub fn to_lsp(&self) -> lsp_types::Diagnostic {
        lsp_types::Diagnostic {
            range: self.range.into(),
            severity: Some(match self.severity {
                Severity::Error => lsp_types::DiagnosticSeverity::ERROR,
                Severity::Warning => lsp_types::DiagnosticSeverity::WARNING,
                Severity::Information => lsp_types::DiagnosticSeverity::INFORMATION,
            }),
            message: self.message.clone(),
            source: Some("awk".to_string()),
            ..Default::default()
        }
    }
}
