//! Row-level diagnostics collected during a compile

use serde::Serialize;
use std::fmt;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    /// A control-sheet row could not be read.
    ControlRow,
    /// A data-sheet row could not be read.
    DataRow,
    /// A QName prefix has no import directive.
    MissingImport,
    /// A depth has no ancestor chain under the current ELR frame.
    MissingAncestor,
    /// A second label linkbase was declared for one language.
    DuplicateLabelLanguage,
    /// A concept prefix maps to neither the extension schema nor an import.
    UnresolvedHref,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::ControlRow => "control-row",
            DiagnosticCode::DataRow => "data-row",
            DiagnosticCode::MissingImport => "missing-import",
            DiagnosticCode::MissingAncestor => "missing-ancestor",
            DiagnosticCode::DuplicateLabelLanguage => "duplicate-label-language",
            DiagnosticCode::UnresolvedHref => "unresolved-href",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetKind {
    Control,
    Data,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<SheetKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            sheet: None,
            row: None,
            message: message.into(),
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::warning(code, message)
        }
    }

    pub fn at(mut self, sheet: SheetKind, row: usize) -> Self {
        self.sheet = Some(sheet);
        self.row = Some(row);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.code)?;
        match (self.sheet, self.row) {
            (Some(SheetKind::Control), Some(row)) => write!(f, " control row {}:", row)?,
            (Some(SheetKind::Data), Some(row)) => write!(f, " data row {}:", row)?,
            _ => {}
        }
        write!(f, " {}", self.message)
    }
}

/// Failure reading one row; turned into an error diagnostic by the pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct RowError(pub String);

/// What processing one row produced besides its accumulator writes.
#[derive(Debug, Default)]
pub struct RowOutcome {
    pub diagnostics: Vec<Diagnostic>,
}

impl RowOutcome {
    pub fn warn(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(code, message));
    }
}

/// End-of-pass diagnostic list.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => error!(code = %diagnostic.code, row = ?diagnostic.row, "{}", diagnostic.message),
            Severity::Warning => warn!(code = %diagnostic.code, row = ?diagnostic.row, "{}", diagnostic.message),
        }
        self.items.push(diagnostic);
    }

    /// Folds the outcome of one row into the list, stamping its location.
    pub fn record(&mut self, sheet: SheetKind, row: usize, result: Result<RowOutcome, RowError>) {
        match result {
            Ok(outcome) => {
                for diagnostic in outcome.diagnostics {
                    self.push(diagnostic.at(sheet, row));
                }
            }
            Err(err) => {
                let code = match sheet {
                    SheetKind::Control => DiagnosticCode::ControlRow,
                    SheetKind::Data => DiagnosticCode::DataRow,
                };
                self.push(Diagnostic::error(code, err.0).at(sheet, row));
            }
        }
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.items.len() - self.error_count()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_stamps_location() {
        let mut diagnostics = Diagnostics::new();
        let mut outcome = RowOutcome::default();
        outcome.warn(DiagnosticCode::MissingImport, "prefix schema file is not imported for: foo:Bar");
        diagnostics.record(SheetKind::Data, 7, Ok(outcome));
        diagnostics.record(SheetKind::Control, 3, Err(RowError("bad cell".to_string())));

        let items = diagnostics.as_slice();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].row, Some(7));
        assert_eq!(items[0].severity, Severity::Warning);
        assert_eq!(items[1].code, DiagnosticCode::ControlRow);
        assert_eq!(items[1].to_string(), "[control-row] control row 3: bad cell");
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_serializes_codes_in_kebab_case() {
        let diagnostic = Diagnostic::warning(DiagnosticCode::MissingAncestor, "dropped").at(SheetKind::Data, 4);
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["code"], "missing-ancestor");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["sheet"], "data");
        assert_eq!(json["row"], 4);
    }
}
