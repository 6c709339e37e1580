use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

/// A recoverable problem, tagged with the 1-based source line it came from.
///
/// Nothing in the conversion pipeline is fatal: every problem becomes a
/// warning and processing continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub line: usize,
    pub message: String,
}

impl Warning {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Warning {
            line,
            message: message.into(),
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    /// `span` should cover the warning's source line.
    pub fn to_diagnostic(&self, file_id: usize, span: Range<usize>) -> Diagnostic<usize> {
        Diagnostic::new(Severity::Warning)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(file_id, span)])
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Record a warning and mirror it to the log.
pub fn warn(diagnostics: &mut Vec<Warning>, line: usize, message: impl Into<String>) {
    let warning = Warning::new(line, message);
    log::warn!("{}", warning);
    diagnostics.push(warning);
}
