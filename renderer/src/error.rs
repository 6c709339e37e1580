use mddoc::ElementKind;
use thiserror::Error;

use crate::builder::BuildError;

/// Failure while rendering a single element.
///
/// The dispatcher turns these into line-tagged warnings; they never stop the
/// run.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("malformed {kind} element: {reason}")]
    Malformed { kind: ElementKind, reason: String },
}

impl RenderError {
    pub fn malformed(kind: ElementKind, reason: impl Into<String>) -> Self {
        RenderError::Malformed {
            kind,
            reason: reason.into(),
        }
    }
}
