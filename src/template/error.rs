//! Error types for template rendering.

use crate::registry::SegmentNotFound;
use thiserror::Error;

/// Error returned by [`render`](super::render) and [`Engine`](super::Engine).
///
/// Patching never fails; every variant comes from compiling or executing the
/// patched template, or from using the facade before [`init`](super::init).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// The template text is not valid action syntax.
    #[error("template:{line}:{column}: {message}")]
    Compile {
        /// What went wrong.
        message: String,
        /// 1-based line of the offending token.
        line: usize,
        /// 1-based column of the offending token.
        column: usize,
    },

    /// A reference resolved to nothing: no local field, no reserved name.
    #[error("missing field '{name}': {reason}")]
    MissingField {
        /// The field name that could not be resolved.
        name: String,
        /// Why resolution failed.
        reason: String,
    },

    /// `MustGet` on a segment that was never set.
    #[error("segment not found: {name}")]
    SegmentNotFound {
        /// The segment name.
        name: String,
    },

    /// Any other failure while executing: wrong argument types, bad regex,
    /// calling a non-function, and so on.
    #[error("template: {message}")]
    Execution {
        /// What went wrong.
        message: String,
    },

    /// The process-wide facade was used before `init`.
    #[error("template engine is not initialized; call template::init first")]
    NotInitialized,
}

impl TemplateError {
    pub(crate) fn execution(message: impl Into<String>) -> Self {
        TemplateError::Execution {
            message: message.into(),
        }
    }

    pub(crate) fn missing_field(name: impl Into<String>, reason: impl Into<String>) -> Self {
        TemplateError::MissingField {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Build a compile error, locating `position` (a byte offset) in `source`.
    pub(crate) fn compile(source: &str, position: usize, message: impl Into<String>) -> Self {
        let position = position.min(source.len());
        let before = &source[..position];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        TemplateError::Compile {
            message: message.into(),
            line,
            column,
        }
    }
}

impl From<SegmentNotFound> for TemplateError {
    fn from(err: SegmentNotFound) -> Self {
        TemplateError::SegmentNotFound { name: err.name }
    }
}

/// Result type alias for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;
