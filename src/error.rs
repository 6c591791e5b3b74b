//! Error types for the segtext CLI.
//!
//! Library code reports [`TemplateError`]; this type adds the failures that
//! only the CLI has (arguments, config files, context parsing) and maps each
//! to an exit code.

use crate::exit_codes;
use crate::template::TemplateError;
use thiserror::Error;

/// Main error type for segtext commands.
#[derive(Error, Debug)]
pub enum SegtextError {
    /// The user supplied invalid arguments, configuration, or context.
    #[error("{0}")]
    UserError(String),

    /// Rendering the template failed.
    #[error(transparent)]
    RenderError(#[from] TemplateError),
}

impl SegtextError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SegtextError::UserError(_) => exit_codes::USER_ERROR,
            SegtextError::RenderError(_) => exit_codes::RENDER_FAILURE,
        }
    }
}

/// Result type alias for segtext commands.
pub type Result<T> = std::result::Result<T, SegtextError>;
