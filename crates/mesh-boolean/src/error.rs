//! Error types for boolean operations.

use miette::Diagnostic;
use thiserror::Error;

/// Errors a boolean operation can produce.
///
/// The kernel is deliberately forgiving: geometry it cannot handle exactly
/// degrades to an approximation instead of failing, so the only hard error
/// is input that carries no geometry at all.
#[derive(Debug, Error, Diagnostic)]
pub enum BooleanError {
    /// An operand has no vertices or no faces.
    #[error("empty input mesh: {details}")]
    #[diagnostic(
        code(boolean::empty_input),
        help("Boolean operands must carry at least one triangle.")
    )]
    EmptyInput {
        /// Which operand was empty.
        details: String,
    },
}

impl BooleanError {
    pub fn empty_input(details: impl Into<String>) -> Self {
        Self::EmptyInput {
            details: details.into(),
        }
    }
}
