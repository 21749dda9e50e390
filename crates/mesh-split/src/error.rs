//! Error types for decomposition operations.
//!
//! Every error carries a stable `SPLIT-XXXX` code and a recovery suggestion
//! so embedding applications can present actionable diagnostics.

use miette::Diagnostic;
use thiserror::Error;

/// Stable error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Input errors (1xxx)
    /// SPLIT-1001: Source mesh had no geometry
    EmptySource = 1001,
    /// SPLIT-1002: The solid parts are cut from could not be produced
    BaseSolidFailed = 1002,

    // Configuration errors (2xxx)
    /// SPLIT-2001: Partition cell count exceeded the hard limit
    CellLimitExceeded = 2001,
    /// SPLIT-2002: Slicing or feature configuration was invalid
    InvalidConfig = 2002,

    // Evaluation errors (3xxx)
    /// SPLIT-3001: A boolean evaluation failed in a context where it is fatal
    BooleanFailed = 3001,

    // Control errors (4xxx)
    /// SPLIT-4001: Run was cancelled through the progress callback
    Cancelled = 4001,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `SPLIT-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::EmptySource => "SPLIT-1001",
            ErrorCode::BaseSolidFailed => "SPLIT-1002",
            ErrorCode::CellLimitExceeded => "SPLIT-2001",
            ErrorCode::InvalidConfig => "SPLIT-2002",
            ErrorCode::BooleanFailed => "SPLIT-3001",
            ErrorCode::Cancelled => "SPLIT-4001",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Suggested recovery action for an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Check that the source mesh has valid, finite geometry.
    CheckSourceMesh,
    /// Use a larger envelope or fewer manual splits.
    CoarsenSlicing,
    /// Adjust the offending configuration values.
    AdjustParameters,
    /// Try a different boolean evaluator implementation.
    UseDifferentEvaluator,
    /// No automated recovery available.
    None,
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::CheckSourceMesh => "Check that the source mesh has valid, finite geometry",
            Self::CoarsenSlicing => "Increase the printable envelope or reduce manual splits",
            Self::AdjustParameters => "Adjust the configuration values named in the error",
            Self::UseDifferentEvaluator => "Try a different boolean evaluator implementation",
            Self::None => "No automated recovery available",
        };
        write!(f, "{}", msg)
    }
}

/// Errors produced by decomposition operations.
#[derive(Debug, Error, Diagnostic)]
pub enum SplitError {
    /// The source mesh has no vertices or no faces.
    #[error("source mesh is empty: {details}")]
    #[diagnostic(
        code(split::input::empty),
        help("Provide a mesh with at least one triangle before decomposing")
    )]
    EmptySource {
        /// What was empty and where it was detected.
        details: String,
    },

    /// The solid that parts are cut from could not be produced.
    #[error("base solid could not be produced: {details}")]
    #[diagnostic(
        code(split::pipeline::base_solid),
        help("The source geometry collapsed during normalization; check for degenerate input")
    )]
    BaseSolidFailed {
        /// Why the base solid is unusable.
        details: String,
    },

    /// The requested partition exceeds the cell limit.
    #[error("partition would produce {cells} cells, exceeding the limit of {limit}")]
    #[diagnostic(
        code(split::partition::cell_limit),
        help("Increase the printable envelope or switch to manual slicing")
    )]
    CellLimitExceeded {
        /// Number of cells the configuration would produce.
        cells: usize,
        /// The hard limit.
        limit: usize,
    },

    /// A slicing or feature configuration value is invalid.
    #[error("invalid configuration: {details}")]
    #[diagnostic(
        code(split::config::invalid),
        help("Adjust the configuration values named in the error message")
    )]
    InvalidConfig {
        /// Which value was invalid and why.
        details: String,
    },

    /// A boolean evaluation failed.
    #[error("boolean {operation} failed: {details}")]
    #[diagnostic(
        code(split::boolean::failed),
        help("The evaluator rejected the operands; check for degenerate geometry")
    )]
    BooleanFailed {
        /// Which operation was attempted (union, subtraction, intersection).
        operation: String,
        /// Evaluator-reported failure details.
        details: String,
    },

    /// The run was cancelled through the progress callback.
    #[error("operation cancelled by progress callback")]
    #[diagnostic(code(split::pipeline::cancelled))]
    Cancelled,
}

impl SplitError {
    /// Get the stable error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::EmptySource { .. } => ErrorCode::EmptySource,
            Self::BaseSolidFailed { .. } => ErrorCode::BaseSolidFailed,
            Self::CellLimitExceeded { .. } => ErrorCode::CellLimitExceeded,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::BooleanFailed { .. } => ErrorCode::BooleanFailed,
            Self::Cancelled => ErrorCode::Cancelled,
        }
    }

    /// Get the suggested recovery action for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            Self::EmptySource { .. } | Self::BaseSolidFailed { .. } => {
                RecoverySuggestion::CheckSourceMesh
            }
            Self::CellLimitExceeded { .. } => RecoverySuggestion::CoarsenSlicing,
            Self::InvalidConfig { .. } => RecoverySuggestion::AdjustParameters,
            Self::BooleanFailed { .. } => RecoverySuggestion::UseDifferentEvaluator,
            Self::Cancelled => RecoverySuggestion::None,
        }
    }

    /// Create an empty-source error.
    pub fn empty_source(details: impl Into<String>) -> Self {
        Self::EmptySource {
            details: details.into(),
        }
    }

    /// Create a base-solid error.
    pub fn base_solid(details: impl Into<String>) -> Self {
        Self::BaseSolidFailed {
            details: details.into(),
        }
    }

    /// Create a cell-limit error.
    pub fn cell_limit(cells: usize, limit: usize) -> Self {
        Self::CellLimitExceeded { cells, limit }
    }

    /// Create an invalid-configuration error.
    pub fn invalid_config(details: impl Into<String>) -> Self {
        Self::InvalidConfig {
            details: details.into(),
        }
    }

    /// Create a boolean-failure error.
    pub fn boolean_failed(operation: impl Into<String>, details: impl Into<String>) -> Self {
        Self::BooleanFailed {
            operation: operation.into(),
            details: details.into(),
        }
    }
}

/// Result type alias for decomposition operations.
pub type SplitResult<T> = Result<T, SplitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            SplitError::empty_source("no faces").code().as_str(),
            "SPLIT-1001"
        );
        assert_eq!(SplitError::cell_limit(501, 500).code().as_str(), "SPLIT-2001");
        assert_eq!(SplitError::Cancelled.code().as_str(), "SPLIT-4001");
    }

    #[test]
    fn test_recovery_suggestions() {
        assert_eq!(
            SplitError::cell_limit(1000, 500).recovery_suggestion(),
            RecoverySuggestion::CoarsenSlicing
        );
        assert_eq!(
            SplitError::invalid_config("negative envelope").recovery_suggestion(),
            RecoverySuggestion::AdjustParameters
        );
        assert_eq!(
            SplitError::boolean_failed("union", "degenerate").recovery_suggestion(),
            RecoverySuggestion::UseDifferentEvaluator
        );
    }

    #[test]
    fn test_error_display() {
        let err = SplitError::cell_limit(512, 500);
        let msg = format!("{}", err);
        assert!(msg.contains("512"));
        assert!(msg.contains("500"));

        let err = SplitError::boolean_failed("subtraction", "empty operand");
        let msg = format!("{}", err);
        assert!(msg.contains("subtraction"));
        assert!(msg.contains("empty operand"));
    }
}
