//! Boolean evaluator seam.
//!
//! The engine never computes booleans itself; every union, subtraction, and
//! intersection goes through an injected [`BooleanEvaluator`]. Production
//! code plugs in a CSG backend (the workspace ships `mesh-boolean`); tests
//! plug in scripted mocks.

use thiserror::Error;

use crate::types::Mesh;

/// A boolean operation the engine can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    /// A ∪ B.
    Union,
    /// A − B.
    Subtraction,
    /// A ∩ B.
    Intersection,
}

impl std::fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Union => "union",
            Self::Subtraction => "subtraction",
            Self::Intersection => "intersection",
        };
        write!(f, "{}", name)
    }
}

/// Failure reported by a boolean evaluator.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    /// An operand was degenerate (empty, non-manifold, self-intersecting)
    /// beyond what the evaluator tolerates.
    #[error("degenerate input: {details}")]
    DegenerateInput {
        /// Which operand and why.
        details: String,
    },

    /// The evaluation itself failed.
    #[error("evaluation failed: {details}")]
    Failed {
        /// Backend-reported failure details.
        details: String,
    },
}

impl EvaluatorError {
    /// Create a degenerate-input error.
    pub fn degenerate(details: impl Into<String>) -> Self {
        Self::DegenerateInput {
            details: details.into(),
        }
    }

    /// Create an evaluation-failed error.
    pub fn failed(details: impl Into<String>) -> Self {
        Self::Failed {
            details: details.into(),
        }
    }
}

/// An external boolean mesh evaluator.
///
/// Implementations are stateless from the engine's point of view: `evaluate`
/// must not carry visible state between calls, so a single instance can be
/// shared across stages and threads.
///
/// An `Ok` result MAY be an empty mesh — an empty intersection is a valid
/// answer, not an error. Conversely the evaluator MAY fail on degenerate
/// input; every engine call site handles both outcomes.
pub trait BooleanEvaluator: Send + Sync {
    /// Evaluate `a <op> b` and return the resulting mesh.
    fn evaluate(&self, a: &Mesh, b: &Mesh, op: BooleanOp) -> Result<Mesh, EvaluatorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_display() {
        assert_eq!(format!("{}", BooleanOp::Union), "union");
        assert_eq!(format!("{}", BooleanOp::Subtraction), "subtraction");
        assert_eq!(format!("{}", BooleanOp::Intersection), "intersection");
    }

    #[test]
    fn test_trait_is_object_safe() {
        struct Identity;
        impl BooleanEvaluator for Identity {
            fn evaluate(&self, a: &Mesh, _b: &Mesh, _op: BooleanOp) -> Result<Mesh, EvaluatorError> {
                Ok(a.clone())
            }
        }

        let ev: &dyn BooleanEvaluator = &Identity;
        let mesh = Mesh::new();
        let out = ev.evaluate(&mesh, &mesh, BooleanOp::Union).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = EvaluatorError::degenerate("operand B has no faces");
        assert!(format!("{}", err).contains("degenerate"));
        let err = EvaluatorError::failed("non-manifold result");
        assert!(format!("{}", err).contains("non-manifold"));
    }
}
