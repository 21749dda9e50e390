//! [`BooleanEvaluator`] implementation backed by the classification
//! kernel.

use mesh_split::evaluator::{BooleanEvaluator, BooleanOp, EvaluatorError};
use mesh_split::types::Mesh;

use crate::boolean::{boolean_operation, BooleanParams};
use crate::error::BooleanError;

/// Boolean evaluator that runs the built-in classification kernel.
///
/// The evaluator is stateless apart from its parameters, so one instance
/// can serve a whole decomposition run, including the parallel sections.
///
/// # Examples
///
/// ```
/// use mesh_boolean::NativeEvaluator;
/// use mesh_split::evaluator::{BooleanEvaluator, BooleanOp};
/// use mesh_split::primitives::box_mesh;
/// use mesh_split::types::Aabb;
/// use nalgebra::Point3;
///
/// let evaluator = NativeEvaluator::new();
/// let a = box_mesh(&Aabb::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(10.0, 10.0, 10.0),
/// ));
/// let b = box_mesh(&Aabb::new(
///     Point3::new(20.0, 0.0, 0.0),
///     Point3::new(30.0, 10.0, 10.0),
/// ));
///
/// let merged = evaluator.evaluate(&a, &b, BooleanOp::Union)?;
/// assert_eq!(merged.face_count(), 24);
/// # Ok::<(), mesh_split::evaluator::EvaluatorError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct NativeEvaluator {
    params: BooleanParams,
}

impl NativeEvaluator {
    /// Evaluator with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator with explicit kernel parameters.
    pub fn with_params(params: BooleanParams) -> Self {
        Self { params }
    }

    /// The kernel parameters in use.
    pub fn params(&self) -> &BooleanParams {
        &self.params
    }
}

impl BooleanEvaluator for NativeEvaluator {
    fn evaluate(&self, a: &Mesh, b: &Mesh, op: BooleanOp) -> Result<Mesh, EvaluatorError> {
        boolean_operation(a, b, op, &self.params)
            .map(|result| result.mesh)
            .map_err(|err| match err {
                BooleanError::EmptyInput { details } => EvaluatorError::degenerate(details),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_split::primitives::box_mesh;
    use mesh_split::types::Aabb;
    use nalgebra::Point3;

    fn cube(min: f64, max: f64) -> Mesh {
        box_mesh(&Aabb::new(
            Point3::new(min, min, min),
            Point3::new(max, max, max),
        ))
    }

    #[test]
    fn test_union_through_trait() {
        let evaluator = NativeEvaluator::new();
        let merged = evaluator
            .evaluate(&cube(0.0, 10.0), &cube(50.0, 60.0), BooleanOp::Union)
            .unwrap();
        assert_eq!(merged.face_count(), 24);
    }

    #[test]
    fn test_empty_operand_maps_to_degenerate() {
        let evaluator = NativeEvaluator::new();
        let err = evaluator
            .evaluate(&Mesh::new(), &cube(0.0, 10.0), BooleanOp::Union)
            .unwrap_err();
        assert!(matches!(err, EvaluatorError::DegenerateInput { .. }));
    }

    #[test]
    fn test_subtraction_of_contained_box_hollows() {
        let evaluator = NativeEvaluator::new();
        let shell = evaluator
            .evaluate(&cube(0.0, 40.0), &cube(10.0, 20.0), BooleanOp::Subtraction)
            .unwrap();
        assert_eq!(shell.face_count(), 24);
        assert!(shell.signed_volume() < cube(0.0, 40.0).signed_volume());
    }
}
