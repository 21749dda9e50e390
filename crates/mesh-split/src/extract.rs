//! Part extraction.
//!
//! Cuts one printable part out of the base solid by intersecting it with a
//! cell's bounding box. Cells the solid never reaches come back empty, not
//! as errors.

use tracing::debug;

use crate::error::{SplitError, SplitResult};
use crate::evaluator::{BooleanEvaluator, BooleanOp};
use crate::partition::Cell;
use crate::primitives::box_mesh;
use crate::types::{Mesh, Part};

/// Intersect the base solid with a cell.
///
/// Returns `Ok(None)` when the cell contains no geometry (a valid outcome
/// for cells outside the solid). Evaluator failures surface as
/// [`SplitError::BooleanFailed`]; the caller decides whether to skip the
/// cell or abort.
pub fn extract_part(
    base: &Mesh,
    cell: &Cell,
    evaluator: &dyn BooleanEvaluator,
) -> SplitResult<Option<Part>> {
    let cutter = box_mesh(&cell.bounds);

    let mesh = evaluator
        .evaluate(base, &cutter, BooleanOp::Intersection)
        .map_err(|err| {
            SplitError::boolean_failed(
                "intersection",
                format!("cell {}: {}", cell.index, err),
            )
        })?;

    if mesh.vertex_count() == 0 {
        debug!(cell = %cell.index, "cell is empty");
        return Ok(None);
    }

    debug!(
        cell = %cell.index,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "part extracted"
    );
    Ok(Some(Part::new(cell.index, mesh)))
}
