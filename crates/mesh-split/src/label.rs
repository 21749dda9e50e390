//! Label synthesis.
//!
//! Fuses a small identification plate onto the underside of a part so
//! assemblers can tell the pieces apart after printing. The plate is a flat
//! pad centered on the part footprint, flush with the part's lowest point.

use nalgebra::Point3;
use tracing::debug;

use crate::error::{SplitError, SplitResult};
use crate::evaluator::{BooleanEvaluator, BooleanOp};
use crate::primitives::box_mesh;
use crate::types::{Aabb, Part};

/// Label plate parameters.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(feature = "config", serde(default))]
pub struct LabelConfig {
    /// Plate width along X; depth along Z is half of this.
    pub plate_size: f64,
    /// Plate height along Y.
    pub thickness: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            plate_size: 20.0,
            thickness: 1.0,
        }
    }
}

/// Fuse a base plate onto the bottom of a part.
///
/// The plate bottom is flush with the part's minimum Y, so the plate grows
/// upward into the part body. Failure leaves the part untouched and
/// surfaces as [`SplitError::BooleanFailed`] for the caller to record.
pub fn add_label(
    part: &mut Part,
    config: &LabelConfig,
    evaluator: &dyn BooleanEvaluator,
) -> SplitResult<()> {
    let Some(bounds) = part.mesh.bounds() else {
        return Err(SplitError::boolean_failed(
            "union",
            format!("part {} has no bounds to attach a label to", part.name),
        ));
    };

    let center = bounds.center();
    let half = config.plate_size / 2.0;
    let quarter = config.plate_size / 4.0;
    let plate = box_mesh(&Aabb::new(
        Point3::new(center.x - half, bounds.min.y, center.z - quarter),
        Point3::new(
            center.x + half,
            bounds.min.y + config.thickness,
            center.z + quarter,
        ),
    ));

    let mesh = evaluator
        .evaluate(&part.mesh, &plate, BooleanOp::Union)
        .map_err(|err| {
            SplitError::boolean_failed("union", format!("label on {}: {}", part.name, err))
        })?;
    if mesh.is_empty() {
        return Err(SplitError::boolean_failed(
            "union",
            format!("label on {} produced an empty mesh", part.name),
        ));
    }

    debug!(part = %part.name, "label plate attached");
    part.mesh = mesh;
    Ok(())
}
