//! Solid hollowing.
//!
//! Carves an interior cavity out of a solid by subtracting a shrunken copy
//! of it, leaving a shell of roughly uniform wall thickness. Optionally
//! punches a vertical drain hole through the bottom so resin or powder can
//! escape the cavity. Hollowing is best-effort: any failure falls back to
//! the geometry from before the failing step.

use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

use crate::evaluator::{BooleanEvaluator, BooleanOp};
use crate::primitives::cylinder_mesh;
use crate::tracing_ext::OperationTimer;
use crate::types::Mesh;

/// Segment count for the drain-hole cylinder.
const DRAIN_SEGMENTS: u32 = 16;

/// Hollowing parameters.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(feature = "config", serde(default))]
pub struct HollowConfig {
    /// Target wall thickness of the shell, in mm.
    pub wall_thickness: f64,
    /// Whether to punch a drain hole through the bottom of the shell.
    pub drain_hole: bool,
    /// Diameter of the drain hole, in mm.
    pub drain_hole_diameter: f64,
}

impl Default for HollowConfig {
    fn default() -> Self {
        Self {
            wall_thickness: 2.0,
            drain_hole: false,
            drain_hole_diameter: 4.0,
        }
    }
}

/// Outcome of a hollowing pass.
#[derive(Debug, Clone)]
pub struct HollowResult {
    pub mesh: Mesh,
    /// Whether the cavity subtraction succeeded.
    pub hollowed: bool,
    /// Whether the drain hole was cut.
    pub drain_added: bool,
}

/// Hollow a solid into a shell of `wall_thickness` walls.
///
/// The cavity is the solid itself scaled down about its bounding-box center
/// so the gap to the outer surface is one wall thickness per side. Walls
/// thicker than half an axis extent collapse the factor to a floor of 0.01
/// rather than inverting the cavity.
///
/// Never fails: if the evaluator rejects the subtraction or returns nothing,
/// the original solid comes back with `hollowed = false`; if only the drain
/// cut fails, the intact shell comes back with `drain_added = false`.
pub fn hollow_solid(
    solid: &Mesh,
    config: &HollowConfig,
    evaluator: &dyn BooleanEvaluator,
) -> HollowResult {
    let _timer = OperationTimer::with_context("hollow", solid.vertex_count(), solid.face_count());

    let Some(bounds) = solid.bounds() else {
        warn!("hollowing skipped: solid has no bounds");
        return HollowResult {
            mesh: solid.clone(),
            hollowed: false,
            drain_added: false,
        };
    };

    let size = bounds.size();
    let center = bounds.center();

    let factor = Vector3::new(
        shrink_factor(size.x, config.wall_thickness),
        shrink_factor(size.y, config.wall_thickness),
        shrink_factor(size.z, config.wall_thickness),
    );
    debug!(
        wall = config.wall_thickness,
        fx = factor.x,
        fy = factor.y,
        fz = factor.z,
        "cavity shrink factors"
    );

    let mut inner = solid.clone();
    inner.translate(Point3::origin() - center);
    inner.scale_about_origin(factor);
    inner.translate(center - Point3::origin());

    let shell = match evaluator.evaluate(solid, &inner, BooleanOp::Subtraction) {
        Ok(mesh) if !mesh.is_empty() => mesh,
        Ok(_) => {
            warn!("hollowing produced an empty shell, keeping solid");
            return HollowResult {
                mesh: solid.clone(),
                hollowed: false,
                drain_added: false,
            };
        }
        Err(err) => {
            warn!(error = %err, "hollowing subtraction failed, keeping solid");
            return HollowResult {
                mesh: solid.clone(),
                hollowed: false,
                drain_added: false,
            };
        }
    };

    if !config.drain_hole {
        return HollowResult {
            mesh: shell,
            hollowed: true,
            drain_added: false,
        };
    }

    // Tall enough to pierce both the floor of the shell and the cavity
    // above it, centered on the bottom face.
    let drain_height = size.y + 100.0;
    let bottom_center = Point3::new(center.x, bounds.min.y, center.z);
    let drain = cylinder_mesh(
        Point3::new(
            bottom_center.x,
            bottom_center.y - drain_height / 2.0,
            bottom_center.z,
        ),
        Point3::new(
            bottom_center.x,
            bottom_center.y + drain_height / 2.0,
            bottom_center.z,
        ),
        config.drain_hole_diameter / 2.0,
        DRAIN_SEGMENTS,
    );

    match evaluator.evaluate(&shell, &drain, BooleanOp::Subtraction) {
        Ok(mesh) if !mesh.is_empty() => HollowResult {
            mesh,
            hollowed: true,
            drain_added: true,
        },
        Ok(_) => {
            warn!("drain hole cut emptied the shell, keeping undrained shell");
            HollowResult {
                mesh: shell,
                hollowed: true,
                drain_added: false,
            }
        }
        Err(err) => {
            warn!(error = %err, "drain hole cut failed, keeping undrained shell");
            HollowResult {
                mesh: shell,
                hollowed: true,
                drain_added: false,
            }
        }
    }
}

fn shrink_factor(extent: f64, wall: f64) -> f64 {
    if extent <= 0.0 {
        return 0.01;
    }
    ((extent - 2.0 * wall) / extent).max(0.01)
}
