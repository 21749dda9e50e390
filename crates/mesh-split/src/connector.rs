//! Connector synthesis.
//!
//! Adds alignment pegs and sockets to the faces where neighboring parts
//! meet, so a decomposed print reassembles without jigs. Each mating face
//! pair gets pegs from the lower-index part and matching sockets from the
//! higher-index part; a socket is oversized by a radial tolerance so the
//! pair actually fits after printing.
//!
//! Candidates are laid out on a spacing grid across the shared cell face,
//! then validated with two rays against the part's own surface: one
//! confirming the surface is present at the candidate, one confirming the
//! interior is deep enough to carry the peg or socket body. Candidates that
//! fail either ray are dropped silently.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::evaluator::{BooleanEvaluator, BooleanOp};
use crate::partition::Partition;
use crate::primitives::cylinder_mesh;
use crate::probe::SurfaceProbe;
use crate::types::{Aabb, Mesh, Part};

/// Offset of the surface-presence ray origin outside the face plane.
const SURFACE_RAY_OFFSET: f64 = 0.5;

/// Maximum distance at which the surface-presence ray must hit.
const SURFACE_RAY_RANGE: f64 = 1.0;

/// Offset of the clearance ray origin inside the face plane.
const CLEARANCE_RAY_OFFSET: f64 = 0.1;

/// Fraction of the peg length that must be clear behind the face.
const CLEARANCE_FACTOR: f64 = 0.7;

/// Connector placement parameters.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(feature = "config", serde(default))]
pub struct ConnectorConfig {
    /// Peg diameter, in mm.
    pub peg_diameter: f64,
    /// Total peg length; half protrudes, half is embedded.
    pub peg_length: f64,
    /// Extra radius given to sockets so pegs fit after printing.
    pub radial_tolerance: f64,
    /// Grid spacing between candidate centers, in mm.
    pub spacing: f64,
    /// Minimum distance from a face edge to the candidate grid.
    pub margin: f64,
    /// Cylinder tessellation segments.
    pub segments: u32,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            peg_diameter: 5.0,
            peg_length: 10.0,
            radial_tolerance: 0.2,
            spacing: 25.0,
            margin: 10.0,
            segments: 16,
        }
    }
}

impl ConnectorConfig {
    /// Socket radius: the peg radius plus the radial tolerance, never less
    /// than the peg radius.
    pub fn socket_radius(&self) -> f64 {
        self.peg_diameter / 2.0 + self.radial_tolerance.max(0.0)
    }
}

/// Per-part outcome of connector synthesis.
#[derive(Debug, Clone, Default)]
pub struct ConnectorStats {
    pub pegs_placed: usize,
    pub sockets_placed: usize,
    pub candidates_rejected: usize,
    /// Faces whose boolean application failed, with reasons. The part mesh
    /// is unchanged for these faces.
    pub skipped_faces: Vec<String>,
}

/// Add pegs and sockets to every mating face of a part.
///
/// Mutates `part.mesh` in place, one boolean per face: all pegs of a face
/// in a single union, all sockets of a face in a single subtraction. A
/// failed face leaves the mesh as it was and is recorded in
/// [`ConnectorStats::skipped_faces`]; remaining faces still run against
/// the current mesh.
pub fn add_connectors(
    part: &mut Part,
    partition: &Partition,
    config: &ConnectorConfig,
    evaluator: &dyn BooleanEvaluator,
) -> ConnectorStats {
    let mut stats = ConnectorStats::default();

    let Some(cell) = partition.cell(part.index) else {
        warn!(part = %part.name, "part has no cell in the partition");
        return stats;
    };

    for axis in 0..3usize {
        for positive in [true, false] {
            if !partition.has_neighbor(part.index, axis, positive) {
                continue;
            }
            synthesize_face(part, &cell.bounds, axis, positive, config, evaluator, &mut stats);
        }
    }

    debug!(
        part = %part.name,
        pegs = stats.pegs_placed,
        sockets = stats.sockets_placed,
        rejected = stats.candidates_rejected,
        "connectors synthesized"
    );
    stats
}

#[allow(clippy::too_many_arguments)]
fn synthesize_face(
    part: &mut Part,
    cell_bounds: &Aabb,
    axis: usize,
    positive: bool,
    config: &ConnectorConfig,
    evaluator: &dyn BooleanEvaluator,
    stats: &mut ConnectorStats,
) {
    let label = face_label(axis, positive);

    let mut normal = Vector3::zeros();
    normal[axis] = if positive { 1.0 } else { -1.0 };
    let plane = if positive {
        cell_bounds.max[axis]
    } else {
        cell_bounds.min[axis]
    };

    let candidates = candidate_centers(cell_bounds, axis, plane, config);
    if candidates.is_empty() {
        return;
    }

    // The mesh changes face to face, so the probe cannot be shared.
    let probe = SurfaceProbe::new(&part.mesh);
    let inward = -normal;
    let clearance = CLEARANCE_FACTOR * config.peg_length;
    let valid: Vec<bool> = candidates
        .par_iter()
        .map(|center| {
            let outside = center + SURFACE_RAY_OFFSET * normal;
            if probe.cast(&outside, &inward, SURFACE_RAY_RANGE).is_none() {
                return false;
            }
            let inside = center - CLEARANCE_RAY_OFFSET * normal;
            probe.cast(&inside, &inward, clearance).is_none()
        })
        .collect();

    let radius = if positive {
        config.peg_diameter / 2.0
    } else {
        config.socket_radius()
    };
    let half = config.peg_length / 2.0;

    let mut batch = Mesh::new();
    let mut placed = 0usize;
    for (center, ok) in candidates.iter().zip(&valid) {
        if !*ok {
            stats.candidates_rejected += 1;
            debug!(face = label, x = center.x, y = center.y, z = center.z, "candidate rejected");
            continue;
        }
        batch.append(&cylinder_mesh(
            center - half * normal,
            center + half * normal,
            radius,
            config.segments,
        ));
        placed += 1;
    }
    if placed == 0 {
        return;
    }

    let op = if positive {
        BooleanOp::Union
    } else {
        BooleanOp::Subtraction
    };
    match evaluator.evaluate(&part.mesh, &batch, op) {
        Ok(mesh) if !mesh.is_empty() => {
            part.mesh = mesh;
            if positive {
                stats.pegs_placed += placed;
            } else {
                stats.sockets_placed += placed;
            }
        }
        Ok(_) => {
            warn!(part = %part.name, face = label, "connector boolean returned empty result");
            stats
                .skipped_faces
                .push(format!("{label}: evaluator returned an empty mesh"));
        }
        Err(err) => {
            warn!(part = %part.name, face = label, error = %err, "connector boolean failed");
            stats.skipped_faces.push(format!("{label}: {err}"));
        }
    }
}

/// Candidate centers on a face plane, symmetric about the face center.
///
/// In-plane axes follow the cyclic rule X face spans (Y, Z), Y face spans
/// (Z, X), Z face spans (X, Y).
fn candidate_centers(
    cell_bounds: &Aabb,
    axis: usize,
    plane: f64,
    config: &ConnectorConfig,
) -> Vec<Point3<f64>> {
    let (u_axis, v_axis) = match axis {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };

    let size = cell_bounds.size();
    let count_u = grid_count(size[u_axis], config);
    let count_v = grid_count(size[v_axis], config);

    let center = cell_bounds.center();
    let mut candidates = Vec::with_capacity((count_u + 1) * (count_v + 1));
    for du in 0..=count_u {
        for dv in 0..=count_v {
            let mut point = center;
            point[axis] = plane;
            point[u_axis] =
                center[u_axis] + du as f64 * config.spacing - count_u as f64 * config.spacing / 2.0;
            point[v_axis] =
                center[v_axis] + dv as f64 * config.spacing - count_v as f64 * config.spacing / 2.0;
            candidates.push(point);
        }
    }
    candidates
}

/// Spacing intervals that fit across a face once margins are reserved.
fn grid_count(width: f64, config: &ConnectorConfig) -> usize {
    let usable = (width - 2.0 * config.margin) / config.spacing;
    if usable.is_finite() && usable > 0.0 {
        usable.floor() as usize
    } else {
        0
    }
}

fn face_label(axis: usize, positive: bool) -> &'static str {
    match (axis, positive) {
        (0, true) => "x+",
        (0, false) => "x-",
        (1, true) => "y+",
        (1, false) => "y-",
        (2, true) => "z+",
        _ => "z-",
    }
}
