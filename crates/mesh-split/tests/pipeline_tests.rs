//! End-to-end decomposition tests.
//!
//! These tests drive the full pipeline through the public API with a
//! geometric stand-in evaluator: intersections clip to the overlap box of
//! the operand bounds, so part geometry can be checked exactly without a
//! CSG backend.

use std::sync::Mutex;

use mesh_split::connector::ConnectorConfig;
use mesh_split::evaluator::{BooleanEvaluator, BooleanOp, EvaluatorError};
use mesh_split::hollow::HollowConfig;
use mesh_split::label::LabelConfig;
use mesh_split::partition::{AxisSplit, GridSlicing, ManualSlicing, SlicingConfig};
use mesh_split::pipeline::{Decomposer, Stage};
use mesh_split::primitives::box_mesh;
use mesh_split::types::{Aabb, Mesh};
use nalgebra::{Point3, Vector3};

/// Evaluator that treats every operand as its bounding box.
///
/// Intersection returns the box of the bounds overlap (empty when the
/// operands do not overlap), union and subtraction return the first
/// operand. Each call is recorded with the second operand's bounds.
struct BoxClip {
    calls: Mutex<Vec<(BooleanOp, Option<Aabb>)>>,
    fail_subtractions: bool,
}

impl BoxClip {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_subtractions: false,
        }
    }

    fn failing_subtractions() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_subtractions: true,
        }
    }

    fn calls(&self) -> Vec<(BooleanOp, Option<Aabb>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl BooleanEvaluator for BoxClip {
    fn evaluate(&self, a: &Mesh, b: &Mesh, op: BooleanOp) -> Result<Mesh, EvaluatorError> {
        self.calls.lock().unwrap().push((op, b.bounds()));
        match op {
            BooleanOp::Intersection => {
                let (Some(ba), Some(bb)) = (a.bounds(), b.bounds()) else {
                    return Ok(Mesh::new());
                };
                let min = Point3::new(
                    ba.min.x.max(bb.min.x),
                    ba.min.y.max(bb.min.y),
                    ba.min.z.max(bb.min.z),
                );
                let max = Point3::new(
                    ba.max.x.min(bb.max.x),
                    ba.max.y.min(bb.max.y),
                    ba.max.z.min(bb.max.z),
                );
                if min.x >= max.x || min.y >= max.y || min.z >= max.z {
                    return Ok(Mesh::new());
                }
                Ok(box_mesh(&Aabb::new(min, max)))
            }
            BooleanOp::Subtraction if self.fail_subtractions => {
                Err(EvaluatorError::failed("synthetic subtraction failure"))
            }
            _ => Ok(a.clone()),
        }
    }
}

fn solid(size: f64) -> Mesh {
    box_mesh(&Aabb::new(Point3::origin(), Point3::new(size, size, size)))
}

fn manual_x(offset: f64) -> SlicingConfig {
    SlicingConfig::Manual(ManualSlicing {
        x: AxisSplit {
            enabled: true,
            offset,
        },
        ..Default::default()
    })
}

// =============================================================================
// Grid decomposition geometry
// =============================================================================

#[test]
fn test_grid_remainder_cells_carry_the_leftover() {
    // A 200 cube under a 120 envelope: two steps per axis, the second one
    // 80 mm wide.
    let evaluator = BoxClip::new();
    let result = Decomposer::new(&evaluator)
        .slicing(SlicingConfig::Grid(GridSlicing {
            envelope: Vector3::new(120.0, 120.0, 120.0),
        }))
        .run(&solid(200.0))
        .unwrap();

    assert_eq!(result.parts.len(), 8);
    assert_eq!(result.stats.cells_total, 8);

    let first = result.parts[0].mesh.bounds().unwrap();
    assert!((first.min.x - 0.0).abs() < 1e-9);
    assert!((first.max.x - 120.0).abs() < 1e-9);

    let last = result.parts[7].mesh.bounds().unwrap();
    assert!((last.min.x - 120.0).abs() < 1e-9);
    assert!((last.max.x - 200.0).abs() < 1e-9);
    assert!((last.size().x - 80.0).abs() < 1e-9);
}

#[test]
fn test_partition_uses_raw_source_bounds() {
    let evaluator = BoxClip::new();
    let result = Decomposer::new(&evaluator).run(&solid(150.0)).unwrap();

    let bounds = result.partition.bounds;
    assert!((bounds.min.x - 0.0).abs() < 1e-9);
    assert!((bounds.max.x - 150.0).abs() < 1e-9);
    assert_eq!(result.parts.len(), 1);
}

// =============================================================================
// Manual slicing geometry
// =============================================================================

#[test]
fn test_manual_offset_places_the_cut_plane() {
    // Splitting a 200 cube at x = 60 yields a 60 part and a 140 part.
    let evaluator = BoxClip::new();
    let result = Decomposer::new(&evaluator)
        .slicing(manual_x(60.0))
        .run(&solid(200.0))
        .unwrap();

    assert_eq!(result.parts.len(), 2);

    let left = result.parts[0].mesh.bounds().unwrap();
    assert!((left.min.x - 0.0).abs() < 1e-9);
    assert!((left.max.x - 60.0).abs() < 1e-9);

    let right = result.parts[1].mesh.bounds().unwrap();
    assert!((right.min.x - 60.0).abs() < 1e-9);
    assert!((right.max.x - 200.0).abs() < 1e-9);

    // The untouched axes stay whole.
    assert!((left.size().y - 200.0).abs() < 1e-9);
    assert!((left.size().z - 200.0).abs() < 1e-9);
}

// =============================================================================
// Hollowing geometry
// =============================================================================

#[test]
fn test_hollow_inner_solid_is_shrunk_by_wall_thickness() {
    // Wall 2.5 on a 100 cube shrinks the inner solid to 95, centered.
    let evaluator = BoxClip::new();
    let result = Decomposer::new(&evaluator)
        .hollowing(HollowConfig {
            wall_thickness: 2.5,
            ..Default::default()
        })
        .run(&solid(100.0))
        .unwrap();
    assert_eq!(result.parts.len(), 1);

    let calls = evaluator.calls();
    let (op, inner_bounds) = &calls[0];
    assert_eq!(*op, BooleanOp::Subtraction);
    let inner = inner_bounds.unwrap();
    assert!((inner.size().x - 95.0).abs() < 1e-9);
    assert!((inner.size().y - 95.0).abs() < 1e-9);
    assert!((inner.center().x - 50.0).abs() < 1e-9);
}

#[test]
fn test_hollow_failure_degrades_to_solid_parts() {
    let evaluator = BoxClip::failing_subtractions();
    let result = Decomposer::new(&evaluator)
        .hollowing(HollowConfig::default())
        .run(&solid(100.0))
        .unwrap();

    // The run still produces the part from the solid input.
    assert_eq!(result.stats.parts_produced, 1);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].stage, Stage::Hollow);
    assert!(result.skipped[0].cell.is_none());
    assert!(result.skipped[0].reason.contains("solid input"));
}

// =============================================================================
// Connector placement counts
// =============================================================================

#[test]
fn test_connector_grid_density_follows_spacing() {
    // Mating face is 100x100; spacing 25 with margin 10 gives
    // floor((100 - 20) / 25) = 3, so a 4x4 candidate grid per face.
    let evaluator = BoxClip::new();
    let result = Decomposer::new(&evaluator)
        .slicing(manual_x(50.0))
        .connectors(ConnectorConfig {
            spacing: 25.0,
            margin: 10.0,
            ..Default::default()
        })
        .run(&solid(100.0))
        .unwrap();

    assert_eq!(result.parts.len(), 2);
    assert_eq!(result.stats.pegs_placed, 16);
    assert_eq!(result.stats.sockets_placed, 16);
    assert_eq!(result.stats.candidates_rejected, 0);
    assert!(result.skipped.is_empty());
}

// =============================================================================
// Labels
// =============================================================================

#[test]
fn test_labels_count_once_per_part() {
    let evaluator = BoxClip::new();
    let result = Decomposer::new(&evaluator)
        .slicing(manual_x(100.0))
        .labels(LabelConfig::default())
        .run(&solid(200.0))
        .unwrap();

    assert_eq!(result.stats.parts_produced, 2);
    assert_eq!(result.stats.labels_placed, 2);

    // One union per part, after its extraction.
    let unions = evaluator
        .calls()
        .iter()
        .filter(|(op, _)| *op == BooleanOp::Union)
        .count();
    assert_eq!(unions, 2);
}
