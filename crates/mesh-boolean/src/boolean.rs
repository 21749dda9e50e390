//! Mesh boolean operations by face classification.
//!
//! Operands are combined from whole input faces: every face is classified
//! as inside or outside the other mesh by a parity ray through its
//! centroid, then kept or dropped according to the operation. Faces are
//! never split along the intersection curve, so output accuracy follows
//! the tessellation density of the inputs. Coplanar face pairs bypass
//! classification and are resolved by a configurable strategy.

use hashbrown::{HashMap, HashSet};
use mesh_split::evaluator::BooleanOp;
use mesh_split::normalize::weld_vertices;
use mesh_split::probe::SurfaceProbe;
use mesh_split::tracing_ext::OperationTimer;
use mesh_split::types::{Aabb, Mesh, Triangle};
use nalgebra::{Point2, Point3, Vector2, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::error::BooleanError;

/// How faces lying in a shared plane of both operands are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoplanarStrategy {
    /// Keep coplanar faces from the first operand only.
    #[default]
    Include,
    /// Drop coplanar faces from both operands.
    Exclude,
    /// Keep coplanar faces from both operands.
    KeepBoth,
}

/// Tuning for [`boolean_operation`].
#[derive(Debug, Clone)]
pub struct BooleanParams {
    /// Geometric tolerance for coplanarity tests and the final weld.
    pub tolerance: f64,
    /// Weld duplicate vertices and drop non-manifold extras afterwards.
    pub cleanup: bool,
    /// Resolution for faces shared by both operands.
    pub coplanar_strategy: CoplanarStrategy,
}

impl Default for BooleanParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            cleanup: true,
            coplanar_strategy: CoplanarStrategy::Include,
        }
    }
}

impl BooleanParams {
    /// Looser tolerance for scanned or repaired input with noisy vertices.
    pub fn relaxed() -> Self {
        Self {
            tolerance: 1e-5,
            ..Self::default()
        }
    }

    /// Tight tolerance for CAD-exact input such as primitive solids.
    pub fn precise() -> Self {
        Self {
            tolerance: 1e-10,
            ..Self::default()
        }
    }
}

/// Counters describing what a boolean pass did.
#[derive(Debug, Clone, Default)]
pub struct BooleanStats {
    /// Faces the output took from the first operand.
    pub faces_from_a: usize,
    /// Faces the output took from the second operand.
    pub faces_from_b: usize,
    /// Face pairs whose triangles cross each other.
    pub intersecting_pairs: usize,
    /// Face pairs lying in a shared plane.
    pub coplanar_pairs: usize,
    /// Duplicate vertices merged by the cleanup weld.
    pub vertices_welded: usize,
    /// Edges that carried more than two faces after assembly.
    pub non_manifold_edges_fixed: usize,
}

/// Output of [`boolean_operation`].
#[derive(Debug, Clone)]
pub struct BooleanResult {
    /// The combined mesh.
    pub mesh: Mesh,
    /// Counters from the pass.
    pub stats: BooleanStats,
}

/// Where a face sits relative to the other operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaceLocation {
    Inside,
    Outside,
}

/// Outcome of the coplanarity test for a face pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coplanarity {
    Distinct,
    SameOrientation,
    OppositeOrientation,
}

/// Combine two meshes with a boolean operation.
///
/// Whole input faces are selected by an inside/outside classification of
/// their centroids against the other operand. When the bounding boxes do
/// not touch, a fast path resolves the operation without inspecting any
/// face. When the boxes overlap but no surfaces cross, a containment test
/// on a single vertex per operand decides the outcome; a subtraction whose
/// second operand sits fully inside the first yields the first operand
/// plus the second with inverted winding, forming an enclosed cavity.
///
/// Empty operands are rejected with [`BooleanError::EmptyInput`].
pub fn boolean_operation(
    a: &Mesh,
    b: &Mesh,
    op: BooleanOp,
    params: &BooleanParams,
) -> Result<BooleanResult, BooleanError> {
    if a.is_empty() {
        return Err(BooleanError::empty_input("first operand has no geometry"));
    }
    if b.is_empty() {
        return Err(BooleanError::empty_input("second operand has no geometry"));
    }

    let _timer = OperationTimer::with_context(
        operation_name(op),
        a.vertex_count() + b.vertex_count(),
        a.face_count() + b.face_count(),
    );

    let bounds_a = a
        .bounds()
        .ok_or_else(|| BooleanError::empty_input("first operand has no bounds"))?;
    let bounds_b = b
        .bounds()
        .ok_or_else(|| BooleanError::empty_input("second operand has no bounds"))?;

    if !bounds_a.intersects(&bounds_b, params.tolerance) {
        return Ok(non_overlapping_result(a, b, op));
    }

    let probe_a = SurfaceProbe::new(a);
    let probe_b = SurfaceProbe::new(b);

    let mut stats = BooleanStats::default();
    let (coplanar_a, coplanar_b) = collect_touching_pairs(a, b, &probe_b, params, &mut stats);

    let mut mesh = if stats.intersecting_pairs == 0 && stats.coplanar_pairs == 0 {
        non_intersecting_result(a, b, &probe_a, &probe_b, op, &mut stats)
    } else {
        let class_a = classify_faces(a, &probe_b);
        let class_b = classify_faces(b, &probe_a);

        let keep_a = match op {
            BooleanOp::Union | BooleanOp::Subtraction => FaceLocation::Outside,
            BooleanOp::Intersection => FaceLocation::Inside,
        };
        let keep_b = match op {
            BooleanOp::Union => FaceLocation::Outside,
            BooleanOp::Subtraction | BooleanOp::Intersection => FaceLocation::Inside,
        };
        let invert_b = op == BooleanOp::Subtraction;
        let strategy = params.coplanar_strategy;

        let mut combined = Mesh::with_capacity(
            a.vertex_count() + b.vertex_count(),
            a.face_count() + b.face_count(),
        );
        stats.faces_from_a = add_selected_faces(
            &mut combined,
            a,
            &class_a,
            keep_a,
            &coplanar_a,
            coplanar_kept(strategy, true),
            false,
        );
        stats.faces_from_b = add_selected_faces(
            &mut combined,
            b,
            &class_b,
            keep_b,
            &coplanar_b,
            coplanar_kept(strategy, false),
            invert_b,
        );
        combined
    };

    if params.cleanup {
        stats.vertices_welded = weld_vertices(&mut mesh, params.tolerance);
        stats.non_manifold_edges_fixed = fix_non_manifold_edges(&mut mesh);
    }

    debug!(
        operation = operation_name(op),
        faces_from_a = stats.faces_from_a,
        faces_from_b = stats.faces_from_b,
        intersecting_pairs = stats.intersecting_pairs,
        coplanar_pairs = stats.coplanar_pairs,
        "boolean pass complete"
    );

    Ok(BooleanResult { mesh, stats })
}

fn operation_name(op: BooleanOp) -> &'static str {
    match op {
        BooleanOp::Union => "boolean_union",
        BooleanOp::Subtraction => "boolean_subtraction",
        BooleanOp::Intersection => "boolean_intersection",
    }
}

/// Fast path when the operand boxes do not touch at all.
fn non_overlapping_result(a: &Mesh, b: &Mesh, op: BooleanOp) -> BooleanResult {
    debug!(
        operation = operation_name(op),
        "operand boxes are disjoint, skipping face tests"
    );
    let mut stats = BooleanStats::default();
    let mesh = match op {
        BooleanOp::Union => {
            let mut merged = a.clone();
            merged.append(b);
            stats.faces_from_a = a.face_count();
            stats.faces_from_b = b.face_count();
            merged
        }
        BooleanOp::Subtraction => {
            stats.faces_from_a = a.face_count();
            a.clone()
        }
        BooleanOp::Intersection => Mesh::new(),
    };
    BooleanResult { mesh, stats }
}

/// The operand surfaces never touch even though their boxes overlap. One
/// mesh may still contain the other outright, which a single point test
/// per operand resolves.
fn non_intersecting_result(
    a: &Mesh,
    b: &Mesh,
    probe_a: &SurfaceProbe,
    probe_b: &SurfaceProbe,
    op: BooleanOp,
    stats: &mut BooleanStats,
) -> Mesh {
    let a_inside_b = a
        .vertices
        .first()
        .is_some_and(|v| probe_b.is_inside(&v.position));
    let b_inside_a = b
        .vertices
        .first()
        .is_some_and(|v| probe_a.is_inside(&v.position));

    match op {
        BooleanOp::Union => {
            if a_inside_b {
                stats.faces_from_b = b.face_count();
                b.clone()
            } else if b_inside_a {
                stats.faces_from_a = a.face_count();
                a.clone()
            } else {
                let mut merged = a.clone();
                merged.append(b);
                stats.faces_from_a = a.face_count();
                stats.faces_from_b = b.face_count();
                merged
            }
        }
        BooleanOp::Subtraction => {
            if a_inside_b {
                Mesh::new()
            } else if b_inside_a {
                // B carves an enclosed cavity: keep A, add B inverted.
                let mut shell = a.clone();
                append_inverted(&mut shell, b);
                stats.faces_from_a = a.face_count();
                stats.faces_from_b = b.face_count();
                shell
            } else {
                stats.faces_from_a = a.face_count();
                a.clone()
            }
        }
        BooleanOp::Intersection => {
            if a_inside_b {
                stats.faces_from_a = a.face_count();
                a.clone()
            } else if b_inside_a {
                stats.faces_from_b = b.face_count();
                b.clone()
            } else {
                Mesh::new()
            }
        }
    }
}

/// Scan face pairs with overlapping boxes and sort them into coplanar and
/// crossing pairs. Returns the coplanar face sets for each operand.
fn collect_touching_pairs(
    a: &Mesh,
    b: &Mesh,
    probe_b: &SurfaceProbe,
    params: &BooleanParams,
    stats: &mut BooleanStats,
) -> (HashSet<usize>, HashSet<usize>) {
    let mut coplanar_a = HashSet::new();
    let mut coplanar_b = HashSet::new();
    let triangles_b: Vec<Triangle> = b.triangles().collect();

    for (face_a, tri_a) in a.triangles().enumerate() {
        let query = Aabb::from_triangle(&tri_a);
        for face_b in probe_b.overlapping(&query, params.tolerance) {
            let tri_b = &triangles_b[face_b];
            match check_coplanarity(&tri_a, tri_b, params.tolerance) {
                Coplanarity::SameOrientation | Coplanarity::OppositeOrientation => {
                    if triangles_overlap_2d(&tri_a, tri_b) {
                        coplanar_a.insert(face_a);
                        coplanar_b.insert(face_b);
                        stats.coplanar_pairs += 1;
                    }
                }
                Coplanarity::Distinct => {
                    if triangles_intersect(&tri_a, tri_b) {
                        stats.intersecting_pairs += 1;
                    }
                }
            }
        }
    }

    (coplanar_a, coplanar_b)
}

/// Classify every face of `mesh` against the other operand by a parity ray
/// through its centroid. Faces are independent, so the scan runs in
/// parallel.
fn classify_faces(mesh: &Mesh, other: &SurfaceProbe) -> Vec<FaceLocation> {
    mesh.faces
        .par_iter()
        .map(|face| {
            let v0 = mesh.vertices[face[0] as usize].position;
            let v1 = mesh.vertices[face[1] as usize].position;
            let v2 = mesh.vertices[face[2] as usize].position;
            let centroid = Point3::from((v0.coords + v1.coords + v2.coords) / 3.0);
            if other.is_inside(&centroid) {
                FaceLocation::Inside
            } else {
                FaceLocation::Outside
            }
        })
        .collect()
}

fn coplanar_kept(strategy: CoplanarStrategy, first_operand: bool) -> bool {
    match strategy {
        CoplanarStrategy::Include => first_operand,
        CoplanarStrategy::Exclude => false,
        CoplanarStrategy::KeepBoth => true,
    }
}

/// Copy the faces of `source` whose classification matches `keep` into
/// `mesh`, remapping vertex indices through a shared map. Coplanar faces
/// skip classification: they are copied exactly when `keep_coplanar` says
/// so. Returns the number of faces copied.
fn add_selected_faces(
    mesh: &mut Mesh,
    source: &Mesh,
    classifications: &[FaceLocation],
    keep: FaceLocation,
    coplanar: &HashSet<usize>,
    keep_coplanar: bool,
    invert: bool,
) -> usize {
    let mut vertex_map: HashMap<u32, u32> = HashMap::new();
    let mut added = 0;

    for (face_idx, face) in source.faces.iter().enumerate() {
        let selected = if coplanar.contains(&face_idx) {
            keep_coplanar
        } else {
            classifications[face_idx] == keep
        };
        if !selected {
            continue;
        }

        let mapped = map_face(mesh, source, face, &mut vertex_map);
        if invert {
            mesh.faces.push([mapped[0], mapped[2], mapped[1]]);
        } else {
            mesh.faces.push(mapped);
        }
        added += 1;
    }

    added
}

/// Append every face of `source` with reversed winding, sharing vertices
/// through a local index map.
fn append_inverted(target: &mut Mesh, source: &Mesh) {
    let mut vertex_map: HashMap<u32, u32> = HashMap::new();
    for face in &source.faces {
        let mapped = map_face(target, source, face, &mut vertex_map);
        target.faces.push([mapped[0], mapped[2], mapped[1]]);
    }
}

/// Remap one face of `source` into `target`, copying vertices on first
/// use.
fn map_face(
    target: &mut Mesh,
    source: &Mesh,
    face: &[u32; 3],
    vertex_map: &mut HashMap<u32, u32>,
) -> [u32; 3] {
    let mut mapped = [0u32; 3];
    for (slot, &idx) in mapped.iter_mut().zip(face) {
        *slot = *vertex_map.entry(idx).or_insert_with(|| {
            let next = target.vertices.len() as u32;
            target.vertices.push(source.vertices[idx as usize].clone());
            next
        });
    }
    mapped
}

/// Test whether two triangles lie in the same plane within `tolerance`,
/// and if so whether their normals agree.
fn check_coplanarity(ta: &Triangle, tb: &Triangle, tolerance: f64) -> Coplanarity {
    let normal_a = ta.normal_unnormalized();
    let len_a = normal_a.norm();
    if len_a < tolerance {
        return Coplanarity::Distinct;
    }
    let normal_a = normal_a / len_a;

    let plane_d = normal_a.dot(&ta.v0.coords);
    for corner in [&tb.v0, &tb.v1, &tb.v2] {
        if (normal_a.dot(&corner.coords) - plane_d).abs() > tolerance {
            return Coplanarity::Distinct;
        }
    }

    if normal_a.dot(&tb.normal_unnormalized()) > 0.0 {
        Coplanarity::SameOrientation
    } else {
        Coplanarity::OppositeOrientation
    }
}

/// Separating-axis overlap test for two coplanar triangles, run in the 2D
/// projection that drops the dominant normal axis.
fn triangles_overlap_2d(ta: &Triangle, tb: &Triangle) -> bool {
    let normal = ta.normal_unnormalized();
    let pa = [
        project_to_2d(&ta.v0, &normal),
        project_to_2d(&ta.v1, &normal),
        project_to_2d(&ta.v2, &normal),
    ];
    let pb = [
        project_to_2d(&tb.v0, &normal),
        project_to_2d(&tb.v1, &normal),
        project_to_2d(&tb.v2, &normal),
    ];

    for triangle in [&pa, &pb] {
        for i in 0..3 {
            let edge = triangle[(i + 1) % 3] - triangle[i];
            let axis = Vector2::new(-edge.y, edge.x);

            let (min_a, max_a) = project_extent(&pa, &axis);
            let (min_b, max_b) = project_extent(&pb, &axis);
            if max_a < min_b || max_b < min_a {
                return false;
            }
        }
    }
    true
}

fn project_extent(points: &[Point2<f64>; 3], axis: &Vector2<f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for point in points {
        let d = point.coords.dot(axis);
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}

/// Project a point onto the plane by dropping the dominant axis of
/// `normal`.
fn project_to_2d(point: &Point3<f64>, normal: &Vector3<f64>) -> Point2<f64> {
    let ax = normal.x.abs();
    let ay = normal.y.abs();
    let az = normal.z.abs();
    if ax >= ay && ax >= az {
        Point2::new(point.y, point.z)
    } else if ay >= az {
        Point2::new(point.x, point.z)
    } else {
        Point2::new(point.x, point.y)
    }
}

/// Crossing test for two non-coplanar triangles: any edge of one passing
/// through the other.
fn triangles_intersect(ta: &Triangle, tb: &Triangle) -> bool {
    let edges_a = [(ta.v0, ta.v1), (ta.v1, ta.v2), (ta.v2, ta.v0)];
    let edges_b = [(tb.v0, tb.v1), (tb.v1, tb.v2), (tb.v2, tb.v0)];

    edges_a
        .iter()
        .any(|(start, end)| segment_hits_triangle(start, end, tb))
        || edges_b
            .iter()
            .any(|(start, end)| segment_hits_triangle(start, end, ta))
}

/// Moller-Trumbore restricted to the segment between `start` and `end`.
fn segment_hits_triangle(start: &Point3<f64>, end: &Point3<f64>, tri: &Triangle) -> bool {
    const EPSILON: f64 = 1e-12;

    let direction = end - start;
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;

    let h = direction.cross(&edge2);
    let det = edge1.dot(&h);
    if det.abs() < EPSILON {
        return false;
    }

    let inv_det = 1.0 / det;
    let s = start - tri.v0;
    let u = inv_det * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return false;
    }

    let q = s.cross(&edge1);
    let v = inv_det * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return false;
    }

    let t = inv_det * edge2.dot(&q);
    (0.0..=1.0).contains(&t)
}

/// Drop extra faces on edges carried by more than two, keeping the first
/// two encountered. Returns the number of edges that needed fixing.
fn fix_non_manifold_edges(mesh: &mut Mesh) -> usize {
    let mut edge_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::new();

    for (face_idx, face) in mesh.faces.iter().enumerate() {
        for i in 0..3 {
            let v0 = face[i];
            let v1 = face[(i + 1) % 3];
            let edge = (v0.min(v1), v0.max(v1));
            edge_faces.entry(edge).or_default().push(face_idx);
        }
    }

    let mut to_remove: HashSet<usize> = HashSet::new();
    let mut fixed = 0;
    for faces in edge_faces.values() {
        if faces.len() > 2 {
            fixed += 1;
            to_remove.extend(faces.iter().skip(2).copied());
        }
    }

    if !to_remove.is_empty() {
        let mut face_idx = 0;
        mesh.faces.retain(|_| {
            let keep = !to_remove.contains(&face_idx);
            face_idx += 1;
            keep
        });
    }

    fixed
}
