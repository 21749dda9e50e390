//! Geometry normalization.
//!
//! Decomposition stages assume a welded, consistently indexed mesh with fresh
//! normals. [`normalize_mesh`] produces one from arbitrary input: the source
//! indexing is discarded (expanding every face to a triangle soup), nearby
//! positions are welded, collapsed faces are dropped, and vertex normals are
//! recomputed. Source groupings (vertex tags) do not survive the pass.
//!
//! The pass is idempotent: welded vertices are pairwise at least the weld
//! epsilon apart, so running it on its own output changes nothing.

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

use crate::tracing_ext::OperationTimer;
use crate::types::{Mesh, Vertex};

/// Welding epsilon in mm. Positions closer than this merge into one vertex.
pub const WELD_EPSILON: f64 = 1e-4;

/// Result of a normalization pass.
#[derive(Debug, Clone)]
pub struct NormalizeResult {
    /// The normalized mesh. Empty input yields an empty mesh.
    pub mesh: Mesh,
    /// Whether welding ran. `false` means non-finite coordinates forced the
    /// identity-indexing fallback.
    pub welded: bool,
    /// Soup positions merged away by welding.
    pub duplicates_removed: usize,
    /// Faces dropped because welding collapsed their corners.
    pub degenerate_faces_removed: usize,
}

/// Normalize a mesh into welded, consistently indexed form.
///
/// An empty input is not an error; it normalizes to an empty mesh.
pub fn normalize_mesh(mesh: &Mesh) -> NormalizeResult {
    let _timer = OperationTimer::with_context("normalize", mesh.vertex_count(), mesh.face_count());

    if mesh.is_empty() {
        return NormalizeResult {
            mesh: Mesh::new(),
            welded: false,
            duplicates_removed: 0,
            degenerate_faces_removed: 0,
        };
    }

    // Expand to a soup. This erases the source indexing and any groupings
    // encoded in it, making the pass insensitive to how the input arrived.
    let mut positions = Vec::with_capacity(mesh.face_count() * 3);
    for tri in mesh.triangles() {
        positions.push(tri.v0);
        positions.push(tri.v1);
        positions.push(tri.v2);
    }

    let mut out = Mesh::from_positions(&positions);
    let soup_vertices = out.vertex_count();
    let faces_before = out.face_count();

    let finite = positions
        .iter()
        .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite());

    let welded = if finite {
        weld_vertices(&mut out, WELD_EPSILON);
        true
    } else {
        warn!(
            vertices = soup_vertices,
            "non-finite coordinates prevent welding, keeping identity indexing"
        );
        false
    };

    let duplicates_removed = soup_vertices - out.vertex_count();
    let degenerate_faces_removed = faces_before - out.face_count();

    // Dropped faces can leave vertices nothing references; without this the
    // pass would not be idempotent, because re-expanding to a soup forgets
    // unreferenced vertices.
    prune_unreferenced_vertices(&mut out);
    compute_vertex_normals(&mut out);

    debug!(
        welded,
        duplicates_removed,
        degenerate_faces_removed,
        vertices = out.vertex_count(),
        faces = out.face_count(),
        "normalization complete"
    );

    NormalizeResult {
        mesh: out,
        welded,
        duplicates_removed,
        degenerate_faces_removed,
    }
}

/// Weld vertices closer than `epsilon` and drop faces that collapse.
///
/// Surviving vertices keep the attributes of their first occurrence and are
/// pairwise at least `epsilon` apart afterwards. Returns the number of
/// vertices merged away. Positions must be finite.
pub fn weld_vertices(mesh: &mut Mesh, epsilon: f64) -> usize {
    if mesh.vertices.is_empty() || epsilon <= 0.0 {
        return 0;
    }

    let inv = 1.0 / epsilon;
    let eps_sq = epsilon * epsilon;

    // Spatial hash over epsilon-sized cells; a match can only live in the
    // 27-cell neighborhood of a position's own cell.
    let mut grid: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    let mut kept: Vec<Vertex> = Vec::with_capacity(mesh.vertices.len());
    let mut remap: Vec<u32> = Vec::with_capacity(mesh.vertices.len());

    for vertex in &mesh.vertices {
        let p = vertex.position;
        let key = quantize(&p, inv);

        let mut found = None;
        'search: for dx in -1..=1i64 {
            for dy in -1..=1i64 {
                for dz in -1..=1i64 {
                    let neighbor = (key.0 + dx, key.1 + dy, key.2 + dz);
                    if let Some(bucket) = grid.get(&neighbor) {
                        for &idx in bucket {
                            let q = kept[idx as usize].position;
                            if (q - p).norm_squared() < eps_sq {
                                found = Some(idx);
                                break 'search;
                            }
                        }
                    }
                }
            }
        }

        let idx = match found {
            Some(idx) => idx,
            None => {
                let idx = kept.len() as u32;
                kept.push(vertex.clone());
                grid.entry(key).or_default().push(idx);
                idx
            }
        };
        remap.push(idx);
    }

    let removed = mesh.vertices.len() - kept.len();
    mesh.vertices = kept;

    for face in &mut mesh.faces {
        face[0] = remap[face[0] as usize];
        face[1] = remap[face[1] as usize];
        face[2] = remap[face[2] as usize];
    }
    mesh.faces
        .retain(|f| f[0] != f[1] && f[1] != f[2] && f[0] != f[2]);

    removed
}

#[inline]
fn quantize(p: &Point3<f64>, inv: f64) -> (i64, i64, i64) {
    (
        (p.x * inv).floor() as i64,
        (p.y * inv).floor() as i64,
        (p.z * inv).floor() as i64,
    )
}

/// Drop vertices no face references and compact the index space.
fn prune_unreferenced_vertices(mesh: &mut Mesh) {
    let mut referenced = vec![false; mesh.vertices.len()];
    for face in &mesh.faces {
        for &idx in face {
            referenced[idx as usize] = true;
        }
    }

    if referenced.iter().all(|&r| r) {
        return;
    }

    let mut remap = vec![u32::MAX; mesh.vertices.len()];
    let mut kept = Vec::with_capacity(mesh.vertices.len());
    for (idx, vertex) in mesh.vertices.iter().enumerate() {
        if referenced[idx] {
            remap[idx] = kept.len() as u32;
            kept.push(vertex.clone());
        }
    }

    mesh.vertices = kept;
    for face in &mut mesh.faces {
        face[0] = remap[face[0] as usize];
        face[1] = remap[face[1] as usize];
        face[2] = remap[face[2] as usize];
    }
}

/// Recompute all vertex normals from adjacent face geometry.
///
/// Face normals are accumulated unnormalized (area-weighted) and the sum is
/// normalized per vertex. Vertices with no well-defined normal get `None`.
pub fn compute_vertex_normals(mesh: &mut Mesh) {
    let mut accum: Vec<Vector3<f64>> = vec![Vector3::zeros(); mesh.vertices.len()];

    for &[i0, i1, i2] in &mesh.faces {
        let v0 = mesh.vertices[i0 as usize].position;
        let v1 = mesh.vertices[i1 as usize].position;
        let v2 = mesh.vertices[i2 as usize].position;
        let n = (v1 - v0).cross(&(v2 - v0));
        accum[i0 as usize] += n;
        accum[i1 as usize] += n;
        accum[i2 as usize] += n;
    }

    for (vertex, n) in mesh.vertices.iter_mut().zip(accum) {
        let len = n.norm();
        vertex.normal = if len > 1e-10 { Some(n / len) } else { None };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cube soup: 12 triangles as 36 independent positions.
    fn cube_soup(size: f64) -> Mesh {
        let corners = [
            [0.0, 0.0, 0.0],
            [size, 0.0, 0.0],
            [size, size, 0.0],
            [0.0, size, 0.0],
            [0.0, 0.0, size],
            [size, 0.0, size],
            [size, size, size],
            [0.0, size, size],
        ];
        let faces: [[usize; 3]; 12] = [
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [3, 7, 6],
            [3, 6, 2],
            [0, 4, 7],
            [0, 7, 3],
            [1, 2, 6],
            [1, 6, 5],
        ];

        let mut positions = Vec::new();
        for face in &faces {
            for &ci in face {
                let c = corners[ci];
                positions.push(Point3::new(c[0], c[1], c[2]));
            }
        }
        Mesh::from_positions(&positions)
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        let result = normalize_mesh(&Mesh::new());
        assert!(result.mesh.is_empty());
        assert!(!result.welded);
        assert_eq!(result.duplicates_removed, 0);
    }

    #[test]
    fn test_soup_welds_to_indexed_cube() {
        let soup = cube_soup(10.0);
        assert_eq!(soup.vertex_count(), 36);

        let result = normalize_mesh(&soup);
        assert!(result.welded);
        assert_eq!(result.mesh.vertex_count(), 8);
        assert_eq!(result.mesh.face_count(), 12);
        assert_eq!(result.duplicates_removed, 28);
        assert_eq!(result.degenerate_faces_removed, 0);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let result1 = normalize_mesh(&cube_soup(10.0));
        let result2 = normalize_mesh(&result1.mesh);

        assert_eq!(result1.mesh.vertex_count(), result2.mesh.vertex_count());
        assert_eq!(result1.mesh.face_count(), result2.mesh.face_count());
        assert_eq!(result2.degenerate_faces_removed, 0);
        for (a, b) in result1.mesh.vertices.iter().zip(&result2.mesh.vertices) {
            assert_eq!(a.position, b.position);
        }
        for (fa, fb) in result1.mesh.faces.iter().zip(&result2.mesh.faces) {
            assert_eq!(fa, fb);
        }
    }

    #[test]
    fn test_indexing_insensitive() {
        // The same geometry, once as soup and once indexed, normalizes to
        // the same mesh.
        let soup = cube_soup(10.0);
        let indexed = normalize_mesh(&soup).mesh;

        let from_soup = normalize_mesh(&soup).mesh;
        let from_indexed = normalize_mesh(&indexed).mesh;
        assert_eq!(from_soup.vertex_count(), from_indexed.vertex_count());
        assert_eq!(from_soup.face_count(), from_indexed.face_count());
    }

    #[test]
    fn test_near_coincident_positions_weld() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
            // Shares an edge with the first triangle, corners offset by less
            // than the weld epsilon.
            Point3::new(10.0 + 0.5e-4, 0.0, 0.0),
            Point3::new(0.0, 10.0 - 0.5e-4, 0.0),
            Point3::new(10.0, 10.0, 0.0),
        ];
        let result = normalize_mesh(&Mesh::from_positions(&positions));
        assert_eq!(result.mesh.vertex_count(), 4);
        assert_eq!(result.mesh.face_count(), 2);
        assert_eq!(result.duplicates_removed, 2);
    }

    #[test]
    fn test_collapsed_face_is_dropped() {
        let positions = vec![
            // Healthy triangle.
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
            // Sliver: two corners closer than the weld epsilon.
            Point3::new(20.0, 0.0, 0.0),
            Point3::new(20.0 + 0.2e-4, 0.0, 0.0),
            Point3::new(25.0, 5.0, 0.0),
        ];
        let result = normalize_mesh(&Mesh::from_positions(&positions));
        assert_eq!(result.mesh.face_count(), 1);
        assert_eq!(result.degenerate_faces_removed, 1);
        // The sliver's corners are gone too, not just its face.
        assert_eq!(result.mesh.vertex_count(), 3);
    }

    #[test]
    fn test_non_finite_falls_back_to_identity() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(f64::NAN, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let result = normalize_mesh(&Mesh::from_positions(&positions));
        assert!(!result.welded);
        // Identity indexing: one vertex per soup position.
        assert_eq!(result.mesh.vertex_count(), 6);
        assert_eq!(result.mesh.face_count(), 2);
        assert_eq!(result.duplicates_removed, 0);
    }

    #[test]
    fn test_tags_are_cleared() {
        let mut mesh = cube_soup(5.0);
        for v in &mut mesh.vertices {
            v.tag = Some(7);
        }
        let result = normalize_mesh(&mesh);
        assert!(result.mesh.vertices.iter().all(|v| v.tag.is_none()));
    }

    #[test]
    fn test_normals_recomputed() {
        // Flat square in the XY plane, CCW from +Z.
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let result = normalize_mesh(&Mesh::from_positions(&positions));
        assert_eq!(result.mesh.vertex_count(), 4);
        for v in &result.mesh.vertices {
            let n = v.normal.expect("flat square vertex has a normal");
            assert!((n.z - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_weld_vertices_remaps_faces() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        // Duplicate of vertex 1, within epsilon.
        mesh.vertices.push(Vertex::from_coords(1.0 + 1e-5, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([3, 4, 2]);

        let removed = weld_vertices(&mut mesh, 1e-4);
        assert_eq!(removed, 1);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces[1], [1, 3, 2]);
    }

    #[test]
    fn test_weld_vertices_zero_epsilon_is_noop() {
        let mut mesh = cube_soup(1.0);
        let removed = weld_vertices(&mut mesh, 0.0);
        assert_eq!(removed, 0);
        assert_eq!(mesh.vertex_count(), 36);
    }

    #[test]
    fn test_compute_vertex_normals_degenerate() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(2.0, 0.0, 0.0));
        mesh.faces.push([0, 1, 2]); // collinear

        compute_vertex_normals(&mut mesh);
        assert!(mesh.vertices.iter().all(|v| v.normal.is_none()));
    }
}
