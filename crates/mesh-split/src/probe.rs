//! Ray-casting surface probe.
//!
//! A [`SurfaceProbe`] indexes a mesh into a BVH once and answers repeated
//! spatial queries against it: nearest ray hit (connector validation),
//! all hits along a ray, inside/outside classification (CSG backends), and
//! box-overlap face queries (intersection-pair detection).

use nalgebra::{Point3, Vector3};

use crate::types::{Aabb, Mesh, Triangle};

/// Padding applied to BVH node boxes.
const BVH_EPSILON: f64 = 1e-9;

/// Epsilon for ray-triangle intersection tests.
const RAY_EPSILON: f64 = 1e-10;

/// Minimum spacing between distinct hits along one ray. Closer pairs are
/// shared-edge double counts and collapse to one crossing.
const HIT_MERGE_EPSILON: f64 = 1e-9;

/// A ray hit against the probed surface.
#[derive(Debug, Clone, Copy)]
pub struct ProbeHit {
    /// Distance from the ray origin, in direction units.
    pub distance: f64,
    /// Index of the hit face in the probed mesh.
    pub face: usize,
}

#[derive(Debug)]
enum BvhNode {
    Leaf {
        aabb: Aabb,
        face_idx: usize,
    },
    Internal {
        aabb: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn build(triangles: &[Triangle], indices: &mut [usize]) -> Option<Self> {
        if indices.is_empty() {
            return None;
        }

        if indices.len() == 1 {
            let idx = indices[0];
            return Some(BvhNode::Leaf {
                aabb: Aabb::from_triangle(&triangles[idx]).expand(BVH_EPSILON),
                face_idx: idx,
            });
        }

        let mut combined = Aabb::from_triangle(&triangles[indices[0]]);
        for &idx in indices.iter().skip(1) {
            combined = combined.merge(&Aabb::from_triangle(&triangles[idx]));
        }
        let combined = combined.expand(BVH_EPSILON);

        // Split on the longest extent at the centroid median.
        let extent = combined.size();
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };

        indices.sort_by(|&a, &b| {
            let ca = triangles[a].centroid();
            let cb = triangles[b].centroid();
            let (va, vb) = match axis {
                0 => (ca.x, cb.x),
                1 => (ca.y, cb.y),
                _ => (ca.z, cb.z),
            };
            va.partial_cmp(&vb).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = indices.len() / 2;
        let (left_indices, right_indices) = indices.split_at_mut(mid);

        let left = BvhNode::build(triangles, left_indices);
        let right = BvhNode::build(triangles, right_indices);

        match (left, right) {
            (Some(l), Some(r)) => Some(BvhNode::Internal {
                aabb: combined,
                left: Box::new(l),
                right: Box::new(r),
            }),
            (Some(l), None) => Some(l),
            (None, Some(r)) => Some(r),
            (None, None) => None,
        }
    }

    fn aabb(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { aabb, .. } => aabb,
            BvhNode::Internal { aabb, .. } => aabb,
        }
    }
}

/// Möller–Trumbore ray-triangle intersection.
/// Returns the distance t along the ray if the ray hits the triangle front
/// or back face beyond the epsilon.
fn ray_triangle_intersect(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    tri: &Triangle,
) -> Option<f64> {
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;

    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);

    // Ray parallel to triangle plane.
    if a.abs() < RAY_EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - tri.v0;
    let u = f * s.dot(&h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    if t > RAY_EPSILON {
        Some(t)
    } else {
        None
    }
}

/// BVH-indexed mesh for repeated ray and box queries.
///
/// Directions passed to the query methods must be unit length so the
/// returned distances are in mesh units.
#[derive(Debug)]
pub struct SurfaceProbe {
    triangles: Vec<Triangle>,
    root: Option<BvhNode>,
}

impl SurfaceProbe {
    /// Build a probe over all faces of a mesh.
    pub fn new(mesh: &Mesh) -> Self {
        let triangles: Vec<Triangle> = mesh.triangles().collect();
        let mut indices: Vec<usize> = (0..triangles.len()).collect();
        let root = BvhNode::build(&triangles, &mut indices);
        Self { triangles, root }
    }

    /// Number of indexed faces.
    pub fn face_count(&self) -> usize {
        self.triangles.len()
    }

    /// Cast a ray and return the nearest hit within `max_dist`.
    pub fn cast(
        &self,
        origin: &Point3<f64>,
        direction: &Vector3<f64>,
        max_dist: f64,
    ) -> Option<ProbeHit> {
        let root = self.root.as_ref()?;
        let dir_inv = Vector3::new(1.0 / direction.x, 1.0 / direction.y, 1.0 / direction.z);
        Self::trace_nearest(root, origin, direction, &dir_inv, &self.triangles, max_dist)
    }

    fn trace_nearest(
        node: &BvhNode,
        origin: &Point3<f64>,
        direction: &Vector3<f64>,
        dir_inv: &Vector3<f64>,
        triangles: &[Triangle],
        max_dist: f64,
    ) -> Option<ProbeHit> {
        match node.aabb().ray_intersect(origin, dir_inv) {
            Some((t_near, _)) if t_near <= max_dist => {}
            _ => return None,
        }

        match node {
            BvhNode::Leaf { face_idx, .. } => {
                match ray_triangle_intersect(origin, direction, &triangles[*face_idx]) {
                    Some(t) if t <= max_dist => Some(ProbeHit {
                        distance: t,
                        face: *face_idx,
                    }),
                    _ => None,
                }
            }
            BvhNode::Internal { left, right, .. } => {
                let hit_left =
                    Self::trace_nearest(left, origin, direction, dir_inv, triangles, max_dist);
                let max_dist_right = hit_left.map(|h| h.distance).unwrap_or(max_dist);
                let hit_right = Self::trace_nearest(
                    right,
                    origin,
                    direction,
                    dir_inv,
                    triangles,
                    max_dist_right,
                );
                // The right trace was bounded by the left hit, so any right
                // hit is the nearer one.
                hit_right.or(hit_left)
            }
        }
    }

    /// Collect every hit distance along a ray, sorted ascending.
    pub fn hits(&self, origin: &Point3<f64>, direction: &Vector3<f64>, max_dist: f64) -> Vec<f64> {
        let Some(root) = self.root.as_ref() else {
            return Vec::new();
        };
        let dir_inv = Vector3::new(1.0 / direction.x, 1.0 / direction.y, 1.0 / direction.z);
        let mut out = Vec::new();
        Self::collect_hits(
            root,
            origin,
            direction,
            &dir_inv,
            &self.triangles,
            max_dist,
            &mut out,
        );
        out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn collect_hits(
        node: &BvhNode,
        origin: &Point3<f64>,
        direction: &Vector3<f64>,
        dir_inv: &Vector3<f64>,
        triangles: &[Triangle],
        max_dist: f64,
        out: &mut Vec<f64>,
    ) {
        match node.aabb().ray_intersect(origin, dir_inv) {
            Some((t_near, _)) if t_near <= max_dist => {}
            _ => return,
        }

        match node {
            BvhNode::Leaf { face_idx, .. } => {
                if let Some(t) = ray_triangle_intersect(origin, direction, &triangles[*face_idx]) {
                    if t <= max_dist {
                        out.push(t);
                    }
                }
            }
            BvhNode::Internal { left, right, .. } => {
                Self::collect_hits(left, origin, direction, dir_inv, triangles, max_dist, out);
                Self::collect_hits(right, origin, direction, dir_inv, triangles, max_dist, out);
            }
        }
    }

    /// Classify a point as inside the probed surface.
    ///
    /// Casts a +X ray and counts distinct crossings; odd parity means
    /// inside. Results are only meaningful for closed surfaces.
    pub fn is_inside(&self, point: &Point3<f64>) -> bool {
        let direction = Vector3::new(1.0, 0.0, 0.0);
        let ts = self.hits(point, &direction, f64::INFINITY);

        // Shared edges between adjacent faces report twice at the same t.
        let mut crossings = 0usize;
        let mut last_t = f64::NEG_INFINITY;
        for t in ts {
            if t - last_t > HIT_MERGE_EPSILON {
                crossings += 1;
                last_t = t;
            }
        }
        crossings % 2 == 1
    }

    /// Collect indices of faces whose bounding boxes overlap a query box.
    pub fn overlapping(&self, query: &Aabb, tolerance: f64) -> Vec<usize> {
        let mut out = Vec::new();
        if let Some(root) = self.root.as_ref() {
            Self::collect_overlapping(root, query, tolerance, &mut out);
        }
        out
    }

    fn collect_overlapping(node: &BvhNode, query: &Aabb, tolerance: f64, out: &mut Vec<usize>) {
        if !node.aabb().intersects(query, tolerance) {
            return;
        }
        match node {
            BvhNode::Leaf { face_idx, .. } => out.push(*face_idx),
            BvhNode::Internal { left, right, .. } => {
                Self::collect_overlapping(left, query, tolerance, out);
                Self::collect_overlapping(right, query, tolerance, out);
            }
        }
    }
}
