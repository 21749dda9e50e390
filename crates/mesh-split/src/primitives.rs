//! Primitive mesh generators for synthesized features.
//!
//! Cells become boxes, connectors and drain holes become cylinders; both are
//! generated closed with CCW winding viewed from outside.

use nalgebra::{Point3, Vector3};

use crate::types::{Aabb, Mesh, Vertex};

/// Generate a closed box mesh covering `bounds`.
///
/// 8 vertices, 12 triangles, outward-facing normals.
pub fn box_mesh(bounds: &Aabb) -> Mesh {
    let (lo, hi) = (bounds.min, bounds.max);
    let mut mesh = Mesh::with_capacity(8, 12);

    mesh.vertices.push(Vertex::from_coords(lo.x, lo.y, lo.z)); // 0
    mesh.vertices.push(Vertex::from_coords(hi.x, lo.y, lo.z)); // 1
    mesh.vertices.push(Vertex::from_coords(hi.x, hi.y, lo.z)); // 2
    mesh.vertices.push(Vertex::from_coords(lo.x, hi.y, lo.z)); // 3
    mesh.vertices.push(Vertex::from_coords(lo.x, lo.y, hi.z)); // 4
    mesh.vertices.push(Vertex::from_coords(hi.x, lo.y, hi.z)); // 5
    mesh.vertices.push(Vertex::from_coords(hi.x, hi.y, hi.z)); // 6
    mesh.vertices.push(Vertex::from_coords(lo.x, hi.y, hi.z)); // 7

    // Two triangles per face, CCW viewed from outside.
    mesh.faces.push([0, 2, 1]); // z = lo
    mesh.faces.push([0, 3, 2]);
    mesh.faces.push([4, 5, 6]); // z = hi
    mesh.faces.push([4, 6, 7]);
    mesh.faces.push([0, 1, 5]); // y = lo
    mesh.faces.push([0, 5, 4]);
    mesh.faces.push([3, 7, 6]); // y = hi
    mesh.faces.push([3, 6, 2]);
    mesh.faces.push([0, 4, 7]); // x = lo
    mesh.faces.push([0, 7, 3]);
    mesh.faces.push([1, 2, 6]); // x = hi
    mesh.faces.push([1, 6, 5]);

    mesh
}

/// Generate a capped cylinder between two points.
///
/// `segments` is clamped to at least 3. Returns an empty mesh when the axis
/// is degenerate (start and end coincide).
pub fn cylinder_mesh(start: Point3<f64>, end: Point3<f64>, radius: f64, segments: u32) -> Mesh {
    let segments = segments.max(3) as usize;

    let axis = end - start;
    let len_sq = axis.norm_squared();
    if len_sq < 1e-20 {
        return Mesh::new();
    }
    let axis = axis / len_sq.sqrt();

    // Any vector not parallel to the axis seeds the ring basis.
    let seed = if axis.x.abs() < 0.9 {
        Vector3::new(1.0, 0.0, 0.0)
    } else {
        Vector3::new(0.0, 1.0, 0.0)
    };
    let perp1 = axis.cross(&seed).normalize();
    let perp2 = axis.cross(&perp1);

    let mut mesh = Mesh::with_capacity(segments * 2 + 2, segments * 4);

    // Ring vertices: start ring then end ring, interleaved per segment.
    for i in 0..segments {
        let angle = 2.0 * std::f64::consts::PI * (i as f64) / (segments as f64);
        let offset = perp1 * (angle.cos() * radius) + perp2 * (angle.sin() * radius);
        mesh.vertices.push(Vertex::new(start + offset));
        mesh.vertices.push(Vertex::new(end + offset));
    }
    let start_center = mesh.vertices.len() as u32;
    mesh.vertices.push(Vertex::new(start));
    let end_center = mesh.vertices.len() as u32;
    mesh.vertices.push(Vertex::new(end));

    for i in 0..segments {
        let next = (i + 1) % segments;
        let i0 = (i * 2) as u32; // start ring, this segment
        let i1 = (i * 2 + 1) as u32; // end ring, this segment
        let i2 = (next * 2) as u32; // start ring, next segment
        let i3 = (next * 2 + 1) as u32; // end ring, next segment

        // Side quad.
        mesh.faces.push([i0, i2, i1]);
        mesh.faces.push([i1, i2, i3]);
        // Caps.
        mesh.faces.push([start_center, i2, i0]);
        mesh.faces.push([end_center, i1, i3]);
    }

    mesh
}
