//! Inward-facing UV sphere for equirectangular panoramas.
//!
//! Vertices run row by row from the north pole (`v = 0`) to the south pole
//! (`v = 1`), `width_segments + 1` per row so the seam has its own column of
//! texture coordinates. Triangles are wound counter-clockwise when seen from
//! the centre, so the interior is the front face.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

/// Triangle-list geometry ready for GPU upload.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereGeometry {
    pub positions: Vec<Vec3>,
    /// Texture coordinates, `v = 0` at the top of the image.
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl SphereGeometry {
    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Build the panorama sphere.
///
/// `u` maps longitude so that `u = 0` lies on `+X` and increases towards
/// `+Z`, matching [`Orientation::look_target`](crate::orientation::Orientation::look_target).
#[must_use]
pub fn panorama_sphere(radius: f32, width_segments: u32, height_segments: u32) -> SphereGeometry {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let columns = width_segments + 1;
    let vertex_count = (columns * (height_segments + 1)) as usize;
    let mut positions = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let theta = v * PI;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * TAU;
            positions.push(Vec3::new(
                radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            ));
            uvs.push(Vec2::new(u, v));
        }
    }

    let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * columns + ix + 1;
            let b = iy * columns + ix;
            let c = (iy + 1) * columns + ix;
            let d = (iy + 1) * columns + ix + 1;

            // The pole rows collapse one triangle of each quad.
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    SphereGeometry {
        positions,
        uvs,
        indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_counts() {
        let sphere = panorama_sphere(500.0, 60, 60);
        assert_eq!(sphere.positions.len(), 61 * 61);
        assert_eq!(sphere.uvs.len(), sphere.positions.len());
        // Two triangles per quad minus one per quad on each pole row.
        assert_eq!(sphere.triangle_count(), 60 * 60 * 2 - 2 * 60);
    }

    #[test]
    fn test_vertices_lie_on_sphere() {
        let sphere = panorama_sphere(500.0, 16, 8);
        for p in &sphere.positions {
            assert!((p.length() - 500.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_triangles_face_the_centre() {
        let sphere = panorama_sphere(10.0, 24, 12);
        for tri in sphere.indices.chunks(3) {
            let a = sphere.positions[tri[0] as usize];
            let b = sphere.positions[tri[1] as usize];
            let c = sphere.positions[tri[2] as usize];
            let normal = (b - a).cross(c - a);
            if normal.length_squared() < 1e-8 {
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) < 0.0, "triangle {tri:?} faces outward");
        }
    }

    #[test]
    fn test_uv_origin_is_north_pole_on_plus_x() {
        let sphere = panorama_sphere(1.0, 4, 2);
        // Row 1 is the equator; its first vertex is u = 0.
        let equator_start = sphere.positions[5];
        assert!((equator_start - Vec3::X).length() < 1e-5);
        assert_eq!(sphere.uvs[5], Vec2::new(0.0, 0.5));
    }
}
