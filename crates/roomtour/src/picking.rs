//! Ray picking against hotspot markers.
//!
//! Markers are tested as spheres. Ordering contract:
//! - the closest hit along the ray wins;
//! - on equal distance the marker that comes first (hotspot insertion order)
//!   wins.

use glam::Vec3;

use crate::catalog::HotspotId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// A pickable hotspot marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: HotspotId,
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub id: HotspotId,
    /// Distance along the ray to the entry point.
    pub distance: f32,
    pub point: Vec3,
}

/// Distance along `ray` to the first intersection with a sphere, if any.
///
/// Hits behind the origin are ignored; an origin inside the sphere reports
/// the exit point.
#[must_use]
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.dir);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();
    let near = -b - sqrt_d;
    if near >= 0.0 {
        return Some(near);
    }
    let far = -b + sqrt_d;
    (far >= 0.0).then_some(far)
}

/// Nearest marker hit by `ray`.
pub fn pick<'a>(ray: &Ray, markers: impl IntoIterator<Item = &'a Marker>) -> Option<PickHit> {
    let mut best: Option<(f32, &Marker)> = None;
    for marker in markers {
        let Some(t) = ray_sphere(ray, marker.center, marker.radius) else {
            continue;
        };
        // Strict comparison keeps the earlier marker on ties.
        if best.is_none_or(|(bt, _)| t < bt) {
            best = Some((t, marker));
        }
    }

    let (distance, marker) = best?;
    Some(PickHit {
        id: marker.id.clone(),
        distance,
        point: ray.at(distance),
    })
}
