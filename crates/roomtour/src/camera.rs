//! Perspective camera fixed at the sphere centre.
//!
//! The camera never translates; it only changes its look direction. All
//! conversions between screen space and world space go through this type so
//! that picking and rendering agree on the projection.

use glam::{Vec2, Vec3};

use crate::orientation::Orientation;
use crate::picking::Ray;

/// Where the camera sits and what it looks at, for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Camera position (always the sphere centre).
    pub position: Vec3,
    /// Point on the look sphere the camera faces.
    pub target: Vec3,
    /// World up used to build the look basis.
    pub up: Vec3,
}

/// Perspective parameters and the rendering surface size.
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaCamera {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Radius of the sphere the look target is placed on.
    pub look_radius: f32,
    viewport: Vec2,
}

impl PanoramaCamera {
    /// Create a camera with a 1x1 viewport.
    pub fn new(fov_degrees: f32, near: f32, far: f32, look_radius: f32) -> Self {
        Self {
            fov_degrees,
            near,
            far,
            look_radius,
            viewport: Vec2::ONE,
        }
    }

    /// Resize the rendering surface.
    ///
    /// Returns `false` and keeps the previous size when either dimension is
    /// zero (e.g. a minimised window).
    pub fn set_viewport(&mut self, width: f32, height: f32) -> bool {
        if width <= 0.0 || height <= 0.0 || !width.is_finite() || !height.is_finite() {
            return false;
        }
        self.viewport = Vec2::new(width, height);
        true
    }

    /// Surface size in logical pixels.
    #[must_use]
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Width over height of the surface.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.viewport.x / self.viewport.y
    }

    /// Pose for the given orientation.
    #[must_use]
    pub fn pose(&self, orientation: &Orientation) -> CameraPose {
        CameraPose {
            position: Vec3::ZERO,
            target: orientation.look_target(self.look_radius),
            up: Vec3::Y,
        }
    }

    /// Orthonormal (forward, right, up) basis of the view.
    fn basis(orientation: &Orientation) -> (Vec3, Vec3, Vec3) {
        let forward = orientation.direction();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);
        (forward, right, up)
    }

    fn tan_half_fov(&self) -> f32 {
        (self.fov_degrees.to_radians() * 0.5).tan()
    }

    /// Convert surface coordinates (origin top-left, y down) to normalised
    /// device coordinates in `[-1, 1]`, y up.
    #[must_use]
    pub fn screen_to_ndc(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            (screen.x / self.viewport.x) * 2.0 - 1.0,
            -(screen.y / self.viewport.y) * 2.0 + 1.0,
        )
    }

    /// Ray from the camera through a surface point.
    #[must_use]
    pub fn ray_through(&self, screen: Vec2, orientation: &Orientation) -> Ray {
        let ndc = self.screen_to_ndc(screen);
        let (forward, right, up) = Self::basis(orientation);
        let t = self.tan_half_fov();
        let dir = forward + right * (ndc.x * t * self.aspect()) + up * (ndc.y * t);
        Ray::new(Vec3::ZERO, dir.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PanoramaCamera {
        let mut camera = PanoramaCamera::new(75.0, 0.1, 1000.0, 500.0);
        camera.set_viewport(800.0, 600.0);
        camera
    }

    #[test]
    fn test_centre_ray_is_look_direction() {
        let camera = camera();
        let orientation = Orientation::new(30.0, 10.0);
        let ray = camera.ray_through(Vec2::new(400.0, 300.0), &orientation);
        assert!((ray.dir - orientation.direction()).length() < 1e-5);
        assert_eq!(ray.origin, Vec3::ZERO);
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut camera = camera();
        assert!((camera.aspect() - 800.0 / 600.0).abs() < f32::EPSILON);
        assert!(camera.set_viewport(400.0, 300.0));
        assert_eq!(camera.aspect(), 400.0 / 300.0);
        assert!(!camera.set_viewport(0.0, 300.0));
        assert_eq!(camera.viewport(), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_screen_to_ndc_corners() {
        let camera = camera();
        assert_eq!(camera.screen_to_ndc(Vec2::ZERO), Vec2::new(-1.0, 1.0));
        assert_eq!(camera.screen_to_ndc(Vec2::new(800.0, 600.0)), Vec2::new(1.0, -1.0));
    }
}
