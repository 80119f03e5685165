//! Orbit angles driving the panorama camera.
//!
//! Longitude and latitude are kept in degrees. The look target is the point
//! at `phi = 90° - lat`, `theta = lon` on a sphere around the camera.

use glam::Vec3;

/// Default latitude limit in degrees. Keeps the view away from the poles,
/// where the look-at basis degenerates.
pub const DEFAULT_MAX_LATITUDE: f32 = 85.0;

/// Camera look direction as orbit angles, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    /// Longitude (yaw). Unbounded; wraps naturally through sin/cos.
    pub lon: f32,
    /// Latitude (pitch), clamped to `[-max_latitude, max_latitude]`.
    pub lat: f32,
}

impl Orientation {
    pub fn new(lon: f32, lat: f32) -> Self {
        Self { lon, lat }
    }

    /// Orientation looking straight at `point` from the origin.
    #[must_use]
    pub fn facing(point: Vec3) -> Self {
        let len = point.length();
        if len <= f32::EPSILON {
            return Self::default();
        }
        let lat = (point.y / len).clamp(-1.0, 1.0).asin().to_degrees();
        let lon = point.z.atan2(point.x).to_degrees();
        Self { lon, lat }
    }

    /// Return a copy with latitude clamped to `±max_latitude`.
    #[must_use]
    pub fn clamped(self, max_latitude: f32) -> Self {
        Self {
            lon: self.lon,
            lat: self.lat.clamp(-max_latitude, max_latitude),
        }
    }

    /// Point on a sphere of `radius` the camera looks at.
    #[must_use]
    pub fn look_target(&self, radius: f32) -> Vec3 {
        let phi = (90.0 - self.lat).to_radians();
        let theta = self.lon.to_radians();
        Vec3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.cos(),
            radius * phi.sin() * theta.sin(),
        )
    }

    /// Unit look direction.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.look_target(1.0)
    }

    /// Orientation after dragging from `start` by `(dx, dy)` pixels.
    ///
    /// Dragging right turns the view left (the panorama follows the
    /// pointer); dragging down raises the latitude.
    #[must_use]
    pub fn dragged(start: Self, dx: f32, dy: f32, sensitivity: f32, max_latitude: f32) -> Self {
        Self {
            lon: start.lon - dx * sensitivity,
            lat: start.lat + dy * sensitivity,
        }
        .clamped(max_latitude)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_look_target_cardinal_directions() {
        assert!(approx(Orientation::new(0.0, 0.0).look_target(500.0), Vec3::new(500.0, 0.0, 0.0)));
        assert!(approx(Orientation::new(90.0, 0.0).look_target(500.0), Vec3::new(0.0, 0.0, 500.0)));
        assert!(approx(Orientation::new(0.0, 90.0).look_target(1.0), Vec3::Y));
    }

    #[test]
    fn test_drag_clamps_latitude() {
        // 1200 px down at 0.1 deg/px would be 120 degrees.
        let o = Orientation::dragged(Orientation::default(), 0.0, 1200.0, 0.1, 85.0);
        assert!((o.lat - 85.0).abs() < 1e-6);

        let o = Orientation::dragged(Orientation::default(), 0.0, -1200.0, 0.1, 85.0);
        assert!((o.lat + 85.0).abs() < 1e-6);
    }

    #[test]
    fn test_drag_is_linear_in_displacement() {
        let start = Orientation::new(10.0, 5.0);
        let o = Orientation::dragged(start, 30.0, -20.0, 0.1, 85.0);
        assert!((o.lon - 7.0).abs() < 1e-5);
        assert!((o.lat - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_facing_round_trips_direction() {
        let point = Vec3::new(40.0, 12.0, -30.0);
        let o = Orientation::facing(point);
        assert!(approx(o.direction(), point.normalize()));
    }

    proptest! {
        #[test]
        fn prop_latitude_stays_clamped(drags in prop::collection::vec((-5000.0f32..5000.0, -5000.0f32..5000.0), 1..32)) {
            let mut orientation = Orientation::default();
            for (dx, dy) in drags {
                orientation = Orientation::dragged(orientation, dx, dy, 0.1, DEFAULT_MAX_LATITUDE);
                prop_assert!(orientation.lat >= -DEFAULT_MAX_LATITUDE);
                prop_assert!(orientation.lat <= DEFAULT_MAX_LATITUDE);
            }
        }
    }
}
