//! Various geometry utilities that completes the `glam` math crate.

use std::f32::consts::FRAC_PI_2;
use std::fmt;

use glam::Vec3;


/// Heading, pitch and roll angles, in radians. The heading is a rotation around the
/// up (Y) axis, pitch around the side (X) axis and roll around the forward (Z) axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hpr {
    pub heading: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl Hpr {

    pub const ZERO: Self = Self { heading: 0.0, pitch: 0.0, roll: 0.0 };

    /// Construct angles from their radians values.
    pub const fn new(heading: f32, pitch: f32, roll: f32) -> Self {
        Self { heading, pitch, roll }
    }

    /// Construct angles from a rotation vector expressed in degrees, using the same
    /// axis convention as [`Self::to_degrees`].
    pub fn from_degrees(rotation: Vec3) -> Self {
        Self {
            heading: rotation.y.to_radians(),
            pitch: rotation.x.to_radians(),
            roll: rotation.z.to_radians(),
        }
    }

    /// Compute the pitch and roll of an object resting with the given heading on a
    /// surface with the given normal. The normal is expected to be normalized.
    pub fn from_normal(heading: f32, normal: Vec3) -> Self {

        let (sin, cos) = heading.sin_cos();

        // Angle between the normal and the forward line (x, 0, z), both are normalized
        // so the scalar product is directly the cosine. Subtracting it from a right
        // angle gives the pitch.
        let forward = normal.x * sin + normal.z * cos;
        let pitch = FRAC_PI_2 - forward.clamp(-1.0, 1.0).acos();

        // Same with the side line, once the heading rotation is undone.
        let side = normal.x * cos - normal.z * sin;
        let roll = FRAC_PI_2 - side.clamp(-1.0, 1.0).acos();

        Self { heading, pitch, roll }

    }

    /// Convert to a render rotation vector in degrees, X is the pitch, Y is the heading
    /// and Z is the roll.
    pub fn to_degrees(self) -> Vec3 {
        Vec3::new(self.pitch.to_degrees(), self.heading.to_degrees(), self.roll.to_degrees())
    }

}

impl fmt::Display for Hpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[h: {:.3}, p: {:.3}, r: {:.3}]", self.heading, self.pitch, self.roll)
    }
}


/// Advance an angle in degrees by the given delta, wrapping the result in `[0, 360)`
/// whatever the number of full turns.
#[inline]
pub fn advance_degrees(angle: f32, delta: f32) -> f32 {
    (angle + delta).rem_euclid(360.0)
}


#[cfg(test)]
mod tests {

    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn flat_normal() {
        let hpr = Hpr::from_normal(0.0, Vec3::Y);
        assert_eq!(hpr.heading, 0.0);
        assert!(approx(hpr.pitch, 0.0));
        assert!(approx(hpr.roll, 0.0));
        assert!(approx(hpr.to_degrees().length(), 0.0));
    }

    #[test]
    fn slope_normal() {

        // A slope rising toward negative Z, the normal leans toward positive Z.
        let normal = Vec3::new(0.0, 1.0, 1.0).normalize();
        let hpr = Hpr::from_normal(0.0, normal);
        assert!(approx(hpr.pitch.to_degrees(), 45.0));
        assert!(approx(hpr.roll, 0.0));

        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let hpr = Hpr::from_normal(0.0, normal);
        assert!(approx(hpr.pitch, 0.0));
        assert!(approx(hpr.roll.to_degrees(), 45.0));

    }

    #[test]
    fn degrees_round_trip() {
        let hpr = Hpr::new(0.5, -0.25, 0.125);
        let back = Hpr::from_degrees(hpr.to_degrees());
        assert!(approx(back.heading, hpr.heading));
        assert!(approx(back.pitch, hpr.pitch));
        assert!(approx(back.roll, hpr.roll));
    }

    #[test]
    fn advance_wraps() {
        assert_eq!(advance_degrees(10.0, 20.0), 30.0);
        assert_eq!(advance_degrees(350.0, 20.0), 10.0);
        assert_eq!(advance_degrees(340.0, 20.0), 0.0);
        assert_eq!(advance_degrees(0.0, 720.0 + 90.0), 90.0);
        assert_eq!(advance_degrees(300.0, 420.0), 0.0);
    }

}
