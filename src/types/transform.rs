//! Element rotations and the camera rotation used for icon projection.

use super::Axis;
use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

/// Element-level rotation from model element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementRotation {
    /// Origin point for rotation (in 0-16 Minecraft coordinates).
    #[serde(default = "default_origin")]
    pub origin: [f32; 3],
    /// Axis to rotate around.
    pub axis: Axis,
    /// Rotation angle in degrees (-45 to 45, in 22.5 increments).
    pub angle: f32,
    /// Whether to rescale the element after rotation.
    #[serde(default)]
    pub rescale: bool,
}

fn default_origin() -> [f32; 3] {
    [8.0, 8.0, 8.0]
}

impl ElementRotation {
    /// Get the angle in radians.
    pub fn angle_radians(&self) -> f32 {
        self.angle.to_radians()
    }

    /// Get the rescale factor for this rotation.
    /// When rescale is true, the element is scaled to maintain its original size.
    pub fn rescale_factor(&self) -> f32 {
        if self.rescale {
            1.0 / self.angle_radians().cos()
        } else {
            1.0
        }
    }

    /// Rotate a point given in 0-16 model space around this rotation's origin.
    ///
    /// Rescaling stretches the two axes perpendicular to the rotation axis.
    pub fn apply(&self, point: [f32; 3]) -> [f32; 3] {
        let origin = Vec3::from(self.origin);
        let rotation = Mat3::from_axis_angle(Vec3::from(self.axis.unit_vector()), self.angle_radians());
        let mut local = rotation * (Vec3::from(point) - origin);

        if self.rescale {
            let factor = self.rescale_factor();
            match self.axis {
                Axis::X => {
                    local.y *= factor;
                    local.z *= factor;
                }
                Axis::Y => {
                    local.x *= factor;
                    local.z *= factor;
                }
                Axis::Z => {
                    local.x *= factor;
                    local.y *= factor;
                }
            }
        }

        (local + origin).to_array()
    }
}

/// Camera orientation for projected renders, in degrees.
///
/// Applied yaw first (around Y), then pitch (around X), then roll (around Z).
/// A negative pitch tilts the top of the model toward the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Default for ViewRotation {
    /// The standard isometric inventory angle.
    fn default() -> Self {
        Self {
            pitch: -30.0,
            yaw: 45.0,
            roll: 0.0,
        }
    }
}

impl ViewRotation {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Combined rotation matrix (roll * pitch * yaw).
    pub fn matrix(&self) -> Mat3 {
        let yaw = Mat3::from_rotation_y(self.yaw.to_radians());
        let pitch = Mat3::from_rotation_x(-self.pitch.to_radians());
        let roll = Mat3::from_rotation_z(self.roll.to_radians());
        roll * pitch * yaw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn test_origin_is_fixed_point() {
        let rot = ElementRotation {
            origin: [8.0, 8.0, 8.0],
            axis: Axis::Y,
            angle: 45.0,
            rescale: true,
        };
        assert!(approx(rot.apply([8.0, 8.0, 8.0]), [8.0, 8.0, 8.0]));
    }

    #[test]
    fn test_rotate_quarter_turn_around_y() {
        let rot = ElementRotation {
            origin: [8.0, 8.0, 8.0],
            axis: Axis::Y,
            angle: 90.0,
            rescale: false,
        };
        // +X offset rotates onto -Z under a right-handed Y rotation.
        assert!(approx(rot.apply([16.0, 8.0, 8.0]), [8.0, 8.0, 0.0]));
    }

    #[test]
    fn test_default_view_shows_top_face() {
        let m = ViewRotation::default().matrix();
        let up = m * Vec3::Y;
        // Viewer looks down -Z, so the top face normal must point toward +Z.
        assert!(up.z > 0.0);
        assert!(up.y > 0.0);
    }
}
