//! Model space to screen space.
//!
//! Model coordinates run 0-16 on each axis. They are recentered on the
//! block's middle, rotated by the view, scaled and flipped so that +y points
//! up on screen. The viewer looks down -z; larger `depth` is farther away.

use crate::types::ViewRotation;
use glam::{Mat3, Vec3};

/// Half the model coordinate range.
const MODEL_CENTER: f32 = 8.0;

/// A vertex after projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    /// Distance from the viewer along the view axis.
    pub depth: f32,
    /// View-space y, before the screen flip. Used for winding.
    view_y: f32,
}

/// Orthographic projection for a fixed view and output size.
#[derive(Debug, Clone)]
pub struct Projection {
    rotation: Mat3,
    scale: f32,
    center: [f32; 2],
}

impl Projection {
    pub fn new(rotation: ViewRotation, scale: f32, width: u32, height: u32) -> Self {
        Self {
            rotation: rotation.matrix(),
            scale,
            center: [width as f32 / 2.0, height as f32 / 2.0],
        }
    }

    /// Project a point in 0-16 model space.
    pub fn project(&self, point: [f32; 3]) -> ScreenPoint {
        let centered = Vec3::from(point) - Vec3::splat(MODEL_CENTER);
        let view = self.rotation * centered;
        ScreenPoint {
            x: self.center[0] + view.x * self.scale,
            y: self.center[1] - view.y * self.scale,
            depth: -view.z,
            view_y: view.y,
        }
    }

    pub fn project_quad(&self, corners: [[f32; 3]; 4]) -> [ScreenPoint; 4] {
        corners.map(|corner| self.project(corner))
    }
}

/// Default pixels per model unit: one unit per 25.6 pixels of the shorter side.
pub fn default_scale(width: u32, height: u32) -> u32 {
    ((width.min(height) as f32 / 25.6).round() as u32).max(1)
}

/// Signed area of the triangle through the first three vertices, in y-up
/// view space. Faces wound clockwise toward the viewer come out negative.
pub fn signed_area(quad: &[ScreenPoint; 4]) -> f32 {
    let [a, b, c, _] = quad;
    let (ax, ay) = (a.x, a.view_y);
    let (bx, by) = (b.x, b.view_y);
    let (cx, cy) = (c.x, c.view_y);
    ((bx - ax) * (cy - ay) - (by - ay) * (cx - ax)) / 2.0
}

/// Whether a projected face points away from the viewer.
pub fn is_back_facing(quad: &[ScreenPoint; 4]) -> bool {
    signed_area(quad) >= 0.0
}

/// Mean depth of a projected face.
pub fn mean_depth(quad: &[ScreenPoint; 4]) -> f32 {
    quad.iter().map(|p| p.depth).sum::<f32>() / 4.0
}
