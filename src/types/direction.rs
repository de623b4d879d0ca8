//! Direction and axis types for face and rotation handling.

use serde::{Deserialize, Serialize};

/// The six cardinal directions / face directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    /// All six directions in order.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Corners of this face of the box `from..to`, ordered as the texture's
    /// top-left, top-right, bottom-right, bottom-left when seen from outside.
    ///
    /// The order is clockwise from the outside, so a visible face projects
    /// with negative signed area in y-up view space.
    pub fn corners(&self, from: [f32; 3], to: [f32; 3]) -> [[f32; 3]; 4] {
        let [x0, y0, z0] = from;
        let [x1, y1, z1] = to;
        match self {
            Direction::Down => [[x0, y0, z1], [x1, y0, z1], [x1, y0, z0], [x0, y0, z0]],
            Direction::Up => [[x0, y1, z0], [x1, y1, z0], [x1, y1, z1], [x0, y1, z1]],
            Direction::North => [[x1, y1, z0], [x0, y1, z0], [x0, y0, z0], [x1, y0, z0]],
            Direction::South => [[x0, y1, z1], [x1, y1, z1], [x1, y0, z1], [x0, y0, z1]],
            Direction::West => [[x0, y1, z0], [x0, y1, z1], [x0, y0, z1], [x0, y0, z0]],
            Direction::East => [[x1, y1, z1], [x1, y1, z0], [x1, y0, z0], [x1, y0, z1]],
        }
    }

    /// UV rectangle a face gets when the model omits `uv`: the element's
    /// extent projected onto the face, in 0-16 texture space.
    pub fn default_uv(&self, from: [f32; 3], to: [f32; 3]) -> [f32; 4] {
        match self {
            Direction::Down => [from[0], 16.0 - to[2], to[0], 16.0 - from[2]],
            Direction::Up => [from[0], from[2], to[0], to[2]],
            Direction::North => [16.0 - to[0], 16.0 - to[1], 16.0 - from[0], 16.0 - from[1]],
            Direction::South => [from[0], 16.0 - to[1], to[0], 16.0 - from[1]],
            Direction::West => [from[2], 16.0 - to[1], to[2], 16.0 - from[1]],
            Direction::East => [16.0 - to[2], 16.0 - to[1], 16.0 - from[2], 16.0 - from[1]],
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Down => write!(f, "down"),
            Direction::Up => write!(f, "up"),
            Direction::North => write!(f, "north"),
            Direction::South => write!(f, "south"),
            Direction::West => write!(f, "west"),
            Direction::East => write!(f, "east"),
        }
    }
}

/// The three axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Get the unit vector for this axis.
    pub fn unit_vector(&self) -> [f32; 3] {
        match self {
            Axis::X => [1.0, 0.0, 0.0],
            Axis::Y => [0.0, 1.0, 0.0],
            Axis::Z => [0.0, 0.0, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal(dir: Direction) -> [f32; 3] {
        match dir {
            Direction::Down => [0.0, -1.0, 0.0],
            Direction::Up => [0.0, 1.0, 0.0],
            Direction::North => [0.0, 0.0, -1.0],
            Direction::South => [0.0, 0.0, 1.0],
            Direction::West => [-1.0, 0.0, 0.0],
            Direction::East => [1.0, 0.0, 0.0],
        }
    }

    fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    #[test]
    fn test_corners_wind_clockwise_from_outside() {
        // Clockwise seen from outside means (c1 - c0) x (c2 - c0) points inward.
        for dir in Direction::ALL {
            let c = dir.corners([0.0; 3], [16.0; 3]);
            let n = cross(sub(c[1], c[0]), sub(c[2], c[0]));
            let normal = normal(dir);
            let dot = n[0] * normal[0] + n[1] * normal[1] + n[2] * normal[2];
            assert!(dot < 0.0, "{} winds the wrong way", dir);
        }
    }

    #[test]
    fn test_default_uv_full_cube() {
        for dir in Direction::ALL {
            assert_eq!(dir.default_uv([0.0; 3], [16.0; 3]), [0.0, 0.0, 16.0, 16.0]);
        }
    }

    #[test]
    fn test_default_uv_slab_side() {
        // Bottom slab: side faces show the lower half of the texture.
        let uv = Direction::South.default_uv([0.0, 0.0, 0.0], [16.0, 8.0, 16.0]);
        assert_eq!(uv, [0.0, 8.0, 16.0, 16.0]);
    }
}
