//! Directional face shading.

use crate::types::Direction;

/// Strength of the black overlay drawn over a face, by the face's orientation.
///
/// Tops are drawn at full brightness, sides darker, bottoms darkest.
pub fn face_shade(direction: Direction) -> f32 {
    match direction {
        Direction::Up => 0.0,
        Direction::East | Direction::West => 0.2,
        Direction::North | Direction::South => 0.35,
        Direction::Down => 0.5,
    }
}

/// Overlay strength for a face of an element, honouring `shade: false`.
pub fn element_face_shade(direction: Direction, element_shade: bool) -> f32 {
    if element_shade {
        face_shade(direction)
    } else {
        0.0
    }
}
