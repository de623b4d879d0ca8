//! Shared types used throughout the library.

mod direction;
mod transform;

pub use direction::{Axis, Direction};
pub use transform::{ElementRotation, ViewRotation};

/// How an item is displayed in an inventory slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemDisplayType {
    /// Flat icon drawn straight from the item's sprite texture.
    Sprite2D,
    /// Full cuboid projection of a block model.
    Block3D,
}

impl ItemDisplayType {
    pub fn is_sprite(&self) -> bool {
        matches!(self, ItemDisplayType::Sprite2D)
    }
}
