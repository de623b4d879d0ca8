//! Block and item model parsing.
//!
//! Models describe cuboid geometry plus texture-slot bindings, optionally
//! inheriting from a parent model.

use crate::types::{Direction, ElementRotation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A parsed model from models/*.json.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockModel {
    /// Parent model to inherit from.
    #[serde(default)]
    pub parent: Option<String>,

    /// Whether to use ambient occlusion.
    #[serde(default, rename = "ambientocclusion")]
    pub ambient_occlusion: Option<bool>,

    /// GUI lighting mode ("side" or "front").
    #[serde(default)]
    pub gui_light: Option<String>,

    /// Texture variable definitions.
    #[serde(default)]
    pub textures: HashMap<String, String>,

    /// Model elements (cuboids).
    #[serde(default)]
    pub elements: Vec<ModelElement>,

    /// Display transforms per context (gui, ground, fixed, ...).
    #[serde(default)]
    pub display: Option<serde_json::Value>,
}

impl BlockModel {
    /// Check if this model has its own elements (not inherited).
    pub fn has_elements(&self) -> bool {
        !self.elements.is_empty()
    }

    /// Sprite layers (`layer0`, `layer1`, ...) in order, stopping at the first gap.
    pub fn layer_textures(&self) -> Vec<&str> {
        (0..)
            .map(|i| self.textures.get(&format!("layer{}", i)))
            .take_while(Option::is_some)
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Every texture reference used by a face, keyed for stable iteration.
    pub fn face_texture_refs(&self) -> BTreeMap<&str, usize> {
        let mut refs = BTreeMap::new();
        for element in &self.elements {
            for face in element.faces.values() {
                *refs.entry(face.texture.as_str()).or_insert(0) += 1;
            }
        }
        refs
    }
}

/// A cuboid element within a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelElement {
    /// Minimum corner (0-16 range).
    pub from: [f32; 3],
    /// Maximum corner (0-16 range).
    pub to: [f32; 3],
    /// Optional rotation.
    #[serde(default)]
    pub rotation: Option<ElementRotation>,
    /// Whether this element receives directional shading.
    #[serde(default = "default_shade")]
    pub shade: bool,
    /// Face definitions.
    #[serde(default)]
    pub faces: HashMap<Direction, ModelFace>,
}

fn default_shade() -> bool {
    true
}

impl ModelElement {
    /// UV rectangle for a face: the declared one, or the element's default projection.
    pub fn face_uv(&self, direction: Direction, face: &ModelFace) -> [f32; 4] {
        face.uv.unwrap_or_else(|| direction.default_uv(self.from, self.to))
    }

    /// Corners of a face in 0-16 space with the element rotation applied.
    pub fn face_corners(&self, direction: Direction) -> [[f32; 3]; 4] {
        let mut corners = direction.corners(self.from, self.to);
        if let Some(rotation) = &self.rotation {
            for corner in &mut corners {
                *corner = rotation.apply(*corner);
            }
        }
        corners
    }
}

/// A face of a model element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFace {
    /// UV coordinates [u1, v1, u2, v2] in 0-16 range.
    #[serde(default)]
    pub uv: Option<[f32; 4]>,
    /// Texture reference (e.g., "#side" or "block/stone").
    pub texture: String,
    /// Face direction for culling against neighbours (unused for single icons).
    #[serde(default)]
    pub cullface: Option<Direction>,
    /// UV rotation in degrees (0, 90, 180, 270).
    #[serde(default)]
    pub rotation: i32,
    /// Tint index for biome coloring.
    #[serde(default)]
    pub tintindex: Option<i32>,
}

impl ModelFace {
    /// Number of clockwise quarter turns applied to the UV rectangle.
    pub fn quarter_turns(&self) -> usize {
        (self.rotation.rem_euclid(360) / 90) as usize
    }

    /// Check if this face has a tint.
    pub fn has_tint(&self) -> bool {
        self.tintindex.map(|i| i >= 0).unwrap_or(false)
    }
}
