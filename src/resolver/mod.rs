//! Model and item resolution.
//!
//! This module merges model inheritance chains, dereferences texture aliases
//! and maps item ids to the model (or sprite layers) that represents them.

pub mod model_resolver;

pub use model_resolver::ModelResolver;

use crate::paths;
use crate::resource_pack::BlockModel;
use crate::types::ItemDisplayType;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// A model with its whole parent chain merged in.
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    /// Normalized location this model was resolved from.
    pub name: String,
    /// The merged model; `parent` is always `None`.
    pub model: BlockModel,
    /// Locations walked from the model itself up to its root, in order.
    pub ancestors: Vec<String>,
    /// Set when the parent chain looped back on itself. Such models carry no elements.
    pub cyclic: bool,
}

impl ResolvedModel {
    pub fn has_elements(&self) -> bool {
        self.model.has_elements()
    }

    /// Dereference a texture reference through the merged texture map.
    ///
    /// `#side` -> `#all` -> `block/stone`. Returns `None` for unknown or
    /// cyclic aliases.
    pub fn resolve_texture(&self, reference: &str) -> Option<String> {
        resolve_texture_reference(&self.model.textures, reference)
    }

    /// Every texture key with its final value; unresolvable keys are left out.
    pub fn texture_map(&self) -> HashMap<String, String> {
        self.model
            .textures
            .keys()
            .filter_map(|key| {
                self.resolve_texture(&format!("#{}", key))
                    .map(|value| (key.clone(), value))
            })
            .collect()
    }

    /// Texture locations actually drawn by this model's faces or sprite layers.
    pub fn used_textures(&self) -> BTreeSet<String> {
        let face_refs = self.model.face_texture_refs();
        let layers = self.model.layer_textures();
        face_refs
            .keys()
            .copied()
            .chain(layers.iter().copied())
            .filter_map(|reference| self.resolve_texture(reference))
            .collect()
    }
}

/// Chase `#alias` references until a concrete texture location is reached.
pub fn resolve_texture_reference(textures: &HashMap<String, String>, reference: &str) -> Option<String> {
    let mut current = reference;
    let mut visited = HashSet::new();

    while let Some(key) = current.strip_prefix('#') {
        if !visited.insert(key) {
            tracing::debug!(reference, alias = key, "cyclic texture alias");
            return None;
        }
        current = textures.get(key).map(String::as_str)?;
    }

    Some(paths::normalize_location(current))
}

/// An item id mapped to the model that represents it.
#[derive(Debug, Clone)]
pub struct ResolvedItem {
    /// Canonical `namespace:id`.
    pub id: String,
    /// Model reference from the item definition (or the legacy `item/<id>` model).
    pub model_ref: Option<String>,
    /// The merged model, when the reference resolves.
    pub model: Option<Arc<ResolvedModel>>,
    /// Sprite or block display.
    pub display: ItemDisplayType,
    /// Resolved sprite layers, bottom first. Empty for block items.
    pub sprite_layers: Vec<String>,
    /// Fixed tint colours from the item definition, indexed like the layers.
    pub layer_tints: Vec<Option<[f32; 3]>>,
}

impl ResolvedItem {
    /// Texture an icon for this item should be drawn from, if it is a sprite.
    pub fn sprite_texture(&self) -> Option<&str> {
        if self.display.is_sprite() {
            self.sprite_layers.first().map(String::as_str)
        } else {
            None
        }
    }
}
