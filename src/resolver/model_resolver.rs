//! Model inheritance resolution.

use super::{ResolvedItem, ResolvedModel};
use crate::classifier::walk_display_type;
use crate::paths;
use crate::resource_pack::{BlockModel, ResourcePack};
use crate::types::ItemDisplayType;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Upper bound on parent chain length, independent of cycle detection.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Resolves model inheritance chains and item definitions against a pack.
///
/// Raw and merged models are memoized per instance. The caches are shared
/// across threads, so one resolver can serve concurrent renders.
pub struct ModelResolver {
    pack: ResourcePack,
    raw_cache: Mutex<HashMap<String, Option<Arc<BlockModel>>>>,
    resolved_cache: Mutex<HashMap<String, Option<Arc<ResolvedModel>>>>,
}

impl ModelResolver {
    pub fn new(pack: ResourcePack) -> Self {
        Self {
            pack,
            raw_cache: Mutex::new(HashMap::new()),
            resolved_cache: Mutex::new(HashMap::new()),
        }
    }

    /// The pack this resolver reads from.
    pub fn pack(&self) -> &ResourcePack {
        &self.pack
    }

    /// Drop both the raw-model and merged-model caches.
    pub fn clear_cache(&self) {
        self.raw_cache.lock().clear();
        self.resolved_cache.lock().clear();
    }

    /// Load an unmerged model, memoized. Parse failures are logged and treated as missing.
    pub fn raw_model(&self, location: &str) -> Option<Arc<BlockModel>> {
        let key = paths::normalize_location(location);
        if let Some(cached) = self.raw_cache.lock().get(&key) {
            return cached.clone();
        }

        let loaded = match self.pack.load_model(&key) {
            Ok(model) => model.map(Arc::new),
            Err(e) => {
                tracing::warn!(model = %key, error = %e, "failed to load model");
                None
            }
        };

        // First writer wins if two threads raced on the same key.
        self.raw_cache
            .lock()
            .entry(key)
            .or_insert(loaded)
            .clone()
    }

    /// Resolve a model with all inherited properties. `None` if the model does not exist.
    pub fn resolve(&self, model_location: &str) -> Option<Arc<ResolvedModel>> {
        let key = paths::normalize_location(model_location);
        if let Some(cached) = self.resolved_cache.lock().get(&key) {
            return cached.clone();
        }

        let resolved = self.resolve_uncached(&key).map(Arc::new);

        self.resolved_cache
            .lock()
            .entry(key)
            .or_insert(resolved)
            .clone()
    }

    fn resolve_uncached(&self, location: &str) -> Option<ResolvedModel> {
        let mut chain: Vec<Arc<BlockModel>> = Vec::new();
        let mut ancestors = Vec::new();
        let mut visited = HashSet::new();
        let mut cyclic = false;
        let mut current = location.to_string();

        loop {
            if !visited.insert(current.clone()) || chain.len() >= MAX_INHERITANCE_DEPTH {
                tracing::warn!(model = location, at = %current, "model inheritance cycle");
                cyclic = true;
                break;
            }

            let Some(model) = self.raw_model(&current) else {
                if chain.is_empty() {
                    return None;
                }
                tracing::warn!(model = location, parent = %current, "parent model not found");
                break;
            };

            ancestors.push(current.clone());
            let parent = model.parent.as_deref().map(paths::normalize_location);
            chain.push(model);

            match parent {
                // Builtin parents have no file; they end the chain.
                Some(parent) if parent.starts_with("builtin/") => {
                    ancestors.push(parent);
                    break;
                }
                Some(parent) => current = parent,
                None => break,
            }
        }

        // Fold from the root down so children override parents.
        let mut iter = chain.iter().rev();
        let mut merged = iter.next().map(|root| (**root).clone())?;
        for child in iter {
            merged = merge_models(&merged, child);
        }
        merged.parent = None;

        if cyclic {
            merged.elements.clear();
        }

        Some(ResolvedModel {
            name: location.to_string(),
            model: merged,
            ancestors,
            cyclic,
        })
    }

    /// Resolve every model under `models/block/`.
    pub fn resolve_all_block_models(&self) -> Vec<Arc<ResolvedModel>> {
        let names = match self.pack.list_models("block") {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list block models");
                return Vec::new();
            }
        };
        names.iter().filter_map(|name| self.resolve(name)).collect()
    }

    /// Resolve every item the pack defines.
    pub fn resolve_all_items(&self) -> Vec<ResolvedItem> {
        let ids = match self.pack.list_items() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list items");
                return Vec::new();
            }
        };
        ids.iter().filter_map(|id| self.resolve_item(id)).collect()
    }

    /// Map an item id to its model and display type.
    ///
    /// The item definition tree is searched for its first model reference;
    /// packs without `items/` fall back to `item/<id>`. `None` when the id
    /// is invalid or nothing represents it.
    pub fn resolve_item(&self, item_id: &str) -> Option<ResolvedItem> {
        let id = paths::canonical_item_id(item_id).ok()?;
        let (namespace, name) = paths::parse_resource_location(&id);

        let definition = match self.pack.load_item_definition(&id) {
            Ok(definition) => definition,
            Err(e) => {
                tracing::warn!(item = %id, error = %e, "failed to parse item definition");
                None
            }
        };

        let legacy_ref = || {
            let location = format!("{}:item/{}", namespace, name);
            self.raw_model(&location).map(|_| paths::normalize_location(&location))
        };
        let model_ref = definition
            .as_ref()
            .and_then(|d| d.first_model_reference())
            .map(paths::normalize_location)
            .or_else(legacy_ref);

        let model = model_ref.as_deref().and_then(|r| self.resolve(r));
        if model_ref.is_none() && definition.is_none() {
            return None;
        }

        let display = model_ref
            .as_deref()
            .and_then(|r| walk_display_type(r, |name| self.raw_model(name)))
            .unwrap_or(ItemDisplayType::Block3D);

        let sprite_layers: Vec<String> = match (&model, display) {
            (Some(model), ItemDisplayType::Sprite2D) => model
                .model
                .layer_textures()
                .into_iter()
                .filter_map(|layer| model.resolve_texture(layer))
                .collect(),
            _ => Vec::new(),
        };

        let layer_tints = definition
            .as_ref()
            .map(|d| d.model.first_model_tints().iter().map(|t| t.rgb()).collect())
            .unwrap_or_default();

        Some(ResolvedItem {
            id,
            model_ref,
            model,
            display,
            sprite_layers,
            layer_tints,
        })
    }
}

/// Merge a parent model into a child model.
/// Child properties override parent properties.
fn merge_models(parent: &BlockModel, child: &BlockModel) -> BlockModel {
    let mut merged = parent.clone();

    // Merge textures (child overrides parent)
    for (key, value) in &child.textures {
        merged.textures.insert(key.clone(), value.clone());
    }

    // Use child elements if present, otherwise keep parent elements
    if !child.elements.is_empty() {
        merged.elements = child.elements.clone();
    }

    if child.ambient_occlusion.is_some() {
        merged.ambient_occlusion = child.ambient_occlusion;
    }
    if child.gui_light.is_some() {
        merged.gui_light = child.gui_light.clone();
    }

    // Display contexts merge key-wise: item/handheld defines thirdperson views
    // while item/generated defines the fixed view, and both must survive.
    match (&merged.display, &child.display) {
        (Some(parent_display), Some(child_display)) => {
            if let (Some(parent_obj), Some(child_obj)) =
                (parent_display.as_object(), child_display.as_object())
            {
                let mut merged_display = parent_obj.clone();
                for (key, value) in child_obj {
                    merged_display.insert(key.clone(), value.clone());
                }
                merged.display = Some(serde_json::Value::Object(merged_display));
            } else {
                merged.display = child.display.clone();
            }
        }
        (None, Some(_)) => {
            merged.display = child.display.clone();
        }
        _ => {}
    }

    merged.parent = child.parent.clone();
    merged
}
