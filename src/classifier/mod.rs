//! Item classification: flat sprite or 3D block.
//!
//! An item is drawn as a sprite when its model eventually inherits from one
//! of the game's generated-item templates, and as a block when it inherits
//! from a block model. The 3D list for a version is computed once and cached.

pub mod lang;

use crate::assets::AssetCache;
use crate::error::Result;
use crate::paths;
use crate::resolver::ModelResolver;
use crate::resource_pack::{BlockModel, ResourcePack};
use crate::single_flight::SingleFlight;
use crate::types::ItemDisplayType;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

/// How far up the parent chain the classifier looks before giving up.
pub const MAX_CLASSIFY_DEPTH: usize = 10;

/// Items classified concurrently per batch.
pub const CLASSIFY_BATCH_SIZE: usize = 30;

/// Parents that mark a flat, generated item model.
const SPRITE_PARENTS: [&str; 3] = ["item/generated", "item/handheld", "builtin/generated"];

/// Walk the parent chain of `start` and decide how the item displays.
///
/// `load` returns the raw (unmerged) model for a location. Returns `None`
/// only when `start` itself cannot be loaded; a broken chain further up
/// is treated as a block.
pub fn walk_display_type<F>(start: &str, mut load: F) -> Option<ItemDisplayType>
where
    F: FnMut(&str) -> Option<Arc<BlockModel>>,
{
    let mut current = load(start)?;

    for _ in 0..MAX_CLASSIFY_DEPTH {
        let Some(parent) = current.parent.as_deref() else {
            return Some(ItemDisplayType::Block3D);
        };
        let parent = paths::normalize_location(parent);
        if SPRITE_PARENTS.contains(&parent.as_str()) {
            return Some(ItemDisplayType::Sprite2D);
        }
        if parent.starts_with("block/") {
            return Some(ItemDisplayType::Block3D);
        }
        current = match load(&parent) {
            Some(model) => model,
            None => return Some(ItemDisplayType::Block3D),
        };
    }

    Some(ItemDisplayType::Block3D)
}

/// Classify one item against a resolver. `None` when the item has no model at all.
pub fn classify_item(resolver: &ModelResolver, item_id: &str) -> Option<ItemDisplayType> {
    let item = resolver.resolve_item(item_id)?;
    let model_ref = item.model_ref.as_deref()?;
    walk_display_type(model_ref, |name| resolver.raw_model(name))
}

/// Whether `item_id` renders as a flat sprite in the bundle at `assets_path`.
pub fn is_item_2d_model(item_id: &str, assets_path: &Path) -> bool {
    let resolver = ModelResolver::new(ResourcePack::from_dir(assets_path));
    classify_item(&resolver, item_id)
        .map(|display| display.is_sprite())
        .unwrap_or(false)
}

/// Per-version item listings backed by an [`AssetCache`].
#[derive(Clone)]
pub struct ItemClassifier {
    assets: AssetCache,
    three_d: Arc<Mutex<HashMap<String, Arc<Vec<String>>>>>,
    flight: SingleFlight<String, Arc<Vec<String>>>,
}

impl ItemClassifier {
    pub fn new(assets: AssetCache) -> Self {
        Self {
            assets,
            three_d: Arc::new(Mutex::new(HashMap::new())),
            flight: SingleFlight::new(),
        }
    }

    /// All item ids named in the version's default language file, sorted.
    pub async fn get_item_ids(&self, version: &str) -> Result<Vec<String>> {
        let bundle = self.assets.get_assets(version, false).await?;
        let ids = tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            let entries = ResourcePack::from_dir(bundle).load_lang(lang::DEFAULT_LANG)?;
            Ok(lang::item_ids_from_lang(&entries).into_iter().collect())
        })
        .await??;
        Ok(ids)
    }

    /// Ids of the version's items that render as 3D blocks, sorted.
    ///
    /// Computed on first request and cached; concurrent first requests share
    /// one computation.
    pub async fn get_3d_items(&self, version: &str) -> Result<Arc<Vec<String>>> {
        let id = self.assets.resolve_version_id(version).await?;
        if let Some(cached) = self.three_d.lock().get(&id) {
            return Ok(Arc::clone(cached));
        }

        let this = self.clone();
        let items = self
            .flight
            .run(id.clone(), async move { this.compute_3d_items(&id).await })
            .await?;

        // Also answer lazy lookups made with the caller's spelling, e.g. "latest".
        self.three_d
            .lock()
            .insert(version.to_string(), Arc::clone(&items));
        Ok(items)
    }

    /// The cached 3D list for `version`, or an empty list. Never computes.
    pub fn get_3d_items_lazy(&self, version: &str) -> Arc<Vec<String>> {
        self.three_d
            .lock()
            .get(version)
            .cloned()
            .unwrap_or_default()
    }

    async fn compute_3d_items(&self, id: &str) -> Result<Arc<Vec<String>>> {
        let bundle = self.assets.get_assets(id, false).await?;
        let item_ids = self.get_item_ids(id).await?;
        let resolver = Arc::new(ModelResolver::new(ResourcePack::from_dir(&bundle)));

        let mut blocks = Vec::new();
        for batch in item_ids.chunks(CLASSIFY_BATCH_SIZE) {
            let mut set = JoinSet::new();
            for item_id in batch {
                let resolver = Arc::clone(&resolver);
                let item_id = item_id.clone();
                set.spawn_blocking(move || {
                    let display = classify_item(&resolver, &item_id);
                    (item_id, display)
                });
            }
            while let Some(joined) = set.join_next().await {
                let (item_id, display) = joined?;
                if display == Some(ItemDisplayType::Block3D) {
                    blocks.push(item_id);
                }
            }
        }
        blocks.sort();

        tracing::info!(
            version = id,
            items = item_ids.len(),
            blocks = blocks.len(),
            "classified items"
        );
        let blocks = Arc::new(blocks);
        self.three_d
            .lock()
            .insert(id.to_string(), Arc::clone(&blocks));
        Ok(blocks)
    }

    /// Human-readable name for an item, in `lang` when available.
    ///
    /// Never fails: a missing language falls back to `en_us`, and any
    /// missing key or loading error yields the raw id.
    pub async fn get_item_label(&self, version: &str, item_id: &str, lang: &str) -> String {
        match self.find_label(version, item_id, lang).await {
            Ok(Some(label)) => label,
            Ok(None) => item_id.to_string(),
            Err(e) => {
                tracing::warn!(version, item = item_id, error = %e, "label lookup failed");
                item_id.to_string()
            }
        }
    }

    async fn find_label(&self, version: &str, item_id: &str, lang: &str) -> Result<Option<String>> {
        let bundle: PathBuf = self.assets.get_assets(version, false).await?;
        let item_id = item_id.to_string();
        let language = lang.to_string();
        let label = tokio::task::spawn_blocking(move || -> Result<Option<String>> {
            let pack = ResourcePack::from_dir(bundle);
            let mut entries = pack.load_lang(&language)?;
            if entries.is_empty() && language != lang::DEFAULT_LANG {
                tracing::debug!(lang = %language, "no entries for language, using default");
                entries = pack.load_lang(lang::DEFAULT_LANG)?;
            }
            Ok(lang::label_for(&entries, &item_id))
        })
        .await??;
        Ok(label)
    }
}
