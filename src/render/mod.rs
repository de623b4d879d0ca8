//! Render coordination: disk cache, single-flight and bounded rasterization.
//!
//! [`RenderCoordinator::render`] answers from the on-disk render cache when it
//! can. Otherwise it runs the backend once per key, no matter how many
//! callers ask at the same time, on the blocking pool and behind a semaphore.
//! Successful results are written to the cache via temp file plus rename.

use crate::assets::AssetCache;
use crate::error::{Error, Result};
use crate::paths;
use crate::raster::{default_scale, encode_png, Rasterizer, TintColors, TintProvider};
use crate::resource_pack::ResourcePack;
use crate::single_flight::SingleFlight;
use crate::storage;
use crate::types::ViewRotation;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub use crate::raster::RenderOptions;

/// Render coordinator configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Root of the rendered-PNG cache.
    pub cache_dir: PathBuf,
    /// Upper bound on rasterizations running at once.
    pub max_concurrent_renders: usize,
    /// Colors for tinted faces.
    pub tint: TintColors,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir().join("block-icon-renderer").join("renders"),
            max_concurrent_renders: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            tint: TintColors::default(),
        }
    }
}

impl RenderConfig {
    pub fn with_cache_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_max_concurrent_renders(mut self, max: usize) -> Self {
        self.max_concurrent_renders = max.max(1);
        self
    }

    pub fn with_tint(mut self, tint: TintColors) -> Self {
        self.tint = tint;
        self
    }
}

/// Produces PNG bytes for an item. Called on the blocking pool.
pub trait RenderBackend: Send + Sync {
    fn render(&self, item_id: &str, options: &RenderOptions) -> Result<Vec<u8>>;
}

/// The default backend: sprites are drawn flat, everything else as a block.
pub struct PackRenderer {
    rasterizer: Rasterizer,
}

impl PackRenderer {
    pub fn new(rasterizer: Rasterizer) -> Self {
        Self { rasterizer }
    }

    pub fn rasterizer(&self) -> &Rasterizer {
        &self.rasterizer
    }
}

impl RenderBackend for PackRenderer {
    fn render(&self, item_id: &str, options: &RenderOptions) -> Result<Vec<u8>> {
        let id = paths::canonical_item_id(item_id)?;
        let (namespace, name) = paths::parse_resource_location(&id);
        let block_model = format!("{}:block/{}", namespace, name);

        let Some(item) = self.rasterizer.resolver().resolve_item(&id) else {
            return match self.rasterizer.render_block_png(&block_model, options) {
                Err(Error::ModelNotFound(_)) => Err(Error::ModelNotFound(id)),
                other => other,
            };
        };

        if item.display.is_sprite() && !item.sprite_layers.is_empty() {
            let image = self
                .rasterizer
                .render_sprite_image(&item.sprite_layers, &item.layer_tints, options);
            return encode_png(&image);
        }

        match item.model_ref.as_deref() {
            Some(model) => match self.rasterizer.render_block_png(model, options) {
                Err(Error::ModelNotFound(_) | Error::NoRenderableGeometry(_)) => {
                    tracing::debug!(item = %id, model, "item model has no geometry, trying block model");
                    self.rasterizer.render_block_png(&block_model, options)
                }
                other => other,
            },
            None => self.rasterizer.render_block_png(&block_model, options),
        }
    }
}

/// Identity of one render: canonical id, size, scale and camera.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RenderKey {
    item: String,
    width: u32,
    height: u32,
    scale: Option<u32>,
    rotation: [u32; 3],
}

/// The explicit scale, or `None` when it matches what the size implies.
fn normalized_scale(options: &RenderOptions) -> Option<u32> {
    let scale = options.effective_scale();
    (scale != default_scale(options.width, options.height)).then_some(scale)
}

impl RenderKey {
    fn new(item: String, options: &RenderOptions) -> Self {
        let r = options.rotation;
        Self {
            item,
            width: options.width,
            height: options.height,
            scale: normalized_scale(options),
            rotation: [r.pitch.to_bits(), r.yaw.to_bits(), r.roll.to_bits()],
        }
    }
}

/// Caches and deduplicates renders. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct RenderCoordinator {
    backend: Arc<dyn RenderBackend>,
    cache_dir: PathBuf,
    flight: SingleFlight<RenderKey, Vec<u8>>,
    permits: Arc<Semaphore>,
}

impl RenderCoordinator {
    pub fn new(backend: Arc<dyn RenderBackend>, config: &RenderConfig) -> Self {
        Self {
            backend,
            cache_dir: config.cache_dir.clone(),
            flight: SingleFlight::new(),
            permits: Arc::new(Semaphore::new(config.max_concurrent_renders.max(1))),
        }
    }

    /// A coordinator rendering from a version's assets, with `pack_root`
    /// (if any) layered on top. Renders are cached per version under
    /// `config.cache_dir`.
    pub async fn for_version(
        assets: &AssetCache,
        version: &str,
        pack_root: Option<PathBuf>,
        config: &RenderConfig,
    ) -> Result<Self> {
        let id = assets.resolve_version_id(version).await?;
        let bundle = assets.get_assets(&id, false).await?;

        let mut roots: Vec<PathBuf> = pack_root.into_iter().collect();
        roots.push(bundle);
        let rasterizer = Rasterizer::new(ResourcePack::layered(roots))
            .with_tints(TintProvider::with_colors(config.tint.clone()));

        let config = config.clone().with_cache_dir(config.cache_dir.join(&id));
        tracing::info!(version = %id, cache = %config.cache_dir.display(), "render coordinator ready");
        Ok(Self::new(Arc::new(PackRenderer::new(rasterizer)), &config))
    }

    pub fn cache_dir(&self) -> &std::path::Path {
        &self.cache_dir
    }

    /// Disk location of a render. Non-default cameras get their own suffix.
    pub fn cache_path(&self, canonical_id: &str, options: &RenderOptions) -> PathBuf {
        let path = paths::render_cache_file(
            &self.cache_dir,
            canonical_id,
            options.width,
            options.height,
            normalized_scale(options),
        );
        if options.rotation == ViewRotation::default() {
            return path;
        }
        let r = options.rotation;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!("{}_r{}_{}_{}.png", stem, r.pitch, r.yaw, r.roll))
    }

    /// PNG bytes for `item_id` at `options`, from cache or freshly rendered.
    pub async fn render(&self, item_id: &str, options: &RenderOptions) -> Result<Vec<u8>> {
        let id = paths::canonical_item_id(item_id)?;
        let path = self.cache_path(&id, options);

        match storage::read_optional(&path).await {
            Ok(Some(bytes)) => {
                tracing::debug!(item = %id, path = %path.display(), "render cache hit");
                return Ok(bytes);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "unreadable cache entry, re-rendering"),
        }

        let key = RenderKey::new(id.clone(), options);
        let this = self.clone();
        let options = *options;
        self.flight
            .run(key, async move { this.render_uncached(id, path, options).await })
            .await
    }

    async fn render_uncached(&self, id: String, path: PathBuf, options: RenderOptions) -> Result<Vec<u8>> {
        let _permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| Error::Task(e.to_string()))?;

        let backend = Arc::clone(&self.backend);
        let item = id.clone();
        let bytes = tokio::task::spawn_blocking(move || backend.render(&item, &options)).await??;

        storage::write_atomic(&path, &bytes).await?;
        tracing::info!(item = %id, width = options.width, height = options.height, path = %path.display(), "rendered");
        Ok(bytes)
    }

    /// Whether a render for this key is currently running.
    pub fn is_rendering(&self, item_id: &str, options: &RenderOptions) -> bool {
        match paths::canonical_item_id(item_id) {
            Ok(id) => self.flight.is_in_flight(&RenderKey::new(id, options)),
            Err(_) => false,
        }
    }
}
