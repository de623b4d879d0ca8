//! # Block Icon Renderer
//!
//! A Rust library for rendering Minecraft block and item models into flat
//! isometric PNG icons.
//!
//! ## Overview
//!
//! The library downloads and caches the official game assets for a version,
//! resolves model inheritance and item definitions against them (optionally
//! layered under a user resource pack), decides whether each item is a flat
//! sprite or a 3D block, and rasterizes it in software.
//!
//! ## Quick Start
//!
//! ```ignore
//! use block_icon_renderer::{AssetCache, AssetCacheConfig, RenderConfig, RenderCoordinator, RenderOptions};
//!
//! let assets = AssetCache::new(AssetCacheConfig::default())?;
//! let renderer = RenderCoordinator::for_version(&assets, "latest", None, &RenderConfig::default()).await?;
//!
//! // Cached on disk; concurrent requests for the same icon render once.
//! let png = renderer.render("minecraft:grass_block", &RenderOptions::new(128, 128)).await?;
//! ```
//!
//! ## Rendering Without the Cache
//!
//! The rasterizer works on any directory laid out like a resource pack:
//!
//! ```ignore
//! use block_icon_renderer::{Rasterizer, RenderOptions, ResourcePack};
//!
//! let rasterizer = Rasterizer::new(ResourcePack::from_dir("path/to/pack"));
//! rasterizer.render_block("block/stone", "stone.png".as_ref(), &RenderOptions::default())?;
//! ```

pub mod assets;
pub mod classifier;
pub mod error;
pub mod paths;
pub mod raster;
pub mod render;
pub mod resolver;
pub mod resource_pack;
pub mod single_flight;
pub mod storage;
pub mod types;

// Re-export main types for convenience
pub use assets::{AssetCache, AssetCacheConfig, Fetcher, HttpFetcher, VersionManifest};
pub use classifier::{is_item_2d_model, walk_display_type, ItemClassifier};
pub use error::{Error, Result};
pub use raster::{Rasterizer, RenderOptions, TintColors, TintProvider};
pub use render::{PackRenderer, RenderBackend, RenderConfig, RenderCoordinator};
pub use resolver::{ModelResolver, ResolvedItem, ResolvedModel};
pub use resource_pack::{BlockModel, ItemDefinition, ModelElement, ResourcePack, TextureData};
pub use single_flight::SingleFlight;
pub use types::{Axis, Direction, ElementRotation, ItemDisplayType, ViewRotation};
