//! Resource location and pack directory layout helpers.
//!
//! Everything here is pure string/path manipulation: no file system access.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Namespace used when a resource location omits one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Parse a resource location into namespace and path.
/// "minecraft:block/stone" -> ("minecraft", "block/stone")
/// "block/stone" -> ("minecraft", "block/stone")
pub fn parse_resource_location(resource_location: &str) -> (&str, &str) {
    if let Some((namespace, path)) = resource_location.split_once(':') {
        (namespace, path)
    } else {
        (DEFAULT_NAMESPACE, resource_location)
    }
}

/// Normalize a model or texture location to a stable cache key.
///
/// Backslashes become slashes, leading slashes are dropped and the default
/// namespace is elided: `minecraft:/block\stone` -> `block/stone`,
/// `mymod:block/thing` stays namespaced.
pub fn normalize_location(location: &str) -> String {
    let cleaned = location.trim().replace('\\', "/");
    let (namespace, path) = parse_resource_location(&cleaned);
    let path = path.trim_start_matches('/');
    if namespace == DEFAULT_NAMESPACE {
        path.to_string()
    } else {
        format!("{}:{}", namespace, path)
    }
}

/// Last path segment of a model location: `block/grass_block` -> `grass_block`.
pub fn base_name(location: &str) -> &str {
    let (_, path) = parse_resource_location(location);
    path.rsplit('/').next().unwrap_or(path)
}

fn asset_file(root: &Path, location: &str, kind: &str, extension: &str) -> PathBuf {
    let normalized = normalize_location(location);
    let (namespace, path) = parse_resource_location(&normalized);
    root.join("assets")
        .join(namespace)
        .join(kind)
        .join(format!("{}.{}", path, extension))
}

/// `<root>/assets/<ns>/models/<path>.json`
pub fn model_file(root: &Path, location: &str) -> PathBuf {
    asset_file(root, location, "models", "json")
}

/// `<root>/assets/<ns>/textures/<path>.png`
pub fn texture_file(root: &Path, location: &str) -> PathBuf {
    asset_file(root, location, "textures", "png")
}

/// `<root>/assets/<ns>/items/<id>.json`
pub fn item_definition_file(root: &Path, item_id: &str) -> PathBuf {
    asset_file(root, item_id, "items", "json")
}

/// `<root>/assets/minecraft/lang/<lang>.json`
pub fn lang_file(root: &Path, lang: &str) -> PathBuf {
    root.join("assets")
        .join(DEFAULT_NAMESPACE)
        .join("lang")
        .join(format!("{}.json", lang))
}

/// `<root>/assets/<ns>/<kind>`
pub fn namespace_dir(root: &Path, namespace: &str, kind: &str) -> PathBuf {
    root.join("assets").join(namespace).join(kind)
}

fn is_location_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.' | '/')
}

/// Validate an item id and return its canonical `namespace:id` form.
///
/// `stone` -> `minecraft:stone`. Empty ids, uppercase letters, spaces and
/// path traversal segments are rejected with [`Error::InvalidItemId`].
pub fn canonical_item_id(item_id: &str) -> Result<String> {
    let trimmed = item_id.trim();
    let (namespace, path) = parse_resource_location(trimmed);

    let valid = !namespace.is_empty()
        && !path.is_empty()
        && namespace.chars().all(is_location_char)
        && !namespace.contains('/')
        && namespace != "."
        && namespace != ".."
        && path.chars().all(is_location_char)
        && !path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");

    if valid {
        Ok(format!("{}:{}", namespace, path))
    } else {
        Err(Error::InvalidItemId(item_id.to_string()))
    }
}

/// Deterministic render-cache file for an item at a given size.
///
/// `minecraft:stone`, 128x128, no scale -> `<dir>/minecraft/stone_128x128.png`
pub fn render_cache_file(dir: &Path, canonical_id: &str, width: u32, height: u32, scale: Option<u32>) -> PathBuf {
    let (namespace, path) = parse_resource_location(canonical_id);
    let stem = path.replace('/', "__");
    let name = match scale {
        Some(scale) => format!("{}_{}x{}_s{}.png", stem, width, height, scale),
        None => format!("{}_{}x{}.png", stem, width, height),
    };
    dir.join(namespace).join(name)
}
