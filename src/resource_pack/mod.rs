//! Resource pack access.
//!
//! A [`ResourcePack`] is an ordered list of directory roots, each laid out
//! like the game's own assets (`assets/<namespace>/{models,textures,items,lang}`).
//! Lookups return the first root that has the file, so a user pack placed
//! before the extracted version bundle overrides the stock assets.

pub mod item;
pub mod model;
pub mod texture;

pub use item::{ItemDefinition, ItemModel};
pub use model::{BlockModel, ModelElement, ModelFace};
pub use texture::TextureData;

use crate::error::Result;
use crate::paths;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// A layered, on-disk Minecraft resource pack.
#[derive(Debug, Clone, Default)]
pub struct ResourcePack {
    roots: Vec<PathBuf>,
}

impl ResourcePack {
    /// A pack backed by a single directory.
    pub fn from_dir<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            roots: vec![root.into()],
        }
    }

    /// A pack searching `roots` in order.
    pub fn layered(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Add a lower-priority root, typically the extracted version bundle.
    pub fn with_fallback<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.roots.push(root.into());
        self
    }

    /// Roots in lookup order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn find(&self, build: impl Fn(&Path) -> PathBuf) -> Option<PathBuf> {
        self.roots.iter().map(|root| build(root)).find(|path| path.is_file())
    }

    /// File backing a model location, if any root has it.
    pub fn model_path(&self, location: &str) -> Option<PathBuf> {
        self.find(|root| paths::model_file(root, location))
    }

    /// File backing a texture location, if any root has it.
    pub fn texture_path(&self, location: &str) -> Option<PathBuf> {
        self.find(|root| paths::texture_file(root, location))
    }

    /// Read and parse a model. `Ok(None)` when no root has it.
    ///
    /// A file that disappears between lookup and read counts as missing.
    pub fn load_model(&self, location: &str) -> Result<Option<BlockModel>> {
        let Some(path) = self.model_path(location) else {
            return Ok(None);
        };
        match read_optional(&path)? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    /// Read and parse an item definition from `items/<id>.json`.
    pub fn load_item_definition(&self, item_id: &str) -> Result<Option<ItemDefinition>> {
        let Some(path) = self.find(|root| paths::item_definition_file(root, item_id)) else {
            return Ok(None);
        };
        match read_optional(&path)? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    /// Read a language file, merging roots so that earlier roots win per key.
    pub fn load_lang(&self, lang: &str) -> Result<HashMap<String, String>> {
        let mut merged = HashMap::new();
        for root in self.roots.iter().rev() {
            let path = paths::lang_file(root, lang);
            if let Some(contents) = read_optional(&path)? {
                let entries: HashMap<String, String> = serde_json::from_str(&contents)?;
                merged.extend(entries);
            }
        }
        Ok(merged)
    }

    /// All model locations under `models/<prefix>/` across roots, e.g. `block/stone`.
    pub fn list_models(&self, prefix: &str) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for root in &self.roots {
            let base = paths::namespace_dir(root, paths::DEFAULT_NAMESPACE, "models");
            let dir = base.join(prefix);
            if dir.is_dir() {
                collect_files_recursive(&base, &dir, "json", &mut names)?;
            }
        }
        Ok(names)
    }

    /// All item ids with an item definition or, for older packs, an item model.
    pub fn list_items(&self) -> Result<BTreeSet<String>> {
        let mut ids = BTreeSet::new();
        for root in &self.roots {
            let items = paths::namespace_dir(root, paths::DEFAULT_NAMESPACE, "items");
            if items.is_dir() {
                collect_files_recursive(&items, &items, "json", &mut ids)?;
            }
        }
        if ids.is_empty() {
            ids = self
                .list_models("item")?
                .into_iter()
                .filter_map(|name| name.strip_prefix("item/").map(str::to_string))
                .collect();
        }
        Ok(ids)
    }
}

/// Read a file, mapping "not found" to `None`.
fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Collect files with `extension` below `dir`, as slash-separated paths
/// relative to `base` without the extension.
fn collect_files_recursive(
    base: &Path,
    dir: &Path,
    extension: &str,
    out: &mut BTreeSet<String>,
) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            collect_files_recursive(base, &path, extension, out)?;
        } else if path.extension().map(|e| e == extension).unwrap_or(false) {
            if let Ok(relative) = path.strip_prefix(base) {
                out.insert(
                    relative
                        .with_extension("")
                        .to_string_lossy()
                        .replace('\\', "/"),
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    /// Write a file under `root`, creating parent directories.
    pub fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    /// Write a solid-colour PNG texture.
    pub fn write_png(root: &Path, relative: &str, size: u32, rgba: [u8; 4]) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::RgbaImage::from_pixel(size, size, image::Rgba(rgba))
            .save(path)
            .unwrap();
    }

    pub const CUBE_ALL: &str = r##"{
        "parent": "block/cube",
        "textures": { "particle": "#all", "down": "#all", "up": "#all",
                      "north": "#all", "east": "#all", "south": "#all", "west": "#all" }
    }"##;

    pub const CUBE: &str = r##"{
        "parent": "block/block",
        "elements": [
            {   "from": [ 0, 0, 0 ],
                "to": [ 16, 16, 16 ],
                "faces": {
                    "down":  { "texture": "#down", "cullface": "down" },
                    "up":    { "texture": "#up", "cullface": "up" },
                    "north": { "texture": "#north", "cullface": "north" },
                    "south": { "texture": "#south", "cullface": "south" },
                    "west":  { "texture": "#west", "cullface": "west" },
                    "east":  { "texture": "#east", "cullface": "east" }
                }
            }
        ]
    }"##;

    /// A minimal pack: `block/stone` as a textured cube plus a flat `item/stick`.
    pub fn minimal_pack(root: &Path) {
        write(root, "assets/minecraft/models/block/block.json", "{}");
        write(root, "assets/minecraft/models/block/cube.json", CUBE);
        write(root, "assets/minecraft/models/block/cube_all.json", CUBE_ALL);
        write(
            root,
            "assets/minecraft/models/block/stone.json",
            r#"{ "parent": "block/cube_all", "textures": { "all": "block/stone" } }"#,
        );
        write(root, "assets/minecraft/models/item/generated.json", r#"{ "parent": "builtin/generated" }"#);
        write(
            root,
            "assets/minecraft/models/item/stick.json",
            r#"{ "parent": "item/generated", "textures": { "layer0": "item/stick" } }"#,
        );
        write(
            root,
            "assets/minecraft/models/item/stone.json",
            r#"{ "parent": "block/stone" }"#,
        );
        write_png(root, "assets/minecraft/textures/block/stone.png", 16, [120, 120, 120, 255]);
        write_png(root, "assets/minecraft/textures/item/stick.png", 16, [140, 90, 40, 255]);
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_layered_lookup_prefers_first_root() {
        let pack_dir = tempfile::tempdir().unwrap();
        let bundle_dir = tempfile::tempdir().unwrap();
        minimal_pack(bundle_dir.path());
        write(
            pack_dir.path(),
            "assets/minecraft/models/block/stone.json",
            r#"{ "parent": "block/cube_all", "textures": { "all": "block/granite" } }"#,
        );

        let pack = ResourcePack::from_dir(pack_dir.path()).with_fallback(bundle_dir.path());
        let stone = pack.load_model("block/stone").unwrap().unwrap();
        assert_eq!(stone.textures["all"], "block/granite");

        // Anything the pack does not override comes from the bundle.
        assert!(pack.load_model("minecraft:block/cube").unwrap().is_some());
        assert!(pack.load_model("block/missing").unwrap().is_none());
    }

    #[test]
    fn test_list_models_and_items() {
        let dir = tempfile::tempdir().unwrap();
        minimal_pack(dir.path());
        let pack = ResourcePack::from_dir(dir.path());

        let blocks = pack.list_models("block").unwrap();
        assert!(blocks.contains("block/stone"));
        assert!(blocks.contains("block/cube_all"));

        // No items/ directory: ids come from models/item.
        let items = pack.list_items().unwrap();
        assert!(items.contains("stick"));
        assert!(items.contains("generated"));

        write(
            dir.path(),
            "assets/minecraft/items/stick.json",
            r#"{ "model": { "type": "minecraft:model", "model": "minecraft:item/stick" } }"#,
        );
        let items = pack.list_items().unwrap();
        assert_eq!(items.into_iter().collect::<Vec<_>>(), vec!["stick".to_string()]);
    }

    #[test]
    fn test_load_lang_merges_roots() {
        let pack_dir = tempfile::tempdir().unwrap();
        let bundle_dir = tempfile::tempdir().unwrap();
        write(
            bundle_dir.path(),
            "assets/minecraft/lang/en_us.json",
            r#"{ "block.minecraft.stone": "Stone", "item.minecraft.stick": "Stick" }"#,
        );
        write(
            pack_dir.path(),
            "assets/minecraft/lang/en_us.json",
            r#"{ "block.minecraft.stone": "Rock" }"#,
        );
        let pack = ResourcePack::from_dir(pack_dir.path()).with_fallback(bundle_dir.path());
        let lang = pack.load_lang("en_us").unwrap();
        assert_eq!(lang["block.minecraft.stone"], "Rock");
        assert_eq!(lang["item.minecraft.stick"], "Stick");
    }
}
