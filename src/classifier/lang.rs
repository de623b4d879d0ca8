//! Language-file lookups: item ids and display names.

use crate::paths;
use std::collections::{BTreeSet, HashMap};

/// Language used when the requested one has no entries.
pub const DEFAULT_LANG: &str = "en_us";

/// Key categories searched for a display name, in order.
const LABEL_CATEGORIES: [&str; 3] = ["item", "block", "entity"];

/// Canonical `minecraft:<id>` item ids named by `item.minecraft.<id>`,
/// `block.minecraft.<id>` and `entity.minecraft.<id>` keys.
///
/// Keys with more segments (`item.minecraft.potion.effect.water`,
/// `block.minecraft.banner.base.black`) describe variants, not items, and are skipped.
pub fn item_ids_from_lang(entries: &HashMap<String, String>) -> BTreeSet<String> {
    entries.keys().filter_map(|key| item_id_from_key(key)).collect()
}

fn item_id_from_key(key: &str) -> Option<String> {
    let mut parts = key.split('.');
    let category = parts.next()?;
    if !LABEL_CATEGORIES.contains(&category) {
        return None;
    }
    if parts.next()? != paths::DEFAULT_NAMESPACE {
        return None;
    }
    let id = parts.next()?;
    if id.is_empty() || parts.next().is_some() {
        return None;
    }
    Some(format!("{}:{}", paths::DEFAULT_NAMESPACE, id))
}

/// Display name for `item_id`, trying `item.`, then `block.`, then `entity.` keys.
pub fn label_for(entries: &HashMap<String, String>, item_id: &str) -> Option<String> {
    let (namespace, path) = paths::parse_resource_location(item_id);
    let path = path.replace('/', ".");
    LABEL_CATEGORIES
        .iter()
        .find_map(|category| entries.get(&format!("{}.{}.{}", category, namespace, path)))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang() -> HashMap<String, String> {
        [
            ("item.minecraft.stick", "Stick"),
            ("block.minecraft.stone", "Stone"),
            ("block.minecraft.oak_log", "Oak Log"),
            ("item.minecraft.oak_log", "Oak Log Item"),
            ("entity.minecraft.armor_stand", "Armor Stand"),
            ("item.minecraft.potion.effect.water", "Water Bottle"),
            ("block.minecraft.banner.base.black", "Fully Black Field"),
            ("gui.done", "Done"),
            ("item.modded.gadget", "Gadget"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_item_ids_take_single_segment_keys() {
        let ids: Vec<String> = item_ids_from_lang(&lang()).into_iter().collect();
        assert_eq!(ids, vec![
                "minecraft:armor_stand",
                "minecraft:oak_log",
                "minecraft:stick",
                "minecraft:stone"
            ]);
    }

    #[test]
    fn test_label_fallback_order() {
        let entries = lang();
        assert_eq!(label_for(&entries, "stick").as_deref(), Some("Stick"));
        assert_eq!(label_for(&entries, "minecraft:stone").as_deref(), Some("Stone"));
        // item. wins over block.
        assert_eq!(label_for(&entries, "oak_log").as_deref(), Some("Oak Log Item"));
        assert_eq!(label_for(&entries, "armor_stand").as_deref(), Some("Armor Stand"));
        assert_eq!(label_for(&entries, "modded:gadget").as_deref(), Some("Gadget"));
        assert_eq!(label_for(&entries, "nonexistent"), None);
    }
}
