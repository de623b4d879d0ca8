//! Item model definitions from items/*.json.
//!
//! Newer packs describe each item with a tree of selectors (`condition`,
//! `select`, `range_dispatch`, `composite`, ...) whose leaves point at
//! ordinary models. Only the first leaf matters for icon rendering.

use serde::{Deserialize, Serialize};

/// Top-level item definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub model: ItemModel,
}

impl ItemDefinition {
    /// First model reference found by depth-first descent.
    pub fn first_model_reference(&self) -> Option<&str> {
        self.model.first_model_reference()
    }
}

/// One node of an item model tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ItemModel {
    /// Leaf: a plain model reference.
    #[serde(rename = "minecraft:model", alias = "model")]
    Model {
        model: String,
        #[serde(default)]
        tints: Vec<ItemTint>,
    },
    /// All sub-models drawn on top of each other.
    #[serde(rename = "minecraft:composite", alias = "composite")]
    Composite { models: Vec<ItemModel> },
    /// Boolean property switch.
    #[serde(rename = "minecraft:condition", alias = "condition")]
    Condition {
        on_true: Box<ItemModel>,
        on_false: Box<ItemModel>,
    },
    /// Discrete property switch.
    #[serde(rename = "minecraft:select", alias = "select")]
    Select {
        #[serde(default)]
        cases: Vec<SelectCase>,
        #[serde(default)]
        fallback: Option<Box<ItemModel>>,
    },
    /// Numeric property switch.
    #[serde(rename = "minecraft:range_dispatch", alias = "range_dispatch")]
    RangeDispatch {
        #[serde(default)]
        entries: Vec<RangeEntry>,
        #[serde(default)]
        fallback: Option<Box<ItemModel>>,
    },
    /// Hard-coded renderer (chests, banners, heads) with a base model for particles and GUI.
    #[serde(rename = "minecraft:special", alias = "special")]
    Special {
        base: String,
        #[serde(default)]
        model: serde_json::Value,
    },
    #[serde(rename = "minecraft:bundle/selected_item", alias = "bundle/selected_item")]
    BundleSelectedItem,
    #[serde(rename = "minecraft:empty", alias = "empty")]
    Empty,
    /// Node types this crate does not know about.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectCase {
    #[serde(default)]
    pub when: serde_json::Value,
    pub model: ItemModel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeEntry {
    #[serde(default)]
    pub threshold: f32,
    pub model: ItemModel,
}

/// A tint source attached to a model leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemTint {
    #[serde(rename = "type")]
    pub kind: String,
    /// Packed RGB for `constant` tints, default colour for the others.
    #[serde(default, alias = "default")]
    pub value: Option<i64>,
}

impl ItemTint {
    /// The tint as 0-1 RGB, when it carries a fixed colour.
    pub fn rgb(&self) -> Option<[f32; 3]> {
        let packed = self.value?;
        let r = ((packed >> 16) & 0xFF) as f32 / 255.0;
        let g = ((packed >> 8) & 0xFF) as f32 / 255.0;
        let b = (packed & 0xFF) as f32 / 255.0;
        Some([r, g, b])
    }
}

impl ItemModel {
    /// Depth-first search for the first embedded model reference.
    ///
    /// Order: leaf, composite children, `on_true` before `on_false`,
    /// cases/entries before the fallback, a special model's base.
    pub fn first_model_reference(&self) -> Option<&str> {
        match self {
            ItemModel::Model { model, .. } => Some(model.as_str()),
            ItemModel::Composite { models } => models.iter().find_map(|m| m.first_model_reference()),
            ItemModel::Condition { on_true, on_false } => on_true
                .first_model_reference()
                .or_else(|| on_false.first_model_reference()),
            ItemModel::Select { cases, fallback } => cases
                .iter()
                .find_map(|c| c.model.first_model_reference())
                .or_else(|| fallback.as_ref().and_then(|f| f.first_model_reference())),
            ItemModel::RangeDispatch { entries, fallback } => entries
                .iter()
                .find_map(|e| e.model.first_model_reference())
                .or_else(|| fallback.as_ref().and_then(|f| f.first_model_reference())),
            ItemModel::Special { base, .. } => Some(base.as_str()),
            ItemModel::BundleSelectedItem | ItemModel::Empty | ItemModel::Unknown => None,
        }
    }

    /// Tints of the leaf that [`first_model_reference`](Self::first_model_reference) returns.
    pub fn first_model_tints(&self) -> &[ItemTint] {
        match self {
            ItemModel::Model { tints, .. } => tints,
            ItemModel::Composite { models } => models
                .iter()
                .find(|m| m.first_model_reference().is_some())
                .map(|m| m.first_model_tints())
                .unwrap_or(&[]),
            ItemModel::Condition { on_true, on_false } => {
                if on_true.first_model_reference().is_some() {
                    on_true.first_model_tints()
                } else {
                    on_false.first_model_tints()
                }
            }
            ItemModel::Select { cases, fallback } => cases
                .iter()
                .map(|c| &c.model)
                .chain(fallback.as_deref())
                .find(|m| m.first_model_reference().is_some())
                .map(|m| m.first_model_tints())
                .unwrap_or(&[]),
            ItemModel::RangeDispatch { entries, fallback } => entries
                .iter()
                .map(|e| &e.model)
                .chain(fallback.as_deref())
                .find(|m| m.first_model_reference().is_some())
                .map(|m| m.first_model_tints())
                .unwrap_or(&[]),
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_model() {
        let json = r#"{ "model": { "type": "minecraft:model", "model": "minecraft:block/stone" } }"#;
        let def: ItemDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.first_model_reference(), Some("minecraft:block/stone"));
    }

    #[test]
    fn test_nested_select_uses_first_case() {
        let json = r#"{
            "model": {
                "type": "minecraft:condition",
                "property": "minecraft:using_item",
                "on_true": {
                    "type": "minecraft:select",
                    "property": "minecraft:charge_type",
                    "cases": [
                        { "when": "arrow", "model": { "type": "minecraft:model", "model": "minecraft:item/crossbow_arrow" } }
                    ],
                    "fallback": { "type": "minecraft:model", "model": "minecraft:item/crossbow_pulling_0" }
                },
                "on_false": { "type": "minecraft:model", "model": "minecraft:item/crossbow" }
            }
        }"#;
        let def: ItemDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.first_model_reference(), Some("minecraft:item/crossbow_arrow"));
    }

    #[test]
    fn test_range_dispatch_falls_back() {
        let json = r#"{
            "model": {
                "type": "range_dispatch",
                "property": "minecraft:time",
                "entries": [ { "threshold": 0.5, "model": { "type": "minecraft:empty" } } ],
                "fallback": { "type": "model", "model": "item/clock_00" }
            }
        }"#;
        let def: ItemDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.first_model_reference(), Some("item/clock_00"));
    }

    #[test]
    fn test_special_uses_base_and_unknown_is_tolerated() {
        let json = r#"{
            "model": {
                "type": "minecraft:composite",
                "models": [
                    { "type": "minecraft:some_future_type", "foo": 1 },
                    { "type": "minecraft:special", "base": "minecraft:item/chest", "model": { "type": "minecraft:chest", "texture": "minecraft:normal" } }
                ]
            }
        }"#;
        let def: ItemDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.first_model_reference(), Some("minecraft:item/chest"));
    }

    #[test]
    fn test_leaf_tints() {
        let json = r#"{
            "model": {
                "type": "minecraft:model",
                "model": "minecraft:item/leather_helmet",
                "tints": [ { "type": "minecraft:dye", "default": -6265536 } ]
            }
        }"#;
        let def: ItemDefinition = serde_json::from_str(json).unwrap();
        let tints = def.model.first_model_tints();
        assert_eq!(tints.len(), 1);
        let rgb = tints[0].rgb().unwrap();
        assert!(rgb[0] > rgb[2]);
    }
}
