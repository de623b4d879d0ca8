//! Tint colors for grass, foliage, water and other colored models.
//!
//! Faces with a `tintindex` are multiplied by a color picked from the
//! model's name. Icons have no biome, so every category uses a fixed
//! default that can be overridden per biome.

use crate::paths;

/// Tint colors for each model category (RGB, 0-1).
#[derive(Debug, Clone, PartialEq)]
pub struct TintColors {
    /// Grass blocks, grass, ferns, sugar cane.
    pub grass: [f32; 3],
    /// Leaves and vines. Also the fallback for unknown tinted models.
    pub foliage: [f32; 3],
    pub spruce_leaves: [f32; 3],
    pub birch_leaves: [f32; 3],
    pub water: [f32; 3],
    /// Fully powered redstone dust.
    pub redstone: [f32; 3],
    /// Fully grown melon and pumpkin stems.
    pub stem: [f32; 3],
    pub lily_pad: [f32; 3],
}

impl Default for TintColors {
    fn default() -> Self {
        Self {
            // Plains biome colormap samples
            grass: [0.569, 0.741, 0.349],
            foliage: [0.467, 0.671, 0.184],
            spruce_leaves: [0.380, 0.600, 0.380],
            birch_leaves: [0.502, 0.655, 0.333],
            water: [0.247, 0.463, 0.894],
            redstone: [0.988, 0.196, 0.0],
            stem: [0.878, 0.780, 0.110],
            lily_pad: [0.125, 0.502, 0.188],
        }
    }
}

impl TintColors {
    /// Tint colors for a specific biome. Unknown biomes keep the defaults.
    pub fn for_biome(biome: &str) -> Self {
        let mut colors = Self::default();

        match paths::base_name(biome) {
            "swamp" | "mangrove_swamp" => {
                colors.grass = [0.416, 0.439, 0.224];
                colors.foliage = [0.416, 0.439, 0.224];
                colors.water = [0.380, 0.482, 0.392];
            }
            "badlands" | "wooded_badlands" | "eroded_badlands" => {
                colors.grass = [0.565, 0.506, 0.302];
                colors.foliage = [0.620, 0.506, 0.302];
            }
            "jungle" | "bamboo_jungle" | "sparse_jungle" => {
                colors.grass = [0.349, 0.788, 0.235];
                colors.foliage = [0.188, 0.733, 0.043];
            }
            "dark_forest" => {
                colors.grass = [0.314, 0.478, 0.196];
                colors.foliage = [0.349, 0.682, 0.188];
            }
            "snowy_plains" | "snowy_taiga" | "snowy_slopes" => {
                colors.grass = [0.502, 0.706, 0.592];
                colors.foliage = [0.376, 0.631, 0.482];
            }
            "desert" | "savanna" => {
                colors.grass = [0.749, 0.718, 0.333];
                colors.foliage = [0.682, 0.643, 0.165];
            }
            _ => {}
        }

        colors
    }
}

/// Picks the tint for a model face.
#[derive(Debug, Clone, Default)]
pub struct TintProvider {
    colors: TintColors,
}

impl TintProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_colors(colors: TintColors) -> Self {
        Self { colors }
    }

    pub fn colors(&self) -> &TintColors {
        &self.colors
    }

    /// Tint for a face of `model` with `tint_index`, or `None` for untinted faces.
    pub fn tint_for(&self, model: &str, tint_index: Option<i32>) -> Option<[f32; 3]> {
        match tint_index {
            Some(index) if index >= 0 => Some(self.color(categorize(paths::base_name(model)))),
            _ => None,
        }
    }

    fn color(&self, category: TintCategory) -> [f32; 3] {
        match category {
            TintCategory::Grass => self.colors.grass,
            TintCategory::Foliage => self.colors.foliage,
            TintCategory::SpruceLeaves => self.colors.spruce_leaves,
            TintCategory::BirchLeaves => self.colors.birch_leaves,
            TintCategory::Water => self.colors.water,
            TintCategory::Redstone => self.colors.redstone,
            TintCategory::Stem => self.colors.stem,
            TintCategory::LilyPad => self.colors.lily_pad,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TintCategory {
    Grass,
    Foliage,
    SpruceLeaves,
    BirchLeaves,
    Water,
    Redstone,
    Stem,
    LilyPad,
}

/// Categorize a model by its base name, e.g. `grass_block` or `oak_leaves`.
fn categorize(name: &str) -> TintCategory {
    if matches!(
        name,
        "grass_block" | "grass" | "short_grass" | "tall_grass" | "fern" | "large_fern"
            | "potted_fern" | "sugar_cane"
    ) || name.starts_with("tall_grass_")
        || name.starts_with("large_fern_")
    {
        return TintCategory::Grass;
    }
    if name.starts_with("spruce_leaves") {
        return TintCategory::SpruceLeaves;
    }
    if name.starts_with("birch_leaves") {
        return TintCategory::BirchLeaves;
    }
    if matches!(name, "water" | "bubble_column" | "water_cauldron" | "water_bucket")
        || name.starts_with("water_cauldron")
    {
        return TintCategory::Water;
    }
    if name.starts_with("redstone_dust") || name == "redstone_wire" {
        return TintCategory::Redstone;
    }
    if name.contains("melon_stem") || name.contains("pumpkin_stem") {
        return TintCategory::Stem;
    }
    if name == "lily_pad" {
        return TintCategory::LilyPad;
    }
    TintCategory::Foliage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untinted_faces() {
        let provider = TintProvider::new();
        assert_eq!(provider.tint_for("block/stone", None), None);
        assert_eq!(provider.tint_for("block/grass_block", Some(-1)), None);
    }

    #[test]
    fn test_categories() {
        let provider = TintProvider::new();
        let colors = TintColors::default();
        assert_eq!(provider.tint_for("block/grass_block", Some(0)), Some(colors.grass));
        assert_eq!(provider.tint_for("minecraft:block/tall_grass_top", Some(0)), Some(colors.grass));
        assert_eq!(provider.tint_for("block/spruce_leaves", Some(0)), Some(colors.spruce_leaves));
        assert_eq!(provider.tint_for("block/water_cauldron_level2", Some(0)), Some(colors.water));
        assert_eq!(provider.tint_for("block/attached_melon_stem", Some(0)), Some(colors.stem));
        // Unknown tinted models get foliage green.
        assert_eq!(provider.tint_for("block/oak_leaves", Some(0)), Some(colors.foliage));
        assert_eq!(provider.tint_for("block/mystery", Some(3)), Some(colors.foliage));
    }

    #[test]
    fn test_biome_override() {
        let swamp = TintProvider::with_colors(TintColors::for_biome("minecraft:swamp"));
        assert_ne!(swamp.colors().grass, TintColors::default().grass);
        assert_eq!(TintColors::for_biome("plains"), TintColors::default());
    }
}
