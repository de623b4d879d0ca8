//! Software isometric rasterizer.
//!
//! Block models are drawn face by face: each face is projected, back faces
//! are culled, the rest are sorted far to near and painted with their
//! texture, tint and directional shade. There is no depth buffer; the
//! painter's order is enough for cuboid models seen from one side.
//!
//! Sprite items are drawn by stacking their layer textures, scaled up by the
//! largest whole factor that fits.
//!
//! Everything here is blocking and CPU-bound. Async callers should go
//! through [`crate::render::RenderCoordinator`], which runs it on the
//! blocking pool.

pub mod canvas;
pub mod projection;
pub mod shading;
pub mod tint;

pub use canvas::{encode_png, Canvas};
pub use projection::{default_scale, Projection};
pub use tint::{TintColors, TintProvider};

use crate::error::{Error, Result};
use crate::resolver::{ModelResolver, ResolvedModel};
use crate::resource_pack::texture::load_texture_from_file;
use crate::resource_pack::{ModelElement, ModelFace, ResourcePack, TextureData};
use crate::types::{Direction, ViewRotation};
use canvas::TexturedQuad;
use image::RgbaImage;
use parking_lot::Mutex;
use projection::ScreenPoint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Output size and camera for one render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    /// Pixels per model unit. `None` derives it from the output size.
    pub scale: Option<u32>,
    pub rotation: ViewRotation,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            scale: None,
            rotation: ViewRotation::default(),
        }
    }
}

impl RenderOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_rotation(mut self, rotation: ViewRotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// The scale actually used: the explicit one, or the size-derived default.
    pub fn effective_scale(&self) -> u32 {
        self.scale
            .unwrap_or_else(|| default_scale(self.width, self.height))
            .max(1)
    }
}

/// A face that survived culling, waiting for its turn in painter's order.
struct FaceDraw<'a> {
    element: &'a ModelElement,
    direction: Direction,
    face: &'a ModelFace,
    points: [ScreenPoint; 4],
    depth: f32,
}

/// Renders block models and item sprites from a resource pack.
///
/// Textures are decoded once and shared across renders, so one rasterizer
/// can serve many concurrent calls.
pub struct Rasterizer {
    resolver: ModelResolver,
    tints: TintProvider,
    textures: Mutex<HashMap<String, Arc<TextureData>>>,
}

impl Rasterizer {
    pub fn new(pack: ResourcePack) -> Self {
        Self::with_resolver(ModelResolver::new(pack))
    }

    pub fn with_resolver(resolver: ModelResolver) -> Self {
        Self {
            resolver,
            tints: TintProvider::default(),
            textures: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_tints(mut self, tints: TintProvider) -> Self {
        self.tints = tints;
        self
    }

    pub fn resolver(&self) -> &ModelResolver {
        &self.resolver
    }

    /// The first animation frame of a texture, or the placeholder if it is missing or unreadable.
    pub fn texture(&self, location: &str) -> Arc<TextureData> {
        let key = crate::paths::normalize_location(location);
        if let Some(cached) = self.textures.lock().get(&key) {
            return Arc::clone(cached);
        }

        let loaded = match self.resolver.pack().texture_path(&key) {
            Some(path) => match load_texture_from_file(&path) {
                Ok(texture) => texture.first_frame(),
                Err(e) => {
                    tracing::warn!(texture = %key, error = %e, "unreadable texture, using placeholder");
                    TextureData::placeholder()
                }
            },
            None => {
                tracing::warn!(error = %Error::TextureMissing(key.clone()), "using placeholder");
                TextureData::placeholder()
            }
        };

        Arc::clone(
            self.textures
                .lock()
                .entry(key)
                .or_insert_with(|| Arc::new(loaded)),
        )
    }

    fn resolve_block(&self, model: &str) -> Result<Arc<ResolvedModel>> {
        let resolved = self
            .resolver
            .resolve(model)
            .ok_or_else(|| Error::ModelNotFound(model.to_string()))?;
        if !resolved.has_elements() {
            return Err(Error::NoRenderableGeometry(model.to_string()));
        }
        Ok(resolved)
    }

    /// Render a block model to an image.
    pub fn render_block_image(&self, model: &str, options: &RenderOptions) -> Result<RgbaImage> {
        let resolved = self.resolve_block(model)?;
        let scale = options.effective_scale() as f32;
        let projection = Projection::new(options.rotation, scale, options.width, options.height);

        let mut faces = Vec::new();
        for element in &resolved.model.elements {
            for direction in Direction::ALL {
                let Some(face) = element.faces.get(&direction) else {
                    continue;
                };
                let points = projection.project_quad(element.face_corners(direction));
                if projection::is_back_facing(&points) {
                    continue;
                }
                faces.push(FaceDraw {
                    element,
                    direction,
                    face,
                    depth: projection::mean_depth(&points),
                    points,
                });
            }
        }
        // Stable, so coplanar faces keep model order.
        faces.sort_by(|a, b| b.depth.total_cmp(&a.depth));

        let mut canvas = Canvas::new(options.width, options.height);
        for draw in &faces {
            self.draw_face(&mut canvas, &resolved, draw);
        }

        tracing::debug!(model, faces = faces.len(), width = options.width, height = options.height, "rendered block");
        Ok(canvas.into_image())
    }

    fn draw_face(&self, canvas: &mut Canvas, model: &ResolvedModel, draw: &FaceDraw<'_>) {
        let texture = match model.resolve_texture(&draw.face.texture) {
            Some(location) => self.texture(&location),
            None => {
                tracing::warn!(model = %model.name, face = %draw.direction, reference = %draw.face.texture, "unresolved texture reference");
                Arc::new(TextureData::placeholder())
            }
        };
        let texture = match self.tints.tint_for(&model.name, draw.face.tintindex) {
            Some(tint) => Arc::new(texture.tinted(tint)),
            None => texture,
        };

        let [u1, v1, u2, v2] = draw.element.face_uv(draw.direction, draw.face);
        let sx = texture.width as f32 / 16.0;
        let sy = texture.height as f32 / 16.0;
        let uv_corners = [
            [u1 * sx, v1 * sy],
            [u2 * sx, v1 * sy],
            [u2 * sx, v2 * sy],
            [u1 * sx, v2 * sy],
        ];
        let turns = draw.face.quarter_turns();
        let texels = std::array::from_fn(|i| uv_corners[(i + 4 - turns) % 4]);
        let bounds = [
            (u1.min(u2) * sx).max(0.0),
            (v1.min(v2) * sy).max(0.0),
            (u1.max(u2) * sx).min(texture.width as f32),
            (v1.max(v2) * sy).min(texture.height as f32),
        ];

        canvas.fill_quad(&TexturedQuad {
            points: draw.points,
            texels,
            bounds,
            texture: &texture,
            shade: shading::element_face_shade(draw.direction, draw.element.shade),
        });
    }

    /// Render a block model to PNG bytes.
    pub fn render_block_png(&self, model: &str, options: &RenderOptions) -> Result<Vec<u8>> {
        encode_png(&self.render_block_image(model, options)?)
    }

    /// Render a block model and write it to `output` as PNG.
    pub fn render_block(&self, model: &str, output: &Path, options: &RenderOptions) -> Result<PathBuf> {
        let png = self.render_block_png(model, options)?;
        write_output(output, &png)
    }

    /// Stack sprite layers, bottom first, each tinted by the matching entry
    /// of `tints`, scaled by a whole factor and centered.
    pub fn render_sprite_image(
        &self,
        layers: &[String],
        tints: &[Option<[f32; 3]>],
        options: &RenderOptions,
    ) -> RgbaImage {
        let mut canvas = Canvas::new(options.width, options.height);
        for (index, layer) in layers.iter().enumerate() {
            let texture = self.texture(layer);
            let texture = match tints.get(index).copied().flatten() {
                Some(tint) => Arc::new(texture.tinted(tint)),
                None => texture,
            };
            let factor = (options.width / texture.width.max(1))
                .min(options.height / texture.height.max(1))
                .max(1);
            let x = (options.width as i64 - (texture.width * factor) as i64) / 2;
            let y = (options.height as i64 - (texture.height * factor) as i64) / 2;
            canvas.draw_scaled(&texture, x, y, factor);
        }
        canvas.into_image()
    }

    fn sprite_layers(&self, model: &str) -> Result<Vec<String>> {
        let resolved = self
            .resolver
            .resolve(model)
            .ok_or_else(|| Error::ModelNotFound(model.to_string()))?;
        let layers: Vec<String> = resolved
            .model
            .layer_textures()
            .into_iter()
            .filter_map(|layer| resolved.resolve_texture(layer))
            .collect();
        if layers.is_empty() {
            return Err(Error::NoRenderableGeometry(model.to_string()));
        }
        Ok(layers)
    }

    /// Render a flat item model (`layer0..layerN`) to an image.
    pub fn render_item_image(&self, model: &str, options: &RenderOptions) -> Result<RgbaImage> {
        let layers = self.sprite_layers(model)?;
        Ok(self.render_sprite_image(&layers, &[], options))
    }

    /// Render a flat item model to PNG bytes.
    pub fn render_item_png(&self, model: &str, options: &RenderOptions) -> Result<Vec<u8>> {
        encode_png(&self.render_item_image(model, options)?)
    }

    /// Render a flat item model and write it to `output` as PNG.
    pub fn render_item(&self, model: &str, output: &Path, options: &RenderOptions) -> Result<PathBuf> {
        let png = self.render_item_png(model, options)?;
        write_output(output, &png)
    }
}

fn write_output(output: &Path, png: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, png)?;
    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource_pack::test_support::{minimal_pack, write, write_png};

    const STONE: [u8; 4] = [120, 120, 120, 255];

    fn rasterizer(root: &Path) -> Rasterizer {
        minimal_pack(root);
        Rasterizer::new(ResourcePack::from_dir(root))
    }

    /// Bounding box of non-transparent pixels: (min_x, min_y, max_x, max_y).
    fn opaque_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in image.enumerate_pixels() {
            if pixel.0[3] == 0 {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
        bounds
    }

    fn shaded(color: [u8; 4], shade: f32) -> [u8; 4] {
        let c = |v: u8| (v as f32 * (1.0 - shade)).round() as u8;
        [c(color[0]), c(color[1]), c(color[2]), color[3]]
    }

    #[test]
    fn test_stone_cube_is_centered() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = rasterizer(dir.path());
        let image = rasterizer
            .render_block_image("block/stone", &RenderOptions::new(128, 128))
            .unwrap();
        assert_eq!(image.dimensions(), (128, 128));

        let (x0, y0, x1, y1) = opaque_bounds(&image).unwrap();
        let left = x0 as i64;
        let right = 127 - x1 as i64;
        let top = y0 as i64;
        let bottom = 127 - y1 as i64;
        assert!((left - right).abs() <= 2, "left {} right {}", left, right);
        assert!((top - bottom).abs() <= 2, "top {} bottom {}", top, bottom);
        assert!(x1 - x0 > 100);

        // Top face unshaded, the two side faces darker than it.
        assert_eq!(image.get_pixel(64, 30).0, STONE);
        assert_eq!(image.get_pixel(40, 80).0, shaded(STONE, 0.2));
        assert_eq!(image.get_pixel(88, 80).0, shaded(STONE, 0.35));
        assert_eq!(image.get_pixel(2, 2).0[3], 0);
    }

    #[test]
    fn test_repeat_renders_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = rasterizer(dir.path());
        let options = RenderOptions::new(128, 128);
        let first = rasterizer.render_block_png("block/stone", &options).unwrap();
        let second = rasterizer.render_block_png("minecraft:block/stone", &options).unwrap();
        assert_eq!(first, second);

        let fresh = Rasterizer::new(ResourcePack::from_dir(dir.path()));
        assert_eq!(first, fresh.render_block_png("block/stone", &options).unwrap());
    }

    #[test]
    fn test_render_block_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = rasterizer(dir.path());
        let output = dir.path().join("out/nested/stone.png");
        let written = rasterizer
            .render_block("block/stone", &output, &RenderOptions::new(64, 48))
            .unwrap();
        assert_eq!(written, output);
        let decoded = image::open(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn test_unknown_model() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = rasterizer(dir.path());
        let output = dir.path().join("missing.png");
        let err = rasterizer
            .render_block("block/nope", &output, &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::ModelNotFound(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_models_without_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = rasterizer(dir.path());
        write(dir.path(), "assets/minecraft/models/block/loop_a.json", r#"{ "parent": "block/loop_b" }"#);
        write(dir.path(), "assets/minecraft/models/block/loop_b.json", r#"{ "parent": "block/loop_a" }"#);

        let options = RenderOptions::default();
        assert!(matches!(
            rasterizer.render_block_image("block/loop_a", &options),
            Err(Error::NoRenderableGeometry(_))
        ));
        assert!(matches!(
            rasterizer.render_block_image("item/stick", &options),
            Err(Error::NoRenderableGeometry(_))
        ));
    }

    #[test]
    fn test_missing_texture_uses_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = rasterizer(dir.path());
        write(
            dir.path(),
            "assets/minecraft/models/block/mystery.json",
            r#"{ "parent": "block/cube_all", "textures": { "all": "block/does_not_exist" } }"#,
        );
        let image = rasterizer
            .render_block_image("block/mystery", &RenderOptions::new(128, 128))
            .unwrap();
        let top = image.get_pixel(64, 30).0;
        assert!(top == [255, 0, 255, 255] || top == [0, 0, 0, 255], "got {:?}", top);
    }

    #[test]
    fn test_front_view_culls_hidden_faces() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = rasterizer(dir.path());
        let options = RenderOptions::new(64, 64).with_rotation(ViewRotation::new(0.0, 0.0, 0.0));
        let image = rasterizer.render_block_image("block/stone", &options).unwrap();

        let south = shaded(STONE, 0.35);
        assert!(image.pixels().filter(|p| p.0[3] > 0).all(|p| p.0 == south));
        assert_eq!(image.get_pixel(32, 32).0, south);
    }

    #[test]
    fn test_tinted_face_keeps_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = rasterizer(dir.path());
        write_png(dir.path(), "assets/minecraft/textures/block/grass_block_top.png", 16, [255, 255, 255, 255]);
        write(
            dir.path(),
            "assets/minecraft/models/block/grass_block.json",
            r##"{ "elements": [ { "from": [0, 0, 0], "to": [16, 16, 16],
                 "faces": { "up": { "texture": "#top", "tintindex": 0 } } } ],
                 "textures": { "top": "block/grass_block_top" } }"##,
        );
        let image = rasterizer
            .render_block_image("block/grass_block", &RenderOptions::new(128, 128))
            .unwrap();

        let grass = TintColors::default().grass;
        let expected = grass.map(|c| (255.0 * c).round() as u8);
        let pixel = image.get_pixel(64, 30).0;
        assert_eq!(&pixel[..3], &expected[..]);
        assert_eq!(pixel[3], 255);
    }

    #[test]
    fn test_unshaded_element() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = rasterizer(dir.path());
        write(
            dir.path(),
            "assets/minecraft/models/block/glowing.json",
            r##"{ "elements": [ { "from": [0, 0, 0], "to": [16, 16, 16], "shade": false,
                 "faces": { "south": { "texture": "#all" }, "west": { "texture": "#all" } } } ],
                 "textures": { "all": "block/stone" } }"##,
        );
        let image = rasterizer
            .render_block_image("block/glowing", &RenderOptions::new(128, 128))
            .unwrap();
        assert_eq!(image.get_pixel(40, 80).0, STONE);
        assert_eq!(image.get_pixel(88, 80).0, STONE);
    }

    #[test]
    fn test_sprite_item_fills_and_centers() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = rasterizer(dir.path());
        let image = rasterizer
            .render_item_image("item/stick", &RenderOptions::new(64, 64))
            .unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [140, 90, 40, 255]);
        assert_eq!(image.get_pixel(63, 63).0, [140, 90, 40, 255]);

        // 40 / 16 = 2, so a 32 px sprite with a 4 px margin.
        let image = rasterizer
            .render_item_image("item/stick", &RenderOptions::new(40, 40))
            .unwrap();
        assert_eq!(image.get_pixel(3, 3).0[3], 0);
        assert_eq!(image.get_pixel(4, 4).0, [140, 90, 40, 255]);
        assert_eq!(image.get_pixel(35, 35).0, [140, 90, 40, 255]);
        assert_eq!(image.get_pixel(36, 36).0[3], 0);
    }

    #[test]
    fn test_sprite_layers_stack_with_tints() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = rasterizer(dir.path());
        write_png(dir.path(), "assets/minecraft/textures/item/overlay.png", 16, [255, 255, 255, 255]);
        let layers = vec!["item/stick".to_string(), "item/overlay".to_string()];
        let image = rasterizer.render_sprite_image(
            &layers,
            &[None, Some([1.0, 0.0, 0.0])],
            &RenderOptions::new(16, 16),
        );
        assert_eq!(image.get_pixel(8, 8).0, [255, 0, 0, 255]);
    }
}
