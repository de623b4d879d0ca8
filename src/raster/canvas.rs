//! RGBA framebuffer with textured quad fill.

use super::projection::ScreenPoint;
use crate::error::Result;
use crate::resource_pack::TextureData;
use image::{ImageEncoder, RgbaImage};

/// How far outside a triangle edge a pixel centre may lie and still be drawn.
/// Closes hairline gaps between neighbouring faces.
const EDGE_EXPANSION: f32 = 0.5;

/// A textured quad ready to draw.
pub struct TexturedQuad<'a> {
    pub points: [ScreenPoint; 4],
    /// Texel coordinates for each point, in the texture's pixel space.
    pub texels: [[f32; 2]; 4],
    /// Texel rectangle sampling is clamped to: `[u_min, v_min, u_max, v_max]`.
    pub bounds: [f32; 4],
    pub texture: &'a TextureData,
    /// Black overlay strength, 0 for none.
    pub shade: f32,
}

/// Software framebuffer. Starts fully transparent.
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Source-over blend one pixel. Out-of-bounds writes are ignored.
    pub fn blend(&mut self, x: i64, y: i64, src: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        dst.0 = blend_over(dst.0, src);
    }

    /// Fill a quad as triangles (0,1,2) and (0,2,3), each mapped affinely
    /// from its three vertex/texel pairs. Every pixel is drawn at most once.
    pub fn fill_quad(&mut self, quad: &TexturedQuad<'_>) {
        let [p0, p1, p2, p3] = quad.points;
        let [t0, t1, t2, t3] = quad.texels;
        let first = Triangle::new([p0, p1, p2], [t0, t1, t2]);
        let second = Triangle::new([p0, p2, p3], [t0, t2, t3]);

        // Scan box covers the expanded edges too.
        let pad = EDGE_EXPANSION.ceil();
        let xs = quad.points.iter().map(|p| p.x);
        let ys = quad.points.iter().map(|p| p.y);
        let min_x = (xs.clone().fold(f32::INFINITY, f32::min).floor() - pad).max(0.0) as i64;
        let max_x = (xs.fold(f32::NEG_INFINITY, f32::max).ceil() + pad).min(self.width() as f32) as i64;
        let min_y = (ys.clone().fold(f32::INFINITY, f32::min).floor() - pad).max(0.0) as i64;
        let max_y = (ys.fold(f32::NEG_INFINITY, f32::max).ceil() + pad).min(self.height() as f32) as i64;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;
                let texel = first
                    .as_ref()
                    .and_then(|t| t.map(px, py))
                    .or_else(|| second.as_ref().and_then(|t| t.map(px, py)));
                let Some([u, v]) = texel else {
                    continue;
                };

                let u = u.clamp(quad.bounds[0], quad.bounds[2] - 1e-3);
                let v = v.clamp(quad.bounds[1], quad.bounds[3] - 1e-3);
                let mut color = quad.texture.sample(u, v);
                if color[3] == 0 {
                    continue;
                }
                if quad.shade > 0.0 {
                    let keep = 1.0 - quad.shade;
                    for c in &mut color[..3] {
                        *c = (*c as f32 * keep).round() as u8;
                    }
                }
                self.blend(x, y, color);
            }
        }
    }

    /// Draw `texture` scaled by an integer factor with its top-left at `(x, y)`.
    pub fn draw_scaled(&mut self, texture: &TextureData, x: i64, y: i64, factor: u32) {
        let factor = factor.max(1) as i64;
        for ty in 0..texture.height {
            for tx in 0..texture.width {
                let color = texture.get_pixel(tx, ty);
                if color[3] == 0 {
                    continue;
                }
                for dy in 0..factor {
                    for dx in 0..factor {
                        self.blend(x + tx as i64 * factor + dx, y + ty as i64 * factor + dy, color);
                    }
                }
            }
        }
    }
}

/// A screen triangle with an affine map from screen to texel space.
struct Triangle {
    points: [[f32; 2]; 3],
    texels: [[f32; 2]; 3],
    /// Twice the signed screen-space area.
    area: f32,
    /// Edge lengths, for turning edge functions into pixel distances.
    edges: [f32; 3],
}

impl Triangle {
    /// `None` for degenerate triangles.
    fn new(points: [ScreenPoint; 3], texels: [[f32; 2]; 3]) -> Option<Self> {
        let points = points.map(|p| [p.x, p.y]);
        let [a, b, c] = points;
        let area = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
        if area.abs() < 1e-6 {
            return None;
        }
        let length = |p: [f32; 2], q: [f32; 2]| ((q[0] - p[0]).powi(2) + (q[1] - p[1]).powi(2)).sqrt();
        Some(Self {
            points,
            texels,
            area,
            edges: [length(b, c), length(c, a), length(a, b)],
        })
    }

    /// Texel for a pixel centre, or `None` when it lies outside the
    /// triangle expanded by half a pixel.
    fn map(&self, x: f32, y: f32) -> Option<[f32; 2]> {
        let [a, b, c] = self.points;
        let edge = |p: [f32; 2], q: [f32; 2]| (q[0] - p[0]) * (y - p[1]) - (q[1] - p[1]) * (x - p[0]);

        // Barycentric weights opposite each vertex.
        let w = [edge(b, c) / self.area, edge(c, a) / self.area, edge(a, b) / self.area];
        for i in 0..3 {
            // Distance to edge i in pixels; negative when outside.
            let distance = w[i] * self.area.abs() / self.edges[i].max(1e-6);
            if distance < -EDGE_EXPANSION {
                return None;
            }
        }

        let [ta, tb, tc] = self.texels;
        Some([
            w[0] * ta[0] + w[1] * tb[0] + w[2] * tc[0],
            w[0] * ta[1] + w[1] * tb[1] + w[2] * tc[1],
        ])
    }
}

/// Straight-alpha source-over.
fn blend_over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as f32 / 255.0;
    if sa >= 1.0 {
        return src;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round() as u8;
    out
}

/// Encode an image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(std::io::Cursor::new(&mut bytes));
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::projection::Projection;
    use crate::types::ViewRotation;

    fn solid(rgba: [u8; 4]) -> TextureData {
        TextureData::new(16, 16, rgba.repeat(256))
    }

    fn square_quad(texture: &TextureData, shade: f32) -> TexturedQuad<'_> {
        // Front view, 1 px per unit: the model's south face covers 16x16 px.
        let projection = Projection::new(ViewRotation::new(0.0, 0.0, 0.0), 1.0, 32, 32);
        let corners = crate::types::Direction::South.corners([0.0; 3], [16.0; 3]);
        TexturedQuad {
            points: projection.project_quad(corners),
            texels: [[0.0, 0.0], [16.0, 0.0], [16.0, 16.0], [0.0, 16.0]],
            bounds: [0.0, 0.0, 16.0, 16.0],
            texture,
            shade,
        }
    }

    fn opaque_count(image: &RgbaImage) -> usize {
        image.pixels().filter(|p| p.0[3] > 0).count()
    }

    #[test]
    fn test_fill_square_covers_expected_pixels() {
        let texture = solid([10, 200, 30, 255]);
        let mut canvas = Canvas::new(32, 32);
        canvas.fill_quad(&square_quad(&texture, 0.0));
        let image = canvas.into_image();

        assert_eq!(image.get_pixel(16, 16).0, [10, 200, 30, 255]);
        assert_eq!(image.get_pixel(8, 8).0, [10, 200, 30, 255]);
        assert_eq!(image.get_pixel(2, 2).0[3], 0);
        // 16x16 interior, possibly one extra ring from the edge expansion.
        let count = opaque_count(&image);
        assert!((256..=18 * 18).contains(&count), "covered {}", count);
    }

    #[test]
    fn test_edge_expansion_reaches_past_vertex_extent() {
        // The square spans 8..24 on both axes; pixel centres half a pixel
        // outside it are still drawn, one further out is not.
        let texture = solid([10, 200, 30, 255]);
        let mut canvas = Canvas::new(32, 32);
        canvas.fill_quad(&square_quad(&texture, 0.0));
        let image = canvas.into_image();

        for (x, y) in [(7, 16), (24, 16), (16, 7), (16, 24)] {
            assert_eq!(image.get_pixel(x, y).0[3], 255, "({}, {})", x, y);
        }
        for (x, y) in [(6, 16), (25, 16), (16, 6), (16, 25)] {
            assert_eq!(image.get_pixel(x, y).0[3], 0, "({}, {})", x, y);
        }
    }

    #[test]
    fn test_shade_darkens() {
        let texture = solid([200, 200, 200, 255]);
        let mut canvas = Canvas::new(32, 32);
        canvas.fill_quad(&square_quad(&texture, 0.5));
        assert_eq!(canvas.into_image().get_pixel(16, 16).0, [100, 100, 100, 255]);
    }

    #[test]
    fn test_transparent_texels_are_skipped() {
        let texture = solid([255, 0, 0, 0]);
        let mut canvas = Canvas::new(32, 32);
        canvas.fill_quad(&square_quad(&texture, 0.0));
        assert_eq!(opaque_count(&canvas.into_image()), 0);
    }

    #[test]
    fn test_blend_over() {
        assert_eq!(blend_over([0, 0, 0, 0], [10, 20, 30, 255]), [10, 20, 30, 255]);
        assert_eq!(blend_over([0, 0, 0, 0], [10, 20, 30, 128]), [10, 20, 30, 128]);
        let mixed = blend_over([0, 0, 255, 255], [255, 0, 0, 128]);
        assert_eq!(mixed[3], 255);
        assert!(mixed[0] > 120 && mixed[2] > 120);
    }

    #[test]
    fn test_png_roundtrip_dimensions() {
        let bytes = encode_png(&RgbaImage::new(7, 3)).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (7, 3));
    }
}
