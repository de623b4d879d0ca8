//! Texture loading and per-pixel helpers.

use crate::error::Result;
use std::path::Path;

/// Raw texture data loaded from PNG.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    /// Texture width in pixels.
    pub width: u32,
    /// Texture height in pixels.
    pub height: u32,
    /// RGBA8 pixel data (4 bytes per pixel).
    pub pixels: Vec<u8>,
    /// Whether this texture is a vertical strip of animation frames.
    pub is_animated: bool,
    /// Animation frame count (1 if not animated).
    pub frame_count: u32,
}

impl TextureData {
    /// Create a new texture from RGBA data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
            is_animated: false,
            frame_count: 1,
        }
    }

    /// Create a placeholder texture (magenta/black checkerboard).
    pub fn placeholder() -> Self {
        let size = 16;
        let mut pixels = vec![0u8; (size * size * 4) as usize];

        for y in 0..size {
            for x in 0..size {
                let idx = ((y * size + x) * 4) as usize;
                let is_magenta = ((x / 8) + (y / 8)) % 2 == 0;
                let rgb: [u8; 3] = if is_magenta { [255, 0, 255] } else { [0, 0, 0] };
                pixels[idx..idx + 3].copy_from_slice(&rgb);
                pixels[idx + 3] = 255;
            }
        }

        Self::new(size, size, pixels)
    }

    /// Get a pixel at (x, y).
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Nearest-neighbour sample at texel coordinates, clamped to the edges.
    pub fn sample(&self, u: f32, v: f32) -> [u8; 4] {
        let x = (u.floor().max(0.0) as u32).min(self.width.saturating_sub(1));
        let y = (v.floor().max(0.0) as u32).min(self.height.saturating_sub(1));
        self.get_pixel(x, y)
    }

    /// Get the first frame of an animated texture (or the whole texture if not animated).
    pub fn first_frame(&self) -> TextureData {
        if !self.is_animated || self.frame_count <= 1 {
            return self.clone();
        }

        let frame_height = self.height / self.frame_count;
        let frame_size = (self.width * frame_height * 4) as usize;

        Self::new(self.width, frame_height, self.pixels[..frame_size].to_vec())
    }

    /// Multiply every pixel's colour by `tint` (RGB, 0-1), leaving alpha untouched.
    ///
    /// Fully transparent texels stay fully transparent.
    pub fn tinted(&self, tint: [f32; 3]) -> TextureData {
        let mut out = self.clone();
        for pixel in out.pixels.chunks_mut(4) {
            for c in 0..3 {
                pixel[c] = (pixel[c] as f32 * tint[c].clamp(0.0, 1.0)).round() as u8;
            }
        }
        out
    }
}

/// Load a texture from PNG bytes.
pub fn load_texture_from_bytes(data: &[u8]) -> std::result::Result<TextureData, image::ImageError> {
    let img = image::load_from_memory(data)?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    // Check for animation (texture is taller than wide, height is multiple of width)
    let is_animated = height > width && height % width == 0;
    let frame_count = if is_animated { height / width } else { 1 };

    Ok(TextureData {
        width,
        height,
        pixels: rgba.into_raw(),
        is_animated,
        frame_count,
    })
}

/// Load a texture from a PNG file on disk.
pub fn load_texture_from_file(path: &Path) -> Result<TextureData> {
    let data = std::fs::read(path)?;
    Ok(load_texture_from_bytes(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_texture() {
        let tex = TextureData::placeholder();
        assert_eq!(tex.width, 16);
        assert_eq!(tex.height, 16);
        assert_eq!(tex.pixels.len(), 16 * 16 * 4);
        assert_eq!(tex.get_pixel(0, 0), [255, 0, 255, 255]);
        assert_eq!(tex.get_pixel(8, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_get_pixel() {
        let tex = TextureData::new(2, 2, vec![255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 255, 255, 255, 255]);

        assert_eq!(tex.get_pixel(0, 0), [255, 0, 0, 255]); // Red
        assert_eq!(tex.get_pixel(1, 0), [0, 255, 0, 255]); // Green
        assert_eq!(tex.get_pixel(0, 1), [0, 0, 255, 255]); // Blue
        assert_eq!(tex.get_pixel(1, 1), [255, 255, 255, 255]); // White
    }

    #[test]
    fn test_sample_clamps() {
        let tex = TextureData::new(2, 1, vec![10, 0, 0, 255, 20, 0, 0, 255]);
        assert_eq!(tex.sample(-3.0, 0.0)[0], 10);
        assert_eq!(tex.sample(1.9, 0.5)[0], 20);
        assert_eq!(tex.sample(7.0, 9.0)[0], 20);
    }

    #[test]
    fn test_tint_preserves_alpha() {
        let tex = TextureData::new(2, 1, vec![200, 200, 200, 0, 200, 100, 50, 128]);
        let tinted = tex.tinted([0.5, 1.0, 0.0]);
        assert_eq!(tinted.get_pixel(0, 0)[3], 0);
        assert_eq!(tinted.get_pixel(1, 0), [100, 100, 0, 128]);
    }

    #[test]
    fn test_first_frame_of_strip() {
        let mut tex = TextureData::new(1, 2, vec![1, 1, 1, 255, 2, 2, 2, 255]);
        tex.is_animated = true;
        tex.frame_count = 2;
        let frame = tex.first_frame();
        assert_eq!(frame.height, 1);
        assert_eq!(frame.get_pixel(0, 0), [1, 1, 1, 255]);
    }
}
