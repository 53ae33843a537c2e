//! Biome map rasterization for visualization tooling.

use crate::biome::{BiomeClassifier, BiomeProfiles};

/// RGBA raster of blended biome colors over a rectangular world region.
#[derive(Debug, Clone)]
pub struct BiomeMapImage {
    /// Raster width in pixels.
    pub width: usize,
    /// Raster height in pixels.
    pub height: usize,
    /// Row-major RGBA pixels, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl BiomeMapImage {
    /// RGBA bytes of the pixel at `(px, py)`.
    pub fn pixel(&self, px: usize, py: usize) -> [u8; 4] {
        let i = (py * self.width + px) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

/// Rasterize biome weights over a world-space rectangle into a color
/// buffer, blending each kind's display color by its membership weight.
///
/// `(min_x, min_z)` is the world position of pixel `(0, 0)`; `extent` is
/// the world-space edge length covered along each axis.
pub fn rasterize_biome_map(
    classifier: &BiomeClassifier,
    profiles: &BiomeProfiles,
    min_x: f64,
    min_z: f64,
    extent: f64,
    width: usize,
    height: usize,
) -> BiomeMapImage {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for py in 0..height {
        let z = min_z + extent * py as f64 / height.max(1) as f64;
        for px in 0..width {
            let x = min_x + extent * px as f64 / width.max(1) as f64;
            let weights = classifier.classify(x, z);

            let mut rgb = [0.0f64; 3];
            for (kind, weight) in weights.iter() {
                if weight <= 0.0 {
                    continue;
                }
                let color = profiles.get(kind).display_color;
                for (acc, &c) in rgb.iter_mut().zip(color.iter()) {
                    *acc += weight * c as f64;
                }
            }

            pixels.extend_from_slice(&[
                rgb[0].round() as u8,
                rgb[1].round() as u8,
                rgb[2].round() as u8,
                255,
            ]);
        }
    }

    BiomeMapImage {
        width,
        height,
        pixels,
    }
}
