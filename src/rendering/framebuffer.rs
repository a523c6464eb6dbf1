/// Supersampled color and depth storage.
///
/// Memory is split into one `TileSurface` per tile of the grid. Each surface
/// owns every sample of its pixels, so the parallel pass can hand out
/// `&mut TileSurface` per task without any shared writes.
///
/// Depth is reversed-Z: 1 is the near plane, 0 the far plane, and a sample
/// passes only when strictly greater than the stored value.
use super::shadow::DepthMap;
use super::tile::{TileGrid, TileRect};
use crate::{count_call, perf::FUNCTION_COUNTERS, time_stage};
use bitflags::bitflags;
use glam::{Vec3, Vec4};
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};

/// Depth of a sample nothing has been written to.
pub const DEPTH_CLEAR: f32 = f32::MIN;

bitflags! {
    /// Buffers affected by [`Framebuffer::clear`].
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Buffers: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Color,
    Depth,
}

/// Samples for one tile. Sample `s` of pixel `(x, y)` lives at
/// `((y - y0) * width + (x - x0)) * samples + s`.
pub struct TileSurface {
    pub rect: TileRect,
    samples: usize,
    color: Vec<Vec4>,
    depth: Vec<f32>,
}

impl TileSurface {
    pub fn new(rect: TileRect, samples: usize, clear_color: Vec4) -> Self {
        let n = rect.pixel_count() * samples;
        Self {
            rect,
            samples,
            color: vec![clear_color; n],
            depth: vec![DEPTH_CLEAR; n],
        }
    }

    #[inline]
    pub fn samples_per_pixel(&self) -> usize {
        self.samples
    }

    /// Index of sample `s` of global pixel `(x, y)`. The pixel must be inside the tile.
    #[inline]
    pub fn sample_index(&self, x: usize, y: usize, s: usize) -> usize {
        debug_assert!(self.rect.contains(x, y));
        ((y - self.rect.y0) * self.rect.width + (x - self.rect.x0)) * self.samples + s
    }

    #[inline]
    pub fn depth_at(&self, idx: usize) -> f32 {
        self.depth[idx]
    }

    #[inline]
    pub fn color_at(&self, idx: usize) -> Vec4 {
        self.color[idx]
    }

    /// Reversed-Z test: true when `z` is strictly nearer than the stored depth.
    #[inline]
    pub fn depth_test(&self, idx: usize, z: f32) -> bool {
        z > self.depth[idx]
    }

    #[inline]
    pub fn write_depth(&mut self, idx: usize, z: f32) {
        self.depth[idx] = z;
    }

    /// Straight alpha-over onto the stored color. The stored alpha is forced to 1.
    #[inline]
    pub fn blend(&mut self, idx: usize, src: Vec4) {
        let dst = self.color[idx];
        let a = src.w;
        let rgb = src.truncate() * a + dst.truncate() * (1.0 - a);
        self.color[idx] = rgb.extend(1.0);
    }

    pub fn clear(&mut self, buffers: Buffers, clear_color: Vec4) {
        if buffers.contains(Buffers::COLOR) {
            self.color.fill(clear_color);
        }
        if buffers.contains(Buffers::DEPTH) {
            self.depth.fill(DEPTH_CLEAR);
        }
    }

    /// Samples of one pixel as `(colors, depths)`.
    #[inline]
    fn pixel_samples(&self, x: usize, y: usize) -> (&[Vec4], &[f32]) {
        let start = self.sample_index(x, y, 0);
        let end = start + self.samples;
        (&self.color[start..end], &self.depth[start..end])
    }
}

pub struct Framebuffer {
    pub width: usize,
    pub height: usize,
    /// Samples per pixel along each axis.
    pub ssaa: usize,
    grid: TileGrid,
    tiles: Vec<TileSurface>,
    clear_color: Vec4,
}

impl Framebuffer {
    pub fn new(
        width: usize,
        height: usize,
        ssaa: usize,
        tile_size: usize,
        clear_color: Vec3,
    ) -> Self {
        let ssaa = ssaa.max(1);
        let grid = TileGrid::new(width, height, tile_size);
        let clear_color = clear_color.extend(1.0);
        let tiles = grid
            .rects()
            .map(|rect| TileSurface::new(rect, ssaa * ssaa, clear_color))
            .collect();
        Self {
            width,
            height,
            ssaa,
            grid,
            tiles,
            clear_color,
        }
    }

    #[inline]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    #[inline]
    pub fn samples_per_pixel(&self) -> usize {
        self.ssaa * self.ssaa
    }

    #[inline]
    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    #[inline]
    pub fn tiles(&self) -> &[TileSurface] {
        &self.tiles
    }

    #[inline]
    pub fn tiles_mut(&mut self) -> &mut [TileSurface] {
        &mut self.tiles
    }

    pub fn clear(&mut self, buffers: Buffers) {
        count_call!(FUNCTION_COUNTERS.framebuffer_clears);
        let color = self.clear_color;
        for tile in &mut self.tiles {
            tile.clear(buffers, color);
        }
    }

    #[inline]
    fn tile_for(&self, x: usize, y: usize) -> &TileSurface {
        &self.tiles[self.grid.tile_of(x, y)]
    }

    /// Color of sample `s` of pixel `(x, y)`, y measured from the bottom.
    pub fn sample_color(&self, x: usize, y: usize, s: usize) -> Vec4 {
        let tile = self.tile_for(x, y);
        tile.color_at(tile.sample_index(x, y, s))
    }

    pub fn sample_depth(&self, x: usize, y: usize, s: usize) -> f32 {
        let tile = self.tile_for(x, y);
        tile.depth_at(tile.sample_index(x, y, s))
    }

    /// Box-filtered color of pixel `(x, y)`.
    pub fn resolve_pixel(&self, x: usize, y: usize) -> Vec4 {
        let (colors, _) = self.tile_for(x, y).pixel_samples(x, y);
        let sum: Vec4 = colors.iter().copied().sum();
        sum / colors.len() as f32
    }

    /// Mean of the written depth samples of a pixel, if any.
    pub fn resolve_depth(&self, x: usize, y: usize) -> Option<f32> {
        let (_, depths) = self.tile_for(x, y).pixel_samples(x, y);
        let (sum, count) = depths
            .iter()
            .filter(|&&d| d != DEPTH_CLEAR)
            .fold((0.0f32, 0usize), |(s, n), &d| (s + d, n + 1));
        (count > 0).then(|| sum / count as f32)
    }

    /// Resolved color as an 8-bit image, top row first.
    pub fn color_image(&self) -> RgbaImage {
        time_stage!("resolve_color");
        let mut img = RgbaImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            let row = (self.height - 1 - y) as u32;
            for x in 0..self.width {
                let c = self.resolve_pixel(x, y);
                img.put_pixel(
                    x as u32,
                    row,
                    Rgba([to_u8(c.x), to_u8(c.y), to_u8(c.z), to_u8(c.w)]),
                );
            }
        }
        img
    }

    /// Depth visualisation: per-pixel mean of valid samples, rescaled to the
    /// observed range and gamma-lifted with `pow(0.5)`. Unwritten pixels are black.
    pub fn depth_image(&self) -> GrayImage {
        time_stage!("resolve_depth");
        let resolved: Vec<Option<f32>> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .map(|(x, y)| self.resolve_depth(x, y))
            .collect();

        let (lo, hi) = resolved
            .iter()
            .flatten()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &d| {
                (lo.min(d), hi.max(d))
            });
        let range = hi - lo;

        let mut img = GrayImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            let row = (self.height - 1 - y) as u32;
            for x in 0..self.width {
                let value = match resolved[y * self.width + x] {
                    None => 0,
                    Some(_) if range <= 0.0 => 255,
                    Some(d) => to_u8(((d - lo) / range).powf(0.5)),
                };
                img.put_pixel(x as u32, row, Luma([value]));
            }
        }
        img
    }

    pub fn to_image(&self, kind: BufferKind) -> DynamicImage {
        match kind {
            BufferKind::Color => DynamicImage::ImageRgba8(self.color_image()),
            BufferKind::Depth => DynamicImage::ImageLuma8(self.depth_image()),
        }
    }

    /// Per-pixel nearest sample (maximum under reversed-Z), bottom row first.
    /// Pixels with no written sample keep [`DEPTH_CLEAR`].
    pub fn depth_map(&self) -> DepthMap {
        let mut data = vec![DEPTH_CLEAR; self.width * self.height];
        for tile in &self.tiles {
            let r = tile.rect;
            for y in r.y0..r.y1() {
                for x in r.x0..r.x1() {
                    let (_, depths) = tile.pixel_samples(x, y);
                    data[y * self.width + x] = depths.iter().copied().fold(DEPTH_CLEAR, f32::max);
                }
            }
        }
        DepthMap::new(self.width, self.height, data)
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_test_is_strict() {
        let rect = TileRect { x0: 0, y0: 0, width: 2, height: 2 };
        let mut tile = TileSurface::new(rect, 1, Vec4::W);
        let idx = tile.sample_index(1, 1, 0);

        assert!(tile.depth_test(idx, 0.0));
        tile.write_depth(idx, 0.5);
        assert!(!tile.depth_test(idx, 0.5));
        assert!(!tile.depth_test(idx, 0.4));
        assert!(tile.depth_test(idx, 0.6));
    }

    #[test]
    fn blend_is_alpha_over_and_forces_opaque() {
        let rect = TileRect { x0: 0, y0: 0, width: 1, height: 1 };
        let mut tile = TileSurface::new(rect, 1, Vec4::new(0.0, 0.0, 1.0, 1.0));
        tile.blend(0, Vec4::new(1.0, 0.0, 0.0, 0.5));
        let c = tile.color_at(0);
        assert_eq!(c, Vec4::new(0.5, 0.0, 0.5, 1.0));
    }

    #[test]
    fn clear_resets_selected_buffers() {
        let mut fb = Framebuffer::new(40, 40, 2, 16, Vec3::new(0.25, 0.5, 0.75));
        let tile = &mut fb.tiles_mut()[3];
        let idx = tile.sample_index(tile.rect.x0, tile.rect.y0, 2);
        tile.write_depth(idx, 0.3);
        tile.blend(idx, Vec4::ONE);

        let (x, y) = (fb.tiles()[3].rect.x0, fb.tiles()[3].rect.y0);
        fb.clear(Buffers::COLOR);
        assert_eq!(fb.sample_color(x, y, 2), Vec4::new(0.25, 0.5, 0.75, 1.0));
        assert_eq!(fb.sample_depth(x, y, 2), 0.3);

        fb.clear(Buffers::DEPTH);
        assert_eq!(fb.sample_depth(x, y, 2), DEPTH_CLEAR);
    }

    #[test]
    fn identical_samples_resolve_exactly() {
        let mut fb = Framebuffer::new(4, 4, 3, 4, Vec3::ZERO);
        let color = Vec4::new(0.25, 0.5, 0.125, 1.0);
        let tile = &mut fb.tiles_mut()[0];
        for s in 0..9 {
            let idx = tile.sample_index(2, 1, s);
            tile.blend(idx, color);
        }
        assert_eq!(fb.resolve_pixel(2, 1), color);

        let img = fb.color_image();
        // buffer row 1 is image row 2
        assert_eq!(img.get_pixel(2, 2).0, [64, 128, 32, 255]);
        assert_eq!(img.get_pixel(2, 1).0, [0, 0, 0, 255]);
    }

    #[test]
    fn depth_image_normalises_valid_samples_only() {
        let mut fb = Framebuffer::new(3, 1, 1, 8, Vec3::ZERO);
        let tile = &mut fb.tiles_mut()[0];
        tile.write_depth(0, 0.2);
        tile.write_depth(1, 0.6);

        let img = fb.depth_image();
        assert_eq!(img.get_pixel(0, 0).0, [0]);
        assert_eq!(img.get_pixel(1, 0).0, [255]);
        assert_eq!(img.get_pixel(2, 0).0, [0]);
    }

    #[test]
    fn uniform_depth_maps_to_white() {
        let mut fb = Framebuffer::new(2, 1, 1, 8, Vec3::ZERO);
        fb.tiles_mut()[0].write_depth(0, 0.4);
        let img = fb.depth_image();
        assert_eq!(img.get_pixel(0, 0).0, [255]);
        assert_eq!(img.get_pixel(1, 0).0, [0]);
    }

    #[test]
    fn depth_map_keeps_nearest_sample() {
        let mut fb = Framebuffer::new(2, 2, 2, 8, Vec3::ZERO);
        let tile = &mut fb.tiles_mut()[0];
        let a = tile.sample_index(1, 0, 0);
        let b = tile.sample_index(1, 0, 3);
        tile.write_depth(a, 0.2);
        tile.write_depth(b, 0.7);

        let map = fb.depth_map();
        assert_eq!(map.texel(1, 0), 0.7);
        assert_eq!(map.texel(0, 0), DEPTH_CLEAR);
    }
}
