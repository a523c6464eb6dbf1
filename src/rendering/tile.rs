/// Screen tiling and per-tile triangle binning.
///
/// The surface is split into `tile_size`² tiles (edge tiles are smaller).
/// Each tile keeps a list of the screen triangles whose bounding box touches
/// it. The lists are cleared and refilled for every mesh, so their
/// allocations survive across draws.
use crate::geometry::Triangle;

pub const DEFAULT_TILE_SIZE: usize = 32;

/// Pixel rectangle covered by one tile, in buffer coordinates (y up).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileRect {
    pub x0: usize,
    pub y0: usize,
    pub width: usize,
    pub height: usize,
}

impl TileRect {
    #[inline]
    pub fn x1(&self) -> usize {
        self.x0 + self.width
    }

    #[inline]
    pub fn y1(&self) -> usize {
        self.y0 + self.height
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x0 && x < self.x1() && y >= self.y0 && y < self.y1()
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

/// Inclusive pixel bounds of a screen triangle, clamped to the surface.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl PixelBounds {
    /// Bounds of a triangle already in screen space.
    /// Returns `None` when the box lies entirely outside the surface.
    pub fn of_triangle(tri: &Triangle, width: usize, height: usize) -> Option<Self> {
        let (a, b, c) = (tri[0].pos, tri[1].pos, tri[2].pos);
        let min_x = a.x.min(b.x).min(c.x).floor();
        let min_y = a.y.min(b.y).min(c.y).floor();
        let max_x = a.x.max(b.x).max(c.x).floor();
        let max_y = a.y.max(b.y).max(c.y).floor();

        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return None;
        }
        if max_x < 0.0 || max_y < 0.0 || min_x >= width as f32 || min_y >= height as f32 {
            return None;
        }

        Some(Self {
            min_x: min_x.max(0.0) as usize,
            min_y: min_y.max(0.0) as usize,
            max_x: (max_x as usize).min(width - 1),
            max_y: (max_y as usize).min(height - 1),
        })
    }

    /// Overlap with a tile as half-open ranges `(x0..x1, y0..y1)`.
    #[inline]
    pub fn clip_to(&self, rect: &TileRect) -> Option<(usize, usize, usize, usize)> {
        let x0 = self.min_x.max(rect.x0);
        let y0 = self.min_y.max(rect.y0);
        let x1 = (self.max_x + 1).min(rect.x1());
        let y1 = (self.max_y + 1).min(rect.y1());
        if x0 >= x1 || y0 >= y1 {
            None
        } else {
            Some((x0, y0, x1, y1))
        }
    }
}

/// Static layout of the tile grid over a `width` × `height` surface.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    pub width: usize,
    pub height: usize,
    pub tile_size: usize,
    pub tiles_x: usize,
    pub tiles_y: usize,
}

impl TileGrid {
    pub fn new(width: usize, height: usize, tile_size: usize) -> Self {
        let tile_size = tile_size.max(1);
        Self {
            width,
            height,
            tile_size,
            tiles_x: (width + tile_size - 1) / tile_size,
            tiles_y: (height + tile_size - 1) / tile_size,
        }
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.tiles_x * self.tiles_y
    }

    #[inline]
    pub fn tile_index(&self, tile_x: usize, tile_y: usize) -> usize {
        tile_y * self.tiles_x + tile_x
    }

    /// Tile containing pixel `(x, y)`.
    #[inline]
    pub fn tile_of(&self, x: usize, y: usize) -> usize {
        self.tile_index(x / self.tile_size, y / self.tile_size)
    }

    pub fn tile_rect(&self, tile_x: usize, tile_y: usize) -> TileRect {
        let x0 = tile_x * self.tile_size;
        let y0 = tile_y * self.tile_size;
        TileRect {
            x0,
            y0,
            width: (x0 + self.tile_size).min(self.width) - x0,
            height: (y0 + self.tile_size).min(self.height) - y0,
        }
    }

    /// All tile rectangles in row-major tile order.
    pub fn rects(&self) -> impl Iterator<Item = TileRect> + '_ {
        (0..self.tiles_y)
            .flat_map(move |ty| (0..self.tiles_x).map(move |tx| self.tile_rect(tx, ty)))
    }
}

/// Per-tile lists of triangle indices.
pub struct TileBins {
    grid: TileGrid,
    bins: Vec<Vec<u32>>,
}

impl TileBins {
    pub fn new(grid: TileGrid) -> Self {
        Self {
            grid,
            bins: vec![Vec::new(); grid.tile_count()],
        }
    }

    #[inline]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Empty every bin, keeping the allocations.
    pub fn clear(&mut self) {
        for bin in &mut self.bins {
            bin.clear();
        }
    }

    /// Add `triangle` to every tile its bounds overlap.
    pub fn insert(&mut self, triangle: u32, bounds: &PixelBounds) {
        let ts = self.grid.tile_size;
        let start_x = bounds.min_x / ts;
        let start_y = bounds.min_y / ts;
        let end_x = (bounds.max_x / ts).min(self.grid.tiles_x - 1);
        let end_y = (bounds.max_y / ts).min(self.grid.tiles_y - 1);

        for ty in start_y..=end_y {
            for tx in start_x..=end_x {
                let idx = self.grid.tile_index(tx, ty);
                self.bins[idx].push(triangle);
            }
        }
    }

    #[inline]
    pub fn get_bin(&self, tile_x: usize, tile_y: usize) -> &[u32] {
        &self.bins[self.grid.tile_index(tile_x, tile_y)]
    }

    /// Bins in the same order as [`TileGrid::rects`].
    #[inline]
    pub fn bins(&self) -> &[Vec<u32>] {
        &self.bins
    }

    /// Total number of (triangle, tile) entries.
    pub fn entry_count(&self) -> usize {
        self.bins.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vertex;
    use glam::Vec4;

    fn screen_tri(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> Triangle {
        let v = |(x, y): (f32, f32)| Vertex::from_clip(Vec4::new(x, y, 0.5, 1.0));
        Triangle::new(v(a), v(b), v(c))
    }

    #[test]
    fn grid_dimensions_round_up() {
        let grid = TileGrid::new(100, 70, 32);
        assert_eq!(grid.tiles_x, 4);
        assert_eq!(grid.tiles_y, 3);
        assert_eq!(grid.tile_count(), 12);

        let edge = grid.tile_rect(3, 2);
        assert_eq!(edge, TileRect { x0: 96, y0: 64, width: 4, height: 6 });

        let covered: usize = grid.rects().map(|r| r.pixel_count()).sum();
        assert_eq!(covered, 100 * 70);
    }

    #[test]
    fn small_triangle_lands_in_one_tile() {
        let grid = TileGrid::new(128, 128, 32);
        let mut bins = TileBins::new(grid);
        let tri = screen_tri((2.0, 2.0), (20.0, 2.0), (2.0, 20.0));
        let bounds = PixelBounds::of_triangle(&tri, 128, 128).unwrap();

        bins.insert(0, &bounds);
        assert_eq!(bins.get_bin(0, 0), &[0]);
        assert!(bins.get_bin(1, 0).is_empty());
        assert_eq!(bins.entry_count(), 1);
    }

    #[test]
    fn triangle_crossing_tiles_is_replicated() {
        let grid = TileGrid::new(128, 128, 32);
        let mut bins = TileBins::new(grid);
        let tri = screen_tri((16.0, 16.0), (48.0, 16.0), (16.0, 48.0));
        let bounds = PixelBounds::of_triangle(&tri, 128, 128).unwrap();

        bins.insert(7, &bounds);
        assert_eq!(bins.get_bin(0, 0), &[7]);
        assert_eq!(bins.get_bin(1, 0), &[7]);
        assert_eq!(bins.get_bin(0, 1), &[7]);
        assert_eq!(bins.get_bin(1, 1), &[7]);
        assert!(bins.get_bin(2, 0).is_empty());
        assert_eq!(bins.entry_count(), 4);
    }

    #[test]
    fn offscreen_triangle_has_no_bounds() {
        let tri = screen_tri((-30.0, -30.0), (-10.0, -30.0), (-10.0, -5.0));
        assert!(PixelBounds::of_triangle(&tri, 64, 64).is_none());

        let tri = screen_tri((70.0, 10.0), (90.0, 10.0), (80.0, 30.0));
        assert!(PixelBounds::of_triangle(&tri, 64, 64).is_none());
    }

    #[test]
    fn bounds_are_clamped_to_surface() {
        let tri = screen_tri((-10.0, -10.0), (200.0, -10.0), (-10.0, 200.0));
        let b = PixelBounds::of_triangle(&tri, 64, 48).unwrap();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (0, 0, 63, 47));
    }

    #[test]
    fn clear_keeps_capacity() {
        let grid = TileGrid::new(64, 64, 32);
        let mut bins = TileBins::new(grid);
        let full = PixelBounds { min_x: 0, min_y: 0, max_x: 63, max_y: 63 };
        for i in 0..10 {
            bins.insert(i, &full);
        }
        let cap = bins.bins()[0].capacity();
        bins.clear();
        assert_eq!(bins.entry_count(), 0);
        assert_eq!(bins.bins()[0].capacity(), cap);
    }

    #[test]
    fn clip_to_tile_is_half_open() {
        let b = PixelBounds { min_x: 30, min_y: 0, max_x: 40, max_y: 5 };
        let rect = TileRect { x0: 32, y0: 0, width: 32, height: 32 };
        assert_eq!(b.clip_to(&rect), Some((32, 0, 41, 6)));

        let left = TileRect { x0: 0, y0: 0, width: 30, height: 32 };
        assert_eq!(b.clip_to(&left), None);
    }
}
