/// Shadow-map lookups: depth-map sampling, hard shadows and PCSS.
///
/// Maps store reversed-Z depth (near = 1) with the bottom row first, the
/// same layout the framebuffer uses. A texel nothing was drawn into reads
/// as 0.0, the far plane, so it never occludes.
use super::framebuffer::DEPTH_CLEAR;
use crate::config::{ShadowConfig, ShadowMode};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Sixteen-tap Poisson disk on the unit circle.
pub const POISSON_DISK: [Vec2; 16] = [
    Vec2::new(-0.942_016_24, -0.399_062_16),
    Vec2::new(0.945_586_09, -0.768_907_25),
    Vec2::new(-0.094_184_101, -0.929_388_7),
    Vec2::new(0.344_959_38, 0.293_877_6),
    Vec2::new(-0.915_885_81, 0.457_714_32),
    Vec2::new(-0.815_442_32, -0.879_124_64),
    Vec2::new(-0.382_775_43, 0.276_768_45),
    Vec2::new(0.974_843_98, 0.756_483_79),
    Vec2::new(0.443_233_25, -0.975_115_54),
    Vec2::new(0.537_429_81, -0.473_734_2),
    Vec2::new(-0.264_969_11, -0.418_930_23),
    Vec2::new(0.791_975_14, 0.190_901_88),
    Vec2::new(-0.241_888_4, 0.997_065_07),
    Vec2::new(-0.814_099_55, 0.914_375_9),
    Vec2::new(0.199_841_26, 0.786_413_67),
    Vec2::new(0.143_831_61, -0.141_007_9),
];

/// Single-channel depth texture produced by a light's depth pass.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthMap {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl DepthMap {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    /// Map filled with one depth value.
    pub fn filled(width: usize, height: usize, depth: f32) -> Self {
        Self::new(width, height, vec![depth; width * height])
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw stored value, sentinel included.
    #[inline]
    pub fn texel(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set_texel(&mut self, x: usize, y: usize, depth: f32) {
        self.data[y * self.width + x] = depth;
    }

    /// Clamped fetch with the sentinel read as the far plane.
    #[inline]
    fn fetch(&self, x: i64, y: i64) -> f32 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let d = self.texel(x, y);
        if d == DEPTH_CLEAR {
            0.0
        } else {
            d
        }
    }

    pub fn sample_nearest(&self, uv: Vec2) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let x = (uv.x * self.width as f32).clamp(-1.0, self.width as f32);
        let y = (uv.y * self.height as f32).clamp(-1.0, self.height as f32);
        self.fetch(x.floor() as i64, y.floor() as i64)
    }

    /// Bilinear filter between the four nearest texel centers.
    pub fn sample_bilinear(&self, uv: Vec2) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        // keeps the texel indices and their +1 neighbours in range
        let fx = (uv.x * self.width as f32 - 0.5).clamp(-1.0, self.width as f32);
        let fy = (uv.y * self.height as f32 - 0.5).clamp(-1.0, self.height as f32);
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let d00 = self.fetch(x0, y0);
        let d10 = self.fetch(x0 + 1, y0);
        let d01 = self.fetch(x0, y0 + 1);
        let d11 = self.fetch(x0 + 1, y0 + 1);

        let bottom = d00 + (d10 - d00) * tx;
        let top = d01 + (d11 - d01) * tx;
        bottom + (top - bottom) * ty
    }
}

/// Depth map of one light together with the transform that produced it.
#[derive(Clone, Debug)]
pub struct ShadowMapData {
    pub depth: DepthMap,
    pub light_view_projection: Mat4,
}

impl ShadowMapData {
    pub fn new(depth: DepthMap, light_view_projection: Mat4) -> Self {
        Self {
            depth,
            light_view_projection,
        }
    }

    /// Shadow-map uv and reversed-Z depth of a world-space point.
    ///
    /// `None` for points on or behind the light's eye plane, which the map
    /// cannot see and so never shadows.
    #[inline]
    pub fn project(&self, world_pos: Vec3) -> Option<(Vec2, f32)> {
        let p = self.light_view_projection * world_pos.extend(1.0);
        if p.w.is_nan() || p.w <= f32::EPSILON {
            return None;
        }
        let proj = p.truncate() / p.w;
        if !proj.is_finite() {
            return None;
        }
        let uv = (proj.truncate() + Vec2::ONE) * 0.5;
        let z = (1.0 - proj.z) * 0.5;
        Some((uv, z))
    }
}

/// Per-light visibility of a surface point, in `[0, 1]`.
pub trait ShadowStrategy: Send + Sync {
    fn visibility(&self, map: &ShadowMapData, world_pos: Vec3, normal: Vec3) -> f32;
}

/// One nearest lookup, no bias. The depth pass culls front faces instead.
#[derive(Copy, Clone, Debug, Default)]
pub struct HardShadow;

impl ShadowStrategy for HardShadow {
    fn visibility(&self, map: &ShadowMapData, world_pos: Vec3, _normal: Vec3) -> f32 {
        let Some((uv, z)) = map.project(world_pos) else {
            return 1.0;
        };
        if z < map.depth.sample_nearest(uv) {
            0.0
        } else {
            1.0
        }
    }
}

/// Percentage-closer soft shadow parameters, all in uv units.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcssConfig {
    pub search_radius: f32,
    pub light_size: f32,
    pub min_penumbra: f32,
    pub max_penumbra: f32,
}

impl Default for PcssConfig {
    fn default() -> Self {
        Self {
            search_radius: 0.01,
            light_size: 0.025,
            min_penumbra: 0.0005,
            max_penumbra: 0.02,
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct PcssShadow {
    pub config: PcssConfig,
}

impl PcssShadow {
    pub fn new(config: PcssConfig) -> Self {
        Self { config }
    }
}

impl ShadowStrategy for PcssShadow {
    fn visibility(&self, map: &ShadowMapData, world_pos: Vec3, _normal: Vec3) -> f32 {
        let Some((uv, z)) = map.project(world_pos) else {
            return 1.0;
        };
        let cfg = &self.config;

        // blocker search
        let mut blocker_sum = 0.0;
        let mut blockers = 0u32;
        for offset in POISSON_DISK {
            let d = map.depth.sample_bilinear(uv + offset * cfg.search_radius);
            if z < d {
                blocker_sum += d;
                blockers += 1;
            }
        }
        if blockers == 0 {
            return 1.0;
        }
        let avg = blocker_sum / blockers as f32;

        let penumbra =
            ((avg - z) / avg * cfg.light_size).clamp(cfg.min_penumbra, cfg.max_penumbra);

        let lit = POISSON_DISK
            .iter()
            .filter(|&&offset| !(z < map.depth.sample_bilinear(uv + offset * penumbra)))
            .count();
        lit as f32 / POISSON_DISK.len() as f32
    }
}

/// Strategy selected by a shadow configuration, `None` when shadows are off.
pub fn strategy_for(config: &ShadowConfig) -> Option<Box<dyn ShadowStrategy>> {
    match config.mode {
        ShadowMode::None => None,
        ShadowMode::Hard => Some(Box::new(HardShadow)),
        ShadowMode::Pcss => Some(Box::new(PcssShadow::new(config.pcss))),
    }
}
