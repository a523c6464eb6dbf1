/// RGBA8 textures with configurable filtering and wrapping.
use crate::error::RenderError;
use glam::{Vec2, Vec4};
use image::{imageops, Rgba, RgbaImage};
use std::path::Path;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    Bilinear,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    Clamp,
    Mirror,
}

pub struct Texture {
    /// Stored bottom-up so that `v = 0` addresses row 0.
    image: RgbaImage,
    pub interpolation: Interpolation,
    pub wrap: WrapMode,
}

impl Texture {
    /// Wrap an image whose first row is the top of the picture.
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image: imageops::flip_vertical(&image),
            interpolation: Interpolation::Bilinear,
            wrap: WrapMode::Repeat,
        }
    }

    /// Decode an image file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let image = image::open(path)?.to_rgba8();
        log::info!(
            "Texture loaded: {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::from_image(image))
    }

    /// Single-color 1x1 texture.
    pub fn solid(color: [u8; 4]) -> Self {
        Self::from_image(RgbaImage::from_pixel(1, 1, Rgba(color)))
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Map a texture coordinate into `[0, 1]` according to the wrap mode.
    #[inline]
    pub fn wrap_coord(&self, v: f32) -> f32 {
        match self.wrap {
            WrapMode::Repeat => v - v.floor(),
            WrapMode::Clamp => v.clamp(0.0, 1.0),
            WrapMode::Mirror => {
                let period = v.floor();
                let frac = v - period;
                if (period as i64).rem_euclid(2) == 0 {
                    frac
                } else {
                    1.0 - frac
                }
            }
        }
    }

    #[inline]
    fn texel(&self, x: u32, y: u32) -> Vec4 {
        let Rgba([r, g, b, a]) = *self.image.get_pixel(x, y);
        Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
    }

    /// Sample at `uv`, returning RGBA in `[0, 1]`.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let w = self.width();
        let h = self.height();
        match self.interpolation {
            Interpolation::Nearest => {
                let x = ((self.wrap_coord(uv.x) * w as f32) as u32).min(w - 1);
                let y = ((self.wrap_coord(uv.y) * h as f32) as u32).min(h - 1);
                self.texel(x, y)
            }
            Interpolation::Bilinear => {
                let u = self.wrap_coord(uv.x) * (w - 1) as f32;
                let v = self.wrap_coord(uv.y) * (h - 1) as f32;

                let x0 = u.floor() as u32;
                let y0 = v.floor() as u32;
                let x1 = (x0 + 1).min(w - 1);
                let y1 = (y0 + 1).min(h - 1);

                let tx = u - x0 as f32;
                let ty = v - y0 as f32;

                let top = self.texel(x0, y0).lerp(self.texel(x1, y0), tx);
                let bottom = self.texel(x0, y1).lerp(self.texel(x1, y1), tx);
                top.lerp(bottom, ty)
            }
        }
    }
}
