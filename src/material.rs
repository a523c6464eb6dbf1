/// Surface description shared by every mesh that references it.
use crate::scene::TextureId;
use bitflags::bitflags;
use glam::Vec3;

/// Index into [`crate::scene::Resources`] materials.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaterialId(pub usize);

bitflags! {
    /// Texture features a material opts into. A set flag means the matching
    /// texture id must resolve, or the draw is rejected.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct MaterialFeatures: u32 {
        const DIFFUSE_MAP = 1 << 0;
        const NORMAL_MAP = 1 << 1;
        const SPECULAR_MAP = 1 << 2;
        const TANGENT_NORMAL_MAP = 1 << 3;
    }
}

/// Blinn-Phong coefficients.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MaterialParams {
    pub diffuse_color: Vec3,
    /// ka
    pub ambient: Vec3,
    /// kd
    pub diffuse: Vec3,
    /// ks
    pub specular: Vec3,
    pub shininess: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            diffuse_color: Vec3::ONE,
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.4),
            specular: Vec3::splat(0.7),
            shininess: 64.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Registry name of the shader that renders this material.
    pub shader: String,
    pub params: MaterialParams,
    pub features: MaterialFeatures,
    pub diffuse_map: Option<TextureId>,
    pub normal_map: Option<TextureId>,
    pub specular_map: Option<TextureId>,
    pub tangent_normal_map: Option<TextureId>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            shader: "standard".to_string(),
            params: MaterialParams::default(),
            features: MaterialFeatures::empty(),
            diffuse_map: None,
            normal_map: None,
            specular_map: None,
            tangent_normal_map: None,
        }
    }
}

impl Material {
    pub fn new(shader: impl Into<String>) -> Self {
        Self {
            shader: shader.into(),
            ..Self::default()
        }
    }

    pub fn with_params(mut self, params: MaterialParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_diffuse_map(mut self, id: TextureId) -> Self {
        self.diffuse_map = Some(id);
        self.features |= MaterialFeatures::DIFFUSE_MAP;
        self
    }

    pub fn with_normal_map(mut self, id: TextureId) -> Self {
        self.normal_map = Some(id);
        self.features |= MaterialFeatures::NORMAL_MAP;
        self
    }

    pub fn with_specular_map(mut self, id: TextureId) -> Self {
        self.specular_map = Some(id);
        self.features |= MaterialFeatures::SPECULAR_MAP;
        self
    }

    pub fn with_tangent_normal_map(mut self, id: TextureId) -> Self {
        self.tangent_normal_map = Some(id);
        self.features |= MaterialFeatures::TANGENT_NORMAL_MAP;
        self
    }

    #[inline]
    pub fn has_feature(&self, feature: MaterialFeatures) -> bool {
        self.features.contains(feature)
    }
}
