/// Programmable vertex and fragment stages.
///
/// A shader is looked up by name from the material of each mesh. The vertex
/// stage runs sequentially during triangle setup and may keep per-mesh
/// caches; the fragment stage runs concurrently from every tile worker and
/// only reads.
pub mod depth;
pub mod flat;
pub mod gouraud;
pub mod normal_mapped;
pub mod phong;

pub use depth::DepthShader;
pub use flat::FlatShader;
pub use gouraud::GouraudShader;
pub use normal_mapped::{NormalShader, StandardShader};
pub use phong::PhongShader;

use super::shadow::{ShadowMapData, ShadowStrategy};
use super::texture::Texture;
use crate::geometry::{Mesh, Vertex};
use crate::material::{Material, MaterialFeatures};
use crate::scene::Light;
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use std::collections::HashMap;

/// Result of a fragment stage for one sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Fragment {
    /// Write depth and alpha-blend this straight-alpha color.
    Shaded(Vec4),
    /// Write depth only.
    DepthOnly,
    /// Leave this sample untouched.
    Discard,
}

/// Textures of the bound material, resolved from the resource pool.
#[derive(Copy, Clone, Default)]
pub struct MaterialTextures<'a> {
    pub diffuse: Option<&'a Texture>,
    pub normal: Option<&'a Texture>,
    pub specular: Option<&'a Texture>,
    pub tangent_normal: Option<&'a Texture>,
}

impl<'a> MaterialTextures<'a> {
    /// Whether the texture behind `feature` is present.
    pub fn has(&self, feature: MaterialFeatures) -> bool {
        match feature {
            f if f == MaterialFeatures::DIFFUSE_MAP => self.diffuse.is_some(),
            f if f == MaterialFeatures::NORMAL_MAP => self.normal.is_some(),
            f if f == MaterialFeatures::SPECULAR_MAP => self.specular.is_some(),
            f if f == MaterialFeatures::TANGENT_NORMAL_MAP => self.tangent_normal.is_some(),
            _ => false,
        }
    }
}

/// Render state visible to shaders during one mesh draw.
#[derive(Copy, Clone)]
pub struct ShaderContext<'a> {
    pub view_projection: Mat4,
    pub model: Mat4,
    /// Inverse-transpose of the model matrix's upper 3x3.
    pub normal_matrix: Mat3,
    pub mvp: Mat4,
    pub eye: Vec3,
    pub lights: &'a [Light],
    /// One entry per light, same order as `lights`.
    pub shadow_maps: &'a [ShadowMapData],
    pub shadow: Option<&'a dyn ShadowStrategy>,
    pub material: &'a Material,
    pub textures: MaterialTextures<'a>,
}

impl<'a> ShaderContext<'a> {
    pub fn new(
        view_projection: Mat4,
        eye: Vec3,
        lights: &'a [Light],
        material: &'a Material,
    ) -> Self {
        Self {
            view_projection,
            model: Mat4::IDENTITY,
            normal_matrix: Mat3::IDENTITY,
            mvp: view_projection,
            eye,
            lights,
            shadow_maps: &[],
            shadow: None,
            material,
            textures: MaterialTextures::default(),
        }
    }

    pub fn with_model(mut self, model: Mat4) -> Self {
        self.model = model;
        self.normal_matrix = Mat3::from_mat4(model).inverse().transpose();
        self.mvp = self.view_projection * model;
        self
    }

    pub fn with_shadows(
        mut self,
        maps: &'a [ShadowMapData],
        strategy: Option<&'a dyn ShadowStrategy>,
    ) -> Self {
        self.shadow_maps = maps;
        self.shadow = strategy;
        self
    }

    pub fn with_material(mut self, material: &'a Material, textures: MaterialTextures<'a>) -> Self {
        self.material = material;
        self.textures = textures;
        self
    }

    #[inline]
    pub fn clip_position(&self, object_pos: Vec3) -> Vec4 {
        self.mvp * object_pos.extend(1.0)
    }

    #[inline]
    pub fn world_position(&self, object_pos: Vec3) -> Vec3 {
        self.model.transform_point3(object_pos)
    }

    #[inline]
    pub fn world_normal(&self, object_normal: Vec3) -> Vec3 {
        (self.normal_matrix * object_normal).normalize_or_zero()
    }

    /// Shadow visibility of `point` for light `light`, 1.0 without shadow data.
    #[inline]
    pub fn visibility(&self, light: usize, point: Vec3, normal: Vec3) -> f32 {
        match (self.shadow, self.shadow_maps.get(light)) {
            (Some(strategy), Some(map)) => strategy.visibility(map, point, normal),
            _ => 1.0,
        }
    }

    /// Material diffuse color modulated by the diffuse map, alpha from the map.
    pub fn diffuse_color(&self, uv: Vec2) -> Vec4 {
        let base = self.material.params.diffuse_color;
        match self.textures.diffuse {
            Some(tex) if self.material.has_feature(MaterialFeatures::DIFFUSE_MAP) => {
                let texel = tex.sample(uv);
                (base * texel.truncate()).extend(texel.w)
            }
            _ => base.extend(1.0),
        }
    }

    /// Specular tint, the red channel of the specular map when present.
    pub fn specular_color(&self, uv: Vec2) -> Vec3 {
        match self.textures.specular {
            Some(tex) if self.material.has_feature(MaterialFeatures::SPECULAR_MAP) => {
                Vec3::splat(tex.sample(uv).x)
            }
            _ => Vec3::ONE,
        }
    }
}

/// Blinn-Phong with inverse-square falloff, summed over every light.
/// Ambient is added per light and never shadowed. The result is not clamped.
pub fn compute_lighting(
    ctx: &ShaderContext<'_>,
    point: Vec3,
    normal: Vec3,
    diffuse_color: Vec3,
    specular_color: Vec3,
) -> Vec3 {
    let params = &ctx.material.params;
    let view = (ctx.eye - point).normalize_or_zero();
    let mut color = Vec3::ZERO;

    for (i, light) in ctx.lights.iter().enumerate() {
        let to_light = light.position - point;
        let r2 = to_light.length_squared();
        let l = to_light.normalize_or_zero();
        let h = (l + view).normalize_or_zero();

        let visibility = ctx.visibility(i, point, normal);
        let falloff = light.intensity / r2;

        let ambient = params.ambient * diffuse_color;
        let diffuse = params.diffuse * falloff * normal.dot(l).max(0.0) * diffuse_color;
        let specular = params.specular
            * falloff
            * normal.dot(h).max(0.0).powf(params.shininess)
            * specular_color;

        color += ambient + (diffuse + specular) * visibility;
    }
    color
}

pub trait Shader: Send + Sync {
    /// Called once before a mesh is drawn. Resets per-mesh state.
    fn prepare(&mut self) {}

    /// Produce the clip-space vertex for `corner` of `face`.
    fn vertex(
        &mut self,
        ctx: &ShaderContext<'_>,
        mesh: &Mesh,
        face: usize,
        corner: usize,
    ) -> Vertex;

    fn fragment(&self, ctx: &ShaderContext<'_>, v: &Vertex) -> Fragment;

    /// Textures the material must provide for this shader to run.
    fn required_features(&self) -> MaterialFeatures {
        MaterialFeatures::empty()
    }
}

/// Shaders addressable by name.
pub struct ShaderRegistry {
    shaders: HashMap<String, Box<dyn Shader>>,
}

impl Default for ShaderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ShaderRegistry {
    pub fn empty() -> Self {
        Self {
            shaders: HashMap::new(),
        }
    }

    /// Registry holding `flat`, `gouraud`, `phong`, `normal`, `standard`, `eye` and `depth`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("flat", FlatShader::default());
        registry.register("gouraud", GouraudShader);
        registry.register("phong", PhongShader);
        registry.register("normal", NormalShader);
        registry.register("standard", StandardShader::standard());
        registry.register("eye", StandardShader::eye());
        registry.register("depth", DepthShader);
        registry
    }

    /// Add or replace a shader.
    pub fn register(&mut self, name: impl Into<String>, shader: impl Shader + 'static) {
        self.shaders.insert(name.into(), Box::new(shader));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shaders.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Shader> {
        self.shaders.get(name).map(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Shader + 'static)> {
        self.shaders.get_mut(name).map(|s| s.as_mut())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.shaders.keys().map(String::as_str)
    }
}
