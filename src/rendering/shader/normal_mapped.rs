/// Texture-driven shaders: world-space normal maps, and the standard
/// material shader with diffuse, specular and tangent-space normal maps.
use super::{compute_lighting, Fragment, Shader, ShaderContext};
use crate::geometry::{Mesh, Vertex};
use crate::material::MaterialFeatures;
use glam::{Mat3, Vec3, Vec4};

/// Decode an RGB texel into a unit-range direction.
#[inline]
fn decode_normal(texel: Vec4) -> Vec3 {
    texel.truncate() * 2.0 - Vec3::ONE
}

/// Lights with a world-space normal map and white surface colors.
#[derive(Copy, Clone, Debug, Default)]
pub struct NormalShader;

impl Shader for NormalShader {
    fn vertex(
        &mut self,
        ctx: &ShaderContext<'_>,
        mesh: &Mesh,
        face: usize,
        corner: usize,
    ) -> Vertex {
        let object_pos = mesh.corner_position(face, corner);
        let mut v = Vertex::from_clip(ctx.clip_position(object_pos));
        v.world_pos = ctx.world_position(object_pos);
        v.uv = mesh.corner_uv(face, corner);
        v
    }

    fn fragment(&self, ctx: &ShaderContext<'_>, v: &Vertex) -> Fragment {
        let Some(map) = ctx.textures.normal else {
            return Fragment::Discard;
        };
        let n = decode_normal(map.sample(v.uv)).normalize_or_zero();
        let color = compute_lighting(ctx, v.world_pos, n, Vec3::ONE, Vec3::ONE);
        Fragment::Shaded(color.extend(1.0))
    }

    fn required_features(&self) -> MaterialFeatures {
        MaterialFeatures::NORMAL_MAP
    }
}

/// Full material shader.
///
/// Normal source, first match wins: world-space normal map, tangent-space
/// normal map through a per-fragment TBN basis, interpolated normal.
/// `normal_bias` is added to the interpolated normal before the basis is
/// built; the `eye` variant uses it to tilt highlights forward.
#[derive(Copy, Clone, Debug)]
pub struct StandardShader {
    pub normal_bias: Vec3,
}

impl Default for StandardShader {
    fn default() -> Self {
        Self::standard()
    }
}

impl StandardShader {
    pub fn standard() -> Self {
        Self {
            normal_bias: Vec3::ZERO,
        }
    }

    pub fn eye() -> Self {
        Self {
            normal_bias: Vec3::new(0.0, 0.0, 0.1),
        }
    }

    fn shading_normal(&self, ctx: &ShaderContext<'_>, v: &Vertex) -> Vec3 {
        let material = ctx.material;
        if material.has_feature(MaterialFeatures::NORMAL_MAP) {
            if let Some(map) = ctx.textures.normal {
                return decode_normal(map.sample(v.uv));
            }
        }
        if material.has_feature(MaterialFeatures::TANGENT_NORMAL_MAP) {
            if let Some(map) = ctx.textures.tangent_normal {
                let local = decode_normal(map.sample(v.uv));

                // interpolation breaks orthogonality, redo Gram-Schmidt
                let n = (v.normal + self.normal_bias).normalize_or_zero();
                let t = v.tangent.normalize_or_zero();
                let t = (t - n * t.dot(n)).normalize_or_zero();
                let b = n.cross(t).normalize_or_zero();

                return Mat3::from_cols(t, b, n) * local;
            }
        }
        v.normal
    }
}

impl Shader for StandardShader {
    fn vertex(
        &mut self,
        ctx: &ShaderContext<'_>,
        mesh: &Mesh,
        face: usize,
        corner: usize,
    ) -> Vertex {
        let object_pos = mesh.corner_position(face, corner);
        let mut v = Vertex::from_clip(ctx.clip_position(object_pos));
        v.world_pos = ctx.world_position(object_pos);
        v.uv = mesh.corner_uv(face, corner);
        v.normal = ctx.world_normal(mesh.corner_normal(face, corner));

        if ctx.material.has_feature(MaterialFeatures::TANGENT_NORMAL_MAP) {
            let t = ctx
                .model
                .transform_vector3(mesh.corner_tangent(face, corner))
                .normalize_or_zero();
            v.tangent = (t - v.normal * t.dot(v.normal)).normalize_or_zero();
            v.bitangent = v.normal.cross(v.tangent).normalize_or_zero();
        }
        v
    }

    fn fragment(&self, ctx: &ShaderContext<'_>, v: &Vertex) -> Fragment {
        let n = self.shading_normal(ctx, v).normalize_or_zero();
        let diffuse = ctx.diffuse_color(v.uv);
        let specular = ctx.specular_color(v.uv);
        let color = compute_lighting(ctx, v.world_pos, n, diffuse.truncate(), specular);
        Fragment::Shaded(color.extend(diffuse.w))
    }
}
