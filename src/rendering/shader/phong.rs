/// Per-fragment lighting from the interpolated normal.
use super::{compute_lighting, Fragment, Shader, ShaderContext};
use crate::geometry::{Mesh, Vertex};
use glam::Vec3;

#[derive(Copy, Clone, Debug, Default)]
pub struct PhongShader;

impl Shader for PhongShader {
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
        v.normal = ctx.world_normal(mesh.corner_normal(face, corner));
        v
    }

    fn fragment(&self, ctx: &ShaderContext<'_>, v: &Vertex) -> Fragment {
        let n = v.normal.normalize_or_zero();
        let color = compute_lighting(ctx, v.world_pos, n, Vec3::ONE, Vec3::ONE);
        Fragment::Shaded(color.extend(1.0))
    }
}
