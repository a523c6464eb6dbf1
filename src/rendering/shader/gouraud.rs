/// Per-vertex lighting, interpolated across the face.
use super::{compute_lighting, Fragment, Shader, ShaderContext};
use crate::geometry::{Mesh, Vertex};
use glam::Vec3;

#[derive(Copy, Clone, Debug, Default)]
pub struct GouraudShader;

impl Shader for GouraudShader {
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
        v.color = compute_lighting(ctx, v.world_pos, v.normal, Vec3::ONE, Vec3::ONE);
        v
    }

    fn fragment(&self, _ctx: &ShaderContext<'_>, v: &Vertex) -> Fragment {
        Fragment::Shaded(v.color.extend(1.0))
    }
}
