/// Depth-only pass used to build shadow maps.
use super::{Fragment, Shader, ShaderContext};
use crate::geometry::{Mesh, Vertex};

#[derive(Copy, Clone, Debug, Default)]
pub struct DepthShader;

impl Shader for DepthShader {
    fn vertex(
        &mut self,
        ctx: &ShaderContext<'_>,
        mesh: &Mesh,
        face: usize,
        corner: usize,
    ) -> Vertex {
        Vertex::from_clip(ctx.clip_position(mesh.corner_position(face, corner)))
    }

    fn fragment(&self, _ctx: &ShaderContext<'_>, _v: &Vertex) -> Fragment {
        Fragment::DepthOnly
    }
}
