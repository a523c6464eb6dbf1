/// Per-face lighting evaluated once at the face centroid.
use super::{compute_lighting, Fragment, Shader, ShaderContext};
use crate::geometry::{Mesh, Vertex};
use glam::Vec3;

/// Lights each face once with its geometric world-space normal.
/// The color is cached per face so the second and third corners are free.
#[derive(Clone, Debug, Default)]
pub struct FlatShader {
    cached: Option<(usize, Vec3)>,
}

impl FlatShader {
    fn face_color(&mut self, ctx: &ShaderContext<'_>, mesh: &Mesh, face: usize) -> Vec3 {
        if let Some((cached_face, color)) = self.cached {
            if cached_face == face {
                return color;
            }
        }

        let p0 = ctx.world_position(mesh.corner_position(face, 0));
        let p1 = ctx.world_position(mesh.corner_position(face, 1));
        let p2 = ctx.world_position(mesh.corner_position(face, 2));
        let normal = (p1 - p0).cross(p2 - p0).normalize_or_zero();
        let centroid = (p0 + p1 + p2) / 3.0;

        let color = compute_lighting(ctx, centroid, normal, Vec3::ONE, Vec3::ONE)
            .clamp(Vec3::ZERO, Vec3::ONE);
        self.cached = Some((face, color));
        color
    }
}

impl Shader for FlatShader {
    fn prepare(&mut self) {
        self.cached = None;
    }

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
        v.color = self.face_color(ctx, mesh, face);
        v
    }

    fn fragment(&self, _ctx: &ShaderContext<'_>, v: &Vertex) -> Fragment {
        Fragment::Shaded(v.color.extend(1.0))
    }
}
