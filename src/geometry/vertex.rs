/// Per-vertex attributes and barycentric interpolation.
use glam::{Vec2, Vec3, Vec4};
use std::ops::{Index, IndexMut};

/// Output of a vertex stage and input of a fragment stage.
///
/// `pos` is clip space when produced by a shader. After triangle setup it
/// holds screen `x, y`, reversed-Z depth `z` and the original clip `w`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vertex {
    pub pos: Vec4,
    pub world_pos: Vec3,
    pub color: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub bitangent: Vec3,
}

impl Vertex {
    /// Vertex carrying only a clip-space position.
    #[inline]
    pub fn from_clip(pos: Vec4) -> Self {
        Self {
            pos,
            ..Self::default()
        }
    }

    /// Interpolate every attribute except `pos` with the given weights.
    /// Callers set `pos` themselves.
    #[inline]
    pub fn lerp(alpha: f32, beta: f32, gamma: f32, tri: &Triangle) -> Self {
        let [a, b, c] = &tri.v;
        Self {
            pos: Vec4::ZERO,
            world_pos: a.world_pos * alpha + b.world_pos * beta + c.world_pos * gamma,
            color: a.color * alpha + b.color * beta + c.color * gamma,
            uv: a.uv * alpha + b.uv * beta + c.uv * gamma,
            normal: a.normal * alpha + b.normal * beta + c.normal * gamma,
            tangent: a.tangent * alpha + b.tangent * beta + c.tangent * gamma,
            bitangent: a.bitangent * alpha + b.bitangent * beta + c.bitangent * gamma,
        }
    }

    /// Linear blend between two vertices, position included.
    /// Used when clipping in clip space, where attributes are still affine.
    #[inline]
    pub fn mix(a: &Vertex, b: &Vertex, t: f32) -> Self {
        Self {
            pos: a.pos + (b.pos - a.pos) * t,
            world_pos: a.world_pos.lerp(b.world_pos, t),
            color: a.color.lerp(b.color, t),
            uv: a.uv.lerp(b.uv, t),
            normal: a.normal.lerp(b.normal, t),
            tangent: a.tangent.lerp(b.tangent, t),
            bitangent: a.bitangent.lerp(b.bitangent, t),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Triangle {
    pub v: [Vertex; 3],
}

impl Triangle {
    pub fn new(a: Vertex, b: Vertex, c: Vertex) -> Self {
        Self { v: [a, b, c] }
    }

    /// Signed area of the screen-space projection.
    /// Positive for counter-clockwise winding with y pointing up.
    #[inline]
    pub fn signed_area(&self) -> f32 {
        signed_area(self.v[0].pos, self.v[1].pos, self.v[2].pos)
    }
}

impl Index<usize> for Triangle {
    type Output = Vertex;

    #[inline]
    fn index(&self, i: usize) -> &Vertex {
        &self.v[i]
    }
}

impl IndexMut<usize> for Triangle {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut Vertex {
        &mut self.v[i]
    }
}

/// Signed area of the 2D triangle (a, b, c) using only x and y.
#[inline]
pub fn signed_area(a: Vec4, b: Vec4, c: Vec4) -> f32 {
    0.5 * ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x))
}

/// Turn screen-space barycentrics into perspective-correct weights.
///
/// Equivalent to `w = 1 / (α/w1 + β/w2 + γ/w3)`, `α' = α·w/w1`, written in
/// normalised form so a weight of exactly 1 stays exactly 1.
#[inline]
pub fn perspective_correct(bary: Vec3, inv_w: Vec3) -> Vec3 {
    let scaled = bary * inv_w;
    let sum = scaled.x + scaled.y + scaled.z;
    scaled / sum
}
