/// Indexed triangle meshes as produced by an OBJ-style loader.
use crate::material::MaterialId;
use glam::{Vec2, Vec3};

/// Per-corner indices into a mesh's attribute arrays.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Face {
    pub position: [usize; 3],
    pub normal: [usize; 3],
    pub uv: [usize; 3],
}

impl Face {
    /// Face whose corners use the same index for every attribute.
    pub fn uniform(indices: [usize; 3]) -> Self {
        Self {
            position: indices,
            normal: indices,
            uv: indices,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub name: String,
    pub material: MaterialId,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// Per-position tangents, filled by [`Mesh::compute_tangents`].
    pub tangents: Vec<Vec3>,
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, material: MaterialId) -> Self {
        Self {
            name: name.into(),
            material,
            ..Self::default()
        }
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    #[inline]
    pub fn corner_position(&self, face: usize, corner: usize) -> Vec3 {
        self.positions[self.faces[face].position[corner]]
    }

    /// Vertex normal, or the geometric face normal when the mesh has none.
    #[inline]
    pub fn corner_normal(&self, face: usize, corner: usize) -> Vec3 {
        if self.normals.is_empty() {
            self.face_normal(face)
        } else {
            self.normals[self.faces[face].normal[corner]]
        }
    }

    #[inline]
    pub fn corner_uv(&self, face: usize, corner: usize) -> Vec2 {
        if self.uvs.is_empty() {
            Vec2::ZERO
        } else {
            self.uvs[self.faces[face].uv[corner]]
        }
    }

    #[inline]
    pub fn corner_tangent(&self, face: usize, corner: usize) -> Vec3 {
        if self.tangents.is_empty() {
            Vec3::ZERO
        } else {
            self.tangents[self.faces[face].position[corner]]
        }
    }

    /// Counter-clockwise geometric normal in object space.
    pub fn face_normal(&self, face: usize) -> Vec3 {
        let p0 = self.corner_position(face, 0);
        let p1 = self.corner_position(face, 1);
        let p2 = self.corner_position(face, 2);
        (p1 - p0).cross(p2 - p0).normalize_or_zero()
    }

    /// Accumulate per-face tangents from UV gradients (Cramer's rule)
    /// onto each position, then normalise.
    pub fn compute_tangents(&mut self) {
        self.tangents = vec![Vec3::ZERO; self.positions.len()];
        if self.uvs.is_empty() {
            return;
        }

        for face in &self.faces {
            let [i0, i1, i2] = face.position;
            let edge1 = self.positions[i1] - self.positions[i0];
            let edge2 = self.positions[i2] - self.positions[i0];

            let uv0 = self.uvs[face.uv[0]];
            let duv1 = self.uvs[face.uv[1]] - uv0;
            let duv2 = self.uvs[face.uv[2]] - uv0;

            let det = duv1.x * duv2.y - duv2.x * duv1.y;
            if det.abs() <= f32::EPSILON {
                continue;
            }
            let tangent = (edge1 * duv2.y - edge2 * duv1.y) / det;

            self.tangents[i0] += tangent;
            self.tangents[i1] += tangent;
            self.tangents[i2] += tangent;
        }

        for t in &mut self.tangents {
            *t = t.normalize_or_zero();
        }
    }

    /// Check that every face index is inside its attribute array.
    pub fn validate(&self) -> Result<(), String> {
        for (i, face) in self.faces.iter().enumerate() {
            if let Some(&bad) = face.position.iter().find(|&&p| p >= self.positions.len()) {
                return Err(format!(
                    "face {} position index {} out of range ({} positions)",
                    i,
                    bad,
                    self.positions.len()
                ));
            }
            if !self.normals.is_empty() {
                if let Some(&bad) = face.normal.iter().find(|&&n| n >= self.normals.len()) {
                    return Err(format!(
                        "face {} normal index {} out of range ({} normals)",
                        i,
                        bad,
                        self.normals.len()
                    ));
                }
            }
            if !self.uvs.is_empty() {
                if let Some(&bad) = face.uv.iter().find(|&&t| t >= self.uvs.len()) {
                    return Err(format!(
                        "face {} uv index {} out of range ({} uvs)",
                        i,
                        bad,
                        self.uvs.len()
                    ));
                }
            }
        }
        if !self.tangents.is_empty() && self.tangents.len() != self.positions.len() {
            return Err(format!(
                "{} tangents for {} positions",
                self.tangents.len(),
                self.positions.len()
            ));
        }
        Ok(())
    }
}

/// A named collection of meshes, each bound to its own material.
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meshes: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.meshes.push(mesh);
        self
    }
}
