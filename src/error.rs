/// Error type for scene validation, configuration and image export.
///
/// Geometry and material problems are detected before any pixel work starts,
/// so a failed draw leaves the framebuffer untouched.
use crate::material::MaterialId;
use crate::scene::ModelId;

#[derive(Debug)]
pub enum RenderError {
    /// An entity references a model that is not in the resource pool.
    MissingModel { entity: usize, model: ModelId },
    /// A mesh references a material that is not in the resource pool.
    MissingMaterial {
        entity: usize,
        mesh: usize,
        material: MaterialId,
    },
    /// A material names a shader that is not registered.
    MissingShader {
        entity: usize,
        mesh: usize,
        material: MaterialId,
        shader: String,
    },
    /// A mesh drawn outside a scene asks for a shader that is not registered.
    UnregisteredShader { material: MaterialId, shader: String },
    /// A material declares a texture feature but the texture is absent.
    MissingTexture {
        entity: usize,
        mesh: usize,
        material: MaterialId,
        slot: &'static str,
    },
    /// Face indices point outside the mesh's attribute arrays.
    InvalidMesh {
        entity: usize,
        mesh: usize,
        reason: String,
    },
    InvalidConfig(String),
    Io(std::io::Error),
    Image(image::ImageError),
    Json(serde_json::Error),
}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        RenderError::Io(e)
    }
}

impl From<image::ImageError> for RenderError {
    fn from(e: image::ImageError) -> Self {
        RenderError::Image(e)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        RenderError::Json(e)
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::MissingModel { entity, model } => {
                write!(f, "entity {}: model {} not found", entity, model.0)
            }
            RenderError::MissingMaterial {
                entity,
                mesh,
                material,
            } => write!(
                f,
                "entity {} mesh {}: material {} not found",
                entity, mesh, material.0
            ),
            RenderError::MissingShader {
                entity,
                mesh,
                material,
                shader,
            } => write!(
                f,
                "entity {} mesh {}: material {} uses unregistered shader '{}'",
                entity, mesh, material.0, shader
            ),
            RenderError::UnregisteredShader { material, shader } => write!(
                f,
                "material {} uses unregistered shader '{}'",
                material.0, shader
            ),
            RenderError::MissingTexture {
                entity,
                mesh,
                material,
                slot,
            } => write!(
                f,
                "entity {} mesh {}: material {} enables {} but has no such texture",
                entity, mesh, material.0, slot
            ),
            RenderError::InvalidMesh {
                entity,
                mesh,
                reason,
            } => write!(f, "entity {} mesh {}: {}", entity, mesh, reason),
            RenderError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            RenderError::Io(e) => write!(f, "IO error: {}", e),
            RenderError::Image(e) => write!(f, "Image error: {}", e),
            RenderError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Io(e) => Some(e),
            RenderError::Image(e) => Some(e),
            RenderError::Json(e) => Some(e),
            _ => None,
        }
    }
}
