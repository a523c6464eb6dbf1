/// Geometric primitives consumed by the rasterizer
pub mod mesh;
pub mod primitives;
pub mod vertex;

pub use mesh::{Face, Mesh, Model};
pub use vertex::{perspective_correct, signed_area, Triangle, Vertex};
