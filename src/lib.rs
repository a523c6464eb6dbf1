/// Tile-parallel software rasterizer
/// Supersampled, perspective-correct, with pluggable shaders and shadow maps
pub mod camera;
pub mod config;
pub mod error;
pub mod geometry;
pub mod material;
pub mod perf;
pub mod rendering;
pub mod scene;

pub use camera::{Camera, Projection};
pub use config::{CullMode, RenderConfig, ShadowConfig, ShadowMode};
pub use error::RenderError;
pub use geometry::{Face, Mesh, Model, Triangle, Vertex};
pub use material::{Material, MaterialFeatures, MaterialId, MaterialParams};
pub use perf::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};
pub use rendering::{
    BufferKind, Buffers, Fragment, Framebuffer, Rasterizer, Shader, ShaderContext,
    ShaderRegistry, ShadowStrategy, Texture,
};
pub use scene::{Entity, Light, ModelId, Resources, Scene, TextureId};
