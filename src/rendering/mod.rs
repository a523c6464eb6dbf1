/// Software rasterization pipeline
/// Tiles are shaded in parallel; everything else runs on the calling thread
pub mod framebuffer;
pub mod rasterizer;
pub mod shader;
pub mod shadow;
pub mod texture;
pub mod tile;

pub use framebuffer::{BufferKind, Buffers, Framebuffer, TileSurface, DEPTH_CLEAR};
pub use rasterizer::{
    clip_triangle_near, draw_triangle, Rasterizer, RenderTarget, ScreenTriangle, AREA_EPS,
    NEAR_W_EPS,
};
pub use shader::{
    compute_lighting, DepthShader, FlatShader, Fragment, GouraudShader, MaterialTextures,
    NormalShader, PhongShader, Shader, ShaderContext, ShaderRegistry, StandardShader,
};
pub use shadow::{
    DepthMap, HardShadow, PcssConfig, PcssShadow, ShadowMapData, ShadowStrategy, POISSON_DISK,
};
pub use texture::{Interpolation, Texture, WrapMode};
pub use tile::{PixelBounds, TileBins, TileGrid, TileRect, DEFAULT_TILE_SIZE};
