/// Tile-parallel triangle rasterizer.
///
/// Per mesh: the bound shader's vertex stage produces clip-space triangles,
/// which are clipped against the near plane, projected to the screen and
/// binned into tiles. The tiles are then shaded in parallel, each worker
/// owning exactly one `TileSurface`.
use super::framebuffer::{BufferKind, Buffers, Framebuffer, TileSurface, DEPTH_CLEAR};
use super::shader::{
    DepthShader, Fragment, MaterialTextures, Shader, ShaderContext, ShaderRegistry,
};
use super::shadow::{strategy_for, DepthMap, ShadowMapData, ShadowStrategy};
use super::tile::{PixelBounds, TileBins};
use crate::camera::{Camera, Projection};
use crate::config::{CullMode, RenderConfig, ShadowMode};
use crate::error::RenderError;
use crate::geometry::{perspective_correct, signed_area, Mesh, Triangle, Vertex};
use crate::material::{Material, MaterialFeatures};
use crate::perf::{StageTimer, FUNCTION_COUNTERS};
use crate::scene::{Resources, Scene};
use crate::{count_add, count_call};
use glam::{Mat4, Vec3, Vec4};
use image::{DynamicImage, GrayImage, RgbaImage};
use rayon::prelude::*;
use std::time::Instant;

/// Clip-space `w` below which vertices are clipped away.
pub const NEAR_W_EPS: f32 = 0.001;

/// Triangles whose screen area is within this of zero are never drawn.
pub const AREA_EPS: f32 = 1e-5;

impl CullMode {
    /// Whether a triangle with this signed screen area survives culling.
    #[inline]
    pub fn accepts(self, area: f32) -> bool {
        match self {
            CullMode::Back => area > AREA_EPS,
            CullMode::Front => area < -AREA_EPS,
            CullMode::None => area.abs() > AREA_EPS,
        }
    }
}

/// Triangle after perspective divide and viewport mapping.
///
/// `tri[i].pos` holds screen `x, y`, reversed-Z depth and the clip `w`.
#[derive(Copy, Clone, Debug)]
pub struct ScreenTriangle {
    pub tri: Triangle,
    pub area: f32,
    pub inv_w: Vec3,
    pub bounds: PixelBounds,
}

impl ScreenTriangle {
    /// Project a clipped triangle onto a `width` × `height` surface.
    /// Returns `None` when it lies entirely off-screen.
    pub fn from_clip(clip: &Triangle, width: usize, height: usize) -> Option<Self> {
        let mut tri = *clip;
        for v in &mut tri.v {
            v.pos = to_screen(v.pos, width as f32, height as f32);
        }
        let bounds = PixelBounds::of_triangle(&tri, width, height)?;
        Some(Self {
            area: tri.signed_area(),
            inv_w: Vec3::new(1.0 / tri[0].pos.w, 1.0 / tri[1].pos.w, 1.0 / tri[2].pos.w),
            tri,
            bounds,
        })
    }
}

/// Perspective divide and viewport transform. `w` is kept for interpolation.
#[inline]
fn to_screen(clip: Vec4, width: f32, height: f32) -> Vec4 {
    let ndc = clip.truncate() / clip.w;
    Vec4::new(
        (ndc.x + 1.0) * 0.5 * width,
        (ndc.y + 1.0) * 0.5 * height,
        (1.0 - ndc.z) * 0.5,
        clip.w,
    )
}

/// Intersect edge AB with the plane `w = threshold`.
#[inline]
fn intersect_near(a: &Vertex, b: &Vertex, threshold: f32) -> Vertex {
    let t = (threshold - a.pos.w) / (b.pos.w - a.pos.w);
    Vertex::mix(a, b, t)
}

/// Clip a clip-space triangle against `w >= threshold` (Sutherland-Hodgman,
/// one plane). Returns the number of output triangles (0, 1 or 2).
pub fn clip_triangle_near(tri: &Triangle, threshold: f32) -> (usize, [Triangle; 2]) {
    let mut output = [tri[0]; 4];
    let mut out_len = 0usize;

    let mut prev = &tri[2];
    let mut prev_inside = prev.pos.w >= threshold;

    for curr in tri.v.iter() {
        let curr_inside = curr.pos.w >= threshold;

        match (prev_inside, curr_inside) {
            (true, true) => {
                output[out_len] = *curr;
                out_len += 1;
            }
            (true, false) => {
                output[out_len] = intersect_near(prev, curr, threshold);
                out_len += 1;
            }
            (false, true) => {
                output[out_len] = intersect_near(prev, curr, threshold);
                out_len += 1;
                output[out_len] = *curr;
                out_len += 1;
            }
            (false, false) => {}
        }

        prev = curr;
        prev_inside = curr_inside;
    }

    let mut tris = [*tri; 2];
    match out_len {
        3 => {
            tris[0] = Triangle::new(output[0], output[1], output[2]);
            (1, tris)
        }
        4 => {
            tris[0] = Triangle::new(output[0], output[1], output[2]);
            tris[1] = Triangle::new(output[0], output[2], output[3]);
            (2, tris)
        }
        _ => (0, tris),
    }
}

/// Rasterize one screen triangle into the part of it covered by `tile`.
///
/// Every sample is tested with screen-space barycentrics, corrected for
/// perspective, depth tested, and only then interpolated and shaded.
pub fn draw_triangle(
    tile: &mut TileSurface,
    st: &ScreenTriangle,
    shader: &dyn Shader,
    ctx: &ShaderContext<'_>,
    ssaa: usize,
    cull: CullMode,
) {
    if !cull.accepts(st.area) {
        count_call!(FUNCTION_COUNTERS.triangles_culled);
        return;
    }
    let Some((x0, y0, x1, y1)) = st.bounds.clip_to(&tile.rect) else {
        return;
    };

    let (a, b, c) = (st.tri[0].pos, st.tri[1].pos, st.tri[2].pos);
    let inv_area = 1.0 / st.area;
    let step = 1.0 / ssaa as f32;

    for y in y0..y1 {
        for x in x0..x1 {
            for sj in 0..ssaa {
                for si in 0..ssaa {
                    let sx = x as f32 + (si as f32 + 0.5) * step;
                    let sy = y as f32 + (sj as f32 + 0.5) * step;
                    let p = Vec4::new(sx, sy, 0.0, 1.0);

                    let alpha = signed_area(p, b, c) * inv_area;
                    let beta = signed_area(p, c, a) * inv_area;
                    let gamma = 1.0 - alpha - beta;
                    if alpha < 0.0 || beta < 0.0 || gamma < 0.0 {
                        continue;
                    }
                    count_call!(FUNCTION_COUNTERS.samples_tested);

                    let w = perspective_correct(Vec3::new(alpha, beta, gamma), st.inv_w);
                    let z = w.x * a.z + w.y * b.z + w.z * c.z;

                    let idx = tile.sample_index(x, y, sj * ssaa + si);
                    if !tile.depth_test(idx, z) {
                        count_call!(FUNCTION_COUNTERS.depth_failed);
                        continue;
                    }
                    count_call!(FUNCTION_COUNTERS.depth_passed);

                    let mut v = Vertex::lerp(w.x, w.y, w.z, &st.tri);
                    v.pos = Vec4::new(sx, sy, z, 1.0);

                    match shader.fragment(ctx, &v) {
                        Fragment::Shaded(color) => {
                            tile.write_depth(idx, z);
                            tile.blend(idx, color);
                        }
                        Fragment::DepthOnly => tile.write_depth(idx, z),
                        Fragment::Discard => {
                            count_call!(FUNCTION_COUNTERS.fragments_discarded);
                        }
                    }
                }
            }
        }
    }
}

/// A framebuffer with its tile bins and triangle scratch space.
pub struct RenderTarget {
    pub framebuffer: Framebuffer,
    pub cull_mode: CullMode,
    bins: TileBins,
    screen_tris: Vec<ScreenTriangle>,
}

impl RenderTarget {
    pub fn new(framebuffer: Framebuffer, cull_mode: CullMode) -> Self {
        let bins = TileBins::new(*framebuffer.grid());
        Self {
            framebuffer,
            cull_mode,
            bins,
            screen_tris: Vec::new(),
        }
    }

    #[inline]
    pub fn bins(&self) -> &TileBins {
        &self.bins
    }

    #[inline]
    pub fn screen_triangles(&self) -> &[ScreenTriangle] {
        &self.screen_tris
    }

    /// Run the vertex stage over every face, clip, project and bin.
    pub fn setup_mesh(&mut self, shader: &mut dyn Shader, ctx: &ShaderContext<'_>, mesh: &Mesh) {
        self.bins.clear();
        self.screen_tris.clear();
        let (width, height) = (self.framebuffer.width, self.framebuffer.height);

        for face in 0..mesh.face_count() {
            let clip = Triangle::new(
                shader.vertex(ctx, mesh, face, 0),
                shader.vertex(ctx, mesh, face, 1),
                shader.vertex(ctx, mesh, face, 2),
            );
            count_call!(FUNCTION_COUNTERS.triangles_submitted);

            if clip.v.iter().any(|v| v.pos.w < NEAR_W_EPS) {
                count_call!(FUNCTION_COUNTERS.triangles_clipped);
            }
            let (count, clipped) = clip_triangle_near(&clip, NEAR_W_EPS);

            for tri in &clipped[..count] {
                let Some(st) = ScreenTriangle::from_clip(tri, width, height) else {
                    continue;
                };
                if !self.cull_mode.accepts(st.area) {
                    count_call!(FUNCTION_COUNTERS.triangles_culled);
                    continue;
                }
                let index = self.screen_tris.len() as u32;
                self.bins.insert(index, &st.bounds);
                self.screen_tris.push(st);
            }
        }
        count_add!(FUNCTION_COUNTERS.triangles_binned, self.screen_tris.len());
    }

    /// Draw one mesh with `shader`. The shader is prepared first.
    pub fn draw_mesh(&mut self, shader: &mut dyn Shader, ctx: &ShaderContext<'_>, mesh: &Mesh) {
        shader.prepare();
        self.setup_mesh(shader, ctx, mesh);
        if self.screen_tris.is_empty() {
            return;
        }

        let shader: &dyn Shader = shader;
        let ssaa = self.framebuffer.ssaa;
        let cull = self.cull_mode;
        let tris = &self.screen_tris;

        self.framebuffer
            .tiles_mut()
            .par_iter_mut()
            .zip(self.bins.bins().par_iter())
            .for_each(|(tile, bin)| {
                if bin.is_empty() {
                    return;
                }
                count_call!(FUNCTION_COUNTERS.tiles_rendered);
                for &i in bin {
                    draw_triangle(tile, &tris[i as usize], shader, ctx, ssaa, cull);
                }
            });

        log::debug!(
            "mesh '{}': {} faces, {} screen triangles, {} tile entries",
            mesh.name,
            mesh.face_count(),
            tris.len(),
            self.bins.entry_count()
        );
    }
}

/// Look up a mesh's material and resolve every texture it declares.
fn bind_material<'r>(
    resources: &'r Resources,
    entity: usize,
    mesh_index: usize,
    mesh: &Mesh,
) -> Result<(&'r Material, MaterialTextures<'r>), RenderError> {
    let material = resources
        .material(mesh.material)
        .ok_or(RenderError::MissingMaterial {
            entity,
            mesh: mesh_index,
            material: mesh.material,
        })?;

    let textures = MaterialTextures {
        diffuse: material.diffuse_map.and_then(|id| resources.texture(id)),
        normal: material.normal_map.and_then(|id| resources.texture(id)),
        specular: material.specular_map.and_then(|id| resources.texture(id)),
        tangent_normal: material.tangent_normal_map.and_then(|id| resources.texture(id)),
    };
    Ok((material, textures))
}

const TEXTURE_SLOTS: [(MaterialFeatures, &str); 4] = [
    (MaterialFeatures::DIFFUSE_MAP, "diffuse_map"),
    (MaterialFeatures::NORMAL_MAP, "normal_map"),
    (MaterialFeatures::SPECULAR_MAP, "specular_map"),
    (MaterialFeatures::TANGENT_NORMAL_MAP, "tangent_normal_map"),
];

pub struct Rasterizer {
    config: RenderConfig,
    target: RenderTarget,
    shaders: ShaderRegistry,
    shadow_maps: Vec<ShadowMapData>,
    shadow_strategy: Option<Box<dyn ShadowStrategy>>,
}

impl Rasterizer {
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        config.validate()?;
        let framebuffer = Framebuffer::new(
            config.width,
            config.height,
            config.ssaa,
            config.tile_size,
            Vec3::from_array(config.clear_color),
        );
        log::info!(
            "Rasterizer {}x{} ssaa {}x, {} tiles of {}px",
            config.width,
            config.height,
            config.ssaa,
            framebuffer.grid().tile_count(),
            config.tile_size
        );
        Ok(Self {
            target: RenderTarget::new(framebuffer, config.cull_mode),
            config,
            shaders: ShaderRegistry::with_builtins(),
            shadow_maps: Vec::new(),
            shadow_strategy: None,
        })
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[inline]
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.target.framebuffer
    }

    #[inline]
    pub fn shaders(&self) -> &ShaderRegistry {
        &self.shaders
    }

    pub fn register_shader(&mut self, name: impl Into<String>, shader: impl Shader + 'static) {
        self.shaders.register(name, shader);
    }

    pub fn set_cull_mode(&mut self, cull_mode: CullMode) {
        self.config.cull_mode = cull_mode;
        self.target.cull_mode = cull_mode;
    }

    pub fn clear(&mut self, buffers: Buffers) {
        self.target.framebuffer.clear(buffers);
    }

    /// Check every entity, mesh, material, shader and texture the scene uses.
    pub fn validate(&self, scene: &Scene, resources: &Resources) -> Result<(), RenderError> {
        for (ei, entity) in scene.entities.iter().enumerate() {
            let model = resources.model(entity.model).ok_or(RenderError::MissingModel {
                entity: ei,
                model: entity.model,
            })?;

            for (mi, mesh) in model.meshes.iter().enumerate() {
                mesh.validate().map_err(|reason| RenderError::InvalidMesh {
                    entity: ei,
                    mesh: mi,
                    reason,
                })?;

                let (material, textures) = bind_material(resources, ei, mi, mesh)?;
                let shader = self.shaders.get(&material.shader).ok_or_else(|| {
                    RenderError::MissingShader {
                        entity: ei,
                        mesh: mi,
                        material: mesh.material,
                        shader: material.shader.clone(),
                    }
                })?;

                let required = material.features | shader.required_features();
                for (feature, slot) in TEXTURE_SLOTS {
                    if required.contains(feature) && !textures.has(feature) {
                        return Err(RenderError::MissingTexture {
                            entity: ei,
                            mesh: mi,
                            material: mesh.material,
                            slot,
                        });
                    }
                }

                if material.has_feature(MaterialFeatures::TANGENT_NORMAL_MAP)
                    && mesh.tangents.len() != mesh.positions.len()
                {
                    return Err(RenderError::InvalidMesh {
                        entity: ei,
                        mesh: mi,
                        reason: "tangent-space normal map needs per-position tangents".into(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Render every entity of `scene` into the framebuffer.
    ///
    /// The scene is validated first; on error nothing is drawn. Call
    /// [`Rasterizer::clear`] between frames.
    pub fn draw(&mut self, scene: &Scene, resources: &Resources) -> Result<(), RenderError> {
        self.validate(scene, resources)?;

        let start = Instant::now();
        log::info!(
            "Drawing {} entities with {} lights",
            scene.entities.len(),
            scene.lights.len()
        );

        let view_projection = scene.camera.view_projection_matrix();
        let strategy = self.shadow_strategy.as_deref();

        for (ei, entity) in scene.entities.iter().enumerate() {
            let model = resources.model(entity.model).ok_or(RenderError::MissingModel {
                entity: ei,
                model: entity.model,
            })?;
            let model_matrix = entity.matrix();

            for (mi, mesh) in model.meshes.iter().enumerate() {
                let (material, textures) = bind_material(resources, ei, mi, mesh)?;
                let ctx = ShaderContext::new(
                    view_projection,
                    scene.camera.eye,
                    &scene.lights,
                    material,
                )
                .with_model(model_matrix)
                .with_shadows(&self.shadow_maps, strategy)
                .with_material(material, textures);

                let shader = self.shaders.get_mut(&material.shader).ok_or_else(|| {
                    RenderError::MissingShader {
                        entity: ei,
                        mesh: mi,
                        material: mesh.material,
                        shader: material.shader.clone(),
                    }
                })?;
                self.target.draw_mesh(shader, &ctx, mesh);
            }
        }

        log::info!("Draw finished in {:.2?}", start.elapsed());
        Ok(())
    }

    /// Draw a single mesh with the shader named by the context's material.
    ///
    /// Only the shader lookup is checked; the caller owns the mesh and its
    /// bindings.
    pub fn draw_mesh(&mut self, ctx: &ShaderContext<'_>, mesh: &Mesh) -> Result<(), RenderError> {
        let material = ctx.material;
        let shader = self.shaders.get_mut(&material.shader).ok_or_else(|| {
            RenderError::UnregisteredShader {
                material: mesh.material,
                shader: material.shader.clone(),
            }
        })?;
        self.target.draw_mesh(shader, ctx, mesh);
        Ok(())
    }

    /// Render one depth map per light and bind the configured strategy.
    ///
    /// Each light looks at the camera target through a square perspective
    /// frustum. Front faces are culled so that surfaces do not shadow
    /// themselves without a depth bias.
    pub fn prepare_shadows(
        &mut self,
        scene: &Scene,
        resources: &Resources,
    ) -> Result<(), RenderError> {
        self.shadow_maps.clear();
        let shadow = self.config.shadow;
        self.shadow_strategy = strategy_for(&shadow);
        if shadow.mode == ShadowMode::None {
            log::info!("Shadows disabled");
            return Ok(());
        }
        self.validate(scene, resources)?;

        let _timer = StageTimer::start("prepare_shadows");
        let start = Instant::now();
        let size = shadow.map_size;
        let framebuffer = Framebuffer::new(size, size, 1, self.config.tile_size, Vec3::ZERO);
        let mut target = RenderTarget::new(framebuffer, CullMode::Front);
        let mut depth_shader = DepthShader;

        for (li, light) in scene.lights.iter().enumerate() {
            let direction = scene.camera.target - light.position;
            if direction.length_squared() <= f32::EPSILON {
                log::warn!("Light {} sits on the camera target; no shadow map", li);
                self.shadow_maps.push(ShadowMapData::new(
                    DepthMap::filled(size, size, DEPTH_CLEAR),
                    Mat4::IDENTITY,
                ));
                continue;
            }

            let up = if direction.normalize().cross(Vec3::Y).length_squared() < 1e-6 {
                Vec3::Z
            } else {
                Vec3::Y
            };
            let light_camera = Camera {
                eye: light.position,
                target: scene.camera.target,
                up,
                projection: Projection::Perspective {
                    fov_degrees: shadow.fov_degrees,
                    aspect: 1.0,
                    near: shadow.near,
                    far: shadow.far,
                },
            };
            let light_vp = light_camera.view_projection_matrix();

            target.framebuffer.clear(Buffers::DEPTH);
            for (ei, entity) in scene.entities.iter().enumerate() {
                let model = resources.model(entity.model).ok_or(RenderError::MissingModel {
                    entity: ei,
                    model: entity.model,
                })?;
                let model_matrix = entity.matrix();
                for (mi, mesh) in model.meshes.iter().enumerate() {
                    let (material, _) = bind_material(resources, ei, mi, mesh)?;
                    let ctx = ShaderContext::new(light_vp, light.position, &[], material)
                        .with_model(model_matrix);
                    target.draw_mesh(&mut depth_shader, &ctx, mesh);
                }
            }

            log::debug!(
                "Shadow map {} ({}x{}) for light at {}",
                li,
                size,
                size,
                light.position
            );
            self.shadow_maps
                .push(ShadowMapData::new(target.framebuffer.depth_map(), light_vp));
        }

        log::info!(
            "Prepared {} shadow maps ({:?}) in {:.2?}",
            self.shadow_maps.len(),
            shadow.mode,
            start.elapsed()
        );
        Ok(())
    }

    /// Use externally produced shadow data, one entry per scene light.
    pub fn set_shadow_maps(
        &mut self,
        maps: Vec<ShadowMapData>,
        strategy: Option<Box<dyn ShadowStrategy>>,
    ) {
        self.shadow_maps = maps;
        self.shadow_strategy = strategy;
    }

    #[inline]
    pub fn shadow_maps(&self) -> &[ShadowMapData] {
        &self.shadow_maps
    }

    pub fn to_image(&self, kind: BufferKind) -> DynamicImage {
        self.target.framebuffer.to_image(kind)
    }

    pub fn color_image(&self) -> RgbaImage {
        self.target.framebuffer.color_image()
    }

    pub fn depth_image(&self) -> GrayImage {
        self.target.framebuffer.depth_image()
    }
}
