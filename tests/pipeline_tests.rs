/// End-to-end tests through `Rasterizer::draw`: coverage, supersampling,
/// tile independence, validation and buffer clearing.
use glam::{Vec2, Vec3, Vec4};
use tile_raster::geometry::primitives;
use tile_raster::*;

fn ortho_camera() -> Camera {
    Camera::orthographic(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, 1.0, 1.0)
}

fn triangle_mesh(points: [Vec2; 3], z: f32, material: MaterialId) -> Mesh {
    let mut mesh = Mesh::new("triangle", material);
    mesh.positions = points.iter().map(|p| p.extend(z)).collect();
    mesh.faces = vec![Face::uniform([0, 1, 2])];
    mesh
}

fn no_shadows(width: usize, height: usize) -> RenderConfig {
    RenderConfig::new(width, height).with_shadow_mode(ShadowMode::None)
}

fn render(config: RenderConfig, scene: &Scene, resources: &Resources) -> Rasterizer {
    let mut rasterizer = Rasterizer::new(config).unwrap();
    rasterizer.clear(Buffers::COLOR | Buffers::DEPTH);
    rasterizer.draw(scene, resources).unwrap();
    rasterizer
}

#[test]
fn flat_triangle_covers_expected_pixels() {
    let points = [
        Vec2::new(-0.8, -0.8),
        Vec2::new(0.9, -0.8),
        Vec2::new(-0.8, 0.9),
    ];
    let z = 0.5;

    let mut resources = Resources::new();
    let mat = resources.add_material(Material::new("flat").with_params(MaterialParams {
        specular: Vec3::ZERO,
        ..MaterialParams::default()
    }));
    let model = resources.add_model(Model::new("tri").with_mesh(triangle_mesh(points, z, mat)));

    // straight above the centroid: n·l = 1 and intensity / r² = 1.25
    let centroid = (points[0].extend(z) + points[1].extend(z) + points[2].extend(z)) / 3.0;
    let mut scene = Scene::new(ortho_camera());
    scene.add_light(Light::new(centroid + Vec3::new(0.0, 0.0, 2.5), Vec3::splat(7.8125)));
    scene.add_entity(Entity::new(model));

    let config = no_shadows(4, 4).with_ssaa(1).with_tile_size(2);
    let rasterizer = render(config, &scene, &resources);

    let color = rasterizer.color_image();
    let depth = rasterizer.depth_image();
    for j in 0..4u32 {
        for i in 0..4u32 {
            let row = 3 - j;
            let covered = rasterizer.framebuffer().resolve_depth(i as usize, j as usize);
            if i + j <= 3 {
                assert_eq!(color.get_pixel(i, row).0, [153, 153, 153, 255], "pixel ({}, {})", i, j);
                assert!(covered.is_some());
            } else {
                assert_eq!(color.get_pixel(i, row).0, [0, 0, 0, 255], "pixel ({}, {})", i, j);
                assert!(covered.is_none());
                assert_eq!(depth.get_pixel(i, row).0, [0]);
            }
        }
    }

    let c = rasterizer.framebuffer().resolve_pixel(0, 0);
    assert!((c - Vec4::new(0.6, 0.6, 0.6, 1.0)).abs().max_element() < 1e-5, "{:?}", c);
}

#[test]
fn supersampling_preserves_interior_shading() {
    let points = [
        Vec2::new(-0.9, -0.9),
        Vec2::new(0.9, -0.9),
        Vec2::new(-0.9, 0.9),
    ];
    let mut resources = Resources::new();
    let mat = resources.add_material(Material::new("gouraud"));
    let model = resources.add_model(Model::new("tri").with_mesh(triangle_mesh(points, 0.0, mat)));

    let mut scene = Scene::new(ortho_camera());
    scene.add_light(Light::new(Vec3::new(-0.9, -0.9, 0.5), Vec3::ONE));
    scene.add_entity(Entity::new(model));

    let single = render(no_shadows(8, 8).with_ssaa(1), &scene, &resources);
    let super4 = render(no_shadows(8, 8).with_ssaa(4), &scene, &resources);

    // pixels whose whole square lies inside the triangle
    for y in 1..8usize {
        for x in 1..8usize {
            if x + y > 6 {
                continue;
            }
            let a = single.framebuffer().resolve_pixel(x, y);
            let b = super4.framebuffer().resolve_pixel(x, y);
            assert!(
                (a - b).abs().max_element() < 1.0 / 255.0,
                "pixel ({}, {}): {:?} vs {:?}",
                x,
                y,
                a,
                b
            );
        }
    }

    // the hypotenuse gets partial coverage only with supersampling
    let edge = super4.framebuffer().resolve_pixel(4, 3);
    let inside = super4.framebuffer().resolve_pixel(3, 3);
    assert!(edge.x < inside.x, "{:?} vs {:?}", edge, inside);
}

fn sphere_scene() -> (Scene, Resources) {
    let mut resources = Resources::new();
    let shiny = resources.add_material(Material::new("phong"));
    let matte = resources.add_material(Material::new("gouraud"));
    let boxy = resources.add_material(Material::new("flat"));

    let sphere = resources.add_model(
        Model::new("sphere").with_mesh(primitives::uv_sphere(0.7, 12, 24, shiny)),
    );
    let ground = resources.add_model(Model::new("ground").with_mesh(primitives::plane(4.0, matte)));
    let cube = resources.add_model(Model::new("cube").with_mesh(primitives::cube(0.6, boxy)));

    let camera = Camera::perspective(Vec3::new(1.5, 2.0, 3.0), Vec3::ZERO, 50.0, 40.0 / 30.0);
    let mut scene = Scene::new(camera);
    scene.add_light(Light::new(Vec3::new(2.0, 3.0, 2.0), Vec3::splat(20.0)));
    scene.add_entity(Entity::new(ground).with_position(Vec3::new(0.0, -0.7, 0.0)));
    scene.add_entity(Entity::new(sphere));
    scene.add_entity(
        Entity::new(cube)
            .with_position(Vec3::new(-0.9, -0.4, 0.6))
            .with_rotation(Vec3::new(0.0, 25.0, 0.0)),
    );
    (scene, resources)
}

#[test]
fn image_does_not_depend_on_tile_size() {
    let (scene, resources) = sphere_scene();

    let one_tile = render(no_shadows(40, 30).with_tile_size(64), &scene, &resources);
    let small_tiles = render(no_shadows(40, 30).with_tile_size(3), &scene, &resources);

    assert_eq!(one_tile.framebuffer().grid().tile_count(), 1);
    assert!(small_tiles.framebuffer().grid().tile_count() > 100);
    assert_eq!(one_tile.color_image(), small_tiles.color_image());
    assert_eq!(one_tile.depth_image(), small_tiles.depth_image());
}

#[test]
fn redrawing_without_clear_changes_nothing() {
    let (scene, resources) = sphere_scene();
    let mut rasterizer = render(no_shadows(40, 30), &scene, &resources);
    let first = rasterizer.color_image();

    // every sample ties with itself and the strict depth test rejects it
    rasterizer.draw(&scene, &resources).unwrap();
    assert_eq!(first, rasterizer.color_image());
}

#[test]
fn equal_depth_keeps_first_writer() {
    let points = [
        Vec2::new(-1.0, -1.0),
        Vec2::new(1.0, -1.0),
        Vec2::new(-1.0, 1.0),
    ];
    let mut resources = Resources::new();
    let red = resources.add_material(Material::new("standard").with_params(MaterialParams {
        diffuse_color: Vec3::X,
        ..MaterialParams::default()
    }));
    let blue = resources.add_material(Material::new("standard").with_params(MaterialParams {
        diffuse_color: Vec3::Z,
        ..MaterialParams::default()
    }));
    let red_model = resources.add_model(
        Model::new("red").with_mesh(triangle_mesh(points, 0.0, red)),
    );
    let blue_model = resources.add_model(
        Model::new("blue").with_mesh(triangle_mesh(points, 0.0, blue)),
    );

    let mut red_first = Scene::new(ortho_camera());
    red_first.add_light(Light::new(Vec3::new(0.0, 0.0, 2.0), Vec3::splat(4.0)));
    red_first.add_entity(Entity::new(red_model));
    let red_only = red_first.clone();
    red_first.add_entity(Entity::new(blue_model));

    let config = no_shadows(8, 8).with_ssaa(2);
    let stacked = render(config.clone(), &red_first, &resources);
    let alone = render(config, &red_only, &resources);
    assert_eq!(stacked.color_image(), alone.color_image());

    // blue only ever shows through the specular term
    let c = stacked.framebuffer().resolve_pixel(1, 1);
    assert!(c.x > c.z, "{:?}", c);
}

#[test]
fn invalid_scenes_are_rejected_before_drawing() {
    let mut resources = Resources::new();
    let good_mat = resources.add_material(Material::new("phong"));
    let good = resources.add_model(Model::new("good").with_mesh(primitives::cube(1.0, good_mat)));

    let bad_texture =
        resources.add_material(Material::new("standard").with_diffuse_map(TextureId(7)));
    let bad_shader = resources.add_material(Material::new("toon"));
    let needs_normals = resources.add_material(Material::new("normal"));

    let with_texture = resources.add_model(
        Model::new("a").with_mesh(primitives::cube(1.0, bad_texture)),
    );
    let with_shader = resources.add_model(
        Model::new("b").with_mesh(primitives::cube(1.0, bad_shader)),
    );
    let with_normals = resources.add_model(
        Model::new("c").with_mesh(primitives::cube(1.0, needs_normals)),
    );
    let with_material = resources.add_model(
        Model::new("d").with_mesh(primitives::cube(1.0, MaterialId(99))),
    );

    let mut broken_mesh = primitives::cube(1.0, good_mat);
    broken_mesh.faces[0].position[2] = 1000;
    let with_broken_mesh = resources.add_model(Model::new("e").with_mesh(broken_mesh));

    let camera = Camera::perspective(Vec3::new(2.0, 2.0, 2.0), Vec3::ZERO, 60.0, 1.0);
    let scene_with = |second: ModelId| {
        let mut scene = Scene::new(camera);
        scene.add_light(Light::new(Vec3::new(1.0, 3.0, 1.0), Vec3::splat(10.0)));
        scene.add_entity(Entity::new(good));
        scene.add_entity(Entity::new(second));
        scene
    };

    let mut rasterizer = Rasterizer::new(no_shadows(16, 16)).unwrap();
    let blank = rasterizer.color_image();

    let err = rasterizer.draw(&scene_with(with_texture), &resources).unwrap_err();
    assert!(
        matches!(err, RenderError::MissingTexture { entity: 1, slot: "diffuse_map", .. }),
        "{}",
        err
    );

    let err = rasterizer.draw(&scene_with(with_shader), &resources).unwrap_err();
    assert!(
        matches!(&err, RenderError::MissingShader { shader, .. } if shader == "toon"),
        "{}",
        err
    );

    let err = rasterizer.draw(&scene_with(with_normals), &resources).unwrap_err();
    assert!(
        matches!(err, RenderError::MissingTexture { slot: "normal_map", .. }),
        "{}",
        err
    );

    let err = rasterizer.draw(&scene_with(with_material), &resources).unwrap_err();
    assert!(matches!(err, RenderError::MissingMaterial { entity: 1, mesh: 0, .. }), "{}", err);

    let err = rasterizer.draw(&scene_with(with_broken_mesh), &resources).unwrap_err();
    assert!(matches!(err, RenderError::InvalidMesh { entity: 1, .. }), "{}", err);

    let err = rasterizer.draw(&scene_with(ModelId(42)), &resources).unwrap_err();
    assert!(matches!(err, RenderError::MissingModel { entity: 1, .. }), "{}", err);

    // the valid first entity was never drawn
    assert_eq!(rasterizer.color_image(), blank);
    assert!(rasterizer.framebuffer().resolve_depth(8, 8).is_none());
}

#[test]
fn clear_resets_selected_buffers_only() {
    let (scene, resources) = sphere_scene();
    let mut config = no_shadows(40, 30);
    config.clear_color = [0.25, 0.5, 0.75];
    let mut rasterizer = render(config, &scene, &resources);

    let center = (20, 15);
    assert!(rasterizer.framebuffer().resolve_depth(center.0, center.1).is_some());

    rasterizer.clear(Buffers::COLOR);
    assert_eq!(
        rasterizer.framebuffer().resolve_pixel(center.0, center.1),
        Vec4::new(0.25, 0.5, 0.75, 1.0)
    );
    assert!(rasterizer.framebuffer().resolve_depth(center.0, center.1).is_some());

    rasterizer.clear(Buffers::DEPTH);
    for y in 0..30 {
        for x in 0..40 {
            assert!(rasterizer.framebuffer().resolve_depth(x, y).is_none());
        }
    }
}

/// Paints every covered sample with one color, ignoring lights.
struct SolidShader(Vec4);

impl Shader for SolidShader {
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
        Fragment::Shaded(self.0)
    }
}

#[test]
fn custom_shader_is_looked_up_by_name() {
    let points = [
        Vec2::new(-1.0, -1.0),
        Vec2::new(3.0, -1.0),
        Vec2::new(-1.0, 3.0),
    ];
    let mut resources = Resources::new();
    let mat = resources.add_material(Material::new("solid"));
    let model = resources.add_model(
        Model::new("screen").with_mesh(triangle_mesh(points, 0.0, mat)),
    );
    let mut scene = Scene::new(ortho_camera());
    scene.add_entity(Entity::new(model));

    let mut rasterizer = Rasterizer::new(no_shadows(6, 6)).unwrap();
    assert!(rasterizer.draw(&scene, &resources).is_err());

    // half-transparent green over black
    rasterizer.register_shader("solid", SolidShader(Vec4::new(0.0, 1.0, 0.0, 0.5)));
    rasterizer.draw(&scene, &resources).unwrap();
    let c = rasterizer.framebuffer().resolve_pixel(2, 2);
    assert!((c - Vec4::new(0.0, 0.5, 0.0, 1.0)).abs().max_element() < 1e-6, "{:?}", c);
}

#[test]
fn culling_mode_selects_visible_winding() {
    let clockwise = [
        Vec2::new(-1.0, -1.0),
        Vec2::new(-1.0, 3.0),
        Vec2::new(3.0, -1.0),
    ];
    let mut resources = Resources::new();
    let mat = resources.add_material(Material::new("depth"));
    let model = resources.add_model(Model::new("cw").with_mesh(triangle_mesh(clockwise, 0.0, mat)));
    let mut scene = Scene::new(ortho_camera());
    scene.add_entity(Entity::new(model));

    let mut rasterizer = render(no_shadows(4, 4), &scene, &resources);
    assert!(rasterizer.framebuffer().resolve_depth(1, 1).is_none());

    rasterizer.set_cull_mode(CullMode::None);
    rasterizer.draw(&scene, &resources).unwrap();
    assert!(rasterizer.framebuffer().resolve_depth(1, 1).is_some());
    assert_eq!(rasterizer.config().cull_mode, CullMode::None);
}

#[test]
fn image_export_matches_resolved_buffers() {
    // depth falls off from left to right across the triangle
    let mut mesh = triangle_mesh(
        [
            Vec2::new(-0.8, -0.8),
            Vec2::new(0.9, -0.8),
            Vec2::new(-0.8, 0.9),
        ],
        0.5,
        MaterialId(0),
    );
    mesh.positions[1].z = -0.5;

    let mut resources = Resources::new();
    let mat = resources.add_material(Material::new("flat"));
    mesh.material = mat;
    let model = resources.add_model(Model::new("slope").with_mesh(mesh));
    let mut scene = Scene::new(ortho_camera());
    scene.add_light(Light::new(Vec3::new(0.0, 0.0, 3.0), Vec3::splat(9.0)));
    scene.add_entity(Entity::new(model));

    let rasterizer = render(no_shadows(4, 4).with_ssaa(1), &scene, &resources);

    let color = rasterizer.to_image(BufferKind::Color);
    assert_eq!(color.as_rgba8(), Some(&rasterizer.color_image()));
    let color = color.to_rgba8();
    // image rows run top to bottom
    assert_eq!(color.get_pixel(3, 0).0, [0, 0, 0, 255]);
    assert_ne!(color.get_pixel(0, 3).0, [0, 0, 0, 255]);

    let depth = rasterizer.to_image(BufferKind::Depth);
    assert_eq!(depth.as_luma8(), Some(&rasterizer.depth_image()));
    let depth = depth.to_luma8();
    let at = |x: u32, y: u32| depth.get_pixel(x, 3 - y).0[0];
    assert!(at(0, 0) >= 250, "{}", at(0, 0));
    let row: Vec<u8> = (0..3).map(|x| at(x, 0)).collect();
    assert!(row[0] > row[1] && row[1] > row[2], "{:?}", row);
    assert_eq!(at(3, 3), 0);
}

#[test]
fn single_mesh_draw_needs_a_registered_shader() {
    let points = [
        Vec2::new(-1.0, -1.0),
        Vec2::new(1.0, -1.0),
        Vec2::new(-1.0, 1.0),
    ];
    let mesh = triangle_mesh(points, 0.0, MaterialId(3));
    let camera = ortho_camera();
    let mut rasterizer = Rasterizer::new(no_shadows(4, 4)).unwrap();
    rasterizer.clear(Buffers::COLOR | Buffers::DEPTH);

    let toon = Material::new("toon");
    let ctx = ShaderContext::new(camera.view_projection_matrix(), camera.eye, &[], &toon);
    let err = rasterizer.draw_mesh(&ctx, &mesh).unwrap_err();
    assert!(
        matches!(
            &err,
            RenderError::UnregisteredShader { material, shader }
                if *material == MaterialId(3) && shader == "toon"
        ),
        "{}",
        err
    );
    assert!(rasterizer.framebuffer().resolve_depth(0, 0).is_none());

    let depth = Material::new("depth");
    let ctx = ShaderContext::new(camera.view_projection_matrix(), camera.eye, &[], &depth);
    rasterizer.draw_mesh(&ctx, &mesh).unwrap();
    assert!(rasterizer.framebuffer().resolve_depth(0, 0).is_some());
}
