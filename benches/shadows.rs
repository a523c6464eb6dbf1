/// Shadow benchmarks: the per-light depth pass and the two lookup strategies.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Mat4, Vec3};
use tile_raster::geometry::primitives;
use tile_raster::rendering::{DepthMap, HardShadow, PcssConfig, PcssShadow, ShadowMapData};
use tile_raster::*;

fn shadow_scene() -> (Scene, Resources) {
    let mut resources = Resources::new();
    let mat = resources.add_material(Material::new("phong"));
    let ground = resources.add_model(Model::new("ground").with_mesh(primitives::plane(8.0, mat)));
    let sphere = resources.add_model(
        Model::new("sphere").with_mesh(primitives::uv_sphere(0.6, 32, 64, mat)),
    );

    let camera = Camera::perspective(Vec3::new(3.0, 3.0, 5.0), Vec3::ZERO, 45.0, 4.0 / 3.0);
    let mut scene = Scene::new(camera);
    scene.add_light(Light::new(Vec3::new(4.0, 6.0, 3.0), Vec3::splat(40.0)));
    scene.add_entity(Entity::new(ground));
    scene.add_entity(Entity::new(sphere).with_position(Vec3::new(0.0, 1.0, 0.0)));
    (scene, resources)
}

fn bench_depth_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepare_shadows");
    group.sample_size(20);

    for map_size in [256usize, 512, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(map_size), &map_size, |b, &map_size| {
            let (scene, resources) = shadow_scene();
            let mut config = RenderConfig::new(64, 48).with_shadow_mode(ShadowMode::Hard);
            config.shadow.map_size = map_size;
            let mut rasterizer = Rasterizer::new(config).unwrap();

            b.iter(|| rasterizer.prepare_shadows(black_box(&scene), &resources).unwrap());
        });
    }
    group.finish();
}

/// Left half occluded, right half open, so PCSS takes its filtering path.
fn edge_map(size: usize) -> ShadowMapData {
    let mut depth = DepthMap::filled(size, size, 0.2);
    for y in 0..size {
        for x in 0..size / 2 {
            depth.set_texel(x, y, 0.9);
        }
    }
    ShadowMapData::new(depth, Mat4::IDENTITY)
}

fn bench_lookups(c: &mut Criterion) {
    let map = edge_map(1024);
    let points: Vec<Vec3> = (0..256)
        .map(|i| Vec3::new(i as f32 / 128.0 - 1.0, 0.1, 0.0))
        .collect();

    let mut group = c.benchmark_group("shadow_lookup");
    let hard = HardShadow;
    let pcss = PcssShadow::new(PcssConfig::default());
    let strategies: [(&str, &dyn ShadowStrategy); 2] = [("hard", &hard), ("pcss", &pcss)];

    for (name, strategy) in strategies {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut lit = 0.0;
                for &p in &points {
                    lit += strategy.visibility(black_box(&map), p, Vec3::Z);
                }
                black_box(lit)
            });
        });
    }
    group.finish();
}

fn bench_shadowed_draw(c: &mut Criterion) {
    let mut group = c.benchmark_group("draw_with_shadows_320x240");
    group.sample_size(20);

    for mode in [ShadowMode::None, ShadowMode::Hard, ShadowMode::Pcss] {
        group.bench_function(format!("{:?}", mode), |b| {
            let (scene, resources) = shadow_scene();
            let mut config = RenderConfig::new(320, 240).with_ssaa(1).with_shadow_mode(mode);
            config.shadow.map_size = 512;
            let mut rasterizer = Rasterizer::new(config).unwrap();
            rasterizer.prepare_shadows(&scene, &resources).unwrap();

            b.iter(|| {
                rasterizer.clear(Buffers::COLOR | Buffers::DEPTH);
                rasterizer.draw(black_box(&scene), &resources).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_depth_pass, bench_lookups, bench_shadowed_draw);
criterion_main!(benches);
