/// Offline renderer entry point
/// Builds a small procedural scene, renders it with shadows and writes PNGs
use anyhow::{bail, Context, Result};
use glam::Vec3;
use image::{Rgba, RgbaImage};
use mimalloc::MiMalloc;
use std::path::PathBuf;
use std::time::Instant;
use tile_raster::geometry::primitives;
use tile_raster::rendering::{Interpolation, WrapMode};
use tile_raster::*;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

struct Args {
    config: Option<PathBuf>,
    out: PathBuf,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        out: PathBuf::from("."),
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                args.config = Some(it.next().context("--config needs a path")?.into());
            }
            "--out" => {
                args.out = it.next().context("--out needs a directory")?.into();
            }
            "-h" | "--help" => {
                println!("usage: tile-raster [--config <render.json>] [--out <dir>]");
                std::process::exit(0);
            }
            other => bail!("unknown argument '{}'", other),
        }
    }
    Ok(args)
}

/// 8x8 checkerboard used as the ground's diffuse map.
fn checker_texture() -> Texture {
    let img = RgbaImage::from_fn(256, 256, |x, y| {
        if ((x / 32) + (y / 32)) % 2 == 0 {
            Rgba([230, 230, 230, 255])
        } else {
            Rgba([90, 90, 100, 255])
        }
    });
    Texture::from_image(img)
        .with_interpolation(Interpolation::Nearest)
        .with_wrap(WrapMode::Repeat)
}

fn build_scene(config: &RenderConfig) -> (Scene, Resources) {
    let mut resources = Resources::new();

    let checker = resources.add_texture(checker_texture());
    let ground_mat = resources.add_material(Material::new("standard").with_diffuse_map(checker));
    let cube_mat = resources.add_material(Material::new("flat").with_params(MaterialParams {
        specular: Vec3::splat(0.2),
        ..MaterialParams::default()
    }));
    let sphere_mat = resources.add_material(Material::new("standard").with_params(MaterialParams {
        diffuse_color: Vec3::new(0.9, 0.45, 0.2),
        ..MaterialParams::default()
    }));

    let ground = resources.add_model(
        Model::new("ground").with_mesh(primitives::plane(8.0, ground_mat)),
    );
    let cube = resources.add_model(Model::new("cube").with_mesh(primitives::cube(1.0, cube_mat)));
    let sphere = resources.add_model(
        Model::new("sphere").with_mesh(primitives::uv_sphere(0.6, 24, 48, sphere_mat)),
    );

    let eye = Vec3::new(3.0, 3.0, 5.0);
    let mut camera = Camera::perspective(eye, Vec3::new(0.0, 0.5, 0.0), 45.0, 1.0);
    camera.set_aspect_ratio(config.width as f32 / config.height as f32);

    let mut scene = Scene::new(camera);
    scene.add_light(Light::new(Vec3::new(4.0, 6.0, 3.0), Vec3::splat(40.0)));
    scene.add_entity(Entity::new(ground));
    scene.add_entity(
        Entity::new(cube)
            .with_position(Vec3::new(-0.9, 0.5, 0.0))
            .with_rotation(Vec3::new(0.0, 30.0, 0.0)),
    );
    scene.add_entity(Entity::new(sphere).with_position(Vec3::new(0.9, 0.6, 0.4)));

    (scene, resources)
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => RenderConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RenderConfig::default(),
    };

    let (scene, resources) = build_scene(&config);
    let mut rasterizer = Rasterizer::new(config)?;
    let mut shaders: Vec<_> = rasterizer.shaders().names().collect();
    shaders.sort_unstable();
    log::debug!("Registered shaders: {}", shaders.join(", "));

    let frame_start = Instant::now();
    rasterizer.prepare_shadows(&scene, &resources)?;
    rasterizer.clear(Buffers::COLOR | Buffers::DEPTH);
    rasterizer.draw(&scene, &resources)?;
    log::info!("Frame rendered in {:.2?}", frame_start.elapsed());

    #[cfg(feature = "profiling")]
    FUNCTION_COUNTERS.snapshot().log_report();

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    let color_path = args.out.join("color.png");
    let depth_path = args.out.join("depth.png");
    rasterizer
        .color_image()
        .save(&color_path)
        .with_context(|| format!("writing {}", color_path.display()))?;
    rasterizer
        .depth_image()
        .save(&depth_path)
        .with_context(|| format!("writing {}", depth_path.display()))?;

    log::info!("Wrote {} and {}", color_path.display(), depth_path.display());
    Ok(())
}
