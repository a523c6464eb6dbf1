/// Procedural meshes: planes, boxes and UV spheres.
/// All faces wind counter-clockwise seen from outside and carry normals,
/// UVs and tangents.
use super::mesh::{Face, Mesh};
use crate::material::MaterialId;
use glam::{Vec2, Vec3};
use std::f32::consts::PI;

/// Append a quad centred on `center` spanning `±u` and `±v`.
/// The front side faces `u × v`.
fn push_quad(mesh: &mut Mesh, center: Vec3, u: Vec3, v: Vec3) {
    let normal = u.cross(v).normalize_or_zero();
    let base = mesh.positions.len();

    let corners = [
        (center - u - v, Vec2::new(0.0, 0.0)),
        (center + u - v, Vec2::new(1.0, 0.0)),
        (center + u + v, Vec2::new(1.0, 1.0)),
        (center - u + v, Vec2::new(0.0, 1.0)),
    ];
    for (pos, uv) in corners {
        mesh.positions.push(pos);
        mesh.normals.push(normal);
        mesh.uvs.push(uv);
    }

    mesh.faces.push(Face::uniform([base, base + 1, base + 2]));
    mesh.faces.push(Face::uniform([base, base + 2, base + 3]));
}

/// Square in the XZ plane facing +Y, `size` units across.
pub fn plane(size: f32, material: MaterialId) -> Mesh {
    let h = size * 0.5;
    let mut mesh = Mesh::new("plane", material);
    push_quad(&mut mesh, Vec3::ZERO, Vec3::X * h, Vec3::NEG_Z * h);
    mesh.compute_tangents();
    mesh
}

/// Axis-aligned cube centred on the origin.
pub fn cube(size: f32, material: MaterialId) -> Mesh {
    let h = size * 0.5;
    let mut mesh = Mesh::new("cube", material);
    let sides = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    for (n, u, v) in sides {
        push_quad(&mut mesh, n * h, u * h, v * h);
    }
    mesh.compute_tangents();
    mesh
}

/// Latitude/longitude sphere. `rings` >= 2 and `segments` >= 3.
pub fn uv_sphere(radius: f32, rings: usize, segments: usize, material: MaterialId) -> Mesh {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let mut mesh = Mesh::new("sphere", material);

    for i in 0..=rings {
        let theta = PI * i as f32 / rings as f32;
        for j in 0..=segments {
            let phi = 2.0 * PI * j as f32 / segments as f32;
            let dir = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            mesh.positions.push(dir * radius);
            mesh.normals.push(dir);
            mesh.uvs.push(Vec2::new(
                j as f32 / segments as f32,
                1.0 - i as f32 / rings as f32,
            ));
        }
    }

    let stride = segments + 1;
    for i in 0..rings {
        for j in 0..segments {
            let a = i * stride + j;
            let b = (i + 1) * stride + j;
            // pole rows collapse one triangle of each quad
            if i != rings - 1 {
                mesh.faces.push(Face::uniform([a, b + 1, b]));
            }
            if i != 0 {
                mesh.faces.push(Face::uniform([a, a + 1, b + 1]));
            }
        }
    }

    mesh.compute_tangents();
    mesh
}
