use std::ops::RangeInclusive;

use anyhow::ensure;
use cgmath::{InnerSpace, Vector2, Vector3, Zero};

use crate::data_structures::{
    model::{Mesh, ModelVertex},
    scene_graph::RawMesh,
};

/**
 * Tessellates the height field `z = f(x, y)` on a regular grid.
 *
 * Vertices are emitted row by row (`y` outer, `x` inner) and every grid cell
 * becomes the two triangles `(cur, next, cur + 1)` and `(cur + 1, next, next + 1)`
 * where `next` is the vertex one row further. Texture coordinates are the
 * normalized grid fractions. Normals and tangents stay zero, procedural
 * surfaces are drawn unlit.
 */
pub fn build_parametric_surface<F>(
    f: F,
    x_range: RangeInclusive<f32>,
    y_range: RangeInclusive<f32>,
    samples_x: u32,
    samples_y: u32,
) -> anyhow::Result<Mesh>
where
    F: Fn(f32, f32) -> f32,
{
    ensure!(
        samples_x >= 2 && samples_y >= 2,
        "a surface needs at least 2x2 samples, got {}x{}",
        samples_x,
        samples_y
    );
    ensure!(
        (samples_x as u64) * (samples_y as u64) <= u32::MAX as u64,
        "{}x{} samples don't fit into 32 bit indices",
        samples_x,
        samples_y
    );

    let (x_min, x_max) = (*x_range.start(), *x_range.end());
    let (y_min, y_max) = (*y_range.start(), *y_range.end());
    let last_x = (samples_x - 1) as f32;
    let last_y = (samples_y - 1) as f32;

    let mut vertices = Vec::with_capacity((samples_x * samples_y) as usize);
    for i in 0..samples_y {
        let v = i as f32 / last_y;
        let y = y_min + v * (y_max - y_min);
        for j in 0..samples_x {
            let u = j as f32 / last_x;
            let x = x_min + u * (x_max - x_min);
            vertices.push(ModelVertex {
                position: [x, y, f(x, y)],
                tex_coords: [u, v],
                ..Default::default()
            });
        }
    }

    let cells = ((samples_x - 1) * (samples_y - 1)) as usize;
    let mut indices = Vec::with_capacity(cells * 6);
    for i in 0..samples_y - 1 {
        for j in 0..samples_x - 1 {
            let cur = i * samples_x + j;
            let next = (i + 1) * samples_x + j;
            indices.extend_from_slice(&[cur, next, cur + 1]);
            indices.extend_from_slice(&[cur + 1, next, next + 1]);
        }
    }

    Mesh::new(vertices, indices, Vec::new())
}

/// The demo surface `z = sin(x) + cos(y)` over [-5, 5]² with 50x50 samples.
pub fn sin_x_cos_y() -> anyhow::Result<Mesh> {
    build_parametric_surface(|x, y| x.sin() + y.cos(), -5.0..=5.0, -5.0..=5.0, 50, 50)
}

/**
 * Converts an imported mesh into vertices and a flat triangle index list.
 *
 * Only the first UV channel is used. Tangents and bitangents are copied when the
 * mesh has UVs and left zero otherwise. Faces that aren't triangles or that
 * reference vertices the mesh doesn't have are dropped.
 */
pub fn raw_geometry(raw: &RawMesh) -> (Vec<ModelVertex>, Vec<u32>) {
    let uvs = raw.first_tex_coords();
    let vertices = raw
        .positions
        .iter()
        .enumerate()
        .map(|(i, position)| {
            let mut vertex = ModelVertex {
                position: *position,
                ..Default::default()
            };
            if let Some(normals) = &raw.normals {
                vertex.normal = normals.get(i).copied().unwrap_or_default();
            }
            if let Some(uvs) = uvs {
                vertex.tex_coords = uvs.get(i).copied().unwrap_or_default();
                if let Some(tangents) = &raw.tangents {
                    vertex.tangent = tangents.get(i).copied().unwrap_or_default();
                }
                if let Some(bitangents) = &raw.bitangents {
                    vertex.bitangent = bitangents.get(i).copied().unwrap_or_default();
                }
            }
            vertex
        })
        .collect::<Vec<_>>();

    let vertex_count = vertices.len();
    let mut dropped = 0;
    let mut indices = Vec::with_capacity(raw.faces.len() * 3);
    for face in &raw.faces {
        if face.len() != 3 || face.iter().any(|&i| i as usize >= vertex_count) {
            dropped += 1;
            continue;
        }
        indices.extend_from_slice(face);
    }
    if dropped > 0 {
        log::warn!(
            "Dropped {} malformed face(s) of mesh '{}' ({} vertices).",
            dropped,
            raw.name,
            vertex_count
        );
    }

    (vertices, indices)
}

/// Triangles of `faces` whose indices are all in range.
fn triangles<'a>(faces: &'a [Vec<u32>], vertex_count: usize) -> impl Iterator<Item = [usize; 3]> + 'a {
    faces.iter().filter_map(move |face| match face.as_slice() {
        &[a, b, c] if [a, b, c].iter().all(|&i| (i as usize) < vertex_count) => {
            Some([a as usize, b as usize, c as usize])
        }
        _ => None,
    })
}

/// Area weighted vertex normals. Vertices no triangle touches keep a zero normal.
pub fn calculate_smooth_normals(positions: &[[f32; 3]], faces: &[Vec<u32>]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vector3::<f32>::zero(); positions.len()];
    for [a, b, c] in triangles(faces, positions.len()) {
        let p0: Vector3<f32> = positions[a].into();
        let p1: Vector3<f32> = positions[b].into();
        let p2: Vector3<f32> = positions[c].into();
        // Not normalized: larger triangles weigh more
        let face_normal = (p1 - p0).cross(p2 - p0);
        normals[a] += face_normal;
        normals[b] += face_normal;
        normals[c] += face_normal;
    }
    normals
        .into_iter()
        .map(|n| {
            if n.magnitude2() > f32::EPSILON {
                n.normalize().into()
            } else {
                [0.0; 3]
            }
        })
        .collect()
}

/**
 * Per-vertex tangents and bitangents from UV gradients.
 *
 * Every triangle solves
 *     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
 *     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
 * and adds the result to its three vertices which are averaged afterwards.
 * Triangles with degenerate UVs are skipped.
 */
pub fn calculate_tangent_space(
    positions: &[[f32; 3]],
    uvs: &[[f32; 2]],
    faces: &[Vec<u32>],
) -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
    let vertex_count = positions.len().min(uvs.len());
    let mut tangents = vec![Vector3::<f32>::zero(); positions.len()];
    let mut bitangents = vec![Vector3::<f32>::zero(); positions.len()];
    let mut triangles_included = vec![0u32; positions.len()];

    for [a, b, c] in triangles(faces, vertex_count) {
        let pos0: Vector3<f32> = positions[a].into();
        let pos1: Vector3<f32> = positions[b].into();
        let pos2: Vector3<f32> = positions[c].into();

        let uv0: Vector2<f32> = uvs[a].into();
        let uv1: Vector2<f32> = uvs[b].into();
        let uv2: Vector2<f32> = uvs[c].into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * r;

        for i in [a, b, c] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
            triangles_included[i] += 1;
        }
    }

    let average = |v: Vector3<f32>, n: u32| -> [f32; 3] {
        if n == 0 {
            [0.0; 3]
        } else {
            (v / n as f32).into()
        }
    };
    let tangents = tangents
        .into_iter()
        .zip(&triangles_included)
        .map(|(t, &n)| average(t, n))
        .collect();
    let bitangents = bitangents
        .into_iter()
        .zip(&triangles_included)
        .map(|(b, &n)| average(b, n))
        .collect();
    (tangents, bitangents)
}

/// Triangle list from a strip, keeping counter-clockwise winding.
pub fn strip_to_triangles(strip: &[u32]) -> Vec<Vec<u32>> {
    strip
        .windows(3)
        .enumerate()
        .map(|(i, w)| {
            if i % 2 == 0 {
                vec![w[0], w[1], w[2]]
            } else {
                vec![w[1], w[0], w[2]]
            }
        })
        .collect()
}

/// Triangle list from a fan around its first index.
pub fn fan_to_triangles(fan: &[u32]) -> Vec<Vec<u32>> {
    match fan.split_first() {
        Some((&center, rest)) => rest
            .windows(2)
            .map(|w| vec![center, w[0], w[1]])
            .collect(),
        None => Vec::new(),
    }
}
