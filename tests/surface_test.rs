use flow_orbit::{
    data_structures::scene_graph::{ImportFlags, ImportedScene, RawMesh, SceneNode},
    resources::mesh::{build_parametric_surface, raw_geometry, sin_x_cos_y},
};

use crate::common::test_utils::assert_close;

mod common;

#[test]
fn two_by_two_flat_surface() {
    let mesh = build_parametric_surface(|_, _| 0.0, 0.0..=1.0, 0.0..=1.0, 2, 2).unwrap();

    let positions: Vec<[f32; 3]> = mesh.vertices().iter().map(|v| v.position).collect();
    assert_eq!(
        positions,
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0]
        ]
    );
    assert_eq!(mesh.indices(), &[0, 2, 1, 1, 2, 3]);
    assert!(mesh.indices().iter().all(|&i| i < 4));
}

#[test]
fn surface_samples_the_function() {
    let mesh = build_parametric_surface(|x, y| x * y, -1.0..=1.0, 0.0..=2.0, 3, 5).unwrap();
    assert_eq!(mesh.vertices().len(), 15);
    assert_eq!(mesh.triangle_count(), 2 * 4 * 2);
    for v in mesh.vertices() {
        assert_close(v.position[2], v.position[0] * v.position[1]);
    }
    // Texture coordinates span the unit square
    let last = mesh.vertices().last().unwrap();
    assert_eq!(last.tex_coords, [1.0, 1.0]);
    assert_eq!(last.position, [1.0, 2.0, 2.0]);
}

#[test]
fn surface_rejects_too_few_samples() {
    assert!(build_parametric_surface(|_, _| 0.0, 0.0..=1.0, 0.0..=1.0, 1, 2).is_err());
    assert!(build_parametric_surface(|_, _| 0.0, 0.0..=1.0, 0.0..=1.0, 2, 0).is_err());
}

#[test]
fn demo_surface_dimensions() {
    let mesh = sin_x_cos_y().unwrap();
    assert_eq!(mesh.vertices().len(), 50 * 50);
    assert_eq!(mesh.indices().len(), 49 * 49 * 6);
    let first = mesh.vertices()[0].position;
    assert_close(first[2], (-5.0f32).sin() + (-5.0f32).cos());
}

fn quad_with_bad_faces() -> RawMesh {
    RawMesh {
        name: "quad".to_string(),
        positions: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        tex_coords: vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]],
        faces: vec![vec![0, 1, 2], vec![0, 2], vec![0, 2, 7], vec![0, 2, 3]],
        ..Default::default()
    }
}

#[test]
fn raw_geometry_drops_malformed_faces() {
    let (vertices, indices) = raw_geometry(&quad_with_bad_faces());
    assert_eq!(vertices.len(), 4);
    assert_eq!(indices, vec![0, 1, 2, 0, 2, 3]);
}

#[test]
fn raw_geometry_without_normals_leaves_them_zero() {
    let (vertices, _) = raw_geometry(&quad_with_bad_faces());
    assert!(vertices.iter().all(|v| v.normal == [0.0; 3]));
    assert_eq!(vertices[2].tex_coords, [1.0, 1.0]);
}

#[test]
fn postprocess_generates_normals_tangents_and_flips_uvs() {
    let mut scene = ImportedScene {
        root: Some(SceneNode::new("root").with_meshes(vec![0])),
        meshes: vec![quad_with_bad_faces()],
        ..Default::default()
    };
    assert!(!scene.meshes[0].has_normals());
    scene.postprocess(&ImportFlags::default());

    let mesh = &scene.meshes[0];
    assert!(mesh.has_normals());
    let normals = mesh.normals.as_ref().unwrap();
    for n in normals {
        assert_close(n[2], 1.0);
    }
    // u runs along +x before the flip
    let tangents = mesh.tangents.as_ref().unwrap();
    assert_close(tangents[0][0], 1.0);
    assert_eq!(mesh.tex_coords[0][0], [0.0, 1.0]);
    assert_eq!(mesh.tex_coords[0][2], [1.0, 0.0]);
}

#[test]
fn postprocess_keeps_existing_normals() {
    let mut raw = quad_with_bad_faces();
    raw.normals = Some(vec![[0.0, 1.0, 0.0]; 4]);
    let mut scene = ImportedScene {
        meshes: vec![raw],
        ..Default::default()
    };
    scene.postprocess(&ImportFlags {
        flip_uvs: false,
        ..Default::default()
    });
    assert_eq!(scene.meshes[0].normals.as_ref().unwrap()[0], [0.0, 1.0, 0.0]);
    assert_eq!(scene.meshes[0].tex_coords[0][0], [0.0, 0.0]);
}
