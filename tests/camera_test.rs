use cgmath::{EuclideanSpace, InnerSpace, Vector3, Vector4};
use flow_orbit::camera::{
    Camera, CameraMovement, MAX_PITCH, MAX_ZOOM, MIN_ZOOM, MovementMode, Projection,
    ProjectionKind,
};

use crate::common::test_utils::assert_close;

mod common;

fn assert_orthonormal(camera: &Camera) {
    let (f, r, u) = (camera.front(), camera.right(), camera.up());
    assert_close(f.magnitude(), 1.0);
    assert_close(r.magnitude(), 1.0);
    assert_close(u.magnitude(), 1.0);
    assert_close(f.dot(r), 0.0);
    assert_close(f.dot(u), 0.0);
    assert_close(r.dot(u), 0.0);
}

#[test]
fn default_camera_looks_down_negative_z() {
    let camera = Camera::at((0.0, 1.0, 3.0));
    assert_eq!(camera.mode, MovementMode::Orbital);
    assert_close(camera.zoom(), 45.0);
    assert_close(camera.front().z, -1.0);
    assert_close(camera.right().x, 1.0);
    assert_close(camera.up().y, 1.0);
}

#[test]
fn basis_is_orthonormal_for_any_angles() {
    let mut camera = Camera::default();
    for yaw in (-360..=360).step_by(15) {
        for pitch in (-90..=90).step_by(5) {
            camera.set_angles(yaw as f32, pitch as f32);
            assert_orthonormal(&camera);
        }
    }
}

#[test]
fn constrained_pitch_stays_within_limits() {
    let mut camera = Camera::default();
    camera.apply_look_delta(0.0, 10_000.0, true);
    assert_close(camera.pitch(), MAX_PITCH);
    camera.apply_look_delta(0.0, -100_000.0, true);
    assert_close(camera.pitch(), -MAX_PITCH);
    assert_orthonormal(&camera);
}

#[test]
fn unconstrained_pitch_is_not_clamped() {
    let mut camera = Camera::default();
    camera.apply_look_delta(0.0, 1_000.0, false);
    assert_close(camera.pitch(), 100.0);
}

#[test]
fn look_delta_scales_with_sensitivity() {
    let mut camera = Camera::default();
    camera.apply_look_delta(10.0, -20.0, true);
    assert_close(camera.yaw(), -89.0);
    assert_close(camera.pitch(), -2.0);
}

#[test]
fn zoom_stays_within_limits() {
    let mut camera = Camera::default();
    camera.apply_zoom_delta(1_000.0);
    assert_close(camera.zoom(), MIN_ZOOM);
    camera.apply_zoom_delta(-1_000.0);
    assert_close(camera.zoom(), MAX_ZOOM);
    camera.apply_zoom_delta(20.0);
    assert_close(camera.zoom(), 100.0);
}

#[test]
fn orbital_movement_keeps_distance_to_origin() {
    let mut camera = Camera::at((0.0, 1.0, 3.0));
    let distance = camera.position.to_vec().magnitude();
    let moves = [
        CameraMovement::Forward,
        CameraMovement::Left,
        CameraMovement::Backward,
        CameraMovement::Right,
        CameraMovement::Forward,
    ];
    for (i, movement) in moves.iter().cycle().take(50).enumerate() {
        camera.apply_movement(*movement, 0.01 * (i % 7) as f32 + 0.05);
        assert_close(camera.position.to_vec().magnitude(), distance);
    }
    assert_orthonormal(&camera);
}

#[test]
fn orbital_movement_keeps_angles() {
    let mut camera = Camera::at((0.0, 1.0, 3.0));
    camera.apply_movement(CameraMovement::Right, 0.3);
    assert_close(camera.yaw(), -90.0);
    assert_close(camera.pitch(), 0.0);
    assert!((camera.position.x - 0.0).abs() > 1e-3, "camera did not move");
}

#[test]
fn translational_movement_follows_basis() {
    let mut camera = Camera::at((0.0, 0.0, 0.0)).with_mode(MovementMode::Translational);
    camera.apply_movement(CameraMovement::Forward, 1.0);
    assert_close(camera.position.x, 0.0);
    assert_close(camera.position.z, -2.5);

    camera.apply_movement(CameraMovement::Right, 2.0);
    assert_close(camera.position.x, 5.0);

    camera.apply_movement(CameraMovement::Backward, 1.0);
    camera.apply_movement(CameraMovement::Left, 2.0);
    assert_close(camera.position.x, 0.0);
    assert_close(camera.position.z, 0.0);
}

#[test]
fn view_matrix_moves_eye_to_origin() {
    let camera = Camera::at((0.0, 0.0, 3.0));
    let origin = camera.view_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
    assert_close(origin.x, 0.0);
    assert_close(origin.y, 0.0);
    assert_close(origin.z, -3.0);
    assert_close(origin.w, 1.0);

    let eye = camera.view_matrix() * camera.position.to_homogeneous();
    assert!(eye.truncate().magnitude() < 1e-4);
}

#[test]
fn perspective_uses_zoom_as_field_of_view() {
    let camera = Camera::default();
    let m = camera.projection_matrix(ProjectionKind::Perspective, 2.0, 0.1, 100.0);
    let f = 1.0 / (22.5f32).to_radians().tan();
    assert_close(m.y.y, f);
    assert_close(m.x.x, f / 2.0);
}

#[test]
fn orthographic_uses_zoom_radians_as_half_extent() {
    let camera = Camera::default();
    let half_height = 45.0f32.to_radians();
    let m = camera.projection_matrix(ProjectionKind::Orthographic, 2.0, 0.1, 100.0);
    assert_close(m.y.y, 1.0 / half_height);
    assert_close(m.x.x, 1.0 / (half_height * 2.0));
}

#[test]
fn projection_tracks_aspect_and_ignores_empty_sizes() {
    let mut projection = Projection::new(800, 600, ProjectionKind::Perspective);
    assert_close(projection.aspect(), 800.0 / 600.0);
    projection.resize(0, 600);
    assert_close(projection.aspect(), 800.0 / 600.0);
    projection.resize(1000, 500);
    assert_close(projection.aspect(), 2.0);
}

#[test]
fn display_reports_position_and_zoom() {
    let camera = Camera::new((1.0, 2.0, 3.0), Vector3::unit_y(), -90.0, 0.0);
    assert_eq!(camera.to_string(), "X: 1 Y: 2 Z: 3 Zoom: 45");
}
