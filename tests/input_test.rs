use cgmath::{EuclideanSpace, InnerSpace};
use flow_orbit::{
    camera::{Camera, CameraMovement, Projection, ProjectionKind},
    input::CameraController,
};
use instant::Duration;
use winit::{dpi::PhysicalPosition, event::ElementState, keyboard::KeyCode};

use crate::common::test_utils::assert_close;

mod common;

fn setup() -> (CameraController, Camera, Projection) {
    (
        CameraController::new(),
        Camera::at((0.0, 1.0, 3.0)),
        Projection::new(800, 600, ProjectionKind::Perspective),
    )
}

#[test]
fn first_cursor_sample_yields_no_offset() {
    let mut controller = CameraController::new();
    controller.handle_cursor(PhysicalPosition::new(400.0, 300.0));
    assert_eq!(controller.pending_look_delta(), (0.0, 0.0));

    controller.handle_cursor(PhysicalPosition::new(410.0, 290.0));
    // y is inverted: moving the cursor up looks up
    assert_eq!(controller.pending_look_delta(), (10.0, 10.0));
}

#[test]
fn cursor_reset_starts_a_new_reference() {
    let mut controller = CameraController::new();
    controller.handle_cursor(PhysicalPosition::new(0.0, 0.0));
    controller.reset_cursor();
    controller.handle_cursor(PhysicalPosition::new(500.0, 500.0));
    assert_eq!(controller.pending_look_delta(), (0.0, 0.0));
}

#[test]
fn movement_keys_are_held_until_released() {
    let mut controller = CameraController::new();
    assert!(controller.handle_key(KeyCode::KeyW, ElementState::Pressed));
    assert!(controller.handle_key(KeyCode::ArrowLeft, ElementState::Pressed));
    assert!(controller.is_held(CameraMovement::Forward));
    assert!(controller.is_held(CameraMovement::Left));

    controller.handle_key(KeyCode::KeyW, ElementState::Released);
    assert!(!controller.is_held(CameraMovement::Forward));
    assert!(!controller.handle_key(KeyCode::KeyQ, ElementState::Pressed));
}

#[test]
fn escape_requests_exit() {
    let mut controller = CameraController::new();
    assert!(!controller.exit_requested());
    controller.handle_key(KeyCode::Escape, ElementState::Pressed);
    assert!(controller.exit_requested());
}

#[test]
fn update_moves_camera_while_key_is_held() {
    let (mut controller, mut camera, mut projection) = setup();
    let distance = camera.position.to_vec().magnitude();
    controller.handle_key(KeyCode::KeyD, ElementState::Pressed);
    controller.update(&mut camera, &mut projection, Duration::from_millis(500));
    assert!(camera.position.x > 0.1);
    assert_close(camera.position.to_vec().magnitude(), distance);

    controller.handle_key(KeyCode::KeyD, ElementState::Released);
    let before = camera.position;
    controller.update(&mut camera, &mut projection, Duration::from_millis(500));
    assert_eq!(camera.position, before);
}

#[test]
fn update_consumes_look_and_scroll_offsets() {
    let (mut controller, mut camera, mut projection) = setup();
    controller.handle_cursor(PhysicalPosition::new(100.0, 100.0));
    controller.handle_cursor(PhysicalPosition::new(110.0, 100.0));
    controller.handle_scroll(5.0);

    controller.update(&mut camera, &mut projection, Duration::from_millis(16));
    assert_close(camera.yaw(), -89.0);
    assert_close(camera.zoom(), 40.0);
    assert_eq!(controller.pending_look_delta(), (0.0, 0.0));

    // Nothing new: the camera stays put
    controller.update(&mut camera, &mut projection, Duration::from_millis(16));
    assert_close(camera.yaw(), -89.0);
    assert_close(camera.zoom(), 40.0);
}

#[test]
fn projection_keys_switch_projection_kind() {
    let (mut controller, mut camera, mut projection) = setup();
    controller.handle_key(KeyCode::KeyO, ElementState::Pressed);
    controller.update(&mut camera, &mut projection, Duration::ZERO);
    assert_eq!(projection.kind, ProjectionKind::Orthographic);

    controller.handle_key(KeyCode::KeyP, ElementState::Pressed);
    controller.update(&mut camera, &mut projection, Duration::ZERO);
    assert_eq!(projection.kind, ProjectionKind::Perspective);
}

#[test]
fn grabbed_cursor_looks_with_relative_motion() {
    let (mut controller, mut camera, mut projection) = setup();
    controller.set_cursor_grabbed(true);

    // A locked cursor keeps reporting the same position
    controller.handle_cursor(PhysicalPosition::new(400.0, 300.0));
    controller.handle_cursor(PhysicalPosition::new(400.0, 300.0));
    controller.handle_mouse_motion(10.0, -20.0);
    controller.handle_mouse_motion(10.0, 0.0);
    // Device y grows downwards, moving the mouse up looks up
    assert_eq!(controller.pending_look_delta(), (20.0, 20.0));

    controller.update(&mut camera, &mut projection, Duration::from_millis(16));
    assert_close(camera.yaw(), -88.0);
    assert_close(camera.pitch(), 2.0);
}

#[test]
fn grabbed_cursor_ignores_absolute_positions() {
    let mut controller = CameraController::new();
    controller.set_cursor_grabbed(true);
    controller.handle_cursor(PhysicalPosition::new(0.0, 0.0));
    controller.handle_cursor(PhysicalPosition::new(50.0, 50.0));
    assert_eq!(controller.pending_look_delta(), (0.0, 0.0));
}

#[test]
fn free_cursor_ignores_relative_motion() {
    let mut controller = CameraController::new();
    assert!(!controller.cursor_grabbed());
    controller.handle_mouse_motion(10.0, 10.0);
    assert_eq!(controller.pending_look_delta(), (0.0, 0.0));
}

#[test]
fn release_all_stops_held_movement() {
    let (mut controller, mut camera, mut projection) = setup();
    controller.handle_key(KeyCode::KeyW, ElementState::Pressed);
    controller.handle_cursor(PhysicalPosition::new(0.0, 0.0));
    controller.handle_cursor(PhysicalPosition::new(5.0, 0.0));

    // Focus lost: the release of W never arrives
    controller.release_all();
    assert!(!controller.is_held(CameraMovement::Forward));
    assert_eq!(controller.pending_look_delta(), (0.0, 0.0));

    let before = camera.position;
    controller.update(&mut camera, &mut projection, Duration::from_millis(500));
    assert_eq!(camera.position, before);
    assert_close(camera.yaw(), -90.0);

    // The next cursor sample only seeds the reference again
    controller.handle_cursor(PhysicalPosition::new(100.0, 100.0));
    assert_eq!(controller.pending_look_delta(), (0.0, 0.0));
}

#[test]
fn projection_switch_is_applied_with_the_other_input() {
    let (mut controller, mut camera, mut projection) = setup();
    controller.handle_key(KeyCode::KeyO, ElementState::Pressed);
    controller.handle_scroll(5.0);
    controller.update(&mut camera, &mut projection, Duration::ZERO);
    assert_eq!(projection.kind, ProjectionKind::Orthographic);
    assert_close(camera.zoom(), 40.0);
    // The orthographic matrix picks up the zoom of the same update
    let m = projection.calc_matrix(&camera);
    assert_close(m.y.y, 1.0 / 40f32.to_radians());
}
