//! Translation of window events into camera changes.

use std::collections::HashSet;

use instant::Duration;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::camera::{Camera, CameraMovement, Projection, ProjectionKind};

/// Pixels one line of a line based scroll wheel counts as.
const PIXELS_PER_LINE: f64 = 20.0;

/**
 * Collects keyboard, mouse and wheel input between frames and applies it to a
 * [`Camera`] in [`update`](Self::update).
 *
 * Held movement keys act every frame, scaled by the frame time. Mouse and wheel
 * offsets are accumulated and consumed once per frame.
 *
 * While the cursor is grabbed the look offset comes from raw mouse motion
 * ([`handle_mouse_motion`](Self::handle_mouse_motion)), since a locked or
 * confined cursor stops reporting positions. Otherwise it comes from cursor
 * positions.
 */
#[derive(Debug, Default)]
pub struct CameraController {
    held: HashSet<CameraMovement>,
    last_cursor: Option<PhysicalPosition<f64>>,
    cursor_grabbed: bool,
    look_delta: (f32, f32),
    scroll: f32,
    requested_projection: Option<ProjectionKind>,
    exit_requested: bool,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the event was consumed.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => self.handle_key(*key, *state),
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor(*position);
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.handle_scroll(match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => {
                        (*y / PIXELS_PER_LINE) as f32
                    }
                });
                true
            }
            _ => false,
        }
    }

    pub fn handle_key(&mut self, key: KeyCode, state: ElementState) -> bool {
        let pressed = state == ElementState::Pressed;
        let movement = match key {
            KeyCode::KeyW | KeyCode::ArrowUp => CameraMovement::Forward,
            KeyCode::KeyS | KeyCode::ArrowDown => CameraMovement::Backward,
            KeyCode::KeyA | KeyCode::ArrowLeft => CameraMovement::Left,
            KeyCode::KeyD | KeyCode::ArrowRight => CameraMovement::Right,
            KeyCode::KeyO if pressed => {
                self.requested_projection = Some(ProjectionKind::Orthographic);
                return true;
            }
            KeyCode::KeyP if pressed => {
                self.requested_projection = Some(ProjectionKind::Perspective);
                return true;
            }
            KeyCode::Escape if pressed => {
                self.exit_requested = true;
                return true;
            }
            _ => return false,
        };
        if pressed {
            self.held.insert(movement);
        } else {
            self.held.remove(&movement);
        }
        true
    }

    /// The first position only seeds the reference point and yields no offset.
    ///
    /// Ignored for looking while the cursor is grabbed.
    pub fn handle_cursor(&mut self, position: PhysicalPosition<f64>) {
        if let (Some(last), false) = (self.last_cursor, self.cursor_grabbed) {
            // Screen y grows downwards, pitch grows upwards
            self.look_delta.0 += (position.x - last.x) as f32;
            self.look_delta.1 += (last.y - position.y) as f32;
        }
        self.last_cursor = Some(position);
    }

    /// Relative mouse motion in device units, y growing downwards.
    pub fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        if self.cursor_grabbed {
            self.look_delta.0 += dx as f32;
            self.look_delta.1 -= dy as f32;
        }
    }

    pub fn set_cursor_grabbed(&mut self, grabbed: bool) {
        self.cursor_grabbed = grabbed;
    }

    pub fn cursor_grabbed(&self) -> bool {
        self.cursor_grabbed
    }

    /// Vertical wheel offset in lines, positive away from the user.
    pub fn handle_scroll(&mut self, lines: f32) {
        self.scroll += lines;
    }

    /// Forget the cursor reference, e.g. after the window lost focus.
    pub fn reset_cursor(&mut self) {
        self.last_cursor = None;
    }

    /// Drop every held key and pending offset.
    ///
    /// Key releases are not delivered to an unfocused window.
    pub fn release_all(&mut self) {
        self.held.clear();
        self.look_delta = (0.0, 0.0);
        self.scroll = 0.0;
        self.reset_cursor();
    }

    pub fn is_held(&self, movement: CameraMovement) -> bool {
        self.held.contains(&movement)
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Mouse offset collected since the last update.
    pub fn pending_look_delta(&self) -> (f32, f32) {
        self.look_delta
    }

    pub fn update(&mut self, camera: &mut Camera, projection: &mut Projection, dt: Duration) {
        let dt = dt.as_secs_f32();

        // Fixed order so simultaneous keys act the same every frame
        let mut moved = false;
        for movement in [
            CameraMovement::Forward,
            CameraMovement::Backward,
            CameraMovement::Left,
            CameraMovement::Right,
        ] {
            if self.held.contains(&movement) {
                camera.apply_movement(movement, dt);
                moved = true;
            }
        }
        if moved {
            log::debug!("{}", camera);
        }

        let (dx, dy) = std::mem::take(&mut self.look_delta);
        if dx != 0.0 || dy != 0.0 {
            camera.apply_look_delta(dx, dy, true);
        }

        let scroll = std::mem::take(&mut self.scroll);
        if scroll != 0.0 {
            camera.apply_zoom_delta(scroll);
        }

        if let Some(kind) = self.requested_projection.take() {
            log::info!("Switching to {:?} projection at {}", kind, camera);
            projection.kind = kind;
        }
    }
}
