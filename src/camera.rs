//! Orbit camera: orientation state, view/projection matrices and GPU uniform.
//!
//! The [`Camera`] keeps yaw/pitch angles and derives an orthonormal
//! front/right/up basis from them after every change. Keyboard movement either
//! translates the camera or (the default) rotates its position around the world
//! origin, see [`MovementMode`].

use std::fmt;

use cgmath::{
    EuclideanSpace, InnerSpace, Matrix3, Matrix4, Point3, Rad, Vector3, perspective, ortho,
};
use wgpu::util::DeviceExt;

use crate::input::CameraController;

pub const YAW: f32 = -90.0;
pub const PITCH: f32 = 0.0;
pub const SPEED: f32 = 2.5;
/// Radians per second in orbital mode.
pub const ROTATION_SPEED: f32 = 1.0;
pub const SENSITIVITY: f32 = 0.1;
pub const ZOOM: f32 = 45.0;
pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 120.0;
/// Pitch limit that keeps the basis away from the poles.
pub const MAX_PITCH: f32 = 89.0;

pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 100.0;

/// cgmath produces OpenGL clip space (z in [-1, 1]), wgpu expects z in [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keyboard driven movement directions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// How [`Camera::apply_movement`] moves the camera.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MovementMode {
    /// Fly along the front and right vectors.
    Translational,
    /// Rotate the position around the origin, using the right axis for
    /// forward/backward and the up axis for left/right.
    #[default]
    Orbital,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ProjectionKind {
    #[default]
    Perspective,
    Orthographic,
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    front: Vector3<f32>,
    up: Vector3<f32>,
    right: Vector3<f32>,
    world_up: Vector3<f32>,
    // degrees
    yaw: f32,
    pitch: f32,
    pub movement_speed: f32,
    pub rotation_speed: f32,
    pub mouse_sensitivity: f32,
    zoom: f32,
    pub mode: MovementMode,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, V: Into<Vector3<f32>>>(
        position: P,
        world_up: V,
        yaw: f32,
        pitch: f32,
    ) -> Self {
        let world_up: Vector3<f32> = world_up.into();
        let mut camera = Self {
            position: position.into(),
            front: -Vector3::unit_z(),
            up: Vector3::unit_y(),
            right: Vector3::unit_x(),
            world_up: world_up.normalize(),
            yaw,
            pitch,
            movement_speed: SPEED,
            rotation_speed: ROTATION_SPEED,
            mouse_sensitivity: SENSITIVITY,
            zoom: ZOOM,
            mode: MovementMode::default(),
        };
        camera.update_orientation();
        camera
    }

    /// Camera at `position` looking down -Z with +Y up.
    pub fn at<P: Into<Point3<f32>>>(position: P) -> Self {
        Self::new(position, Vector3::unit_y(), YAW, PITCH)
    }

    pub fn with_mode(mut self, mode: MovementMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn world_up(&self) -> Vector3<f32> {
        self.world_up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Field of view in degrees, always within [`MIN_ZOOM`, `MAX_ZOOM`].
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn set_angles(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch;
        self.update_orientation();
    }

    /// Recompute front, right and up from yaw, pitch and the world up vector.
    pub fn update_orientation(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let front = Vector3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();

        let right = front.cross(self.world_up);
        // Looking straight along world up: keep the old right axis, minus its front component
        let right = if right.magnitude2() > 1e-10 {
            right.normalize()
        } else {
            (self.right - front * self.right.dot(front)).normalize()
        };

        self.front = front;
        self.right = right;
        self.up = right.cross(front).normalize();
    }

    pub fn apply_movement(&mut self, direction: CameraMovement, elapsed_seconds: f32) {
        match self.mode {
            MovementMode::Translational => {
                let velocity = self.movement_speed * elapsed_seconds;
                match direction {
                    CameraMovement::Forward => self.position += self.front * velocity,
                    CameraMovement::Backward => self.position -= self.front * velocity,
                    CameraMovement::Left => self.position -= self.right * velocity,
                    CameraMovement::Right => self.position += self.right * velocity,
                }
            }
            MovementMode::Orbital => {
                let d_theta = self.rotation_speed * elapsed_seconds;
                // Current basis vectors as axes through the origin
                let (axis, angle) = match direction {
                    CameraMovement::Forward => (self.right, -d_theta),
                    CameraMovement::Backward => (self.right, d_theta),
                    CameraMovement::Left => (self.up, -d_theta),
                    CameraMovement::Right => (self.up, d_theta),
                };
                let rotation = Matrix3::from_axis_angle(axis, Rad(angle));
                self.position = Point3::from_vec(rotation * self.position.to_vec());
            }
        }
        self.update_orientation();
    }

    /// Turn the camera by mouse offsets (in screen units, y pointing up).
    pub fn apply_look_delta(&mut self, dx: f32, dy: f32, constrain_pitch: bool) {
        self.yaw += dx * self.mouse_sensitivity;
        self.pitch += dy * self.mouse_sensitivity;

        if constrain_pitch {
            self.pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
        }

        self.update_orientation();
    }

    pub fn apply_zoom_delta(&mut self, dy: f32) {
        self.set_zoom(self.zoom - dy);
    }

    /// Right handed look-at matrix from the position along front.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /**
     * Projection in OpenGL clip space.
     *
     * Both kinds are driven by the zoom angle: perspective uses it as vertical
     * field of view, orthographic uses the same value in radians as half height
     * of the view box (and `aspect` times that as half width).
     */
    pub fn projection_matrix(
        &self,
        kind: ProjectionKind,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Matrix4<f32> {
        let fov = self.zoom.to_radians();
        match kind {
            ProjectionKind::Perspective => perspective(Rad(fov), aspect, near, far),
            ProjectionKind::Orthographic => {
                ortho(-fov * aspect, fov * aspect, -fov, fov, near, far)
            }
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::at((0.0, 0.0, 0.0))
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "X: {} Y: {} Z: {} Zoom: {}",
            self.position.x, self.position.y, self.position.z, self.zoom
        )
    }
}

/// Viewport dependent projection settings.
#[derive(Clone, Debug)]
pub struct Projection {
    pub kind: ProjectionKind,
    aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, kind: ProjectionKind) -> Self {
        let mut projection = Self {
            kind,
            aspect: 1.0,
            znear: DEFAULT_NEAR,
            zfar: DEFAULT_FAR,
        };
        projection.resize(width, height);
        projection
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self, camera: &Camera) -> Matrix4<f32> {
        camera.projection_matrix(self.kind, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj =
            (OPENGL_TO_WGPU_MATRIX * projection.calc_matrix(camera) * camera.view_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera state together with the GPU buffer and bind group it is uploaded to.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: Camera, projection: &Projection) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller: CameraController::new(),
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Refresh the uniform from the camera and write it to the GPU.
    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
