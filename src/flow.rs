//! Application event loop.
//!
//! [`run`] opens the window, initialises the GPU [`Context`], lets the caller
//! build a [`Scene`] and then renders it every frame until the window is closed
//! or Escape is pressed.
//!
//! # Lifecycle
//!
//! Each frame:
//! 1. Collect window events into the camera controller
//! 2. Apply held keys, mouse offsets and wheel input to the camera
//! 3. Upload the camera uniform
//! 4. Clear colour and depth, draw every scene object
//! 5. Present the frame

use std::{fmt::Debug, iter, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{CursorGrabMode, Window, WindowId},
};

use crate::{config::Config, context::Context, render::Scene};

/// Builds the scene once the GPU context exists.
pub type SceneConstructor = Box<dyn FnOnce(&mut Context) -> anyhow::Result<Scene>>;

/// GPU context, scene and surface status.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    scene: Scene,
    is_surface_configured: bool,
}

impl AppState {
    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.scene.draw(
                &mut render_pass,
                &self.ctx.pipelines,
                &self.ctx.camera.bind_group,
            );
        }
        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    settings: Config,
    state: Option<AppState>,
    // Taken when the window is created
    constructor: Option<SceneConstructor>,
    last_time: Instant,
    // Returned from `run` once the event loop stopped
    init_error: Option<anyhow::Error>,
}

impl App {
    fn new(settings: Config, constructor: SceneConstructor) -> anyhow::Result<Self> {
        // Only used to drive the async wgpu initialisation
        let async_runtime = tokio::runtime::Builder::new_current_thread().build()?;
        Ok(Self {
            async_runtime,
            settings,
            state: None,
            constructor: Some(constructor),
            last_time: Instant::now(),
            init_error: None,
        })
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<AppState> {
        let window_attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.width,
                self.settings.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let grabbed = self.settings.grab_cursor && grab_cursor(&window);

        let mut ctx = self
            .async_runtime
            .block_on(Context::new(window, &self.settings))?;
        ctx.camera.controller.set_cursor_grabbed(grabbed);
        let scene = match self.constructor.take() {
            Some(constructor) => constructor(&mut ctx)?,
            None => Scene::new(),
        };
        log::info!("Scene ready with {} object(s)", scene.len());

        let mut state = AppState {
            ctx,
            scene,
            is_surface_configured: false,
        };
        let size = state.ctx.window.inner_size();
        state.resize(size.width, size.height);
        Ok(state)
    }

    fn fail(&mut self, error: anyhow::Error) {
        log::error!("App initialization failed: {:#}", error);
        self.init_error = Some(error);
    }

    /// The initialization error, if the window or GPU context could not be created.
    fn finish(self) -> anyhow::Result<()> {
        match self.init_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn update(state: &mut AppState, dt: instant::Duration) {
        let ctx = &mut state.ctx;
        ctx.camera
            .controller
            .update(&mut ctx.camera.camera, &mut ctx.projection, dt);
        ctx.camera.write_to_buffer(&ctx.queue, &ctx.projection);
    }
}

impl Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("state", &self.state)
            .field("last_time", &self.last_time)
            .finish_non_exhaustive()
    }
}

/// Returns true if the cursor is locked or confined to the window.
fn grab_cursor(window: &Window) -> bool {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    window.set_cursor_visible(false);
    match grabbed {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Cursor could not be grabbed: {}", e);
            false
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(state) => {
                self.last_time = Instant::now();
                state.ctx.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => {
                self.fail(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);
        if state.ctx.camera.controller.exit_requested() {
            log::info!("{}", state.ctx.camera.camera);
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::Focused(false) => state.ctx.camera.controller.release_all(),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                Self::update(state, dt);
                match state.render() {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("The GPU ran out of memory, exiting.");
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        // Raw motion is reported even while another window has focus
        if !state.ctx.window.has_focus() {
            return;
        }
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            state.ctx.camera.controller.handle_mouse_motion(dx, dy);
        }
    }
}

/// Opens the window and runs the render loop until it is closed.
pub fn run<F>(settings: Config, build_scene: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut Context) -> anyhow::Result<Scene> + 'static,
{
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings, Box::new(build_scene))?;
    event_loop.run_app(&mut app)?;
    app.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_scene(_ctx: &mut Context) -> anyhow::Result<Scene> {
        Ok(Scene::new())
    }

    fn app() -> App {
        App::new(Config::default(), Box::new(empty_scene)).unwrap()
    }

    #[test]
    fn finish_is_ok_without_init_error() {
        assert!(app().finish().is_ok());
    }

    #[test]
    fn init_error_is_returned_from_finish() {
        let mut app = app();
        app.fail(anyhow::anyhow!("no suitable GPU adapter"));
        let err = app.finish().unwrap_err();
        assert_eq!(err.to_string(), "no suitable GPU adapter");
    }
}
