//! Lantern - a small Vulkan forward renderer.
//!
//! Main entry point: builds the window and renderer, populates the demo
//! scene, and drives the event/render loop.

mod camera_controller;

use std::path::Path;

use anyhow::Result;
use glam::Vec3;
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use lantern_core::Timer;
use lantern_platform::{InputState, Window};
use lantern_renderer::{Renderer, RendererError};
use lantern_scene::Transform;

use camera_controller::CameraController;

const WINDOW_WIDTH: u32 = 800;
const WINDOW_HEIGHT: u32 = 600;
const WINDOW_TITLE: &str = "Lantern";

/// Colors for the orbiting light ring.
const LIGHT_COLORS: [Vec3; 6] = [
    Vec3::new(1.0, 0.1, 0.1),
    Vec3::new(0.1, 0.1, 1.0),
    Vec3::new(0.1, 1.0, 0.1),
    Vec3::new(1.0, 1.0, 0.1),
    Vec3::new(0.1, 1.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
];

struct App {
    window: Option<Window>,
    renderer: Option<Renderer>,
    input: InputState,
    timer: Timer,
    controller: CameraController,
    fatal: Option<RendererError>,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            renderer: None,
            input: InputState::new(),
            timer: Timer::new(),
            // Start slightly above the scene, looking down at it
            controller: CameraController::new(0.0, -0.35),
            fatal: None,
        }
    }

    /// Loads the demo scene: a floor, two cubes, and a ring of lights.
    fn setup_scene(renderer: &mut Renderer) -> Result<(), RendererError> {
        let cube = renderer.load_model(Path::new("assets/models/cube.obj"))?;
        let floor = renderer.load_model(Path::new("assets/models/quad.obj"))?;

        renderer.camera_mut().position = Vec3::new(0.0, 1.5, 4.0);

        let objects = renderer.game_objects_mut();

        let floor_object = objects.spawn();
        floor_object.model = Some(floor);
        floor_object.transform = Transform::new().with_scale(Vec3::new(3.0, 1.0, 3.0));

        let cube_object = objects.spawn();
        cube_object.model = Some(cube.clone());
        cube_object.transform = Transform::new()
            .with_translation(Vec3::new(-0.8, 0.5, 0.0))
            .with_scale(Vec3::splat(0.5));

        let small_cube = objects.spawn();
        small_cube.model = Some(cube);
        small_cube.color = Vec3::new(0.9, 0.6, 0.2);
        small_cube.transform = Transform::new()
            .with_translation(Vec3::new(0.9, 0.25, 0.6))
            .with_rotation(Vec3::new(0.0, 0.6, 0.0))
            .with_scale(Vec3::splat(0.25));

        // Evenly spaced lights orbiting the scene center
        for (i, color) in LIGHT_COLORS.iter().enumerate() {
            let angle = i as f32 * std::f32::consts::TAU / LIGHT_COLORS.len() as f32;
            let light = objects.spawn_point_light(0.6, 0.08, *color);
            light.transform.translation =
                Vec3::new(2.0 * angle.cos(), 1.6, 2.0 * angle.sin());
        }

        info!("Scene loaded: {} objects", renderer.game_objects().len());
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            match Window::new(event_loop, WINDOW_WIDTH, WINDOW_HEIGHT, WINDOW_TITLE) {
                Ok(window) => {
                    // Create renderer and scene after the window exists
                    let result = Renderer::new(
                        &window,
                        Some(Path::new("assets/textures/base_color.png")),
                    )
                    .and_then(|mut renderer| {
                        Self::setup_scene(&mut renderer)?;
                        Ok(renderer)
                    });

                    match result {
                        Ok(renderer) => {
                            info!("Initialization complete, entering main loop");
                            self.renderer = Some(renderer);
                            self.window = Some(window);
                        }
                        Err(e) => {
                            error!("Failed to create renderer: {}", e);
                            self.fatal = Some(e);
                            event_loop.exit();
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to create window: {}", e);
                    self.fatal = Some(RendererError::Window(e.to_string()));
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(ref mut window) = self.window {
                    window.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let dt = self.timer.delta_secs();

                if let Some(ref mut renderer) = self.renderer {
                    // Consume the resize flag accumulated since last frame
                    if let Some(ref mut window) = self.window {
                        if window.was_resized() {
                            renderer.resize(window.width(), window.height());
                            window.reset_resized();
                        }
                    }

                    self.controller
                        .update(&self.input, dt, renderer.camera_mut());

                    if let Err(e) = renderer.render_frame(dt) {
                        error!("Render error: {}", e);
                        self.fatal = Some(e);
                        event_loop.exit();
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::PhysicalKey;
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.state.is_pressed() {
                        self.input.on_key_pressed(key);
                    } else {
                        self.input.on_key_released(key);
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.input.begin_frame();
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    lantern_core::init_logging();
    info!("Starting Lantern");

    // Create event loop
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    // Create app and run
    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    if let Some(e) = app.fatal {
        return Err(e.into());
    }

    info!("Stopped cleanly");
    Ok(())
}
