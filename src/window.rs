//! Demo window: a campfire with smoke, and sparks on the space bar.
//!
//! Controls: drag with the left mouse button to orbit, scroll to zoom,
//! `Space` for a burst of sparks, `P` to pause, `Escape` to quit.
//!
//! `EMBERS_SEED` makes every run spawn the same particles and
//! `EMBERS_SPRITE` replaces the default sprite with an image file.

use std::sync::Arc;

use embers::prelude::*;
use embers::AppError;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

const SEED_VAR: &str = "EMBERS_SEED";
const SPRITE_VAR: &str = "EMBERS_SPRITE";
const SPARK_BURST: u32 = 48;
const TITLE_INTERVAL_FRAMES: u64 = 30;

/// An emitter and, once the device exists, its renderer.
struct Layer {
    name: &'static str,
    emitter: Emitter,
    renderer: Option<EmitterRenderer>,
}

pub struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    camera: Camera,
    clock: FrameClock,
    layers: Vec<Layer>,
    sparks: usize,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    error: Option<AppError>,
}

impl App {
    pub fn new() -> Result<Self, AppError> {
        let seed = read_seed();
        let origin = Vec3::ZERO;

        let configs = [
            ("smoke", EmitterConfig::smoke(origin + Vec3::new(0.0, 0.6, 0.0))),
            ("fire", EmitterConfig::fire(origin)),
            ("sparks", EmitterConfig::sparks(origin + Vec3::new(0.0, 0.2, 0.0))),
        ];

        let mut layers = Vec::with_capacity(configs.len());
        for (i, (name, config)) in configs.into_iter().enumerate() {
            let config = match seed {
                Some(seed) => config.with_seed(seed.wrapping_add(i as u64)),
                None => config,
            };
            layers.push(Layer {
                name,
                emitter: Emitter::new(config)?,
                renderer: None,
            });
        }
        let sparks = layers.len() - 1;

        Ok(Self {
            window: None,
            gpu: None,
            camera: Camera::new(),
            clock: FrameClock::new(),
            layers,
            sparks,
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        })
    }

    /// Report the error that ended the event loop, if any.
    pub fn finish(self) -> Result<(), AppError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attrs = Window::default_attributes()
            .with_title("embers")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;

        let size = window.inner_size();
        self.camera.set_viewport(size.width, size.height);

        let sprite = load_sprite();
        for layer in &mut self.layers {
            let mut renderer =
                EmitterRenderer::new(&gpu.device, &gpu.queue, gpu.format(), &layer.emitter)?;
            if let Some(config) = &sprite {
                renderer.set_texture(&gpu.device, config.upload(&gpu.device, &gpu.queue));
                renderer.set_sampler(&gpu.device, config.create_sampler(&gpu.device));
            }
            layer.renderer = Some(renderer);
        }

        log::info!(
            "{} emitters ready, {} particles total",
            self.layers.len(),
            self.layers.iter().map(|l| l.emitter.capacity()).sum::<usize>()
        );

        self.window = Some(window);
        self.gpu = Some(gpu);
        Ok(())
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let dt = self.clock.tick();
        for layer in &mut self.layers {
            layer.emitter.update(dt);
            if let Some(renderer) = &mut layer.renderer {
                if let Err(e) = renderer.prepare(&gpu.queue, &layer.emitter, &self.camera) {
                    log::error!("failed to upload {} particles: {e}", layer.name);
                }
            }
        }

        let renderers = self.layers.iter().filter_map(|l| l.renderer.as_ref());
        match gpu.render(renderers) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = winit::dpi::PhysicalSize::new(gpu.config.width, gpu.config.height);
                gpu.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("render error: {e:?}"),
        }

        if self.clock.frame() % TITLE_INTERVAL_FRAMES == 0 {
            if let Some(window) = &self.window {
                let live: usize = self.layers.iter().map(|l| l.emitter.live_count()).sum();
                window.set_title(&format!(
                    "embers | {live} particles | {:.0} fps",
                    self.clock.fps()
                ));
            }
        }
    }

    fn handle_key(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match event.physical_key {
            PhysicalKey::Code(KeyCode::Space) => {
                let stats = self.layers[self.sparks].emitter.burst(SPARK_BURST);
                log::debug!("spark burst: {} spawned, {} dropped", stats.spawned, stats.dropped);
            }
            PhysicalKey::Code(KeyCode::KeyP) => {
                self.clock.toggle_pause();
                log::info!("paused: {}", self.clock.is_paused());
            }
            PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_graphics(event_loop) {
            log::error!("{e}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(physical_size);
                }
                self.camera
                    .set_viewport(physical_size.width, physical_size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(&event, event_loop);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = position.x - last_x;
                        let dy = position.y - last_y;
                        self.camera.orbit(-dx as f32 * 0.005, dy as f32 * 0.005);
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.camera.zoom(scroll * 0.3);
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn read_seed() -> Option<u64> {
    let raw = std::env::var(SEED_VAR).ok()?;
    match raw.trim().parse() {
        Ok(seed) => {
            log::info!("using {SEED_VAR}={seed}");
            Some(seed)
        }
        Err(e) => {
            log::warn!("ignoring {SEED_VAR}={raw:?}: {e}");
            None
        }
    }
}

fn load_sprite() -> Option<TextureConfig> {
    let path = std::env::var_os(SPRITE_VAR)?;
    match TextureConfig::from_file(&path) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("keeping default sprite, could not load {path:?}: {e}");
            None
        }
    }
}
