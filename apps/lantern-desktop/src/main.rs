use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use glam::{Mat4, Vec3};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use lantern_assets::AssetStore;
use lantern_camera::Camera;
use lantern_input::{InputFrame, Key};
use lantern_render_wgpu::{device_limits, ForwardRenderer};
use lantern_scene::{EntitySet, LightKind, LightSet};
use lantern_uniform::SceneUniformWriter;

#[derive(Parser)]
#[command(name = "lantern-desktop", about = "Lantern rendering demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Cube grid side length
    #[arg(long, default_value_t = 4)]
    grid: u32,
}

/// Scene-side application state, independent of the GPU objects.
struct AppState {
    store: AssetStore,
    lights: LightSet,
    entities: EntitySet,
    camera: Camera,
    input: InputFrame,
    show_panel: bool,
    stress_lights: bool,
    lights_dirty: bool,
    last_frame: Instant,
    fps_frames: u32,
    fps_since: Instant,
    fps: f32,
}

impl AppState {
    fn new(grid: u32) -> Self {
        let mut store = AssetStore::new();
        let fallback = store.register_default_textures();
        let cube = store.register_default_cube();

        // Cube grid centered on the origin, 5 units apart.
        let mut entities = EntitySet::new();
        let half = (grid as f32 - 1.0) / 2.0;
        for x in 0..grid {
            for z in 0..grid {
                let translation =
                    Vec3::new((x as f32 - half) * 5.0, 0.0, (z as f32 - half) * 5.0);
                entities.spawn(Mat4::from_translation(translation), cube, fallback);
            }
        }
        tracing::info!(entities = entities.len(), "scene built");

        Self {
            store,
            lights: LightSet::default_rig(),
            entities,
            camera: Camera::default(),
            input: InputFrame::new(),
            show_panel: true,
            stress_lights: false,
            lights_dirty: false,
            last_frame: Instant::now(),
            fps_frames: 0,
            fps_since: Instant::now(),
            fps: 0.0,
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        let mapped = match key {
            KeyCode::KeyW => Some(Key::Forward),
            KeyCode::KeyS => Some(Key::Backward),
            KeyCode::KeyA => Some(Key::Left),
            KeyCode::KeyD => Some(Key::Right),
            KeyCode::Space => Some(Key::Up),
            KeyCode::ControlLeft => Some(Key::Down),
            KeyCode::ShiftLeft => Some(Key::Boost),
            _ => None,
        };
        if let Some(mapped) = mapped {
            self.input.set_key(mapped, pressed);
            return;
        }
        if !pressed {
            return;
        }
        match key {
            KeyCode::KeyF => self.input.press_recenter(),
            KeyCode::F1 => self.show_panel = !self.show_panel,
            _ => {}
        }
    }

    fn tick_fps(&mut self) {
        self.fps_frames += 1;
        let elapsed = self.fps_since.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            self.fps = self.fps_frames as f32 / elapsed;
            self.fps_frames = 0;
            self.fps_since = Instant::now();
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext, adapter_name: &str) {
        if !self.show_panel {
            return;
        }

        egui::SidePanel::left("scene_panel")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Lantern");
                ui.separator();
                ui.label(format!("Adapter: {adapter_name}"));
                ui.label(format!("FPS: {:.0}", self.fps));
                let pos = self.camera.position();
                ui.label(format!(
                    "Camera: ({:.1}, {:.1}, {:.1})",
                    pos.x, pos.y, pos.z
                ));
                ui.label(format!(
                    "Yaw {:.1}°  Pitch {:.1}°",
                    self.camera.yaw_deg(),
                    self.camera.pitch_deg()
                ));
                ui.separator();

                ui.heading("Scene");
                ui.label(format!("Entities: {}", self.entities.len()));
                if ui
                    .checkbox(&mut self.stress_lights, "Stress light grid")
                    .changed()
                {
                    self.lights = if self.stress_lights {
                        LightSet::stress_grid(4, 4, 5.0)
                    } else {
                        LightSet::default_rig()
                    };
                    self.lights_dirty = true;
                }
                ui.separator();

                ui.heading("Lights");
                for light in self.lights.iter() {
                    let tag = match light.kind {
                        LightKind::Directional => "dir",
                        LightKind::Point => "point",
                    };
                    ui.label(format!("{} [{tag}]", light.name));
                }

                ui.separator();
                ui.small("RMB: look | MMB: orbit | WASD: move | F: recenter");
            });
    }
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    writer: Option<SceneUniformWriter>,
    renderer: Option<ForwardRenderer>,
    adapter_name: String,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(grid: u32) -> Self {
        Self {
            state: AppState::new(grid),
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            writer: None,
            renderer: None,
            adapter_name: String::new(),
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Lantern")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("find adapter");
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lantern_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("create device");

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        self.state
            .camera
            .set_aspect(size.width as f32 / size.height.max(1) as f32);

        // Size the uniform buffers from the device, write the initial frame
        // data, and hand the resulting capacities to the renderer.
        let limits = device_limits(&device).expect("usable device limits");
        let mut writer = SceneUniformWriter::new(limits).expect("uniform buffers fit device limits");
        writer.rewrite_global(self.state.camera.position(), &self.state.lights);
        writer.rewrite_entities(&mut self.state.entities, self.state.camera.view_projection());

        let renderer = ForwardRenderer::new(
            &device,
            &queue,
            surface_format,
            size.width,
            size.height,
            &writer,
            &self.state.store,
        )
        .expect("build forward renderer");

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        self.adapter_name = adapter.get_info().name.clone();
        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            adapter = %self.adapter_name,
            "GPU initialized"
        );

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.writer = Some(writer);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(egui_winit) = &mut self.egui_winit {
            let response = egui_winit.on_window_event(self.window.as_ref().unwrap(), &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    self.state
                        .camera
                        .set_aspect(config.width as f32 / config.height.max(1) as f32);
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(device, config.width, config.height);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput { button, state, .. } => match button {
                MouseButton::Right => {
                    self.state.input.rotate_held = state == ElementState::Pressed;
                    if let Some(window) = &self.window {
                        window.set_cursor_visible(state != ElementState::Pressed);
                    }
                }
                MouseButton::Middle => {
                    self.state.input.orbit_held = state == ElementState::Pressed;
                }
                _ => {}
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let ticks = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.state.input.add_scroll(ticks);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
                self.state.last_frame = now;
                self.state.input.dt = dt;
                self.state.tick_fps();

                let camera_moved = self.state.camera.update(&mut self.state.input);

                let (Some(surface), Some(device), Some(queue), Some(writer), Some(renderer)) = (
                    &self.surface,
                    &self.device,
                    &self.queue,
                    &mut self.writer,
                    &self.renderer,
                ) else {
                    return;
                };

                // A moved camera re-derives the global block and patches the
                // combined matrix of every entity record; the world matrices
                // stay untouched at their session-fixed offsets.
                if camera_moved || self.state.lights_dirty {
                    writer.rewrite_global(self.state.camera.position(), &self.state.lights);
                    self.state.lights_dirty = false;
                }
                if camera_moved {
                    writer.patch_all(&self.state.entities, self.state.camera.view_projection());
                }
                renderer.upload(queue, writer);

                let output = match surface.get_current_texture() {
                    Ok(t) => t,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(config) = &self.config {
                            surface.configure(device, config);
                        }
                        return;
                    }
                    Err(e) => {
                        tracing::error!("surface error: {e}");
                        return;
                    }
                };
                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());

                renderer.render(device, queue, &view, &self.state.entities);

                let raw_input = self
                    .egui_winit
                    .as_mut()
                    .unwrap()
                    .take_egui_input(self.window.as_ref().unwrap());
                let adapter_name = self.adapter_name.clone();
                let full_output = self.egui_ctx.run(raw_input, |ctx| {
                    self.state.draw_ui(ctx, &adapter_name);
                });

                self.egui_winit.as_mut().unwrap().handle_platform_output(
                    self.window.as_ref().unwrap(),
                    full_output.platform_output,
                );
                let paint_jobs = self
                    .egui_ctx
                    .tessellate(full_output.shapes, full_output.pixels_per_point);
                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [
                        self.config.as_ref().unwrap().width,
                        self.config.as_ref().unwrap().height,
                    ],
                    pixels_per_point: full_output.pixels_per_point,
                };

                {
                    let egui_renderer = self.egui_renderer.as_mut().unwrap();
                    for (id, image_delta) in &full_output.textures_delta.set {
                        egui_renderer.update_texture(device, queue, *id, image_delta);
                    }
                    let mut encoder =
                        device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("egui_encoder"),
                        });
                    egui_renderer.update_buffers(
                        device,
                        queue,
                        &mut encoder,
                        &paint_jobs,
                        &screen_descriptor,
                    );
                    {
                        let mut pass = encoder
                            .begin_render_pass(&wgpu::RenderPassDescriptor {
                                label: Some("egui_pass"),
                                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                    view: &view,
                                    resolve_target: None,
                                    ops: wgpu::Operations {
                                        load: wgpu::LoadOp::Load,
                                        store: wgpu::StoreOp::Store,
                                    },
                                })],
                                depth_stencil_attachment: None,
                                ..Default::default()
                            })
                            .forget_lifetime();
                        egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
                    }
                    queue.submit(std::iter::once(encoder.finish()));
                    for id in &full_output.textures_delta.free {
                        egui_renderer.free_texture(id);
                    }
                }

                output.present();
                self.state.input.end_frame();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.input.rotate_held || self.state.input.orbit_held {
                self.state
                    .input
                    .add_mouse_delta(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("lantern-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(cli.grid.max(1));
    event_loop.run_app(&mut app)?;

    Ok(())
}
