use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use glam::{Vec2, Vec3};
use shellfur_assets::{Material, Mesh, SHELL_SHADER};
use shellfur_author::ParameterEditor;
use shellfur_common::{Color, EntityId, Transform};
use shellfur_input::{InputBindings, InputSample, Key, KeyState};
use shellfur_render_wgpu::{OrbitCamera, ShellFrame, WgpuShellRenderer};
use shellfur_shell::{FurConfig, ParameterField, ShellFur, Stage};
use shellfur_tools::FurInspector;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "shellfur-desktop", about = "Interactive shell fur viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML or JSON fur config
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Application state.
struct AppState {
    stage: Stage,
    fur: ShellFur,
    body: EntityId,
    editor: ParameterEditor,
    camera: OrbitCamera,
    keys: KeyState,
    bindings: InputBindings,
    ctrl_held: bool,
    show_inspector: bool,
    last_error: Option<String>,
    mouse_captured: bool,
    started: Instant,
    last_frame: Instant,
}

impl AppState {
    fn new(config: FurConfig) -> Self {
        let mut stage = Stage::new();
        let body = stage
            .scene
            .spawn(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));
        stage.components.set_name(body, "Body".to_string());
        let mesh = stage.assets.register_mesh(Mesh::uv_sphere(1.0, 48, 24));
        let material = stage
            .assets
            .register_material(Material::from_shader(SHELL_SHADER));
        let fur = ShellFur::from_config(body, &config, Some(mesh), Some(material));

        let mut state = Self {
            stage,
            fur,
            body,
            editor: ParameterEditor::new(),
            camera: OrbitCamera::default(),
            keys: KeyState::new(),
            bindings: InputBindings::default(),
            ctrl_held: false,
            show_inspector: true,
            last_error: None,
            mouse_captured: false,
            started: Instant::now(),
            last_frame: Instant::now(),
        };
        state.set_active(true);
        state
    }

    fn set_active(&mut self, active: bool) {
        if active {
            if let Err(e) = self.fur.on_activate(&mut self.stage) {
                tracing::error!("activation failed: {e}");
                self.last_error = Some(e.to_string());
            } else {
                self.last_error = None;
            }
        } else {
            self.fur.on_deactivate(&mut self.stage);
        }
    }

    /// One frame: capture input once, hand it to the fur, step the scene.
    fn update(&mut self, dt: f32) {
        let sample = if self.ctrl_held {
            InputSample::IDLE
        } else {
            InputSample::capture(&self.keys, &self.bindings)
        };
        self.fur.update(&mut self.stage, &sample, dt);
        self.stage.scene.step(dt);
        self.stage.drain_events();

        if let Some(body) = self.stage.scene.world_transform(self.body) {
            self.camera.follow(body.position, 4.0, dt);
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if matches!(key, KeyCode::ControlLeft | KeyCode::ControlRight) {
            self.ctrl_held = pressed;
        }
        if let Some(key) = map_key(key) {
            self.keys.set(key, pressed);
        }

        if !pressed {
            return;
        }

        match key {
            KeyCode::KeyZ if self.ctrl_held => {
                self.report(|state| state.editor.undo(&mut state.fur, &mut state.stage));
            }
            KeyCode::KeyY if self.ctrl_held => {
                self.report(|state| state.editor.redo(&mut state.fur, &mut state.stage));
            }
            KeyCode::Space => {
                let active = self.fur.is_active();
                self.set_active(!active);
            }
            KeyCode::F1 => {
                self.show_inspector = !self.show_inspector;
            }
            _ => {}
        }
    }

    fn report<E: std::fmt::Display>(&mut self, edit: impl FnOnce(&mut Self) -> Result<bool, E>) {
        if let Err(e) = edit(self) {
            tracing::error!("edit failed: {e}");
            self.last_error = Some(e.to_string());
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_inspector {
            return;
        }

        let summary = FurInspector::summary(&self.fur, &self.stage);

        egui::SidePanel::left("inspector")
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.heading("Shell Fur");
                ui.separator();
                ui.label(format!("Frame: {}", summary.frame));
                ui.label(format!(
                    "Shells: {} live / {} requested",
                    summary.live_instances, summary.shell_count
                ));
                ui.label(format!(
                    "Lean: ({:.2}, {:.2}, {:.2})",
                    summary.displacement.x, summary.displacement.y, summary.displacement.z
                ));
                ui.label(format!(
                    "Publishes: {}  Surface writes: {}",
                    summary.publishes, summary.surface_writes
                ));
                if let Some(err) = &self.last_error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }
                ui.separator();

                ui.horizontal(|ui| {
                    let label = if summary.active {
                        "Deactivate (Space)"
                    } else {
                        "Activate (Space)"
                    };
                    if ui.button(label).clicked() {
                        self.set_active(!summary.active);
                    }
                    let mut auto_update = self.fur.auto_update();
                    if ui.checkbox(&mut auto_update, "Auto update").changed() {
                        self.fur.set_auto_update(auto_update);
                    }
                });
                ui.horizontal(|ui| {
                    if ui.button("Undo (Ctrl+Z)").clicked() {
                        self.report(|state| state.editor.undo(&mut state.fur, &mut state.stage));
                    }
                    if ui.button("Redo (Ctrl+Y)").clicked() {
                        self.report(|state| state.editor.redo(&mut state.fur, &mut state.stage));
                    }
                });
                ui.label(format!(
                    "Undo: {} / Redo: {}",
                    self.editor.undo_count(),
                    self.editor.redo_count()
                ));

                ui.separator();
                ui.heading("Parameters");
                for field in ParameterField::ALL {
                    let (min, max) = field.range();
                    let mut value = field.get(self.fur.params());
                    let mut slider = egui::Slider::new(&mut value, min..=max).text(field.label());
                    if field.is_integer() {
                        slider = slider.step_by(1.0);
                    }
                    if ui.add(slider).changed() {
                        self.report(|state| {
                            state
                                .editor
                                .set_scalar(&mut state.fur, &mut state.stage, field, value)
                        });
                    }
                }

                let mut rgba = self.fur.params().shell_color.to_array();
                ui.horizontal(|ui| {
                    ui.label("Shell color");
                    if ui.color_edit_button_rgba_unmultiplied(&mut rgba).changed() {
                        let color = Color::new(rgba[0], rgba[1], rgba[2], rgba[3]);
                        self.report(|state| {
                            state.editor.set_color(&mut state.fur, &mut state.stage, color)
                        });
                    }
                });

                let wind = self.fur.params().wind_dir_change_speed;
                let mut wind_on = wind.is_some();
                let mut speed = wind.unwrap_or(Vec2::ZERO).to_array();
                let mut changed = ui.checkbox(&mut wind_on, "Wind").changed();
                if wind_on {
                    ui.horizontal(|ui| {
                        changed |= ui
                            .add(egui::DragValue::new(&mut speed[0]).prefix("X: ").speed(0.05))
                            .changed();
                        changed |= ui
                            .add(egui::DragValue::new(&mut speed[1]).prefix("Y: ").speed(0.05))
                            .changed();
                    });
                }
                if changed {
                    let new = wind_on.then(|| Vec2::from_array(speed));
                    self.report(|state| state.editor.set_wind(&mut state.fur, &mut state.stage, new));
                }

                ui.separator();
                ui.small("WASD/QE: Move | RMB: Orbit | Wheel: Zoom | F1: Toggle Inspector");
            });
    }
}

fn map_key(key: KeyCode) -> Option<Key> {
    Some(match key {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyE => Key::E,
        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        _ => return None,
    })
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<WgpuShellRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(config: FurConfig) -> Self {
        Self {
            state: AppState::new(config),
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
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
            .with_title("Shell Fur")
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
                label: Some("shellfur_device"),
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

        self.state.camera.aspect = size.width as f32 / size.height.max(1) as f32;

        let renderer = WgpuShellRenderer::new(&device, surface_format, size.width, size.height);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.state.fur.on_deactivate(&mut self.state.stage);
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    self.state.camera.aspect =
                        config.width as f32 / config.height.max(1) as f32;
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
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state: btn_state,
                ..
            } => {
                self.state.mouse_captured = btn_state == ElementState::Pressed;
                if let Some(window) = &self.window {
                    window.set_cursor_visible(!self.state.mouse_captured);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                self.state.camera.zoom(amount);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
                self.state.last_frame = now;
                self.state.update(dt);

                let (Some(surface), Some(device), Some(queue), Some(window)) =
                    (&self.surface, &self.device, &self.queue, &self.window)
                else {
                    return;
                };

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

                if let Some(renderer) = &mut self.renderer {
                    let state = &self.state;
                    let playing = state.fur.is_active();
                    renderer.render(
                        device,
                        queue,
                        &view,
                        &ShellFrame {
                            scene: &state.stage.scene,
                            components: &state.stage.components,
                            assets: &state.stage.assets,
                            surfaces: &state.stage.surfaces,
                            view_proj: state.camera.view_projection(),
                            time: state.started.elapsed().as_secs_f32(),
                            preview: state.fur.on_debug_preview(&state.stage.scene, playing),
                        },
                    );
                }

                let (Some(egui_winit), Some(egui_renderer), Some(config)) =
                    (&mut self.egui_winit, &mut self.egui_renderer, &self.config)
                else {
                    return;
                };
                let raw_input = egui_winit.take_egui_input(window);
                let state = &mut self.state;
                let full_output = self.egui_ctx.run(raw_input, |ctx| {
                    state.draw_ui(ctx);
                });
                egui_winit.handle_platform_output(window, full_output.platform_output);

                let paint_jobs = self
                    .egui_ctx
                    .tessellate(full_output.shapes, full_output.pixels_per_point);

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [config.width, config.height],
                    pixels_per_point: full_output.pixels_per_point,
                };

                for (id, image_delta) in &full_output.textures_delta.set {
                    egui_renderer.update_texture(device, queue, *id, image_delta);
                }
                let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
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

                output.present();
                window.request_redraw();
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
            if self.state.mouse_captured {
                self.state.camera.rotate(delta.0 as f32, delta.1 as f32);
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

    tracing::info!("shellfur-desktop starting");

    let config = match &cli.config {
        Some(path) => FurConfig::load(path)?,
        None => FurConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
