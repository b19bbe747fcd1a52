use crate::anchors::{AnchorCatalog, DuplicatePolicy};
use crate::config::{AppConfig, AppConfigOverrides, ViewerConfig};
use crate::input::{Input, InputEvent};
use crate::loading::LoadingIndicator;
use crate::params::Settings;
use crate::prefs::{JsonFileBackend, PreferenceStore};
use crate::renderer::Renderer;
use crate::time::FrameClock;
use crate::viewer::Viewer;

mod model_loader;
mod model_paint;
mod viewer_ui;

use model_loader::ModelLoader;
use viewer_ui::{UiLayout, UiOutput};

use anyhow::{Context, Result};
use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};

// egui
use egui::Context as EguiCtx;
use egui_wgpu::{Renderer as EguiRenderer, RendererOptions, ScreenDescriptor};
use egui_winit::State as EguiWinit;

const CONFIG_PATH: &str = "config/app.json";
const INPUT_CONFIG_PATH: &str = "config/input.json";

pub async fn run() -> Result<()> {
    run_with_overrides(AppConfigOverrides::default()).await
}

pub async fn run_with_overrides(overrides: AppConfigOverrides) -> Result<()> {
    let mut config = AppConfig::load_or_default(CONFIG_PATH);
    if !overrides.is_empty() {
        log::info!("[config] Command-line overrides: {}", overrides.applied_fields().join(", "));
        config.apply_overrides(&overrides);
    }
    let event_loop = EventLoop::new().context("Failed to create winit event loop")?;
    let mut app = App::new(config)?;
    event_loop.run_app(&mut app).context("Event loop execution failed")?;
    Ok(())
}

/// Picks the preference backend: in-memory for ephemeral runs, else the configured or platform file.
pub fn open_preferences(config: &ViewerConfig) -> PreferenceStore {
    if config.ephemeral_prefs {
        log::info!("[prefs] Ephemeral run; preferences stay in memory");
        return PreferenceStore::in_memory();
    }
    match config.prefs_path.clone().or_else(JsonFileBackend::default_path) {
        Some(path) => {
            log::info!("[prefs] Using {}", path.display());
            PreferenceStore::new(JsonFileBackend::open(path))
        }
        None => {
            log::warn!("[prefs] No config directory available; preferences will not persist");
            PreferenceStore::in_memory()
        }
    }
}

pub fn load_catalog(config: &ViewerConfig) -> Result<AnchorCatalog> {
    match &config.anchors_path {
        Some(path) => {
            let catalog = AnchorCatalog::load_json(path, DuplicatePolicy::for_build())?;
            log::info!("[anchors] Loaded {} anchors from {}", catalog.len(), path.display());
            Ok(catalog)
        }
        None => Ok(AnchorCatalog::aircraft_default()),
    }
}

pub struct App {
    renderer: Renderer,
    viewer: Viewer,
    clock: FrameClock,
    input: Input,
    loading: LoadingIndicator,
    model_loader: ModelLoader,
    layout: UiLayout,
    orbit_dragging: bool,
    should_close: bool,

    // egui
    egui_ctx: EguiCtx,
    egui_winit: Option<EguiWinit>,
    egui_renderer: Option<EguiRenderer>,
    egui_screen: Option<ScreenDescriptor>,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let catalog = load_catalog(&config.viewer)?;
        let settings = Settings::load(open_preferences(&config.viewer));
        let viewer = Viewer::new(catalog, settings, config.viewer.spinners.clone(), &config.viewer.camera);
        let model_loader = ModelLoader::spawn(config.viewer.model_path.clone())?;
        Ok(Self {
            renderer: Renderer::new(&config.window),
            viewer,
            clock: FrameClock::new(),
            input: Input::from_config(INPUT_CONFIG_PATH),
            loading: LoadingIndicator::start(),
            model_loader,
            layout: UiLayout::default(),
            orbit_dragging: false,
            should_close: false,
            egui_ctx: EguiCtx::default(),
            egui_winit: None,
            egui_renderer: None,
            egui_screen: None,
        })
    }

    fn poll_model(&mut self) {
        if !self.model_loader.is_pending() {
            return;
        }
        if let Some(graph) = self.model_loader.poll() {
            self.viewer.set_model(graph);
            self.loading.stop();
        }
    }

    fn handle_keyboard_actions(&mut self) {
        if self.egui_ctx.wants_keyboard_input() {
            return;
        }
        if self.input.take_toggle_panel() {
            self.viewer.toggle_panel();
        }
        if self.input.take_close_detail() {
            self.viewer.close_detail();
        }
        if self.input.take_toggle_rotation() {
            let enabled = !self.viewer.params().auto_rotate_enabled;
            if let Err(err) = self.viewer.settings_mut().set_auto_rotate(enabled) {
                log::warn!("[app] Auto-rotate toggle not applied: {err:#}");
            }
        }
        if self.input.take_toggle_hotspots() {
            let visible = !self.viewer.params().hotspots_visible;
            if let Err(err) = self.viewer.settings_mut().set_hotspots_visible(visible) {
                log::warn!("[app] Hotspot toggle not applied: {err:#}");
            }
        }
    }

    fn handle_pointer(&mut self, pointer: Option<Vec2>) {
        if self.input.take_left_click() {
            if let Some(pointer) = pointer {
                let viewer = &self.viewer;
                let target = viewer_ui::resolve_pointer_target(
                    &self.layout,
                    pointer,
                    viewer.active_point().is_some(),
                    viewer.panel_open(),
                    |at| viewer.hotspot_at(at),
                );
                let outcome = self.viewer.pointer_down(&target);
                self.orbit_dragging = outcome.start_orbit;
            }
        }
        if !self.input.left_held() {
            self.orbit_dragging = false;
        }
        let (dx, dy) = self.input.take_drag_delta();
        if self.orbit_dragging {
            self.viewer.orbit_drag(Vec2::new(dx, dy));
        }
        if let Some(steps) = self.input.consume_wheel_delta() {
            let over_ui =
                pointer.is_some_and(|at| viewer_ui::pointer_over_ui(&self.layout, at, self.viewer.panel_open()));
            if !over_ui {
                self.viewer.zoom(steps);
            }
        }
    }

    fn apply_ui_output(&mut self, output: UiOutput) {
        self.layout = output.layout;
        for edit in output.edits {
            viewer_ui::apply_edit(&mut self.viewer, edit);
        }
        if output.toggle_panel {
            self.viewer.toggle_panel();
        }
        if output.close_detail {
            self.viewer.close_detail();
        }
    }

    fn init_egui(&mut self) -> Result<()> {
        if self.egui_winit.is_none() {
            if let Some(window) = self.renderer.window() {
                let state = EguiWinit::new(
                    self.egui_ctx.clone(),
                    egui::ViewportId::ROOT,
                    window,
                    Some(self.renderer.pixels_per_point()),
                    window.theme(),
                    None,
                );
                self.egui_winit = Some(state);
            }
        }
        if self.egui_renderer.is_none() {
            let device = self.renderer.device()?;
            let format = self.renderer.surface_format()?;
            self.egui_renderer = Some(EguiRenderer::new(device, format, RendererOptions::default()));
        }
        let size = self.renderer.size();
        self.egui_screen = Some(ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: self.renderer.pixels_per_point(),
        });
        Ok(())
    }

    fn render_frame(&mut self) {
        let (Some(window), Some(egui_winit)) = (self.renderer.window(), self.egui_winit.as_mut()) else {
            return;
        };
        let raw_input = egui_winit.take_egui_input(window);
        let viewport = self.renderer.size();
        let viewer = &self.viewer;
        let loading = &self.loading;
        let mut ui_output = UiOutput::default();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui_output = viewer_ui::draw(ctx, viewer, loading, viewport, ctx.pixels_per_point());
        });
        let egui::FullOutput { platform_output, textures_delta, shapes, pixels_per_point, .. } = full_output;
        egui_winit.handle_platform_output(window, platform_output);
        window.request_redraw();
        self.apply_ui_output(ui_output);

        let (Some(painter), Some(screen)) = (self.egui_renderer.as_mut(), self.egui_screen.as_mut()) else {
            return;
        };
        screen.pixels_per_point = pixels_per_point;
        if let (Ok(device), Ok(queue)) = (self.renderer.device(), self.renderer.queue()) {
            for (id, delta) in &textures_delta.set {
                painter.update_texture(device, queue, *id, delta);
            }
        }
        let meshes = self.egui_ctx.tessellate(shapes, pixels_per_point);
        if let Err(err) = self.renderer.render_egui(painter, &meshes, screen) {
            log::warn!("[renderer] Frame skipped: {err:?}");
        }
        for id in &textures_delta.free {
            painter.free_texture(id);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.renderer.ensure_window(event_loop) {
            log::error!("[renderer] Initialization error: {err:?}");
            self.should_close = true;
            return;
        }
        if let Err(err) = self.init_egui() {
            log::error!("[ui] Unable to initialize egui renderer: {err:?}");
            self.should_close = true;
        }
    }

    fn window_event(&mut self, _el: &ActiveEventLoop, id: winit::window::WindowId, event: WindowEvent) {
        // egui wants the events too
        let mut consumed = false;
        if let (Some(window), Some(state)) = (self.renderer.window(), self.egui_winit.as_mut()) {
            if id == window.id() {
                consumed = state.on_window_event(window, &event).consumed;
            }
        }
        let input_event = InputEvent::from_window_event(&event);
        let is_pointer_event = matches!(
            input_event,
            InputEvent::CursorPos { .. }
                | InputEvent::CursorLeft
                | InputEvent::MouseButton { .. }
                | InputEvent::Wheel { .. }
        );
        // pointer routing happens against our own layout, so pointer events always reach it
        if !consumed || is_pointer_event {
            self.input.push(input_event);
        }

        match &event {
            WindowEvent::CloseRequested => self.should_close = true,
            WindowEvent::Resized(size) => {
                self.renderer.resize(*size);
                if let Some(sd) = &mut self.egui_screen {
                    sd.size_in_pixels = [size.width, size.height];
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(sd) = &mut self.egui_screen {
                    sd.pixels_per_point = *scale_factor as f32;
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_close {
            event_loop.exit();
            return;
        }
        let tick = self.clock.tick();
        if let Some(dropped) = tick.dropped {
            log::debug!("[time] Dropped {dropped:.3}s of frame time");
        }
        self.poll_model();
        self.loading.advance(tick.dt);

        let pointer = self.input.cursor_position().map(|(x, y)| Vec2::new(x, y));
        self.handle_keyboard_actions();
        self.handle_pointer(pointer);

        self.viewer.frame(tick.dt, self.renderer.size(), pointer);
        for event in self.viewer.drain_events() {
            log::trace!("[app] {event}");
        }

        self.render_frame();
        self.input.clear_frame();
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.loading.stop();
        log::info!("[app] Shutting down");
    }
}
