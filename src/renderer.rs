mod egui_pass;
mod window_surface;

pub use window_surface::{SurfaceFrame, WindowSurface};

use crate::config::WindowConfig;
use anyhow::Result;
use egui_wgpu::{Renderer as EguiRenderer, ScreenDescriptor};
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

/// Background behind the model.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color { r: 0.06, g: 0.07, b: 0.1, a: 1.0 };

/// Presents egui output to the window. The model itself reaches the screen as egui meshes, so this
/// is the only pass.
pub struct Renderer {
    surface: WindowSurface,
}

impl Renderer {
    pub fn new(window_cfg: &WindowConfig) -> Self {
        Self { surface: WindowSurface::new(window_cfg) }
    }

    pub fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        self.surface.ensure_window(event_loop)
    }

    pub fn window(&self) -> Option<&Window> {
        self.surface.window()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.surface.size()
    }

    pub fn pixels_per_point(&self) -> f32 {
        self.surface.pixels_per_point()
    }

    pub fn device(&self) -> Result<&wgpu::Device> {
        self.surface.device()
    }

    pub fn queue(&self) -> Result<&wgpu::Queue> {
        self.surface.queue()
    }

    pub fn surface_format(&self) -> Result<wgpu::TextureFormat> {
        self.surface.surface_format()
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.surface.resize(new_size);
    }

    pub fn render_egui(
        &mut self,
        painter: &mut EguiRenderer,
        paint_jobs: &[egui::ClippedPrimitive],
        screen: &ScreenDescriptor,
    ) -> Result<()> {
        let frame = self.surface.acquire_surface_frame()?;
        let (device, queue) = self.surface.device_and_queue()?;
        egui_pass::render(device, queue, painter, paint_jobs, screen, frame, CLEAR_COLOR)
    }
}
