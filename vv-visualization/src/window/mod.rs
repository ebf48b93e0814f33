//! Interactive window renderer on wgpu and winit
//!
//! Space advances the scalar, `q` or Escape quits, left drag orbits, the
//! wheel zooms and `r` resets the view. In the facet view all panels share
//! one camera.

mod camera;
mod gpu;

pub use camera::OrbitCamera;
pub use gpu::{colorbar_geometry, GpuRenderer, GpuVertex, MeshGeometry, PanelTarget, PanelUniform};

use crate::config::ViewerConfig;
use crate::display::{Coloring, Legend};
use crate::facet::{FacetLayout, Viewport};
use crate::lookup_table::LookupTable;
use crate::renderer::SceneRenderer;
use crate::scene::Scene;
use crate::session::{InteractionEvent, SessionControl, ViewerSession};
use nalgebra::Vector3;
use std::sync::Arc;
use vv_core::{Drawable, Error, Result};
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowBuilder},
};

fn window_error(message: impl std::fmt::Display) -> Error {
    Error::Visualization(message.to_string())
}

/// Draws the scene in a native window
pub struct WindowRenderer {
    config: ViewerConfig,
}

impl WindowRenderer {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }
}

/// What a panel shows, independent of GPU state
struct PanelView<'a> {
    viewport: Viewport,
    meshes: &'a [Coloring],
    legend: Option<&'a Legend>,
}

/// Window, GPU state and camera shared by both views
struct Frame {
    window: Arc<Window>,
    gpu: GpuRenderer,
    camera: OrbitCamera,
    geometry: Vec<MeshGeometry>,
    panels: Vec<PanelTarget>,
    dragging: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
}

impl Frame {
    fn open(event_loop: &EventLoop<()>, scene: &Scene, title: &str, config: &ViewerConfig) -> Result<Self> {
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(title)
                .with_inner_size(LogicalSize::new(config.window.width, config.window.height))
                .build(event_loop)
                .map_err(|e| window_error(format!("failed to create window: {}", e)))?,
        );
        let gpu = pollster::block_on(GpuRenderer::new(window.clone(), config.window.background))?;
        let (min, max) = scene.bounding_box();
        Ok(Self {
            window,
            gpu,
            camera: OrbitCamera::fit(min, max),
            geometry: scene.iter().map(|entry| MeshGeometry::new(&entry.mesh)).collect(),
            panels: Vec::new(),
            dragging: false,
            last_cursor: None,
        })
    }

    /// Re-upload every panel with the given colourings
    fn load(&mut self, scene: &Scene, views: &[PanelView<'_>], config: &ViewerConfig) {
        self.panels = views
            .iter()
            .map(|view| {
                let mut panel = self.gpu.create_panel(view.viewport);
                panel.meshes = scene
                    .iter()
                    .zip(view.meshes)
                    .zip(&self.geometry)
                    .filter_map(|((entry, coloring), geometry)| {
                        let colors = coloring.vertex_colors(entry, config);
                        self.gpu.upload(&geometry.vertices(&colors), geometry.indices())
                    })
                    .collect();
                panel.overlay = view.legend.filter(|l| l.is_visible()).and_then(|legend| {
                    let table = LookupTable::from_config(&config.color_map, legend.range);
                    let (vertices, indices) = colorbar_geometry(&table);
                    self.gpu.upload(&vertices, &indices)
                });
                panel
            })
            .collect();
        self.update_camera();
        self.window.request_redraw();
    }

    fn update_camera(&self) {
        let (width, height) = self.gpu.size();
        let light = self.camera.eye() - self.camera.target;
        for panel in &self.panels {
            let (_, _, w, h) = panel.viewport.to_pixels(width, height);
            let uniform = PanelUniform::lit(
                self.camera.view_projection(w as f32 / h.max(1) as f32),
                Vector3::new(light.x, light.y, light.z),
            );
            self.gpu.update_panel(panel, &uniform);
        }
    }

    /// Camera and resize handling; returns the key translated to a session event
    fn handle_window_event(&mut self, event: &WindowEvent) -> Option<InteractionEvent> {
        match event {
            WindowEvent::Resized(size) => {
                self.gpu.resize(size.width, size.height);
                self.update_camera();
                self.window.request_redraw();
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                self.dragging = *state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some(last)) = (self.dragging, self.last_cursor) {
                    self.camera.orbit(
                        (position.x - last.x) as f32 * 0.01,
                        (position.y - last.y) as f32 * 0.01,
                    );
                    self.update_camera();
                    self.window.request_redraw();
                }
                self.last_cursor = Some(*position);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.camera.zoom(amount * 0.1);
                self.update_camera();
                self.window.request_redraw();
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                return Some(match &event.logical_key {
                    Key::Named(NamedKey::Space) => InteractionEvent::AdvanceScalar,
                    Key::Named(NamedKey::Escape) => InteractionEvent::Quit,
                    Key::Character(c) if c.as_str().eq_ignore_ascii_case("r") => {
                        self.camera.reset();
                        self.update_camera();
                        self.window.request_redraw();
                        InteractionEvent::Ignored
                    }
                    Key::Character(c) => InteractionEvent::from_key(c.as_str()),
                    _ => InteractionEvent::Ignored,
                });
            }
            _ => {}
        }
        None
    }
}

/// Drive the winit loop until the window closes or `on_event` asks to exit
fn run_loop<F>(event_loop: EventLoop<()>, frame: &mut Frame, mut on_event: F) -> Result<()>
where
    F: FnMut(InteractionEvent, &mut Frame) -> SessionControl,
{
    let mut failure = None;
    event_loop
        .run(|event, target| {
            target.set_control_flow(ControlFlow::Wait);
            let Event::WindowEvent { event, .. } = event else {
                return;
            };
            match event {
                WindowEvent::CloseRequested => target.exit(),
                WindowEvent::RedrawRequested => {
                    if let Err(e) = frame.gpu.render(&frame.panels) {
                        log::error!("{}", e);
                        failure = Some(e);
                        target.exit();
                    }
                }
                other => {
                    if let Some(input) = frame.handle_window_event(&other) {
                        match on_event(input, frame) {
                            SessionControl::Exit => target.exit(),
                            SessionControl::Redraw => frame.window.request_redraw(),
                            SessionControl::Continue => {}
                        }
                    }
                }
            }
        })
        .map_err(|e| window_error(format!("event loop error: {}", e)))?;
    failure.map_or(Ok(()), Err)
}

impl SceneRenderer for WindowRenderer {
    fn run(&mut self, session: &mut ViewerSession) -> Result<()> {
        let event_loop = EventLoop::new().map_err(|e| window_error(format!("failed to create event loop: {}", e)))?;
        let config = self.config.clone();
        let mut frame = Frame::open(&event_loop, session.scene(), &session.display().title, &config)?;

        let reload = |frame: &mut Frame, session: &ViewerSession| {
            let display = session.display();
            let view = PanelView {
                viewport: Viewport::FULL,
                meshes: &display.meshes,
                legend: Some(&display.legend),
            };
            frame.load(session.scene(), &[view], &config);
            frame.window.set_title(&display.title);
        };
        reload(&mut frame, session);
        log::info!("window open: {}", session.display().title);

        run_loop(event_loop, &mut frame, |input, frame| {
            let control = session.handle(input);
            if control == SessionControl::Redraw {
                reload(frame, session);
            }
            control
        })
    }

    fn run_facets(&mut self, scene: &Scene, layout: &FacetLayout) -> Result<()> {
        let event_loop = EventLoop::new().map_err(|e| window_error(format!("failed to create event loop: {}", e)))?;
        let mut frame = Frame::open(&event_loop, scene, &layout.title, &self.config)?;
        let views: Vec<PanelView<'_>> = layout
            .panels
            .iter()
            .map(|panel| PanelView {
                viewport: panel.viewport,
                meshes: &panel.meshes,
                legend: panel.legend.as_ref(),
            })
            .collect();
        frame.load(scene, &views, &self.config);
        log::info!("facet window open with {} panel(s)", layout.panels.len());

        run_loop(event_loop, &mut frame, |input, _| match input {
            InteractionEvent::Quit => SessionControl::Exit,
            _ => SessionControl::Continue,
        })
    }
}
