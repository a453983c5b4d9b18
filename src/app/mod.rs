mod input;
mod timing;

use crate::Args;
use input::{map_mouse_button, wheel_delta, KeyMap};
use timing::FrameTiming;

use glam::Vec2;
use stagepreview::assets::{ImageTextureLoader, JsonModelLoader};
use stagepreview::config::ConfigError;
use stagepreview::interaction::{InputEvent, InputResponse, MouseButton};
use stagepreview::render::HeadlessRenderer;
use stagepreview::scene::serialization::{
    load_demo_from_file, load_document_from_file, load_rails_from_file, SerializationError,
};
use stagepreview::scene::MemoryDocument;
use stagepreview::{PreviewSession, PreviewSettings};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{DeviceEvent, DeviceId, ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "Stage Preview";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] ConfigError),
    #[error("failed to load {what} from {path}: {source}")]
    Document {
        what: &'static str,
        path: String,
        #[source]
        source: SerializationError,
    },
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

pub struct App {
    window: Option<Arc<Window>>,
    session: PreviewSession,
    document: MemoryDocument,
    renderer: HeadlessRenderer,
    keys: KeyMap,
    cursor: Vec2,
    left_held: bool,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,
}

impl App {
    fn new(session: PreviewSession, document: MemoryDocument) -> Self {
        let keys = KeyMap::from_bindings(&session.settings().keys);
        Self {
            window: None,
            session,
            document,
            renderer: HeadlessRenderer::new(),
            keys,
            cursor: Vec2::ZERO,
            left_held: false,
            timing: FrameTiming::new(WINDOW_TITLE.to_string()),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
        }
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        self.session.resize(size.width, size.height);
    }

    fn dispatch(&mut self, event: InputEvent) {
        let response = self.session.handle_input(event, &mut self.document);
        self.apply_response(response);
    }

    fn apply_response(&self, response: InputResponse) {
        let Some(window) = &self.window else {
            return;
        };
        if response.hide_cursor {
            window.set_cursor_visible(false);
        }
        if response.center_cursor {
            let size = window.inner_size();
            let center = PhysicalPosition::new(size.width / 2, size.height / 2);
            if let Err(err) = window.set_cursor_position(center) {
                log::debug!("cannot centre cursor: {err}");
            }
        }
        if response.show_cursor {
            window.set_cursor_visible(true);
        }
        if response.redraw {
            window.request_redraw();
        }
    }

    fn status_line(&self) -> String {
        let position = self.session.camera().state().position;
        let selected = self.session.selected_objects();
        let selection = match selected {
            [] => "nothing selected".to_string(),
            [id] => format!("{id} selected"),
            many => format!("{} selected", many.len()),
        };
        format!(
            "cam ({:.0}, {:.0}, {:.0}) - {selection}",
            position.x, position.y, position.z
        )
    }

    fn render(&mut self) {
        let now = Instant::now();
        self.timing.set_status(self.status_line());
        self.timing.update(self.window.as_deref(), now);
        self.session.advance(self.timing.frame_dt);
        let drawn = self.session.render_frame(&mut self.renderer);
        log::trace!(
            "frame: {drawn} objects, {} line segments",
            self.renderer.last_stats().line_segments
        );
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.session.teardown(&mut self.renderer);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(1280u32, 720u32))
            .with_resizable(true);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        self.handle_resize(window.inner_size());
        self.session
            .update_all_objects(&self.document, &mut self.renderer);
        self.update_target_frame_duration(&window);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.shutdown(event_loop);
            }
            WindowEvent::Focused(false) => {
                // Losing focus mid-look would leave the cursor hidden.
                if self.session.controller().is_free_look() {
                    self.dispatch(InputEvent::MouseUp {
                        button: MouseButton::Right,
                        position: self.cursor,
                    });
                }
                self.left_held = false;
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.repeat {
                    return;
                }
                if let Some(action) = self.keys.action(event.physical_key) {
                    self.dispatch(InputEvent::Key {
                        action,
                        pressed: event.state == ElementState::Pressed,
                    });
                }
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                    window.request_redraw();
                }
            }
            WindowEvent::Moved(_) => {
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                self.dispatch(InputEvent::MouseMove {
                    position: self.cursor,
                    left_held: self.left_held,
                });
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = map_mouse_button(button) else {
                    return;
                };
                let pressed = state == ElementState::Pressed;
                if button == MouseButton::Left {
                    self.left_held = pressed;
                }
                let position = self.cursor;
                self.dispatch(if pressed {
                    InputEvent::MouseDown { button, position }
                } else {
                    InputEvent::MouseUp { button, position }
                });
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.dispatch(InputEvent::Wheel {
                    delta: wheel_delta(delta),
                });
            }
            WindowEvent::RedrawRequested => {
                self.render();
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
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.session.controller().is_free_look() {
                self.dispatch(InputEvent::LookDelta(Vec2::new(dx as f32, dy as f32)));
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

fn load_optional<T>(
    what: &'static str,
    path: Option<&Path>,
    load: fn(&Path) -> Result<T, SerializationError>,
) -> Result<Option<T>, AppError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let value = load(path).map_err(|source| AppError::Document {
        what,
        path: path.display().to_string(),
        source,
    })?;
    log::info!("loaded {what} from {}", path.display());
    Ok(Some(value))
}

pub fn run(args: Args) -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let settings = match &args.settings {
        Some(path) => PreviewSettings::load(path)?,
        None => PreviewSettings::default(),
    };
    let document = load_optional("document", args.document.as_deref(), load_document_from_file)?
        .unwrap_or_else(|| {
            log::warn!("no document given; starting with an empty scene");
            MemoryDocument::new()
        });
    let rails = load_optional("rails", args.rails.as_deref(), load_rails_from_file)?;
    let demo = load_optional("demo", args.demo.as_deref(), load_demo_from_file)?;

    let mut session = PreviewSession::new(
        settings,
        &args.scene_root,
        Box::new(JsonModelLoader),
        Box::new(ImageTextureLoader),
    );
    session.set_rails(rails);
    session.set_demo(demo);

    log::info!("{WINDOW_TITLE}: {}", args.scene_root.display());
    log::info!("   Right-drag to look around, left-click to select and drag");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(session, document);
    event_loop.run_app(&mut app)?;

    log::info!("preview closed");
    Ok(())
}
