//! Desktop platform implementation for Nyanbounce: winit overlay window, wgpu surface,
//! rodio audio, and image-based sprite decoding.
use std::sync::Arc;
use std::time::Instant;

use nyanbounce_core::{Config, Playback, Sprite, TerminationCause};
use nyanbounce_platform::{AudioPlayer, InputEvent, OverlaySurface, Result};
use tiny_skia::Pixmap;
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

mod assets;
mod audio;
mod overlay;

pub use crate::assets::{load_sprite, load_sprite_or_placeholder};
pub use crate::audio::{open_audio, RodioAudio};
pub use crate::overlay::{choose_alpha_mode, WgpuOverlay};

// Public app entry ----------------
/// Load assets, open the overlay, and run the event loop until playback terminates.
pub fn run_app(config: Config) -> Result<()> {
    let sprite = load_sprite_or_placeholder(&config.assets.sprite);
    let audio = open_audio(&config.assets.audio, config.audio.volume);

    let event_loop = EventLoop::new().map_err(box_err)?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = OverlayApp::new(config, sprite, audio);
    event_loop.run_app(&mut app).map_err(box_err)?;

    if let Some(err) = app.error.take() {
        return Err(err);
    }
    match app.outcome {
        Some(cause) => info!(?cause, "overlay closed"),
        None => info!("overlay closed"),
    }
    Ok(())
}

/// Key and mouse bindings: N toggles pause, Escape and right click quit.
pub fn map_key(code: KeyCode) -> Option<InputEvent> {
    match code {
        KeyCode::KeyN => Some(InputEvent::TogglePause),
        KeyCode::Escape => Some(InputEvent::Quit),
        _ => None,
    }
}

pub fn map_mouse_button(button: MouseButton) -> Option<InputEvent> {
    match button {
        MouseButton::Right => Some(InputEvent::Quit),
        _ => None,
    }
}

struct Session {
    window: Arc<Window>,
    surface: WgpuOverlay,
    playback: Playback<Box<dyn AudioPlayer>>,
    frame: Pixmap,
}

impl Session {
    fn render(&mut self) {
        self.playback.compose_into(&mut self.frame);
        if let Err(err) = self.surface.present(self.frame.data()) {
            warn!("present failed: {err}");
        }
    }
}

struct OverlayApp {
    config: Config,
    pending: Option<(Sprite, Box<dyn AudioPlayer>)>,
    session: Option<Session>,
    outcome: Option<TerminationCause>,
    error: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl OverlayApp {
    fn new(config: Config, sprite: Sprite, audio: Box<dyn AudioPlayer>) -> Self {
        Self {
            config,
            pending: Some((sprite, audio)),
            session: None,
            outcome: None,
            error: None,
        }
    }

    fn open_session(
        &self,
        event_loop: &ActiveEventLoop,
        sprite: Sprite,
        audio: Box<dyn AudioPlayer>,
    ) -> Result<Session> {
        let window = overlay::create_overlay_window(event_loop)?;
        let screen = overlay::screen_size(&window);
        let surface = WgpuOverlay::new(Arc::clone(&window), screen)?;
        let mut playback =
            Playback::new(self.config.clone(), screen, sprite, audio).map_err(box_err)?;
        playback.start(Instant::now());
        window.request_redraw();
        Ok(Session {
            window,
            surface,
            frame: playback.trail().raster().clone(),
            playback,
        })
    }
}

impl ApplicationHandler for OverlayApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        let Some((sprite, audio)) = self.pending.take() else {
            return;
        };
        match self.open_session(event_loop, sprite, audio) {
            Ok(session) => {
                info!("overlay running: N pauses, Esc or right click quits");
                self.session = Some(session);
            }
            Err(err) => {
                error!("failed to open overlay: {err}");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => session.playback.quit(TerminationCause::UserRequest),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(input) = map_key(code) {
                    session.playback.handle_input(input);
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button,
                ..
            } => {
                if let Some(input) = map_mouse_button(button) {
                    session.playback.handle_input(input);
                }
            }
            WindowEvent::Resized(size) => {
                if let Err(err) = session.surface.resize(size.width, size.height) {
                    warn!("failed to resize overlay surface: {err}");
                }
            }
            WindowEvent::RedrawRequested => session.render(),
            _ => {}
        }
        if session.playback.is_terminated() {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.playback.pump(Instant::now()) {
            session.window.request_redraw();
        }
        match session.playback.next_deadline() {
            Some(deadline) if !session.playback.is_terminated() => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
            }
            _ => event_loop.exit(),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Cleanup
        if let Some(mut session) = self.session.take() {
            session.playback.quit(TerminationCause::UserRequest);
            self.outcome = session.playback.termination_cause();
        }
    }
}

#[inline]
fn box_err<E: std::fmt::Display>(e: E) -> Box<dyn std::error::Error + Send + Sync> {
    e.to_string().into()
}
