//! Playback controller: owns the run state and drives every other component.

use std::time::Instant;

use nyanbounce_platform::{AudioPlayer, InputEvent, ScreenSize};
use tiny_skia::{Pixmap, PixmapPaint, Transform};
use tracing::{debug, info};

use crate::config::{Config, TrailMode};
use crate::kinematics::{Kinematics, SpriteState};
use crate::saturation::{Coverage, SaturationMonitor};
use crate::schedule::Cadence;
use crate::sprite::Sprite;
use crate::trail::{RasterSizeError, TrailCompositor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Running,
    Paused,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCause {
    UserRequest,
    Saturated,
}

pub struct Playback<A: AudioPlayer> {
    state: PlaybackState,
    cause: Option<TerminationCause>,
    kinematics: Kinematics,
    trail: TrailCompositor,
    monitor: SaturationMonitor,
    sprite: Sprite,
    audio: A,
    tick_cadence: Cadence,
    saturation_cadence: Cadence,
    ticks: u64,
}

impl<A: AudioPlayer> Playback<A> {
    /// Sprite frames are scaled down to the configured share of the screen here.
    pub fn new(
        config: Config,
        screen: ScreenSize,
        sprite: Sprite,
        audio: A,
    ) -> Result<Self, RasterSizeError> {
        let max_side = (screen.min_dimension() as f32 * config.sprite.max_fraction) as u32;
        let sprite = sprite.fit_within(max_side);
        let kinematics = Kinematics::launch(screen, sprite.size(), config.speed, config.damping);
        let trail = TrailCompositor::new(screen, config.trail.clone())?;
        let monitor = SaturationMonitor::new(&config.saturation);
        let tick_cadence = Cadence::new(config.tick_interval());
        let saturation_cadence = Cadence::new(config.saturation_interval());
        info!(
            "overlay {screen}, sprite {}x{} ({} frames), trail {:?}",
            sprite.size().x,
            sprite.size().y,
            sprite.frame_count(),
            config.trail.mode
        );
        Ok(Self {
            state: PlaybackState::Running,
            cause: None,
            kinematics,
            trail,
            monitor,
            sprite,
            audio,
            tick_cadence,
            saturation_cadence,
            ticks: 0,
        })
    }

    /// Arms both cadences and starts the audio loop.
    pub fn start(&mut self, now: Instant) {
        if self.state == PlaybackState::Terminated {
            return;
        }
        self.tick_cadence.start(now);
        self.saturation_cadence.start(now);
        self.audio.play_looped();
        if self.state == PlaybackState::Paused {
            self.audio.pause();
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == PlaybackState::Terminated
    }

    pub fn termination_cause(&self) -> Option<TerminationCause> {
        self.cause
    }

    pub fn sprite_state(&self) -> &SpriteState {
        self.kinematics.state()
    }

    #[cfg(test)]
    fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    pub fn trail(&self) -> &TrailCompositor {
        &self.trail
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::TogglePause => self.toggle_pause(),
            InputEvent::Quit => self.quit(TerminationCause::UserRequest),
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            PlaybackState::Running => {
                self.state = PlaybackState::Paused;
                self.audio.pause();
                info!("paused: motion and music stopped");
            }
            PlaybackState::Paused => {
                self.state = PlaybackState::Running;
                self.audio.resume();
                info!("resumed");
            }
            PlaybackState::Terminated => {}
        }
    }

    /// Stops both cadences and the audio. Only the first call has any effect.
    pub fn quit(&mut self, cause: TerminationCause) {
        if self.state == PlaybackState::Terminated {
            return;
        }
        self.state = PlaybackState::Terminated;
        self.cause = Some(cause);
        self.tick_cadence.stop();
        self.saturation_cadence.stop();
        self.audio.stop();
        info!(?cause, ticks = self.ticks, "terminated");
    }

    /// One animation step. Returns whether anything changed and a repaint is needed.
    pub fn tick(&mut self) -> bool {
        if self.state != PlaybackState::Running {
            return false;
        }
        self.sprite.advance(self.tick_cadence.interval());
        let bounce = self.kinematics.advance(self.sprite.size());
        if bounce.any() {
            debug!(?bounce, vel = ?self.kinematics.state().vel, "bounce");
        }
        let state = *self.kinematics.state();
        self.trail.stamp(state.center(), state.vel, state.size.x);
        self.ticks += 1;
        true
    }

    /// Measures trail coverage and terminates once it reaches the threshold.
    /// Returns the measurement, or `None` when no check was made.
    pub fn check_saturation(&mut self) -> Option<Coverage> {
        if self.is_terminated() || self.trail.mode() != TrailMode::Persistent {
            return None;
        }
        let coverage = self.monitor.measure(self.trail.raster());
        if self.monitor.is_saturated(coverage) {
            info!(
                "screen saturated ({:.2}%), shutting down",
                coverage.fraction() * 100.0
            );
            self.quit(TerminationCause::Saturated);
        }
        Some(coverage)
    }

    /// Runs whichever cadences are due at `now`. Returns whether a repaint is needed.
    pub fn pump(&mut self, now: Instant) -> bool {
        let mut repaint = false;
        if self.tick_cadence.fire_if_due(now) {
            repaint |= self.tick();
        }
        if self.saturation_cadence.fire_if_due(now) {
            self.check_saturation();
            repaint |= self.is_terminated();
        }
        repaint
    }

    /// Earliest pending deadline; `None` once nothing is scheduled.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.tick_cadence.next_due(), self.saturation_cadence.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Writes the trail and the sprite on top of it into `frame`, reallocating it
    /// if its size does not match the screen. The result is premultiplied RGBA.
    pub fn compose_into(&self, frame: &mut Pixmap) {
        let raster = self.trail.raster();
        if frame.width() == raster.width() && frame.height() == raster.height() {
            frame.data_mut().copy_from_slice(raster.data());
        } else {
            *frame = raster.clone();
        }
        if let Some(sprite) = self.sprite.current_pixmap() {
            let pos = self.kinematics.state().pos;
            frame.draw_pixmap(
                pos.x.floor() as i32,
                pos.y.floor() as i32,
                sprite.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn trail_mut(&mut self) -> &mut TrailCompositor {
        &mut self.trail
    }

    #[cfg(test)]
    fn audio(&self) -> &A {
        &self.audio
    }

    #[cfg(test)]
    fn ticks(&self) -> u64 {
        self.ticks
    }
}
