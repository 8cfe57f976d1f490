//! Platform abstraction traits so `nyanbounce-core` stays OS-agnostic.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Pixel dimensions of the overlay surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn min_dimension(&self) -> u32 {
        self.width.min(self.height)
    }
}

impl fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Raw user input already mapped to the two actions the overlay understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    TogglePause,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Sprite,
    Audio,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Sprite => f.write_str("sprite"),
            AssetKind::Audio => f.write_str("audio"),
        }
    }
}

/// Startup failures. None of them are fatal: callers log and fall back.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{kind} asset not found at {}", path.display())]
    Missing { kind: AssetKind, path: PathBuf },
    #[error("failed to decode {kind} asset {}: {reason}", path.display())]
    Decode {
        kind: AssetKind,
        path: PathBuf,
        reason: String,
    },
    #[error("audio backend unavailable: {0}")]
    AudioBackendUnavailable(String),
}

/// Looping background audio, signaled by the playback controller and never polled.
pub trait AudioPlayer {
    fn play_looped(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
}

/// Player used when no audio file or output device is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioPlayer for SilentAudio {
    fn play_looped(&mut self) {
        debug!("silent audio: play ignored");
    }
    fn pause(&mut self) {}
    fn resume(&mut self) {}
    fn stop(&mut self) {}
}

impl<A: AudioPlayer + ?Sized> AudioPlayer for Box<A> {
    fn play_looped(&mut self) {
        (**self).play_looped()
    }
    fn pause(&mut self) {
        (**self).pause()
    }
    fn resume(&mut self) {
        (**self).resume()
    }
    fn stop(&mut self) {
        (**self).stop()
    }
}

/// Fullscreen transparent surface that presents one RGBA8 frame per repaint.
pub trait OverlaySurface {
    /// `rgba` holds one screen-sized frame, premultiplied alpha.
    fn present(&mut self, rgba: &[u8]) -> Result<()>;
    fn resize(&mut self, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_errors_name_the_asset_and_path() {
        let err = AssetError::Missing {
            kind: AssetKind::Sprite,
            path: PathBuf::from("assets/nyan.gif"),
        };
        assert_eq!(err.to_string(), "sprite asset not found at assets/nyan.gif");

        let err = AssetError::Decode {
            kind: AssetKind::Audio,
            path: PathBuf::from("assets/nyan.mp3"),
            reason: "unrecognized format".into(),
        };
        assert!(err.to_string().contains("audio asset assets/nyan.mp3"));
    }

    #[test]
    fn boxed_player_forwards_to_inner() {
        let mut player: Box<dyn AudioPlayer> = Box::new(SilentAudio);
        player.play_looped();
        player.pause();
        player.resume();
        player.stop();
    }

    #[test]
    fn screen_min_dimension() {
        assert_eq!(ScreenSize::new(1920, 1080).min_dimension(), 1080);
        assert_eq!(ScreenSize::new(1920, 1080).to_string(), "1920x1080");
    }
}
