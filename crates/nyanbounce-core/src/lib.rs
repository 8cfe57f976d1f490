//! Nyanbounce core engine: platform-agnostic bouncing, trail stamping, and saturation shutdown.

pub mod config;
pub mod kinematics;
pub mod paint;
pub mod playback;
pub mod saturation;
pub mod schedule;
pub mod sprite;
pub mod trail;

pub use config::{BandOrientation, Config, ConfigError, TrailMode};
pub use kinematics::{Bounce, Kinematics, SpriteState};
pub use playback::{Playback, PlaybackState, TerminationCause};
pub use saturation::{Coverage, SaturationMonitor};
pub use schedule::Cadence;
pub use sprite::{Sprite, SpriteFrame};
pub use trail::{RasterSizeError, TrailCompositor, TrailSample};
