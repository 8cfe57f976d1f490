//! Static configuration, loaded once at startup and handed to each component.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Environment variable consulted when no config path is given on the command line.
pub const CONFIG_ENV_VAR: &str = "NYANBOUNCE_CONFIG";
/// Config file picked up from the working directory when nothing else is specified.
pub const DEFAULT_CONFIG_FILE: &str = "nyanbounce.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// How stamped bands are retained between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailMode {
    /// Every stamp lands on a raster that is never cleared.
    #[default]
    Persistent,
    /// Only the last `history_len` samples are drawn; the raster is rebuilt each stamp.
    History,
}

/// Which way the colored marks of a band are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandOrientation {
    /// Opposite to the full velocity vector.
    #[default]
    Velocity,
    /// Horizontal, behind the sprite according to the sign of `vx`.
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// Nominal band width in pixels.
    pub band_width: f32,
    pub mode: TrailMode,
    pub history_len: usize,
    pub fade: bool,
    pub orientation: BandOrientation,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            band_width: 38.0,
            mode: TrailMode::Persistent,
            history_len: 20,
            fade: false,
            orientation: BandOrientation::Velocity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaturationConfig {
    pub interval_ms: u64,
    /// Coverage fraction in `[0, 1]` at which the overlay shuts itself down.
    pub threshold: f32,
    /// Width of the downsampled raster; height follows the screen aspect ratio.
    pub sample_width: u32,
    /// Alpha values strictly above this count as covered.
    pub alpha_threshold: u8,
}

impl Default for SaturationConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            threshold: 0.60,
            sample_width: 200,
            alpha_threshold: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    /// Largest sprite side as a fraction of the smaller screen dimension.
    pub max_fraction: f32,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self { max_fraction: 0.20 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub sprite: PathBuf,
    pub audio: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            sprite: PathBuf::from("assets/nyan.gif"),
            audio: PathBuf::from("assets/nyan.mp3"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { volume: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tick_interval_ms: u64,
    /// Initial horizontal speed in pixels per tick; vertical speed is 60% of it.
    pub speed: f32,
    /// Velocity retained on each bounce, `1.0` is perfectly elastic.
    pub damping: f32,
    pub trail: TrailConfig,
    pub saturation: SaturationConfig,
    pub sprite: SpriteConfig,
    pub assets: AssetPaths,
    pub audio: AudioConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
            speed: 6.5,
            damping: 1.0,
            trail: TrailConfig::default(),
            saturation: SaturationConfig::default(),
            sprite: SpriteConfig::default(),
            assets: AssetPaths::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file, choosing the format from its extension (TOML unless `.json`).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_toml_str(&text)?
        };
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Explicit path first, then `NYANBOUNCE_CONFIG`, then `nyanbounce.toml` if present,
    /// otherwise the built-in defaults.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        match explicit.or(from_env) {
            Some(path) => Self::load(&path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    info!("no config file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".into()));
        }
        if self.saturation.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "saturation.interval_ms must be positive".into(),
            ));
        }
        if !self.speed.is_finite() {
            return Err(ConfigError::Invalid("speed must be finite".into()));
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(ConfigError::Invalid(format!(
                "damping must be within [0, 1], got {}",
                self.damping
            )));
        }
        if !(0.0..=1.0).contains(&self.saturation.threshold) {
            return Err(ConfigError::Invalid(format!(
                "saturation.threshold must be within [0, 1], got {}",
                self.saturation.threshold
            )));
        }
        if self.saturation.sample_width == 0 {
            return Err(ConfigError::Invalid(
                "saturation.sample_width must be positive".into(),
            ));
        }
        if !(self.trail.band_width > 0.0 && self.trail.band_width.is_finite()) {
            return Err(ConfigError::Invalid("trail.band_width must be positive".into()));
        }
        if self.trail.history_len == 0 {
            return Err(ConfigError::Invalid("trail.history_len must be positive".into()));
        }
        if !(self.sprite.max_fraction > 0.0 && self.sprite.max_fraction <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "sprite.max_fraction must be within (0, 1], got {}",
                self.sprite.max_fraction
            )));
        }
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err(ConfigError::Invalid(format!(
                "audio.volume must be within [0, 1], got {}",
                self.audio.volume
            )));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn saturation_interval(&self) -> Duration {
        Duration::from_millis(self.saturation.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval(), Duration::from_millis(16));
        assert_eq!(config.saturation_interval(), Duration::from_secs(1));
        assert_eq!(config.trail.mode, TrailMode::Persistent);
        assert_eq!(config.trail.history_len, 20);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            speed = 4.0
            damping = 0.9

            [trail]
            mode = "history"
            orientation = "horizontal"
            fade = true
            "#,
        )
        .unwrap();
        assert_eq!(config.speed, 4.0);
        assert_eq!(config.damping, 0.9);
        assert_eq!(config.trail.mode, TrailMode::History);
        assert_eq!(config.trail.orientation, BandOrientation::Horizontal);
        assert!(config.trail.fade);
        assert_eq!(config.trail.band_width, 38.0);
        assert_eq!(config.saturation, SaturationConfig::default());
    }

    #[test]
    fn json_matches_toml() {
        let json = Config::from_json_str(r#"{ "saturation": { "threshold": 0.5 } }"#).unwrap();
        let toml = Config::from_toml_str("[saturation]\nthreshold = 0.5\n").unwrap();
        assert_eq!(json, toml);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            Config::from_toml_str("damping = 1.5"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[saturation]\nthreshold = -0.1"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("tick_interval_ms = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[trail]\nhistory_len = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        assert!(matches!(
            Config::from_toml_str("[trail]\nmode = \"forever\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load(Path::new("/nonexistent/nyanbounce.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/nyanbounce.toml"));
    }
}
