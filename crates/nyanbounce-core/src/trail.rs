//! Trail compositor: stamps rainbow bands behind the sprite into a screen-sized raster.
//!
//! In [`TrailMode::Persistent`] the raster is only ever painted on, so coverage grows
//! monotonically until the saturation monitor stops the overlay. In
//! [`TrailMode::History`] the last `history_len` samples are redrawn from scratch on
//! every stamp, which keeps the visible trail short and memory bounded.

use std::collections::VecDeque;

use glam::Vec2;
use nyanbounce_platform::ScreenSize;
use thiserror::Error;
use tiny_skia::{Color, Pixmap};

use crate::config::{BandOrientation, TrailConfig, TrailMode};
use crate::paint::{hsv_color, Stadium};

/// Hue of each mark in a band, front to back.
pub const BAND_HUES: [f32; 7] = [0.0, 30.0, 60.0, 120.0, 210.0, 260.0, 290.0];

const BAND_SATURATION: f32 = 220.0 / 255.0;
const BAND_ALPHA: u8 = 200;
const FADED_ALPHA_STEP: u8 = 12;
const FADED_ALPHA_FLOOR: u8 = 40;
/// Distance from the sprite center to the first mark, relative to sprite width.
const BAND_OFFSET: f32 = 0.6;
/// Spacing between consecutive marks, relative to band width.
const MARK_SPACING: f32 = 0.55;
/// Length lost per mark, relative to band width.
const MARK_TAPER: f32 = 0.06;

/// Where the sprite was when a band was stamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSample {
    pub center: Vec2,
    pub velocity: Vec2,
    pub sprite_width: f32,
}

/// Unit vector pointing the way the sprite travels; marks are laid out against it.
pub fn band_direction(velocity: Vec2, orientation: BandOrientation) -> Vec2 {
    match orientation {
        BandOrientation::Velocity => {
            if velocity.length_squared() > f32::EPSILON {
                Vec2::from_angle(velocity.y.atan2(velocity.x))
            } else {
                Vec2::X
            }
        }
        BandOrientation::Horizontal => {
            if velocity.x >= 0.0 {
                Vec2::X
            } else {
                Vec2::NEG_X
            }
        }
    }
}

/// The marks making up one band, front (closest to the sprite) first.
pub fn band_marks(sample: &TrailSample, config: &TrailConfig) -> Vec<Stadium> {
    let direction = band_direction(sample.velocity, config.orientation);
    let width = config.band_width;
    let base = sample.center - direction * (sample.sprite_width * BAND_OFFSET);

    BAND_HUES
        .iter()
        .enumerate()
        .map(|(i, &hue)| {
            let step = i as f32;
            let alpha = if config.fade {
                BAND_ALPHA
                    .saturating_sub(FADED_ALPHA_STEP * i as u8)
                    .max(FADED_ALPHA_FLOOR)
            } else {
                BAND_ALPHA
            };
            Stadium {
                center: base - direction * (step * width * MARK_SPACING),
                axis: direction,
                half_length: width * (1.0 - step * MARK_TAPER),
                half_thickness: width * 0.25,
                color: hsv_color(hue, BAND_SATURATION, 1.0, alpha),
            }
        })
        .collect()
}

#[derive(Debug, Error)]
#[error("cannot allocate a {0} trail raster")]
pub struct RasterSizeError(pub ScreenSize);

/// Owns the premultiplied trail raster.
#[derive(Debug, Clone)]
pub struct TrailCompositor {
    raster: Pixmap,
    config: TrailConfig,
    history: VecDeque<TrailSample>,
}

impl TrailCompositor {
    pub fn new(screen: ScreenSize, config: TrailConfig) -> Result<Self, RasterSizeError> {
        let raster = Pixmap::new(screen.width, screen.height).ok_or(RasterSizeError(screen))?;
        let history = match config.mode {
            TrailMode::Persistent => VecDeque::new(),
            TrailMode::History => VecDeque::with_capacity(config.history_len),
        };
        Ok(Self {
            raster,
            config,
            history,
        })
    }

    pub fn raster(&self) -> &Pixmap {
        &self.raster
    }

    pub fn mode(&self) -> TrailMode {
        self.config.mode
    }

    /// Samples currently retained; always empty in persistent mode.
    #[cfg(test)]
    fn history(&self) -> impl Iterator<Item = &TrailSample> {
        self.history.iter()
    }

    pub fn stamp(&mut self, center: Vec2, velocity: Vec2, sprite_width: f32) {
        let sample = TrailSample {
            center,
            velocity,
            sprite_width,
        };
        match self.config.mode {
            TrailMode::Persistent => paint_band(&mut self.raster, &sample, &self.config),
            TrailMode::History => {
                if self.history.len() >= self.config.history_len {
                    self.history.pop_front();
                }
                self.history.push_back(sample);
                self.raster.fill(Color::TRANSPARENT);
                for sample in &self.history {
                    paint_band(&mut self.raster, sample, &self.config);
                }
            }
        }
    }

    /// Pixels whose alpha is strictly above `alpha_threshold`.
    pub fn opaque_pixel_count(&self, alpha_threshold: u8) -> usize {
        self.raster
            .pixels()
            .iter()
            .filter(|p| p.alpha() > alpha_threshold)
            .count()
    }

    #[cfg(test)]
    pub(crate) fn raster_mut(&mut self) -> &mut Pixmap {
        &mut self.raster
    }
}

fn paint_band(raster: &mut Pixmap, sample: &TrailSample, config: &TrailConfig) {
    // Back to front so the marks nearest the sprite end up on top.
    for mark in band_marks(sample, config).iter().rev() {
        mark.paint(raster);
    }
}
