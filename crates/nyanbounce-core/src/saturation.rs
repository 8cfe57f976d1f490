//! Coverage estimate of the trail raster on a small, area-averaged thumbnail.

use image::{imageops, ImageBuffer, Rgba};
use tiny_skia::Pixmap;
use tracing::debug;

use crate::config::SaturationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub opaque: usize,
    pub total: usize,
}

impl Coverage {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.opaque as f32 / self.total as f32
        }
    }
}

#[derive(Debug, Clone)]
pub struct SaturationMonitor {
    threshold: f32,
    sample_width: u32,
    alpha_threshold: u8,
}

impl SaturationMonitor {
    pub fn new(config: &SaturationConfig) -> Self {
        Self {
            threshold: config.threshold,
            sample_width: config.sample_width,
            alpha_threshold: config.alpha_threshold,
        }
    }

    /// Thumbnail size for a raster of `width x height`, keeping the aspect ratio.
    pub fn sample_size(&self, width: u32, height: u32) -> (u32, u32) {
        let sample_height = (self.sample_width as u64 * height as u64 / width.max(1) as u64).max(1);
        (self.sample_width, sample_height as u32)
    }

    /// Rasters no wider than the sample width are counted directly. Alpha is the
    /// same with or without premultiplication, so the raster is read as is.
    pub fn measure(&self, raster: &Pixmap) -> Coverage {
        let (width, height) = (raster.width(), raster.height());
        let view = ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, raster.data());
        let coverage = match view {
            Some(view) if width > self.sample_width => {
                let (sample_width, sample_height) = self.sample_size(width, height);
                let thumbnail = imageops::thumbnail(&view, sample_width, sample_height);
                self.count(thumbnail.pixels().map(|p| p[3]))
            }
            _ => self.count(raster.pixels().iter().map(|p| p.alpha())),
        };
        debug!(
            opaque = coverage.opaque,
            total = coverage.total,
            "trail coverage {:.2}%",
            coverage.fraction() * 100.0
        );
        coverage
    }

    pub fn is_saturated(&self, coverage: Coverage) -> bool {
        coverage.total > 0 && coverage.fraction() >= self.threshold
    }

    fn count(&self, alphas: impl Iterator<Item = u8>) -> Coverage {
        let (opaque, total) = alphas.fold((0, 0), |(opaque, total), alpha| {
            (opaque + usize::from(alpha > self.alpha_threshold), total + 1)
        });
        Coverage { opaque, total }
    }
}
