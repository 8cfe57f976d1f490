//! Animated sprite frames and their timing.

use std::time::Duration;

use glam::Vec2;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tiny_skia::Pixmap;

use crate::paint::pixmap_from_image;

/// GIFs commonly declare 0 or 10 ms delays; browsers treat those as this.
pub const MIN_FRAME_DELAY: Duration = Duration::from_millis(20);

pub const PLACEHOLDER_SIZE: (u32, u32) = (128, 64);
pub const PLACEHOLDER_COLOR: Rgba<u8> = Rgba([255, 200, 200, 200]);

#[derive(Debug, Clone)]
pub struct SpriteFrame {
    pub image: RgbaImage,
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Sprite {
    frames: Vec<SpriteFrame>,
    /// Premultiplied copy of each frame, drawn over the trail.
    pixmaps: Vec<Option<Pixmap>>,
    current: usize,
    elapsed: Duration,
}

impl Sprite {
    pub fn still(image: RgbaImage) -> Self {
        Self::from_frames(vec![SpriteFrame {
            image,
            delay: Duration::ZERO,
        }])
    }

    /// `None` when there are no frames to show.
    pub fn animated(frames: Vec<SpriteFrame>) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        Some(Self::from_frames(frames))
    }

    fn from_frames(frames: Vec<SpriteFrame>) -> Self {
        let pixmaps = frames.iter().map(|f| pixmap_from_image(&f.image)).collect();
        Self {
            frames,
            pixmaps,
            current: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Flat rectangle shown when the sprite asset is missing or unreadable.
    pub fn placeholder() -> Self {
        let (width, height) = PLACEHOLDER_SIZE;
        Self::still(RgbaImage::from_pixel(width, height, PLACEHOLDER_COLOR))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    #[cfg(test)]
    fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &RgbaImage {
        &self.frames[self.current].image
    }

    /// The current frame ready for compositing; `None` for an empty frame.
    pub fn current_pixmap(&self) -> Option<&Pixmap> {
        self.pixmaps[self.current].as_ref()
    }

    pub fn size(&self) -> Vec2 {
        let (width, height) = self.current().dimensions();
        Vec2::new(width as f32, height as f32)
    }

    /// Moves the animation forward by `dt`, looping at the end.
    pub fn advance(&mut self, dt: Duration) {
        if self.frames.len() < 2 {
            return;
        }
        self.elapsed += dt;
        loop {
            let delay = self.frames[self.current].delay.max(MIN_FRAME_DELAY);
            if self.elapsed < delay {
                break;
            }
            self.elapsed -= delay;
            self.current = (self.current + 1) % self.frames.len();
        }
    }

    /// Scales every frame down so the larger side is at most `max_side`, keeping
    /// the aspect ratio. Smaller sprites are left alone.
    pub fn fit_within(mut self, max_side: u32) -> Self {
        for (frame, pixmap) in self.frames.iter_mut().zip(&mut self.pixmaps) {
            let (width, height) = frame.image.dimensions();
            if let Some((new_width, new_height)) = fitted_size(width, height, max_side) {
                frame.image =
                    imageops::resize(&frame.image, new_width, new_height, FilterType::Triangle);
                *pixmap = pixmap_from_image(&frame.image);
            }
        }
        self
    }
}

fn fitted_size(width: u32, height: u32, max_side: u32) -> Option<(u32, u32)> {
    let largest = width.max(height);
    if largest <= max_side || max_side == 0 {
        return None;
    }
    let scale = |side: u32| ((side as u64 * max_side as u64) / largest as u64).max(1) as u32;
    Some((scale(width), scale(height)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, delay_ms: u64) -> SpriteFrame {
        SpriteFrame {
            image: RgbaImage::new(width, 10),
            delay: Duration::from_millis(delay_ms),
        }
    }

    #[test]
    fn placeholder_is_a_flat_rectangle() {
        let sprite = Sprite::placeholder();
        assert_eq!(sprite.size(), Vec2::new(128.0, 64.0));
        assert_eq!(*sprite.current().get_pixel(5, 5), PLACEHOLDER_COLOR);

        let pixel = sprite.current_pixmap().unwrap().pixel(5, 5).unwrap();
        assert_eq!(
            (pixel.red(), pixel.green(), pixel.alpha()),
            (200, 157, 200)
        );
    }

    #[test]
    fn animation_loops_by_frame_delay() {
        let mut sprite = Sprite::animated(vec![frame(10, 50), frame(20, 100), frame(30, 50)]).unwrap();
        sprite.advance(Duration::from_millis(40));
        assert_eq!(sprite.current_index(), 0);
        sprite.advance(Duration::from_millis(16));
        assert_eq!(sprite.current_index(), 1);
        assert_eq!(sprite.size().x, 20.0);
        assert_eq!(sprite.current_pixmap().unwrap().width(), 20);
        sprite.advance(Duration::from_millis(150));
        assert_eq!(sprite.current_index(), 0);
    }

    #[test]
    fn zero_delays_are_clamped() {
        let mut sprite = Sprite::animated(vec![frame(10, 0), frame(20, 0)]).unwrap();
        sprite.advance(Duration::from_millis(16));
        assert_eq!(sprite.current_index(), 0);
        sprite.advance(Duration::from_millis(16));
        assert_eq!(sprite.current_index(), 1);
    }

    #[test]
    fn empty_animation_is_rejected() {
        assert!(Sprite::animated(Vec::new()).is_none());
    }

    #[test]
    fn fit_within_scales_the_larger_side() {
        assert_eq!(fitted_size(400, 200, 216), Some((216, 108)));
        assert_eq!(fitted_size(100, 500, 216), Some((43, 216)));
        assert_eq!(fitted_size(100, 50, 216), None);

        let sprite = Sprite::still(RgbaImage::new(400, 200)).fit_within(216);
        assert_eq!(sprite.size(), Vec2::new(216.0, 108.0));
        let pixmap = sprite.current_pixmap().unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (216, 108));
    }
}
