//! Rainbow colors and anti-aliased stadium marks, rasterized with `tiny-skia` into
//! premultiplied pixmaps.

use glam::Vec2;
use image::RgbaImage;
use tiny_skia::{
    ColorU8, FillRule, LineCap, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

/// HSV to RGB. `hue` in degrees, `saturation` and `value` in `[0, 1]`.
pub fn hsv_color(hue: f32, saturation: f32, value: f32, alpha: u8) -> ColorU8 {
    let hue = hue.rem_euclid(360.0);
    let chroma = value * saturation;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = value - chroma;
    ColorU8::from_rgba(channel(r + m), channel(g + m), channel(b + m), alpha)
}

#[inline]
fn channel(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Premultiplied copy of a straight-alpha image. `None` for an empty image.
pub fn pixmap_from_image(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// A rounded rectangle whose corner radius equals its half thickness, rotated so its
/// long side runs along `axis`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stadium {
    pub center: Vec2,
    /// Unit vector of the long side.
    pub axis: Vec2,
    pub half_length: f32,
    pub half_thickness: f32,
    pub color: ColorU8,
}

impl Stadium {
    /// End points of the straight part. The round caps reach `half_thickness` past them.
    pub fn spine(&self) -> (Vec2, Vec2) {
        let reach = self.axis * (self.half_length - self.half_thickness).max(0.0);
        (self.center - reach, self.center + reach)
    }

    /// Source-over paints the shape with anti-aliased edges, clipped to the pixmap.
    pub fn paint(&self, pixmap: &mut Pixmap) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(
            self.color.red(),
            self.color.green(),
            self.color.blue(),
            self.color.alpha(),
        );
        paint.anti_alias = true;

        let (from, to) = self.spine();
        if from.distance_squared(to) <= f32::EPSILON {
            // No straight part left; the caps meet in a disc.
            if let Some(path) = PathBuilder::from_circle(from.x, from.y, self.half_thickness) {
                pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
            return;
        }

        let mut pb = PathBuilder::new();
        pb.move_to(from.x, from.y);
        pb.line_to(to.x, to.y);
        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width: 2.0 * self.half_thickness,
                line_cap: LineCap::Round,
                ..Default::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn alpha_at(pixmap: &Pixmap, x: u32, y: u32) -> u8 {
        pixmap.pixel(x, y).unwrap().alpha()
    }

    #[test]
    fn primary_hues() {
        assert_eq!(hsv_color(0.0, 1.0, 1.0, 255), ColorU8::from_rgba(255, 0, 0, 255));
        assert_eq!(hsv_color(120.0, 1.0, 1.0, 255), ColorU8::from_rgba(0, 255, 0, 255));
        assert_eq!(hsv_color(240.0, 1.0, 1.0, 9), ColorU8::from_rgba(0, 0, 255, 9));
        assert_eq!(hsv_color(360.0, 1.0, 1.0, 255), ColorU8::from_rgba(255, 0, 0, 255));
        assert_eq!(hsv_color(30.0, 0.0, 1.0, 255), ColorU8::from_rgba(255, 255, 255, 255));
    }

    #[test]
    fn image_is_premultiplied_into_the_pixmap() {
        let image = RgbaImage::from_pixel(3, 2, Rgba([255, 200, 0, 200]));
        let pixmap = pixmap_from_image(&image).unwrap();
        let pixel = pixmap.pixel(2, 1).unwrap();
        assert_eq!(
            (pixel.red(), pixel.green(), pixel.blue(), pixel.alpha()),
            (200, 157, 0, 200)
        );
        assert!(pixmap_from_image(&RgbaImage::new(0, 4)).is_none());
    }

    #[test]
    fn spine_is_shortened_by_the_caps() {
        let shape = Stadium {
            center: Vec2::new(50.0, 50.0),
            axis: Vec2::X,
            half_length: 20.0,
            half_thickness: 5.0,
            color: ColorU8::from_rgba(255, 0, 0, 255),
        };
        assert_eq!(shape.spine(), (Vec2::new(35.0, 50.0), Vec2::new(65.0, 50.0)));

        let mut pixmap = Pixmap::new(100, 100).unwrap();
        shape.paint(&mut pixmap);
        assert_eq!(alpha_at(&pixmap, 50, 50), 255);
        assert_eq!(alpha_at(&pixmap, 68, 50), 255);
        assert_eq!(alpha_at(&pixmap, 50, 58), 0);
        assert_eq!(alpha_at(&pixmap, 74, 50), 0);
    }

    #[test]
    fn rotated_stadium_follows_axis() {
        let mut pixmap = Pixmap::new(100, 100).unwrap();
        Stadium {
            center: Vec2::new(50.0, 50.0),
            axis: Vec2::Y,
            half_length: 30.0,
            half_thickness: 4.0,
            color: ColorU8::from_rgba(0, 0, 255, 255),
        }
        .paint(&mut pixmap);
        assert_eq!(alpha_at(&pixmap, 50, 25), 255);
        assert_eq!(alpha_at(&pixmap, 25, 50), 0);
    }

    #[test]
    fn painting_never_lowers_alpha() {
        let mut pixmap = Pixmap::new(60, 60).unwrap();
        let mut paint = Paint::default();
        paint.set_color_rgba8(90, 10, 200, 230);
        if let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, 30.0, 60.0) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }

        for alpha in [1u8, 40, 128, 200, 255] {
            let before: Vec<u8> = pixmap.pixels().iter().map(|p| p.alpha()).collect();
            Stadium {
                center: Vec2::new(30.0, 30.0),
                axis: Vec2::new(0.6, 0.8),
                half_length: 25.0,
                half_thickness: 7.5,
                color: ColorU8::from_rgba(255, 255, 0, alpha),
            }
            .paint(&mut pixmap);
            for (i, (pixel, old)) in pixmap.pixels().iter().zip(&before).enumerate() {
                assert!(pixel.alpha() >= *old, "pixel {i}: {old} -> {}", pixel.alpha());
            }
        }
    }

    #[test]
    fn paint_clips_at_the_border() {
        let mut pixmap = Pixmap::new(10, 10).unwrap();
        Stadium {
            center: Vec2::new(-3.0, 5.0),
            axis: Vec2::X,
            half_length: 6.0,
            half_thickness: 2.0,
            color: ColorU8::from_rgba(255, 255, 255, 255),
        }
        .paint(&mut pixmap);
        assert!(alpha_at(&pixmap, 0, 5) >= 250);
        assert_eq!(alpha_at(&pixmap, 9, 5), 0);
        assert_eq!(alpha_at(&pixmap, 0, 0), 0);
    }

    #[test]
    fn stadium_without_a_spine_is_a_disc() {
        let mut pixmap = Pixmap::new(20, 20).unwrap();
        Stadium {
            center: Vec2::new(10.0, 10.0),
            axis: Vec2::X,
            half_length: 4.0,
            half_thickness: 4.0,
            color: ColorU8::from_rgba(0, 255, 0, 255),
        }
        .paint(&mut pixmap);
        assert_eq!(alpha_at(&pixmap, 10, 10), 255);
        assert_eq!(alpha_at(&pixmap, 16, 10), 0);
        assert_eq!(alpha_at(&pixmap, 10, 2), 0);
    }
}
