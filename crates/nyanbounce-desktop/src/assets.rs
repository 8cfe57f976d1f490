use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use nyanbounce_core::{Sprite, SpriteFrame};
use nyanbounce_platform::{AssetError, AssetKind};
use tracing::{info, warn};

/// Decodes a sprite: every frame of a `.gif`, or a single still image otherwise.
pub fn load_sprite(path: &Path) -> Result<Sprite, AssetError> {
    if !path.is_file() {
        return Err(AssetError::Missing {
            kind: AssetKind::Sprite,
            path: path.to_path_buf(),
        });
    }
    let decode_error = |reason: String| AssetError::Decode {
        kind: AssetKind::Sprite,
        path: path.to_path_buf(),
        reason,
    };

    let is_gif = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gif"));
    if !is_gif {
        let image = image::open(path).map_err(|err| decode_error(err.to_string()))?;
        return Ok(Sprite::still(image.to_rgba8()));
    }

    let file = File::open(path).map_err(|err| decode_error(err.to_string()))?;
    let decoder = GifDecoder::new(BufReader::new(file)).map_err(|err| decode_error(err.to_string()))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|err| decode_error(err.to_string()))?;
    let frames = frames
        .into_iter()
        .map(|frame| {
            let (numer, denom) = frame.delay().numer_denom_ms();
            SpriteFrame {
                delay: Duration::from_millis((numer / denom.max(1)) as u64),
                image: frame.into_buffer(),
            }
        })
        .collect();
    Sprite::animated(frames).ok_or_else(|| decode_error("no frames".into()))
}

/// Falls back to the placeholder rectangle on any asset error.
pub fn load_sprite_or_placeholder(path: &Path) -> Sprite {
    match load_sprite(path) {
        Ok(sprite) => {
            info!(
                "sprite: {} ({} frames)",
                path.display(),
                sprite.frame_count()
            );
            sprite
        }
        Err(err) => {
            warn!("{err}; drawing a placeholder instead");
            Sprite::placeholder()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgba, RgbaImage};
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("nyanbounce-{}-{name}", std::process::id()))
    }

    #[test]
    fn missing_sprite_uses_placeholder() {
        let path = Path::new("/nonexistent/nyan.gif");
        assert!(matches!(
            load_sprite(path),
            Err(AssetError::Missing {
                kind: AssetKind::Sprite,
                ..
            })
        ));
        assert_eq!(
            load_sprite_or_placeholder(path).size(),
            Sprite::placeholder().size()
        );
    }

    #[test]
    fn corrupt_sprite_is_a_decode_error() {
        let path = temp_path("corrupt.gif");
        std::fs::write(&path, b"definitely not a gif").unwrap();
        let result = load_sprite(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(AssetError::Decode { .. })));
    }

    #[test]
    fn animated_gif_keeps_every_frame() {
        let path = temp_path("two-frames.gif");
        {
            let file = File::create(&path).unwrap();
            let mut encoder = GifEncoder::new(file);
            let frames = [Rgba([255, 0, 0, 255]), Rgba([0, 0, 255, 255])].map(|color| {
                Frame::from_parts(
                    RgbaImage::from_pixel(12, 8, color),
                    0,
                    0,
                    Delay::from_numer_denom_ms(100, 1),
                )
            });
            encoder.encode_frames(frames).unwrap();
        }
        let sprite = load_sprite(&path);
        std::fs::remove_file(&path).ok();

        let sprite = sprite.unwrap();
        assert_eq!(sprite.frame_count(), 2);
        assert_eq!(sprite.current().dimensions(), (12, 8));
    }

    #[test]
    fn still_png_is_a_single_frame() {
        let path = temp_path("still.png");
        RgbaImage::from_pixel(5, 3, Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();
        let sprite = load_sprite(&path);
        std::fs::remove_file(&path).ok();

        let sprite = sprite.unwrap();
        assert_eq!(sprite.frame_count(), 1);
        assert_eq!(sprite.current().dimensions(), (5, 3));
    }
}
