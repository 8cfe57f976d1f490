use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use nyanbounce_platform::{AssetError, AssetKind, AudioPlayer, SilentAudio};
use rodio::{Decoder, OutputStream, Sink, Source};
use tracing::{info, warn};

/// Looping background track on the default output device.
pub struct RodioAudio {
    // Dropping the stream silences the sink.
    _stream: OutputStream,
    sink: Sink,
}

impl RodioAudio {
    /// Queues the track paused; [`AudioPlayer::play_looped`] starts it.
    pub fn open(path: &Path, volume: f32) -> Result<Self, AssetError> {
        if !path.is_file() {
            return Err(AssetError::Missing {
                kind: AssetKind::Audio,
                path: path.to_path_buf(),
            });
        }
        let (stream, handle) = OutputStream::try_default()
            .map_err(|err| AssetError::AudioBackendUnavailable(err.to_string()))?;
        let sink = Sink::try_new(&handle)
            .map_err(|err| AssetError::AudioBackendUnavailable(err.to_string()))?;

        let decode_error = |reason: String| AssetError::Decode {
            kind: AssetKind::Audio,
            path: path.to_path_buf(),
            reason,
        };
        let file = File::open(path).map_err(|err| decode_error(err.to_string()))?;
        let source = Decoder::new(BufReader::new(file)).map_err(|err| decode_error(err.to_string()))?;

        sink.pause();
        sink.set_volume(volume);
        sink.append(source.repeat_infinite());
        Ok(Self {
            _stream: stream,
            sink,
        })
    }
}

impl AudioPlayer for RodioAudio {
    fn play_looped(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}

/// Opens the track, or a silent player when the file or the device is unavailable.
pub fn open_audio(path: &Path, volume: f32) -> Box<dyn AudioPlayer> {
    match RodioAudio::open(path, volume) {
        Ok(audio) => {
            info!("audio: looping {}", path.display());
            Box::new(audio)
        }
        Err(err) => {
            warn!("{err}; running without sound");
            Box::new(SilentAudio)
        }
    }
}
