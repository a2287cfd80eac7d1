//! Builder configuration

/// Video codec selection; only H.264 payloads are carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoCodec {
    #[default]
    H264,
}

/// Audio codec selection; only raw PCM payloads are carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioCodec {
    #[default]
    Pcm,
}

/// Video channel configuration
#[derive(Debug, Clone)]
pub struct VideoChannel {
    /// Media type descriptor, `key=value,...` with `width`, `height` and
    /// `framerate=NUM/DEN` recognized
    pub media_type: String,
    /// Video codec
    pub codec: VideoCodec,
}

/// Audio channel configuration (PCM only)
#[derive(Debug, Clone)]
pub struct AudioChannel {
    /// Audio codec
    pub codec: AudioCodec,
    /// Samples per second
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Bits per sample
    pub bits_per_sample: u16,
}

impl Default for AudioChannel {
    fn default() -> Self {
        AudioChannel {
            codec: AudioCodec::Pcm,
            sample_rate: 8000,
            channels: 1,
            bits_per_sample: 16,
        }
    }
}

impl AudioChannel {
    /// Bytes per sample across all interleaved channels (nBlockAlign)
    pub fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    /// Bytes per second of playback (nAvgBytesPerSec)
    pub fn avg_bytes_per_sec(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

/// Builder configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Video channel
    pub video: VideoChannel,
    /// Audio channels; the container carries one audio stream, populated
    /// from the first descriptor (or PCM defaults when empty)
    pub audio: Vec<AudioChannel>,
    /// Audio flush threshold and suggested playback buffer size in bytes
    pub buffer_size: u32,
}

impl Config {
    /// Default audio flush threshold
    pub const DEFAULT_BUFFER_SIZE: u32 = 4096;

    /// Create a configuration with the given video media type descriptor,
    /// no audio channels and the default buffer size
    pub fn new(media_type: impl Into<String>) -> Self {
        Config {
            video: VideoChannel {
                media_type: media_type.into(),
                codec: VideoCodec::H264,
            },
            audio: Vec::new(),
            buffer_size: Self::DEFAULT_BUFFER_SIZE,
        }
    }

    /// Append an audio channel
    pub fn with_audio_channel(mut self, channel: AudioChannel) -> Self {
        self.audio.push(channel);
        self
    }
}
