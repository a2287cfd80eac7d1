//! Incremental AVI (RIFF) file writer
//!
//! This crate serializes interleaved video and audio samples into a single
//! AVI container as they arrive, without buffering the whole stream first.
//! Header space is reserved with zero-filled placeholders on the first
//! append, data chunks stream into the open `movi` list while running
//! totals and an index accumulate, and `close` backpatches every size and
//! summary field with its final value and appends the trailing `idx1`
//! index chunk.
//!
//! Write-only: one H.264 video stream plus one PCM audio stream.
//!
//! # Example
//!
//! ```no_run
//! use avibuild::{AviBuilder, AudioChannel, Config};
//!
//! let config = Config::new("width=640,height=480,framerate=30/1")
//!     .with_audio_channel(AudioChannel::default());
//! let mut builder = AviBuilder::create("out.avi", config)?;
//!
//! builder.add_video(&[0u8; 1024])?;
//! builder.add_audio(0, &[0u8; 4096])?;
//! builder.close()?;
//! # Ok::<(), avibuild::AviBuildError>(())
//! ```

mod builder;
mod chunks;
mod config;
mod error;
mod headers;
mod media_type;
mod size_fields;

pub use builder::AviBuilder;
pub use chunks::{chunk_ids, parse_index, ChunkHeader, FourCC, IndexEntry, ListHeader};
pub use config::{AudioChannel, AudioCodec, Config, VideoChannel, VideoCodec};
pub use error::{AviBuildError, Result};
pub use headers::{
    AviFlags, BitmapInfoHeader, MainAviHeader, OdmlHeader, Rect, StreamHeader, WaveFormat,
};
pub use media_type::VideoMediaType;
