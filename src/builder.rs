//! Incremental AVI builder
//!
//! Writes an AVI file in a single forward pass: the first append reserves
//! zero-filled header space, every append goes out as movi data chunks
//! while size counters and the idx1 index accumulate, and `close` seeks
//! back to rewrite each reserved structure with its final value.

use crate::chunks::{chunk_ids, ChunkHeader, FourCC, IndexEntry, ListHeader};
use crate::config::{AudioCodec, Config, VideoCodec};
use crate::error::{AviBuildError, Result};
use crate::headers::{
    AviFlags, BitmapInfoHeader, MainAviHeader, OdmlHeader, Rect, StreamHeader, WaveFormat,
};
use crate::media_type::VideoMediaType;
use crate::size_fields::{SizeField, SizeFields};
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// Builder lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    /// No data written yet; headers not reserved
    Ready,
    /// Headers reserved, movi list open, appends accepted
    WritingData,
    /// File finalized; all further calls fail
    Finished,
}

/// File offsets of every structure rewritten during finalization.
/// Content offsets point past the owning chunk header.
#[derive(Debug, Default, Clone, Copy)]
struct ReservedOffsets {
    riff_list: u64,
    hdrl_list: u64,
    main_header: u64,
    strl_video: u64,
    strh_video: u64,
    strf_video: u64,
    strl_audio: u64,
    strh_audio: u64,
    strf_audio: u64,
    odml_list: u64,
    odml_header: u64,
    movi_list: u64,
}

/// Incremental AVI writer over a seekable sink
#[derive(Debug)]
pub struct AviBuilder<W: Write + Seek> {
    sink: W,
    config: Config,
    status: Status,
    /// Logical write cursor; backpatch seeks do not move it
    pos: u64,

    media_type: VideoMediaType,
    main_header: MainAviHeader,
    video_header: StreamHeader,
    video_format: BitmapInfoHeader,
    audio_header: StreamHeader,
    audio_format: WaveFormat,
    odml_header: OdmlHeader,

    offsets: ReservedOffsets,
    size_fields: SizeFields,
    index: Vec<IndexEntry>,
    audio_cache: Vec<u8>,
}

impl AviBuilder<BufWriter<File>> {
    /// Create a builder writing to a file at `path`
    pub fn create(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| AviBuildError::CannotOpenFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(BufWriter::new(file), config)
    }
}

impl<W: Write + Seek> AviBuilder<W> {
    /// Create a builder over any seekable sink
    pub fn new(sink: W, config: Config) -> Result<Self> {
        let media_type = VideoMediaType::parse(&config.video.media_type)?;
        let audio = config.audio.first().cloned().unwrap_or_default();

        let video_handler = match config.video.codec {
            VideoCodec::H264 => chunk_ids::HANDLER_H264,
        };
        let (audio_handler, audio_format_tag) = match audio.codec {
            AudioCodec::Pcm => (chunk_ids::HANDLER_PCM, 1u16),
        };

        let main_header = MainAviHeader {
            micro_sec_per_frame: 0, // derived at close
            max_bytes_per_sec: 15 * 1024 * 1024,
            padding_granularity: 0,
            flags: AviFlags {
                has_index: true,
                is_interleaved: true,
                ..Default::default()
            },
            total_frames: 0,
            initial_frames: 0,
            streams: 2,
            suggested_buffer_size: 0,
            width: media_type.width,
            height: media_type.height,
        };

        let mut video_header = StreamHeader::new(chunk_ids::TYPE_VIDEO, video_handler);
        video_header.suggested_buffer_size = config.buffer_size;
        video_header.frame = Rect {
            left: 0,
            top: 0,
            right: media_type.width as i16,
            bottom: media_type.height as i16,
        };

        let video_format = BitmapInfoHeader {
            size: BitmapInfoHeader::BYTE_LEN,
            width: media_type.width as i32,
            height: media_type.height as i32,
            planes: 1,
            bit_count: 24,
            compression: video_handler,
            image_size: media_type.width * media_type.height,
            x_pels_per_meter: 0,
            y_pels_per_meter: 0,
            colors_used: 0,
            colors_important: 0,
        };

        let mut audio_header = StreamHeader::new(chunk_ids::TYPE_AUDIO, audio_handler);
        audio_header.scale = 1;
        audio_header.rate = audio.sample_rate;
        audio_header.suggested_buffer_size = config.buffer_size;
        audio_header.sample_size = audio.block_align() as u32;

        let audio_format = WaveFormat {
            format_tag: audio_format_tag,
            channels: audio.channels,
            samples_per_sec: audio.sample_rate,
            avg_bytes_per_sec: audio.avg_bytes_per_sec(),
            block_align: audio.block_align(),
            bits_per_sample: audio.bits_per_sample,
            extra_size: 0,
        };

        Ok(AviBuilder {
            sink,
            config,
            status: Status::Ready,
            pos: 0,
            media_type,
            main_header,
            video_header,
            video_format,
            audio_header,
            audio_format,
            odml_header: OdmlHeader::default(),
            offsets: ReservedOffsets::default(),
            size_fields: SizeFields::new(),
            index: Vec::new(),
            audio_cache: Vec::new(),
        })
    }

    /// Append one video frame as a single data chunk
    pub fn add_video(&mut self, data: &[u8]) -> Result<()> {
        match self.status {
            Status::Ready => {
                self.write_phony_headers()?;
                self.status = Status::WritingData;
                self.add_video(data)
            }
            Status::WritingData => {
                self.main_header.total_frames += 1;
                self.video_header.length += 1;
                self.write_block(chunk_ids::VIDEO_00DB, data, true)
            }
            Status::Finished => Err(AviBuildError::AlreadyClosed),
        }
    }

    /// Append audio bytes for `channel`; data is buffered and flushed in
    /// fixed-size chunks once the configured threshold is reached
    pub fn add_audio(&mut self, channel: usize, data: &[u8]) -> Result<()> {
        if channel >= self.config.audio.len() {
            return Err(AviBuildError::UnknownChannel(channel));
        }

        match self.status {
            Status::Ready => {
                self.write_phony_headers()?;
                self.status = Status::WritingData;
                self.add_audio(channel, data)
            }
            Status::WritingData => {
                self.audio_cache.extend_from_slice(data);
                if (self.audio_cache.len() as u64) < self.config.buffer_size as u64 {
                    return Ok(());
                }

                let cache = std::mem::take(&mut self.audio_cache);
                let consumed = self.write_block_split(chunk_ids::AUDIO_01WB, &cache)?;
                let sample_size = self.audio_header.sample_size.max(1);
                self.audio_header.length += consumed as u32 / sample_size;
                self.audio_cache.extend_from_slice(&cache[consumed..]);

                log::debug!(
                    "flushed {} audio bytes, {} retained",
                    consumed,
                    self.audio_cache.len()
                );
                Ok(())
            }
            Status::Finished => Err(AviBuildError::AlreadyClosed),
        }
    }

    /// Finalize the file: write the idx1 index, derive the timing fields
    /// and backpatch every reserved header region
    pub fn close(&mut self) -> Result<()> {
        match self.status {
            Status::Ready => {
                self.write_phony_headers()?;
                self.status = Status::WritingData;
                self.close()
            }
            Status::WritingData => {
                if !self.audio_cache.is_empty() {
                    log::warn!(
                        "discarding {} unflushed audio bytes below chunk threshold",
                        self.audio_cache.len()
                    );
                }

                self.size_fields.unregister(SizeField::Movi);

                let mut index_bytes =
                    Vec::with_capacity(self.index.len() * IndexEntry::BYTE_LEN);
                for entry in &self.index {
                    entry.write_to(&mut index_bytes)?;
                }
                self.write_block(chunk_ids::IDX1, &index_bytes, false)?;

                self.compute_timing()?;
                self.odml_header.total_frames = self.video_header.length;

                self.size_fields.unregister(SizeField::Riff);
                self.write_final_headers()?;

                self.sink.flush()?;
                self.status = Status::Finished;
                log::debug!(
                    "avi finalized: {} frames, {} audio samples, {} index entries",
                    self.video_header.length,
                    self.audio_header.length,
                    self.index.len()
                );
                Ok(())
            }
            Status::Finished => Err(AviBuildError::AlreadyClosed),
        }
    }

    /// Number of video frames appended so far
    pub fn video_frames(&self) -> u32 {
        self.video_header.length
    }

    /// Number of audio samples flushed to the file so far
    pub fn audio_samples(&self) -> u32 {
        self.audio_header.length
    }

    /// Audio bytes buffered below the flush threshold
    pub fn buffered_audio(&self) -> usize {
        self.audio_cache.len()
    }

    /// Consume the builder and return the sink
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Write zero-filled placeholders for every header structure, in strict
    /// nesting order, recording each one's offset for the backpatch pass
    fn write_phony_headers(&mut self) -> Result<()> {
        self.offsets.riff_list = self.pos;
        self.write_phony(ListHeader::BYTE_LEN)?;
        self.size_fields.register(SizeField::Riff, ListHeader::KIND_LEN);

        self.offsets.hdrl_list = self.pos;
        self.write_phony(ListHeader::BYTE_LEN)?;
        self.size_fields.register(SizeField::Hdrl, ListHeader::KIND_LEN);

        // avih has a fixed length, so its chunk header is real from the
        // start; the content is still rewritten at close
        self.offsets.main_header = self.pos + ChunkHeader::BYTE_LEN;
        let bytes = self.main_header.to_bytes()?;
        self.write_block(chunk_ids::AVIH, &bytes, false)?;

        self.offsets.strl_video = self.pos;
        self.write_phony(ListHeader::BYTE_LEN)?;
        self.size_fields
            .register(SizeField::StrlVideo, ListHeader::KIND_LEN);

        self.offsets.strh_video = self.pos + ChunkHeader::BYTE_LEN;
        let bytes = self.video_header.to_bytes()?;
        self.write_block(chunk_ids::STRH, &bytes, false)?;

        self.offsets.strf_video = self.pos + ChunkHeader::BYTE_LEN;
        let bytes = self.video_format.to_bytes()?;
        self.write_block(chunk_ids::STRF, &bytes, false)?;
        self.size_fields.unregister(SizeField::StrlVideo);

        self.offsets.strl_audio = self.pos;
        self.write_phony(ListHeader::BYTE_LEN)?;
        self.size_fields
            .register(SizeField::StrlAudio, ListHeader::KIND_LEN);

        self.offsets.strh_audio = self.pos + ChunkHeader::BYTE_LEN;
        let bytes = self.audio_header.to_bytes()?;
        self.write_block(chunk_ids::STRH, &bytes, false)?;

        self.offsets.strf_audio = self.pos + ChunkHeader::BYTE_LEN;
        let bytes = self.audio_format.to_bytes()?;
        self.write_block(chunk_ids::STRF, &bytes, false)?;
        self.size_fields.unregister(SizeField::StrlAudio);

        self.offsets.odml_list = self.pos;
        self.write_phony(ListHeader::BYTE_LEN)?;
        self.size_fields.register(SizeField::Odml, ListHeader::KIND_LEN);

        self.offsets.odml_header = self.pos + ChunkHeader::BYTE_LEN;
        let bytes = self.odml_header.to_bytes()?;
        self.write_block(chunk_ids::ODMH, &bytes, false)?;
        self.size_fields.unregister(SizeField::Odml);

        self.size_fields.unregister(SizeField::Hdrl);

        // movi stays open for the whole streaming phase
        self.offsets.movi_list = self.pos;
        self.write_phony(ListHeader::BYTE_LEN)?;
        self.size_fields.register(SizeField::Movi, ListHeader::KIND_LEN);

        log::debug!("headers reserved, movi starts at {}", self.offsets.movi_list);
        Ok(())
    }

    /// Write one chunk: header, payload, pad byte when the length is odd.
    /// Credits every open size field and advances the cursor.
    fn write_block(&mut self, id: FourCC, payload: &[u8], record_index: bool) -> Result<()> {
        let size = payload.len() as u32;

        if record_index {
            self.index.push(IndexEntry {
                chunk_id: id,
                flags: 0,
                offset: self.pos as u32,
                size,
            });
        }

        ChunkHeader::new(id, size).write_to(&mut self.sink)?;
        self.sink.write_all(payload)?;

        let pad = size % 2;
        if pad != 0 {
            self.sink.write_all(&[0])?;
        }

        let written = ChunkHeader::BYTE_LEN + size as u64 + pad as u64;
        self.size_fields.credit(written as u32);
        self.pos += written;
        Ok(())
    }

    /// Flush `payload` as chunks of exactly `buffer_size` bytes while enough
    /// remains; returns the number of bytes consumed, leaving the remainder
    /// to the caller
    fn write_block_split(&mut self, id: FourCC, payload: &[u8]) -> Result<usize> {
        let chunk_size = self.config.buffer_size as usize;
        let mut consumed = 0;

        while payload.len() - consumed >= chunk_size {
            self.write_block(id, &payload[consumed..consumed + chunk_size], true)?;
            consumed += chunk_size;
        }

        Ok(consumed)
    }

    /// Write `nbytes` zero bytes, crediting open size fields
    fn write_phony(&mut self, nbytes: u64) -> Result<()> {
        self.sink.write_all(&vec![0u8; nbytes as usize])?;
        self.size_fields.credit(nbytes as u32);
        self.pos += nbytes;
        Ok(())
    }

    /// Derive the timing fields at finalization: from the audio stream
    /// length when both audio and video were written, otherwise from the
    /// declared media type frame rate
    fn compute_timing(&mut self) -> Result<()> {
        if self.audio_header.length > 0 && self.video_header.length > 0 {
            let duration = self.audio_header.length as f64 / self.audio_header.rate as f64;
            self.video_header.rate = self.video_header.length;
            self.video_header.scale = duration as u32;
            self.main_header.micro_sec_per_frame =
                (1e6 * self.video_header.scale as f64 / self.video_header.rate as f64) as u32;
        } else {
            if !self.media_type.has_frame_rate() {
                return Err(AviBuildError::MissingFrameRate);
            }
            self.video_header.scale = self.media_type.frame_rate_den;
            self.video_header.rate = self.media_type.frame_rate_num;
            self.main_header.micro_sec_per_frame = (1e6
                * self.media_type.frame_rate_den as f64
                / self.media_type.frame_rate_num as f64)
                as u32;
        }
        Ok(())
    }

    /// Seek to every reserved region and overwrite it with the finalized
    /// structure bytes
    fn write_final_headers(&mut self) -> Result<()> {
        self.sink.seek(SeekFrom::Start(self.offsets.riff_list))?;
        ListHeader::new(
            chunk_ids::RIFF,
            self.size_fields.value(SizeField::Riff),
            chunk_ids::AVI,
        )
        .write_to(&mut self.sink)?;

        self.sink.seek(SeekFrom::Start(self.offsets.hdrl_list))?;
        ListHeader::new(
            chunk_ids::LIST,
            self.size_fields.value(SizeField::Hdrl),
            chunk_ids::HDRL,
        )
        .write_to(&mut self.sink)?;

        self.sink.seek(SeekFrom::Start(self.offsets.main_header))?;
        self.main_header.write_to(&mut self.sink)?;

        self.sink.seek(SeekFrom::Start(self.offsets.strl_video))?;
        ListHeader::new(
            chunk_ids::LIST,
            self.size_fields.value(SizeField::StrlVideo),
            chunk_ids::STRL,
        )
        .write_to(&mut self.sink)?;

        self.sink.seek(SeekFrom::Start(self.offsets.strh_video))?;
        self.video_header.write_to(&mut self.sink)?;

        self.sink.seek(SeekFrom::Start(self.offsets.strf_video))?;
        self.video_format.write_to(&mut self.sink)?;

        self.sink.seek(SeekFrom::Start(self.offsets.strl_audio))?;
        ListHeader::new(
            chunk_ids::LIST,
            self.size_fields.value(SizeField::StrlAudio),
            chunk_ids::STRL,
        )
        .write_to(&mut self.sink)?;

        self.sink.seek(SeekFrom::Start(self.offsets.strh_audio))?;
        self.audio_header.write_to(&mut self.sink)?;

        self.sink.seek(SeekFrom::Start(self.offsets.strf_audio))?;
        self.audio_format.write_to(&mut self.sink)?;

        self.sink.seek(SeekFrom::Start(self.offsets.odml_list))?;
        ListHeader::new(
            chunk_ids::LIST,
            self.size_fields.value(SizeField::Odml),
            chunk_ids::ODML,
        )
        .write_to(&mut self.sink)?;

        self.sink.seek(SeekFrom::Start(self.offsets.odml_header))?;
        self.odml_header.write_to(&mut self.sink)?;

        self.sink.seek(SeekFrom::Start(self.offsets.movi_list))?;
        ListHeader::new(
            chunk_ids::LIST,
            self.size_fields.value(SizeField::Movi),
            chunk_ids::MOVI,
        )
        .write_to(&mut self.sink)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AudioChannel;
    use std::io::Cursor;

    fn video_config() -> Config {
        Config::new("width=640,height=480,framerate=30/1")
    }

    #[test]
    fn test_new_parses_media_type() {
        let builder = AviBuilder::new(Cursor::new(Vec::new()), video_config()).unwrap();
        assert_eq!(builder.main_header.width, 640);
        assert_eq!(builder.main_header.height, 480);
        assert_eq!(builder.main_header.streams, 2);
    }

    #[test]
    fn test_new_rejects_bad_media_type() {
        let config = Config::new("framerate=30");
        let err = AviBuilder::new(Cursor::new(Vec::new()), config).unwrap_err();
        assert!(matches!(err, AviBuildError::InvalidMediaType(_)));
    }

    #[test]
    fn test_first_append_reserves_headers() {
        let mut builder = AviBuilder::new(Cursor::new(Vec::new()), video_config()).unwrap();
        builder.add_video(&[0u8; 100]).unwrap();

        assert_eq!(builder.status, Status::WritingData);
        assert_eq!(builder.offsets.riff_list, 0);
        assert_eq!(builder.offsets.movi_list, 338);
        // movi content begins right after its list header
        assert_eq!(builder.index[0].offset, 350);
    }

    #[test]
    fn test_video_append_updates_counts() {
        let mut builder = AviBuilder::new(Cursor::new(Vec::new()), video_config()).unwrap();
        builder.add_video(&[1u8; 100]).unwrap();
        builder.add_video(&[2u8; 200]).unwrap();

        assert_eq!(builder.video_frames(), 2);
        assert_eq!(builder.main_header.total_frames, 2);
        assert_eq!(builder.index.len(), 2);
    }

    #[test]
    fn test_audio_buffers_below_threshold() {
        let config = video_config().with_audio_channel(AudioChannel::default());
        let mut builder = AviBuilder::new(Cursor::new(Vec::new()), config).unwrap();

        builder.add_audio(0, &[0u8; 1000]).unwrap();
        assert_eq!(builder.buffered_audio(), 1000);
        assert_eq!(builder.audio_samples(), 0);
        assert!(builder.index.is_empty());
    }

    #[test]
    fn test_audio_flush_keeps_remainder() {
        let config = video_config().with_audio_channel(AudioChannel::default());
        let mut builder = AviBuilder::new(Cursor::new(Vec::new()), config).unwrap();

        builder.add_audio(0, &[0u8; 10000]).unwrap();
        // two 4096-byte chunks flushed, 1808 retained
        assert_eq!(builder.index.len(), 2);
        assert_eq!(builder.audio_samples(), 4096);
        assert_eq!(builder.buffered_audio(), 1808);

        // next call pushes the cache over the threshold again
        builder.add_audio(0, &[0u8; 2400]).unwrap();
        assert_eq!(builder.index.len(), 3);
        assert_eq!(builder.audio_samples(), 6144);
        assert_eq!(builder.buffered_audio(), 112);
    }

    #[test]
    fn test_unknown_channel_rejected_without_mutation() {
        let config = video_config().with_audio_channel(AudioChannel::default());
        let mut builder = AviBuilder::new(Cursor::new(Vec::new()), config).unwrap();

        let err = builder.add_audio(1, &[0u8; 100]).unwrap_err();
        assert!(matches!(err, AviBuildError::UnknownChannel(1)));
        assert_eq!(builder.status, Status::Ready);
        assert_eq!(builder.buffered_audio(), 0);
    }

    #[test]
    fn test_append_after_close_fails() {
        let mut builder = AviBuilder::new(Cursor::new(Vec::new()), video_config()).unwrap();
        builder.add_video(&[0u8; 100]).unwrap();
        builder.close().unwrap();

        assert!(matches!(
            builder.add_video(&[0u8; 100]),
            Err(AviBuildError::AlreadyClosed)
        ));
        assert!(matches!(builder.close(), Err(AviBuildError::AlreadyClosed)));
    }

    #[test]
    fn test_missing_frame_rate() {
        let mut builder =
            AviBuilder::new(Cursor::new(Vec::new()), Config::new("width=640,height=480"))
                .unwrap();
        builder.add_video(&[0u8; 100]).unwrap();

        let err = builder.close().unwrap_err();
        assert!(matches!(err, AviBuildError::MissingFrameRate));
    }

    #[test]
    fn test_timing_from_declared_frame_rate() {
        let mut builder = AviBuilder::new(Cursor::new(Vec::new()), video_config()).unwrap();
        builder.add_video(&[0u8; 100]).unwrap();
        builder.close().unwrap();

        assert_eq!(builder.main_header.micro_sec_per_frame, 33333);
        assert_eq!(builder.video_header.rate, 30);
        assert_eq!(builder.video_header.scale, 1);
        assert_eq!(builder.odml_header.total_frames, 1);
    }

    #[test]
    fn test_timing_with_audio_but_no_frames_uses_declared_rate() {
        let config = video_config().with_audio_channel(AudioChannel::default());
        let mut builder = AviBuilder::new(Cursor::new(Vec::new()), config).unwrap();

        builder.add_audio(0, &[0u8; 8192]).unwrap();
        builder.close().unwrap();

        // zero frames make the audio-derived ratio meaningless
        assert_eq!(builder.video_header.rate, 30);
        assert_eq!(builder.video_header.scale, 1);
        assert_eq!(builder.main_header.micro_sec_per_frame, 33333);
    }

    #[test]
    fn test_audio_without_frames_or_declared_rate_fails() {
        let config = Config::new("width=640,height=480")
            .with_audio_channel(AudioChannel::default());
        let mut builder = AviBuilder::new(Cursor::new(Vec::new()), config).unwrap();

        builder.add_audio(0, &[0u8; 8192]).unwrap();
        let err = builder.close().unwrap_err();
        assert!(matches!(err, AviBuildError::MissingFrameRate));
    }

    #[test]
    fn test_timing_from_audio_duration() {
        let config = video_config().with_audio_channel(AudioChannel::default());
        let mut builder = AviBuilder::new(Cursor::new(Vec::new()), config).unwrap();

        // 32768 bytes = 16384 samples at 8000 Hz, about 2 seconds; 60 frames
        builder.add_audio(0, &vec![0u8; 32768]).unwrap();
        for _ in 0..60 {
            builder.add_video(&[0u8; 10]).unwrap();
        }
        builder.close().unwrap();

        assert_eq!(builder.audio_samples(), 16384);
        assert_eq!(builder.video_header.rate, 60);
        assert_eq!(builder.video_header.scale, 2);
        assert_eq!(builder.main_header.micro_sec_per_frame, 33333);
    }
}
