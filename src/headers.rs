//! Fixed-size AVI header records
//!
//! These mirror the on-disk layout of the standard AVI structures
//! (MainAVIHeader, AVIStreamHeader, BITMAPINFOHEADER, WAVEFORMATEX and the
//! ODML extended header): little-endian, 1-byte packing, word alignment
//! handled by the enclosing chunks.

use crate::chunks::FourCC;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Cursor, Write};

/// AVI header flags (dwFlags of the main header)
#[derive(Debug, Clone, Copy, Default)]
pub struct AviFlags {
    /// File has an idx1 index (AVIF_HASINDEX)
    pub has_index: bool,
    /// File must use index for playback (AVIF_MUSTUSEINDEX)
    pub must_use_index: bool,
    /// File is interleaved (AVIF_ISINTERLEAVED)
    pub is_interleaved: bool,
    /// Trust chunk type for seeking (AVIF_TRUSTCKTYPE)
    pub trust_chunk_type: bool,
    /// File was captured (AVIF_WASCAPTUREFILE)
    pub was_captured: bool,
    /// File is copyrighted (AVIF_COPYRIGHTED)
    pub is_copyrighted: bool,
}

impl AviFlags {
    pub fn to_u32(self) -> u32 {
        let mut value = 0u32;
        if self.has_index {
            value |= 0x10;
        }
        if self.must_use_index {
            value |= 0x20;
        }
        if self.is_interleaved {
            value |= 0x100;
        }
        if self.trust_chunk_type {
            value |= 0x800;
        }
        if self.was_captured {
            value |= 0x10000;
        }
        if self.is_copyrighted {
            value |= 0x20000;
        }
        value
    }

    pub fn from_u32(value: u32) -> Self {
        AviFlags {
            has_index: (value & 0x10) != 0,
            must_use_index: (value & 0x20) != 0,
            is_interleaved: (value & 0x100) != 0,
            trust_chunk_type: (value & 0x800) != 0,
            was_captured: (value & 0x10000) != 0,
            is_copyrighted: (value & 0x20000) != 0,
        }
    }
}

/// Main AVI header (avih chunk content)
#[derive(Debug, Clone, Default)]
pub struct MainAviHeader {
    /// Microseconds per frame
    pub micro_sec_per_frame: u32,
    /// Maximum transfer rate in bytes per second
    pub max_bytes_per_sec: u32,
    /// Pad to multiples of this size
    pub padding_granularity: u32,
    /// AVI flags
    pub flags: AviFlags,
    /// Total number of frames
    pub total_frames: u32,
    /// Initial frames (for interleaved files)
    pub initial_frames: u32,
    /// Number of streams
    pub streams: u32,
    /// Suggested buffer size
    pub suggested_buffer_size: u32,
    /// Video width
    pub width: u32,
    /// Video height
    pub height: u32,
}

impl MainAviHeader {
    /// On-disk size of the record (4 reserved dwords included)
    pub const BYTE_LEN: u32 = 56;

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.micro_sec_per_frame)?;
        writer.write_u32::<LittleEndian>(self.max_bytes_per_sec)?;
        writer.write_u32::<LittleEndian>(self.padding_granularity)?;
        writer.write_u32::<LittleEndian>(self.flags.to_u32())?;
        writer.write_u32::<LittleEndian>(self.total_frames)?;
        writer.write_u32::<LittleEndian>(self.initial_frames)?;
        writer.write_u32::<LittleEndian>(self.streams)?;
        writer.write_u32::<LittleEndian>(self.suggested_buffer_size)?;
        writer.write_u32::<LittleEndian>(self.width)?;
        writer.write_u32::<LittleEndian>(self.height)?;
        writer.write_all(&[0u8; 16])?; // dwReserved[4]
        Ok(())
    }

    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// Frame rectangle of a stream header
#[derive(Debug, Clone, Copy, Default)]
pub struct Rect {
    pub left: i16,
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
}

/// Stream header (strh chunk content)
#[derive(Debug, Clone)]
pub struct StreamHeader {
    /// Stream type fourcc (vids, auds)
    pub fcc_type: FourCC,
    /// Codec handler fourcc
    pub fcc_handler: FourCC,
    /// Stream flags
    pub flags: u32,
    /// Priority
    pub priority: u16,
    /// Language
    pub language: u16,
    /// Initial frames
    pub initial_frames: u32,
    /// Time scale; rate / scale == samples per second
    pub scale: u32,
    /// Rate
    pub rate: u32,
    /// Start time
    pub start: u32,
    /// Stream length in rate/scale units
    pub length: u32,
    /// Suggested buffer size
    pub suggested_buffer_size: u32,
    /// Quality (0-10000)
    pub quality: u32,
    /// Sample size in bytes (0 for variable)
    pub sample_size: u32,
    /// Frame rectangle
    pub frame: Rect,
}

impl StreamHeader {
    /// On-disk size of the record
    pub const BYTE_LEN: u32 = 56;

    pub fn new(fcc_type: FourCC, fcc_handler: FourCC) -> Self {
        StreamHeader {
            fcc_type,
            fcc_handler,
            flags: 0,
            priority: 0,
            language: 0,
            initial_frames: 0,
            scale: 0,
            rate: 0,
            start: 0,
            length: 0,
            suggested_buffer_size: 0,
            quality: 0,
            sample_size: 0,
            frame: Rect::default(),
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.fcc_type.as_bytes())?;
        writer.write_all(self.fcc_handler.as_bytes())?;
        writer.write_u32::<LittleEndian>(self.flags)?;
        writer.write_u16::<LittleEndian>(self.priority)?;
        writer.write_u16::<LittleEndian>(self.language)?;
        writer.write_u32::<LittleEndian>(self.initial_frames)?;
        writer.write_u32::<LittleEndian>(self.scale)?;
        writer.write_u32::<LittleEndian>(self.rate)?;
        writer.write_u32::<LittleEndian>(self.start)?;
        writer.write_u32::<LittleEndian>(self.length)?;
        writer.write_u32::<LittleEndian>(self.suggested_buffer_size)?;
        writer.write_u32::<LittleEndian>(self.quality)?;
        writer.write_u32::<LittleEndian>(self.sample_size)?;
        writer.write_i16::<LittleEndian>(self.frame.left)?;
        writer.write_i16::<LittleEndian>(self.frame.top)?;
        writer.write_i16::<LittleEndian>(self.frame.right)?;
        writer.write_i16::<LittleEndian>(self.frame.bottom)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// Video format (BITMAPINFOHEADER, strf chunk content of the video stream)
#[derive(Debug, Clone)]
pub struct BitmapInfoHeader {
    /// Structure size
    pub size: u32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
    /// Number of planes (always 1)
    pub planes: u16,
    /// Bits per pixel
    pub bit_count: u16,
    /// Compression fourcc
    pub compression: FourCC,
    /// Image size in bytes
    pub image_size: u32,
    /// Horizontal resolution
    pub x_pels_per_meter: i32,
    /// Vertical resolution
    pub y_pels_per_meter: i32,
    /// Colors used
    pub colors_used: u32,
    /// Important colors
    pub colors_important: u32,
}

impl BitmapInfoHeader {
    /// On-disk size of the record
    pub const BYTE_LEN: u32 = 40;

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.size)?;
        writer.write_i32::<LittleEndian>(self.width)?;
        writer.write_i32::<LittleEndian>(self.height)?;
        writer.write_u16::<LittleEndian>(self.planes)?;
        writer.write_u16::<LittleEndian>(self.bit_count)?;
        writer.write_all(self.compression.as_bytes())?;
        writer.write_u32::<LittleEndian>(self.image_size)?;
        writer.write_i32::<LittleEndian>(self.x_pels_per_meter)?;
        writer.write_i32::<LittleEndian>(self.y_pels_per_meter)?;
        writer.write_u32::<LittleEndian>(self.colors_used)?;
        writer.write_u32::<LittleEndian>(self.colors_important)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// Audio format (WAVEFORMATEX, strf chunk content of the audio stream)
#[derive(Debug, Clone)]
pub struct WaveFormat {
    /// Format tag (1 for PCM)
    pub format_tag: u16,
    /// Number of channels
    pub channels: u16,
    /// Samples per second
    pub samples_per_sec: u32,
    /// Average bytes per second
    pub avg_bytes_per_sec: u32,
    /// Block alignment
    pub block_align: u16,
    /// Bits per sample
    pub bits_per_sample: u16,
    /// Size of trailing codec data (0 for PCM)
    pub extra_size: u16,
}

impl WaveFormat {
    /// On-disk size of the record (cbSize included, no extra data)
    pub const BYTE_LEN: u32 = 18;

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.format_tag)?;
        writer.write_u16::<LittleEndian>(self.channels)?;
        writer.write_u32::<LittleEndian>(self.samples_per_sec)?;
        writer.write_u32::<LittleEndian>(self.avg_bytes_per_sec)?;
        writer.write_u16::<LittleEndian>(self.block_align)?;
        writer.write_u16::<LittleEndian>(self.bits_per_sample)?;
        writer.write_u16::<LittleEndian>(self.extra_size)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// ODML extended AVI header (odmh chunk content)
#[derive(Debug, Clone, Copy, Default)]
pub struct OdmlHeader {
    /// 32-bit total frame count, past the legacy header limits
    pub total_frames: u32,
}

impl OdmlHeader {
    /// On-disk size of the record
    pub const BYTE_LEN: u32 = 4;

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.total_frames)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::chunk_ids;

    #[test]
    fn test_avi_flags_round_trip() {
        let flags = AviFlags {
            has_index: true,
            is_interleaved: true,
            ..Default::default()
        };
        assert_eq!(flags.to_u32(), 0x110);

        let parsed = AviFlags::from_u32(0x110);
        assert!(parsed.has_index);
        assert!(parsed.is_interleaved);
        assert!(!parsed.was_captured);
    }

    #[test]
    fn test_main_header_byte_len() {
        let header = MainAviHeader::default();
        let bytes = header.to_bytes().unwrap();
        assert_eq!(bytes.len() as u32, MainAviHeader::BYTE_LEN);
    }

    #[test]
    fn test_stream_header_byte_len() {
        let header = StreamHeader::new(chunk_ids::TYPE_VIDEO, chunk_ids::HANDLER_H264);
        let bytes = header.to_bytes().unwrap();
        assert_eq!(bytes.len() as u32, StreamHeader::BYTE_LEN);
        assert_eq!(&bytes[0..4], b"vids");
        assert_eq!(&bytes[4..8], b"H264");
    }

    #[test]
    fn test_bitmap_info_byte_len() {
        let format = BitmapInfoHeader {
            size: BitmapInfoHeader::BYTE_LEN,
            width: 640,
            height: 480,
            planes: 1,
            bit_count: 24,
            compression: chunk_ids::HANDLER_H264,
            image_size: 640 * 480,
            x_pels_per_meter: 0,
            y_pels_per_meter: 0,
            colors_used: 0,
            colors_important: 0,
        };
        let bytes = format.to_bytes().unwrap();
        assert_eq!(bytes.len() as u32, BitmapInfoHeader::BYTE_LEN);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 640);
    }

    #[test]
    fn test_wave_format_byte_len() {
        let format = WaveFormat {
            format_tag: 1,
            channels: 1,
            samples_per_sec: 8000,
            avg_bytes_per_sec: 16000,
            block_align: 2,
            bits_per_sample: 16,
            extra_size: 0,
        };
        let bytes = format.to_bytes().unwrap();
        assert_eq!(bytes.len() as u32, WaveFormat::BYTE_LEN);
    }

    #[test]
    fn test_odml_header_byte_len() {
        let header = OdmlHeader { total_frames: 42 };
        let bytes = header.to_bytes().unwrap();
        assert_eq!(bytes.len() as u32, OdmlHeader::BYTE_LEN);
        assert_eq!(u32::from_le_bytes(bytes[0..4].try_into().unwrap()), 42);
    }
}
