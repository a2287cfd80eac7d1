//! RIFF chunk primitives: FourCC tags, chunk/list headers, index entries

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read, Write};

/// FourCC (Four Character Code) identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Create from bytes
    pub const fn new(bytes: [u8; 4]) -> Self {
        FourCC(bytes)
    }

    /// Get as string
    pub fn as_str(&self) -> String {
        String::from_utf8_lossy(&self.0).to_string()
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl std::fmt::Debug for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FourCC(\"{}\")", self.as_str())
    }
}

impl std::fmt::Display for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<[u8; 4]> for FourCC {
    fn from(bytes: [u8; 4]) -> Self {
        FourCC(bytes)
    }
}

/// Well-known chunk and list IDs
pub mod chunk_ids {
    use super::FourCC;

    pub const RIFF: FourCC = FourCC(*b"RIFF");
    pub const AVI: FourCC = FourCC(*b"AVI ");
    pub const LIST: FourCC = FourCC(*b"LIST");
    pub const HDRL: FourCC = FourCC(*b"hdrl");
    pub const AVIH: FourCC = FourCC(*b"avih");
    pub const STRL: FourCC = FourCC(*b"strl");
    pub const STRH: FourCC = FourCC(*b"strh");
    pub const STRF: FourCC = FourCC(*b"strf");
    pub const ODML: FourCC = FourCC(*b"odml");
    pub const ODMH: FourCC = FourCC(*b"odmh");
    pub const MOVI: FourCC = FourCC(*b"movi");
    pub const IDX1: FourCC = FourCC(*b"idx1");

    /// Video frame chunk, stream 0
    pub const VIDEO_00DB: FourCC = FourCC(*b"00db");
    /// Audio block chunk, stream 1
    pub const AUDIO_01WB: FourCC = FourCC(*b"01wb");

    pub const TYPE_VIDEO: FourCC = FourCC(*b"vids");
    pub const TYPE_AUDIO: FourCC = FourCC(*b"auds");
    pub const HANDLER_H264: FourCC = FourCC(*b"H264");
    pub const HANDLER_PCM: FourCC = FourCC(*b"araw");
}

/// 8-byte RIFF chunk header: tag + declared payload length
#[derive(Debug, Clone, Copy)]
pub struct ChunkHeader {
    pub id: FourCC,
    pub size: u32,
}

impl ChunkHeader {
    /// On-disk size of the header itself
    pub const BYTE_LEN: u64 = 8;

    pub fn new(id: FourCC, size: u32) -> Self {
        ChunkHeader { id, size }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.id.as_bytes())?;
        writer.write_u32::<LittleEndian>(self.size)?;
        Ok(())
    }
}

/// 12-byte RIFF list header: container tag + size + nested type tag
///
/// The size field covers the nested type tag plus all enclosed chunk bytes,
/// so a freshly opened list starts at 4.
#[derive(Debug, Clone, Copy)]
pub struct ListHeader {
    pub list: FourCC,
    pub size: u32,
    pub kind: FourCC,
}

impl ListHeader {
    /// On-disk size of the header itself
    pub const BYTE_LEN: u64 = 12;
    /// Bytes of the nested type tag counted by the size field
    pub const KIND_LEN: u32 = 4;

    pub fn new(list: FourCC, size: u32, kind: FourCC) -> Self {
        ListHeader { list, size, kind }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.list.as_bytes())?;
        writer.write_u32::<LittleEndian>(self.size)?;
        writer.write_all(self.kind.as_bytes())?;
        Ok(())
    }
}

/// AVI index entry (idx1 format)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Chunk ID
    pub chunk_id: FourCC,
    /// Flags
    pub flags: u32,
    /// Absolute file offset of the chunk header
    pub offset: u32,
    /// Size of chunk data
    pub size: u32,
}

impl IndexEntry {
    /// Keyframe flag (AVIIF_KEYFRAME)
    pub const KEYFRAME: u32 = 0x10;
    /// On-disk size of one entry
    pub const BYTE_LEN: usize = 16;

    /// Write to writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.chunk_id.as_bytes())?;
        writer.write_u32::<LittleEndian>(self.flags)?;
        writer.write_u32::<LittleEndian>(self.offset)?;
        writer.write_u32::<LittleEndian>(self.size)?;
        Ok(())
    }

    /// Read from data
    pub fn read(data: &[u8]) -> io::Result<Self> {
        let mut cursor = Cursor::new(data);
        let mut id_bytes = [0u8; 4];
        cursor.read_exact(&mut id_bytes)?;

        Ok(IndexEntry {
            chunk_id: FourCC(id_bytes),
            flags: cursor.read_u32::<LittleEndian>()?,
            offset: cursor.read_u32::<LittleEndian>()?,
            size: cursor.read_u32::<LittleEndian>()?,
        })
    }

    /// Check if this is a keyframe
    pub fn is_keyframe(&self) -> bool {
        (self.flags & Self::KEYFRAME) != 0
    }
}

/// Parse an idx1 payload into entries
pub fn parse_index(data: &[u8]) -> Vec<IndexEntry> {
    let mut entries = Vec::new();
    let mut offset = 0;

    while offset + IndexEntry::BYTE_LEN <= data.len() {
        if let Ok(entry) = IndexEntry::read(&data[offset..]) {
            entries.push(entry);
        }
        offset += IndexEntry::BYTE_LEN;
    }

    entries
}
