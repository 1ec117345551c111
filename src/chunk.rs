//! PNG chunk types and the chunk appender

use crate::error::{Error, Result};
use byteorder::{BigEndian, WriteBytesExt};
use std::fmt;
use std::io::Write;

/// Largest data length a PNG chunk may declare (2^31 - 1)
pub const MAX_CHUNK_LENGTH: u64 = 0x7FFF_FFFF;

/// Bytes of framing around chunk data: length (4) + type (4) + CRC (4)
pub const CHUNK_OVERHEAD: u64 = 12;

/// A 4-byte PNG chunk type tag
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
    /// Image header
    pub const IHDR: ChunkType = ChunkType(*b"IHDR");
    /// Palette
    pub const PLTE: ChunkType = ChunkType(*b"PLTE");
    /// Image data
    pub const IDAT: ChunkType = ChunkType(*b"IDAT");
    /// Image trailer
    pub const IEND: ChunkType = ChunkType(*b"IEND");
    /// Embedded AIIP metadata document
    pub const AIIP: ChunkType = ChunkType(*b"aiip");

    /// Raw tag bytes
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Critical chunks must be understood by a decoder (bit 5 of byte 0 clear)
    pub fn is_critical(&self) -> bool {
        self.0[0] & 0x20 == 0
    }

    /// Ancillary chunks may be skipped by decoders that don't recognise them
    pub fn is_ancillary(&self) -> bool {
        !self.is_critical()
    }

    /// Private chunks are not registered with the PNG specification
    pub fn is_private(&self) -> bool {
        self.0[1] & 0x20 != 0
    }

    /// Editors may copy unknown safe-to-copy chunks into modified images
    pub fn is_safe_to_copy(&self) -> bool {
        self.0[3] & 0x20 != 0
    }
}

impl From<[u8; 4]> for ChunkType {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkType({})", self)
    }
}

/// A single chunk borrowed from a PNG byte buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Offset of the length field from the start of the stream
    pub offset: u64,
    /// Chunk type tag
    pub chunk_type: ChunkType,
    /// Chunk data (exactly `length` bytes)
    pub data: &'a [u8],
    /// CRC as stored in the stream (not validated)
    pub crc: u32,
}

impl<'a> Chunk<'a> {
    /// Declared data length
    pub fn length(&self) -> u32 {
        self.data.len() as u32
    }

    /// Size on disk including length, type and CRC fields
    pub fn total_size(&self) -> u64 {
        CHUNK_OVERHEAD + self.data.len() as u64
    }

    /// CRC computed over type and data
    pub fn computed_crc(&self) -> u32 {
        crc32(&self.chunk_type, self.data)
    }

    /// Check the stored CRC against the computed one
    pub fn verify_crc(&self) -> Result<()> {
        let computed = self.computed_crc();
        if computed != self.crc {
            return Err(Error::ChecksumMismatch {
                chunk_type: self.chunk_type,
                offset: self.offset,
                stored: self.crc,
                computed,
            });
        }
        Ok(())
    }
}

/// Calculate the PNG CRC-32 over a chunk's type and data
pub fn crc32(chunk_type: &ChunkType, data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type.as_bytes());
    hasher.update(data);
    hasher.finalize()
}

/// Write a PNG chunk with proper length and CRC
pub fn write_chunk<W: Write>(writer: &mut W, chunk_type: ChunkType, data: &[u8]) -> Result<()> {
    if data.len() as u64 > MAX_CHUNK_LENGTH {
        return Err(Error::DataTooLarge {
            size: data.len() as u64,
            max: MAX_CHUNK_LENGTH,
        });
    }

    writer.write_u32::<BigEndian>(data.len() as u32)?;
    writer.write_all(chunk_type.as_bytes())?;
    writer.write_all(data)?;
    writer.write_u32::<BigEndian>(crc32(&chunk_type, data))?;

    Ok(())
}
