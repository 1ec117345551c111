//! `IHDR` decoding

use crate::{
    chunk::ChunkType,
    chunk_iter::PngStream,
    error::{Error, Result},
};
use byteorder::{BigEndian, ReadBytesExt};

/// Size of the `IHDR` data field
pub const IHDR_LENGTH: usize = 13;

/// Decoded PNG image header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    /// PNG color type code (0, 2, 3, 4 or 6)
    pub color_type: u8,
    pub compression: u8,
    pub filter: u8,
    pub interlace: u8,
}

impl ImageHeader {
    /// Decode the 13-byte `IHDR` data field
    pub fn from_data(data: &[u8]) -> Result<Self> {
        if data.len() != IHDR_LENGTH {
            return Err(Error::MalformedChunk {
                chunk_type: ChunkType::IHDR,
                reason: format!("data must be {} bytes, found {}", IHDR_LENGTH, data.len()),
            });
        }

        let mut cursor = data;
        Ok(Self {
            width: cursor.read_u32::<BigEndian>()?,
            height: cursor.read_u32::<BigEndian>()?,
            bit_depth: cursor.read_u8()?,
            color_type: cursor.read_u8()?,
            compression: cursor.read_u8()?,
            filter: cursor.read_u8()?,
            interlace: cursor.read_u8()?,
        })
    }

    /// Read the header of a PNG stream, which must be its first chunk
    pub fn read(stream: &PngStream<'_>) -> Result<Self> {
        match stream.chunks().next() {
            Some(Ok(chunk)) if chunk.chunk_type == ChunkType::IHDR => Self::from_data(chunk.data),
            Some(Ok(chunk)) => Err(Error::InvalidChunkOrder(format!(
                "first chunk is {}, expected IHDR",
                chunk.chunk_type
            ))),
            Some(Err(e)) => Err(e),
            None => Err(Error::InvalidChunkOrder("stream has no chunks".into())),
        }
    }

    /// Number of samples per pixel implied by the color type
    pub fn channels(&self) -> Option<u8> {
        match self.color_type {
            0 => Some(1),
            2 => Some(3),
            3 => Some(1),
            4 => Some(2),
            6 => Some(4),
            _ => None,
        }
    }

    /// True for Adam7 interlaced images
    pub fn is_interlaced(&self) -> bool {
        self.interlace == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chunk::write_chunk, chunk_iter::PNG_SIGNATURE};

    fn ihdr(width: u32, height: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data
    }

    #[test]
    fn test_decode_header() {
        let header = ImageHeader::from_data(&ihdr(200, 100)).unwrap();
        assert_eq!(header.width, 200);
        assert_eq!(header.height, 100);
        assert_eq!(header.bit_depth, 8);
        assert_eq!(header.color_type, 6);
        assert_eq!(header.channels(), Some(4));
        assert!(!header.is_interlaced());
    }

    #[test]
    fn test_wrong_length() {
        match ImageHeader::from_data(&[0u8; 12]) {
            Err(Error::MalformedChunk { chunk_type, reason }) => {
                assert_eq!(chunk_type, ChunkType::IHDR);
                assert!(reason.contains("13"));
            }
            other => panic!("Expected MalformedChunk, got {:?}", other),
        }

        let mut long = ihdr(1, 1);
        long.push(0);
        assert!(matches!(
            ImageHeader::from_data(&long),
            Err(Error::MalformedChunk { .. })
        ));
    }

    #[test]
    fn test_read_requires_ihdr_first() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        write_chunk(&mut bytes, ChunkType::AIIP, b"\x01").unwrap();
        write_chunk(&mut bytes, ChunkType::IHDR, &ihdr(1, 1)).unwrap();

        let stream = PngStream::new(&bytes).unwrap();
        assert!(matches!(
            ImageHeader::read(&stream),
            Err(Error::InvalidChunkOrder(_))
        ));
    }

    #[test]
    fn test_read_empty_stream() {
        let bytes = PNG_SIGNATURE.to_vec();
        let stream = PngStream::new(&bytes).unwrap();
        assert!(ImageHeader::read(&stream).is_err());
    }
}
