//! Chunk layout of a parsed PNG stream

use crate::{
    chunk::{Chunk, ChunkType, CHUNK_OVERHEAD},
    chunk_iter::{PngStream, PNG_SIGNATURE},
    error::{Error, Result},
};

/// A byte range in a stream (offset and size)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Offset from start of stream
    pub offset: u64,
    /// Size in bytes
    pub size: u64,
}

impl ByteRange {
    /// Create a new byte range
    pub fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    /// Get the end offset of this range
    pub fn end_offset(&self) -> u64 {
        self.offset + self.size
    }

    /// Slice this range out of a buffer, if it fits
    pub fn slice<'a>(&self, bytes: &'a [u8]) -> Option<&'a [u8]> {
        let start = usize::try_from(self.offset).ok()?;
        let end = start.checked_add(usize::try_from(self.size).ok()?)?;
        bytes.get(start..end)
    }
}

/// Location of one chunk within the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkInfo {
    /// Chunk type tag
    pub chunk_type: ChunkType,
    /// Whole chunk: length, type, data and CRC fields
    pub range: ByteRange,
    /// CRC as stored
    pub crc: u32,
}

impl ChunkInfo {
    fn from_chunk(chunk: &Chunk<'_>) -> Self {
        Self {
            chunk_type: chunk.chunk_type,
            range: ByteRange::new(chunk.offset, chunk.total_size()),
            crc: chunk.crc,
        }
    }

    /// Data field only
    pub fn data_range(&self) -> ByteRange {
        ByteRange::new(self.range.offset + 8, self.range.size - CHUNK_OVERHEAD)
    }
}

/// The discovered chunk layout of a PNG stream
///
/// Built in a single pass over the chunk sequence; holds offsets only, so it
/// must be used together with the buffer it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    /// All chunks in stream order
    pub chunks: Vec<ChunkInfo>,

    /// Bytes covered by the signature and the chunks (excludes data after `IEND`)
    pub total_size: u64,

    /// Quick lookup: indices of aiip chunks
    aiip_indices: Vec<usize>,
}

impl Structure {
    /// Parse the chunk layout of a PNG buffer
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let stream = PngStream::new(bytes)?;
        let mut structure = Self {
            chunks: Vec::new(),
            total_size: PNG_SIGNATURE.len() as u64,
            aiip_indices: Vec::new(),
        };

        for chunk in stream.chunks() {
            structure.add_chunk(ChunkInfo::from_chunk(&chunk?));
        }

        tracing::debug!(
            chunks = structure.chunks.len(),
            total_size = structure.total_size,
            aiip_chunks = structure.aiip_indices.len(),
            "Parsed PNG structure"
        );
        Ok(structure)
    }

    /// Add a chunk and update indices
    fn add_chunk(&mut self, info: ChunkInfo) {
        if info.chunk_type == ChunkType::AIIP {
            self.aiip_indices.push(self.chunks.len());
        }
        self.total_size = info.range.end_offset();
        self.chunks.push(info);
    }

    /// Indices of all aiip chunks, in stream order
    pub fn aiip_indices(&self) -> &[usize] {
        &self.aiip_indices
    }

    /// The aiip chunk a reader would use (the first one)
    pub fn aiip(&self) -> Option<&ChunkInfo> {
        self.aiip_indices.first().map(|&i| &self.chunks[i])
    }

    /// Index of the first chunk of the given type
    pub fn position(&self, chunk_type: ChunkType) -> Option<usize> {
        self.chunks.iter().position(|c| c.chunk_type == chunk_type)
    }

    /// True when the stream ends with an `IEND` chunk
    pub fn has_iend(&self) -> bool {
        self.chunks
            .last()
            .is_some_and(|c| c.chunk_type == ChunkType::IEND)
    }

    /// True when an aiip chunk sits before the first `IDAT`
    pub fn aiip_precedes_image_data(&self) -> bool {
        match (self.aiip_indices.first(), self.position(ChunkType::IDAT)) {
            (Some(&aiip), Some(idat)) => aiip < idat,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Borrow the data of a chunk from the buffer this structure came from
    pub fn chunk_data<'a>(&self, bytes: &'a [u8], index: usize) -> Option<&'a [u8]> {
        self.chunks.get(index)?.data_range().slice(bytes)
    }

    /// Like [`Structure::chunk_data`], failing when the buffer is too short
    pub fn require_chunk_data<'a>(&self, bytes: &'a [u8], index: usize) -> Result<&'a [u8]> {
        let (offset, needed) = self
            .chunks
            .get(index)
            .map_or((bytes.len() as u64, CHUNK_OVERHEAD), |c| (c.range.offset, c.range.size));
        self.chunk_data(bytes, index).ok_or(Error::TruncatedStream {
            offset,
            needed,
            available: (bytes.len() as u64).saturating_sub(offset),
        })
    }

    /// Recompute every CRC, failing on the first mismatch
    pub fn verify_checksums(&self, bytes: &[u8]) -> Result<()> {
        for (index, info) in self.chunks.iter().enumerate() {
            let chunk = Chunk {
                offset: info.range.offset,
                chunk_type: info.chunk_type,
                data: self.require_chunk_data(bytes, index)?,
                crc: info.crc,
            };
            chunk.verify_crc()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::write_chunk;

    fn sample() -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        write_chunk(&mut out, ChunkType::IHDR, &[0u8; 13]).unwrap();
        write_chunk(&mut out, ChunkType::AIIP, b"\x01doc").unwrap();
        write_chunk(&mut out, ChunkType::IDAT, b"pixels").unwrap();
        write_chunk(&mut out, ChunkType::IEND, b"").unwrap();
        out
    }

    #[test]
    fn test_parse_layout() {
        let bytes = sample();
        let structure = Structure::parse(&bytes).unwrap();

        assert_eq!(structure.chunks.len(), 4);
        assert_eq!(structure.total_size, bytes.len() as u64);
        assert_eq!(structure.aiip_indices(), &[1]);
        assert_eq!(structure.position(ChunkType::IHDR), Some(0));
        assert_eq!(structure.position(ChunkType::IDAT), Some(2));
        assert!(structure.has_iend());
        assert!(structure.aiip_precedes_image_data());

        let aiip = structure.aiip().unwrap();
        assert_eq!(aiip.range, ByteRange::new(33, 16));
        assert_eq!(aiip.data_range(), ByteRange::new(41, 4));
        assert_eq!(structure.chunk_data(&bytes, 1).unwrap(), b"\x01doc");
    }

    #[test]
    fn test_total_size_ignores_trailing_bytes() {
        let mut bytes = sample();
        let expected = bytes.len() as u64;
        bytes.extend_from_slice(b"trailer");
        assert_eq!(Structure::parse(&bytes).unwrap().total_size, expected);
    }

    #[test]
    fn test_verify_checksums() {
        let mut bytes = sample();
        let structure = Structure::parse(&bytes).unwrap();
        assert!(structure.verify_checksums(&bytes).is_ok());

        // Flip a data byte in IDAT
        let idat = structure.chunks[2].data_range();
        bytes[idat.offset as usize] ^= 0x01;
        let structure = Structure::parse(&bytes).unwrap();
        match structure.verify_checksums(&bytes) {
            Err(Error::ChecksumMismatch { chunk_type, .. }) => {
                assert_eq!(chunk_type, ChunkType::IDAT)
            }
            other => panic!("Expected ChecksumMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_byte_range_slice_bounds() {
        let bytes = [1u8, 2, 3, 4];
        assert_eq!(ByteRange::new(1, 2).slice(&bytes), Some(&bytes[1..3]));
        assert_eq!(ByteRange::new(3, 2).slice(&bytes), None);
        assert_eq!(ByteRange::new(u64::MAX - 1, 4).slice(&bytes), None);
    }
}
