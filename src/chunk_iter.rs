//! Lazy chunk scanning over an in-memory PNG stream

use crate::{
    chunk::{Chunk, ChunkType, CHUNK_OVERHEAD},
    error::{Error, Result},
};
use byteorder::{BigEndian, ByteOrder};
use std::iter::FusedIterator;

/// PNG signature: 89 50 4E 47 0D 0A 1A 0A
pub const PNG_SIGNATURE: [u8; 8] = *b"\x89PNG\r\n\x1a\n";

/// Check whether a header starts with the PNG signature
pub fn detect(header: &[u8]) -> bool {
    header.len() >= PNG_SIGNATURE.len() && header[..PNG_SIGNATURE.len()] == PNG_SIGNATURE
}

/// A PNG byte stream whose signature has been checked
///
/// Holding a `PngStream` is proof that offset 0 carries the PNG signature;
/// the chunks themselves are only read when iterated.
#[derive(Debug, Clone, Copy)]
pub struct PngStream<'a> {
    bytes: &'a [u8],
}

impl<'a> PngStream<'a> {
    /// Wrap a buffer, failing if it lacks the PNG signature
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        if !detect(bytes) {
            return Err(Error::MalformedSignature);
        }
        Ok(Self { bytes })
    }

    /// Wrap a buffer whose signature has already been checked
    pub(crate) fn new_unchecked(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// The whole stream, signature included
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Iterate chunks from just after the signature
    ///
    /// Each call starts a fresh scan.
    pub fn chunks(&self) -> ChunkIter<'a> {
        ChunkIter {
            bytes: self.bytes,
            offset: PNG_SIGNATURE.len(),
            done: false,
        }
    }

    /// Find the data of the first chunk with the given type
    ///
    /// The whole chunk sequence is scanned so that a damaged tail is
    /// reported even when the match comes earlier.
    pub fn find(&self, chunk_type: ChunkType) -> Result<Option<Chunk<'a>>> {
        let mut found = None;
        for chunk in self.chunks() {
            let chunk = chunk?;
            if found.is_none() && chunk.chunk_type == chunk_type {
                tracing::trace!(
                    offset = chunk.offset,
                    length = chunk.length(),
                    %chunk_type,
                    "Chunk found"
                );
                found = Some(chunk);
            }
        }
        Ok(found)
    }
}

/// Iterator over the chunks of a [`PngStream`]
///
/// Stops after `IEND` or at the end of the buffer, whichever comes first.
/// After yielding an error the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct ChunkIter<'a> {
    bytes: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> ChunkIter<'a> {
    /// Offset of the next chunk to be read
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn read_chunk(&mut self) -> Result<Chunk<'a>> {
        let start = self.offset;
        let remaining = &self.bytes[start..];

        if (remaining.len() as u64) < CHUNK_OVERHEAD {
            return Err(Error::TruncatedStream {
                offset: start as u64,
                needed: CHUNK_OVERHEAD,
                available: remaining.len() as u64,
            });
        }

        let length = BigEndian::read_u32(&remaining[0..4]) as u64;
        let needed = CHUNK_OVERHEAD + length;
        if (remaining.len() as u64) < needed {
            return Err(Error::TruncatedStream {
                offset: start as u64,
                needed,
                available: remaining.len() as u64,
            });
        }

        // needed fits in the buffer, so it fits in usize
        let data_end = 8 + length as usize;
        let chunk_type = ChunkType([remaining[4], remaining[5], remaining[6], remaining[7]]);
        let data = &remaining[8..data_end];
        let crc = BigEndian::read_u32(&remaining[data_end..data_end + 4]);

        self.offset = start + needed as usize;

        Ok(Chunk {
            offset: start as u64,
            chunk_type,
            data,
            crc,
        })
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.bytes.len() {
            self.done = true;
            return None;
        }

        match self.read_chunk() {
            Ok(chunk) => {
                if chunk.chunk_type == ChunkType::IEND {
                    self.done = true;
                }
                Some(Ok(chunk))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for ChunkIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::write_chunk;

    fn stream(chunks: &[(ChunkType, &[u8])]) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        for (chunk_type, data) in chunks {
            write_chunk(&mut out, *chunk_type, data).unwrap();
        }
        out
    }

    #[test]
    fn test_rejects_bad_signature() {
        assert!(matches!(
            PngStream::new(b"GIF89a.."),
            Err(Error::MalformedSignature)
        ));
        assert!(matches!(PngStream::new(b""), Err(Error::MalformedSignature)));
        assert!(matches!(
            PngStream::new(&PNG_SIGNATURE[..7]),
            Err(Error::MalformedSignature)
        ));
    }

    #[test]
    fn test_iterates_in_order_and_stops_at_iend() {
        let mut bytes = stream(&[
            (ChunkType::IHDR, &[0u8; 13]),
            (ChunkType::IDAT, b"pixels"),
            (ChunkType::IEND, b""),
        ]);
        // Trailing garbage after IEND is never read
        bytes.extend_from_slice(b"garbage");

        let png = PngStream::new(&bytes).unwrap();
        let chunks: Vec<_> = png.chunks().collect::<Result<_>>().unwrap();

        let types: Vec<_> = chunks.iter().map(|c| c.chunk_type).collect();
        assert_eq!(
            types,
            vec![ChunkType::IHDR, ChunkType::IDAT, ChunkType::IEND]
        );
        assert_eq!(chunks[0].offset, 8);
        assert_eq!(chunks[1].offset, 8 + 12 + 13);
        assert_eq!(chunks[1].data, b"pixels");
    }

    #[test]
    fn test_stops_at_end_of_buffer_without_iend() {
        let bytes = stream(&[(ChunkType::IHDR, &[0u8; 13])]);
        let png = PngStream::new(&bytes).unwrap();
        assert_eq!(png.chunks().count(), 1);
    }

    #[test]
    fn test_restartable() {
        let bytes = stream(&[(ChunkType::IHDR, &[0u8; 13]), (ChunkType::IEND, b"")]);
        let png = PngStream::new(&bytes).unwrap();

        let first: Vec<_> = png.chunks().collect::<Result<_>>().unwrap();
        let second: Vec<_> = png.chunks().collect::<Result<_>>().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_truncated_data() {
        let mut bytes = stream(&[(ChunkType::IHDR, &[0u8; 13]), (ChunkType::IEND, b"")]);
        bytes.pop();

        let png = PngStream::new(&bytes).unwrap();
        let mut iter = png.chunks();
        assert!(iter.next().unwrap().is_ok());
        match iter.next() {
            Some(Err(Error::TruncatedStream {
                offset,
                needed,
                available,
            })) => {
                assert_eq!(offset, 33);
                assert_eq!(needed, 12);
                assert_eq!(available, 11);
            }
            other => panic!("Expected TruncatedStream, got {:?}", other),
        }
        assert!(iter.next().is_none(), "iterator is exhausted after an error");
    }

    #[test]
    fn test_length_exceeds_buffer() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0x7F, 0xFF, 0xFF, 0xFF]);
        bytes.extend_from_slice(b"IDAT");
        bytes.extend_from_slice(&[0u8; 16]);

        let png = PngStream::new(&bytes).unwrap();
        let result: Result<Vec<_>> = png.chunks().collect();
        assert!(matches!(result, Err(Error::TruncatedStream { .. })));
    }

    #[test]
    fn test_find_ignores_crc_and_order() {
        let mut bytes = stream(&[
            (ChunkType::IHDR, &[0u8; 13]),
            (ChunkType::IDAT, b"pixels"),
            (ChunkType::AIIP, b"\x01first"),
            (ChunkType::AIIP, b"\x01second"),
            (ChunkType::IEND, b""),
        ]);
        // Corrupt the CRC of the first aiip chunk
        let crc_pos = 8 + 25 + 18 + 4 + 4 + 6;
        bytes[crc_pos] ^= 0xFF;

        let png = PngStream::new(&bytes).unwrap();
        let chunk = png.find(ChunkType::AIIP).unwrap().unwrap();
        assert_eq!(chunk.data, b"\x01first");
        assert!(chunk.verify_crc().is_err());
    }

    #[test]
    fn test_find_reports_damaged_tail() {
        let mut bytes = stream(&[
            (ChunkType::IHDR, &[0u8; 13]),
            (ChunkType::AIIP, b"\x01doc"),
            (ChunkType::IEND, b""),
        ]);
        bytes.pop();

        let png = PngStream::new(&bytes).unwrap();
        assert!(matches!(
            png.find(ChunkType::AIIP),
            Err(Error::TruncatedStream { .. })
        ));
    }

    #[test]
    fn test_find_missing() {
        let bytes = stream(&[(ChunkType::IHDR, &[0u8; 13]), (ChunkType::IEND, b"")]);
        let png = PngStream::new(&bytes).unwrap();
        assert!(png.find(ChunkType::AIIP).unwrap().is_none());
    }
}
