//! Payload compression methods
//!
//! The first byte of every `aiip` chunk names the compression method used for
//! the rest of the chunk. Only DEFLATE (in its zlib wrapper, as PNG uses for
//! `IDAT` and `zTXt`) is defined; all other byte values are reserved.

use crate::error::{Error, Result};
use flate2::{write::ZlibEncoder, Compression, Decompress, FlushDecompress, Status};
use std::io::{self, Write};

/// Maximum decompressed payload size (256 MB)
///
/// A few kilobytes of compressed input can otherwise expand to gigabytes.
pub const MAX_PAYLOAD_SIZE: u64 = 256 * 1024 * 1024;

/// Default zlib compression level
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Compression method tag stored in byte 0 of the chunk data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CompressionMethod {
    /// zlib-wrapped DEFLATE
    #[default]
    Deflate = 0x01,
}

impl CompressionMethod {
    /// The on-disk method byte
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Compress a payload at the given level (0-9, clamped)
    pub fn compress(self, payload: &[u8], level: u32) -> Result<Vec<u8>> {
        match self {
            CompressionMethod::Deflate => {
                let mut encoder = ZlibEncoder::new(
                    Vec::with_capacity(payload.len() / 2 + 16),
                    Compression::new(level.min(9)),
                );
                encoder.write_all(payload)?;
                Ok(encoder.finish()?)
            }
        }
    }

    /// Decompress a payload, refusing output larger than [`MAX_PAYLOAD_SIZE`]
    ///
    /// The input must hold exactly one complete zlib stream; a stream that
    /// ends early or is followed by extra bytes is a decompression error.
    pub fn decompress(self, compressed: &[u8]) -> Result<Vec<u8>> {
        self.decompress_with_limit(compressed, MAX_PAYLOAD_SIZE)
    }

    /// Decompress a payload, refusing output larger than `limit` bytes
    pub fn decompress_with_limit(self, compressed: &[u8], limit: u64) -> Result<Vec<u8>> {
        match self {
            CompressionMethod::Deflate => inflate_zlib(compressed, limit),
        }
    }
}

fn decompression_error(kind: io::ErrorKind, msg: String) -> Error {
    Error::Decompression(io::Error::new(kind, msg))
}

fn inflate_zlib(compressed: &[u8], limit: u64) -> Result<Vec<u8>> {
    // One byte past the limit is enough to tell an oversized payload apart
    let max_len = usize::try_from(limit.saturating_add(1)).unwrap_or(usize::MAX);
    let mut inflater = Decompress::new(true);
    let mut out: Vec<u8> =
        Vec::with_capacity(compressed.len().saturating_mul(4).clamp(1024, 1 << 20).min(max_len));

    loop {
        if out.capacity() - out.len() < 4096 && out.capacity() < max_len {
            let target = out.capacity().saturating_mul(2).max(64 * 1024).min(max_len);
            out.reserve_exact(target - out.len());
        }

        let (in_before, out_before) = (inflater.total_in() as usize, out.len());
        let input = compressed.get(in_before..).unwrap_or_default();
        let status = inflater
            .decompress_vec(input, &mut out, FlushDecompress::None)
            .map_err(|e| decompression_error(io::ErrorKind::InvalidData, e.to_string()))?;

        if out.len() as u64 > limit {
            return Err(Error::DataTooLarge {
                size: out.len() as u64,
                max: limit,
            });
        }

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                // Output always has room, so no progress means the input ran out
                if inflater.total_in() as usize == in_before && out.len() == out_before {
                    return Err(decompression_error(
                        io::ErrorKind::UnexpectedEof,
                        "zlib stream ended before its final block".into(),
                    ));
                }
            }
        }
    }

    let consumed = inflater.total_in() as usize;
    if consumed < compressed.len() {
        return Err(decompression_error(
            io::ErrorKind::InvalidData,
            format!(
                "{} bytes after the end of the zlib stream",
                compressed.len() - consumed
            ),
        ));
    }

    tracing::trace!(compressed = consumed, decompressed = out.len(), "Inflated zlib stream");
    Ok(out)
}

impl TryFrom<u8> for CompressionMethod {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(CompressionMethod::Deflate),
            other => Err(Error::UnsupportedCompression(other)),
        }
    }
}

impl From<CompressionMethod> for u8 {
    fn from(method: CompressionMethod) -> Self {
        method.as_byte()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_byte() {
        assert_eq!(CompressionMethod::Deflate.as_byte(), 0x01);
        assert_eq!(CompressionMethod::default(), CompressionMethod::Deflate);
        assert_eq!(
            CompressionMethod::try_from(0x01).unwrap(),
            CompressionMethod::Deflate
        );
    }

    #[test]
    fn test_reserved_bytes_rejected() {
        for byte in [0x00u8, 0x02, 0x7F, 0xFF] {
            match CompressionMethod::try_from(byte) {
                Err(Error::UnsupportedCompression(b)) => assert_eq!(b, byte),
                other => panic!("Expected UnsupportedCompression, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_zlib_stream_header() {
        let compressed = CompressionMethod::Deflate
            .compress(b"{\"title\":\"x\"}", DEFAULT_COMPRESSION_LEVEL)
            .unwrap();
        // zlib CMF byte: deflate with 32K window
        assert_eq!(compressed[0], 0x78);
        assert_eq!((u16::from(compressed[0]) << 8 | u16::from(compressed[1])) % 31, 0);
    }

    #[test]
    fn test_decompress_rejects_garbage() {
        let result = CompressionMethod::Deflate.decompress(b"definitely not zlib");
        assert!(matches!(result, Err(Error::Decompression(_))));
    }

    #[test]
    fn test_decompress_rejects_truncated_stream() {
        let payload: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 251) as u8).collect();
        let compressed = CompressionMethod::Deflate.compress(&payload, 9).unwrap();
        let result = CompressionMethod::Deflate.decompress(&compressed[..compressed.len() / 2]);
        assert!(matches!(result, Err(Error::Decompression(_))));
    }

    #[test]
    fn test_decompress_large_output() {
        // Expands far past the first output allocation
        let payload: Vec<u8> = b"{\"notes\": \""
            .iter()
            .copied()
            .chain(std::iter::repeat(b' ').take(2_000_000))
            .chain(b"\"}".iter().copied())
            .collect();
        let compressed = CompressionMethod::Deflate.compress(&payload, 9).unwrap();
        assert!(compressed.len() < 10_000);

        let decompressed = CompressionMethod::Deflate.decompress(&compressed).unwrap();
        assert_eq!(decompressed, payload);
    }

    #[test]
    fn test_decompress_limit() {
        let payload = vec![b'a'; 100_000];
        let compressed = CompressionMethod::Deflate.compress(&payload, 6).unwrap();

        let exact = CompressionMethod::Deflate
            .decompress_with_limit(&compressed, 100_000)
            .unwrap();
        assert_eq!(exact.len(), 100_000);

        match CompressionMethod::Deflate.decompress_with_limit(&compressed, 99_999) {
            Err(Error::DataTooLarge { size, max }) => {
                assert_eq!(max, 99_999);
                assert!(size > max);
            }
            other => panic!("Expected DataTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_decompress_rejects_trailing_bytes() {
        let mut compressed = CompressionMethod::Deflate.compress(b"{}", 6).unwrap();
        compressed.extend_from_slice(b"GARBAGE GARBAGE!");

        match CompressionMethod::Deflate.decompress(&compressed) {
            Err(Error::Decompression(e)) => assert!(e.to_string().contains("after the end")),
            other => panic!("Expected Decompression, got {:?}", other),
        }
    }

    #[test]
    fn test_level_zero_still_decodes() {
        let payload = b"stored block payload";
        let compressed = CompressionMethod::Deflate.compress(payload, 0).unwrap();
        assert_eq!(
            CompressionMethod::Deflate.decompress(&compressed).unwrap(),
            payload
        );
    }
}
