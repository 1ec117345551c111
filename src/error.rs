//! Error types for aiip-io

use crate::chunk::ChunkType;
use std::io;

/// Result type for aiip-io operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing AIIP data
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The buffer does not start with the 8-byte PNG signature
    #[error("Malformed PNG signature")]
    MalformedSignature,

    /// A chunk header claims more bytes than remain in the stream
    #[error("Truncated stream at offset {offset}: chunk needs {needed} bytes, {available} available")]
    TruncatedStream {
        offset: u64,
        needed: u64,
        available: u64,
    },

    /// No `aiip` chunk present (an ordinary PNG, not a format violation)
    #[error("aiip chunk not found")]
    ChunkNotFound,

    /// Compression method byte not defined by this version of the format
    #[error("Unsupported compression method: 0x{0:02x}")]
    UnsupportedCompression(u8),

    /// The compressed payload is not a valid zlib/DEFLATE stream
    #[error("Decompression failed: {0}")]
    Decompression(#[source] io::Error),

    /// The decompressed payload is not a UTF-8 JSON object
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Stored CRC does not match the CRC computed over type and data
    #[error("CRC mismatch in {chunk_type} chunk at offset {offset}: stored 0x{stored:08x}, computed 0x{computed:08x}")]
    ChecksumMismatch {
        chunk_type: ChunkType,
        offset: u64,
        stored: u32,
        computed: u32,
    },

    /// A chunk's data does not have the layout its type requires
    #[error("Malformed {chunk_type} chunk: {reason}")]
    MalformedChunk {
        chunk_type: ChunkType,
        reason: String,
    },

    /// The chunk sequence cannot accept an aiip chunk at the required position
    #[error("Invalid chunk order: {0}")]
    InvalidChunkOrder(String),

    /// Pixel buffer does not describe a valid image, or the PNG encoder failed
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Data size exceeds maximum allowed
    #[error("Data too large: {size} bytes (max: {max})")]
    DataTooLarge { size: u64, max: u64 },
}

impl Error {
    /// True for the "no aiip chunk" outcome, which is not a format violation
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ChunkNotFound)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedPayload(err.to_string())
    }
}

#[cfg(feature = "encoder")]
impl From<png::EncodingError> for Error {
    fn from(err: png::EncodingError) -> Self {
        match err {
            png::EncodingError::IoError(e) => Error::Io(e),
            other => Error::InvalidImage(other.to_string()),
        }
    }
}
