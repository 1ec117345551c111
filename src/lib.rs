//! Read and write AIIP (Annotated Interactive Image Protocol) metadata in PNG files.
//!
//! An AIIP file is an ordinary PNG whose pixels show the annotations and
//! which also carries the structured annotation document in a private
//! ancillary chunk of type `aiip`:
//!
//! ```text
//! length (u32 BE) | "aiip" | method (0x01) | zlib(UTF-8 JSON) | CRC-32 (u32 BE)
//! ```
//!
//! Any PNG viewer shows the image and skips the chunk; this crate finds the
//! chunk and returns the document as a JSON object.
//!
//! # Design Principles
//!
//! - **In memory**: Files are read fully; every operation is a pure
//!   transformation over a byte buffer
//! - **Order tolerant reads**: The aiip chunk is found wherever it sits, and
//!   stored CRCs are not required to match
//! - **Strict writes**: The chunk always goes directly after `IHDR`, ahead of
//!   the pixel data
//!
//! # Quick Start
//!
//! ```
//! use aiip_io::{read_metadata, write_aiip, ColorType, Metadata, RenderedImage};
//! use serde_json::json;
//!
//! # fn main() -> aiip_io::Result<()> {
//! let image = RenderedImage::filled(200, 100, ColorType::Rgb, &[255, 255, 255])?;
//! let metadata = Metadata::from_value(json!({
//!     "meta": {"title": "Floor Plan"},
//!     "regions": [{"name": "Lobby", "bounds": [0, 0, 100, 50]}]
//! }))?;
//!
//! let png = write_aiip(&image, &metadata)?;
//!
//! let decoded = read_metadata(&png)?.expect("aiip chunk present");
//! assert_eq!(decoded.title(), Some("Floor Plan"));
//! # Ok(())
//! # }
//! ```
//!
//! # Editing Existing Files
//!
//! ```no_run
//! use aiip_io::{AiipFile, Metadata, MetadataUpdate, WriteOptions};
//!
//! # fn main() -> aiip_io::Result<()> {
//! let file = AiipFile::open("photo.png")?;
//! let update = MetadataUpdate::Set(Metadata::new().with_title("Annotated"));
//! file.write_to("photo.aiip", &update, &WriteOptions::new().compression_level(9))?;
//! # Ok(())
//! # }
//! ```

mod asset;
mod chunk;
mod chunk_iter;
mod compression;
mod error;
mod header;
#[cfg(feature = "encoder")]
mod image;
mod metadata;
mod png_io;
mod structure;

pub use asset::AiipFile;
pub use chunk::{crc32, write_chunk, Chunk, ChunkType, CHUNK_OVERHEAD, MAX_CHUNK_LENGTH};
pub use chunk_iter::{detect, ChunkIter, PngStream, PNG_SIGNATURE};
pub use compression::{CompressionMethod, DEFAULT_COMPRESSION_LEVEL, MAX_PAYLOAD_SIZE};
pub use error::{Error, Result};
pub use header::ImageHeader;
#[cfg(feature = "encoder")]
pub use image::{write_aiip, write_aiip_with, ColorType, RenderedImage};
pub use metadata::{decode_payload, encode_payload, Canvas, Metadata, WriteOptions};
pub use png_io::{apply_update, embed_metadata, read_metadata, strip_metadata};
pub use structure::{ByteRange, ChunkInfo, Structure};

// Test utilities - only compiled for tests or when explicitly enabled
#[cfg(all(feature = "encoder", any(test, feature = "test-utils")))]
pub mod test_utils;

/// Metadata update strategy
///
/// Specifies what happens to the aiip chunk when a file is rewritten.
/// By default the existing chunk is kept unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MetadataUpdate {
    /// Keep existing metadata (default)
    #[default]
    Keep,
    /// Remove existing metadata
    Remove,
    /// Replace or add metadata
    Set(Metadata),
}

/// Read the metadata document from a file on disk
///
/// The file is read fully into memory and closed before parsing. Returns
/// `Ok(None)` for a PNG without an aiip chunk.
///
/// # Example
///
/// ```no_run
/// # fn main() -> aiip_io::Result<()> {
/// match aiip_io::read_metadata_from_path("sample.aiip")? {
///     Some(metadata) => println!("{}", metadata.title().unwrap_or("untitled")),
///     None => println!("plain PNG"),
/// }
/// # Ok(())
/// # }
/// ```
pub fn read_metadata_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Option<Metadata>> {
    let bytes = std::fs::read(path.as_ref())?;
    read_metadata(&bytes)
}
