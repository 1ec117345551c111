//! In-memory AIIP file handle
//!
//! This module provides a read-modify-write API over a PNG file loaded fully
//! into memory.

use crate::{
    chunk::ChunkType,
    chunk_iter::{ChunkIter, PngStream},
    error::{Error, Result},
    header::ImageHeader,
    metadata::{decode_payload, Metadata, WriteOptions},
    png_io::apply_update,
    structure::Structure,
    MetadataUpdate,
};
use std::fs;
use std::path::Path;

/// A PNG (or `.aiip`) file whose chunk layout has been parsed
///
/// # Example
///
/// ```no_run
/// use aiip_io::{AiipFile, Metadata, MetadataUpdate, WriteOptions};
///
/// # fn main() -> aiip_io::Result<()> {
/// let file = AiipFile::open("sample.aiip")?;
///
/// if let Some(metadata) = file.metadata()? {
///     println!("Title: {:?}", metadata.title());
/// }
///
/// let update = MetadataUpdate::Set(Metadata::new().with_title("Renamed"));
/// file.write_to("renamed.aiip", &update, &WriteOptions::default())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AiipFile {
    bytes: Vec<u8>,
    structure: Structure,
}

impl AiipFile {
    /// Read a file fully into memory and parse its chunk layout
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "Opened file");
        Self::from_bytes(bytes)
    }

    /// Parse the chunk layout of an in-memory buffer
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let structure = Structure::parse(&bytes)?;
        Ok(Self { bytes, structure })
    }

    /// The raw stream
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take back the raw stream
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The parsed chunk layout
    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    /// Iterate the chunks again, borrowing their data
    pub fn chunks(&self) -> ChunkIter<'_> {
        // The signature was checked when the structure was parsed
        PngStream::new_unchecked(&self.bytes).chunks()
    }

    /// Decoded `IHDR`
    pub fn header(&self) -> Result<ImageHeader> {
        match self.structure.chunks.first() {
            Some(first) if first.chunk_type == ChunkType::IHDR => {
                ImageHeader::from_data(self.structure.require_chunk_data(&self.bytes, 0)?)
            }
            _ => Err(Error::InvalidChunkOrder("first chunk is not IHDR".into())),
        }
    }

    /// True when the file carries an aiip chunk
    pub fn has_metadata(&self) -> bool {
        self.structure.aiip().is_some()
    }

    /// The embedded metadata document, or `None` for an ordinary PNG
    pub fn metadata(&self) -> Result<Option<Metadata>> {
        let Some(&index) = self.structure.aiip_indices().first() else {
            return Ok(None);
        };
        let data = self.structure.require_chunk_data(&self.bytes, index)?;
        decode_payload(data).map(Some)
    }

    /// The embedded metadata document, failing with [`Error::ChunkNotFound`] when absent
    pub fn require_metadata(&self) -> Result<Metadata> {
        self.metadata()?.ok_or(Error::ChunkNotFound)
    }

    /// Recompute and check every chunk CRC
    ///
    /// Reading metadata never depends on this check.
    pub fn verify_checksums(&self) -> Result<()> {
        self.structure.verify_checksums(&self.bytes)
    }

    /// Produce a new stream with the update applied
    pub fn to_bytes(&self, update: &MetadataUpdate, options: &WriteOptions) -> Result<Vec<u8>> {
        apply_update(&self.bytes, update, options)
    }

    /// Write a new file with the update applied
    ///
    /// The whole output is built in memory before the file is created, so a
    /// failed update never leaves a partial file behind.
    pub fn write_to<P: AsRef<Path>>(
        &self,
        path: P,
        update: &MetadataUpdate,
        options: &WriteOptions,
    ) -> Result<()> {
        let bytes = self.to_bytes(update, options)?;
        fs::write(path.as_ref(), &bytes)?;
        tracing::debug!(path = %path.as_ref().display(), size = bytes.len(), "Wrote file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chunk::write_chunk, chunk_iter::PNG_SIGNATURE, metadata::encode_payload};

    fn sample(with_metadata: bool) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&16u32.to_be_bytes());
        ihdr.extend_from_slice(&9u32.to_be_bytes());
        ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);
        write_chunk(&mut out, ChunkType::IHDR, &ihdr).unwrap();
        if with_metadata {
            let doc = Metadata::new().with_title("Sample");
            let data = encode_payload(&doc, &WriteOptions::default()).unwrap();
            write_chunk(&mut out, ChunkType::AIIP, &data).unwrap();
        }
        write_chunk(&mut out, ChunkType::IDAT, b"x").unwrap();
        write_chunk(&mut out, ChunkType::IEND, b"").unwrap();
        out
    }

    #[test]
    fn test_header_and_metadata() {
        let file = AiipFile::from_bytes(sample(true)).unwrap();
        let header = file.header().unwrap();
        assert_eq!((header.width, header.height), (16, 9));
        assert!(file.has_metadata());
        assert_eq!(file.require_metadata().unwrap().title(), Some("Sample"));
        assert!(file.verify_checksums().is_ok());
        assert_eq!(file.chunks().count(), 4);
    }

    #[test]
    fn test_no_metadata() {
        let file = AiipFile::from_bytes(sample(false)).unwrap();
        assert!(!file.has_metadata());
        assert!(file.metadata().unwrap().is_none());
        assert!(file.require_metadata().unwrap_err().is_not_found());
    }

    #[test]
    fn test_rejects_non_png() {
        assert!(matches!(
            AiipFile::from_bytes(b"plain text".to_vec()),
            Err(Error::MalformedSignature)
        ));
    }

    #[test]
    fn test_to_bytes_round_trip() {
        let file = AiipFile::from_bytes(sample(false)).unwrap();
        let update = MetadataUpdate::Set(Metadata::new().with_title("Added"));
        let bytes = file.to_bytes(&update, &WriteOptions::default()).unwrap();

        let reopened = AiipFile::from_bytes(bytes).unwrap();
        assert_eq!(reopened.require_metadata().unwrap().title(), Some("Added"));
        assert_eq!(reopened.structure().aiip_indices(), &[1]);
    }
}
