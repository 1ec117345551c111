//! Reading and rewriting the aiip chunk of an existing PNG stream

use crate::{
    chunk::{write_chunk, ChunkType, CHUNK_OVERHEAD},
    chunk_iter::{PngStream, PNG_SIGNATURE},
    error::{Error, Result},
    metadata::{decode_payload, encode_payload, Metadata, WriteOptions},
    structure::Structure,
    MetadataUpdate,
};

/// Read the metadata document embedded in a PNG buffer
///
/// Returns `Ok(None)` for an ordinary PNG without an aiip chunk. When several
/// aiip chunks are present the first one wins; chunk order relative to `IDAT`
/// is not checked and stored CRCs are ignored.
pub fn read_metadata(bytes: &[u8]) -> Result<Option<Metadata>> {
    let stream = PngStream::new(bytes)?;
    match stream.find(ChunkType::AIIP)? {
        Some(chunk) => decode_payload(chunk.data).map(Some),
        None => {
            tracing::debug!("No aiip chunk in stream");
            Ok(None)
        }
    }
}

/// Embed a metadata document, replacing any existing aiip chunk
///
/// The new chunk is written directly after `IHDR`. The input must begin with
/// `IHDR`, contain image data, and end with `IEND`.
pub fn embed_metadata(png: &[u8], metadata: &Metadata, options: &WriteOptions) -> Result<Vec<u8>> {
    let data = encode_payload(metadata, options)?;
    let structure = Structure::parse(png)?;
    check_insertion_point(&structure)?;
    rewrite(png, &structure, Some(&data))
}

/// Remove every aiip chunk, leaving all other chunks byte-identical
pub fn strip_metadata(png: &[u8]) -> Result<Vec<u8>> {
    let structure = Structure::parse(png)?;
    rewrite(png, &structure, None)
}

/// Apply a [`MetadataUpdate`] to a PNG buffer
pub fn apply_update(png: &[u8], update: &MetadataUpdate, options: &WriteOptions) -> Result<Vec<u8>> {
    match update {
        MetadataUpdate::Keep => {
            let structure = Structure::parse(png)?;
            Ok(png[..structure.total_size as usize].to_vec())
        }
        MetadataUpdate::Remove => strip_metadata(png),
        MetadataUpdate::Set(metadata) => embed_metadata(png, metadata, options),
    }
}

/// Validate that an aiip chunk can go after `IHDR` and before the first `IDAT`
fn check_insertion_point(structure: &Structure) -> Result<()> {
    match structure.chunks.first() {
        Some(first) if first.chunk_type == ChunkType::IHDR => {}
        Some(first) => {
            return Err(Error::InvalidChunkOrder(format!(
                "first chunk is {}, expected IHDR",
                first.chunk_type
            )))
        }
        None => return Err(Error::InvalidChunkOrder("stream has no chunks".into())),
    }

    if structure.position(ChunkType::IDAT).is_none() {
        return Err(Error::InvalidChunkOrder("stream has no IDAT chunk".into()));
    }

    if !structure.has_iend() {
        return Err(Error::InvalidChunkOrder(
            "stream does not end with IEND".into(),
        ));
    }

    Ok(())
}

/// Copy the stream chunk by chunk, dropping old aiip chunks and writing the
/// new one (if any) after the first chunk
fn rewrite(png: &[u8], structure: &Structure, aiip_data: Option<&[u8]>) -> Result<Vec<u8>> {
    let extra = aiip_data.map_or(0, |d| d.len() as u64 + CHUNK_OVERHEAD);
    let mut out = Vec::with_capacity((structure.total_size + extra) as usize);
    out.extend_from_slice(&PNG_SIGNATURE);

    let mut removed = 0usize;
    for (index, info) in structure.chunks.iter().enumerate() {
        if info.chunk_type == ChunkType::AIIP {
            removed += 1;
            continue;
        }

        let raw = info.range.slice(png).ok_or(Error::TruncatedStream {
            offset: info.range.offset,
            needed: info.range.size,
            available: (png.len() as u64).saturating_sub(info.range.offset),
        })?;
        out.extend_from_slice(raw);

        if index == 0 {
            if let Some(data) = aiip_data {
                write_chunk(&mut out, ChunkType::AIIP, data)?;
                tracing::debug!(
                    offset = raw.len() + PNG_SIGNATURE.len(),
                    length = data.len(),
                    "Inserted aiip chunk after IHDR"
                );
            }
        }
    }

    if removed > 0 {
        tracing::debug!(removed, "Dropped existing aiip chunks");
    }
    Ok(out)
}
