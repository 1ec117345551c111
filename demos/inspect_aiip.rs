//! Example: Inspect the chunk layout and metadata of an AIIP file
//!
//! Works on any PNG; files without an `aiip` chunk are reported as plain.
//!
//! Run: `cargo run --example inspect_aiip -- <file>`

use aiip_io::{AiipFile, ChunkType};
use std::env;

fn main() -> aiip_io::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <png_file>", args[0]);
        std::process::exit(1);
    }

    let filename = &args[1];
    println!("Parsing: {}", filename);

    let file = AiipFile::open(filename)?;
    let structure = file.structure();

    println!("\nFile structure:");
    println!("  Total size: {} bytes", structure.total_size);
    println!("  Chunks: {}", structure.chunks.len());
    if let Ok(header) = file.header() {
        println!(
            "  Image: {}x{}, bit depth {}, color type {}{}",
            header.width,
            header.height,
            header.bit_depth,
            header.color_type,
            if header.is_interlaced() { ", interlaced" } else { "" }
        );
    }

    println!("\nChunk breakdown:");
    for chunk in file.chunks() {
        let chunk = chunk?;
        let crc = if chunk.verify_crc().is_ok() { "ok" } else { "BAD" };
        let marker = if chunk.chunk_type == ChunkType::AIIP { " <- metadata" } else { "" };
        println!(
            "  {:>8}  {}  {:>8} bytes  crc {}{}",
            chunk.offset,
            chunk.chunk_type,
            chunk.length(),
            crc,
            marker
        );
    }

    if structure.aiip_indices().len() > 1 {
        println!(
            "\n! {} aiip chunks present, the first one is used",
            structure.aiip_indices().len()
        );
    }
    if file.has_metadata() && !structure.aiip_precedes_image_data() {
        println!("\n! aiip chunk follows IDAT");
    }

    match file.metadata()? {
        Some(metadata) => {
            println!("\n✓ Found AIIP metadata ({} top-level keys)", metadata.len());
            if let Some(title) = metadata.title() {
                println!("  Title: {}", title);
            }
            if let Some(version) = metadata.version() {
                println!("  Version: {}", version);
            }
            println!("\n{}", serde_json::to_string_pretty(&metadata)?);
        }
        None => println!("\n✗ No AIIP metadata found (plain PNG)"),
    }

    Ok(())
}
