//! Example: Render an annotated map and save it as an AIIP file
//!
//! Draws each region's bounds as an outlined box colored by its tariff level,
//! adds a level legend, then stores the full document in the `aiip` chunk.
//!
//! Run: `RUST_LOG=aiip_io=debug cargo run --example create_aiip -- [output.aiip]`

use aiip_io::{write_aiip_with, ColorType, Metadata, RenderedImage, WriteOptions};
use serde_json::{json, Value};
use std::env;
use tracing_subscriber::EnvFilter;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const TITLE: &str = "US Trade Tariffs 2025";

const BACKGROUND: [u8; 3] = [0x1a, 0x3a, 0x5c];

/// Outline colors by tariff level
fn level_color(level: &str) -> [u8; 3] {
    match level {
        "low" => [0x2e, 0xcc, 0x71],
        "medium" => [0xf1, 0xc4, 0x0f],
        "high" => [0xe7, 0x4c, 0x3c],
        _ => [0x88, 0x88, 0x88],
    }
}

/// Region interior: 30% level color over the background's red channel
fn fill_color(color: [u8; 3]) -> [u8; 3] {
    color.map(|c| (f32::from(c) * 0.3 + f32::from(BACKGROUND[0]) * 0.7) as u8)
}

fn document() -> aiip_io::Result<Metadata> {
    Metadata::from_value(json!({
        "version": "3.0",
        "canvas": {"width": WIDTH, "height": HEIGHT},
        "meta": {
            "title": TITLE,
            "author": "aezi zhu",
            "created": "2025-01-01"
        },
        "data": {
            "title": TITLE,
            "regions": [
                {
                    "name": "North America",
                    "tariff": "25%",
                    "level": "medium",
                    "countries": [
                        {"name": "Canada", "rate": "25%"},
                        {"name": "Mexico", "rate": "25%"}
                    ],
                    "bounds": [50, 100, 250, 250]
                },
                {
                    "name": "South America",
                    "tariff": "35%",
                    "level": "high",
                    "countries": [
                        {"name": "Brazil", "rate": "50%"},
                        {"name": "Argentina", "rate": "15%"}
                    ],
                    "bounds": [150, 280, 300, 450]
                },
                {
                    "name": "Europe",
                    "tariff": "15%",
                    "level": "low",
                    "countries": [
                        {"name": "UK", "rate": "10%"},
                        {"name": "EU", "rate": "20%"},
                        {"name": "Switzerland", "rate": "39%"}
                    ],
                    "bounds": [350, 80, 500, 220]
                },
                {
                    "name": "Asia",
                    "tariff": "30%",
                    "level": "high",
                    "countries": [
                        {"name": "China", "rate": "30%"},
                        {"name": "Japan", "rate": "15%"},
                        {"name": "India", "rate": "50%"}
                    ],
                    "bounds": [520, 100, 750, 280]
                }
            ]
        }
    }))
}

/// Fill the inclusive rectangle `[x0, y0, x1, y1]`, clipped to the image
fn fill_rect(image: &mut RenderedImage, bounds: [u32; 4], color: [u8; 3]) {
    let [x0, y0, x1, y1] = bounds;
    let (x1, y1) = (x1.min(image.width - 1), y1.min(image.height - 1));
    let stride = image.width as usize * 3;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let i = y as usize * stride + x as usize * 3;
            image.pixels[i..i + 3].copy_from_slice(&color);
        }
    }
}

/// A region box: 2px outline in the level color around a blended interior
fn draw_region(image: &mut RenderedImage, bounds: [u32; 4], color: [u8; 3]) {
    let [x0, y0, x1, y1] = bounds;
    fill_rect(image, bounds, color);
    if x1 >= x0 + 4 && y1 >= y0 + 4 {
        fill_rect(image, [x0 + 2, y0 + 2, x1 - 2, y1 - 2], fill_color(color));
    }
}

fn draw_legend(image: &mut RenderedImage) {
    let y = HEIGHT - 50;
    for (i, level) in ["low", "medium", "high"].into_iter().enumerate() {
        let x = 100 + 150 * i as u32;
        fill_rect(image, [x, y, x + 15, y + 15], level_color(level));
    }
}

fn bounds_of(region: &Value) -> Option<[u32; 4]> {
    let b = region.get("bounds")?.as_array()?;
    let mut out = [0u32; 4];
    for (slot, v) in out.iter_mut().zip(b.iter()) {
        *slot = u32::try_from(v.as_u64()?).ok()?;
    }
    (b.len() == 4 && out[0] <= out[2] && out[1] <= out[3]).then_some(out)
}

fn main() -> aiip_io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let output = env::args().nth(1).unwrap_or_else(|| "sample.aiip".to_string());

    let metadata = document()?;
    let canvas = metadata.canvas().unwrap_or(aiip_io::Canvas {
        width: WIDTH,
        height: HEIGHT,
    });

    let mut image = RenderedImage::filled(canvas.width, canvas.height, ColorType::Rgb, &BACKGROUND)?;

    let regions = metadata
        .pointer("/data/regions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for region in &regions {
        let level = region.get("level").and_then(Value::as_str).unwrap_or("");
        match bounds_of(region) {
            Some(bounds) => draw_region(&mut image, bounds, level_color(level)),
            None => eprintln!("Skipping region without usable bounds: {}", region),
        }
    }
    draw_legend(&mut image);

    let png = write_aiip_with(&image, &metadata, &WriteOptions::new().compression_level(9))?;
    std::fs::write(&output, &png)?;

    println!(
        "Wrote {} ({}x{}, {} regions, {} bytes)",
        output,
        canvas.width,
        canvas.height,
        regions.len(),
        png.len()
    );
    Ok(())
}
