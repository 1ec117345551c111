//! Test utilities for building fixture images and documents.
//!
//! Fixtures are generated in memory rather than committed as binary files:
//! - Plain PNGs of any size (no aiip chunk)
//! - AIIP files carrying the sample documents below
//! - Sample documents matching the reference writer's layout
//!
//! # Usage
//!
//! ```
//! use aiip_io::test_utils::*;
//!
//! # fn example() -> aiip_io::Result<()> {
//! let png = plain_png(200, 100)?;
//! let aiip = floor_plan_aiip()?;
//! let tmp = temp_path("example.aiip");
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use serde_json::json;

use crate::{write_aiip, ColorType, Metadata, RenderedImage, Result};

/// Background color of generated fixtures (`#1a3a5c`)
pub const BACKGROUND: [u8; 3] = [0x1a, 0x3a, 0x5c];

/// Title used by [`floor_plan_metadata`]
pub const FLOOR_PLAN_TITLE: &str = "Floor Plan";

/// Title used by [`tariff_metadata`]
pub const TARIFF_TITLE: &str = "US Trade Tariffs 2025";

/// A solid RGB image of the given size
pub fn solid_image(width: u32, height: u32) -> Result<RenderedImage> {
    RenderedImage::filled(width, height, ColorType::Rgb, &BACKGROUND)
}

/// Encode a plain PNG (no aiip chunk)
pub fn plain_png(width: u32, height: u32) -> Result<Vec<u8>> {
    let image = solid_image(width, height)?;
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&image.pixels)?;
        writer.finish()?;
    }
    Ok(out)
}

/// The floor-plan document: one region named "Lobby"
pub fn floor_plan_metadata() -> Result<Metadata> {
    Metadata::from_value(json!({
        "meta": {"title": FLOOR_PLAN_TITLE},
        "regions": [{"name": "Lobby", "bounds": [0, 0, 100, 50]}]
    }))
}

/// A full reference document: version, canvas, meta and nested data
pub fn tariff_metadata() -> Metadata {
    Metadata::new()
        .with_version("3.0")
        .with_canvas(800, 600)
        .with(
            "meta",
            json!({"title": TARIFF_TITLE, "author": "aezi zhu", "created": "2025-01-01"}),
        )
        .with(
            "data",
            json!({
                "title": TARIFF_TITLE,
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
            }),
        )
}

/// A 200x100 AIIP file carrying [`floor_plan_metadata`]
pub fn floor_plan_aiip() -> Result<Vec<u8>> {
    write_aiip(&solid_image(200, 100)?, &floor_plan_metadata()?)
}

/// A unique path under the system temp directory
///
/// The process id is included so parallel test binaries don't collide.
pub fn temp_path(file_name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("aiip-io-{}-{}", std::process::id(), file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{read_metadata, PNG_SIGNATURE};

    #[test]
    fn test_plain_png_has_no_metadata() {
        let png = plain_png(3, 2).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);
        assert!(read_metadata(&png).unwrap().is_none());
    }

    #[test]
    fn test_floor_plan_fixture() {
        let doc = read_metadata(&floor_plan_aiip().unwrap()).unwrap().unwrap();
        assert_eq!(doc, floor_plan_metadata().unwrap());
        assert_eq!(doc.title(), Some(FLOOR_PLAN_TITLE));
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_tariff_fixture() {
        let doc = tariff_metadata();
        assert_eq!(doc.title(), Some(TARIFF_TITLE));
        assert_eq!(doc.version(), Some("3.0"));
        assert_eq!(doc.canvas().map(|c| (c.width, c.height)), Some((800, 600)));

        let names: Vec<_> = doc
            .pointer("/data/regions")
            .and_then(|v| v.as_array())
            .unwrap()
            .iter()
            .filter_map(|r| r["name"].as_str())
            .collect();
        assert_eq!(names, ["North America", "South America", "Europe", "Asia"]);
    }

    #[test]
    fn test_temp_path() {
        let path = temp_path("x.aiip");
        assert!(path.to_string_lossy().ends_with("x.aiip"));
        assert!(path.starts_with(std::env::temp_dir()));
    }
}
