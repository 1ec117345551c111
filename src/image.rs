//! Encoding rendered pixels into a PNG with embedded metadata

use crate::{
    error::{Error, Result},
    metadata::{encode_payload, Metadata, WriteOptions},
};

/// Pixel layout of a [`RenderedImage`] (8 bits per sample)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorType {
    Grayscale,
    GrayscaleAlpha,
    Rgb,
    Rgba,
}

impl ColorType {
    /// Bytes per pixel
    pub fn channels(self) -> usize {
        match self {
            ColorType::Grayscale => 1,
            ColorType::GrayscaleAlpha => 2,
            ColorType::Rgb => 3,
            ColorType::Rgba => 4,
        }
    }

    fn to_png(self) -> png::ColorType {
        match self {
            ColorType::Grayscale => png::ColorType::Grayscale,
            ColorType::GrayscaleAlpha => png::ColorType::GrayscaleAlpha,
            ColorType::Rgb => png::ColorType::Rgb,
            ColorType::Rgba => png::ColorType::Rgba,
        }
    }
}

/// A rendered image: dimensions plus a row-major 8-bit pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    pub color: ColorType,
    pub pixels: Vec<u8>,
}

impl RenderedImage {
    /// Wrap a pixel buffer, checking its length against the dimensions
    pub fn new(width: u32, height: u32, color: ColorType, pixels: Vec<u8>) -> Result<Self> {
        let image = Self {
            width,
            height,
            color,
            pixels,
        };
        image.validate()?;
        Ok(image)
    }

    /// An image filled with one pixel value
    ///
    /// `pixel` must have one byte per channel.
    pub fn filled(width: u32, height: u32, color: ColorType, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != color.channels() {
            return Err(Error::InvalidImage(format!(
                "{:?} pixel needs {} bytes, got {}",
                color,
                color.channels(),
                pixel.len()
            )));
        }
        let count = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::InvalidImage("image dimensions overflow".into()))?;
        Self::new(width, height, color, pixel.repeat(count))
    }

    /// Expected pixel buffer length
    pub fn expected_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.color.channels())
    }

    /// Check that the image can be encoded
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidImage(format!(
                "dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        let expected = self
            .expected_len()
            .ok_or_else(|| Error::InvalidImage("image dimensions overflow".into()))?;
        if self.pixels.len() != expected {
            return Err(Error::InvalidImage(format!(
                "pixel buffer is {} bytes, {}x{} {:?} needs {}",
                self.pixels.len(),
                self.width,
                self.height,
                self.color,
                expected
            )));
        }
        Ok(())
    }
}

/// Encode an image as PNG with the metadata chunk embedded
///
/// Uses the default [`WriteOptions`].
///
/// # Example
///
/// ```
/// use aiip_io::{read_metadata, write_aiip, ColorType, Metadata, RenderedImage};
///
/// # fn main() -> aiip_io::Result<()> {
/// let image = RenderedImage::filled(4, 4, ColorType::Rgb, &[0x1a, 0x3a, 0x5c])?;
/// let metadata = Metadata::new().with_title("Floor Plan");
///
/// let png = write_aiip(&image, &metadata)?;
/// let decoded = read_metadata(&png)?.expect("aiip chunk present");
/// assert_eq!(decoded.title(), Some("Floor Plan"));
/// # Ok(())
/// # }
/// ```
pub fn write_aiip(image: &RenderedImage, metadata: &Metadata) -> Result<Vec<u8>> {
    write_aiip_with(image, metadata, &WriteOptions::default())
}

/// Encode an image as PNG with the metadata chunk embedded, using explicit options
///
/// The aiip chunk is written immediately after `IHDR`, ahead of all pixel data.
pub fn write_aiip_with(
    image: &RenderedImage,
    metadata: &Metadata,
    options: &WriteOptions,
) -> Result<Vec<u8>> {
    image.validate()?;
    let payload = encode_payload(metadata, options)?;

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width, image.height);
        encoder.set_color(image.color.to_png());
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_chunk(png::chunk::ChunkType(*b"aiip"), &payload)?;
        writer.write_image_data(&image.pixels)?;
        writer.finish()?;
    }

    tracing::debug!(
        width = image.width,
        height = image.height,
        png_len = out.len(),
        aiip_len = payload.len(),
        "Encoded aiip image"
    );
    Ok(out)
}
