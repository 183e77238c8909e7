//! Device-native pixel packing.
//!
//! Two targets exist: gray4 (two 4-bit luminance samples per byte, left pixel in
//! the high nibble) and RGB565 (one big-endian 16-bit word per pixel). Both keep
//! the source's row-major order and simply drop the low bits of each channel.

use crate::{
    error::{Error, Result},
    raster::{Image, Pixels},
};
use rkyv::{Archive, Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Archive, Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub enum AssetFormat {
    Gray4,
    Rgb565,
    /// Opaque output of an external container codec
    Container,
}

impl fmt::Display for AssetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gray4 => "gray4",
            Self::Rgb565 => "rgb565",
            Self::Container => "container",
        })
    }
}

/// Which packing to produce for a source image
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Target {
    /// Luminance packs to gray4, color packs to RGB565
    #[default]
    Auto,
    Gray4,
    Rgb565,
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "gray4" => Ok(Self::Gray4),
            "rgb565" => Ok(Self::Rgb565),
            other => Err(format!(
                "unknown target {other:?}, expected auto, gray4 or rgb565"
            )),
        }
    }
}

#[derive(Archive, Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct PackedAsset {
    format: AssetFormat,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PackedAsset {
    /// Wraps bytes produced by a container codec
    pub fn from_container(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            format: AssetFormat::Container,
            width,
            height,
            data,
        }
    }

    /// Wraps already packed gray4 bytes, such as a glyph read back from a table
    pub fn from_gray4(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            format: AssetFormat::Gray4,
            width,
            height,
            data,
        }
    }

    pub fn format(&self) -> AssetFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Unpacks back into an image, replicating the kept high bits into the
    /// dropped low bits.
    pub fn decode(&self) -> Result<Image> {
        let pixel_count = self.width as usize * self.height as usize;
        let mismatch = || Error::DimensionMismatch {
            width: self.width,
            height: self.height,
            pixels: pixel_count,
        };

        match self.format {
            AssetFormat::Gray4 => {
                if self.data.len() * 2 != pixel_count {
                    return Err(mismatch());
                }
                let samples = self
                    .data
                    .iter()
                    .flat_map(|&byte| [(byte >> 4) * 17, (byte & 0x0F) * 17])
                    .collect();
                Image::luminance(self.width, self.height, samples)
            }
            AssetFormat::Rgb565 => {
                if self.data.len() != pixel_count * 2 {
                    return Err(mismatch());
                }
                let samples = self
                    .data
                    .chunks_exact(2)
                    .map(|word| rgb888(u16::from_be_bytes([word[0], word[1]])))
                    .collect();
                Image::rgb(self.width, self.height, samples)
            }
            AssetFormat::Container => Err(Error::UnsupportedMode(
                "container payloads need their codec to decode".into(),
            )),
        }
    }
}

/// Packs one color into an RGB565 word by truncation
#[inline]
pub fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | ((b as u16 & 0xF8) >> 3)
}

/// Expands an RGB565 word to 8 bits per channel
#[inline]
pub fn rgb888(value: u16) -> [u8; 3] {
    let r = (value >> 11) as u8 & 0x1F;
    let g = (value >> 5) as u8 & 0x3F;
    let b = value as u8 & 0x1F;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

pub fn pack_gray4(samples: &[u8]) -> Result<Vec<u8>> {
    if samples.len() % 2 != 0 {
        return Err(Error::OddPixelCount(samples.len()));
    }

    Ok(samples
        .chunks_exact(2)
        .map(|pair| (pair[0] & 0xF0) | ((pair[1] & 0xF0) >> 4))
        .collect())
}

pub fn pack_rgb565(samples: &[[u8; 3]]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &[r, g, b] in samples {
        data.extend_from_slice(&rgb565(r, g, b).to_be_bytes());
    }
    data
}

/// Packs an opaque image in the format implied by its mode.
pub fn encode(image: &Image) -> Result<PackedAsset> {
    let (format, data) = match image.pixels() {
        Pixels::Luminance(samples) => (AssetFormat::Gray4, pack_gray4(samples)?),
        Pixels::Rgb(samples) => (AssetFormat::Rgb565, pack_rgb565(samples)),
        Pixels::Rgba(_) => {
            return Err(Error::UnsupportedMode(
                "RGBA must be flattened before packing".into(),
            ));
        }
    };

    Ok(PackedAsset {
        format,
        width: image.width(),
        height: image.height(),
        data,
    })
}

/// Like [`encode`], but converts the image's mode to match `target` first.
pub fn encode_as(image: &Image, target: Target) -> Result<PackedAsset> {
    match (target, image.pixels()) {
        (_, Pixels::Rgba(_)) | (Target::Auto, _) => encode(image),
        (Target::Gray4, Pixels::Luminance(_)) | (Target::Rgb565, Pixels::Rgb(_)) => {
            encode(image)
        }
        (Target::Gray4, Pixels::Rgb(_)) => encode(&image.to_luminance()),
        (Target::Rgb565, Pixels::Luminance(_)) => encode(&image.to_rgb()),
    }
}
