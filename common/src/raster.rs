//! In-memory raster model.
//!
//! An [`Image`] is a row-major grid whose color mode is fixed by the variant of
//! [`Pixels`] it carries. Every encoder path is selected by matching on that
//! variant.

use crate::error::{Error, Result};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelMode {
    Luminance,
    Rgb,
    Rgba,
}

impl fmt::Display for PixelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Luminance => "L",
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pixels {
    Luminance(Vec<u8>),
    Rgb(Vec<[u8; 3]>),
    Rgba(Vec<[u8; 4]>),
}

impl Pixels {
    pub fn len(&self) -> usize {
        match self {
            Self::Luminance(samples) => samples.len(),
            Self::Rgb(samples) => samples.len(),
            Self::Rgba(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mode(&self) -> PixelMode {
        match self {
            Self::Luminance(_) => PixelMode::Luminance,
            Self::Rgb(_) => PixelMode::Rgb,
            Self::Rgba(_) => PixelMode::Rgba,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Pixels,
}

impl Image {
    pub fn new(width: u32, height: u32, pixels: Pixels) -> Result<Self> {
        if width as usize * height as usize != pixels.len() {
            return Err(Error::DimensionMismatch {
                width,
                height,
                pixels: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn luminance(width: u32, height: u32, samples: Vec<u8>) -> Result<Self> {
        Self::new(width, height, Pixels::Luminance(samples))
    }

    pub fn rgb(width: u32, height: u32, samples: Vec<[u8; 3]>) -> Result<Self> {
        Self::new(width, height, Pixels::Rgb(samples))
    }

    pub fn rgba(width: u32, height: u32, samples: Vec<[u8; 4]>) -> Result<Self> {
        Self::new(width, height, Pixels::Rgba(samples))
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

    pub fn mode(&self) -> PixelMode {
        self.pixels.mode()
    }

    pub fn pixels(&self) -> &Pixels {
        &self.pixels
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn has_alpha(&self) -> bool {
        self.mode() == PixelMode::Rgba
    }

    /// Same dimensions, new samples. Callers keep the pixel count intact.
    pub(crate) fn with_pixels(&self, pixels: Pixels) -> Self {
        debug_assert_eq!(pixels.len(), self.pixels.len());
        Self {
            width: self.width,
            height: self.height,
            pixels,
        }
    }

    /// Converts to single-channel luminance with ITU-R 601-2 weights.
    ///
    /// Alpha is ignored; flatten with [`composite`](crate::composite::composite)
    /// first when it matters.
    pub fn to_luminance(&self) -> Self {
        let samples = match &self.pixels {
            Pixels::Luminance(samples) => samples.clone(),
            Pixels::Rgb(samples) => samples.iter().map(|&[r, g, b]| luma(r, g, b)).collect(),
            Pixels::Rgba(samples) => samples
                .iter()
                .map(|&[r, g, b, _a]| luma(r, g, b))
                .collect(),
        };

        self.with_pixels(Pixels::Luminance(samples))
    }

    /// Expands luminance to gray RGB triples; drops alpha from RGBA.
    pub fn to_rgb(&self) -> Self {
        let samples = match &self.pixels {
            Pixels::Luminance(samples) => samples.iter().map(|&l| [l, l, l]).collect(),
            Pixels::Rgb(samples) => samples.clone(),
            Pixels::Rgba(samples) => samples.iter().map(|&[r, g, b, _a]| [r, g, b]).collect(),
        };

        self.with_pixels(Pixels::Rgb(samples))
    }
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_dimensions() {
        let err = Image::luminance(3, 2, vec![0; 5]).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                width: 3,
                height: 2,
                pixels: 5
            }
        ));
    }

    #[test]
    fn luminance_weights() {
        let image = Image::rgb(
            4,
            1,
            vec![[0, 0, 0], [255, 255, 255], [255, 0, 0], [0, 255, 0]],
        )
        .unwrap();
        let Pixels::Luminance(samples) = image.to_luminance().pixels().clone() else {
            panic!("expected luminance");
        };
        assert_eq!(samples, vec![0, 255, 76, 150]);
    }

    #[test]
    fn rgb_expansion_keeps_size() {
        let image = Image::luminance(2, 1, vec![0x10, 0xEE]).unwrap();
        let rgb = image.to_rgb();
        assert_eq!(rgb.size(), (2, 1));
        assert_eq!(rgb.pixels(), &Pixels::Rgb(vec![[0x10; 3], [0xEE; 3]]));
    }
}
