//! Software RGB565 framebuffer that draws packed assets the way the device
//! does: color images copied word by word, gray4 images mapped through a
//! 16-entry palette blended from a background to a foreground color.

use crate::{
    encode::{AssetFormat, PackedAsset, rgb565, rgb888},
    error::{Error, Result},
    table::GlyphTable,
};
use image::RgbImage;

pub const DISPLAY_WIDTH: u32 = 320;
pub const DISPLAY_HEIGHT: u32 = 240;

pub const WHITE: u16 = 0xFFFF;
pub const BLACK: u16 = 0x0000;

/// Blends two RGB565 colors per 5/6/5 channel; `step` 15 yields `fg`, 0 yields `bg`
pub fn interpolate(fg: u16, bg: u16, step: u8) -> u16 {
    let step = step as u32;
    let mix = |mask: u16, shift: u32| {
        let a = ((fg & mask) >> shift) as u32;
        let b = ((bg & mask) >> shift) as u32;
        (((a * step + b * (15 - step)) / 15) as u16) << shift
    };
    mix(0xF800, 11) | mix(0x07E0, 5) | mix(0x001F, 0)
}

pub fn palette(fg: u16, bg: u16) -> [u16; 16] {
    std::array::from_fn(|step| interpolate(fg, bg, step as u8))
}

pub fn parse_color(s: &str) -> Result<u16, String> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return Err(format!("expected rrggbb, got {s:?}"));
    }
    let value = u32::from_str_radix(hex, 16).map_err(|_| format!("invalid color {s:?}"))?;
    Ok(rgb565((value >> 16) as u8, (value >> 8) as u8, value as u8))
}

pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<u16>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![BLACK; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fill(&mut self, color: u16) {
        self.pixels.fill(color);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u16> {
        (x < self.width && y < self.height)
            .then(|| self.pixels[(y * self.width + x) as usize])
    }

    fn put(&mut self, x: i64, y: i64, color: u16) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        self.pixels[(y as usize) * self.width as usize + x as usize] = color;
    }

    /// Draws `asset` with its top-left corner at (x, y), clipped to the buffer.
    ///
    /// `fg` and `bg` only apply to gray4 assets.
    pub fn draw_asset(
        &mut self,
        x: i64,
        y: i64,
        asset: &PackedAsset,
        fg: u16,
        bg: u16,
    ) -> Result<()> {
        let width = asset.width() as usize;
        let pixel_count = width * asset.height() as usize;

        match asset.format() {
            AssetFormat::Rgb565 => {
                if asset.data().len() != pixel_count * 2 {
                    return Err(size_mismatch(asset));
                }
                for (pos, word) in asset.data().chunks_exact(2).enumerate() {
                    let color = u16::from_be_bytes([word[0], word[1]]);
                    self.put(x + (pos % width) as i64, y + (pos / width) as i64, color);
                }
            }
            AssetFormat::Gray4 => {
                if asset.data().len() * 2 != pixel_count {
                    return Err(size_mismatch(asset));
                }
                let colors = palette(fg, bg);
                for (idx, byte) in asset.data().iter().enumerate() {
                    for (half, nibble) in [byte >> 4, byte & 0x0F].into_iter().enumerate() {
                        let pos = idx * 2 + half;
                        self.put(
                            x + (pos % width) as i64,
                            y + (pos / width) as i64,
                            colors[nibble as usize],
                        );
                    }
                }
            }
            AssetFormat::Container => {
                return Err(Error::UnsupportedMode(
                    "container payloads cannot be previewed".into(),
                ));
            }
        }

        Ok(())
    }

    /// Draws `text` glyph by glyph, returning the x position after the last one.
    ///
    /// Characters missing from the table are skipped.
    pub fn draw_text(
        &mut self,
        x: i64,
        y: i64,
        text: &str,
        glyphs: &GlyphTable,
        fg: u16,
        bg: u16,
    ) -> Result<i64> {
        let mut cursor = x;
        for ch in text.chars() {
            let Some(glyph) = glyphs.glyph(ch)? else {
                debug!(%ch, "no glyph, skipping");
                continue;
            };

            self.draw_asset(cursor, y, &glyph.to_asset(), fg, bg)?;
            cursor += glyph.width as i64;
        }
        Ok(cursor)
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            image::Rgb(rgb888(self.pixels[(y * self.width + x) as usize]))
        })
    }
}

fn size_mismatch(asset: &PackedAsset) -> Error {
    Error::DimensionMismatch {
        width: asset.width(),
        height: asset.height(),
        pixels: asset.data().len(),
    }
}
