use crate::raster::{Image, Pixels};
use std::str::FromStr;

/// Backdrop color used when flattening transparent images
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Background {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 255,
        }
    }
}

impl FromStr for Background {
    type Err = String;

    /// Parses `rrggbb` or `rrggbbaa`, with an optional leading `#`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return Err(format!("expected rrggbb or rrggbbaa, got {s:?}"));
        }

        let channel = |idx: usize| {
            u8::from_str_radix(&hex[idx * 2..idx * 2 + 2], 16)
                .map_err(|_| format!("invalid hex color {s:?}"))
        };

        Ok(Self {
            r: channel(0)?,
            g: channel(1)?,
            b: channel(2)?,
            a: if hex.len() == 8 { channel(3)? } else { 255 },
        })
    }
}

/// Flattens an RGBA image onto `background` using source-over blending.
///
/// Images without an alpha channel come back unchanged.
pub fn composite(image: &Image, background: Background) -> Image {
    let Pixels::Rgba(samples) = image.pixels() else {
        return image.clone();
    };

    let blended = samples
        .iter()
        .map(|&[r, g, b, a]| {
            let (sa, da) = (a as u32, background.a as u32);
            let out_a = sa * 255 + da * (255 - sa);
            let blend = |s: u8, d: u8| {
                if out_a == 0 {
                    return 0;
                }
                let num = s as u32 * sa * 255 + d as u32 * da * (255 - sa);
                ((num + out_a / 2) / out_a) as u8
            };

            [
                blend(r, background.r),
                blend(g, background.g),
                blend(b, background.b),
            ]
        })
        .collect();

    image.with_pixels(Pixels::Rgb(blended))
}
