use std::collections::HashSet;
use toifgen_common::{
    Error, Result,
    render::{Blob, Renderer},
};

const HEX: &[u8; 16] = b"0123456789abcdef";
const BYTES_PER_LINE: usize = 16;

/// Renders blobs as `static const uint8_t` arrays in a C header
pub struct CHeaderRenderer {
    pub prefix: String,
}

impl CHeaderRenderer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn ident(&self, name: &str) -> String {
        let mut ident = self.prefix.clone();
        if ident.is_empty() && name.starts_with(|ch: char| ch.is_ascii_digit()) {
            ident.push('_');
        }
        ident.extend(
            name.chars()
                .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' }),
        );
        ident
    }
}

fn define(out: &mut String, ident: &str, suffix: &str, value: impl itoa::Integer) {
    let mut num_buf = itoa::Buffer::new();
    out.push_str("#define ");
    out.push_str(ident);
    out.push_str(suffix);
    out.push(' ');
    out.push_str(num_buf.format(value));
    out.push('\n');
}

fn push_bytes(out: &mut String, bytes: &[u8]) {
    for line in bytes.chunks(BYTES_PER_LINE) {
        out.push_str("   ");
        for byte in line {
            out.push_str(" 0x");
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0F) as usize] as char);
            out.push(',');
        }
        out.push('\n');
    }
}

impl Renderer for CHeaderRenderer {
    fn render(&self, blobs: &[Blob<'_>]) -> Result<String> {
        let mut out = String::from(
            "// generated by toifgen-process, do not edit\n#pragma once\n\n#include <stdint.h>\n",
        );

        let mut seen = HashSet::with_capacity(blobs.len());
        for blob in blobs {
            let ident = self.ident(blob.name);
            if !seen.insert(ident.clone()) {
                return Err(Error::DuplicateName(ident));
            }
            out.push('\n');
            if let Some((width, height)) = blob.size {
                define(&mut out, &ident, "_WIDTH", width);
                define(&mut out, &ident, "_HEIGHT", height);
            }
            define(&mut out, &ident, "_SIZE", blob.bytes.len());

            out.push_str("static const uint8_t ");
            out.push_str(&ident);
            out.push_str("[] = {\n");
            push_bytes(&mut out, blob.bytes);
            out.push_str("};\n");
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_arrays_in_order() {
        let renderer = CHeaderRenderer::new("IMG_");
        let blobs = [
            Blob {
                name: "home",
                bytes: &[0xF8, 0x1F],
                size: Some((1, 1)),
            },
            Blob {
                name: "lock-icon",
                bytes: &[0xAC],
                size: None,
            },
        ];
        let text = renderer.render(&blobs).unwrap();

        assert!(text.starts_with("// generated"));
        assert!(text.contains(
            "#define IMG_home_WIDTH 1\n#define IMG_home_HEIGHT 1\n#define IMG_home_SIZE 2\nstatic const uint8_t IMG_home[] = {\n    0xf8, 0x1f,\n};\n"
        ));
        assert!(text.contains("#define IMG_lock_icon_SIZE 1\n"));
        assert!(!text.contains("IMG_lock_icon_WIDTH"));
        assert!(text.find("IMG_home[]").unwrap() < text.find("IMG_lock_icon[]").unwrap());
    }

    #[test]
    fn wraps_long_arrays() {
        let bytes = [0u8; 20];
        let text = CHeaderRenderer::new("")
            .render(&[Blob {
                name: "9patch",
                bytes: &bytes,
                size: None,
            }])
            .unwrap();

        assert!(text.contains("static const uint8_t _9patch[] = {\n"));
        let rows: Vec<_> = text.lines().filter(|line| line.starts_with("    0x")).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].matches("0x").count(), 16);
        assert_eq!(rows[1].matches("0x").count(), 4);
    }

    #[test]
    fn sanitized_collisions_are_rejected() {
        let blobs = [
            Blob {
                name: "lock-icon",
                bytes: &[0x00],
                size: None,
            },
            Blob {
                name: "lock_icon",
                bytes: &[0x00],
                size: None,
            },
        ];
        let err = CHeaderRenderer::new("IMG_").render(&blobs).unwrap_err();
        assert!(matches!(err, Error::DuplicateName(ident) if ident == "IMG_lock_icon"));

        let cjk = [
            Blob {
                name: "使用",
                bytes: &[],
                size: None,
            },
            Blob {
                name: "教学",
                bytes: &[],
                size: None,
            },
        ];
        assert!(CHeaderRenderer::new("IMG_").render(&cjk).is_err());
    }

    #[test]
    fn empty_blob_has_empty_body() {
        let text = CHeaderRenderer::new("G_")
            .render(&[Blob {
                name: "x",
                bytes: &[],
                size: None,
            }])
            .unwrap();
        assert!(text.contains("#define G_x_SIZE 0\nstatic const uint8_t G_x[] = {\n};\n"));
    }
}
