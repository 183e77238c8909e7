//! Boundary to the external compressed container codec.
//!
//! The codec itself lives outside this crate. What is known here is the
//! 12-byte header the device firmware checks before decompressing:
//! `"TOI" || 'f' | 'g' || u16 LE width || u16 LE height || u32 LE data length`.
//! Glyph tables store the same header without the 4-byte magic.

use crate::{
    error::{Error, Result},
    raster::Image,
};

pub const MAGIC: &[u8; 3] = b"TOI";
pub const MAGIC_LEN: usize = 4;
/// Header bytes after the magic: width, height and data length
pub const INFO_LEN: usize = 8;
pub const HEADER_LEN: usize = MAGIC_LEN + INFO_LEN;

/// External encoder/decoder for the compressed container format
pub trait ContainerCodec {
    /// Full container bytes, header included
    fn encode(&self, image: &Image) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Image>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerHeader {
    pub width: u16,
    pub height: u16,
    pub grayscale: bool,
    pub data_len: u32,
}

impl ContainerHeader {
    pub fn new(width: u32, height: u32, grayscale: bool, data_len: usize) -> Result<Self> {
        let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(Error::DimensionsTooLarge { width, height });
        };
        let data_len =
            u32::try_from(data_len).map_err(|_| Error::PayloadTooLarge(data_len))?;

        Ok(Self {
            width: w,
            height: h,
            grayscale,
            data_len,
        })
    }

    /// Validates a full container and returns its header.
    pub fn probe(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::InvalidContainer("shorter than header"));
        }
        if &bytes[..3] != MAGIC {
            return Err(Error::InvalidContainer("bad magic"));
        }
        let grayscale = match bytes[3] {
            b'f' => false,
            b'g' => true,
            _ => return Err(Error::InvalidContainer("unknown pixel format")),
        };

        let header = Self::read_info(&bytes[MAGIC_LEN..], grayscale)?;
        if header.data_len as usize != bytes.len() - HEADER_LEN {
            return Err(Error::InvalidContainer("data length does not match"));
        }
        Ok(header)
    }

    /// Reads width, height and data length from the start of `bytes`.
    pub fn read_info(bytes: &[u8], grayscale: bool) -> Result<Self> {
        let Some(info) = bytes.get(..INFO_LEN) else {
            return Err(Error::InvalidContainer("shorter than header"));
        };

        Ok(Self {
            width: u16::from_le_bytes([info[0], info[1]]),
            height: u16::from_le_bytes([info[2], info[3]]),
            grayscale,
            data_len: u32::from_le_bytes([info[4], info[5], info[6], info[7]]),
        })
    }

    pub fn write_info(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.data_len.to_le_bytes());
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(MAGIC);
        out.push(if self.grayscale { b'g' } else { b'f' });
        self.write_info(out);
    }
}
