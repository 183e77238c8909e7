use std::{io, path::PathBuf};
use thiserror::Error;

/// Everything that can go wrong while turning source images into device tables
#[derive(Error, Debug)]
pub enum Error {
    /// Source image could not be read or decoded
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Color mode outside of luminance, RGB and RGBA (or RGBA handed to the packer)
    #[error("unsupported image mode: {0}")]
    UnsupportedMode(String),

    /// Grayscale packing needs two samples per output byte
    #[error("odd pixel count {0}, gray4 packing needs an even number of samples")]
    OddPixelCount(usize),

    #[error("{width}x{height} image does not match {pixels} pixels")]
    DimensionMismatch {
        width: u32,
        height: u32,
        pixels: usize,
    },

    #[error("{width}x{height} does not fit 16-bit dimension fields")]
    DimensionsTooLarge { width: u32, height: u32 },

    /// Payload does not fit the 16-bit TLV length field
    #[error("payload of {0} bytes exceeds the 65535 byte record limit")]
    PayloadTooLarge(usize),

    #[error("tag is {actual} bytes wide, table uses {expected} byte tags")]
    TagWidthMismatch { expected: usize, actual: usize },

    #[error("table truncated at offset {offset}")]
    Truncated { offset: usize },

    #[error("duplicate asset name: {0}")]
    DuplicateName(String),

    #[error("invalid asset name: {0}")]
    InvalidName(String),

    #[error("invalid container: {0}")]
    InvalidContainer(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
