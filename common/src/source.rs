use crate::{
    error::{Error, Result},
    raster::Image,
};
use image::DynamicImage;
use std::path::Path;

pub fn open(path: &Path) -> Result<Image> {
    let decoded = image::open(path).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    Image::try_from(decoded)
}

impl TryFrom<DynamicImage> for Image {
    type Error = Error;

    fn try_from(value: DynamicImage) -> Result<Self> {
        let (width, height) = (value.width(), value.height());
        match value {
            DynamicImage::ImageLuma8(buffer) => Image::luminance(width, height, buffer.into_raw()),
            DynamicImage::ImageRgb8(buffer) => Image::rgb(
                width,
                height,
                buffer.pixels().map(|pixel| pixel.0).collect(),
            ),
            DynamicImage::ImageRgba8(buffer) => Image::rgba(
                width,
                height,
                buffer.pixels().map(|pixel| pixel.0).collect(),
            ),
            other => Err(Error::UnsupportedMode(format!("{:?}", other.color()))),
        }
    }
}
