//! Hand-off to whatever turns named blobs into source text.

use crate::error::Result;

/// One named binary blob, optionally with the pixel size it decodes to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Blob<'a> {
    pub name: &'a str,
    pub bytes: &'a [u8],
    pub size: Option<(u32, u32)>,
}

pub trait Renderer {
    /// Renders blobs in the order given
    fn render(&self, blobs: &[Blob<'_>]) -> Result<String>;
}
