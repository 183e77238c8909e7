#[macro_use]
extern crate tracing;

pub mod composite;
pub mod container;
pub mod encode;
pub mod error;
pub mod preview;
pub mod raster;
pub mod render;
pub mod source;
pub mod table;
pub mod tlv;

pub use self::{
    composite::{Background, composite},
    encode::{AssetFormat, PackedAsset, Target, encode, encode_as},
    error::{Error, Result},
    raster::{Image, PixelMode, Pixels},
    table::{AssetTable, Entry, GlyphTable, Pipeline},
};

use rkyv::{Archive, Deserialize, Serialize};

#[derive(Archive, Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct GlyphBlob {
    pub name: String,
    pub tag_width: u32,
    // concatenated TLV records
    pub data: Vec<u8>,
}

/// Everything one generator run produced, archived for the previewer
#[derive(Archive, Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct Bundle {
    pub assets: AssetTable,
    pub glyphs: Option<GlyphBlob>,
}

impl Bundle {
    pub fn from_glyphs(name: String, glyphs: &GlyphTable) -> Self {
        Self {
            assets: AssetTable::new(),
            glyphs: Some(GlyphBlob {
                name,
                tag_width: glyphs.tag_width() as u32,
                data: glyphs.to_bytes(),
            }),
        }
    }

    pub fn glyph_table(&self) -> Result<Option<GlyphTable>> {
        self.glyphs
            .as_ref()
            .map(|blob| GlyphTable::from_bytes(&blob.data, blob.tag_width as usize))
            .transpose()
    }
}
