//! Ordered, named asset collections.
//!
//! [`AssetTable`] holds one packed asset per source image, keyed by the file
//! stem. [`GlyphTable`] is a TLV table keyed by the UTF-8 bytes of each
//! character, where every payload carries the glyph's size ahead of its pixels.

use crate::{
    composite::{Background, composite},
    container::{ContainerCodec, ContainerHeader, INFO_LEN},
    encode::{ArchivedPackedAsset, AssetFormat, PackedAsset, Target, encode_as},
    error::{Error, Result},
    raster::Image,
    render::Blob,
    tlv::{self, TlvTable},
};
use itertools::Itertools;
use rkyv::{Archive, Deserialize, Serialize};
use std::path::Path;

/// Identifier for an image file: the file name up to its first `.`
pub fn name_from_path(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| Error::InvalidName(path.display().to_string()))
}

/// The character a glyph image stands for, given its asset name
pub fn char_from_name(name: &str) -> Result<char> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(Error::InvalidName(format!(
            "{name}: glyph names must be a single character"
        ))),
    }
}

/// How each source image gets turned into bytes
#[derive(Default)]
pub struct Pipeline<'a> {
    pub background: Background,
    pub target: Target,
    /// When set, images go through the container codec instead of raw packing
    pub codec: Option<&'a (dyn ContainerCodec + Sync)>,
}

impl Pipeline<'_> {
    pub fn encode(&self, image: &Image) -> Result<PackedAsset> {
        let flat = composite(image, self.background);
        match self.codec {
            Some(codec) => {
                let data = codec.encode(&flat)?;
                Ok(PackedAsset::from_container(flat.width(), flat.height(), data))
            }
            None => encode_as(&flat, self.target),
        }
    }
}

#[derive(Archive, Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub asset: PackedAsset,
}

#[derive(Archive, Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct AssetTable {
    entries: Vec<Entry>,
}

impl AssetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes every image independently, keeping the given order
    pub fn from_images<I>(images: I, pipeline: &Pipeline<'_>) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Image)>,
    {
        let entries: Vec<(String, PackedAsset)> = images
            .into_iter()
            .map(|(name, image)| pipeline.encode(&image).map(|asset| (name, asset)))
            .try_collect()?;

        Self::from_entries(entries)
    }

    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, PackedAsset)>,
    {
        let mut table = Self::new();
        for (name, asset) in entries {
            table.push(name, asset)?;
        }
        Ok(table)
    }

    pub fn push(&mut self, name: String, asset: PackedAsset) -> Result<()> {
        if self.get(&name).is_some() {
            return Err(Error::DuplicateName(name));
        }
        self.entries.push(Entry { name, asset });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PackedAsset> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.asset)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Frames each asset's bytes, tagged with its name
    pub fn to_tlv(&self, tag_width: usize) -> Result<TlvTable> {
        let mut table = TlvTable::new(tag_width);
        for entry in &self.entries {
            table.push(entry.name.as_bytes(), entry.asset.data())?;
        }
        Ok(table)
    }

    /// One blob per entry. RGB565 assets always carry their size, the rest
    /// only when `all_sizes` is set.
    pub fn blobs(&self, all_sizes: bool) -> Vec<Blob<'_>> {
        self.entries
            .iter()
            .map(|entry| Blob {
                name: &entry.name,
                bytes: entry.asset.data(),
                size: (all_sizes || entry.asset.format() == AssetFormat::Rgb565)
                    .then(|| entry.asset.size()),
            })
            .collect()
    }
}

impl ArchivedAssetTable {
    pub fn entries(&self) -> &[ArchivedEntry] {
        self.entries.as_slice()
    }

    pub fn get(&self, name: &str) -> Option<&ArchivedPackedAsset> {
        self.entries
            .iter()
            .find(|entry| entry.name.as_str() == name)
            .map(|entry| &entry.asset)
    }
}

/// Borrowed view of one glyph record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph<'a> {
    pub width: u16,
    pub height: u16,
    pub data: &'a [u8],
}

impl Glyph<'_> {
    /// Packed pixels wrapped as a gray4 asset
    pub fn to_asset(&self) -> PackedAsset {
        PackedAsset::from_gray4(self.width as u32, self.height as u32, self.data.to_vec())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphTable {
    table: TlvTable,
}

impl GlyphTable {
    /// UTF-8 tag width for CJK glyphs
    pub const CJK_TAG_WIDTH: usize = 3;

    pub fn new(tag_width: usize) -> Self {
        Self {
            table: TlvTable::new(tag_width),
        }
    }

    pub fn from_bytes(bytes: &[u8], tag_width: usize) -> Result<Self> {
        Ok(Self {
            table: TlvTable::from_bytes(bytes, tag_width)?,
        })
    }

    pub fn tag_width(&self) -> usize {
        self.table.tag_width()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn push(&mut self, ch: char, asset: &PackedAsset) -> Result<()> {
        if asset.format() != AssetFormat::Gray4 {
            return Err(Error::UnsupportedMode(format!(
                "glyphs are gray4, got {}",
                asset.format()
            )));
        }
        let header =
            ContainerHeader::new(asset.width(), asset.height(), true, asset.data().len())?;

        let mut payload = Vec::with_capacity(INFO_LEN + asset.data().len());
        header.write_info(&mut payload);
        payload.extend_from_slice(asset.data());

        let mut tag = [0; 4];
        self.table.push(ch.encode_utf8(&mut tag).as_bytes(), &payload)
    }

    pub fn glyph(&self, ch: char) -> Result<Option<Glyph<'_>>> {
        let mut tag = [0; 4];
        let tag = ch.encode_utf8(&mut tag).as_bytes();
        self.table.get(tag).map(parse_glyph).transpose()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.table.to_bytes()
    }
}

/// Finds and parses a glyph directly in a concatenated table
pub fn lookup_glyph(bytes: &[u8], tag_width: usize, ch: char) -> Result<Option<Glyph<'_>>> {
    let mut tag = [0; 4];
    let tag = ch.encode_utf8(&mut tag).as_bytes();
    tlv::lookup(bytes, tag_width, tag)?
        .map(parse_glyph)
        .transpose()
}

fn parse_glyph(payload: &[u8]) -> Result<Glyph<'_>> {
    let header = ContainerHeader::read_info(payload, true)?;
    let data = &payload[INFO_LEN..];
    if header.data_len as usize != data.len() {
        return Err(Error::InvalidContainer("glyph data length does not match"));
    }

    Ok(Glyph {
        width: header.width,
        height: header.height,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Pixels;
    use std::path::PathBuf;

    fn gray(width: u32, height: u32, value: u8) -> Image {
        Image::luminance(width, height, vec![value; (width * height) as usize]).unwrap()
    }

    #[test]
    fn names_stop_at_the_first_dot() {
        assert_eq!(name_from_path(Path::new("/assets/icons/lock.png")).unwrap(), "lock");
        assert_eq!(name_from_path(Path::new("home.2x.png")).unwrap(), "home");
        assert_eq!(name_from_path(Path::new("v1.2/dot.png")).unwrap(), "dot");
        assert!(name_from_path(Path::new(".hidden.png")).is_err());
        assert!(name_from_path(&PathBuf::from("/")).is_err());
    }

    #[test]
    fn glyph_names_are_single_characters() {
        assert_eq!(char_from_name("使").unwrap(), '使');
        assert!(matches!(char_from_name("ab"), Err(Error::InvalidName(_))));
        assert!(char_from_name("").is_err());
    }

    #[test]
    fn table_keeps_insertion_order() {
        let images = vec![
            ("zeta".to_owned(), gray(2, 1, 0xFF)),
            ("alpha".to_owned(), Image::rgb(1, 1, vec![[0xFF, 0, 0xFF]]).unwrap()),
            (
                "mid".to_owned(),
                Image::rgba(1, 1, vec![[0xFF, 0xFF, 0xFF, 0]]).unwrap(),
            ),
        ];
        let table = AssetTable::from_images(images, &Pipeline::default()).unwrap();

        let names: Vec<_> = table.entries().iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        assert_eq!(table.get("zeta").unwrap().data(), &[0xFF]);
        assert_eq!(table.get("alpha").unwrap().data(), &[0xF8, 0x1F]);
        // transparent white over black
        assert_eq!(table.get("mid").unwrap().data(), &[0x00, 0x00]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let images = vec![("a".to_owned(), gray(2, 1, 0)), ("a".to_owned(), gray(2, 1, 1))];
        assert!(matches!(
            AssetTable::from_images(images, &Pipeline::default()),
            Err(Error::DuplicateName(name)) if name == "a"
        ));
    }

    #[test]
    fn first_failure_aborts() {
        let images = vec![("ok".to_owned(), gray(2, 1, 0)), ("odd".to_owned(), gray(3, 1, 0))];
        assert!(matches!(
            AssetTable::from_images(images, &Pipeline::default()),
            Err(Error::OddPixelCount(3))
        ));
    }

    #[test]
    fn blobs_carry_sizes_on_request() {
        let table = AssetTable::from_images(
            vec![("icon".to_owned(), gray(4, 2, 0x80))],
            &Pipeline::default(),
        )
        .unwrap();

        let blobs = table.blobs(true);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].name, "icon");
        assert_eq!(blobs[0].bytes, &[0x88; 4]);
        assert_eq!(blobs[0].size, Some((4, 2)));
        assert_eq!(table.blobs(false)[0].size, None);
    }

    #[test]
    fn rgb565_blobs_always_carry_sizes() {
        let images = vec![
            ("gray".to_owned(), gray(2, 1, 0)),
            ("color".to_owned(), Image::rgb(3, 1, vec![[0x10, 0x20, 0x30]; 3]).unwrap()),
        ];
        let table = AssetTable::from_images(images, &Pipeline::default()).unwrap();

        let blobs = table.blobs(false);
        assert_eq!(blobs[0].size, None);
        assert_eq!(blobs[1].size, Some((3, 1)));
    }

    #[test]
    fn asset_tables_frame_by_name() {
        let table = AssetTable::from_images(
            vec![
                ("ok".to_owned(), gray(2, 1, 0x10)),
                ("no".to_owned(), gray(2, 1, 0x20)),
            ],
            &Pipeline::default(),
        )
        .unwrap();

        let bytes = table.to_tlv(2).unwrap().to_bytes();
        assert_eq!(bytes, b"ok\x01\x00\x11no\x01\x00\x22");
        assert!(table.to_tlv(3).is_err());
    }

    struct Stub;

    impl ContainerCodec for Stub {
        fn encode(&self, image: &Image) -> Result<Vec<u8>> {
            let mut out = Vec::new();
            ContainerHeader::new(image.width(), image.height(), false, 0)?.write(&mut out);
            Ok(out)
        }

        fn decode(&self, _bytes: &[u8]) -> Result<Image> {
            Image::rgb(1, 1, vec![[0, 0, 0]])
        }
    }

    #[test]
    fn codec_replaces_raw_packing() {
        let pipeline = Pipeline {
            codec: Some(&Stub),
            ..Pipeline::default()
        };
        let asset = pipeline
            .encode(&Image::rgba(3, 1, vec![[1, 2, 3, 4]; 3]).unwrap())
            .unwrap();

        assert_eq!(asset.format(), AssetFormat::Container);
        assert_eq!(ContainerHeader::probe(asset.data()).unwrap().width, 3);
    }

    #[test]
    fn glyph_tables_round_trip() {
        let mut glyphs = GlyphTable::new(GlyphTable::CJK_TAG_WIDTH);
        let shi = PackedAsset::from_gray4(2, 2, vec![0xF0, 0x0F]);
        glyphs.push('使', &shi).unwrap();
        glyphs.push('用', &PackedAsset::from_gray4(0, 0, vec![])).unwrap();
        assert!(glyphs.push('a', &shi).is_err());
        let color = PackedAsset::from_container(1, 1, vec![0]);
        assert!(matches!(glyphs.push('教', &color), Err(Error::UnsupportedMode(_))));

        let bytes = glyphs.to_bytes();
        assert_eq!(&bytes[..3], "使".as_bytes());
        assert_eq!(&bytes[3..5], &[10, 0]);
        assert_eq!(&bytes[5..13], &[2, 0, 2, 0, 2, 0, 0, 0]);

        let reloaded = GlyphTable::from_bytes(&bytes, 3).unwrap();
        let glyph = reloaded.glyph('使').unwrap().unwrap();
        assert_eq!((glyph.width, glyph.height), (2, 2));
        assert_eq!(glyph.to_asset(), shi);
        assert!(reloaded.glyph('教').unwrap().is_none());

        let direct = lookup_glyph(&bytes, 3, '用').unwrap().unwrap();
        assert_eq!(direct.data, &[] as &[u8]);
    }

    #[test]
    fn glyph_images_pack_as_gray4() {
        let image = Image::rgb(2, 1, vec![[255, 255, 255], [0, 0, 0]]).unwrap();
        let pipeline = Pipeline {
            target: Target::Gray4,
            ..Pipeline::default()
        };
        let asset = pipeline.encode(&image).unwrap();
        assert_eq!(asset.decode().unwrap().pixels(), &Pixels::Luminance(vec![255, 0]));
    }
}
