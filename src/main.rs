#[macro_use]
extern crate tracing;

use anyhow::Context;
use std::{fs::File, path::PathBuf};
use toifgen_common::{
    ArchivedBundle, ArchivedGlyphBlob, GlyphTable, PackedAsset,
    preview::{BLACK, DISPLAY_HEIGHT, DISPLAY_WIDTH, Framebuffer, WHITE, parse_color},
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(argh::FromArgs)]
/// draw generated device assets the way the display would
struct Args {
    #[argh(option)]
    /// archived bundle written by toifgen-process
    data: PathBuf,

    #[argh(option)]
    /// png to write the framebuffer to
    output: Option<PathBuf>,

    #[argh(option)]
    /// asset to draw, may be repeated; assets are laid out left to right
    asset: Vec<String>,

    #[argh(option)]
    /// text to draw with the bundled glyph table, below the assets
    text: Option<String>,

    #[argh(option, default = "0")]
    /// x offset
    x: i64,

    #[argh(option, default = "0")]
    /// y offset
    y: i64,

    #[argh(option, default = "DISPLAY_WIDTH")]
    /// framebuffer width
    width: u32,

    #[argh(option, default = "DISPLAY_HEIGHT")]
    /// framebuffer height
    height: u32,

    #[argh(option, default = "WHITE", from_str_fn(parse_color))]
    /// foreground for gray4 assets and text as rrggbb
    fg: u16,

    #[argh(option, default = "BLACK", from_str_fn(parse_color))]
    /// background for gray4 assets and text as rrggbb
    bg: u16,

    #[argh(switch)]
    /// list the bundle contents
    list: bool,

    #[argh(switch)]
    /// skip the checking of the bundle data
    ///
    /// will speed up loads of large bundles at the cost of potential segfaults
    skip_checks: bool,
}

fn glyph_table(glyphs: &ArchivedGlyphBlob) -> anyhow::Result<GlyphTable> {
    let table = GlyphTable::from_bytes(
        glyphs.data.as_slice(),
        glyphs.tag_width.to_native() as usize,
    )?;
    Ok(table)
}

fn list(bundle: &ArchivedBundle) -> anyhow::Result<()> {
    for entry in bundle.assets.entries() {
        let asset = rkyv::deserialize::<PackedAsset, rkyv::rancor::Error>(&entry.asset)?;
        info!(
            name = entry.name.as_str(),
            format = %asset.format(),
            width = asset.width(),
            height = asset.height(),
            bytes = asset.data().len(),
            "asset"
        );
    }

    if let Some(glyphs) = bundle.glyphs.as_ref() {
        let table = glyph_table(glyphs)?;
        info!(name = glyphs.name.as_str(), count = table.len(), "glyph table");
    }

    Ok(())
}

fn compose(bundle: &ArchivedBundle, args: &Args) -> anyhow::Result<Framebuffer> {
    let mut fb = Framebuffer::new(args.width, args.height);
    fb.fill(args.bg);

    let (mut x, mut row_height) = (args.x, 0);
    for name in &args.asset {
        let archived = bundle
            .assets
            .get(name)
            .with_context(|| format!("no asset named {name:?}"))?;
        let asset = rkyv::deserialize::<PackedAsset, rkyv::rancor::Error>(archived)?;

        fb.draw_asset(x, args.y, &asset, args.fg, args.bg)
            .with_context(|| format!("drawing {name:?}"))?;
        x += asset.width() as i64;
        row_height = row_height.max(asset.height() as i64);
    }

    if let Some(text) = &args.text {
        let glyphs = bundle
            .glyphs
            .as_ref()
            .context("bundle has no glyph table")?;
        let table = glyph_table(glyphs)?;

        let end = fb.draw_text(args.x, args.y + row_height, text, &table, args.fg, args.bg)?;
        debug!(end, "drew text");
    }

    Ok(fb)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();

    info!("loading data..");
    let data_file = File::open(&args.data)?;
    let data = unsafe { memmap2::Mmap::map(&data_file)? };

    let bundle: &ArchivedBundle = if args.skip_checks {
        unsafe { rkyv::access_unchecked(&data) }
    } else {
        rkyv::access::<_, rkyv::rancor::Error>(&data)?
    };
    info!("loaded data successfully");

    if args.list {
        list(bundle)?;
    }

    if let Some(output) = &args.output {
        let fb = compose(bundle, &args)?;
        fb.to_rgb_image()
            .save(output)
            .with_context(|| format!("saving {}", output.display()))?;
        info!(path = %output.display(), "wrote preview");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use toifgen_common::{Bundle, Image, encode};

    fn args(asset: Vec<String>, text: Option<String>) -> Args {
        Args {
            data: PathBuf::new(),
            output: None,
            asset,
            text,
            x: 0,
            y: 0,
            width: 4,
            height: 2,
            fg: WHITE,
            bg: BLACK,
            list: false,
            skip_checks: false,
        }
    }

    fn bundle() -> Bundle {
        let mut glyphs = GlyphTable::new(3);
        glyphs
            .push('使', &PackedAsset::from_gray4(2, 1, vec![0xF0]))
            .unwrap();
        let mut bundle = Bundle::from_glyphs("font".into(), &glyphs);
        bundle
            .assets
            .push(
                "dot".into(),
                encode(&Image::rgb(1, 1, vec![[0xFF, 0x00, 0xFF]]).unwrap()).unwrap(),
            )
            .unwrap();
        bundle
    }

    #[test]
    fn composes_from_mapped_bundle() {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&bundle()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let data = unsafe { memmap2::Mmap::map(file.as_file()).unwrap() };
        let archived = rkyv::access::<ArchivedBundle, rkyv::rancor::Error>(&data).unwrap();
        list(archived).unwrap();

        let fb = compose(archived, &args(vec!["dot".into()], Some("使".into()))).unwrap();
        assert_eq!(fb.pixel(0, 0), Some(0xF81F));
        assert_eq!(fb.pixel(1, 0), Some(BLACK));
        assert_eq!(fb.pixel(0, 1), Some(WHITE));
        assert_eq!(fb.pixel(1, 1), Some(BLACK));
    }

    #[test]
    fn unknown_asset_is_an_error() {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&bundle()).unwrap();
        let archived = rkyv::access::<ArchivedBundle, rkyv::rancor::Error>(&bytes).unwrap();
        assert!(compose(archived, &args(vec!["missing".into()], None)).is_err());
    }
}
