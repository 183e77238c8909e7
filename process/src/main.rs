#[macro_use]
extern crate tracing;

mod header;

use anyhow::Context;
use itertools::Itertools;
use rayon::prelude::*;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use toifgen_common::{
    AssetTable, Background, Bundle, Error, GlyphTable, Image, PackedAsset, Pipeline, Target,
    render::{Blob, Renderer},
    source,
    table::{char_from_name, name_from_path},
};

use self::header::CHeaderRenderer;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(argh::FromArgs)]
/// turn a directory of images into device asset tables
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(argh::FromArgs)]
#[argh(subcommand)]
enum Command {
    Images(ImagesArgs),
    Glyphs(GlyphsArgs),
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "images")]
/// pack every image under a directory into named raw pixel arrays
struct ImagesArgs {
    #[argh(positional)]
    /// directory with the source images, searched recursively
    path: PathBuf,

    #[argh(option)]
    /// path to the generated header
    output: PathBuf,

    #[argh(option, default = "Target::Auto")]
    /// pixel format: auto, gray4 or rgb565
    target: Target,

    #[argh(option, default = "Background::default()")]
    /// backdrop for transparent images as rrggbb or rrggbbaa
    background: Background,

    #[argh(option, default = "String::from(\"IMG_\")")]
    /// prefix for generated identifiers
    prefix: String,

    #[argh(switch)]
    /// also emit width and height defines for gray4 images, rgb565 images always get them
    sizes: bool,

    #[argh(option)]
    /// emit a single TLV table with this name instead of one array per image
    table: Option<String>,

    #[argh(option, default = "3")]
    /// tag width in bytes for --table
    tag_width: usize,

    #[argh(option)]
    /// also write an archived bundle for the previewer
    archive: Option<PathBuf>,

    #[argh(switch)]
    /// leave out images with unsupported color modes instead of aborting
    skip_unsupported: bool,
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "glyphs")]
/// pack rasterized glyph images, one per character, into a TLV font table
struct GlyphsArgs {
    #[argh(positional)]
    /// directory with one image per glyph, named after its character
    path: PathBuf,

    #[argh(option)]
    /// path to the generated header
    output: PathBuf,

    #[argh(option, default = "String::from(\"font\")")]
    /// identifier of the generated table
    name: String,

    #[argh(option, default = "GlyphTable::CJK_TAG_WIDTH")]
    /// tag width in bytes, every character must encode to exactly this many UTF-8 bytes
    tag_width: usize,

    #[argh(option, default = "Background::default()")]
    /// backdrop for transparent glyphs as rrggbb or rrggbbaa
    background: Background,

    #[argh(option)]
    /// also write an archived bundle for the previewer
    archive: Option<PathBuf>,
}

/// Files under `path` the decoder knows how to read, in sorted order
fn collect_images(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(path)
        .with_context(|| format!("reading {}", path.display()))?
        .map_ok(|entry| entry.path())
        .try_collect()?;
    entries.sort();

    let mut files = Vec::new();
    for entry in entries {
        if entry.is_dir() {
            files.extend(collect_images(&entry)?);
        } else if image::ImageFormat::from_path(&entry).is_ok() {
            files.push(entry);
        } else {
            debug!(path = %entry.display(), "not an image, skipping");
        }
    }

    Ok(files)
}

fn read_asset(
    pipeline: &Pipeline<'_>,
    path: &Path,
    skip_unsupported: bool,
) -> anyhow::Result<Option<(String, PackedAsset)>> {
    let name = name_from_path(path)?;
    let image = match source::open(path) {
        Ok(image) => image,
        Err(Error::UnsupportedMode(mode)) if skip_unsupported => {
            warn!(path = %path.display(), %mode, "unsupported mode, skipping");
            return Ok(None);
        }
        Err(error) => return Err(error.into()),
    };

    let asset = pipeline
        .encode(&image)
        .with_context(|| format!("encoding {}", path.display()))?;
    debug!(%name, format = %asset.format(), bytes = asset.data().len(), "packed");

    Ok(Some((name, asset)))
}

fn glyph_char(path: &Path) -> anyhow::Result<char> {
    let name = name_from_path(path)?;
    let ch = char_from_name(&name).with_context(|| format!("naming {}", path.display()))?;
    Ok(ch)
}

fn read_glyph(pipeline: &Pipeline<'_>, path: &Path) -> anyhow::Result<(char, PackedAsset)> {
    let ch = glyph_char(path)?;
    let image: Image = source::open(path)?;
    let asset = pipeline
        .encode(&image)
        .with_context(|| format!("encoding glyph {ch:?}"))?;

    Ok((ch, asset))
}

fn write_archive(path: &Path, bundle: &Bundle) -> anyhow::Result<()> {
    let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(bundle)?;

    let file = File::create(path)?;
    let mut file = BufWriter::new(file);
    file.write_all(&bytes)?;
    file.flush()?;

    info!(path = %path.display(), bytes = bytes.len(), "wrote archive");
    Ok(())
}

fn build_images(args: &ImagesArgs) -> anyhow::Result<(String, Bundle)> {
    let files = collect_images(&args.path)?;
    info!(count = files.len(), "encoding images");

    let pipeline = Pipeline {
        background: args.background,
        target: args.target,
        codec: None,
    };

    // indexed collect, so table order matches enumeration order
    let assets: Vec<Option<(String, PackedAsset)>> = files
        .par_iter()
        .map(|path| read_asset(&pipeline, path, args.skip_unsupported))
        .collect::<anyhow::Result<_>>()?;
    let table = AssetTable::from_entries(assets.into_iter().flatten())?;

    let renderer = CHeaderRenderer::new(args.prefix.as_str());
    let text = match &args.table {
        Some(name) => {
            let bytes = table.to_tlv(args.tag_width)?.to_bytes();
            renderer.render(&[Blob {
                name,
                bytes: &bytes,
                size: None,
            }])?
        }
        None => renderer.render(&table.blobs(args.sizes))?,
    };

    let bundle = Bundle {
        assets: table,
        glyphs: None,
    };
    Ok((text, bundle))
}

fn build_glyphs(args: &GlyphsArgs) -> anyhow::Result<(String, Bundle)> {
    let files = collect_images(&args.path)?;
    info!(count = files.len(), "encoding glyphs");

    let pipeline = Pipeline {
        background: args.background,
        target: Target::Gray4,
        codec: None,
    };

    let glyphs: Vec<(char, PackedAsset)> = files
        .par_iter()
        .map(|path| read_glyph(&pipeline, path))
        .collect::<anyhow::Result<_>>()?;

    let mut table = GlyphTable::new(args.tag_width);
    for (ch, asset) in &glyphs {
        table
            .push(*ch, asset)
            .with_context(|| format!("framing glyph {ch:?}"))?;
    }

    let bytes = table.to_bytes();
    let text = CHeaderRenderer::new("").render(&[Blob {
        name: &args.name,
        bytes: &bytes,
        size: None,
    }])?;

    Ok((text, Bundle::from_glyphs(args.name.clone(), &table)))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();

    let ((text, bundle), output, archive) = match &args.command {
        Command::Images(args) => (build_images(args)?, &args.output, &args.archive),
        Command::Glyphs(args) => (build_glyphs(args)?, &args.output, &args.archive),
    };

    fs::write(output, text).with_context(|| format!("writing {}", output.display()))?;
    info!(path = %output.display(), "wrote header");

    if let Some(archive) = archive {
        write_archive(archive, &bundle)?;
    }

    Ok(())
}
