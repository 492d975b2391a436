//! Native export collaborators: artwork compiled into the binary, resvg for
//! painting and the platform data directory for saved files.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::{self, FutureExt, LocalBoxFuture};

use super::{
    svg_data_url, Backdrop, Delivery, DownloadSink, ExportError, ImageLoader, RasterOptions,
    Rasterizer,
};
use crate::card::{ImageRef, SvgDocument};

/// Serves artwork from the sources embedded at compile time. Always ready.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedImageLoader;

impl ImageLoader for EmbeddedImageLoader {
    fn load(&self, image: ImageRef) -> LocalBoxFuture<'static, Result<String, ExportError>> {
        future::ready(Ok(svg_data_url(image.artwork.source()))).boxed_local()
    }
}

/// Paints SVG with resvg into a tiny-skia pixmap and encodes it with `png`.
pub struct ResvgRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl ResvgRasterizer {
    /// Loads system fonts once; reuse the rasterizer across exports.
    pub fn new() -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        Self {
            fontdb: Arc::new(fontdb),
        }
    }

    fn paint(&self, document: &SvgDocument, options: RasterOptions) -> Result<Vec<u8>, ExportError> {
        let ratio = options.pixel_ratio;
        if !(ratio.is_finite() && ratio > 0.0) {
            return Err(ExportError::Rasterize(format!("invalid pixel ratio {ratio}")));
        }

        let usvg_options = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(&document.markup, &usvg_options)
            .map_err(|err| ExportError::Rasterize(err.to_string()))?;

        let width = (document.width * ratio).ceil() as u32;
        let height = (document.height * ratio).ceil() as u32;
        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| ExportError::Rasterize(format!("cannot allocate {width}x{height}")))?;

        if let Backdrop::Solid(color) = options.backdrop {
            pixmap.fill(tiny_skia::Color::from_rgba8(
                color.r,
                color.g,
                color.b,
                color.alpha_u8(),
            ));
        }

        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(ratio, ratio),
            &mut pixmap.as_mut(),
        );

        encode_png(&pixmap)
    }
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize<'a>(
        &'a self,
        document: &'a SvgDocument,
        options: RasterOptions,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, ExportError>> {
        future::ready(self.paint(document, options)).boxed_local()
    }
}

fn encode_png(pixmap: &tiny_skia::Pixmap) -> Result<Vec<u8>, ExportError> {
    // tiny-skia stores premultiplied pixels; PNG wants straight alpha.
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }

    let mut buffer = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buffer, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder
            .write_header()
            .map_err(|err| ExportError::Encode(err.to_string()))?
            .write_image_data(&rgba)
            .map_err(|err| ExportError::Encode(err.to_string()))?;
    }

    Ok(buffer)
}

/// Saves exports into a directory (by default `<data dir>/exports`).
#[derive(Debug, Clone)]
pub struct DirectoryDownload {
    dir: PathBuf,
}

impl DirectoryDownload {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn in_data_dir() -> Result<Self, ExportError> {
        let dirs = directories::ProjectDirs::from("dev", "SDE Wrapped", "SDE Wrapped")
            .ok_or_else(|| ExportError::Deliver("Unable to determine export directory".into()))?;
        Ok(Self::new(dirs.data_dir().join("exports")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir).map_err(|err| ExportError::Deliver(err.to_string()))?;
        let path = self.dir.join(filename);
        let mut file = fs::File::create(&path).map_err(|err| ExportError::Deliver(err.to_string()))?;
        file.write_all(bytes)
            .map_err(|err| ExportError::Deliver(err.to_string()))?;
        Ok(path)
    }
}

impl DownloadSink for DirectoryDownload {
    fn deliver<'a>(
        &'a self,
        filename: &'a str,
        _mime: &'a str,
        bytes: Vec<u8>,
    ) -> LocalBoxFuture<'a, Result<Delivery, ExportError>> {
        future::ready(self.write(filename, &bytes).map(Delivery::Saved)).boxed_local()
    }
}
