//! Browser export collaborators: `<img>` decoding, an offscreen canvas and a
//! hidden anchor for the download.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::{FutureExt, LocalBoxFuture};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobPropertyBag, CanvasRenderingContext2d, Document, HtmlAnchorElement,
    HtmlCanvasElement, HtmlImageElement, Url,
};

use super::{
    svg_data_url, Backdrop, Delivery, DownloadSink, ExportError, ImageLoader, RasterOptions,
    Rasterizer, PNG_MIME,
};
use crate::card::{ImageRef, SvgDocument};

fn document() -> Result<Document, String> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| "Document unavailable".to_string())
}

fn canvas(width: u32, height: u32) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), String> {
    let canvas: HtmlCanvasElement = document()?
        .create_element("canvas")
        .map_err(|_| "Unable to create canvas")?
        .dyn_into()
        .map_err(|_| "Canvas cast failed")?;
    canvas.set_width(width);
    canvas.set_height(height);

    let context: CanvasRenderingContext2d = canvas
        .get_context("2d")
        .map_err(|_| "Canvas context unavailable")?
        .ok_or("Canvas context missing")?
        .dyn_into()
        .map_err(|_| "Context cast failed")?;
    Ok((canvas, context))
}

/// Resolves once the browser has fully decoded `src`.
async fn decoded_image(src: &str) -> Result<HtmlImageElement, String> {
    let image = HtmlImageElement::new().map_err(|_| "Unable to create image")?;
    image.set_src(src);
    JsFuture::from(image.decode())
        .await
        .map_err(|_| format!("Image decode failed for {src}"))?;
    Ok(image)
}

/// Waits for the browser to decode the bundled artwork, then inlines its SVG
/// source so the exported document has no external references. The artwork
/// is never rasterized here; the canvas paints it at the export pixel ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserImageLoader;

impl BrowserImageLoader {
    async fn inline(url: String, source: &'static str) -> Result<String, String> {
        decoded_image(&url).await?;
        Ok(svg_data_url(source))
    }
}

impl ImageLoader for BrowserImageLoader {
    fn load(&self, image: ImageRef) -> LocalBoxFuture<'static, Result<String, ExportError>> {
        let url = image.artwork.url();
        let source = image.artwork.source();
        async move {
            Self::inline(url, source).await.map_err(|reason| ExportError::ImageLoad {
                id: image.id(),
                reason,
            })
        }
        .boxed_local()
    }
}

/// Draws the SVG document onto a canvas scaled by the pixel ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanvasRasterizer;

impl CanvasRasterizer {
    async fn paint(document: &SvgDocument, options: RasterOptions) -> Result<Vec<u8>, String> {
        let ratio = f64::from(options.pixel_ratio);
        if !(ratio.is_finite() && ratio > 0.0) {
            return Err(format!("invalid pixel ratio {ratio}"));
        }

        let opts = BlobPropertyBag::new();
        opts.set_type("image/svg+xml");
        let parts = js_sys::Array::new();
        parts.push(&JsValue::from_str(&document.markup));
        let blob = Blob::new_with_str_sequence_and_options(&parts, &opts)
            .map_err(|_| "Unable to build SVG blob".to_string())?;
        let url = Url::create_object_url_with_blob(&blob)
            .map_err(|_| "Unable to create SVG URL".to_string())?;

        let image = decoded_image(&url).await;
        Url::revoke_object_url(&url).ok();
        let image = image?;

        let width = (f64::from(document.width) * ratio).ceil() as u32;
        let height = (f64::from(document.height) * ratio).ceil() as u32;
        let (canvas, context) = canvas(width, height)?;

        if let Backdrop::Solid(color) = options.backdrop {
            context.set_fill_style_str(&color.css());
            context.fill_rect(0.0, 0.0, f64::from(width), f64::from(height));
        }

        context
            .draw_image_with_html_image_element_and_dw_and_dh(
                &image,
                0.0,
                0.0,
                f64::from(width),
                f64::from(height),
            )
            .map_err(|_| "Unable to draw image")?;

        let data_url = canvas
            .to_data_url_with_type(PNG_MIME)
            .map_err(|_| "Unable to serialise canvas")?;
        let payload = data_url.split(',').nth(1).ok_or("Malformed data URL")?;
        STANDARD
            .decode(payload)
            .map_err(|_| "PNG decode failed".to_string())
    }
}

impl Rasterizer for CanvasRasterizer {
    fn rasterize<'a>(
        &'a self,
        document: &'a SvgDocument,
        options: RasterOptions,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, ExportError>> {
        async move {
            Self::paint(document, options)
                .await
                .map_err(ExportError::Rasterize)
        }
        .boxed_local()
    }
}

/// Triggers a browser download through a temporary object URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserDownload;

impl BrowserDownload {
    fn trigger(filename: &str, mime: &str, bytes: &[u8]) -> Result<(), String> {
        let array = js_sys::Uint8Array::from(bytes);
        let parts = js_sys::Array::new();
        parts.push(&array.buffer());

        let opts = BlobPropertyBag::new();
        opts.set_type(mime);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &opts)
            .map_err(|_| "Failed to create blob".to_string())?;
        let url = Url::create_object_url_with_blob(&blob)
            .map_err(|_| "Unable to create download".to_string())?;

        let document = document()?;
        let anchor: HtmlAnchorElement = document
            .create_element("a")
            .map_err(|_| "Unable to create anchor")?
            .dyn_into()
            .map_err(|_| "Anchor cast failed")?;
        anchor.set_href(&url);
        anchor.set_download(filename);
        anchor.style().set_property("display", "none").ok();

        document
            .body()
            .ok_or("Missing body")?
            .append_child(&anchor)
            .ok();
        anchor.click();
        anchor.remove();
        Url::revoke_object_url(&url).ok();
        Ok(())
    }
}

impl DownloadSink for BrowserDownload {
    fn deliver<'a>(
        &'a self,
        filename: &'a str,
        mime: &'a str,
        bytes: Vec<u8>,
    ) -> LocalBoxFuture<'a, Result<Delivery, ExportError>> {
        let result = Self::trigger(filename, mime, &bytes)
            .map(|()| Delivery::Download {
                filename: filename.to_string(),
            })
            .map_err(ExportError::Deliver);
        futures::future::ready(result).boxed_local()
    }
}
