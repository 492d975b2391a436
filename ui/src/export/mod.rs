//! Card export: wait for images, rasterize, deliver.
//!
//! The ordering lives in [`Exporter::export`]; everything that touches the
//! platform (loading images, painting pixels, saving files, timers) sits
//! behind a trait so the ordering can be tested with fakes.
//!
//! ```ignore
//! let exporter = Exporter::for_platform(ExportOptions::default())?;
//! let delivery = exporter.export(&scene, Theme::Batman).await?;
//! ```

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::{self, Either, LocalBoxFuture};
use thiserror::Error;

use crate::card::{CardScene, ImageRef, ImageSet, SvgDocument};
use crate::theme::{Color, Theme};

mod panel;
pub use panel::ExportPanel;

#[cfg(not(target_arch = "wasm32"))]
mod native;
#[cfg(not(target_arch = "wasm32"))]
pub use native::{DirectoryDownload, EmbeddedImageLoader, ResvgRasterizer};

#[cfg(target_arch = "wasm32")]
mod web;
#[cfg(target_arch = "wasm32")]
pub use web::{BrowserDownload, BrowserImageLoader, CanvasRasterizer};

pub const PNG_MIME: &str = "image/png";

/// Inlines SVG source as a base64 data URL. Vector artwork stays vector, so
/// it is painted at whatever pixel ratio the export uses.
pub(crate) fn svg_data_url(source: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(source.as_bytes()))
}

/// `sde-wrapped-<theme>.png`
pub fn export_filename(theme: Theme) -> String {
    format!("sde-wrapped-{}.png", theme.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backdrop {
    /// Pixels the card does not cover stay fully transparent.
    Transparent,
    Solid(Color),
}

/// What to do when images are still loading once `image_timeout` elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTimeoutPolicy {
    /// Rasterize with whatever images have loaded.
    BestEffort,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Output pixels per CSS pixel.
    pub pixel_ratio: f32,
    pub backdrop: Backdrop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    pub pixel_ratio: f32,
    pub backdrop: Backdrop,
    pub image_timeout: Duration,
    pub on_image_timeout: ImageTimeoutPolicy,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: 3.0,
            backdrop: Backdrop::Transparent,
            image_timeout: Duration::from_secs(10),
            on_image_timeout: ImageTimeoutPolicy::BestEffort,
        }
    }
}

impl ExportOptions {
    /// Defaults, with the pixel ratio overridable at build time through
    /// `SDE_WRAPPED_PIXEL_RATIO`.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(ratio) = option_env!("SDE_WRAPPED_PIXEL_RATIO")
            .and_then(|raw| raw.trim().parse::<f32>().ok())
            .filter(|ratio| ratio.is_finite() && *ratio > 0.0)
        {
            options.pixel_ratio = ratio;
        }
        options
    }

    pub fn raster(&self) -> RasterOptions {
        RasterOptions {
            pixel_ratio: self.pixel_ratio,
            backdrop: self.backdrop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    #[error("image `{id}` failed to load: {reason}")]
    ImageLoad { id: &'static str, reason: String },

    #[error("images were still loading after {0:?}")]
    ImageTimeout(Duration),

    #[error("rasterization failed: {0}")]
    Rasterize(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("could not deliver the file: {0}")]
    Deliver(String),
}

/// Where an exported file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the browser as a download.
    Download { filename: String },
    Saved(PathBuf),
}

/// Loads one image and yields an `href` usable inside a standalone SVG
/// (normally a data URL).
pub trait ImageLoader {
    fn load(&self, image: ImageRef) -> LocalBoxFuture<'static, Result<String, ExportError>>;
}

/// Paints an SVG document into PNG bytes.
pub trait Rasterizer {
    fn rasterize<'a>(
        &'a self,
        document: &'a SvgDocument,
        options: RasterOptions,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, ExportError>>;
}

/// Hands finished bytes to the user.
pub trait DownloadSink {
    fn deliver<'a>(
        &'a self,
        filename: &'a str,
        mime: &'a str,
        bytes: Vec<u8>,
    ) -> LocalBoxFuture<'a, Result<Delivery, ExportError>>;
}

pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Timer backed by the platform event loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformTimer;

impl Timer for PlatformTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(crate::core::timing::sleep(duration))
    }
}

#[cfg(target_arch = "wasm32")]
pub type PlatformExporter = Exporter<BrowserImageLoader, CanvasRasterizer, BrowserDownload>;

#[cfg(not(target_arch = "wasm32"))]
pub type PlatformExporter = Exporter<EmbeddedImageLoader, ResvgRasterizer, DirectoryDownload>;

pub struct Exporter<L, R, S, T = PlatformTimer> {
    loader: L,
    rasterizer: R,
    sink: S,
    timer: T,
    options: ExportOptions,
}

impl PlatformExporter {
    /// Exporter wired to the collaborators of the current target.
    pub fn for_platform(options: ExportOptions) -> Result<Self, ExportError> {
        #[cfg(target_arch = "wasm32")]
        {
            Ok(Exporter::new(
                BrowserImageLoader,
                CanvasRasterizer,
                BrowserDownload,
                PlatformTimer,
                options,
            ))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Ok(Exporter::new(
                EmbeddedImageLoader,
                ResvgRasterizer::new(),
                DirectoryDownload::in_data_dir()?,
                PlatformTimer,
                options,
            ))
        }
    }
}

impl<L, R, S, T> Exporter<L, R, S, T>
where
    L: ImageLoader,
    R: Rasterizer,
    S: DownloadSink,
    T: Timer,
{
    pub fn new(loader: L, rasterizer: R, sink: S, timer: T, options: ExportOptions) -> Self {
        Self {
            loader,
            rasterizer,
            sink,
            timer,
            options,
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export `scene` as `sde-wrapped-<theme>.png`.
    ///
    /// Rasterization does not start before every image of the scene has
    /// settled (loaded or failed) or the image timeout has elapsed.
    pub async fn export(&self, scene: &CardScene, theme: Theme) -> Result<Delivery, ExportError> {
        let images = self.settle_images(scene).await?;
        let document = scene.to_svg(&images);
        let png = self
            .rasterizer
            .rasterize(&document, self.options.raster())
            .await?;

        let filename = export_filename(theme);
        let delivery = self.sink.deliver(&filename, PNG_MIME, png).await?;
        tracing::info!(%filename, ?delivery, "card exported");
        Ok(delivery)
    }

    async fn settle_images(&self, scene: &CardScene) -> Result<ImageSet, ExportError> {
        let wanted = scene.images();
        if wanted.is_empty() {
            return Ok(ImageSet::default());
        }

        let settled = Rc::new(RefCell::new(ImageSet::default()));
        let loads = wanted.iter().map(|image| {
            let image = *image;
            let settled = settled.clone();
            let load = self.loader.load(image);
            async move {
                match load.await {
                    Ok(href) => settled.borrow_mut().insert(image.id(), href),
                    Err(err) => tracing::warn!("Skipping image: {err}"),
                }
            }
        });

        let all_loaded = Box::pin(future::join_all(loads));
        let deadline = self.timer.sleep(self.options.image_timeout);

        if let Either::Right(_) = future::select(all_loaded, deadline).await {
            let timeout = self.options.image_timeout;
            match self.options.on_image_timeout {
                ImageTimeoutPolicy::Fail => return Err(ExportError::ImageTimeout(timeout)),
                ImageTimeoutPolicy::BestEffort => tracing::warn!(
                    loaded = settled.borrow().len(),
                    wanted = wanted.len(),
                    "images still loading after {timeout:?}; exporting without them"
                ),
            }
        }

        let images = settled.borrow().clone();
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::compose;
    use crate::card::tests::{sample_labels, sample_summary};
    use futures::channel::oneshot;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;
    use futures::FutureExt;

    type Shared<T> = Rc<RefCell<T>>;

    /// Loader whose images resolve only when the test says so.
    #[derive(Default)]
    struct GatedLoader {
        gates: Shared<Vec<oneshot::Sender<Result<String, ExportError>>>>,
    }

    impl ImageLoader for GatedLoader {
        fn load(&self, _image: ImageRef) -> LocalBoxFuture<'static, Result<String, ExportError>> {
            let (tx, rx) = oneshot::channel();
            self.gates.borrow_mut().push(tx);
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(ExportError::Rasterize("gate dropped".into())))
            }
            .boxed_local()
        }
    }

    struct ReadyLoader;

    impl ImageLoader for ReadyLoader {
        fn load(&self, image: ImageRef) -> LocalBoxFuture<'static, Result<String, ExportError>> {
            future::ready(Ok(format!("data:test,{}", image.id()))).boxed_local()
        }
    }

    #[derive(Default)]
    struct RecordingRasterizer {
        calls: Shared<Vec<(SvgDocument, RasterOptions)>>,
        fail: bool,
    }

    impl Rasterizer for RecordingRasterizer {
        fn rasterize<'a>(
            &'a self,
            document: &'a SvgDocument,
            options: RasterOptions,
        ) -> LocalBoxFuture<'a, Result<Vec<u8>, ExportError>> {
            self.calls.borrow_mut().push((document.clone(), options));
            let result = if self.fail {
                Err(ExportError::Rasterize("tainted canvas".into()))
            } else {
                Ok(b"png".to_vec())
            };
            future::ready(result).boxed_local()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        files: Shared<Vec<(String, String, Vec<u8>)>>,
    }

    impl DownloadSink for RecordingSink {
        fn deliver<'a>(
            &'a self,
            filename: &'a str,
            mime: &'a str,
            bytes: Vec<u8>,
        ) -> LocalBoxFuture<'a, Result<Delivery, ExportError>> {
            self.files
                .borrow_mut()
                .push((filename.to_string(), mime.to_string(), bytes));
            future::ready(Ok(Delivery::Download {
                filename: filename.to_string(),
            }))
            .boxed_local()
        }
    }

    /// Timer that fires only when the test drops or fires its trigger.
    #[derive(Default)]
    struct ManualTimer {
        triggers: Shared<Vec<oneshot::Sender<()>>>,
    }

    impl Timer for ManualTimer {
        fn sleep(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
            let (tx, rx) = oneshot::channel();
            self.triggers.borrow_mut().push(tx);
            async move {
                if rx.await.is_err() {
                    future::pending::<()>().await;
                }
            }
            .boxed_local()
        }
    }

    fn exporter<L: ImageLoader>(
        loader: L,
        options: ExportOptions,
    ) -> (
        Exporter<L, RecordingRasterizer, RecordingSink, ManualTimer>,
        Shared<Vec<(SvgDocument, RasterOptions)>>,
        Shared<Vec<(String, String, Vec<u8>)>>,
        Shared<Vec<oneshot::Sender<()>>>,
    ) {
        let rasterizer = RecordingRasterizer::default();
        let sink = RecordingSink::default();
        let timer = ManualTimer::default();
        let calls = rasterizer.calls.clone();
        let files = sink.files.clone();
        let triggers = timer.triggers.clone();
        (
            Exporter::new(loader, rasterizer, sink, timer, options),
            calls,
            files,
            triggers,
        )
    }

    #[test]
    fn filename_carries_the_theme() {
        assert_eq!(export_filename(Theme::Batman), "sde-wrapped-batman.png");
        assert_eq!(export_filename(Theme::Classic), "sde-wrapped-classic.png");
        assert_eq!(export_filename(Theme::Superman), "sde-wrapped-superman.png");
    }

    #[test]
    fn artwork_is_inlined_as_vector_source() {
        for artwork in [crate::theme::Artwork::Batman, crate::theme::Artwork::Superman] {
            let href = svg_data_url(artwork.source());
            let payload = href.strip_prefix("data:image/svg+xml;base64,").unwrap();
            let decoded = String::from_utf8(STANDARD.decode(payload).unwrap()).unwrap();
            assert_eq!(decoded, artwork.source());
            assert!(decoded.contains("<svg"), "{artwork:?} is not SVG markup");
        }
    }

    #[test]
    fn defaults_are_3x_transparent_best_effort() {
        let options = ExportOptions::default();
        assert_eq!(options.pixel_ratio, 3.0);
        assert_eq!(options.backdrop, Backdrop::Transparent);
        assert_eq!(options.on_image_timeout, ImageTimeoutPolicy::BestEffort);
    }

    #[test]
    fn exports_scene_without_images_immediately() {
        let (exporter, calls, files, _) = exporter(ReadyLoader, ExportOptions::default());
        let scene = compose(&sample_summary(), Theme::Classic, &sample_labels());

        let delivery = block_on(exporter.export(&scene, Theme::Classic)).unwrap();

        assert_eq!(
            delivery,
            Delivery::Download {
                filename: "sde-wrapped-classic.png".into()
            }
        );
        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.pixel_ratio, 3.0);
        assert_eq!(calls[0].1.backdrop, Backdrop::Transparent);
        let files = files.borrow();
        assert_eq!(files[0].1, PNG_MIME);
        assert_eq!(files[0].2, b"png".to_vec());
    }

    #[test]
    fn rasterization_waits_for_a_slow_image() {
        let loader = GatedLoader::default();
        let gates = loader.gates.clone();
        let (exporter, calls, files, _) = exporter(loader, ExportOptions::default());
        let scene = compose(&sample_summary(), Theme::Batman, &sample_labels());

        let mut pool = LocalPool::new();
        let exporter = Rc::new(exporter);
        let result: Shared<Option<Result<Delivery, ExportError>>> = Rc::default();
        {
            let exporter = exporter.clone();
            let result = result.clone();
            pool.spawner()
                .spawn_local(async move {
                    let outcome = exporter.export(&scene, Theme::Batman).await;
                    *result.borrow_mut() = Some(outcome);
                })
                .unwrap();
        }

        pool.run_until_stalled();
        assert_eq!(gates.borrow().len(), 1, "image load should have started");
        assert!(calls.borrow().is_empty(), "rasterized before image loaded");
        assert!(files.borrow().is_empty());

        let gate = gates.borrow_mut().pop().unwrap();
        gate.send(Ok("data:image/png;base64,BAT".into())).unwrap();
        pool.run_until_stalled();

        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.markup.contains("data:image/png;base64,BAT"));
        assert_eq!(files.borrow()[0].0, "sde-wrapped-batman.png");
        assert!(matches!(*result.borrow(), Some(Ok(_))));
    }

    #[test]
    fn failed_image_still_exports_without_it() {
        let loader = GatedLoader::default();
        let gates = loader.gates.clone();
        let (exporter, calls, _, _) = exporter(loader, ExportOptions::default());
        let scene = compose(&sample_summary(), Theme::Superman, &sample_labels());

        let mut pool = LocalPool::new();
        let result: Shared<Option<Result<Delivery, ExportError>>> = Rc::default();
        {
            let result = result.clone();
            pool.spawner()
                .spawn_local(async move {
                    *result.borrow_mut() = Some(exporter.export(&scene, Theme::Superman).await);
                })
                .unwrap();
        }

        pool.run_until_stalled();
        let gate = gates.borrow_mut().pop().unwrap();
        gate.send(Err(ExportError::ImageLoad {
            id: "superman",
            reason: "404".into(),
        }))
        .unwrap();
        pool.run_until_stalled();

        assert!(matches!(*result.borrow(), Some(Ok(_))));
        let calls = calls.borrow();
        assert!(!calls[0].0.markup.contains("<image"));
    }

    #[test]
    fn timeout_proceeds_best_effort() {
        let loader = GatedLoader::default();
        let gates = loader.gates.clone();
        let (exporter, calls, files, triggers) = exporter(loader, ExportOptions::default());
        let scene = compose(&sample_summary(), Theme::Batman, &sample_labels());

        let mut pool = LocalPool::new();
        let result: Shared<Option<Result<Delivery, ExportError>>> = Rc::default();
        {
            let result = result.clone();
            pool.spawner()
                .spawn_local(async move {
                    *result.borrow_mut() = Some(exporter.export(&scene, Theme::Batman).await);
                })
                .unwrap();
        }

        pool.run_until_stalled();
        assert!(calls.borrow().is_empty());

        // The image never arrives; fire the deadline instead.
        triggers.borrow_mut().pop().unwrap().send(()).unwrap();
        pool.run_until_stalled();

        assert_eq!(calls.borrow().len(), 1);
        assert!(!calls.borrow()[0].0.markup.contains("<image"));
        assert_eq!(files.borrow()[0].0, "sde-wrapped-batman.png");
        assert!(matches!(*result.borrow(), Some(Ok(_))));
        drop(gates);
    }

    #[test]
    fn timeout_can_fail_the_export() {
        let loader = GatedLoader::default();
        let _gates = loader.gates.clone();
        let options = ExportOptions {
            on_image_timeout: ImageTimeoutPolicy::Fail,
            image_timeout: Duration::from_secs(2),
            ..ExportOptions::default()
        };
        let (exporter, calls, files, triggers) = exporter(loader, options);
        let scene = compose(&sample_summary(), Theme::Batman, &sample_labels());

        let mut pool = LocalPool::new();
        let result: Shared<Option<Result<Delivery, ExportError>>> = Rc::default();
        {
            let result = result.clone();
            pool.spawner()
                .spawn_local(async move {
                    *result.borrow_mut() = Some(exporter.export(&scene, Theme::Batman).await);
                })
                .unwrap();
        }

        pool.run_until_stalled();
        triggers.borrow_mut().pop().unwrap().send(()).unwrap();
        pool.run_until_stalled();

        assert_eq!(
            *result.borrow(),
            Some(Err(ExportError::ImageTimeout(Duration::from_secs(2))))
        );
        assert!(calls.borrow().is_empty());
        assert!(files.borrow().is_empty());
    }

    #[test]
    fn rasterizer_failure_skips_delivery() {
        let rasterizer = RecordingRasterizer {
            fail: true,
            ..Default::default()
        };
        let sink = RecordingSink::default();
        let files = sink.files.clone();
        let exporter = Exporter::new(
            ReadyLoader,
            rasterizer,
            sink,
            ManualTimer::default(),
            ExportOptions::default(),
        );
        let scene = compose(&sample_summary(), Theme::Batman, &sample_labels());

        let err = block_on(exporter.export(&scene, Theme::Batman)).unwrap_err();

        assert_eq!(err, ExportError::Rasterize("tainted canvas".into()));
        assert!(files.borrow().is_empty());
    }

    #[test]
    fn configured_ratio_and_backdrop_reach_the_rasterizer() {
        let options = ExportOptions {
            pixel_ratio: 2.0,
            backdrop: Backdrop::Solid(Color::rgb(0, 0, 0)),
            ..ExportOptions::default()
        };
        let (exporter, calls, _, _) = exporter(ReadyLoader, options);
        let scene = compose(&sample_summary(), Theme::Superman, &sample_labels());

        block_on(exporter.export(&scene, Theme::Superman)).unwrap();

        let calls = calls.borrow();
        assert_eq!(
            calls[0].1,
            RasterOptions {
                pixel_ratio: 2.0,
                backdrop: Backdrop::Solid(Color::rgb(0, 0, 0)),
            }
        );
        assert!(calls[0].0.markup.contains("data:test,superman"));
    }
}
