use std::cell::OnceCell;
use std::rc::Rc;

use dioxus::prelude::*;

use super::{
    Delivery, DownloadSink, ExportError, Exporter, ImageLoader, PlatformExporter, Rasterizer,
    Timer,
};
use crate::card::CardScene;
use crate::config::AppConfig;
use crate::t;
use crate::theme::Theme;

/// Built on the first download and kept for the life of the panel, so font
/// loading and directory lookup happen once.
type SharedExporter = Rc<OnceCell<Result<PlatformExporter, ExportError>>>;

#[derive(Clone, Debug, PartialEq)]
enum ExportStatus {
    Idle,
    Working,
    Done(String),
    Error(String),
}

/// Download button for the card currently on screen.
#[component]
pub fn ExportPanel(scene: CardScene) -> Element {
    let config = try_use_context::<AppConfig>().unwrap_or_default();
    let status = use_signal(|| ExportStatus::Idle);
    let busy = use_signal(|| false);
    let exporter: SharedExporter = use_hook(|| Rc::new(OnceCell::new()));

    let feedback = match &status() {
        ExportStatus::Idle => None,
        ExportStatus::Working => Some(("export__status".to_string(), t!("export-working"))),
        ExportStatus::Done(message) => Some((
            "export__status export__status--success".to_string(),
            message.clone(),
        )),
        ExportStatus::Error(message) => Some((
            "export__status export__status--error".to_string(),
            message.clone(),
        )),
    };

    let on_download = {
        let mut status_signal = status;
        let mut busy_signal = busy;
        move |_| {
            if busy_signal() {
                return;
            }
            busy_signal.set(true);
            status_signal.set(ExportStatus::Working);

            // The theme is fixed at click time; later selections do not
            // affect this export.
            let scene = scene.clone();
            let theme = scene.theme;
            let options = config.export;
            let exporter = exporter.clone();
            spawn(async move {
                let exporter = exporter.get_or_init(|| PlatformExporter::for_platform(options));
                let outcome = run_export(exporter, &scene, theme).await;
                status_signal.set(status_for(outcome));
                busy_signal.set(false);
            });
        }
    };

    rsx! {
        div { class: "export",
            button {
                r#type: "button",
                class: "button button--primary export__button",
                disabled: busy(),
                onclick: on_download,
                {t!("download-card")}
            }

            if let Some((class_name, message)) = feedback {
                p { class: "{class_name}", role: "status", "{message}" }
            }
        }
    }
}

/// Runs one export; an exporter that could not be built reports its error
/// on every attempt.
async fn run_export<L, R, S, T>(
    exporter: &Result<Exporter<L, R, S, T>, ExportError>,
    scene: &CardScene,
    theme: Theme,
) -> Result<Delivery, ExportError>
where
    L: ImageLoader,
    R: Rasterizer,
    S: DownloadSink,
    T: Timer,
{
    match exporter {
        Ok(exporter) => exporter.export(scene, theme).await,
        Err(err) => Err(err.clone()),
    }
}

fn status_for(outcome: Result<Delivery, ExportError>) -> ExportStatus {
    match outcome {
        Ok(Delivery::Download { .. }) => ExportStatus::Done(t!("export-done")),
        Ok(Delivery::Saved(path)) => {
            ExportStatus::Done(format!("{} {}", t!("export-saved"), path.display()))
        }
        Err(err) => {
            tracing::error!("Failed to generate image: {err}");
            ExportStatus::Error(t!("export-failed"))
        }
    }
}
