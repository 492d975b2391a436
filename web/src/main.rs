use dioxus::prelude::*;

use api::HttpGateway;
use ui::components::AppHeader;
use ui::config::AppConfig;
use ui::session::GatewayHandle;
use ui::views::WrappedPage;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(WebShell)]
    #[route("/")]
    WrappedPage {},
}

const FAVICON: Asset = asset!("/assets/favicon.svg");

fn main() {
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    ui::i18n::init();

    let config = use_hook(AppConfig::from_env);
    use_context_provider(|| config.clone());

    // Global language code; the header updates it on selection.
    let lang_code = use_signal(|| "en-US".to_string());
    use_context_provider(|| lang_code);

    let gateway = use_hook(|| {
        tracing::info!(gateway = %config.gateway.base_url(), "starting SDE Wrapped");
        HttpGateway::new(config.gateway.clone())
            .map(GatewayHandle::new)
            .map_err(|err| err.to_string())
    });

    let body = match gateway {
        Ok(handle) => rsx! {
            // Keyed by language so the routed subtree remounts on change.
            div {
                key: "{lang_code()}",
                Session { handle }
            }
        },
        Err(err) => {
            tracing::error!("gateway client unavailable: {err}");
            rsx! {
                p { class: "page page--fatal", role: "alert", "{err}" }
            }
        }
    };

    rsx! {
        document::Link { rel: "icon", href: FAVICON }
        document::Link { rel: "stylesheet", href: ui::MAIN_CSS }

        {body}
    }
}

#[component]
fn Session(handle: GatewayHandle) -> Element {
    use_context_provider(|| handle.clone());

    rsx! {
        Router::<Route> {}
    }
}

#[component]
fn WebShell() -> Element {
    rsx! {
        AppHeader {}
        main { class: "app-main",
            Outlet::<Route> {}
        }
    }
}
