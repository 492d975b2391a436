//! Login and logout flows.
//!
//! Both end in a full-page navigation: the OAuth dance and cookie teardown
//! happen on the gateway, the page just has to go there and come back.

use std::ops::Deref;
use std::rc::Rc;

use api::SessionGateway;

/// Full-page navigation primitives.
pub trait Navigator {
    fn navigate(&self, url: &str);
    fn reload(&self);
}

/// Navigates the current browser window.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowNavigator;

#[cfg(target_arch = "wasm32")]
impl Navigator for WindowNavigator {
    fn navigate(&self, url: &str) {
        let Some(window) = web_sys::window() else {
            tracing::error!("window unavailable; cannot navigate to {url}");
            return;
        };
        if window.location().set_href(url).is_err() {
            tracing::error!("navigation to {url} was rejected");
        }
    }

    fn reload(&self) {
        let Some(window) = web_sys::window() else {
            tracing::error!("window unavailable; cannot reload");
            return;
        };
        if window.location().reload().is_err() {
            tracing::error!("reload was rejected");
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Navigator for WindowNavigator {
    fn navigate(&self, url: &str) {
        // serde_json gives a correctly quoted JS string literal.
        let target = serde_json::Value::from(url).to_string();
        let _ = dioxus::document::eval(&format!("window.location.href = {target};"));
    }

    fn reload(&self) {
        let _ = dioxus::document::eval("window.location.reload();");
    }
}

/// Shared gateway client, provided as context at the app root.
#[derive(Clone)]
pub struct GatewayHandle(Rc<dyn SessionGateway>);

impl GatewayHandle {
    pub fn new(gateway: impl SessionGateway + 'static) -> Self {
        Self(Rc::new(gateway))
    }
}

impl PartialEq for GatewayHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for GatewayHandle {
    type Target = dyn SessionGateway;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

/// Send the user to the gateway's OAuth entry point.
pub fn login<G, N>(gateway: &G, navigator: &N)
where
    G: SessionGateway + ?Sized,
    N: Navigator + ?Sized,
{
    let url = gateway.login_url();
    tracing::info!(%url, "starting login");
    navigator.navigate(&url);
}

/// End the session and reload the page.
///
/// The reload happens whatever the gateway answered, so the page always
/// re-evaluates its authentication state.
pub async fn logout<G, N>(gateway: &G, navigator: &N)
where
    G: SessionGateway + ?Sized,
    N: Navigator + ?Sized,
{
    if let Err(err) = gateway.logout().await {
        tracing::warn!("logout request failed: {err}");
    }
    navigator.reload();
}
