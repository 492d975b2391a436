use api::{FetchOutcome, ProfileSummary};
use dioxus::prelude::*;

use crate::card::{compose, CardLabels, ImageSet};
use crate::components::ThemeSelector;
use crate::export::ExportPanel;
use crate::session::{self, GatewayHandle, WindowNavigator};
use crate::t;
use crate::theme::Theme;

/// What the page shows, derived from the profile fetch.
#[derive(Clone, Debug, PartialEq)]
pub enum ProfileState {
    Loading,
    Authenticated(ProfileSummary),
    Unauthenticated,
    /// The gateway could not be asked; carries the reason for logs.
    FetchError(String),
}

impl From<FetchOutcome> for ProfileState {
    fn from(outcome: FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Authenticated(summary) => ProfileState::Authenticated(summary),
            FetchOutcome::Unauthenticated => ProfileState::Unauthenticated,
            FetchOutcome::FetchError(err) => ProfileState::FetchError(err.to_string()),
        }
    }
}

/// Fetches the signed-in user's summary on mount and shows either the login
/// prompt or the card studio.
#[component]
pub fn WrappedPage() -> Element {
    let gateway = use_context::<GatewayHandle>();
    let mut profile = use_resource(move || {
        let gateway = gateway.clone();
        async move { ProfileState::from(gateway.fetch_wrapped().await) }
    });

    let pending = matches!(*profile.state().read(), UseResourceState::Pending);
    let state = displayed_state(pending, profile.read().clone());

    rsx! {
        WrappedScreen { state, on_retry: move |_| profile.restart() }
    }
}

/// A fetch in flight, including a retry, shows the loading state rather than
/// the previous outcome.
fn displayed_state(pending: bool, last: Option<ProfileState>) -> ProfileState {
    match last {
        Some(state) if !pending => state,
        _ => ProfileState::Loading,
    }
}

#[component]
pub fn WrappedScreen(state: ProfileState, on_retry: EventHandler<()>) -> Element {
    match state {
        ProfileState::Loading => rsx! {
            section { class: "page page-wrapped page-wrapped--loading",
                p { class: "page-wrapped__loading", role: "status", {t!("loading")} }
            }
        },
        ProfileState::Unauthenticated => rsx! {
            LoginPrompt {}
        },
        ProfileState::FetchError(_) => rsx! {
            LoginPrompt { notice: t!("fetch-error-notice"), on_retry }
        },
        ProfileState::Authenticated(summary) => rsx! {
            CardStudio { summary }
        },
    }
}

#[component]
fn LoginPrompt(notice: Option<String>, on_retry: Option<EventHandler<()>>) -> Element {
    let gateway = use_context::<GatewayHandle>();

    rsx! {
        section { class: "page page-login",
            h1 { class: "page-login__title", {t!("login-heading")} }
            p { class: "page-login__body", {t!("login-body")} }

            if let Some(notice) = notice {
                p { class: "page-login__notice", role: "alert", "{notice}" }
            }

            div { class: "page-login__actions",
                button {
                    r#type: "button",
                    class: "button button--primary",
                    onclick: move |_| session::login(&*gateway, &WindowNavigator),
                    {t!("login-button")}
                }
                if let Some(retry) = on_retry {
                    button {
                        r#type: "button",
                        class: "button button--ghost",
                        onclick: move |_| retry.call(()),
                        {t!("retry")}
                    }
                }
            }
        }
    }
}

/// The card, the theme picker and the account actions.
#[component]
fn CardStudio(summary: ProfileSummary) -> Element {
    let mut theme = use_signal(Theme::default);

    // Re-render on language switches so the card labels follow.
    let lang_code: Option<Signal<String>> = try_use_context::<Signal<String>>();
    let _lang_marker = lang_code.as_ref().map(|code| code()).unwrap_or_default();

    let labels = CardLabels::localized();
    let scene = compose(&summary, theme(), &labels);
    let markup = scene.to_svg(&ImageSet::linked(&scene)).markup;

    rsx! {
        section { class: "page page-wrapped",
            div { class: "page-wrapped__intro",
                h1 { {t!("personalize-heading")} }
                p { {t!("personalize-subtitle")} }
            }

            ThemeSelector {
                selected: theme(),
                on_select: move |next: Theme| theme.set(next),
            }

            div {
                class: "page-wrapped__card",
                "data-theme": theme().as_str(),
                dangerous_inner_html: "{markup}",
            }

            div { class: "page-wrapped__actions",
                ExportPanel { scene }
                LogoutButton {}
            }
        }
    }
}

#[component]
fn LogoutButton() -> Element {
    let gateway = use_context::<GatewayHandle>();
    let mut leaving = use_signal(|| false);

    let on_logout = move |_| {
        if leaving() {
            return;
        }
        leaving.set(true);
        let gateway = gateway.clone();
        spawn(async move {
            session::logout(&*gateway, &WindowNavigator).await;
        });
    };

    rsx! {
        button {
            r#type: "button",
            class: "button button--ghost",
            disabled: leaving(),
            onclick: on_logout,
            {t!("logout")}
        }
    }
}
