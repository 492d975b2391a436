//! Shared UI crate for SDE Wrapped: card composition, themes, export and the
//! views the launchers mount.

use dioxus::prelude::*;

pub mod card;
pub mod config;
pub mod core;
pub mod export;
pub mod i18n;
pub mod session;
pub mod theme;
pub mod views;

pub mod components {
    mod app_header;
    pub use app_header::AppHeader;

    mod theme_selector;
    pub use theme_selector::ThemeSelector;
}

/// Unified stylesheet shared by every launcher.
pub const MAIN_CSS: Asset = asset!("/assets/theme/main.css");
