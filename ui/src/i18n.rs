//! Internationalization for `sde-wrapped-ui`.
//!
//! Messages live in Fluent files embedded at compile time:
//! ```text
//! i18n.toml
//! i18n/
//!   en-US/sde-wrapped-ui.ftl   (fallback/reference)
//!   es-ES/sde-wrapped-ui.ftl
//! ```
//!
//! Call [`init`] once (it is idempotent), then look messages up with `t!`:
//! ```ignore
//! crate::i18n::init();
//! let label = t!("download-card");
//! ```
//!
//! Web builds pick the language from `navigator.languages`, native builds from
//! the OS locale list. [`set_language`] switches at runtime.
use std::sync::Once;

use i18n_embed::fluent::FluentLanguageLoader;
use once_cell::sync::Lazy;
use rust_embed::Embed;
use unic_langid::LanguageIdentifier;

pub use i18n_embed_fl::fl;

/// Shorthand for `fl!` against the shared [`LOADER`].
#[macro_export]
macro_rules! t {
    ($key:literal) => {
        $crate::i18n::fl!(&*$crate::i18n::LOADER, $key)
    };
    ($key:literal, $( $arg:ident = $value:expr ),+ $(,)?) => {
        $crate::i18n::fl!(&*$crate::i18n::LOADER, $key, $( $arg = $value ),+ )
    };
}

/// Fluent domain; the fallback file is `i18n/en-US/{DOMAIN}.ftl`.
const DOMAIN: &str = "sde-wrapped-ui";

#[derive(Embed)]
#[folder = "i18n"]
struct Localizations;

pub static LOADER: Lazy<FluentLanguageLoader> = Lazy::new(|| {
    let fallback: LanguageIdentifier = "en-US".parse().expect("valid fallback language identifier");
    FluentLanguageLoader::new(DOMAIN, fallback)
});

static INIT: Once = Once::new();

/// Load the bundles for the user's preferred languages (idempotent).
pub fn init() {
    INIT.call_once(|| {
        let requested = requested_languages();
        if let Err(err) = i18n_embed::select(&*LOADER, &Localizations, &requested) {
            tracing::warn!("i18n: failed selecting languages ({err}); using fallback");
        }
    });
}

/// Switch language at runtime. Tags that do not parse, or that name a
/// language without an embedded bundle, leave the current language in place.
pub fn set_language(tag: &str) -> Result<(), i18n_embed::I18nEmbedError> {
    let Ok(lang) = tag.parse::<LanguageIdentifier>() else {
        return Ok(());
    };
    if !available_languages().iter().any(|bundled| *bundled == lang.to_string()) {
        tracing::debug!("i18n: no bundle for {lang}; keeping current language");
        return Ok(());
    }
    i18n_embed::select(&*LOADER, &Localizations, &[lang]).map(|_| ())
}

/// Embedded language tags, sorted.
pub fn available_languages() -> Vec<String> {
    let mut langs = Localizations::iter()
        .filter_map(|path| path.split('/').next().map(str::to_string))
        .collect::<Vec<_>>();
    langs.sort();
    langs.dedup();
    langs
}

#[cfg(target_arch = "wasm32")]
fn requested_languages() -> Vec<LanguageIdentifier> {
    i18n_embed::WebLanguageRequester::requested_languages()
}

#[cfg(not(target_arch = "wasm32"))]
fn requested_languages() -> Vec<LanguageIdentifier> {
    i18n_embed::DesktopLanguageRequester::requested_languages()
}
