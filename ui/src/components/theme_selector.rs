use dioxus::prelude::*;

use crate::t;
use crate::theme::Theme;

/// One toggle button per theme; exactly one is pressed.
#[component]
pub fn ThemeSelector(selected: Theme, on_select: EventHandler<Theme>) -> Element {
    rsx! {
        div {
            class: "theme-selector",
            role: "group",
            aria_label: t!("theme-picker-label"),
            for theme in Theme::ALL {
                button {
                    key: "{theme}",
                    r#type: "button",
                    class: if theme == selected { "theme-selector__option theme-selector__option--active" } else { "theme-selector__option" },
                    aria_pressed: if theme == selected { "true" } else { "false" },
                    onclick: move |_| on_select.call(theme),
                    {theme.label()}
                }
            }
        }
    }
}
