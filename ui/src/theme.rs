//! Card themes and the backgrounds they map to.

use std::fmt;
use std::str::FromStr;

use dioxus::prelude::*;
use thiserror::Error;

const BATMAN_ART: Asset = asset!("/assets/themes/batman.svg");
const SUPERMAN_ART: Asset = asset!("/assets/themes/superman.svg");

const BATMAN_SOURCE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/themes/batman.svg"
));
const SUPERMAN_SOURCE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/themes/superman.svg"
));

/// Darkening layer painted over every artwork background.
pub const ARTWORK_OVERLAY: Color = Color::rgba(0, 0, 0, 0.75);

/// sRGB color with a straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f32,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    pub const fn rgba(r: u8, g: u8, b: u8, alpha: f32) -> Self {
        Self { r, g, b, alpha }
    }

    /// `#rrggbb`, alpha dropped.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.alpha)
    }

    pub fn alpha_u8(&self) -> u8 {
        (self.alpha.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

/// Background artwork shipped with the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artwork {
    Batman,
    Superman,
}

impl Artwork {
    /// Stable identifier, also used to key loaded image data during export.
    pub fn id(self) -> &'static str {
        match self {
            Artwork::Batman => "batman",
            Artwork::Superman => "superman",
        }
    }

    /// Bundled asset URL served to the browser.
    pub fn url(self) -> String {
        match self {
            Artwork::Batman => BATMAN_ART.to_string(),
            Artwork::Superman => SUPERMAN_ART.to_string(),
        }
    }

    /// The same artwork compiled into the binary.
    pub fn source(self) -> &'static str {
        match self {
            Artwork::Batman => BATMAN_SOURCE,
            Artwork::Superman => SUPERMAN_SOURCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Background {
    Solid(Color),
    Artwork { artwork: Artwork, overlay: Color },
}

/// Visual presentation of the card. Closed set; defaults to `Classic`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Theme {
    #[default]
    Classic,
    Batman,
    Superman,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Classic, Theme::Batman, Theme::Superman];

    /// Lowercase identifier used in filenames and the card footer.
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Classic => "classic",
            Theme::Batman => "batman",
            Theme::Superman => "superman",
        }
    }

    pub fn background(self) -> Background {
        match self {
            Theme::Classic => Background::Solid(Color::rgb(0x11, 0x11, 0x11)),
            Theme::Batman => Background::Artwork {
                artwork: Artwork::Batman,
                overlay: ARTWORK_OVERLAY,
            },
            Theme::Superman => Background::Artwork {
                artwork: Artwork::Superman,
                overlay: ARTWORK_OVERLAY,
            },
        }
    }

    /// Localized button label.
    pub fn label(self) -> String {
        match self {
            Theme::Classic => crate::t!("theme-classic"),
            Theme::Batman => crate::t!("theme-batman"),
            Theme::Superman => crate::t!("theme-superman"),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme `{0}` (expected classic, batman or superman)")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str() == raw)
            .ok_or_else(|| UnknownTheme(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_classic() {
        assert_eq!(Theme::default(), Theme::Classic);
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for theme in Theme::ALL {
            assert_eq!(theme.as_str().parse::<Theme>(), Ok(theme));
        }
    }

    #[test]
    fn unknown_names_fail_loudly() {
        let err = "joker".parse::<Theme>().unwrap_err();
        assert_eq!(err, UnknownTheme("joker".into()));
        assert!("Classic".parse::<Theme>().is_err());
    }

    #[test]
    fn classic_is_a_flat_color() {
        assert_eq!(
            Theme::Classic.background(),
            Background::Solid(Color::rgb(0x11, 0x11, 0x11))
        );
    }

    #[test]
    fn image_themes_share_the_same_overlay() {
        for theme in [Theme::Batman, Theme::Superman] {
            match theme.background() {
                Background::Artwork { artwork, overlay } => {
                    assert_eq!(artwork.id(), theme.as_str());
                    assert!(artwork.source().contains("<svg"));
                    assert_eq!(overlay, ARTWORK_OVERLAY);
                }
                other => panic!("{theme} should use artwork, got {other:?}"),
            }
        }
    }

    #[test]
    fn color_formats() {
        let color = Color::rgba(17, 17, 17, 0.75);
        assert_eq!(color.hex(), "#111111");
        assert_eq!(color.css(), "rgba(17, 17, 17, 0.75)");
        assert_eq!(color.alpha_u8(), 191);
    }
}
