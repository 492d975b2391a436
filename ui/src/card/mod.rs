//! Card composition.
//!
//! `compose` turns a profile summary and a theme into a [`CardScene`]: a flat,
//! positioned description of everything painted on the card. The scene is the
//! single source for both the on-screen card and the exported PNG (see
//! [`svg`]), so what the user downloads is what they looked at.
//!
//! Composition is pure and does no data-driven branching: every field of the
//! summary is rendered verbatim, exactly once.

mod svg;
pub use svg::{ImageSet, SvgDocument};

use api::ProfileSummary;

use crate::theme::{Artwork, Background, Color, Theme};

/// Year printed in the kicker line.
pub const WRAPPED_YEAR: u16 = 2025;

/// Site label printed in the footer.
pub const SITE_LABEL: &str = "sdewrapped.dev";

pub const CARD_WIDTH: f32 = 420.0;
pub const CARD_HEIGHT: f32 = 772.0;
pub const CARD_RADIUS: f32 = 24.0;

const PADDING: f32 = 32.0;
const TITLE_LINE_H: f32 = 42.0;
const STAT_STEP: f32 = 60.0;
const STAT_VALUE_OFFSET: f32 = 28.0;

const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
const GRAY_300: Color = Color::rgb(0xd1, 0xd5, 0xdb);
const GRAY_400: Color = Color::rgb(0x9c, 0xa3, 0xaf);
const GRAY_500: Color = Color::rgb(0x6b, 0x72, 0x80);
const GRAY_700: Color = Color::rgb(0x37, 0x41, 0x51);

/// Static copy printed on the card. Profile values never pass through here.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLabels {
    pub kicker: String,
    pub title: [String; 3],
    pub hero: String,
    pub language: String,
    pub top_repo: String,
    pub stars: String,
    pub forks: String,
}

impl CardLabels {
    /// Labels in the currently selected language.
    pub fn localized() -> Self {
        crate::i18n::init();
        Self {
            kicker: format!("{} · {WRAPPED_YEAR}", crate::t!("card-kicker")),
            title: [
                crate::t!("card-title-line-1"),
                crate::t!("card-title-line-2"),
                crate::t!("card-title-line-3"),
            ],
            hero: crate::t!("card-hero-label"),
            language: crate::t!("stat-language"),
            top_repo: crate::t!("stat-top-repo"),
            stars: crate::t!("stat-stars"),
            forks: crate::t!("stat-forks"),
        }
    }
}

/// What a piece of text on the card is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Kicker,
    Title,
    Username,
    HeroLabel,
    HeroValue,
    StatLabel,
    StatValue,
    Site,
    ThemeTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub weight: u16,
    pub color: Color,
    pub anchor: Anchor,
    /// Extra spacing between glyphs, in px.
    pub tracking: f32,
}

impl TextStyle {
    const fn new(size: f32, weight: u16, color: Color) -> Self {
        Self {
            size,
            weight,
            color,
            anchor: Anchor::Start,
            tracking: 0.0,
        }
    }

    const fn tracked(mut self, tracking: f32) -> Self {
        self.tracking = tracking;
        self
    }

    const fn anchored_end(mut self) -> Self {
        self.anchor = Anchor::End;
        self
    }
}

/// One line of text. `y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub slot: Slot,
    pub content: String,
    pub x: f32,
    pub y: f32,
    pub style: TextStyle,
}

/// Horizontal hairline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub x1: f32,
    pub x2: f32,
    pub y: f32,
    pub color: Color,
}

/// Image the scene needs before it can be painted faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef {
    pub artwork: Artwork,
}

impl ImageRef {
    pub fn id(&self) -> &'static str {
        self.artwork.id()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardScene {
    pub theme: Theme,
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
    pub background: Background,
    pub texts: Vec<TextNode>,
    pub divider: Rule,
}

impl CardScene {
    /// Every image the background references, in paint order.
    pub fn images(&self) -> Vec<ImageRef> {
        match self.background {
            Background::Solid(_) => Vec::new(),
            Background::Artwork { artwork, .. } => vec![ImageRef { artwork }],
        }
    }

    pub fn texts_in(&self, slot: Slot) -> impl Iterator<Item = &TextNode> {
        self.texts.iter().filter(move |node| node.slot == slot)
    }
}

/// Lay out the card for `summary` in `theme`.
pub fn compose(summary: &ProfileSummary, theme: Theme, labels: &CardLabels) -> CardScene {
    let mut texts = Vec::with_capacity(20);
    let mut push = |slot, content: String, x, y, style| {
        texts.push(TextNode {
            slot,
            content,
            x,
            y,
            style,
        })
    };

    push(
        Slot::Kicker,
        labels.kicker.clone(),
        PADDING,
        48.0,
        TextStyle::new(11.0, 500, GRAY_400).tracked(3.85),
    );

    let mut baseline = 102.0;
    for line in &labels.title {
        push(
            Slot::Title,
            line.clone(),
            PADDING,
            baseline,
            TextStyle::new(40.0, 900, WHITE),
        );
        baseline += TITLE_LINE_H;
    }

    push(
        Slot::Username,
        format!("@{}", summary.username),
        PADDING,
        228.0,
        TextStyle::new(18.0, 400, GRAY_300),
    );

    push(
        Slot::HeroLabel,
        labels.hero.clone(),
        PADDING,
        300.0,
        TextStyle::new(14.0, 400, GRAY_400),
    );
    push(
        Slot::HeroValue,
        summary.total_repos.to_string(),
        PADDING,
        392.0,
        TextStyle::new(96.0, 900, WHITE),
    );

    let stats = [
        (&labels.language, summary.most_used_language.clone()),
        (&labels.top_repo, summary.top_repo.clone()),
        (&labels.stars, summary.total_stars.to_string()),
        (&labels.forks, summary.total_forks.to_string()),
    ];
    let mut label_y = 472.0;
    for (label, value) in stats {
        push(
            Slot::StatLabel,
            label.to_uppercase(),
            PADDING,
            label_y,
            TextStyle::new(12.0, 400, GRAY_400).tracked(0.6),
        );
        push(
            Slot::StatValue,
            value,
            PADDING,
            label_y + STAT_VALUE_OFFSET,
            TextStyle::new(20.0, 600, WHITE),
        );
        label_y += STAT_STEP;
    }

    push(
        Slot::Site,
        SITE_LABEL.to_string(),
        PADDING,
        CARD_HEIGHT - PADDING,
        TextStyle::new(12.0, 400, GRAY_500),
    );
    push(
        Slot::ThemeTag,
        format!("#{}", theme.as_str()),
        CARD_WIDTH - PADDING,
        CARD_HEIGHT - PADDING,
        TextStyle::new(12.0, 400, GRAY_500).anchored_end(),
    );

    CardScene {
        theme,
        width: CARD_WIDTH,
        height: CARD_HEIGHT,
        corner_radius: CARD_RADIUS,
        background: theme.background(),
        texts,
        divider: Rule {
            x1: PADDING,
            x2: CARD_WIDTH - PADDING,
            y: 432.0,
            color: GRAY_700,
        },
    }
}
