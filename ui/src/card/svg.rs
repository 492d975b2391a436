//! Standalone SVG rendering of a [`CardScene`].

use std::collections::HashMap;
use std::fmt::Write;

use super::{Anchor, CardScene, TextNode};
use crate::theme::Background;

const FONT_STACK: &str = "Inter, ui-sans-serif, system-ui, -apple-system, 'Segoe UI', sans-serif";

/// Resolved `href`s for the images a scene references, keyed by image id.
///
/// On screen these are plain asset URLs; for export they are data URLs so the
/// document is self-contained when it is rasterized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageSet {
    hrefs: HashMap<&'static str, String>,
}

impl ImageSet {
    /// Link every image of `scene` to its bundled asset URL.
    pub fn linked(scene: &CardScene) -> Self {
        let mut set = Self::default();
        for image in scene.images() {
            set.insert(image.id(), image.artwork.url());
        }
        set
    }

    pub fn insert(&mut self, id: &'static str, href: String) {
        self.hrefs.insert(id, href);
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.hrefs.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.hrefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hrefs.is_empty()
    }
}

/// A complete SVG document plus its CSS pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    pub markup: String,
    pub width: f32,
    pub height: f32,
}

impl CardScene {
    /// Render the scene. Images missing from `images` are left out; the
    /// overlay and text are still painted.
    pub fn to_svg(&self, images: &ImageSet) -> SvgDocument {
        let (w, h) = (self.width, self.height);
        let mut out = String::with_capacity(4096);

        let _ = write!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
             width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">"
        );
        let _ = write!(
            out,
            "<defs><clipPath id=\"card-clip\"><rect width=\"{w}\" height=\"{h}\" rx=\"{r}\" ry=\"{r}\"/></clipPath></defs>",
            r = self.corner_radius
        );
        out.push_str("<g clip-path=\"url(#card-clip)\">");

        match self.background {
            Background::Solid(color) => {
                let _ = write!(
                    out,
                    "<rect width=\"{w}\" height=\"{h}\" fill=\"{}\"/>",
                    color.hex()
                );
            }
            Background::Artwork { artwork, overlay } => {
                if let Some(href) = images.get(artwork.id()) {
                    let _ = write!(
                        out,
                        "<image xlink:href=\"{}\" x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"xMidYMid slice\"/>",
                        escape_xml(href)
                    );
                }
                let _ = write!(
                    out,
                    "<rect width=\"{w}\" height=\"{h}\" fill=\"{}\" fill-opacity=\"{}\"/>",
                    overlay.hex(),
                    overlay.alpha
                );
            }
        }

        for node in &self.texts {
            write_text(&mut out, node);
        }

        let rule = self.divider;
        let _ = write!(
            out,
            "<line x1=\"{}\" y1=\"{y}\" x2=\"{}\" y2=\"{y}\" stroke=\"{}\" stroke-width=\"1\"/>",
            rule.x1,
            rule.x2,
            rule.color.hex(),
            y = rule.y
        );

        out.push_str("</g></svg>");

        SvgDocument {
            markup: out,
            width: w,
            height: h,
        }
    }
}

fn write_text(out: &mut String, node: &TextNode) {
    let style = node.style;
    let anchor = match style.anchor {
        Anchor::Start => "start",
        Anchor::End => "end",
    };
    let _ = write!(
        out,
        "<text x=\"{}\" y=\"{}\" font-family=\"{FONT_STACK}\" font-size=\"{}\" font-weight=\"{}\" fill=\"{}\" text-anchor=\"{anchor}\"",
        node.x,
        node.y,
        style.size,
        style.weight,
        style.color.hex()
    );
    if style.tracking > 0.0 {
        let _ = write!(out, " letter-spacing=\"{}\"", style.tracking);
    }
    let _ = write!(out, " xml:space=\"preserve\">{}</text>", escape_xml(&node.content));
}

fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
