//! Style configuration consumed by the document model builder.
//!
//! [`StyleSpec`] is a value type: descending into a nested inline element
//! produces a modified copy through the `with_*` methods and never mutates the
//! ambient style, so siblings never observe each other's overrides.

use serde::{Deserialize, Serialize};

/// Points to twips, the unit word-processor packages use for spacing.
pub const TWIPS_PER_POINT: f32 = 20.0;

/// Font used for inline `<code>` runs.
pub const MONOSPACE_FONT: &str = "Courier New";

/// Accent color used for inline `<code>` runs.
pub const CODE_ACCENT_COLOR: &str = "#D32F2F";

/// Font used when a math expression falls back to its source text.
pub const MATH_FALLBACK_FONT: &str = "Cambria Math";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

/// Visual style of one block category, inherited by its inline runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSpec {
    pub font_family: String,
    pub font_size_pt: f32,
    /// `#rrggbb`
    pub color: String,
    pub bold: bool,
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    pub alignment: Alignment,
    pub margin_top_pt: f32,
    pub margin_bottom_pt: f32,
}

impl StyleSpec {
    pub fn with_bold(self) -> Self {
        Self { bold: true, ..self }
    }

    pub fn with_italic(self) -> Self {
        Self {
            italic: true,
            ..self
        }
    }

    pub fn with_underline(self) -> Self {
        Self {
            underline: true,
            ..self
        }
    }

    pub fn with_color(self, color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            ..self
        }
    }

    /// Monospace font plus the code accent color.
    pub fn with_code(self) -> Self {
        Self {
            font_family: MONOSPACE_FONT.to_string(),
            color: CODE_ACCENT_COLOR.to_string(),
            ..self
        }
    }

    /// Link color and underline replace the ambient ones; everything else is inherited.
    pub fn with_link(self, link: &LinkStyle) -> Self {
        Self {
            color: link.color.clone(),
            underline: link.underline,
            ..self
        }
    }

    /// Color without the leading `#`, as package writers expect it.
    pub fn hex_color(&self) -> &str {
        self.color.trim_start_matches('#')
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkStyle {
    pub color: String,
    pub underline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStyle {
    /// CSS-like length: `"100%"`, `"80%"`, `"500px"` or a bare pixel count.
    pub max_width: String,
    pub alignment: Alignment,
    pub margin_top_pt: f32,
    pub margin_bottom_pt: f32,
}

/// Printable width of a Letter page with one-inch margins, at 96 px per inch.
pub const CONTENT_WIDTH_PX: u32 = 624;

impl ImageStyle {
    /// The configured maximum width in pixels, if it can be understood.
    pub fn max_width_px(&self) -> Option<u32> {
        let raw = self.max_width.trim();
        if let Some(percent) = raw.strip_suffix('%') {
            let percent: f32 = percent.trim().parse().ok()?;
            return Some((CONTENT_WIDTH_PX as f32 * percent / 100.0).round() as u32);
        }
        let pixels = raw.strip_suffix("px").unwrap_or(raw).trim();
        pixels.parse::<f32>().ok().map(|px| px.round() as u32)
    }

    /// Shrinks `(width, height)` to the maximum width, keeping the aspect ratio.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        match self.max_width_px() {
            Some(max) if max > 0 && width > max => {
                let ratio = height as f32 / width as f32;
                (max, (max as f32 * ratio).round() as u32)
            }
            _ => (width, height),
        }
    }
}

/// One style per block category plus link and image styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStyleConfig {
    pub heading1: StyleSpec,
    pub heading2: StyleSpec,
    pub heading3: StyleSpec,
    pub paragraph: StyleSpec,
    pub blockquote: StyleSpec,
    pub code_block: StyleSpec,
    pub link: LinkStyle,
    pub image: ImageStyle,
}

impl DocumentStyleConfig {
    /// Style for a heading level. Levels beyond 3 reuse the level-3 style.
    pub fn heading(&self, level: u8) -> &StyleSpec {
        match level {
            0 | 1 => &self.heading1,
            2 => &self.heading2,
            _ => &self.heading3,
        }
    }
}

fn style(font: &str, size: f32, color: &str, bold: bool, italic: bool) -> StyleSpec {
    StyleSpec {
        font_family: font.to_string(),
        font_size_pt: size,
        color: color.to_string(),
        bold,
        italic,
        underline: false,
        alignment: Alignment::Left,
        margin_top_pt: 0.0,
        margin_bottom_pt: 0.0,
    }
}

impl Default for DocumentStyleConfig {
    fn default() -> Self {
        Self {
            heading1: StyleSpec {
                margin_top_pt: 24.0,
                margin_bottom_pt: 12.0,
                ..style("Inter", 24.0, "#1e293b", true, false)
            },
            heading2: StyleSpec {
                margin_top_pt: 18.0,
                margin_bottom_pt: 8.0,
                ..style("Inter", 18.0, "#334155", true, false)
            },
            heading3: StyleSpec {
                margin_top_pt: 12.0,
                margin_bottom_pt: 6.0,
                ..style("Inter", 14.0, "#475569", true, false)
            },
            paragraph: StyleSpec {
                alignment: Alignment::Justify,
                margin_bottom_pt: 10.0,
                ..style("Merriweather", 11.0, "#374151", false, false)
            },
            blockquote: StyleSpec {
                margin_top_pt: 12.0,
                margin_bottom_pt: 12.0,
                ..style("Merriweather", 11.0, "#4b5563", false, true)
            },
            code_block: StyleSpec {
                margin_top_pt: 10.0,
                margin_bottom_pt: 10.0,
                ..style("JetBrains Mono", 10.0, "#dc2626", false, false)
            },
            link: LinkStyle {
                color: "#0284c7".to_string(),
                underline: true,
            },
            image: ImageStyle {
                max_width: "100%".to_string(),
                alignment: Alignment::Center,
                margin_top_pt: 10.0,
                margin_bottom_pt: 10.0,
            },
        }
    }
}
