//! Math fence codec
//!
//!     `protect` lifts math spans out of markdown source and leaves placeholders behind;
//!     `restore` puts typeset containers back where the placeholders ended up after the
//!     markdown renderer ran.
//!
//!     Block fences (`$$…$$`, may span lines) are lifted first, then inline fences
//!     (`$…$`, one line, non-empty). So `$$x$$` is never split into two inline spans.
//!
//!     A placeholder is `<MARKER><n>END`, letters and digits only. Neither the markdown
//!     renderer nor a code highlighter splits it, since every grammar reads it as one
//!     word. If the source already contains the default marker, a longer one is chosen
//!     so author text is never mistaken for a placeholder.
//!
//!     The TeX of each fragment travels on the restored container as the percent-encoded
//!     `data-latex` attribute. Decoding that attribute yields the trimmed source exactly.

use once_cell::sync::Lazy;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};

use super::{MathFragment, MathKind};
use crate::error::MathError;

/// Attribute carrying the percent-encoded TeX source on restored containers.
pub const MATH_SOURCE_ATTR: &str = "data-latex";

/// Class of a display-math container.
pub const BLOCK_CLASS: &str = "math-block";

/// Class of an inline-math container.
pub const INLINE_CLASS: &str = "math-inline";

/// Class of the visible error span emitted when typesetting fails.
pub const ERROR_CLASS: &str = "math-error";

const DEFAULT_MARKER: &str = "MATHFENCE";

static BLOCK_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\$([\s\S]*?)\$\$").expect("valid block fence pattern"));

static INLINE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([^$\n]+?)\$").expect("valid inline fence pattern"));

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Source text with its math spans replaced by placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protected {
    pub text: String,
    pub fragments: Vec<MathFragment>,
    marker: String,
}

impl Protected {
    /// The placeholder standing in for fragment `ordinal`.
    pub fn placeholder(&self, ordinal: usize) -> String {
        placeholder(&self.marker, ordinal)
    }
}

fn placeholder(marker: &str, ordinal: usize) -> String {
    format!("{marker}{ordinal}END")
}

fn choose_marker(text: &str) -> String {
    let mut marker = DEFAULT_MARKER.to_string();
    while text.contains(&marker) {
        marker.push('X');
    }
    marker
}

/// Replaces every math span in `text` with a placeholder.
///
/// Unterminated fences are left as literal text.
pub fn protect(text: &str) -> Protected {
    let marker = choose_marker(text);
    let mut fragments: Vec<MathFragment> = Vec::new();

    let mut lift = |kind: MathKind, caps: &Captures| {
        let ordinal = fragments.len();
        fragments.push(MathFragment {
            kind,
            source_tex: caps[1].trim().to_string(),
            ordinal,
        });
        placeholder(&marker, ordinal)
    };

    let without_blocks = BLOCK_FENCE
        .replace_all(text, |caps: &Captures| lift(MathKind::Block, caps))
        .into_owned();
    let protected = INLINE_FENCE
        .replace_all(&without_blocks, |caps: &Captures| lift(MathKind::Inline, caps))
        .into_owned();

    Protected {
        text: protected,
        fragments,
        marker,
    }
}

/// Replaces each placeholder in `html` with the typeset container of its fragment.
///
/// `render` typesets one fragment; on error the container holds a visible error span
/// with the escaped source instead. Placeholders with no matching fragment are left
/// untouched.
pub fn restore<F>(html: &str, protected: &Protected, mut render: F) -> String
where
    F: FnMut(&MathFragment) -> Result<String, MathError>,
{
    let pattern = format!(r"{}(\d+)END", regex::escape(&protected.marker));
    let Ok(placeholders) = Regex::new(&pattern) else {
        return html.to_string();
    };

    placeholders
        .replace_all(html, |caps: &Captures| {
            let fragment = caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|ordinal| protected.fragments.get(ordinal));
            match fragment {
                Some(fragment) => container(fragment, render(fragment)),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn container(fragment: &MathFragment, rendered: Result<String, MathError>) -> String {
    let body = match rendered {
        Ok(markup) => markup,
        Err(err) => {
            log::warn!("{err}");
            format!(
                r#"<code class="{ERROR_CLASS}">{}</code>"#,
                html_escape::encode_text(&fragment.source_tex)
            )
        }
    };
    let source = encode_source(&fragment.source_tex);
    match fragment.kind {
        MathKind::Block => {
            format!(r#"<div class="{BLOCK_CLASS}" {MATH_SOURCE_ATTR}="{source}">{body}</div>"#)
        }
        MathKind::Inline => {
            format!(r#"<span class="{INLINE_CLASS}" {MATH_SOURCE_ATTR}="{source}">{body}</span>"#)
        }
    }
}

pub fn encode_source(tex: &str) -> String {
    utf8_percent_encode(tex, URI_COMPONENT).to_string()
}

/// Inverse of the attribute encoding. Invalid UTF-8 sequences are replaced.
pub fn decode_source(encoded: &str) -> String {
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}
