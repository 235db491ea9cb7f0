//! Syntax highlighting for fenced code blocks.
//!
//! Highlighted tokens are emitted as `<span class="hl-…">` elements; colors come from a
//! stylesheet ([`highlight_css`]) so the annotated HTML stays theme-independent.

use std::collections::HashMap;
use std::io::{self, Write};

use comrak::adapters::SyntaxHighlighterAdapter;
use once_cell::sync::Lazy;
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Class prefix of highlighted tokens.
pub const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

const THEME: &str = "InspiredGitHub";

static SYNTAXES: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

/// Highlighter plugged into the markdown renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeHighlighter;

impl CodeHighlighter {
    /// Declared language first, then first-line detection (shebangs, modelines),
    /// then plain text.
    fn syntax_for(lang: Option<&str>, code: &str) -> &'static SyntaxReference {
        let syntaxes: &'static SyntaxSet = &SYNTAXES;
        lang.filter(|lang| !lang.is_empty())
            .and_then(|lang| syntaxes.find_syntax_by_token(lang))
            .or_else(|| syntaxes.find_syntax_by_first_line(code))
            .unwrap_or_else(|| syntaxes.find_syntax_plain_text())
    }

    pub fn highlight(lang: Option<&str>, code: &str) -> Result<String, syntect::Error> {
        let syntax = Self::syntax_for(lang, code);
        let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAXES, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(generator.finalize())
    }
}

fn write_tag(
    output: &mut dyn Write,
    tag: &str,
    attributes: &HashMap<String, String>,
) -> io::Result<()> {
    let mut names: Vec<&String> = attributes.keys().collect();
    names.sort();
    write!(output, "<{tag}")?;
    for name in names {
        write!(
            output,
            " {name}=\"{}\"",
            html_escape::encode_double_quoted_attribute(&attributes[name])
        )?;
    }
    write!(output, ">")
}

impl SyntaxHighlighterAdapter for CodeHighlighter {
    fn write_highlighted(
        &self,
        output: &mut dyn Write,
        lang: Option<&str>,
        code: &str,
    ) -> io::Result<()> {
        let html = Self::highlight(lang, code).map_err(io::Error::other)?;
        output.write_all(html.as_bytes())
    }

    fn write_pre_tag(
        &self,
        output: &mut dyn Write,
        mut attributes: HashMap<String, String>,
    ) -> io::Result<()> {
        attributes.insert("style".to_string(), "white-space: pre;".to_string());
        write_tag(output, "pre", &attributes)
    }

    fn write_code_tag(
        &self,
        output: &mut dyn Write,
        attributes: HashMap<String, String>,
    ) -> io::Result<()> {
        write_tag(output, "code", &attributes)
    }
}

/// Stylesheet for the `hl-` token classes.
pub fn highlight_css() -> String {
    let themes = ThemeSet::load_defaults();
    themes
        .themes
        .get(THEME)
        .and_then(|theme| css_for_theme_with_class_style(theme, CLASS_STYLE).ok())
        .unwrap_or_default()
}
