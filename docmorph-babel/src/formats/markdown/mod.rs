//! Markdown rendering (Markdown → annotated HTML)
//!
//! Renders CommonMark plus the GFM extensions to HTML, with math spans protected from
//! the parser and restored as typeset containers afterwards.
//!
//! # Library Choice
//!
//! `comrak` renders the markdown; fenced code goes through a `syntect`-backed adapter
//! ([`highlight::CodeHighlighter`]). Raw HTML in the source is passed through untouched.
//!
//! # Element Mapping Table
//!
//! | Markdown                 | Annotated HTML                                            |
//! |--------------------------|-----------------------------------------------------------|
//! | `# Heading`              | `<h1>`..`<h6>`                                            |
//! | Paragraph                | `<p>`, single newlines stay soft breaks                   |
//! | `> quote`                | `<blockquote>`                                            |
//! | Fenced code              | `<pre style="white-space: pre;"><code>` with `hl-` spans  |
//! | `- item` / `1. item`     | `<ul>` / `<ol>` with `<li>`                               |
//! | GFM table                | `<table>` with `<th>` / `<td>`                            |
//! | `---`                    | `<hr>`                                                    |
//! | `![alt](src)`            | `<img>`                                                   |
//! | `$$tex$$`                | `<div class="math-block" data-latex="…">`                 |
//! | `$tex$`                  | `<span class="math-inline" data-latex="…">`               |

pub mod highlight;

use comrak::{markdown_to_html_with_plugins, ComrakOptions, ComrakPlugins};

use crate::math::{self, Typesetter};
pub use highlight::{highlight_css, CodeHighlighter};

fn default_comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.render.hardbreaks = false;
    options.render.unsafe_ = true;
    options
}

/// Renders markdown without any math handling.
pub fn render_markdown(source: &str) -> String {
    let options = default_comrak_options();
    let highlighter = CodeHighlighter;
    let mut plugins = ComrakPlugins::default();
    plugins.render.codefence_syntax_highlighter = Some(&highlighter);
    markdown_to_html_with_plugins(source, &options, &plugins)
}

/// Markdown with `$…$` / `$$…$$` math to annotated HTML.
///
/// Math that fails to typeset becomes a visible error span; rendering itself never fails.
pub fn render_html(source: &str, typesetter: &dyn Typesetter) -> String {
    let protected = math::protect(source);
    let html = render_markdown(&protected.text);
    math::restore(&html, &protected, |fragment| {
        typesetter.typeset(&fragment.source_tex, fragment.kind.is_display())
    })
}
