//! HTML format implementation
//!
//! Reads annotated HTML (the markdown renderer's output) into the document model, and
//! wraps it into a standalone HTML document for HTML export.
//!
//! # Library Choice
//!
//! We use the `html5ever` + `markup5ever_rcdom` pair for parsing:
//! - `html5ever`: Browser-grade HTML5 parser from the Servo project
//! - `markup5ever_rcdom`: Reference-counted DOM tree implementation
//!
//! The parser repairs malformed markup the way a browser would (for instance a `<div>`
//! inside a `<p>` closes the paragraph), so the builder sees the same tree a browser
//! preview shows.
//!
//! # Element Mapping Table
//!
//! | HTML                                   | Document model                                  |
//! |----------------------------------------|-------------------------------------------------|
//! | `h1`..`h6`                             | `Heading`, styled by level (4..6 reuse level 3) |
//! | `p`                                    | `Paragraph`, dropped when whitespace-only       |
//! | `blockquote`                           | `Blockquote` (indented, left border)            |
//! | `pre`                                  | `CodeBlock` with the full text content          |
//! | `ul` / `ol`                            | `List`, nested lists flattened                  |
//! | `table`                                | `Table`, every `tr` a row, `th` / `td` cells    |
//! | `hr`                                   | `Rule`                                          |
//! | `img`                                  | `Image`, or `[Image: alt]` text on failure      |
//! | `[data-latex]` at block level          | `MathDisplay`                                   |
//! | anything else                          | paragraph if it holds text, else descended      |
//! | InlineContent:                         |                                                 |
//! |   `strong` `b` / `em` `i` / `u`        | bold / italic / underline override              |
//! |   `code`                               | monospace + accent color                        |
//! |   `a`                                  | `Hyperlink` with link color and underline       |
//! |   `br`                                 | `LineBreak`                                     |
//! |   `[data-latex]`                       | `MathInline`                                    |
//! |   `style="color: #rrggbb"`             | color override                                  |

pub mod builder;
pub mod document;
pub mod dom;
pub mod image;
pub mod inline;

pub use builder::{BlockTag, Builder};
pub use document::{style_css, wrap_in_document, DEFAULT_TITLE};
pub use inline::InlineTag;
