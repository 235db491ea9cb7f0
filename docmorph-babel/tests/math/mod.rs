//! Math fence codec tests (protect → markdown → restore)

use docmorph_babel::math::fence::{decode_source, encode_source, protect, restore};
use docmorph_babel::math::{MathKind, MathMlTypesetter};
use docmorph_babel::render_html;
use insta::assert_snapshot;
use once_cell::sync::Lazy;
use proptest::prelude::*;
use regex::Regex;

static SOURCE_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"data-latex="([^"]*)""#).unwrap());

fn echo(fragment: &docmorph_babel::math::MathFragment) -> Result<String, docmorph_babel::MathError> {
    Ok(format!("<m>{}</m>", fragment.source_tex))
}

fn decoded_sources(html: &str) -> Vec<String> {
    SOURCE_ATTR
        .captures_iter(html)
        .map(|caps| decode_source(&caps[1]))
        .collect()
}

#[test]
fn test_restored_inline_container() {
    let protected = protect("Euler: $e^{i\\pi} + 1 = 0$");
    let html = restore(&protected.text, &protected, echo);
    assert_snapshot!(html, @r#"Euler: <span class="math-inline" data-latex="e%5E%7Bi%5Cpi%7D%20%2B%201%20%3D%200"><m>e^{i\pi} + 1 = 0</m></span>"#);
}

#[test]
fn test_markdown_inside_math_is_not_interpreted() {
    let html = render_html("Product $a * b * c$ and $x_1 + y_1$.\n", &MathMlTypesetter);
    assert!(!html.contains("<em>"));
    assert_eq!(decoded_sources(&html), vec!["a * b * c", "x_1 + y_1"]);
}

#[test]
fn test_block_math_survives_rendering() {
    let html = render_html("Before\n\n$$\n\\int_0^1 x\\,dx\n$$\n\nAfter\n", &MathMlTypesetter);
    assert!(html.contains(r#"class="math-block""#));
    assert_eq!(decoded_sources(&html), vec!["\\int_0^1 x\\,dx"]);
    assert!(html.find("Before").unwrap() < html.find("math-block").unwrap());
    assert!(html.find("math-block").unwrap() < html.find("After").unwrap());
}

#[test]
fn test_unterminated_fence_stays_literal() {
    let html = render_html("costs $5 today\n", &MathMlTypesetter);
    assert!(html.contains("costs $5 today"));
    assert!(decoded_sources(&html).is_empty());
}

#[test]
fn test_source_containing_default_marker() {
    let source = "literal MATHFENCE0END and $x$";
    let protected = protect(source);
    let html = restore(&protected.text, &protected, echo);
    assert!(html.contains("literal MATHFENCE0END and"));
    assert_eq!(decoded_sources(&html), vec!["x"]);
}

#[test]
fn test_math_inside_highlighted_code_is_restored() {
    for lang in ["python", "ruby", "c", "bash"] {
        let source = format!("```{lang}\nx = $a$ + 1 % 3\n```\n");
        let html = render_html(&source, &MathMlTypesetter);
        assert!(!html.contains("MATHFENCE"), "{lang}: {html}");
        assert_eq!(decoded_sources(&html), vec!["a"], "{lang}");
    }
}

proptest! {
    #[test]
    fn inline_source_round_trips(tex in "[^$\n]{1,40}") {
        prop_assume!(!tex.trim().is_empty());
        let protected = protect(&format!("before ${tex}$ after"));
        prop_assert_eq!(protected.fragments.len(), 1);
        prop_assert_eq!(protected.fragments[0].kind, MathKind::Inline);

        let html = restore(&protected.text, &protected, echo);
        prop_assert_eq!(decoded_sources(&html), vec![tex.trim().to_string()]);
    }

    #[test]
    fn block_source_round_trips(tex in "[^$]{1,80}") {
        prop_assume!(!tex.trim().is_empty());
        let protected = protect(&format!("$${tex}$$"));
        prop_assert_eq!(protected.fragments.len(), 1);
        prop_assert_eq!(protected.fragments[0].kind, MathKind::Block);

        let html = restore(&protected.text, &protected, echo);
        prop_assert_eq!(decoded_sources(&html), vec![tex.trim().to_string()]);
    }

    #[test]
    fn attribute_encoding_is_reversible(tex in "\\PC{0,60}") {
        prop_assert_eq!(decode_source(&encode_source(&tex)), tex);
    }
}
