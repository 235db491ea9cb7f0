//! Document model builder tests (annotated HTML → nodes)

use docmorph_babel::ir::nodes::plain_text;
use docmorph_babel::ir::style::{CODE_ACCENT_COLOR, MONOSPACE_FONT};
use docmorph_babel::ir::{Alignment, DocumentNode, InlineRun, MathContent};
use std::time::Duration;

use docmorph_babel::fetch::HttpFetcher;
use docmorph_babel::math::MathMlTypesetter;
use docmorph_babel::{build_document, DocumentStyleConfig, Services};
use insta::assert_snapshot;

use crate::common::{
    build_markdown, outline, png, services, services_with, StubFetcher, StubRasterizer,
};

async fn build_html(html: &str) -> Vec<DocumentNode> {
    build_document(html, &DocumentStyleConfig::default(), &services())
        .await
        .unwrap()
}

fn paragraph_runs(node: &DocumentNode) -> &[InlineRun] {
    match node {
        DocumentNode::Paragraph(paragraph) => &paragraph.runs,
        other => panic!("expected paragraph, got {}", other.kind()),
    }
}

// ============================================================================
// BLOCK STRUCTURE
// ============================================================================

#[tokio::test]
async fn test_outline_of_mixed_document() {
    let source = "# Title\n\nSome **bold** text.\n\n- one\n- two\n\n---\n";
    let nodes = build_markdown(source, &services()).await;
    assert_snapshot!(outline(&nodes), @r"
    heading 1: Title
    paragraph: Some bold text.
    list unordered: one | two
    rule
    ");
}

#[tokio::test]
async fn test_whitespace_only_paragraphs_are_dropped() {
    let nodes = build_html("<p>   </p><p>\n</p><p>kept</p>").await;
    assert_eq!(outline(&nodes), "paragraph: kept");
}

#[tokio::test]
async fn test_heading_levels_beyond_three_use_level_three_style() {
    let config = DocumentStyleConfig::default();
    let nodes = build_html("<h5>Deep</h5>").await;
    match &nodes[0] {
        DocumentNode::Heading(heading) => {
            assert_eq!(heading.level, 5);
            match &heading.runs[0] {
                InlineRun::Text { style, .. } => assert_eq!(style, &config.heading3),
                other => panic!("unexpected run {other:?}"),
            }
            assert_eq!(heading.format.spacing_before, 240);
            assert_eq!(heading.format.spacing_after, 120);
        }
        other => panic!("expected heading, got {}", other.kind()),
    }
}

#[tokio::test]
async fn test_seven_hashes_are_plain_text() {
    let nodes = build_markdown("####### t\n\n###### six\n", &services()).await;
    assert_eq!(outline(&nodes), "paragraph: ####### t\nheading 6: six");
}

#[tokio::test]
async fn test_generic_containers() {
    let nodes =
        build_html("<div>loose <b>text</b></div><section><p>inner</p><p>second</p></section>")
            .await;
    assert_eq!(
        outline(&nodes),
        "paragraph: loose text\nparagraph: inner\nparagraph: second"
    );
}

#[tokio::test]
async fn test_scripts_are_ignored() {
    let nodes = build_html("<script>alert(1)</script><p>after</p>").await;
    assert_eq!(outline(&nodes), "paragraph: after");
}

#[tokio::test]
async fn test_blockquote_uses_quote_style() {
    let nodes = build_markdown("> quoted words\n", &services()).await;
    match &nodes[0] {
        DocumentNode::Blockquote(quote) => {
            assert_eq!(plain_text(&quote.runs), "quoted words");
            match &quote.runs[0] {
                InlineRun::Text { style, .. } => assert!(style.italic),
                other => panic!("unexpected run {other:?}"),
            }
        }
        other => panic!("expected blockquote, got {}", other.kind()),
    }
}

#[tokio::test]
async fn test_code_block_keeps_full_text() {
    let nodes = build_markdown("```rust\nlet x = 1;\nlet y = 2;\n```\n", &services()).await;
    match &nodes[0] {
        DocumentNode::CodeBlock(code) => {
            assert_eq!(code.text, "let x = 1;\nlet y = 2;\n");
            assert_eq!(code.format.alignment, Alignment::Left);
            assert_eq!(code.style.font_family, "JetBrains Mono");
        }
        other => panic!("expected code block, got {}", other.kind()),
    }
}

#[tokio::test]
async fn test_math_in_highlighted_code_block_is_restored() {
    let (services, calls) = services_with(StubFetcher::default());
    let nodes = build_markdown("```python\nx = $a$ + 1\n```\n", &services).await;
    match &nodes[0] {
        DocumentNode::CodeBlock(code) => {
            assert!(!code.text.contains("MATHFENCE"), "{}", code.text);
            assert!(code.text.starts_with("x = "));
        }
        other => panic!("expected code block, got {}", other.kind()),
    }
    assert!(calls.borrow().is_empty());
}

#[tokio::test]
async fn test_nested_lists_are_flattened() {
    let nodes = build_markdown("1. a\n   - b\n   - c\n2. d\n", &services()).await;
    assert_eq!(outline(&nodes), "list ordered: a | b | c | d");
    match &nodes[0] {
        DocumentNode::List(list) => {
            assert_eq!(list.format.spacing_before, 100);
            assert_eq!(list.format.spacing_after, 100);
        }
        other => panic!("expected list, got {}", other.kind()),
    }
}

// ============================================================================
// TABLES
// ============================================================================

#[tokio::test]
async fn test_table_shape_and_widths() {
    let source = "| a | b | c |\n|---|---|---|\n| 1 | 2 | 3 |\n";
    let nodes = build_markdown(source, &services()).await;
    assert_eq!(outline(&nodes), "table: 2 rows x 3 cells");

    let DocumentNode::Table(table) = &nodes[0] else {
        panic!("expected table");
    };
    for row in &table.rows {
        for cell in row {
            assert!((cell.width_pct - 33.333).abs() < 0.01);
        }
    }
    assert!(table.rows[0].iter().all(|cell| cell.is_header));
    assert!(table.rows[1].iter().all(|cell| !cell.is_header));
    match &table.rows[0][0].runs[0] {
        InlineRun::Text { style, .. } => assert!(style.bold),
        other => panic!("unexpected run {other:?}"),
    }
    let texts: Vec<String> = table.rows[1]
        .iter()
        .map(|cell| plain_text(&cell.runs))
        .collect();
    assert_eq!(texts, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_ragged_rows_keep_their_own_widths() {
    let nodes =
        build_html("<table><tr><td>a</td><td>b</td></tr><tr><td>only</td></tr></table>").await;
    let DocumentNode::Table(table) = &nodes[0] else {
        panic!("expected table");
    };
    assert_eq!(table.rows[0][0].width_pct, 50.0);
    assert_eq!(table.rows[1][0].width_pct, 100.0);
}

#[tokio::test]
async fn test_tables_without_cells_are_dropped() {
    let nodes = build_html(
        "<table></table><p>after</p><table><tr></tr><tr><td>x</td></tr><tr></tr></table>",
    )
    .await;
    assert_eq!(outline(&nodes), "paragraph: after\ntable: 1 rows x 1 cells");
}

// ============================================================================
// INLINE STYLING
// ============================================================================

#[tokio::test]
async fn test_nested_emphasis_produces_three_runs() {
    let nodes = build_html("<p><strong>bold <em>and italic</em> text</strong></p>").await;
    let runs = paragraph_runs(&nodes[0]);
    assert_eq!(runs.len(), 3);

    let expected = [
        ("bold ", true, false),
        ("and italic", true, true),
        (" text", true, false),
    ];
    for (run, (text, bold, italic)) in runs.iter().zip(expected) {
        match run {
            InlineRun::Text { content, style } => {
                assert_eq!(content, text);
                assert_eq!(style.bold, bold);
                assert_eq!(style.italic, italic);
            }
            other => panic!("unexpected run {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_color_and_code_overrides() {
    let nodes = build_html(
        r#"<p>plain <span style="color: #FF0000">red <code>c</code></span> <u>under</u></p>"#,
    )
    .await;
    let config = DocumentStyleConfig::default();
    let runs = paragraph_runs(&nodes[0]);
    let styles: Vec<_> = runs
        .iter()
        .filter_map(|run| match run {
            InlineRun::Text { content, style } => Some((content.as_str(), style)),
            _ => None,
        })
        .collect();

    assert_eq!(styles[0].0, "plain ");
    assert_eq!(styles[0].1, &config.paragraph);
    assert_eq!(styles[1].0, "red ");
    assert_eq!(styles[1].1.color, "#ff0000");
    assert_eq!(styles[2].0, "c");
    assert_eq!(styles[2].1.font_family, MONOSPACE_FONT);
    assert_eq!(styles[2].1.color, CODE_ACCENT_COLOR);
    let under = styles.iter().find(|(text, _)| *text == "under").unwrap();
    assert!(under.1.underline);
    assert_eq!(under.1.color, config.paragraph.color);
}

#[tokio::test]
async fn test_links_take_link_style() {
    let nodes = build_html(r#"<p>see <a href="https://example.com"><strong>here</strong></a></p>"#).await;
    let runs = paragraph_runs(&nodes[0]);
    match &runs[1] {
        InlineRun::Hyperlink { href, children } => {
            assert_eq!(href, "https://example.com");
            match &children[0] {
                InlineRun::Text { content, style } => {
                    assert_eq!(content, "here");
                    assert!(style.bold);
                    assert!(style.underline);
                    assert_eq!(style.color, "#0284c7");
                }
                other => panic!("unexpected run {other:?}"),
            }
        }
        other => panic!("expected hyperlink, got {other:?}"),
    }
}

#[tokio::test]
async fn test_anchors_without_target_are_plain_text() {
    let config = DocumentStyleConfig::default();
    let nodes = build_html(r#"<p>see <a>here</a> and <a href=" ">there</a></p>"#).await;
    let runs = paragraph_runs(&nodes[0]);
    assert_eq!(plain_text(runs), "see here and there");
    for run in runs {
        match run {
            InlineRun::Text { style, .. } => assert_eq!(style, &config.paragraph),
            other => panic!("expected plain text, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_line_breaks() {
    let nodes = build_html("<p>one<br>two</p>").await;
    let runs = paragraph_runs(&nodes[0]);
    assert_eq!(runs.len(), 3);
    assert_eq!(runs[1], InlineRun::LineBreak);
}

// ============================================================================
// IMAGES
// ============================================================================

#[tokio::test]
async fn test_unreachable_images_become_text() {
    let nodes = build_html(
        r#"<img src="https://example.com/missing.png"><p>a <img src="x.png" alt="Diagram"> b</p>"#,
    )
    .await;
    assert_eq!(
        outline(&nodes),
        "paragraph: [Image: Image]\nparagraph: a [Image: Diagram] b"
    );
}

#[tokio::test]
async fn test_silent_image_server_times_out_to_placeholder() {
    // Connections queue in the backlog but nobody ever answers.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let services = Services::new(
        Box::new(HttpFetcher::new()),
        Box::new(StubRasterizer::default()),
        Box::new(MathMlTypesetter),
    )
    .with_fetch_timeout(Duration::from_millis(50));
    let html = format!(
        r#"<p>before</p><img src="http://{addr}/plot.png" alt="Plot"><p>a <img src="http://{addr}/icon.png" alt="Icon"> b</p><h2>After</h2>"#
    );

    let nodes = tokio::time::timeout(
        Duration::from_secs(5),
        build_document(&html, &DocumentStyleConfig::default(), &services),
    )
    .await
    .expect("conversion finishes")
    .unwrap();
    assert_eq!(
        outline(&nodes),
        "paragraph: before\nparagraph: [Image: Plot]\nparagraph: a [Image: Icon] b\nheading 2: After"
    );
}

#[tokio::test]
async fn test_fetched_images_are_sized_and_fitted() {
    let fetcher = StubFetcher::default()
        .with("big.png", png(8, 4))
        .with("small.png", png(2, 2));
    let (services, _) = services_with(fetcher);
    let nodes = build_document(
        r#"<img src="big.png" width="1248" height="600"><img src="small.png" style="width: 50px; height: 20px">"#,
        &DocumentStyleConfig::default(),
        &services,
    )
    .await
    .unwrap();
    assert_eq!(
        outline(&nodes),
        "image: big.png 624x300\nimage: small.png 50x20"
    );
    let DocumentNode::Image(image) = &nodes[0] else {
        panic!("expected image");
    };
    assert_eq!(image.format.alignment, Alignment::Center);
    assert!(image.data.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[tokio::test]
async fn test_undecodable_images_become_text() {
    let fetcher = StubFetcher::default().with("page.png", b"<html>404</html>".to_vec());
    let (services, _) = services_with(fetcher);
    let nodes = build_document(
        r#"<img src="page.png" alt="Chart">"#,
        &DocumentStyleConfig::default(),
        &services,
    )
    .await
    .unwrap();
    assert_eq!(outline(&nodes), "paragraph: [Image: Chart]");
}

// ============================================================================
// MATH
// ============================================================================

#[tokio::test]
async fn test_math_is_rasterized_from_exact_source() {
    let (services, calls) = services_with(StubFetcher::default());
    let nodes = build_markdown("Inline $a_1 * b$ and\n\n$$\n\\sum_i x_i\n$$\n", &services).await;

    assert_eq!(outline(&nodes), "paragraph: Inline  and\nmath: raster");
    assert_eq!(
        calls.borrow().as_slice(),
        &[
            ("a_1 * b".to_string(), false),
            ("\\sum_i x_i".to_string(), true)
        ]
    );
    let runs = paragraph_runs(&nodes[0]);
    assert!(matches!(
        &runs[1],
        InlineRun::MathInline {
            math: MathContent::Raster(image),
            ..
        } if image.width_px == 10 && image.height_px == 5
    ));
}

#[tokio::test]
async fn test_failed_math_falls_back_to_source() {
    let nodes = build_markdown("$$\\fail{x}$$\n\nText $\\fail$ here\n", &services()).await;
    assert_eq!(
        outline(&nodes),
        "math: \\fail{x}\nparagraph: Text \\fail here"
    );
    let runs = paragraph_runs(&nodes[1]);
    match &runs[1] {
        InlineRun::MathInline { math, style } => {
            assert_eq!(math, &MathContent::Fallback("\\fail".to_string()));
            assert_eq!(style, &DocumentStyleConfig::default().paragraph);
        }
        other => panic!("expected inline math, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_math_attribute_is_not_a_carrier() {
    let (services, calls) = services_with(StubFetcher::default());
    let nodes = build_document(
        r#"<p>before <span data-latex="">x</span> after</p><div data-latex="">block text</div>"#,
        &DocumentStyleConfig::default(),
        &services,
    )
    .await
    .unwrap();
    assert_eq!(
        outline(&nodes),
        "paragraph: before x after\nparagraph: block text"
    );
    assert!(calls.borrow().is_empty());
}
