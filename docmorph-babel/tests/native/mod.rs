//! End-to-end conversion with the real fetcher and a scripted browser

use std::io::Cursor;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use docmorph_babel::fetch::HttpFetcher;
use docmorph_babel::ir::{DocumentNode, MathContent};
use docmorph_babel::math::{ChromeRasterizer, EquationRasterizer, MathMlTypesetter, MathSettings};
use docmorph_babel::publish::{publish, PublishArtifact, PublishSpec};
use docmorph_babel::{build_document, render_html, DocumentStyleConfig, OutputFormat, Services};
use image::{ImageFormat, Rgba, RgbaImage};
use tempfile::tempdir;

use crate::common::png;

/// A fake browser that copies a prepared screenshot to the `--screenshot` path.
fn stub_chrome(dir: &Path, screenshot: &Path) -> PathBuf {
    let script = dir.join("fake-chrome");
    let body = format!(
        "#!/bin/sh\nfor arg in \"$@\"; do\n  case \"$arg\" in\n    --screenshot=*) cp \"{}\" \"${{arg#--screenshot=}}\" ;;\n  esac\ndone\n",
        screenshot.display()
    );
    std::fs::write(&script, body).unwrap();
    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).unwrap();
    script
}

/// 120x60 device pixels with a 40x20 opaque block in the corner.
fn prepared_screenshot(dir: &Path) -> PathBuf {
    let mut image = RgbaImage::new(120, 60);
    for x in 0..40 {
        for y in 0..20 {
            image.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
    }
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    let path = dir.join("prepared.png");
    std::fs::write(&path, bytes).unwrap();
    path
}

fn native_services(dir: &Path, chrome: PathBuf) -> Services {
    let math = EquationRasterizer::new(
        MathMlTypesetter,
        ChromeRasterizer::with_binary(chrome),
        MathSettings::default(),
    );
    Services::new(
        Box::new(HttpFetcher::new().with_base_dir(dir)),
        Box::new(math),
        Box::new(MathMlTypesetter),
    )
}

const SOURCE: &str = "# Report\n\nEnergy $E = mc^2$ holds.\n\n$$\n\\frac{a}{b}\n$$\n\n![Figure](figure.png)\n\n![Gone](missing.png)\n";

#[tokio::test]
async fn test_pipeline_with_local_images_and_scripted_browser() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("figure.png"), png(4, 2)).unwrap();
    let chrome = stub_chrome(dir.path(), &prepared_screenshot(dir.path()));
    let services = native_services(dir.path(), chrome);

    let html = render_html(SOURCE, services.typesetter.as_ref());
    let nodes = build_document(&html, &DocumentStyleConfig::default(), &services)
        .await
        .unwrap();

    let display = nodes
        .iter()
        .find_map(|node| match node {
            DocumentNode::MathDisplay(math) => Some(math),
            _ => None,
        })
        .unwrap();
    match display {
        MathContent::Raster(image) => assert_eq!((image.width_px, image.height_px), (20, 10)),
        MathContent::Fallback(tex) => panic!("expected raster, got fallback {tex}"),
    }

    let texts: Vec<String> = nodes
        .iter()
        .filter_map(|node| match node {
            DocumentNode::Paragraph(paragraph) => {
                Some(docmorph_babel::ir::nodes::plain_text(&paragraph.runs))
            }
            _ => None,
        })
        .collect();
    assert!(texts.iter().any(|text| text == "[Image: Gone]"));
    assert!(!texts.iter().any(|text| text.contains("Figure")));
}

#[tokio::test]
async fn test_failing_browser_falls_back_to_source_text() {
    let dir = tempdir().unwrap();
    let services = native_services(dir.path(), PathBuf::from("/nonexistent/docmorph-chrome"));

    let html = render_html("$$x^2$$\n", services.typesetter.as_ref());
    let nodes = build_document(&html, &DocumentStyleConfig::default(), &services)
        .await
        .unwrap();
    assert_eq!(
        nodes,
        vec![DocumentNode::MathDisplay(MathContent::Fallback(
            "x^2".to_string()
        ))]
    );
}

#[tokio::test]
async fn test_publish_writes_a_docx_package() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("figure.png"), png(4, 2)).unwrap();
    let chrome = stub_chrome(dir.path(), &prepared_screenshot(dir.path()));
    let services = native_services(dir.path(), chrome);
    let output = dir.path().join("report.docx");

    let result = publish(
        PublishSpec::new(SOURCE, OutputFormat::Docx).with_output_path(&output),
        &DocumentStyleConfig::default(),
        &services,
    )
    .await
    .unwrap();

    assert_eq!(result.artifact, PublishArtifact::File(output.clone()));
    let bytes = std::fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"PK"));
    assert!(bytes.windows(b"word/document.xml".len()).any(|w| w == b"word/document.xml"));
}
