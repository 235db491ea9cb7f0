//! `<img>` sizing and normalization.

use std::io::Cursor;

use image::ImageFormat;
use markup5ever_rcdom::Handle;
use once_cell::sync::Lazy;
use regex::Regex;

use super::dom::attr;
use crate::error::FetchError;

pub const DEFAULT_IMAGE_WIDTH: u32 = 400;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 300;

// Anchored on a declaration boundary so `max-width` / `line-height` don't match.
static STYLE_WIDTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[;\s])width\s*:\s*(\d+)(?:px)?").expect("valid width pattern")
});
static STYLE_HEIGHT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[;\s])height\s*:\s*(\d+)(?:px)?").expect("valid height pattern")
});

/// Leading integer of an attribute value: `"320px"` → 320, `"abc"` → `None`.
fn leading_int(value: &str) -> Option<u32> {
    let digits: String = value
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok().filter(|&n| n > 0)
}

fn style_length(style: &str, pattern: &Regex) -> Option<u32> {
    pattern
        .captures(style)
        .and_then(|caps| caps[1].parse().ok())
        .filter(|&n: &u32| n > 0)
}

/// Pixel size from `width`/`height` attributes, overridden by inline style, with
/// 400x300 as the default for whatever is missing.
pub fn image_dimensions(element: &Handle) -> (u32, u32) {
    let mut width = attr(element, "width")
        .and_then(|v| leading_int(&v))
        .unwrap_or(DEFAULT_IMAGE_WIDTH);
    let mut height = attr(element, "height")
        .and_then(|v| leading_int(&v))
        .unwrap_or(DEFAULT_IMAGE_HEIGHT);

    if let Some(style) = attr(element, "style") {
        if let Some(w) = style_length(&style, &STYLE_WIDTH) {
            width = w;
        }
        if let Some(h) = style_length(&style, &STYLE_HEIGHT) {
            height = h;
        }
    }
    (width, height)
}

/// Re-encodes any supported raster format as PNG; PNG passes through untouched.
pub fn to_png(data: Vec<u8>) -> Result<Vec<u8>, FetchError> {
    if matches!(image::guess_format(&data), Ok(ImageFormat::Png)) {
        return Ok(data);
    }
    let decoded = image::load_from_memory(&data).map_err(|e| FetchError::Decode(e.to_string()))?;
    let mut png = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(png)
}
