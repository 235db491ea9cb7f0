//! Equation rasterizer
//!
//!     Turns one TeX expression into a PNG plus logical dimensions:
//!
//!     1. typeset the TeX ([`Typesetter`]),
//!     2. render the markup into a padded, white-background container off-screen at 2x
//!        device scale ([`SurfaceRasterizer`]),
//!     3. encode the surface as PNG and derive the logical size: pixel size divided by
//!        the scale, clamped to 600x400 (configurable).
//!
//!     Every failure is logged and collapses to `None`; the caller substitutes the TeX
//!     source. A stylesheet, if configured, is attached once per process and the first
//!     attachment waits a short settle delay for fonts to load.

use std::io::Cursor;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbaImage};
use log::{debug, warn};

use super::typeset::Typesetter;
use crate::error::RasterError;
use crate::ir::RasterImage;

/// Element id of the attached math stylesheet.
pub const MATH_STYLESHEET_ID: &str = "docmorph-math-stylesheet";

/// Padding around display math, in CSS pixels.
pub const DISPLAY_PADDING_PX: u32 = 16;

/// Padding around inline math, in CSS pixels.
pub const INLINE_PADDING_PX: u32 = 4;

static MATH_STYLESHEET: OnceLock<String> = OnceLock::new();

/// How the off-screen container is laid out and captured.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOptions {
    /// CSS color
    pub background: String,
    /// CSS color
    pub foreground: String,
    pub padding_px: u32,
    /// Device pixels per CSS pixel.
    pub scale: f32,
    /// Extra markup for the document head, such as a stylesheet link.
    pub head: Option<String>,
}

impl RasterOptions {
    pub fn for_math(display: bool, scale: f32) -> Self {
        Self {
            background: "#ffffff".to_string(),
            foreground: "#000000".to_string(),
            padding_px: if display {
                DISPLAY_PADDING_PX
            } else {
                INLINE_PADDING_PX
            },
            scale,
            head: None,
        }
    }
}

/// Captured pixels of a rendered container.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    image: RgbaImage,
}

impl PixelSurface {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn from_png(bytes: &[u8]) -> Result<Self, RasterError> {
        let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .map_err(|e| RasterError::Image(e.to_string()))?;
        Ok(Self::new(image.to_rgba8()))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Crops to the bounding box of non-transparent pixels.
    pub fn crop_to_content(self) -> Result<Self, RasterError> {
        let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
        let (mut max_x, mut max_y) = (0u32, 0u32);
        for (x, y, pixel) in self.image.enumerate_pixels() {
            if pixel[3] > 0 {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
        if min_x > max_x || min_y > max_y {
            return Err(RasterError::EmptySurface);
        }
        let cropped = image::imageops::crop_imm(
            &self.image,
            min_x,
            min_y,
            max_x - min_x + 1,
            max_y - min_y + 1,
        )
        .to_image();
        Ok(Self::new(cropped))
    }

    pub fn to_png(&self) -> Result<Vec<u8>, RasterError> {
        if self.width() == 0 || self.height() == 0 {
            return Err(RasterError::EmptySurface);
        }
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(self.image.clone())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| RasterError::Image(e.to_string()))?;
        Ok(buffer)
    }
}

/// Renders markup into pixels off-screen.
#[async_trait(?Send)]
pub trait SurfaceRasterizer {
    async fn rasterize(
        &self,
        markup: &str,
        options: &RasterOptions,
    ) -> Result<PixelSurface, RasterError>;
}

/// TeX in, image out. `None` means "use the source text instead".
#[async_trait(?Send)]
pub trait MathRasterizer {
    async fn rasterize(&self, tex: &str, display: bool) -> Option<RasterImage>;
}

/// Never rasterizes; every expression falls back to its source text.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRasterizer;

#[async_trait(?Send)]
impl MathRasterizer for NoRasterizer {
    async fn rasterize(&self, _tex: &str, _display: bool) -> Option<RasterImage> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MathSettings {
    /// Stylesheet the typeset markup needs, if any.
    pub stylesheet_url: Option<String>,
    /// Wait after the stylesheet is first attached.
    pub settle_delay: Duration,
    pub max_width: u32,
    pub max_height: u32,
    pub scale: f32,
}

impl Default for MathSettings {
    fn default() -> Self {
        Self {
            stylesheet_url: None,
            settle_delay: Duration::from_millis(100),
            max_width: 600,
            max_height: 400,
            scale: 2.0,
        }
    }
}

/// Typesets then rasterizes, the default [`MathRasterizer`].
pub struct EquationRasterizer<T, R> {
    typesetter: T,
    surface: R,
    settings: MathSettings,
}

impl<T: Typesetter, R: SurfaceRasterizer> EquationRasterizer<T, R> {
    pub fn new(typesetter: T, surface: R, settings: MathSettings) -> Self {
        Self {
            typesetter,
            surface,
            settings,
        }
    }

    fn logical_size(&self, surface: &PixelSurface) -> (u32, u32) {
        let scale = if self.settings.scale > 0.0 {
            self.settings.scale
        } else {
            1.0
        };
        let width = (surface.width() as f32 / scale).round() as u32;
        let height = (surface.height() as f32 / scale).round() as u32;
        (
            width.clamp(1, self.settings.max_width.max(1)),
            height.clamp(1, self.settings.max_height.max(1)),
        )
    }
}

#[async_trait(?Send)]
impl<T: Typesetter, R: SurfaceRasterizer> MathRasterizer for EquationRasterizer<T, R> {
    async fn rasterize(&self, tex: &str, display: bool) -> Option<RasterImage> {
        let markup = match self.typesetter.typeset(tex, display) {
            Ok(markup) => markup,
            Err(err) => {
                warn!("{err}");
                return None;
            }
        };

        let mut options = RasterOptions::for_math(display, self.settings.scale);
        if let Some(url) = self.settings.stylesheet_url.as_deref() {
            options.head = Some(attach_stylesheet(url, self.settings.settle_delay).await);
        }

        let surface = match self.surface.rasterize(&markup, &options).await {
            Ok(surface) => surface,
            Err(err) => {
                warn!("Failed to rasterize `{tex}`: {err}");
                return None;
            }
        };
        let bytes = match surface.to_png() {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Failed to encode `{tex}`: {err}");
                return None;
            }
        };

        let (width_px, height_px) = self.logical_size(&surface);
        debug!("Rasterized `{tex}` to {width_px}x{height_px}");
        Some(RasterImage {
            bytes,
            width_px,
            height_px,
        })
    }
}

/// Returns the stylesheet link markup, creating it on first use.
///
/// The first URL wins for the lifetime of the process. Only the first attachment
/// pays the settle delay.
pub async fn attach_stylesheet(url: &str, settle_delay: Duration) -> String {
    if let Some(link) = MATH_STYLESHEET.get() {
        return link.clone();
    }
    let link = MATH_STYLESHEET
        .get_or_init(|| {
            format!(
                r#"<link id="{MATH_STYLESHEET_ID}" rel="stylesheet" crossorigin="anonymous" href="{}">"#,
                html_escape::encode_double_quoted_attribute(url)
            )
        })
        .clone();
    debug!("Attached math stylesheet {url}");
    tokio::time::sleep(settle_delay).await;
    link
}
