//! Off-screen rendering through headless Chrome.
//!
//! The markup is placed in an absolutely-positioned container on a transparent page.
//! Chrome screenshots the page at the requested device scale and the screenshot is
//! cropped to the opaque container.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tempfile::tempdir;
use tokio::process::Command;
use url::Url;

use super::raster::{PixelSurface, RasterOptions, SurfaceRasterizer};
use crate::chrome::resolve_chrome_binary;
use crate::error::RasterError;

/// Logical viewport; large enough for the clamped math sizes plus padding.
const VIEWPORT: (u32, u32) = (1280, 960);

const LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);

/// [`SurfaceRasterizer`] shelling out to a Chrome/Chromium binary.
#[derive(Debug, Clone, Default)]
pub struct ChromeRasterizer {
    binary: Option<PathBuf>,
}

impl ChromeRasterizer {
    /// Resolves the browser lazily, on every render.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: Some(binary.into()),
        }
    }

    fn binary(&self) -> Result<PathBuf, RasterError> {
        match &self.binary {
            Some(path) => Ok(path.clone()),
            None => resolve_chrome_binary(),
        }
    }
}

fn surface_page(markup: &str, options: &RasterOptions) -> String {
    format!(
        concat!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\">{head}",
            "<style>html,body{{margin:0;padding:0;background:transparent;}}",
            "#surface{{position:absolute;left:0;top:0;display:inline-block;",
            "background:{background};color:{foreground};padding:{padding}px;}}</style>",
            "</head><body><div id=\"surface\">{markup}</div></body></html>"
        ),
        head = options.head.as_deref().unwrap_or_default(),
        background = options.background,
        foreground = options.foreground,
        padding = options.padding_px,
        markup = markup,
    )
}

async fn screenshot(
    chrome: &Path,
    page: &Path,
    output: &Path,
    scale: f32,
) -> Result<(), RasterError> {
    let page_url = Url::from_file_path(page).map_err(|_| {
        RasterError::BrowserFailed("cannot build a file:// URL for the surface page".to_string())
    })?;
    let (width, height) = VIEWPORT;

    let mut command = Command::new(chrome);
    command
        .arg("--headless")
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--hide-scrollbars")
        .arg("--default-background-color=00000000")
        .arg(format!("--force-device-scale-factor={scale}"))
        .arg(format!("--window-size={width},{height}"))
        .arg(format!("--screenshot={}", output.display()))
        .arg(page_url.as_str())
        .kill_on_drop(true);

    let status = tokio::time::timeout(LAUNCH_TIMEOUT, command.status())
        .await
        .map_err(|_| RasterError::BrowserFailed("timed out".to_string()))?
        .map_err(|e| {
            RasterError::BrowserUnavailable(format!("failed to launch {}: {e}", chrome.display()))
        })?;

    if !status.success() {
        return Err(RasterError::BrowserFailed(status.to_string()));
    }
    Ok(())
}

#[async_trait(?Send)]
impl SurfaceRasterizer for ChromeRasterizer {
    async fn rasterize(
        &self,
        markup: &str,
        options: &RasterOptions,
    ) -> Result<PixelSurface, RasterError> {
        let chrome = self.binary()?;
        let workdir = tempdir()?;
        let page = workdir.path().join("surface.html");
        let output = workdir.path().join("surface.png");
        tokio::fs::write(&page, surface_page(markup, options)).await?;

        debug!("Rendering math surface with {}", chrome.display());
        screenshot(&chrome, &page, &output, options.scale).await?;

        let bytes = tokio::fs::read(&output).await?;
        PixelSurface::from_png(&bytes)?.crop_to_content()
    }
}
