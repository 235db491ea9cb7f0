//! Locating a headless Chrome/Chromium for off-screen rendering.

use std::env;
use std::path::PathBuf;

use which::which;

use crate::error::RasterError;

/// Environment variable that overrides browser detection.
pub const CHROME_ENV: &str = "DOCMORPH_CHROME_BIN";

/// Finds a Chrome/Chromium executable.
///
/// Checks `DOCMORPH_CHROME_BIN`, then `GOOGLE_CHROME_BIN` / `CHROME_BIN`, then well-known
/// executable names on `PATH`, then platform install locations. The override is
/// returned even if it does not exist, so launching it reports the real problem.
pub fn resolve_chrome_binary() -> Result<PathBuf, RasterError> {
    for var in [CHROME_ENV, "GOOGLE_CHROME_BIN", "CHROME_BIN"] {
        if let Some(path) = env::var_os(var) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
    }

    for candidate in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
        "chrome",
        "msedge",
    ] {
        if let Ok(path) = which(candidate) {
            return Ok(path);
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidate = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    #[cfg(target_os = "windows")]
    {
        for candidate in [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ] {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        for candidate in [
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium-browser",
            "/usr/bin/chromium",
        ] {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    Err(RasterError::BrowserUnavailable(format!(
        "unable to locate a Chrome/Chromium binary; set {CHROME_ENV} to override the detection"
    )))
}
