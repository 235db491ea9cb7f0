//! External collaborators of a conversion.
//!
//! The builder only talks to the outside world through these trait objects, so tests
//! can substitute deterministic stubs for network fetches and browser rendering.

use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::{ImageFetcher, DEFAULT_FETCH_TIMEOUT};
use crate::math::{MathRasterizer, MathSettings, Typesetter};

/// Runtime knobs that are not visual styling.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertSettings {
    pub fetch_timeout: Duration,
    pub math: MathSettings,
    /// Relative image paths are resolved against this directory.
    pub base_dir: Option<PathBuf>,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            math: MathSettings::default(),
            base_dir: None,
        }
    }
}

pub struct Services {
    pub fetcher: Box<dyn ImageFetcher>,
    pub math: Box<dyn MathRasterizer>,
    pub typesetter: Box<dyn Typesetter>,
    pub fetch_timeout: Duration,
}

impl Services {
    pub fn new(
        fetcher: Box<dyn ImageFetcher>,
        math: Box<dyn MathRasterizer>,
        typesetter: Box<dyn Typesetter>,
    ) -> Self {
        Self {
            fetcher,
            math,
            typesetter,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// HTTP/file fetching, MathML typesetting and headless-Chrome rasterization.
    #[cfg(feature = "native-export")]
    pub fn native(settings: &ConvertSettings) -> Self {
        use crate::fetch::HttpFetcher;
        use crate::math::{ChromeRasterizer, EquationRasterizer, MathMlTypesetter};

        let mut fetcher = HttpFetcher::new();
        if let Some(base_dir) = &settings.base_dir {
            fetcher = fetcher.with_base_dir(base_dir);
        }
        let math = EquationRasterizer::new(
            MathMlTypesetter,
            ChromeRasterizer::new(),
            settings.math.clone(),
        );
        Self::new(Box::new(fetcher), Box::new(math), Box::new(MathMlTypesetter))
            .with_fetch_timeout(settings.fetch_timeout)
    }
}
