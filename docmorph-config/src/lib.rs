//! Shared configuration loader for the docmorph toolchain.
//!
//! `defaults/docmorph.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`DocmorphConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use docmorph_babel::math::MathSettings;
use docmorph_babel::{ConvertSettings, DocumentStyleConfig};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_TOML: &str = include_str!("../defaults/docmorph.default.toml");

/// Name of the optional per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = "docmorph.toml";

/// Top-level configuration consumed by docmorph applications.
#[derive(Debug, Clone, Deserialize)]
pub struct DocmorphConfig {
    pub style: DocumentStyleConfig,
    pub convert: ConvertConfig,
}

/// Non-visual conversion knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    pub fetch: FetchConfig,
    pub math: MathConfig,
    pub html: HtmlConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MathConfig {
    #[serde(default)]
    pub stylesheet_url: Option<String>,
    pub settle_delay_ms: u64,
    pub max_width: u32,
    pub max_height: u32,
    pub scale: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HtmlConfig {
    #[serde(default)]
    pub title: Option<String>,
}

impl From<&MathConfig> for MathSettings {
    fn from(config: &MathConfig) -> Self {
        MathSettings {
            stylesheet_url: config.stylesheet_url.clone(),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            max_width: config.max_width,
            max_height: config.max_height,
            scale: config.scale,
        }
    }
}

impl From<&ConvertConfig> for ConvertSettings {
    fn from(config: &ConvertConfig) -> Self {
        ConvertSettings {
            fetch_timeout: Duration::from_millis(config.fetch.timeout_ms),
            math: (&config.math).into(),
            base_dir: None,
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<DocmorphConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<DocmorphConfig, ConfigError> {
    Loader::new().build()
}

/// The embedded defaults, verbatim. Used by `generate-config`.
pub fn default_toml() -> &'static str {
    DEFAULT_TOML
}
