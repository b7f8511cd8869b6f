//! Configuration for modsched.
//!
//! Loaded from ~/.config/modsched/modsched.yml or ./modsched.yml, falling
//! back to defaults.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::address::{DEFAULT_VERSION_PARAM, VersionQueryComposer};
use crate::render::{DEFAULT_DATA_ID_PREFIX, DEFAULT_IMPORTMAP_ID, HtmlWriter, OutputFormat};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub version: VersionConfig,
    pub render: RenderConfig,
}

/// How module addresses are versioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionConfig {
    /// Version applied to modules registered without their own version
    pub ambient: Option<String>,
    /// Query parameter carrying the version
    pub param: String,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            ambient: None,
            param: DEFAULT_VERSION_PARAM.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Default output format (html or json)
    pub format: String,
    pub importmap_id: String,
    pub data_id_prefix: String,
    /// Add data-wp-fetchpriority when the effective priority differs from the declared one
    pub annotate_declared_priority: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: "html".to_string(),
            importmap_id: DEFAULT_IMPORTMAP_ID.to_string(),
            data_id_prefix: DEFAULT_DATA_ID_PREFIX.to_string(),
            annotate_declared_priority: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            version: VersionConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.version.param.is_empty() {
            eyre::bail!("version.param must not be empty");
        }
        if self.render.importmap_id.is_empty() {
            eyre::bail!("render.importmap_id must not be empty");
        }
        self.output_format()?;
        Ok(())
    }

    /// The configured default output format.
    pub fn output_format(&self) -> Result<OutputFormat> {
        Ok(self.render.format.parse::<OutputFormat>()?)
    }

    /// Address composer built from the version settings.
    pub fn composer(&self) -> VersionQueryComposer {
        VersionQueryComposer::new(self.version.ambient.clone()).with_param(self.version.param.clone())
    }

    /// HTML writer built from the render settings.
    pub fn html_writer(&self) -> HtmlWriter {
        HtmlWriter::new()
            .with_importmap_id(self.render.importmap_id.clone())
            .with_data_id_prefix(self.render.data_id_prefix.clone())
            .with_declared_priority(self.render.annotate_declared_priority)
    }
}
