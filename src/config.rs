//! Application configuration: TOML file under the platform config
//! directory, with CLI flags layered on top.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::view_state::PAGE_SIZES;

const CONFIG_FILE: &str = "config.toml";

/// Manages the config directory and config file operations.
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Load the config file, or defaults when it does not exist.
    pub fn load(&self) -> Result<AppConfig> {
        let path = self.config_file();
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
    }

    /// Default config as commented-out TOML so every value shows its default
    /// but only uncommented lines override.
    pub fn generate_default_config(&self) -> String {
        let toml_str = toml::to_string_pretty(&AppConfig::default())
            .unwrap_or_else(|e| panic!("Failed to serialize default config: {}", e));

        let mut out = String::from("# lenstui configuration. Uncomment values to override.\n\n");
        for line in toml_str.lines() {
            if line.is_empty() || line.starts_with('[') {
                out.push_str(line);
            } else {
                out.push_str("# ");
                out.push_str(line);
            }
            out.push('\n');
        }
        out
    }

    /// Write the commented default config. Refuses to overwrite unless `force`.
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        self.ensure_config_dir()?;
        let path = self.config_file();
        if path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {} (use --force to overwrite)",
                path.display()
            ));
        }
        std::fs::write(&path, self.generate_default_config())?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub display: DisplayConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the dashboard service.
    pub base_url: String,
    /// Request timeout in seconds. Applied by the transport; a fetch that
    /// exceeds it fails as a network error rather than hanging a stream.
    pub timeout_secs: u64,
    /// Optional user-email header sent with every request.
    pub user_email: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 30,
            user_email: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Rows per page at startup; must be one of the allowed page sizes.
    pub page_size: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

impl AppConfig {
    /// Layer CLI overrides on top of the loaded config. An invalid
    /// `--page-size` is rejected here so the UI never starts with a page
    /// size the service refuses.
    pub fn apply_args(mut self, args: &crate::cli::Args) -> Result<Self> {
        if let Some(url) = &args.service_url {
            self.service.base_url = url.clone();
        }
        if let Some(email) = &args.user_email {
            self.service.user_email = Some(email.clone());
        }
        if let Some(secs) = args.timeout_secs {
            self.service.timeout_secs = secs;
        }
        if let Some(size) = args.page_size {
            if !PAGE_SIZES.contains(&size) {
                return Err(eyre!(
                    "Invalid page size {} (allowed: {:?})",
                    size,
                    PAGE_SIZES
                ));
            }
            self.display.page_size = size;
        }
        Ok(self)
    }
}
