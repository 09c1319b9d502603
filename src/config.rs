//! Bootmaker Configuration
//!
//! Parses `config.toml` from the user's config directory. Every section is
//! optional; a missing file means defaults.

use crate::chrome::{ChromePolicy, SystemMenuRule};
use crate::gateway::{BackendGateway, CommandBackend, DemoBackend};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest slide we accept; anything slower feels broken
const MAX_SLIDE_MS: u64 = 5_000;

#[derive(Debug, Deserialize, Default)]
pub struct WizardConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub chrome: ChromeConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub cancel: CancelConfig,
}

/// Fixed window geometry
#[derive(Debug, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: i32,

    #[serde(default = "default_height")]
    pub height: i32,

    /// Height of each step surface; the rest holds the page indicator
    #[serde(default = "default_surface_height")]
    pub surface_height: i32,

    #[serde(default = "default_slide_ms")]
    pub slide_duration_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            surface_height: default_surface_height(),
            slide_duration_ms: default_slide_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChromeConfig {
    #[serde(default)]
    pub system_menu: SystemMenuRule,

    /// Whether the window starts out with a system menu
    #[serde(default = "default_true")]
    pub baseline_system_menu: bool,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            system_menu: SystemMenuRule::default(),
            baseline_system_menu: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Command,
    Demo,
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Helper program for the command backend
    #[serde(default = "default_program")]
    pub program: String,

    /// Extra arguments placed before the request arguments
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            program: default_program(),
            args: Vec::new(),
        }
    }
}

/// Strings shown when the user cancels an install
#[derive(Debug, Clone, Deserialize)]
pub struct CancelConfig {
    #[serde(default = "default_cancel_title")]
    pub title: String,
    #[serde(default = "default_cancel_description")]
    pub description: String,
}

impl Default for CancelConfig {
    fn default() -> Self {
        Self {
            title: default_cancel_title(),
            description: default_cancel_description(),
        }
    }
}

fn default_width() -> i32 {
    440
}

fn default_height() -> i32 {
    550
}

fn default_surface_height() -> i32 {
    476
}

fn default_slide_ms() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_program() -> String {
    "bootmaker-helper".to_string()
}

fn default_cancel_title() -> String {
    "Installation cancelled".to_string()
}

fn default_cancel_description() -> String {
    "The boot disk was not finished. The device may be left in an unusable state.".to_string()
}

impl WizardConfig {
    /// Default config location: `$XDG_CONFIG_HOME/bootmaker/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bootmaker").join("config.toml"))
    }

    /// Load from an explicit path, or the default path if present, or defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_str(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let window = &self.window;

        if window.width <= 0 || window.height <= 0 || window.surface_height <= 0 {
            anyhow::bail!(
                "Window dimensions must be positive, got {}x{} (surface height {})",
                window.width,
                window.height,
                window.surface_height
            );
        }

        if window.surface_height > window.height {
            anyhow::bail!(
                "Surface height {} exceeds window height {}",
                window.surface_height,
                window.height
            );
        }

        if window.slide_duration_ms > MAX_SLIDE_MS {
            anyhow::bail!(
                "Slide duration must be at most {}ms, got: {}",
                MAX_SLIDE_MS,
                window.slide_duration_ms
            );
        }

        if self.backend.kind == BackendKind::Command && self.backend.program.trim().is_empty() {
            anyhow::bail!("The command backend needs a helper program");
        }

        Ok(())
    }

    pub fn slide_duration(&self) -> Duration {
        Duration::from_millis(self.window.slide_duration_ms)
    }

    pub fn chrome_policy(&self) -> ChromePolicy {
        ChromePolicy::new(self.chrome.baseline_system_menu, self.chrome.system_menu)
    }

    /// Build the configured backend
    pub fn backend(&self) -> Box<dyn BackendGateway> {
        match self.backend.kind {
            BackendKind::Command => Box::new(CommandBackend::new(
                self.backend.program.clone(),
                self.backend.args.clone(),
            )),
            BackendKind::Demo => Box::new(DemoBackend::default()),
        }
    }
}
