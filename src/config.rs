//! Settings file.
//!
//! Read from `<config dir>/clipcalc/config.toml`. A missing file means
//! defaults; every field may be omitted.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calculator::{Calculator, CapabilityKind};

/// Which optional capabilities the calculator is built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub symbolic: bool,
    pub calendar: bool,
    pub statistics: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            symbolic: true,
            calendar: true,
            statistics: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Clipboard sampling period.
    pub monitoring_interval_ms: u64,
    pub max_history_items: usize,
    /// Copy each successful result back to the clipboard.
    pub auto_copy_result: bool,
    pub capabilities: Capabilities,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitoring_interval_ms: 500,
            max_history_items: 20,
            auto_copy_result: false,
            capabilities: Capabilities::default(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("clipcalc").join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => {
                    debug!("No config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// A calculator with exactly the capabilities this config enables.
    pub fn calculator(&self) -> Calculator {
        let caps = self.capabilities;
        [
            (caps.symbolic, CapabilityKind::SymbolicAlgebra),
            (caps.calendar, CapabilityKind::CalendarArithmetic),
            (caps.statistics, CapabilityKind::Statistics),
        ]
        .into_iter()
        .filter(|(enabled, _)| !enabled)
        .fold(Calculator::new(), |calc, (_, kind)| calc.without(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::Phase;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "auto_copy_result = true\n\n[capabilities]\nstatistics = false\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.auto_copy_result);
        assert_eq!(config.monitoring_interval_ms, 500);
        assert!(config.capabilities.symbolic);
        assert!(!config.capabilities.statistics);

        let calc = config.calculator();
        assert_eq!(calc.phase(CapabilityKind::Statistics), Phase::Unnotified);
        assert_eq!(calc.phase(CapabilityKind::CalendarArithmetic), Phase::Available);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            max_history_items: 5,
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "monitoring_interval_ms = \"soon\"").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
