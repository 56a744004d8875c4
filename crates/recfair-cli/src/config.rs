//! Configuration loading and path resolution for the CLI.
//!
//! Metric configuration is a JSON file deserialized into [`MetricConfig`].
//! The file is located as follows:
//! 1. `--config PATH` on the command line
//! 2. `$RECFAIR_CONFIG` environment variable
//! 3. `config.json` in the platform config directory
//! 4. Built-in defaults

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use recfair_core::config::MetricConfig;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;

/// Config file name inside the platform config directory
const CONFIG_FILENAME: &str = "config.json";

/// Environment variable pointing at a config file
const CONFIG_ENV: &str = "RECFAIR_CONFIG";

/// Returns the platform config directory.
///
/// - macOS: `~/Library/Application Support/dev.recfair.Recfair/`
/// - Linux: `~/.config/recfair/`
/// - Windows: `%APPDATA%\recfair\Recfair\config\`
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("dev", "recfair", "Recfair")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine config directory"))
}

/// Finds the config file to load, if any.
///
/// An explicitly requested file (flag or environment variable) must exist;
/// the platform default is optional.
pub fn find_config_file(custom: Option<&PathBuf>) -> Result<Option<PathBuf>> {
    // 1. Command line
    if let Some(path) = custom {
        return require_file(path.clone(), "--config");
    }

    // 2. Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return require_file(PathBuf::from(path), CONFIG_ENV);
    }

    // 3. Platform config directory
    if let Ok(dir) = config_dir() {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

fn require_file(path: PathBuf, source: &str) -> Result<Option<PathBuf>> {
    if path.exists() {
        Ok(Some(path))
    } else {
        Err(anyhow!(
            "Config file not found: {} (from {})",
            path.display(),
            source
        ))
    }
}

/// Loads the metric configuration, falling back to defaults.
pub fn load_metric_config(custom: Option<&PathBuf>) -> Result<MetricConfig> {
    match find_config_file(custom)? {
        Some(path) => {
            info!("Loading config: {}", path.display());
            read_json(&path)
        }
        None => {
            info!("No config file found, using defaults");
            Ok(MetricConfig::default())
        }
    }
}

/// Reads and deserializes a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("recfair-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_get_config_dir() {
        if let Ok(dir) = config_dir() {
            let dir_str = dir.to_string_lossy().to_lowercase();
            assert!(dir_str.contains("recfair"), "unexpected dir: {}", dir_str);
        }
    }

    #[test]
    fn test_missing_custom_config_is_error() {
        let missing = PathBuf::from("/nonexistent/recfair/config.json");
        assert!(find_config_file(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_custom_config() {
        let path = temp_file("config.json", r#"{"topk": [5, 10], "tail_ratio": 0.3}"#);
        let config = load_metric_config(Some(&path)).unwrap();
        assert_eq!(config.topk, vec![5, 10]);
        assert_eq!(config.tail_ratio, Some(0.3));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_malformed_config_reports_path() {
        let path = temp_file("broken.json", "{ not json");
        let err = load_metric_config(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
        std::fs::remove_file(path).ok();
    }
}
