use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::model::ExportSettings;
use crate::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub waveform: WaveformConfig,
    /// Defaults used when an export request does not override them.
    #[serde(default)]
    pub export: ExportSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_address")]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Quiescence window before a changed input set re-triggers the
    /// buffer → combine chain.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Latency samples kept per operation.
    #[serde(default = "default_metrics_window")]
    pub window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveformConfig {
    /// Width of the full arrangement in path units.
    #[serde(default = "default_waveform_width")]
    pub width: f64,
    /// Shift each combine fragment by `startOffset * width` before
    /// appending.  Off when the backend already renders absolute X.
    #[serde(default)]
    pub shift_fragments: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            address: default_backend_address(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl PipelineConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            window: default_metrics_window(),
        }
    }
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            width: default_waveform_width(),
            shift_fragments: false,
        }
    }
}

fn default_backend_address() -> String {
    platform::BACKEND_TCP_ADDRESS.to_string()
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_metrics_window() -> usize {
    100
}

fn default_waveform_width() -> f64 {
    1000.0
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load `path`, writing the defaults there first when it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            info!("config: wrote defaults to {}", path.display());
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        debug!("config: loaded {}", path.display());
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.address, "127.0.0.1:9877");
        assert_eq!(config.pipeline.debounce(), Duration::from_secs(1));
        assert_eq!(config.metrics.window, 100);
        assert!(!config.waveform.shift_fragments);
        assert_eq!(config.export.sample_rate, 44100);
        assert_eq!(config.export.format, "wav");
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.metrics.window, 100);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[pipeline]\ndebounce_ms = 250\n\n[export]\nformat = \"mp3\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.pipeline.debounce_ms, 250);
        assert_eq!(config.export.format, "mp3");
        assert_eq!(config.export.sample_rate, 44100);
        assert_eq!(config.backend.address, "127.0.0.1:9877");
    }
}
