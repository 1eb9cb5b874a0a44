//! Configuration for the profiling collector

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{ProfilingError, ProfilingResult};

pub const DEFAULT_FILE_PREFIX: &str = "mango_profiling";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilingConfig {
    /// Directory the JSON profile is written into
    pub output_dir: PathBuf,
    pub file_prefix: String,
    /// Print the console summary and the saved-file line on dump
    pub print_summary: bool,
    /// Persist the JSON profile on dump (still subject to the sample gate)
    pub persist: bool,
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            print_summary: true,
            persist: true,
        }
    }
}

impl ProfilingConfig {
    pub fn load_from_file(path: &Path) -> ProfilingResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProfilingError::configuration_error("config", &format!("Failed to read config file: {}", e)))?;

        let config: ProfilingConfig = serde_json::from_str(&content)
            .map_err(|e| ProfilingError::configuration_error("config", &format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        tracing::info!("Profiling configuration loaded from {:?}", path);
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> ProfilingResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ProfilingError::configuration_error("config", &format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ProfilingError::configuration_error("config", &format!("Failed to write config file: {}", e)))?;

        tracing::info!("Profiling configuration saved to {:?}", path);
        Ok(())
    }

    /// The prefix becomes part of a file name, so it must be a single path component.
    pub fn validate(&self) -> ProfilingResult<()> {
        if self.file_prefix.is_empty() {
            return Err(ProfilingError::configuration_error("file_prefix", "must not be empty"));
        }
        if self.file_prefix.contains(['/', '\\']) {
            return Err(ProfilingError::configuration_error(
                "file_prefix",
                &format!("'{}' must not contain path separators", self.file_prefix),
            ));
        }
        Ok(())
    }
}

/// Create a configuration builder for easy setup
pub struct ConfigBuilder {
    config: ProfilingConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ProfilingConfig::default(),
        }
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.file_prefix = prefix.into();
        self
    }

    pub fn print_summary(mut self, enabled: bool) -> Self {
        self.config.print_summary = enabled;
        self
    }

    pub fn persist(mut self, enabled: bool) -> Self {
        self.config.persist = enabled;
        self
    }

    pub fn build(self) -> ProfilingResult<ProfilingConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
