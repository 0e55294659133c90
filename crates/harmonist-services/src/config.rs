//! On-disk configuration (TOML)

use std::path::{Path, PathBuf};

use harmonist_core::{EngineSettings, HarmonizationConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarmonistConfig {
    #[serde(default)]
    pub harmonization: HarmonizationConfig,
    #[serde(default)]
    pub engine: EngineSettings,
}

impl HarmonistConfig {
    /// Harmonization settings with out-of-range values clamped
    pub fn harmonization(&self) -> HarmonizationConfig {
        self.harmonization.sanitized()
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("harmonist")
        .join("config.toml")
}

pub fn read_config(path: &Path) -> Result<HarmonistConfig, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&text)?)
}

/// Config from the default location, or defaults when it is missing or broken
pub fn load_config() -> HarmonistConfig {
    let path = config_path();
    match read_config(&path) {
        Ok(config) => {
            info!(path = %path.display(), "Loaded config");
            config
        }
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => HarmonistConfig::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
            HarmonistConfig::default()
        }
    }
}

pub fn save_config(path: &Path, config: &HarmonistConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(config)?;
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmonist_core::{HarmonyStyle, HarmonyType};

    #[test]
    fn test_partial_file_takes_defaults() {
        let text = r#"
            [harmonization]
            style = "barbershop"
            harmony_type = "parallel"
            voice_count = 3
        "#;
        let config: HarmonistConfig = toml::from_str(text).unwrap();
        assert_eq!(config.harmonization.style, HarmonyStyle::Barbershop);
        assert_eq!(config.harmonization.harmony_type, HarmonyType::Parallel);
        assert_eq!(config.harmonization.voice_count, 3);
        assert!(config.harmonization.use_cache);
        assert_eq!(config.engine, EngineSettings::default());
    }

    #[test]
    fn test_out_of_range_voice_count_is_clamped() {
        let config: HarmonistConfig = toml::from_str("[harmonization]\nvoice_count = 7\n").unwrap();
        assert_eq!(config.harmonization().voice_count, 4);
    }

    #[test]
    fn test_unknown_style_is_rejected() {
        let result: Result<HarmonistConfig, _> = toml::from_str("[harmonization]\nstyle = \"polka\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_read() {
        let dir = std::env::temp_dir().join(format!("harmonist-config-{}", std::process::id()));
        let path = dir.join("config.toml");

        let mut config = HarmonistConfig::default();
        config.harmonization.style = HarmonyStyle::Gospel;
        config.engine.cache_size = 256;

        save_config(&path, &config).unwrap();
        let loaded = read_config(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_config(Path::new("/nonexistent/harmonist/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
