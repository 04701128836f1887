//! Configuration loading and parsing

use anyhow::{Context, Result};
use can_telemetry_decoder::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Name of the upstream bus subject, informational only: it labels the run
    /// in the log and selects nothing, every frame of the input is decoded
    #[serde(default = "default_subject")]
    pub subject: String,
    /// Sleep the recorded inter-frame delay before each frame
    #[serde(default)]
    pub honor_timing: bool,
    /// Loop over the input file until stopped
    #[serde(default)]
    pub continuous: bool,
}

fn default_subject() -> String {
    "can.raw".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            honor_timing: false,
            continuous: false,
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use can_telemetry_decoder::PublishPolicy;
    use std::path::PathBuf;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [engine]
            data_dir = "/srv/telemetry"
            bus_file = "bus.json"

            [engine.publish]
            mode = "interval"
            interval_ms = 250

            [input]
            honor_timing = true
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.engine.data_dir, PathBuf::from("/srv/telemetry"));
        assert_eq!(config.engine.cell_pack_file, "cell_data.json");
        assert_eq!(config.engine.bus_file, "bus.json");
        assert_eq!(config.engine.publish, PublishPolicy::Interval { interval_ms: 250 });
        assert_eq!(config.input.subject, "can.raw");
        assert!(config.input.honor_timing);
        assert!(!config.input.continuous);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.input.subject, "can.raw");
    }

    #[test]
    fn test_subject_is_only_a_label() {
        let config: AppConfig = toml::from_str("[input]\nsubject = \"can.bms\"\n").unwrap();
        assert_eq!(config.input.subject, "can.bms");
        // no input or engine setting depends on it
        assert_eq!(config.engine, EngineConfig::default());
        assert!(!config.input.honor_timing);
        assert!(!config.input.continuous);
    }

    #[test]
    fn test_load_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[engine\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
