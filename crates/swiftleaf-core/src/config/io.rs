use super::models::AppConfig;
use super::tables::ConfigTables;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load `path`, falling back to defaults when it is missing or invalid.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            debug!("Parsed configuration from disk");
            config
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err:#}");
            AppConfig::default()
        }
    }
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let tables: ConfigTables =
        toml::from_str(contents).context("failed to parse config tables")?;
    Ok(AppConfig::from(tables).clamped())
}

pub fn serialize_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(&ConfigTables::from(config)).context("failed to serialize config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(parse_config("").unwrap(), AppConfig::default());
    }

    #[test]
    fn reads_sectioned_tables() {
        let config = parse_config(
            r#"
            [reading]
            wpm = 350
            skip_chunks = 5

            [chunking]
            batch_words = 120
            max_retries = 4

            [service]
            base_url = "http://localhost:8080/v1"

            [keys]
            restart = "ctrl+r"

            [logging]
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_wpm, 350);
        assert_eq!(config.skip_chunks, 5);
        assert_eq!(config.min_wpm, 200);
        assert_eq!(config.batch_words, 120);
        assert_eq!(config.max_retries, 4);
        assert!(config.has_language_model());
        assert!(!config.has_ocr());
        assert_eq!(config.key_restart, "ctrl+r");
        assert_eq!(config.key_toggle_play_pause, "space");
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn clamps_out_of_range_values() {
        let config = parse_config(
            r#"
            [reading]
            wpm = 5000
            wpm_step = 0

            [chunking]
            batch_words = 0

            [ocr]
            confidence_threshold = 140.0
            "#,
        )
        .unwrap();

        assert_eq!(config.default_wpm, 1000);
        assert_eq!(config.wpm_step, 50);
        assert_eq!(config.batch_words, 1);
        assert_eq!(config.ocr_confidence_threshold, 100.0);
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut config = AppConfig::default();
        config.default_wpm = 650;
        config.ocr_endpoint = "http://ocr.local/recognize".to_string();

        let text = serialize_config(&config).unwrap();

        assert!(text.contains("[reading]"));
        assert_eq!(parse_config(&text).unwrap(), config);
    }

    #[test]
    fn missing_or_invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_config(&dir.path().join("absent.toml")),
            AppConfig::default()
        );

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[reading\nwpm = ").unwrap();
        assert_eq!(load_config(&broken), AppConfig::default());

        let valid = dir.path().join("config.toml");
        std::fs::write(&valid, "[reading]\nwpm = 300\n").unwrap();
        assert_eq!(load_config(&valid).default_wpm, 300);
    }
}
