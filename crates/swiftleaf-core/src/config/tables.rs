use super::defaults;
use super::models::{AppConfig, LogLevel};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    reading: ReadingConfig,
    #[serde(default)]
    chunking: ChunkingConfig,
    #[serde(default)]
    ocr: OcrConfig,
    #[serde(default)]
    service: ServiceConfig,
    #[serde(default)]
    keys: KeysConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            default_wpm: tables.reading.wpm,
            min_wpm: tables.reading.min_wpm,
            max_wpm: tables.reading.max_wpm,
            wpm_step: tables.reading.wpm_step,
            skip_chunks: tables.reading.skip_chunks,
            min_words: tables.reading.min_words,
            batch_words: tables.chunking.batch_words,
            max_retries: tables.chunking.max_retries,
            ocr_confidence_threshold: tables.ocr.confidence_threshold,
            ocr_language: tables.ocr.language,
            ocr_endpoint: tables.ocr.endpoint,
            service_base_url: tables.service.base_url,
            service_model: tables.service.model,
            service_api_key_env: tables.service.api_key_env,
            service_timeout_secs: tables.service.timeout_secs,
            key_toggle_play_pause: tables.keys.toggle_play_pause,
            key_skip_backward: tables.keys.skip_backward,
            key_skip_forward: tables.keys.skip_forward,
            key_restart: tables.keys.restart,
            data_dir: tables.storage.data_dir,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            reading: ReadingConfig {
                wpm: config.default_wpm,
                min_wpm: config.min_wpm,
                max_wpm: config.max_wpm,
                wpm_step: config.wpm_step,
                skip_chunks: config.skip_chunks,
                min_words: config.min_words,
            },
            chunking: ChunkingConfig {
                batch_words: config.batch_words,
                max_retries: config.max_retries,
            },
            ocr: OcrConfig {
                confidence_threshold: config.ocr_confidence_threshold,
                language: config.ocr_language.clone(),
                endpoint: config.ocr_endpoint.clone(),
            },
            service: ServiceConfig {
                base_url: config.service_base_url.clone(),
                model: config.service_model.clone(),
                api_key_env: config.service_api_key_env.clone(),
                timeout_secs: config.service_timeout_secs,
            },
            keys: KeysConfig {
                toggle_play_pause: config.key_toggle_play_pause.clone(),
                skip_backward: config.key_skip_backward.clone(),
                skip_forward: config.key_skip_forward.clone(),
                restart: config.key_restart.clone(),
            },
            storage: StorageConfig {
                data_dir: config.data_dir.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ReadingConfig {
    #[serde(default = "defaults::default_wpm")]
    wpm: u32,
    #[serde(default = "defaults::default_min_wpm")]
    min_wpm: u32,
    #[serde(default = "defaults::default_max_wpm")]
    max_wpm: u32,
    #[serde(default = "defaults::default_wpm_step")]
    wpm_step: u32,
    #[serde(default = "defaults::default_skip_chunks")]
    skip_chunks: usize,
    #[serde(default = "defaults::default_min_words")]
    min_words: usize,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        ReadingConfig {
            wpm: defaults::default_wpm(),
            min_wpm: defaults::default_min_wpm(),
            max_wpm: defaults::default_max_wpm(),
            wpm_step: defaults::default_wpm_step(),
            skip_chunks: defaults::default_skip_chunks(),
            min_words: defaults::default_min_words(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ChunkingConfig {
    #[serde(default = "defaults::default_batch_words")]
    batch_words: usize,
    #[serde(default = "defaults::default_max_retries")]
    max_retries: u32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        ChunkingConfig {
            batch_words: defaults::default_batch_words(),
            max_retries: defaults::default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct OcrConfig {
    #[serde(default = "defaults::default_ocr_confidence_threshold")]
    confidence_threshold: f32,
    #[serde(default = "defaults::default_ocr_language")]
    language: String,
    #[serde(default)]
    endpoint: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig {
            confidence_threshold: defaults::default_ocr_confidence_threshold(),
            language: defaults::default_ocr_language(),
            endpoint: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ServiceConfig {
    #[serde(default)]
    base_url: String,
    #[serde(default = "defaults::default_service_model")]
    model: String,
    #[serde(default = "defaults::default_service_api_key_env")]
    api_key_env: String,
    #[serde(default = "defaults::default_service_timeout_secs")]
    timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            base_url: String::new(),
            model: defaults::default_service_model(),
            api_key_env: defaults::default_service_api_key_env(),
            timeout_secs: defaults::default_service_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct KeysConfig {
    #[serde(default = "defaults::default_key_toggle_play_pause")]
    toggle_play_pause: String,
    #[serde(default = "defaults::default_key_skip_backward")]
    skip_backward: String,
    #[serde(default = "defaults::default_key_skip_forward")]
    skip_forward: String,
    #[serde(default = "defaults::default_key_restart")]
    restart: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        KeysConfig {
            toggle_play_pause: defaults::default_key_toggle_play_pause(),
            skip_backward: defaults::default_key_skip_backward(),
            skip_forward: defaults::default_key_skip_forward(),
            restart: defaults::default_key_restart(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_data_dir")]
    data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: defaults::default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
