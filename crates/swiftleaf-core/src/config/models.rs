use serde::Deserialize;

/// Flat reader configuration; built from the sectioned TOML tables.
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_wpm")]
    pub default_wpm: u32,
    #[serde(default = "crate::config::defaults::default_min_wpm")]
    pub min_wpm: u32,
    #[serde(default = "crate::config::defaults::default_max_wpm")]
    pub max_wpm: u32,
    #[serde(default = "crate::config::defaults::default_wpm_step")]
    pub wpm_step: u32,
    #[serde(default = "crate::config::defaults::default_skip_chunks")]
    pub skip_chunks: usize,
    #[serde(default = "crate::config::defaults::default_min_words")]
    pub min_words: usize,
    #[serde(default = "crate::config::defaults::default_batch_words")]
    pub batch_words: usize,
    #[serde(default = "crate::config::defaults::default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "crate::config::defaults::default_ocr_confidence_threshold")]
    pub ocr_confidence_threshold: f32,
    #[serde(default = "crate::config::defaults::default_ocr_language")]
    pub ocr_language: String,
    /// Empty disables image input.
    #[serde(default)]
    pub ocr_endpoint: String,
    /// Empty means no language model; chunking falls back locally.
    #[serde(default)]
    pub service_base_url: String,
    #[serde(default = "crate::config::defaults::default_service_model")]
    pub service_model: String,
    #[serde(default = "crate::config::defaults::default_service_api_key_env")]
    pub service_api_key_env: String,
    #[serde(default = "crate::config::defaults::default_service_timeout_secs")]
    pub service_timeout_secs: u64,
    #[serde(default = "crate::config::defaults::default_key_toggle_play_pause")]
    pub key_toggle_play_pause: String,
    #[serde(default = "crate::config::defaults::default_key_skip_backward")]
    pub key_skip_backward: String,
    #[serde(default = "crate::config::defaults::default_key_skip_forward")]
    pub key_skip_forward: String,
    #[serde(default = "crate::config::defaults::default_key_restart")]
    pub key_restart: String,
    #[serde(default = "crate::config::defaults::default_data_dir")]
    pub data_dir: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        use crate::config::defaults::*;
        AppConfig {
            default_wpm: default_wpm(),
            min_wpm: default_min_wpm(),
            max_wpm: default_max_wpm(),
            wpm_step: default_wpm_step(),
            skip_chunks: default_skip_chunks(),
            min_words: default_min_words(),
            batch_words: default_batch_words(),
            max_retries: default_max_retries(),
            ocr_confidence_threshold: default_ocr_confidence_threshold(),
            ocr_language: default_ocr_language(),
            ocr_endpoint: String::new(),
            service_base_url: String::new(),
            service_model: default_service_model(),
            service_api_key_env: default_service_api_key_env(),
            service_timeout_secs: default_service_timeout_secs(),
            key_toggle_play_pause: default_key_toggle_play_pause(),
            key_skip_backward: default_key_skip_backward(),
            key_skip_forward: default_key_skip_forward(),
            key_restart: default_key_restart(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Pull out-of-range values back into bounds.
    pub fn clamped(mut self) -> Self {
        use crate::config::defaults::*;
        if self.min_wpm == 0 {
            self.min_wpm = default_min_wpm();
        }
        if self.max_wpm < self.min_wpm {
            self.max_wpm = self.min_wpm;
        }
        if self.wpm_step == 0 {
            self.wpm_step = default_wpm_step();
        }
        self.default_wpm = self.default_wpm.clamp(self.min_wpm, self.max_wpm);
        self.batch_words = self.batch_words.max(1);
        self.ocr_confidence_threshold = if self.ocr_confidence_threshold.is_finite() {
            self.ocr_confidence_threshold.clamp(0.0, 100.0)
        } else {
            default_ocr_confidence_threshold()
        };
        self
    }

    pub fn has_language_model(&self) -> bool {
        !self.service_base_url.trim().is_empty()
    }

    pub fn has_ocr(&self) -> bool {
        !self.ocr_endpoint.trim().is_empty()
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
