use super::models::LogLevel;

pub fn default_wpm() -> u32 {
    500
}

pub fn default_min_wpm() -> u32 {
    200
}

pub fn default_max_wpm() -> u32 {
    1000
}

pub fn default_wpm_step() -> u32 {
    50
}

pub fn default_skip_chunks() -> usize {
    10
}

pub fn default_min_words() -> usize {
    10
}

pub fn default_batch_words() -> usize {
    500
}

pub fn default_max_retries() -> u32 {
    2
}

pub fn default_ocr_confidence_threshold() -> f32 {
    60.0
}

pub fn default_ocr_language() -> String {
    "eng".to_string()
}

pub fn default_service_model() -> String {
    "gpt-4o-mini".to_string()
}

pub fn default_service_api_key_env() -> String {
    "SWIFTLEAF_API_KEY".to_string()
}

pub fn default_service_timeout_secs() -> u64 {
    60
}

pub fn default_key_toggle_play_pause() -> String {
    "space".to_string()
}

pub fn default_key_skip_backward() -> String {
    "arrowleft".to_string()
}

pub fn default_key_skip_forward() -> String {
    "arrowright".to_string()
}

pub fn default_key_restart() -> String {
    "r".to_string()
}

pub fn default_data_dir() -> String {
    ".swiftleaf".to_string()
}

pub fn default_log_level() -> LogLevel {
    LogLevel::Info
}
