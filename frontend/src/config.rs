use serde::{Deserialize, Serialize};

use crate::storage;

const SETTINGS_KEY: &str = "settings";
const DEFAULT_API_URL: &str = "https://or-amentos-sistema.onrender.com";
const DEFAULT_LOG_LEVEL: &str = "info";

pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Runtime settings, persisted in localStorage and shared through context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    option_env!("OBRA_LOG_LEVEL")
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_base_url: normalize_base_url(option_env!("OBRA_API_URL").unwrap_or(DEFAULT_API_URL)),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }

    pub fn tracing_level(&self) -> tracing::Level {
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" | "warning" => tracing::Level::WARN,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }
}

pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

pub fn load_config() -> AppConfig {
    match storage::get_json::<AppConfig>(SETTINGS_KEY) {
        Some(mut config) => {
            config.api_base_url = normalize_base_url(&config.api_base_url);
            if config.api_base_url.is_empty() {
                config.api_base_url = AppConfig::default().api_base_url;
            }
            config
        }
        None => AppConfig::default(),
    }
}

pub fn save_config(config: &AppConfig) {
    storage::set_json(SETTINGS_KEY, config);
}

pub fn reset_config() -> AppConfig {
    storage::remove_item(SETTINGS_KEY);
    AppConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = AppConfig {
            api_base_url: normalize_base_url("http://localhost:10000/"),
            log_level: "info".into(),
        };
        assert_eq!(config.endpoint("/atividades"), "http://localhost:10000/atividades");
        assert_eq!(config.endpoint("valor-total"), "http://localhost:10000/valor-total");
    }

    #[rstest]
    #[case("error", tracing::Level::ERROR)]
    #[case("WARN", tracing::Level::WARN)]
    #[case(" debug ", tracing::Level::DEBUG)]
    #[case("trace", tracing::Level::TRACE)]
    #[case("verbose", tracing::Level::INFO)]
    fn log_level_strings(#[case] raw: &str, #[case] expected: tracing::Level) {
        let config = AppConfig {
            api_base_url: String::new(),
            log_level: raw.to_string(),
        };
        assert_eq!(config.tracing_level(), expected);
    }

    #[test]
    fn missing_log_level_falls_back_when_deserializing() {
        let config: AppConfig =
            serde_json::from_str(r#"{"api_base_url":"http://api"}"#).unwrap();
        assert_eq!(config.api_base_url, "http://api");
        assert!(!config.log_level.is_empty());
    }
}
