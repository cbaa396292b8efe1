use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Healthlens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Local Ollama instance on its standard port.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Model used when nothing is configured. Deployments pick their own.
pub const DEFAULT_MODEL: &str = "medgemma:4b";

/// Hard deadline for the AI analysis call.
pub const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 180;

/// Transport-level timeout on the HTTP client. Longer than the analysis
/// deadline so the race in the invoker is what decides.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

pub const ENV_OLLAMA_URL: &str = "HEALTHLENS_OLLAMA_URL";
pub const ENV_MODEL: &str = "HEALTHLENS_MODEL";
pub const ENV_ANALYSIS_TIMEOUT_SECS: &str = "HEALTHLENS_ANALYSIS_TIMEOUT_SECS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} must be a positive integer number of seconds, got '{value}'")]
    InvalidTimeout { key: &'static str, value: String },
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "healthlens=debug,info"
    } else {
        "healthlens=info,warn"
    }
}

/// Runtime configuration for the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub ollama_url: String,
    pub model: String,
    pub analysis_timeout: Duration,
    pub http_timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            analysis_timeout: Duration::from_secs(DEFAULT_ANALYSIS_TIMEOUT_SECS),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl AnalyzerConfig {
    /// Defaults overridden by `HEALTHLENS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_OLLAMA_URL).filter(|v| !v.trim().is_empty()) {
            config.ollama_url = url.trim().to_string();
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_ANALYSIS_TIMEOUT_SECS) {
            let secs = parse_timeout_secs(ENV_ANALYSIS_TIMEOUT_SECS, &raw)?;
            config.analysis_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_timeout_secs(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidTimeout {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = AnalyzerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AnalyzerConfig::default());
        assert_eq!(config.analysis_timeout, Duration::from_secs(180));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AnalyzerConfig::from_lookup(lookup_from(&[
            (ENV_OLLAMA_URL, "http://gpu-box:11434"),
            (ENV_MODEL, "llama3.1:8b"),
            (ENV_ANALYSIS_TIMEOUT_SECS, "60"),
        ]))
        .unwrap();
        assert_eq!(config.ollama_url, "http://gpu-box:11434");
        assert_eq!(config.model, "llama3.1:8b");
        assert_eq!(config.analysis_timeout, Duration::from_secs(60));
    }

    #[test]
    fn blank_values_keep_defaults() {
        let config = AnalyzerConfig::from_lookup(lookup_from(&[(ENV_MODEL, "   ")])).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn rejects_zero_or_garbage_timeout() {
        for bad in ["0", "soon", "-5"] {
            let result =
                AnalyzerConfig::from_lookup(lookup_from(&[(ENV_ANALYSIS_TIMEOUT_SECS, bad)]));
            assert!(matches!(result, Err(ConfigError::InvalidTimeout { .. })));
        }
    }

    #[test]
    fn app_name_is_healthlens() {
        assert_eq!(APP_NAME, "Healthlens");
    }

    #[test]
    fn http_timeout_outlasts_analysis_deadline() {
        assert!(DEFAULT_HTTP_TIMEOUT_SECS > DEFAULT_ANALYSIS_TIMEOUT_SECS);
    }
}
