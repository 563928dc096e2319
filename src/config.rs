//! Configuration types.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// How batch progress is reported while the scripted prompts run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressMode {
    /// `floor(i / n) * 100`: stays at 0 until the run completes.
    #[default]
    Legacy,
    /// `i * 100 / n`: grows with each finished prompt.
    Linear,
}

impl ProgressMode {
    /// Percentage to report when prompt `index` of `total` starts.
    pub fn percent(self, index: usize, total: usize) -> u8 {
        if total == 0 {
            return 0;
        }
        let pct = match self {
            Self::Legacy => (index / total) * 100,
            Self::Linear => index * 100 / total,
        };
        pct.min(100) as u8
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct InterviewConfig {
    /// Pause between scripted prompts.
    pub step_delay: Duration,
    /// Sampling temperature sent with every chat call.
    pub temperature: f32,
    pub progress_mode: ProgressMode,
    /// If set, downloads are also written to this directory.
    pub export_dir: Option<PathBuf>,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_secs(1),
            temperature: 0.7,
            progress_mode: ProgressMode::Legacy,
            export_dir: None,
        }
    }
}

/// Process-level configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: SecretString,
    pub api_base: String,
    pub bind_addr: SocketAddr,
    /// Per-request timeout for the chat API. `None` leaves it to reqwest.
    pub request_timeout: Option<Duration>,
    pub interview: InterviewConfig,
}

impl AppConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let api_base = lookup("OPENAI_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let host = lookup("MARKET_BRIEF_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&lookup, "MARKET_BRIEF_PORT", 5000)?;
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "MARKET_BRIEF_HOST".to_string(),
                    message: format!("{e}"),
                })?;

        let step_delay_ms: u64 = parse_or(&lookup, "MARKET_BRIEF_STEP_DELAY_MS", 1000)?;
        let temperature: f32 = parse_or(&lookup, "MARKET_BRIEF_TEMPERATURE", 0.7)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                key: "MARKET_BRIEF_TEMPERATURE".to_string(),
                message: format!("{temperature} is outside 0.0..=2.0"),
            });
        }

        let request_timeout = match lookup("MARKET_BRIEF_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(parse_value(
                "MARKET_BRIEF_REQUEST_TIMEOUT_SECS",
                &raw,
            )?)),
            None => None,
        };

        let linear: bool = parse_or(&lookup, "MARKET_BRIEF_LINEAR_PROGRESS", false)?;
        let progress_mode = if linear {
            ProgressMode::Linear
        } else {
            ProgressMode::Legacy
        };

        let export_dir = lookup("MARKET_BRIEF_EXPORT_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base,
            bind_addr,
            request_timeout,
            interview: InterviewConfig {
                step_delay: Duration::from_millis(step_delay_ms),
                temperature,
                progress_mode,
                export_dir,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "OPENAI_API_KEY"));

        let err = AppConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_key.expose_secret(), "sk-test");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.bind_addr.port(), 5000);
        assert!(config.request_timeout.is_none());
        assert_eq!(config.interview.step_delay, Duration::from_secs(1));
        assert_eq!(config.interview.progress_mode, ProgressMode::Legacy);
        assert!(config.interview.export_dir.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_API_BASE", "http://localhost:9000/v1/"),
            ("MARKET_BRIEF_HOST", "127.0.0.1"),
            ("MARKET_BRIEF_PORT", "8081"),
            ("MARKET_BRIEF_STEP_DELAY_MS", "0"),
            ("MARKET_BRIEF_TEMPERATURE", "0.2"),
            ("MARKET_BRIEF_REQUEST_TIMEOUT_SECS", "30"),
            ("MARKET_BRIEF_LINEAR_PROGRESS", "true"),
            ("MARKET_BRIEF_EXPORT_DIR", "/tmp/briefs"),
        ]))
        .unwrap();

        assert_eq!(config.api_base, "http://localhost:9000/v1");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8081");
        assert_eq!(config.interview.step_delay, Duration::ZERO);
        assert!((config.interview.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.interview.progress_mode, ProgressMode::Linear);
        assert_eq!(config.interview.export_dir, Some(PathBuf::from("/tmp/briefs")));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("MARKET_BRIEF_PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MARKET_BRIEF_PORT"));

        let err = AppConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("MARKET_BRIEF_TEMPERATURE", "3.5"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn legacy_progress_stays_at_zero_until_done() {
        for i in 0..11 {
            assert_eq!(ProgressMode::Legacy.percent(i, 11), 0);
        }
        assert_eq!(ProgressMode::Legacy.percent(11, 11), 100);
    }

    #[test]
    fn linear_progress_grows() {
        assert_eq!(ProgressMode::Linear.percent(0, 11), 0);
        assert_eq!(ProgressMode::Linear.percent(5, 11), 45);
        assert_eq!(ProgressMode::Linear.percent(10, 11), 90);
        assert_eq!(ProgressMode::Linear.percent(0, 0), 0);
    }
}
