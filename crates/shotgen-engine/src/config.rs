//! Engine configuration.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Default concurrency gate size per batch
    pub concurrency: usize,
    /// Default retry policy
    pub retry: RetryPolicy,
    /// Upper bound for a single backend call
    pub call_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            retry: RetryPolicy::default(),
            call_timeout: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_u64 = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());
        let defaults = Self::default();

        let retry = RetryPolicy {
            max_attempts: lookup("SHOTGEN_MAX_RETRIES")
                .and_then(|s| s.trim().parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.retry.max_attempts),
            base_delay: parse_u64("SHOTGEN_RETRY_BASE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.base_delay),
            max_delay: parse_u64("SHOTGEN_RETRY_MAX_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.max_delay),
            retry_parse_errors: lookup("SHOTGEN_RETRY_PARSE_ERRORS")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.retry.retry_parse_errors),
        };

        Self {
            concurrency: lookup("SHOTGEN_CONCURRENCY")
                .and_then(|s| s.trim().parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.concurrency),
            retry,
            call_timeout: parse_u64("SHOTGEN_CALL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.call_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(!config.retry.retry_parse_errors);
        assert_eq!(config.call_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_config_from_lookup() {
        let config = EngineConfig::from_lookup(|key| match key {
            "SHOTGEN_CONCURRENCY" => Some("5".into()),
            "SHOTGEN_MAX_RETRIES" => Some("4".into()),
            "SHOTGEN_RETRY_BASE_MS" => Some("20".into()),
            "SHOTGEN_RETRY_PARSE_ERRORS" => Some("true".into()),
            "SHOTGEN_CALL_TIMEOUT_SECS" => Some("10".into()),
            _ => None,
        });
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.base_delay, Duration::from_millis(20));
        assert!(config.retry.retry_parse_errors);
        assert_eq!(config.call_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_zero_and_garbage_fall_back_to_defaults() {
        let config = EngineConfig::from_lookup(|key| match key {
            "SHOTGEN_CONCURRENCY" => Some("0".into()),
            "SHOTGEN_MAX_RETRIES" => Some("lots".into()),
            _ => None,
        });
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("SHOTGEN_CONCURRENCY", "7");
        std::env::set_var("SHOTGEN_RETRY_MAX_MS", "1000");
        let config = EngineConfig::from_env();
        std::env::remove_var("SHOTGEN_CONCURRENCY");
        std::env::remove_var("SHOTGEN_RETRY_MAX_MS");

        assert_eq!(config.concurrency, 7);
        assert_eq!(config.retry.max_delay, Duration::from_millis(1000));
    }
}
