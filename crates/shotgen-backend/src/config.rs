//! Backend configuration.
//!
//! Exactly which backends exist is decided once at startup from the
//! credential sets present in the environment:
//! - `GEMINI_API_KEY` (or `GOOGLE_API_KEY`) enables the hosted Gemini API
//! - `VERTEX_PROJECT_ID` (or `GOOGLE_CLOUD_PROJECT`) enables Vertex AI

use std::path::PathBuf;
use std::time::Duration;

use shotgen_models::BackendKind;

use crate::error::{BackendError, BackendResult};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_VERTEX_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_VERTEX_REGION: &str = "us-central1";

/// Generation parameters and HTTP tuning shared by both adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct CallTuning {
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Per-request HTTP timeout
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for CallTuning {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            max_output_tokens: 8192,
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Hosted Gemini API settings.
#[derive(Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub tuning: CallTuning,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("tuning", &self.tuning)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            tuning: CallTuning::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Vertex AI settings.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexConfig {
    pub project_id: String,
    pub region: String,
    pub model: String,
    /// Service account JSON; the ambient credential chain is used when absent
    pub credentials_path: Option<PathBuf>,
    /// Endpoint override, defaults to the regional aiplatform host
    pub base_url: Option<String>,
    pub tuning: CallTuning,
}

impl VertexConfig {
    pub fn new(project_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            region: region.into(),
            model: DEFAULT_VERTEX_MODEL.to_string(),
            credentials_path: None,
            base_url: None,
            tuning: CallTuning::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Full `generateContent` URL for the configured model.
    pub fn endpoint(&self) -> String {
        let base = self
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", self.region));
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            base.trim_end_matches('/'),
            self.project_id,
            self.region,
            self.model
        )
    }
}

/// Credential sets resolved at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendSettings {
    pub gemini: Option<GeminiConfig>,
    pub vertex: Option<VertexConfig>,
    /// Default backend when both are configured
    pub preferred: Option<BackendKind>,
}

impl BackendSettings {
    /// Create settings from environment variables.
    pub fn from_env() -> BackendResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> BackendResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut tuning = CallTuning::default();
        if let Some(v) = get("SHOTGEN_TEMPERATURE") {
            tuning.temperature = v.parse().map_err(|_| {
                BackendError::configuration(format!("SHOTGEN_TEMPERATURE is not a number: {}", v))
            })?;
        }
        if let Some(v) = get("SHOTGEN_MAX_OUTPUT_TOKENS").and_then(|s| s.parse().ok()) {
            tuning.max_output_tokens = v;
        }
        if let Some(v) = get("SHOTGEN_BACKEND_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            tuning.timeout = Duration::from_secs(v);
        }
        if let Some(v) = get("SHOTGEN_CONNECT_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            tuning.connect_timeout = Duration::from_secs(v);
        }

        let gemini = get("GEMINI_API_KEY")
            .or_else(|| get("GOOGLE_API_KEY"))
            .map(|api_key| GeminiConfig {
                api_key,
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: get("GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                tuning: tuning.clone(),
            });

        let vertex = get("VERTEX_PROJECT_ID")
            .or_else(|| get("GOOGLE_CLOUD_PROJECT"))
            .map(|project_id| VertexConfig {
                project_id,
                region: get("VERTEX_REGION")
                    .or_else(|| get("GOOGLE_CLOUD_LOCATION"))
                    .unwrap_or_else(|| DEFAULT_VERTEX_REGION.to_string()),
                model: get("VERTEX_MODEL").unwrap_or_else(|| DEFAULT_VERTEX_MODEL.to_string()),
                credentials_path: get("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
                base_url: get("VERTEX_BASE_URL"),
                tuning: tuning.clone(),
            });

        let preferred = match get("SHOTGEN_BACKEND") {
            Some(v) => Some(v.parse::<BackendKind>().map_err(BackendError::configuration)?),
            None => None,
        };

        let settings = Self {
            gemini,
            vertex,
            preferred,
        };
        settings.default_kind()?;
        Ok(settings)
    }

    /// Backend used when a batch carries no override.
    ///
    /// The preferred backend wins when it is configured, then the hosted API,
    /// then Vertex.
    pub fn default_kind(&self) -> BackendResult<BackendKind> {
        match self.preferred {
            Some(kind) if self.is_configured(kind) => return Ok(kind),
            Some(kind) => {
                return Err(BackendError::configuration(format!(
                    "SHOTGEN_BACKEND={} but no credentials for it are set",
                    kind
                )))
            }
            None => {}
        }

        if self.gemini.is_some() {
            Ok(BackendKind::Gemini)
        } else if self.vertex.is_some() {
            Ok(BackendKind::Vertex)
        } else {
            Err(BackendError::configuration(
                "No backend configured. Set GEMINI_API_KEY for the hosted API \
                 or VERTEX_PROJECT_ID (+ VERTEX_REGION) for Vertex AI.",
            ))
        }
    }

    pub fn is_configured(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Gemini => self.gemini.is_some(),
            BackendKind::Vertex => self.vertex.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_no_credentials_is_configuration_error() {
        let err = BackendSettings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, BackendError::Configuration(_)));
    }

    #[test]
    fn test_empty_values_count_as_absent() {
        let result = BackendSettings::from_lookup(lookup(&[
            ("GEMINI_API_KEY", ""),
            ("VERTEX_PROJECT_ID", "  "),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_gemini_only() {
        let settings =
            BackendSettings::from_lookup(lookup(&[("GEMINI_API_KEY", "k-123")])).unwrap();
        assert_eq!(settings.default_kind().unwrap(), BackendKind::Gemini);
        let gemini = settings.gemini.unwrap();
        assert_eq!(gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(gemini.base_url, DEFAULT_GEMINI_BASE_URL);
        assert!(settings.vertex.is_none());
    }

    #[test]
    fn test_vertex_only_with_defaults() {
        let settings = BackendSettings::from_lookup(lookup(&[
            ("GOOGLE_CLOUD_PROJECT", "film-prod"),
            ("GOOGLE_APPLICATION_CREDENTIALS", "/secrets/sa.json"),
        ]))
        .unwrap();
        assert_eq!(settings.default_kind().unwrap(), BackendKind::Vertex);
        let vertex = settings.vertex.unwrap();
        assert_eq!(vertex.region, DEFAULT_VERTEX_REGION);
        assert_eq!(
            vertex.credentials_path,
            Some(PathBuf::from("/secrets/sa.json"))
        );
    }

    #[test]
    fn test_hosted_api_wins_when_both_present() {
        let settings = BackendSettings::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("VERTEX_PROJECT_ID", "p"),
        ]))
        .unwrap();
        assert_eq!(settings.default_kind().unwrap(), BackendKind::Gemini);
        assert!(settings.is_configured(BackendKind::Vertex));
    }

    #[test]
    fn test_preferred_backend() {
        let settings = BackendSettings::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("VERTEX_PROJECT_ID", "p"),
            ("SHOTGEN_BACKEND", "vertex"),
        ]))
        .unwrap();
        assert_eq!(settings.default_kind().unwrap(), BackendKind::Vertex);
    }

    #[test]
    fn test_preferred_backend_without_credentials() {
        let err = BackendSettings::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("SHOTGEN_BACKEND", "vertex"),
        ]))
        .unwrap_err();
        assert!(matches!(err, BackendError::Configuration(_)));
    }

    #[test]
    fn test_tuning_overrides() {
        let settings = BackendSettings::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("SHOTGEN_TEMPERATURE", "0.9"),
            ("SHOTGEN_BACKEND_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        let tuning = settings.gemini.unwrap().tuning;
        assert_eq!(tuning.temperature, 0.9);
        assert_eq!(tuning.timeout, Duration::from_secs(15));
        assert_eq!(tuning.max_output_tokens, 8192);
    }

    #[test]
    fn test_vertex_endpoint() {
        let mut config = VertexConfig::new("film-prod", "europe-west4");
        config.model = "gemini-2.5-pro".to_string();
        assert_eq!(
            config.endpoint(),
            "https://europe-west4-aiplatform.googleapis.com/v1/projects/film-prod/locations/europe-west4/publishers/google/models/gemini-2.5-pro:generateContent"
        );

        let config = config.with_base_url("http://127.0.0.1:9000/");
        assert!(config
            .endpoint()
            .starts_with("http://127.0.0.1:9000/v1/projects/film-prod/"));
    }

    #[test]
    fn test_api_key_redacted_in_debug() {
        let config = GeminiConfig::new("super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::remove_var("VERTEX_PROJECT_ID");
        std::env::remove_var("GOOGLE_CLOUD_PROJECT");
        std::env::remove_var("GOOGLE_API_KEY");
        std::env::remove_var("SHOTGEN_BACKEND");
        std::env::set_var("GEMINI_API_KEY", "from-env");
        let settings = BackendSettings::from_env().unwrap();
        assert_eq!(settings.gemini.unwrap().api_key, "from-env");
        std::env::remove_var("GEMINI_API_KEY");
    }
}
