//! Generation options and backend identifiers.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Prompt template selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationMode {
    /// Core shot fields only
    #[default]
    Standard,
    /// Adds framing, lighting, audio and transition detail
    Plus,
    /// Adds per-shot continuity tracking and a hand-off list
    EnhancedContinuity,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Standard => "standard",
            GenerationMode::Plus => "plus",
            GenerationMode::EnhancedContinuity => "enhanced-continuity",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generative-AI backend identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted Gemini API (API key)
    Gemini,
    /// Vertex AI model service (project + region + service credentials)
    Vertex,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Gemini => "gemini",
            BackendKind::Vertex => "vertex",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(BackendKind::Gemini),
            "vertex" => Ok(BackendKind::Vertex),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// Per-batch generation options.
///
/// Unset numeric fields fall back to the engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    /// Prompt template
    #[serde(default)]
    pub mode: GenerationMode,

    /// Base index reported for the first segment of the batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_index: Option<u32>,

    /// Backend override for this batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,

    /// Total attempts allowed per segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Maximum backend calls in flight for the batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Treat parse failures as transient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_parse_errors: Option<bool>,
}

impl GenerationOptions {
    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn with_segment_index(mut self, index: u32) -> Self {
        self.segment_index = Some(index);
        self
    }

    pub fn with_retry_parse_errors(mut self, enabled: bool) -> Self {
        self.retry_parse_errors = Some(enabled);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&GenerationMode::EnhancedContinuity).unwrap(),
            "\"enhanced-continuity\""
        );
        let mode: GenerationMode = serde_json::from_str("\"plus\"").unwrap();
        assert_eq!(mode, GenerationMode::Plus);
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("Vertex".parse::<BackendKind>().unwrap(), BackendKind::Vertex);
        assert_eq!(" gemini ".parse::<BackendKind>().unwrap(), BackendKind::Gemini);
        assert!("openai".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_options_defaults_from_empty_json() {
        let options: GenerationOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, GenerationOptions::default());
        assert_eq!(options.mode, GenerationMode::Standard);
    }

    #[test]
    fn test_options_camel_case() {
        let json = r#"{ "mode": "enhanced-continuity", "segmentIndex": 4, "backend": "vertex",
                        "maxRetries": 5, "concurrency": 2, "retryParseErrors": true }"#;
        let options: GenerationOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.segment_index, Some(4));
        assert_eq!(options.backend, Some(BackendKind::Vertex));
        assert_eq!(options.max_retries, Some(5));
        assert_eq!(options.concurrency, Some(2));
        assert_eq!(options.retry_parse_errors, Some(true));
    }
}
