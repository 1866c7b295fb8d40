//! Backend call results, error kinds and per-segment generation results.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::options::BackendKind;
use crate::shot::ShotListDescription;

/// Token accounting reported by a backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
}

/// Raw payload returned by one backend call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackendCallResult {
    /// Model output text (expected to contain a JSON object)
    pub text: String,
    /// Backend that served the call
    pub backend: BackendKind,
    /// Model identifier used
    pub model: String,
    /// Wall-clock latency of the call
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// Error taxonomy shared by the engine and its callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ErrorKind {
    InvalidBatch,
    AuthenticationError,
    RateLimited,
    ServerFault,
    NetworkError,
    Timeout,
    MalformedRequest,
    ParseError,
    RetriesExhausted,
    ConfigurationError,
}

impl ErrorKind {
    /// Failures expected to resolve on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimited
                | ErrorKind::ServerFault
                | ErrorKind::NetworkError
                | ErrorKind::Timeout
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidBatch => "invalid_batch",
            ErrorKind::AuthenticationError => "authentication_error",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ServerFault => "server_fault",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::MalformedRequest => "malformed_request",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::RetriesExhausted => "retries_exhausted",
            ErrorKind::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable error attached to a failed segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    /// Kind of the final underlying failure when `kind` is `RetriesExhausted`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_kind: Option<ErrorKind>,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            last_kind: None,
        }
    }
}

/// Outcome for one segment of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SegmentGenerationResult {
    pub segment_index: u32,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_list: Option<ShotListDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub backend_used: BackendKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Backend attempts spent on this segment
    pub attempts: u32,
    /// Total time spent on this segment, including backoff
    pub latency_ms: u64,
}

impl SegmentGenerationResult {
    pub fn succeeded(
        segment_index: u32,
        shot_list: ShotListDescription,
        backend_used: BackendKind,
        model: impl Into<String>,
        attempts: u32,
        latency_ms: u64,
    ) -> Self {
        Self {
            segment_index,
            success: true,
            shot_list: Some(shot_list),
            error: None,
            backend_used,
            model: Some(model.into()),
            attempts,
            latency_ms,
        }
    }

    pub fn failed(
        segment_index: u32,
        error: ErrorInfo,
        backend_used: BackendKind,
        attempts: u32,
        latency_ms: u64,
    ) -> Self {
        Self {
            segment_index,
            success: false,
            shot_list: None,
            error: Some(error),
            backend_used,
            model: None,
            attempts,
            latency_ms,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}
