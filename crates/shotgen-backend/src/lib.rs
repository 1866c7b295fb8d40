//! Generative-AI backend adapters for shot-list generation.
//!
//! This crate provides:
//! - The `GenerationBackend` capability trait
//! - Hosted Gemini API and Vertex AI implementations
//! - Startup backend selection from configured credentials
//! - A process-scoped shared registry
//! - Error classification for the retry policy

pub mod backend;
pub mod config;
pub mod error;
pub mod gemini;
pub mod metrics;
pub mod registry;
pub mod token_cache;
pub mod vertex;
mod wire;

pub use backend::GenerationBackend;
pub use config::{BackendSettings, CallTuning, GeminiConfig, VertexConfig};
pub use error::{BackendError, BackendResult};
pub use gemini::GeminiBackend;
pub use registry::{shared_registry, BackendRegistry};
pub use token_cache::{AccessTokenSource, StaticToken, TokenCache};
pub use vertex::VertexBackend;
