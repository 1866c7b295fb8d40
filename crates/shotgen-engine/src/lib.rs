//! Segment shot-list generation engine.
//!
//! Turns batches of video segment descriptions into structured shot lists:
//! - `prompt` renders the backend prompt for each segment
//! - `parser` recovers and validates the shot list from model output
//! - `retry` classifies failures and backs off between attempts
//! - `orchestrator` runs a batch under a concurrency gate

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod retry;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use orchestrator::GenerationEngine;
pub use parser::ParseError;
pub use retry::{RetryPolicy, RetryResult};
