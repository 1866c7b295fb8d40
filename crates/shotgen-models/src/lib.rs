//! Shared data models for shot-list generation.
//!
//! This crate provides Serde-serializable types for:
//! - Segment requests and batch submissions
//! - Generation options (prompt mode, backend override, retry and concurrency knobs)
//! - Shot-list descriptions returned by the backends
//! - Per-segment generation results and error kinds

pub mod options;
pub mod result;
pub mod segment;
pub mod shot;

// Re-export common types
pub use options::{BackendKind, GenerationMode, GenerationOptions};
pub use result::{BackendCallResult, ErrorInfo, ErrorKind, SegmentGenerationResult, TokenUsage};
pub use segment::{BatchSubmission, SegmentRequest, StyleOptions};
pub use shot::{ShotEntry, ShotListDescription};
