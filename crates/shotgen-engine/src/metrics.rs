//! Engine metrics.

use metrics::counter;
use shotgen_models::ErrorKind;

pub mod names {
    pub const RETRIES_TOTAL: &str = "shotgen_retries_total";
    pub const SEGMENTS_TOTAL: &str = "shotgen_segments_total";
}

/// Record a retry scheduled after a transient failure.
pub fn record_retry(operation: &str, kind: ErrorKind) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record a finished segment.
pub fn record_segment(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(names::SEGMENTS_TOTAL, "outcome" => outcome).increment(1);
}
