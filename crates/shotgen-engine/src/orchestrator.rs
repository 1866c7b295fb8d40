//! Batch orchestration.
//!
//! A batch fans out into one future per segment. A semaphore sized by the
//! batch concurrency gates them: each segment holds a permit for its whole
//! call-plus-parse cycle, retry backoff included. Results are joined in
//! input order and a failing segment never affects its siblings.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use shotgen_backend::{BackendError, BackendRegistry, GenerationBackend};
use shotgen_models::{
    BatchSubmission, GenerationOptions, SegmentGenerationResult, SegmentRequest,
    ShotListDescription,
};
use tokio::sync::Semaphore;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;
use validator::Validate;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::metrics;
use crate::parser;
use crate::prompt;
use crate::retry::{RetryPolicy, RetryResult};

const SEGMENT_OPERATION: &str = "generate_segment";

/// Settings resolved for one batch during pre-flight.
struct BatchPlan {
    backend: Arc<dyn GenerationBackend>,
    policy: RetryPolicy,
    concurrency: usize,
    base_index: u32,
}

/// Generates shot lists for batches of segments.
pub struct GenerationEngine {
    registry: Arc<BackendRegistry>,
    config: EngineConfig,
}

impl GenerationEngine {
    pub fn new(registry: Arc<BackendRegistry>, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    /// Engine over the shared registry with configuration from the environment.
    pub async fn from_env() -> EngineResult<Self> {
        let registry = shotgen_backend::shared_registry()
            .await
            .map_err(|e| EngineError::configuration(e.to_string()))?;
        Ok(Self::new(registry, EngineConfig::from_env()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub async fn generate_submission(
        &self,
        submission: &BatchSubmission,
    ) -> EngineResult<Vec<SegmentGenerationResult>> {
        let options = submission.options.clone().unwrap_or_default();
        self.generate_batch(&submission.segments, &options).await
    }

    /// Generate a shot list for every segment.
    ///
    /// Only pre-flight problems fail the call; per-segment failures are
    /// reported in the corresponding result. Results keep input order.
    pub async fn generate_batch(
        &self,
        segments: &[SegmentRequest],
        options: &GenerationOptions,
    ) -> EngineResult<Vec<SegmentGenerationResult>> {
        let plan = self.plan(segments, options)?;
        let batch_id = Uuid::new_v4();

        let span = info_span!(
            "generate_batch",
            %batch_id,
            segments = segments.len(),
            backend = %plan.backend.kind(),
            mode = %options.mode,
        );

        let results = async {
            info!(
                concurrency = plan.concurrency,
                max_attempts = plan.policy.max_attempts,
                "Starting batch"
            );
            let started = Instant::now();
            let gate = Semaphore::new(plan.concurrency);

            let tasks = segments.iter().enumerate().map(|(position, segment)| {
                let segment_index = plan.base_index.saturating_add(position as u32);
                self.run_segment(&plan, &gate, options, segment_index, segment)
            });
            let results = join_all(tasks).await;

            let succeeded = results.iter().filter(|r| r.success).count();
            info!(
                succeeded,
                failed = results.len() - succeeded,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Batch completed"
            );
            results
        }
        .instrument(span)
        .await;

        Ok(results)
    }

    /// Pre-flight checks. Nothing here touches a backend.
    fn plan(
        &self,
        segments: &[SegmentRequest],
        options: &GenerationOptions,
    ) -> EngineResult<BatchPlan> {
        if segments.is_empty() {
            return Err(EngineError::invalid_batch("batch contains no segments"));
        }

        for (position, segment) in segments.iter().enumerate() {
            segment.validate().map_err(|e| {
                EngineError::invalid_batch(format!("segment {}: {}", position, e))
            })?;
        }

        let concurrency = options.concurrency.unwrap_or(self.config.concurrency);
        if concurrency == 0 {
            return Err(EngineError::invalid_batch("concurrency must be at least 1"));
        }

        let mut policy = self.config.retry.clone();
        if let Some(max_retries) = options.max_retries {
            if max_retries == 0 {
                return Err(EngineError::invalid_batch("maxRetries must be at least 1"));
            }
            policy.max_attempts = max_retries;
        }
        if let Some(retry_parse) = options.retry_parse_errors {
            policy.retry_parse_errors = retry_parse;
        }

        let backend = self
            .registry
            .resolve(options.backend)
            .map_err(|e| EngineError::invalid_batch(e.to_string()))?;

        Ok(BatchPlan {
            backend,
            policy,
            concurrency,
            base_index: options.segment_index.unwrap_or(0),
        })
    }

    async fn run_segment(
        &self,
        plan: &BatchPlan,
        gate: &Semaphore,
        options: &GenerationOptions,
        segment_index: u32,
        segment: &SegmentRequest,
    ) -> SegmentGenerationResult {
        let span = info_span!(
            "segment",
            segment_index,
            segment_id = segment.id.as_deref().unwrap_or("-"),
        );

        async {
            let prompt = prompt::build(segment, options);
            let backend = plan.backend.as_ref();
            let kind = backend.kind();

            let (outcome, latency_ms) = {
                let _permit = match gate.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let error = EngineError::configuration("concurrency gate closed");
                        return SegmentGenerationResult::failed(
                            segment_index,
                            error.to_error_info(),
                            kind,
                            0,
                            0,
                        );
                    }
                };
                // The permit spans every attempt and backoff sleep of this segment.
                debug!("Permit acquired");

                let started = Instant::now();
                let outcome = plan
                    .policy
                    .execute(SEGMENT_OPERATION, || self.attempt(backend, &prompt))
                    .await;
                (outcome, started.elapsed().as_millis() as u64)
            };

            let result = match outcome {
                RetryResult::Success {
                    value: (shot_list, model),
                    attempts,
                } => {
                    info!(
                        attempts,
                        shots = shot_list.shots.len(),
                        latency_ms,
                        "Segment generated"
                    );
                    SegmentGenerationResult::succeeded(
                        segment_index,
                        shot_list,
                        kind,
                        model,
                        attempts,
                        latency_ms,
                    )
                }
                RetryResult::Failed { error, attempts } => {
                    warn!(
                        attempts,
                        kind = %error.kind(),
                        error = %error,
                        "Segment failed"
                    );
                    SegmentGenerationResult::failed(
                        segment_index,
                        error.to_error_info(),
                        kind,
                        attempts,
                        latency_ms,
                    )
                }
            };

            metrics::record_segment(result.success);
            result
        }
        .instrument(span)
        .await
    }

    /// One timeout-bounded backend call followed by parsing.
    async fn attempt(
        &self,
        backend: &dyn GenerationBackend,
        prompt: &str,
    ) -> EngineResult<(ShotListDescription, String)> {
        let timeout = self.config.call_timeout;
        let call = match tokio::time::timeout(timeout, backend.call(prompt)).await {
            Ok(result) => result?,
            Err(_) => return Err(timeout_error(timeout).into()),
        };

        let shot_list = parser::parse(&call)?;
        Ok((shot_list, call.model))
    }
}

fn timeout_error(timeout: Duration) -> BackendError {
    BackendError::Timeout(format!("no response within {}s", timeout.as_secs_f64()))
}
