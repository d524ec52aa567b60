//! Stage execution with automatic progress logging

use std::future::Future;

use transcript_pipeline_sdk::{log_stage_complete, log_stage_failed, log_stage_start};

use crate::error::{PipelineError, Result};
use crate::schema::Stage;

/// Run one stage transition with automatic logging
///
/// Wraps execution with:
/// - `log_stage_start` before execution
/// - `log_stage_complete` on success
/// - `log_stage_failed` on error
///
/// Errors come back tagged with `stage`.
pub async fn run_stage<F, Fut, R>(
    stage: Stage,
    raw_file: &str,
    total_calls: Option<usize>,
    executor: F,
) -> Result<R>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<R>>,
{
    match total_calls {
        Some(total) => {
            log_stage_start!(stage, raw_file, total);
        }
        None => {
            log_stage_start!(stage, raw_file);
        }
    }
    tracing::debug!(%stage, raw_file, "stage started");

    match executor().await {
        Ok(result) => {
            log_stage_complete!(stage, raw_file);
            Ok(result)
        }
        Err(e) => {
            log_stage_failed!(stage, raw_file, e);
            Err(PipelineError::stage(stage, e))
        }
    }
}
