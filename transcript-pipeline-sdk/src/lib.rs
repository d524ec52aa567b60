//! Progress events shared by transcript pipeline runs.
//!
//! Every event is serialized to a single JSON line and emitted through `tracing`
//! under [`EVENT_TARGET`], so a front end can filter on that target and parse the
//! payload after [`EVENT_PREFIX`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `tracing` target used for every emitted event
pub const EVENT_TARGET: &str = "pipeline_event";

/// Marker preceding the JSON payload in the log line
pub const EVENT_PREFIX: &str = "__PIPELINE_EVENT__:";

/// Final state of one raw file within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    /// Every stage ran and the terminal artifact was written
    Processed,
    /// The terminal artifact already existed
    Skipped,
    /// A stage failed; nothing marks the file as done
    Failed,
}

/// Structured logging events emitted while a run progresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    RunStarted {
        run_id: Uuid,
        source: String,
        mode: String,
        total_files: usize,
    },
    RunCompleted {
        run_id: Uuid,
        processed: usize,
        skipped: usize,
        failed: usize,
    },
    FileStarted {
        source: String,
        raw_file: String,
    },
    FileFinished {
        source: String,
        raw_file: String,
        outcome: FileOutcome,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    StageStarted {
        stage: String,
        raw_file: String,
        /// Number of model calls the stage will issue, when known up front
        total_calls: Option<usize>,
    },
    StageCompleted {
        stage: String,
        raw_file: String,
    },
    StageFailed {
        stage: String,
        raw_file: String,
        error: String,
    },
    ModelCall {
        stage: String,
        call: usize,
        total_calls: usize,
    },
    ArtifactPersisted {
        stage: String,
        path: String,
    },
}

impl PipelineEvent {
    /// Emit this event as a JSON line on the event target
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            tracing::info!(target: EVENT_TARGET, "{}{}", EVENT_PREFIX, json);
        }
    }
}

#[macro_export]
macro_rules! log_stage_start {
    ($stage:expr, $raw_file:expr) => {
        $crate::PipelineEvent::StageStarted {
            stage: $stage.to_string(),
            raw_file: $raw_file.to_string(),
            total_calls: None,
        }
        .emit();
    };
    ($stage:expr, $raw_file:expr, $total:expr) => {
        $crate::PipelineEvent::StageStarted {
            stage: $stage.to_string(),
            raw_file: $raw_file.to_string(),
            total_calls: Some($total),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_complete {
    ($stage:expr, $raw_file:expr) => {
        $crate::PipelineEvent::StageCompleted {
            stage: $stage.to_string(),
            raw_file: $raw_file.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_failed {
    ($stage:expr, $raw_file:expr, $error:expr) => {
        $crate::PipelineEvent::StageFailed {
            stage: $stage.to_string(),
            raw_file: $raw_file.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_model_call {
    ($stage:expr, $call:expr, $total:expr) => {
        $crate::PipelineEvent::ModelCall {
            stage: $stage.to_string(),
            call: $call,
            total_calls: $total,
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_file_start {
    ($source:expr, $raw_file:expr) => {
        $crate::PipelineEvent::FileStarted {
            source: $source.to_string(),
            raw_file: $raw_file.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_file_finished {
    ($source:expr, $raw_file:expr, $outcome:expr) => {
        $crate::PipelineEvent::FileFinished {
            source: $source.to_string(),
            raw_file: $raw_file.to_string(),
            outcome: $outcome,
            detail: None,
        }
        .emit();
    };
    ($source:expr, $raw_file:expr, $outcome:expr, $detail:expr) => {
        $crate::PipelineEvent::FileFinished {
            source: $source.to_string(),
            raw_file: $raw_file.to_string(),
            outcome: $outcome,
            detail: Some($detail.to_string()),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_artifact_persisted {
    ($stage:expr, $path:expr) => {
        $crate::PipelineEvent::ArtifactPersisted {
            stage: $stage.to_string(),
            path: $path.to_string(),
        }
        .emit();
    };
}
