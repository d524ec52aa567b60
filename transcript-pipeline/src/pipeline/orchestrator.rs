//! Pipeline orchestration
//!
//! Drives each raw file through the five-stage state machine (or the
//! single-pass analysis), persisting every stage's artifact as it goes. Files
//! run one at a time; a failure aborts only the file it happened in.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::fs;
use uuid::Uuid;

use transcript_pipeline_sdk::{
    log_file_finished, log_file_start, log_model_call, FileOutcome, PipelineEvent,
};

use crate::cache::ResumabilityCache;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::executor::StageExecutor;
use crate::pipeline::aggregate::{combine_analyses, combine_segmentations};
use crate::pipeline::state::PipelineState;
use crate::pipeline_utils::{execute_ordered, run_stage};
use crate::schema::{
    AffinityMapping, Analysis, OpenCoding, Segmentation, Stage, StageSchema, ThematicAnalysis,
    ValidationReport,
};
use crate::source::{Identity, StageResult, TranscriptSource};
use crate::splitter;

/// Which entry point a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Segmentation through validation
    FiveStage,
    /// One `analysis` call per batch, combined
    Simplified,
}

impl Mode {
    /// Stage whose artifact marks a file as processed
    pub fn terminal_stage(self) -> Stage {
        match self {
            Mode::FiveStage => Stage::Validation,
            Mode::Simplified => Stage::Analysis,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::FiveStage => "five_stage",
            Mode::Simplified => "simplified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedFile {
    pub raw_file: String,
    pub error: String,
}

/// Outcome of one `process_files` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub source: String,
    pub mode: Mode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub processed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<FailedFile>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Per-file values threaded through every stage
struct FileContext<'a> {
    source: &'a str,
    raw_file: &'a str,
    identity: Identity,
}

pub struct Orchestrator {
    executor: StageExecutor,
    raw_dir: PathBuf,
    output_dir: PathBuf,
    batch_size: usize,
    concurrency: usize,
}

impl Orchestrator {
    pub fn new(executor: StageExecutor, config: &PipelineConfig) -> Self {
        Self {
            executor,
            raw_dir: config.raw_dir.clone(),
            output_dir: config.output_dir.clone(),
            batch_size: config.batch_size,
            concurrency: config.concurrency,
        }
    }

    /// Process `files` from `source` in order
    ///
    /// Only setup failures (output root, cache listing) are returned as errors;
    /// per-file failures are logged and recorded in the summary.
    pub async fn process_files(
        &self,
        source: &TranscriptSource,
        files: &[String],
        mode: Mode,
    ) -> Result<RunSummary> {
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| PipelineError::persistence(&self.output_dir, e))?;
        let mut cache = ResumabilityCache::open(&self.output_dir, mode.terminal_stage()).await?;

        let mut summary = RunSummary {
            run_id: Uuid::new_v4(),
            source: source.name().to_string(),
            mode,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            processed: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        };

        PipelineEvent::RunStarted {
            run_id: summary.run_id,
            source: summary.source.clone(),
            mode: mode.as_str().to_string(),
            total_files: files.len(),
        }
        .emit();
        tracing::info!(
            run_id = %summary.run_id,
            source = source.name(),
            mode = mode.as_str(),
            files = files.len(),
            already_processed = cache.processed_count(),
            "starting run"
        );

        for raw_file in files.iter().map(String::as_str) {
            log_file_start!(source.name(), raw_file);

            match self.process_file(&mut cache, source, raw_file, mode).await {
                Ok(FileOutcome::Skipped) => {
                    tracing::info!(source = source.name(), raw_file, "already processed, skipping");
                    log_file_finished!(source.name(), raw_file, FileOutcome::Skipped);
                    summary.skipped.push(raw_file.to_string());
                }
                Ok(outcome) => {
                    tracing::info!(source = source.name(), raw_file, "processing complete");
                    log_file_finished!(source.name(), raw_file, outcome);
                    summary.processed.push(raw_file.to_string());
                }
                Err(e) => {
                    match &e {
                        PipelineError::FileNotFound(path) => {
                            tracing::warn!(path = %path.display(), "raw transcript not found")
                        }
                        _ => tracing::error!(
                            source = source.name(),
                            raw_file,
                            stage = e.failed_stage().map_or("-", Stage::artifact_name),
                            error = %e,
                            "processing failed"
                        ),
                    }
                    log_file_finished!(source.name(), raw_file, FileOutcome::Failed, e);
                    summary.failed.push(FailedFile {
                        raw_file: raw_file.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        summary.finished_at = Utc::now();
        PipelineEvent::RunCompleted {
            run_id: summary.run_id,
            processed: summary.processed.len(),
            skipped: summary.skipped.len(),
            failed: summary.failed.len(),
        }
        .emit();
        tracing::info!(
            run_id = %summary.run_id,
            processed = summary.processed.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            elapsed_ms = (summary.finished_at - summary.started_at).num_milliseconds(),
            "run complete"
        );

        Ok(summary)
    }

    /// Run one file to its terminal artifact, or skip it if that already exists
    pub async fn process_file(
        &self,
        cache: &mut ResumabilityCache,
        source: &TranscriptSource,
        raw_file: &str,
        mode: Mode,
    ) -> Result<FileOutcome> {
        if cache.is_processed(source.name(), raw_file) {
            return Ok(FileOutcome::Skipped);
        }

        let ctx = FileContext {
            source: source.name(),
            raw_file,
            identity: source.identity(raw_file)?,
        };
        let transcript = source.read_raw(&self.raw_dir, raw_file).await?;

        match mode {
            Mode::FiveStage => {
                let mut state = PipelineState::Start;
                while !state.is_terminal() {
                    tracing::debug!(
                        raw_file,
                        state = state.name(),
                        completed = ?state.completed_stage(),
                        next = ?state.next_stage(),
                        "advancing"
                    );
                    state = self.advance(state, cache, &ctx, &transcript).await?;
                }
            }
            Mode::Simplified => self.analyze(cache, &ctx, &transcript).await?,
        }

        Ok(FileOutcome::Processed)
    }

    /// Run the transition out of `state` and persist its artifact
    async fn advance(
        &self,
        state: PipelineState,
        cache: &mut ResumabilityCache,
        ctx: &FileContext<'_>,
        transcript: &str,
    ) -> Result<PipelineState> {
        match state {
            PipelineState::Start => {
                let segmentation = self.segment(cache, ctx, transcript).await?;
                Ok(PipelineState::Segmented(segmentation))
            }
            PipelineState::Segmented(segmentation) => {
                let codings = self.code_segments(cache, ctx, segmentation).await?;
                Ok(PipelineState::Coded(codings))
            }
            PipelineState::Coded(codings) => {
                let coding_data: Vec<&OpenCoding> = codings.iter().map(|c| &c.data).collect();
                let thematic: ThematicAnalysis = self
                    .single_call(cache, ctx, json!(coding_data).to_string())
                    .await?;
                Ok(PipelineState::Clustered(thematic))
            }
            PipelineState::Clustered(thematic) => {
                let affinity: AffinityMapping = self
                    .single_call(cache, ctx, json!(thematic).to_string())
                    .await?;
                Ok(PipelineState::PersonasBuilt { thematic, affinity })
            }
            PipelineState::PersonasBuilt { thematic, affinity } => {
                let input = json!({
                    "personas": affinity.personas,
                    "clusters": thematic.themes,
                });
                let report: ValidationReport =
                    self.single_call(cache, ctx, input.to_string()).await?;
                Ok(PipelineState::Validated(report))
            }
            PipelineState::Validated(_) => Ok(state),
        }
    }

    /// START -> SEGMENTED: one segmentation call per batch, combined in batch order
    async fn segment(
        &self,
        cache: &mut ResumabilityCache,
        ctx: &FileContext<'_>,
        transcript: &str,
    ) -> Result<Segmentation> {
        let batches: Vec<String> = splitter::split(transcript, self.batch_size).collect();
        if batches.is_empty() {
            return Err(PipelineError::stage(
                Stage::Segmentation,
                PipelineError::EmptyTranscript(ctx.raw_file.to_string()),
            ));
        }

        let total = batches.len();
        let executor = &self.executor;
        let combined = run_stage(Stage::Segmentation, ctx.raw_file, Some(total), || async move {
            let mut parts = Vec::with_capacity(total);
            for (idx, batch) in batches.iter().enumerate() {
                log_model_call!(Stage::Segmentation, idx + 1, total);
                parts.push(executor.call::<Segmentation>(batch).await?);
            }

            let combined = combine_segmentations(parts);
            let tagged = StageResult::new(ctx.identity.clone(), combined);
            cache
                .persist(Stage::Segmentation, ctx.source, ctx.raw_file, &tagged)
                .await?;
            Ok(tagged.data)
        })
        .await?;

        if combined.segments.is_empty() {
            return Err(PipelineError::stage(
                Stage::Segmentation,
                PipelineError::EmptyTranscript(ctx.raw_file.to_string()),
            ));
        }
        Ok(combined)
    }

    /// SEGMENTED -> CODED: one open-coding call per segment, results in segment order
    async fn code_segments(
        &self,
        cache: &mut ResumabilityCache,
        ctx: &FileContext<'_>,
        segmentation: Segmentation,
    ) -> Result<Vec<StageResult<OpenCoding>>> {
        let inputs: Vec<String> = segmentation
            .segments
            .iter()
            .map(|segment| json!(segment).to_string())
            .collect();
        let total = inputs.len();

        let executor = self.executor.clone();
        let identity = ctx.identity.clone();
        let concurrency = self.concurrency;

        run_stage(Stage::OpenCoding, ctx.raw_file, Some(total), || async move {
            let codings = execute_ordered(inputs, concurrency, move |input, task| {
                let executor = executor.clone();
                let identity = identity.clone();
                async move {
                    log_model_call!(Stage::OpenCoding, task.task_number, task.total_tasks);
                    executor.execute::<OpenCoding>(&input, &identity).await
                }
            })
            .await?;

            cache
                .persist(Stage::OpenCoding, ctx.source, ctx.raw_file, &codings)
                .await?;
            Ok(codings)
        })
        .await
    }

    /// A transition made of exactly one model call over the previous stage's output
    async fn single_call<S: StageSchema>(
        &self,
        cache: &mut ResumabilityCache,
        ctx: &FileContext<'_>,
        input: String,
    ) -> Result<S> {
        let executor = &self.executor;
        run_stage(S::STAGE, ctx.raw_file, Some(1), || async move {
            log_model_call!(S::STAGE, 1, 1);
            let result = executor.execute::<S>(&input, &ctx.identity).await?;
            cache
                .persist(S::STAGE, ctx.source, ctx.raw_file, &result)
                .await?;
            Ok(result.data)
        })
        .await
    }

    /// Single-pass mode: one `analysis` call per batch, combined and persisted once
    async fn analyze(
        &self,
        cache: &mut ResumabilityCache,
        ctx: &FileContext<'_>,
        transcript: &str,
    ) -> Result<()> {
        let batches: Vec<String> = splitter::split(transcript, self.batch_size).collect();
        let total = batches.len();
        let executor = &self.executor;

        run_stage(Stage::Analysis, ctx.raw_file, Some(total), || async move {
            let mut parts = Vec::with_capacity(total);
            for (idx, batch) in batches.iter().enumerate() {
                log_model_call!(Stage::Analysis, idx + 1, total);
                parts.push(executor.call::<Analysis>(batch).await?);
            }

            let tagged = StageResult::new(ctx.identity.clone(), combine_analyses(parts));
            cache
                .persist(Stage::Analysis, ctx.source, ctx.raw_file, &tagged)
                .await?;
            Ok(())
        })
        .await
    }
}
