//! Skipping processed files and all-or-nothing reprocessing

use std::sync::Arc;

use transcript_pipeline::cache::ResumabilityCache;
use transcript_pipeline::pipeline::Mode;
use transcript_pipeline::schema::Stage;
use transcript_pipeline_sdk::FileOutcome;

use super::common::*;

#[tokio::test]
async fn test_second_run_makes_no_model_calls() {
    let workspace = Workspace::new();
    workspace.write_raw("youtube", "abc123.txt", &tokens(25_000));
    let config = workspace.config(10_000);
    let youtube = source(&config, "youtube");

    let first = Arc::new(full_pipeline_client());
    let summary = orchestrator(&first, &config)
        .process_files(&youtube, &files(&["abc123.txt"]), Mode::FiveStage)
        .await
        .unwrap();
    assert_eq!(summary.processed, vec!["abc123.txt"]);
    assert!(first.total_calls() > 0);

    let second = Arc::new(full_pipeline_client());
    let summary = orchestrator(&second, &config)
        .process_files(&youtube, &files(&["abc123.txt"]), Mode::FiveStage)
        .await
        .unwrap();
    assert_eq!(summary.skipped, vec!["abc123.txt"]);
    assert!(summary.processed.is_empty());
    assert_eq!(second.total_calls(), 0);
}

#[tokio::test]
async fn test_repeated_file_in_one_run_is_skipped() {
    let workspace = Workspace::new();
    workspace.write_raw("youtube", "abc123.txt", &tokens(10));
    let config = workspace.config(10_000);

    let client = Arc::new(full_pipeline_client());
    let summary = orchestrator(&client, &config)
        .process_files(
            &source(&config, "youtube"),
            &files(&["abc123.txt", "abc123.txt"]),
            Mode::FiveStage,
        )
        .await
        .unwrap();

    assert_eq!(summary.processed, vec!["abc123.txt"]);
    assert_eq!(summary.skipped, vec!["abc123.txt"]);
    assert_eq!(client.calls_for(Stage::Segmentation), 1);
}

#[tokio::test]
async fn test_same_file_name_from_other_source_is_not_skipped() {
    let workspace = Workspace::new();
    workspace.write_raw("youtube", "abc123", &tokens(10));
    workspace.write_raw("reddit", "abc123", &tokens(10));
    let config = workspace.config(10_000);

    let client = Arc::new(full_pipeline_client());
    let orchestrator = orchestrator(&client, &config);
    orchestrator
        .process_files(&source(&config, "youtube"), &files(&["abc123"]), Mode::FiveStage)
        .await
        .unwrap();
    let summary = orchestrator
        .process_files(&source(&config, "reddit"), &files(&["abc123"]), Mode::FiveStage)
        .await
        .unwrap();

    assert_eq!(summary.processed, vec!["abc123"]);
    assert_eq!(client.calls_for(Stage::Validation), 2);
}

#[tokio::test]
async fn test_partial_failure_is_fully_reprocessed() {
    let workspace = Workspace::new();
    workspace.write_raw("youtube", "abc123.txt", &tokens(10));
    let config = workspace.config(10_000);
    let youtube = source(&config, "youtube");

    let failing = Arc::new(
        full_pipeline_client().then(Stage::Validation, r#"{"insights": "only this"}"#),
    );
    let summary = orchestrator(&failing, &config)
        .process_files(&youtube, &files(&["abc123.txt"]), Mode::FiveStage)
        .await
        .unwrap();
    assert_eq!(summary.failed.len(), 1);
    assert!(workspace
        .artifact_path(Stage::AffinityMapping, "youtube", "abc123.txt")
        .exists());
    assert!(!workspace
        .artifact_path(Stage::Validation, "youtube", "abc123.txt")
        .exists());

    // Intermediate artifacts are not consulted: every stage runs again
    let retry = Arc::new(full_pipeline_client());
    let summary = orchestrator(&retry, &config)
        .process_files(&youtube, &files(&["abc123.txt"]), Mode::FiveStage)
        .await
        .unwrap();
    assert_eq!(summary.processed, vec!["abc123.txt"]);
    for stage in Stage::PIPELINE {
        assert_eq!(retry.calls_for(stage), 1, "{}", stage);
    }
}

#[tokio::test]
async fn test_schema_rejection_persists_nothing() {
    let workspace = Workspace::new();
    workspace.write_raw("youtube", "bad.txt", &tokens(10));
    workspace.write_raw("youtube", "good.txt", &tokens(10));
    let config = workspace.config(10_000);

    let client = Arc::new(
        full_pipeline_client().then(Stage::Segmentation, r#"{"summary": "no segments here"}"#),
    );
    let summary = orchestrator(&client, &config)
        .process_files(
            &source(&config, "youtube"),
            &files(&["bad.txt", "good.txt"]),
            Mode::FiveStage,
        )
        .await
        .unwrap();

    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].raw_file, "bad.txt");
    assert!(summary.failed[0].error.contains("segment_transcript"));
    assert!(summary.failed[0].error.contains("/segments"));
    assert!(!workspace
        .artifact_path(Stage::Segmentation, "youtube", "bad.txt")
        .exists());
    assert_eq!(client.calls_for(Stage::OpenCoding), 1);
    assert_eq!(summary.processed, vec!["good.txt"]);
}

#[tokio::test]
async fn test_missing_and_empty_inputs_fail_without_calls() {
    let workspace = Workspace::new();
    workspace.write_raw("youtube", "blank.txt", "  \n\t ");
    let config = workspace.config(10_000);

    let client = Arc::new(full_pipeline_client());
    let summary = orchestrator(&client, &config)
        .process_files(
            &source(&config, "youtube"),
            &files(&["missing.txt", "blank.txt"]),
            Mode::FiveStage,
        )
        .await
        .unwrap();

    assert_eq!(summary.failed.len(), 2);
    assert!(summary.failed[0].error.contains("not found"));
    assert!(summary.failed[1].error.contains("no segments"));
    assert_eq!(client.total_calls(), 0);
    assert!(!workspace
        .artifact_path(Stage::Validation, "youtube", "blank.txt")
        .exists());
}

#[tokio::test]
async fn test_process_file_reports_skip() {
    let workspace = Workspace::new();
    workspace.write_raw("twitter", "1234", &tokens(10));
    let config = workspace.config(10_000);
    let twitter = source(&config, "twitter");

    let client = Arc::new(full_pipeline_client());
    let orchestrator = orchestrator(&client, &config);
    let mut cache = ResumabilityCache::open(&config.output_dir, Stage::Validation)
        .await
        .unwrap();

    let first = orchestrator
        .process_file(&mut cache, &twitter, "1234", Mode::FiveStage)
        .await
        .unwrap();
    let second = orchestrator
        .process_file(&mut cache, &twitter, "1234", Mode::FiveStage)
        .await
        .unwrap();

    assert_eq!(first, FileOutcome::Processed);
    assert_eq!(second, FileOutcome::Skipped);
    assert!(cache.is_processed("twitter", "1234"));
}
