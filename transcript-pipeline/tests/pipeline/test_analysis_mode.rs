//! Single-pass analysis mode

use std::sync::Arc;

use transcript_pipeline::pipeline::{collect_status, Mode};
use transcript_pipeline::schema::Stage;

use super::common::*;

fn analysis_client() -> ScriptedClient {
    ScriptedClient::new()
        .then(Stage::Analysis, analysis_response("b0"))
        .then(Stage::Analysis, analysis_response("b1"))
        .then(Stage::Analysis, analysis_response("b2"))
}

#[tokio::test]
async fn test_batches_combined_into_one_artifact() {
    let workspace = Workspace::new();
    workspace.write_raw("youtube", "abc123.txt", &tokens(25_000));
    let config = workspace.config(10_000);

    let client = Arc::new(analysis_client());
    let summary = orchestrator(&client, &config)
        .process_files(&source(&config, "youtube"), &files(&["abc123.txt"]), Mode::Simplified)
        .await
        .unwrap();

    assert_eq!(summary.processed, vec!["abc123.txt"]);
    assert_eq!(client.calls_for(Stage::Analysis), 3);
    assert_eq!(client.total_calls(), 3);

    let artifact = workspace.read_artifact(Stage::Analysis, "youtube", "abc123.txt");
    assert_eq!(artifact["id"], "abc123");
    assert_eq!(artifact["source"], "youtube");
    assert_eq!(artifact["url"], "https://www.youtube.com/watch?v=abc123");
    assert_eq!(
        artifact["codes"],
        serde_json::json!(["b0-code", "b1-code", "b2-code"])
    );
    assert_eq!(artifact["quotes"].as_array().unwrap().len(), 3);
    assert_eq!(artifact["quotes"][2]["quote"], "b2 quote");

    // No five-stage artifacts in this mode
    assert!(!workspace
        .artifact_path(Stage::Segmentation, "youtube", "abc123.txt")
        .exists());
}

#[tokio::test]
async fn test_requests_use_analysis_instructions_and_defaults() {
    let workspace = Workspace::new();
    workspace.write_raw("g2", "tool.txt", "fast builds   matter\n\nto everyone");
    let config = workspace.config(10_000);

    let client = Arc::new(analysis_client());
    orchestrator(&client, &config)
        .process_files(&source(&config, "g2"), &files(&["tool.txt"]), Mode::Simplified)
        .await
        .unwrap();

    let requests = client.requests_for(Stage::Analysis);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].max_output_tokens, 10_000);
    assert_eq!(requests[0].temperature, 0.5);
    assert!(requests[0].messages[0]
        .content
        .starts_with("You are a qualitative research expert"));
    assert_eq!(
        requests[0].messages[1].content,
        "Here is the transcript: fast builds matter to everyone"
    );
}

#[tokio::test]
async fn test_artifact_is_pretty_printed_with_four_spaces() {
    let workspace = Workspace::new();
    workspace.write_raw("reddit", "t3xyz", &tokens(5));
    let config = workspace.config(10_000);

    let client = Arc::new(analysis_client());
    orchestrator(&client, &config)
        .process_files(&source(&config, "reddit"), &files(&["t3xyz"]), Mode::Simplified)
        .await
        .unwrap();

    let text =
        std::fs::read_to_string(workspace.artifact_path(Stage::Analysis, "reddit", "t3xyz")).unwrap();
    assert!(text.starts_with("{\n    \"id\": \"t3xyz\""));
}

#[tokio::test]
async fn test_rerun_skips_analyzed_files() {
    let workspace = Workspace::new();
    workspace.write_raw("youtube", "abc123.txt", &tokens(10));
    let config = workspace.config(10_000);
    let youtube = source(&config, "youtube");

    let first = Arc::new(analysis_client());
    orchestrator(&first, &config)
        .process_files(&youtube, &files(&["abc123.txt"]), Mode::Simplified)
        .await
        .unwrap();

    let second = Arc::new(analysis_client());
    let summary = orchestrator(&second, &config)
        .process_files(&youtube, &files(&["abc123.txt"]), Mode::Simplified)
        .await
        .unwrap();
    assert_eq!(summary.skipped, vec!["abc123.txt"]);
    assert_eq!(second.total_calls(), 0);

    // The five-stage terminal is independent of the analysis one
    let third = Arc::new(full_pipeline_client());
    let summary = orchestrator(&third, &config)
        .process_files(&youtube, &files(&["abc123.txt"]), Mode::FiveStage)
        .await
        .unwrap();
    assert_eq!(summary.processed, vec!["abc123.txt"]);
}

#[tokio::test]
async fn test_failed_batch_aborts_the_file() {
    let workspace = Workspace::new();
    workspace.write_raw("youtube", "abc123.txt", &tokens(25_000));
    let config = workspace.config(10_000);

    let client = Arc::new(
        ScriptedClient::new()
            .then(Stage::Analysis, analysis_response("b0"))
            .then(Stage::Analysis, "this is not json"),
    );
    let summary = orchestrator(&client, &config)
        .process_files(&source(&config, "youtube"), &files(&["abc123.txt"]), Mode::Simplified)
        .await
        .unwrap();

    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].error.contains("not valid JSON"));
    assert_eq!(client.calls_for(Stage::Analysis), 2);
    assert!(!workspace
        .artifact_path(Stage::Analysis, "youtube", "abc123.txt")
        .exists());
}

#[tokio::test]
async fn test_fenced_responses_are_accepted() {
    let workspace = Workspace::new();
    workspace.write_raw("youtube", "abc123.txt", &tokens(10));
    let config = workspace.config(10_000);

    let client = Arc::new(ScriptedClient::new().then(
        Stage::Analysis,
        format!("```json\n{}\n```", analysis_response("fenced")),
    ));
    let summary = orchestrator(&client, &config)
        .process_files(&source(&config, "youtube"), &files(&["abc123.txt"]), Mode::Simplified)
        .await
        .unwrap();

    assert_eq!(summary.processed.len(), 1);
    let artifact = workspace.read_artifact(Stage::Analysis, "youtube", "abc123.txt");
    assert_eq!(artifact["codes"][0], "fenced-code");
}

#[tokio::test]
async fn test_empty_transcript_persists_empty_analysis() {
    let workspace = Workspace::new();
    workspace.write_raw("youtube", "empty.txt", "");
    let config = workspace.config(10_000);

    let client = Arc::new(ScriptedClient::new());
    let summary = orchestrator(&client, &config)
        .process_files(&source(&config, "youtube"), &files(&["empty.txt"]), Mode::Simplified)
        .await
        .unwrap();

    assert_eq!(summary.processed, vec!["empty.txt"]);
    assert_eq!(client.total_calls(), 0);
    let artifact = workspace.read_artifact(Stage::Analysis, "youtube", "empty.txt");
    assert!(artifact["codes"].as_array().unwrap().is_empty());
    assert_eq!(artifact["id"], "empty");
}

#[tokio::test]
async fn test_status_reports_analyzed_files() {
    let workspace = Workspace::new();
    workspace.write_raw("youtube", "abc123.txt", &tokens(10));
    let config = workspace.config(10_000);

    let client = Arc::new(analysis_client());
    orchestrator(&client, &config)
        .process_files(&source(&config, "youtube"), &files(&["abc123.txt"]), Mode::Simplified)
        .await
        .unwrap();

    let entries = collect_status(&config.output_dir, Mode::Simplified, Some("youtube"))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].artifact, "youtube-abc123.txt");
    assert_eq!(entries[0].detail, "1 codes, 1 keywords, 1 quotes");

    let five_stage = collect_status(&config.output_dir, Mode::FiveStage, None)
        .await
        .unwrap();
    assert!(five_stage.is_empty());
}
