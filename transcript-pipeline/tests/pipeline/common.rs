//! Common test utilities for pipeline tests

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use transcript_pipeline::client::{ModelClient, ModelRequest};
use transcript_pipeline::config::PipelineConfig;
use transcript_pipeline::executor::StageExecutor;
use transcript_pipeline::pipeline::Orchestrator;
use transcript_pipeline::schema::Stage;
use transcript_pipeline::source::TranscriptSource;
use transcript_pipeline::{PipelineError, Result};

type Responder = Box<dyn Fn(&ModelRequest) -> String + Send + Sync>;

/// In-memory model that answers by stage, keyed on the response format name
///
/// Queued responses are used first, in order; after that the stage's
/// responder answers, if one is set. Anything else is a model-call failure.
#[derive(Default)]
pub struct ScriptedClient {
    queued: Mutex<HashMap<String, VecDeque<String>>>,
    responders: HashMap<String, Responder>,
    delays: Mutex<HashMap<String, VecDeque<u64>>>,
    requests: Mutex<Vec<(String, ModelRequest)>>,
    total: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one response for `stage`
    pub fn then(self, stage: Stage, response: impl Into<String>) -> Self {
        self.queued
            .lock()
            .unwrap()
            .entry(stage.artifact_name().to_string())
            .or_default()
            .push_back(response.into());
        self
    }

    /// Answer every otherwise unscripted `stage` call with `response`
    pub fn always(self, stage: Stage, response: impl Into<String>) -> Self {
        let response = response.into();
        self.respond(stage, move |_| response.clone())
    }

    /// Answer `stage` calls by computing a response from the request
    pub fn respond(
        mut self,
        stage: Stage,
        responder: impl Fn(&ModelRequest) -> String + Send + Sync + 'static,
    ) -> Self {
        self.responders
            .insert(stage.artifact_name().to_string(), Box::new(responder));
        self
    }

    /// Delay successive `stage` calls by these milliseconds, in call order
    pub fn with_delays(self, stage: Stage, delays_ms: Vec<u64>) -> Self {
        self.delays
            .lock()
            .unwrap()
            .insert(stage.artifact_name().to_string(), delays_ms.into());
        self
    }

    pub fn calls_for(&self, stage: Stage) -> usize {
        self.requests_for(stage).len()
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn requests_for(&self, stage: Stage) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == stage.artifact_name())
            .map(|(_, request)| request.clone())
            .collect()
    }

    /// User content of each `stage` call, in call order
    pub fn inputs_for(&self, stage: Stage) -> Vec<String> {
        self.requests_for(stage)
            .into_iter()
            .map(|request| request.messages[1].content.clone())
            .collect()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn complete(&self, request: &ModelRequest) -> Result<String> {
        let name = request.response_format.name.clone();
        self.total.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((name.clone(), request.clone()));

        let delay = self
            .delays
            .lock()
            .unwrap()
            .get_mut(&name)
            .and_then(|delays| delays.pop_front());
        if let Some(ms) = delay {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&name)
            .and_then(|queue| queue.pop_front());

        match (queued, self.responders.get(&name)) {
            (Some(response), _) => Ok(response),
            (None, Some(responder)) => Ok(responder(request)),
            (None, None) => Err(PipelineError::ModelCall(format!(
                "no scripted response for {}",
                name
            ))),
        }
    }
}

/// Temporary raw/output roots for one test
pub struct Workspace {
    _dir: TempDir,
    pub raw_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let raw_dir = dir.path().join("raw");
        let output_dir = dir.path().join("processed-transcripts").join("json");
        std::fs::create_dir_all(&raw_dir).unwrap();
        Self {
            _dir: dir,
            raw_dir,
            output_dir,
        }
    }

    pub fn write_raw(&self, source: &str, raw_file: &str, text: &str) {
        let dir = self.raw_dir.join(source);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(raw_file), text).unwrap();
    }

    pub fn config(&self, batch_size: usize) -> PipelineConfig {
        PipelineConfig {
            raw_dir: self.raw_dir.clone(),
            output_dir: self.output_dir.clone(),
            batch_size,
            ..Default::default()
        }
    }

    pub fn artifact_path(&self, stage: Stage, source: &str, raw_file: &str) -> PathBuf {
        self.output_dir
            .join(stage.artifact_name())
            .join(format!("{}-{}", source, raw_file))
    }

    pub fn read_artifact(&self, stage: Stage, source: &str, raw_file: &str) -> Value {
        let text = std::fs::read_to_string(self.artifact_path(stage, source, raw_file)).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}

pub fn orchestrator(client: &Arc<ScriptedClient>, config: &PipelineConfig) -> Orchestrator {
    let executor = StageExecutor::from_config(client.clone(), &config.model);
    Orchestrator::new(executor, config)
}

pub fn source(config: &PipelineConfig, name: &str) -> TranscriptSource {
    config.source(name).unwrap()
}

pub fn files(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// `count` distinct whitespace-separated tokens
pub fn tokens(count: usize) -> String {
    (0..count)
        .map(|i| format!("w{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Segmentation reply with `count` segments titled `{tag}-s{n}`
pub fn segmentation_response(tag: &str, count: usize) -> String {
    let segments: Vec<Value> = (0..count)
        .map(|n| {
            json!({
                "title": format!("{}-s{}", tag, n),
                "content": format!("content of {}-s{}", tag, n),
                "main_idea": format!("idea of {}-s{}", tag, n),
            })
        })
        .collect();
    json!({ "summary": format!("summary {}", tag), "segments": segments }).to_string()
}

/// Open-coding reply naming the segment title found in the request
pub fn coding_for_request(request: &ModelRequest) -> String {
    let content = &request.messages[1].content;
    let segment_json = content
        .split_once(": ")
        .map(|(_, json)| json)
        .unwrap_or_default();
    let title = serde_json::from_str::<Value>(segment_json)
        .ok()
        .and_then(|segment| segment["title"].as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());

    json!({
        "segments": [{
            "segment": title,
            "excerpts": [{ "text": format!("excerpt of {}", title), "code": format!("code-{}", title) }],
        }],
        "all_codes": [format!("code-{}", title)],
    })
    .to_string()
}

pub fn thematic_response() -> String {
    json!({
        "themes": [{
            "theme_name": "Tooling friction",
            "clusters": [{ "cluster_name": "Slow CI", "codes": ["code-b0-s0"] }],
        }],
    })
    .to_string()
}

pub fn affinity_response() -> String {
    json!({
        "relationships": "Slow CI drives context switching",
        "personas": [{
            "name": "Platform engineer",
            "background": "Owns the build system",
            "goals": "Fast feedback",
            "motivations": "Developer happiness",
            "needs": "Caching",
            "challenges": "Flaky tests",
            "behaviors": "Writes scripts",
            "attitudes": "Pragmatic",
            "relevant_quotes": ["CI takes forever"],
        }],
    })
    .to_string()
}

pub fn validation_response() -> String {
    json!({
        "refinements": [{ "persona": "Platform engineer", "change": "add on-call duty" }],
        "key_findings": "CI latency dominates",
        "insights": "Caching pays off",
        "recommendations": "Invest in remote caching",
    })
    .to_string()
}

pub fn analysis_response(tag: &str) -> String {
    json!({
        "codes": [format!("{}-code", tag)],
        "keywords": [format!("{}-keyword", tag)],
        "quotes": [{
            "quote": format!("{} quote", tag),
            "code": format!("{}-code", tag),
            "keywords": [format!("{}-keyword", tag)],
            "context": "standup",
        }],
    })
    .to_string()
}

/// Client answering every five-stage call; segmentation gets one segment per batch
pub fn full_pipeline_client() -> ScriptedClient {
    ScriptedClient::new()
        .always(Stage::Segmentation, segmentation_response("b", 1))
        .respond(Stage::OpenCoding, coding_for_request)
        .always(Stage::ThematicAnalysis, thematic_response())
        .always(Stage::AffinityMapping, affinity_response())
        .always(Stage::Validation, validation_response())
}
