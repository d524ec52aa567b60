// Model-produced stage artifacts and their schemas
pub mod schema;

// Token batching of raw transcripts
pub mod splitter;

// Model providers, retry and rate limiting
pub mod client;

// One model call per stage
pub mod executor;

// Five-stage and single-pass orchestration
pub mod pipeline;

// Artifact persistence and resumability
pub mod cache;

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline_utils;
pub mod prompts;
pub mod source;

pub use error::{PipelineError, Result};
