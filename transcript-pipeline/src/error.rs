//! Error taxonomy for the analysis pipeline

use std::path::PathBuf;

use thiserror::Error;

use crate::schema::Stage;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Model output was not JSON or did not match the stage schema
    #[error("schema validation failed for `{stage}` at `{path}`: {message}")]
    SchemaValidation {
        stage: String,
        path: String,
        message: String,
    },

    /// Transport or API failure while calling the model
    #[error("model call failed: {0}")]
    ModelCall(String),

    #[error("failed to persist artifact `{path}`: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("raw transcript not found: `{0}`")]
    FileNotFound(PathBuf),

    #[error("failed to read raw transcript `{path}`: {source}")]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("transcript `{0}` produced no segments")]
    EmptyTranscript(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A failure inside one stage transition, tagged with that stage
    #[error("stage `{stage}` failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn schema(
        stage: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SchemaValidation {
            stage: stage.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    pub fn stage(stage: Stage, source: PipelineError) -> Self {
        match source {
            Self::Stage { .. } => source,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage a file failed in, when the failure happened inside one
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Whether a retry policy may re-issue the failed call
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ModelCall(_))
    }
}
