//! Schema registry for stage outputs
//!
//! Each stage declares the exact JSON shape the model must return. The same JSON
//! Schema document is sent to the model as its response format and used here to
//! check the response before it is deserialized into the stage's typed structure.
//! Validation is structural only.

pub mod types;

use std::fmt;

use jsonschema::{error::ValidationErrorKind, JSONSchema, ValidationError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::pipeline_utils::extract_json;

pub use types::{
    AffinityMapping, Analysis, Cluster, Excerpt, OpenCoding, Persona, Quote, Segment,
    SegmentCoding, Segmentation, ThematicAnalysis, Theme, ValidationReport,
};

/// Every kind of model-produced artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Segmentation,
    OpenCoding,
    ThematicAnalysis,
    AffinityMapping,
    Validation,
    /// Single-pass codes/keywords/quotes analysis
    Analysis,
}

impl Stage {
    /// The five stages of the full pipeline, in execution order
    pub const PIPELINE: [Stage; 5] = [
        Stage::Segmentation,
        Stage::OpenCoding,
        Stage::ThematicAnalysis,
        Stage::AffinityMapping,
        Stage::Validation,
    ];

    /// Directory name under the output root where this stage's artifacts live
    pub fn artifact_name(self) -> &'static str {
        match self {
            Stage::Segmentation => "segment_transcript",
            Stage::OpenCoding => "open_coding",
            Stage::ThematicAnalysis => "clustering_and_thematic_analysis",
            Stage::AffinityMapping => "affinity_mapping_and_persona_development",
            Stage::Validation => "validate_and_document",
            Stage::Analysis => "analysis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.artifact_name())
    }
}

/// A typed stage output with a JSON Schema describing its wire shape
pub trait StageSchema: Serialize + DeserializeOwned + Send + Sync + 'static {
    const STAGE: Stage;

    fn json_schema() -> Value;
}

/// Parse a raw model response into the stage's typed structure
///
/// Accepts bare JSON or JSON wrapped in a Markdown code fence.
pub fn parse_response<S: StageSchema>(raw: &str) -> Result<S> {
    let stage = S::STAGE.artifact_name();
    let text = extract_json(raw);
    let value: Value = serde_json::from_str(&text).map_err(|e| {
        PipelineError::schema(stage, "$", format!("response is not valid JSON: {}", e))
    })?;

    validate(S::STAGE, &S::json_schema(), &value)?;

    serde_json::from_value(value).map_err(|e| PipelineError::schema(stage, "$", e.to_string()))
}

/// Check `instance` against `schema`, reporting the first violation
pub fn validate(stage: Stage, schema: &Value, instance: &Value) -> Result<()> {
    let compiled = JSONSchema::compile(schema).map_err(|e| {
        PipelineError::schema(stage.artifact_name(), "<schema>", e.to_string())
    })?;

    let outcome = compiled.validate(instance);
    if let Err(mut errors) = outcome {
        if let Some(error) = errors.next() {
            return Err(PipelineError::schema(
                stage.artifact_name(),
                field_path(&error),
                error.to_string(),
            ));
        }
    }

    Ok(())
}

/// JSON pointer to the offending field; for missing fields, the pointer names the field itself
fn field_path(error: &ValidationError<'_>) -> String {
    let mut path = error.instance_path.to_string();
    if let ValidationErrorKind::Required { property } = &error.kind {
        if let Some(name) = property.as_str() {
            path.push('/');
            path.push_str(name);
        }
    }

    if path.is_empty() {
        "$".to_string()
    } else {
        path
    }
}
