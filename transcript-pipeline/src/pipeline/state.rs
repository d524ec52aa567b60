//! Per-file progress through the five-stage pipeline
//!
//! Each variant carries the typed output the next transition consumes, so a
//! stage can only run once its inputs exist.

use crate::schema::{
    AffinityMapping, OpenCoding, Segmentation, Stage, ThematicAnalysis, ValidationReport,
};
use crate::source::StageResult;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Start,
    Segmented(Segmentation),
    /// Per-segment coding results, tagged, in segment order
    Coded(Vec<StageResult<OpenCoding>>),
    Clustered(ThematicAnalysis),
    PersonasBuilt {
        thematic: ThematicAnalysis,
        affinity: AffinityMapping,
    },
    Validated(ValidationReport),
}

impl PipelineState {
    /// The stage whose output this state holds
    pub fn completed_stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Start => None,
            PipelineState::Segmented(_) => Some(Stage::Segmentation),
            PipelineState::Coded(_) => Some(Stage::OpenCoding),
            PipelineState::Clustered(_) => Some(Stage::ThematicAnalysis),
            PipelineState::PersonasBuilt { .. } => Some(Stage::AffinityMapping),
            PipelineState::Validated(_) => Some(Stage::Validation),
        }
    }

    /// The stage the next transition runs, or `None` once validated
    pub fn next_stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Start => Some(Stage::Segmentation),
            PipelineState::Segmented(_) => Some(Stage::OpenCoding),
            PipelineState::Coded(_) => Some(Stage::ThematicAnalysis),
            PipelineState::Clustered(_) => Some(Stage::AffinityMapping),
            PipelineState::PersonasBuilt { .. } => Some(Stage::Validation),
            PipelineState::Validated(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Validated(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Start => "START",
            PipelineState::Segmented(_) => "SEGMENTED",
            PipelineState::Coded(_) => "CODED",
            PipelineState::Clustered(_) => "CLUSTERED",
            PipelineState::PersonasBuilt { .. } => "PERSONAS_BUILT",
            PipelineState::Validated(_) => "VALIDATED",
        }
    }
}
