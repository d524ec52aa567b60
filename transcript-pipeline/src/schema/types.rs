//! Typed output of every analysis stage

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{Stage, StageSchema};

// ============================================================================
// Segmentation
// ============================================================================

/// A topical slice of a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub title: String,
    pub content: String,
    pub main_idea: String,
}

/// Output of the segmentation stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    pub summary: String,
    pub segments: Vec<Segment>,
}

impl StageSchema for Segmentation {
    const STAGE: Stage = Stage::Segmentation;

    fn json_schema() -> Value {
        object(
            json!({
                "summary": string(),
                "segments": array(object(
                    json!({
                        "title": string(),
                        "content": string(),
                        "main_idea": string(),
                    }),
                    &["title", "content", "main_idea"],
                )),
            }),
            &["summary", "segments"],
        )
    }
}

// ============================================================================
// Open coding
// ============================================================================

/// A quoted excerpt labelled with a code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Excerpt {
    pub text: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentCoding {
    pub segment: String,
    pub excerpts: Vec<Excerpt>,
}

/// Output of one open-coding call (one call per segment)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenCoding {
    pub segments: Vec<SegmentCoding>,
    pub all_codes: Vec<String>,
}

impl StageSchema for OpenCoding {
    const STAGE: Stage = Stage::OpenCoding;

    fn json_schema() -> Value {
        object(
            json!({
                "segments": array(object(
                    json!({
                        "segment": string(),
                        "excerpts": array(object(
                            json!({ "text": string(), "code": string() }),
                            &["text", "code"],
                        )),
                    }),
                    &["segment", "excerpts"],
                )),
                "all_codes": array(string()),
            }),
            &["segments", "all_codes"],
        )
    }
}

// ============================================================================
// Clustering and thematic analysis
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_name: String,
    pub codes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub theme_name: String,
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThematicAnalysis {
    pub themes: Vec<Theme>,
}

impl StageSchema for ThematicAnalysis {
    const STAGE: Stage = Stage::ThematicAnalysis;

    fn json_schema() -> Value {
        object(
            json!({
                "themes": array(object(
                    json!({
                        "theme_name": string(),
                        "clusters": array(object(
                            json!({ "cluster_name": string(), "codes": array(string()) }),
                            &["cluster_name", "codes"],
                        )),
                    }),
                    &["theme_name", "clusters"],
                )),
            }),
            &["themes"],
        )
    }
}

// ============================================================================
// Affinity mapping and persona development
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub background: String,
    pub goals: String,
    pub motivations: String,
    pub needs: String,
    pub challenges: String,
    pub behaviors: String,
    pub attitudes: String,
    pub relevant_quotes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityMapping {
    pub relationships: String,
    pub personas: Vec<Persona>,
}

impl StageSchema for AffinityMapping {
    const STAGE: Stage = Stage::AffinityMapping;

    fn json_schema() -> Value {
        object(
            json!({
                "relationships": string(),
                "personas": array(object(
                    json!({
                        "name": string(),
                        "background": string(),
                        "goals": string(),
                        "motivations": string(),
                        "needs": string(),
                        "challenges": string(),
                        "behaviors": string(),
                        "attitudes": string(),
                        "relevant_quotes": array(string()),
                    }),
                    &[
                        "name",
                        "background",
                        "goals",
                        "motivations",
                        "needs",
                        "challenges",
                        "behaviors",
                        "attitudes",
                        "relevant_quotes",
                    ],
                )),
            }),
            &["relationships", "personas"],
        )
    }
}

// ============================================================================
// Validation and documentation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinements: Option<Vec<Map<String, Value>>>,
    pub key_findings: String,
    pub insights: String,
    pub recommendations: String,
}

impl StageSchema for ValidationReport {
    const STAGE: Stage = Stage::Validation;

    fn json_schema() -> Value {
        object(
            json!({
                "refinements": {
                    "type": ["array", "null"],
                    "items": { "type": "object" },
                },
                "key_findings": string(),
                "insights": string(),
                "recommendations": string(),
            }),
            &["key_findings", "insights", "recommendations"],
        )
    }
}

// ============================================================================
// Single-pass analysis
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub quote: String,
    pub code: String,
    pub keywords: Vec<String>,
    pub context: String,
}

/// Generic codes/keywords/quotes analysis used by the single-pass mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub codes: Vec<String>,
    pub keywords: Vec<String>,
    pub quotes: Vec<Quote>,
}

impl StageSchema for Analysis {
    const STAGE: Stage = Stage::Analysis;

    fn json_schema() -> Value {
        object(
            json!({
                "codes": array(string()),
                "keywords": array(string()),
                "quotes": array(object(
                    json!({
                        "quote": string(),
                        "code": string(),
                        "keywords": array(string()),
                        "context": string(),
                    }),
                    &["quote", "code", "keywords", "context"],
                )),
            }),
            &["codes", "keywords", "quotes"],
        )
    }
}

fn string() -> Value {
    json!({ "type": "string" })
}

fn array(items: Value) -> Value {
    json!({ "type": "array", "items": items })
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
