//! Reporting on files that already reached their terminal artifact

use std::path::Path;

use serde::Serialize;

use crate::cache::ResumabilityCache;
use crate::error::Result;
use crate::pipeline::Mode;
use crate::schema::{Analysis, ValidationReport};
use crate::source::StageResult;

/// One processed file as seen from its terminal artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEntry {
    pub artifact: String,
    pub id: String,
    pub source: String,
    pub url: String,
    /// Short description of what the artifact holds
    pub detail: String,
}

/// List terminal artifacts under `output_dir`, optionally for one source only
pub async fn collect_status(
    output_dir: &Path,
    mode: Mode,
    source: Option<&str>,
) -> Result<Vec<StatusEntry>> {
    let cache = ResumabilityCache::open(output_dir, mode.terminal_stage()).await?;

    let entries: Vec<StatusEntry> = match mode {
        Mode::FiveStage => cache
            .scan::<StageResult<ValidationReport>>(mode.terminal_stage())
            .await?
            .into_iter()
            .map(|(artifact, result)| {
                let refinements = result.data.refinements.as_ref().map_or(0, Vec::len);
                StatusEntry {
                    artifact,
                    id: result.identity.id,
                    source: result.identity.source,
                    url: result.identity.url,
                    detail: format!("{} refinements", refinements),
                }
            })
            .collect(),
        Mode::Simplified => cache
            .scan::<StageResult<Analysis>>(mode.terminal_stage())
            .await?
            .into_iter()
            .map(|(artifact, result)| StatusEntry {
                artifact,
                detail: format!(
                    "{} codes, {} keywords, {} quotes",
                    result.data.codes.len(),
                    result.data.keywords.len(),
                    result.data.quotes.len()
                ),
                id: result.identity.id,
                source: result.identity.source,
                url: result.identity.url,
            })
            .collect(),
    };

    Ok(entries
        .into_iter()
        .filter(|entry| source.map_or(true, |name| entry.source == name))
        .collect())
}
