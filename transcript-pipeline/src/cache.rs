//! Resumability cache backed by per-stage artifact directories
//!
//! Every artifact lives at `{output_dir}/{stage}/{source}-{raw_file}`. A file
//! counts as processed once the terminal stage's artifact exists; nothing else
//! is consulted. The terminal directory is listed once on open, then kept in
//! memory and updated on each terminal write so later files in the same run
//! see earlier ones.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;

use transcript_pipeline_sdk::log_artifact_persisted;

use crate::error::{PipelineError, Result};
use crate::pipeline_utils::to_pretty_json;
use crate::schema::Stage;

/// Exact artifact file name for one raw input
pub fn artifact_file_name(source: &str, raw_file: &str) -> String {
    format!("{}-{}", source, raw_file)
}

#[derive(Debug)]
pub struct ResumabilityCache {
    root: PathBuf,
    terminal: Stage,
    processed: HashSet<String>,
}

impl ResumabilityCache {
    /// Open the cache rooted at `root`, treating `terminal` as the completion marker
    pub async fn open(root: impl Into<PathBuf>, terminal: Stage) -> Result<Self> {
        let root = root.into();
        let processed = list_file_names(&root.join(terminal.artifact_name()))
            .await?
            .into_iter()
            .collect::<HashSet<_>>();

        tracing::debug!(
            root = %root.display(),
            terminal = %terminal,
            processed = processed.len(),
            "opened resumability cache"
        );

        Ok(Self {
            root,
            terminal,
            processed,
        })
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    pub fn is_processed(&self, source: &str, raw_file: &str) -> bool {
        self.processed.contains(&artifact_file_name(source, raw_file))
    }

    pub fn path_for(&self, stage: Stage, source: &str, raw_file: &str) -> PathBuf {
        self.root
            .join(stage.artifact_name())
            .join(artifact_file_name(source, raw_file))
    }

    /// Write `data` as the `stage` artifact for one raw input
    ///
    /// The artifact is written to a sibling temp file and renamed into place, so
    /// an interrupted write never leaves a half-written terminal marker.
    pub async fn persist<T: Serialize + ?Sized>(
        &mut self,
        stage: Stage,
        source: &str,
        raw_file: &str,
        data: &T,
    ) -> Result<PathBuf> {
        let path = self.path_for(stage, source, raw_file);
        let dir = self.root.join(stage.artifact_name());

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| PipelineError::persistence(&dir, e))?;

        let bytes = to_pretty_json(data).map_err(|e| PipelineError::persistence(&path, e.into()))?;

        let tmp = path.with_file_name(format!(".{}.tmp", artifact_file_name(source, raw_file)));
        fs::write(&tmp, &bytes)
            .await
            .map_err(|e| PipelineError::persistence(&tmp, e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| PipelineError::persistence(&path, e))?;

        if stage == self.terminal {
            self.processed.insert(artifact_file_name(source, raw_file));
        }

        log_artifact_persisted!(stage, path.display());
        Ok(path)
    }

    /// Read every artifact persisted for `stage`, sorted by file name
    ///
    /// Unreadable or corrupt entries are logged and skipped.
    pub async fn scan<T: DeserializeOwned>(&self, stage: Stage) -> Result<Vec<(String, T)>> {
        let dir = self.root.join(stage.artifact_name());
        let mut names = list_file_names(&dir).await?;
        names.sort();

        let mut artifacts = Vec::with_capacity(names.len());
        for name in names {
            let path = dir.join(&name);
            match read_artifact::<T>(stage, &path).await {
                Ok(value) => artifacts.push((name, value)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping corrupt artifact")
                }
            }
        }

        Ok(artifacts)
    }
}

async fn read_artifact<T: DeserializeOwned>(stage: Stage, path: &Path) -> Result<T> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| PipelineError::persistence(path, e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| PipelineError::schema(stage.artifact_name(), "$", e.to_string()))
}

/// Names of regular, non-hidden files in `dir`; a missing directory is empty
async fn list_file_names(dir: &Path) -> Result<Vec<String>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(PipelineError::persistence(dir, e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PipelineError::persistence(dir, e))?
    {
        let is_file = entry
            .file_type()
            .await
            .map(|kind| kind.is_file())
            .unwrap_or(false);
        match entry.file_name().to_str() {
            Some(name) if is_file && !name.starts_with('.') => names.push(name.to_string()),
            _ => {}
        }
    }

    Ok(names)
}
