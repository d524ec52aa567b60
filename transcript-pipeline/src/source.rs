//! Transcript sources, raw input access and artifact identity

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{PipelineError, Result};

/// URL templates for the sources the adapters know about; `{id}` is replaced by the file stem
pub const DEFAULT_URL_TEMPLATES: [(&str, &str); 4] = [
    ("youtube", "https://www.youtube.com/watch?v={id}"),
    ("reddit", "https://www.reddit.com/comments/{id}"),
    ("twitter", "https://twitter.com/i/web/status/{id}"),
    ("g2", "https://www.g2.com/products/{id}/reviews"),
];

pub fn default_url_templates() -> BTreeMap<String, String> {
    DEFAULT_URL_TEMPLATES
        .iter()
        .map(|(name, template)| (name.to_string(), template.to_string()))
        .collect()
}

/// A named source of raw transcripts with its URL template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSource {
    name: String,
    url_template: String,
}

impl TranscriptSource {
    pub fn new(name: impl Into<String>, url_template: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let url_template = url_template.into();

        if name.trim().is_empty() {
            return Err(PipelineError::Config("source name must not be empty".to_string()));
        }
        if !url_template.contains("{id}") {
            return Err(PipelineError::Config(format!(
                "url template for `{}` must contain `{{id}}`: {}",
                name, url_template
            )));
        }

        Ok(Self { name, url_template })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url_for(&self, id: &str) -> String {
        self.url_template.replace("{id}", id)
    }

    /// Identity fields for artifacts derived from `raw_file`
    pub fn identity(&self, raw_file: &str) -> Result<Identity> {
        let id = Path::new(raw_file)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| {
                PipelineError::Config(format!("raw file name `{}` has no usable stem", raw_file))
            })?;

        Ok(Identity {
            id: id.to_string(),
            source: self.name.clone(),
            url: self.url_for(id),
        })
    }

    pub fn raw_path(&self, raw_dir: &Path, raw_file: &str) -> PathBuf {
        raw_dir.join(&self.name).join(raw_file)
    }

    /// Read the full text of one raw transcript
    pub async fn read_raw(&self, raw_dir: &Path, raw_file: &str) -> Result<String> {
        let path = self.raw_path(raw_dir, raw_file);
        fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => PipelineError::FileNotFound(path),
            _ => PipelineError::InputRead { path, source: e },
        })
    }

    /// List the raw files an adapter has dropped for this source, sorted by name
    pub async fn list_raw_files(&self, raw_dir: &Path) -> Result<Vec<String>> {
        let dir = raw_dir.join(&self.name);
        let mut entries = fs::read_dir(&dir).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => PipelineError::FileNotFound(dir.clone()),
            _ => PipelineError::InputRead {
                path: dir.clone(),
                source: e,
            },
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PipelineError::InputRead {
                path: dir.clone(),
                source: e,
            })?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|kind| kind.is_file())
                .unwrap_or(false);
            if let (true, Some(name)) = (is_file, entry.file_name().to_str()) {
                files.push(name.to_string());
            }
        }

        files.sort();
        Ok(files)
    }
}

/// Identity fields injected into every persisted stage result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub source: String,
    pub url: String,
}

/// A validated stage output tagged with the identity of its raw input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult<T> {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(flatten)]
    pub data: T,
}

impl<T> StageResult<T> {
    pub fn new(identity: Identity, data: T) -> Self {
        Self { identity, data }
    }
}
