//! Run configuration
//!
//! Settings come from three layers, later ones winning: built-in defaults, an
//! optional YAML file, then CLI flags. Secrets only ever come from the
//! environment, which [`load_env`] populates from dotenv files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::client::{RateLimit, RetryPolicy};
use crate::error::{PipelineError, Result};
use crate::source::{default_url_templates, TranscriptSource};
use crate::splitter::DEFAULT_BATCH_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(alias = "open_ai")]
    #[value(name = "openai")]
    OpenAi,
    Anthropic,
}

impl Provider {
    /// Environment variable holding this provider's API key
    pub fn api_key_var(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini-2024-07-18",
            Provider::Anthropic => "claude-3-5-haiku-latest",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: Provider,
    pub name: String,
    /// Override for the provider's API root (proxies, compatible gateways)
    pub base_url: Option<String>,
    pub max_output_tokens: u32,
    pub temperature: f32,
    /// Transport timeout; `None` keeps the HTTP client's default
    pub timeout_secs: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            name: Provider::OpenAi.default_model().to_string(),
            base_url: None,
            max_output_tokens: 10_000,
            temperature: 0.5,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root holding `{source}/{raw_file}` transcripts
    pub raw_dir: PathBuf,
    /// Root holding one directory per stage artifact
    pub output_dir: PathBuf,
    /// Tokens per segmentation/analysis call
    pub batch_size: usize,
    /// Open-coding calls in flight per file
    pub concurrency: usize,
    pub model: ModelConfig,
    pub retry: RetryPolicy,
    pub rate_limit: Option<RateLimit>,
    /// Per-source URL templates, merged over the built-in ones
    pub url_templates: BTreeMap<String, String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("./raw"),
            output_dir: PathBuf::from("./processed-transcripts/json"),
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: 1,
            model: ModelConfig::default(),
            retry: RetryPolicy::default(),
            rate_limit: None,
            url_templates: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Load from a YAML file, or return defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("failed to read config file {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&content).map_err(|e| {
            PipelineError::Config(format!("failed to parse config file {}: {}", path.display(), e))
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| PipelineError::Config(format!("failed to parse config YAML: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PipelineError::Config("batch_size must be at least 1".to_string()));
        }
        if self.concurrency == 0 {
            return Err(PipelineError::Config("concurrency must be at least 1".to_string()));
        }
        if self.model.max_output_tokens == 0 {
            return Err(PipelineError::Config(
                "model.max_output_tokens must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(PipelineError::Config(format!(
                "model.temperature must be within 0.0..=2.0, got {}",
                self.model.temperature
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(PipelineError::Config("retry.max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Resolve a source name against configured and built-in URL templates
    pub fn source(&self, name: &str) -> Result<TranscriptSource> {
        let template = self
            .url_templates
            .get(name)
            .cloned()
            .or_else(|| default_url_templates().remove(name))
            .ok_or_else(|| {
                PipelineError::Config(format!(
                    "no url template for source `{}`; add one under url_templates",
                    name
                ))
            })?;
        TranscriptSource::new(name, template)
    }

    /// API key for the configured provider
    pub fn api_key(&self) -> Result<String> {
        let var = self.model.provider.api_key_var();
        std::env::var(var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| PipelineError::Config(format!("{} is not set", var)))
    }
}

/// Load environment variables from `./configs/.{APP_ENV}.env`, or `.env` when `APP_ENV` is unset
///
/// Returns the file that was loaded, if any.
pub fn load_env() -> Option<PathBuf> {
    match std::env::var("APP_ENV") {
        Ok(env) if !env.is_empty() => {
            let path = PathBuf::from(format!("./configs/.{}.env", env));
            dotenv::from_path(&path).ok().map(|_| path)
        }
        _ => dotenv::dotenv().ok(),
    }
}
