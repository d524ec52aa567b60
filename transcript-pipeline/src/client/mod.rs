//! Model boundary: one request/response call per stage invocation
//!
//! Concrete providers speak HTTP to a hosted model; decorators add retry and
//! rate limiting without the executor knowing about either.

mod anthropic;
mod openai;
mod rate_limit;
mod retry;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ModelConfig, PipelineConfig, Provider};
use crate::error::{PipelineError, Result};

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;
pub use rate_limit::{RateLimit, RateLimitedClient};
pub use retry::{RetryPolicy, RetryingClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A role-tagged chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The named JSON Schema the model's reply must match
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFormat {
    pub name: String,
    pub schema: Value,
}

/// Request envelope shared by the providers
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub messages: Vec<ChatMessage>,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

/// Trait implemented by concrete model providers and their decorators
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Issue one call and return the raw text payload
    ///
    /// Transport and API failures surface as [`PipelineError::ModelCall`].
    async fn complete(&self, request: &ModelRequest) -> Result<String>;
}

#[async_trait]
impl<C: ModelClient + ?Sized> ModelClient for Arc<C> {
    async fn complete(&self, request: &ModelRequest) -> Result<String> {
        (**self).complete(request).await
    }
}

/// Build the configured provider wrapped in its retry and rate-limit decorators
pub fn build_client(config: &PipelineConfig, api_key: String) -> Result<Arc<dyn ModelClient>> {
    let provider: Arc<dyn ModelClient> = provider_client(&config.model, api_key)?;

    let limited: Arc<dyn ModelClient> = match &config.rate_limit {
        Some(limit) => Arc::new(RateLimitedClient::new(provider, limit.clone())?),
        None => provider,
    };

    Ok(Arc::new(RetryingClient::new(limited, config.retry.clone())))
}

fn provider_client(model: &ModelConfig, api_key: String) -> Result<Arc<dyn ModelClient>> {
    Ok(match model.provider {
        Provider::OpenAi => Arc::new(OpenAiClient::new(api_key, model)?),
        Provider::Anthropic => Arc::new(AnthropicClient::new(api_key, model)?),
    })
}

pub(crate) fn model_error(context: &str, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::ModelCall(format!("{}: {}", context, err))
}
