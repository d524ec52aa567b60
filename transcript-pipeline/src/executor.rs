//! Stage executor: one model call for one stage
//!
//! Builds the role-tagged messages for a stage, calls the model with the
//! stage's JSON Schema as response format, then validates and deserializes the
//! reply. The executor has no side effects beyond the model call; persistence
//! belongs to the orchestrator.

use std::sync::Arc;

use crate::client::{ChatMessage, ModelClient, ModelRequest, ResponseFormat};
use crate::config::ModelConfig;
use crate::error::Result;
use crate::prompts::{system_prompt, user_prompt};
use crate::schema::{parse_response, Stage, StageSchema};
use crate::source::{Identity, StageResult};

#[derive(Clone)]
pub struct StageExecutor {
    client: Arc<dyn ModelClient>,
    max_output_tokens: u32,
    temperature: f32,
}

impl StageExecutor {
    pub fn new(client: Arc<dyn ModelClient>, max_output_tokens: u32, temperature: f32) -> Self {
        Self {
            client,
            max_output_tokens,
            temperature,
        }
    }

    pub fn from_config(client: Arc<dyn ModelClient>, config: &ModelConfig) -> Self {
        Self::new(client, config.max_output_tokens, config.temperature)
    }

    /// System instructions followed by the stage input as user content
    pub fn messages_for(stage: Stage, input: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(system_prompt(stage)),
            ChatMessage::user(user_prompt(stage, input)),
        ]
    }

    pub fn request_for<S: StageSchema>(&self, input: &str) -> ModelRequest {
        ModelRequest {
            messages: Self::messages_for(S::STAGE, input),
            max_output_tokens: self.max_output_tokens,
            temperature: self.temperature,
            response_format: ResponseFormat {
                name: S::STAGE.artifact_name().to_string(),
                schema: S::json_schema(),
            },
        }
    }

    /// Call the model and return the validated, untagged payload
    pub async fn call<S: StageSchema>(&self, input: &str) -> Result<S> {
        let request = self.request_for::<S>(input);
        tracing::debug!(
            stage = %S::STAGE,
            input_chars = input.len(),
            "calling model"
        );

        let raw = self.client.complete(&request).await?;
        tracing::debug!(stage = %S::STAGE, response_chars = raw.len(), "model responded");

        parse_response::<S>(&raw)
    }

    /// Call the model and tag the validated result with `identity`
    pub async fn execute<S: StageSchema>(
        &self,
        input: &str,
        identity: &Identity,
    ) -> Result<StageResult<S>> {
        let data = self.call::<S>(input).await?;
        Ok(StageResult::new(identity.clone(), data))
    }
}
