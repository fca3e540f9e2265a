//! Reply generation.
//!
//! The remote model is treated as optional and untrusted. Whatever it does,
//! [`ReplyGenerator::generate`] hands back an [`AgentReply`]: either the
//! normalized model output or the deterministic fallback.

use std::sync::Arc;

use concierge_core::{
    AgentConfig, AgentConfigSource, AgentReply, AgentReplyInput, Classification,
};
use serde_json::Value;
use tracing::{error, info};

use crate::llm::{ChatMessage, ChatRequest, ModelCapability, ModelError};
use crate::prompt::{build_system_prompt, build_user_prompt};

pub const FALLBACK_CONFIDENCE: f64 = 0.35;
pub const DEFAULT_MODEL_CONFIDENCE: f64 = 0.5;

#[derive(Clone)]
pub struct ReplyGenerator {
    model: ModelCapability,
    config: Arc<dyn AgentConfigSource>,
}

impl ReplyGenerator {
    pub fn new(model: ModelCapability, config: Arc<dyn AgentConfigSource>) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &ModelCapability {
        &self.model
    }

    pub fn agent_config(&self) -> AgentConfig {
        self.config.agent_config()
    }

    pub async fn generate(&self, input: &AgentReplyInput, correlation_id: &str) -> AgentReply {
        let config = self.config.agent_config();

        let ModelCapability::Available(model) = &self.model else {
            info!(
                event_name = "agent.reply.fallback",
                correlation_id = %correlation_id,
                reason = "model_unavailable",
                sender = %input.from,
                "no model credential configured, returning fallback reply"
            );
            return fallback_reply(input, &config);
        };

        let request = ChatRequest {
            model: config.model.clone(),
            temperature: config.temperature,
            messages: vec![
                ChatMessage::system(build_system_prompt(&config)),
                ChatMessage::user(build_user_prompt(input, &config)),
            ],
        };

        let outcome = match model.complete_json(&request).await {
            Ok(raw) => normalize_model_reply(&raw, &config),
            Err(error) => Err(error),
        };

        match outcome {
            Ok(reply) => {
                info!(
                    event_name = "agent.reply.generated",
                    correlation_id = %correlation_id,
                    sender = %input.from,
                    classification = %reply.classification,
                    confidence = reply.confidence,
                    escalated = reply.escalated,
                    "model reply generated"
                );
                reply
            }
            Err(error) => {
                error!(
                    event_name = "agent.reply.model_failed",
                    correlation_id = %correlation_id,
                    sender = %input.from,
                    error = %error,
                    "failed to generate agent reply, returning fallback"
                );
                fallback_reply(input, &config)
            }
        }
    }
}

/// The reply used whenever the model is absent or misbehaves.
pub fn fallback_reply(input: &AgentReplyInput, config: &AgentConfig) -> AgentReply {
    AgentReply {
        reply: format!("{}\n\n(Automated reply to {})", config.fallbacks.generic, input.from),
        classification: Classification::NotUnderstood,
        confidence: FALLBACK_CONFIDENCE,
        escalated: true,
    }
}

/// Parses the model's JSON object and coerces every field into range.
pub fn normalize_model_reply(raw: &str, config: &AgentConfig) -> Result<AgentReply, ModelError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|error| ModelError::Decode(error.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(ModelError::Decode("expected a JSON object".to_string()));
    };

    let reply = fields
        .get("reply")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| config.fallbacks.generic.clone());

    let classification = fields
        .get("classification")
        .and_then(Value::as_str)
        .map(Classification::from_label)
        .unwrap_or(Classification::NotUnderstood);

    let confidence = fields
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|value| value.is_finite())
        .map(|value| value.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_MODEL_CONFIDENCE);

    let escalated = fields.get("escalated").map(is_truthy).unwrap_or(false);

    Ok(AgentReply { reply, classification, confidence, escalated })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
