use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use concierge_agent::{ModelCapability, ReplyGenerator};
use concierge_core::config::{AppConfig, LoadOptions};
use concierge_core::{AgentReply, AgentReplyInput, EnvAgentConfig};
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_INPUT, EXIT_RUNTIME};

pub const DEFAULT_SENDER: &str = "whatsapp:+15555550123";

#[derive(Debug, Serialize)]
struct SimulationOutput {
    command: &'static str,
    status: &'static str,
    model_mode: &'static str,
    reply: AgentReply,
}

pub fn run(message: &str, from: &str) -> CommandResult {
    let message = message.trim();
    if message.is_empty() {
        return CommandResult::failure("simulate", "invalid_input", "Message is required", EXIT_INPUT);
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "simulate",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };

    let model = match ModelCapability::from_config(&config.llm) {
        Ok(model) => model,
        Err(error) => {
            return CommandResult::failure("simulate", "model_client", error.to_string(), EXIT_RUNTIME)
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "simulate",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            )
        }
    };

    let model_mode = model.mode();
    let generator = ReplyGenerator::new(model, Arc::new(EnvAgentConfig));
    let input = AgentReplyInput {
        body: message.to_string(),
        from: from.to_string(),
        timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    };
    let correlation_id = format!("cli-simulate-{}", Utc::now().timestamp_millis());
    let reply = runtime.block_on(generator.generate(&input, &correlation_id));

    CommandResult::json(
        "simulate",
        &SimulationOutput { command: "simulate", status: "ok", model_mode, reply },
    )
}
