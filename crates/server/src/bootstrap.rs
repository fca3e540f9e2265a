use std::sync::Arc;

use concierge_agent::{ModelCapability, ModelError, ReplyGenerator};
use concierge_core::config::{AppConfig, ConfigError};
use concierge_core::EnvAgentConfig;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub generator: ReplyGenerator,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("model client construction failed: {0}")]
    Model(#[source] ModelError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        environment = config.server.environment.as_str(),
        "starting application bootstrap"
    );
    config.validate()?;

    let model = ModelCapability::from_config(&config.llm).map_err(BootstrapError::Model)?;
    info!(
        event_name = "system.bootstrap.model_capability",
        correlation_id = "bootstrap",
        mode = model.mode(),
        base_url = %config.llm.base_url,
        "model capability resolved"
    );

    if config.webhook.secret.is_none() {
        info!(
            event_name = "system.bootstrap.webhook_unsigned",
            correlation_id = "bootstrap",
            "no webhook secret configured, inbound signatures will not be checked"
        );
    }

    Ok(Application { config, generator: ReplyGenerator::new(model, Arc::new(EnvAgentConfig)) })
}
