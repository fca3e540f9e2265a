pub mod agent_config;
pub mod config;
pub mod domain;
pub mod errors;

pub use agent_config::{
    AgentConfig, AgentConfigDraft, AgentConfigSource, ConfigIssue, ConfigRejection,
    EnvAgentConfig, FallbackMessages, ServiceDefinition, StaticAgentConfig,
};
pub use domain::{AgentReply, AgentReplyInput, Classification};
pub use errors::InterfaceError;
