use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use concierge_core::config::{AppConfig, LoadOptions};
use concierge_core::{AgentConfig, AgentConfigDraft};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

#[derive(Debug, Serialize)]
struct ConfigReport {
    precedence: &'static str,
    runtime: Vec<ConfigEntry>,
    agent: AgentConfig,
    agent_issues: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            )
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let sources = SourceLookup { doc: config_file_doc.as_ref(), path: config_file_path.as_deref() };

    let runtime = vec![
        sources.entry(
            "server.bind_address",
            &["CONCIERGE_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        sources.entry("server.port", &["CONCIERGE_PORT", "PORT"], config.server.port.to_string()),
        sources.entry(
            "server.environment",
            &["CONCIERGE_ENV"],
            config.server.environment.as_str().to_string(),
        ),
        sources.entry("llm.api_key", &["OPENAI_API_KEY"], redact(config.llm.api_key.as_ref())),
        sources.entry("llm.base_url", &["OPENAI_BASE_URL"], config.llm.base_url.clone()),
        sources.entry(
            "llm.timeout_secs",
            &["CONCIERGE_LLM_TIMEOUT_SECS"],
            config.llm.timeout_secs.to_string(),
        ),
        sources.entry(
            "webhook.secret",
            &["WHATSAPP_WEBHOOK_SECRET"],
            redact(config.webhook.secret.as_ref()),
        ),
        sources.entry(
            "webhook.public_base_url",
            &["WHATSAPP_WEBHOOK_PUBLIC_URL"],
            config.webhook.public_base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
        ),
        sources.entry("logging.level", &["CONCIERGE_LOG_LEVEL"], config.logging.level.clone()),
        sources.entry(
            "logging.format",
            &["CONCIERGE_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_lowercase(),
        ),
    ];

    let draft = AgentConfigDraft::from_env();
    let agent_issues = draft.issues().iter().map(ToString::to_string).collect();
    let agent = match draft.validate() {
        Ok(agent) => agent,
        Err(rejection) => rejection.substitute_defaults(),
    };

    CommandResult::json(
        "config",
        &ConfigReport {
            precedence: "overrides > env > file > default",
            runtime,
            agent,
            agent_issues,
        },
    )
}

struct SourceLookup<'a> {
    doc: Option<&'a Value>,
    path: Option<&'a Path>,
}

impl SourceLookup<'_> {
    fn entry(&self, key: &'static str, env_keys: &[&str], value: String) -> ConfigEntry {
        ConfigEntry { key, value, source: self.source(key, env_keys) }
    }

    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        // Blank variables are ignored by the loader, so they are not a source either.
        let is_set = |key: &&&str| env::var(key).is_ok_and(|value| !value.trim().is_empty());
        if let Some(env_key) = env_keys.iter().find(is_set) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("concierge.toml"), PathBuf::from("config/concierge.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Keeps a recognizable prefix such as `sk-` and hides the rest.
fn redact(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };
    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.split_once('-') {
        Some((prefix, _)) if prefix.len() <= 4 => format!("{prefix}-***"),
        _ => "<redacted>".to_string(),
    }
}
