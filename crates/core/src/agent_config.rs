//! Agent profile resolved from the process environment.
//!
//! Resolution happens in three explicit steps so callers can see (and choose)
//! the substitution policy:
//!
//! 1. [`AgentConfigDraft::from_lookup`] reads raw values, applying defaults for
//!    unset variables and swapping in the built-in catalog when
//!    `COMPANY_SERVICES` is not valid JSON.
//! 2. [`AgentConfigDraft::validate`] checks the draft and returns either an
//!    [`AgentConfig`] or a [`ConfigRejection`] listing every [`ConfigIssue`].
//! 3. [`ConfigRejection::substitute_defaults`] replaces the failing fields and
//!    keeps the rest.
//!
//! [`AgentConfig::resolve_from_env`] runs all three and logs each issue.

use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub const ENV_COMPANY_NAME: &str = "COMPANY_NAME";
pub const ENV_COMPANY_DESCRIPTION: &str = "COMPANY_DESCRIPTION";
pub const ENV_COMPANY_SERVICES: &str = "COMPANY_SERVICES";
pub const ENV_TONE: &str = "AGENT_TONE";
pub const ENV_ESCALATION_EMAIL: &str = "AGENT_ESCALATION_EMAIL";
pub const ENV_BUSINESS_HOURS: &str = "AGENT_BUSINESS_HOURS";
pub const ENV_FALLBACK_GENERIC: &str = "AGENT_FALLBACK_GENERIC";
pub const ENV_FALLBACK_OUTSIDE_HOURS: &str = "AGENT_FALLBACK_OUTSIDE_HOURS";
pub const ENV_FALLBACK_ESCALATION: &str = "AGENT_FALLBACK_ESCALATION";
pub const ENV_MODEL: &str = "OPENAI_MODEL";
pub const ENV_TEMPERATURE: &str = "AGENT_TEMPERATURE";

pub const AGENT_ENV_KEYS: [&str; 11] = [
    ENV_COMPANY_NAME,
    ENV_COMPANY_DESCRIPTION,
    ENV_COMPANY_SERVICES,
    ENV_TONE,
    ENV_ESCALATION_EMAIL,
    ENV_BUSINESS_HOURS,
    ENV_FALLBACK_GENERIC,
    ENV_FALLBACK_OUTSIDE_HOURS,
    ENV_FALLBACK_ESCALATION,
    ENV_MODEL,
    ENV_TEMPERATURE,
];

pub const DEFAULT_COMPANY_NAME: &str = "Acme Client Services & Co.";
pub const DEFAULT_COMPANY_DESCRIPTION: &str = "We help small and mid-sized businesses streamline their operations with tailored consulting, automation, and customer support solutions.";
pub const DEFAULT_TONE: &str = "warm, clear, and proactive";
pub const DEFAULT_BUSINESS_HOURS: &str = "Monday to Friday • 9:00 – 17:00 (local time)";
pub const DEFAULT_FALLBACK_GENERIC: &str =
    "Thanks for reaching out! I’ll pass this along to our human team and they’ll follow up shortly.";
pub const DEFAULT_FALLBACK_OUTSIDE_HOURS: &str = "Thanks for contacting us. Our team is currently offline, but we’ll get back to you as soon as we return.";
pub const DEFAULT_FALLBACK_ESCALATION: &str =
    "This request looks like it needs a specialist. I will connect you with a teammate for further help.";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.5;
pub const MAX_TEMPERATURE: f64 = 2.0;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub response_highlights: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackMessages {
    pub generic: String,
    pub outside_hours: String,
    pub escalation: String,
}

impl Default for FallbackMessages {
    fn default() -> Self {
        Self {
            generic: DEFAULT_FALLBACK_GENERIC.to_string(),
            outside_hours: DEFAULT_FALLBACK_OUTSIDE_HOURS.to_string(),
            escalation: DEFAULT_FALLBACK_ESCALATION.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub company_name: String,
    pub company_description: String,
    pub services: Vec<ServiceDefinition>,
    pub tone: String,
    pub escalation_email: Option<String>,
    pub business_hours: String,
    pub fallbacks: FallbackMessages,
    pub model: String,
    pub temperature: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            company_description: DEFAULT_COMPANY_DESCRIPTION.to_string(),
            services: builtin_services(),
            tone: DEFAULT_TONE.to_string(),
            escalation_email: None,
            business_hours: DEFAULT_BUSINESS_HOURS.to_string(),
            fallbacks: FallbackMessages::default(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl AgentConfig {
    /// Reads the process environment and always produces a usable profile.
    pub fn resolve_from_env() -> Self {
        Self::resolve_with(read_env)
    }

    pub fn resolve_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match AgentConfigDraft::from_lookup(lookup).validate() {
            Ok(config) => config,
            Err(rejection) => {
                for issue in &rejection.issues {
                    warn!(
                        event_name = "config.agent.invalid_field",
                        correlation_id = "config",
                        issue = %issue,
                        "invalid agent configuration field, substituting default"
                    );
                }
                rejection.substitute_defaults()
            }
        }
    }
}

/// The two-entry catalog used when `COMPANY_SERVICES` is unset, unparsable, or
/// fails validation.
pub fn builtin_services() -> Vec<ServiceDefinition> {
    vec![
        ServiceDefinition {
            name: "General Consultation".to_string(),
            description: "15-minute discovery call to understand client needs and recommend the right service plan.".to_string(),
            response_highlights: vec![
                "Consultations are free to book".to_string(),
                "Held remotely via Google Meet or WhatsApp call".to_string(),
                "Available within 1-2 business days".to_string(),
            ],
        },
        ServiceDefinition {
            name: "Full-Service Engagement".to_string(),
            description: "Hands-on support package covering strategy, implementation, and ongoing optimization for client projects.".to_string(),
            response_highlights: vec![
                "Projects start within 7 business days after contract signing".to_string(),
                "Custom proposals sent within 24 hours".to_string(),
                "Multi-channel communication with dedicated account manager".to_string(),
            ],
        },
    ]
}

#[derive(Clone, Debug, PartialEq)]
pub enum TemperatureInput {
    Parsed(f64),
    Unparsable(String),
}

/// Raw agent profile before validation.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentConfigDraft {
    pub company_name: String,
    pub company_description: String,
    pub services: Vec<ServiceDefinition>,
    pub tone: String,
    pub escalation_email: Option<String>,
    pub business_hours: String,
    pub fallbacks: FallbackMessages,
    pub model: String,
    pub temperature: TemperatureInput,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigIssue {
    #[error("companyName must not be empty")]
    EmptyCompanyName,
    #[error("companyDescription must not be empty")]
    EmptyCompanyDescription,
    #[error("tone must not be empty")]
    EmptyTone,
    #[error("businessHours must not be empty")]
    EmptyBusinessHours,
    #[error("model must not be empty")]
    EmptyModel,
    #[error("services must contain at least one entry")]
    NoServices,
    #[error("services[{index}].name must not be empty")]
    EmptyServiceName { index: usize },
    #[error("services[{index}].description must not be empty")]
    EmptyServiceDescription { index: usize },
    #[error("escalationEmail `{0}` is not a valid email address")]
    InvalidEscalationEmail(String),
    #[error("temperature `{0}` is not a number")]
    TemperatureNotANumber(String),
    #[error("temperature {0} must be in range 0..=2")]
    TemperatureOutOfRange(String),
}

impl ConfigIssue {
    fn field(&self) -> ConfigField {
        match self {
            Self::EmptyCompanyName => ConfigField::CompanyName,
            Self::EmptyCompanyDescription => ConfigField::CompanyDescription,
            Self::EmptyTone => ConfigField::Tone,
            Self::EmptyBusinessHours => ConfigField::BusinessHours,
            Self::EmptyModel => ConfigField::Model,
            Self::NoServices
            | Self::EmptyServiceName { .. }
            | Self::EmptyServiceDescription { .. } => ConfigField::Services,
            Self::InvalidEscalationEmail(_) => ConfigField::EscalationEmail,
            Self::TemperatureNotANumber(_) | Self::TemperatureOutOfRange(_) => {
                ConfigField::Temperature
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConfigField {
    CompanyName,
    CompanyDescription,
    Tone,
    BusinessHours,
    Model,
    Services,
    EscalationEmail,
    Temperature,
}

/// A draft that failed validation, with every issue that was found.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigRejection {
    pub issues: Vec<ConfigIssue>,
    pub draft: AgentConfigDraft,
}

impl ConfigRejection {
    /// Replaces each failing field with its default and keeps the fields that
    /// passed. The result always passes validation.
    pub fn substitute_defaults(self) -> AgentConfig {
        let Self { issues, draft } = self;
        let failed = |field: ConfigField| issues.iter().any(|issue| issue.field() == field);
        let defaults = AgentConfig::default();

        let temperature = match draft.temperature {
            TemperatureInput::Parsed(value) if value.is_finite() => {
                value.clamp(0.0, MAX_TEMPERATURE)
            }
            _ => DEFAULT_TEMPERATURE,
        };

        AgentConfig {
            company_name: if failed(ConfigField::CompanyName) {
                defaults.company_name
            } else {
                draft.company_name
            },
            company_description: if failed(ConfigField::CompanyDescription) {
                defaults.company_description
            } else {
                draft.company_description
            },
            services: if failed(ConfigField::Services) { defaults.services } else { draft.services },
            tone: if failed(ConfigField::Tone) { defaults.tone } else { draft.tone },
            escalation_email: if failed(ConfigField::EscalationEmail) {
                None
            } else {
                draft.escalation_email
            },
            business_hours: if failed(ConfigField::BusinessHours) {
                defaults.business_hours
            } else {
                draft.business_hours
            },
            fallbacks: draft.fallbacks,
            model: if failed(ConfigField::Model) { defaults.model } else { draft.model },
            temperature,
        }
    }
}

impl AgentConfigDraft {
    pub fn from_env() -> Self {
        Self::from_lookup(read_env)
    }

    /// Builds a draft from a variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let get_trimmed = |key: &str| get(key).map(|value| value.trim().to_string());

        let services = match get(ENV_COMPANY_SERVICES) {
            Some(raw) => match serde_json::from_str::<Vec<ServiceDefinition>>(&raw) {
                Ok(services) => services,
                Err(error) => {
                    warn!(
                        event_name = "config.agent.services_unparsable",
                        correlation_id = "config",
                        error = %error,
                        "failed to parse COMPANY_SERVICES, using built-in catalog"
                    );
                    builtin_services()
                }
            },
            None => builtin_services(),
        };

        let temperature = match get_trimmed(ENV_TEMPERATURE) {
            Some(raw) => match raw.parse::<f64>() {
                Ok(value) => TemperatureInput::Parsed(value),
                Err(_) => TemperatureInput::Unparsable(raw),
            },
            None => TemperatureInput::Parsed(DEFAULT_TEMPERATURE),
        };

        Self {
            company_name: get_trimmed(ENV_COMPANY_NAME)
                .unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string()),
            company_description: get_trimmed(ENV_COMPANY_DESCRIPTION)
                .unwrap_or_else(|| DEFAULT_COMPANY_DESCRIPTION.to_string()),
            services,
            tone: get_trimmed(ENV_TONE).unwrap_or_else(|| DEFAULT_TONE.to_string()),
            escalation_email: get_trimmed(ENV_ESCALATION_EMAIL),
            business_hours: get_trimmed(ENV_BUSINESS_HOURS)
                .unwrap_or_else(|| DEFAULT_BUSINESS_HOURS.to_string()),
            fallbacks: FallbackMessages {
                generic: get(ENV_FALLBACK_GENERIC)
                    .unwrap_or_else(|| DEFAULT_FALLBACK_GENERIC.to_string()),
                outside_hours: get(ENV_FALLBACK_OUTSIDE_HOURS)
                    .unwrap_or_else(|| DEFAULT_FALLBACK_OUTSIDE_HOURS.to_string()),
                escalation: get(ENV_FALLBACK_ESCALATION)
                    .unwrap_or_else(|| DEFAULT_FALLBACK_ESCALATION.to_string()),
            },
            model: get_trimmed(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature,
        }
    }

    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.company_name.trim().is_empty() {
            issues.push(ConfigIssue::EmptyCompanyName);
        }
        if self.company_description.trim().is_empty() {
            issues.push(ConfigIssue::EmptyCompanyDescription);
        }
        if self.tone.trim().is_empty() {
            issues.push(ConfigIssue::EmptyTone);
        }
        if self.business_hours.trim().is_empty() {
            issues.push(ConfigIssue::EmptyBusinessHours);
        }
        if self.model.trim().is_empty() {
            issues.push(ConfigIssue::EmptyModel);
        }

        if self.services.is_empty() {
            issues.push(ConfigIssue::NoServices);
        }
        for (index, service) in self.services.iter().enumerate() {
            if service.name.trim().is_empty() {
                issues.push(ConfigIssue::EmptyServiceName { index });
            }
            if service.description.trim().is_empty() {
                issues.push(ConfigIssue::EmptyServiceDescription { index });
            }
        }

        if let Some(email) = &self.escalation_email {
            if !looks_like_email(email) {
                issues.push(ConfigIssue::InvalidEscalationEmail(email.clone()));
            }
        }

        match &self.temperature {
            TemperatureInput::Parsed(value) if !value.is_finite() => {
                issues.push(ConfigIssue::TemperatureNotANumber(value.to_string()));
            }
            TemperatureInput::Parsed(value) if !(0.0..=MAX_TEMPERATURE).contains(value) => {
                issues.push(ConfigIssue::TemperatureOutOfRange(value.to_string()));
            }
            TemperatureInput::Parsed(_) => {}
            TemperatureInput::Unparsable(raw) => {
                issues.push(ConfigIssue::TemperatureNotANumber(raw.clone()));
            }
        }

        issues
    }

    pub fn validate(self) -> Result<AgentConfig, ConfigRejection> {
        let issues = self.issues();
        if !issues.is_empty() {
            return Err(ConfigRejection { issues, draft: self });
        }

        let temperature = match self.temperature {
            TemperatureInput::Parsed(value) => value,
            TemperatureInput::Unparsable(_) => DEFAULT_TEMPERATURE,
        };

        Ok(AgentConfig {
            company_name: self.company_name,
            company_description: self.company_description,
            services: self.services,
            tone: self.tone,
            escalation_email: self.escalation_email,
            business_hours: self.business_hours,
            fallbacks: self.fallbacks,
            model: self.model,
            temperature,
        })
    }
}

/// Where the reply generator gets its profile from on each request.
pub trait AgentConfigSource: Send + Sync {
    fn agent_config(&self) -> AgentConfig;
}

/// Re-reads the process environment on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvAgentConfig;

impl AgentConfigSource for EnvAgentConfig {
    fn agent_config(&self) -> AgentConfig {
        AgentConfig::resolve_from_env()
    }
}

#[derive(Clone, Debug)]
pub struct StaticAgentConfig(pub AgentConfig);

impl AgentConfigSource for StaticAgentConfig {
    fn agent_config(&self) -> AgentConfig {
        self.0.clone()
    }
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok()
}
