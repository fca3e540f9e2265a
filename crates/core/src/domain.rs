use serde::{Deserialize, Serialize};

/// Intent bucket the agent assigns to an inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    Lead,
    Support,
    Pricing,
    OffHours,
    NotUnderstood,
}

impl Classification {
    pub const ALL: [Classification; 5] =
        [Self::Lead, Self::Support, Self::Pricing, Self::OffHours, Self::NotUnderstood];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Support => "support",
            Self::Pricing => "pricing",
            Self::OffHours => "off-hours",
            Self::NotUnderstood => "not-understood",
        }
    }

    /// Maps a model-provided label onto the closed set. Anything unrecognized
    /// lands in `NotUnderstood`.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lead" => Self::Lead,
            "support" => Self::Support,
            "pricing" => Self::Pricing,
            "off-hours" => Self::OffHours,
            _ => Self::NotUnderstood,
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReplyInput {
    pub body: String,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    pub reply: String,
    pub classification: Classification,
    pub confidence: f64,
    pub escalated: bool,
}
