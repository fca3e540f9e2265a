use axum::{extract::State, Json};
use concierge_core::ServiceDefinition;
use serde::Serialize;

use crate::app::AppState;

/// What the agent tells the outside world about itself.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    pub company_name: String,
    pub company_description: String,
    pub tone: String,
    pub business_hours: String,
    pub escalation_email: Option<String>,
    pub services: Vec<ServiceDefinition>,
}

pub async fn agent_profile(State(state): State<AppState>) -> Json<AgentProfile> {
    let config = state.generator.agent_config();

    Json(AgentProfile {
        company_name: config.company_name,
        company_description: config.company_description,
        tone: config.tone,
        business_hours: config.business_hours,
        escalation_email: config.escalation_email,
        services: config.services,
    })
}
