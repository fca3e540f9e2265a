use axum::{body::Bytes, extract::State, Json};
use chrono::{SecondsFormat, Utc};
use concierge_core::{AgentReply, AgentReplyInput, InterfaceError};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::app::{generate_reply, new_correlation_id, ApiError, AppState};

pub const DEFAULT_SIMULATED_SENDER: &str = "whatsapp:+15555550123";

#[derive(Debug, Default)]
pub struct SimulateRequest {
    pub message: Option<String>,
    pub from: Option<String>,
}

impl SimulateRequest {
    /// Scalars are accepted as text (`42` becomes `"42"`); nested values are not.
    fn from_object(object: &Map<String, Value>) -> Result<Self, String> {
        Ok(Self { message: text_field(object, "message")?, from: text_field(object, "from")? })
    }
}

fn text_field(object: &Map<String, Value>, name: &str) -> Result<Option<String>, String> {
    match object.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(Value::Number(value)) => Ok(Some(value.to_string())),
        Some(Value::Bool(value)) => Ok(Some(value.to_string())),
        Some(Value::Array(_) | Value::Object(_)) => Err(format!("{name} must be a string")),
    }
}

pub async fn simulate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AgentReply>, ApiError> {
    let correlation_id = new_correlation_id();

    let object = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err("top-level value is not an object".to_string()),
        Err(error) => Err(error.to_string()),
    };
    let object = object.map_err(|error| {
        warn!(
            event_name = "http.simulate.invalid_body",
            correlation_id = %correlation_id,
            error = %error,
            "simulation request body is not a JSON object"
        );
        InterfaceError::bad_request("Request body must be a JSON object", &correlation_id)
    })?;

    let request = SimulateRequest::from_object(&object).map_err(|message| {
        warn!(
            event_name = "http.simulate.invalid_field",
            correlation_id = %correlation_id,
            error = %message,
            "simulation request field has an unsupported type"
        );
        InterfaceError::bad_request(message, &correlation_id)
    })?;

    let message = request.message.as_deref().map(str::trim).unwrap_or_default();
    if message.is_empty() {
        return Err(InterfaceError::bad_request("Message is required", &correlation_id).into());
    }

    let from = request
        .from
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SIMULATED_SENDER.to_string());

    info!(
        event_name = "http.simulate.received",
        correlation_id = %correlation_id,
        sender = %from,
        "simulated message received"
    );

    let input = AgentReplyInput {
        body: message.to_string(),
        from,
        timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    };

    match generate_reply(&state.generator, input, &correlation_id).await {
        Ok(reply) => Ok(Json(reply)),
        Err(join_error) => {
            error!(
                event_name = "http.simulate.failed",
                correlation_id = %correlation_id,
                error = %join_error,
                "simulation failed"
            );
            Err(InterfaceError::internal("Failed to simulate agent response.", &correlation_id)
                .into())
        }
    }
}
