use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Uri},
    response::Response,
};
use concierge_core::{AgentReplyInput, InterfaceError};
use tracing::{error, info, warn};
use url::form_urlencoded;

use crate::app::{generate_reply, new_correlation_id, ApiError, AppState};
use crate::signature::{signed_url, verify_signature, SIGNATURE_HEADER};
use crate::twiml::message_response;

pub const UNKNOWN_SENDER: &str = "unknown";

pub async fn webhook(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let correlation_id = new_correlation_id();
    let params: Vec<(String, String)> = form_urlencoded::parse(&body).into_owned().collect();

    let provided = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());
    let url = signed_url(&state.webhook, &headers, &uri);
    let outcome = verify_signature(state.webhook.secret.as_ref(), &url, &params, provided);

    if !outcome.is_accepted() {
        if state.environment.is_production() {
            warn!(
                event_name = "http.webhook.signature_rejected",
                correlation_id = %correlation_id,
                outcome = outcome.as_str(),
                signed_url = %url,
                "rejecting webhook with invalid signature"
            );
            return Err(
                InterfaceError::unauthorized("Invalid Twilio signature", &correlation_id).into()
            );
        }
        warn!(
            event_name = "http.webhook.signature_ignored",
            correlation_id = %correlation_id,
            outcome = outcome.as_str(),
            environment = state.environment.as_str(),
            signed_url = %url,
            "webhook signature check failed outside production, continuing"
        );
    }

    let field = |name: &str| {
        params.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    };

    let message = field("Body").unwrap_or_default();
    if message.is_empty() {
        return Err(InterfaceError::bad_request("Message body is required", &correlation_id).into());
    }

    let input = AgentReplyInput {
        body: message.to_string(),
        from: field("From").unwrap_or(UNKNOWN_SENDER).to_string(),
        timestamp: field("Timestamp").map(str::to_string),
    };

    info!(
        event_name = "http.webhook.received",
        correlation_id = %correlation_id,
        sender = %input.from,
        signature = outcome.as_str(),
        "inbound message received"
    );

    match generate_reply(&state.generator, input, &correlation_id).await {
        Ok(reply) => Ok(message_response(&reply.reply)),
        Err(join_error) => {
            error!(
                event_name = "http.webhook.failed",
                correlation_id = %correlation_id,
                error = %join_error,
                "webhook reply generation failed"
            );
            Err(InterfaceError::internal("Failed to generate agent reply.", &correlation_id).into())
        }
    }
}
