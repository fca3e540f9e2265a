use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::app::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub model: HealthCheck,
    pub environment: &'static str,
    pub checked_at: String,
}

/// The service is ready whenever it is serving; a missing model only changes
/// how replies are produced.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let model = if state.generator.model().is_available() {
        HealthCheck { status: "model", detail: "model endpoint configured".to_string() }
    } else {
        HealthCheck {
            status: "fallback_only",
            detail: "no usable model credential, replies use fallback messaging".to_string(),
        }
    };

    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "concierge-server runtime initialized".to_string(),
        },
        model,
        environment: state.environment.as_str(),
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
