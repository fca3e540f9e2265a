use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use concierge_agent::ReplyGenerator;
use concierge_core::{
    config::{Environment, WebhookConfig},
    AgentReply, AgentReplyInput, InterfaceError,
};
use serde::Serialize;
use uuid::Uuid;

use crate::bootstrap::Application;
use crate::{health, profile, simulate, webhook};

#[derive(Clone)]
pub struct AppState {
    pub generator: ReplyGenerator,
    pub environment: Environment,
    pub webhook: WebhookConfig,
}

impl AppState {
    pub fn from_application(app: &Application) -> Self {
        Self {
            generator: app.generator.clone(),
            environment: app.config.server.environment,
            webhook: app.config.webhook.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/agent", get(profile::agent_profile))
        .route("/api/simulate", post(simulate::simulate))
        .route("/api/webhook", post(webhook::webhook))
        .with_state(state)
}

pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Runs one generation on its own task; a panic inside a model adapter comes
/// back as `Err` instead of unwinding through the connection.
pub async fn generate_reply(
    generator: &ReplyGenerator,
    input: AgentReplyInput,
    correlation_id: &str,
) -> Result<AgentReply, tokio::task::JoinError> {
    let generator = generator.clone();
    let correlation_id = correlation_id.to_string();
    tokio::spawn(async move { generator.generate(&input, &correlation_id).await }).await
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl From<InterfaceError> for ApiError {
    fn from(error: InterfaceError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { error: self.0.message().to_string() })).into_response()
    }
}
