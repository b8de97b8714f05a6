//! HTTP surface of the control plane.
//!
//! Every endpoint answers `text/plain`. Guidance ("activate first",
//! "already active") is a normal `200`; only controller errors map to `500`.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::application::AgentLifecycleController;
use crate::domain::{AgentctlConfig, ControlError};

/// Shared state for HTTP handlers.
pub struct AppState {
    pub controller: AgentLifecycleController,
    pub config: AgentctlConfig,
}

/// `ControlError` rendered as a `500` with the full error chain.
pub struct HttpError(ControlError);

impl From<ControlError> for HttpError {
    fn from(err: ControlError) -> Self {
        Self(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "agent control operation failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

type TextResult = Result<String, HttpError>;

/// Build the router with every control endpoint.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/activateAgent", get(activate_agent))
        .route("/terminateAgent", get(terminate_agent))
        .route("/listAllRules", get(list_all_rules))
        .route("/deleteAllRules", get(delete_all_rules))
        .route("/addRules", post(add_rules))
        .route("/deleteRules", post(delete_rules))
        .route("/agentStatus", get(agent_status))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Collect every `properties` value from decoded query pairs, in order.
///
/// `properties` may repeat; empty values are dropped.
#[must_use]
pub fn properties_from_query(pairs: Vec<(String, String)>) -> Vec<String> {
    pairs
        .into_iter()
        .filter(|(key, value)| key == "properties" && !value.is_empty())
        .map(|(_, value)| value)
        .collect()
}

async fn activate_agent(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> TextResult {
    let options = state
        .config
        .activation_options(properties_from_query(pairs));
    Ok(state.controller.activate(&options).await?.to_string())
}

async fn terminate_agent(State(state): State<Arc<AppState>>) -> TextResult {
    Ok(state.controller.terminate().await?.to_string())
}

async fn list_all_rules(State(state): State<Arc<AppState>>) -> TextResult {
    Ok(state.controller.list_all_rules().await?.to_string())
}

async fn delete_all_rules(State(state): State<Arc<AppState>>) -> TextResult {
    Ok(state.controller.delete_all_rules().await?.to_string())
}

async fn add_rules(State(state): State<Arc<AppState>>, body: String) -> TextResult {
    Ok(state.controller.add_rules(&body).await?.to_string())
}

async fn delete_rules(State(state): State<Arc<AppState>>, body: String) -> TextResult {
    Ok(state.controller.delete_rules(&body).await?.to_string())
}

async fn agent_status(State(state): State<Arc<AppState>>) -> String {
    state.controller.status().await.to_string()
}

/// Minimal health-check handler for load-balancer probes.
async fn health() -> StatusCode {
    StatusCode::OK
}
