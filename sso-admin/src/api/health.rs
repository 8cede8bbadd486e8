use crate::openapi::HEALTH_TAG;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Unhealthy,
}

/// Probe body; component fields are only present on `/ready`
#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    store_status: Option<ComponentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_store_status: Option<ComponentStatus>,
}

impl Health {
    fn ready(store_ok: bool, tokens_ok: bool) -> (StatusCode, Json<Self>) {
        let component = |ok: bool| {
            if ok {
                ComponentStatus::Healthy
            } else {
                ComponentStatus::Unhealthy
            }
        };
        let ready = store_ok && tokens_ok;
        let code = if ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        let body = Self {
            status: if ready { "ok" } else { "error" },
            store_status: Some(component(store_ok)),
            token_store_status: Some(component(tokens_ok)),
        };
        (code, Json(body))
    }
}

/// Liveness: the process answers
#[utoipa::path(
    get,
    path = "/health",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is healthy", body = Health)
    )
)]
pub(crate) async fn health_check() -> Json<Health> {
    Json(Health {
        status: "ok",
        store_status: None,
        token_store_status: None,
    })
}

/// Readiness: the store and the token store are reachable
#[utoipa::path(
    get,
    path = "/ready",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is ready", body = Health),
        (status = 503, description = "A component is unreachable", body = Health)
    )
)]
pub(crate) async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let (store_ok, tokens_ok) = state.component_health().await;
    Health::ready(store_ok, tokens_ok)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
}
