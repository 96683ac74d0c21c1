//! HTTP surface over the dashboard.
//!
//! Backend calls are blocking, so every handler that touches the database hands
//! the work to `spawn_blocking`.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinError;

use crate::{
    about::ABOUT,
    auth::{auth_middleware, forbidden, CallerIdentity},
    catalog::ReportKind,
    config::AuthConfig,
    dashboard::{Dashboard, DashboardError, Inputs},
};

pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub metrics: Option<PrometheusHandle>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            warning: None,
        }
    }
}

fn ok<T: Serialize>(data: T) -> Response {
    Json(ApiResponse::ok(data)).into_response()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Dashboard(#[from] DashboardError),
    #[error("background task failed: {0}")]
    Join(#[from] JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, warning) = match &self {
            ApiError::Dashboard(e) if e.is_validation() => (StatusCode::UNPROCESSABLE_ENTITY, true),
            ApiError::Dashboard(
                DashboardError::UnknownCategory(_)
                | DashboardError::UnknownReport(_)
                | DashboardError::UnknownForm(_)
                | DashboardError::TableNotListed { .. },
            ) => (StatusCode::NOT_FOUND, false),
            ApiError::Dashboard(DashboardError::Unavailable(_)) => (StatusCode::SERVICE_UNAVAILABLE, false),
            ApiError::Dashboard(_) | ApiError::Join(_) => (StatusCode::INTERNAL_SERVER_ERROR, false),
        };
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "Request failed");
        }

        let body: ApiResponse<()> = ApiResponse {
            success: false,
            data: None,
            error: (!warning).then(|| message.clone()),
            warning: warning.then_some(message),
        };
        (status, Json(body)).into_response()
    }
}

/// Runs `f` against the dashboard on the blocking pool.
async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Dashboard) -> Result<T, DashboardError> + Send + 'static,
    T: Send + 'static,
{
    let dashboard = state.dashboard.clone();
    Ok(tokio::task::spawn_blocking(move || f(&dashboard)).await??)
}

/// JSON values arrive as strings, numbers or booleans; forms and params take text.
fn to_inputs(body: Option<Json<BTreeMap<String, serde_json::Value>>>) -> Inputs {
    body.map(|Json(map)| map)
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::Null => String::new(),
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect()
}

pub fn router(state: Arc<AppState>, auth: Arc<AuthConfig>) -> Router {
    let api = Router::new()
        .route("/api/categories", get(list_categories))
        .route("/api/reports/:category/:report", post(run_report))
        .route("/api/tables/:category/:table", get(view_table))
        .route("/api/forms", get(list_forms))
        .route("/api/forms/:form", get(describe_form).post(submit_form))
        .route("/api/about", get(about))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(auth));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .merge(api)
        .with_state(state)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    database: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> Response {
    match blocking(&state, |d| Ok(d.is_connected())).await {
        Ok(database) => ok(Health { status: "ok", database }),
        Err(e) => e.into_response(),
    }
}

async fn render_metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

async fn list_categories(State(state): State<Arc<AppState>>) -> Response {
    ok(serde_json::json!({
        "categories": state.dashboard.catalog().categories,
        "sections": ["Add Data", "About"],
    }))
}

async fn run_report(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CallerIdentity>,
    Path((category, report)): Path<(String, String)>,
    body: Option<Json<BTreeMap<String, serde_json::Value>>>,
) -> Response {
    let writes = state
        .dashboard
        .catalog()
        .category(&category)
        .and_then(|c| c.report(&report))
        .map_or(false, |r| matches!(r.kind, ReportKind::Procedure { .. }));
    if writes && !caller.can_write() {
        return forbidden(&caller);
    }

    let inputs = to_inputs(body);
    match blocking(&state, move |d| d.run_report(&category, &report, &inputs)).await {
        Ok(outcome) => ok(outcome),
        Err(e) => e.into_response(),
    }
}

async fn view_table(
    State(state): State<Arc<AppState>>,
    Path((category, table)): Path<(String, String)>,
) -> Response {
    match blocking(&state, move |d| d.view_table(&category, &table)).await {
        Ok(outcome) => ok(outcome),
        Err(e) => e.into_response(),
    }
}

async fn list_forms(State(state): State<Arc<AppState>>) -> Response {
    ok(state.dashboard.forms())
}

async fn describe_form(State(state): State<Arc<AppState>>, Path(form): Path<String>) -> Response {
    match state.dashboard.form(&form) {
        Ok(definition) => ok(definition),
        Err(e) => ApiError::from(e).into_response(),
    }
}

async fn submit_form(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(form): Path<String>,
    body: Option<Json<BTreeMap<String, serde_json::Value>>>,
) -> Response {
    if !caller.can_write() {
        return forbidden(&caller);
    }
    let inputs = to_inputs(body);
    match blocking(&state, move |d| d.submit_form(&form, &inputs)).await {
        Ok(outcome) => ok(outcome),
        Err(e) => e.into_response(),
    }
}

async fn about() -> Response {
    ok(ABOUT)
}
