use axum::{
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
    Json, Extension,
};
use serde::Serialize;
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;

const WRITE_ROLES: &[&str] = &["writer", "admin"];

/// Authenticated caller identity, available to handlers via request extensions.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub name: String,
    pub role: String,
}

impl CallerIdentity {
    /// Whether this caller may submit forms and run write procedures.
    pub fn can_write(&self) -> bool {
        WRITE_ROLES.contains(&self.role.as_str())
    }
}

#[derive(Serialize)]
struct AuthError {
    success: bool,
    error: String,
}

fn reject(status: StatusCode, error: &str) -> Response {
    (status, Json(AuthError {
        success: false,
        error: error.to_string(),
    })).into_response()
}

pub fn forbidden(caller: &CallerIdentity) -> Response {
    tracing::warn!(caller = %caller.name, role = %caller.role, "Write attempted without write role");
    reject(StatusCode::FORBIDDEN, "This operation requires the writer or admin role")
}

pub async fn auth_middleware<B>(
    Extension(config): Extension<std::sync::Arc<AuthConfig>>,
    mut req: Request<B>,
    next: Next<B>,
) -> Response {
    if !config.enabled {
        req.extensions_mut().insert(CallerIdentity {
            name: "anonymous".to_string(),
            role: "admin".to_string(),
        });
        return next.run(req).await;
    }

    let api_key = req.headers()
        .get("X-API-Key")
        .or_else(|| req.headers().get(header::AUTHORIZATION))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.strip_prefix("Bearer ").unwrap_or(s));

    let Some(key) = api_key else {
        metrics::increment_counter!("libtech_auth_failures_total", "reason" => "missing");
        return reject(
            StatusCode::UNAUTHORIZED,
            "Missing API key. Provide X-API-Key header or Authorization: Bearer <key>",
        );
    };

    match config.api_keys.iter().find(|entry| {
            entry.key.as_bytes().ct_eq(key.as_bytes()).into()
        }) {
        Some(entry) => {
            tracing::debug!(caller = %entry.name, role = %entry.role, "Authenticated request");
            req.extensions_mut().insert(CallerIdentity {
                name: entry.name.clone(),
                role: entry.role.clone(),
            });
            next.run(req).await
        }
        None => {
            tracing::warn!("Invalid API key presented");
            metrics::increment_counter!("libtech_auth_failures_total", "reason" => "invalid");
            reject(StatusCode::UNAUTHORIZED, "Invalid API key")
        }
    }
}
