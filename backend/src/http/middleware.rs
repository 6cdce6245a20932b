//! Request middleware: the error envelope and the admin guard.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use super::dto::{Envelope, RequestInfo};
use super::error::{AppError, ErrorDetails};
use super::state::AppState;

/// Upper bound on a plain-text rejection body read back for its message.
const REJECTION_BODY_LIMIT: usize = 16 * 1024;

/// Wrap every error response in the uniform envelope.
///
/// Handler errors arrive with an [`ErrorDetails`] extension. Anything else
/// (extractor rejections, unknown routes, oversized bodies) keeps its status
/// and uses its plain-text body as the message.
pub async fn envelope_errors(mut req: Request, next: Next) -> Response {
    let info = RequestInfo::new(req.method(), req.uri().to_string());
    req.extensions_mut().insert(info.clone());

    let response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let details = match parts.extensions.remove::<ErrorDetails>() {
        Some(details) => details,
        None => ErrorDetails::new(rejection_message(status, body).await),
    };
    (status, Json(Envelope::failure(status, info, details))).into_response()
}

async fn rejection_message(status: StatusCode, body: Body) -> String {
    let text = to_bytes(body, REJECTION_BODY_LIMIT)
        .await
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .unwrap_or_default();
    if !text.is_empty() {
        return text;
    }
    match status {
        StatusCode::NOT_FOUND => "Route not found".to_string(),
        _ => status.canonical_reason().unwrap_or("Request failed").to_string(),
    }
}

/// Require `Authorization: Bearer <admin token>` when a token is configured.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let supplied = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match supplied {
        None => Err(AppError::Unauthorized("Authentication required".to_string())),
        Some(token) if token == expected => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!("Rejected admin request to {}", req.uri());
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}
