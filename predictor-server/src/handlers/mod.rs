//! HTTP handlers

pub mod health;
pub mod predict;

#[cfg(test)]
pub(crate) mod testing;

use axum::{
    http::header::{ALLOW, CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::AppError;

/// Unknown routes
pub async fn not_found(uri: axum::http::Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

/// Rewrite non-JSON error responses (body limit, timeout, wrong method)
/// into the `{"error", "status"}` shape used by the handlers
pub async fn json_errors(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return response;
    }

    tracing::debug!("Rewriting bare {} response as JSON", status);
    let mut rewritten = AppError::from_status(status).into_response();
    if let Some(allow) = response.headers().get(ALLOW) {
        rewritten.headers_mut().insert(ALLOW, allow.clone());
    }
    rewritten
}
