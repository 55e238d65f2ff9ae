//! Vercel serverless function adapter.
//!
//! The request gate (CORS preflight, method check, body validation) and
//! response shaping live here so the function body in `api/` stays a thin
//! `vercel_runtime` wrapper and the whole surface is testable against a
//! scripted upstream.

use serde::Serialize;
use serde_json::json;
use vercel_runtime::{Body, Request, Response, StatusCode};

use crate::catalog::RecommendRequest;
use crate::config::RelayConfig;
use crate::error::ApiError;
use crate::processor::process_recommendation;
use crate::upstream::GenerativeApi;

/// Handles one inbound request end to end.
///
/// Preflight is answered before any validation, and the upstream is only
/// called once the body has deserialized and validated.
///
/// # Errors
///
/// Returns an error only if response building or JSON serialization fails.
pub async fn handle(
    req: Request,
    config: &RelayConfig,
    upstream: &dyn GenerativeApi,
) -> Result<Response<Body>, vercel_runtime::Error> {
    let request_id = uuid::Uuid::new_v4();
    tracing::info!(%request_id, method = %req.method(), path = %req.uri().path(), "received request");

    if req.method() == "OPTIONS" {
        return Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("Access-Control-Allow-Origin", config.allowed_origin.as_str())
            .header("Access-Control-Allow-Methods", "POST, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type")
            .body(Body::Empty)?);
    }

    if req.method() != "POST" {
        return error_response(&ApiError::MethodNotAllowed, config);
    }

    let request: RecommendRequest = match serde_json::from_slice(req.body()) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(%request_id, error = %e, "rejected malformed body");
            return error_response(
                &ApiError::bad_request(format!("Message and product context are required: {e}")),
                config,
            );
        }
    };

    if let Err(e) = request.validate() {
        tracing::warn!(%request_id, error = %e, "rejected invalid request");
        return error_response(&e, config);
    }

    match process_recommendation(&request, upstream).await {
        Ok(response) => json_response(StatusCode::OK, &response, config),
        Err(e) => {
            tracing::error!(%request_id, error = %e, "relay failed");
            error_response(&e, config)
        }
    }
}

fn json_response<T: Serialize>(
    status: StatusCode,
    payload: &T,
    config: &RelayConfig,
) -> Result<Response<Body>, vercel_runtime::Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", config.allowed_origin.as_str())
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Body::Text(serde_json::to_string(payload)?))?)
}

fn error_response(
    error: &ApiError,
    config: &RelayConfig,
) -> Result<Response<Body>, vercel_runtime::Error> {
    let status = StatusCode::from_u16(error.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_response(status, &json!({ "error": error.message() }), config)
}
