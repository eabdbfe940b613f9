//! Versioned JSON response envelope shared by the management endpoints.

use axum::extract::Request;
use axum::http::{HeaderName, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// API version carried in every response envelope.
pub const API_VERSION: &str = "v3";

/// Correlation header echoed back to the caller.
pub const CORRELATION_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// The envelope common to every management response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResponse {
    pub api_version: String,
    pub request_id: String,
    pub status_code: u16,
    pub message: String,
}

impl BaseResponse {
    pub fn new(request_id: &str, message: &str, status: StatusCode) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            request_id: request_id.to_string(),
            status_code: status.as_u16(),
            message: message.to_string(),
        }
    }
}

/// Response to `POST /api/v3/subscription`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionResponse {
    #[serde(flatten)]
    pub base: BaseResponse,
    pub subscription_id: String,
}

/// Response to `GET /api/v3/subscription/id/{id}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionListsResponse {
    #[serde(flatten)]
    pub base: BaseResponse,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Body of PUT and PATCH requests. Both arrays are optional.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// A bare envelope response with the given status and message.
pub fn respond_base(status: StatusCode, message: &str) -> Response {
    (status, Json(BaseResponse::new("", message, status))).into_response()
}

/// Middleware: echo the request's correlation id on the response.
pub async fn echo_correlation_id(request: Request, next: Next) -> Response {
    let correlation_id = request.headers().get(CORRELATION_HEADER).cloned();
    let mut response = next.run(request).await;
    if let Some(value) = correlation_id {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}
