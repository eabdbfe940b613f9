//! Subscription management endpoints.
//!
//! CRUD over subscriber include/exclude sets. Every id-scoped request
//! raises the subscription's `processing` flag for its duration so the
//! idle sweeper cannot delete it mid-operation.

use crate::submgr::{ProcessingGuard, Subscription, SubscriptionManager};
use crate::web::response::{
    echo_correlation_id, respond_base, BaseResponse, CreateSubscriptionResponse,
    SubscriptionListsResponse, SubscriptionRequest,
};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use std::sync::Arc;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SubscriptionManager>,
}

/// Build the management router. The per-request timeout layer is
/// applied by the runtime, where the listener is assembled.
pub fn management_router(manager: Arc<SubscriptionManager>) -> Router {
    Router::new()
        .route("/api/v3/subscription", post(create_subscription))
        .route(
            "/api/v3/subscription/id/:id",
            get(get_subscription)
                .put(put_subscription)
                .patch(patch_subscription)
                .delete(delete_subscription),
        )
        .layer(middleware::from_fn(echo_correlation_id))
        .with_state(AppState { manager })
}

/// Shared prologue for id-scoped handlers: resolve the handle, raise
/// `processing`, and re-check liveness. The guard keeps the sweeper
/// away until the handler returns.
fn take_subscription(
    state: &AppState,
    id: &str,
) -> Result<(Arc<Subscription>, ProcessingGuard), Response> {
    let Some(sub) = state.manager.lookup(id) else {
        return Err(respond_base(StatusCode::NOT_FOUND, "Subscription not found"));
    };
    let guard = state.manager.begin_processing(&sub);
    if state.manager.is_tombstoned(&sub) || state.manager.is_queue_closed(&sub) {
        return Err(respond_base(StatusCode::NOT_FOUND, "Subscription not found"));
    }
    Ok((sub, guard))
}

async fn create_subscription(State(state): State<AppState>) -> Response {
    match state.manager.new_subscription() {
        Ok(id) => {
            tracing::debug!(subscription = %id, "subscription created");
            let body = CreateSubscriptionResponse {
                base: BaseResponse::new("", "Subscription created", StatusCode::CREATED),
                subscription_id: id,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(err) => {
            tracing::info!(error = %err, "subscription creation request rejected");
            respond_base(StatusCode::SERVICE_UNAVAILABLE, &err.to_string())
        }
    }
}

async fn get_subscription(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let (sub, _guard) = match take_subscription(&state, &id) {
        Ok(found) => found,
        Err(response) => return response,
    };
    let (include, exclude) = state.manager.info(&sub);
    let body = SubscriptionListsResponse {
        base: BaseResponse::new("", "", StatusCode::OK),
        include,
        exclude,
    };
    (StatusCode::OK, Json(body)).into_response()
}

async fn delete_subscription(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let (_sub, _guard) = match take_subscription(&state, &id) {
        Ok(found) => found,
        Err(response) => return response,
    };
    tracing::debug!(subscription = %id, "deleting subscription");
    state.manager.delete(&id);
    respond_base(StatusCode::OK, "Subscription deleted")
}

/// Replace both lists: clear everything through the coalescence rules
/// (feeding each include to `exclude` and vice versa cancels the exact
/// entries), then apply the body as a patch.
async fn put_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let (sub, _guard) = match take_subscription(&state, &id) {
        Ok(found) => found,
        Err(response) => return response,
    };
    let (includes, excludes) = state.manager.info(&sub);
    let mut some_error = false;
    for exclude in &excludes {
        if let Err(err) = state.manager.include(&sub, exclude) {
            tracing::error!(subscription = %id, prefix = %exclude, error = %err,
                "error deleting exclude entry during PUT");
            some_error = true;
        }
    }
    for include in &includes {
        if let Err(err) = state.manager.exclude(&sub, include) {
            tracing::error!(subscription = %id, prefix = %include, error = %err,
                "error deleting include entry during PUT");
            some_error = true;
        }
    }
    if some_error {
        return respond_base(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error deleting existing subscription list items",
        );
    }
    apply_patch(&state, &id, &sub, &body)
}

async fn patch_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let (sub, _guard) = match take_subscription(&state, &id) {
        Ok(found) => found,
        Err(response) => return response,
    };
    apply_patch(&state, &id, &sub, &body)
}

/// Union the request body into the current lists. The first failing
/// edit aborts with 503; earlier edits are not rolled back.
fn apply_patch(state: &AppState, id: &str, sub: &Arc<Subscription>, body: &[u8]) -> Response {
    let request: SubscriptionRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(err) => return respond_base(StatusCode::BAD_REQUEST, &err.to_string()),
    };
    for prefix in &request.include {
        if let Err(err) = state.manager.include(sub, prefix) {
            tracing::info!(subscription = %id, prefix = %prefix, error = %err,
                "error including topic for subscription");
            return respond_base(StatusCode::SERVICE_UNAVAILABLE, &err.to_string());
        }
    }
    for prefix in &request.exclude {
        if let Err(err) = state.manager.exclude(sub, prefix) {
            tracing::info!(subscription = %id, prefix = %prefix, error = %err,
                "error excluding topic from subscription");
            return respond_base(StatusCode::SERVICE_UNAVAILABLE, &err.to_string());
        }
    }
    respond_base(StatusCode::OK, "Subscription updated.")
}
