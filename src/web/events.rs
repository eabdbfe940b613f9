//! SSE streaming endpoint.
//!
//! Binds an HTTP response to a subscription's delivery queue and writes
//! one SSE record per queued message until the client disconnects or
//! the subscription is deleted. Served from its own listener so no
//! management-side request timeout can cut a stream off.

use crate::pipeline::publish::EVENT_TYPE_EDGEX;
use crate::submgr::SubscriptionManager;
use crate::web::api::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::convert::Infallible;
use std::sync::Arc;

/// Build the streaming router.
pub fn events_router(manager: Arc<SubscriptionManager>) -> Router {
    Router::new()
        .route("/api/v3/events/:subid", get(stream_events))
        .with_state(AppState { manager })
}

async fn stream_events(State(state): State<AppState>, Path(subid): Path<String>) -> Response {
    let manager = &state.manager;
    tracing::debug!(subscription = %subid, "events stream requested");
    let Some(sub) = manager.lookup(&subid) else {
        return (StatusCode::NOT_FOUND, "Subscription not found").into_response();
    };
    if manager.is_tombstoned(&sub) || manager.is_queue_closed(&sub) {
        return StatusCode::NOT_FOUND.into_response();
    }
    // Takes the consumer slot and raises `active`; the stream guard
    // restores both when the response body is dropped, whether the
    // client went away or the queue closed underneath us.
    let Ok(mut stream) = manager.attach_stream(&sub) else {
        return (StatusCode::NOT_FOUND, "Subscription not found").into_response();
    };

    let records = async_stream::stream! {
        while let Some(msg) = stream.recv().await {
            let event = if msg.event_type == EVENT_TYPE_EDGEX {
                Event::default().event(EVENT_TYPE_EDGEX)
            } else {
                Event::default()
            };
            yield Ok::<Event, Infallible>(event.data(msg.payload));
        }
        // recv() returned None: the subscription was deleted and the
        // queue drained, so the connection closes.
    };

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        Sse::new(records),
    )
        .into_response()
}
