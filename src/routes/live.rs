// SPDX-License-Identifier: MIT

//! Live sample ingest and server-sent-event stream.

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures_util::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::models::LiveSample;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/live", post(ingest))
        .route("/api/live/stream", get(stream_samples))
}

/// Accept a sample from a companion device and fan it out.
async fn ingest(State(state): State<Arc<AppState>>, Json(sample): Json<LiveSample>) -> StatusCode {
    state.live.publish(sample);
    StatusCode::NO_CONTENT
}

/// SSE stream of live samples; the latest sample is replayed on connect.
async fn stream_samples(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let (last, rx) = state.live.subscribe();

    let replay = stream::iter(last.map(|sample| Event::default().json_data(sample)));
    let updates = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(sample) => return Some((Event::default().json_data(sample), rx)),
                // A lagged subscriber skips to the freshest samples.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(replay.chain(updates)).keep_alive(KeepAlive::default())
}
