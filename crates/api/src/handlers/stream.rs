//! Server-Sent Events observer endpoint.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::error::AppResult;
use crate::state::AppState;
use crate::ws::QueueUpdate;

/// SSE event name carrying a [`QueueUpdate`].
const UPDATE_EVENT: &str = "update";

fn update_event(update: QueueUpdate) -> Event {
    Event::default()
        .event(UPDATE_EVENT)
        .json_data(update)
        .unwrap_or_else(|_| Event::default().event(UPDATE_EVENT))
}

/// GET /api/v1/stream
///
/// One `update` event per active point first, then one per queue change.
/// A subscriber that falls behind skips the lost events; the periodic
/// snapshot brings it back in line. The stream ends at server shutdown.
pub async fn sse_handler(
    State(state): State<AppState>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    // Subscribe before reading the snapshot so nothing falls in between.
    let receiver = state.engine.subscribe();
    let snapshot = state.engine.snapshot().await?;
    tracing::debug!(points = snapshot.len(), "SSE observer connected");

    let initial = stream::iter(
        snapshot
            .into_iter()
            .map(|count| Ok::<_, Infallible>(update_event(QueueUpdate::from(count)))),
    );

    let live = BroadcastStream::new(receiver).filter_map(|item| async move {
        match item {
            Ok(event) => Some(Ok::<_, Infallible>(update_event(QueueUpdate::from(&event)))),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "SSE observer lagged");
                None
            }
        }
    });

    let stream = initial
        .chain(live)
        .take_until(state.shutdown.cancelled_owned());

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
