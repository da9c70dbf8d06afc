//! Per-user push channel (server-sent events).
//!
//! The subscription is scoped to the path user; lagged receivers skip
//! ahead rather than erroring out, and serialization failures drop the
//! single event instead of the whole stream.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use super::Ctx;

pub async fn events(
    State(ctx): State<Ctx>,
    Path(user_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = ctx.notifier.subscribe(&user_id);
    debug!(user_id, "event stream attached");

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(change) => match Event::default().json_data(&change) {
                    Ok(event) => return Some((Ok::<_, Infallible>(event), rx)),
                    Err(_) => continue,
                },
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
