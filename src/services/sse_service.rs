use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    services::sse_events::{EVENT_HANDSHAKE, EVENT_SNAPSHOT},
    state::SharedState,
};

/// Subscribe to the spectator stream, returning the events every new client
/// receives before the live feed.
pub async fn subscribe(state: &SharedState) -> (Vec<ServerEvent>, broadcast::Receiver<ServerEvent>) {
    // subscribe first so nothing published between the snapshot and the feed is lost
    let receiver = state.sse().subscribe();

    let handshake = Handshake {
        message: "spectator stream connected".into(),
        persistent: state.is_persistent(),
        controllers: state.controllers().len(),
    };
    let snapshot = state.snapshot().await;

    let mut greeting = Vec::with_capacity(2);
    for event in [
        ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &handshake),
        ServerEvent::json(Some(EVENT_SNAPSHOT.to_string()), &snapshot),
    ] {
        match event {
            Ok(event) => greeting.push(event),
            Err(err) => warn!(error = %err, "failed to serialize SSE greeting"),
        }
    }

    (greeting, receiver)
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    greeting: Vec<ServerEvent>,
    mut receiver: broadcast::Receiver<ServerEvent>,
    mut shutdown: watch::Receiver<bool>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: replays the greeting, then reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        for payload in greeting {
            if tx.send(Ok(to_event(payload))).await.is_err() {
                return;
            }
        }

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            tokio::select! {
                _ = tx.closed() => break,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // the next snapshot supersedes whatever was dropped
                            debug!(skipped, "spectator lagged behind");
                            continue;
                        }
                    }
                }
            }
        }

        info!("spectator SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
