use std::{
    fmt::Display,
    time::{Duration, Instant},
};

use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{ControllerAck, ControllerInboundMessage, ControllerRejected, DeviceKind},
    error::ServiceError,
    input::{Action, InputSource, buttons::ChordResolver, gamepad::GamepadTracker},
    services::{game_service, sse_events},
    state::{ControllerConnection, SharedState},
};

const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Internal error type for controller frame handling.
///
/// Distinct from `ServiceError`, which is used for HTTP responses.
#[derive(Debug, Error)]
enum ControllerError {
    /// Writer channel closed; the connection should be terminated immediately.
    #[error("connection closed")]
    ConnectionClosed,
    /// A frame meant for another kind of device.
    #[error("{got} messages are not accepted from a {device:?} controller")]
    WrongDevice { device: DeviceKind, got: &'static str },
    /// The game refused the action.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}

/// Per-connection input decoding.
enum Decoder {
    Gamepad(GamepadTracker),
    Buttons(ChordResolver),
}

impl Decoder {
    fn new(state: &SharedState, device: DeviceKind) -> Self {
        match device {
            DeviceKind::Gamepad => Decoder::Gamepad(GamepadTracker::new()),
            DeviceKind::Buttons => Decoder::Buttons(ChordResolver::new(
                state.config().button_scheme,
                state.config().chord_window,
            )),
        }
    }

    fn source(&self) -> InputSource {
        match self {
            Decoder::Gamepad(_) => InputSource::Gamepad,
            Decoder::Buttons(_) => InputSource::Buttons,
        }
    }

    fn deadline(&self) -> Option<Instant> {
        match self {
            Decoder::Buttons(chords) => chords.deadline(),
            Decoder::Gamepad(_) => None,
        }
    }

    /// Turn an inbound frame into the actions it triggers.
    fn decode(&mut self, message: ControllerInboundMessage) -> Result<Vec<Action>, ControllerError> {
        match (self, message) {
            (Decoder::Gamepad(pad), ControllerInboundMessage::GamepadReport { state }) => {
                Ok(pad.update(state))
            }
            (Decoder::Buttons(chords), ControllerInboundMessage::Button { button, pressed }) => {
                if pressed {
                    chords.press(button, Instant::now());
                    Ok(Vec::new())
                } else {
                    Ok(chords.release(button).into_iter().collect())
                }
            }
            (decoder, ControllerInboundMessage::GamepadReport { .. }) => {
                Err(ControllerError::WrongDevice {
                    device: decoder.device(),
                    got: "gamepad_report",
                })
            }
            (decoder, ControllerInboundMessage::Button { .. }) => Err(ControllerError::WrongDevice {
                device: decoder.device(),
                got: "button",
            }),
            (_, ControllerInboundMessage::Identification { .. }) => {
                debug!("ignoring duplicate identification message");
                Ok(Vec::new())
            }
            (_, ControllerInboundMessage::Unknown) => {
                debug!("ignoring unknown controller message");
                Ok(Vec::new())
            }
        }
    }

    /// Fire a chord whose window has closed.
    fn poll(&mut self, now: Instant) -> Option<Action> {
        match self {
            Decoder::Buttons(chords) => chords.poll(now),
            Decoder::Gamepad(_) => None,
        }
    }

    fn device(&self) -> DeviceKind {
        match self {
            Decoder::Gamepad(_) => DeviceKind::Gamepad,
            Decoder::Buttons(_) => DeviceKind::Buttons,
        }
    }
}

/// Handle the full lifecycle for an individual controller WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (sender, receiver) = socket.split();
    serve_controller(state, sender, receiver, IDENT_TIMEOUT).await;
}

/// Identify the controller, register it and feed its frames to the game until it leaves.
async fn serve_controller<W, R, E>(
    state: SharedState,
    mut sender: W,
    mut receiver: R,
    ident_timeout: Duration,
) where
    W: Sink<Message> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(ident_timeout, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            reject(&outbound_tx, "expected a text identification message");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) => {
            debug!("controller left before identifying");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Err(_) => {
            warn!("controller identification timed out");
            reject(&outbound_tx, "identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let inbound = match ControllerInboundMessage::from_json_str(&initial_message) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "failed to parse or validate controller message");
            reject(&outbound_tx, err.to_string());
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let ControllerInboundMessage::Identification { device, name } = inbound else {
        warn!("first message was not identification");
        reject(&outbound_tx, "first message must be an identification");
        finalize(writer_task, outbound_tx).await;
        return;
    };

    let connection = ControllerConnection {
        id: Uuid::new_v4(),
        device,
        name,
        tx: outbound_tx.clone(),
    };
    let id = connection.id;
    state.controllers().insert(id, connection.clone());
    info!(%id, ?device, name = ?connection.name, "controller connected");
    sse_events::broadcast_controller_connected(&state, &connection);

    if send_message_to_websocket(&outbound_tx, &ControllerAck::ready(id, device)).is_ok() {
        run_session(&state, id, device, &mut receiver, &outbound_tx).await;
    } else {
        info!(%id, "connection closed before acknowledgement, terminating");
    }

    if let Some((_, connection)) = state.controllers().remove(&id) {
        sse_events::broadcast_controller_disconnected(&state, &connection);
    }
    info!(%id, "controller disconnected");

    finalize(writer_task, outbound_tx).await;
}

async fn run_session<R, E>(
    state: &SharedState,
    id: Uuid,
    device: DeviceKind,
    receiver: &mut R,
    outbound_tx: &mpsc::UnboundedSender<Message>,
) where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut decoder = Decoder::new(state, device);
    let mut shutdown = state.shutdown_watcher();

    loop {
        if state.is_shutting_down() {
            let _ = outbound_tx.send(Message::Close(None));
            break;
        }

        let deadline = decoder.deadline();
        let chord_timer = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at.into()).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = chord_timer => {
                if let Some(action) = decoder.poll(Instant::now()) {
                    if dispatch(state, action, decoder.source()).await.is_err() {
                        break;
                    }
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            message = receiver.next() => {
                let Some(message) = message else {
                    break;
                };
                match message {
                    Ok(Message::Text(text)) => {
                        debug!(%id, payload = %text, "received controller message");
                        let result = match ControllerInboundMessage::from_json_str(&text) {
                            Ok(msg) => match decoder.decode(msg) {
                                Ok(actions) => {
                                    let mut outcome = Ok(());
                                    for action in actions {
                                        outcome = dispatch(state, action, decoder.source()).await;
                                        if outcome.is_err() {
                                            break;
                                        }
                                    }
                                    outcome
                                }
                                Err(err) => Err(err),
                            },
                            Err(err) => {
                                warn!(%id, error = %err, "failed to parse or validate controller message");
                                reject(outbound_tx, err.to_string());
                                Ok(())
                            }
                        };

                        match result {
                            Ok(()) => {}
                            Err(err @ ControllerError::WrongDevice { .. }) => {
                                warn!(%id, error = %err, "rejected controller message");
                                reject(outbound_tx, err.to_string());
                            }
                            Err(err) => {
                                info!(%id, error = %err, "stopping controller session");
                                break;
                            }
                        }
                    }
                    Ok(Message::Ping(payload)) => {
                        let _ = outbound_tx.send(Message::Pong(payload));
                    }
                    Ok(Message::Close(frame)) => {
                        info!(%id, "controller closed");
                        let _ = outbound_tx.send(Message::Close(frame));
                        break;
                    }
                    Ok(Message::Binary(_)) => {}
                    Ok(Message::Pong(_)) => {}
                    Err(err) => {
                        warn!(%id, error = %err, "websocket error");
                        break;
                    }
                }
            }
        }
    }
}

async fn dispatch(
    state: &SharedState,
    action: Action,
    source: InputSource,
) -> Result<(), ControllerError> {
    game_service::perform(state, action, source).await?;
    Ok(())
}

fn reject(tx: &mpsc::UnboundedSender<Message>, reason: impl Into<String>) {
    let _ = send_message_to_websocket(tx, &ControllerRejected::new(reason));
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failures are logged and swallowed; a closed writer is reported.
fn send_message_to_websocket<T>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), ControllerError>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| ControllerError::ConnectionClosed)
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
