/*
 * Responsibility
 * - GET /ws: origin check, then upgrade to WebSocket and drive one
 *   ChannelSession per socket
 * - every inbound text message goes through dispatch::process_message
 * - MESSAGE frames queued by the broker are written to the same socket
 */
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket, rejection::WebSocketUpgradeRejection},
    },
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::state::AppState;
use crate::ws::broker::OUTBOX_CAPACITY;
use crate::ws::dispatch::process_message;
use crate::ws::frame::Frame;
use crate::ws::session::ChannelSession;

pub async fn ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if !state.channel_origins.allows(&headers) {
        warn!(origin = ?headers.get(header::ORIGIN), "channel upgrade from disallowed origin");
        return AppError::Forbidden("origin not allowed").into_response();
    }

    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| handle_socket(socket, state)),
        Err(rejection) => rejection.into_response(),
    }
}

async fn send_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    frame: &Frame,
) -> Result<(), axum::Error> {
    sender.send(Message::Text(frame.to_text().into())).await
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (outbox, mut inbox) = mpsc::channel::<Frame>(OUTBOX_CAPACITY);
    let session = ChannelSession::new(outbox);
    let (mut sender, mut receiver) = socket.split();

    debug!(session = %session.id(), "channel opened");

    loop {
        tokio::select! {
            Some(frame) = inbox.recv() => {
                if send_frame(&mut sender, &frame).await.is_err() {
                    break;
                }
            }
            msg = receiver.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            let _ = send_frame(&mut sender, &Frame::error("Frames must be UTF-8")).await;
                            break;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    // Ping/Pong are answered by axum
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!(session = %session.id(), error = %e, "WebSocket error");
                        break;
                    }
                };

                let step = process_message(&state.handshake, &state.broker, &session, &text);

                let mut delivered = true;
                for reply in &step.replies {
                    if send_frame(&mut sender, reply).await.is_err() {
                        delivered = false;
                        break;
                    }
                }

                if step.close || !delivered {
                    break;
                }
            }
        }
    }

    state.broker.remove(session.id());
    let _ = sender.close().await;

    match session.identity() {
        Some(identity) => info!(session = %session.id(), subject = %identity.subject, "channel closed"),
        None => debug!(session = %session.id(), "unauthenticated channel closed"),
    }
}
