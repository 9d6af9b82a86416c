// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! Handles client connections, request dispatch, and change fanout.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use psync_core::protocol::{CompanionEvent, Method, Request, Response};
use psync_core::Snapshot;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::state::CompanionState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Run the WebSocket server on the given address.
pub async fn run(addr: SocketAddr, state: CompanionState) -> Result<(), BoxError> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", addr);
    serve(listener, state).await
}

/// Accept connections on an already-bound listener.
pub(crate) async fn serve(listener: TcpListener, state: CompanionState) -> Result<(), BoxError> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: CompanionState,
) -> Result<(), BoxError> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!("New WebSocket connection from: {}", peer_addr);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();
    let mut broadcast_rx = state.subscribe();

    loop {
        tokio::select! {
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match Request::from_json(&text) {
                            Ok(request) => handle_request(request, &state).await.to_json()?,
                            // Without an id there is nothing to correlate with
                            Err(e) => CompanionEvent::error(format!("invalid request: {}", e)).to_json()?,
                        };
                        ws_sink.send(Message::Text(reply.into())).await?;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", peer_addr);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        ws_sink.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", peer_addr, e);
                        break;
                    }
                    None => {
                        info!("Client {} stream ended", peer_addr);
                        break;
                    }
                }
            }

            event = broadcast_rx.recv() => {
                match event {
                    Ok(event) => {
                        let json = event.to_json()?;
                        if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                            warn!("Failed to send event to {}: {}", peer_addr, e);
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!("Client {} lagged by {} events", peer_addr, n);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    info!("Connection closed: {}", peer_addr);
    Ok(())
}

/// Process one request. Every request gets exactly one response.
pub(crate) async fn handle_request(request: Request, state: &CompanionState) -> Response {
    let method = match request.method() {
        Ok(method) => method,
        Err(e) => {
            debug!(id = %request.id, kind = %request.kind, "unknown method");
            return Response::error(request.id, e.to_string());
        }
    };
    debug!(id = %request.id, %method, "request");

    match method {
        Method::GetData => {
            let snapshot = state.snapshot().await;
            match serde_json::to_value(&snapshot) {
                Ok(data) => Response::ok(request.id, data),
                Err(e) => Response::error(request.id, e.to_string()),
            }
        }

        Method::SetData => {
            let snapshot: Snapshot = match serde_json::from_value(request.payload) {
                Ok(snapshot) => snapshot,
                Err(e) => return Response::error(request.id, format!("invalid snapshot: {}", e)),
            };
            match state.replace(snapshot).await {
                Ok(changed) => {
                    debug!(changed, "setData applied");
                    Response::ok(request.id, Value::Null)
                }
                Err(e) => Response::error(request.id, e.to_string()),
            }
        }

        Method::Ping => Response::ok(request.id, json!("pong")),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
