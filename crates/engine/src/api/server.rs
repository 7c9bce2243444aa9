//! Remote command protocol server.
//!
//! Newline-delimited JSON over TCP. Every request line gets exactly one reply
//! line carrying the request's `id`. Lines on one connection are handled in
//! order, so replies come back in request order. Command failures become
//! `error` replies; only transport failures close the connection.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use widgetry_domain::ConnectionId;
use widgetry_protocol::{ClientCommand, ErrorCode, ServerReply};

use crate::app::App;

/// Accept connections until `cancel` fires.
pub async fn serve(listener: TcpListener, app: Arc<App>, cancel: CancellationToken) {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(addr = %addr, "Protocol server listening");
    }

    loop {
        let accepted = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer)) => {
                let app = Arc::clone(&app);
                let cancel = cancel.child_token();
                tokio::spawn(handle_connection(stream, peer, app, cancel));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to accept connection");
            }
        }
    }

    tracing::info!("Protocol server stopped accepting connections");
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    app: Arc<App>,
    cancel: CancellationToken,
) {
    let connection_id = ConnectionId::new();
    let max_line_bytes = app.config.max_line_bytes;
    let (reader, writer) = stream.into_split();
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(max_line_bytes));
    let mut sink = FramedWrite::new(writer, LinesCodec::new());

    // Bounded channel for replies to this client
    let (tx, mut rx) = mpsc::channel::<ServerReply>(app.config.connection_buffer.max(1));

    app.connections.register(connection_id, peer).await;

    let send_task = tokio::spawn(async move {
        while let Some(reply) = rx.recv().await {
            match serde_json::to_string(&reply) {
                Ok(json) => {
                    if sink.send(json).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(connection_id = %connection_id, error = %e, "Failed to encode reply");
                }
            }
        }
    });

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = lines.next() => next,
        };

        match next {
            Some(Ok(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                let reply = handle_line(&line, &app, connection_id).await;
                if tx.send(reply).await.is_err() {
                    tracing::warn!(connection_id = %connection_id, "Reply channel closed");
                    break;
                }
            }
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    max_line_bytes,
                    "Request line too long, closing connection"
                );
                let _ = tx
                    .send(ServerReply::error(
                        None,
                        ErrorCode::InvalidRequest,
                        format!("Request line exceeds {max_line_bytes} bytes"),
                    ))
                    .await;
                break;
            }
            Some(Err(e)) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "Connection read failed");
                break;
            }
            None => break,
        }
    }

    app.connections.unregister(connection_id).await;

    // Let queued replies flush before the socket closes
    drop(tx);
    let _ = send_task.await;

    tracing::debug!(connection_id = %connection_id, "Connection closed");
}

/// Parse one request line and produce its reply.
pub(crate) async fn handle_line(line: &str, app: &App, connection_id: ConnectionId) -> ServerReply {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(connection_id = %connection_id, error = %e, "Unparseable request line");
            return ServerReply::error(None, ErrorCode::InvalidRequest, format!("Invalid JSON: {e}"));
        }
    };

    let Value::Object(fields) = &value else {
        return ServerReply::error(
            None,
            ErrorCode::InvalidRequest,
            "Request must be a JSON object",
        );
    };

    let request_id = match fields.get("id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(other) => {
            return ServerReply::error(
                Some(other.to_string()),
                ErrorCode::InvalidRequest,
                "Request id must be a string",
            );
        }
        None => None,
    };

    let Some(kind) = fields.get("type").and_then(Value::as_str).map(str::to_string) else {
        return ServerReply::error(request_id, ErrorCode::InvalidRequest, "Missing command type");
    };

    if !ClientCommand::NAMES.contains(&kind.as_str()) {
        return ServerReply::error(
            request_id,
            ErrorCode::UnknownCommand,
            format!("Unknown command type: {kind}"),
        );
    }

    let command = match serde_json::from_value::<ClientCommand>(value) {
        Ok(command) => command,
        Err(e) => {
            return ServerReply::error(
                request_id,
                ErrorCode::InvalidRequest,
                format!("Invalid {kind} request: {e}"),
            );
        }
    };

    tracing::debug!(
        connection_id = %connection_id,
        command = command.name(),
        request_id = %command.request_id(),
        "Handling command"
    );

    let reply = handle_command(command, app).await;
    if let ServerReply::Error { id, error, code } = &reply {
        tracing::debug!(
            connection_id = %connection_id,
            request_id = ?id,
            code = %code,
            error = %error,
            "Command failed"
        );
    }
    reply
}

/// Dispatch a parsed command to the component registry.
async fn handle_command(command: ClientCommand, app: &App) -> ServerReply {
    let components = &app.components;

    match command {
        ClientCommand::LoadComponent {
            id,
            name,
            component_id,
            force,
            props,
        } => match components.load(&name, component_id, force, &props).await {
            Ok(loaded) => ServerReply::ComponentLoaded {
                id,
                success: true,
                name: loaded.name,
                component_id: loaded.component_id,
                methods: loaded.methods,
            },
            Err(e) => ServerReply::error(Some(id), e.code(), e.to_string()),
        },

        ClientCommand::CallMethod {
            id,
            component_id,
            method,
            args,
        } => match components.call_method(&component_id, &method, &args).await {
            Ok(result) => ServerReply::MethodResult {
                id,
                component_id,
                method,
                result,
            },
            Err(e) => ServerReply::error(Some(id), e.code(), e.to_string()),
        },

        ClientCommand::GetState { id, component_id } => {
            match components.get_state(&component_id).await {
                Ok(state) => ServerReply::ComponentState {
                    id,
                    component_id,
                    state,
                },
                Err(e) => ServerReply::error(Some(id), e.code(), e.to_string()),
            }
        }

        ClientCommand::SetProps {
            id,
            component_id,
            props,
        } => match components.set_props(&component_id, &props).await {
            Ok(()) => ServerReply::PropsSet {
                id,
                component_id,
                success: true,
            },
            Err(e) => ServerReply::error(Some(id), e.code(), e.to_string()),
        },

        ClientCommand::UnloadComponent { id, component_id } => {
            match components.unload(&component_id).await {
                Ok(()) => ServerReply::ComponentUnloaded {
                    id,
                    component_id,
                    success: true,
                },
                Err(e) => ServerReply::error(Some(id), e.code(), e.to_string()),
            }
        }

        ClientCommand::Ping { id } => ServerReply::Pong { id },

        ClientCommand::CleanAll { id } => {
            let count = components.clean_all().await;
            ServerReply::AllCleaned { id, count }
        }
    }
}
