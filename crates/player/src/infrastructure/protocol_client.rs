//! Client for the remote command protocol.
//!
//! A background connection task owns the socket: it writes queued lines and
//! routes each reply to the request waiting on its `id`. Several requests may
//! be in flight on one connection.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Map, Value};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use widgetry_protocol::{ClientCommand, ServerReply};

use super::messaging::{CommandBus, PendingRequests};
use crate::error::RequestError;

/// Default wait for a reply
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const COMMAND_CHANNEL_BUFFER: usize = 32;

/// Result of a successful `load_component`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedComponent {
    pub component_id: String,
    pub name: String,
    pub methods: Vec<String>,
}

pub struct ProtocolClient {
    bus: CommandBus,
    unmatched: Mutex<mpsc::UnboundedReceiver<ServerReply>>,
    task: JoinHandle<()>,
}

impl ProtocolClient {
    pub async fn connect<A>(addr: A) -> anyhow::Result<Self>
    where
        A: ToSocketAddrs + Display,
    {
        Self::connect_with_timeout(addr, DEFAULT_REQUEST_TIMEOUT).await
    }

    pub async fn connect_with_timeout<A>(addr: A, timeout: Duration) -> anyhow::Result<Self>
    where
        A: ToSocketAddrs + Display,
    {
        let label = addr.to_string();
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("failed to connect to engine at {label}"))?;
        tracing::debug!(addr = %label, "Connected to engine");
        Ok(Self::from_stream(stream, timeout))
    }

    /// Wrap an already connected stream. Must be called inside a tokio runtime.
    pub fn from_stream(stream: TcpStream, timeout: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<String>(COMMAND_CHANNEL_BUFFER);
        let (unmatched_tx, unmatched_rx) = mpsc::unbounded_channel();
        let pending = Arc::new(Mutex::new(PendingRequests::default()));
        let bus = CommandBus::new(cmd_tx, Arc::clone(&pending), timeout);

        let task = tokio::spawn(connection_task(stream, cmd_rx, pending, unmatched_tx));

        Self {
            bus,
            unmatched: Mutex::new(unmatched_rx),
            task,
        }
    }

    pub fn bus(&self) -> &CommandBus {
        &self.bus
    }

    /// Write a raw line, valid or not.
    pub fn send_raw(&self, line: impl Into<String>) -> anyhow::Result<()> {
        self.bus.send_raw(line)
    }

    /// Next reply no request was waiting for (no id, unknown id, or late).
    pub async fn next_unmatched(&self, timeout: Duration) -> Option<ServerReply> {
        let mut unmatched = self.unmatched.lock().await;
        tokio::time::timeout(timeout, unmatched.recv())
            .await
            .ok()
            .flatten()
    }

    /// Send any command and return whatever reply comes back, error replies
    /// included.
    pub async fn request(&self, command: ClientCommand) -> Result<ServerReply, RequestError> {
        self.bus.request(command).await
    }

    pub async fn ping(&self) -> Result<(), RequestError> {
        let reply = self.request(ClientCommand::Ping { id: next_request_id() }).await?;
        into_result(reply, |r| match r {
            ServerReply::Pong { .. } => Ok(()),
            other => Err(other),
        })
    }

    /// Load a component under a generated id.
    pub async fn load_component(
        &self,
        name: &str,
        props: Map<String, Value>,
    ) -> Result<LoadedComponent, RequestError> {
        self.load(name, None, false, props).await
    }

    /// Load a component under a fixed id, replacing an existing one if `force`.
    pub async fn load_component_as(
        &self,
        name: &str,
        component_id: &str,
        force: bool,
        props: Map<String, Value>,
    ) -> Result<LoadedComponent, RequestError> {
        self.load(name, Some(component_id.to_string()), force, props)
            .await
    }

    async fn load(
        &self,
        name: &str,
        component_id: Option<String>,
        force: bool,
        props: Map<String, Value>,
    ) -> Result<LoadedComponent, RequestError> {
        let reply = self
            .request(ClientCommand::LoadComponent {
                id: next_request_id(),
                name: name.to_string(),
                component_id,
                force,
                props,
            })
            .await?;
        into_result(reply, |r| match r {
            ServerReply::ComponentLoaded {
                name,
                component_id,
                methods,
                ..
            } => Ok(LoadedComponent {
                component_id,
                name,
                methods,
            }),
            other => Err(other),
        })
    }

    pub async fn call_method(
        &self,
        component_id: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, RequestError> {
        let reply = self
            .request(ClientCommand::CallMethod {
                id: next_request_id(),
                component_id: component_id.to_string(),
                method: method.to_string(),
                args,
            })
            .await?;
        into_result(reply, |r| match r {
            ServerReply::MethodResult { result, .. } => Ok(result),
            other => Err(other),
        })
    }

    pub async fn get_state(&self, component_id: &str) -> Result<Value, RequestError> {
        let reply = self
            .request(ClientCommand::GetState {
                id: next_request_id(),
                component_id: component_id.to_string(),
            })
            .await?;
        into_result(reply, |r| match r {
            ServerReply::ComponentState { state, .. } => Ok(state),
            other => Err(other),
        })
    }

    pub async fn set_props(&self, component_id: &str, props: Value) -> Result<(), RequestError> {
        let reply = self
            .request(ClientCommand::SetProps {
                id: next_request_id(),
                component_id: component_id.to_string(),
                props,
            })
            .await?;
        into_result(reply, |r| match r {
            ServerReply::PropsSet { .. } => Ok(()),
            other => Err(other),
        })
    }

    pub async fn unload_component(&self, component_id: &str) -> Result<(), RequestError> {
        let reply = self
            .request(ClientCommand::UnloadComponent {
                id: next_request_id(),
                component_id: component_id.to_string(),
            })
            .await?;
        into_result(reply, |r| match r {
            ServerReply::ComponentUnloaded { .. } => Ok(()),
            other => Err(other),
        })
    }

    /// Destroy every component on the engine. Returns how many there were.
    pub async fn clean_all(&self) -> Result<usize, RequestError> {
        let reply = self
            .request(ClientCommand::CleanAll {
                id: next_request_id(),
            })
            .await?;
        into_result(reply, |r| match r {
            ServerReply::AllCleaned { count, .. } => Ok(count),
            other => Err(other),
        })
    }
}

impl Drop for ProtocolClient {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn next_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn into_result<T>(
    reply: ServerReply,
    extract: impl FnOnce(ServerReply) -> Result<T, ServerReply>,
) -> Result<T, RequestError> {
    match reply {
        ServerReply::Error { error, code, .. } => Err(RequestError::Server {
            code,
            message: error,
        }),
        other => extract(other).map_err(|r| RequestError::UnexpectedReply(format!("{r:?}"))),
    }
}

async fn connection_task(
    stream: TcpStream,
    mut cmd_rx: mpsc::Receiver<String>,
    pending: Arc<Mutex<PendingRequests>>,
    unmatched: mpsc::UnboundedSender<ServerReply>,
) {
    let (reader, writer) = stream.into_split();
    let mut replies = FramedRead::new(reader, LinesCodec::new());
    let mut sink = FramedWrite::new(writer, LinesCodec::new());

    loop {
        tokio::select! {
            outgoing = cmd_rx.recv() => match outgoing {
                Some(line) => {
                    if let Err(e) = sink.send(line).await {
                        tracing::warn!(error = %e, "Failed to write command");
                        break;
                    }
                }
                None => break,
            },
            incoming = replies.next() => match incoming {
                Some(Ok(line)) => route_reply(&line, &pending, &unmatched).await,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Failed to read reply");
                    break;
                }
                None => {
                    tracing::debug!("Engine closed the connection");
                    break;
                }
            },
        }
    }

    let cancelled = pending.lock().await.clear();
    if cancelled > 0 {
        tracing::debug!(cancelled, "Connection closed with requests in flight");
    }
}

async fn route_reply(
    line: &str,
    pending: &Mutex<PendingRequests>,
    unmatched: &mpsc::UnboundedSender<ServerReply>,
) {
    let reply = match serde_json::from_str::<ServerReply>(line) {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(error = %e, "Dropping unparseable reply line");
            return;
        }
    };

    let id = reply.request_id().map(str::to_string);
    let mut pending = pending.lock().await;
    match id {
        Some(id) if pending.contains(&id) => {
            pending.resolve(&id, reply);
        }
        _ => {
            tracing::debug!(request_id = ?id, "Reply matches no pending request");
            let _ = unmatched.send(reply);
        }
    }
}
