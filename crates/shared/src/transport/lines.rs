//! Newline-delimited JSON over any byte stream (stdio, sockets).

use std::sync::Weak;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tokio_util::sync::CancellationToken;
use widgetry_protocol::Message;

use super::MessageTransport;
use crate::bridge::MessageBridge;
use crate::error::BridgeError;

pub struct LineTransport<W> {
    sink: Mutex<FramedWrite<W, LinesCodec>>,
}

impl<W> LineTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            sink: Mutex::new(FramedWrite::new(writer, LinesCodec::new())),
        }
    }
}

#[async_trait]
impl<W> MessageTransport for LineTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, message: Message) -> Result<(), BridgeError> {
        let line = serde_json::to_string(&message).map_err(BridgeError::transport)?;
        self.sink
            .lock()
            .await
            .send(line)
            .await
            .map_err(BridgeError::transport)
    }
}

/// Read lines from `reader` into `bridge` until EOF, a codec error, the
/// bridge going away, or cancellation.
pub async fn run_line_reader<R>(
    reader: R,
    bridge: Weak<MessageBridge>,
    max_line_bytes: usize,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(max_line_bytes));

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
                let Some(bridge) = bridge.upgrade() else {
                    break;
                };
                bridge.receive_raw(&line).await;
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Bridge line reader failed");
                break;
            }
            None => break,
        }
    }

    tracing::debug!("Bridge line reader stopped");
}
