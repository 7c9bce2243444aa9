//! Outbound side of a message bridge.
//!
//! A transport only delivers; the inbound side is a pump that feeds whatever
//! arrives into [`MessageBridge::receive_message`](crate::MessageBridge::receive_message).

mod lines;

pub use lines::{run_line_reader, LineTransport};

use std::sync::Weak;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use widgetry_protocol::Message;

use crate::bridge::MessageBridge;
use crate::error::BridgeError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), BridgeError>;
}

/// In-process transport over an unbounded channel.
#[derive(Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Message>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MessageTransport for ChannelTransport {
    async fn send(&self, message: Message) -> Result<(), BridgeError> {
        self.tx
            .send(message)
            .map_err(|_| BridgeError::transport("channel closed"))
    }
}

/// Feed a channel into a bridge until the channel closes or the bridge is
/// dropped. Holds only a weak reference so two pumped bridges don't keep each
/// other alive.
pub fn spawn_pump(
    bridge: Weak<MessageBridge>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let Some(bridge) = bridge.upgrade() else {
                break;
            };
            bridge.receive_message(message).await;
        }
        tracing::debug!("Bridge pump stopped");
    })
}
