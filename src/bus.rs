//! Host message bus.
//!
//! The bridge only produces messages. Where they go is the host's business.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::{Mutex, mpsc};

use crate::error::BusError;

/// Topic commands are published under.
pub const COMMAND_TOPIC: &str = "command";

/// Payload published under [`COMMAND_TOPIC`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandPayload<'a> {
    pub raw: &'a str,
}

/// A message as delivered to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Value,
}

/// Sink for messages addressed to the host application.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn send_message(&self, topic: &str, payload: Value) -> Result<(), BusError>;
}

/// Bus backed by an mpsc channel, for hosts embedding the bridge in-process.
#[derive(Debug, Clone)]
pub struct ChannelBus {
    tx: mpsc::Sender<BusMessage>,
}

impl ChannelBus {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<BusMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MessageBus for ChannelBus {
    async fn send_message(&self, topic: &str, payload: Value) -> Result<(), BusError> {
        self.tx
            .send(BusMessage {
                topic: topic.to_owned(),
                payload,
            })
            .await
            .map_err(|_| BusError::Closed)
    }
}

/// Bus that writes one JSON object per line to an async writer.
#[derive(Debug)]
pub struct JsonLinesBus<W> {
    out: Mutex<W>,
}

/// [`JsonLinesBus`] on the process's stdout.
pub type StdoutBus = JsonLinesBus<Stdout>;

impl<W> JsonLinesBus<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl JsonLinesBus<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W> MessageBus for JsonLinesBus<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_message(&self, topic: &str, payload: Value) -> Result<(), BusError> {
        let mut line = serde_json::to_vec(&BusMessage {
            topic: topic.to_owned(),
            payload,
        })?;
        line.push(b'\n');

        // One write per line keeps concurrent senders from interleaving.
        let mut out = self.out.lock().await;
        out.write_all(&line).await?;
        out.flush().await?;
        Ok(())
    }
}
