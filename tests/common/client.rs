//! Server side of one bridge connection.
//!
//! Reads what the bridge sends and writes server replies back to it.

use corsica_irc_proto::{Command, Message};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// Server name used as the prefix of every reply.
pub const SERVER_NAME: &str = "fake.server";

/// A connection accepted by the fake server.
pub struct TestPeer {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

#[allow(dead_code)]
impl TestPeer {
    pub fn new(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        }
    }

    /// Send a raw IRC line.
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with("\r\n") {
            self.writer.write_all(b"\r\n").await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Send raw bytes followed by CRLF, for lines that are not valid UTF-8.
    pub async fn send_bytes(&mut self, line: &[u8]) -> anyhow::Result<()> {
        self.writer.write_all(line).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive the next message from the bridge.
    pub async fn recv(&mut self) -> anyhow::Result<Message> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive a message with a timeout.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Message> {
        let mut line = String::new();
        let read = timeout(dur, self.reader.read_line(&mut line)).await??;
        if read == 0 {
            anyhow::bail!("connection closed by bridge");
        }
        line.trim_end()
            .parse::<Message>()
            .map_err(|e| anyhow::anyhow!("Parse error: {}", e))
    }

    /// Receive messages until the predicate matches, returning all of them.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<Message>>
    where
        F: FnMut(&Message) -> bool,
    {
        let mut messages = Vec::new();
        loop {
            let msg = self.recv().await?;
            let done = predicate(&msg);
            messages.push(msg);
            if done {
                break;
            }
        }
        Ok(messages)
    }

    /// Assert nothing arrives for a short while.
    pub async fn expect_silence(&mut self) -> anyhow::Result<()> {
        match self.recv_timeout(Duration::from_millis(200)).await {
            Ok(msg) => anyhow::bail!("unexpected message: {:?}", msg.command),
            Err(_) => Ok(()),
        }
    }

    /// Read NICK and USER, returning the requested nick.
    pub async fn expect_registration(&mut self) -> anyhow::Result<String> {
        let nick = match self.recv().await?.command {
            Command::NICK(nick) => nick,
            other => anyhow::bail!("expected NICK, got {:?}", other),
        };
        match self.recv().await?.command {
            Command::USER(..) => Ok(nick),
            other => anyhow::bail!("expected USER, got {:?}", other),
        }
    }

    /// Send RPL_WELCOME for `nick`.
    pub async fn welcome(&mut self, nick: &str) -> anyhow::Result<()> {
        self.send_raw(&format!(
            ":{SERVER_NAME} 001 {nick} :Welcome to the test network {nick}"
        ))
        .await
    }

    /// Deliver a PRIVMSG from `from` to `target`.
    pub async fn privmsg(&mut self, from: &str, target: &str, text: &str) -> anyhow::Result<()> {
        self.send_raw(&format!(":{from}!{from}@test.host PRIVMSG {target} :{text}"))
            .await
    }

    /// Read JOINs until `count` channels have been joined.
    pub async fn expect_joins(&mut self, count: usize) -> anyhow::Result<Vec<String>> {
        let mut joined = Vec::with_capacity(count);
        while joined.len() < count {
            match self.recv().await?.command {
                Command::JOIN(channel, _) => joined.push(channel),
                other => anyhow::bail!("expected JOIN, got {:?}", other),
            }
        }
        Ok(joined)
    }
}
