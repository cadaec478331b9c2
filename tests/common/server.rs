//! Fake IRC server.
//!
//! Listens on an ephemeral loopback port. Tests drive each accepted
//! connection by hand through a [`TestPeer`].

use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;

use super::client::TestPeer;

/// A listening fake server.
pub struct FakeServer {
    listener: TcpListener,
    port: u16,
}

impl FakeServer {
    /// Bind to `127.0.0.1` on a free port.
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    #[allow(dead_code)]
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Wait for the bridge to connect.
    pub async fn accept(&self) -> anyhow::Result<TestPeer> {
        let (stream, _) = timeout(Duration::from_secs(5), self.listener.accept()).await??;
        Ok(TestPeer::new(stream))
    }
}
