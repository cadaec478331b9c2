//! IRC connection over TCP.
//!
//! Each `connect` spawns a link task that owns the framed socket. Outbound
//! commands reach it through an unbounded queue; inbound traffic is turned
//! into [`ConnectionEvent`]s. Keepalive, registration, nick collisions and
//! the initial channel joins are handled inside the link task.
//!
//! The link task owns the channel list. Joins and parts issued before the
//! server's welcome only edit that list, which is joined once registration
//! completes.

use async_trait::async_trait;
use corsica_irc_proto::{
    Command, ERR_ERRONEUSNICKNAME, ERR_NICKNAMEINUSE, IrcCodec, Message, RPL_WELCOME,
};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{Instrument, debug, info, trace, warn};

use super::{Connection, ConnectionEvent, ConnectionOptions};
use crate::config::ConnectionConfig;
use crate::error::ConnectionError;
use crate::telemetry::spans;

/// Events buffered between the link task and the session loop.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Nick collisions tolerated during registration before giving up.
const MAX_NICK_ATTEMPTS: u32 = 10;

/// Work queued for the link task.
#[derive(Debug)]
enum Outbound {
    Send(Message),
    Join(String),
    Part(String),
    Nick(String),
}

struct Link {
    outbound: mpsc::UnboundedSender<Outbound>,
    task: JoinHandle<()>,
}

/// [`Connection`] implementation speaking IRC over plain TCP.
pub struct IrcConnection {
    options: ConnectionOptions,
    connect_timeout: Duration,
    quit_timeout: Duration,
    quit_message: Option<String>,
    events: mpsc::Sender<ConnectionEvent>,
    link: Option<Link>,
}

impl IrcConnection {
    /// Create an unconnected adapter and the receiver its events arrive on.
    pub fn new(
        options: ConnectionOptions,
        config: &ConnectionConfig,
    ) -> (Self, mpsc::Receiver<ConnectionEvent>) {
        let (events, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let connection = Self {
            options,
            connect_timeout: config.connect_timeout(),
            quit_timeout: config.quit_timeout(),
            quit_message: config.quit_message.clone(),
            events,
            link: None,
        };
        (connection, rx)
    }

    fn send(&self, out: Outbound) -> Result<(), ConnectionError> {
        match &self.link {
            Some(link) if !link.task.is_finished() => link
                .outbound
                .send(out)
                .map_err(|_| ConnectionError::NotConnected),
            _ => Err(ConnectionError::NotConnected),
        }
    }
}

#[async_trait]
impl Connection for IrcConnection {
    fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut ConnectionOptions {
        &mut self.options
    }

    fn is_connected(&self) -> bool {
        self.link
            .as_ref()
            .is_some_and(|link| !link.task.is_finished())
    }

    async fn connect(&mut self) -> Result<(), ConnectionError> {
        if let Some(stale) = self.link.take() {
            stale.task.abort();
        }

        let server = self.options.server.clone();
        let port = self.options.port;

        let stream = timeout(
            self.connect_timeout,
            TcpStream::connect((server.as_str(), port)),
        )
        .await
        .map_err(|_| ConnectionError::ConnectTimeout {
            server: server.clone(),
            port,
        })??;

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        // Registration goes out before anything queued by the caller.
        outbound
            .send(Outbound::Send(Message::nick(self.options.nick.clone())))
            .map_err(|_| ConnectionError::NotConnected)?;
        outbound
            .send(Outbound::Send(Message::user(
                self.options.username.clone(),
                self.options.realname.clone(),
            )))
            .map_err(|_| ConnectionError::NotConnected)?;

        let driver = LinkDriver {
            base_nick: self.options.nick.clone(),
            nick: self.options.nick.clone(),
            channels: self.options.channels.clone(),
            registered: false,
            nick_attempts: 0,
            events: self.events.clone(),
        };
        let framed = Framed::new(stream, IrcCodec::new());
        let task = tokio::spawn(
            driver
                .run(framed, outbound_rx)
                .instrument(spans::link(&server, port)),
        );

        info!(server = %server, port, nick = %self.options.nick, "Connected, registering");
        self.link = Some(Link { outbound, task });
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ConnectionError> {
        let Some(link) = self.link.take() else {
            return Ok(());
        };

        let Link { outbound, mut task } = link;
        let _ = outbound.send(Outbound::Send(Message::quit(self.quit_message.clone())));
        drop(outbound);

        if timeout(self.quit_timeout, &mut task).await.is_err() {
            warn!(
                server = %self.options.server,
                timeout_secs = self.quit_timeout.as_secs(),
                "Link did not close after QUIT, aborting"
            );
            task.abort();
        }

        info!(server = %self.options.server, "Disconnected");
        Ok(())
    }

    async fn join(&mut self, channel: &str) -> Result<(), ConnectionError> {
        self.send(Outbound::Join(channel.to_owned()))
    }

    async fn part(&mut self, channel: &str) -> Result<(), ConnectionError> {
        self.send(Outbound::Part(channel.to_owned()))
    }

    async fn set_nick(&mut self, nick: &str) -> Result<(), ConnectionError> {
        self.send(Outbound::Nick(nick.to_owned()))
    }
}

/// State owned by the link task.
struct LinkDriver {
    /// Nick requested at connect; collision suffixes are appended to it.
    base_nick: String,
    nick: String,
    /// Channels to be in; joined on welcome, edited by later joins and parts.
    channels: Vec<String>,
    registered: bool,
    nick_attempts: u32,
    events: mpsc::Sender<ConnectionEvent>,
}

impl LinkDriver {
    async fn run(
        mut self,
        framed: Framed<TcpStream, IrcCodec>,
        mut outbound: mpsc::UnboundedReceiver<Outbound>,
    ) {
        let (mut sink, mut stream) = framed.split();

        let unexpected = loop {
            tokio::select! {
                out = outbound.recv() => match out {
                    Some(out) => {
                        let Some(msg) = self.outgoing(out) else {
                            continue;
                        };
                        let quitting = matches!(msg.command, Command::QUIT(_));
                        trace!(command = ?msg.command, "->");
                        if let Err(e) = sink.send(msg).await {
                            self.emit(ConnectionEvent::Error { message: e.to_string() }).await;
                            break true;
                        }
                        if quitting {
                            let _ = sink.close().await;
                            break false;
                        }
                    }
                    // Handle dropped without an explicit QUIT.
                    None => {
                        let _ = sink.close().await;
                        break false;
                    }
                },
                incoming = stream.next() => match incoming {
                    Some(Ok(Ok(msg))) => {
                        trace!(command = ?msg.command, "<-");
                        for reply in self.handle(msg).await {
                            if let Err(e) = sink.send(reply).await {
                                self.emit(ConnectionEvent::Error { message: e.to_string() }).await;
                                break;
                            }
                        }
                    }
                    // Only this line is lost.
                    Some(Ok(Err(e))) => {
                        debug!(error = %e, "Skipping unreadable line");
                        self.emit(ConnectionEvent::Error { message: e.to_string() }).await;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Link stream failed");
                        self.emit(ConnectionEvent::Error { message: e.to_string() }).await;
                        break true;
                    }
                    None => break true,
                },
            }
        };

        debug!(unexpected, "Link closed");
        self.emit(ConnectionEvent::Disconnected { unexpected }).await;
    }

    /// Turn queued work into the message to write, if any.
    fn outgoing(&mut self, out: Outbound) -> Option<Message> {
        match out {
            Outbound::Send(msg) => Some(msg),
            Outbound::Join(channel) => {
                if !self.channels.contains(&channel) {
                    self.channels.push(channel.clone());
                }
                self.registered.then(|| Message::join(channel))
            }
            Outbound::Part(channel) => {
                self.channels.retain(|c| *c != channel);
                self.registered.then(|| Message::part(channel))
            }
            Outbound::Nick(nick) => {
                if !self.registered {
                    self.nick = nick.clone();
                    self.nick_attempts = 0;
                }
                self.base_nick = nick.clone();
                Some(Message::nick(nick))
            }
        }
    }

    async fn emit(&self, event: ConnectionEvent) {
        // The session may already be gone during shutdown.
        let _ = self.events.send(event).await;
    }

    /// React to one inbound message, returning the replies to send.
    async fn handle(&mut self, msg: Message) -> Vec<Message> {
        let from = msg.source_nickname().map(str::to_owned);

        match msg.command {
            Command::PING(token, _) => vec![Message::pong(token)],
            Command::Response(RPL_WELCOME, args) => {
                self.registered = true;
                if let Some(assigned) = args.into_iter().next() {
                    self.nick = assigned;
                }
                info!(nick = %self.nick, channels = self.channels.len(), "Registered");
                self.emit(ConnectionEvent::Registered {
                    nick: self.nick.clone(),
                })
                .await;
                self.channels.iter().map(Message::join).collect()
            }
            Command::Response(ERR_NICKNAMEINUSE, _) if !self.registered => {
                self.nick_attempts += 1;
                if self.nick_attempts > MAX_NICK_ATTEMPTS {
                    self.emit(ConnectionEvent::Error {
                        message: format!("no free nick after {MAX_NICK_ATTEMPTS} attempts"),
                    })
                    .await;
                    return Vec::new();
                }
                self.nick = format!("{}{}", self.base_nick, self.nick_attempts);
                debug!(nick = %self.nick, "Nick in use, retrying");
                vec![Message::nick(self.nick.clone())]
            }
            Command::Response(code @ (ERR_NICKNAMEINUSE | ERR_ERRONEUSNICKNAME), args) => {
                self.emit(ConnectionEvent::Error {
                    message: format!("nick rejected ({code:03}): {}", args.join(" ")),
                })
                .await;
                Vec::new()
            }
            Command::NICK(new_nick) if from.as_deref() == Some(self.nick.as_str()) => {
                self.nick = new_nick;
                Vec::new()
            }
            Command::PRIVMSG(to, text) => {
                self.emit(ConnectionEvent::Message {
                    from: from.unwrap_or_default(),
                    to,
                    text,
                })
                .await;
                Vec::new()
            }
            Command::ERROR(message) => {
                self.emit(ConnectionEvent::Error { message }).await;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}
