//! Session controller.
//!
//! A [`Client`] owns the transport, performs the `USER`/`NICK` handshake,
//! runs the read loop (read, parse, publish) and reconnects with exponential
//! backoff when the server closes the stream. Cloning a client is cheap and
//! every clone drives the same session, which is how event handlers reply.
//!
//! Cancellation is cooperative: [`Client::quit`] raises a flag that the read
//! loop checks between reads. A read already in progress is only interrupted
//! when the server closes the connection in response to `QUIT`.

use crate::irc::connection::{frame_line, BoxWriter, LineReader, Transport};
use crate::irc::error::{Error, Result};
use crate::irc::handlers;
use crate::irc::hub::{Hub, WILDCARD};
use crate::irc::message::{parse, Message};
use crate::logging::{Direction, TrafficLog};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Default CTCP VERSION reply.
pub const DEFAULT_VERSION: &str = concat!("ferric-irc ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Registering,
    Active,
    Reconnecting,
    Quitting,
}

/// How hard to try after the server closes the connection.
///
/// Attempt `k` (1-based) waits `initial_delay * 2^(k-1)` before dialling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub attempts: u32,
    pub initial_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            initial_delay: Duration::from_secs(5),
        }
    }
}

/// Nick state. `desired` is the configured nick we try to get back,
/// `current` the nick registration and recovery believe we hold, and
/// `attempted` the last nick sent with `NICK` by anyone.
#[derive(Debug, Default)]
struct Identity {
    desired: String,
    current: String,
    attempted: String,
    user: String,
    real_name: String,
}

/// Configuration surface for a [`Client`].
pub struct ClientBuilder {
    nick: String,
    user: Option<String>,
    real_name: Option<String>,
    version: String,
    addr: Option<String>,
    conn: Option<Transport>,
    debug: bool,
    reconnect: ReconnectPolicy,
    traffic_log: Option<TrafficLog>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            nick: String::new(),
            user: None,
            real_name: None,
            version: DEFAULT_VERSION.to_string(),
            addr: None,
            conn: None,
            debug: false,
            reconnect: ReconnectPolicy::default(),
            traffic_log: None,
        }
    }
}

impl ClientBuilder {
    pub fn nick(mut self, nick: impl Into<String>) -> Self {
        self.nick = nick.into();
        self
    }

    /// Username sent with `USER`. Defaults to the nick.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Real name sent with `USER`. Defaults to the nick.
    pub fn real_name(mut self, real_name: impl Into<String>) -> Self {
        self.real_name = Some(real_name.into());
        self
    }

    /// Text returned for CTCP VERSION queries.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Server address (`host:port`) to dial on connect and on reconnect.
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = Some(addr.into());
        self
    }

    /// Use an already open stream instead of dialling. It is consumed by the
    /// first connect; reconnecting afterwards needs [`addr`](Self::addr).
    pub fn conn<S>(mut self, stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        self.conn = Some(Transport::new(stream));
        self
    }

    /// Emit every raw inbound and outbound line at debug level under the
    /// `irc::traffic` target.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Also append raw lines to a daily log file.
    pub fn traffic_log(mut self, log: TrafficLog) -> Self {
        self.traffic_log = Some(log);
        self
    }

    /// Build the client and register the built-in protocol handlers.
    pub fn build(self) -> Client {
        let client = Client {
            inner: Arc::new(Inner {
                identity: Mutex::new(Identity {
                    desired: self.nick,
                    user: self.user.unwrap_or_default(),
                    real_name: self.real_name.unwrap_or_default(),
                    ..Identity::default()
                }),
                version: self.version,
                addr: self.addr,
                pending: StdMutex::new(self.conn),
                writer: Mutex::new(None),
                hub: Hub::new(),
                quit: AtomicBool::new(false),
                state: StdMutex::new(SessionState::Disconnected),
                debug: self.debug,
                reconnect: self.reconnect,
                traffic_log: self.traffic_log.map(StdMutex::new),
            }),
        };
        handlers::register(&client.inner.hub);
        client
    }
}

struct Inner {
    identity: Mutex<Identity>,
    version: String,
    addr: Option<String>,
    pending: StdMutex<Option<Transport>>,
    writer: Mutex<Option<BoxWriter>>,
    hub: Hub<Client>,
    quit: AtomicBool,
    state: StdMutex<SessionState>,
    debug: bool,
    reconnect: ReconnectPolicy,
    traffic_log: Option<StdMutex<TrafficLog>>,
}

/// Why a read loop ended without an error.
enum LoopExit {
    Quit,
    Closed,
}

/// Handle to an IRC session.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Register `handler` for `event`: a command (`PRIVMSG`), a numeric
    /// (`433`) or [`WILDCARD`]. Each call runs in its own task and gets a
    /// clone of this client to reply with.
    pub fn handle<F, Fut>(&self, event: &str, handler: F)
    where
        F: Fn(Client, Arc<Message>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner.hub.subscribe(event, handler);
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_state(&self, state: SessionState) {
        let mut current = self.inner.state.lock().unwrap_or_else(|p| p.into_inner());
        let previous = *current;
        if previous != state {
            tracing::debug!(from = ?previous, to = ?state, "session state");
            *current = state;
        }
    }

    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// The nick last sent to the server during registration or recovery.
    pub async fn current_nick(&self) -> String {
        self.inner.identity.lock().await.current.clone()
    }

    /// Connect, register and run the session until it ends.
    ///
    /// Returns `Ok` after [`quit`](Self::quit). Returns an error for missing
    /// configuration, fatal I/O, or when every reconnect attempt failed.
    pub async fn connect(&self) -> Result<()> {
        self.inner.quit.store(false, Ordering::SeqCst);
        let result = self.session().await;
        self.close().await;
        self.set_state(SessionState::Disconnected);
        if let Err(err) = &result {
            tracing::warn!(error = %err, "session ended");
        }
        result
    }

    async fn session(&self) -> Result<()> {
        let mut reader = self.open().await?;
        loop {
            match self.run(reader).await? {
                LoopExit::Quit => return Ok(()),
                LoopExit::Closed => match self.reconnect().await? {
                    Some(next) => reader = next,
                    None => return Ok(()),
                },
            }
        }
    }

    /// Validate configuration, open the transport and send the handshake.
    async fn open(&self) -> Result<LineReader> {
        self.set_state(SessionState::Connecting);

        let has_conn = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .is_some();
        if !has_conn && self.inner.addr.is_none() {
            return Err(Error::MissingTransport);
        }

        let (nick, user, real_name) = {
            let mut identity = self.inner.identity.lock().await;
            if identity.desired.is_empty() {
                return Err(Error::MissingNick);
            }
            identity.current = identity.desired.clone();
            identity.attempted = identity.desired.clone();
            if identity.user.is_empty() {
                identity.user = identity.desired.clone();
            }
            if identity.real_name.is_empty() {
                identity.real_name = identity.desired.clone();
            }
            (
                identity.current.clone(),
                identity.user.clone(),
                identity.real_name.clone(),
            )
        };

        let pending = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        let transport = match (pending, self.inner.addr.as_deref()) {
            (Some(transport), _) => transport,
            (None, Some(addr)) => Transport::dial(addr).await?,
            (None, None) => return Err(Error::MissingTransport),
        };
        let (reader, writer) = transport.into_parts();
        *self.inner.writer.lock().await = Some(writer);

        self.set_state(SessionState::Registering);
        self.send(&format!("USER {} * * :{}", user, real_name)).await?;
        self.send(&format!("NICK {}", nick)).await?;
        Ok(reader)
    }

    async fn run(&self, mut reader: LineReader) -> Result<LoopExit> {
        if !self.quit_requested() {
            self.set_state(SessionState::Active);
        }
        loop {
            if self.quit_requested() {
                return Ok(LoopExit::Quit);
            }

            let line = match reader.read_line().await {
                Ok(Some(line)) => line,
                Ok(None) if self.quit_requested() => return Ok(LoopExit::Quit),
                Ok(None) => return Ok(LoopExit::Closed),
                Err(_) if self.quit_requested() => return Ok(LoopExit::Quit),
                Err(err) => return Err(err.into()),
            };
            self.trace(Direction::Inbound, &line);

            let msg = match parse(&line) {
                Ok(msg) if msg.is_empty() => continue,
                Ok(msg) => Arc::new(msg),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unparseable line");
                    continue;
                }
            };

            self.inner.hub.publish(&msg.command, self, &msg);
            self.inner.hub.publish(WILDCARD, self, &msg);
        }
    }

    /// Retry the handshake with exponential backoff. `None` means a quit was
    /// requested while waiting.
    async fn reconnect(&self) -> Result<Option<LineReader>> {
        self.close().await;

        let policy = self.inner.reconnect;
        let mut delay = policy.initial_delay;
        for attempt in 1..=policy.attempts {
            self.set_state(SessionState::Reconnecting);
            tracing::info!(
                attempt,
                delay_secs = delay.as_secs_f64(),
                "connection closed, trying to reconnect"
            );
            tokio::time::sleep(delay).await;
            if self.quit_requested() {
                return Ok(None);
            }

            match self.open().await {
                Ok(reader) => return Ok(Some(reader)),
                Err(err) if err.is_config() => return Err(err),
                Err(err) => tracing::warn!(attempt, error = %err, "reconnect failed"),
            }
            self.close().await;
            delay *= 2;
        }

        Err(Error::ReconnectExhausted {
            attempts: policy.attempts,
        })
    }

    fn quit_requested(&self) -> bool {
        self.inner.quit.load(Ordering::SeqCst)
    }

    /// Ask the read loop to stop. Used by [`quit`](Self::quit) after `QUIT`
    /// has been sent.
    pub(crate) fn request_quit(&self) {
        self.set_state(SessionState::Quitting);
        self.inner.quit.store(true, Ordering::SeqCst);
    }

    /// Shut down and drop the writer half, if any.
    async fn close(&self) {
        let writer = self.inner.writer.lock().await.take();
        if let Some(mut writer) = writer {
            let _ = writer.shutdown().await;
        }
    }

    /// Frame `line` and write it in one call. A no-op when no transport is
    /// open; callers that care should check [`state`](Self::state).
    pub async fn send(&self, line: &str) -> Result<()> {
        let framed = frame_line(line);
        let mut writer = self.inner.writer.lock().await;
        let Some(writer) = writer.as_mut() else {
            return Ok(());
        };
        self.trace(Direction::Outbound, framed.trim_end_matches(['\r', '\n']));
        writer.write_all(framed.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    fn trace(&self, direction: Direction, line: &str) {
        if self.inner.debug {
            tracing::debug!(target: "irc::traffic", "{} {}", direction.arrow(), line);
        }
        if let Some(log) = &self.inner.traffic_log {
            log.lock()
                .unwrap_or_else(|p| p.into_inner())
                .record(direction, line);
        }
    }

    /// Ask the server whether the configured nick is free again. Does
    /// nothing while we hold it. The answer is handled by the `401` handler.
    pub async fn reclaim_nick(&self) -> Result<()> {
        let identity = self.inner.identity.lock().await;
        if identity.current != identity.desired {
            self.whois(&identity.desired).await?;
        }
        Ok(())
    }

    /// Request a nick change. A `433` for it is retried with an underscore;
    /// the nick the client tracks and reclaims is left alone.
    pub async fn nick(&self, nick: &str) -> Result<()> {
        let mut identity = self.inner.identity.lock().await;
        identity.attempted = nick.to_string();
        self.send(&format!("NICK {}", nick)).await
    }

    /// Nick in use: retry `rejected` (the nick named by the server, or the
    /// last attempt) with one more underscore. `current` follows only when
    /// the rejected nick was the registration or recovery candidate.
    pub(crate) async fn retry_nick(&self, rejected: Option<&str>) -> Result<()> {
        let mut identity = self.inner.identity.lock().await;
        let rejected = match rejected {
            Some(nick) if !nick.is_empty() && nick != "*" && !nick.starts_with(':') => {
                nick.to_string()
            }
            _ => identity.attempted.clone(),
        };
        let next = format!("{}_", rejected);
        if rejected == identity.current {
            identity.current = next.clone();
        }
        identity.attempted = next.clone();
        tracing::info!(nick = %next, "nick in use, retrying");
        self.send(&format!("NICK {}", next)).await
    }

    /// `nick` was reported as not in use. If it is the configured nick and
    /// we do not hold it, request it.
    pub(crate) async fn claim_if_desired(&self, nick: &str) -> Result<()> {
        let mut identity = self.inner.identity.lock().await;
        if identity.current == identity.desired || !nick.eq_ignore_ascii_case(&identity.desired) {
            return Ok(());
        }
        identity.current = identity.desired.clone();
        identity.attempted = identity.desired.clone();
        tracing::info!(nick = %identity.desired, "reclaiming nick");
        self.send(&format!("NICK {}", identity.desired)).await
    }
}
