//! Bridges the core's polled [`Link`]/[`Session`] traits to async network
//! workers.
//!
//! The supervisor runs in the UI tick and never awaits; it raises requests
//! through the lock-free handles below and reads back status the workers
//! publish. Inbound payloads travel through a small bounded channel.

pub mod http;
pub mod mqtt;
pub mod wifi;

use core::{
    fmt,
    net::Ipv4Addr,
    sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering},
};

use embassy_net::{IpAddress, Stack, dns::DnsQueryType, tcp};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel, signal::Signal};
use homedash_core::{
    connectivity::{ClientId, Inbound, Link, Session, SessionStatus},
    protocol::{http::HttpError, mqtt::MqttError},
};
use log::warn;

pub const INBOX_DEPTH: usize = 2;

/// WiFi join requests and link status.
pub struct LinkHandle {
    begin: Signal<CriticalSectionRawMutex, ()>,
    up: AtomicBool,
    revision: AtomicU32,
}

impl LinkHandle {
    pub const fn new() -> Self {
        Self {
            begin: Signal::new(),
            up: AtomicBool::new(false),
            revision: AtomicU32::new(0),
        }
    }

    pub fn is_up(&self) -> bool {
        self.up.load(Ordering::Acquire)
    }

    /// Bumped every time the published link status flips.
    pub fn revision(&self) -> u32 {
        self.revision.load(Ordering::Acquire)
    }

    pub(crate) fn set_up(&self, up: bool) {
        if self.up.swap(up, Ordering::AcqRel) != up {
            self.revision.fetch_add(1, Ordering::AcqRel);
        }
    }
}

impl Default for LinkHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Session requests, status and inbound payloads.
pub struct SessionHandle {
    begin: Signal<CriticalSectionRawMutex, ClientId>,
    refresh: Signal<CriticalSectionRawMutex, ()>,
    status: AtomicU8,
    inbox: Channel<CriticalSectionRawMutex, Inbound, INBOX_DEPTH>,
}

impl SessionHandle {
    pub const fn new() -> Self {
        Self {
            begin: Signal::new(),
            refresh: Signal::new(),
            status: AtomicU8::new(0),
            inbox: Channel::new(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        match self.status.load(Ordering::Acquire) {
            1 => SessionStatus::Connecting,
            2 => SessionStatus::Up,
            3 => SessionStatus::Failed,
            _ => SessionStatus::Idle,
        }
    }

    pub(crate) fn set_status(&self, status: SessionStatus) {
        let raw = match status {
            SessionStatus::Idle => 0,
            SessionStatus::Connecting => 1,
            SessionStatus::Up => 2,
            SessionStatus::Failed => 3,
        };
        self.status.store(raw, Ordering::Release);
    }

    pub(crate) fn deliver(&self, inbound: Inbound) {
        if self.inbox.try_send(inbound).is_err() {
            warn!("session: inbox full, dropping payload");
        }
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Link`] backed by the WiFi worker.
pub struct WifiLink {
    handle: &'static LinkHandle,
    ssid: &'static str,
}

impl WifiLink {
    pub const fn new(handle: &'static LinkHandle, ssid: &'static str) -> Self {
        Self { handle, ssid }
    }
}

impl Link for WifiLink {
    fn begin(&mut self) {
        self.handle.begin.signal(());
    }

    fn is_up(&mut self) -> bool {
        self.handle.is_up()
    }

    fn network_name(&self) -> &str {
        self.ssid
    }
}

/// [`Session`] backed by either the MQTT or the HTTP worker.
pub struct RemoteSession {
    handle: &'static SessionHandle,
    endpoint: &'static str,
}

impl RemoteSession {
    pub const fn new(handle: &'static SessionHandle, endpoint: &'static str) -> Self {
        Self { handle, endpoint }
    }
}

impl Session for RemoteSession {
    fn begin(&mut self, client_id: &str) {
        let mut id = ClientId::new();
        let _ = id.push_str(client_id);
        if self.handle.status() != SessionStatus::Up {
            self.handle.set_status(SessionStatus::Connecting);
        }
        self.handle.begin.signal(id);
    }

    fn status(&mut self) -> SessionStatus {
        self.handle.status()
    }

    fn refresh(&mut self) {
        self.handle.refresh.signal(());
    }

    fn endpoint(&self) -> &str {
        self.endpoint
    }

    fn next_payload(&mut self) -> Option<Inbound> {
        self.handle.inbox.try_receive().ok()
    }
}

/// Failure of one session attempt or one transfer.
#[derive(Debug)]
pub enum SessionError {
    Dns,
    Connect(tcp::ConnectError),
    Tcp(tcp::Error),
    Mqtt(MqttError),
    Http(HttpError),
    Closed,
    Timeout,
}

impl From<tcp::Error> for SessionError {
    fn from(err: tcp::Error) -> Self {
        Self::Tcp(err)
    }
}

impl From<MqttError> for SessionError {
    fn from(err: MqttError) -> Self {
        Self::Mqtt(err)
    }
}

impl From<HttpError> for SessionError {
    fn from(err: HttpError) -> Self {
        Self::Http(err)
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns => f.write_str("dns lookup failed"),
            Self::Connect(err) => write!(f, "tcp connect failed: {:?}", err),
            Self::Tcp(err) => write!(f, "tcp error: {:?}", err),
            Self::Mqtt(err) => write!(f, "mqtt: {}", err),
            Self::Http(err) => write!(f, "http: {}", err),
            Self::Closed => f.write_str("connection closed by peer"),
            Self::Timeout => f.write_str("timed out"),
        }
    }
}

/// Resolves a literal IPv4 address or a DNS name.
pub(crate) async fn resolve(stack: Stack<'_>, host: &str) -> Result<IpAddress, SessionError> {
    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        return Ok(IpAddress::Ipv4(addr));
    }

    let addrs = stack
        .dns_query(host, DnsQueryType::A)
        .await
        .map_err(|_| SessionError::Dns)?;
    addrs.first().copied().ok_or(SessionError::Dns)
}

pub(crate) async fn write_all(
    socket: &mut tcp::TcpSocket<'_>,
    mut bytes: &[u8],
) -> Result<(), SessionError> {
    while !bytes.is_empty() {
        let written = socket.write(bytes).await?;
        if written == 0 {
            return Err(SessionError::Closed);
        }
        bytes = &bytes[written..];
    }
    socket.flush().await?;
    Ok(())
}
