//! Link and application-session supervision.
//!
//! The [`Supervisor`] owns the retry policy; the board crate supplies the
//! [`Link`] and [`Session`] drivers that actually talk to the radio and the
//! server, and a [`ConnectionListener`] that shows failures.

mod supervisor;


use core::fmt::Write;

use heapless::{String, Vec};

pub use supervisor::Supervisor;

pub const CLIENT_ID_BYTES: usize = 32;
pub const MAX_PAYLOAD_BYTES: usize = 4096;

pub type ClientId = String<CLIENT_ID_BYTES>;

/// Connection state shown to the user.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    LinkUp,
    ApplicationUp,
    LinkError,
    ApplicationError,
}

impl ConnectionState {
    pub const fn is_error(self) -> bool {
        matches!(self, Self::LinkError | Self::ApplicationError)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::LinkUp => "link_up",
            Self::ApplicationUp => "application_up",
            Self::LinkError => "link_error",
            Self::ApplicationError => "application_error",
        }
    }
}

/// Bound on a single bring-up attempt before an error state is shown.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BringUpBudget {
    /// Give up after this many status polls.
    Polls(u16),
    /// Give up once this much time has passed since the attempt began.
    Deadline { ms: u64 },
}

impl BringUpBudget {
    fn exhausted(self, polls: u16, elapsed_ms: u64) -> bool {
        match self {
            Self::Polls(limit) => polls >= limit.max(1),
            Self::Deadline { ms } => elapsed_ms >= ms,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SupervisorConfig {
    pub poll_interval_ms: u64,
    pub link_budget: BringUpBudget,
    pub session_budget: BringUpBudget,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            link_budget: BringUpBudget::Polls(10),
            session_budget: BringUpBudget::Polls(10),
        }
    }
}

impl SupervisorConfig {
    pub const fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    pub const fn with_link_budget(mut self, budget: BringUpBudget) -> Self {
        self.link_budget = budget;
        self
    }

    pub const fn with_session_budget(mut self, budget: BringUpBudget) -> Self {
        self.session_budget = budget;
        self
    }
}

/// Link-layer driver (WiFi association + address).
pub trait Link {
    /// Starts (or restarts) joining the network. Must not block.
    fn begin(&mut self);

    fn is_up(&mut self) -> bool;

    /// Network identifier shown on the link error screen.
    fn network_name(&self) -> &str;
}

/// Progress of the application session as seen by its driver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionStatus {
    Idle,
    Connecting,
    Up,
    /// The last attempt failed; the driver waits for another `begin`.
    Failed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PayloadKind {
    /// Delimited message from the broker.
    Frame,
    /// HTML document from the status page.
    Document,
}

/// One message dequeued from the session.
#[derive(Clone, Debug)]
pub struct Inbound {
    pub kind: PayloadKind,
    pub bytes: Vec<u8, MAX_PAYLOAD_BYTES>,
}

impl Inbound {
    /// Payload as text; invalid UTF-8 is cut at the first bad byte.
    pub fn text(&self) -> &str {
        match core::str::from_utf8(&self.bytes) {
            Ok(text) => text,
            Err(err) => core::str::from_utf8(&self.bytes[..err.valid_up_to()]).unwrap_or_default(),
        }
    }
}

/// Application-session driver (broker subscription or HTTP fetch).
pub trait Session {
    /// Starts (or restarts) the session. Must not block.
    fn begin(&mut self, client_id: &str);

    fn status(&mut self) -> SessionStatus;

    /// Asks an established session for fresh data. Subscriptions ignore it.
    fn refresh(&mut self) {}

    /// Endpoint shown on the session error screen.
    fn endpoint(&self) -> &str;

    fn next_payload(&mut self) -> Option<Inbound>;
}

/// Receives every state transition together with the failing target
/// (network name or endpoint) when the new state is an error.
pub trait ConnectionListener {
    fn on_connection_state(&mut self, state: ConnectionState, target: &str);
}

impl ConnectionListener for () {
    fn on_connection_state(&mut self, _state: ConnectionState, _target: &str) {}
}

/// Builds a per-device broker client id: `prefix` followed by the MAC in
/// upper-case hex.
pub fn client_id(prefix: &str, mac: [u8; 6]) -> ClientId {
    let mut id = ClientId::new();
    for ch in prefix.chars() {
        if id.len() + ch.len_utf8() > CLIENT_ID_BYTES - 2 * mac.len() {
            break;
        }
        let _ = id.push(ch);
    }
    for byte in mac {
        let _ = write!(id, "{:02X}", byte);
    }
    id
}
