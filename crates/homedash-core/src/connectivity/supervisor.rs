use log::info;

use super::{
    ClientId, ConnectionListener, ConnectionState, Inbound, Link, Session, SessionStatus,
    SupervisorConfig,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Attempt {
    started_ms: u64,
    polls: u16,
    next_poll_ms: u64,
}

impl Attempt {
    fn start(now_ms: u64, interval_ms: u64) -> Self {
        Self {
            started_ms: now_ms,
            polls: 0,
            next_poll_ms: now_ms.saturating_add(interval_ms),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    Idle,
    Link(Attempt),
    Session(Attempt),
    Established,
}

/// Drives link and session bring-up one tick at a time.
///
/// Never gives up: an exhausted budget only switches to an error state and
/// starts a fresh attempt at the same cadence.
pub struct Supervisor<L, S>
where
    L: Link,
    S: Session,
{
    link: L,
    session: S,
    config: SupervisorConfig,
    client_id: ClientId,
    state: ConnectionState,
    phase: Phase,
}

impl<L, S> Supervisor<L, S>
where
    L: Link,
    S: Session,
{
    pub fn new(link: L, session: S, client_id: ClientId, config: SupervisorConfig) -> Self {
        Self {
            link,
            session,
            config,
            client_id,
            state: ConnectionState::Disconnected,
            phase: Phase::Idle,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Advances bring-up or health checks. Returns `true` when the
    /// connection state changed during this tick.
    pub fn tick<CL>(&mut self, now_ms: u64, listener: &mut CL) -> bool
    where
        CL: ConnectionListener,
    {
        let before = self.state;

        match self.phase {
            Phase::Idle => self.start_link(now_ms),
            Phase::Link(attempt) => self.poll_link(attempt, now_ms, listener),
            Phase::Session(attempt) => self.poll_session(attempt, now_ms, listener),
            Phase::Established => self.check_health(now_ms, listener),
        }

        self.state != before
    }

    /// Requests fresh data from an established session.
    pub fn refresh(&mut self) {
        if self.state == ConnectionState::ApplicationUp {
            self.session.refresh();
        }
    }

    /// Dequeues one inbound payload while the session is up.
    pub fn next_payload(&mut self) -> Option<Inbound> {
        if self.state == ConnectionState::ApplicationUp {
            self.session.next_payload()
        } else {
            None
        }
    }

    fn start_link(&mut self, now_ms: u64) {
        self.link.begin();
        self.phase = Phase::Link(Attempt::start(now_ms, self.config.poll_interval_ms));
    }

    fn start_session(&mut self, now_ms: u64) {
        self.session.begin(&self.client_id);
        self.phase = Phase::Session(Attempt::start(now_ms, self.config.poll_interval_ms));
    }

    fn poll_link<CL>(&mut self, mut attempt: Attempt, now_ms: u64, listener: &mut CL)
    where
        CL: ConnectionListener,
    {
        if now_ms < attempt.next_poll_ms {
            return;
        }

        if self.link.is_up() {
            self.transition(ConnectionState::LinkUp, listener);
            self.start_session(now_ms);
            return;
        }

        attempt.polls = attempt.polls.saturating_add(1);
        attempt.next_poll_ms = now_ms.saturating_add(self.config.poll_interval_ms);

        let elapsed = now_ms.saturating_sub(attempt.started_ms);
        if self.config.link_budget.exhausted(attempt.polls, elapsed) {
            info!(
                "supervisor: link not up after {} polls / {}ms; retrying",
                attempt.polls, elapsed
            );
            self.transition(ConnectionState::LinkError, listener);
            self.start_link(now_ms);
        } else {
            self.phase = Phase::Link(attempt);
        }
    }

    fn poll_session<CL>(&mut self, mut attempt: Attempt, now_ms: u64, listener: &mut CL)
    where
        CL: ConnectionListener,
    {
        if !self.link.is_up() {
            self.on_link_lost(now_ms, listener);
            return;
        }

        if now_ms < attempt.next_poll_ms {
            return;
        }

        let status = self.session.status();
        if status == SessionStatus::Up {
            self.transition(ConnectionState::ApplicationUp, listener);
            self.phase = Phase::Established;
            return;
        }

        attempt.polls = attempt.polls.saturating_add(1);
        attempt.next_poll_ms = now_ms.saturating_add(self.config.poll_interval_ms);

        let elapsed = now_ms.saturating_sub(attempt.started_ms);
        if self.config.session_budget.exhausted(attempt.polls, elapsed) {
            info!(
                "supervisor: session to {} not up after {} polls / {}ms; retrying",
                self.session.endpoint(),
                attempt.polls,
                elapsed
            );
            self.transition(ConnectionState::ApplicationError, listener);
            self.start_session(now_ms);
            return;
        }

        if status == SessionStatus::Failed {
            self.session.begin(&self.client_id);
        }
        self.phase = Phase::Session(attempt);
    }

    fn check_health<CL>(&mut self, now_ms: u64, listener: &mut CL)
    where
        CL: ConnectionListener,
    {
        if !self.link.is_up() {
            self.on_link_lost(now_ms, listener);
            return;
        }

        if self.session.status() != SessionStatus::Up {
            info!("supervisor: session dropped; reconnecting");
            self.transition(ConnectionState::LinkUp, listener);
            self.start_session(now_ms);
        }
    }

    fn on_link_lost<CL>(&mut self, now_ms: u64, listener: &mut CL)
    where
        CL: ConnectionListener,
    {
        info!("supervisor: link lost; rejoining {}", self.link.network_name());
        self.transition(ConnectionState::Disconnected, listener);
        self.start_link(now_ms);
    }

    fn transition<CL>(&mut self, next: ConnectionState, listener: &mut CL)
    where
        CL: ConnectionListener,
    {
        if self.state == next {
            return;
        }

        info!("supervisor: {} -> {}", self.state.as_str(), next.as_str());
        self.state = next;

        let target = match next {
            ConnectionState::LinkError => self.link.network_name(),
            ConnectionState::ApplicationError => self.session.endpoint(),
            _ => "",
        };
        listener.on_connection_state(next, target);
    }
}
