//! Session coordinator: poll loop, reconciler, and command surface.
//!
//! One tokio task owns the state machine and the previous roster. It
//! serializes three inputs in a single `select!` loop: user commands
//! (host/join/leave), outcomes of spawned connect attempts, and the poll
//! tick. Each poll cycle drains raw transport events, reconciles the
//! roster, and publishes an updated snapshot plus the cycle's events as
//! one batch.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{self, SessionConfig};
use crate::error::{SessionError, TransportError};
use crate::event::{self, RawSessionEvent, SessionEvent};
use crate::roster::{self, Player, PlayerStatus, Roster};
use crate::state::{SessionRole, SessionState};
use crate::transport::Transport;

/// Shown when the local LAN address could not be determined.
const UNKNOWN_IP: &str = "Unknown";

/// Read-only view published to the presentation layer once per cycle.
///
/// Replaced wholesale by the coordinator task (single writer); read by
/// any number of presentation-layer threads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub role: SessionRole,
    pub roster: Roster,
    pub max_players: u8,
    pub local_ip: Option<String>,
}

type Reply = oneshot::Sender<Result<(), SessionError>>;

enum Command {
    Host {
        nickname: String,
        max_players: u8,
        port: u16,
        reply: Reply,
    },
    Join {
        nickname: String,
        ip: String,
        port: u16,
        reply: Reply,
    },
    Leave {
        reply: Reply,
    },
    Shutdown,
}

/// Result of a spawned host/join attempt, tagged with the attempt epoch
/// so outcomes arriving after a leave or shutdown are discarded.
struct ConnectOutcome {
    epoch: u64,
    role: SessionRole,
    nickname: String,
    max_players: u8,
    port: u16,
    result: Result<(), TransportError>,
    reply: Reply,
}

/// Handle for issuing commands and reading the latest snapshot.
#[derive(Clone)]
pub struct CoordinatorHandle {
    command_tx: mpsc::Sender<Command>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
}

impl CoordinatorHandle {
    /// Request to host a session. Resolves once the transport confirms
    /// or rejects the request.
    pub async fn request_host(
        &self,
        nickname: &str,
        max_players: u8,
        port: u32,
    ) -> Result<(), SessionError> {
        let (nickname, max_players, port) = config::validate_host(nickname, max_players, port)?;
        self.send_command(|reply| Command::Host {
            nickname,
            max_players,
            port,
            reply,
        })
        .await
    }

    /// Request to join a session at `ip:port`.
    pub async fn request_join(
        &self,
        nickname: &str,
        ip: &str,
        port: u32,
    ) -> Result<(), SessionError> {
        let (nickname, ip, port) = config::validate_join(nickname, ip, port)?;
        self.send_command(|reply| Command::Join {
            nickname,
            ip,
            port,
            reply,
        })
        .await
    }

    /// Leave the current session (or cancel a pending connect attempt).
    pub async fn request_leave(&self) -> Result<(), SessionError> {
        self.send_command(|reply| Command::Leave { reply }).await
    }

    /// Latest published session view.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }

    /// Stop the coordinator task.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(Command::Shutdown).await;
    }

    async fn send_command(
        &self,
        make: impl FnOnce(Reply) -> Command,
    ) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(make(reply_tx))
            .await
            .map_err(|_| SessionError::CoordinatorShutDown)?;
        reply_rx
            .await
            .map_err(|_| SessionError::CoordinatorShutDown)?
    }
}

/// Coordinator task state.
pub struct SessionCoordinator<T: Transport> {
    transport: Arc<T>,
    config: SessionConfig,
    state: SessionState,
    previous_roster: Roster,
    local_ip: Option<String>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
    event_tx: mpsc::Sender<SessionEvent>,
    command_rx: mpsc::Receiver<Command>,
    outcome_tx: mpsc::Sender<ConnectOutcome>,
    outcome_rx: mpsc::Receiver<ConnectOutcome>,
    connect_epoch: u64,
    consecutive_poll_failures: u32,
}

impl<T: Transport> SessionCoordinator<T> {
    /// Create a coordinator around the given transport.
    ///
    /// Returns the coordinator (run it with `tokio::spawn(c.run())`), the
    /// command handle, and the ordered, at-most-once event stream.
    pub fn new(
        transport: T,
        config: SessionConfig,
    ) -> (Self, CoordinatorHandle, mpsc::Receiver<SessionEvent>) {
        let snapshot = Arc::new(RwLock::new(SessionSnapshot::default()));
        let (command_tx, command_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity.max(1));
        let (outcome_tx, outcome_rx) = mpsc::channel(4);

        let coordinator = Self {
            transport: Arc::new(transport),
            config,
            state: SessionState::Idle,
            previous_roster: Roster::new(),
            local_ip: None,
            snapshot: Arc::clone(&snapshot),
            event_tx,
            command_rx,
            outcome_tx,
            outcome_rx,
            connect_epoch: 0,
            consecutive_poll_failures: 0,
        };
        let handle = CoordinatorHandle {
            command_tx,
            snapshot,
        };
        (coordinator, handle, event_rx)
    }

    /// Run the coordinator loop until shutdown.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        // A slow transport must not build up a tick backlog; a cycle that
        // overruns its slot causes the next tick to be skipped.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(Command::Host { nickname, max_players, port, reply }) => {
                            self.handle_host(nickname, max_players, port, reply);
                        }
                        Some(Command::Join { nickname, ip, port, reply }) => {
                            self.handle_join(nickname, ip, port, reply);
                        }
                        Some(Command::Leave { reply }) => {
                            self.handle_leave(reply).await;
                        }
                        Some(Command::Shutdown) | None => break,
                    }
                }
                outcome = self.outcome_rx.recv() => {
                    if let Some(outcome) = outcome {
                        self.handle_connect_outcome(outcome).await;
                    }
                }
                _ = ticker.tick() => {
                    self.poll_cycle().await;
                }
            }
        }

        debug!("session coordinator stopped");
    }

    fn handle_host(&mut self, nickname: String, max_players: u8, port: u16, reply: Reply) {
        if let Err(err) = self.state.begin_connect(SessionRole::Hosting, None) {
            let _ = reply.send(Err(err));
            return;
        }
        info!(port, max_players, "hosting LAN session");

        let epoch = self.connect_epoch;
        let transport = Arc::clone(&self.transport);
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = transport
                .host_session(nickname.clone(), max_players, port)
                .await;
            let _ = outcome_tx
                .send(ConnectOutcome {
                    epoch,
                    role: SessionRole::Hosting,
                    nickname,
                    max_players,
                    port,
                    result,
                    reply,
                })
                .await;
        });
    }

    fn handle_join(&mut self, nickname: String, ip: String, port: u16, reply: Reply) {
        if let Err(err) = self
            .state
            .begin_connect(SessionRole::Joined, Some((ip.clone(), port)))
        {
            let _ = reply.send(Err(err));
            return;
        }
        info!(%ip, port, "joining LAN session");
        self.publish_events(vec![SessionEvent::AttemptingToJoin {
            ip: ip.clone(),
            port,
        }]);

        let epoch = self.connect_epoch;
        let transport = Arc::clone(&self.transport);
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = transport.join_session(nickname.clone(), ip, port).await;
            let _ = outcome_tx
                .send(ConnectOutcome {
                    epoch,
                    role: SessionRole::Joined,
                    nickname,
                    max_players: 0,
                    port,
                    result,
                    reply,
                })
                .await;
        });
    }

    async fn handle_connect_outcome(&mut self, outcome: ConnectOutcome) {
        if outcome.epoch != self.connect_epoch || !self.state.is_connecting() {
            debug!(epoch = outcome.epoch, "discarding stale connect outcome");
            let _ = outcome.reply.send(Err(SessionError::Cancelled));
            return;
        }

        match outcome.result {
            Ok(()) => {
                // Guarded by is_connecting() above.
                let _ = self.state.confirm_connect();
                self.consecutive_poll_failures = 0;
                self.local_ip = self.transport.local_ip_address().await.ok().flatten();

                match outcome.role {
                    SessionRole::Hosting => {
                        // The host is always instance 0; the first poll
                        // replaces this seed with the transport's roster.
                        let roster = Roster::from_players(vec![Player {
                            id: 0,
                            name: outcome.nickname,
                            status: PlayerStatus::Host,
                            is_local: true,
                        }]);
                        self.previous_roster = roster.clone();
                        self.publish_snapshot(SessionRole::Hosting, roster, outcome.max_players);
                        let ip = self
                            .local_ip
                            .clone()
                            .unwrap_or_else(|| UNKNOWN_IP.to_string());
                        self.publish_events(vec![SessionEvent::LobbyCreated {
                            ip,
                            port: outcome.port,
                        }]);
                    }
                    SessionRole::Joined => {
                        // Roster and slot count arrive with the next poll.
                        self.publish_snapshot(SessionRole::Joined, Roster::new(), 0);
                    }
                    SessionRole::None => {}
                }
                info!(role = ?outcome.role, "session established");
                let _ = outcome.reply.send(Ok(()));
            }
            Err(err) => {
                warn!(%err, role = ?outcome.role, "connect attempt failed");
                self.state.abort_connect();
                let _ = outcome.reply.send(Err(err.into()));
            }
        }
    }

    async fn handle_leave(&mut self, reply: Reply) {
        if let Err(err) = self.state.begin_disconnect() {
            let _ = reply.send(Err(err));
            return;
        }
        // Invalidate any in-flight connect attempt; its late outcome is
        // discarded instead of resurrecting the session.
        self.connect_epoch += 1;

        let result = self.transport.leave_session().await;
        if let Err(err) = &result {
            warn!(%err, "leave_session failed; forcing idle");
        }
        self.state.finish_disconnect();
        self.reset_session_view();
        self.publish_events(vec![SessionEvent::ExplicitLeave]);
        info!("left LAN session");
        let _ = reply.send(result.map_err(SessionError::from));
    }

    async fn poll_cycle(&mut self) {
        if !self.state.is_active() {
            return;
        }

        match self.poll_transport().await {
            Ok((role, raw_events, players, max_players)) => {
                self.consecutive_poll_failures = 0;

                if role == SessionRole::None {
                    info!("transport reports no session; treating as connection loss");
                    self.lose_connection(vec![SessionEvent::ConnectionLost]);
                    return;
                }

                let mut events = event::translate(raw_events, true);
                let lost = events.contains(&SessionEvent::ConnectionLost);

                let current = Roster::from_players(players);
                let (roster, diff) = roster::reconcile(&self.previous_roster, current);
                event::fold_roster_events(&mut events, diff);
                self.previous_roster = roster.clone();

                if lost {
                    self.lose_connection(events);
                } else {
                    self.publish_snapshot(role, roster, max_players);
                    self.publish_events(events);
                }
            }
            Err(err) => {
                self.consecutive_poll_failures += 1;
                warn!(
                    %err,
                    failures = self.consecutive_poll_failures,
                    threshold = self.config.poll_failure_threshold,
                    "poll cycle failed"
                );
                if self.consecutive_poll_failures >= self.config.poll_failure_threshold {
                    self.lose_connection(vec![SessionEvent::ConnectionLost]);
                }
            }
        }
    }

    /// One transport round trip: role, drained events, roster, slots.
    /// Reconciliation runs strictly after the event drain.
    async fn poll_transport(
        &self,
    ) -> Result<(SessionRole, Vec<RawSessionEvent>, Vec<Player>, u8), TransportError> {
        let role = self.transport.query_role().await?;
        if role == SessionRole::None {
            return Ok((role, Vec::new(), Vec::new(), 0));
        }
        let raw_events = self.transport.drain_events().await?;
        let players = self.transport.fetch_roster().await?;
        let max_players = self.transport.fetch_max_players().await?;
        Ok((role, raw_events, players, max_players))
    }

    /// Forced teardown. `events` carries at most one `ConnectionLost`
    /// (the translator deduplicates within a batch).
    fn lose_connection(&mut self, events: Vec<SessionEvent>) {
        self.state.force_idle();
        self.connect_epoch += 1;
        self.reset_session_view();
        self.publish_events(events);
    }

    fn reset_session_view(&mut self) {
        self.previous_roster.clear();
        self.local_ip = None;
        self.consecutive_poll_failures = 0;
        *self.snapshot.write() = SessionSnapshot::default();
    }

    fn publish_snapshot(&self, role: SessionRole, roster: Roster, max_players: u8) {
        *self.snapshot.write() = SessionSnapshot {
            role,
            roster,
            max_players,
            local_ip: self.local_ip.clone(),
        };
    }

    /// Deliver a cycle's events in order. The snapshot is always written
    /// before its events so a consumer never sees an event without the
    /// roster that produced it. A full channel drops the event rather
    /// than stalling the poll loop.
    fn publish_events(&self, events: Vec<SessionEvent>) {
        for event in events {
            match self.event_tx.try_send(event) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(event)) => {
                    warn!(?event, "event channel full; dropping event");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("event channel closed; consumer gone");
                    return;
                }
            }
        }
    }
}
