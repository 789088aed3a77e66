#![allow(dead_code)]

//! Scripted in-memory transport for driving the coordinator in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dsium_lanplay::{
    Player, PlayerStatus, RawSessionEvent, SessionConfig, SessionEvent, SessionRole, Transport,
    TransportError,
};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

#[derive(Default)]
pub struct Script {
    pub role: SessionRole,
    pub players: Vec<Player>,
    pub max_players: u8,
    pub pending_events: Vec<RawSessionEvent>,
    pub fail_polls: bool,
    pub fail_next_polls: u32,
    pub local_ip: Option<String>,
    pub join_gate: Option<oneshot::Receiver<Result<(), TransportError>>>,
}

/// Transport double whose behavior is scripted by the test.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    inner: Arc<Mutex<Script>>,
    host_calls: Arc<AtomicUsize>,
    leave_calls: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutate the script under one lock, so a poll cycle observes the
    /// changes together.
    pub fn apply(&self, f: impl FnOnce(&mut Script)) {
        f(&mut self.inner.lock());
    }

    pub fn set_local_ip(&self, ip: &str) {
        self.apply(|s| s.local_ip = Some(ip.to_string()));
    }

    pub fn set_players(&self, players: Vec<Player>) {
        self.apply(|s| s.players = players);
    }

    pub fn push_event(&self, event: RawSessionEvent) {
        self.apply(|s| s.pending_events.push(event));
    }

    pub fn set_fail_polls(&self, fail: bool) {
        self.apply(|s| s.fail_polls = fail);
    }

    /// Make the next `join_session` call block until the given gate
    /// resolves.
    pub fn gate_join(&self, gate: oneshot::Receiver<Result<(), TransportError>>) {
        self.apply(|s| s.join_gate = Some(gate));
    }

    pub fn host_calls(&self) -> usize {
        self.host_calls.load(Ordering::SeqCst)
    }

    pub fn leave_calls(&self) -> usize {
        self.leave_calls.load(Ordering::SeqCst)
    }

    /// Fail exactly the next `count` poll cycles.
    pub fn fail_polls_once(&self, count: u32) {
        self.apply(|s| s.fail_next_polls = count);
    }

    fn poll_guard(&self) -> Result<(), TransportError> {
        let mut script = self.inner.lock();
        if script.fail_polls {
            return Err(TransportError::new("scripted poll failure"));
        }
        if script.fail_next_polls > 0 {
            script.fail_next_polls -= 1;
            return Err(TransportError::new("scripted poll failure"));
        }
        Ok(())
    }
}

impl Transport for ScriptedTransport {
    async fn query_role(&self) -> Result<SessionRole, TransportError> {
        self.poll_guard()?;
        Ok(self.inner.lock().role)
    }

    async fn drain_events(&self) -> Result<Vec<RawSessionEvent>, TransportError> {
        self.poll_guard()?;
        Ok(std::mem::take(&mut self.inner.lock().pending_events))
    }

    async fn fetch_roster(&self) -> Result<Vec<Player>, TransportError> {
        self.poll_guard()?;
        Ok(self.inner.lock().players.clone())
    }

    async fn fetch_max_players(&self) -> Result<u8, TransportError> {
        self.poll_guard()?;
        Ok(self.inner.lock().max_players)
    }

    async fn host_session(
        &self,
        nickname: String,
        max_players: u8,
        _port: u16,
    ) -> Result<(), TransportError> {
        self.host_calls.fetch_add(1, Ordering::SeqCst);
        self.apply(|s| {
            s.role = SessionRole::Hosting;
            s.max_players = max_players;
            s.players = vec![local_player(0, &nickname, PlayerStatus::Host)];
        });
        Ok(())
    }

    async fn join_session(
        &self,
        _nickname: String,
        _ip: String,
        _port: u16,
    ) -> Result<(), TransportError> {
        let gate = self.inner.lock().join_gate.take();
        if let Some(gate) = gate {
            match gate.await {
                Ok(result) => result?,
                Err(_) => return Err(TransportError::new("join gate dropped")),
            }
        }
        self.apply(|s| s.role = SessionRole::Joined);
        Ok(())
    }

    async fn leave_session(&self) -> Result<(), TransportError> {
        self.leave_calls.fetch_add(1, Ordering::SeqCst);
        self.apply(|s| {
            s.role = SessionRole::None;
            s.players.clear();
            s.pending_events.clear();
        });
        Ok(())
    }

    async fn local_ip_address(&self) -> Result<Option<String>, TransportError> {
        Ok(self.inner.lock().local_ip.clone())
    }
}

pub fn local_player(id: u32, name: &str, status: PlayerStatus) -> Player {
    Player {
        id,
        name: name.to_string(),
        status,
        is_local: true,
    }
}

pub fn remote_player(id: u32, name: &str, status: PlayerStatus) -> Player {
    Player {
        id,
        name: name.to_string(),
        status,
        is_local: false,
    }
}

/// Fast cadence so tests settle quickly.
pub fn test_config() -> SessionConfig {
    SessionConfig {
        poll_interval: Duration::from_millis(10),
        ..SessionConfig::default()
    }
}

pub async fn recv_event(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Assert the stream stays silent for a few poll intervals.
pub async fn assert_no_event(rx: &mut mpsc::Receiver<SessionEvent>) {
    let quiet = timeout(Duration::from_millis(80), rx.recv()).await;
    assert!(
        quiet.is_err(),
        "expected no event, got {:?}",
        quiet.expect("channel closed")
    );
}
