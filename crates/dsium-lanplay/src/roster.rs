//! Player roster and poll-to-poll reconciliation.

use serde::{Deserialize, Serialize};

use crate::event::SessionEvent;

/// Connection status of a roster entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerStatus {
    #[default]
    Disconnected,
    Connected,
    Host,
    Connecting,
}

impl PlayerStatus {
    /// Decode the raw status byte reported by the transport.
    ///
    /// Unknown values collapse to `Disconnected`.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Connected,
            2 => Self::Host,
            3 => Self::Connecting,
            _ => Self::Disconnected,
        }
    }

    pub fn as_raw(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connected => 1,
            Self::Host => 2,
            Self::Connecting => 3,
        }
    }
}

/// One participant in the current session.
///
/// `id` is stable for the lifetime of a session and unique within one
/// roster snapshot, but may be reused across sessions. `name` is display
/// data and not guaranteed unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub status: PlayerStatus,
    /// True for exactly one player per roster: the local participant.
    pub is_local: bool,
}

/// Ordered set of players known to the local session.
///
/// Order is discovery order as reported by the transport; identity is the
/// player id, so positions may shuffle between polls without consequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster(Vec<Player>);

impl Roster {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_players(players: Vec<Player>) -> Self {
        Self(players)
    }

    pub fn players(&self) -> &[Player] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_id(&self, id: u32) -> bool {
        self.0.iter().any(|p| p.id == id)
    }

    pub fn get(&self, id: u32) -> Option<&Player> {
        self.0.iter().find(|p| p.id == id)
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.0.iter().find(|p| p.is_local)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl IntoIterator for Roster {
    type Item = Player;
    type IntoIter = std::vec::IntoIter<Player>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Diff two consecutive roster snapshots.
///
/// Players present in `current` but not `previous` yield `PlayerJoined`;
/// players present in `previous` but not `current` yield `PlayerLeft`,
/// both keyed on id and emitted in discovery order (joins first). A
/// status-only change updates the stored player silently. The comparison
/// never derives events from a single snapshot, so a leave+rejoin that
/// collapses into one poll produces no events.
pub fn reconcile(previous: &Roster, current: Roster) -> (Roster, Vec<SessionEvent>) {
    let mut events = Vec::new();

    for player in current.players() {
        if !previous.contains_id(player.id) {
            events.push(SessionEvent::PlayerJoined {
                name: player.name.clone(),
            });
        }
    }
    for player in previous.players() {
        if !current.contains_id(player.id) {
            events.push(SessionEvent::PlayerLeft {
                name: player.name.clone(),
            });
        }
    }

    (current, events)
}
