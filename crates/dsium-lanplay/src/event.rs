//! Raw transport events and the user-facing session event stream.
//!
//! The transport reports low-level, possibly bursty events each poll
//! cycle. [`translate`] turns them into the [`SessionEvent`] stream the
//! presentation layer subscribes to, and [`fold_roster_events`] merges in
//! the join/leave events derived from roster reconciliation without
//! double-reporting.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Event drained from the transport, before translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSessionEvent {
    Join { id: u32, name: String },
    Leave { id: u32, name: String },
    ConnectionLost,
    RumbleStart { duration_ms: u32 },
    RumbleStop,
    Stop,
}

/// User-facing notification derived from session activity.
///
/// Events are one-shot: delivered to the presentation layer at most once,
/// in order, and never replayed from persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    PlayerJoined { name: String },
    PlayerLeft { name: String },
    ConnectionLost,
    RumbleStart { duration_ms: u32 },
    RumbleStop,
    Stop,
    LobbyCreated { ip: String, port: u16 },
    AttemptingToJoin { ip: String, port: u16 },
    ExplicitLeave,
}

/// Translate one poll cycle's raw events into session events.
///
/// Order is preserved. Rumble and stop signals pass through verbatim with
/// no deduplication; `ConnectionLost` is collapsed to at most one per
/// batch. Raw events observed while no session is active are protocol
/// violations: they are logged and dropped, never fatal.
pub fn translate(raw: Vec<RawSessionEvent>, in_active_session: bool) -> Vec<SessionEvent> {
    let mut out = Vec::with_capacity(raw.len());
    let mut connection_lost_seen = false;

    for event in raw {
        if !in_active_session {
            warn!(?event, "dropping raw event received outside an active session");
            continue;
        }
        match event {
            RawSessionEvent::Join { name, .. } => {
                out.push(SessionEvent::PlayerJoined { name });
            }
            RawSessionEvent::Leave { name, .. } => {
                out.push(SessionEvent::PlayerLeft { name });
            }
            RawSessionEvent::ConnectionLost => {
                if !connection_lost_seen {
                    connection_lost_seen = true;
                    out.push(SessionEvent::ConnectionLost);
                }
            }
            RawSessionEvent::RumbleStart { duration_ms } => {
                out.push(SessionEvent::RumbleStart { duration_ms });
            }
            RawSessionEvent::RumbleStop => out.push(SessionEvent::RumbleStop),
            RawSessionEvent::Stop => out.push(SessionEvent::Stop),
        }
    }

    out
}

/// Append roster-diff join/leave events after the translated raw batch.
///
/// The transport may have reported the same join or leave as a raw event
/// in this cycle; those duplicates are skipped so each change surfaces
/// exactly once.
pub fn fold_roster_events(batch: &mut Vec<SessionEvent>, diff: Vec<SessionEvent>) {
    for event in diff {
        if batch.contains(&event) {
            debug!(?event, "roster diff duplicates a raw transport event");
            continue;
        }
        batch.push(event);
    }
}
