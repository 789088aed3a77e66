//! LAN Multiplayer Session Coordinator
//!
//! This crate sits directly above the emulator core's LAN transport and
//! turns its raw polling surface into a session state machine, a
//! reconciled player roster, and an ordered stream of user-facing events.
//! The presentation layer only reads the published snapshot and consumes
//! the event stream; it never mutates session state except through the
//! host/join/leave commands.
//!
//! # Architecture
//!
//! - [`state`]: session lifecycle state machine (idle/connecting/active)
//! - [`roster`]: ordered player roster and poll-to-poll reconciliation
//! - [`event`]: raw transport events and user-facing session events
//! - [`transport`]: capability interface implemented by the emulator core
//! - [`coordinator`]: poll loop, command surface, snapshot publishing
//! - [`config`]: poll cadence, failure threshold, input validation
//! - [`error`]: error types

pub mod config;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod roster;
pub mod state;
pub mod transport;

// Re-export commonly used types
pub use config::{DEFAULT_MAX_PLAYERS, DEFAULT_PORT, SessionConfig};
pub use coordinator::{CoordinatorHandle, SessionCoordinator, SessionSnapshot};
pub use error::{SessionError, TransportError};
pub use event::{RawSessionEvent, SessionEvent};
pub use roster::{Player, PlayerStatus, Roster, reconcile};
pub use state::{SessionRole, SessionState};
pub use transport::Transport;
