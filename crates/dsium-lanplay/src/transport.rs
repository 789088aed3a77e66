//! Capability interface to the emulator core's LAN transport.
//!
//! The coordinator never frames packets or discovers peers itself; it
//! only drives this interface and reconciles what it reports. The
//! emulator core (or a test double) implements it.

use std::future::Future;

use crate::error::TransportError;
use crate::event::RawSessionEvent;
use crate::roster::Player;
use crate::state::SessionRole;

/// Raw session primitives provided by the networking layer.
///
/// Queries may block or suspend; the coordinator awaits them at
/// well-defined points of the poll cycle and never concurrently with
/// itself.
pub trait Transport: Send + Sync + 'static {
    /// Current role as seen by the transport.
    fn query_role(&self) -> impl Future<Output = Result<SessionRole, TransportError>> + Send;

    /// Drain events accumulated since the previous poll.
    fn drain_events(
        &self,
    ) -> impl Future<Output = Result<Vec<RawSessionEvent>, TransportError>> + Send;

    /// Fetch the current player roster in discovery order.
    fn fetch_roster(&self) -> impl Future<Output = Result<Vec<Player>, TransportError>> + Send;

    /// Fetch the session's player-slot count.
    fn fetch_max_players(&self) -> impl Future<Output = Result<u8, TransportError>> + Send;

    /// Start hosting a session on the given port.
    fn host_session(
        &self,
        nickname: String,
        max_players: u8,
        port: u16,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Join a session hosted at `ip:port`.
    fn join_session(
        &self,
        nickname: String,
        ip: String,
        port: u16,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Leave the current session.
    fn leave_session(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Local LAN address, if one could be determined.
    fn local_ip_address(
        &self,
    ) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;
}
