//! Coordinator tuning and request validation policy.

use std::ops::RangeInclusive;
use std::time::Duration;

use crate::error::SessionError;

/// Port offered by the front-end when the user has not picked one.
pub const DEFAULT_PORT: u16 = 7064;

/// Player slots offered by the front-end when hosting.
pub const DEFAULT_MAX_PLAYERS: u8 = 2;

/// Valid player-slot range for a hosted session.
pub const MAX_PLAYERS_RANGE: RangeInclusive<u8> = 2..=16;

/// Tuning for the session coordinator.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cadence of the transport poll cycle.
    pub poll_interval: Duration,

    /// Consecutive failed poll cycles tolerated before the session is
    /// declared lost and torn down.
    pub poll_failure_threshold: u32,

    /// Capacity of the user-facing event channel. Events beyond this are
    /// dropped rather than stalling the poll loop.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            poll_failure_threshold: 3,
            event_capacity: 64,
        }
    }
}

/// Validate host request parameters.
///
/// Runs before the request reaches the coordinator task; invalid input
/// never triggers a state transition or a transport call.
pub(crate) fn validate_host(
    nickname: &str,
    max_players: u8,
    port: u32,
) -> Result<(String, u8, u16), SessionError> {
    let nickname = validate_nickname(nickname)?;
    if !MAX_PLAYERS_RANGE.contains(&max_players) {
        return Err(SessionError::InvalidMaxPlayers(max_players));
    }
    let port = validate_port(port)?;
    Ok((nickname, max_players, port))
}

/// Validate join request parameters.
pub(crate) fn validate_join(
    nickname: &str,
    ip: &str,
    port: u32,
) -> Result<(String, String, u16), SessionError> {
    let nickname = validate_nickname(nickname)?;
    let ip = ip.trim();
    if ip.is_empty() {
        return Err(SessionError::InvalidAddress);
    }
    let port = validate_port(port)?;
    Ok((nickname, ip.to_string(), port))
}

fn validate_port(port: u32) -> Result<u16, SessionError> {
    if (1..=u16::MAX as u32).contains(&port) {
        Ok(port as u16)
    } else {
        Err(SessionError::InvalidPort(port))
    }
}

fn validate_nickname(nickname: &str) -> Result<String, SessionError> {
    let trimmed = nickname.trim();
    if trimmed.is_empty() {
        return Err(SessionError::InvalidNickname);
    }
    Ok(trimmed.to_string())
}
