//! LAN session error types.

use thiserror::Error;

/// Failure reported by the transport/emulator-core collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transport error: {reason}")]
pub struct TransportError {
    pub reason: String,
}

impl TransportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("port {0} is out of range (1-65535)")]
    InvalidPort(u32),

    #[error("player count {0} is out of range (2-16)")]
    InvalidMaxPlayers(u8),

    #[error("nickname must not be blank")]
    InvalidNickname,

    #[error("server address must not be blank")]
    InvalidAddress,

    #[error("already in a session")]
    AlreadyInSession,

    #[error("not in a session")]
    NotInSession,

    #[error("request cancelled")]
    Cancelled,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("session coordinator has shut down")]
    CoordinatorShutDown,
}
