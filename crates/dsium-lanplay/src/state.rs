//! Session lifecycle state machine.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// The local node's participation mode in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionRole {
    /// Not part of any session.
    #[default]
    None,
    /// Hosting a session.
    Hosting,
    /// Joined a session hosted elsewhere.
    Joined,
}

impl SessionRole {
    /// Decode the raw session type reported by the transport.
    ///
    /// Unknown values collapse to `None`.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Hosting,
            2 => Self::Joined,
            _ => Self::None,
        }
    }
}

/// Connection lifecycle of the local node.
///
/// Host and join requests are only accepted from `Idle`; a request issued
/// in any other state fails fast without touching the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No session and no request in flight.
    Idle,
    /// A host or join request has been issued; waiting for the transport
    /// to confirm. `target` is the server address for join attempts.
    Connecting {
        role: SessionRole,
        target: Option<(String, u16)>,
    },
    /// The transport confirmed the session.
    Active { role: SessionRole },
    /// Explicit leave in progress.
    Disconnecting,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl SessionState {
    pub fn role(&self) -> SessionRole {
        match self {
            Self::Idle | Self::Disconnecting => SessionRole::None,
            Self::Connecting { role, .. } | Self::Active { role } => *role,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting { .. })
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Begin a host or join attempt.
    pub fn begin_connect(
        &mut self,
        role: SessionRole,
        target: Option<(String, u16)>,
    ) -> Result<(), SessionError> {
        if !self.is_idle() {
            return Err(SessionError::AlreadyInSession);
        }
        *self = Self::Connecting { role, target };
        Ok(())
    }

    /// The transport confirmed the pending attempt.
    pub fn confirm_connect(&mut self) -> Result<(), SessionError> {
        match self {
            Self::Connecting { role, .. } => {
                *self = Self::Active { role: *role };
                Ok(())
            }
            _ => Err(SessionError::NotInSession),
        }
    }

    /// The pending attempt failed or timed out; fall back to idle.
    pub fn abort_connect(&mut self) {
        if self.is_connecting() {
            *self = Self::Idle;
        }
    }

    /// Begin an explicit leave. Valid from `Active` and `Connecting`
    /// (leaving while connecting cancels the in-flight attempt).
    pub fn begin_disconnect(&mut self) -> Result<(), SessionError> {
        match self {
            Self::Active { .. } | Self::Connecting { .. } => {
                *self = Self::Disconnecting;
                Ok(())
            }
            _ => Err(SessionError::NotInSession),
        }
    }

    /// Teardown finished.
    pub fn finish_disconnect(&mut self) {
        *self = Self::Idle;
    }

    /// Forced return to idle: connection loss or fatal transport error.
    pub fn force_idle(&mut self) {
        *self = Self::Idle;
    }
}
