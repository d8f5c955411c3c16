//! Core types for Unikernal adapters.
//!
//! This crate provides the wire primitives. Every message exchanged with the
//! hub is an [`Envelope`]; the intent set is open, so the crate only frames
//! messages and leaves interpretation to the application.

mod envelope;
mod registration;
mod service;

pub use envelope::{DecodeError, Envelope, Payload, decode, encode};
pub use registration::{Auth, REGISTER, Registration, RegistrationError, build_registration};
pub use service::{ServiceId, ServiceIdError};

use std::fmt;

/// Adapter session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Constructed, no connection requested yet.
    Disconnected,
    /// Open request issued, waiting for the transport.
    Connecting,
    /// Connection open, registration being sent.
    Registering,
    /// Registered; inbound envelopes are delivered.
    Active,
    /// Local close requested, waiting for the transport to confirm.
    Closing,
    /// Connection closed.
    Closed,
    /// Transport reported an unrecoverable error.
    Failed,
}

impl SessionState {
    /// Closed and Failed admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }

    /// Whether inbound messages are delivered in this state.
    pub fn accepts_messages(self) -> bool {
        matches!(self, Self::Registering | Self::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Registering => "registering",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
