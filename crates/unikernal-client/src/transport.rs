//! The seam between a session and the connection library.
//!
//! A [`Transport`] opens connections; each open yields a [`Connection`]
//! handle for outbound traffic and reports everything inbound through
//! [`TransportEvents`].

use std::sync::Arc;

use crate::TransportError;

/// Opens connections to a hub.
pub trait Transport: Send + Sync {
    /// Start opening a connection to `address` and return immediately.
    ///
    /// The outcome arrives later through `events`. Implementations must not
    /// invoke `events` from within this call.
    fn open(&self, address: &str, events: Arc<dyn TransportEvents>) -> Box<dyn Connection>;
}

/// Outbound half of one open (or opening) connection.
///
/// Both calls are fire-and-forget: a failure surfaces later as
/// [`TransportEvents::on_transport_error`] or
/// [`TransportEvents::on_transport_close`].
pub trait Connection: Send {
    fn send(&mut self, text: String);
    fn close(&mut self, code: u16, reason: &str);
}

/// Notifications delivered by a transport.
pub trait TransportEvents: Send + Sync {
    fn on_transport_open(&self);
    fn on_transport_message(&self, text: &str);
    fn on_transport_close(&self, code: u16, reason: &str, remote: bool);
    fn on_transport_error(&self, error: TransportError);
}
