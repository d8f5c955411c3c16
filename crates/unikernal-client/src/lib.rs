//! Client-side adapter for the Unikernal hub.
//!
//! A [`Session`] owns one connection to one hub. It registers on open,
//! forwards inbound envelopes to a [`Handler`], and reports lifecycle events
//! through an [`Observer`]. The connection itself comes from a [`Transport`];
//! [`WsTransport`] is the WebSocket implementation.

mod backoff;
mod config;
mod error;
mod observer;
mod session;
mod transport;
mod ws;

pub use backoff::Backoff;
pub use config::{AdapterConfig, DEFAULT_ADDRESS};
pub use error::{ConfigError, SessionError, TransportError};
pub use observer::{Observer, TracingObserver};
pub use session::{Handler, Session};
pub use transport::{Connection, Transport, TransportEvents};
pub use ws::WsTransport;

pub use unikernal_core::{Envelope, ServiceId, SessionState};
