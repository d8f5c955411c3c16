//! Adapter session state machine.
//!
//! ```text
//! Disconnected --connect--> Connecting --open--> Registering --send--> Active
//!                                |                                       |
//!                                +------ close --> Closed <-- close -----+
//!                                +------ error --> Failed <-- error -----+
//! ```
//!
//! Every notification runs under one lock, so a message can never be
//! processed against a state that a concurrent close has already replaced.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;
use unikernal_core::{Envelope, ServiceId, SessionState, build_registration, decode, encode};

use crate::{
    AdapterConfig, ConfigError, Connection, Observer, SessionError, TracingObserver, Transport,
    TransportError, TransportEvents,
};

/// Receives every successfully decoded inbound envelope.
///
/// Called synchronously while the session lock is held, in transport order.
/// A handler must not call back into the session; hand work off instead
/// (for example through a channel).
pub trait Handler: Send + Sync {
    fn on_envelope(&self, envelope: Envelope);
}

impl<F> Handler for F
where
    F: Fn(Envelope) + Send + Sync,
{
    fn on_envelope(&self, envelope: Envelope) {
        self(envelope)
    }
}

struct Inner {
    state: SessionState,
    connection: Option<Box<dyn Connection>>,
}

/// One adapter's session with one hub.
pub struct Session {
    address: String,
    service_id: ServiceId,
    auth_key: String,
    transport: Arc<dyn Transport>,
    handler: Box<dyn Handler>,
    observer: Arc<dyn Observer>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<SessionState>,
}

impl Session {
    /// Create a disconnected session.
    pub fn new(
        address: impl Into<String>,
        service_id: ServiceId,
        auth_key: impl Into<String>,
        transport: impl Transport + 'static,
        handler: impl Handler + 'static,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Disconnected);
        Self {
            address: address.into(),
            observer: Arc::new(TracingObserver::new(service_id.clone())),
            service_id,
            auth_key: auth_key.into(),
            transport: Arc::new(transport),
            handler: Box::new(handler),
            inner: Mutex::new(Inner {
                state: SessionState::Disconnected,
                connection: None,
            }),
            state_tx,
        }
    }

    /// Create a disconnected session from validated configuration.
    pub fn from_config(
        config: &AdapterConfig,
        transport: impl Transport + 'static,
        handler: impl Handler + 'static,
    ) -> Result<Self, ConfigError> {
        let service_id = config.validate()?;
        Ok(Self::new(
            config.address.clone(),
            service_id,
            config.auth_key.clone(),
            transport,
            handler,
        ))
    }

    /// Replace the default tracing observer.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn service_id(&self) -> &ServiceId {
        &self.service_id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Issue the open request. Returns before the connection is established.
    pub fn connect(self: &Arc<Self>) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if inner.state != SessionState::Disconnected {
            return Err(SessionError::AlreadyConnected { state: inner.state });
        }

        self.transition(&mut inner, SessionState::Connecting);
        self.observer
            .log_info(&format!("connecting to hub at {}", self.address));

        let events: Arc<dyn TransportEvents> = Arc::new(SessionEvents(Arc::downgrade(self)));
        inner.connection = Some(self.transport.open(&self.address, events));
        Ok(())
    }

    /// Send an application envelope. Only valid while active.
    pub fn send(&self, envelope: &Envelope) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if inner.state != SessionState::Active {
            return Err(SessionError::NotActive { state: inner.state });
        }
        if let Some(connection) = inner.connection.as_mut() {
            connection.send(encode(envelope));
        }
        Ok(())
    }

    /// Ask the transport to close the connection.
    ///
    /// The session stays in Closing until the transport confirms. Outside
    /// Connecting, Registering and Active this does nothing.
    pub fn close(&self, code: u16, reason: &str) {
        let mut inner = self.lock();
        if !matches!(
            inner.state,
            SessionState::Connecting | SessionState::Registering | SessionState::Active
        ) {
            tracing::debug!(state = %inner.state, "close ignored");
            return;
        }

        self.transition(&mut inner, SessionState::Closing);
        if let Some(connection) = inner.connection.as_mut() {
            connection.close(code, reason);
        }
        self.observer
            .log_info(&format!("closing connection (code {code}, reason {reason:?})"));
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, inner: &mut Inner, state: SessionState) {
        tracing::debug!(from = %inner.state, to = %state, "session transition");
        inner.state = state;
        self.state_tx.send_replace(state);
    }
}

impl TransportEvents for Session {
    fn on_transport_open(&self) {
        let mut inner = self.lock();
        if inner.state != SessionState::Connecting {
            tracing::debug!(state = %inner.state, "open notification ignored");
            return;
        }

        self.transition(&mut inner, SessionState::Registering);
        self.observer.log_info(&format!(
            "connected to hub at {}, registering as {}",
            self.address, self.service_id
        ));

        let registration = encode(&build_registration(&self.service_id, &self.auth_key));
        if let Some(connection) = inner.connection.as_mut() {
            connection.send(registration);
        }

        // Registration is not acknowledged by the hub.
        self.transition(&mut inner, SessionState::Active);
    }

    fn on_transport_message(&self, text: &str) {
        let inner = self.lock();
        if !inner.state.accepts_messages() {
            tracing::debug!(state = %inner.state, "message discarded");
            return;
        }

        match decode(text) {
            Ok(envelope) => self.handler.on_envelope(envelope),
            Err(e) => self.observer.log_error(&e),
        }
    }

    fn on_transport_close(&self, code: u16, reason: &str, remote: bool) {
        let mut inner = self.lock();
        if inner.state.is_terminal() {
            return;
        }

        self.transition(&mut inner, SessionState::Closed);
        inner.connection = None;
        self.observer.log_info(&format!(
            "connection closed (code {code}, reason {reason:?}, remote {remote})"
        ));
    }

    fn on_transport_error(&self, error: TransportError) {
        let mut inner = self.lock();
        if inner.state.is_terminal() {
            tracing::debug!(state = %inner.state, %error, "error after session ended");
            return;
        }

        self.transition(&mut inner, SessionState::Failed);
        inner.connection = None;
        self.observer.log_error(&error);
    }
}

/// What the transport holds on to.
///
/// Only a weak reference, so dropping the last `Arc<Session>` drops the
/// connection handle and lets the transport shut the socket.
struct SessionEvents(Weak<Session>);

impl TransportEvents for SessionEvents {
    fn on_transport_open(&self) {
        if let Some(session) = self.0.upgrade() {
            session.on_transport_open();
        }
    }

    fn on_transport_message(&self, text: &str) {
        if let Some(session) = self.0.upgrade() {
            session.on_transport_message(text);
        }
    }

    fn on_transport_close(&self, code: u16, reason: &str, remote: bool) {
        if let Some(session) = self.0.upgrade() {
            session.on_transport_close(code, reason, remote);
        }
    }

    fn on_transport_error(&self, error: TransportError) {
        match self.0.upgrade() {
            Some(session) => session.on_transport_error(error),
            None => tracing::debug!(%error, "transport error after session dropped"),
        }
    }
}
