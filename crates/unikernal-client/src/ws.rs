//! WebSocket transport over `tokio-tungstenite`.
//!
//! Each open spawns one I/O task on the runtime. The task owns the socket,
//! forwards queued outbound frames, and reports inbound traffic to the
//! session in arrival order.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::{Connection, Transport, TransportError, TransportEvents};

/// Close code reported when the socket ends without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;
/// Close code reported for a close frame with no status.
const NO_STATUS: u16 = 1005;

/// Opens WebSocket connections on a tokio runtime.
#[derive(Debug, Clone)]
pub struct WsTransport {
    runtime: Handle,
}

impl WsTransport {
    /// Use the runtime this is called from.
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self {
            runtime: Handle::try_current()?,
        })
    }

    pub fn with_handle(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl Transport for WsTransport {
    fn open(&self, address: &str, events: Arc<dyn TransportEvents>) -> Box<dyn Connection> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.runtime.spawn(run(address.to_string(), events, rx));
        Box::new(WsConnection { tx })
    }
}

enum Outbound {
    Text(String),
    Close { code: u16, reason: String },
}

struct WsConnection {
    tx: mpsc::UnboundedSender<Outbound>,
}

// A closed channel means the I/O task has ended and already reported why.
impl Connection for WsConnection {
    fn send(&mut self, text: String) {
        let _ = self.tx.send(Outbound::Text(text));
    }

    fn close(&mut self, code: u16, reason: &str) {
        let _ = self.tx.send(Outbound::Close {
            code,
            reason: reason.to_string(),
        });
    }
}

async fn run(
    address: String,
    events: Arc<dyn TransportEvents>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    let ws = match connect_async(address.as_str()).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            events.on_transport_error(e.into());
            return;
        }
    };
    tracing::debug!("websocket open: {}", address);
    events.on_transport_open();

    let (mut sink, mut stream) = ws.split();
    let mut closing_locally = false;

    loop {
        tokio::select! {
            msg = outbound.recv() => {
                let frame = match msg {
                    Some(Outbound::Text(text)) => Message::Text(text.into()),
                    Some(Outbound::Close { code, reason }) => {
                        closing_locally = true;
                        Message::Close(Some(CloseFrame {
                            code: CloseCode::from(code),
                            reason: reason.into(),
                        }))
                    }
                    // Session released the connection after it ended.
                    None => {
                        let _ = sink.close().await;
                        return;
                    }
                };
                if let Err(e) = sink.send(frame).await {
                    events.on_transport_error(e.into());
                    return;
                }
            }

            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => events.on_transport_message(text.as_str()),
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.as_str().to_string()))
                        .unwrap_or((NO_STATUS, String::new()));
                    // Flush tungstenite's queued close reply.
                    let _ = sink.close().await;
                    events.on_transport_close(code, &reason, !closing_locally);
                    return;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(other)) => {
                    tracing::debug!("discarding non-text frame ({} bytes)", other.len());
                }
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    events.on_transport_close(ABNORMAL_CLOSURE, "", !closing_locally);
                    return;
                }
                Some(Err(e)) => {
                    events.on_transport_error(e.into());
                    return;
                }
            }
        }
    }
}
