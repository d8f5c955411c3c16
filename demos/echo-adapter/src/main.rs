//! Echo adapter.
//!
//! Connects one service to a Unikernal hub and keeps it connected:
//! - Registers on every connect
//! - Answers HEARTBEAT and ECHO, logs every other intent
//! - Reconnects with exponential backoff until Ctrl-C
//!
//! Run against a local hub:
//!   cargo run -p unikernal-echo-adapter -- --service-id echo --auth-key adapter-key
//!   cargo run -p unikernal-echo-adapter -- --config adapter.toml

mod handler;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use unikernal_client::{AdapterConfig, Backoff, Envelope, Session, SessionState, WsTransport};

/// How long a Ctrl-C shutdown waits for the hub to confirm the close.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "echo-adapter", about = "Connect a service to a Unikernal hub")]
struct Args {
    /// TOML file with address, service_id and auth_key.
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Hub WebSocket address.
    #[arg(long, env = "UNIKERNAL_ADDRESS")]
    address: Option<String>,
    #[arg(long, env = "UNIKERNAL_SERVICE_ID")]
    service_id: Option<String>,
    #[arg(long, env = "UNIKERNAL_AUTH_KEY")]
    auth_key: Option<String>,
    /// Exit when the session ends instead of reconnecting.
    #[arg(long)]
    once: bool,
}

impl Args {
    fn adapter_config(&self) -> anyhow::Result<AdapterConfig> {
        let mut config = match &self.config {
            Some(path) => AdapterConfig::from_file(path)?,
            None => AdapterConfig::default(),
        };
        if let Some(address) = &self.address {
            config.address = address.clone();
        }
        if let Some(service_id) = &self.service_id {
            config.service_id = service_id.clone();
        }
        if let Some(auth_key) = &self.auth_key {
            config.auth_key = auth_key.clone();
        }
        Ok(config)
    }
}

enum Outcome {
    Ended(SessionState),
    Shutdown,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(env_filter()?).init();

    let args = Args::parse();
    let config = args.adapter_config()?;
    let service_id = config.validate()?;
    tracing::info!("Starting adapter {} for hub {}", service_id, config.address);

    let mut backoff = Backoff::default();
    loop {
        let state = match run_session(&config, &mut backoff).await? {
            Outcome::Shutdown => return Ok(()),
            Outcome::Ended(state) => state,
        };
        if args.once {
            anyhow::bail!("session ended ({state})");
        }

        let delay = backoff.next_delay();
        tracing::info!("Session {}, reconnecting in {:?}", state, delay);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

/// `RUST_LOG` plus info for this binary and the session's reports.
fn env_filter() -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("echo_adapter=info".parse()?)
        .add_directive("unikernal_client=info".parse()?))
}

async fn run_session(config: &AdapterConfig, backoff: &mut Backoff) -> anyhow::Result<Outcome> {
    let (tx, mut inbox) = mpsc::unbounded_channel();
    let session = Arc::new(Session::from_config(
        config,
        WsTransport::new()?,
        move |envelope: Envelope| {
            let _ = tx.send(envelope);
        },
    )?);
    let mut states = session.subscribe();
    session.connect()?;

    loop {
        tokio::select! {
            Some(envelope) = inbox.recv() => handler::handle(&session, envelope),

            changed = states.changed() => {
                if changed.is_err() {
                    return Ok(Outcome::Ended(session.state()));
                }
                let state = *states.borrow_and_update();
                if state == SessionState::Active {
                    backoff.reset();
                }
                if state.is_terminal() {
                    return Ok(Outcome::Ended(state));
                }
            }

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                session.close(1000, "shutdown");
                let confirmed = tokio::time::timeout(CLOSE_GRACE, states.wait_for(|s| s.is_terminal())).await;
                if confirmed.is_err() {
                    tracing::warn!("Hub did not confirm close within {:?}", CLOSE_GRACE);
                }
                return Ok(Outcome::Shutdown);
            }
        }
    }
}
