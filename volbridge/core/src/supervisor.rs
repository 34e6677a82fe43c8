//! Connection Supervisor
//!
//! Keeps a device session alive: acquire a link, run a
//! [`ProtocolController`] on it, and after any transport failure wait
//! `reconnect_delay` and try again. Retries are unbounded; only shutdown
//! ends the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::icon::IconSource;
use crate::mixer::AudioMixer;
use crate::protocol::controller::stop_requested;
use crate::protocol::{ProtocolConfig, ProtocolController, SessionEnd};
use crate::transport::Connector;

/// Counters reported when the supervisor stops
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    /// Links successfully opened
    pub sessions: u64,
    /// Failed attempts to open a link
    pub connect_failures: u64,
    /// Sessions that ended with a transport error
    pub session_failures: u64,
}

/// Reconnect loop around the protocol controller
pub struct Supervisor {
    connector: Arc<dyn Connector>,
    mixer: Arc<dyn AudioMixer>,
    icons: Arc<dyn IconSource>,
    protocol: ProtocolConfig,
    reconnect_delay: Duration,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("target", &self.connector.describe())
            .field("mixer", &self.mixer.name())
            .field("protocol", &self.protocol)
            .field("reconnect_delay", &self.reconnect_delay)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    /// Create a supervisor
    pub fn new(
        connector: Arc<dyn Connector>,
        mixer: Arc<dyn AudioMixer>,
        icons: Arc<dyn IconSource>,
        protocol: ProtocolConfig,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            connector,
            mixer,
            icons,
            protocol,
            reconnect_delay,
        }
    }

    /// Run sessions until `shutdown` becomes `true`
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> SupervisorStats {
        let mut stats = SupervisorStats::default();
        let target = self.connector.describe();
        info!(target_device = %target, "Supervisor started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let attempt = tokio::select! {
                () = stop_requested(&mut shutdown) => break,
                attempt = self.connector.connect() => attempt,
            };

            match attempt {
                Ok(link) => {
                    stats.sessions += 1;
                    info!(peer = %link.peer(), "Device link open");
                    let mut controller = ProtocolController::new(
                        link,
                        Arc::clone(&self.mixer),
                        Arc::clone(&self.icons),
                        self.protocol.clone(),
                    );
                    match controller.run(&mut shutdown).await {
                        Ok(SessionEnd::Stopped) => break,
                        Err(e) => {
                            stats.session_failures += 1;
                            warn!(error = %e, "Device session failed");
                        }
                    }
                }
                Err(e) => {
                    stats.connect_failures += 1;
                    warn!(target_device = %target, error = %e, "Could not open device link");
                }
            }

            tokio::select! {
                () = stop_requested(&mut shutdown) => break,
                () = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        info!(
            sessions = stats.sessions,
            connect_failures = stats.connect_failures,
            session_failures = stats.session_failures,
            "Supervisor stopped"
        );
        stats
    }
}
