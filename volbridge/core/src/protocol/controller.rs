//! Protocol Controller
//!
//! Drives one device connection through its lifecycle:
//!
//! ```text
//! Disconnected -> Handshaking -> FullSync -> Listening
//!                     ^                         |
//!                     |      READY (reboot)     |
//!                     +-------------------------+
//! ```
//!
//! The controller owns the link and the known-apps snapshot. Inbound lines,
//! the diff timer and the shutdown signal are multiplexed with
//! `tokio::select!`, so a stop request is observed even while the device is
//! silent. Only transport errors end a session; mixer, icon and command
//! errors are logged and skipped.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::messages::{
    volume_echo, AppSequenceKind, DeviceMessage, VolumeCommand, DONE, END_APP, INITIALISING_APPS,
    OK, REMOVE_APP,
};
use crate::apps::{AppRecord, AppTracker, KnownAppsSnapshot};
use crate::icon::{load_icon, IconSource};
use crate::mixer::AudioMixer;
use crate::transport::{DeviceLink, TransportError};

/// Default period between presence diffs
pub const DEFAULT_DIFF_INTERVAL_MS: u64 = 2000;

/// Protocol timing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Period between presence diffs while listening
    pub diff_interval_ms: u64,
    /// Give up on a silent device after this long; `None` waits forever
    pub handshake_timeout_ms: Option<u64>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            diff_interval_ms: DEFAULT_DIFF_INTERVAL_MS,
            handshake_timeout_ms: None,
        }
    }
}

impl ProtocolConfig {
    /// Diff period as a `Duration` (never zero)
    #[must_use]
    pub fn diff_interval(&self) -> Duration {
        Duration::from_millis(self.diff_interval_ms.max(1))
    }

    /// Handshake limit, if any
    #[must_use]
    pub fn handshake_timeout(&self) -> Option<Duration> {
        self.handshake_timeout_ms.map(Duration::from_millis)
    }
}

/// Where a connection is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No link, or the link failed
    Disconnected,
    /// Waiting for the device's `READY`
    Handshaking,
    /// Sending every app to the device
    FullSync,
    /// Applying commands and sending diffs
    Listening,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Handshaking => "handshaking",
            Self::FullSync => "full-sync",
            Self::Listening => "listening",
        };
        f.write_str(name)
    }
}

/// How a session ended without a transport error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// Shutdown was requested
    Stopped,
}

/// Whether to keep going after a step
enum Flow {
    Continue,
    Stopped,
}

enum ListenEvent {
    Shutdown,
    Line(String),
    DiffDue,
}

/// Resolves once shutdown is requested (or the sender is gone)
pub(crate) async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// State machine for one device connection
pub struct ProtocolController {
    link: DeviceLink,
    mixer: Arc<dyn AudioMixer>,
    icons: Arc<dyn IconSource>,
    config: ProtocolConfig,
    tracker: AppTracker,
    state: ConnectionState,
}

impl fmt::Debug for ProtocolController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolController")
            .field("link", &self.link)
            .field("mixer", &self.mixer.name())
            .field("config", &self.config)
            .field("state", &self.state)
            .field("known_apps", &self.tracker.snapshot().len())
            .finish()
    }
}

impl ProtocolController {
    /// Controller for a freshly acquired link
    pub fn new(
        link: DeviceLink,
        mixer: Arc<dyn AudioMixer>,
        icons: Arc<dyn IconSource>,
        config: ProtocolConfig,
    ) -> Self {
        Self {
            link,
            mixer,
            icons,
            config,
            tracker: AppTracker::new(),
            state: ConnectionState::Disconnected,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Apps the device is believed to know about
    #[must_use]
    pub fn known_apps(&self) -> &KnownAppsSnapshot {
        self.tracker.snapshot()
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!(peer = %self.link.peer(), from = %self.state, to = %state, "Connection state changed");
            self.state = state;
        }
    }

    /// Run the session until shutdown or a transport failure
    ///
    /// The link is closed on return and the state is `Disconnected`. The
    /// last snapshot stays readable through [`Self::known_apps`].
    ///
    /// # Errors
    ///
    /// Any `TransportError`, including EOF as `ConnectionClosed`.
    pub async fn run(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd, TransportError> {
        let result = self.drive(shutdown).await;
        match &result {
            Ok(SessionEnd::Stopped) => info!(peer = %self.link.peer(), "Session stopped"),
            Err(e) => warn!(peer = %self.link.peer(), state = %self.state, error = %e, "Session ended"),
        }
        self.set_state(ConnectionState::Disconnected);
        self.link.close().await;
        result
    }

    async fn drive(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd, TransportError> {
        if let Flow::Stopped = self.handshake(shutdown).await? {
            return Ok(SessionEnd::Stopped);
        }
        if let Flow::Stopped = self.full_sync(shutdown).await? {
            return Ok(SessionEnd::Stopped);
        }
        self.listen(shutdown).await
    }

    /// Next line, or `None` once shutdown is requested
    async fn recv_line(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<Option<String>, TransportError> {
        tokio::select! {
            () = stop_requested(shutdown) => Ok(None),
            line = self.link.read_line() => line.map(Some),
        }
    }

    // =========================================================================
    // Handshake
    // =========================================================================

    async fn handshake(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<Flow, TransportError> {
        self.set_state(ConnectionState::Handshaking);
        info!(peer = %self.link.peer(), "Waiting for device");

        let flow = match self.config.handshake_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.await_ready(shutdown))
                .await
                .map_err(|_| TransportError::HandshakeTimeout(limit))??,
            None => self.await_ready(shutdown).await?,
        };
        if let Flow::Stopped = flow {
            return Ok(flow);
        }

        self.link.send_lines(&[OK]).await?;
        info!(peer = %self.link.peer(), "Handshake complete");
        Ok(Flow::Continue)
    }

    async fn await_ready(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<Flow, TransportError> {
        loop {
            let Some(line) = self.recv_line(shutdown).await? else {
                return Ok(Flow::Stopped);
            };
            match DeviceMessage::parse(&line) {
                DeviceMessage::Ready => return Ok(Flow::Continue),
                DeviceMessage::Diagnostic(text) => log_diagnostic(&text),
                other => debug!(line = %other, "Ignoring line before handshake"),
            }
        }
    }

    // =========================================================================
    // Full sync
    // =========================================================================

    async fn full_sync(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<Flow, TransportError> {
        self.set_state(ConnectionState::FullSync);
        self.link.send_lines(&[INITIALISING_APPS]).await?;

        loop {
            let Some(line) = self.recv_line(shutdown).await? else {
                return Ok(Flow::Stopped);
            };
            match DeviceMessage::parse(&line) {
                DeviceMessage::ReadyToReceive => break,
                DeviceMessage::Ready => {
                    debug!("Device restarted during sync");
                    self.link.send_lines(&[OK, INITIALISING_APPS]).await?;
                }
                DeviceMessage::Diagnostic(text) => log_diagnostic(&text),
                other => debug!(line = %other, "Ignoring line before sync"),
            }
        }

        let current = match self.mixer.list_apps().await {
            Ok(apps) => KnownAppsSnapshot::from_records(apps),
            Err(e) => {
                warn!(mixer = self.mixer.name(), error = %e, "Could not list apps, syncing none");
                KnownAppsSnapshot::new()
            }
        };

        let mut synced = KnownAppsSnapshot::new();
        for record in current.records() {
            if self.emit_app(AppSequenceKind::Start, record).await? {
                synced.insert(record.clone());
            }
        }
        self.link.send_lines(&[DONE]).await?;

        info!(apps = synced.len(), "Full sync complete");
        self.tracker.replace(synced);
        self.set_state(ConnectionState::Listening);
        Ok(Flow::Continue)
    }

    /// Send one app's header, name, volume, icon and trailer
    ///
    /// The icon is produced before anything is written; if that fails the
    /// whole sequence is skipped and `false` is returned.
    async fn emit_app(
        &mut self,
        kind: AppSequenceKind,
        record: &AppRecord,
    ) -> Result<bool, TransportError> {
        let icon = match load_icon(self.icons.as_ref(), record).await {
            Ok(icon) => icon,
            Err(e) => {
                warn!(app = %record.name, error = %e, "Skipping app without icon");
                return Ok(false);
            }
        };

        self.link.write_line(kind.header()).await?;
        self.link.write_line(&record.name).await?;
        self.link
            .write_line(&record.volume_percent.to_string())
            .await?;
        self.link.write_payload(icon.as_bytes()).await?;
        self.link.send_lines(&[END_APP]).await?;

        debug!(app = %record.name, volume = record.volume_percent, header = kind.header(), "App sent");
        Ok(true)
    }

    async fn emit_removal(&mut self, record: &AppRecord) -> Result<(), TransportError> {
        self.link.send_lines(&[REMOVE_APP, &record.name]).await?;
        debug!(app = %record.name, "App removal sent");
        Ok(())
    }

    // =========================================================================
    // Listening
    // =========================================================================

    async fn listen(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd, TransportError> {
        let period = self.config.diff_interval();
        let mut diff_timer = tokio::time::interval_at(Instant::now() + period, period);
        diff_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = tokio::select! {
                () = stop_requested(shutdown) => ListenEvent::Shutdown,
                line = self.link.read_line() => ListenEvent::Line(line?),
                _ = diff_timer.tick() => ListenEvent::DiffDue,
            };

            match event {
                ListenEvent::Shutdown => return Ok(SessionEnd::Stopped),
                ListenEvent::DiffDue => self.sync_diff().await?,
                ListenEvent::Line(line) => match DeviceMessage::parse(&line) {
                    DeviceMessage::Volume(command) => self.apply_volume(&command).await?,
                    DeviceMessage::Malformed { line, error } => {
                        warn!(line = %line, error = %error, "Rejected volume command");
                    }
                    DeviceMessage::Diagnostic(text) => log_diagnostic(&text),
                    DeviceMessage::Ready => {
                        info!(peer = %self.link.peer(), "Device restarted, resyncing");
                        self.link.send_lines(&[OK]).await?;
                        if let Flow::Stopped = self.full_sync(shutdown).await? {
                            return Ok(SessionEnd::Stopped);
                        }
                        diff_timer.reset();
                    }
                    DeviceMessage::ReadyToReceive => {
                        debug!("Unexpected READY_TO_RECEIVE while listening");
                    }
                },
            }
        }
    }

    /// Apply a device volume request and echo the confirmed value
    async fn apply_volume(&mut self, command: &VolumeCommand) -> Result<(), TransportError> {
        let key = command.key();

        if let Err(e) = self.mixer.set_volume(&key, command.volume_percent).await {
            warn!(app = %command.app, volume = command.volume_percent, error = %e, "Volume change failed");
            return Ok(());
        }
        let confirmed = match self.mixer.volume(&key).await {
            Ok(volume) => volume,
            Err(e) => {
                warn!(app = %command.app, error = %e, "Could not read back volume");
                return Ok(());
            }
        };

        self.link
            .send_lines(&[&volume_echo(&command.app, confirmed)])
            .await?;
        self.tracker.confirm_volume(&key, confirmed);

        info!(app = %command.app, requested = command.volume_percent, confirmed, "Volume set");
        Ok(())
    }

    /// Send removals then additions since the last snapshot
    async fn sync_diff(&mut self) -> Result<(), TransportError> {
        let current = match self.mixer.list_apps().await {
            Ok(apps) => KnownAppsSnapshot::from_records(apps),
            Err(e) => {
                warn!(mixer = self.mixer.name(), error = %e, "Could not list apps, skipping diff");
                return Ok(());
            }
        };

        let diff = self.tracker.diff(&current);
        if diff.is_empty() {
            return Ok(());
        }

        // Retained apps keep the record the device was sent
        let mut next = KnownAppsSnapshot::new();
        for record in self.tracker.snapshot().records() {
            if current.contains(&record.key()) {
                next.insert(record.clone());
            }
        }

        for record in &diff.removed {
            self.emit_removal(record).await?;
        }
        for record in &diff.added {
            if self.emit_app(AppSequenceKind::New, record).await? {
                next.insert(record.clone());
            }
        }

        info!(removed = diff.removed.len(), added = diff.added.len(), "App diff sent");
        self.tracker.replace(next);
        Ok(())
    }
}

fn log_diagnostic(text: &str) {
    if !text.is_empty() {
        info!(target: "device", "{text}");
    }
}
