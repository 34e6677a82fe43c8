//! Volbridge Core - Host Side of the App Volume Display
//!
//! Keeps a small embedded display in sync with the audio applications
//! running on the host. The device shows one tile per app (name, volume,
//! 32x32 icon) and sends back volume changes made on its touch screen.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐        byte stream         ┌──────────┐
//! │ Supervisor                   │  (serial / TCP / socket)   │  Device  │
//! │  └─ ProtocolController ──────┼───────────────────────────▶│ (display)│
//! │       ├─ AppTracker          │◀───────────────────────────┼          │
//! │       ├─ AudioMixer (trait)  │   READY, name,vol, debug   └──────────┘
//! │       └─ IconSource (trait)  │
//! └──────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Supervisor`]: reconnect loop, one session per device link
//! - [`ProtocolController`]: handshake, full sync, diffs and volume commands
//! - [`AudioMixer`]: host mixer seam ([`PactlMixer`], [`InMemoryMixer`])
//! - [`IconSource`]: icon lookup seam, encoded with [`encode_icon`]
//! - [`DeviceLink`]: line framing plus chunked raw payloads
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use volbridge_core::{
//!     load_config, EndpointConnector, PactlMixer, PlaceholderIcons, Supervisor,
//! };
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = load_config().unwrap();
//!     let supervisor = Supervisor::new(
//!         Arc::new(EndpointConnector::new(config.transport.clone())),
//!         Arc::new(PactlMixer::new()),
//!         Arc::new(PlaceholderIcons),
//!         config.protocol.clone(),
//!         config.transport.reconnect_delay(),
//!     );
//!     let (_stop, shutdown) = watch::channel(false);
//!     supervisor.run(shutdown).await;
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod apps;
pub mod config;
pub mod icon;
pub mod mixer;
pub mod protocol;
pub mod supervisor;
pub mod transport;

// App tracking exports
pub use apps::{wire_name, AppDiff, AppKey, AppRecord, AppTracker, KnownAppsSnapshot};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, BridgeConfig, BridgeToml,
    ConfigError, ConfigOverrides, ConfigSource, MixerBackend,
};

// Icon exports
pub use icon::{
    encode_icon, load_icon, IconBitmap, IconChain, IconError, IconSource, PixelFormat,
    PlaceholderIcons, PpmDirectoryIcons, RawImage, ICON_BYTES, ICON_SIZE,
};

// Mixer exports
pub use mixer::{AudioMixer, InMemoryMixer, MixerError, PactlMixer};

// Protocol exports
pub use protocol::{
    CommandError, ConnectionState, DeviceMessage, ProtocolConfig, ProtocolController, SessionEnd,
    VolumeCommand,
};

// Supervisor exports
pub use supervisor::{Supervisor, SupervisorStats};

// Transport exports
pub use transport::{
    ChunkedSender, Connector, DeviceLink, Endpoint, EndpointConnector, TransportConfig,
    TransportError,
};
