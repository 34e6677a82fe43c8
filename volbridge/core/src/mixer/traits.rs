//! Mixer Traits
//!
//! Trait definition for audio mixers. Implementations report errors as
//! [`MixerError`] kinds so the controller can tell "no such app" apart from
//! a broken backend; neither is fatal to the device connection.

use async_trait::async_trait;
use thiserror::Error;

use crate::apps::{AppKey, AppRecord};

/// Errors reported by mixer backends
#[derive(Debug, Error)]
pub enum MixerError {
    /// No audio session matches the app
    #[error("No audio session for app '{0}'")]
    NotFound(AppKey),

    /// The backend command failed
    #[error("Mixer command failed: {0}")]
    Command(String),

    /// The backend produced output we could not understand
    #[error("Unexpected mixer output: {0}")]
    Parse(String),

    /// IO error talking to the backend
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Host audio mixer
#[async_trait]
pub trait AudioMixer: Send + Sync {
    /// Apps currently producing audio, with their volumes
    ///
    /// Names are raw process names converted with [`AppRecord::from_process`];
    /// duplicates are allowed and resolved by the snapshot.
    async fn list_apps(&self) -> Result<Vec<AppRecord>, MixerError>;

    /// Set an app's volume in percent
    async fn set_volume(&self, app: &AppKey, volume_percent: u8) -> Result<(), MixerError>;

    /// Read an app's current volume in percent
    async fn volume(&self, app: &AppKey) -> Result<u8, MixerError>;

    /// Backend name, for logs
    fn name(&self) -> &str;
}
