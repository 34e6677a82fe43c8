//! In-Memory Mixer
//!
//! A mixer whose apps live in process memory. The daemon uses it for the
//! `static` backend (apps listed in the config file) and the tests use it to
//! drive the protocol. Clones share state, so a test can keep a handle and
//! make apps appear or disappear while a controller runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::traits::{AudioMixer, MixerError};
use crate::apps::{AppKey, AppRecord, MAX_VOLUME_PERCENT};

#[derive(Debug)]
struct Inner {
    apps: RwLock<Vec<AppRecord>>,
    volume_cap: RwLock<u8>,
    unavailable: AtomicBool,
}

/// Mixer backed by an in-process list of apps
#[derive(Clone, Debug)]
pub struct InMemoryMixer {
    inner: Arc<Inner>,
}

impl Default for InMemoryMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMixer {
    /// Mixer with no apps
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                apps: RwLock::new(Vec::new()),
                volume_cap: RwLock::new(MAX_VOLUME_PERCENT),
                unavailable: AtomicBool::new(false),
            }),
        }
    }

    /// Mixer preloaded with apps
    pub fn with_apps(apps: impl IntoIterator<Item = AppRecord>) -> Self {
        let mixer = Self::new();
        mixer.inner.apps.write().extend(apps);
        mixer
    }

    /// Clamp every volume write to `cap`, like a mixer with a hardware limit
    #[must_use]
    pub fn with_volume_cap(self, cap: u8) -> Self {
        *self.inner.volume_cap.write() = cap.min(MAX_VOLUME_PERCENT);
        self
    }

    /// Add an app (or another session of an existing app)
    pub fn add_app(&self, record: AppRecord) {
        self.inner.apps.write().push(record);
    }

    /// Remove every session of an app; returns whether any existed
    pub fn remove_app(&self, key: &AppKey) -> bool {
        let mut apps = self.inner.apps.write();
        let before = apps.len();
        apps.retain(|record| &record.key() != key);
        apps.len() != before
    }

    /// Make `list_apps` fail, simulating a mixer that went away
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Current volume of an app without going through the trait
    #[must_use]
    pub fn volume_of(&self, key: &AppKey) -> Option<u8> {
        self.inner
            .apps
            .read()
            .iter()
            .find(|record| &record.key() == key)
            .map(|record| record.volume_percent)
    }
}

#[async_trait]
impl AudioMixer for InMemoryMixer {
    async fn list_apps(&self) -> Result<Vec<AppRecord>, MixerError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(MixerError::Command("mixer unavailable".to_string()));
        }
        Ok(self.inner.apps.read().clone())
    }

    async fn set_volume(&self, app: &AppKey, volume_percent: u8) -> Result<(), MixerError> {
        let applied = volume_percent.min(*self.inner.volume_cap.read());
        let mut apps = self.inner.apps.write();
        let mut found = false;
        for record in apps.iter_mut().filter(|record| &record.key() == app) {
            record.volume_percent = applied;
            found = true;
        }
        if found {
            Ok(())
        } else {
            Err(MixerError::NotFound(app.clone()))
        }
    }

    async fn volume(&self, app: &AppKey) -> Result<u8, MixerError> {
        self.volume_of(app)
            .ok_or_else(|| MixerError::NotFound(app.clone()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
