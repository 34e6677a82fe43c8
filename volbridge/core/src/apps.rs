//! App State Tracking
//!
//! Keeps the last-known set of audio-producing apps (what the device is
//! currently displaying) and computes presence diffs against the set the
//! mixer reports now.
//!
//! # Naming
//!
//! Each app has two names:
//! - the *wire name* ([`AppRecord::name`]): the process name with trailing
//!   `.exe` suffixes removed and its case preserved. This is what the device
//!   shows and what it sends back in volume commands.
//! - the *key* ([`AppKey`]): the wire name, lowercased. All lookups go
//!   through the key so `"App.exe"`, `"app"` and `"APP"` are one app.
//!
//! # Diffing
//!
//! Only presence is diffed. An app whose volume changed out-of-band but is
//! present in both sets produces no notification; volumes reach the device
//! through full syncs and command echoes only.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Executable suffix stripped from process names
const EXECUTABLE_SUFFIX: &str = ".exe";

/// Largest volume percentage on the wire
pub const MAX_VOLUME_PERCENT: u8 = 100;

/// Strip trailing executable suffixes, ignoring case
///
/// Repeated suffixes are all removed so the result is a fixed point:
/// stripping a wire name again never changes it.
fn strip_executable_suffix(name: &str) -> &str {
    let mut trimmed = name.trim();
    loop {
        let split = trimmed.len().saturating_sub(EXECUTABLE_SUFFIX.len());
        match (trimmed.get(..split), trimmed.get(split..)) {
            (Some(stem), Some(suffix)) if suffix.eq_ignore_ascii_case(EXECUTABLE_SUFFIX) => {
                trimmed = stem.trim();
            }
            _ => return trimmed,
        }
    }
}

/// Convert a raw process name into the name sent to the device
///
/// Strips the executable suffix and replaces characters that would break
/// line framing or command parsing (`,`, `\r`, `\n`) with spaces.
#[must_use]
pub fn wire_name(process_name: &str) -> String {
    strip_executable_suffix(process_name)
        .chars()
        .map(|c| if c == ',' || c == '\r' || c == '\n' { ' ' } else { c })
        .collect()
}

/// Normalized app identity used for all comparisons and lookups
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppKey(String);

impl AppKey {
    /// Normalize a process name, wire name, or device-supplied name
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(strip_executable_suffix(name).to_lowercase())
    }

    /// The normalized form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether normalization left nothing behind
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AppKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One audio-producing app as known to the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppRecord {
    /// Wire name (suffix stripped, case preserved)
    pub name: String,
    /// Volume in percent, `0..=100`
    pub volume_percent: u8,
    /// Path to the app's executable, if the mixer knows it (host-only)
    pub executable: Option<PathBuf>,
}

impl AppRecord {
    /// Build a record from a raw process name as reported by a mixer
    ///
    /// Volumes above 100 (e.g. software boost) are clamped.
    pub fn from_process(process_name: &str, volume_percent: u8) -> Self {
        Self {
            name: wire_name(process_name),
            volume_percent: volume_percent.min(MAX_VOLUME_PERCENT),
            executable: None,
        }
    }

    /// Attach the executable path
    #[must_use]
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Normalized identity of this record
    #[must_use]
    pub fn key(&self) -> AppKey {
        AppKey::new(&self.name)
    }
}

/// Presence changes between two snapshots
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppDiff {
    /// Apps in the previous snapshot but not in the current set
    pub removed: Vec<AppRecord>,
    /// Apps in the current set but not in the previous snapshot
    pub added: Vec<AppRecord>,
}

impl AppDiff {
    /// True when nothing appeared or disappeared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Mapping from normalized key to record, ordered by key
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KnownAppsSnapshot {
    apps: BTreeMap<AppKey, AppRecord>,
}

impl KnownAppsSnapshot {
    /// Empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from mixer output
    ///
    /// When several sessions normalize to the same key (an app with more
    /// than one audio stream) the first one reported wins. Records whose
    /// name normalizes to nothing are dropped.
    pub fn from_records(records: impl IntoIterator<Item = AppRecord>) -> Self {
        let mut snapshot = Self::new();
        for record in records {
            let key = record.key();
            if key.is_empty() {
                tracing::debug!(name = %record.name, "Ignoring app with empty name");
                continue;
            }
            snapshot.apps.entry(key).or_insert(record);
        }
        snapshot
    }

    /// Insert or replace a record
    pub fn insert(&mut self, record: AppRecord) {
        self.apps.insert(record.key(), record);
    }

    /// Remove a record by key
    pub fn remove(&mut self, key: &AppKey) -> Option<AppRecord> {
        self.apps.remove(key)
    }

    /// Look up a record
    #[must_use]
    pub fn get(&self, key: &AppKey) -> Option<&AppRecord> {
        self.apps.get(key)
    }

    /// Whether the key is present
    #[must_use]
    pub fn contains(&self, key: &AppKey) -> bool {
        self.apps.contains_key(key)
    }

    /// Number of apps
    #[must_use]
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Whether the snapshot holds no apps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Records in key order
    pub fn records(&self) -> impl Iterator<Item = &AppRecord> {
        self.apps.values()
    }

    /// Keys in order
    pub fn keys(&self) -> impl Iterator<Item = &AppKey> {
        self.apps.keys()
    }

    /// Compute which apps disappeared and appeared relative to `current`
    ///
    /// Both lists are in key order.
    #[must_use]
    pub fn diff(&self, current: &KnownAppsSnapshot) -> AppDiff {
        let removed = self
            .apps
            .iter()
            .filter(|(key, _)| !current.apps.contains_key(*key))
            .map(|(_, record)| record.clone())
            .collect();
        let added = current
            .apps
            .iter()
            .filter(|(key, _)| !self.apps.contains_key(*key))
            .map(|(_, record)| record.clone())
            .collect();
        AppDiff { removed, added }
    }
}

/// Owner of the known-apps snapshot for one device connection
///
/// The snapshot is only ever swapped as a whole via [`AppTracker::replace`];
/// volume confirmations are the one in-place update.
#[derive(Debug, Default)]
pub struct AppTracker {
    snapshot: KnownAppsSnapshot,
}

impl AppTracker {
    /// Tracker with an empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot
    #[must_use]
    pub fn snapshot(&self) -> &KnownAppsSnapshot {
        &self.snapshot
    }

    /// Diff the snapshot against the set the mixer reports now
    #[must_use]
    pub fn diff(&self, current: &KnownAppsSnapshot) -> AppDiff {
        self.snapshot.diff(current)
    }

    /// Atomically install a new snapshot, returning the old one
    pub fn replace(&mut self, snapshot: KnownAppsSnapshot) -> KnownAppsSnapshot {
        std::mem::replace(&mut self.snapshot, snapshot)
    }

    /// Record a volume the mixer confirmed for a known app
    ///
    /// Returns `false` if the app is not in the snapshot.
    pub fn confirm_volume(&mut self, key: &AppKey, volume_percent: u8) -> bool {
        match self.snapshot.apps.get_mut(key) {
            Some(record) => {
                record.volume_percent = volume_percent.min(MAX_VOLUME_PERCENT);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot(entries: &[(&str, u8)]) -> KnownAppsSnapshot {
        KnownAppsSnapshot::from_records(
            entries
                .iter()
                .map(|(name, volume)| AppRecord::from_process(name, *volume)),
        )
    }

    fn names(records: &[AppRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(AppKey::new("App.exe"), AppKey::new("app"));
        assert_eq!(AppKey::new("APP"), AppKey::new("app"));
        assert_eq!(AppKey::new("App.EXE"), AppKey::new("APP"));
        assert_eq!(AppKey::new("  app.exe "), AppKey::new("app"));
        assert_eq!(AppKey::new("app").as_str(), "app");
    }

    #[test]
    fn test_key_only_strips_trailing_suffix() {
        assert_eq!(AppKey::new("exe.helper").as_str(), "exe.helper");
        assert_eq!(AppKey::new("my.exe.exe").as_str(), "my");
        assert!(AppKey::new(".exe").is_empty());
        assert!(AppKey::new(".EXE.exe").is_empty());
    }

    #[test]
    fn test_record_key_matches_raw_process_key() {
        for raw in ["my.exe.exe", "Tool.EXE .exe", "plain", "x.exe.helper"] {
            let record = AppRecord::from_process(raw, 10);
            assert_eq!(record.key(), AppKey::new(raw), "{raw}");
            // The device echoes the wire name; it must map back to the same app
            assert_eq!(AppKey::new(&record.name), record.key(), "{raw}");
        }
        assert_eq!(AppRecord::from_process("my.exe.exe", 10).name, "my");
    }

    #[test]
    fn test_wire_name_keeps_case() {
        assert_eq!(wire_name("Spotify.exe"), "Spotify");
        assert_eq!(wire_name("firefox"), "firefox");
        assert_eq!(wire_name("Voice,Chat.EXE"), "Voice Chat");
        assert_eq!(wire_name("bad\nname"), "bad name");
    }

    #[test]
    fn test_record_key_matches_device_spelling() {
        let record = AppRecord::from_process("Discord.exe", 40);
        assert_eq!(record.name, "Discord");
        assert_eq!(record.key(), AppKey::new("DISCORD"));
        assert_eq!(record.key(), AppKey::new("discord.exe"));
    }

    #[test]
    fn test_record_volume_clamped() {
        let record = AppRecord::from_process("boosted", 150);
        assert_eq!(record.volume_percent, 100);
    }

    #[test]
    fn test_snapshot_dedups_by_key_first_wins() {
        let snap = snapshot(&[("Chrome.exe", 20), ("chrome", 90), ("CHROME", 5)]);
        assert_eq!(snap.len(), 1);
        let record = snap.get(&AppKey::new("chrome")).unwrap();
        assert_eq!(record.volume_percent, 20);
        assert_eq!(record.name, "Chrome");
    }

    #[test]
    fn test_snapshot_drops_empty_names() {
        let snap = snapshot(&[(".exe", 20), ("  ", 10), ("ok", 1)]);
        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn test_diff_presence_only() {
        let prev = snapshot(&[("A", 10), ("B", 20)]);
        let now = snapshot(&[("B", 25), ("C", 5)]);

        let diff = prev.diff(&now);
        assert_eq!(names(&diff.removed), vec!["A"]);
        assert_eq!(names(&diff.added), vec!["C"]);
        assert_eq!(diff.added[0].volume_percent, 5);
    }

    #[test]
    fn test_diff_ignores_case_and_suffix() {
        let prev = snapshot(&[("Game.exe", 10)]);
        let now = snapshot(&[("game", 70)]);
        assert!(prev.diff(&now).is_empty());
    }

    #[test]
    fn test_diff_is_ordered_by_key() {
        let prev = KnownAppsSnapshot::new();
        let now = snapshot(&[("zeta", 1), ("Alpha", 2), ("mid", 3)]);
        let diff = prev.diff(&now);
        assert_eq!(names(&diff.added), vec!["Alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_tracker_replace_and_confirm() {
        let mut tracker = AppTracker::new();
        assert!(tracker.snapshot().is_empty());

        let old = tracker.replace(snapshot(&[("player", 30)]));
        assert!(old.is_empty());

        assert!(tracker.confirm_volume(&AppKey::new("Player.exe"), 55));
        assert_eq!(
            tracker
                .snapshot()
                .get(&AppKey::new("player"))
                .unwrap()
                .volume_percent,
            55
        );
        assert!(!tracker.confirm_volume(&AppKey::new("missing"), 10));
    }
}
