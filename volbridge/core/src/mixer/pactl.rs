//! PulseAudio / PipeWire Mixer
//!
//! Drives sink inputs (per-application playback streams) through the `pactl`
//! command-line tool, which works against both PulseAudio and
//! `pipewire-pulse`.
//!
//! - list: `pactl -f json list sink-inputs`
//! - set:  `pactl set-sink-input-volume <index> <n>%`
//!
//! An app with several streams is set as a whole; its reported volume is the
//! first stream's.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::traits::{AudioMixer, MixerError};
use crate::apps::{wire_name, AppKey, AppRecord};

/// Default program name
const PACTL: &str = "pactl";

/// Properties checked, in order, for the app's process name
const NAME_PROPERTIES: [&str; 2] = ["application.process.binary", "application.name"];

#[derive(Debug, Deserialize)]
struct RawSinkInput {
    index: u32,
    #[serde(default)]
    volume: BTreeMap<String, RawChannelVolume>,
    #[serde(default)]
    properties: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawChannelVolume {
    value_percent: String,
}

/// One playback stream as reported by `pactl`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkInput {
    /// Sink input index
    pub index: u32,
    /// Raw process name
    pub process_name: String,
    /// Average channel volume in percent (may exceed 100)
    pub volume_percent: u32,
    /// Owning process id, if reported
    pub pid: Option<u32>,
}

impl SinkInput {
    /// Normalized identity
    #[must_use]
    pub fn key(&self) -> AppKey {
        AppKey::new(&wire_name(&self.process_name))
    }
}

fn property<'a>(properties: &'a HashMap<String, serde_json::Value>, name: &str) -> Option<&'a str> {
    properties
        .get(name)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_percent(raw: &str) -> Result<u32, MixerError> {
    raw.trim()
        .trim_end_matches('%')
        .trim()
        .parse()
        .map_err(|_| MixerError::Parse(format!("bad volume percentage {raw:?}")))
}

/// Parse `pactl -f json list sink-inputs` output
///
/// Streams without any usable name property are skipped.
///
/// # Errors
///
/// Returns `MixerError::Parse` if the JSON or a volume value is malformed.
pub fn parse_sink_inputs(json: &str) -> Result<Vec<SinkInput>, MixerError> {
    let raw: Vec<RawSinkInput> =
        serde_json::from_str(json).map_err(|e| MixerError::Parse(e.to_string()))?;

    let mut inputs = Vec::with_capacity(raw.len());
    for input in raw {
        let Some(process_name) = NAME_PROPERTIES
            .iter()
            .find_map(|name| property(&input.properties, name))
        else {
            tracing::debug!(index = input.index, "Skipping sink input without a name");
            continue;
        };

        let mut total = 0u32;
        for channel in input.volume.values() {
            total = total.saturating_add(parse_percent(&channel.value_percent)?);
        }
        let channels = u32::try_from(input.volume.len()).unwrap_or(u32::MAX).max(1);
        let volume_percent = total.saturating_add(channels / 2) / channels;

        let pid = property(&input.properties, "application.process.id").and_then(|p| p.parse().ok());

        inputs.push(SinkInput {
            index: input.index,
            process_name: process_name.to_string(),
            volume_percent,
            pid,
        });
    }
    Ok(inputs)
}

/// Mixer backed by the `pactl` tool
#[derive(Clone, Debug)]
pub struct PactlMixer {
    program: PathBuf,
}

impl Default for PactlMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl PactlMixer {
    /// Use `pactl` from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(PACTL)
    }

    /// Use a specific `pactl` binary
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, MixerError> {
        let output = Command::new(&self.program).args(args).output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MixerError::Command(format!(
                "{} {} exited with {}: {}",
                self.program.display(),
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Current sink inputs
    pub async fn sink_inputs(&self) -> Result<Vec<SinkInput>, MixerError> {
        let json = self.run(&["-f", "json", "list", "sink-inputs"]).await?;
        parse_sink_inputs(&json)
    }

    async fn matching(&self, app: &AppKey) -> Result<Vec<SinkInput>, MixerError> {
        let matching: Vec<_> = self
            .sink_inputs()
            .await?
            .into_iter()
            .filter(|input| &input.key() == app)
            .collect();
        if matching.is_empty() {
            return Err(MixerError::NotFound(app.clone()));
        }
        Ok(matching)
    }
}

/// Executable behind a process id (Linux `/proc`)
async fn executable_for(pid: u32) -> Option<PathBuf> {
    tokio::fs::read_link(format!("/proc/{pid}/exe")).await.ok()
}

#[async_trait]
impl AudioMixer for PactlMixer {
    async fn list_apps(&self) -> Result<Vec<AppRecord>, MixerError> {
        let mut apps = Vec::new();
        for input in self.sink_inputs().await? {
            let volume = u8::try_from(input.volume_percent).unwrap_or(u8::MAX);
            let mut record = AppRecord::from_process(&input.process_name, volume);
            if let Some(pid) = input.pid {
                record.executable = executable_for(pid).await;
            }
            apps.push(record);
        }
        Ok(apps)
    }

    async fn set_volume(&self, app: &AppKey, volume_percent: u8) -> Result<(), MixerError> {
        let level = format!("{volume_percent}%");
        for input in self.matching(app).await? {
            let index = input.index.to_string();
            self.run(&["set-sink-input-volume", &index, &level]).await?;
            tracing::debug!(app = %app, index = input.index, volume = volume_percent, "Sink input volume set");
        }
        Ok(())
    }

    async fn volume(&self, app: &AppKey) -> Result<u8, MixerError> {
        let inputs = self.matching(app).await?;
        let volume = inputs[0].volume_percent.min(100);
        Ok(u8::try_from(volume).unwrap_or(100))
    }

    fn name(&self) -> &str {
        "pactl"
    }
}
