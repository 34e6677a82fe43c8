//! TOML Configuration File Support
//!
//! Loads bridge settings from `~/.config/volbridge/volbridge.toml`.
//!
//! # Configuration Priority
//!
//! Highest first:
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables (`VOLBRIDGE_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [transport]
//! endpoint = "/dev/ttyACM0"      # or "tcp://host:port", "unix:///path"
//! connect_timeout_ms = 5000
//! reconnect_delay_ms = 2000
//! chunk_size = 256
//! chunk_delay_ms = 10
//!
//! [protocol]
//! diff_interval_ms = 2000
//! # handshake_timeout_ms = 30000   # unset: wait for the device forever
//!
//! [mixer]
//! backend = "pactl"              # or "static"
//!
//! [[mixer.apps]]                 # only used by the static backend
//! name = "Spotify.exe"
//! volume = 40
//!
//! [icons]
//! dir = "/usr/share/volbridge/icons"
//! placeholder = true
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::apps::AppRecord;
use crate::protocol::ProtocolConfig;
use crate::transport::chunked::MAX_CHUNK_SIZE;
use crate::transport::{Endpoint, TransportConfig};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the configuration last got a value from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Which mixer implementation the daemon drives
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixerBackend {
    /// PulseAudio / PipeWire through `pactl`
    #[default]
    Pactl,
    /// Fixed app list from the config file
    Static,
}

impl FromStr for MixerBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pactl" | "pulse" | "pipewire" => Ok(Self::Pactl),
            "static" | "memory" => Ok(Self::Static),
            other => Err(ConfigError::ValidationError(format!(
                "unknown mixer backend {other:?} (expected 'pactl' or 'static')"
            ))),
        }
    }
}

impl fmt::Display for MixerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pactl => write!(f, "pactl"),
            Self::Static => write!(f, "static"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Transport section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportToml {
    /// Device endpoint string
    pub endpoint: Option<String>,

    /// Connection timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,

    /// Delay between reconnection attempts in milliseconds
    pub reconnect_delay_ms: Option<u64>,

    /// Icon payload chunk size in bytes
    pub chunk_size: Option<usize>,

    /// Pause between chunks in milliseconds
    pub chunk_delay_ms: Option<u64>,
}

/// Protocol section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolToml {
    /// Period between presence diffs in milliseconds
    pub diff_interval_ms: Option<u64>,

    /// Handshake timeout in milliseconds (absent = wait forever)
    pub handshake_timeout_ms: Option<u64>,
}

/// A fixed app for the static mixer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaticAppToml {
    /// Process name
    pub name: String,

    /// Initial volume in percent
    #[serde(default = "default_static_volume")]
    pub volume: u8,

    /// Executable path, used for icon lookup
    pub executable: Option<PathBuf>,
}

fn default_static_volume() -> u8 {
    50
}

/// Mixer section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerToml {
    /// Backend name
    pub backend: Option<String>,

    /// `pactl` binary to run
    pub pactl_program: Option<PathBuf>,

    /// Apps for the static backend
    pub apps: Vec<StaticAppToml>,
}

/// Icons section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IconsToml {
    /// Directory of `.ppm` / `.pgm` icons
    pub dir: Option<PathBuf>,

    /// Fall back to generated tiles when no icon file exists
    pub placeholder: Option<bool>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeToml {
    /// Transport configuration section
    pub transport: TransportToml,

    /// Protocol configuration section
    pub protocol: ProtocolToml,

    /// Mixer configuration section
    pub mixer: MixerToml,

    /// Icon configuration section
    pub icons: IconsToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved bridge configuration
///
/// Use [`load_config`] to build one with proper priority handling.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Transport configuration
    pub transport: TransportConfig,

    /// Protocol timing
    pub protocol: ProtocolConfig,

    /// Mixer backend
    pub mixer: MixerBackend,

    /// `pactl` binary for the pactl backend
    pub pactl_program: Option<PathBuf>,

    /// Apps reported by the static backend
    pub static_apps: Vec<AppRecord>,

    /// Icon directory
    pub icon_dir: Option<PathBuf>,

    /// Whether generated placeholder icons are used as a fallback
    pub placeholder_icons: bool,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            protocol: ProtocolConfig::default(),
            mixer: MixerBackend::default(),
            pactl_program: None,
            static_apps: Vec::new(),
            icon_dir: None,
            placeholder_icons: true,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl BridgeConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the most recently applied value came from
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let chunk = self.transport.chunk_size;
        if chunk == 0 || chunk > MAX_CHUNK_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "chunk_size must be between 1 and {MAX_CHUNK_SIZE}, got {chunk}"
            )));
        }
        if self.protocol.diff_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "diff_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.protocol.handshake_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError(
                "handshake_timeout_ms must be greater than 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/volbridge/volbridge.toml` or
/// `~/.config/volbridge/volbridge.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("volbridge").join("volbridge.toml"))
}

/// Load configuration from the default path, environment and defaults
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resulting values are invalid. A missing file is not an error.
pub fn load_config() -> Result<BridgeConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a value is
/// invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<BridgeConfig, ConfigError> {
    let mut config = BridgeConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: BridgeToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(path = %config_path.display(), "Loaded configuration from file");
        } else {
            tracing::debug!(path = %config_path.display(), "Config file not found, using defaults");
        }
    }

    apply_env_config(&mut config)?;
    config.validate()?;

    Ok(config)
}

fn parse_endpoint(raw: &str) -> Result<Endpoint, ConfigError> {
    raw.parse()
        .map_err(|e: String| ConfigError::ValidationError(format!("endpoint: {e}")))
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut BridgeConfig, toml: &BridgeToml) -> Result<(), ConfigError> {
    // Transport
    if let Some(ref endpoint) = toml.transport.endpoint {
        config.transport.endpoint = parse_endpoint(endpoint)?;
    }
    if let Some(timeout) = toml.transport.connect_timeout_ms {
        config.transport.connect_timeout_ms = timeout;
    }
    if let Some(delay) = toml.transport.reconnect_delay_ms {
        config.transport.reconnect_delay_ms = delay;
    }
    if let Some(size) = toml.transport.chunk_size {
        config.transport.chunk_size = size;
    }
    if let Some(delay) = toml.transport.chunk_delay_ms {
        config.transport.chunk_delay_ms = delay;
    }

    // Protocol
    if let Some(interval) = toml.protocol.diff_interval_ms {
        config.protocol.diff_interval_ms = interval;
    }
    if toml.protocol.handshake_timeout_ms.is_some() {
        config.protocol.handshake_timeout_ms = toml.protocol.handshake_timeout_ms;
    }

    // Mixer
    if let Some(ref backend) = toml.mixer.backend {
        config.mixer = backend.parse()?;
    }
    if toml.mixer.pactl_program.is_some() {
        config.pactl_program = toml.mixer.pactl_program.clone();
    }
    config.static_apps = toml
        .mixer
        .apps
        .iter()
        .map(|app| {
            let record = AppRecord::from_process(&app.name, app.volume);
            match app.executable {
                Some(ref exe) => record.with_executable(exe),
                None => record,
            }
        })
        .collect();

    // Icons
    if toml.icons.dir.is_some() {
        config.icon_dir = toml.icons.dir.clone();
    }
    if let Some(placeholder) = toml.icons.placeholder {
        config.placeholder_icons = placeholder;
    }

    Ok(())
}

/// Parse a numeric environment variable, warning on garbage
fn env_number<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Ignoring non-numeric environment value");
            None
        }
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut BridgeConfig) -> Result<(), ConfigError> {
    if let Ok(endpoint) = std::env::var("VOLBRIDGE_ENDPOINT") {
        config.transport.endpoint = parse_endpoint(&endpoint)?;
        config.source = ConfigSource::Env;
    }
    if let Some(size) = env_number("VOLBRIDGE_CHUNK_SIZE") {
        config.transport.chunk_size = size;
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = env_number("VOLBRIDGE_CHUNK_DELAY_MS") {
        config.transport.chunk_delay_ms = ms;
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = env_number("VOLBRIDGE_RECONNECT_DELAY_MS") {
        config.transport.reconnect_delay_ms = ms;
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = env_number("VOLBRIDGE_DIFF_INTERVAL_MS") {
        config.protocol.diff_interval_ms = ms;
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = env_number("VOLBRIDGE_HANDSHAKE_TIMEOUT_MS") {
        config.protocol.handshake_timeout_ms = Some(ms);
        config.source = ConfigSource::Env;
    }
    if let Ok(backend) = std::env::var("VOLBRIDGE_MIXER") {
        config.mixer = backend.parse()?;
        config.source = ConfigSource::Env;
    }
    if let Ok(dir) = std::env::var("VOLBRIDGE_ICON_DIR") {
        config.icon_dir = Some(PathBuf::from(dir));
        config.source = ConfigSource::Env;
    }
    Ok(())
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Endpoint override
    pub endpoint: Option<Endpoint>,

    /// Mixer backend override
    pub mixer: Option<MixerBackend>,

    /// Icon directory override
    pub icon_dir: Option<PathBuf>,

    /// Chunk size override
    pub chunk_size: Option<usize>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set endpoint override
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set mixer backend override
    #[must_use]
    pub fn with_mixer(mut self, mixer: MixerBackend) -> Self {
        self.mixer = Some(mixer);
        self
    }

    /// Set icon directory override
    #[must_use]
    pub fn with_icon_dir(mut self, dir: PathBuf) -> Self {
        self.icon_dir = Some(dir);
        self
    }

    /// Set chunk size override
    #[must_use]
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the result is invalid.
    pub fn apply(&self, config: &mut BridgeConfig) -> Result<(), ConfigError> {
        if self.endpoint.is_some()
            || self.mixer.is_some()
            || self.icon_dir.is_some()
            || self.chunk_size.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref endpoint) = self.endpoint {
            config.transport.endpoint = endpoint.clone();
        }
        if let Some(mixer) = self.mixer {
            config.mixer = mixer;
        }
        if let Some(ref dir) = self.icon_dir {
            config.icon_dir = Some(dir.clone());
        }
        if let Some(size) = self.chunk_size {
            config.transport.chunk_size = size;
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Serializes tests that read or write `VOLBRIDGE_*` variables
    static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

    const ENV_VARS: [&str; 8] = [
        "VOLBRIDGE_ENDPOINT",
        "VOLBRIDGE_CHUNK_SIZE",
        "VOLBRIDGE_CHUNK_DELAY_MS",
        "VOLBRIDGE_RECONNECT_DELAY_MS",
        "VOLBRIDGE_DIFF_INTERVAL_MS",
        "VOLBRIDGE_HANDSHAKE_TIMEOUT_MS",
        "VOLBRIDGE_MIXER",
        "VOLBRIDGE_ICON_DIR",
    ];

    fn clear_config_env_vars() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();

        assert_eq!(config.transport.chunk_size, 256);
        assert_eq!(config.transport.chunk_delay_ms, 10);
        assert_eq!(config.transport.reconnect_delay_ms, 2000);
        assert_eq!(config.protocol.diff_interval_ms, 2000);
        assert_eq!(config.protocol.handshake_timeout_ms, None);
        assert_eq!(config.mixer, MixerBackend::Pactl);
        assert!(config.placeholder_icons);
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.ends_with("volbridge/volbridge.toml"));
        }
    }

    #[test]
    fn test_parse_full_toml() {
        let _guard = ENV_LOCK.lock();
        clear_config_env_vars();

        let file = write_config(
            r#"
[transport]
endpoint = "tcp://10.0.0.5:7000"
connect_timeout_ms = 1500
reconnect_delay_ms = 500
chunk_size = 512
chunk_delay_ms = 0

[protocol]
diff_interval_ms = 1000
handshake_timeout_ms = 30000

[mixer]
backend = "static"

[[mixer.apps]]
name = "Spotify.exe"
volume = 40

[[mixer.apps]]
name = "game"
executable = "/opt/game/bin/game"

[icons]
dir = "/tmp/icons"
placeholder = false
"#,
        );

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(
            config.transport.endpoint,
            Endpoint::Tcp {
                addr: "10.0.0.5:7000".to_string()
            }
        );
        assert_eq!(config.transport.connect_timeout_ms, 1500);
        assert_eq!(config.transport.reconnect_delay_ms, 500);
        assert_eq!(config.transport.chunk_size, 512);
        assert_eq!(config.transport.chunk_delay_ms, 0);
        assert_eq!(config.protocol.diff_interval_ms, 1000);
        assert_eq!(config.protocol.handshake_timeout_ms, Some(30000));
        assert_eq!(config.mixer, MixerBackend::Static);
        assert_eq!(config.static_apps.len(), 2);
        assert_eq!(config.static_apps[0].name, "Spotify");
        assert_eq!(config.static_apps[0].volume_percent, 40);
        assert_eq!(config.static_apps[1].volume_percent, 50);
        assert_eq!(
            config.static_apps[1].executable,
            Some(PathBuf::from("/opt/game/bin/game"))
        );
        assert_eq!(config.icon_dir, Some(PathBuf::from("/tmp/icons")));
        assert!(!config.placeholder_icons);
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path, Some(file.path().to_path_buf()));
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        let _guard = ENV_LOCK.lock();
        clear_config_env_vars();

        let file = write_config("[protocol]\ndiff_interval_ms = 500\n");
        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.protocol.diff_interval_ms, 500);
        assert_eq!(config.transport.chunk_size, 256);
        assert_eq!(config.mixer, MixerBackend::Pactl);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let _guard = ENV_LOCK.lock();
        clear_config_env_vars();

        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_path(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_invalid_toml() {
        let _guard = ENV_LOCK.lock();
        clear_config_env_vars();

        let file = write_config("[transport\nchunk_size = ");
        assert!(matches!(
            load_config_from_path(Some(file.path().to_path_buf())),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let _guard = ENV_LOCK.lock();
        clear_config_env_vars();

        for content in [
            "[transport]\nchunk_size = 0\n",
            "[transport]\nchunk_size = 5000\n",
            "[protocol]\ndiff_interval_ms = 0\n",
            "[mixer]\nbackend = \"alsa\"\n",
            "[transport]\nendpoint = \"tcp://nohost\"\n",
        ] {
            let file = write_config(content);
            assert!(
                matches!(
                    load_config_from_path(Some(file.path().to_path_buf())),
                    Err(ConfigError::ValidationError(_))
                ),
                "{content}"
            );
        }
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = ENV_LOCK.lock();
        clear_config_env_vars();

        let file = write_config("[transport]\nchunk_size = 128\nchunk_delay_ms = 5\n");
        std::env::set_var("VOLBRIDGE_CHUNK_SIZE", "64");
        std::env::set_var("VOLBRIDGE_MIXER", "static");
        std::env::set_var("VOLBRIDGE_HANDSHAKE_TIMEOUT_MS", "not-a-number");

        let config = load_config_from_path(Some(file.path().to_path_buf()));
        clear_config_env_vars();
        let config = config.unwrap();

        assert_eq!(config.transport.chunk_size, 64);
        assert_eq!(config.transport.chunk_delay_ms, 5);
        assert_eq!(config.mixer, MixerBackend::Static);
        assert_eq!(config.protocol.handshake_timeout_ms, None);
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = BridgeConfig::default();
        ConfigOverrides::new()
            .with_endpoint("tcp://127.0.0.1:9000".parse().unwrap())
            .with_mixer(MixerBackend::Static)
            .with_chunk_size(1024)
            .with_icon_dir(PathBuf::from("/icons"))
            .apply(&mut config)
            .unwrap();

        assert_eq!(config.transport.chunk_size, 1024);
        assert_eq!(config.mixer, MixerBackend::Static);
        assert_eq!(config.icon_dir, Some(PathBuf::from("/icons")));
        assert_eq!(config.transport.endpoint.to_string(), "tcp://127.0.0.1:9000");
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_cli_override_is_validated() {
        let mut config = BridgeConfig::default();
        let result = ConfigOverrides::new().with_chunk_size(0).apply(&mut config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut config = BridgeConfig::default();
        ConfigOverrides::new().apply(&mut config).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_mixer_backend_names() {
        assert_eq!("PipeWire".parse::<MixerBackend>().unwrap(), MixerBackend::Pactl);
        assert_eq!("static".parse::<MixerBackend>().unwrap(), MixerBackend::Static);
        assert_eq!(MixerBackend::Static.to_string(), "static");
    }
}
