//! Bridge configuration: TOML file with serde defaults, then CLI overrides.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use hid_relay_proto::Grammar;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{BridgeError, Result};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "hid-relay.toml";

/// Command grammar, as spelled in config and on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GrammarConfig {
    #[default]
    Current,
    Legacy,
}

impl From<GrammarConfig> for Grammar {
    fn from(g: GrammarConfig) -> Self {
        match g {
            GrammarConfig::Current => Grammar::Current,
            GrammarConfig::Legacy => Grammar::Legacy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// HTTP listen address.
    pub listen: SocketAddr,
    /// Grammar the device firmware was built for.
    pub grammar: GrammarConfig,
    pub serial: SerialConfig,
    /// Directory holding an `index.html` that replaces the built-in page.
    pub static_dir: Option<PathBuf>,
    pub video: VideoConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 5000)),
            grammar: GrammarConfig::default(),
            serial: SerialConfig::default(),
            static_dir: None,
            video: VideoConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial device path.
    pub port: String,
    pub baud_rate: u32,
    /// Write timeout of the port.
    pub timeout_ms: u64,
    /// Pending writes queued to the writer thread before requests wait.
    pub queue_depth: usize,
    /// Log lines instead of opening the port.
    pub dry_run: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/serial0".into(),
            baud_rate: 115_200,
            timeout_ms: 1000,
            queue_depth: 32,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub enabled: bool,
    /// Capture program; must write concatenated JPEG frames to stdout.
    pub command: String,
    pub args: Vec<String>,
    /// Multipart boundary of the `/video_feed` stream.
    pub boundary: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        // Flag/value pairs
        #[rustfmt::skip]
        let args = [
            "-loglevel", "error",
            "-f", "v4l2",
            "-input_format", "mjpeg",
            "-video_size", "1280x720",
            "-framerate", "15",
            "-i", "/dev/video0",
            "-c:v", "copy",
            "-f", "mjpeg",
            "pipe:1",
        ];
        Self {
            enabled: true,
            command: "ffmpeg".into(),
            args: args.into_iter().map(String::from).collect(),
            boundary: "frame".into(),
        }
    }
}

/// Command-line overrides, applied on top of the config file.
#[derive(Debug, Default, clap::Args)]
pub struct Overrides {
    /// HTTP listen address (e.g. 0.0.0.0:5000).
    #[arg(long)]
    pub listen: Option<SocketAddr>,

    /// Serial device path.
    #[arg(long)]
    pub port: Option<String>,

    /// Serial baud rate.
    #[arg(long)]
    pub baud: Option<u32>,

    /// Command grammar the device speaks.
    #[arg(long, value_enum)]
    pub grammar: Option<GrammarConfig>,

    /// Log command lines instead of writing to the serial port.
    #[arg(long)]
    pub dry_run: bool,

    /// Directory with an index.html to serve instead of the built-in page.
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Disable the /video_feed route.
    #[arg(long)]
    pub no_video: bool,
}

impl BridgeConfig {
    /// Apply command-line overrides.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(listen) = overrides.listen {
            self.listen = listen;
        }
        if let Some(port) = &overrides.port {
            self.serial.port.clone_from(port);
        }
        if let Some(baud) = overrides.baud {
            self.serial.baud_rate = baud;
        }
        if let Some(grammar) = overrides.grammar {
            self.grammar = grammar;
        }
        if overrides.dry_run {
            self.serial.dry_run = true;
        }
        if let Some(dir) = &overrides.static_dir {
            self.static_dir = Some(dir.clone());
        }
        if overrides.no_video {
            self.video.enabled = false;
        }
    }

    /// Reject values the bridge cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.serial.baud_rate == 0 {
            return Err(BridgeError::Config("serial.baud_rate must be > 0".into()));
        }
        if self.serial.queue_depth == 0 {
            return Err(BridgeError::Config("serial.queue_depth must be > 0".into()));
        }
        if self.video.enabled {
            let boundary = &self.video.boundary;
            if boundary.is_empty() || boundary.contains(['\r', '\n']) {
                return Err(BridgeError::Config(
                    "video.boundary must be a non-empty single line".into(),
                ));
            }
            if self.video.command.is_empty() {
                return Err(BridgeError::Config("video.command is empty".into()));
            }
        }
        Ok(())
    }
}

/// Load config from a specific TOML file path.
///
/// Missing fields take their defaults.
pub fn load_from_path(path: &Path) -> Result<BridgeConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| BridgeError::Config(format!("failed to read {}: {e}", path.display())))?;

    let config: BridgeConfig = toml::from_str(&content)
        .map_err(|e| BridgeError::Config(format!("failed to parse TOML: {e}")))?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from `path`, or from [`DEFAULT_CONFIG_PATH`] if it exists.
///
/// An explicit path must exist. Without one, a missing default file means
/// built-in defaults.
pub fn load(path: Option<&Path>) -> Result<BridgeConfig> {
    match path {
        Some(path) => load_from_path(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                load_from_path(default)
            } else {
                Ok(BridgeConfig::default())
            }
        }
    }
}
