use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, ShellError};
use crate::framing::FramingMode;

/// Top-level application configuration, loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub shell: ShellConfig,
}

impl AppConfig {
    /// Load configuration from default path (~/.config/remote-shell/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| ShellError::Config(format!("{}: {e}", path.display())))
    }

    /// Write current configuration to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Write current configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| ShellError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("remote-shell")
            .join("config.toml")
    }
}

/// HTTP/WebSocket server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Enable CORS.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            cors: true,
        }
    }
}

/// Device shell session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Explicit path to the adb executable. When unset, `adb` (or `adb.exe`
    /// on Windows) is resolved through `PATH`.
    pub adb_path: Option<PathBuf>,
    /// Device-side endpoint forwarded before the shell starts.
    pub remote_port: String,
    /// Debounce interval for coalescing terminal output, in milliseconds.
    pub debounce_ms: u64,
    /// Columns used when a start request omits them.
    pub default_cols: u16,
    /// Rows used when a start request omits them.
    pub default_rows: u16,
    /// Value of `TERM` for the spawned process.
    pub term_name: String,
    /// Output framing policy.
    pub framing: FramingPolicy,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            adb_path: None,
            remote_port: "tcp:8886".into(),
            debounce_ms: 5,
            default_cols: 80,
            default_rows: 24,
            term_name: "xterm-256color".into(),
            framing: FramingPolicy::Auto,
        }
    }
}

impl ShellConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Resolve the configured policy into the framing mode used for every session.
    pub fn framing_mode(&self) -> FramingMode {
        match self.framing {
            FramingPolicy::Auto => FramingMode::for_host(),
            FramingPolicy::Binary => FramingMode::Binary,
            FramingPolicy::Text => FramingMode::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum FramingPolicy {
    /// Binary frames everywhere except Windows.
    Auto,
    Binary,
    Text,
}
