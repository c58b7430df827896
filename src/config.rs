use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Name of the config file looked up in the data directory and the working directory.
pub const CONFIG_FILE_NAME: &str = "hbconv.json";

/// Media extensions picked up during discovery when no config overrides them.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ts",
];

/// Marker file that suppresses processing of the files next to it.
pub const DEFAULT_IGNORE_FLAG: &str = ".noconvert";

fn default_analyze_duration() -> u64 {
    100_000_000
}
fn default_probe_size() -> u64 {
    100_000_000
}
fn default_ignore_flag() -> String {
    DEFAULT_IGNORE_FLAG.to_string()
}
fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}
fn default_alternate_extension() -> String {
    "m4v".to_string()
}
fn default_output_subdir() -> String {
    "converted".to_string()
}
fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}
fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

/// Programs used for transcoding and for diagnostic probing.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

/// Application configuration. Every field is optional in the JSON file.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Value passed to `-analyzeduration`.
    #[serde(default = "default_analyze_duration")]
    pub analyze_duration: u64,
    /// Value passed to `-probesize`.
    #[serde(default = "default_probe_size")]
    pub probe_size: u64,
    #[serde(default = "default_ignore_flag")]
    pub ignore_flag: String,
    /// Lowercase media extensions, without the leading dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Extension used by `--force-m4v`.
    #[serde(default = "default_alternate_extension")]
    pub alternate_extension: String,
    /// Directory created under the input root when no output directory is given.
    #[serde(default = "default_output_subdir")]
    pub output_subdir: String,
    #[serde(default)]
    pub tools: ToolPaths,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analyze_duration: default_analyze_duration(),
            probe_size: default_probe_size(),
            ignore_flag: default_ignore_flag(),
            extensions: default_extensions(),
            alternate_extension: default_alternate_extension(),
            output_subdir: default_output_subdir(),
            tools: ToolPaths::default(),
        }
    }
}

impl AppConfig {
    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, `hbconv.json` is looked up in
    /// the user data directory, then the working directory, and the built-in
    /// defaults are used when neither exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::config(path, "file does not exist"));
            }
            return Self::from_file(path);
        }

        let mut tried: Vec<PathBuf> = Vec::new();
        if let Some(mut d) = dirs::data_dir() {
            d.push("hbconv");
            d.push(CONFIG_FILE_NAME);
            tried.push(d);
        }
        tried.push(PathBuf::from(CONFIG_FILE_NAME));

        for p in &tried {
            if p.exists() {
                return Self::from_file(p);
            }
        }

        Ok(Self::default())
    }

    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::config(path, e.to_string()))?;
        let mut cfg: AppConfig =
            serde_json::from_str(&text).map_err(|e| Error::config(path, e.to_string()))?;
        cfg.extensions = cfg
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        tracing::debug!(config = %path.display(), "loaded configuration");
        Ok(cfg)
    }
}
