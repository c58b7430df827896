//! Error types for hbconv.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors that stop a run before (or instead of) file processing.
///
/// Per-file problems during a batch are not represented here; the
/// orchestrator reports and counts them and moves on to the next file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The preset document does not exist.
    #[error("JSON file '{}' does not exist", path.display())]
    DocumentNotFound { path: PathBuf },

    /// The preset document exists but could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The preset document is not valid JSON.
    #[error("failed to parse '{}' as valid JSON: {source}", path.display())]
    DocumentParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document has no `PresetList` entry to read settings from.
    #[error("document does not contain any preset in PresetList")]
    MissingPreset,

    /// A required external tool is not available.
    #[error("{tool} is required but not installed. Please install {tool}.")]
    ToolNotFound { tool: String },

    /// The configuration file is missing or malformed.
    #[error("config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// The output root could not be created.
    #[error("error creating output directory {}: {source}", path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input root could not be enumerated at all.
    #[error("error accessing directory {}: {message}", path.display())]
    Discovery { path: PathBuf, message: String },

    /// An I/O error occurred, typically while writing the report.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}
