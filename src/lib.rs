//! # hbconv - HandBrake preset to ffmpeg converter
//!
//! `hbconv` reads a saved HandBrake JSON preset, translates it into the
//! equivalent ffmpeg command line, and optionally applies that command to
//! every media file under a directory tree.
//!
//! ## Features
//!
//! - Preset extraction with typed defaults for missing keys
//! - Constant-quality and bitrate targets, two-pass encoding for bitrate targets
//! - Recursive discovery with a per-directory `.noconvert` ignore flag
//! - Output trees that mirror the input tree
//! - Plan, dry-run and execute modes
//!
//! ## Example
//!
//! ```no_run
//! use hbconv::{extract, load_document, translate, CommandBuilder};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = load_document(Path::new("preset.json"))?;
//! let params = translate(&extract(&document)?);
//! let builder = CommandBuilder::new("ffmpeg", 100_000_000, 100_000_000);
//! let plan = builder.plan(Path::new("in.mp4"), Path::new("out.mkv"), &params);
//! println!("{}", plan.render());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod command;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod params;
pub mod preset;
pub mod summary;
pub mod tools;

pub use batch::{Batch, BatchOptions, BatchResult, Mode};
pub use command::{CommandBuilder, EncodePlan, Invocation};
pub use config::AppConfig;
pub use discovery::{discover, should_ignore, DiscoveredFile, Discovery};
pub use error::{Error, Result};
pub use params::{translate, EncodeParameters, QualityArg};
pub use preset::{extract, load_document, QualityMode, Settings};
pub use tools::{ProcessRunner, SystemRunner};
