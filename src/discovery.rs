//! Media file discovery and the per-directory ignore flag.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::{Error, Result};

/// A media file found under the input root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Lowercase extension without the dot.
    pub extension: String,
}

/// Directory walk configuration.
#[derive(Debug, Clone)]
pub struct Discovery {
    root: PathBuf,
    recursive: bool,
    extensions: Vec<String>,
    exclude: Option<PathBuf>,
}

impl Discovery {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
            exclude: None,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Never descend into `dir`, e.g. an output tree below the input root.
    pub fn exclude(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exclude = Some(dir.into());
        self
    }

    /// Walk the root and collect matching regular files.
    ///
    /// Entries below the root that cannot be read are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Discovery`] if the root itself cannot be read.
    pub fn run(&self) -> Result<Vec<DiscoveredFile>> {
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let exclude = self.exclude.as_deref().and_then(|p| p.canonicalize().ok());

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| match &exclude {
                Some(ex) if e.file_type().is_dir() => {
                    e.path().canonicalize().map(|p| &p != ex).unwrap_or(true)
                }
                _ => true,
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(Error::Discovery {
                        path: self.root.clone(),
                        message: err.to_string(),
                    })
                }
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let Some(extension) = lowercase_extension(entry.path()) else {
                continue;
            };
            if self.extensions.iter().any(|e| *e == extension) {
                tracing::debug!(file = %entry.path().display(), "discovered media file");
                files.push(DiscoveredFile {
                    path: entry.into_path(),
                    extension,
                });
            }
        }
        Ok(files)
    }
}

/// Find media files under `root` whose extension is in `extensions`.
pub fn discover(root: &Path, recursive: bool, extensions: &[String]) -> Result<Vec<DiscoveredFile>> {
    Discovery::new(root, extensions).recursive(recursive).run()
}

/// True iff a file named `ignore_flag` sits next to `file`.
pub fn should_ignore(file: &Path, ignore_flag: &str) -> bool {
    let dir = file.parent().unwrap_or_else(|| Path::new(""));
    dir.join(ignore_flag).exists()
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_ascii_lowercase)
}
