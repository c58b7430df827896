//! Batch orchestration: one preset applied to every discovered media file.
//!
//! Files are processed strictly one after another. For each file the output
//! path is mirrored from the input root onto the output root, the output
//! directory is ensured, the command is built and then previewed or run.
//! A failing file is reported and counted; it never stops the batch.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::command::{CommandBuilder, EncodePlan};
use crate::discovery::{should_ignore, DiscoveredFile};
use crate::params::EncodeParameters;
use crate::tools::{probe_invocation, ProcessRunner};
use crate::{Error, Result};

/// What the batch does with the commands it builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print each generated command for inspection.
    Plan,
    /// Announce every action, change nothing on disk.
    DryRun,
    /// Run the commands.
    Execute,
}

impl Mode {
    /// Dry-run wins when both flags are given.
    pub fn from_flags(execute: bool, dry_run: bool) -> Self {
        if dry_run {
            Mode::DryRun
        } else if execute {
            Mode::Execute
        } else {
            Mode::Plan
        }
    }
}

/// Options shared by every file of a batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub mode: Mode,
    pub ignore_flag: String,
    /// Replace `_` with spaces in output file names.
    pub replace_underscores: bool,
    /// Final extension of every output when set (`--force-m4v`).
    pub alternate_extension: Option<String>,
    /// The preset document; never processed even if it is discovered.
    pub document: Option<PathBuf>,
}

/// Running counters of a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchResult {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchResult {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    pub fn write_summary<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "Processing complete:")?;
        writeln!(out, "  - Successfully processed: {} files", self.processed)?;
        writeln!(out, "  - Skipped: {} files", self.skipped)?;
        writeln!(out, "  - Failed: {} files", self.failed)?;
        if self.processed == 0 && self.skipped == 0 && self.failed == 0 {
            writeln!(out, "No media files found in the specified directory.")?;
        }
        Ok(())
    }
}

/// Where one input file ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub dir: PathBuf,
    /// The file the transcoder writes.
    pub file: PathBuf,
    /// Final name after a successful encode, when it differs from `file`.
    pub rename_to: Option<PathBuf>,
}

/// Replace underscores with spaces when enabled.
pub fn format_filename(basename: &str, replace_underscores: bool) -> String {
    if replace_underscores {
        basename.replace('_', " ")
    } else {
        basename.to_string()
    }
}

/// Mirror `file` from the input root onto the output root.
///
/// With an alternate extension, executing (and dry) runs write the real
/// container first and rename afterwards, since ffmpeg picks the muxer from
/// the extension. Plan mode shows the final name directly.
pub fn resolve_output(file: &Path, options: &BatchOptions, format: &str) -> OutputTarget {
    let rel = file
        .strip_prefix(&options.input_root)
        .unwrap_or_else(|_| Path::new(file.file_name().unwrap_or(file.as_os_str())));
    let dir = match rel.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => options.output_root.join(parent),
        _ => options.output_root.clone(),
    };

    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let base = format_filename(&stem, options.replace_underscores);

    match &options.alternate_extension {
        Some(alt) if options.mode == Mode::Plan => OutputTarget {
            file: dir.join(format!("{}.{}", base, alt)),
            dir,
            rename_to: None,
        },
        Some(alt) => {
            let file = dir.join(format!("{}.{}", base, format));
            OutputTarget {
                rename_to: Some(dir.join(format!("{}.{}", base, alt))),
                file,
                dir,
            }
        }
        None => OutputTarget {
            file: dir.join(format!("{}.{}", base, format)),
            dir,
            rename_to: None,
        },
    }
}

/// Create the output root unless this is a dry run.
pub fn prepare_output_root<W: Write>(root: &Path, mode: Mode, out: &mut W) -> Result<()> {
    if root.exists() || mode == Mode::DryRun {
        return Ok(());
    }
    writeln!(out, "Creating output directory: {}", root.display())?;
    fs::create_dir_all(root).map_err(|source| Error::CreateOutputDir {
        path: root.to_path_buf(),
        source,
    })
}

/// Check that the transcoder will be able to write `output`.
pub fn check_output_access(output: &Path) -> std::result::Result<(), String> {
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if !dir.is_dir() {
        return Err(format!(
            "Output directory '{}' does not exist.",
            dir.display()
        ));
    }

    if let Ok(meta) = fs::metadata(output) {
        if meta.permissions().readonly() {
            return Err(format!(
                "Output file '{}' exists but is not writable.",
                output.display()
            ));
        }
    }

    tempfile::Builder::new()
        .prefix(".write_test")
        .tempfile_in(dir)
        .map(drop)
        .map_err(|_| format!("Output directory '{}' is not writable.", dir.display()))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Drives the command builder and the runner over a list of files.
pub struct Batch<'a, R: ProcessRunner, W: Write> {
    options: &'a BatchOptions,
    params: &'a EncodeParameters,
    builder: &'a CommandBuilder,
    prober: String,
    runner: R,
    out: W,
}

impl<'a, R: ProcessRunner, W: Write> Batch<'a, R, W> {
    pub fn new(
        options: &'a BatchOptions,
        params: &'a EncodeParameters,
        builder: &'a CommandBuilder,
        runner: R,
        out: W,
    ) -> Self {
        Self {
            options,
            params,
            builder,
            prober: "ffprobe".to_string(),
            runner,
            out,
        }
    }

    /// Program used for the diagnostic probe after a failed encode.
    pub fn prober(mut self, prober: impl Into<String>) -> Self {
        self.prober = prober.into();
        self
    }

    /// Process every file in order.
    ///
    /// # Errors
    ///
    /// Only failures to write the report are returned; per-file problems are
    /// counted in the result.
    pub fn run(&mut self, files: &[DiscoveredFile]) -> Result<BatchResult> {
        let mut result = BatchResult::default();

        for file in files {
            if let Some(document) = &self.options.document {
                if same_file(&file.path, document) {
                    tracing::debug!(file = %file.path.display(), "skipping preset document");
                    continue;
                }
            }

            if should_ignore(&file.path, &self.options.ignore_flag) {
                writeln!(
                    self.out,
                    "Skipping: {} (ignore flag found)",
                    file.path.display()
                )?;
                result.skipped += 1;
                continue;
            }

            if self.process_file(&file.path)? {
                result.processed += 1;
            } else {
                result.failed += 1;
                writeln!(self.out, "Failed to process: {}", file.path.display())?;
            }
        }

        self.out.flush()?;
        Ok(result)
    }

    /// Returns whether the file succeeded.
    fn process_file(&mut self, input: &Path) -> Result<bool> {
        let mode = self.options.mode;
        let target = resolve_output(input, self.options, &self.params.format);

        if !target.dir.exists() {
            if mode == Mode::DryRun {
                writeln!(
                    self.out,
                    "[DRY RUN] Would create directory: {}",
                    target.dir.display()
                )?;
            } else {
                writeln!(self.out, "Creating output directory: {}", target.dir.display())?;
                if let Err(e) = fs::create_dir_all(&target.dir) {
                    writeln!(
                        self.out,
                        "Error creating directory: {}: {}",
                        target.dir.display(),
                        e
                    )?;
                    return Ok(false);
                }
            }
        }

        if mode == Mode::Execute {
            if let Err(message) = check_output_access(&target.file) {
                writeln!(self.out, "Error: {}", message)?;
                writeln!(
                    self.out,
                    "Skipping {} due to output file access issues.",
                    input.display()
                )?;
                return Ok(false);
            }
        }

        let plan = self.builder.plan(input, &target.file, self.params);
        let rendered = plan.render();

        match mode {
            Mode::DryRun => {
                writeln!(self.out, "[DRY RUN] Would execute:")?;
                writeln!(self.out, "{}", rendered)?;
                if let Some(renamed) = &target.rename_to {
                    writeln!(
                        self.out,
                        "[DRY RUN] Would rename {} to {}",
                        target.file.display(),
                        renamed.display()
                    )?;
                }
                Ok(true)
            }
            Mode::Plan => {
                writeln!(self.out, "Generated command for {}:", input.display())?;
                writeln!(self.out, "{}", rendered)?;
                if let Some(alt) = &self.options.alternate_extension {
                    writeln!(
                        self.out,
                        "Note: If executed, the file will be converted to {} then renamed to .{}",
                        self.params.format, alt
                    )?;
                }
                Ok(true)
            }
            Mode::Execute => {
                writeln!(self.out, "Processing: {}", input.display())?;
                writeln!(self.out, "Output: {}", target.file.display())?;
                writeln!(self.out, "Command: {}", rendered)?;
                self.execute(input, &plan, &target)
            }
        }
    }

    fn execute(&mut self, input: &Path, plan: &EncodePlan, target: &OutputTarget) -> Result<bool> {
        let passes = plan.passes();
        let total = passes.len();
        let mut code = 0;

        for (i, pass) in passes.into_iter().enumerate() {
            if total > 1 {
                writeln!(self.out, "Running pass {} of {}...", i + 1, total)?;
            }
            self.out.flush()?;
            code = match self.runner.run(pass) {
                Ok(code) => code,
                Err(e) => {
                    writeln!(self.out, "Error executing command: {}", e)?;
                    return Ok(false);
                }
            };
            if code != 0 {
                break;
            }
        }

        if code != 0 {
            writeln!(
                self.out,
                "Error: ffmpeg command failed with return code {}",
                code
            )?;
            writeln!(self.out, "Checking input file...")?;
            self.probe(input)?;
            return Ok(false);
        }

        writeln!(self.out, "Conversion successful")?;
        if let Some(renamed) = &target.rename_to {
            self.rename(&target.file, renamed)?;
        }
        Ok(true)
    }

    /// A failed rename is only a warning; the encode itself succeeded.
    fn rename(&mut self, from: &Path, to: &Path) -> Result<()> {
        writeln!(self.out, "Renaming {} to {}", from.display(), to.display())?;
        let error = if !from.exists() {
            Some(format!("Error: File {} not found for renaming", from.display()))
        } else {
            fs::rename(from, to)
                .err()
                .map(|e| format!("Error renaming file: {}", e))
        };
        if let Some(error) = error {
            writeln!(self.out, "{}", error)?;
            writeln!(self.out, "Warning: Failed to rename file to {}", to.display())?;
            tracing::warn!(file = %from.display(), "rename after conversion failed");
        }
        Ok(())
    }

    fn probe(&mut self, input: &Path) -> Result<()> {
        writeln!(self.out, "File information for {}:", input.display())?;
        self.out.flush()?;
        let probe = probe_invocation(&self.prober, input);
        if let Err(e) = self.runner.run(&probe) {
            writeln!(self.out, "Could not run {}: {}", self.prober, e)?;
        }
        Ok(())
    }
}
