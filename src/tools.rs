//! External tool detection and process execution.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::command::Invocation;
use crate::config::ToolPaths;
use crate::{Error, Result};

/// Require that a tool is available, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Check the transcoder and the prober once before any file is touched.
pub fn require_tools(tools: &ToolPaths) -> Result<()> {
    for name in [&tools.ffmpeg, &tools.ffprobe] {
        let path = require_tool(name)?;
        tracing::debug!(tool = %name, path = %path.display(), "found tool");
    }
    Ok(())
}

/// Read-only diagnostic probe of a media file.
pub fn probe_invocation(prober: &str, file: &Path) -> Invocation {
    let mut cmd = Invocation::new(prober);
    cmd.args(["-hide_banner", "-v", "error", "-show_format", "-show_streams"])
        .arg(file.to_string_lossy());
    cmd
}

/// Runs invocations to completion and reports their exit code.
pub trait ProcessRunner {
    /// Block until the process exits. A process killed by a signal reports `-1`.
    fn run(&mut self, invocation: &Invocation) -> io::Result<i32>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &mut R {
    fn run(&mut self, invocation: &Invocation) -> io::Result<i32> {
        (**self).run(invocation)
    }
}

/// Runs invocations as child processes sharing this process's stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> io::Result<i32> {
        tracing::debug!(program = invocation.program(), args = ?invocation.args_slice(), "spawning");
        let status = Command::new(invocation.program())
            .args(invocation.args_slice())
            .stdin(Stdio::null())
            .status()?;
        Ok(status.code().unwrap_or(-1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_tool_not_found() {
        let err = require_tool("nonexistent_tool_12345").unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { ref tool } if tool == "nonexistent_tool_12345"));
    }

    #[test]
    fn test_require_tools_reports_first_missing() {
        let tools = ToolPaths {
            ffmpeg: "nonexistent_ffmpeg_12345".to_string(),
            ffprobe: "nonexistent_ffprobe_12345".to_string(),
        };
        let err = require_tools(&tools).unwrap_err();
        assert_eq!(
            err.to_string(),
            "nonexistent_ffmpeg_12345 is required but not installed. Please install nonexistent_ffmpeg_12345."
        );
    }

    #[test]
    fn test_probe_invocation() {
        let cmd = probe_invocation("ffprobe", Path::new("in put.mkv"));
        assert_eq!(
            cmd.render(),
            "ffprobe -hide_banner -v error -show_format -show_streams \"in put.mkv\""
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_exit_codes() {
        let mut runner = SystemRunner;
        assert_eq!(runner.run(&Invocation::new("true")).unwrap(), 0);
        assert_ne!(runner.run(&Invocation::new("false")).unwrap(), 0);
        assert!(runner
            .run(&Invocation::new("nonexistent_tool_xyz_12345"))
            .is_err());
    }
}
