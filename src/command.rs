//! Building ffmpeg invocations from [`EncodeParameters`].
//!
//! The argument order is fixed so that previews stay stable for tools that
//! parse them:
//!
//! ```text
//! ffmpeg -analyzeduration N -probesize N -i IN -c:v CODEC <quality> -preset P
//!        [-r FPS] -s WxH <audio> [<channels>] [-profile:v PROFILE]
//!        [-v error -stats] -map 0 OUT
//! ```

use std::fmt;
use std::path::Path;

use crate::params::EncodeParameters;

/// Platform null device used as the pass 1 output.
pub fn null_device() -> &'static str {
    if cfg!(windows) {
        "NUL"
    } else {
        "/dev/null"
    }
}

/// One external process call: the program followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    argv: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            argv: vec![program.into()],
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.argv.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.argv.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Append a space separated fragment as separate arguments.
    fn fragment(&mut self, fragment: &str) -> &mut Self {
        self.args(fragment.split_whitespace())
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments after the program name.
    pub fn args_slice(&self) -> &[String] {
        &self.argv[1..]
    }

    /// Program name and arguments.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Render as a single command string, quoting arguments with whitespace.
    pub fn render(&self) -> String {
        self.argv
            .iter()
            .map(|a| quote(a))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Plain double-quote wrapping. Embedded quotes are not escaped.
fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.chars().any(char::is_whitespace) {
        format!("\"{}\"", arg)
    } else {
        arg.to_string()
    }
}

/// Split a rendered command back into arguments, honoring double-quoted segments.
pub fn split_rendered(rendered: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;

    for c in rendered.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        tokens.push(current);
    }
    tokens
}

/// The invocations needed to encode one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodePlan {
    Single(Invocation),
    /// Pass 2 must only start after pass 1 exited successfully.
    TwoPass(Invocation, Invocation),
}

impl EncodePlan {
    /// Invocations in the order they must run.
    pub fn passes(&self) -> Vec<&Invocation> {
        match self {
            EncodePlan::Single(cmd) => vec![cmd],
            EncodePlan::TwoPass(first, second) => vec![first, second],
        }
    }

    /// Rendered command line, passes joined with `&&`.
    pub fn render(&self) -> String {
        self.passes()
            .iter()
            .map(|cmd| cmd.render())
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

/// Builds transcoder invocations for a fixed set of tuning options.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: String,
    analyze_duration: u64,
    probe_size: u64,
    verbose: bool,
}

impl CommandBuilder {
    pub fn new(program: impl Into<String>, analyze_duration: u64, probe_size: u64) -> Self {
        Self {
            program: program.into(),
            analyze_duration,
            probe_size,
            verbose: false,
        }
    }

    /// Keep ffmpeg's own logging instead of `-v error -stats`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn analyze_duration(&self) -> u64 {
        self.analyze_duration
    }

    pub fn probe_size(&self) -> u64 {
        self.probe_size
    }

    /// Single pass encode of `input` into `output`.
    pub fn single(&self, input: &Path, output: &Path, params: &EncodeParameters) -> Invocation {
        self.build(input, &output.to_string_lossy(), params)
    }

    /// Two pass encode: pass 1 writes to the null device, pass 2 to `output`.
    pub fn multipass(
        &self,
        input: &Path,
        output: &Path,
        params: &EncodeParameters,
    ) -> (Invocation, Invocation) {
        let null = null_device();

        let mut first = self.build(input, null, params);
        first.argv.pop();
        first.args(["-pass", "1", "-f", "null", null]);

        let mut second = self.single(input, output, params);
        second.args(["-pass", "2"]);

        (first, second)
    }

    /// Pick single or two pass according to [`EncodeParameters::effective_multipass`].
    pub fn plan(&self, input: &Path, output: &Path, params: &EncodeParameters) -> EncodePlan {
        if params.effective_multipass() {
            let (first, second) = self.multipass(input, output, params);
            EncodePlan::TwoPass(first, second)
        } else {
            EncodePlan::Single(self.single(input, output, params))
        }
    }

    fn build(&self, input: &Path, output: &str, params: &EncodeParameters) -> Invocation {
        let mut cmd = Invocation::new(self.program.clone());
        cmd.arg("-analyzeduration")
            .arg(self.analyze_duration.to_string())
            .arg("-probesize")
            .arg(self.probe_size.to_string())
            .arg("-i")
            .arg(input.to_string_lossy())
            .arg("-c:v")
            .arg(params.video_codec.clone())
            .args(params.quality.args())
            .arg("-preset")
            .arg(params.speed_preset.clone());

        if params.has_framerate() {
            cmd.arg("-r").arg(params.framerate.clone());
        }

        cmd.arg("-s").arg(params.resolution.clone());
        cmd.fragment(&params.audio_codec);
        cmd.fragment(&params.audio_channels);

        if params.has_profile() {
            cmd.arg("-profile:v").arg(params.profile.clone());
        }

        if !self.verbose {
            cmd.args(["-v", "error", "-stats"]);
        }

        cmd.args(["-map", "0"]);
        cmd.arg(output);
        cmd
    }
}
