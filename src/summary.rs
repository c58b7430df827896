use std::io::{self, Write};
use std::path::Path;

use crate::command::CommandBuilder;
use crate::params::EncodeParameters;

const RULE: &str = "============================================";

/// Print the ffmpeg equivalent of a preset, with one example command line.
pub fn write_preset_summary<W: Write>(
    out: &mut W,
    params: &EncodeParameters,
    builder: &CommandBuilder,
    output_format: &str,
) -> io::Result<()> {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Handbrake Preset: {}", params.preset_name)?;
    writeln!(out, "FFmpeg Equivalent Parameters:")?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Video codec:      -c:v {}", params.video_codec)?;
    writeln!(out, "Quality:          {}", params.quality)?;
    writeln!(out, "Preset:           -preset {}", params.speed_preset)?;
    if params.has_framerate() {
        writeln!(out, "Framerate:        -r {}", params.framerate)?;
    }
    writeln!(out, "Resolution:       -s {}", params.resolution)?;
    writeln!(
        out,
        "Audio:            {}",
        format!("{} {}", params.audio_codec, params.audio_channels).trim_end()
    )?;
    if params.has_profile() {
        writeln!(out, "Profile:          -profile:v {}", params.profile)?;
    }
    writeln!(out, "Output format:    {}", output_format)?;
    if params.effective_multipass() {
        writeln!(out, "Multipass:        Enabled (two-pass encoding)")?;
    } else {
        writeln!(out, "Multipass:        Disabled (single-pass encoding)")?;
    }
    writeln!(out, "Analyze duration: {}", builder.analyze_duration())?;
    writeln!(out, "Probe size:       {}", builder.probe_size())?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Example usage:")?;
    let example_output = format!("output.{}", output_format);
    let plan = builder.plan(Path::new("input.mp4"), Path::new(&example_output), params);
    writeln!(out, "{}", plan.render())?;
    writeln!(out, "{}", RULE)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::QualityArg;

    fn params() -> EncodeParameters {
        EncodeParameters {
            video_codec: "libx264".to_string(),
            audio_codec: "-c:a copy".to_string(),
            audio_channels: String::new(),
            quality: QualityArg::Bitrate("2500".to_string()),
            format: "mp4".to_string(),
            speed_preset: "fast".to_string(),
            profile: "high".to_string(),
            framerate: "auto".to_string(),
            resolution: "1280x720".to_string(),
            multipass: true,
            preset_name: "Fast 720p".to_string(),
        }
    }

    fn render(params: &EncodeParameters) -> String {
        let builder = CommandBuilder::new("ffmpeg", 100_000_000, 100_000_000);
        let mut out = Vec::new();
        write_preset_summary(&mut out, params, &builder, "mp4").unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_summary_fields() {
        let text = render(&params());
        assert!(text.contains("Handbrake Preset: Fast 720p\n"));
        assert!(text.contains("Video codec:      -c:v libx264\n"));
        assert!(text.contains("Quality:          -b:v 2500k\n"));
        assert!(text.contains("Audio:            -c:a copy\n"));
        assert!(text.contains("Profile:          -profile:v high\n"));
        assert!(!text.contains("Framerate:"));
        assert!(text.contains("Output format:    mp4\n"));
        assert!(text.contains("Multipass:        Enabled (two-pass encoding)\n"));
        assert!(text.contains("Analyze duration: 100000000\n"));
        assert!(text.contains("Probe size:       100000000\n"));
        assert!(text.contains("-pass 2"));
        assert!(text.contains("output.mp4 -pass 2"));
    }

    #[test]
    fn test_summary_single_pass_for_constant_quality() {
        let mut p = params();
        p.quality = QualityArg::ConstantQuality("20".to_string());
        let text = render(&p);
        assert!(text.contains("Multipass:        Disabled (single-pass encoding)\n"));
        assert!(text.contains("-c:v libx264 -crf 20 -preset fast"));
        assert!(!text.contains(" -pass 1"));
        assert!(!text.contains(" -pass 2"));
    }
}
