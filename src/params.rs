//! Translation of preset [`Settings`] into ffmpeg-facing parameters.

use std::fmt;

use crate::preset::{QualityMode, Settings};

/// Container used when the preset names one we do not know.
pub const DEFAULT_CONTAINER: &str = "mkv";

/// The video quality target, exactly one form per encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityArg {
    /// `-crf <value>`
    ConstantQuality(String),
    /// `-b:v <kbps>k`
    Bitrate(String),
}

impl QualityArg {
    pub fn is_constant_quality(&self) -> bool {
        matches!(self, QualityArg::ConstantQuality(_))
    }

    /// Arguments for this quality form, in order.
    pub fn args(&self) -> Vec<String> {
        match self {
            QualityArg::ConstantQuality(v) => vec!["-crf".to_string(), v.clone()],
            QualityArg::Bitrate(kbps) => vec!["-b:v".to_string(), format!("{}k", kbps)],
        }
    }
}

impl fmt::Display for QualityArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args().join(" "))
    }
}

/// Encode parameters for the transcoder, derived once per batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeParameters {
    /// Value for `-c:v`.
    pub video_codec: String,
    /// Space separated audio codec fragment, e.g. `-c:a copy`.
    pub audio_codec: String,
    /// Space separated channel fragment, empty to let ffmpeg decide.
    pub audio_channels: String,
    pub quality: QualityArg,
    /// Short container name, also the output extension.
    pub format: String,
    pub speed_preset: String,
    pub profile: String,
    pub framerate: String,
    /// `{width}x{height}`, unvalidated.
    pub resolution: String,
    /// Multipass as requested by the preset; see [`EncodeParameters::effective_multipass`].
    pub multipass: bool,
    pub preset_name: String,
}

impl EncodeParameters {
    /// Two-pass encoding only applies to bitrate targets.
    pub fn effective_multipass(&self) -> bool {
        self.multipass && !self.quality.is_constant_quality()
    }

    /// Whether `-r` should be emitted.
    pub fn has_framerate(&self) -> bool {
        is_set(&self.framerate)
    }

    /// Whether `-profile:v` should be emitted.
    pub fn has_profile(&self) -> bool {
        is_set(&self.profile)
    }
}

fn is_set(value: &str) -> bool {
    !value.is_empty() && value != "auto"
}

/// Map preset settings onto transcoder parameters.
pub fn translate(settings: &Settings) -> EncodeParameters {
    EncodeParameters {
        video_codec: video_codec(&settings.video_encoder),
        audio_codec: audio_codec(&settings.audio_encoder, &settings.audio_bitrate),
        audio_channels: audio_channels(&settings.audio_mixdown).to_string(),
        quality: match settings.quality_mode {
            QualityMode::ConstantQuality => {
                QualityArg::ConstantQuality(settings.video_quality.clone())
            }
            QualityMode::Bitrate => QualityArg::Bitrate(settings.video_bitrate.clone()),
        },
        format: container(&settings.container).to_string(),
        speed_preset: settings.video_preset.clone(),
        profile: settings.video_profile.clone(),
        framerate: settings.video_framerate.clone(),
        resolution: format!("{}x{}", settings.picture_width, settings.picture_height),
        multipass: settings.multipass,
        preset_name: settings.preset_name.clone(),
    }
}

/// Unknown encoder ids are passed through unchanged.
fn video_codec(encoder: &str) -> String {
    match encoder {
        "x265" => "libx265".to_string(),
        "x264" => "libx264".to_string(),
        other => other.to_string(),
    }
}

fn audio_codec(encoder: &str, bitrate: &str) -> String {
    // The suffix after "copy:" only names the source codec.
    if encoder.starts_with("copy:") {
        "-c:a copy".to_string()
    } else {
        format!("-c:a aac -b:a {}k", bitrate)
    }
}

fn audio_channels(mixdown: &str) -> &'static str {
    match mixdown {
        "5point1" => "-ac 6",
        "stereo" => "-ac 2",
        "mono" => "-ac 1",
        _ => "",
    }
}

fn container(file_format: &str) -> &'static str {
    match file_format {
        "av_mkv" => "mkv",
        "av_mp4" => "mp4",
        _ => DEFAULT_CONTAINER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            preset_name: "Test".to_string(),
            video_encoder: "x265".to_string(),
            video_bitrate: "4500".to_string(),
            video_preset: "medium".to_string(),
            video_profile: "main".to_string(),
            video_framerate: "auto".to_string(),
            video_quality: "20".to_string(),
            quality_mode: QualityMode::ConstantQuality,
            multipass: false,
            picture_width: "1920".to_string(),
            picture_height: "1080".to_string(),
            audio_encoder: "av_aac".to_string(),
            audio_bitrate: "160".to_string(),
            audio_mixdown: "stereo".to_string(),
            container: "av_mkv".to_string(),
        }
    }

    #[test]
    fn test_video_codec_mapping() {
        let mut s = settings();
        assert_eq!(translate(&s).video_codec, "libx265");
        s.video_encoder = "x264".to_string();
        assert_eq!(translate(&s).video_codec, "libx264");
        s.video_encoder = "svt_av1".to_string();
        assert_eq!(translate(&s).video_codec, "svt_av1");
    }

    #[test]
    fn test_constant_quality_never_uses_bitrate() {
        let p = translate(&settings());
        assert_eq!(p.quality, QualityArg::ConstantQuality("20".to_string()));
        assert_eq!(p.quality.to_string(), "-crf 20");
    }

    #[test]
    fn test_bitrate_mode_never_uses_crf() {
        let mut s = settings();
        s.quality_mode = QualityMode::Bitrate;
        let p = translate(&s);
        assert_eq!(p.quality, QualityArg::Bitrate("4500".to_string()));
        assert_eq!(p.quality.to_string(), "-b:v 4500k");
    }

    #[test]
    fn test_copy_audio_ignores_suffix() {
        let mut s = settings();
        s.audio_encoder = "copy:aac".to_string();
        assert_eq!(translate(&s).audio_codec, "-c:a copy");
        s.audio_encoder = "copy:dts".to_string();
        assert_eq!(translate(&s).audio_codec, "-c:a copy");
    }

    #[test]
    fn test_encoded_audio_uses_bitrate() {
        assert_eq!(translate(&settings()).audio_codec, "-c:a aac -b:a 160k");
    }

    #[test]
    fn test_mixdown_channels() {
        let mut s = settings();
        s.audio_mixdown = "5point1".to_string();
        assert_eq!(translate(&s).audio_channels, "-ac 6");
        s.audio_mixdown = "mono".to_string();
        assert_eq!(translate(&s).audio_channels, "-ac 1");
        s.audio_mixdown = "dpl2".to_string();
        assert_eq!(translate(&s).audio_channels, "");
        s.audio_mixdown = String::new();
        assert_eq!(translate(&s).audio_channels, "");
    }

    #[test]
    fn test_container_mapping() {
        let mut s = settings();
        assert_eq!(translate(&s).format, "mkv");
        s.container = "av_mp4".to_string();
        assert_eq!(translate(&s).format, "mp4");
        s.container = "av_webm".to_string();
        assert_eq!(translate(&s).format, "mkv");
    }

    #[test]
    fn test_resolution_is_not_validated() {
        let mut s = settings();
        s.picture_width = "0".to_string();
        s.picture_height = "0".to_string();
        assert_eq!(translate(&s).resolution, "0x0");
    }

    #[test]
    fn test_effective_multipass() {
        let mut s = settings();
        s.multipass = true;
        assert!(translate(&s).multipass);
        assert!(!translate(&s).effective_multipass());
        s.quality_mode = QualityMode::Bitrate;
        assert!(translate(&s).effective_multipass());
    }
}
