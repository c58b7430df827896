//! Reading HandBrake preset documents into normalized [`Settings`].
//!
//! Only the first entry of `PresetList` is used, and only the first entry of
//! its `AudioList`. Missing keys never fail extraction: text fields default to
//! an empty string, numeric fields to `"0"` and flags to `false`.

use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// Selector value HandBrake writes for constant-quality encodes.
const CONSTANT_QUALITY_SELECTOR: &str = "2";

/// How the video quality target is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityMode {
    /// Target an average bitrate (`VideoAvgBitrate`).
    Bitrate,
    /// Target a perceptual quality (`VideoQualitySlider`).
    ConstantQuality,
}

impl QualityMode {
    /// Decide the mode from the raw `VideoQualityType` selector.
    ///
    /// Only the exact selector `"2"` means constant quality; everything else,
    /// including an absent selector, is bitrate mode.
    pub fn from_selector(selector: &str) -> Self {
        if selector == CONSTANT_QUALITY_SELECTOR {
            QualityMode::ConstantQuality
        } else {
            QualityMode::Bitrate
        }
    }
}

/// Normalized encode settings taken from a preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub preset_name: String,
    pub video_encoder: String,
    /// Average video bitrate in kbps.
    pub video_bitrate: String,
    /// Encoder speed preset label, e.g. `medium`.
    pub video_preset: String,
    pub video_profile: String,
    /// Either `auto`, empty, or a numeric rate.
    pub video_framerate: String,
    /// Quality slider value with its source precision preserved.
    pub video_quality: String,
    pub quality_mode: QualityMode,
    pub multipass: bool,
    pub picture_width: String,
    pub picture_height: String,
    pub audio_encoder: String,
    /// Audio bitrate in kbps.
    pub audio_bitrate: String,
    pub audio_mixdown: String,
    pub container: String,
}

/// Read and parse a preset document.
pub fn load_document(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(Error::DocumentNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path).map_err(|source| Error::DocumentRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| Error::DocumentParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Extract the settings of the first preset in the document.
///
/// # Errors
///
/// Returns [`Error::MissingPreset`] when `PresetList` is absent, is not a
/// list, or is empty, or when its first entry is not an object.
pub fn extract(document: &Value) -> Result<Settings> {
    let preset = document
        .get("PresetList")
        .and_then(Value::as_array)
        .and_then(|list| list.first())
        .and_then(Value::as_object)
        .ok_or(Error::MissingPreset)?;

    let empty = Map::new();
    let audio = preset
        .get("AudioList")
        .and_then(Value::as_array)
        .and_then(|list| list.first())
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    Ok(Settings {
        preset_name: text(preset, "PresetName"),
        video_encoder: text(preset, "VideoEncoder"),
        video_bitrate: integer(preset, "VideoAvgBitrate"),
        video_preset: text(preset, "VideoPreset"),
        video_profile: text(preset, "VideoProfile"),
        video_framerate: text(preset, "VideoFramerate"),
        video_quality: decimal(preset, "VideoQualitySlider"),
        quality_mode: QualityMode::from_selector(&selector(preset, "VideoQualityType")),
        multipass: flag(preset, "VideoMultiPass"),
        picture_width: integer(preset, "PictureWidth"),
        picture_height: integer(preset, "PictureHeight"),
        audio_encoder: text(audio, "AudioEncoder"),
        audio_bitrate: integer(audio, "AudioBitrate"),
        audio_mixdown: text(audio, "AudioMixdown"),
        container: text(preset, "FileFormat"),
    })
}

fn text(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => {
            tracing::warn!(key, value = %other, "unexpected value type, using empty string");
            String::new()
        }
    }
}

/// A numeric selector compares by its integer value, so `2.0` reads as `"2"`.
fn selector(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .map(|v| v.to_string())
            .unwrap_or_default(),
        _ => text(obj, key),
    }
}

/// Non-negative integer rendered without a decimal part.
fn integer(obj: &Map<String, Value>, key: &str) -> String {
    let value = match obj.get(key) {
        None | Some(Value::Null) => return "0".to_string(),
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().map(truncate)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(truncate))
        }
        Some(_) => None,
    };
    match value {
        Some(v) => v.to_string(),
        None => {
            tracing::warn!(key, "value is not a number, using 0");
            "0".to_string()
        }
    }
}

/// Non-negative number rendered with the precision it had in the document.
fn decimal(obj: &Map<String, Value>, key: &str) -> String {
    let value = match obj.get(key) {
        None | Some(Value::Null) => return "0".to_string(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f < 0.0 => Some("0".to_string()),
            _ => Some(n.to_string()),
        },
        Some(Value::String(s)) => {
            let s = s.trim();
            match s.parse::<f64>() {
                Ok(f) if f.is_finite() && f >= 0.0 => Some(s.to_string()),
                Ok(f) if f.is_finite() => Some("0".to_string()),
                _ => None,
            }
        }
        Some(_) => None,
    };
    value.unwrap_or_else(|| {
        tracing::warn!(key, "value is not a number, using 0");
        "0".to_string()
    })
}

fn flag(obj: &Map<String, Value>, key: &str) -> bool {
    match obj.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.trim(), "true" | "1"),
        _ => false,
    }
}

fn truncate(f: f64) -> u64 {
    if f <= 0.0 {
        0
    } else {
        f.trunc() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn x265_preset() -> Value {
        json!({
            "PresetList": [{
                "PresetName": "H.265 MKV 1080p",
                "VideoEncoder": "x265",
                "VideoAvgBitrate": 6000,
                "VideoPreset": "slow",
                "VideoProfile": "main",
                "VideoFramerate": "auto",
                "VideoQualitySlider": 22.0,
                "VideoQualityType": 2,
                "VideoMultiPass": true,
                "PictureWidth": 1920,
                "PictureHeight": 1080,
                "FileFormat": "av_mkv",
                "AudioList": [
                    {"AudioEncoder": "copy:aac", "AudioBitrate": 160, "AudioMixdown": "5point1"},
                    {"AudioEncoder": "av_aac", "AudioBitrate": 96, "AudioMixdown": "mono"}
                ]
            }, {
                "PresetName": "ignored"
            }]
        })
    }

    #[test]
    fn test_extract_full_preset() {
        let s = extract(&x265_preset()).unwrap();
        assert_eq!(s.preset_name, "H.265 MKV 1080p");
        assert_eq!(s.video_encoder, "x265");
        assert_eq!(s.video_bitrate, "6000");
        assert_eq!(s.video_preset, "slow");
        assert_eq!(s.video_framerate, "auto");
        assert_eq!(s.video_quality, "22.0");
        assert_eq!(s.quality_mode, QualityMode::ConstantQuality);
        assert!(s.multipass);
        assert_eq!(s.picture_width, "1920");
        assert_eq!(s.picture_height, "1080");
        assert_eq!(s.container, "av_mkv");
        // first audio track only
        assert_eq!(s.audio_encoder, "copy:aac");
        assert_eq!(s.audio_bitrate, "160");
        assert_eq!(s.audio_mixdown, "5point1");
    }

    #[test]
    fn test_missing_fields_default() {
        let s = extract(&json!({"PresetList": [{}]})).unwrap();
        assert_eq!(s.preset_name, "");
        assert_eq!(s.video_bitrate, "0");
        assert_eq!(s.video_quality, "0");
        assert_eq!(s.video_framerate, "");
        assert_eq!(s.picture_width, "0");
        assert_eq!(s.picture_height, "0");
        assert_eq!(s.audio_encoder, "");
        assert_eq!(s.audio_bitrate, "0");
        assert_eq!(s.audio_mixdown, "");
        assert_eq!(s.quality_mode, QualityMode::Bitrate);
        assert!(!s.multipass);
    }

    #[test]
    fn test_empty_audio_list_defaults_audio() {
        let doc = json!({"PresetList": [{"AudioList": [], "VideoEncoder": "x264"}]});
        let s = extract(&doc).unwrap();
        assert_eq!(s.video_encoder, "x264");
        assert_eq!(s.audio_encoder, "");
        assert_eq!(s.audio_bitrate, "0");
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let doc = json!({"PresetList": [{
            "VideoAvgBitrate": "2500",
            "PictureWidth": 1280.0,
            "PictureHeight": "720.7",
            "VideoQualitySlider": "19.5",
            "VideoFramerate": 30,
            "VideoQualityType": "2"
        }]});
        let s = extract(&doc).unwrap();
        assert_eq!(s.video_bitrate, "2500");
        assert_eq!(s.picture_width, "1280");
        assert_eq!(s.picture_height, "720");
        assert_eq!(s.video_quality, "19.5");
        assert_eq!(s.video_framerate, "30");
        assert_eq!(s.quality_mode, QualityMode::ConstantQuality);
    }

    #[test]
    fn test_integer_quality_keeps_integer_form() {
        let doc = json!({"PresetList": [{"VideoQualitySlider": 20}]});
        assert_eq!(extract(&doc).unwrap().video_quality, "20");
    }

    #[test]
    fn test_negative_and_garbage_numbers_become_zero() {
        let doc = json!({"PresetList": [{
            "VideoAvgBitrate": -5,
            "PictureWidth": "wide",
            "VideoQualitySlider": -1.5
        }]});
        let s = extract(&doc).unwrap();
        assert_eq!(s.video_bitrate, "0");
        assert_eq!(s.picture_width, "0");
        assert_eq!(s.video_quality, "0");
    }

    #[test]
    fn test_quality_selector_is_exact() {
        assert_eq!(QualityMode::from_selector("2"), QualityMode::ConstantQuality);
        assert_eq!(QualityMode::from_selector("1"), QualityMode::Bitrate);
        assert_eq!(QualityMode::from_selector(""), QualityMode::Bitrate);
        assert_eq!(QualityMode::from_selector(" 2"), QualityMode::Bitrate);
    }

    #[test]
    fn test_numeric_selector_uses_integer_value() {
        let mode = |selector: Value| {
            extract(&json!({"PresetList": [{"VideoQualityType": selector}]}))
                .unwrap()
                .quality_mode
        };
        assert_eq!(mode(json!(2)), QualityMode::ConstantQuality);
        assert_eq!(mode(json!(2.0)), QualityMode::ConstantQuality);
        assert_eq!(mode(json!("2")), QualityMode::ConstantQuality);
        assert_eq!(mode(json!("2.0")), QualityMode::Bitrate);
        assert_eq!(mode(json!(1.0)), QualityMode::Bitrate);
    }

    #[test]
    fn test_missing_preset_list() {
        assert!(matches!(extract(&json!({})), Err(Error::MissingPreset)));
        assert!(matches!(
            extract(&json!({"PresetList": []})),
            Err(Error::MissingPreset)
        ));
        assert!(matches!(
            extract(&json!({"PresetList": "nope"})),
            Err(Error::MissingPreset)
        ));
    }

    #[test]
    fn test_load_document_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load_document(&missing),
            Err(Error::DocumentNotFound { .. })
        ));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{\"PresetList\": [").unwrap();
        assert!(matches!(
            load_document(&bad),
            Err(Error::DocumentParse { .. })
        ));
    }
}
