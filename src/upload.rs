//! Voice-clone upload packaging.
//!
//! The multipart submission carries the session identity, a fixed display
//! name/description, the WAV audio, a JSON metadata blob, and a transient
//! local reference to the photo. The photo binary itself never leaves the
//! device here; only its reference travels with the form.

use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use uuid::Uuid;

use crate::audio::AudioSample;
use crate::settings::AppSettings;

/// Upload progress is synthetic: a fixed ticker advances it in steps of
/// [`PROGRESS_STEP`] up to [`PROGRESS_HOLD_AT`], then it snaps to 100 when
/// the response arrives. reqwest's buffered send exposes no transfer
/// telemetry, so the percentage is cosmetic rather than measured; a
/// streaming transport would be needed for real byte-level progress.
pub const PROGRESS_STEP: u8 = 10;
pub const PROGRESS_HOLD_AT: u8 = 90;

/// Transient local reference naming a captured photo for this attempt.
pub fn photo_reference(attempt_id: Uuid) -> String {
    format!("local://photo/{}.jpg", attempt_id)
}

/// Everything needed to build one voice-clone submission.
#[derive(Debug, Clone)]
pub struct CloneSubmission {
    pub user_id: String,
    pub voice_name: String,
    pub voice_description: String,
    pub wav_bytes: Vec<u8>,
    pub duration_secs: u64,
    pub img_path: String,
}

impl CloneSubmission {
    pub fn new(
        settings: &AppSettings,
        user_id: impl Into<String>,
        sample: &AudioSample,
        img_path: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            voice_name: settings.voice_name.clone(),
            voice_description: settings.voice_description.clone(),
            wav_bytes: sample.wav_bytes.clone(),
            duration_secs: sample.duration_secs,
            img_path: img_path.into(),
        }
    }

    /// The JSON-encoded `labels` metadata blob.
    pub fn labels_json(&self) -> String {
        json!({
            "audio_duration": self.duration_secs,
            "photo_captured": true,
            "timestamp": Utc::now().to_rfc3339(),
        })
        .to_string()
    }

    /// Assemble the multipart form for `POST /voice/ivc/create`.
    pub fn into_form(self) -> Result<Form, String> {
        let labels = self.labels_json();
        let audio_part = Part::bytes(self.wav_bytes)
            .file_name("voice_sample.wav")
            .mime_str("audio/wav")
            .map_err(|e| format!("audio part: {}", e))?;

        Ok(Form::new()
            .text("user_id", self.user_id)
            .text("name", self.voice_name)
            .text("description", self.voice_description)
            .part("files", audio_part)
            .text("labels", labels)
            .text("img_path", self.img_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(duration_secs: u64) -> AudioSample {
        AudioSample {
            wav_bytes: vec![0u8; 64],
            duration_secs,
            sample_rate: 16_000,
        }
    }

    #[test]
    fn labels_carry_duration_and_capture_flag() {
        let settings = AppSettings::default();
        let submission =
            CloneSubmission::new(&settings, "uid-1", &sample(20), photo_reference(Uuid::new_v4()));
        let labels: serde_json::Value = serde_json::from_str(&submission.labels_json()).unwrap();
        assert_eq!(labels["audio_duration"], 20);
        assert_eq!(labels["photo_captured"], true);
        assert!(labels["timestamp"].as_str().is_some());
    }

    #[test]
    fn submission_uses_configured_display_fields() {
        let settings = AppSettings::default();
        let submission = CloneSubmission::new(&settings, "uid-1", &sample(20), "local://p");
        assert_eq!(submission.voice_name, "UserVoice");
        assert_eq!(submission.voice_description, "Cloned voice with noise removal");
        assert!(submission.into_form().is_ok());
    }

    #[test]
    fn photo_reference_is_attempt_scoped() {
        let a = photo_reference(Uuid::new_v4());
        let b = photo_reference(Uuid::new_v4());
        assert_ne!(a, b);
        assert!(a.starts_with("local://photo/"));
    }
}
