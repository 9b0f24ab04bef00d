use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const SETTINGS_FILE_NAME: &str = "settings.json";
const APP_DIR_NAME: &str = "twin-studio";

/// Environment variable that overrides the configured backend origin.
pub const BACKEND_URL_ENV: &str = "TWIN_STUDIO_BACKEND_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Backend origin every API call is made against.
    pub backend_url: String,

    /// Recordings shorter than this cannot proceed to upload.
    pub min_record_secs: u64,

    /// Recording auto-stops when the timer reaches this value.
    pub max_record_secs: u64,

    /// Interval of the synthetic upload progress ticker.
    pub upload_tick_ms: u64,

    /// Camera capture resolution (front-facing, fixed).
    pub camera_width: u32,
    pub camera_height: u32,

    /// JPEG quality for the captured photo, 0-100.
    pub photo_quality: u8,

    /// Display name and description attached to the voice-clone submission.
    pub voice_name: String,
    pub voice_description: String,

    /// Defaults for the speech synthesis payload.
    pub speak_model_id: String,
    pub speak_language: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backend_url: "https://rz7fp2tv-8006.inc1.devtunnels.ms".to_string(),
            min_record_secs: 15,
            max_record_secs: 60,
            upload_tick_ms: 200,
            camera_width: 640,
            camera_height: 480,
            photo_quality: 80,
            voice_name: "UserVoice".to_string(),
            voice_description: "Cloned voice with noise removal".to_string(),
            speak_model_id: "eleven_multilingual_v2".to_string(),
            speak_language: "en".to_string(),
        }
    }
}

impl AppSettings {
    /// Load settings from the config dir, then apply env overrides.
    /// Any problem reading or parsing falls back to defaults.
    pub fn load() -> Self {
        let mut settings = match settings_path() {
            Ok(path) => load_from(&path),
            Err(e) => {
                log::warn!("Settings: {}", e);
                Self::default()
            }
        };

        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.is_empty() {
                settings.backend_url = url;
            }
        }

        // The API client joins paths onto this origin; a trailing slash
        // would produce double slashes in every request URL.
        while settings.backend_url.ends_with('/') {
            settings.backend_url.pop();
        }

        settings
    }
}

fn settings_path() -> Result<PathBuf, String> {
    let dir = dirs::config_dir().ok_or_else(|| "Could not determine config directory".to_string())?;
    Ok(dir.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
}

fn load_from(path: &PathBuf) -> AppSettings {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<AppSettings>(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Settings: failed to parse {:?}: {}", path, e);
                AppSettings::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppSettings::default(),
        Err(e) => {
            log::warn!("Settings: failed to read {:?}: {}", path, e);
            AppSettings::default()
        }
    }
}

/// Write a default settings file on first run so there is one to edit.
/// An existing file is left untouched.
pub fn ensure_settings_file() -> Result<(), String> {
    let path = settings_path()?;
    ensure_at(&path)
}

fn ensure_at(path: &PathBuf) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    save_to(path, &AppSettings::default())
}

fn save_to(path: &PathBuf, settings: &AppSettings) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory {:?}: {}", parent, e))?;
    }

    let contents =
        serde_json::to_string_pretty(settings).map_err(|e| format!("Serialize settings: {}", e))?;

    // Write atomically: temp file in the same directory, then rename.
    // This prevents a partial/corrupt settings.json on a crash mid-write.
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &contents)
        .map_err(|e| format!("Write temp settings {:?}: {}", tmp_path, e))?;

    // On Unix, rename atomically replaces the destination. On Windows it
    // fails if the destination exists, so remove it first.
    if cfg!(windows) && path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(format!("Remove existing settings file {:?}: {}", path, e));
            }
        }
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| format!("Rename temp settings {:?} to {:?}: {}", tmp_path, path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_capture_bounds() {
        let s = AppSettings::default();
        assert_eq!(s.min_record_secs, 15);
        assert_eq!(s.max_record_secs, 60);
        assert_eq!(s.upload_tick_ms, 200);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);

        let mut settings = AppSettings::default();
        settings.backend_url = "https://example.test".to_string();
        settings.min_record_secs = 10;
        save_to(&path, &settings).unwrap();

        let loaded = load_from(&path);
        assert_eq!(loaded.backend_url, "https://example.test");
        assert_eq!(loaded.min_record_secs, 10);
    }

    #[test]
    fn ensure_writes_defaults_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);

        ensure_at(&path).unwrap();
        assert_eq!(load_from(&path).min_record_secs, 15);

        let mut edited = AppSettings::default();
        edited.min_record_secs = 20;
        save_to(&path, &edited).unwrap();

        // A later startup must not clobber the edited file.
        ensure_at(&path).unwrap();
        assert_eq!(load_from(&path).min_record_secs, 20);
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();

        let loaded = load_from(&path);
        assert_eq!(loaded.max_record_secs, AppSettings::default().max_record_secs);
    }
}
