use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::settings::AppSettings;

/// Response to signup and login: the opaque session identity.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user_id: String,
}

/// Stored profile as returned by `GET /profile/get/{uid}`. The backend owns
/// the schema; only the fields the client actually reads are typed, the rest
/// ride along untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub identity: Option<Identity>,
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub preferred_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Profile {
    /// Preferred display name, if the profile carries one.
    pub fn display_name(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .and_then(|i| i.preferred_name.as_deref())
            .or(self.name.as_deref())
    }
}

/// Optional overrides for the speech synthesis payload.
#[derive(Debug, Clone, Default)]
pub struct SpeakOptions {
    pub voice_id: Option<String>,
    pub model_id: Option<String>,
    pub voice_settings: Option<String>,
    pub language: Option<String>,
}

impl From<&AppSettings> for SpeakOptions {
    fn from(settings: &AppSettings) -> Self {
        Self {
            voice_id: None,
            model_id: Some(settings.speak_model_id.clone()),
            voice_settings: None,
            language: Some(settings.speak_language.clone()),
        }
    }
}

/// What the speech endpoint answered with. Direct and base64-encoded audio
/// are both decoded to bytes; a URL form defers the fetch to the caller.
#[derive(Debug, Clone)]
pub enum SpeakReply {
    AudioBytes { bytes: Vec<u8>, text: String },
    AudioUrl { url: String, text: String },
    Text(String),
}
