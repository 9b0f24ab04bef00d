use once_cell::sync::Lazy;
use reqwest::multipart::Form;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::session::SessionContext;
use crate::wizard::profile::SyncPayload;

use super::types::{AuthResponse, Profile, SpeakOptions, SpeakReply};

/// Shared HTTP client for reuse across requests (avoids TLS handshake
/// overhead). `reqwest::Client` clones share the connection pool.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .expect("Failed to build HTTP client")
});

/// Errors that can occur when talking to the backend.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// No session identity is present; checked locally before any network
    /// call that requires one.
    Unauthenticated,
    /// Network/transport error.
    Network(String),
    /// The backend answered with a non-2xx status.
    Api { status: u16, message: String },
    /// The response body could not be interpreted.
    Parse(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthenticated => write!(f, "No user ID found"),
            ApiError::Network(e) => write!(f, "Network error: {}", e),
            ApiError::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            ApiError::Parse(e) => write!(f, "Failed to parse API response: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

/// Default voice settings sent with speech requests when no override is
/// given. The backend expects this as a JSON-encoded string field.
fn default_voice_settings() -> String {
    json!({
        "stability": 0.5,
        "similarity_boost": 0.75,
        "style": 0.0,
        "use_speaker_boost": true
    })
    .to_string()
}

/// Client for the digital-twin backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: HTTP_CLIENT.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Local precondition shared by all authenticated operations.
    pub fn require_identity(session: &SessionContext) -> Result<String, ApiError> {
        session.identity().ok_or(ApiError::Unauthenticated)
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    /// `POST /auth/signup`. On success the returned identity becomes the
    /// session identity.
    pub async fn signup(
        &self,
        session: &SessionContext,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, ApiError> {
        let body = json!({ "name": name, "email": email, "password": password });
        let value = self.post_json("/auth/signup", &body).await?;
        let auth: AuthResponse =
            serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))?;
        session.set_identity(&auth.user_id);
        Ok(auth.user_id)
    }

    /// `POST /auth/login`. On success the returned identity becomes the
    /// session identity.
    pub async fn login(
        &self,
        session: &SessionContext,
        email: &str,
        password: &str,
    ) -> Result<String, ApiError> {
        let body = json!({ "email": email, "password": password });
        let value = self.post_json("/auth/login", &body).await?;
        let auth: AuthResponse =
            serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))?;
        session.set_identity(&auth.user_id);
        Ok(auth.user_id)
    }

    // ------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------

    /// `GET /profile/get/{uid}`.
    pub async fn get_profile(&self, uid: &str) -> Result<Profile, ApiError> {
        log::debug!("Fetching profile for user ID: {}", uid);
        let value = self.get_json(&format!("/profile/get/{}", uid)).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// `POST /profile` with `{user_id, ...fields}`.
    pub async fn save_profile(&self, uid: &str, fields: Value) -> Result<(), ApiError> {
        let mut body = match fields {
            Value::Object(map) => map,
            other => {
                return Err(ApiError::Parse(format!(
                    "profile fields must be an object, got {}",
                    other
                )))
            }
        };
        body.insert("user_id".to_string(), Value::String(uid.to_string()));
        self.post_json("/profile", &Value::Object(body)).await?;
        Ok(())
    }

    /// `POST /profile/sync/{uid}` with the full wizard aggregate.
    pub async fn sync_profile(&self, uid: &str, payload: &SyncPayload) -> Result<(), ApiError> {
        let body = serde_json::to_value(payload).map_err(|e| ApiError::Parse(e.to_string()))?;
        self.post_json(&format!("/profile/sync/{}", uid), &body)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Voice clone
    // ------------------------------------------------------------------

    /// `POST /voice/ivc/create` with a multipart submission. Returns the
    /// clone job result as raw JSON; the backend owns its shape.
    pub async fn create_voice_clone(&self, form: Form) -> Result<Value, ApiError> {
        let response = self
            .http
            .post(format!("{}/voice/ivc/create", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::read_json_response(response).await
    }

    // ------------------------------------------------------------------
    // Chat and speech
    // ------------------------------------------------------------------

    /// `POST /chat`. Returns the twin's reply text.
    pub async fn send_message(&self, uid: &str, message: &str) -> Result<String, ApiError> {
        let body = json!({ "user_id": uid, "message": message });
        let value = self.post_json("/chat", &body).await?;
        value
            .get("reply")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Parse("chat response missing reply".to_string()))
    }

    /// `POST /chat/speak`. Resolves the voice id from the stored profile
    /// first (soft: a failed profile fetch just falls through to the
    /// option/default), then requests synthesis. The response is either
    /// binary audio or JSON carrying audio in one of several forms.
    pub async fn speak(
        &self,
        uid: &str,
        text: &str,
        options: &SpeakOptions,
    ) -> Result<SpeakReply, ApiError> {
        let voice_id = match self.get_profile(uid).await {
            Ok(profile) => profile.voice_id,
            Err(e) => {
                log::warn!("Speak: profile fetch failed, using default voice: {}", e);
                None
            }
        };
        let voice_id = voice_id
            .or_else(|| options.voice_id.clone())
            .unwrap_or_else(|| "default".to_string());
        log::debug!("Using voice_id: {}", voice_id);

        let payload = json!({
            "user_id": uid,
            "message": text,
            "voice_id": voice_id,
            "text": text,
            "model_id": options
                .model_id
                .clone()
                .unwrap_or_else(|| "eleven_multilingual_v2".to_string()),
            "voice_settings": options
                .voice_settings
                .clone()
                .unwrap_or_else(default_voice_settings),
            "language": options.language.clone().unwrap_or_else(|| "en".to_string()),
        });

        let response = self
            .http
            .post(format!("{}/chat/speak", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: resolve_error_message(&message, status.as_u16()),
            });
        }

        let is_audio = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("audio"));

        if is_audio {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ApiError::Network(e.to_string()))?
                .to_vec();
            let text = format!("AI responded with voice ({}KB audio)", bytes.len() / 1024);
            return Ok(SpeakReply::AudioBytes { bytes, text });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(interpret_speak_json(body)?)
    }

    /// Fetch a synthesized audio resource referenced by URL.
    pub async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: format!("HTTP {}", status),
            });
        }
        Ok(response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?
            .to_vec())
    }

    // ------------------------------------------------------------------
    // Request plumbing
    // ------------------------------------------------------------------

    async fn get_json(&self, endpoint: &str) -> Result<Value, ApiError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, endpoint))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::read_json_response(response).await
    }

    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::read_json_response(response).await
    }

    /// Shared response handling: read the body as text, try JSON, fall back
    /// to raw text. Non-2xx extracts a `detail` field if present, else the
    /// body, else the bare status.
    async fn read_json_response(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: resolve_error_message(&raw, status.as_u16()),
            });
        }

        if raw.is_empty() {
            return Ok(Value::Null);
        }
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            // Some endpoints answer with plain text; surface it as a string.
            Err(_) => Ok(Value::String(raw)),
        }
    }
}

/// Extract the most useful error message from a failure body.
fn resolve_error_message(raw: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        if let Some(detail) = value.get("detail").and_then(Value::as_str) {
            return detail.to_string();
        }
    }
    if !raw.is_empty() {
        return raw.to_string();
    }
    format!("HTTP {}", status)
}

/// Decode the JSON form of a speech response.
fn interpret_speak_json(body: Value) -> Result<SpeakReply, ApiError> {
    let spoken_text = body
        .get("text")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(url) = body.get("audio_url").and_then(Value::as_str) {
        return Ok(SpeakReply::AudioUrl {
            url: url.to_string(),
            text: spoken_text.unwrap_or_else(|| "AI voice response".to_string()),
        });
    }

    if let Some(encoded) = body.get("audio").and_then(Value::as_str) {
        // Tolerate a data-URL prefix on the base64 payload.
        let encoded = encoded.rsplit(',').next().unwrap_or(encoded);
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| ApiError::Parse(format!("bad base64 audio: {}", e)))?;
        return Ok(SpeakReply::AudioBytes {
            bytes,
            text: spoken_text.unwrap_or_else(|| "AI voice response".to_string()),
        });
    }

    let text = spoken_text
        .or_else(|| {
            body.get("response")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "I'm here to help!".to_string());
    Ok(SpeakReply::Text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_error_matches_missing_identity() {
        let session = SessionContext::new();
        let err = ApiClient::require_identity(&session).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));

        session.set_identity("uid-9");
        assert_eq!(ApiClient::require_identity(&session).unwrap(), "uid-9");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("https://example.test///");
        assert_eq!(client.base_url(), "https://example.test");
    }

    #[test]
    fn error_message_prefers_detail_field() {
        assert_eq!(
            resolve_error_message(r#"{"detail":"email taken"}"#, 409),
            "email taken"
        );
        assert_eq!(resolve_error_message("plain failure", 500), "plain failure");
        assert_eq!(resolve_error_message("", 502), "HTTP 502");
    }

    #[test]
    fn speak_json_audio_url_form() {
        let reply =
            interpret_speak_json(json!({"audio_url": "https://cdn.test/a.mp3", "text": "hi"}))
                .unwrap();
        match reply {
            SpeakReply::AudioUrl { url, text } => {
                assert_eq!(url, "https://cdn.test/a.mp3");
                assert_eq!(text, "hi");
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn speak_json_base64_audio_form() {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]);
        let reply = interpret_speak_json(json!({ "audio": encoded })).unwrap();
        match reply {
            SpeakReply::AudioBytes { bytes, .. } => assert_eq!(bytes, vec![1, 2, 3]),
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn speak_json_text_fallback_chain() {
        let reply = interpret_speak_json(json!({"response": "hello there"})).unwrap();
        assert!(matches!(reply, SpeakReply::Text(t) if t == "hello there"));

        let reply = interpret_speak_json(json!({})).unwrap();
        assert!(matches!(reply, SpeakReply::Text(t) if t == "I'm here to help!"));
    }
}
