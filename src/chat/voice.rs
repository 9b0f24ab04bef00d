//! Voice conversation with the twin.
//!
//! Gated on the speech-recognition capability probe. Replies arrive as
//! audio in one of several shapes; whatever form they take, at most one
//! playback runs at a time and its handle is released when playback ends.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use uuid::Uuid;

use crate::api::{ApiClient, ApiError, SpeakOptions, SpeakReply};
use crate::chat::{ChatMessage, Sender, FALLBACK_DISPLAY_NAME};
use crate::media::{AudioSink, Capabilities, PlaybackHandle};
use crate::session::SessionContext;

/// How many of the stored exchanges the conversation view shows.
pub const DISPLAY_WINDOW: usize = 4;

/// Upper bound on stored history; older messages fall off the front.
const HISTORY_CAP: usize = 64;

/// Reply recorded when synthesis fails outright.
pub const VOICE_FALLBACK_REPLY: &str =
    "I'm sorry, I couldn't process your request. Please try again.";

#[derive(Debug, Clone)]
pub enum VoiceChatError {
    /// The platform has no speech recognition; the surface is unavailable.
    SpeechUnsupported,
    Unauthenticated,
}

impl std::fmt::Display for VoiceChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceChatError::SpeechUnsupported => {
                write!(f, "Speech recognition is not supported here")
            }
            VoiceChatError::Unauthenticated => write!(f, "No user ID found"),
        }
    }
}

impl std::error::Error for VoiceChatError {}

/// One voice conversation. History is a bounded ring; the UI only ever
/// renders the tail of it.
pub struct VoiceChat {
    api: ApiClient,
    user_id: String,
    display_name: String,
    sink: Arc<dyn AudioSink>,
    options: SpeakOptions,
    history: VecDeque<ChatMessage>,
    playback: Arc<Mutex<Option<(Uuid, Box<dyn PlaybackHandle>)>>>,
}

impl VoiceChat {
    /// Open a voice chat for the signed-in user. Fails when the capability
    /// probe found no speech recognition; the profile fetch stays soft, as
    /// in the text chat.
    pub async fn open(
        api: ApiClient,
        session: &SessionContext,
        sink: Arc<dyn AudioSink>,
        capabilities: &Capabilities,
        options: SpeakOptions,
    ) -> Result<Self, VoiceChatError> {
        if !capabilities.speech_recognition {
            return Err(VoiceChatError::SpeechUnsupported);
        }
        let user_id =
            ApiClient::require_identity(session).map_err(|_| VoiceChatError::Unauthenticated)?;

        let display_name = match api.get_profile(&user_id).await {
            Ok(profile) => profile
                .display_name()
                .unwrap_or(FALLBACK_DISPLAY_NAME)
                .to_string(),
            Err(e) => {
                log::warn!("Profile load failed, using fallback persona: {}", e);
                FALLBACK_DISPLAY_NAME.to_string()
            }
        };

        Ok(Self {
            api,
            user_id,
            display_name,
            sink,
            options,
            history: VecDeque::new(),
            playback: Arc::new(Mutex::new(None)),
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn history(&self) -> impl Iterator<Item = &ChatMessage> {
        self.history.iter()
    }

    /// The tail of the history the conversation view renders.
    pub fn recent(&self) -> impl Iterator<Item = &ChatMessage> {
        let skip = self.history.len().saturating_sub(DISPLAY_WINDOW);
        self.history.iter().skip(skip)
    }

    /// Send recognized speech to the twin and play whatever comes back.
    /// Always records a reply, falling back to the canned one on error.
    pub async fn say(&mut self, text: &str) -> ChatMessage {
        self.push(ChatMessage::now(Sender::User, text));

        let reply_text = match self.api.speak(&self.user_id, text, &self.options).await {
            Ok(SpeakReply::AudioBytes { bytes, text }) => {
                self.play(bytes).await;
                text
            }
            Ok(SpeakReply::AudioUrl { url, text }) => {
                match self.api.fetch_audio(&url).await {
                    Ok(bytes) => self.play(bytes).await,
                    Err(e) => log::warn!("Audio fetch failed: {}", e),
                }
                text
            }
            Ok(SpeakReply::Text(text)) => text,
            Err(e) => {
                log::warn!("Speak failed, using fallback reply: {}", e);
                VOICE_FALLBACK_REPLY.to_string()
            }
        };

        let message = ChatMessage::now(Sender::Twin, reply_text);
        self.push(message.clone());
        message
    }

    pub async fn is_playing(&self) -> bool {
        self.playback.lock().await.is_some()
    }

    pub async fn stop_playback(&self) {
        if let Some((_, handle)) = self.playback.lock().await.take() {
            handle.stop();
        }
    }

    /// Clear the conversation and stop any playback.
    pub async fn reset(&mut self) {
        self.history.clear();
        self.stop_playback().await;
    }

    fn push(&mut self, message: ChatMessage) {
        if self.history.len() == HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(message);
    }

    /// Start playback, replacing whatever was still going. The handle is
    /// dropped from the slot when playback finishes on its own; a later
    /// playback that replaced it is left alone.
    async fn play(&self, bytes: Vec<u8>) {
        let (done_tx, done_rx) = oneshot::channel();
        match self.sink.play(bytes, done_tx) {
            Ok(handle) => {
                let generation = Uuid::new_v4();
                {
                    let mut slot = self.playback.lock().await;
                    if let Some((_, old)) = slot.take() {
                        old.stop();
                    }
                    *slot = Some((generation, handle));
                }

                let slot = self.playback.clone();
                tokio::spawn(async move {
                    if done_rx.await.is_ok() {
                        let mut guard = slot.lock().await;
                        if matches!(&*guard, Some((g, _)) if *g == generation) {
                            *guard = None;
                        }
                    }
                });
            }
            Err(e) => log::warn!("Playback failed to start: {}", e),
        }
    }
}
