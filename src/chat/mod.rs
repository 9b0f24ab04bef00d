//! Conversation surfaces for talking with the twin.
//!
//! The text chat keeps a linear transcript and degrades gracefully: a failed
//! profile load falls back to a generic persona, and a failed send still
//! produces a canned reply so the conversation never dead-ends on an error
//! screen.

pub mod voice;

pub use voice::VoiceChat;

use chrono::{DateTime, Utc};

use crate::api::{ApiClient, ApiError};
use crate::session::SessionContext;

/// Persona shown when the profile cannot be loaded or names nobody.
pub const FALLBACK_DISPLAY_NAME: &str = "AI Assistant";

/// Canned reply used when the chat endpoint fails.
pub const FALLBACK_REPLY: &str = "I'm here to help! I can assist you with a wide range of topics including answering questions, providing recommendations, and helping with various tasks. What would you like to know about me?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Twin,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl ChatMessage {
    fn now(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// One text conversation with the twin.
pub struct ChatSession {
    api: ApiClient,
    user_id: String,
    display_name: String,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Open a chat for the signed-in user. The profile fetch is soft: when
    /// it fails the chat still opens under the generic persona.
    pub async fn open(api: ApiClient, session: &SessionContext) -> Result<Self, ApiError> {
        let user_id = ApiClient::require_identity(session)?;

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
            messages: Vec::new(),
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send a message. The user's message is appended immediately; the reply
    /// comes from the backend, or from the canned fallback when the call
    /// fails, so a reply always arrives.
    pub async fn send(&mut self, text: impl Into<String>) -> ChatMessage {
        let text = text.into();
        self.messages.push(ChatMessage::now(Sender::User, &text));

        let reply = match self.api.send_message(&self.user_id, &text).await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("Chat send failed, using fallback reply: {}", e);
                FALLBACK_REPLY.to_string()
            }
        };

        let message = ChatMessage::now(Sender::Twin, reply);
        self.messages.push(message.clone());
        message
    }
}
