//! Backend API client.
//!
//! All calls are JSON over HTTPS against a single configured origin, except
//! the voice-clone upload (multipart) and speech synthesis (binary audio).

mod client;
mod types;

pub use client::{ApiClient, ApiError};
pub use types::{AuthResponse, Identity, Profile, SpeakOptions, SpeakReply};
