//! Session identity shared across pages.
//!
//! The identity is an opaque user id handed out at signup/login. It is the
//! only cross-page mutable state: written once at authentication, read by
//! every authenticated call, cleared on logout. It is passed explicitly to
//! whatever needs it rather than looked up ambiently.

use std::sync::{Arc, Mutex};

/// Tab-scoped session context. Cheap to clone; clones share the identity.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    identity: Arc<Mutex<Option<String>>>,
    /// Reference to the captured profile photo, kept after a successful
    /// voice-clone upload so later surfaces can show it.
    profile_image: Arc<Mutex<Option<String>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single initialization point, called when signup or login succeeds.
    pub fn set_identity(&self, user_id: impl Into<String>) {
        let mut guard = self.identity.lock().unwrap();
        *guard = Some(user_id.into());
    }

    /// The current user id, if authenticated.
    pub fn identity(&self) -> Option<String> {
        self.identity.lock().unwrap().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.lock().unwrap().is_some()
    }

    pub fn set_profile_image(&self, reference: impl Into<String>) {
        let mut guard = self.profile_image.lock().unwrap();
        *guard = Some(reference.into());
    }

    pub fn profile_image(&self) -> Option<String> {
        self.profile_image.lock().unwrap().clone()
    }

    /// Clear everything session-scoped on logout.
    pub fn clear(&self) {
        *self.identity.lock().unwrap() = None;
        *self.profile_image.lock().unwrap() = None;
    }
}
