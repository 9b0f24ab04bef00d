//! Application surfaces and the navigation rules between them.

use crate::session::SessionContext;

/// Every navigable surface of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Signup,
    Login,
    /// Photo + voice capture session.
    MediaCapture,
    /// Profile wizard, 1-based step number.
    Wizard(u8),
    Share,
    Chat,
    VoiceChat,
}

impl Default for Route {
    fn default() -> Self {
        Route::Landing
    }
}

/// Landing-page entry: signed-in users go straight to sharing, everyone
/// else gets the login form first.
pub fn get_started(session: &SessionContext) -> Route {
    if session.is_authenticated() {
        Route::Share
    } else {
        Route::Login
    }
}

/// Logging out clears the stored identity before returning to the landing
/// page, so a later get-started cannot see a stale user.
pub fn logout(session: &SessionContext) -> Route {
    session.clear();
    Route::Landing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_started_requires_a_signed_in_user() {
        let session = SessionContext::new();
        assert_eq!(get_started(&session), Route::Login);

        session.set_identity(String::from("user-1"));
        assert_eq!(get_started(&session), Route::Share);
    }

    #[test]
    fn logout_clears_identity() {
        let session = SessionContext::new();
        session.set_identity(String::from("user-1"));

        assert_eq!(logout(&session), Route::Landing);
        assert!(!session.is_authenticated());
        assert_eq!(get_started(&session), Route::Login);
    }
}
