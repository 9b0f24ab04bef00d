//! Backend client and conversation-surface tests against a mocked server.

use std::sync::Arc;
use std::time::Duration;

use twin_studio::api::{ApiClient, ApiError, SpeakOptions, SpeakReply};
use twin_studio::chat::{ChatSession, Sender, VoiceChat, FALLBACK_REPLY};
use twin_studio::media::sim::SimAudioSink;
use twin_studio::media::Capabilities;
use twin_studio::routes::Route;
use twin_studio::session::SessionContext;
use twin_studio::settings::AppSettings;
use twin_studio::wizard::{self, profile::TopicPayload, steps::PersonalForm, WizardFlow};

fn signed_in() -> SessionContext {
    let session = SessionContext::new();
    session.set_identity("u1");
    session
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn signup_stores_the_identity() {
        let mut server = mockito::Server::new_async().await;
        let _m1 = server
            .mock("POST", "/auth/signup")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"user_id":"u-new"}"#)
            .create_async()
            .await;

        let api = ApiClient::new(server.url());
        let session = SessionContext::new();
        let uid = api
            .signup(&session, "Ava", "ava@example.test", "hunter2")
            .await
            .unwrap();

        assert_eq!(uid, "u-new");
        assert_eq!(session.identity().as_deref(), Some("u-new"));
    }

    #[tokio::test]
    async fn login_failure_surfaces_the_detail_message() {
        let mut server = mockito::Server::new_async().await;
        let _m2 = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"Invalid credentials"}"#)
            .create_async()
            .await;

        let api = ApiClient::new(server.url());
        let session = SessionContext::new();
        let err = api
            .login(&session, "ava@example.test", "wrong")
            .await
            .unwrap_err();

        match err {
            ApiError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid credentials");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn save_profile_merges_the_user_id_into_the_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/profile")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "user_id": "u1",
                "preferred_name": "Av",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let api = ApiClient::new(server.url());
        api.save_profile("u1", serde_json::json!({ "preferred_name": "Av" }))
            .await
            .unwrap();
        _m.assert_async().await;
    }
}

mod text_chat {
    use super::*;

    #[tokio::test]
    async fn failed_profile_load_falls_back_to_generic_persona() {
        let mut server = mockito::Server::new_async().await;
        let _m3 = server
            .mock("GET", "/profile/get/u1")
            .with_status(500)
            .create_async()
            .await;

        let chat = ChatSession::open(ApiClient::new(server.url()), &signed_in())
            .await
            .unwrap();
        assert_eq!(chat.display_name(), "AI Assistant");
    }

    #[tokio::test]
    async fn reply_comes_from_the_backend() {
        let mut server = mockito::Server::new_async().await;
        let _m4 = server
            .mock("GET", "/profile/get/u1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"Ava","identity":{"preferred_name":"Av"}}"#)
            .create_async()
            .await;
        let _m5 = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"reply":"hello from the twin"}"#)
            .create_async()
            .await;

        let mut chat = ChatSession::open(ApiClient::new(server.url()), &signed_in())
            .await
            .unwrap();
        assert_eq!(chat.display_name(), "Av");

        let reply = chat.send("hi there").await;
        assert_eq!(reply.sender, Sender::Twin);
        assert_eq!(reply.text, "hello from the twin");
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.messages()[0].sender, Sender::User);
    }

    #[tokio::test]
    async fn failed_send_still_produces_a_reply() {
        let mut server = mockito::Server::new_async().await;
        let _m6 = server
            .mock("GET", "/profile/get/u1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"Ava"}"#)
            .create_async()
            .await;
        let _m7 = server
            .mock("POST", "/chat")
            .with_status(502)
            .create_async()
            .await;

        let mut chat = ChatSession::open(ApiClient::new(server.url()), &signed_in())
            .await
            .unwrap();
        let reply = chat.send("hi").await;
        assert_eq!(reply.text, FALLBACK_REPLY);
        assert_eq!(chat.messages().len(), 2);
    }

    #[tokio::test]
    async fn chat_requires_a_signed_in_user() {
        let result = ChatSession::open(ApiClient::new("http://localhost:9"), &SessionContext::new())
            .await;
        assert!(matches!(result, Err(ApiError::Unauthenticated)));
    }
}

mod wizard_finish {
    use super::*;

    fn completed_flow() -> WizardFlow {
        let mut flow = WizardFlow::new();
        let mut personal = PersonalForm::prefill(flow.profile());
        personal.full_name = "Ava Example".into();
        personal.nicknames = "Av, Avs".into();
        flow.submit(personal.submit()).unwrap();
        flow.submit(TopicPayload::Professional(Default::default()))
            .unwrap();
        flow.submit(TopicPayload::Background(Default::default()))
            .unwrap();
        flow.submit(TopicPayload::Personality(Default::default()))
            .unwrap();
        flow.submit(TopicPayload::Characteristics(Default::default()))
            .unwrap();
        flow
    }

    #[tokio::test]
    async fn finish_syncs_the_aggregate_and_hands_off_to_share() {
        let mut server = mockito::Server::new_async().await;
        let sync_mock = server
            .mock("POST", "/profile/sync/u1")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "user_id": "u1",
                "personal": { "full_name": "Ava Example", "nicknames": ["Av", "Avs"] }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let api = ApiClient::new(server.url());
        let route = wizard::finish(&api, &signed_in(), &completed_flow()).await;

        assert_eq!(route, Route::Share);
        sync_mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_sync_still_lands_on_share() {
        let mut server = mockito::Server::new_async().await;
        let _m8 = server
            .mock("POST", "/profile/sync/u1")
            .with_status(500)
            .create_async()
            .await;

        let api = ApiClient::new(server.url());
        let route = wizard::finish(&api, &signed_in(), &completed_flow()).await;
        assert_eq!(route, Route::Share);
    }
}

mod voice_chat {
    use super::*;

    fn caps() -> Capabilities {
        Capabilities {
            speech_recognition: true,
        }
    }

    async fn open_chat(server: &mockito::ServerGuard) -> VoiceChat {
        VoiceChat::open(
            ApiClient::new(server.url()),
            &signed_in(),
            Arc::new(SimAudioSink::with_playback_duration(Duration::from_millis(
                30,
            ))),
            &caps(),
            SpeakOptions::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn binary_audio_reply_is_played_and_recorded() {
        let mut server = mockito::Server::new_async().await;
        let _m9 = server
            .mock("GET", "/profile/get/u1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"Ava","voice_id":"v1"}"#)
            .create_async()
            .await;
        let _m10 = server
            .mock("POST", "/chat/speak")
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(vec![1u8; 2048])
            .create_async()
            .await;

        let mut chat = open_chat(&server).await;
        let reply = chat.say("hello").await;

        assert_eq!(reply.text, "AI responded with voice (2KB audio)");
        assert!(chat.is_playing().await);

        // The handle is released once playback reaches the end on its own.
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!chat.is_playing().await);

        let recent: Vec<_> = chat.recent().map(|m| m.sender).collect();
        assert_eq!(recent, vec![Sender::User, Sender::Twin]);
    }

    #[tokio::test]
    async fn speak_failure_records_the_fallback_reply() {
        let mut server = mockito::Server::new_async().await;
        let _m11 = server
            .mock("GET", "/profile/get/u1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"Ava"}"#)
            .create_async()
            .await;
        let _m12 = server
            .mock("POST", "/chat/speak")
            .with_status(500)
            .create_async()
            .await;

        let mut chat = open_chat(&server).await;
        let reply = chat.say("hello").await;
        assert_eq!(
            reply.text,
            twin_studio::chat::voice::VOICE_FALLBACK_REPLY
        );
        assert!(!chat.is_playing().await);
    }

    #[tokio::test]
    async fn configured_speech_defaults_reach_the_payload() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/profile/get/u1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"Ava"}"#)
            .create_async()
            .await;
        let speak_mock = server
            .mock("POST", "/chat/speak")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model_id": "eleven_turbo_v2",
                "language": "es",
                "voice_id": "default",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text":"hola"}"#)
            .create_async()
            .await;

        let mut settings = AppSettings::default();
        settings.speak_model_id = "eleven_turbo_v2".to_string();
        settings.speak_language = "es".to_string();

        let api = ApiClient::new(server.url());
        let reply = api
            .speak("u1", "hola", &SpeakOptions::from(&settings))
            .await
            .unwrap();
        assert!(matches!(reply, SpeakReply::Text(t) if t == "hola"));
        speak_mock.assert_async().await;
    }

    #[tokio::test]
    async fn reset_clears_history_and_playback() {
        let mut server = mockito::Server::new_async().await;
        let _m13 = server
            .mock("GET", "/profile/get/u1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"Ava"}"#)
            .create_async()
            .await;
        let _m14 = server
            .mock("POST", "/chat/speak")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text":"sure thing"}"#)
            .create_async()
            .await;

        let mut chat = open_chat(&server).await;
        chat.say("hello").await;
        assert_eq!(chat.history().count(), 2);

        chat.reset().await;
        assert_eq!(chat.history().count(), 0);
        assert!(!chat.is_playing().await);
    }
}
