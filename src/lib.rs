pub mod api;
pub mod audio;
pub mod chat;
pub mod effects;
pub mod media;
pub mod routes;
pub mod session;
pub mod settings;
pub mod state_machine;
pub mod upload;
pub mod wizard;

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use effects::EffectRunner;
use routes::Route;
use state_machine::{reduce, CameraPhase, CaptureLimits, Effect, Event, RecordingPhase, State};

/// UI state published to the frontend.
/// Tagged union format: { "status": "photoReady" } or
/// { "status": "uploading", "progress": 40 }.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum UiState {
    AwaitingPhoto {
        #[serde(rename = "previewLive")]
        preview_live: bool,
        warning: Option<String>,
    },
    PhotoReady,
    AwaitingAudio {
        recording: bool,
        #[serde(rename = "elapsedSecs")]
        elapsed_secs: u64,
        warning: Option<String>,
    },
    AudioReady {
        #[serde(rename = "durationSecs")]
        duration_secs: u64,
        #[serde(rename = "canContinue")]
        can_continue: bool,
        playing: bool,
    },
    ReadyToUpload {
        #[serde(rename = "durationSecs")]
        duration_secs: u64,
        playing: bool,
    },
    Uploading {
        progress: u8,
    },
    Uploaded,
    Failed {
        message: String,
    },
}

/// Convert internal State to UiState for the frontend.
fn state_to_ui(state: &State, limits: &CaptureLimits) -> UiState {
    match state {
        State::AwaitingPhoto { camera, .. } => UiState::AwaitingPhoto {
            preview_live: matches!(camera, CameraPhase::Live),
            warning: match camera {
                CameraPhase::Unavailable { message } => Some(message.clone()),
                _ => None,
            },
        },
        State::PhotoReady { .. } => UiState::PhotoReady,
        State::AwaitingAudio { recording, .. } => {
            let (active, elapsed, warning) = match recording {
                RecordingPhase::Idle | RecordingPhase::Requesting => (false, 0, None),
                RecordingPhase::Recording { elapsed_secs }
                | RecordingPhase::Stopping { elapsed_secs } => (true, *elapsed_secs, None),
                RecordingPhase::Denied { message } => (false, 0, Some(message.clone())),
            };
            UiState::AwaitingAudio {
                recording: active,
                elapsed_secs: elapsed,
                warning,
            }
        }
        State::AudioReady {
            sample, playing, ..
        } => UiState::AudioReady {
            duration_secs: sample.duration_secs,
            can_continue: sample.duration_secs >= limits.min_record_secs,
            playing: *playing,
        },
        State::ReadyToUpload {
            sample, playing, ..
        } => UiState::ReadyToUpload {
            duration_secs: sample.duration_secs,
            playing: *playing,
        },
        State::Uploading { progress, .. } => UiState::Uploading {
            progress: *progress,
        },
        State::Uploaded { .. } => UiState::Uploaded,
        State::Failed { message, .. } => UiState::Failed {
            message: message.clone(),
        },
    }
}

/// Handle for dispatching events into a running capture loop.
#[derive(Clone)]
pub struct CaptureLoopHandle {
    tx: mpsc::Sender<Event>,
}

impl CaptureLoopHandle {
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.tx.send(event).await
    }
}

/// Run the capture state loop. Owns the state; every transition goes through
/// the reducer, and UI snapshots and navigation go out over watch channels.
/// The loop ends when the event channel closes.
pub async fn run_state_loop(
    limits: CaptureLimits,
    ui_tx: watch::Sender<UiState>,
    route_tx: watch::Sender<Route>,
    mut rx: mpsc::Receiver<Event>,
    tx: mpsc::Sender<Event>,
    effect_runner: Arc<dyn EffectRunner>,
) {
    let mut state = State::default();

    let _ = ui_tx.send(state_to_ui(&state, &limits));
    log::info!("Capture loop started");

    while let Some(event) = rx.recv().await {
        log::debug!("Received event: {:?}", event);

        let old_discriminant = std::mem::discriminant(&state);
        let (next, effects) = reduce(&state, event, &limits);
        let new_discriminant = std::mem::discriminant(&next);

        if old_discriminant != new_discriminant {
            log::info!("State transition: {:?} -> {:?}", state, next);
        }

        state = next;

        for eff in effects {
            match eff {
                Effect::EmitUi => {
                    let _ = ui_tx.send(state_to_ui(&state, &limits));
                }
                Effect::Navigate { route } => {
                    log::info!("Navigating to {:?}", route);
                    let _ = route_tx.send(route);
                }
                other => effect_runner.spawn(other, tx.clone()),
            }
        }
    }

    log::info!("Capture loop ended");
}
