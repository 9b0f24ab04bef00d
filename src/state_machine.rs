//! Capture-session state machine.
//!
//! Single-writer pattern: all transitions go through [`reduce`], which takes
//! the current state and an event and returns the next state plus a list of
//! effects for the runner to execute. Device and network completions come
//! back as events carrying the attempt id they belong to; events from an
//! abandoned attempt are dropped.

use serde_json::Value;
use uuid::Uuid;

use crate::audio::AudioSample;
use crate::media::Photo;
use crate::routes::Route;
use crate::settings::AppSettings;
use crate::upload;

/// Recording duration bounds enforced by the reducer.
#[derive(Debug, Clone, Copy)]
pub struct CaptureLimits {
    pub min_record_secs: u64,
    pub max_record_secs: u64,
}

impl Default for CaptureLimits {
    fn default() -> Self {
        Self {
            min_record_secs: 15,
            max_record_secs: 60,
        }
    }
}

impl From<&AppSettings> for CaptureLimits {
    fn from(settings: &AppSettings) -> Self {
        Self {
            min_record_secs: settings.min_record_secs,
            max_record_secs: settings.max_record_secs,
        }
    }
}

/// How far camera acquisition has gotten while awaiting the photo.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraPhase {
    /// Stream requested, not yet granted.
    Starting,
    /// Live mirrored preview is running.
    Live,
    /// Access denied or capture failed; the warning stays visible and the
    /// user may try again. No automatic retry.
    Unavailable { message: String },
}

/// Microphone phase while awaiting the audio sample.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingPhase {
    /// Not recording yet (or ready to record again).
    Idle,
    /// Stream requested, not yet granted.
    Requesting,
    /// Actively capturing; timer increments once per second.
    Recording { elapsed_secs: u64 },
    /// Stop requested, waiting for the chunks to be combined.
    Stopping { elapsed_secs: u64 },
    /// Access denied; warning shown, stays on this step.
    Denied { message: String },
}

/// Authoritative state of one capture session. Created on page entry,
/// destroyed on navigation away or successful handoff.
#[derive(Debug, Clone)]
pub enum State {
    AwaitingPhoto {
        attempt: Uuid,
        camera: CameraPhase,
    },
    PhotoReady {
        attempt: Uuid,
        photo: Photo,
    },
    AwaitingAudio {
        attempt: Uuid,
        photo: Photo,
        recording: RecordingPhase,
    },
    AudioReady {
        attempt: Uuid,
        photo: Photo,
        sample: AudioSample,
        playing: bool,
    },
    ReadyToUpload {
        attempt: Uuid,
        photo: Photo,
        sample: AudioSample,
        playing: bool,
    },
    Uploading {
        attempt: Uuid,
        photo: Photo,
        sample: AudioSample,
        progress: u8,
    },
    Uploaded {
        attempt: Uuid,
        img_path: String,
    },
    Failed {
        attempt: Uuid,
        photo: Photo,
        sample: AudioSample,
        message: String,
    },
}

impl Default for State {
    fn default() -> Self {
        State::AwaitingPhoto {
            attempt: Uuid::new_v4(),
            camera: CameraPhase::Starting,
        }
    }
}

impl State {
    fn attempt(&self) -> Uuid {
        match self {
            State::AwaitingPhoto { attempt, .. }
            | State::PhotoReady { attempt, .. }
            | State::AwaitingAudio { attempt, .. }
            | State::AudioReady { attempt, .. }
            | State::ReadyToUpload { attempt, .. }
            | State::Uploading { attempt, .. }
            | State::Uploaded { attempt, .. }
            | State::Failed { attempt, .. } => *attempt,
        }
    }
}

/// Events fed to the reducer: user actions plus device/network completions.
#[derive(Debug, Clone)]
pub enum Event {
    /// Capture page entered; acquire the camera.
    PageEntered,
    /// Navigation away; all device resources must be released.
    PageLeft,

    // Camera
    CameraReady { id: Uuid },
    CameraDenied { id: Uuid, message: String },
    TakePhoto,
    PhotoCaptured { id: Uuid, photo: Photo },
    CaptureFailed { id: Uuid, message: String },
    RetakePhoto,
    ContinueToAudio,

    // Microphone
    StartRecording,
    MicrophoneReady { id: Uuid },
    MicrophoneDenied { id: Uuid, message: String },
    /// One-second timer tick while recording.
    RecordingTick { id: Uuid },
    StopRecording,
    RecordingFinished { id: Uuid, sample: AudioSample },
    RecordingFailed { id: Uuid, message: String },

    // Playback of the recorded sample
    TogglePlayback,
    PlaybackEnded { id: Uuid },

    // Upload
    ContinueToUpload,
    BeginUpload,
    UploadProgressTick { id: Uuid },
    UploadOk { id: Uuid, result: Value },
    UploadFail { id: Uuid, message: String },
}

/// Effects executed asynchronously by the runner after a transition.
#[derive(Debug, Clone)]
pub enum Effect {
    StartCamera { id: Uuid },
    CapturePhoto { id: Uuid },
    StopCamera,
    StartMicrophone { id: Uuid },
    /// Drive one-second RecordingTick events while the stream is open.
    StartRecordingTick { id: Uuid },
    StopMicrophone { id: Uuid },
    StartPlayback { id: Uuid, wav_bytes: Vec<u8> },
    StopPlayback,
    StartUpload { id: Uuid, sample: AudioSample, img_path: String },
    /// Drive synthetic UploadProgressTick events on a fixed interval.
    StartUploadProgressTick { id: Uuid },
    /// Persist the transient photo reference after a successful upload.
    PersistPhotoReference { img_path: String },
    /// Release every device/playback resource still held.
    ReleaseAll,
    /// Signal to emit UI state to the frontend.
    EmitUi,
    Navigate { route: Route },
}

/// Reducer: (state, event) -> (next_state, effects).
///
/// Rules:
/// - Never mutate state in place.
/// - Drop events whose id does not match the current attempt.
/// - Emit EmitUi after every visible change.
pub fn reduce(state: &State, event: Event, limits: &CaptureLimits) -> (State, Vec<Effect>) {
    use Effect::*;
    use State::*;

    let current = state.attempt();
    let stale = |eid: Uuid| eid != current;

    match (state, event) {
        // -----------------
        // Page lifecycle
        // -----------------
        (_, Event::PageEntered) => {
            let attempt = Uuid::new_v4();
            (
                AwaitingPhoto {
                    attempt,
                    camera: CameraPhase::Starting,
                },
                vec![StartCamera { id: attempt }, EmitUi],
            )
        }
        (_, Event::PageLeft) => (
            AwaitingPhoto {
                attempt: Uuid::new_v4(),
                camera: CameraPhase::Starting,
            },
            vec![ReleaseAll, EmitUi],
        ),

        // -----------------
        // AwaitingPhoto
        // -----------------
        (AwaitingPhoto { attempt, .. }, Event::CameraReady { id }) if *attempt == id => (
            AwaitingPhoto {
                attempt: *attempt,
                camera: CameraPhase::Live,
            },
            vec![EmitUi],
        ),
        (AwaitingPhoto { attempt, .. }, Event::CameraDenied { id, message }) if *attempt == id => {
            log::warn!("Camera unavailable: {}", message);
            (
                AwaitingPhoto {
                    attempt: *attempt,
                    camera: CameraPhase::Unavailable { message },
                },
                vec![EmitUi],
            )
        }
        (
            AwaitingPhoto {
                attempt,
                camera: CameraPhase::Live,
            },
            Event::TakePhoto,
        ) => (
            state.clone(),
            vec![CapturePhoto { id: *attempt }],
        ),
        (AwaitingPhoto { attempt, .. }, Event::PhotoCaptured { id, photo }) if *attempt == id => (
            // The camera stream is released as soon as the frame is taken.
            PhotoReady {
                attempt: *attempt,
                photo,
            },
            vec![StopCamera, EmitUi],
        ),
        (AwaitingPhoto { attempt, .. }, Event::CaptureFailed { id, message }) if *attempt == id => {
            log::warn!("Photo capture failed: {}", message);
            (
                AwaitingPhoto {
                    attempt: *attempt,
                    camera: CameraPhase::Unavailable { message },
                },
                vec![EmitUi],
            )
        }

        // -----------------
        // PhotoReady
        // -----------------
        (PhotoReady { .. }, Event::RetakePhoto) => {
            // Discard the stored image and re-acquire the stream.
            let attempt = Uuid::new_v4();
            (
                AwaitingPhoto {
                    attempt,
                    camera: CameraPhase::Starting,
                },
                vec![StartCamera { id: attempt }, EmitUi],
            )
        }
        (PhotoReady { attempt, photo }, Event::ContinueToAudio) => (
            AwaitingAudio {
                attempt: *attempt,
                photo: photo.clone(),
                recording: RecordingPhase::Idle,
            },
            vec![EmitUi],
        ),

        // -----------------
        // AwaitingAudio
        // -----------------
        (
            AwaitingAudio {
                photo,
                recording: RecordingPhase::Idle | RecordingPhase::Denied { .. },
                ..
            },
            Event::StartRecording,
        ) => {
            let attempt = Uuid::new_v4();
            (
                AwaitingAudio {
                    attempt,
                    photo: photo.clone(),
                    recording: RecordingPhase::Requesting,
                },
                vec![StartMicrophone { id: attempt }, EmitUi],
            )
        }
        (
            AwaitingAudio {
                attempt,
                photo,
                recording: RecordingPhase::Requesting,
            },
            Event::MicrophoneReady { id },
        ) if *attempt == id => (
            AwaitingAudio {
                attempt: *attempt,
                photo: photo.clone(),
                recording: RecordingPhase::Recording { elapsed_secs: 0 },
            },
            vec![StartRecordingTick { id }, EmitUi],
        ),
        (
            AwaitingAudio {
                attempt, photo, ..
            },
            Event::MicrophoneDenied { id, message },
        ) if *attempt == id => {
            log::warn!("Microphone unavailable: {}", message);
            (
                AwaitingAudio {
                    attempt: *attempt,
                    photo: photo.clone(),
                    recording: RecordingPhase::Denied { message },
                },
                vec![EmitUi],
            )
        }
        (
            AwaitingAudio {
                attempt,
                photo,
                recording: RecordingPhase::Recording { elapsed_secs },
            },
            Event::RecordingTick { id },
        ) if *attempt == id => {
            let elapsed = elapsed_secs + 1;
            if elapsed >= limits.max_record_secs {
                // Upper bound reached: stop without user action. The timer
                // freezes at the cap.
                log::info!("Recording auto-stopped at {}s", limits.max_record_secs);
                (
                    AwaitingAudio {
                        attempt: *attempt,
                        photo: photo.clone(),
                        recording: RecordingPhase::Stopping {
                            elapsed_secs: limits.max_record_secs,
                        },
                    },
                    vec![StopMicrophone { id }, EmitUi],
                )
            } else {
                (
                    AwaitingAudio {
                        attempt: *attempt,
                        photo: photo.clone(),
                        recording: RecordingPhase::Recording {
                            elapsed_secs: elapsed,
                        },
                    },
                    vec![EmitUi],
                )
            }
        }
        (
            AwaitingAudio {
                attempt,
                photo,
                recording: RecordingPhase::Recording { elapsed_secs },
            },
            Event::StopRecording,
        ) => (
            AwaitingAudio {
                attempt: *attempt,
                photo: photo.clone(),
                recording: RecordingPhase::Stopping {
                    elapsed_secs: *elapsed_secs,
                },
            },
            vec![StopMicrophone { id: *attempt }, EmitUi],
        ),
        (
            AwaitingAudio {
                attempt, photo, ..
            },
            Event::RecordingFinished { id, sample },
        ) if *attempt == id => (
            AudioReady {
                attempt: *attempt,
                photo: photo.clone(),
                sample,
                playing: false,
            },
            vec![EmitUi],
        ),
        (
            AwaitingAudio {
                attempt, photo, ..
            },
            Event::RecordingFailed { id, message },
        ) if *attempt == id => {
            log::warn!("Recording failed: {}", message);
            (
                AwaitingAudio {
                    attempt: *attempt,
                    photo: photo.clone(),
                    recording: RecordingPhase::Denied { message },
                },
                vec![EmitUi],
            )
        }

        // -----------------
        // AudioReady
        // -----------------
        // Redo the recording; the photo is kept.
        (AudioReady { photo, .. }, Event::StartRecording) => {
            let attempt = Uuid::new_v4();
            (
                AwaitingAudio {
                    attempt,
                    photo: photo.clone(),
                    recording: RecordingPhase::Requesting,
                },
                vec![StopPlayback, StartMicrophone { id: attempt }, EmitUi],
            )
        }
        (
            AudioReady {
                attempt,
                photo,
                sample,
                playing,
            },
            Event::TogglePlayback,
        ) => toggle_playback(
            *attempt,
            photo,
            sample,
            *playing,
            |attempt, photo, sample, playing| AudioReady {
                attempt,
                photo,
                sample,
                playing,
            },
        ),
        (AudioReady { attempt, photo, sample, .. }, Event::PlaybackEnded { id })
            if *attempt == id =>
        {
            (
                AudioReady {
                    attempt: *attempt,
                    photo: photo.clone(),
                    sample: sample.clone(),
                    playing: false,
                },
                vec![EmitUi],
            )
        }
        (
            AudioReady {
                attempt,
                photo,
                sample,
                ..
            },
            Event::ContinueToUpload,
        ) => {
            if sample.duration_secs < limits.min_record_secs {
                // Blocked below the minimum; the UI shows the notice.
                log::info!(
                    "Continue blocked: {}s recorded, {}s required",
                    sample.duration_secs,
                    limits.min_record_secs
                );
                (state.clone(), vec![EmitUi])
            } else {
                (
                    ReadyToUpload {
                        attempt: *attempt,
                        photo: photo.clone(),
                        sample: sample.clone(),
                        playing: false,
                    },
                    vec![StopPlayback, EmitUi],
                )
            }
        }

        // -----------------
        // ReadyToUpload
        // -----------------
        (
            ReadyToUpload {
                attempt,
                photo,
                sample,
                playing,
            },
            Event::TogglePlayback,
        ) => toggle_playback(
            *attempt,
            photo,
            sample,
            *playing,
            |attempt, photo, sample, playing| ReadyToUpload {
                attempt,
                photo,
                sample,
                playing,
            },
        ),
        (ReadyToUpload { attempt, photo, sample, .. }, Event::PlaybackEnded { id })
            if *attempt == id =>
        {
            (
                ReadyToUpload {
                    attempt: *attempt,
                    photo: photo.clone(),
                    sample: sample.clone(),
                    playing: false,
                },
                vec![EmitUi],
            )
        }
        (
            ReadyToUpload {
                attempt,
                photo,
                sample,
                ..
            },
            Event::BeginUpload,
        ) => begin_upload(*attempt, photo, sample),

        // -----------------
        // Uploading
        // -----------------
        (
            Uploading {
                attempt,
                photo,
                sample,
                progress,
            },
            Event::UploadProgressTick { id },
        ) if *attempt == id => {
            // Synthetic progress: advance on the fixed timer, hold at 90,
            // snap to 100 only when the response actually arrives.
            let next = (progress + upload::PROGRESS_STEP).min(upload::PROGRESS_HOLD_AT);
            (
                Uploading {
                    attempt: *attempt,
                    photo: photo.clone(),
                    sample: sample.clone(),
                    progress: next,
                },
                vec![EmitUi],
            )
        }
        (Uploading { attempt, .. }, Event::UploadOk { id, result }) if *attempt == id => {
            log::info!("Upload successful: {}", result);
            let img_path = upload::photo_reference(*attempt);
            (
                Uploaded {
                    attempt: *attempt,
                    img_path: img_path.clone(),
                },
                vec![
                    PersistPhotoReference { img_path },
                    EmitUi,
                    Navigate {
                        route: Route::Wizard(1),
                    },
                ],
            )
        }
        (
            Uploading {
                attempt,
                photo,
                sample,
                ..
            },
            Event::UploadFail { id, message },
        ) if *attempt == id => {
            log::error!("Upload error: {}", message);
            (
                Failed {
                    attempt: *attempt,
                    photo: photo.clone(),
                    sample: sample.clone(),
                    message,
                },
                vec![EmitUi],
            )
        }

        // -----------------
        // Failed: manual retry only
        // -----------------
        (
            Failed {
                attempt,
                photo,
                sample,
                ..
            },
            Event::BeginUpload,
        ) => begin_upload(*attempt, photo, sample),

        // -----------------
        // Stale device/network events (drop silently)
        // -----------------
        (_, Event::CameraReady { id }) if stale(id) => (state.clone(), vec![]),
        (_, Event::CameraDenied { id, .. }) if stale(id) => (state.clone(), vec![]),
        (_, Event::PhotoCaptured { id, .. }) if stale(id) => (state.clone(), vec![]),
        (_, Event::CaptureFailed { id, .. }) if stale(id) => (state.clone(), vec![]),
        (_, Event::MicrophoneReady { id }) if stale(id) => (state.clone(), vec![]),
        (_, Event::MicrophoneDenied { id, .. }) if stale(id) => (state.clone(), vec![]),
        (_, Event::RecordingTick { id }) if stale(id) => (state.clone(), vec![]),
        (_, Event::RecordingFinished { id, .. }) if stale(id) => (state.clone(), vec![]),
        (_, Event::RecordingFailed { id, .. }) if stale(id) => (state.clone(), vec![]),
        (_, Event::PlaybackEnded { id }) if stale(id) => (state.clone(), vec![]),
        (_, Event::UploadProgressTick { id }) if stale(id) => (state.clone(), vec![]),
        (_, Event::UploadOk { id, .. }) if stale(id) => (state.clone(), vec![]),
        (_, Event::UploadFail { id, .. }) if stale(id) => (state.clone(), vec![]),

        // -----------------
        // Unhandled: no transition
        // -----------------
        _ => (state.clone(), vec![]),
    }
}

fn toggle_playback<F>(
    attempt: Uuid,
    photo: &Photo,
    sample: &AudioSample,
    playing: bool,
    rebuild: F,
) -> (State, Vec<Effect>)
where
    F: FnOnce(Uuid, Photo, AudioSample, bool) -> State,
{
    if playing {
        (
            rebuild(attempt, photo.clone(), sample.clone(), false),
            vec![Effect::StopPlayback, Effect::EmitUi],
        )
    } else {
        (
            rebuild(attempt, photo.clone(), sample.clone(), true),
            vec![
                Effect::StartPlayback {
                    id: attempt,
                    wav_bytes: sample.wav_bytes.clone(),
                },
                Effect::EmitUi,
            ],
        )
    }
}

fn begin_upload(attempt: Uuid, photo: &Photo, sample: &AudioSample) -> (State, Vec<Effect>) {
    (
        State::Uploading {
            attempt,
            photo: photo.clone(),
            sample: sample.clone(),
            progress: 0,
        },
        vec![
            Effect::StartUpload {
                id: attempt,
                sample: sample.clone(),
                img_path: upload::photo_reference(attempt),
            },
            Effect::StartUploadProgressTick { id: attempt },
            Effect::EmitUi,
        ],
    )
}
