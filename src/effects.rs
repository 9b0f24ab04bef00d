//! Effect runner for the capture state machine.
//!
//! Executes the effects produced by [`crate::state_machine::reduce`]:
//! device acquisition and release, the recording and upload timers, sample
//! playback, and the voice-clone upload itself. Completion events are sent
//! back through the event channel carrying the attempt id they belong to.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::audio::SampleBuilder;
use crate::media::{
    AudioSink, CameraDevice, CameraStream, MediaError, Microphone, Photo, PlaybackHandle,
    RecordingStream,
};
use crate::session::SessionContext;
use crate::settings::AppSettings;
use crate::state_machine::{Effect, Event};
use crate::upload::CloneSubmission;

/// Trait for running effects asynchronously.
/// Completion events are sent back via the provided channel.
pub trait EffectRunner: Send + Sync + 'static {
    fn spawn(&self, effect: Effect, tx: mpsc::Sender<Event>);
}

/// An open microphone stream plus the chunks drained from it so far.
/// Each drained chunk covers one second, so chunk count doubles as the
/// recorded duration.
struct ActiveRecording {
    stream: Box<dyn RecordingStream>,
    builder: SampleBuilder,
}

/// Effect runner backed by real device seams and the HTTP client.
pub struct MediaEffectRunner {
    camera: Arc<dyn CameraDevice>,
    microphone: Arc<dyn Microphone>,
    sink: Arc<dyn AudioSink>,
    api: ApiClient,
    session: SessionContext,
    settings: Arc<AppSettings>,
    camera_streams: Arc<Mutex<HashMap<Uuid, Box<dyn CameraStream>>>>,
    recordings: Arc<Mutex<HashMap<Uuid, ActiveRecording>>>,
    playbacks: Arc<Mutex<HashMap<Uuid, Box<dyn PlaybackHandle>>>>,
    uploads: Arc<Mutex<HashSet<Uuid>>>,
}

impl MediaEffectRunner {
    pub fn new(
        camera: Arc<dyn CameraDevice>,
        microphone: Arc<dyn Microphone>,
        sink: Arc<dyn AudioSink>,
        api: ApiClient,
        session: SessionContext,
        settings: AppSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            camera,
            microphone,
            sink,
            api,
            session,
            settings: Arc::new(settings),
            camera_streams: Arc::new(Mutex::new(HashMap::new())),
            recordings: Arc::new(Mutex::new(HashMap::new())),
            playbacks: Arc::new(Mutex::new(HashMap::new())),
            uploads: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    async fn stop_all_playback(playbacks: &Mutex<HashMap<Uuid, Box<dyn PlaybackHandle>>>) {
        let handles: Vec<_> = {
            let mut guard = playbacks.lock().await;
            guard.drain().collect()
        };
        for (id, handle) in handles {
            log::debug!("Stopping playback for id={}", id);
            handle.stop();
        }
    }
}

impl EffectRunner for MediaEffectRunner {
    fn spawn(&self, effect: Effect, tx: mpsc::Sender<Event>) {
        match effect {
            Effect::StartCamera { id } => {
                let camera = self.camera.clone();
                let streams = self.camera_streams.clone();
                let settings = self.settings.clone();

                tokio::spawn(async move {
                    match camera.open(settings.camera_width, settings.camera_height) {
                        Ok(stream) => {
                            log::info!("Camera stream acquired for id={}", id);
                            streams.lock().await.insert(id, stream);
                            let _ = tx.send(Event::CameraReady { id }).await;
                        }
                        Err(e) => {
                            log::warn!("Camera acquisition failed: {}", e);
                            let _ = tx
                                .send(Event::CameraDenied {
                                    id,
                                    message: e.to_string(),
                                })
                                .await;
                        }
                    }
                });
            }

            Effect::CapturePhoto { id } => {
                let streams = self.camera_streams.clone();
                let settings = self.settings.clone();

                tokio::spawn(async move {
                    // Grab the current frame, then release the stream whether
                    // or not encoding worked.
                    let grabbed = {
                        let mut guard = streams.lock().await;
                        match guard.get_mut(&id) {
                            Some(stream) => stream.grab_frame(),
                            None => Err(MediaError::DeviceUnavailable(
                                "camera stream is not open".into(),
                            )),
                        }
                    };

                    let result =
                        grabbed.and_then(|frame| Photo::from_frame(&frame, settings.photo_quality));

                    streams.lock().await.remove(&id);

                    match result {
                        Ok(photo) => {
                            log::info!(
                                "Photo captured: {}x{}, {} bytes",
                                photo.width,
                                photo.height,
                                photo.jpeg_bytes.len()
                            );
                            let _ = tx.send(Event::PhotoCaptured { id, photo }).await;
                        }
                        Err(e) => {
                            log::warn!("Photo capture failed: {}", e);
                            let _ = tx
                                .send(Event::CaptureFailed {
                                    id,
                                    message: e.to_string(),
                                })
                                .await;
                        }
                    }
                });
            }

            Effect::StopCamera => {
                let streams = self.camera_streams.clone();
                tokio::spawn(async move {
                    let released = streams.lock().await.drain().count();
                    if released > 0 {
                        log::debug!("Released {} camera stream(s)", released);
                    }
                });
            }

            Effect::StartMicrophone { id } => {
                let microphone = self.microphone.clone();
                let recordings = self.recordings.clone();

                tokio::spawn(async move {
                    match microphone.open() {
                        Ok(stream) => {
                            log::info!("Microphone stream acquired for id={}", id);
                            let builder = SampleBuilder::new(stream.sample_rate());
                            recordings
                                .lock()
                                .await
                                .insert(id, ActiveRecording { stream, builder });
                            let _ = tx.send(Event::MicrophoneReady { id }).await;
                        }
                        Err(e) => {
                            log::warn!("Microphone acquisition failed: {}", e);
                            let _ = tx
                                .send(Event::MicrophoneDenied {
                                    id,
                                    message: e.to_string(),
                                })
                                .await;
                        }
                    }
                });
            }

            Effect::StartRecordingTick { id } => {
                let recordings = self.recordings.clone();

                tokio::spawn(async move {
                    // One tick per second while the stream stays open. Each
                    // tick drains one second of PCM into the sample builder.
                    let mut interval = tokio::time::interval(Duration::from_secs(1));
                    interval.tick().await; // first tick fires immediately
                    loop {
                        interval.tick().await;

                        let read = {
                            let mut guard = recordings.lock().await;
                            match guard.get_mut(&id) {
                                Some(active) => match active.stream.read_chunk() {
                                    Ok(chunk) => {
                                        active.builder.push_chunk(chunk);
                                        Some(Ok(()))
                                    }
                                    Err(e) => {
                                        guard.remove(&id);
                                        Some(Err(e))
                                    }
                                },
                                None => None,
                            }
                        };

                        match read {
                            Some(Ok(())) => {
                                if tx.send(Event::RecordingTick { id }).await.is_err() {
                                    log::debug!("Recording tick stopping - channel closed");
                                    break;
                                }
                            }
                            Some(Err(e)) => {
                                log::warn!("Recording stream failed: {}", e);
                                let _ = tx
                                    .send(Event::RecordingFailed {
                                        id,
                                        message: e.to_string(),
                                    })
                                    .await;
                                break;
                            }
                            None => {
                                log::debug!(
                                    "Recording tick stopping - recording {} no longer active",
                                    id
                                );
                                break;
                            }
                        }
                    }
                });
            }

            Effect::StopMicrophone { id } => {
                let recordings = self.recordings.clone();

                tokio::spawn(async move {
                    let active = recordings.lock().await.remove(&id);
                    let Some(active) = active else {
                        log::warn!("StopMicrophone: no active recording for id={}", id);
                        let _ = tx
                            .send(Event::RecordingFailed {
                                id,
                                message: "No active recording".into(),
                            })
                            .await;
                        return;
                    };

                    // Dropping the stream releases the device; the chunks
                    // drained so far become the sample. Duration comes from
                    // the one-chunk-per-second pacing.
                    let duration_secs = active.builder.chunk_count() as u64;
                    drop(active.stream);

                    match active.builder.finalize(duration_secs) {
                        Ok(sample) => {
                            log::info!(
                                "Recording combined: {}s, {} bytes",
                                sample.duration_secs,
                                sample.wav_bytes.len()
                            );
                            let _ = tx.send(Event::RecordingFinished { id, sample }).await;
                        }
                        Err(e) => {
                            log::error!("Failed to combine recording: {}", e);
                            let _ = tx
                                .send(Event::RecordingFailed {
                                    id,
                                    message: e.to_string(),
                                })
                                .await;
                        }
                    }
                });
            }

            Effect::StartPlayback { id, wav_bytes } => {
                let sink = self.sink.clone();
                let playbacks = self.playbacks.clone();

                tokio::spawn(async move {
                    // Only one playback at a time; starting a new one stops
                    // whatever was still going.
                    Self::stop_all_playback(&playbacks).await;

                    let (done_tx, done_rx) = oneshot::channel();
                    match sink.play(wav_bytes, done_tx) {
                        Ok(handle) => {
                            playbacks.lock().await.insert(id, handle);
                            // done fires only on natural completion; stopping
                            // early drops the sender and ends this task.
                            if done_rx.await.is_ok() {
                                playbacks.lock().await.remove(&id);
                                let _ = tx.send(Event::PlaybackEnded { id }).await;
                            }
                        }
                        Err(e) => {
                            log::warn!("Playback failed to start: {}", e);
                            let _ = tx.send(Event::PlaybackEnded { id }).await;
                        }
                    }
                });
            }

            Effect::StopPlayback => {
                let playbacks = self.playbacks.clone();
                tokio::spawn(async move {
                    Self::stop_all_playback(&playbacks).await;
                });
            }

            Effect::StartUpload {
                id,
                sample,
                img_path,
            } => {
                let api = self.api.clone();
                let session = self.session.clone();
                let settings = self.settings.clone();
                let uploads = self.uploads.clone();

                tokio::spawn(async move {
                    uploads.lock().await.insert(id);

                    let result = async {
                        let uid = ApiClient::require_identity(&session)?;
                        let submission = CloneSubmission::new(&settings, uid, &sample, img_path);
                        let form = submission
                            .into_form()
                            .map_err(crate::api::ApiError::Parse)?;
                        api.create_voice_clone(form).await
                    }
                    .await;

                    uploads.lock().await.remove(&id);

                    match result {
                        Ok(value) => {
                            let _ = tx.send(Event::UploadOk { id, result: value }).await;
                        }
                        Err(e) => {
                            log::error!("Voice clone upload failed: {}", e);
                            let _ = tx
                                .send(Event::UploadFail {
                                    id,
                                    message: e.to_string(),
                                })
                                .await;
                        }
                    }
                });
            }

            Effect::StartUploadProgressTick { id } => {
                let uploads = self.uploads.clone();
                let tick = Duration::from_millis(self.settings.upload_tick_ms);

                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(tick);
                    interval.tick().await;
                    loop {
                        interval.tick().await;
                        if !uploads.lock().await.contains(&id) {
                            log::debug!("Progress tick stopping - upload {} finished", id);
                            break;
                        }
                        if tx.send(Event::UploadProgressTick { id }).await.is_err() {
                            break;
                        }
                    }
                });
            }

            Effect::PersistPhotoReference { img_path } => {
                log::info!("Storing photo reference: {}", img_path);
                self.session.set_profile_image(img_path);
            }

            Effect::ReleaseAll => {
                let streams = self.camera_streams.clone();
                let recordings = self.recordings.clone();
                let playbacks = self.playbacks.clone();
                let uploads = self.uploads.clone();

                tokio::spawn(async move {
                    streams.lock().await.clear();
                    recordings.lock().await.clear();
                    uploads.lock().await.clear();
                    Self::stop_all_playback(&playbacks).await;
                    log::debug!("All capture resources released");
                });
            }

            Effect::EmitUi | Effect::Navigate { .. } => {
                // Handled in the main loop, not here
                unreachable!("EmitUi/Navigate should be handled in run_state_loop");
            }
        }
    }
}

/// Simulated effect runner for tests and the demo binary: every effect
/// succeeds after a short delay, with fabricated media payloads and no
/// network.
pub struct SimulatedEffectRunner {
    /// Seconds of audio reported when a recording stops.
    pub recorded_secs: u64,
}

impl SimulatedEffectRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { recorded_secs: 20 })
    }

    pub fn with_recorded_secs(recorded_secs: u64) -> Arc<Self> {
        Arc::new(Self { recorded_secs })
    }

    fn fake_photo() -> Photo {
        Photo {
            jpeg_bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            width: 640,
            height: 480,
        }
    }

    fn fake_sample(duration_secs: u64) -> crate::audio::AudioSample {
        crate::audio::AudioSample {
            wav_bytes: vec![0u8; 64],
            duration_secs,
            sample_rate: 16_000,
        }
    }
}

impl EffectRunner for SimulatedEffectRunner {
    fn spawn(&self, effect: Effect, tx: mpsc::Sender<Event>) {
        match effect {
            Effect::StartCamera { id } => {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    let _ = tx.send(Event::CameraReady { id }).await;
                });
            }

            Effect::CapturePhoto { id } => {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    let _ = tx
                        .send(Event::PhotoCaptured {
                            id,
                            photo: Self::fake_photo(),
                        })
                        .await;
                });
            }

            Effect::StartMicrophone { id } => {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    let _ = tx.send(Event::MicrophoneReady { id }).await;
                });
            }

            Effect::StopMicrophone { id } => {
                let duration = self.recorded_secs;
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    let _ = tx
                        .send(Event::RecordingFinished {
                            id,
                            sample: Self::fake_sample(duration),
                        })
                        .await;
                });
            }

            Effect::StartUpload { id, .. } => {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    let _ = tx
                        .send(Event::UploadOk {
                            id,
                            result: serde_json::json!({ "voice_id": "sim-voice" }),
                        })
                        .await;
                });
            }

            Effect::StartUploadProgressTick { id } => {
                tokio::spawn(async move {
                    for _ in 0..10 {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        if tx.send(Event::UploadProgressTick { id }).await.is_err() {
                            break;
                        }
                    }
                });
            }

            Effect::StartPlayback { id, .. } => {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    let _ = tx.send(Event::PlaybackEnded { id }).await;
                });
            }

            // No resources to track in the simulation.
            Effect::StartRecordingTick { .. }
            | Effect::StopCamera
            | Effect::StopPlayback
            | Effect::ReleaseAll => {}

            Effect::PersistPhotoReference { img_path } => {
                log::debug!("Simulated: would store photo reference {}", img_path);
            }

            Effect::EmitUi | Effect::Navigate { .. } => {
                unreachable!("EmitUi/Navigate should be handled in run_state_loop");
            }
        }
    }
}
