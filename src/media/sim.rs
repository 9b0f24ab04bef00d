//! Simulated devices for the demo binary and tests.
//!
//! The simulated camera renders a horizontal gradient (so mirroring is
//! observable), the microphone produces a 440 Hz tone, and the sink
//! "plays" audio by sleeping briefly before firing the done signal.

use std::f32::consts::TAU;
use std::time::Duration;

use tokio::sync::oneshot;

use super::{
    AudioSink, CameraDevice, CameraStream, CapabilityProbe, Frame, MediaError, Microphone,
    PlaybackHandle, RecordingStream,
};

pub const SIM_SAMPLE_RATE: u32 = 16_000;

/// Camera that always grants access and produces gradient frames.
pub struct SimCamera;

impl CameraDevice for SimCamera {
    fn open(&self, width: u32, height: u32) -> Result<Box<dyn CameraStream>, MediaError> {
        log::debug!("SimCamera: stream opened at {}x{}", width, height);
        Ok(Box::new(SimCameraStream { width, height }))
    }
}

struct SimCameraStream {
    width: u32,
    height: u32,
}

impl CameraStream for SimCameraStream {
    fn grab_frame(&mut self) -> Result<Frame, MediaError> {
        let w = self.width as usize;
        let mut pixels = Vec::with_capacity(w * self.height as usize * 3);
        for _row in 0..self.height {
            for col in 0..w {
                let shade = (col * 255 / w.max(1)) as u8;
                pixels.extend_from_slice(&[shade, shade, 255 - shade]);
            }
        }
        Frame::new(self.width, self.height, pixels)
    }
}

/// Camera that always reports a denied permission. Used to exercise the
/// denial path.
pub struct DeniedCamera;

impl CameraDevice for DeniedCamera {
    fn open(&self, _width: u32, _height: u32) -> Result<Box<dyn CameraStream>, MediaError> {
        Err(MediaError::PermissionDenied(
            "camera access was denied".to_string(),
        ))
    }
}

/// Microphone that always grants access and produces a steady tone.
pub struct SimMicrophone;

impl Microphone for SimMicrophone {
    fn open(&self) -> Result<Box<dyn RecordingStream>, MediaError> {
        log::debug!("SimMicrophone: stream opened");
        Ok(Box::new(SimRecordingStream { phase: 0 }))
    }
}

struct SimRecordingStream {
    phase: u64,
}

impl RecordingStream for SimRecordingStream {
    fn sample_rate(&self) -> u32 {
        SIM_SAMPLE_RATE
    }

    fn read_chunk(&mut self) -> Result<Vec<i16>, MediaError> {
        let samples = (0..SIM_SAMPLE_RATE as u64)
            .map(|i| {
                let t = (self.phase + i) as f32 / SIM_SAMPLE_RATE as f32;
                ((t * 440.0 * TAU).sin() * 8_000.0) as i16
            })
            .collect();
        self.phase += SIM_SAMPLE_RATE as u64;
        Ok(samples)
    }
}

/// Microphone that always reports a denied permission.
pub struct DeniedMicrophone;

impl Microphone for DeniedMicrophone {
    fn open(&self) -> Result<Box<dyn RecordingStream>, MediaError> {
        Err(MediaError::PermissionDenied(
            "microphone access was denied".to_string(),
        ))
    }
}

/// Sink that completes playback after a short delay.
pub struct SimAudioSink {
    playback: Duration,
}

impl SimAudioSink {
    pub fn new() -> Self {
        Self {
            playback: Duration::from_millis(50),
        }
    }

    pub fn with_playback_duration(playback: Duration) -> Self {
        Self { playback }
    }
}

impl Default for SimAudioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for SimAudioSink {
    fn play(
        &self,
        wav_bytes: Vec<u8>,
        done: oneshot::Sender<()>,
    ) -> Result<Box<dyn PlaybackHandle>, MediaError> {
        log::debug!("SimAudioSink: playing {} bytes", wav_bytes.len());
        let playback = self.playback;
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(playback) => {
                    let _ = done.send(());
                }
                _ = cancel_rx => {}
            }
        });
        Ok(Box::new(SimPlaybackHandle {
            cancel: Some(cancel_tx),
        }))
    }
}

struct SimPlaybackHandle {
    cancel: Option<oneshot::Sender<()>>,
}

impl PlaybackHandle for SimPlaybackHandle {
    fn stop(mut self: Box<Self>) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

impl Drop for SimPlaybackHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

/// Probe with a fixed answer.
pub struct SimProbe {
    pub speech_recognition: bool,
}

impl CapabilityProbe for SimProbe {
    fn speech_recognition(&self) -> bool {
        self.speech_recognition
    }
}
