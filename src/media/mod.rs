//! Device seams for capture and playback.
//!
//! Camera, microphone and audio output sit behind traits so the capture
//! state machine and its effect runner never touch hardware directly. The
//! simulated implementations in [`sim`] back the demo binary and the tests.

pub mod frame;
pub mod probe;
pub mod sim;

use tokio::sync::oneshot;

pub use frame::{Frame, Photo};
pub use probe::{Capabilities, CapabilityProbe};

/// Errors surfaced by device access.
#[derive(Debug, Clone)]
pub enum MediaError {
    /// The user denied access, or the platform blocked it.
    PermissionDenied(String),
    /// No usable device was found.
    DeviceUnavailable(String),
    /// The device was acquired but capture failed.
    CaptureFailed(String),
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaError::PermissionDenied(e) => write!(f, "Permission denied: {}", e),
            MediaError::DeviceUnavailable(e) => write!(f, "Device unavailable: {}", e),
            MediaError::CaptureFailed(e) => write!(f, "Capture failed: {}", e),
        }
    }
}

impl std::error::Error for MediaError {}

/// Front-facing camera. Opening acquires the stream; dropping the stream
/// releases the device.
pub trait CameraDevice: Send + Sync {
    fn open(&self, width: u32, height: u32) -> Result<Box<dyn CameraStream>, MediaError>;
}

/// A live camera stream delivering raw frames for preview and capture.
pub trait CameraStream: Send {
    /// Grab the current frame.
    fn grab_frame(&mut self) -> Result<Frame, MediaError>;
}

/// Microphone. Opening acquires the stream; dropping it releases the device.
pub trait Microphone: Send + Sync {
    fn open(&self) -> Result<Box<dyn RecordingStream>, MediaError>;
}

/// An open microphone stream. Each call drains roughly one second of
/// captured PCM; the caller paces calls with its recording timer.
pub trait RecordingStream: Send {
    fn sample_rate(&self) -> u32;
    fn read_chunk(&mut self) -> Result<Vec<i16>, MediaError>;
}

/// Audio output for replaying the recorded sample and synthesized speech.
pub trait AudioSink: Send + Sync {
    /// Begin playback of a WAV payload. `done` fires when playback reaches
    /// the end on its own; stopping early via the handle does not fire it.
    fn play(
        &self,
        wav_bytes: Vec<u8>,
        done: oneshot::Sender<()>,
    ) -> Result<Box<dyn PlaybackHandle>, MediaError>;
}

/// Handle to in-flight playback. Dropping it stops playback and releases the
/// underlying temporary resource.
pub trait PlaybackHandle: Send {
    fn stop(self: Box<Self>);
}
