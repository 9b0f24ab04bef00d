//! Startup capability detection.
//!
//! Speech-recognition support varies by platform. The probe runs once at
//! startup and the resulting [`Capabilities`] value is passed to whatever
//! needs to branch on it; nothing re-probes at call sites.

pub trait CapabilityProbe: Send + Sync {
    fn speech_recognition(&self) -> bool;
}

/// Snapshot of platform capabilities, evaluated once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub speech_recognition: bool,
}

impl Capabilities {
    pub fn detect(probe: &dyn CapabilityProbe) -> Self {
        let speech_recognition = probe.speech_recognition();
        log::info!("Capabilities: speech_recognition={}", speech_recognition);
        Self { speech_recognition }
    }
}
