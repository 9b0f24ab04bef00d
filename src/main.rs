//! Scripted walkthrough of the capture flow against simulated devices.
//!
//! Drives the state loop through photo, recording, playback and upload,
//! printing every UI snapshot, then fills the profile wizard. Useful for
//! eyeballing the flow without a frontend attached.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use twin_studio::effects::SimulatedEffectRunner;
use twin_studio::routes::Route;
use twin_studio::session::SessionContext;
use twin_studio::settings::AppSettings;
use twin_studio::state_machine::{CaptureLimits, Event};
use twin_studio::wizard::{steps::PersonalForm, WizardFlow};
use twin_studio::{run_state_loop, UiState};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env file if present (for development convenience)
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = twin_studio::settings::ensure_settings_file() {
        log::warn!("Settings: {}", e);
    }
    let settings = AppSettings::load();
    log::info!("Backend: {}", settings.backend_url);

    let session = SessionContext::new();
    session.set_identity("demo-user");

    let (tx, rx) = mpsc::channel::<Event>(32);
    let (ui_tx, mut ui_rx) = watch::channel(UiState::AwaitingPhoto {
        preview_live: false,
        warning: None,
    });
    let (route_tx, mut route_rx) = watch::channel(Route::MediaCapture);

    let runner = SimulatedEffectRunner::new();
    let loop_handle = tokio::spawn(run_state_loop(
        CaptureLimits::from(&settings),
        ui_tx,
        route_tx,
        rx,
        tx.clone(),
        runner,
    ));

    tokio::spawn(async move {
        while ui_rx.changed().await.is_ok() {
            let snapshot = ui_rx.borrow().clone();
            match serde_json::to_string(&snapshot) {
                Ok(json) => println!("ui: {}", json),
                Err(e) => log::warn!("UI snapshot failed to serialize: {}", e),
            }
        }
    });

    // Walk the whole capture flow; the simulated runner answers each device
    // effect after a few milliseconds.
    let script = [
        Event::PageEntered,
        Event::TakePhoto,
        Event::ContinueToAudio,
        Event::StartRecording,
        Event::StopRecording,
        Event::TogglePlayback,
        Event::ContinueToUpload,
        Event::BeginUpload,
    ];
    for event in script {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if tx.send(event).await.is_err() {
            log::error!("Capture loop went away mid-script");
            return;
        }
    }

    // Upload success navigates to the first wizard step.
    if route_rx.changed().await.is_ok() {
        log::info!("Route: {:?}", *route_rx.borrow());
    }

    let mut wizard = WizardFlow::new();
    let mut personal = PersonalForm::prefill(wizard.profile());
    personal.full_name = "Demo User".into();
    personal.languages_spoken = "English, Spanish".into();
    match wizard.submit(personal.submit()) {
        Ok(outcome) => log::info!("Wizard step 1: {:?}", outcome),
        Err(e) => log::error!("Wizard rejected step 1: {}", e),
    }

    drop(tx);
    let _ = loop_handle.await;
}
