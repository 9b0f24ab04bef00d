//! Five-step profile wizard.
//!
//! The sequencer enforces strict linear ordering: steps advance one at a
//! time, Back is unavailable at step 1, and a step can only submit the topic
//! it owns. The aggregate lives here for the lifetime of the wizard and is
//! sent once, as a whole, when step 5 completes.

pub mod normalize;
pub mod profile;
pub mod steps;

use std::collections::HashSet;

use crate::api::{ApiClient, ApiError};
use crate::routes::Route;
use crate::session::SessionContext;

use profile::{TopicPayload, WizardProfile};

pub const TOTAL_STEPS: u8 = 5;

/// Result of submitting the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Moved on to the given step.
    Advanced(u8),
    /// Step 5 submitted; the aggregate is ready for synchronization.
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    /// A step tried to submit a topic it does not own.
    WrongStep { expected: u8, got: u8 },
}

impl std::fmt::Display for WizardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WizardError::WrongStep { expected, got } => {
                write!(f, "step {} cannot submit topic for step {}", expected, got)
            }
        }
    }
}

impl std::error::Error for WizardError {}

/// Sequencer state for one pass through the wizard. Created empty on entry
/// at step 1; discarded after the final synchronization, whatever its result.
#[derive(Debug, Clone)]
pub struct WizardFlow {
    current: u8,
    profile: WizardProfile,
    completed: HashSet<u8>,
}

impl Default for WizardFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardFlow {
    pub fn new() -> Self {
        Self {
            current: 1,
            profile: WizardProfile::default(),
            completed: HashSet::new(),
        }
    }

    pub fn current_step(&self) -> u8 {
        self.current
    }

    pub fn profile(&self) -> &WizardProfile {
        &self.profile
    }

    pub fn is_completed(&self, step: u8) -> bool {
        self.completed.contains(&step)
    }

    pub fn can_go_back(&self) -> bool {
        self.current > 1
    }

    /// Move back one step. A no-op at step 1.
    pub fn back(&mut self) {
        if self.current > 1 {
            self.current -= 1;
        }
    }

    /// Submit the current step's topic payload. The topic object replaces
    /// whatever was previously stored for that topic, the step is marked
    /// complete, and the flow advances (or finishes at step 5).
    pub fn submit(&mut self, payload: TopicPayload) -> Result<SubmitOutcome, WizardError> {
        let step = payload.step();
        if step != self.current {
            return Err(WizardError::WrongStep {
                expected: self.current,
                got: step,
            });
        }

        self.profile.replace_topic(payload);
        self.completed.insert(step);

        if self.current < TOTAL_STEPS {
            self.current += 1;
            Ok(SubmitOutcome::Advanced(self.current))
        } else {
            Ok(SubmitOutcome::Finished)
        }
    }

    /// Abandon the wizard and jump straight to chat. The partially filled
    /// aggregate is discarded without a sync.
    pub fn skip(self) -> Route {
        log::info!("Wizard skipped at step {}", self.current);
        Route::Chat
    }
}

/// Perform the final synchronization call and hand off to the share page.
///
/// Synchronization failure is logged, never surfaced as a dead end: the user
/// always lands on the share destination.
pub async fn finish(api: &ApiClient, session: &SessionContext, flow: &WizardFlow) -> Route {
    match sync_profile(api, session, flow.profile()).await {
        Ok(()) => log::info!("Profile synced successfully"),
        Err(e) => log::error!("Failed to sync profile: {}", e),
    }
    Route::Share
}

async fn sync_profile(
    api: &ApiClient,
    session: &SessionContext,
    profile: &WizardProfile,
) -> Result<(), ApiError> {
    let uid = session.identity().ok_or(ApiError::Unauthenticated)?;
    let payload = profile.sync_payload(&uid);
    api.sync_profile(&uid, &payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use profile::{BackgroundInfo, PersonalInfo, ProfessionalInfo};
    use steps::BackgroundForm;

    fn personal() -> TopicPayload {
        TopicPayload::Personal(PersonalInfo::default())
    }

    fn professional() -> TopicPayload {
        TopicPayload::Professional(ProfessionalInfo::default())
    }

    #[test]
    fn starts_at_step_one_with_empty_aggregate() {
        let flow = WizardFlow::new();
        assert_eq!(flow.current_step(), 1);
        assert!(!flow.can_go_back());
        assert_eq!(*flow.profile(), WizardProfile::default());
    }

    #[test]
    fn submit_advances_and_marks_complete() {
        let mut flow = WizardFlow::new();
        let outcome = flow.submit(personal()).unwrap();
        assert_eq!(outcome, SubmitOutcome::Advanced(2));
        assert!(flow.is_completed(1));
        assert!(!flow.is_completed(2));
    }

    #[test]
    fn skip_ahead_is_rejected() {
        let mut flow = WizardFlow::new();
        let err = flow.submit(professional()).unwrap_err();
        assert_eq!(err, WizardError::WrongStep { expected: 1, got: 2 });
        assert_eq!(flow.current_step(), 1);
    }

    #[test]
    fn back_is_noop_at_step_one() {
        let mut flow = WizardFlow::new();
        flow.back();
        assert_eq!(flow.current_step(), 1);
    }

    #[test]
    fn step_five_submission_finishes() {
        let mut flow = WizardFlow::new();
        flow.submit(personal()).unwrap();
        flow.submit(professional()).unwrap();
        flow.submit(TopicPayload::Background(BackgroundInfo::default()))
            .unwrap();
        flow.submit(TopicPayload::Personality(Default::default()))
            .unwrap();
        let outcome = flow
            .submit(TopicPayload::Characteristics(Default::default()))
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Finished);
        assert!((1..=5).all(|s| flow.is_completed(s)));
    }

    #[test]
    fn skip_hands_off_to_chat() {
        let mut flow = WizardFlow::new();
        flow.submit(personal()).unwrap();
        assert_eq!(flow.skip(), Route::Chat);
    }

    #[test]
    fn back_then_revisit_prefills_from_aggregate() {
        let mut flow = WizardFlow::new();
        flow.submit(personal()).unwrap();
        flow.submit(professional()).unwrap();
        let form = BackgroundForm {
            hobbies: "chess, hiking".into(),
            ..Default::default()
        };
        flow.submit(form.submit()).unwrap();
        assert_eq!(flow.current_step(), 4);

        flow.back();
        assert_eq!(flow.current_step(), 3);
        let refilled = BackgroundForm::prefill(flow.profile());
        assert_eq!(refilled.hobbies, "chess, hiking");
    }

    #[test]
    fn revisited_step_replaces_its_topic() {
        let mut flow = WizardFlow::new();
        flow.submit(TopicPayload::Personal(PersonalInfo {
            full_name: "First".into(),
            nicknames: vec!["one".into()],
            ..Default::default()
        }))
        .unwrap();

        flow.back();
        flow.submit(TopicPayload::Personal(PersonalInfo {
            full_name: "Second".into(),
            ..Default::default()
        }))
        .unwrap();

        assert_eq!(flow.profile().personal.full_name, "Second");
        assert!(flow.profile().personal.nicknames.is_empty());
    }
}
