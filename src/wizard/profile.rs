//! Aggregated profile data collected across the five wizard steps.
//!
//! Each step owns one topic. Submitting a step replaces its topic wholesale
//! in the aggregate; revisiting a step never leaves stale fields behind from
//! an earlier submission.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Topic payload produced by one step's submission.
#[derive(Debug, Clone, PartialEq)]
pub enum TopicPayload {
    Personal(PersonalInfo),
    Professional(ProfessionalInfo),
    Background(BackgroundInfo),
    Personality(PersonalityInfo),
    Characteristics(CharacteristicsInfo),
}

impl TopicPayload {
    /// Which step number this topic belongs to (1-based).
    pub fn step(&self) -> u8 {
        match self {
            TopicPayload::Personal(_) => 1,
            TopicPayload::Professional(_) => 2,
            TopicPayload::Background(_) => 3,
            TopicPayload::Personality(_) => 4,
            TopicPayload::Characteristics(_) => 5,
        }
    }
}

/// Running aggregate of all submitted topics. Created empty when the wizard
/// is entered at step 1 and discarded after the final synchronization call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardProfile {
    #[serde(default)]
    pub personal: PersonalInfo,
    #[serde(default)]
    pub professional: ProfessionalInfo,
    #[serde(default)]
    pub background: BackgroundInfo,
    #[serde(default)]
    pub personality: PersonalityInfo,
    #[serde(default)]
    pub characteristics: CharacteristicsInfo,
}

impl WizardProfile {
    /// Replace the topic named by `payload`. The previous topic object is
    /// dropped entirely; there is no field-by-field merge.
    pub fn replace_topic(&mut self, payload: TopicPayload) {
        match payload {
            TopicPayload::Personal(p) => self.personal = p,
            TopicPayload::Professional(p) => self.professional = p,
            TopicPayload::Background(b) => self.background = b,
            TopicPayload::Personality(p) => self.personality = p,
            TopicPayload::Characteristics(c) => self.characteristics = c,
        }
    }

    /// Build the single synchronization payload sent at step 5 completion.
    pub fn sync_payload(&self, user_id: &str) -> SyncPayload {
        SyncPayload {
            user_id: user_id.to_string(),
            personal: self.personal.clone(),
            professional: self.professional.clone(),
            background: self.background.clone(),
            personality: self.personality.clone(),
            characteristics: self.characteristics.clone(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Wire shape for `POST /profile/sync/{uid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPayload {
    pub user_id: String,
    pub personal: PersonalInfo,
    pub professional: ProfessionalInfo,
    pub background: BackgroundInfo,
    pub personality: PersonalityInfo,
    pub characteristics: CharacteristicsInfo,
    pub timestamp: String,
}

/// Step 1: basic identity, location, family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub preferred_name: String,
    pub nicknames: Vec<String>,
    pub age: Option<u32>,
    pub date_of_birth: String,
    pub gender: String,
    pub pronouns: String,
    pub current_location: String,
    pub hometown: String,
    pub nationality: String,
    pub languages_spoken: Vec<String>,
    pub family_status: String,
    pub relationship_status: String,
    pub has_children: String,
    pub pets: Vec<String>,
}

/// Step 2: career and education.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfessionalInfo {
    pub current_status: String,
    pub job_title: String,
    pub company_organization: String,
    pub industry: String,
    pub work_experience_years: Option<u32>,
    pub education_level: String,
    pub field_of_study: String,
    pub school_university: String,
    pub graduation_year: Option<u32>,
    pub additional_certifications: Vec<String>,
    pub career_goals: Vec<String>,
    pub key_achievements: Vec<String>,
    pub skills: Vec<String>,
    pub work_style: String,
}

/// Step 3: life story, experiences and tastes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundInfo {
    pub childhood_memories: Vec<String>,
    pub school_experiences: Vec<String>,
    pub favorite_subjects: Vec<String>,
    pub extracurricular_activities: Vec<String>,
    pub college_experiences: Vec<String>,
    pub college_activities: Vec<String>,
    pub memorable_professors: Vec<String>,
    pub friendship_style: String,
    pub social_preferences: Vec<String>,
    pub close_friends_description: String,
    pub hobbies: Vec<String>,
    pub favorite_games: Vec<String>,
    pub sports_activities: Vec<String>,
    pub creative_pursuits: Vec<String>,
    pub favorite_foods: Vec<String>,
    pub cooking_preferences: String,
    pub dietary_restrictions: Vec<String>,
    pub favorite_music: Vec<String>,
    pub favorite_movies: Vec<String>,
    pub favorite_books: Vec<String>,
    pub favorite_tv_shows: Vec<String>,
}

/// Step 4: communication style and temperament, mostly 1-5 ratings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalityInfo {
    pub communication_tone: String,
    pub response_style: String,
    pub humor_level: Option<u8>,
    pub formality_level: Option<u8>,
    pub empathy_level: Option<u8>,
    pub optimism_level: Option<u8>,
    pub patience_level: Option<u8>,
    pub enthusiasm_level: Option<u8>,
    pub decision_making_style: String,
    pub problem_solving_approach: String,
    pub learning_style: String,
    pub introversion_extroversion: Option<u8>,
    pub conflict_resolution: String,
    pub leadership_style: String,
    pub scenario_responses: BTreeMap<String, String>,
}

/// Step 5: values, habits and self-assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacteristicsInfo {
    pub core_values: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub motivations: Vec<String>,
    pub risk_tolerance: Option<u8>,
    pub adaptability: Option<u8>,
    pub attention_to_detail: Option<u8>,
    pub creativity_level: Option<u8>,
    pub work_life_balance: String,
    pub success_definition: String,
    pub failure_handling: String,
    pub stress_management: String,
    pub pet_peeves: Vec<String>,
    pub unique_habits: Vec<String>,
    pub superstitions: Vec<String>,
    pub role_models: Vec<String>,
    pub inspirational_quotes: Vec<String>,
    pub life_philosophy: String,
}
