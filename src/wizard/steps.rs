//! Per-step form models.
//!
//! Each form holds the raw text the user typed and owns the shaping of that
//! text into its topic payload: delimited fields become lists, numeric fields
//! become parsed values or `None`. Prefilling reverses the shaping so Back
//! navigation shows previously submitted values.

use super::normalize::{list_to_text, normalize_list, normalize_number, normalize_scale, number_to_text};
use super::profile::{
    BackgroundInfo, CharacteristicsInfo, PersonalInfo, PersonalityInfo, ProfessionalInfo,
    TopicPayload, WizardProfile,
};
use std::collections::BTreeMap;

/// Step 1 form: personal information.
#[derive(Debug, Clone, Default)]
pub struct PersonalForm {
    pub full_name: String,
    pub preferred_name: String,
    pub nicknames: String,
    pub age: String,
    pub date_of_birth: String,
    pub gender: String,
    pub pronouns: String,
    pub current_location: String,
    pub hometown: String,
    pub nationality: String,
    pub languages_spoken: String,
    pub family_status: String,
    pub relationship_status: String,
    pub has_children: String,
    pub pets: String,
}

impl PersonalForm {
    /// Derive initial field values from the aggregate.
    pub fn prefill(profile: &WizardProfile) -> Self {
        let p = &profile.personal;
        Self {
            full_name: p.full_name.clone(),
            preferred_name: p.preferred_name.clone(),
            nicknames: list_to_text(&p.nicknames),
            age: number_to_text(&p.age),
            date_of_birth: p.date_of_birth.clone(),
            gender: p.gender.clone(),
            pronouns: p.pronouns.clone(),
            current_location: p.current_location.clone(),
            hometown: p.hometown.clone(),
            nationality: p.nationality.clone(),
            languages_spoken: list_to_text(&p.languages_spoken),
            family_status: p.family_status.clone(),
            relationship_status: p.relationship_status.clone(),
            has_children: p.has_children.clone(),
            pets: list_to_text(&p.pets),
        }
    }

    /// Shape the raw fields into this step's topic payload.
    pub fn submit(self) -> TopicPayload {
        TopicPayload::Personal(PersonalInfo {
            full_name: self.full_name,
            preferred_name: self.preferred_name,
            nicknames: normalize_list(&self.nicknames),
            age: normalize_number(&self.age),
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            pronouns: self.pronouns,
            current_location: self.current_location,
            hometown: self.hometown,
            nationality: self.nationality,
            languages_spoken: normalize_list(&self.languages_spoken),
            family_status: self.family_status,
            relationship_status: self.relationship_status,
            has_children: self.has_children,
            pets: normalize_list(&self.pets),
        })
    }
}

/// Step 2 form: professional life.
#[derive(Debug, Clone, Default)]
pub struct ProfessionalForm {
    pub current_status: String,
    pub job_title: String,
    pub company_organization: String,
    pub industry: String,
    pub work_experience_years: String,
    pub education_level: String,
    pub field_of_study: String,
    pub school_university: String,
    pub graduation_year: String,
    pub additional_certifications: String,
    pub career_goals: String,
    pub key_achievements: String,
    pub skills: String,
    pub work_style: String,
}

impl ProfessionalForm {
    pub fn prefill(profile: &WizardProfile) -> Self {
        let p = &profile.professional;
        Self {
            current_status: p.current_status.clone(),
            job_title: p.job_title.clone(),
            company_organization: p.company_organization.clone(),
            industry: p.industry.clone(),
            work_experience_years: number_to_text(&p.work_experience_years),
            education_level: p.education_level.clone(),
            field_of_study: p.field_of_study.clone(),
            school_university: p.school_university.clone(),
            graduation_year: number_to_text(&p.graduation_year),
            additional_certifications: list_to_text(&p.additional_certifications),
            career_goals: list_to_text(&p.career_goals),
            key_achievements: list_to_text(&p.key_achievements),
            skills: list_to_text(&p.skills),
            work_style: p.work_style.clone(),
        }
    }

    pub fn submit(self) -> TopicPayload {
        TopicPayload::Professional(ProfessionalInfo {
            current_status: self.current_status,
            job_title: self.job_title,
            company_organization: self.company_organization,
            industry: self.industry,
            work_experience_years: normalize_number(&self.work_experience_years),
            education_level: self.education_level,
            field_of_study: self.field_of_study,
            school_university: self.school_university,
            graduation_year: normalize_number(&self.graduation_year),
            additional_certifications: normalize_list(&self.additional_certifications),
            career_goals: normalize_list(&self.career_goals),
            key_achievements: normalize_list(&self.key_achievements),
            skills: normalize_list(&self.skills),
            work_style: self.work_style,
        })
    }
}

/// Step 3 form: life story. Almost everything here is a delimited list.
#[derive(Debug, Clone, Default)]
pub struct BackgroundForm {
    pub childhood_memories: String,
    pub school_experiences: String,
    pub favorite_subjects: String,
    pub extracurricular_activities: String,
    pub college_experiences: String,
    pub college_activities: String,
    pub memorable_professors: String,
    pub friendship_style: String,
    pub social_preferences: String,
    pub close_friends_description: String,
    pub hobbies: String,
    pub favorite_games: String,
    pub sports_activities: String,
    pub creative_pursuits: String,
    pub favorite_foods: String,
    pub cooking_preferences: String,
    pub dietary_restrictions: String,
    pub favorite_music: String,
    pub favorite_movies: String,
    pub favorite_books: String,
    pub favorite_tv_shows: String,
}

impl BackgroundForm {
    pub fn prefill(profile: &WizardProfile) -> Self {
        let b = &profile.background;
        Self {
            childhood_memories: list_to_text(&b.childhood_memories),
            school_experiences: list_to_text(&b.school_experiences),
            favorite_subjects: list_to_text(&b.favorite_subjects),
            extracurricular_activities: list_to_text(&b.extracurricular_activities),
            college_experiences: list_to_text(&b.college_experiences),
            college_activities: list_to_text(&b.college_activities),
            memorable_professors: list_to_text(&b.memorable_professors),
            friendship_style: b.friendship_style.clone(),
            social_preferences: list_to_text(&b.social_preferences),
            close_friends_description: b.close_friends_description.clone(),
            hobbies: list_to_text(&b.hobbies),
            favorite_games: list_to_text(&b.favorite_games),
            sports_activities: list_to_text(&b.sports_activities),
            creative_pursuits: list_to_text(&b.creative_pursuits),
            favorite_foods: list_to_text(&b.favorite_foods),
            cooking_preferences: b.cooking_preferences.clone(),
            dietary_restrictions: list_to_text(&b.dietary_restrictions),
            favorite_music: list_to_text(&b.favorite_music),
            favorite_movies: list_to_text(&b.favorite_movies),
            favorite_books: list_to_text(&b.favorite_books),
            favorite_tv_shows: list_to_text(&b.favorite_tv_shows),
        }
    }

    pub fn submit(self) -> TopicPayload {
        TopicPayload::Background(BackgroundInfo {
            childhood_memories: normalize_list(&self.childhood_memories),
            school_experiences: normalize_list(&self.school_experiences),
            favorite_subjects: normalize_list(&self.favorite_subjects),
            extracurricular_activities: normalize_list(&self.extracurricular_activities),
            college_experiences: normalize_list(&self.college_experiences),
            college_activities: normalize_list(&self.college_activities),
            memorable_professors: normalize_list(&self.memorable_professors),
            friendship_style: self.friendship_style,
            social_preferences: normalize_list(&self.social_preferences),
            close_friends_description: self.close_friends_description,
            hobbies: normalize_list(&self.hobbies),
            favorite_games: normalize_list(&self.favorite_games),
            sports_activities: normalize_list(&self.sports_activities),
            creative_pursuits: normalize_list(&self.creative_pursuits),
            favorite_foods: normalize_list(&self.favorite_foods),
            cooking_preferences: self.cooking_preferences,
            dietary_restrictions: normalize_list(&self.dietary_restrictions),
            favorite_music: normalize_list(&self.favorite_music),
            favorite_movies: normalize_list(&self.favorite_movies),
            favorite_books: normalize_list(&self.favorite_books),
            favorite_tv_shows: normalize_list(&self.favorite_tv_shows),
        })
    }
}

/// Step 4 form: personality. The rating fields come from slider controls and
/// arrive as text like any other input.
#[derive(Debug, Clone, Default)]
pub struct PersonalityForm {
    pub communication_tone: String,
    pub response_style: String,
    pub humor_level: String,
    pub formality_level: String,
    pub empathy_level: String,
    pub optimism_level: String,
    pub patience_level: String,
    pub enthusiasm_level: String,
    pub decision_making_style: String,
    pub problem_solving_approach: String,
    pub learning_style: String,
    pub introversion_extroversion: String,
    pub conflict_resolution: String,
    pub leadership_style: String,
    pub scenario_responses: BTreeMap<String, String>,
}

impl PersonalityForm {
    pub fn prefill(profile: &WizardProfile) -> Self {
        let p = &profile.personality;
        Self {
            communication_tone: p.communication_tone.clone(),
            response_style: p.response_style.clone(),
            humor_level: number_to_text(&p.humor_level),
            formality_level: number_to_text(&p.formality_level),
            empathy_level: number_to_text(&p.empathy_level),
            optimism_level: number_to_text(&p.optimism_level),
            patience_level: number_to_text(&p.patience_level),
            enthusiasm_level: number_to_text(&p.enthusiasm_level),
            decision_making_style: p.decision_making_style.clone(),
            problem_solving_approach: p.problem_solving_approach.clone(),
            learning_style: p.learning_style.clone(),
            introversion_extroversion: number_to_text(&p.introversion_extroversion),
            conflict_resolution: p.conflict_resolution.clone(),
            leadership_style: p.leadership_style.clone(),
            scenario_responses: p.scenario_responses.clone(),
        }
    }

    pub fn submit(self) -> TopicPayload {
        TopicPayload::Personality(PersonalityInfo {
            communication_tone: self.communication_tone,
            response_style: self.response_style,
            humor_level: normalize_scale(&self.humor_level),
            formality_level: normalize_scale(&self.formality_level),
            empathy_level: normalize_scale(&self.empathy_level),
            optimism_level: normalize_scale(&self.optimism_level),
            patience_level: normalize_scale(&self.patience_level),
            enthusiasm_level: normalize_scale(&self.enthusiasm_level),
            decision_making_style: self.decision_making_style,
            problem_solving_approach: self.problem_solving_approach,
            learning_style: self.learning_style,
            introversion_extroversion: normalize_scale(&self.introversion_extroversion),
            conflict_resolution: self.conflict_resolution,
            leadership_style: self.leadership_style,
            scenario_responses: self.scenario_responses,
        })
    }
}

/// Step 5 form: characteristics.
#[derive(Debug, Clone, Default)]
pub struct CharacteristicsForm {
    pub core_values: String,
    pub strengths: String,
    pub weaknesses: String,
    pub motivations: String,
    pub risk_tolerance: String,
    pub adaptability: String,
    pub attention_to_detail: String,
    pub creativity_level: String,
    pub work_life_balance: String,
    pub success_definition: String,
    pub failure_handling: String,
    pub stress_management: String,
    pub pet_peeves: String,
    pub unique_habits: String,
    pub superstitions: String,
    pub role_models: String,
    pub inspirational_quotes: String,
    pub life_philosophy: String,
}

impl CharacteristicsForm {
    pub fn prefill(profile: &WizardProfile) -> Self {
        let c = &profile.characteristics;
        Self {
            core_values: list_to_text(&c.core_values),
            strengths: list_to_text(&c.strengths),
            weaknesses: list_to_text(&c.weaknesses),
            motivations: list_to_text(&c.motivations),
            risk_tolerance: number_to_text(&c.risk_tolerance),
            adaptability: number_to_text(&c.adaptability),
            attention_to_detail: number_to_text(&c.attention_to_detail),
            creativity_level: number_to_text(&c.creativity_level),
            work_life_balance: c.work_life_balance.clone(),
            success_definition: c.success_definition.clone(),
            failure_handling: c.failure_handling.clone(),
            stress_management: c.stress_management.clone(),
            pet_peeves: list_to_text(&c.pet_peeves),
            unique_habits: list_to_text(&c.unique_habits),
            superstitions: list_to_text(&c.superstitions),
            role_models: list_to_text(&c.role_models),
            inspirational_quotes: list_to_text(&c.inspirational_quotes),
            life_philosophy: c.life_philosophy.clone(),
        }
    }

    pub fn submit(self) -> TopicPayload {
        TopicPayload::Characteristics(CharacteristicsInfo {
            core_values: normalize_list(&self.core_values),
            strengths: normalize_list(&self.strengths),
            weaknesses: normalize_list(&self.weaknesses),
            motivations: normalize_list(&self.motivations),
            risk_tolerance: normalize_scale(&self.risk_tolerance),
            adaptability: normalize_scale(&self.adaptability),
            attention_to_detail: normalize_scale(&self.attention_to_detail),
            creativity_level: normalize_scale(&self.creativity_level),
            work_life_balance: self.work_life_balance,
            success_definition: self.success_definition,
            failure_handling: self.failure_handling,
            stress_management: self.stress_management,
            pet_peeves: normalize_list(&self.pet_peeves),
            unique_habits: normalize_list(&self.unique_habits),
            superstitions: normalize_list(&self.superstitions),
            role_models: normalize_list(&self.role_models),
            inspirational_quotes: normalize_list(&self.inspirational_quotes),
            life_philosophy: self.life_philosophy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personal_form_shapes_lists_and_numbers() {
        let form = PersonalForm {
            full_name: "Ada Lovelace".into(),
            nicknames: "Ada, countess,, ".into(),
            age: "36".into(),
            languages_spoken: "English, French".into(),
            pets: "".into(),
            ..Default::default()
        };
        let TopicPayload::Personal(p) = form.submit() else {
            panic!("wrong topic");
        };
        assert_eq!(p.nicknames, vec!["Ada", "countess"]);
        assert_eq!(p.age, Some(36));
        assert_eq!(p.languages_spoken, vec!["English", "French"]);
        assert!(p.pets.is_empty());
    }

    #[test]
    fn professional_form_blank_numbers_become_none() {
        let form = ProfessionalForm {
            work_experience_years: "".into(),
            graduation_year: "n/a".into(),
            skills: "rust, sql".into(),
            ..Default::default()
        };
        let TopicPayload::Professional(p) = form.submit() else {
            panic!("wrong topic");
        };
        assert_eq!(p.work_experience_years, None);
        assert_eq!(p.graduation_year, None);
        assert_eq!(p.skills, vec!["rust", "sql"]);
    }

    #[test]
    fn prefill_round_trips_submitted_values() {
        let mut profile = WizardProfile::default();
        let form = BackgroundForm {
            hobbies: "chess, hiking".into(),
            friendship_style: "small circle".into(),
            ..Default::default()
        };
        profile.replace_topic(form.submit());

        let refilled = BackgroundForm::prefill(&profile);
        assert_eq!(refilled.hobbies, "chess, hiking");
        assert_eq!(refilled.friendship_style, "small circle");
    }

    #[test]
    fn personality_scales_parse_or_none() {
        let form = PersonalityForm {
            humor_level: "4".into(),
            formality_level: "".into(),
            ..Default::default()
        };
        let TopicPayload::Personality(p) = form.submit() else {
            panic!("wrong topic");
        };
        assert_eq!(p.humor_level, Some(4));
        assert_eq!(p.formality_level, None);
    }
}
