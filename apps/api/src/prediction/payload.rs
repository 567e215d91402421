use serde::Serialize;

use crate::form::StudentProfile;

/// Request body for `POST {base}/predict`.
///
/// Field order and names follow the prediction service's `StudentData` model.
/// Yes/No answers travel as 0/1 integers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictPayload {
    pub part_time_job: u8,
    pub extracurricular_activities: u8,
    pub absence_days: u32,
    pub weekly_self_study_hours: f64,
    pub math_score: f64,
    pub physics_score: f64,
    pub chemistry_score: f64,
    pub biology_score: f64,
    pub english_score: f64,
    pub history_score: f64,
    pub geography_score: f64,
}

impl PredictPayload {
    /// Encodes a validated profile. Performs no validation of its own.
    pub fn from_profile(profile: &StudentProfile) -> Self {
        Self {
            part_time_job: u8::from(profile.part_time_job),
            extracurricular_activities: u8::from(profile.extracurricular_activities),
            absence_days: profile.absence_days,
            weekly_self_study_hours: profile.weekly_self_study_hours,
            math_score: profile.math_score,
            physics_score: profile.physics_score,
            chemistry_score: profile.chemistry_score,
            biology_score: profile.biology_score,
            english_score: profile.english_score,
            history_score: profile.history_score,
            geography_score: profile.geography_score,
        }
    }
}
