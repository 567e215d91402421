use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::form::FormField;

/// Control values exactly as the browser submitted them.
///
/// Inputs arrive as strings, but JSON numbers and booleans are accepted too and
/// stringified so that every field goes through the same validation path.
/// Missing fields are empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawStudentForm {
    #[serde(deserialize_with = "form_value")]
    pub part_time_job: String,
    #[serde(deserialize_with = "form_value")]
    pub extracurricular_activities: String,
    #[serde(deserialize_with = "form_value")]
    pub absence_days: String,
    #[serde(deserialize_with = "form_value")]
    pub weekly_self_study_hours: String,
    #[serde(deserialize_with = "form_value")]
    pub math_score: String,
    #[serde(deserialize_with = "form_value")]
    pub physics_score: String,
    #[serde(deserialize_with = "form_value")]
    pub chemistry_score: String,
    #[serde(deserialize_with = "form_value")]
    pub biology_score: String,
    #[serde(deserialize_with = "form_value")]
    pub english_score: String,
    #[serde(deserialize_with = "form_value")]
    pub history_score: String,
    #[serde(deserialize_with = "form_value")]
    pub geography_score: String,
}

impl RawStudentForm {
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::PartTimeJob => &self.part_time_job,
            FormField::ExtracurricularActivities => &self.extracurricular_activities,
            FormField::AbsenceDays => &self.absence_days,
            FormField::WeeklySelfStudyHours => &self.weekly_self_study_hours,
            FormField::MathScore => &self.math_score,
            FormField::PhysicsScore => &self.physics_score,
            FormField::ChemistryScore => &self.chemistry_score,
            FormField::BiologyScore => &self.biology_score,
            FormField::EnglishScore => &self.english_score,
            FormField::HistoryScore => &self.history_score,
            FormField::GeographyScore => &self.geography_score,
        }
    }
}

fn form_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(if b { "Yes" } else { "No" }.to_string()),
        Value::Array(_) | Value::Object(_) => Err(serde::de::Error::custom(
            "form values must be strings, numbers or booleans",
        )),
    }
}

/// A validated student profile. Only `validate_form` constructs one.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentProfile {
    pub part_time_job: bool,
    pub extracurricular_activities: bool,
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

/// Per-field validation messages, keyed by wire name when serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<FormField, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.iter().map(|(field, msg)| format!("{field}: {msg}")).collect();
        f.write_str(&parts.join("; "))
    }
}
