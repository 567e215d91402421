//! Field descriptors for the student profile form.
//!
//! Every control the form renders is listed here once, with its wire name, label
//! and kind. Bounds come from the active `ValidationProfile`, so the same
//! descriptor list drives validation, the schema endpoint and the payload.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    PartTimeJob,
    ExtracurricularActivities,
    AbsenceDays,
    WeeklySelfStudyHours,
    MathScore,
    PhysicsScore,
    ChemistryScore,
    BiologyScore,
    EnglishScore,
    HistoryScore,
    GeographyScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Select control with Yes/No, encoded as 0/1 on the wire.
    YesNo,
    /// Whole-number input with a unit ("day").
    Count { unit: &'static str },
    /// Decimal input with a unit ("hour").
    Measure { unit: &'static str },
    /// Subject score.
    Score,
}

impl FormField {
    pub const ALL: [FormField; 11] = [
        FormField::PartTimeJob,
        FormField::ExtracurricularActivities,
        FormField::AbsenceDays,
        FormField::WeeklySelfStudyHours,
        FormField::MathScore,
        FormField::PhysicsScore,
        FormField::ChemistryScore,
        FormField::BiologyScore,
        FormField::EnglishScore,
        FormField::HistoryScore,
        FormField::GeographyScore,
    ];

    /// Name used both in the form body and in the prediction payload.
    pub fn name(self) -> &'static str {
        match self {
            FormField::PartTimeJob => "part_time_job",
            FormField::ExtracurricularActivities => "extracurricular_activities",
            FormField::AbsenceDays => "absence_days",
            FormField::WeeklySelfStudyHours => "weekly_self_study_hours",
            FormField::MathScore => "math_score",
            FormField::PhysicsScore => "physics_score",
            FormField::ChemistryScore => "chemistry_score",
            FormField::BiologyScore => "biology_score",
            FormField::EnglishScore => "english_score",
            FormField::HistoryScore => "history_score",
            FormField::GeographyScore => "geography_score",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::PartTimeJob => "Part time job",
            FormField::ExtracurricularActivities => "Extracurricular activities",
            FormField::AbsenceDays => "Absence days",
            FormField::WeeklySelfStudyHours => "Weekly self-study hours",
            FormField::MathScore => "Math score",
            FormField::PhysicsScore => "Physics score",
            FormField::ChemistryScore => "Chemistry score",
            FormField::BiologyScore => "Biology score",
            FormField::EnglishScore => "English score",
            FormField::HistoryScore => "History score",
            FormField::GeographyScore => "Geography score",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            FormField::PartTimeJob | FormField::ExtracurricularActivities => FieldKind::YesNo,
            FormField::AbsenceDays => FieldKind::Count { unit: "day" },
            FormField::WeeklySelfStudyHours => FieldKind::Measure { unit: "hour" },
            _ => FieldKind::Score,
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Which set of limits the form enforces.
///
/// `Strict` is the canonical form: at least one absence day and one study hour,
/// scores of 50 or more. `Relaxed` opens everything down to zero with tighter
/// upper limits on days and hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationProfile {
    #[default]
    Strict,
    Relaxed,
}

impl ValidationProfile {
    /// Numeric bounds for `field`, or `None` for Yes/No fields.
    pub fn bounds(self, field: FormField) -> Option<Bounds> {
        let bounds = match (self, field.kind()) {
            (_, FieldKind::YesNo) => return None,
            (ValidationProfile::Strict, FieldKind::Count { .. }) => Bounds::new(1.0, 36.0),
            (ValidationProfile::Strict, FieldKind::Measure { .. }) => Bounds::new(1.0, 36.0),
            (ValidationProfile::Strict, FieldKind::Score) => Bounds::new(50.0, 100.0),
            (ValidationProfile::Relaxed, FieldKind::Count { .. }) => Bounds::new(0.0, 20.0),
            (ValidationProfile::Relaxed, FieldKind::Measure { .. }) => Bounds::new(0.0, 30.0),
            (ValidationProfile::Relaxed, FieldKind::Score) => Bounds::new(0.0, 100.0),
        };
        Some(bounds)
    }
}

impl FromStr for ValidationProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ValidationProfile::Strict),
            "relaxed" => Ok(ValidationProfile::Relaxed),
            other => Err(format!("unknown form profile '{other}' (expected strict or relaxed)")),
        }
    }
}

/// One control as a frontend needs to render it.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<[&'static str; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSchema {
    pub profile: ValidationProfile,
    pub fields: Vec<FieldDescriptor>,
}

pub fn form_schema(profile: ValidationProfile) -> FormSchema {
    let fields = FormField::ALL
        .iter()
        .map(|&field| {
            let kind = field.kind();
            FieldDescriptor {
                name: field.name(),
                label: field.label(),
                kind,
                bounds: profile.bounds(field),
                options: matches!(kind, FieldKind::YesNo).then_some(["Yes", "No"]),
                step: match kind {
                    FieldKind::YesNo => None,
                    FieldKind::Count { .. } | FieldKind::Score => Some(1.0),
                    FieldKind::Measure { .. } => Some(0.1),
                },
            }
        })
        .collect();

    FormSchema { profile, fields }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fields_have_unique_names() {
        let mut names: Vec<_> = FormField::ALL.iter().map(|f| f.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 11);
    }

    #[test]
    fn test_serde_name_matches_wire_name() {
        for field in FormField::ALL {
            let json = serde_json::to_value(field).unwrap();
            assert_eq!(json, field.name());
        }
    }

    #[test]
    fn test_strict_score_bounds() {
        let b = ValidationProfile::Strict.bounds(FormField::MathScore).unwrap();
        assert_eq!(b, Bounds::new(50.0, 100.0));
        assert!(b.contains(50.0));
        assert!(b.contains(100.0));
        assert!(!b.contains(49.9));
    }

    #[test]
    fn test_relaxed_day_and_hour_bounds() {
        let p = ValidationProfile::Relaxed;
        assert_eq!(p.bounds(FormField::AbsenceDays), Some(Bounds::new(0.0, 20.0)));
        assert_eq!(p.bounds(FormField::WeeklySelfStudyHours), Some(Bounds::new(0.0, 30.0)));
    }

    #[test]
    fn test_yes_no_has_no_bounds() {
        assert!(ValidationProfile::Strict.bounds(FormField::PartTimeJob).is_none());
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!("Relaxed".parse::<ValidationProfile>(), Ok(ValidationProfile::Relaxed));
        assert_eq!(" strict ".parse::<ValidationProfile>(), Ok(ValidationProfile::Strict));
        assert!("lenient".parse::<ValidationProfile>().is_err());
    }

    #[test]
    fn test_schema_lists_every_field_in_order() {
        let schema = form_schema(ValidationProfile::Strict);
        let names: Vec<_> = schema.fields.iter().map(|f| f.name).collect();
        let expected: Vec<_> = FormField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names, expected);
        assert_eq!(schema.fields[0].options, Some(["Yes", "No"]));
        assert_eq!(schema.fields[3].step, Some(0.1));
    }
}
