use crate::form::fields::{Bounds, FieldKind, FormField, ValidationProfile};
use crate::form::models::{FieldErrors, RawStudentForm, StudentProfile};

/// A single coerced control value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
}

impl FieldValue {
    fn flag(self) -> bool {
        matches!(self, FieldValue::Flag(true))
    }

    fn number(self) -> f64 {
        match self {
            FieldValue::Number(n) => n,
            FieldValue::Flag(b) => f64::from(u8::from(b)),
        }
    }
}

/// Validates and coerces one raw control value.
///
/// Empty input is a "required" failure and is never read as zero. Out-of-range
/// numbers fail with a bounds message; nothing is clamped.
pub fn validate_field(
    field: FormField,
    raw: &str,
    profile: ValidationProfile,
) -> Result<FieldValue, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(format!("{} is required", field.label()));
    }

    let kind = field.kind();
    if kind == FieldKind::YesNo {
        return parse_yes_no(raw)
            .map(FieldValue::Flag)
            .ok_or_else(|| "Select Yes or No".to_string());
    }

    let value: f64 = raw.parse().map_err(|_| "Must be a number".to_string())?;
    if !value.is_finite() {
        return Err("Must be a number".to_string());
    }
    if matches!(kind, FieldKind::Count { .. }) && value.fract() != 0.0 {
        return Err("Must be a whole number".to_string());
    }

    if let Some(bounds) = profile.bounds(field) {
        check_bounds(value, bounds, kind)?;
    }

    Ok(FieldValue::Number(value))
}

/// Validates every field, collecting all failures before giving up.
pub fn validate_form(
    raw: &RawStudentForm,
    profile: ValidationProfile,
) -> Result<StudentProfile, FieldErrors> {
    let mut errors = FieldErrors::default();
    let mut values = [FieldValue::Number(0.0); 11];

    for (slot, field) in values.iter_mut().zip(FormField::ALL) {
        match validate_field(field, raw.value(field), profile) {
            Ok(v) => *slot = v,
            Err(msg) => errors.insert(field, msg),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let [part_time_job, extracurricular, absence, hours, math, physics, chemistry, biology, english, history, geography] =
        values;

    Ok(StudentProfile {
        part_time_job: part_time_job.flag(),
        extracurricular_activities: extracurricular.flag(),
        // whole and within bounds, so the cast is exact
        absence_days: absence.number() as u32,
        weekly_self_study_hours: hours.number(),
        math_score: math.number(),
        physics_score: physics.number(),
        chemistry_score: chemistry.number(),
        biology_score: biology.number(),
        english_score: english.number(),
        history_score: history.number(),
        geography_score: geography.number(),
    })
}

fn parse_yes_no(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "yes" | "1" | "true" => Some(true),
        "no" | "0" | "false" => Some(false),
        _ => None,
    }
}

fn check_bounds(value: f64, bounds: Bounds, kind: FieldKind) -> Result<(), String> {
    if bounds.contains(value) {
        return Ok(());
    }
    if value < bounds.min {
        return Err(format!("Minimum {}", with_unit(bounds.min, kind)));
    }
    Err(format!("Maximum {}", with_unit(bounds.max, kind)))
}

fn with_unit(limit: f64, kind: FieldKind) -> String {
    let number = if limit.fract() == 0.0 {
        format!("{}", limit as i64)
    } else {
        format!("{limit}")
    };
    match kind {
        FieldKind::Count { unit } | FieldKind::Measure { unit } => {
            let plural = if limit == 1.0 { "" } else { "s" };
            format!("{number} {unit}{plural}")
        }
        FieldKind::Score | FieldKind::YesNo => number,
    }
}
