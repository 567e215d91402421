//! Turns the prediction service's response body into ranked, displayable results.
//!
//! The whole batch is validated before anything is returned: one malformed
//! model fails the response and no partial set is produced.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Model name used for `single` responses when none is configured.
/// The stock backend serves one tuned XGBoost model.
pub const DEFAULT_SINGLE_MODEL: &str = "XGBoost";

/// Which envelope the prediction service wraps its results in.
///
/// A deployment talks to exactly one service version, so only the configured
/// shape is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResponseShape {
    /// `{ "<model>": result, ... }`
    #[default]
    Flat,
    /// `{ "predictions": { "<model>": result, ... } }`
    Enveloped,
    /// One bare result, `{ "predicted_faculty": ..., "top_n": [...] }`,
    /// reported under `model`.
    Single { model: String },
}

impl FromStr for ResponseShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(ResponseShape::Flat),
            "enveloped" => Ok(ResponseShape::Enveloped),
            "single" => Ok(ResponseShape::Single {
                model: DEFAULT_SINGLE_MODEL.to_string(),
            }),
            other => Err(format!(
                "unknown response shape '{other}' (expected flat, enveloped or single)"
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResponseShapeError {
    #[error("response body is not a JSON object")]
    NotAnObject,

    #[error("response is missing the 'predictions' envelope")]
    MissingEnvelope,

    #[error("response contains no model predictions")]
    NoModels,

    #[error("model '{model}' result is malformed: {source}")]
    Malformed {
        model: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("model '{model}' reports probability {probability} for '{faculty}', expected a percentage in [0, 100]")]
    ProbabilityOutOfRange {
        model: String,
        faculty: String,
        probability: f64,
    },

    #[error("model '{model}' lists faculty '{faculty}' more than once")]
    DuplicateFaculty { model: String, faculty: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacultyProbability {
    pub faculty: String,
    /// Percentage in [0, 100].
    pub probability: f64,
}

#[derive(Debug, Deserialize)]
struct RawModelResult {
    predicted_faculty: String,
    #[serde(rename = "Total_Score", default)]
    total_score: Option<f64>,
    top_n: Vec<FacultyProbability>,
    #[serde(default)]
    ai_explanation: Option<String>,
}

/// One model's result, with `top_n` ranked highest probability first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPrediction {
    pub predicted_faculty: String,
    #[serde(rename = "Total_Score", skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,
    pub top_n: Vec<FacultyProbability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_explanation: Option<String>,
}

/// Model name → ranked result, in the order the service listed the models.
/// Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionSet(Vec<(String, ModelPrediction)>);

impl PredictionSet {
    pub fn get(&self, model: &str) -> Option<&ModelPrediction> {
        self.0.iter().find(|(name, _)| name == model).map(|(_, p)| p)
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }
}

impl FromIterator<(String, ModelPrediction)> for PredictionSet {
    fn from_iter<I: IntoIterator<Item = (String, ModelPrediction)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for PredictionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (model, prediction) in &self.0 {
            map.serialize_entry(model, prediction)?;
        }
        map.end()
    }
}

/// Validates and ranks a response body.
///
/// `top_n` lists are sorted by probability descending (stable, so ties keep
/// the service's order) and cut to `limit` entries. Models keep the order the
/// service sent them in.
pub fn normalize(
    body: &Value,
    shape: &ResponseShape,
    limit: usize,
) -> Result<PredictionSet, ResponseShapeError> {
    let models = models_in(body, shape)?;
    if models.is_empty() {
        return Err(ResponseShapeError::NoModels);
    }

    models
        .into_iter()
        .map(|(model, result)| {
            normalize_model(&model, result, limit).map(|prediction| (model, prediction))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(PredictionSet)
}

fn models_in<'a>(
    body: &'a Value,
    shape: &ResponseShape,
) -> Result<Vec<(String, &'a Value)>, ResponseShapeError> {
    let root = body.as_object().ok_or(ResponseShapeError::NotAnObject)?;
    let models = match shape {
        ResponseShape::Flat => root,
        ResponseShape::Enveloped => root
            .get("predictions")
            .and_then(Value::as_object)
            .ok_or(ResponseShapeError::MissingEnvelope)?,
        ResponseShape::Single { model } => return Ok(vec![(model.clone(), body)]),
    };
    Ok(models.iter().map(|(name, result)| (name.clone(), result)).collect())
}

fn normalize_model(
    model: &str,
    result: &Value,
    limit: usize,
) -> Result<ModelPrediction, ResponseShapeError> {
    let raw = RawModelResult::deserialize(result).map_err(|source| ResponseShapeError::Malformed {
        model: model.to_string(),
        source,
    })?;

    let mut seen = HashSet::new();
    for candidate in &raw.top_n {
        if !candidate.probability.is_finite() || !(0.0..=100.0).contains(&candidate.probability) {
            return Err(ResponseShapeError::ProbabilityOutOfRange {
                model: model.to_string(),
                faculty: candidate.faculty.clone(),
                probability: candidate.probability,
            });
        }
        if !seen.insert(candidate.faculty.as_str()) {
            return Err(ResponseShapeError::DuplicateFaculty {
                model: model.to_string(),
                faculty: candidate.faculty.clone(),
            });
        }
    }

    let mut top_n = raw.top_n;
    rank(&mut top_n);
    top_n.truncate(limit);

    Ok(ModelPrediction {
        predicted_faculty: raw.predicted_faculty,
        total_score: raw.total_score,
        top_n,
        ai_explanation: raw.ai_explanation,
    })
}

/// Stable sort, highest probability first.
fn rank(candidates: &mut [FacultyProbability]) {
    candidates.sort_by(|a, b| b.probability.total_cmp(&a.probability));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn faculties(prediction: &ModelPrediction) -> Vec<(&str, f64)> {
        prediction
            .top_n
            .iter()
            .map(|c| (c.faculty.as_str(), c.probability))
            .collect()
    }

    #[test]
    fn test_sorts_top_n_descending() {
        let body = json!({
            "XGBoost": {
                "predicted_faculty": "B",
                "top_n": [
                    { "faculty": "A", "probability": 10 },
                    { "faculty": "B", "probability": 90 }
                ]
            }
        });
        let set = normalize(&body, &ResponseShape::Flat, 3).unwrap();
        assert_eq!(faculties(set.get("XGBoost").unwrap()), vec![("B", 90.0), ("A", 10.0)]);
    }

    #[test]
    fn test_ties_keep_service_order() {
        let body = json!({
            "RandomForest": {
                "predicted_faculty": "Medicine",
                "top_n": [
                    { "faculty": "Law", "probability": 20.0 },
                    { "faculty": "Medicine", "probability": 40.0 },
                    { "faculty": "Arts", "probability": 20.0 },
                    { "faculty": "Business", "probability": 20.0 }
                ]
            }
        });
        let set = normalize(&body, &ResponseShape::Flat, 10).unwrap();
        assert_eq!(
            faculties(set.get("RandomForest").unwrap()),
            vec![("Medicine", 40.0), ("Law", 20.0), ("Arts", 20.0), ("Business", 20.0)]
        );
    }

    #[test]
    fn test_truncates_to_limit_after_sorting() {
        let body = json!({
            "XGBoost": {
                "predicted_faculty": "D",
                "top_n": [
                    { "faculty": "A", "probability": 5 },
                    { "faculty": "B", "probability": 15 },
                    { "faculty": "C", "probability": 30 },
                    { "faculty": "D", "probability": 50 }
                ]
            }
        });
        let set = normalize(&body, &ResponseShape::Flat, 3).unwrap();
        assert_eq!(
            faculties(set.get("XGBoost").unwrap()),
            vec![("D", 50.0), ("C", 30.0), ("B", 15.0)]
        );
    }

    #[test]
    fn test_keeps_total_score_and_explanation() {
        let body = json!({
            "StackingEnsemble": {
                "predicted_faculty": "Engineering",
                "Total_Score": 578,
                "ai_explanation": "Strong science results.",
                "top_n": [{ "faculty": "Engineering", "probability": 71.3 }]
            }
        });
        let set = normalize(&body, &ResponseShape::Flat, 3).unwrap();
        let prediction = set.get("StackingEnsemble").unwrap();
        assert_eq!(prediction.total_score, Some(578.0));
        assert_eq!(prediction.ai_explanation.as_deref(), Some("Strong science results."));

        let json = serde_json::to_value(prediction).unwrap();
        assert_eq!(json["Total_Score"], json!(578.0));
    }

    #[test]
    fn test_enveloped_shape() {
        let body = json!({
            "predictions": {
                "XGBoost": {
                    "predicted_faculty": "Law",
                    "top_n": [{ "faculty": "Law", "probability": 64.2 }]
                }
            }
        });
        let set = normalize(&body, &ResponseShape::Enveloped, 3).unwrap();
        assert_eq!(set.get("XGBoost").unwrap().predicted_faculty, "Law");
    }

    #[test]
    fn test_enveloped_shape_requires_envelope() {
        let body = json!({
            "XGBoost": { "predicted_faculty": "Law", "top_n": [] }
        });
        assert!(matches!(
            normalize(&body, &ResponseShape::Enveloped, 3),
            Err(ResponseShapeError::MissingEnvelope)
        ));
    }

    #[test]
    fn test_missing_top_n_fails_whole_batch() {
        let body = json!({
            "RandomForest": {
                "predicted_faculty": "Law",
                "top_n": [{ "faculty": "Law", "probability": 80 }]
            },
            "XGBoost": { "predicted_faculty": "Law" }
        });
        let err = normalize(&body, &ResponseShape::Flat, 3).unwrap_err();
        match err {
            ResponseShapeError::Malformed { model, .. } => assert_eq!(model, "XGBoost"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_probability_rejected() {
        let body = json!({
            "XGBoost": {
                "predicted_faculty": "Law",
                "top_n": [{ "faculty": "Law", "probability": "high" }]
            }
        });
        assert!(matches!(
            normalize(&body, &ResponseShape::Flat, 3),
            Err(ResponseShapeError::Malformed { .. })
        ));
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let body = json!({
            "XGBoost": {
                "predicted_faculty": "Law",
                "top_n": [{ "faculty": "Law", "probability": 120.5 }]
            }
        });
        assert!(matches!(
            normalize(&body, &ResponseShape::Flat, 3),
            Err(ResponseShapeError::ProbabilityOutOfRange { .. })
        ));
    }

    #[test]
    fn test_duplicate_faculty_rejected() {
        let body = json!({
            "XGBoost": {
                "predicted_faculty": "Law",
                "top_n": [
                    { "faculty": "Law", "probability": 50 },
                    { "faculty": "Law", "probability": 30 }
                ]
            }
        });
        assert!(matches!(
            normalize(&body, &ResponseShape::Flat, 3),
            Err(ResponseShapeError::DuplicateFaculty { .. })
        ));
    }

    #[test]
    fn test_empty_and_non_object_bodies_rejected() {
        assert!(matches!(
            normalize(&json!({}), &ResponseShape::Flat, 3),
            Err(ResponseShapeError::NoModels)
        ));
        assert!(matches!(
            normalize(&json!([1, 2]), &ResponseShape::Flat, 3),
            Err(ResponseShapeError::NotAnObject)
        ));
    }

    #[test]
    fn test_empty_top_n_is_allowed() {
        let body = json!({ "XGBoost": { "predicted_faculty": "Law", "top_n": [] } });
        let set = normalize(&body, &ResponseShape::Flat, 3).unwrap();
        assert!(set.get("XGBoost").unwrap().top_n.is_empty());
    }

    #[test]
    fn test_shape_from_str() {
        assert_eq!("Enveloped".parse::<ResponseShape>(), Ok(ResponseShape::Enveloped));
        assert_eq!(
            "single".parse::<ResponseShape>(),
            Ok(ResponseShape::Single {
                model: DEFAULT_SINGLE_MODEL.to_string()
            })
        );
        assert!("nested".parse::<ResponseShape>().is_err());
    }

    fn bare_backend_body() -> Value {
        json!({
            "predicted_faculty": "Engineering",
            "top_n": [
                { "faculty": "Engineering", "probability": 71.3 },
                { "faculty": "Medicine", "probability": 18.45 },
                { "faculty": "Business", "probability": 6.1 }
            ],
            "ai_explanation": "Ardaygan waxaa loo soo jeediyey Fakultiyadda Engineering."
        })
    }

    #[test]
    fn test_single_shape_reads_bare_result() {
        let shape = "single".parse::<ResponseShape>().unwrap();
        let set = normalize(&bare_backend_body(), &shape, 3).unwrap();

        assert_eq!(set.models().count(), 1);
        let prediction = set.get(DEFAULT_SINGLE_MODEL).unwrap();
        assert_eq!(prediction.predicted_faculty, "Engineering");
        assert_eq!(
            faculties(prediction),
            vec![("Engineering", 71.3), ("Medicine", 18.45), ("Business", 6.1)]
        );
        assert!(prediction.ai_explanation.is_some());
    }

    #[test]
    fn test_single_shape_uses_configured_model_name() {
        let shape = ResponseShape::Single {
            model: "RandomForest".to_string(),
        };
        let set = normalize(&bare_backend_body(), &shape, 3).unwrap();
        assert_eq!(set.models().collect::<Vec<_>>(), vec!["RandomForest"]);
    }

    #[test]
    fn test_bare_result_is_not_a_flat_map() {
        assert!(matches!(
            normalize(&bare_backend_body(), &ResponseShape::Flat, 3),
            Err(ResponseShapeError::Malformed { .. })
        ));
    }

    #[test]
    fn test_single_shape_still_validates() {
        let shape = "single".parse::<ResponseShape>().unwrap();
        let body = json!({ "predicted_faculty": "Law" });
        assert!(matches!(
            normalize(&body, &shape, 3),
            Err(ResponseShapeError::Malformed { .. })
        ));
    }

    #[test]
    fn test_models_keep_service_order() {
        let body = json!({
            "XGBoost": { "predicted_faculty": "Law", "top_n": [] },
            "RandomForest": { "predicted_faculty": "Law", "top_n": [] },
            "StackingEnsemble": { "predicted_faculty": "Law", "top_n": [] }
        });
        let set = normalize(&body, &ResponseShape::Flat, 3).unwrap();
        assert_eq!(
            set.models().collect::<Vec<_>>(),
            vec!["XGBoost", "RandomForest", "StackingEnsemble"]
        );

        let json = serde_json::to_string(&set).unwrap();
        let xgb = json.find("XGBoost").unwrap();
        let rf = json.find("RandomForest").unwrap();
        assert!(xgb < rf);
    }
}
