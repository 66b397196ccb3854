use super::preprocessor::FeatureVector;
use super::{ArtifactError, Predict};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Binary eligibility outcome. Never anything outside this closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityLabel {
    Eligible,
    NeedsReview,
}

impl EligibilityLabel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Eligible => "Eligible",
            Self::NeedsReview => "Needs Review",
        }
    }
}

/// Pre-fitted logistic classifier over the transformed feature layout. The
/// coefficient order is the artifact's feature-name order and must match the
/// transformation output exactly.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticClassifier {
    features: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
    threshold: f64,
}

impl LogisticClassifier {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ArtifactError> {
        let parsed: Self = serde_json::from_reader(reader).map_err(|source| {
            ArtifactError::Malformed {
                kind: "classifier",
                source,
            }
        })?;

        if parsed.features.len() != parsed.coefficients.len() {
            return Err(ArtifactError::Inconsistent {
                kind: "classifier",
                detail: format!(
                    "{} feature names but {} coefficients",
                    parsed.features.len(),
                    parsed.coefficients.len()
                ),
            });
        }

        if parsed.features.is_empty() {
            return Err(ArtifactError::Inconsistent {
                kind: "classifier",
                detail: "artifact declares no features".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&parsed.threshold) {
            return Err(ArtifactError::Inconsistent {
                kind: "classifier",
                detail: format!("threshold {} outside [0, 1]", parsed.threshold),
            });
        }

        Ok(parsed)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.features
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Confirms the transformed layout matches the fitted one, name for name
    /// and position for position.
    pub fn align(&self, features: &FeatureVector) -> Result<(), ArtifactError> {
        if features.names() != self.features.as_slice() {
            return Err(ArtifactError::SchemaMismatch {
                detail: format!(
                    "classifier was fitted on {} features; transformed record has {}",
                    self.features.len(),
                    features.len()
                ),
            });
        }
        Ok(())
    }

    /// Raw decision margin (log-odds) for an aligned feature vector.
    pub fn decision_margin(&self, features: &FeatureVector) -> Result<f64, ArtifactError> {
        self.align(features)?;
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features.values())
            .map(|(coefficient, value)| coefficient * value)
            .sum();
        Ok(dot + self.intercept)
    }

    pub fn probability(&self, features: &FeatureVector) -> Result<f64, ArtifactError> {
        let margin = self.decision_margin(features)?;
        Ok(1.0 / (1.0 + (-margin).exp()))
    }
}

impl Predict for LogisticClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<EligibilityLabel, ArtifactError> {
        let probability = self.probability(features)?;
        if probability >= self.threshold {
            Ok(EligibilityLabel::Eligible)
        } else {
            Ok(EligibilityLabel::NeedsReview)
        }
    }
}
