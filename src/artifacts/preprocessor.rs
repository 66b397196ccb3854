use super::{ArtifactError, Transform};
use crate::assessment::applicant::ApplicantRecord;
use serde::Deserialize;
use std::io::Read;

/// Fitted feature transformation: standard scaling for the numeric columns
/// followed by one-hot indicators for the categorical columns, in artifact
/// order. The serialized form carries the statistics captured at training
/// time; nothing is re-fitted here.
#[derive(Debug, Clone, Deserialize)]
pub struct FittedPreprocessor {
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
}

#[derive(Debug, Clone, Deserialize)]
struct NumericColumn {
    column: String,
    mean: f64,
    scale: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct CategoricalColumn {
    column: String,
    categories: Vec<String>,
}

/// Named transformed features for a single record.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub(crate) fn new(names: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl FittedPreprocessor {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ArtifactError> {
        let parsed: Self = serde_json::from_reader(reader).map_err(|source| {
            ArtifactError::Malformed {
                kind: "preprocessor",
                source,
            }
        })?;

        if parsed.numeric.is_empty() && parsed.categorical.is_empty() {
            return Err(ArtifactError::Inconsistent {
                kind: "preprocessor",
                detail: "artifact declares no columns".to_string(),
            });
        }

        for column in &parsed.categorical {
            if column.categories.is_empty() {
                return Err(ArtifactError::Inconsistent {
                    kind: "preprocessor",
                    detail: format!("categorical column {} has no categories", column.column),
                });
            }
        }

        Ok(parsed)
    }

    /// Names of the transformed features, in output order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.feature_count());
        for numeric in &self.numeric {
            names.push(numeric.column.clone());
        }
        for categorical in &self.categorical {
            for category in &categorical.categories {
                names.push(format!("{}_{}", categorical.column, category));
            }
        }
        names
    }

    pub fn feature_count(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|column| column.categories.len())
                .sum::<usize>()
    }
}

impl Transform for FittedPreprocessor {
    fn transform(&self, record: &ApplicantRecord) -> Result<FeatureVector, ArtifactError> {
        let mut names = Vec::with_capacity(self.feature_count());
        let mut values = Vec::with_capacity(self.feature_count());

        for numeric in &self.numeric {
            let raw = record
                .numeric_value(&numeric.column)
                .ok_or_else(|| ArtifactError::SchemaMismatch {
                    detail: format!("record has no numeric column {}", numeric.column),
                })?;
            // Zero-variance columns pass through centered but unscaled.
            let scaled = if numeric.scale.abs() > f64::EPSILON {
                (raw - numeric.mean) / numeric.scale
            } else {
                raw - numeric.mean
            };
            names.push(numeric.column.clone());
            values.push(scaled);
        }

        for categorical in &self.categorical {
            let value = record.categorical_value(&categorical.column).ok_or_else(|| {
                ArtifactError::SchemaMismatch {
                    detail: format!("record has no categorical column {}", categorical.column),
                }
            })?;

            if !categorical.categories.iter().any(|c| c == value) {
                return Err(ArtifactError::SchemaMismatch {
                    detail: format!(
                        "value {value} not among fitted categories of {}",
                        categorical.column
                    ),
                });
            }

            for category in &categorical.categories {
                names.push(format!("{}_{}", categorical.column, category));
                values.push(if category == value { 1.0 } else { 0.0 });
            }
        }

        Ok(FeatureVector::new(names, values))
    }
}
