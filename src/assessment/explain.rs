//! Per-prediction feature attribution. For a linear classifier over a fixed
//! background distribution the exact attribution of feature `i` is
//! `coefficient_i * (x_i - background_mean_i)` in margin (log-odds) space,
//! with the base value being the margin at the background mean. The values
//! are additive: base value plus all contributions equals the margin of the
//! explained record.

use crate::artifacts::{
    ArtifactError, FeatureVector, FittedPreprocessor, LogisticClassifier, ReferenceDataset,
    Transform,
};
use serde::Serialize;

/// One feature's share of the decision. Positive favors approval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureContribution {
    pub feature: String,
    /// Transformed input value for the explained record.
    pub value: f64,
    pub contribution: f64,
}

/// Attribution for a single prediction, relative to the reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    /// Expected model margin over the background distribution.
    pub base_value: f64,
    /// Margin for the explained record; equals base plus contributions.
    pub prediction_value: f64,
    pub contributions: Vec<FeatureContribution>,
}

/// Background statistics fixed at startup: the mean transformed feature
/// vector over the reference dataset and the model margin at that mean.
#[derive(Debug, Clone)]
pub struct Baseline {
    feature_means: FeatureVector,
    base_value: f64,
}

impl Baseline {
    pub fn fit(
        preprocessor: &FittedPreprocessor,
        classifier: &LogisticClassifier,
        reference: &ReferenceDataset,
    ) -> Result<Self, ArtifactError> {
        if reference.is_empty() {
            return Err(ArtifactError::EmptyReference);
        }

        let names = preprocessor.feature_names();
        let mut sums = vec![0.0; names.len()];
        for record in reference.records() {
            let features = preprocessor.transform(record)?;
            for (sum, value) in sums.iter_mut().zip(features.values()) {
                *sum += value;
            }
        }

        let count = reference.len() as f64;
        let means: Vec<f64> = sums.into_iter().map(|sum| sum / count).collect();
        let feature_means = FeatureVector::new(names, means);
        let base_value = classifier.decision_margin(&feature_means)?;

        Ok(Self {
            feature_means,
            base_value,
        })
    }

    pub fn base_value(&self) -> f64 {
        self.base_value
    }
}

/// Explains one transformed record against the fitted baseline.
pub fn explain(
    classifier: &LogisticClassifier,
    baseline: &Baseline,
    features: &FeatureVector,
) -> Result<Explanation, ArtifactError> {
    classifier.align(features)?;
    classifier.align(&baseline.feature_means)?;

    let mut contributions = Vec::with_capacity(features.len());
    let mut total = 0.0;
    for (((name, value), mean), coefficient) in features
        .names()
        .iter()
        .zip(features.values())
        .zip(baseline.feature_means.values())
        .zip(classifier.coefficients())
    {
        let contribution = coefficient * (value - mean);
        total += contribution;
        contributions.push(FeatureContribution {
            feature: name.clone(),
            value: *value,
            contribution,
        });
    }

    Ok(Explanation {
        base_value: baseline.base_value,
        prediction_value: baseline.base_value + total,
        contributions,
    })
}
