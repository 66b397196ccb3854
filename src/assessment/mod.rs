//! The predict-and-explain pipeline: collect one applicant record, run the
//! fitted transformation and classifier, attribute the decision against the
//! reference background, and render a report.

pub mod applicant;
pub mod explain;
pub mod report;

pub use explain::{Baseline, Explanation, FeatureContribution};
pub use report::{AssessmentReport, ChartBar, ContributionDirection, WaterfallChart};

use crate::artifacts::{
    ArtifactBundle, ArtifactError, EligibilityLabel, FittedPreprocessor, LogisticClassifier,
    Predict, Transform,
};
use applicant::{ApplicantForm, ApplicantRecord};
use tracing::debug;

/// Everything produced for one submission. Built fresh per request and
/// handed straight to the rendering surface; nothing is retained.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub record: ApplicantRecord,
    pub label: EligibilityLabel,
    pub explanation: Explanation,
    pub report: AssessmentReport,
    pub chart: WaterfallChart,
}

/// Immutable pipeline context constructed once at startup from the loaded
/// artifacts. Shared read-only across requests; no locking needed.
#[derive(Debug)]
pub struct AssessmentEngine {
    preprocessor: FittedPreprocessor,
    classifier: LogisticClassifier,
    baseline: Baseline,
    reference_rows: usize,
}

impl AssessmentEngine {
    /// Fits the attribution baseline and consumes the bundle. Fails when the
    /// artifacts disagree with each other (feature layout mismatch) or the
    /// reference dataset cannot serve as a background.
    pub fn from_bundle(bundle: ArtifactBundle) -> Result<Self, ArtifactError> {
        let ArtifactBundle {
            preprocessor,
            classifier,
            reference,
        } = bundle;

        let baseline = Baseline::fit(&preprocessor, &classifier, &reference)?;
        let reference_rows = reference.len();

        Ok(Self {
            preprocessor,
            classifier,
            baseline,
            reference_rows,
        })
    }

    /// Runs the full pipeline for one form submission.
    pub fn assess(&self, form: ApplicantForm) -> Result<Assessment, ArtifactError> {
        let record = form.into_record();
        let features = self.preprocessor.transform(&record)?;
        let label = self.classifier.predict(&features)?;
        let explanation = explain::explain(&self.classifier, &self.baseline, &features)?;
        let report = report::generate(&record, label, &explanation, self.reference_rows);
        let chart = WaterfallChart::from_explanation(&explanation);

        debug!(
            label = label.label(),
            features = features.len(),
            "assessed loan application"
        );

        Ok(Assessment {
            record,
            label,
            explanation,
            report,
            chart,
        })
    }

    /// Number of features in the transformed representation.
    pub fn feature_count(&self) -> usize {
        self.preprocessor.feature_count()
    }

    /// Size of the reference dataset backing the attribution.
    pub fn reference_rows(&self) -> usize {
        self.reference_rows
    }
}
