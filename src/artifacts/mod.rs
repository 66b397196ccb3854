//! Pre-fitted model artifacts and the reference dataset. Everything here is
//! loaded once at process start and treated as immutable afterwards; there
//! is no retraining or update path.

mod classifier;
mod preprocessor;
mod reference;

pub use classifier::{EligibilityLabel, LogisticClassifier};
pub use preprocessor::{FeatureVector, FittedPreprocessor};
pub use reference::ReferenceDataset;

use crate::assessment::applicant::ApplicantRecord;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File names expected inside the artifact directory.
pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const REFERENCE_FILE: &str = "reference.csv";

/// Applies the fitted feature transformation to one applicant record.
pub trait Transform {
    fn transform(&self, record: &ApplicantRecord) -> Result<FeatureVector, ArtifactError>;
}

/// Applies the fitted classifier to one transformed feature vector.
pub trait Predict {
    fn predict(&self, features: &FeatureVector) -> Result<EligibilityLabel, ArtifactError>;
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact at {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {kind} artifact")]
    Malformed {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{kind} artifact is inconsistent: {detail}")]
    Inconsistent { kind: &'static str, detail: String },
    #[error("malformed reference dataset")]
    ReferenceCsv(#[from] csv::Error),
    #[error("reference dataset row {row}: {detail}")]
    ReferenceRow { row: usize, detail: String },
    #[error("reference dataset contains no rows")]
    EmptyReference,
    #[error("schema mismatch: {detail}")]
    SchemaMismatch { detail: String },
}

/// The three read-only inputs the pipeline consumes: transformation and
/// classifier artifacts plus the reference dataset used as the attribution
/// background.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub preprocessor: FittedPreprocessor,
    pub classifier: LogisticClassifier,
    pub reference: ReferenceDataset,
}

impl ArtifactBundle {
    /// Loads all artifacts from `dir`. Any missing or unreadable file is
    /// fatal; a process that cannot load its artifacts serves no requests.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let preprocessor = FittedPreprocessor::from_reader(open(dir.join(PREPROCESSOR_FILE))?)?;
        let classifier = LogisticClassifier::from_reader(open(dir.join(CLASSIFIER_FILE))?)?;
        let reference = ReferenceDataset::from_reader(open(dir.join(REFERENCE_FILE))?)?;

        Ok(Self {
            preprocessor,
            classifier,
            reference,
        })
    }

    pub fn from_parts(
        preprocessor: FittedPreprocessor,
        classifier: LogisticClassifier,
        reference: ReferenceDataset,
    ) -> Self {
        Self {
            preprocessor,
            classifier,
            reference,
        }
    }
}

fn open(path: PathBuf) -> Result<File, ArtifactError> {
    File::open(&path).map_err(|source| ArtifactError::Read { path, source })
}
