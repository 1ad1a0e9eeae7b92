use std::path::PathBuf;

/// Errors raised while training, packing, saving, loading or predicting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SVM solver failed: {0}")]
    Svm(#[from] linfa_svm::SvmError),

    #[error("Invalid training data: {0}")]
    InvalidDataset(String),

    #[error("Row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Non-finite value at row {row}, column {col}")]
    NonFinite { row: usize, col: usize },

    #[error("Model has not been fitted")]
    NotFitted,

    #[error("Input has {found} features, model expects {expected}")]
    FeatureCount { expected: usize, found: usize },

    #[error("Artifact '{0}' has not been packed")]
    ArtifactNotPacked(String),

    #[error("Service declares no artifact named '{0}'")]
    UnknownArtifact(String),

    #[error("Bundle not found: {0}")]
    BundleNotFound(String),

    #[error("Bundle already exists: {}", .0.display())]
    BundleExists(PathBuf),

    #[error("Invalid bundle tag '{0}', expected Name:version or Name:latest")]
    InvalidTag(String),

    #[error("Bundle holds service '{found}', expected '{expected}'")]
    ServiceMismatch { expected: String, found: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
