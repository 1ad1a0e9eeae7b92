//! iris-classifier: train, pack and save an Iris support-vector classifier.
//!
//! The crate covers three stages. `train` fits a one-vs-rest SVC
//! (`linfa-svm`) on the bundled dataset. `service` declares the
//! `IrisClassifier` wrapper with a `model` slot and a `predict` API.
//! `bundle` saves packed services to a local artifact store and loads them
//! back for serving.
pub mod bundle;
pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod service;
pub mod stats;
pub mod table;
pub mod train;

pub use bundle::{ArtifactStore, BundleMetadata, BundleTag};
pub use config::{Gamma, KernelType, ModelConfig};
pub use error::{Error, Result};
pub use service::{IrisClassifier, MODEL_SLOT, SERVICE_NAME};
pub use table::Table;
pub use train::{train, TrainedModel, TrainingReport};
