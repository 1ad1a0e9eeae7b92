//! The packaging script: train, pack and save the Iris service.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use iris_classifier::{train, IrisClassifier, ModelConfig, MODEL_SLOT, SERVICE_NAME};

use crate::util::artifact_store;

/// Parameters for a packaging run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    pub service_name: String,
    /// Store root. `None` uses `$IRIS_SERVING_HOME` or the default location.
    pub artifact_home: Option<PathBuf>,
    pub model: ModelConfig,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            service_name: SERVICE_NAME.to_string(),
            artifact_home: None,
            model: ModelConfig::default(),
        }
    }
}

/// Load a packaging configuration from a JSON file.
pub fn load_package_config<P: AsRef<Path>>(path: P) -> Result<PackageConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: PackageConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

/// Train the classifier, pack it into a new service and save the bundle.
pub fn run_package(config: &PackageConfig) -> Result<PathBuf> {
    let trained = train(&config.model).context("Training failed")?;

    let mut service = IrisClassifier::with_name(config.service_name.clone());
    service.pack(MODEL_SLOT, trained.model)?;
    service.set_training_report(trained.report);

    let store = artifact_store(config.artifact_home.as_ref());
    let saved_path = service
        .save(&store)
        .with_context(|| format!("Failed to save bundle under {}", store.root().display()))?;
    Ok(saved_path)
}
