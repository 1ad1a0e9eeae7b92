//! The prediction service wrapper.
//!
//! `IrisClassifier` declares one artifact slot (`model`) and one inference
//! API (`predict`). A trained model is packed into the slot, after which the
//! service can predict tabular batches or be saved as a bundle.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::bundle::ArtifactStore;
use crate::error::{Error, Result};
use crate::models::{ClassifierModel, SvcClassifier};
use crate::table::Table;
use crate::train::TrainingReport;

pub const SERVICE_NAME: &str = "IrisClassifier";
pub const MODEL_SLOT: &str = "model";
pub const PREDICT_API: &str = "predict";

/// A named model slot declared by a service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactSpec {
    pub name: String,
    /// Serialization format of the slot, e.g. `svc-json`.
    pub kind: String,
}

/// A named inference function exposed by a service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSpec {
    pub name: String,
    pub input: String,
    pub output: String,
    pub doc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSpec {
    pub name: String,
    pub artifacts: Vec<ArtifactSpec>,
    pub apis: Vec<ApiSpec>,
}

impl ServiceSpec {
    pub fn iris(name: impl Into<String>) -> Self {
        ServiceSpec {
            name: name.into(),
            artifacts: vec![ArtifactSpec {
                name: MODEL_SLOT.to_string(),
                kind: "svc-json".to_string(),
            }],
            apis: vec![ApiSpec {
                name: PREDICT_API.to_string(),
                input: "tabular".to_string(),
                output: "json".to_string(),
                doc: "Predict one class label per feature row".to_string(),
            }],
        }
    }

    pub fn has_artifact(&self, slot: &str) -> bool {
        self.artifacts.iter().any(|a| a.name == slot)
    }
}

#[derive(Debug)]
pub struct IrisClassifier {
    spec: ServiceSpec,
    model: Option<SvcClassifier>,
    report: Option<TrainingReport>,
}

impl Default for IrisClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IrisClassifier {
    pub fn new() -> Self {
        Self::with_name(SERVICE_NAME)
    }

    /// Same declaration as `new`, saved under a different service name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self::from_spec(ServiceSpec::iris(name))
    }

    pub(crate) fn from_spec(spec: ServiceSpec) -> Self {
        IrisClassifier {
            spec,
            model: None,
            report: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &ServiceSpec {
        &self.spec
    }

    /// Bind a fitted model to a declared artifact slot.
    pub fn pack(&mut self, slot: &str, model: SvcClassifier) -> Result<()> {
        if !self.spec.has_artifact(slot) {
            return Err(Error::UnknownArtifact(slot.to_string()));
        }
        if !model.is_fitted() {
            return Err(Error::NotFitted);
        }
        log::debug!("Packed {:?} into '{}.{}'", model, self.spec.name, slot);
        self.model = Some(model);
        Ok(())
    }

    pub fn set_training_report(&mut self, report: TrainingReport) {
        self.report = Some(report);
    }

    pub fn training_report(&self) -> Option<&TrainingReport> {
        self.report.as_ref()
    }

    pub fn is_packed(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Result<&SvcClassifier> {
        self.model
            .as_ref()
            .ok_or_else(|| Error::ArtifactNotPacked(MODEL_SLOT.to_string()))
    }

    /// Predict one label per table row, preserving row order.
    pub fn predict(&self, table: &Table) -> Result<Vec<usize>> {
        let model = self.model()?;
        if table.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(n) = model.nfeatures() {
            table.check_width(n)?;
        }
        Ok(model.predict(table.as_array())?.to_vec())
    }

    pub fn predict_rows(&self, rows: Vec<Vec<f64>>) -> Result<Vec<usize>> {
        self.predict(&Table::from_rows(rows)?)
    }

    /// Save the packed service as a new bundle and return its directory.
    pub fn save(&self, store: &ArtifactStore) -> Result<PathBuf> {
        store.save(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;

    #[test]
    fn declares_model_slot_and_predict_api() {
        let svc = IrisClassifier::new();
        assert_eq!(svc.name(), SERVICE_NAME);
        assert!(svc.spec().has_artifact(MODEL_SLOT));
        assert_eq!(svc.spec().apis[0].name, PREDICT_API);
    }

    #[test]
    fn predict_requires_packed_model() {
        let svc = IrisClassifier::new();
        let err = svc.predict_rows(vec![vec![5.1, 3.5, 1.4, 0.2]]).unwrap_err();
        assert!(matches!(err, Error::ArtifactNotPacked(_)));
    }

    #[test]
    fn pack_rejects_unknown_slot_and_unfitted_model() {
        let mut svc = IrisClassifier::new();
        let unfitted = SvcClassifier::new(ModelConfig::default());
        assert!(matches!(
            svc.pack("weights", SvcClassifier::new(ModelConfig::default())),
            Err(Error::UnknownArtifact(_))
        ));
        assert!(matches!(svc.pack(MODEL_SLOT, unfitted), Err(Error::NotFitted)));
        assert!(!svc.is_packed());
    }
}
