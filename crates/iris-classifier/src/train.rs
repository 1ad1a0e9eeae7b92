//! Training stage: fit the classifier on the bundled dataset.
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::dataset::IrisDataset;
use crate::error::Result;
use crate::models::{ClassifierModel, SvcClassifier};
use crate::stats::{accuracy, confusion_matrix};

/// Summary of a training run, kept alongside the model in saved bundles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingReport {
    pub nsamples: usize,
    pub nfeatures: usize,
    pub class_counts: Vec<usize>,
    /// Resolved RBF coefficient, if the kernel has one.
    pub gamma: Option<f64>,
    pub train_accuracy: f64,
    /// Rows are true labels, columns predicted labels.
    pub confusion_matrix: Vec<Vec<usize>>,
}

#[derive(Debug)]
pub struct TrainedModel {
    pub model: SvcClassifier,
    pub report: TrainingReport,
}

/// Fit a classifier on the bundled Iris dataset.
pub fn train(config: &ModelConfig) -> Result<TrainedModel> {
    let dataset = IrisDataset::load();
    train_on(&dataset, config)
}

/// Fit a classifier on `dataset` and score it on the same records.
pub fn train_on(dataset: &IrisDataset, config: &ModelConfig) -> Result<TrainedModel> {
    dataset.log_summary();

    let mut model = SvcClassifier::new(config.clone());
    model.fit(&dataset.records, &dataset.targets)?;

    let pred = model.predict(&dataset.records)?;
    let class_counts = dataset.class_counts();
    let cm = confusion_matrix(&pred, &dataset.targets, class_counts.len());

    let report = TrainingReport {
        nsamples: dataset.nsamples(),
        nfeatures: dataset.nfeatures(),
        class_counts,
        gamma: model.gamma(),
        train_accuracy: accuracy(&pred, &dataset.targets),
        confusion_matrix: cm.outer_iter().map(|row| row.to_vec()).collect(),
    };

    log::info!(
        "Trained {} on {} samples: training accuracy {:.4}",
        model.name(),
        report.nsamples,
        report.train_accuracy
    );

    Ok(TrainedModel { model, report })
}
