//! The bundled Iris dataset.
//!
//! 150 labeled records with four numeric features and three classes, loaded
//! from `linfa-datasets`. The table is read-only once loaded.
use ndarray::{Array1, Array2};

use crate::error::{Error, Result};

pub const FEATURE_NAMES: [&str; 4] = [
    "sepal_length",
    "sepal_width",
    "petal_length",
    "petal_width",
];

pub const TARGET_NAMES: [&str; 3] = ["setosa", "versicolor", "virginica"];

#[derive(Debug, Clone)]
pub struct IrisDataset {
    pub records: Array2<f64>,
    pub targets: Array1<usize>,
}

impl IrisDataset {
    /// Load the bundled dataset.
    pub fn load() -> Self {
        let ds = linfa_datasets::iris();
        IrisDataset {
            records: ds.records().to_owned(),
            targets: ds.targets().to_owned(),
        }
    }

    /// Build a dataset from arbitrary records, checking that the shapes agree.
    pub fn from_parts(records: Array2<f64>, targets: Array1<usize>) -> Result<Self> {
        if records.nrows() != targets.len() {
            return Err(Error::InvalidDataset(format!(
                "{} records but {} targets",
                records.nrows(),
                targets.len()
            )));
        }
        Ok(IrisDataset { records, targets })
    }

    pub fn nsamples(&self) -> usize {
        self.records.nrows()
    }

    pub fn nfeatures(&self) -> usize {
        self.records.ncols()
    }

    /// Number of records per class label, indexed by label.
    pub fn class_counts(&self) -> Vec<usize> {
        let n_classes = self.targets.iter().max().map_or(0, |&m| m + 1);
        let mut counts = vec![0usize; n_classes];
        for &t in self.targets.iter() {
            counts[t] += 1;
        }
        counts
    }

    pub fn log_summary(&self) {
        log::info!(
            "Dataset: {} records, {} features, class counts {:?}",
            self.nsamples(),
            self.nfeatures(),
            self.class_counts()
        );
    }
}

/// Human-readable name for a class label, if it is one of the Iris species.
pub fn target_name(label: usize) -> Option<&'static str> {
    TARGET_NAMES.get(label).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_dataset_shape() {
        let ds = IrisDataset::load();
        assert_eq!(ds.nsamples(), 150);
        assert_eq!(ds.nfeatures(), FEATURE_NAMES.len());
        assert_eq!(ds.class_counts(), vec![50, 50, 50]);
    }

    #[test]
    fn first_record_is_setosa() {
        let ds = IrisDataset::load();
        let first: Vec<f64> = ds.records.row(0).to_vec();
        assert_eq!(first, vec![5.1, 3.5, 1.4, 0.2]);
        assert_eq!(ds.targets[0], 0);
        assert_eq!(target_name(ds.targets[0]), Some("setosa"));
    }

    #[test]
    fn from_parts_rejects_length_mismatch() {
        let records = Array2::<f64>::zeros((3, 2));
        let targets = Array1::from_vec(vec![0usize, 1]);
        assert!(matches!(
            IrisDataset::from_parts(records, targets),
            Err(Error::InvalidDataset(_))
        ));
    }
}
