//! One-vs-rest support-vector classifier built on `linfa-svm`.
//!
//! One binary machine is fitted per class label (`target == label`) and a
//! sample is assigned to the label whose machine gives the highest
//! probability. Fitting the machines runs on the rayon pool; results are
//! collected in label order so repeated fits are identical.
use std::fmt;

use linfa::dataset::Pr;
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_svm::{Svm, SvmError, SvmParams};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{KernelType, ModelConfig};
use crate::error::{Error, Result};
use crate::models::classifier_trait::ClassifierModel;

#[derive(Serialize, Deserialize)]
struct ClassMachine {
    label: usize,
    svm: Svm<f64, Pr>,
}

#[derive(Serialize, Deserialize)]
pub struct SvcClassifier {
    params: ModelConfig,
    /// Kernel coefficient resolved at fit time (RBF only).
    gamma: Option<f64>,
    nfeatures: Option<usize>,
    machines: Vec<ClassMachine>,
}

impl SvcClassifier {
    pub fn new(params: ModelConfig) -> Self {
        SvcClassifier {
            params,
            gamma: None,
            nfeatures: None,
            machines: Vec::new(),
        }
    }

    pub fn params(&self) -> &ModelConfig {
        &self.params
    }

    pub fn gamma(&self) -> Option<f64> {
        self.gamma
    }

    /// Class labels known to the fitted model, ascending.
    pub fn labels(&self) -> Vec<usize> {
        self.machines.iter().map(|m| m.label).collect()
    }

    pub fn is_fitted(&self) -> bool {
        !self.machines.is_empty()
    }

    fn build_params(&self, variance: f64, nfeatures: usize) -> Result<(SvmParams<f64, Pr>, Option<f64>)> {
        let params = Svm::<f64, Pr>::params()
            .eps(self.params.eps)
            .pos_neg_weights(self.params.c, self.params.c);

        Ok(match &self.params.kernel {
            KernelType::Linear => (params.linear_kernel(), None),
            KernelType::Rbf { gamma } => {
                let g = gamma.resolve(nfeatures, variance);
                if !g.is_finite() || g <= 0.0 {
                    return Err(Error::InvalidDataset(format!(
                        "kernel coefficient resolved to {} (feature variance {})",
                        g, variance
                    )));
                }
                // linfa's gaussian kernel is exp(-|x - y|^2 / eps)
                (params.gaussian_kernel(1.0 / g), Some(g))
            }
            KernelType::Poly { constant, degree } => {
                (params.polynomial_kernel(*constant, *degree), None)
            }
        })
    }
}

/// Population variance over every value of `x`.
fn overall_variance(x: &Array2<f64>) -> f64 {
    let mean = x.mean().unwrap_or(0.0);
    x.mapv(|v| (v - mean) * (v - mean)).mean().unwrap_or(0.0)
}

impl ClassifierModel for SvcClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<()> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(Error::InvalidDataset("empty feature matrix".to_string()));
        }
        if x.nrows() != y.len() {
            return Err(Error::InvalidDataset(format!(
                "{} records but {} targets",
                x.nrows(),
                y.len()
            )));
        }

        let mut labels: Vec<usize> = y.to_vec();
        labels.sort_unstable();
        labels.dedup();
        if labels.len() < 2 {
            return Err(Error::InvalidDataset(format!(
                "need at least two classes, found {}",
                labels.len()
            )));
        }

        let (params, gamma) = self.build_params(overall_variance(x), x.ncols())?;
        log::debug!(
            "Fitting {} one-vs-rest machines on {} samples (gamma {:?})",
            labels.len(),
            x.nrows(),
            gamma
        );

        let machines = labels
            .par_iter()
            .map(|&label| -> Result<ClassMachine> {
                let dataset = DatasetBase::new(x.to_owned(), y.mapv(|t| t == label));
                let svm: Svm<f64, Pr> =
                    <SvmParams<f64, Pr> as Fit<_, _, SvmError>>::fit(&params, &dataset)?;
                Ok(ClassMachine { label, svm })
            })
            .collect::<Result<Vec<_>>>()?;

        self.machines = machines;
        self.gamma = gamma;
        self.nfeatures = Some(x.ncols());
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let nfeatures = self.nfeatures.ok_or(Error::NotFitted)?;
        if self.machines.is_empty() {
            return Err(Error::NotFitted);
        }
        if x.nrows() == 0 {
            return Ok(Array1::from_vec(Vec::new()));
        }
        if x.ncols() != nfeatures {
            return Err(Error::FeatureCount {
                expected: nfeatures,
                found: x.ncols(),
            });
        }

        let scores: Vec<Array1<Pr>> = self
            .machines
            .iter()
            .map(|m| {
                let p: Array1<Pr> = m.svm.predict(x);
                p
            })
            .collect();

        let mut out = Vec::with_capacity(x.nrows());
        for row in 0..x.nrows() {
            let mut best = 0;
            let mut best_score = f32::NEG_INFINITY;
            for (i, s) in scores.iter().enumerate() {
                let v = *s[row];
                // strict comparison keeps the lowest label on ties
                if v > best_score {
                    best = i;
                    best_score = v;
                }
            }
            out.push(self.machines[best].label);
        }
        Ok(Array1::from_vec(out))
    }

    fn nfeatures(&self) -> Option<usize> {
        self.nfeatures
    }

    fn name(&self) -> &str {
        "svc"
    }
}

impl fmt::Debug for SvcClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SvcClassifier")
            .field("params", &self.params)
            .field("gamma", &self.gamma)
            .field("nfeatures", &self.nfeatures)
            .field("labels", &self.labels())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> (Array2<f64>, Array1<usize>) {
        let x = Array2::from_shape_vec(
            (12, 2),
            vec![
                0.0, 0.0, 0.2, 0.1, 0.1, 0.3, 0.3, 0.0, // class 0
                5.0, 5.0, 5.2, 4.9, 4.8, 5.1, 5.1, 5.3, // class 1
                0.0, 5.0, 0.3, 5.2, 0.1, 4.8, 0.2, 5.1, // class 2
            ],
        )
        .expect("failed to create feature matrix");
        let y = Array1::from_vec(vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]);
        (x, y)
    }

    #[test]
    fn fits_and_predicts_separable_blobs() {
        let (x, y) = blobs();
        let mut model = SvcClassifier::new(ModelConfig::default());
        model.fit(&x, &y).unwrap();

        assert_eq!(model.labels(), vec![0, 1, 2]);
        assert_eq!(model.nfeatures(), Some(2));
        assert!(model.gamma().unwrap() > 0.0);

        let pred = model.predict(&x).unwrap();
        assert_eq!(pred.len(), x.nrows());
        assert_eq!(pred, y);
    }

    #[test]
    fn predict_before_fit_errors() {
        let model = SvcClassifier::new(ModelConfig::default());
        let x = Array2::<f64>::zeros((1, 2));
        assert!(matches!(model.predict(&x), Err(Error::NotFitted)));
    }

    #[test]
    fn single_class_is_rejected() {
        let x = Array2::<f64>::ones((3, 2));
        let y = Array1::from_vec(vec![1, 1, 1]);
        let mut model = SvcClassifier::new(ModelConfig::default());
        assert!(matches!(model.fit(&x, &y), Err(Error::InvalidDataset(_))));
    }

    #[test]
    fn wrong_width_is_rejected() {
        let (x, y) = blobs();
        let mut model = SvcClassifier::new(ModelConfig::default());
        model.fit(&x, &y).unwrap();
        let wide = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            model.predict(&wide),
            Err(Error::FeatureCount {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn serde_round_trip_keeps_predictions() {
        let (x, y) = blobs();
        let mut model = SvcClassifier::new(ModelConfig::default());
        model.fit(&x, &y).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: SvcClassifier = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.predict(&x).unwrap(), model.predict(&x).unwrap());
    }
}
