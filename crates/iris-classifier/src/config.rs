use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the RBF kernel coefficient is chosen.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Gamma {
    /// `1 / (n_features * Var(X))`, variance taken over every value of X.
    Scale,
    /// `1 / n_features`
    Auto,
    Value(f64),
}

impl Gamma {
    /// Resolve the coefficient for a feature matrix with `n_features`
    /// columns and overall variance `variance`.
    pub fn resolve(&self, n_features: usize, variance: f64) -> f64 {
        match *self {
            Gamma::Scale => 1.0 / (n_features as f64 * variance),
            Gamma::Auto => 1.0 / n_features as f64,
            Gamma::Value(g) => g,
        }
    }
}

/// Supported kernels and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum KernelType {
    Linear,
    Rbf { gamma: Gamma },
    Poly { constant: f64, degree: f64 },
}

impl Default for KernelType {
    fn default() -> Self {
        KernelType::Rbf {
            gamma: Gamma::Scale,
        }
    }
}

impl FromStr for KernelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(KernelType::Linear),
            "rbf" | "gauss" => Ok(KernelType::default()),
            "poly" => Ok(KernelType::Poly {
                constant: 0.0,
                degree: 3.0,
            }),
            _ => Err(format!(
                "Unknown kernel type: {}. Valid options are: linear, rbf, poly",
                s
            )),
        }
    }
}

/// Hyper-parameters of the support-vector classifier.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Regularization weight, applied to both classes of each binary machine.
    pub c: f64,
    /// Stopping tolerance of the SMO solver.
    pub eps: f64,
    pub kernel: KernelType,
}

impl ModelConfig {
    pub fn new(c: f64, eps: f64, kernel: KernelType) -> Self {
        Self { c, eps, kernel }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            eps: 1e-3,
            kernel: KernelType::default(),
        }
    }
}
