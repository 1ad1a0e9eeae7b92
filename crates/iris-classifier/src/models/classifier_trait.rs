use ndarray::{Array1, Array2};

use crate::error::Result;

/// Contract shared by the multi-class models that can be packed into a
/// service. Labels are dense `usize` class ids starting at 0.
pub trait ClassifierModel {
    /// Fit the model on `x` (rows are samples) and `y` (one label per row).
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<()>;

    /// Predict one label per row of `x`, in row order.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>>;

    /// Number of feature columns the fitted model expects.
    fn nfeatures(&self) -> Option<usize>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
