use ndarray::{Array1, Array2};

/// Fraction of positions where `pred` equals `truth`.
///
/// Returns 0 for empty input. Both arrays must have the same length.
pub fn accuracy(pred: &Array1<usize>, truth: &Array1<usize>) -> f64 {
    assert_eq!(pred.len(), truth.len(), "prediction and truth lengths differ");
    if pred.is_empty() {
        return 0.0;
    }
    let correct = pred
        .iter()
        .zip(truth.iter())
        .filter(|(p, t)| p == t)
        .count();
    correct as f64 / pred.len() as f64
}

/// Confusion matrix with true labels as rows and predicted labels as columns.
///
/// Labels at or above `n_classes` are ignored.
pub fn confusion_matrix(
    pred: &Array1<usize>,
    truth: &Array1<usize>,
    n_classes: usize,
) -> Array2<usize> {
    assert_eq!(pred.len(), truth.len(), "prediction and truth lengths differ");
    let mut cm = Array2::<usize>::zeros((n_classes, n_classes));
    for (&p, &t) in pred.iter().zip(truth.iter()) {
        if p < n_classes && t < n_classes {
            cm[(t, p)] += 1;
        }
    }
    cm
}
