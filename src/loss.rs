use crate::error::{BpttError, Result};
use ndarray::{Array1, ArrayBase, ArrayView2, Data, Ix1, Zip};

// --- MSE Loss ---
// 每个时间步取 0.5 * Σ(y_pred - y_true)^2，再对时间步求平均
pub struct MSELoss;
impl MSELoss {
    pub fn apply(predicted: &[Array1<f64>], target: ArrayView2<'_, f64>) -> Result<f64> {
        BpttError::check_len("target sequence", predicted.len(), target.nrows())?;
        if predicted.is_empty() {
            return Err(BpttError::SequenceLength {
                what: "loss over empty sequence",
                expected: 1,
                actual: 0,
            });
        }

        let mut total = 0.0;
        for (y_pred, y_true) in predicted.iter().zip(target.rows()) {
            BpttError::check_dim("target vector", y_pred.len(), y_true.len())?;
            let sum_sq = Zip::from(y_pred)
                .and(&y_true)
                .fold(0.0, |acc, &o, &t| acc + (o - t).powi(2));
            total += 0.5 * sum_sq;
        }

        Ok(total / predicted.len() as f64)
    }

    /// dL/dy = y_pred - y_true (0.5 的系数正好抵消平方的 2)
    pub fn gradient<S>(y_pred: &Array1<f64>, y_true: &ArrayBase<S, Ix1>) -> Array1<f64>
    where
        S: Data<Elem = f64>,
    {
        y_pred - y_true
    }
}
