use ndarray::{Array, ArrayBase, Data, Dimension, Zip};

/// 数值稳定的 sigmoid: exp 只作用于非正数，不会上溢
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// sigmoid'(z) = s * (1 - s)
#[inline]
pub fn sigmoid_derivative(x: f64) -> f64 {
    let s = sigmoid(x);
    s * (1.0 - s)
}

// --- Sigmoid ---
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sigmoid;
impl Sigmoid {
    pub fn new() -> Self {
        Sigmoid
    }

    // Forward: 1 / (1 + exp(-z))，逐元素
    pub fn forward<S, D>(&self, z: &ArrayBase<S, D>) -> Array<f64, D>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        Zip::from(z).map_collect(|&x| sigmoid(x))
    }

    // Backward 需要的是 pre-activation 处的导数，不是从输出反推
    pub fn derivative<S, D>(&self, z: &ArrayBase<S, D>) -> Array<f64, D>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        Zip::from(z).map_collect(|&x| sigmoid_derivative(x))
    }
}

impl Default for Sigmoid {
    fn default() -> Self {
        Self::new()
    }
}
