use crate::error::{BpttError, Result};
use crate::layers::rnn::{RnnGradients, RNN};
use ndarray::{Array, Dimension, Zip};

pub trait Optimizer {
    /// 用一组梯度原地更新参数。形状不匹配时在写入任何参数之前失败。
    fn step(&mut self, rnn: &mut RNN, grads: &RnnGradients) -> Result<()>;
}

/// 朴素梯度下降，无动量
#[derive(Clone, Debug)]
pub struct SGD {
    lr: f64,
}

impl SGD {
    pub fn new(lr: f64) -> Result<Self> {
        if !(lr.is_finite() && lr > 0.0) {
            return Err(BpttError::InvalidConfig(format!(
                "learning_rate must be finite and > 0, got {}",
                lr
            )));
        }
        Ok(SGD { lr })
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }
}

// w -= lr * grad
fn descend<D: Dimension>(param: &mut Array<f64, D>, grad: &Array<f64, D>, lr: f64) {
    Zip::from(param).and(grad).for_each(|w, g| {
        *w -= lr * *g;
    });
}

impl Optimizer for SGD {
    fn step(&mut self, rnn: &mut RNN, grads: &RnnGradients) -> Result<()> {
        grads.check_shapes(rnn)?;

        let lr = self.lr;
        descend(&mut rnn.w_in, &grads.w_in, lr);
        descend(&mut rnn.w_rec, &grads.w_rec, lr);
        descend(&mut rnn.w_out, &grads.w_out, lr);
        descend(&mut rnn.b_h, &grads.b_h, lr);
        descend(&mut rnn.b_y, &grads.b_y, lr);
        Ok(())
    }
}
