use crate::error::{BpttError, Result};
use crate::init::{tensor_init, InitType, INIT_SCALE};
use crate::layers::activation::Sigmoid;
use crate::loss::MSELoss;
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Axis, Data, Ix1};
use ndarray_rand::rand::rngs::StdRng;

/// 单隐层全连接 RNN 的参数。
/// 形状在构造后不再改变，之后的写入都是原地更新。
#[derive(Clone, Debug, PartialEq)]
pub struct RNN {
    pub w_in: Array2<f64>,  // [hidden, input]
    pub w_rec: Array2<f64>, // [hidden, hidden]
    pub w_out: Array2<f64>, // [output, hidden]
    pub b_h: Array1<f64>,   // [hidden]
    pub b_y: Array1<f64>,   // [output]
    activation: Sigmoid,
}

/// 一个时间步的前向结果
#[derive(Clone, Debug)]
pub struct RnnStep {
    pub z: Array1<f64>, // pre-activation
    pub h: Array1<f64>,
    pub y: Array1<f64>,
}

/// backward_step 需要的某一时刻 t 的记录
pub struct StepRecord<'a> {
    pub x_t: ArrayView1<'a, f64>,
    pub y_true: ArrayView1<'a, f64>,
    pub y_pred: &'a Array1<f64>,
    pub h_t: &'a Array1<f64>,
    pub h_prev: &'a Array1<f64>,
    pub z_t: &'a Array1<f64>,
}

/// 五个梯度，形状与 RNN 参数一一对应
#[derive(Clone, Debug, PartialEq)]
pub struct RnnGradients {
    pub w_in: Array2<f64>,
    pub w_rec: Array2<f64>,
    pub w_out: Array2<f64>,
    pub b_h: Array1<f64>,
    pub b_y: Array1<f64>,
}

/// 反向时间折叠的累加器：累计梯度 + 从 t+1 传回来的 dh_next
#[derive(Clone, Debug)]
pub struct BpttAccumulator {
    pub grads: RnnGradients,
    pub dh_next: Array1<f64>,
}

impl RNN {
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        rng: &mut StdRng,
    ) -> Result<Self> {
        // 抽取顺序固定: W_in, W_rec, W_out
        let w_in = tensor_init((hidden_size, input_size), InitType::ScaledNormal(INIT_SCALE), rng)?;
        let w_rec = tensor_init((hidden_size, hidden_size), InitType::ScaledNormal(INIT_SCALE), rng)?;
        let w_out = tensor_init((output_size, hidden_size), InitType::ScaledNormal(INIT_SCALE), rng)?;
        let b_h = tensor_init(hidden_size, InitType::Zeros, rng)?;
        let b_y = tensor_init(output_size, InitType::Zeros, rng)?;

        Ok(RNN {
            w_in,
            w_rec,
            w_out,
            b_h,
            b_y,
            activation: Sigmoid::new(),
        })
    }

    pub fn input_size(&self) -> usize {
        self.w_in.ncols()
    }

    pub fn hidden_size(&self) -> usize {
        self.w_rec.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.w_out.nrows()
    }

    // z_t = W_in * x_t + W_rec * h_{t-1} + b_h
    // h_t = sigmoid(z_t)
    // y_t = W_out * h_t + b_y
    pub fn forward_step(&self, x_t: ArrayView1<'_, f64>, h_prev: &Array1<f64>) -> RnnStep {
        let z = self.w_in.dot(&x_t) + self.w_rec.dot(h_prev) + &self.b_h;
        let h = self.activation.forward(&z);
        let y = self.w_out.dot(&h) + &self.b_y;
        RnnStep { z, h, y }
    }

    /// BPTT 的一步，在时刻 t 上把梯度累加进 `acc`，并算出给 t-1 用的 dh_next。
    /// 调用方必须按 t 从大到小的顺序折叠。
    pub fn backward_step(&self, acc: BpttAccumulator, step: StepRecord<'_>) -> BpttAccumulator {
        let BpttAccumulator { mut grads, dh_next } = acc;

        // 输出层
        let dy = MSELoss::gradient(step.y_pred, &step.y_true);
        grads.w_out += &outer(&dy, step.h_t);
        grads.b_y += &dy;

        // 隐层: 直接来自输出的梯度 + 来自 t+1 的梯度
        let dh = self.w_out.t().dot(&dy) + &dh_next;
        let dz = dh * &self.activation.derivative(step.z_t);

        grads.w_in += &outer(&dz, &step.x_t);
        grads.w_rec += &outer(&dz, step.h_prev);
        grads.b_h += &dz;

        let dh_next = self.w_rec.t().dot(&dz);
        BpttAccumulator { grads, dh_next }
    }
}

// a * b^T
fn outer<S1, S2>(a: &ArrayBase<S1, Ix1>, b: &ArrayBase<S2, Ix1>) -> Array2<f64>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
{
    let a2 = a.view().insert_axis(Axis(1));
    let b2 = b.view().insert_axis(Axis(0));
    a2.dot(&b2)
}

impl RnnGradients {
    pub fn zeros(input_size: usize, hidden_size: usize, output_size: usize) -> Self {
        RnnGradients {
            w_in: Array2::zeros((hidden_size, input_size)),
            w_rec: Array2::zeros((hidden_size, hidden_size)),
            w_out: Array2::zeros((output_size, hidden_size)),
            b_h: Array1::zeros(hidden_size),
            b_y: Array1::zeros(output_size),
        }
    }

    pub fn zeros_like(rnn: &RNN) -> Self {
        Self::zeros(rnn.input_size(), rnn.hidden_size(), rnn.output_size())
    }

    /// 时间求和 -> 时间平均
    pub fn averaged(mut self, seq_length: usize) -> Self {
        let n = seq_length as f64;
        self.w_in /= n;
        self.w_rec /= n;
        self.w_out /= n;
        self.b_h /= n;
        self.b_y /= n;
        self
    }

    /// 检查用: 五个梯度是否全为 0 (预测与目标完全一致时成立)
    pub fn is_zero(&self) -> bool {
        self.w_in.iter().all(|&g| g == 0.0)
            && self.w_rec.iter().all(|&g| g == 0.0)
            && self.w_out.iter().all(|&g| g == 0.0)
            && self.b_h.iter().all(|&g| g == 0.0)
            && self.b_y.iter().all(|&g| g == 0.0)
    }

    /// 梯度形状必须与参数完全一致，不做广播
    pub fn check_shapes(&self, rnn: &RNN) -> Result<()> {
        BpttError::check_shape("dW_in", rnn.w_in.shape(), self.w_in.shape())?;
        BpttError::check_shape("dW_rec", rnn.w_rec.shape(), self.w_rec.shape())?;
        BpttError::check_shape("dW_out", rnn.w_out.shape(), self.w_out.shape())?;
        BpttError::check_shape("db_h", rnn.b_h.shape(), self.b_h.shape())?;
        BpttError::check_shape("db_y", rnn.b_y.shape(), self.b_y.shape())?;
        Ok(())
    }
}

impl BpttAccumulator {
    pub fn new(rnn: &RNN) -> Self {
        BpttAccumulator {
            grads: RnnGradients::zeros_like(rnn),
            dh_next: Array1::zeros(rnn.hidden_size()),
        }
    }
}
