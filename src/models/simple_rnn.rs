use crate::error::{BpttError, Result};
use crate::init::seeded_rng;
use crate::layers::{BpttAccumulator, RnnGradients, RnnStep, StepRecord, RNN};
use crate::loss::MSELoss;
use crate::optim::{Optimizer, SGD};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// 训练器配置，构造之后不可变
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    pub seq_length: usize,
    pub learning_rate: f64,
    pub seed: u64, // 参数初始化的随机种子
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            input_size: 2,
            hidden_size: 4,
            output_size: 1,
            seq_length: 5,
            learning_rate: 0.01,
            seed: 42,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("input_size", self.input_size),
            ("hidden_size", self.hidden_size),
            ("output_size", self.output_size),
            ("seq_length", self.seq_length),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(BpttError::InvalidConfig(format!("{} must be > 0", name)));
            }
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(BpttError::InvalidConfig(format!(
                "learning_rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// 一次 loss 观测
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LossRecord {
    pub epoch: usize,
    pub loss: f64,
}

/// 前向传播的轨迹，只在一个训练步内存活。
///
/// `hidden_states` 有 `seq_length + 1` 个元素，第 0 个是全零初始状态；
/// `outputs[t]` 与 `preactivations[t]` 对应 `hidden_states[t]` -> `hidden_states[t + 1]`。
#[derive(Clone, Debug, Default)]
pub struct Trajectory {
    pub hidden_states: Vec<Array1<f64>>,
    pub outputs: Vec<Array1<f64>>,
    pub preactivations: Vec<Array1<f64>>,
}

impl Trajectory {
    /// 把输出按行堆成 [seq_length, output_size]，与 targets 同形，便于检查和对比
    pub fn outputs_matrix(&self) -> Array2<f64> {
        let dim = self.outputs.first().map_or(0, |y| y.len());
        let mut m = Array2::zeros((self.outputs.len(), dim));
        for (mut row, y) in m.rows_mut().into_iter().zip(&self.outputs) {
            row.assign(y);
        }
        m
    }
}

/// 单隐层 RNN + BPTT，整段序列算一次梯度、更新一次参数 (batch learning)。
///
/// `forward` / `compute_loss` / `backward` 都不改参数；只有 `update_weights` 写参数。
pub struct SimpleRnnBptt {
    config: TrainerConfig,
    rnn: RNN,
    optimizer: SGD,
}

impl SimpleRnnBptt {
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = seeded_rng(config.seed);
        let rnn = RNN::new(config.input_size, config.hidden_size, config.output_size, &mut rng)?;
        let optimizer = SGD::new(config.learning_rate)?;

        debug!(
            input_size = config.input_size,
            hidden_size = config.hidden_size,
            output_size = config.output_size,
            seq_length = config.seq_length,
            learning_rate = config.learning_rate,
            seed = config.seed,
            "recurrent trainer initialized"
        );

        Ok(Self { config, rnn, optimizer })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn params(&self) -> &RNN {
        &self.rnn
    }

    fn check_inputs(&self, inputs: &Array2<f64>) -> Result<()> {
        BpttError::check_len("input sequence", self.config.seq_length, inputs.nrows())?;
        BpttError::check_dim("input vector", self.config.input_size, inputs.ncols())
    }

    fn check_targets(&self, targets: &Array2<f64>) -> Result<()> {
        BpttError::check_len("target sequence", self.config.seq_length, targets.nrows())?;
        BpttError::check_dim("target vector", self.config.output_size, targets.ncols())
    }

    fn check_trajectory(&self, trajectory: &Trajectory) -> Result<()> {
        let seq_length = self.config.seq_length;
        let hidden = [self.config.hidden_size];
        let output = [self.config.output_size];

        BpttError::check_len("hidden_states", seq_length + 1, trajectory.hidden_states.len())?;
        BpttError::check_len("outputs", seq_length, trajectory.outputs.len())?;
        BpttError::check_len("preactivations", seq_length, trajectory.preactivations.len())?;

        for h in &trajectory.hidden_states {
            BpttError::check_shape("hidden state", &hidden, h.shape())?;
        }
        for y in &trajectory.outputs {
            BpttError::check_shape("output", &output, y.shape())?;
        }
        for z in &trajectory.preactivations {
            BpttError::check_shape("pre-activation", &hidden, z.shape())?;
        }
        Ok(())
    }

    /// 前向传播：inputs 是 [seq_length, input_size]，每行一个时间步
    pub fn forward(&self, inputs: &Array2<f64>) -> Result<Trajectory> {
        self.check_inputs(inputs)?;

        let seq_length = self.config.seq_length;
        let mut hidden_states = Vec::with_capacity(seq_length + 1);
        let mut outputs = Vec::with_capacity(seq_length);
        let mut preactivations = Vec::with_capacity(seq_length);

        hidden_states.push(Array1::zeros(self.config.hidden_size));

        for (t, x_t) in inputs.rows().into_iter().enumerate() {
            // hidden_states[t] 是 h_{t-1}
            let RnnStep { z, h, y } = self.rnn.forward_step(x_t, &hidden_states[t]);
            hidden_states.push(h);
            outputs.push(y);
            preactivations.push(z);
        }

        Ok(Trajectory {
            hidden_states,
            outputs,
            preactivations,
        })
    }

    pub fn compute_loss(&self, predicted: &[Array1<f64>], targets: &Array2<f64>) -> Result<f64> {
        BpttError::check_dim("target vector", self.config.output_size, targets.ncols())?;
        MSELoss::apply(predicted, targets.view())
    }

    /// BPTT: 从最后一个时间步往回折叠。
    /// t 时刻的 dh 依赖 t+1 时刻已经算好的 dh_next，所以只能倒序。
    pub fn backward(
        &self,
        inputs: &Array2<f64>,
        targets: &Array2<f64>,
        trajectory: &Trajectory,
    ) -> Result<RnnGradients> {
        self.check_inputs(inputs)?;
        self.check_targets(targets)?;
        self.check_trajectory(trajectory)?;

        let seq_length = self.config.seq_length;
        let acc = (0..seq_length)
            .rev()
            .fold(BpttAccumulator::new(&self.rnn), |acc, t| {
                self.rnn.backward_step(
                    acc,
                    StepRecord {
                        x_t: inputs.row(t),
                        y_true: targets.row(t),
                        y_pred: &trajectory.outputs[t],
                        h_t: &trajectory.hidden_states[t + 1],
                        h_prev: &trajectory.hidden_states[t],
                        z_t: &trajectory.preactivations[t],
                    },
                )
            });

        // 固定长度序列：除以 seq_length 得到时间平均
        Ok(acc.grads.averaged(seq_length))
    }

    pub fn update_weights(&mut self, grads: &RnnGradients) -> Result<()> {
        self.optimizer.step(&mut self.rnn, grads)
    }

    /// 每个 epoch 依次 forward -> loss -> backward -> update。
    /// 第 1 个 epoch 和每个 `report_interval` 的倍数处记录并打印 loss (更新前的 loss)。
    pub fn train(
        &mut self,
        inputs: &Array2<f64>,
        targets: &Array2<f64>,
        epoch_count: usize,
        report_interval: usize,
    ) -> Result<Vec<LossRecord>> {
        if report_interval == 0 {
            return Err(BpttError::InvalidConfig("report_interval must be > 0".into()));
        }
        self.check_inputs(inputs)?;
        self.check_targets(targets)?;

        let mut history = Vec::new();
        for epoch in 1..=epoch_count {
            let trajectory = self.forward(inputs)?;
            let loss = self.compute_loss(&trajectory.outputs, targets)?;
            let grads = self.backward(inputs, targets, &trajectory)?;
            self.update_weights(&grads)?;

            if epoch == 1 || epoch % report_interval == 0 {
                info!(epoch, loss, "Epoch {}: Loss = {:.6}", epoch, loss);
                history.push(LossRecord { epoch, loss });
            }
        }

        Ok(history)
    }
}
