// src/loader.rs
use crate::error::Result;
use crate::init::{seeded_rng, tensor_init, InitType};
use ndarray::{Array2, Axis};

/// 玩具回归序列: 输入 ~ N(0, 1)，形状 [seq_length, input_size]；
/// 目标是每个时间步输入分量之和，形状 [seq_length, 1]
pub fn sum_sequence(seq_length: usize, input_size: usize, seed: u64) -> Result<(Array2<f64>, Array2<f64>)> {
    let mut rng = seeded_rng(seed);
    let inputs: Array2<f64> = tensor_init((seq_length, input_size), InitType::ScaledNormal(1.0), &mut rng)?;
    let targets = inputs.sum_axis(Axis(1)).insert_axis(Axis(1));
    Ok((inputs, targets))
}
