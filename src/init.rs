use crate::error::{BpttError, Result};
use ndarray::{Array, Dimension, ShapeBuilder};
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;

/// 权重初始化的尺度: N(0, 1) * 0.1
pub const INIT_SCALE: f64 = 0.1;

pub enum InitType {
    ScaledNormal(f64), // N(0, 1) * scale
    Zeros,             // For Bias
}

/// 同一个 seed 总是得到同一串随机数，训练因此可复现
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn tensor_init<D, Sh>(shape: Sh, init_type: InitType, rng: &mut StdRng) -> Result<Array<f64, D>>
where
    D: Dimension,
    Sh: ShapeBuilder<Dim = D>,
{
    let data = match init_type {
        InitType::Zeros => Array::zeros(shape),

        InitType::ScaledNormal(scale) => {
            // rand_distr 0.4 的 Normal::new 只拒绝非有限值，负数要自己挡
            if !(scale.is_finite() && scale >= 0.0) {
                return Err(BpttError::InvalidConfig(format!(
                    "init scale must be finite and >= 0, got {}",
                    scale
                )));
            }
            let normal = Normal::new(0.0, scale)
                .map_err(|e| BpttError::InvalidConfig(format!("init scale {}: {}", scale, e)))?;
            Array::random_using(shape, normal, rng)
        }
    };

    Ok(data)
}
