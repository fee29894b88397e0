//! 训练过程中的错误类型

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BpttError>;

/// 形状/契约违规。数值计算要么形状合法，要么直接失败，没有可重试的错误。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BpttError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// 序列的时间步数不对
    #[error("{what}: expected {expected} time steps, got {actual}")]
    SequenceLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// 向量长度不对
    #[error("{what}: expected dimension {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// 矩阵/向量形状不对 (梯度、轨迹元素)
    #[error("{what}: expected shape {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

impl BpttError {
    pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(BpttError::SequenceLength { what, expected, actual })
        }
    }

    pub(crate) fn check_dim(what: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(BpttError::DimensionMismatch { what, expected, actual })
        }
    }

    pub(crate) fn check_shape(what: &'static str, expected: &[usize], actual: &[usize]) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(BpttError::ShapeMismatch {
                what,
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            })
        }
    }
}
