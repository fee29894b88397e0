// 1. 声明子文件夹为模块
pub mod rnn;
pub mod activation;

// 2. 重新导出 (Re-export)
// 这样用户只需要 use bptt::layers::*; 就能拿到 RNN 与激活函数

// RNN
pub use rnn::RNN;
pub use rnn::{BpttAccumulator, RnnGradients, RnnStep, StepRecord};

pub use activation::Sigmoid;
