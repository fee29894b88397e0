pub mod simple_rnn;

pub use simple_rnn::{LossRecord, SimpleRnnBptt, TrainerConfig, Trajectory};
