pub mod rnn;

pub use rnn::{BpttAccumulator, RnnGradients, RnnStep, StepRecord, RNN};
