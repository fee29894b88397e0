// src/lib.rs

pub mod error;
pub mod init;
pub mod layers;
pub mod loader;
pub mod loss;
pub mod models;
pub mod optim;

pub use error::{BpttError, Result};
pub use models::{LossRecord, SimpleRnnBptt, TrainerConfig, Trajectory};
