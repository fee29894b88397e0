use mimalloc::MiMalloc;

use bptt::loader::sum_sequence;
use bptt::models::{SimpleRnnBptt, TrainerConfig};

use tracing::info;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// 玩具问题: 学习每个时间步输入分量之和。
// 数据用独立的 seed: 若与参数共用 42，两个 StdRng 产生同一串数，W_in 会正好是输入的 0.1 倍
const DATA_SEED: u64 = 7;
const EPOCHS: usize = 500;
const REPORT_EVERY: usize = 100;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = TrainerConfig {
        input_size: 2,
        hidden_size: 4,
        output_size: 1,
        seq_length: 5,
        learning_rate: 0.05,
        seed: 42,
    };

    let (inputs, targets) = sum_sequence(config.seq_length, config.input_size, DATA_SEED)?;

    let mut rnn = SimpleRnnBptt::new(config)?;
    let history = rnn.train(&inputs, &targets, EPOCHS, REPORT_EVERY)?;

    if let (Some(first), Some(last)) = (history.first(), history.last()) {
        info!(
            "loss {:.6} (epoch {}) -> {:.6} (epoch {})",
            first.loss, first.epoch, last.loss, last.epoch
        );
    }

    let trajectory = rnn.forward(&inputs)?;
    for (t, (y, target)) in trajectory.outputs.iter().zip(targets.rows()).enumerate() {
        info!("t={}: predicted {:.4}, target {:.4}", t, y[0], target[0]);
    }

    Ok(())
}
