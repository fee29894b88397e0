//! Integration tests for the recurrent trainer: shapes, convergence,
//! determinism and the properties that separate BPTT from per-step backprop.

use bptt::layers::{BpttAccumulator, RnnGradients, StepRecord};
use bptt::loader::sum_sequence;
use bptt::{BpttError, LossRecord, SimpleRnnBptt, TrainerConfig, Trajectory};
use ndarray::{Array2, Axis};

fn config(seq_length: usize, hidden_size: usize, seed: u64) -> TrainerConfig {
    TrainerConfig {
        input_size: 2,
        hidden_size,
        output_size: 1,
        seq_length,
        learning_rate: 0.05,
        seed,
    }
}

/// Same fold as `backward`, but every step starts with `dh_next = 0`,
/// i.e. plain per-step backprop without the recurrent path.
fn per_step_gradients(
    trainer: &SimpleRnnBptt,
    inputs: &Array2<f64>,
    targets: &Array2<f64>,
    trajectory: &Trajectory,
) -> RnnGradients {
    let rnn = trainer.params();
    let seq_length = trainer.config().seq_length;
    let acc = (0..seq_length).rev().fold(BpttAccumulator::new(rnn), |mut acc, t| {
        acc.dh_next.fill(0.0);
        rnn.backward_step(
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
    acc.grads.averaged(seq_length)
}

#[test]
fn test_forward_shape_invariants() {
    for &(seq_length, hidden) in &[(1, 1), (3, 4), (7, 2)] {
        let trainer = SimpleRnnBptt::new(config(seq_length, hidden, 3)).unwrap();
        let (inputs, _) = sum_sequence(seq_length, 2, 9).unwrap();
        let trajectory = trainer.forward(&inputs).unwrap();

        assert_eq!(trajectory.hidden_states.len(), seq_length + 1);
        assert_eq!(trajectory.outputs.len(), seq_length);
        assert_eq!(trajectory.preactivations.len(), seq_length);
        assert!(trajectory.hidden_states[0].iter().all(|&h| h == 0.0));
        assert!(trajectory.hidden_states.iter().all(|h| h.len() == hidden));
        assert!(trajectory.preactivations.iter().all(|z| z.len() == hidden));
        assert!(trajectory.outputs.iter().all(|y| y.len() == 1));
        // sigmoid 输出严格落在 (0, 1)
        assert!(trajectory.hidden_states[1..]
            .iter()
            .flat_map(|h| h.iter())
            .all(|&h| h > 0.0 && h < 1.0));
    }
}

#[test]
fn test_loss_decreases_on_sum_task() {
    let mut trainer = SimpleRnnBptt::new(config(5, 4, 42)).unwrap();
    let (inputs, targets) = sum_sequence(5, 2, 7).unwrap();

    let history = trainer.train(&inputs, &targets, 500, 100).unwrap();

    let epochs: Vec<usize> = history.iter().map(|r| r.epoch).collect();
    assert_eq!(epochs, vec![1, 100, 200, 300, 400, 500]);

    let first = history.first().unwrap().loss;
    let last = history.last().unwrap().loss;
    assert!(last < first, "loss did not decrease: {} -> {}", first, last);
}

#[test]
fn test_training_is_deterministic() {
    let (inputs, targets) = sum_sequence(5, 2, 7).unwrap();

    let mut a = SimpleRnnBptt::new(config(5, 4, 123)).unwrap();
    let mut b = SimpleRnnBptt::new(config(5, 4, 123)).unwrap();
    assert_eq!(a.params(), b.params());

    let ha = a.train(&inputs, &targets, 50, 10).unwrap();
    let hb = b.train(&inputs, &targets, 50, 10).unwrap();

    assert_eq!(ha, hb);
    assert_eq!(a.params(), b.params());

    let c = SimpleRnnBptt::new(config(5, 4, 124)).unwrap();
    assert_ne!(c.params().w_in, SimpleRnnBptt::new(config(5, 4, 123)).unwrap().params().w_in);
}

#[test]
fn test_zero_gradient_fixed_point() {
    let mut trainer = SimpleRnnBptt::new(config(4, 3, 5)).unwrap();
    let (inputs, _) = sum_sequence(4, 2, 1).unwrap();

    let trajectory = trainer.forward(&inputs).unwrap();
    let targets = trajectory.outputs_matrix();

    assert_eq!(trainer.compute_loss(&trajectory.outputs, &targets).unwrap(), 0.0);

    let grads = trainer.backward(&inputs, &targets, &trajectory).unwrap();
    assert!(grads.is_zero());

    let before = trainer.params().clone();
    trainer.update_weights(&grads).unwrap();
    assert_eq!(trainer.params(), &before);
}

#[test]
fn test_bptt_differs_from_per_step_backprop() {
    let trainer = SimpleRnnBptt::new(config(4, 3, 8)).unwrap();
    let (inputs, targets) = sum_sequence(4, 2, 2).unwrap();
    let trajectory = trainer.forward(&inputs).unwrap();

    let bptt = trainer.backward(&inputs, &targets, &trajectory).unwrap();
    let per_step = per_step_gradients(&trainer, &inputs, &targets, &trajectory);

    // 输出层梯度不经过递归路径，两者一致
    assert_eq!(bptt.w_out, per_step.w_out);
    assert_eq!(bptt.b_y, per_step.b_y);
    // 隐层梯度必须包含来自未来时间步的贡献
    assert_ne!(bptt.w_rec, per_step.w_rec);
    assert_ne!(bptt.w_in, per_step.w_in);
    assert_ne!(bptt.b_h, per_step.b_h);
}

#[test]
fn test_single_step_bptt_equals_per_step() {
    let trainer = SimpleRnnBptt::new(config(1, 3, 8)).unwrap();
    let (inputs, targets) = sum_sequence(1, 2, 2).unwrap();
    let trajectory = trainer.forward(&inputs).unwrap();

    let bptt = trainer.backward(&inputs, &targets, &trajectory).unwrap();
    let per_step = per_step_gradients(&trainer, &inputs, &targets, &trajectory);
    assert_eq!(bptt, per_step);
}

#[test]
fn test_update_applies_learning_rate() {
    let mut trainer = SimpleRnnBptt::new(config(3, 2, 4)).unwrap();
    let (inputs, targets) = sum_sequence(3, 2, 4).unwrap();
    let trajectory = trainer.forward(&inputs).unwrap();
    let grads = trainer.backward(&inputs, &targets, &trajectory).unwrap();

    let before = trainer.params().clone();
    trainer.update_weights(&grads).unwrap();
    let after = trainer.params();

    let expected = &before.w_rec - &(&grads.w_rec * 0.05);
    for (a, e) in after.w_rec.iter().zip(expected.iter()) {
        assert!((a - e).abs() < 1e-15);
    }
}

#[test]
fn test_shape_violations_are_reported() {
    let mut trainer = SimpleRnnBptt::new(config(5, 4, 1)).unwrap();
    let (inputs, targets) = sum_sequence(5, 2, 1).unwrap();

    let short = inputs.slice_axis(Axis(0), (0..4).into()).to_owned();
    assert_eq!(
        trainer.forward(&short).unwrap_err(),
        BpttError::SequenceLength {
            what: "input sequence",
            expected: 5,
            actual: 4
        }
    );

    let wide = Array2::<f64>::zeros((5, 3));
    assert_eq!(
        trainer.forward(&wide).unwrap_err(),
        BpttError::DimensionMismatch {
            what: "input vector",
            expected: 2,
            actual: 3
        }
    );

    let trajectory = trainer.forward(&inputs).unwrap();
    let bad_targets = Array2::<f64>::zeros((4, 1));
    assert!(matches!(
        trainer.compute_loss(&trajectory.outputs, &bad_targets),
        Err(BpttError::SequenceLength { .. })
    ));
    assert!(matches!(
        trainer.backward(&inputs, &bad_targets, &trajectory),
        Err(BpttError::SequenceLength { .. })
    ));

    let wrong_grads = RnnGradients::zeros(2, 5, 1);
    assert!(matches!(
        trainer.update_weights(&wrong_grads),
        Err(BpttError::ShapeMismatch { .. })
    ));

    assert!(matches!(
        trainer.train(&inputs, &targets, 10, 0),
        Err(BpttError::InvalidConfig(_))
    ));
    assert!(matches!(
        trainer.train(&short, &targets, 10, 1),
        Err(BpttError::SequenceLength { .. })
    ));
}

#[test]
fn test_zero_epochs_is_a_no_op() {
    let mut trainer = SimpleRnnBptt::new(config(5, 4, 1)).unwrap();
    let (inputs, targets) = sum_sequence(5, 2, 1).unwrap();
    let before = trainer.params().clone();

    let history = trainer.train(&inputs, &targets, 0, 10).unwrap();
    assert!(history.is_empty());
    assert_eq!(trainer.params(), &before);
}

#[test]
fn test_report_schedule_includes_first_epoch() {
    let mut trainer = SimpleRnnBptt::new(config(5, 4, 1)).unwrap();
    let (inputs, targets) = sum_sequence(5, 2, 1).unwrap();

    let history = trainer.train(&inputs, &targets, 7, 3).unwrap();
    let epochs: Vec<usize> = history.iter().map(|r: &LossRecord| r.epoch).collect();
    assert_eq!(epochs, vec![1, 3, 6]);
}

#[test]
fn test_config_serde_defaults() {
    let parsed: TrainerConfig =
        serde_json::from_str(r#"{"hidden_size": 8, "learning_rate": 0.25}"#).unwrap();
    assert_eq!(parsed.hidden_size, 8);
    assert_eq!(parsed.learning_rate, 0.25);
    assert_eq!(parsed.input_size, TrainerConfig::default().input_size);
    assert_eq!(parsed.seed, 42);

    let json = serde_json::to_string(&LossRecord { epoch: 3, loss: 0.5 }).unwrap();
    assert_eq!(json, r#"{"epoch":3,"loss":0.5}"#);
}
