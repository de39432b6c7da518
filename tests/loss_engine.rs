// tests/loss_engine.rs
// End-to-end use of the public API: epoch loops over several metrics, duplication
// for validation and early stopping on the running value.

use approx::assert_abs_diff_eq;
use ferrox_loss::metrics::{Accuracy, EarlyStopping, Mode};
use ferrox_loss::nn::losses::{SoftmaxCrossEntropyLoss, exclude_batch_axis};
use ferrox_loss::nn::{
    Activation, ParameterBlock, RecurrentCell, RecurrentCellBuilder, RecurrentMode,
};
use ferrox_loss::{Loss, LossError, LossKind, Tensor, TensorList, TrainingMetric};

fn tensor(data: Vec<f64>, shape: &[usize]) -> Tensor<f64> {
    Tensor::from_vec(data, shape).unwrap()
}

#[test]
fn test_epoch_loop_with_train_and_validation_losses() {
    let mut train = Loss::l2();
    let mut validation = train.duplicate_as("val_loss");

    let batches = [
        (tensor(vec![1.0, 2.0], &[2]), tensor(vec![0.0, 0.0], &[2])),
        (tensor(vec![2.0, 2.0], &[2]), tensor(vec![0.0, 0.0], &[2])),
    ];

    for _epoch in 0..2 {
        train.reset();
        for (y, p) in &batches {
            let labels = TensorList::from(y.clone());
            let predictions = TensorList::from(p.clone());
            train.calculate_loss(&labels, &predictions).unwrap();
            train.update(&labels, &predictions).unwrap();
        }
        // L2 per sample: 0.5, 2.0, 2.0, 2.0
        assert_abs_diff_eq!(train.value(), 6.5 / 4.0, epsilon = 1e-12);
    }

    assert!(validation.value().is_nan());
    let labels = TensorList::from(tensor(vec![3.0], &[1]));
    let predictions = TensorList::from(tensor(vec![1.0], &[1]));
    validation.calculate_loss(&labels, &predictions).unwrap();
    validation.update(&labels, &predictions).unwrap();
    assert_abs_diff_eq!(validation.value(), 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(train.value(), 6.5 / 4.0, epsilon = 1e-12);
}

#[test]
fn test_softmax_loss_and_accuracy_share_batches() {
    let kind = LossKind::SoftmaxCrossEntropy(SoftmaxCrossEntropyLoss::default());
    let mut loss = Loss::with_name("ce", kind).unwrap();
    let mut accuracy = Accuracy::default();

    let labels = TensorList::from(tensor(vec![0.0, 2.0, 1.0], &[3]));
    let predictions = TensorList::from(tensor(
        vec![5.0, 0.0, 0.0, 0.0, 0.0, 5.0, 5.0, 0.0, 0.0],
        &[3, 3],
    ));

    let batch = loss.calculate_loss(&labels, &predictions).unwrap();
    assert_eq!(batch.shape(), &[3]);
    loss.update(&labels, &predictions).unwrap();
    accuracy.update(&labels, &predictions).unwrap();

    assert_abs_diff_eq!(TrainingMetric::<f64>::value(&accuracy), 2.0 / 3.0, epsilon = 1e-12);
    // Two confident hits and one confident miss.
    let hit = (1.0 + 2.0 * (-5.0f64).exp()).ln();
    let miss = 5.0 + hit;
    assert_abs_diff_eq!(loss.value(), (2.0 * hit + miss) / 3.0, epsilon = 1e-9);
}

#[test]
fn test_column_predictions_keep_one_loss_per_sample() {
    let labels = TensorList::from(tensor(vec![1.0, 2.0], &[2]));
    let predictions = TensorList::from(tensor(vec![0.0, 0.0], &[2, 1]));

    let mut l1 = Loss::l1();
    let batch = l1.calculate_loss(&labels, &predictions).unwrap();
    assert_eq!(batch.shape(), &[2]);
    assert_eq!(batch.to_vec(), vec![1.0, 2.0]);
    l1.update(&labels, &predictions).unwrap();
    assert_eq!(l1.value(), 1.5);

    let mut hinge = Loss::hinge();
    let signs = TensorList::from(tensor(vec![1.0, -1.0, 1.0], &[3, 1]));
    let scores = TensorList::from(tensor(vec![2.0, -2.0, 2.0], &[3]));
    let batch = hinge.calculate_loss(&signs, &scores).unwrap();
    assert_eq!(batch.to_vec(), vec![0.0, 0.0, 0.0]);

    let mut accuracy = Accuracy::default();
    let probabilities = TensorList::from(tensor(vec![0.9, 0.2, 0.4], &[3, 1]));
    let targets = TensorList::from(tensor(vec![1.0, 0.0, 1.0], &[3]));
    accuracy.update(&targets, &probabilities).unwrap();
    assert_abs_diff_eq!(TrainingMetric::<f64>::value(&accuracy), 2.0 / 3.0, epsilon = 1e-12);
}

#[test]
fn test_out_of_range_sparse_label_is_reported() {
    let mut loss = Loss::<f64>::softmax_cross_entropy();
    let labels = TensorList::from(tensor(vec![3.0], &[1]));
    let predictions = TensorList::from(tensor(vec![0.0, 0.0, 0.0], &[1, 3]));

    assert!(matches!(
        loss.calculate_loss(&labels, &predictions),
        Err(LossError::InvalidLabel(_))
    ));
    assert!(matches!(
        loss.update(&labels, &predictions),
        Err(LossError::InvalidState(_))
    ));
}

#[test]
fn test_early_stopping_follows_validation_loss() {
    let mut validation = Loss::l1();
    let mut stopper = EarlyStopping::new().patience(2).mode(Mode::Min);

    // Nothing accumulated yet: NaN is ignored.
    assert!(!stopper.observe(validation.value()));
    assert_eq!(stopper.best(), None);

    let mut stopped_at = None;
    for (epoch, error) in [3.0, 1.0, 2.0, 2.0, 0.5].into_iter().enumerate() {
        validation.reset();
        let labels = TensorList::from(tensor(vec![error], &[1]));
        let predictions = TensorList::from(tensor(vec![0.0], &[1]));
        validation.calculate_loss(&labels, &predictions).unwrap();
        validation.update(&labels, &predictions).unwrap();

        stopper.observe(validation.value());
        if stopper.should_stop() {
            stopped_at = Some(epoch);
            break;
        }
    }

    assert_eq!(stopped_at, Some(3));
    assert_eq!(stopper.best(), Some(1.0));
}

#[test]
fn test_exclude_batch_axis_through_public_api() {
    assert_eq!(exclude_batch_axis(3, 1).unwrap(), vec![0, 2]);
    assert!(matches!(
        exclude_batch_axis(2, 2),
        Err(LossError::ShapeMismatch(_))
    ));
}

#[test]
fn test_recurrent_cell_from_builder() {
    let config = RecurrentCellBuilder::new()
        .set_mode(RecurrentMode::Rnn)
        .set_activation(Activation::Tanh)
        .set_state_size(6)
        .set_num_stacked_layers(1)
        .build()
        .unwrap();
    let mut cell = RecurrentCell::<f32>::new(config);

    let outputs = cell.initialize(&[vec![4, 10, 3]]).unwrap();
    assert_eq!(outputs, vec![vec![4, 10, 6]]);
    // i2h 6x3, h2h 6x6, two biases of 6
    assert_eq!(cell.num_parameters(), 18 + 36 + 12);
}
