// src/main.rs
// Fits a one-feature logistic regression on synthetic data and tracks training and
// validation loss, accuracy and early stopping with the metric engine.

use ferrox_loss::metrics::{Accuracy, EarlyStopping, Mode};
use ferrox_loss::{Loss, LossError, Result, Tensor, TensorList, TrainingMetric};
use rand::rng;
use rand_distr::{Distribution, Normal};

const TRUE_WEIGHT: f64 = 2.0;
const TRUE_BIAS: f64 = -0.5;
const BATCH_SIZE: usize = 32;
const NUM_BATCHES: usize = 8;
const NUM_EPOCHS: usize = 50;
const LEARNING_RATE: f64 = 0.5;

type Batch = (Tensor<f64>, Tensor<f64>);

fn make_batches(num_batches: usize) -> Result<Vec<Batch>> {
    let mut rng = rng();
    let feature = Normal::new(0.0, 1.0)
        .map_err(|e| LossError::InvalidConfig(format!("feature distribution: {e}")))?;
    let noise = Normal::new(0.0, 0.3)
        .map_err(|e| LossError::InvalidConfig(format!("noise distribution: {e}")))?;

    (0..num_batches)
        .map(|_| {
            let xs: Vec<f64> = (0..BATCH_SIZE).map(|_| feature.sample(&mut rng)).collect();
            let ys: Vec<f64> = xs
                .iter()
                .map(|x| {
                    let score = TRUE_WEIGHT * x + TRUE_BIAS + noise.sample(&mut rng);
                    if score > 0.0 { 1.0 } else { 0.0 }
                })
                .collect();
            Ok((
                Tensor::from_vec(xs, &[BATCH_SIZE, 1])?,
                Tensor::from_vec(ys, &[BATCH_SIZE, 1])?,
            ))
        })
        .collect()
}

fn logits(x: &Tensor<f64>, weight: f64, bias: f64) -> Tensor<f64> {
    x.mul_scalar(weight).add_scalar(bias)
}

fn run() -> Result<()> {
    let train = make_batches(NUM_BATCHES)?;
    let validation = make_batches(2)?;

    let mut train_loss = Loss::<f64>::sigmoid_binary_cross_entropy();
    let mut val_loss = train_loss.duplicate_as("val_loss");
    // Logits, so the decision boundary sits at zero.
    let mut val_accuracy = Accuracy::new(-1, 0.0).with_name("val_accuracy");
    let mut early_stopping = EarlyStopping::new()
        .patience(5)
        .min_delta(1e-4)
        .mode(Mode::Min);

    let (mut weight, mut bias) = (0.0, 0.0);

    for epoch in 0..NUM_EPOCHS {
        train_loss.reset();
        for (x, y) in &train {
            let z = logits(x, weight, bias);
            let labels = TensorList::from(y.clone());
            let predictions = TensorList::from(z.clone());

            train_loss.calculate_loss(&labels, &predictions)?;
            train_loss.update(&labels, &predictions)?;

            // d(BCE)/dz = sigmoid(z) - y
            let residual = z.sigmoid().sub(y)?;
            let n = x.size() as f64;
            weight -= LEARNING_RATE * residual.mul(x)?.sum_all() / n;
            bias -= LEARNING_RATE * residual.sum_all() / n;
        }

        val_loss.reset();
        TrainingMetric::<f64>::reset(&mut val_accuracy);
        for (x, y) in &validation {
            let labels = TensorList::from(y.clone());
            let predictions = TensorList::from(logits(x, weight, bias));

            val_loss.calculate_loss(&labels, &predictions)?;
            val_loss.update(&labels, &predictions)?;
            val_accuracy.update(&labels, &predictions)?;
        }

        println!(
            "Epoch {:3}: {} | {} | {} | w = {:.4}, b = {:.4}",
            epoch + 1,
            train_loss,
            val_loss,
            val_accuracy,
            weight,
            bias
        );

        early_stopping.observe(val_loss.value());
        if early_stopping.should_stop() {
            println!("[INFO] Early stopping after epoch {}", epoch + 1);
            break;
        }
    }

    if let Some(best) = early_stopping.best() {
        println!("[INFO] Best validation loss: {:.6}", best);
    }
    println!(
        "[INFO] Learned w = {:.4}, b = {:.4} (generated with w = {}, b = {})",
        weight, bias, TRUE_WEIGHT, TRUE_BIAS
    );
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        println!("[ERROR] {}", e);
        std::process::exit(1);
    }
}
