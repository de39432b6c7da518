// src/nn/recurrent.rs
// Recurrent cell configuration and its parameter block.
// The cell only declares and sizes its parameters; the forward computation lives
// outside this crate.

use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::initializers::Initializer;
use crate::nn::block::ParameterBlock;
use crate::nn::parameter::Parameter;

const UNSET: i64 = -1;

/// Nonlinearity of a plain RNN cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Tanh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecurrentMode {
    #[default]
    Rnn,
    Lstm,
    Gru,
}

impl RecurrentMode {
    /// Number of gate blocks stacked in each weight matrix.
    pub fn num_gates(&self) -> usize {
        match self {
            RecurrentMode::Rnn => 1,
            RecurrentMode::Lstm => 4,
            RecurrentMode::Gru => 3,
        }
    }
}

/// Validated, immutable recurrent cell configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrentCellConfig {
    pub mode: RecurrentMode,
    pub state_size: usize,
    pub num_stacked_layers: usize,
    pub drop_rate: f32,
    /// `(min, max)` when LSTM state clipping is enabled.
    pub lstm_state_clip: Option<(f64, f64)>,
    pub use_sequence_length: bool,
    pub use_bidirectional: bool,
    pub state_outputs: bool,
    pub activation: Option<Activation>,
}

impl RecurrentCellConfig {
    pub fn builder() -> RecurrentCellBuilder {
        RecurrentCellBuilder::new()
    }

    pub fn num_directions(&self) -> usize {
        if self.use_bidirectional { 2 } else { 1 }
    }
}

/// Fluent builder for [`RecurrentCellConfig`].
///
/// `state_size` and `num_stacked_layers` are required; everything else has a default.
///
/// ```
/// use ferrox_loss::nn::recurrent::{RecurrentCellBuilder, RecurrentMode};
///
/// let config = RecurrentCellBuilder::new()
///     .set_mode(RecurrentMode::Lstm)
///     .set_state_size(64)
///     .set_num_stacked_layers(2)
///     .opt_drop_rate(0.1)
///     .build()
///     .unwrap();
/// assert_eq!(config.state_size, 64);
///
/// assert!(RecurrentCellBuilder::new().set_state_size(64).build().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct RecurrentCellBuilder {
    mode: RecurrentMode,
    drop_rate: f32,
    state_size: i64,
    num_stacked_layers: i64,
    lstm_state_clip_min: f64,
    lstm_state_clip_max: f64,
    clip_lstm_state: bool,
    use_sequence_length: bool,
    use_bidirectional: bool,
    state_outputs: bool,
    activation: Option<Activation>,
}

impl RecurrentCellBuilder {
    pub fn new() -> Self {
        Self {
            mode: RecurrentMode::default(),
            drop_rate: 0.0,
            state_size: UNSET,
            num_stacked_layers: UNSET,
            lstm_state_clip_min: 0.0,
            lstm_state_clip_max: 0.0,
            clip_lstm_state: false,
            use_sequence_length: false,
            use_bidirectional: false,
            state_outputs: false,
            activation: None,
        }
    }

    pub fn set_mode(mut self, mode: RecurrentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Dropout applied to the outputs of every layer except the last.
    pub fn opt_drop_rate(mut self, drop_rate: f32) -> Self {
        self.drop_rate = drop_rate;
        self
    }

    /// Enables clipping of LSTM states to `[min, max]`.
    pub fn opt_lstm_state_clip(mut self, min: f64, max: f64) -> Self {
        self.lstm_state_clip_min = min;
        self.lstm_state_clip_max = max;
        self.clip_lstm_state = true;
        self
    }

    /// **Required.** Size of the hidden state of each layer.
    pub fn set_state_size(mut self, state_size: usize) -> Self {
        self.state_size = state_size as i64;
        self
    }

    /// **Required.** Number of stacked layers.
    pub fn set_num_stacked_layers(mut self, num_stacked_layers: usize) -> Self {
        self.num_stacked_layers = num_stacked_layers as i64;
        self
    }

    pub fn set_activation(mut self, activation: Activation) -> Self {
        self.activation = Some(activation);
        self
    }

    /// Expects an extra `[batch]` input holding each sequence's valid length.
    pub fn set_sequence_length(mut self, use_sequence_length: bool) -> Self {
        self.use_sequence_length = use_sequence_length;
        self
    }

    pub fn opt_bidirectional(mut self, use_bidirectional: bool) -> Self {
        self.use_bidirectional = use_bidirectional;
        self
    }

    /// Also emit the final states as outputs.
    pub fn opt_state_outputs(mut self, state_outputs: bool) -> Self {
        self.state_outputs = state_outputs;
        self
    }

    pub fn build(self) -> Result<RecurrentCellConfig> {
        if self.state_size == UNSET {
            return Err(LossError::InvalidConfig(
                "state size is required, call set_state_size".to_string(),
            ));
        }
        if self.num_stacked_layers == UNSET {
            return Err(LossError::InvalidConfig(
                "number of stacked layers is required, call set_num_stacked_layers".to_string(),
            ));
        }
        if self.state_size <= 0 || self.num_stacked_layers <= 0 {
            return Err(LossError::InvalidConfig(format!(
                "state size ({}) and stacked layers ({}) must be positive",
                self.state_size, self.num_stacked_layers
            )));
        }
        if !(0.0..1.0).contains(&self.drop_rate) {
            return Err(LossError::InvalidConfig(format!(
                "drop rate must lie in [0, 1), got {}",
                self.drop_rate
            )));
        }
        if self.clip_lstm_state && !(self.lstm_state_clip_min <= self.lstm_state_clip_max) {
            return Err(LossError::InvalidConfig(format!(
                "LSTM state clip range [{}, {}] is empty",
                self.lstm_state_clip_min, self.lstm_state_clip_max
            )));
        }
        if self.mode == RecurrentMode::Rnn && self.activation.is_none() {
            return Err(LossError::InvalidConfig(
                "a plain RNN cell needs an activation, call set_activation".to_string(),
            ));
        }

        Ok(RecurrentCellConfig {
            mode: self.mode,
            state_size: self.state_size as usize,
            num_stacked_layers: self.num_stacked_layers as usize,
            drop_rate: self.drop_rate,
            lstm_state_clip: self
                .clip_lstm_state
                .then_some((self.lstm_state_clip_min, self.lstm_state_clip_max)),
            use_sequence_length: self.use_sequence_length,
            use_bidirectional: self.use_bidirectional,
            state_outputs: self.state_outputs,
            activation: self.activation,
        })
    }
}

impl Default for RecurrentCellBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Recurrent cell whose weights are sized lazily from a `[batch, seq, features]` input.
///
/// For every layer and direction it owns `i2h_weight [gates * state, in]`,
/// `h2h_weight [gates * state, state]` and the two matching biases.
#[derive(Debug, Clone)]
pub struct RecurrentCell<T>
where
    T: Float,
{
    config: RecurrentCellConfig,
    parameters: Vec<Parameter<T>>,
    input_features: Option<usize>,
    initialized: bool,
}

impl<T> RecurrentCell<T>
where
    T: Float,
{
    pub fn new(config: RecurrentCellConfig) -> Self {
        let mut parameters = Vec::new();
        for layer in 0..config.num_stacked_layers {
            for direction in ["l", "r"].iter().take(config.num_directions()) {
                let prefix = format!("{direction}{layer}");
                parameters.push(Parameter::new(
                    format!("{prefix}_i2h_weight"),
                    Initializer::default(),
                ));
                parameters.push(Parameter::new(
                    format!("{prefix}_h2h_weight"),
                    Initializer::default(),
                ));
                parameters.push(Parameter::new(format!("{prefix}_i2h_bias"), Initializer::Zeros));
                parameters.push(Parameter::new(format!("{prefix}_h2h_bias"), Initializer::Zeros));
            }
        }
        Self {
            config,
            parameters,
            input_features: None,
            initialized: false,
        }
    }

    pub fn config(&self) -> &RecurrentCellConfig {
        &self.config
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter<T>> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    fn check_input(&self, input_shapes: &[Vec<usize>]) -> Result<()> {
        let Some(input) = input_shapes.first() else {
            return Err(LossError::ShapeMismatch(
                "recurrent cell expects a [batch, seq, features] input".to_string(),
            ));
        };
        if input.len() != 3 {
            return Err(LossError::ShapeMismatch(format!(
                "recurrent cell expects a [batch, seq, features] input, got {:?}",
                input
            )));
        }
        if self.config.use_sequence_length {
            match input_shapes.get(1) {
                Some(lengths) if lengths.as_slice() == [input[0]] => {}
                other => {
                    return Err(LossError::ShapeMismatch(format!(
                        "sequence lengths must have shape [{}], got {:?}",
                        input[0], other
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<T> ParameterBlock<T> for RecurrentCell<T>
where
    T: Float,
{
    fn before_initialize(&mut self, input_shapes: &[Vec<usize>]) -> Result<()> {
        self.check_input(input_shapes)?;
        self.input_features = Some(input_shapes[0][2]);
        Ok(())
    }

    fn parameter_shapes(&self) -> Vec<Vec<usize>> {
        let state = self.config.state_size;
        let gated = self.config.mode.num_gates() * state;
        let directions = self.config.num_directions();
        let input_features = self.input_features.unwrap_or(0);

        let mut shapes = Vec::with_capacity(self.parameters.len());
        for layer in 0..self.config.num_stacked_layers {
            let layer_input = if layer == 0 {
                input_features
            } else {
                state * directions
            };
            for _ in 0..directions {
                shapes.push(vec![gated, layer_input]);
                shapes.push(vec![gated, state]);
                shapes.push(vec![gated]);
                shapes.push(vec![gated]);
            }
        }
        shapes
    }

    fn direct_parameters(&self) -> Vec<&Parameter<T>> {
        self.parameters.iter().collect()
    }

    fn direct_parameters_mut(&mut self) -> Vec<&mut Parameter<T>> {
        self.parameters.iter_mut().collect()
    }

    fn output_shapes(&self, input_shapes: &[Vec<usize>]) -> Result<Vec<Vec<usize>>> {
        self.check_input(input_shapes)?;
        let (batch, seq) = (input_shapes[0][0], input_shapes[0][1]);
        let directions = self.config.num_directions();
        let state = self.config.state_size;

        let mut shapes = vec![vec![batch, seq, state * directions]];
        if self.config.state_outputs {
            let state_shape = vec![self.config.num_stacked_layers * directions, batch, state];
            shapes.push(state_shape.clone());
            if self.config.mode == RecurrentMode::Lstm {
                shapes.push(state_shape);
            }
        }
        Ok(shapes)
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn set_initialized(&mut self) {
        self.initialized = true;
    }
}

#[cfg(test)]
mod recurrent_tests {
    use super::*;

    fn lstm_config() -> RecurrentCellConfig {
        RecurrentCellBuilder::new()
            .set_mode(RecurrentMode::Lstm)
            .set_state_size(8)
            .set_num_stacked_layers(2)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_state_size_and_layers() {
        let missing_state = RecurrentCellBuilder::new()
            .set_activation(Activation::Tanh)
            .set_num_stacked_layers(1)
            .build();
        assert!(matches!(missing_state, Err(LossError::InvalidConfig(_))));

        let missing_layers = RecurrentCellBuilder::new()
            .set_activation(Activation::Tanh)
            .set_state_size(4)
            .build();
        assert!(matches!(missing_layers, Err(LossError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_rejects_bad_optional_values() {
        let base = || {
            RecurrentCellBuilder::new()
                .set_mode(RecurrentMode::Gru)
                .set_state_size(4)
                .set_num_stacked_layers(1)
        };
        assert!(base().build().is_ok());
        assert!(base().opt_drop_rate(1.0).build().is_err());
        assert!(base().opt_drop_rate(-0.1).build().is_err());
        assert!(base().opt_lstm_state_clip(1.0, -1.0).build().is_err());
        assert!(base().set_state_size(0).build().is_err());
        assert!(base().set_mode(RecurrentMode::Rnn).build().is_err());
        assert!(
            base()
                .set_mode(RecurrentMode::Rnn)
                .set_activation(Activation::Relu)
                .build()
                .is_ok()
        );
    }

    #[test]
    fn test_builder_carries_optional_settings() {
        let config = RecurrentCellBuilder::new()
            .set_mode(RecurrentMode::Lstm)
            .set_state_size(16)
            .set_num_stacked_layers(3)
            .opt_drop_rate(0.25)
            .opt_lstm_state_clip(-5.0, 5.0)
            .opt_bidirectional(true)
            .opt_state_outputs(true)
            .build()
            .unwrap();

        assert_eq!(config.lstm_state_clip, Some((-5.0, 5.0)));
        assert_eq!(config.num_directions(), 2);
        assert_eq!(config.drop_rate, 0.25);
        assert!(config.state_outputs);
    }

    #[test]
    fn test_lazy_initialization_sizes_parameters_from_input() {
        let mut cell = RecurrentCell::<f32>::new(lstm_config());
        assert!(!cell.is_initialized());
        assert_eq!(cell.num_parameters(), 0);

        let outputs = cell.initialize(&[vec![5, 7, 3]]).unwrap();
        assert_eq!(outputs, vec![vec![5, 7, 8]]);
        assert!(cell.is_initialized());

        let first = cell.parameter("l0_i2h_weight").unwrap();
        assert_eq!(first.shape(), Some(&[32, 3][..]));
        let second = cell.parameter("l1_i2h_weight").unwrap();
        assert_eq!(second.shape(), Some(&[32, 8][..]));
        assert_eq!(
            cell.parameter("l1_h2h_bias").unwrap().shape(),
            Some(&[32][..])
        );
        assert!(cell.parameter("r0_i2h_weight").is_none());
    }

    #[test]
    fn test_second_initialize_only_recomputes_outputs() {
        let mut cell = RecurrentCell::<f64>::new(lstm_config());
        cell.initialize(&[vec![2, 4, 3]]).unwrap();
        let before = cell.num_parameters();

        // A different feature size does not reallocate the weights.
        let outputs = cell.initialize(&[vec![6, 9, 10]]).unwrap();
        assert_eq!(outputs, vec![vec![6, 9, 8]]);
        assert_eq!(cell.num_parameters(), before);
        assert_eq!(
            cell.parameter("l0_i2h_weight").unwrap().shape(),
            Some(&[32, 3][..])
        );
    }

    #[test]
    fn test_bidirectional_state_outputs() {
        let config = RecurrentCellBuilder::new()
            .set_mode(RecurrentMode::Lstm)
            .set_state_size(4)
            .set_num_stacked_layers(1)
            .opt_bidirectional(true)
            .opt_state_outputs(true)
            .build()
            .unwrap();
        let mut cell = RecurrentCell::<f64>::new(config);

        let outputs = cell.initialize(&[vec![2, 3, 5]]).unwrap();
        assert_eq!(outputs, vec![vec![2, 3, 8], vec![2, 2, 4], vec![2, 2, 4]]);
        assert!(cell.parameter("r0_h2h_weight").is_some());
    }

    #[test]
    fn test_invalid_input_is_rejected_before_allocation() {
        let mut cell = RecurrentCell::<f64>::new(lstm_config());
        assert!(matches!(
            cell.initialize(&[vec![2, 3]]),
            Err(LossError::ShapeMismatch(_))
        ));
        assert!(!cell.is_initialized());

        let config = RecurrentCellBuilder::new()
            .set_mode(RecurrentMode::Gru)
            .set_state_size(4)
            .set_num_stacked_layers(1)
            .set_sequence_length(true)
            .build()
            .unwrap();
        let mut cell = RecurrentCell::<f64>::new(config);
        assert!(cell.initialize(&[vec![2, 3, 5]]).is_err());
        assert!(cell.initialize(&[vec![2, 3, 5], vec![2]]).is_ok());
    }
}
