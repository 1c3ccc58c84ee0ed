use std::fmt;

use rand::Rng;

use super::{activation::ScaledTanh, init};
use crate::{MlErr, Result, matrix::Matrix};

/// A feedforward neural network: an ordered stack of weight matrices.
///
/// Layer `i` maps a bias-augmented `(k_i + 1)`-dimensional input to a `k_{i+1}`-dimensional
/// output, so its weight matrix has shape `k_{i+1} x (k_i + 1)`. Column `0` of every weight matrix
/// holds the bias weights.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedforwardNetwork {
    layers: Vec<Matrix>,
    act_fn: ScaledTanh,
}

impl FeedforwardNetwork {
    /// Creates a new `FeedforwardNetwork` from its weight matrices.
    ///
    /// # Arguments
    /// * `layers` - The weight matrices, from the first hidden layer to the output layer.
    ///
    /// # Returns
    /// The network, or `MlErr::Configuration` if the list is empty, a layer has no neurons or no
    /// bias column, or two consecutive layers don't chain (`cols(W_i) - 1 != rows(W_{i-1})`).
    pub fn new(layers: Vec<Matrix>) -> Result<Self> {
        validate_layers(&layers)?;

        Ok(Self {
            layers,
            act_fn: ScaledTanh::default(),
        })
    }

    /// Creates a network with the given topology, every layer drawn by [`init::lecun_uniform`].
    ///
    /// # Arguments
    /// * `topology` - Amount of neurons per layer, input layer first (e.g. `[2, 3, 1]`).
    /// * `rng` - A random number generator.
    pub fn random<R: Rng>(topology: &[usize], rng: &mut R) -> Result<Self> {
        validate_topology(topology)?;

        let layers = topology
            .windows(2)
            .map(|pair| init::lecun_uniform(pair[1], pair[0], rng))
            .collect::<Result<Vec<_>>>()?;

        Self::new(layers)
    }

    /// Returns the amount of neurons per layer, input layer first.
    pub fn topology(&self) -> Vec<usize> {
        let mut topology = Vec::with_capacity(self.layers.len() + 1);
        topology.push(self.input_size());
        topology.extend(self.layers.iter().map(Matrix::rows));
        topology
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].cols() - 1
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].rows()
    }

    /// Amount of weight matrices, i.e. layers excluding the input one.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Total amount of weights, biases included.
    pub fn num_params(&self) -> usize {
        self.layers.iter().map(|w| w.rows() * w.cols()).sum()
    }

    pub fn weights(&self) -> &[Matrix] {
        &self.layers
    }

    pub fn into_weights(self) -> Vec<Matrix> {
        self.layers
    }

    pub fn act_fn(&self) -> ScaledTanh {
        self.act_fn
    }

    /// Replaces every weight matrix at once.
    ///
    /// # Returns
    /// `MlErr::Configuration` if the new weights don't have exactly the current shapes, in which
    /// case the network is left untouched.
    pub fn set_weights(&mut self, layers: Vec<Matrix>) -> Result<()> {
        let same_shapes = layers.len() == self.layers.len()
            && layers
                .iter()
                .zip(&self.layers)
                .all(|(new, old)| new.shape() == old.shape());

        if !same_shapes {
            return Err(MlErr::Configuration(format!(
                "new weights must keep the topology {:?}",
                self.topology()
            )));
        }

        self.layers = layers;
        Ok(())
    }

    /// Returns a single weight of a neuron.
    ///
    /// # Arguments
    /// * `layer` - The layer the neuron is in, `0` being the input layer.
    /// * `neuron` - The position of the neuron inside its layer.
    /// * `weight` - The position of the weight inside the neuron, `0` being its bias.
    pub fn neuron_weight(&self, layer: usize, neuron: usize, weight: usize) -> Result<f64> {
        let (row, col) = self.locate(layer, neuron, weight)?;
        Ok(self.layers[layer - 1].get(row, col))
    }

    /// Overwrites a single weight of a neuron, see [`FeedforwardNetwork::neuron_weight`].
    pub fn set_neuron_weight(
        &mut self,
        layer: usize,
        neuron: usize,
        weight: usize,
        value: f64,
    ) -> Result<()> {
        let (row, col) = self.locate(layer, neuron, weight)?;
        self.layers[layer - 1].set(row, col, value);
        Ok(())
    }

    /// Makes a forward pass through the network.
    ///
    /// # Arguments
    /// * `input` - A column vector of `input_size()` values.
    ///
    /// # Returns
    /// The output layer's values as a column vector.
    pub fn forward(&self, input: &Matrix) -> Result<Matrix> {
        Ok(self.forward_pass(input)?.output())
    }

    /// Makes a forward pass through the network keeping every layer's activations.
    ///
    /// # Arguments
    /// * `input` - A column vector of `input_size()` values.
    ///
    /// # Returns
    /// The bias-augmented activations of every layer, input layer included.
    pub fn forward_pass(&self, input: &Matrix) -> Result<ForwardPass> {
        self.check_input(input)?;

        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input.with_bias());

        for w in &self.layers {
            let mut z = w.multiply(&activations[activations.len() - 1])?;
            z.map_inplace(|z| self.act_fn.f(z));
            activations.push(z.with_bias());
        }

        Ok(ForwardPass { activations })
    }

    /// Makes a forward pass through a network with a single output neuron.
    ///
    /// # Returns
    /// The output neuron's value, or `MlErr::UnsupportedOperation` if the network has more than one
    /// output neuron.
    pub fn forward_single(&self, input: &Matrix) -> Result<f64> {
        self.check_single_output()?;
        Ok(self.forward_pass(input)?.neuron_value(self.layers.len(), 1))
    }

    pub(crate) fn check_single_output(&self) -> Result<()> {
        match self.output_size() {
            1 => Ok(()),
            n => Err(MlErr::UnsupportedOperation(format!(
                "expected a single output neuron, the network has {n}"
            ))),
        }
    }

    fn check_input(&self, input: &Matrix) -> Result<()> {
        if !input.is_column_vector() || input.rows() != self.input_size() {
            return Err(MlErr::InvalidArgument(format!(
                "expected a {}x1 column vector as input, got a {}x{} matrix",
                self.input_size(),
                input.rows(),
                input.cols()
            )));
        }

        Ok(())
    }

    fn locate(&self, layer: usize, neuron: usize, weight: usize) -> Result<(usize, usize)> {
        if layer == 0 {
            return Err(MlErr::InvalidArgument(
                "input neurons do not have weights".into(),
            ));
        }

        let w = self.layers.get(layer - 1).ok_or_else(|| {
            MlErr::InvalidArgument(format!(
                "layer {layer} does not exist, the network has {} layers",
                self.layers.len() + 1
            ))
        })?;

        if neuron >= w.rows() || weight >= w.cols() {
            return Err(MlErr::InvalidArgument(format!(
                "layer {layer} has {} neurons with {} weights each, asked for weight {weight} of neuron {neuron}",
                w.rows(),
                w.cols()
            )));
        }

        Ok((neuron, weight))
    }
}

impl fmt::Display for FeedforwardNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topology: Vec<_> = self.topology().iter().map(usize::to_string).collect();
        writeln!(f, "FeedforwardNetwork with topology {}", topology.join("-"))?;

        for w in &self.layers {
            write!(f, "{w}")?;
        }

        Ok(())
    }
}

/// The activations of every layer computed by a single forward pass.
///
/// Activation `0` is the bias-augmented input and activation `l` the bias-augmented output of
/// weight matrix `l - 1`. Row `0` of every activation is the constant bias `1.0`. The cache is
/// tied to the weights the pass was computed with, so it must be recomputed after any update.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    activations: Vec<Matrix>,
}

impl ForwardPass {
    pub fn activations(&self) -> &[Matrix] {
        &self.activations
    }

    /// Returns the bias-augmented activation of the given layer.
    ///
    /// # Panics
    /// If `layer` is greater than the amount of weight matrices.
    pub fn activation(&self, layer: usize) -> &Matrix {
        &self.activations[layer]
    }

    /// Returns a single value from a layer, index `0` being the bias.
    ///
    /// # Panics
    /// If the position is out of bounds.
    pub fn neuron_value(&self, layer: usize, neuron: usize) -> f64 {
        self.activations[layer].get(neuron, 0)
    }

    /// Returns the output layer's values, without the bias row.
    pub fn output(&self) -> Matrix {
        let last = &self.activations[self.activations.len() - 1];
        let values: Vec<_> = last.to_vec().into_iter().skip(1).collect();
        Matrix::column_vector(&values)
    }
}

fn validate_topology(topology: &[usize]) -> Result<()> {
    if topology.len() < 2 {
        return Err(MlErr::Configuration(format!(
            "a topology needs at least an input and an output layer, got {topology:?}"
        )));
    }

    if let Some(i) = topology.iter().position(|&size| size == 0) {
        return Err(MlErr::Configuration(format!(
            "layer {i} of topology {topology:?} has no neurons"
        )));
    }

    Ok(())
}

fn validate_layers(layers: &[Matrix]) -> Result<()> {
    if layers.is_empty() {
        return Err(MlErr::Configuration("the network has no layers".into()));
    }

    for (i, w) in layers.iter().enumerate() {
        if w.rows() == 0 || w.cols() < 2 {
            return Err(MlErr::Configuration(format!(
                "layer {i} has shape {}x{}, it needs at least a neuron with a bias and an input",
                w.rows(),
                w.cols()
            )));
        }

        if i > 0 && w.cols() - 1 != layers[i - 1].rows() {
            return Err(MlErr::Configuration(format!(
                "layer {i} takes {} inputs but the previous layer has {} neurons",
                w.cols() - 1,
                layers[i - 1].rows()
            )));
        }
    }

    Ok(())
}
