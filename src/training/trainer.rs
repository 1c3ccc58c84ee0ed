use std::fmt;

use log::{debug, info};
use rand::Rng;

use super::{
    backprop::normalized_gradient,
    learning_rate::LearningRate,
    log::{LogRow, LogSink},
};
use crate::{
    Result,
    arch::FeedforwardNetwork,
    dataset::Sample,
    evaluation::Metrics,
    matrix::{self, Matrix},
};

/// Two weight sets closer than this are considered the same, i.e. the descent made no progress.
pub const DEFAULT_STALL_TOLERANCE: f64 = 1e-6;

/// The stages of a gradient descent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Initializing,
    Training,
    /// The validation error reached the acceptable error.
    Converged,
    MaxIterationsReached,
    /// An update left every weight unchanged.
    Stalled,
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            State::Converged | State::MaxIterationsReached | State::Stalled
        )
    }

    /// A human-readable explanation of why training stopped in this state.
    pub fn reason(&self) -> &'static str {
        match self {
            State::Initializing => "training has not started",
            State::Training => "training is in progress",
            State::Converged => "error below acceptable error",
            State::MaxIterationsReached => "exceeded max iterations",
            State::Stalled => "network not learning anything",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// The outcome of a gradient descent run.
#[derive(Debug, Clone)]
pub struct Training {
    pub network: FeedforwardNetwork,
    /// The terminal state the run ended in.
    pub state: State,
    /// Amount of weight updates applied.
    pub iterations: usize,
}

/// Batch gradient descent along the normalized gradient.
#[derive(Debug, Clone, Copy)]
pub struct GradientDescent {
    acceptable_error: f64,
    max_iterations: usize,
    stall_tolerance: f64,
}

impl GradientDescent {
    /// Creates a new `GradientDescent`.
    ///
    /// # Arguments
    /// * `acceptable_error` - Training stops as soon as the validation error is at most this.
    /// * `max_iterations` - Training stops after this many updates.
    pub fn new(acceptable_error: f64, max_iterations: usize) -> Self {
        Self {
            acceptable_error,
            max_iterations,
            stall_tolerance: DEFAULT_STALL_TOLERANCE,
        }
    }

    /// Sets the tolerance under which an update counts as no change at all.
    pub fn with_stall_tolerance(mut self, stall_tolerance: f64) -> Self {
        self.stall_tolerance = stall_tolerance;
        self
    }

    pub fn acceptable_error(&self) -> f64 {
        self.acceptable_error
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Trains the network until it converges, stalls or runs out of iterations.
    ///
    /// Each iteration computes the normalized gradient on the training batch, asks `lr` for a rate
    /// given the iteration number and the current training error, and moves every weight against
    /// the gradient. A row with the metrics of both batches is recorded for the initial network
    /// and after every update.
    ///
    /// # Arguments
    /// * `network` - The network to train, already initialized.
    /// * `training` - The batch the gradient is computed on.
    /// * `validation` - The batch convergence is measured on.
    /// * `lr` - The learning rate schedule.
    /// * `sink` - Where the per-iteration rows go.
    ///
    /// # Returns
    /// The trained network with the terminal state it reached.
    pub fn train<L, S>(
        &self,
        mut network: FeedforwardNetwork,
        training: &[Sample],
        validation: &[Sample],
        lr: &mut L,
        sink: &mut S,
    ) -> Result<Training>
    where
        L: LearningRate + ?Sized,
        S: LogSink + ?Sized,
    {
        info!(
            params = network.num_params(), samples = training.len();
            "initializing training of a {} network",
            topology_name(&network)
        );

        let mut row = self.evaluate(&network, 0, training, validation)?;
        sink.record(&row)?;

        let next = self.check_done(&row).unwrap_or(State::Training);
        let mut state = transition(State::Initializing, next);
        let mut iterations = 0;

        while !state.is_terminal() {
            let iteration = iterations + 1;

            let grad = normalized_gradient(&network, training)?;
            let rate = lr.rate(iteration, row.training.error);
            let weights = step(network.weights(), &grad, rate)?;

            if matrix::approx_eq_all(&weights, network.weights(), self.stall_tolerance) {
                state = transition(state, State::Stalled);
                break;
            }

            network.set_weights(weights)?;
            iterations = iteration;

            row = self.evaluate(&network, iteration, training, validation)?;
            sink.record(&row)?;

            debug!(
                iteration = iteration, rate = rate;
                "validation error {:.4}, training error {:.4}",
                row.validation.error,
                row.training.error
            );

            if let Some(terminal) = self.check_done(&row) {
                state = transition(state, terminal);
            }
        }

        info!(iterations = iterations; "training finished: {}", state.reason());

        Ok(Training {
            network,
            state,
            iterations,
        })
    }

    fn evaluate(
        &self,
        network: &FeedforwardNetwork,
        iteration: usize,
        training: &[Sample],
        validation: &[Sample],
    ) -> Result<LogRow> {
        Ok(LogRow {
            iteration,
            validation: Metrics::compute(network, validation)?,
            training: Metrics::compute(network, training)?,
        })
    }

    fn check_done(&self, row: &LogRow) -> Option<State> {
        if row.validation.error <= self.acceptable_error {
            Some(State::Converged)
        } else if row.iteration >= self.max_iterations {
            Some(State::MaxIterationsReached)
        } else {
            None
        }
    }
}

fn transition(from: State, to: State) -> State {
    info!("{from:?} -> {to:?}");
    to
}

/// `w - rate * g` for every layer.
fn step(weights: &[Matrix], grad: &[Matrix], rate: f64) -> Result<Vec<Matrix>> {
    weights
        .iter()
        .zip(grad)
        .map(|(w, g)| w.subtract(&g.multiply_by_scalar(rate)))
        .collect()
}

fn topology_name(network: &FeedforwardNetwork) -> String {
    let sizes: Vec<_> = network.topology().iter().map(usize::to_string).collect();
    sizes.join("-")
}

/// Builds a network with the given topology, initializes it and trains it.
///
/// # Arguments
/// * `topology` - Amount of neurons per layer, input layer first.
/// * `descent` - The stopping criteria.
/// * `training` - The batch the gradient is computed on.
/// * `validation` - The batch convergence is measured on.
/// * `lr` - The learning rate schedule.
/// * `sink` - Where the per-iteration rows go.
/// * `rng` - The random number generator the weights are drawn from.
pub fn train_network<L, S, R>(
    topology: &[usize],
    descent: &GradientDescent,
    training: &[Sample],
    validation: &[Sample],
    lr: &mut L,
    sink: &mut S,
    rng: &mut R,
) -> Result<Training>
where
    L: LearningRate + ?Sized,
    S: LogSink + ?Sized,
    R: Rng,
{
    let network = FeedforwardNetwork::random(topology, rng)?;
    descent.train(network, training, validation, lr, sink)
}
