use serde::Serialize;

use crate::{Result, arch::FeedforwardNetwork, dataset::Sample};

/// Half the sum of squared differences between two equally long vectors.
///
/// # Panics
/// If the lengths differ.
pub fn square_error(predicted: &[f64], target: &[f64]) -> f64 {
    assert_eq!(
        predicted.len(),
        target.len(),
        "cannot compare vectors of different lengths"
    );

    predicted
        .iter()
        .zip(target)
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f64>()
        / 2.
}

/// Every quality measure of a network over a sample batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub error: f64,
    pub rmse: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Metrics {
    /// Computes every metric with a single forward pass per sample.
    ///
    /// # Arguments
    /// * `network` - A network with a single output neuron.
    /// * `samples` - The batch to evaluate on.
    pub fn compute(network: &FeedforwardNetwork, samples: &[Sample]) -> Result<Self> {
        let outcomes = outcomes(network, samples)?;
        Ok(Self::from_outcomes(&outcomes))
    }

    fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let confusion = Confusion::count(outcomes);
        let precision = confusion.precision();
        let recall = confusion.recall();

        Self {
            error: outcomes.iter().map(Outcome::square_error).sum(),
            rmse: rmse_of(outcomes),
            accuracy: confusion.accuracy(),
            precision,
            recall,
            f1: f1_of(precision, recall),
        }
    }
}

/// A network output next to the label it should match.
struct Outcome {
    output: f64,
    positive: bool,
}

impl Outcome {
    fn target(&self) -> f64 {
        if self.positive { 1.0 } else { -1.0 }
    }

    fn predicted_positive(&self) -> bool {
        self.output >= 0.0
    }

    fn square_error(&self) -> f64 {
        (self.output - self.target()).powi(2) / 2.
    }
}

fn outcomes(network: &FeedforwardNetwork, samples: &[Sample]) -> Result<Vec<Outcome>> {
    network.check_single_output()?;

    samples
        .iter()
        .map(|s| {
            Ok(Outcome {
                output: network.forward_single(&s.input())?,
                positive: s.is_positive_user(),
            })
        })
        .collect()
}

#[derive(Default)]
struct Confusion {
    true_positives: usize,
    false_positives: usize,
    true_negatives: usize,
    false_negatives: usize,
}

impl Confusion {
    fn count(outcomes: &[Outcome]) -> Self {
        let mut confusion = Self::default();

        for outcome in outcomes {
            match (outcome.predicted_positive(), outcome.positive) {
                (true, true) => confusion.true_positives += 1,
                (true, false) => confusion.false_positives += 1,
                (false, false) => confusion.true_negatives += 1,
                (false, true) => confusion.false_negatives += 1,
            }
        }

        confusion
    }

    fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => (self.true_positives + self.true_negatives) as f64 / n as f64,
        }
    }

    fn precision(&self) -> f64 {
        ratio_or_one(
            self.true_positives,
            self.true_positives + self.false_positives,
        )
    }

    fn recall(&self) -> f64 {
        ratio_or_one(
            self.true_positives,
            self.true_positives + self.false_negatives,
        )
    }
}

/// `part / whole`, vacuously `1.0` when there is nothing to measure.
fn ratio_or_one(part: usize, whole: usize) -> f64 {
    match whole {
        0 => 1.0,
        whole => part as f64 / whole as f64,
    }
}

fn rmse_of(outcomes: &[Outcome]) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }

    let squares: f64 = outcomes
        .iter()
        .map(|o| (o.output - o.target()).powi(2))
        .sum();

    (squares / outcomes.len() as f64).sqrt()
}

fn f1_of(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }

    2. * precision * recall / (precision + recall)
}

/// Square error of the network summed over the batch, `0` for an empty batch.
pub fn error(network: &FeedforwardNetwork, samples: &[Sample]) -> Result<f64> {
    Ok(outcomes(network, samples)?
        .iter()
        .map(Outcome::square_error)
        .sum())
}

/// Root of the mean squared error, `0` for an empty batch.
pub fn rmse(network: &FeedforwardNetwork, samples: &[Sample]) -> Result<f64> {
    Ok(rmse_of(&outcomes(network, samples)?))
}

/// Fraction of samples whose predicted class matches their label, `0` for an empty batch.
pub fn accuracy(network: &FeedforwardNetwork, samples: &[Sample]) -> Result<f64> {
    Ok(Confusion::count(&outcomes(network, samples)?).accuracy())
}

/// Fraction of predicted positives that are actual positives, `1` if nothing is predicted positive.
pub fn precision(network: &FeedforwardNetwork, samples: &[Sample]) -> Result<f64> {
    Ok(Confusion::count(&outcomes(network, samples)?).precision())
}

/// Fraction of actual positives that are predicted positive, `1` if there are no positives.
pub fn recall(network: &FeedforwardNetwork, samples: &[Sample]) -> Result<f64> {
    Ok(Confusion::count(&outcomes(network, samples)?).recall())
}

pub fn f1(network: &FeedforwardNetwork, samples: &[Sample]) -> Result<f64> {
    let confusion = Confusion::count(&outcomes(network, samples)?);
    Ok(f1_of(confusion.precision(), confusion.recall()))
}
