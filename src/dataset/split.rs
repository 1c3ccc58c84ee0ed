use rand::{Rng, seq::SliceRandom};

use super::{DataErr, Sample};

const RATIO_TOLERANCE: f64 = 1e-4;

/// The share of samples that goes to each batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratios {
    train: f64,
    test: f64,
    validation: f64,
}

impl Ratios {
    /// Creates a new `Ratios`.
    ///
    /// # Returns
    /// `DataErr::InvalidRatios` unless every ratio is in `[0, 1]` and they sum up to one. Ratios
    /// are never clamped.
    pub fn new(train: f64, test: f64, validation: f64) -> Result<Self, DataErr> {
        let in_range = [train, test, validation]
            .iter()
            .all(|r| (0.0..=1.0).contains(r));

        if !in_range || (train + test + validation - 1.0).abs() > RATIO_TOLERANCE {
            return Err(DataErr::InvalidRatios {
                train,
                test,
                validation,
            });
        }

        Ok(Self {
            train,
            test,
            validation,
        })
    }

    pub fn train(&self) -> f64 {
        self.train
    }

    pub fn test(&self) -> f64 {
        self.test
    }

    pub fn validation(&self) -> f64 {
        self.validation
    }
}

/// Three disjoint sample batches.
#[derive(Debug, Clone, Default)]
pub struct Split {
    pub training: Vec<Sample>,
    pub validation: Vec<Sample>,
    pub testing: Vec<Sample>,
}

impl Split {
    /// A human-readable summary of the batches: their sizes and how positives (`|`) and negatives
    /// (`-`) are spread in each of them.
    pub fn overview(&self) -> String {
        let batches = [
            ("train", &self.training),
            ("test", &self.testing),
            ("validation", &self.validation),
        ];

        let mut overview = String::new();
        for (name, batch) in batches {
            overview += &format!("{name} data size: {}\n", batch.len());
        }

        for (name, batch) in batches {
            let density: String = batch
                .iter()
                .map(|s| if s.is_positive_user() { '|' } else { '-' })
                .collect();

            overview += &format!("\n{name} data density: [{density}]\n");
        }

        overview
    }
}

/// Splits the samples of both classes into training, testing and validation batches.
///
/// Each class is shuffled and split on its own so every batch keeps the class proportions:
/// `round(n * train)` samples go to training, `round(n * test)` to testing and the remainder to
/// validation. Every batch is shuffled afterwards.
///
/// # Arguments
/// * `positives` - Samples of the authenticated user.
/// * `negatives` - Samples of everybody else.
/// * `ratios` - The share of samples for each batch.
/// * `rng` - A random number generator.
pub fn split<R: Rng>(
    mut positives: Vec<Sample>,
    mut negatives: Vec<Sample>,
    ratios: Ratios,
    rng: &mut R,
) -> Split {
    positives.shuffle(rng);
    negatives.shuffle(rng);

    let mut split = Split::default();
    for class in [positives, negatives] {
        let n = class.len();
        let n_train = ((n as f64 * ratios.train).round() as usize).min(n);
        let n_test = ((n as f64 * ratios.test).round() as usize).min(n - n_train);

        let mut class = class.into_iter();
        split.training.extend(class.by_ref().take(n_train));
        split.testing.extend(class.by_ref().take(n_test));
        split.validation.extend(class);
    }

    split.training.shuffle(rng);
    split.testing.shuffle(rng);
    split.validation.shuffle(rng);

    split
}
