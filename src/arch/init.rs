use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::{MlErr, Result, matrix::Matrix};

/// Returns the half-width `sqrt(3 / fan_in)` of the initialization range for a layer.
///
/// # Arguments
/// * `fan_in` - The amount of non-bias inputs feeding the layer.
pub fn init_range(fan_in: usize) -> f64 {
    (3. / fan_in as f64).sqrt()
}

/// Samples a `rows x (fan_in + 1)` weight matrix uniformly from `[-w, w]`, `w = sqrt(3 / fan_in)`.
///
/// The bias column is drawn from the same range as every other weight.
///
/// # Arguments
/// * `rows` - The amount of neurons in the layer.
/// * `fan_in` - The amount of non-bias inputs feeding the layer.
/// * `rng` - A random number generator.
pub fn lecun_uniform<R: Rng>(rows: usize, fan_in: usize, rng: &mut R) -> Result<Matrix> {
    let range = init_range(fan_in);
    let distribution = Uniform::new_inclusive(-range, range).map_err(|e| {
        MlErr::Configuration(format!("cannot initialize a layer with fan-in {fan_in}: {e}"))
    })?;

    let cols = fan_in + 1;
    let values = (0..rows * cols)
        .map(|_| distribution.sample(rng))
        .collect();

    Matrix::from_vec(rows, cols, values)
}
