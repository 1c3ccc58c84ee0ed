use ndarray::{Array1, Array2, ArrayView1, Axis, s};

use crate::{
    Result,
    arch::{FeedforwardNetwork, ForwardPass},
    dataset::Sample,
    matrix::Matrix,
};

/// Below this squared norm a gradient carries no meaningful direction and is left unnormalized.
pub const MIN_SQUARED_NORM: f64 = 1e-4;

/// Outer product `v · wᵀ`.
fn outer_product(v: ArrayView1<f64>, w: ArrayView1<f64>) -> Array2<f64> {
    let v = v.insert_axis(Axis(1));
    let w = w.insert_axis(Axis(0));
    v.dot(&w)
}

/// Computes the gradient of the square error with respect to every weight of the network.
///
/// # Arguments
/// * `network` - A network with a single output neuron.
/// * `samples` - The batch the error is measured on.
///
/// # Returns
/// One gradient matrix per layer, shaped like its weight matrix and summed over the whole batch.
/// An empty batch yields all zeros.
///
/// # Errors
/// `MlErr::UnsupportedOperation` if the network has more than one output neuron and
/// `MlErr::InvalidArgument` if a sample doesn't fit the input layer.
pub fn backpropagation(network: &FeedforwardNetwork, samples: &[Sample]) -> Result<Vec<Matrix>> {
    network.check_single_output()?;

    let mut grad: Vec<_> = network
        .weights()
        .iter()
        .map(|w| Matrix::zeros(w.rows(), w.cols()))
        .collect();

    for sample in samples {
        let pass = network.forward_pass(&sample.input())?;
        accumulate(network, &pass, sample.target(), &mut grad);
    }

    Ok(grad)
}

/// Adds the gradient of a single sample, given the forward pass computed for it, to `grad`.
fn accumulate(network: &FeedforwardNetwork, pass: &ForwardPass, target: f64, grad: &mut [Matrix]) {
    let act_fn = network.act_fn();
    let weights = network.weights();
    let activations = pass.activations();
    let nlayers = weights.len();

    // error w.r.t. the non-bias values of the output layer, the bias slot never carries error
    let output = pass.neuron_value(nlayers, 1);
    let mut d_values = Array1::from_elem(1, output - target);

    for l in (0..nlayers).rev() {
        let values = activations[l + 1].view();
        let values = values.slice(s![1.., 0]);

        // error w.r.t. the potentials of layer l
        let delta = &d_values * &values.mapv(|y| act_fn.df(y));

        let input = activations[l].view();
        let mut g = grad[l].view_mut();
        g += &outer_product(delta.view(), input.column(0));

        // the input layer has no upstream and the bias column receives no error
        if l > 0 {
            let w = weights[l].view();
            d_values = w.slice(s![.., 1..]).t().dot(&delta);
        }
    }
}

/// Sum of squares of every entry of every layer of a gradient.
pub fn squared_norm(grad: &[Matrix]) -> f64 {
    grad.iter().map(Matrix::sum_of_squares).sum()
}

/// Computes the gradient like [`backpropagation`] and rescales it to unit length.
///
/// All layers are treated as a single flattened vector. If its squared norm is below
/// [`MIN_SQUARED_NORM`] the raw gradient is returned unchanged instead.
pub fn normalized_gradient(
    network: &FeedforwardNetwork,
    samples: &[Sample],
) -> Result<Vec<Matrix>> {
    let grad = backpropagation(network, samples)?;
    Ok(normalize(grad))
}

pub(crate) fn normalize(grad: Vec<Matrix>) -> Vec<Matrix> {
    let squares = squared_norm(&grad);
    if squares < MIN_SQUARED_NORM {
        return grad;
    }

    let size = squares.sqrt();
    grad.iter().map(|g| g.multiply_by_scalar(1. / size)).collect()
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{MlErr, evaluation};

    const DELTA: f64 = 1e-5;
    const EPSILON: f64 = 1e-3;

    /// Central difference estimate of the gradient of the square error.
    fn numerical_gradient(network: &FeedforwardNetwork, samples: &[Sample]) -> Vec<Matrix> {
        let weights = network.weights();
        let mut grad: Vec<_> = weights
            .iter()
            .map(|w| Matrix::zeros(w.rows(), w.cols()))
            .collect();

        for l in 0..weights.len() {
            for r in 0..weights[l].rows() {
                for c in 0..weights[l].cols() {
                    let error_with = |delta: f64| {
                        let mut net = network.clone();
                        let w = net.weights()[l].get(r, c);
                        net.set_neuron_weight(l + 1, r, c, w + delta).unwrap();
                        evaluation::error(&net, samples).unwrap()
                    };

                    let estimate = (error_with(DELTA) - error_with(-DELTA)) / (2. * DELTA);
                    grad[l].set(r, c, estimate);
                }
            }
        }

        grad
    }

    fn assert_matches_numerical(network: &FeedforwardNetwork, samples: &[Sample]) {
        let analytic = backpropagation(network, samples).unwrap();
        let numerical = numerical_gradient(network, samples);

        for (l, (a, n)) in analytic.iter().zip(&numerical).enumerate() {
            assert!(
                a.approx_eq(n, EPSILON),
                "layer {l} of {}:\nanalytic {a}numerical {n}",
                network
            );
        }
    }

    fn random_samples(rng: &mut StdRng, n: usize, inputs: usize) -> Vec<Sample> {
        use rand::Rng;

        (0..n)
            .map(|_| {
                let features = (0..inputs).map(|_| rng.random_range(-2.0..2.0)).collect();
                Sample::new(rng.random_bool(0.5), features)
            })
            .collect()
    }

    #[test]
    fn empty_batch_has_zero_gradient() {
        let net = FeedforwardNetwork::new(vec![Matrix::from_rows(&[[0.3, -0.7]]).unwrap()]).unwrap();
        let grad = backpropagation(&net, &[]).unwrap();

        assert_eq!(grad.len(), 1);
        assert_eq!(grad[0].shape(), (1, 2));
        assert_eq!(grad[0].to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn single_layer_single_sample() {
        let net = FeedforwardNetwork::new(vec![Matrix::from_rows(&[[0.3, -0.7]]).unwrap()]).unwrap();
        assert_matches_numerical(&net, &[Sample::new(true, vec![0.8])]);
        assert_matches_numerical(&net, &[Sample::new(false, vec![-1.3])]);
    }

    #[test]
    fn single_layer_multiple_inputs() {
        let net =
            FeedforwardNetwork::new(vec![Matrix::from_rows(&[[0.1, 0.5, -0.4, 1.2]]).unwrap()])
                .unwrap();
        let samples = [
            Sample::new(true, vec![0.2, -0.3, 0.9]),
            Sample::new(false, vec![1.0, 1.0, -1.0]),
        ];

        assert_matches_numerical(&net, &samples);
    }

    #[test]
    fn multi_layer_networks() {
        let mut rng = StdRng::seed_from_u64(2024);

        for topology in [
            vec![1, 1, 1],
            vec![2, 3, 1],
            vec![3, 4, 2, 1],
            vec![2, 5, 3, 2, 1],
        ] {
            let net = FeedforwardNetwork::random(&topology, &mut rng).unwrap();
            let samples = random_samples(&mut rng, 5, topology[0]);
            assert_matches_numerical(&net, &samples);
        }
    }

    #[test]
    fn gradient_is_summed_over_the_batch() {
        let mut rng = StdRng::seed_from_u64(5);
        let net = FeedforwardNetwork::random(&[3, 2, 1], &mut rng).unwrap();
        let samples = random_samples(&mut rng, 4, 3);

        let whole = backpropagation(&net, &samples).unwrap();
        let (a, b) = samples.split_at(2);
        let first = backpropagation(&net, a).unwrap();
        let second = backpropagation(&net, b).unwrap();

        for ((w, f), s) in whole.iter().zip(&first).zip(&second) {
            assert!(w.approx_eq(&f.add(s).unwrap(), 1e-12));
        }
    }

    #[test]
    fn many_outputs_are_unsupported() {
        let mut rng = StdRng::seed_from_u64(0);
        let net = FeedforwardNetwork::random(&[2, 2], &mut rng).unwrap();

        let err = backpropagation(&net, &[Sample::new(true, vec![0.0, 0.0])]).unwrap_err();
        assert!(matches!(err, MlErr::UnsupportedOperation(_)));
    }

    #[test]
    fn samples_must_fit_the_input_layer() {
        let mut rng = StdRng::seed_from_u64(0);
        let net = FeedforwardNetwork::random(&[2, 1], &mut rng).unwrap();

        let err = backpropagation(&net, &[Sample::new(true, vec![0.0])]).unwrap_err();
        assert!(matches!(err, MlErr::InvalidArgument(_)));
    }

    #[test]
    fn normalized_gradient_has_unit_length() {
        let mut rng = StdRng::seed_from_u64(77);
        let net = FeedforwardNetwork::random(&[3, 4, 1], &mut rng).unwrap();
        let samples = random_samples(&mut rng, 6, 3);

        let raw = backpropagation(&net, &samples).unwrap();
        assert!(squared_norm(&raw) >= MIN_SQUARED_NORM);

        let normalized = normalized_gradient(&net, &samples).unwrap();
        assert!((squared_norm(&normalized).sqrt() - 1.0).abs() < 1e-9);

        // same direction
        let ratio = raw[0].get(0, 0) / normalized[0].get(0, 0);
        assert!((ratio - squared_norm(&raw).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn tiny_gradients_are_not_normalized() {
        // f(1) is 1 up to rounding, so this sample is already classified almost perfectly
        let net = FeedforwardNetwork::new(vec![Matrix::from_rows(&[[0.0, 1.0]]).unwrap()]).unwrap();
        let samples = [Sample::new(true, vec![1.0])];

        let raw = backpropagation(&net, &samples).unwrap();
        assert!(squared_norm(&raw) < MIN_SQUARED_NORM);

        let normalized = normalized_gradient(&net, &samples).unwrap();
        assert_eq!(normalized, raw);
    }
}
