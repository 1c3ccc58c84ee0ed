use crate::matrix::Matrix;

/// A labeled feature vector: a chunk of a walk recording and whether it belongs to the user being
/// authenticated.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    features: Vec<f64>,
    positive: bool,
}

impl Sample {
    pub fn new(positive: bool, features: Vec<f64>) -> Self {
        Self { features, positive }
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    /// Whether the sample belongs to the authenticated user.
    pub fn is_positive_user(&self) -> bool {
        self.positive
    }

    /// The value the network should output for this sample: `1.0` for the authenticated user,
    /// `-1.0` for everybody else.
    pub fn target(&self) -> f64 {
        if self.positive { 1.0 } else { -1.0 }
    }

    /// The features as a column vector, ready to be fed to a network.
    pub fn input(&self) -> Matrix {
        Matrix::column_vector(&self.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_map_to_unit_targets() {
        assert_eq!(Sample::new(true, vec![0.0]).target(), 1.0);
        assert_eq!(Sample::new(false, vec![0.0]).target(), -1.0);
    }

    #[test]
    fn input_is_a_column_vector() {
        let sample = Sample::new(true, vec![1.0, 2.0, 3.0]);
        let input = sample.input();

        assert_eq!(input.shape(), (3, 1));
        assert_eq!(input.to_vec(), sample.features());
    }
}
