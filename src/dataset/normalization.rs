use super::{DataErr, Sample};

/// Standardizes sample features with a single mean and deviation shared by every feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    mean: f64,
    deviation: f64,
}

impl Normalization {
    /// Computes the mean and the (population) standard deviation of every feature value.
    ///
    /// # Arguments
    /// * `samples` - The samples to fit on, they are not modified.
    ///
    /// # Returns
    /// The fitted `Normalization`, or `DataErr::Empty` if there are no feature values at all.
    pub fn fit(samples: &[Sample]) -> Result<Self, DataErr> {
        let values = || samples.iter().flat_map(|s| s.features().iter().copied());
        let n = values().count();

        if n == 0 {
            return Err(DataErr::Empty(
                "cannot normalize without feature values".into(),
            ));
        }

        let mean = values().sum::<f64>() / n as f64;
        let variance = values().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;

        Ok(Self {
            mean,
            deviation: variance.sqrt(),
        })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn deviation(&self) -> f64 {
        self.deviation
    }

    pub fn normalize_value(&self, value: f64) -> f64 {
        let centered = value - self.mean;

        // constant data, nothing to scale
        if self.deviation == 0.0 {
            return centered;
        }

        centered / self.deviation
    }

    /// Returns normalized copies of `samples`, keeping their labels.
    pub fn normalize(&self, samples: &[Sample]) -> Vec<Sample> {
        samples
            .iter()
            .map(|s| {
                let features = s
                    .features()
                    .iter()
                    .map(|&v| self.normalize_value(v))
                    .collect();

                Sample::new(s.is_positive_user(), features)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_data_has_zero_mean_and_unit_deviation() {
        let samples = vec![
            Sample::new(true, vec![1.0, 2.0, 3.0]),
            Sample::new(false, vec![4.0, 5.0, 6.0]),
        ];

        let norm = Normalization::fit(&samples).unwrap();
        assert!((norm.mean() - 3.5).abs() < 1e-12);

        let normalized = norm.normalize(&samples);
        let refit = Normalization::fit(&normalized).unwrap();
        assert!(refit.mean().abs() < 1e-12);
        assert!((refit.deviation() - 1.0).abs() < 1e-12);

        assert!(normalized[0].is_positive_user());
        assert!(!normalized[1].is_positive_user());
    }

    #[test]
    fn constant_data_is_only_centered() {
        let samples = vec![Sample::new(true, vec![2.0, 2.0])];
        let norm = Normalization::fit(&samples).unwrap();

        assert_eq!(norm.deviation(), 0.0);
        assert_eq!(norm.normalize(&samples)[0].features(), &[0.0, 0.0]);
    }

    #[test]
    fn fitting_nothing_fails() {
        assert!(matches!(Normalization::fit(&[]), Err(DataErr::Empty(_))));
        assert!(Normalization::fit(&[Sample::new(true, vec![])]).is_err());
    }
}
