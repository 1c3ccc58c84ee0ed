/// A learning rate schedule.
///
/// Queried once per descent iteration with the iteration number (starting at `1`) and the current
/// training error.
pub trait LearningRate {
    fn rate(&mut self, iteration: usize, error: f64) -> f64;
}

impl<F> LearningRate for F
where
    F: FnMut(usize, f64) -> f64,
{
    fn rate(&mut self, iteration: usize, error: f64) -> f64 {
        self(iteration, error)
    }
}

/// The same rate at every iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant(pub f64);

impl LearningRate for Constant {
    fn rate(&mut self, _iteration: usize, _error: f64) -> f64 {
        self.0
    }
}

/// A rate that shrinks every `period` iterations: `speed / (iteration / period + 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseDecay {
    speed: f64,
    period: usize,
}

impl InverseDecay {
    /// Creates a new `InverseDecay` schedule.
    ///
    /// # Arguments
    /// * `speed` - The initial rate.
    /// * `period` - How many iterations the rate stays the same, a zero period is taken as `1`.
    pub fn new(speed: f64, period: usize) -> Self {
        Self {
            speed,
            period: period.max(1),
        }
    }
}

impl LearningRate for InverseDecay {
    fn rate(&mut self, iteration: usize, _error: f64) -> f64 {
        self.speed / (iteration / self.period + 1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant() {
        let mut lr = Constant(0.3);
        assert_eq!(lr.rate(1, 10.0), 0.3);
        assert_eq!(lr.rate(1000, 0.0), 0.3);
    }

    #[test]
    fn inverse_decay_steps_every_period() {
        let mut lr = InverseDecay::new(1.0, 10);

        assert_eq!(lr.rate(1, 0.0), 1.0);
        assert_eq!(lr.rate(9, 0.0), 1.0);
        assert_eq!(lr.rate(10, 0.0), 0.5);
        assert_eq!(lr.rate(25, 0.0), 1.0 / 3.0);
        assert_eq!(InverseDecay::new(2.0, 0).rate(3, 0.0), 0.5);
    }

    #[test]
    fn closures_are_schedules() {
        let mut calls = 0;
        let mut lr = |iteration: usize, error: f64| {
            calls += 1;
            error / iteration as f64
        };

        assert_eq!(lr.rate(2, 1.0), 0.5);
        assert_eq!(lr.rate(4, 1.0), 0.25);
        assert_eq!(calls, 2);
    }
}
