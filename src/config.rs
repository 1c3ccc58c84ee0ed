use std::{
    error::Error,
    fmt::{self, Display},
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    dataset::Ratios,
    training::{Constant, GradientDescent, InverseDecay, LearningRate},
};

/// Errors produced while loading a [`Config`].
#[derive(Debug)]
pub enum ConfigErr {
    Io { path: PathBuf, source: io::Error },
    Json(serde_json::Error),
    /// The file is well formed but holds values training can't run with.
    Invalid(String),
}

impl Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErr::Io { path, source } => {
                write!(f, "cannot read config {}: {source}", path.display())
            }
            ConfigErr::Json(e) => write!(f, "invalid config json: {e}"),
            ConfigErr::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl Error for ConfigErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigErr::Io { source, .. } => Some(source),
            ConfigErr::Json(e) => Some(e),
            ConfigErr::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Everything a training run needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding one walk recording per user.
    pub data_path: PathBuf,
    /// The recording of the user to authenticate.
    pub testing_user: String,
    pub entries_per_sample: usize,
    /// Sizes of the hidden layers, the input and output layers are implied.
    pub hidden_topology: Vec<usize>,
    pub acceptable_error: f64,
    pub learning_speed: f64,
    /// When present the learning rate decays every this many iterations.
    #[serde(default)]
    pub learning_decay_period: Option<usize>,
    pub max_iterations: usize,
    pub train_ratio: f64,
    pub test_ratio: f64,
    pub validation_ratio: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub learning_log: Option<PathBuf>,
    #[serde(default)]
    pub weights_log: Option<PathBuf>,
}

impl Config {
    /// Reads, parses and validates a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigErr> {
        let content = fs::read_to_string(path).map_err(|source| ConfigErr::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&content)
    }

    /// Parses and validates a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigErr> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigErr> {
        self.ratios()?;

        if self.entries_per_sample == 0 {
            return Err(ConfigErr::Invalid(
                "entries_per_sample must be at least 1".into(),
            ));
        }

        if self.hidden_topology.contains(&0) {
            return Err(ConfigErr::Invalid(format!(
                "hidden layers need at least a neuron, got {:?}",
                self.hidden_topology
            )));
        }

        if !self.learning_speed.is_finite() || self.learning_speed <= 0.0 {
            return Err(ConfigErr::Invalid(format!(
                "learning_speed must be a positive number, got {}",
                self.learning_speed
            )));
        }

        if self.learning_decay_period == Some(0) {
            return Err(ConfigErr::Invalid(
                "learning_decay_period must be at least 1".into(),
            ));
        }

        if !self.acceptable_error.is_finite() || self.acceptable_error < 0.0 {
            return Err(ConfigErr::Invalid(format!(
                "acceptable_error must be a non negative number, got {}",
                self.acceptable_error
            )));
        }

        Ok(())
    }

    pub fn ratios(&self) -> Result<Ratios, ConfigErr> {
        Ratios::new(self.train_ratio, self.test_ratio, self.validation_ratio)
            .map_err(|e| ConfigErr::Invalid(e.to_string()))
    }

    /// The full topology for samples with `input_size` features: `[input, hidden.., 1]`.
    pub fn topology(&self, input_size: usize) -> Vec<usize> {
        let mut topology = Vec::with_capacity(self.hidden_topology.len() + 2);
        topology.push(input_size);
        topology.extend_from_slice(&self.hidden_topology);
        topology.push(1);
        topology
    }

    pub fn descent(&self) -> GradientDescent {
        GradientDescent::new(self.acceptable_error, self.max_iterations)
    }

    /// A constant rate of `learning_speed`, or an inverse decay when a period is set.
    pub fn learning_rate(&self) -> Box<dyn LearningRate> {
        match self.learning_decay_period {
            Some(period) => Box::new(InverseDecay::new(self.learning_speed, period)),
            None => Box::new(Constant(self.learning_speed)),
        }
    }
}
