pub mod arch;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod matrix;
pub mod training;

pub use error::{MlErr, Result};
pub use matrix::Matrix;
