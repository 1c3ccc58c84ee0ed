mod error;
mod loader;
mod normalization;
mod sample;
mod split;

pub use error::DataErr;
pub use loader::{load_walks, parse_walk};
pub use normalization::Normalization;
pub use sample::Sample;
pub use split::{Ratios, Split, split};
