pub mod activation;
pub mod init;
mod network;

pub use activation::ScaledTanh;
pub use network::{FeedforwardNetwork, ForwardPass};
