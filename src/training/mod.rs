mod backprop;
mod learning_rate;
mod log;
mod trainer;

pub use backprop::{MIN_SQUARED_NORM, backpropagation, normalized_gradient, squared_norm};
pub use learning_rate::{Constant, InverseDecay, LearningRate};
pub use self::log::{CsvSink, JsonSink, LogRow, LogSink, NoopSink, write_weights};
pub use trainer::{DEFAULT_STALL_TOLERANCE, GradientDescent, State, Training, train_network};
