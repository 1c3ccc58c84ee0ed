use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used in the entire training core.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The training core's error type.
///
/// Every variant is fatal: nothing in the core retries or recovers, the caller is expected to
/// fix the network configuration or its inputs.
#[derive(Debug)]
pub enum MlErr {
    /// A malformed network, e.g. an empty layer list or layers whose shapes don't chain.
    Configuration(String),
    /// Two operands with incompatible shapes, given as `(rows, cols)`.
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },
    /// A required input is missing, empty or malformed.
    InvalidArgument(String),
    /// The operation is not defined for this network, e.g. a single output call on a network with
    /// many output neurons.
    UnsupportedOperation(String),
    /// The training log sink failed.
    Io(io::Error),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::Configuration(msg) => write!(f, "invalid network configuration: {msg}"),
            MlErr::DimensionMismatch { op, left, right } => write!(
                f,
                "cannot {op} a {}x{} matrix with a {}x{} matrix",
                left.0, left.1, right.0, right.1
            ),
            MlErr::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            MlErr::UnsupportedOperation(msg) => write!(f, "unsupported operation: {msg}"),
            MlErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}
