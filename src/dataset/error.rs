use std::{error::Error, fmt, io, path::PathBuf};

/// Errors produced while preparing the sample batches.
#[derive(Debug)]
pub enum DataErr {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    /// A walk recording line is not made of three comma separated numbers.
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    /// The split ratios are out of range or don't sum up to one.
    InvalidRatios {
        train: f64,
        test: f64,
        validation: f64,
    },
    /// There is nothing to work with.
    Empty(String),
}

impl fmt::Display for DataErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataErr::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            DataErr::Parse { path, line, reason } => {
                write!(f, "{}:{line}: {reason}", path.display())
            }
            DataErr::InvalidRatios {
                train,
                test,
                validation,
            } => write!(
                f,
                "ratios of train {train}, test {test} and validation {validation} data have to be in [0, 1] and sum up to 1"
            ),
            DataErr::Empty(msg) => write!(f, "no data: {msg}"),
        }
    }
}

impl Error for DataErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DataErr::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
