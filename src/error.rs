use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures outside the search itself: loading, configuration and thread setup.
///
/// Every outcome of an expansion is an [`ExpandStatus`](crate::ExpandStatus), never an `Error`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0} collection has no transactions")]
    EmptyCollection(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("worker thread failure: {0}")]
    Thread(String),
}

pub type Result<T> = std::result::Result<T, Error>;
