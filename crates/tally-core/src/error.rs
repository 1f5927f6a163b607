use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("error opening stats file '{path}' for writing: {source}")]
    StatsFileOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error opening trace file '{path}' for writing: {source}")]
    TraceFileOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
