use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading the interval file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot open file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No intervals loaded from {}. Check your interval file.", path.display())]
    Empty { path: PathBuf },
}

#[derive(Error, Debug)]
pub enum TimerError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Display error: {0}")]
    Display(#[from] std::io::Error),

    #[error("Cannot open display: standard output is not a terminal")]
    NotATerminal,
}
