//! Error definitions.
use std::{io, result};

use band_join::errors::BandJoinError;
use lsh::errors::LshError;
use thiserror::Error;

/// A specialized Result type for this library.
pub type Result<T, E = FindSimpairsError> = result::Result<T, E>;

/// Errors in this library.
#[derive(Debug, Error)]
pub enum FindSimpairsError {
    /// Contains [`InputError`].
    #[error(transparent)]
    Input(#[from] InputError),

    /// Contains [`LshError`].
    #[error(transparent)]
    Lsh(#[from] LshError),

    /// Contains [`BandJoinError`].
    #[error(transparent)]
    BandJoin(#[from] BandJoinError),

    /// A data file could not be read.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A line of a data file is malformed.
    #[error("ParseError: line {line}: {msg}")]
    Parse {
        /// 1-origin line number.
        line: usize,
        /// Description.
        msg: String,
    },
}

impl FindSimpairsError {
    pub(crate) const fn input(msg: &'static str) -> Self {
        Self::Input(InputError { msg })
    }
}

/// Error used when the input argument is invalid.
#[derive(Debug, Error)]
#[error("InputError: {msg}")]
pub struct InputError {
    msg: &'static str,
}
