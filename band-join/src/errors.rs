//! Error definitions.
use std::result;

use lsh::errors::LshError;
use thiserror::Error;

/// A specialized Result type for this library.
pub type Result<T, E = BandJoinError> = result::Result<T, E>;

/// Errors in this library.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BandJoinError {
    /// The banding does not cover the signatures exactly.
    #[error("InputError: {bands} bands x {rows} rows must equal the signature length {length}.")]
    ParamMismatch {
        /// Number of bands.
        bands: usize,
        /// Rows per band.
        rows: usize,
        /// Signature length.
        length: usize,
    },

    /// Bands or rows per band is zero.
    #[error("InputError: bands ({bands}) and rows ({rows}) must be positive.")]
    InvalidParams {
        /// Number of bands.
        bands: usize,
        /// Rows per band.
        rows: usize,
    },

    /// A signature added to a matrix has the wrong length.
    #[error("InputError: the signature must include {expected} values, got {actual}.")]
    LengthMismatch {
        /// Signature length of the matrix.
        expected: usize,
        /// Length of the input.
        actual: usize,
    },

    /// An entity identifier is added twice.
    #[error("InputError: entity identifiers must be unique.")]
    DuplicateEntity,

    /// A similarity argument is outside `[0, 1]`.
    #[error("InputError: similarity must be in [0, 1], got {0}.")]
    InvalidSimilarity(f64),

    /// No banding exists for the signature length.
    #[error("InputError: no valid banding for signature length {0}.")]
    NoValidParams(usize),

    /// Contains [`LshError`].
    #[error(transparent)]
    Lsh(#[from] LshError),
}

/// Checks that a similarity lies in `[0, 1]`, returning it unchanged.
///
/// # Examples
///
/// ```
/// use band_join::errors::{check_similarity, BandJoinError};
///
/// assert_eq!(check_similarity(0.5), Ok(0.5));
/// assert_eq!(check_similarity(1.5), Err(BandJoinError::InvalidSimilarity(1.5)));
/// ```
pub fn check_similarity(s: f64) -> Result<f64> {
    if (0. ..=1.).contains(&s) {
        Ok(s)
    } else {
        Err(BandJoinError::InvalidSimilarity(s))
    }
}
