//! Error definitions.
use std::result;

use thiserror::Error;

/// A specialized Result type for this library.
pub type Result<T, E = LshError> = result::Result<T, E>;

/// Errors in this library.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LshError {
    /// Two signatures to be compared have different lengths.
    #[error("InputError: signatures must have the same length ({lhs} vs {rhs}).")]
    LengthMismatch {
        /// Length of the left-hand signature.
        lhs: usize,
        /// Length of the right-hand signature.
        rhs: usize,
    },

    /// The modulus of a hash function is not usable.
    #[error("InputError: prime must be at least 2, got {0}.")]
    InvalidPrime(u64),

    /// The output range of hash values is empty.
    #[error("InputError: range of hash values must not be 0.")]
    InvalidRange,

    /// Coefficients of a hash function are out of `a in [1, prime)`, `b in [0, prime)`.
    #[error("InputError: coefficients (a={a}, b={b}) are out of range for prime {prime}.")]
    InvalidCoefficients {
        /// Multiplier.
        a: u64,
        /// Offset.
        b: u64,
        /// Modulus.
        prime: u64,
    },
}
