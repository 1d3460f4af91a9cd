//! Configuration of signature construction.
use lsh::{HashFamily, MinHasher, PRIME};

use crate::errors::{FindSimpairsError, Result};

/// Default output range `m` of hash values.
pub const DEFAULT_RANGE: u64 = 10007;

/// Default seed value.
pub const DEFAULT_SEED: u64 = 42;

/// Default signature length.
pub const DEFAULT_NUM_HASHES: usize = 100;

/// Parameters determining a family of signatures.
///
/// Signatures built from equal configurations are comparable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MinHashConfig {
    num_hashes: usize,
    range: u64,
    seed: u64,
    prime: u64,
}

impl Default for MinHashConfig {
    fn default() -> Self {
        Self {
            num_hashes: DEFAULT_NUM_HASHES,
            range: DEFAULT_RANGE,
            seed: DEFAULT_SEED,
            prime: PRIME,
        }
    }
}

impl MinHashConfig {
    /// Creates a default configuration with `num_hashes` hash functions.
    pub fn new(num_hashes: usize) -> Self {
        Self::default().num_hashes(num_hashes)
    }

    /// Sets the signature length `t`.
    pub const fn num_hashes(mut self, num_hashes: usize) -> Self {
        self.num_hashes = num_hashes;
        self
    }

    /// Sets the output range `m` of hash values.
    pub const fn range(mut self, range: u64) -> Self {
        self.range = range;
        self
    }

    /// Sets the seed value.
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the prime modulus.
    pub const fn prime(mut self, prime: u64) -> Self {
        self.prime = prime;
        self
    }

    /// Gets the signature length.
    pub const fn get_num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Gets the output range.
    pub const fn get_range(&self) -> u64 {
        self.range
    }

    /// Gets the seed value.
    pub const fn get_seed(&self) -> u64 {
        self.seed
    }

    /// Gets the prime modulus.
    pub const fn get_prime(&self) -> u64 {
        self.prime
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.num_hashes == 0 {
            return Err(FindSimpairsError::input("The number of hashes must not be 0."));
        }
        if self.range == 0 {
            return Err(FindSimpairsError::input("The range of hash values must not be 0."));
        }
        if self.prime < 2 {
            return Err(FindSimpairsError::input("The prime must be at least 2."));
        }
        Ok(())
    }

    /// Builds the hasher described by this configuration.
    pub fn hasher(&self) -> Result<MinHasher> {
        self.validate()?;
        let family = HashFamily::generate(self.num_hashes, self.seed, self.prime)?;
        Ok(MinHasher::new(family, self.range)?)
    }
}
