//! Seeded families of affine hash functions.
use rand::Rng;
use rand_xoshiro::rand_core::SeedableRng;

use crate::errors::{LshError, Result};

/// The smallest prime above `2^32`, used as the default modulus.
pub const PRIME: u64 = 4_294_967_311;

/// Affine hash function `h(x) = ((a*x + b) mod prime) mod m`.
///
/// Two functions with the same `(a, b, prime)` are interchangeable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HashFunction {
    a: u64,
    b: u64,
    prime: u64,
}

impl HashFunction {
    /// Creates a hash function, checking `a in [1, prime)` and `b in [0, prime)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lsh::hash_family::HashFunction;
    ///
    /// let h = HashFunction::new(3, 5, 11).unwrap();
    /// assert_eq!(h.apply(4, 7), (3 * 4 + 5) % 11 % 7);
    /// assert!(HashFunction::new(0, 5, 11).is_err());
    /// ```
    pub const fn new(a: u64, b: u64, prime: u64) -> Result<Self> {
        if prime < 2 {
            return Err(LshError::InvalidPrime(prime));
        }
        if a == 0 || a >= prime || b >= prime {
            return Err(LshError::InvalidCoefficients { a, b, prime });
        }
        Ok(Self { a, b, prime })
    }

    /// Gets the multiplier.
    pub const fn a(&self) -> u64 {
        self.a
    }

    /// Gets the offset.
    pub const fn b(&self) -> u64 {
        self.b
    }

    /// Gets the modulus.
    pub const fn prime(&self) -> u64 {
        self.prime
    }

    /// Maps `x` into `[0, m)`. `m` must not be 0.
    #[inline(always)]
    pub fn apply(&self, x: u64, m: u64) -> u64 {
        debug_assert_ne!(m, 0);
        // 128-bit intermediate so that a 64-bit x never overflows.
        let h = (u128::from(self.a) * u128::from(x) + u128::from(self.b)) % u128::from(self.prime);
        (h as u64) % m
    }
}

/// An ordered, immutable sequence of independently drawn [`HashFunction`]s.
///
/// The `i`-th function is the `i`-th pair of draws from a generator seeded once,
/// so it depends only on `(seed, prime, i)`: a family of 10 functions starts with
/// the family of 5 functions built from the same seed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashFamily {
    functions: Vec<HashFunction>,
    prime: u64,
}

impl HashFamily {
    /// Generates `count` hash functions modulo `prime` from `seed`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lsh::hash_family::{HashFamily, PRIME};
    ///
    /// let x = HashFamily::generate(5, 42, PRIME).unwrap();
    /// let y = HashFamily::generate(5, 42, PRIME).unwrap();
    /// assert_eq!(x, y);
    /// assert_eq!(x.len(), 5);
    /// ```
    pub fn generate(count: usize, seed: u64, prime: u64) -> Result<Self> {
        Self::from_rng(count, prime, rand_xoshiro::SplitMix64::seed_from_u64(seed))
    }

    /// Generates `count` hash functions modulo `prime`, drawing `(a, b)` pairs in order
    /// from the given generator.
    pub fn from_rng<R>(count: usize, prime: u64, mut rng: R) -> Result<Self>
    where
        R: Rng,
    {
        if prime < 2 {
            return Err(LshError::InvalidPrime(prime));
        }
        let mut functions = Vec::with_capacity(count);
        for _ in 0..count {
            let a = rng.gen_range(1..prime);
            let b = rng.gen_range(0..prime);
            functions.push(HashFunction { a, b, prime });
        }
        Ok(Self { functions, prime })
    }

    /// Builds a family from explicit functions sharing the same modulus.
    pub fn from_functions(functions: Vec<HashFunction>) -> Result<Self> {
        let prime = functions.first().map_or(PRIME, HashFunction::prime);
        if let Some(f) = functions.iter().find(|f| f.prime != prime) {
            return Err(LshError::InvalidPrime(f.prime));
        }
        Ok(Self { functions, prime })
    }

    /// Gets the functions in order.
    pub fn functions(&self) -> &[HashFunction] {
        &self.functions
    }

    /// Gets the `i`-th function.
    pub fn get(&self, i: usize) -> Option<&HashFunction> {
        self.functions.get(i)
    }

    /// Gets the common modulus.
    pub const fn prime(&self) -> u64 {
        self.prime
    }

    /// Gets the number of functions, i.e., the signature length.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Checks if the family has no functions.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Creates an iterator over the functions.
    pub fn iter(&self) -> std::slice::Iter<'_, HashFunction> {
        self.functions.iter()
    }
}

impl<'a> IntoIterator for &'a HashFamily {
    type Item = &'a HashFunction;
    type IntoIter = std::slice::Iter<'a, HashFunction>;

    fn into_iter(self) -> Self::IntoIter {
        self.functions.iter()
    }
}
