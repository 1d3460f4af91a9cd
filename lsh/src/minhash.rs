//! MinHash signatures over a [`HashFamily`].
use std::ops::Deref;

use crate::errors::{LshError, Result};
use crate::hash_family::HashFamily;
use crate::Item;

/// Fixed-length sequence of per-function minima, each in `[0, m]`.
///
/// The value `m` appears only for an empty set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature(Vec<u64>);

impl Signature {
    /// Wraps raw values.
    pub fn new(values: Vec<u64>) -> Self {
        Self(values)
    }

    /// Gets the values.
    pub fn values(&self) -> &[u64] {
        &self.0
    }

    /// Estimates the Jaccard similarity to the other signature.
    pub fn estimate_jaccard(&self, other: &Self) -> Result<f64> {
        crate::similarity::estimate_jaccard(&self.0, &other.0)
    }

    /// Unwraps the values.
    pub fn into_inner(self) -> Vec<u64> {
        self.0
    }
}

impl Deref for Signature {
    type Target = [u64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u64>> for Signature {
    fn from(values: Vec<u64>) -> Self {
        Self(values)
    }
}

/// Builds MinHash signatures with a fixed hash family and output range `m`.
///
/// Signatures are comparable only if they come from the same hasher.
#[derive(Clone, Debug)]
pub struct MinHasher {
    family: HashFamily,
    range: u64,
}

impl MinHasher {
    /// Creates an instance mapping hash values into `[0, range)`.
    pub fn new(family: HashFamily, range: u64) -> Result<Self> {
        if range == 0 {
            return Err(LshError::InvalidRange);
        }
        Ok(Self { family, range })
    }

    /// Computes the signature of a set of items.
    ///
    /// Strings are pre-hashed with [`crate::hash_token`]; integers are used as they are.
    ///
    /// # Examples
    ///
    /// ```
    /// use lsh::hash_family::{HashFamily, PRIME};
    /// use lsh::minhash::MinHasher;
    ///
    /// let hasher = MinHasher::new(HashFamily::generate(4, 42, PRIME).unwrap(), 10007).unwrap();
    /// let x = hasher.signature(["the", "cat"]);
    /// let y = hasher.signature(["cat", "the"]);
    /// assert_eq!(x, y);
    ///
    /// let empty = hasher.signature(Vec::<u64>::new());
    /// assert_eq!(empty.values(), &[10007; 4]);
    /// ```
    pub fn signature<I, T>(&self, items: I) -> Signature
    where
        I: IntoIterator<Item = T>,
        T: Item,
    {
        let mut features: Vec<u64> = items.into_iter().map(|item| item.to_feature()).collect();
        features.sort_unstable();
        features.dedup();
        self.signature_from_features(&features)
    }

    /// Computes the signature of already hashed (or native integer) features.
    pub fn signature_from_features(&self, features: &[u64]) -> Signature {
        Signature(self.iter(features).collect())
    }

    /// Creates an iterator yielding the minimum for each hash function in order.
    pub fn iter<'a>(&'a self, features: &'a [u64]) -> MinHashIter<'a> {
        MinHashIter {
            features,
            functions: self.family.functions().iter(),
            range: self.range,
        }
    }

    /// Gets the hash family.
    pub const fn family(&self) -> &HashFamily {
        &self.family
    }

    /// Gets the output range `m`, which is also the empty-set sentinel.
    pub const fn range(&self) -> u64 {
        self.range
    }

    /// Gets the signature length.
    pub fn num_hashes(&self) -> usize {
        self.family.len()
    }
}

/// Iterator created by [`MinHasher::iter`].
pub struct MinHashIter<'a> {
    features: &'a [u64],
    functions: std::slice::Iter<'a, crate::hash_family::HashFunction>,
    range: u64,
}

impl<'a> Iterator for MinHashIter<'a> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        let h = self.functions.next()?;
        let range = self.range;
        Some(
            self.features
                .iter()
                .map(|&x| h.apply(x, range))
                .min()
                .unwrap_or(range),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.functions.size_hint()
    }
}

impl<'a> ExactSizeIterator for MinHashIter<'a> {}

/// Estimates the Jaccard similarity of two sets with a fresh family of `num_hashes`
/// functions drawn from `seed`.
///
/// # Examples
///
/// ```
/// use lsh::minhash::approximate_jaccard;
///
/// let x = ["ab", "bc", "cd"];
/// let est = approximate_jaccard(x, x, 20, 10007, 42).unwrap();
/// assert_eq!(est, 1.0);
/// ```
pub fn approximate_jaccard<I, J, T>(
    lhs: I,
    rhs: J,
    num_hashes: usize,
    range: u64,
    seed: u64,
) -> Result<f64>
where
    I: IntoIterator<Item = T>,
    J: IntoIterator<Item = T>,
    T: Item,
{
    let family = HashFamily::generate(num_hashes, seed, crate::hash_family::PRIME)?;
    let hasher = MinHasher::new(family, range)?;
    hasher.signature(lhs).estimate_jaccard(&hasher.signature(rhs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_family::{HashFunction, PRIME};

    fn hasher(t: usize, m: u64) -> MinHasher {
        MinHasher::new(HashFamily::generate(t, 42, PRIME).unwrap(), m).unwrap()
    }

    #[test]
    fn test_minimum_per_function() {
        let f = HashFunction::new(3, 1, 11).unwrap();
        let g = HashFunction::new(5, 2, 11).unwrap();
        let hasher = MinHasher::new(HashFamily::from_functions(vec![f, g]).unwrap(), 7).unwrap();
        let sig = hasher.signature_from_features(&[1, 2, 4]);
        // f: 4, 7, 13%11=2 -> mod 7: 4, 0, 2. g: 7, 12%11=1, 22%11=0 -> mod 7: 0, 1, 0.
        assert_eq!(sig.values(), &[0, 0]);
    }

    #[test]
    fn test_empty_sentinel() {
        let hasher = hasher(8, 10007);
        let empty = hasher.signature(Vec::<String>::new());
        assert_eq!(empty.values(), &[10007; 8]);

        let sig = hasher.signature(["a"]);
        assert!(sig.iter().all(|&v| v < 10007));
        assert_eq!(empty.estimate_jaccard(&sig).unwrap(), 0.0);
        assert_eq!(empty.estimate_jaccard(&empty).unwrap(), 1.0);
    }

    #[test]
    fn test_duplicates_ignored() {
        let hasher = hasher(16, 10007);
        assert_eq!(
            hasher.signature(["x", "y", "x"]),
            hasher.signature(["y", "x"])
        );
    }

    #[test]
    fn test_native_integers() {
        let hasher = hasher(16, 10007);
        assert_eq!(
            hasher.signature([5u64, 9, 1]),
            hasher.signature_from_features(&[1, 5, 9])
        );
    }

    #[test]
    fn test_iter_len() {
        let hasher = hasher(12, 10007);
        assert_eq!(hasher.iter(&[1, 2, 3]).len(), 12);
        assert_eq!(hasher.num_hashes(), 12);
    }

    #[test]
    fn test_invalid_range() {
        let family = HashFamily::generate(4, 42, PRIME).unwrap();
        assert_eq!(MinHasher::new(family, 0).unwrap_err(), LshError::InvalidRange);
    }

    #[test]
    fn test_approximate_disjoint() {
        let x: Vec<u64> = (0..200).collect();
        let y: Vec<u64> = (1000..1200).collect();
        let est = approximate_jaccard(x, y, 200, 1 << 30, 1).unwrap();
        assert!(est < 0.05);
    }
}
