//! Locality-sensitive hashing by banding signatures.
//!
//! A signature of length `t = bands * rows` is cut into `bands` contiguous windows of
//! `rows` values. Two entities become a candidate pair if they agree on every value of
//! at least one window, which happens with probability `1 - (1 - s^rows)^bands` for
//! entities of Jaccard similarity `s`.
use std::hash::Hash;
use std::ops::Range;

use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;

use crate::errors::{check_similarity, BandJoinError, Result};
use crate::matrix::{ordered_pair, SignatureMatrix};

/// Banding parameters: the number of bands and the rows per band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LshParams {
    bands: usize,
    rows: usize,
}

impl LshParams {
    /// Creates an instance. Both values must be positive.
    pub const fn new(bands: usize, rows: usize) -> Result<Self> {
        if bands == 0 || rows == 0 {
            return Err(BandJoinError::InvalidParams { bands, rows });
        }
        Ok(Self { bands, rows })
    }

    /// Gets the number of bands, `r`.
    pub const fn bands(&self) -> usize {
        self.bands
    }

    /// Gets the number of rows per band, `b`.
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Gets the signature length the banding covers.
    pub const fn signature_len(&self) -> usize {
        self.bands * self.rows
    }

    /// Probability that a pair of similarity `s` becomes a candidate.
    pub fn probability(&self, s: f64) -> Result<f64> {
        lsh_probability(s, self.bands, self.rows)
    }

    /// Slope of [`Self::probability()`] at `s`.
    pub fn slope(&self, s: f64) -> f64 {
        crate::params::lsh_slope(s, self.bands, self.rows)
    }

    /// Column windows of the bands in increasing order.
    pub fn band_ranges(&self) -> impl Iterator<Item = Range<usize>> {
        let rows = self.rows;
        (0..self.bands).map(move |i| i * rows..(i + 1) * rows)
    }
}

/// Computes the candidate probability `f(s) = 1 - (1 - s^rows)^bands`.
///
/// # Examples
///
/// ```
/// use band_join::banding::lsh_probability;
///
/// assert_eq!(lsh_probability(1.0, 20, 5).unwrap(), 1.0);
/// assert_eq!(lsh_probability(0.0, 20, 5).unwrap(), 0.0);
/// assert!((lsh_probability(0.5, 1, 1).unwrap() - 0.5).abs() < 1e-12);
/// assert!(lsh_probability(1.5, 20, 5).is_err());
/// ```
pub fn lsh_probability(s: f64, bands: usize, rows: usize) -> Result<f64> {
    let s = check_similarity(s)?;
    Ok(1. - (1. - s.powf(rows as f64)).powf(bands as f64))
}

/// Unordered entity pairs that collided in at least one band, stored as
/// `(smaller id, larger id)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateSet<K>
where
    K: Hash + Eq,
{
    pairs: HashSet<(K, K)>,
}

impl<K> Default for CandidateSet<K>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self {
            pairs: HashSet::new(),
        }
    }
}

impl<K> CandidateSet<K>
where
    K: Ord + Hash + Clone,
{
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pair in either order, returning `true` if it was not present.
    pub fn insert(&mut self, x: K, y: K) -> bool {
        self.pairs.insert(ordered_pair(x, y))
    }

    /// Checks if the pair is present, in either order.
    pub fn contains(&self, x: &K, y: &K) -> bool {
        let pair = ordered_pair(x.clone(), y.clone());
        self.pairs.contains(&pair)
    }

    /// Gets the number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Checks if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Creates an iterator over the pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &(K, K)> + '_ {
        self.pairs.iter()
    }

    /// Gets the underlying set.
    pub const fn as_set(&self) -> &HashSet<(K, K)> {
        &self.pairs
    }

    /// Converts into the pairs sorted ascending.
    pub fn into_sorted_vec(self) -> Vec<(K, K)> {
        let mut pairs: Vec<_> = self.pairs.into_iter().collect();
        pairs.sort_unstable();
        pairs
    }

    /// Moves all pairs of `other` into this set.
    pub fn merge(&mut self, other: Self) {
        if self.pairs.len() < other.pairs.len() {
            let mut other = other;
            other.pairs.extend(self.pairs.drain());
            *self = other;
        } else {
            self.pairs.extend(other.pairs);
        }
    }
}

impl<K> FromIterator<(K, K)> for CandidateSet<K>
where
    K: Ord + Hash + Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, K)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (x, y) in iter {
            set.insert(x, y);
        }
        set
    }
}

impl<K> IntoIterator for CandidateSet<K>
where
    K: Hash + Eq,
{
    type Item = (K, K);
    type IntoIter = hashbrown::hash_set::IntoIter<(K, K)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

/// Groups rows by their exact values inside one band window.
/// Each returned bucket lists the rows sharing one window, in row order.
pub fn band_buckets<K>(matrix: &SignatureMatrix<K>, window: Range<usize>) -> Vec<Vec<usize>>
where
    K: Ord + Hash + Clone,
{
    let mut buckets: HashMap<&[u64], Vec<usize>> = HashMap::new();
    for i in 0..matrix.num_entities() {
        buckets
            .entry(&matrix.row(i)[window.clone()])
            .or_insert_with(Vec::new)
            .push(i);
    }
    buckets.into_values().collect()
}

/// Collects candidate pairs of all bands.
///
/// # Examples
///
/// ```
/// use band_join::banding::{candidate_pairs, LshParams};
/// use band_join::SignatureMatrix;
///
/// let mut matrix = SignatureMatrix::new(4);
/// matrix.add(1, [5, 6, 1, 2]).unwrap();
/// matrix.add(2, [5, 6, 3, 4]).unwrap();
/// matrix.add(3, [7, 6, 8, 4]).unwrap();
///
/// let candidates = candidate_pairs(&matrix, LshParams::new(2, 2).unwrap()).unwrap();
/// assert_eq!(candidates.into_sorted_vec(), vec![(1, 2)]);
/// ```
pub fn candidate_pairs<K>(
    matrix: &SignatureMatrix<K>,
    params: LshParams,
) -> Result<CandidateSet<K>>
where
    K: Ord + Hash + Clone,
{
    check_params(matrix, params)?;
    let mut candidates = CandidateSet::new();
    for (band, window) in params.band_ranges().enumerate() {
        band_candidates(matrix, window, &mut candidates);
        tracing::debug!(
            "[candidate_pairs] Processed band {}/{}, #candidates={}",
            band + 1,
            params.bands(),
            candidates.len()
        );
    }
    Ok(candidates)
}

/// Parallel version of [`candidate_pairs()`], bucketing bands on the rayon pool.
pub fn candidate_pairs_in_parallel<K>(
    matrix: &SignatureMatrix<K>,
    params: LshParams,
) -> Result<CandidateSet<K>>
where
    K: Ord + Hash + Clone + Send + Sync,
{
    check_params(matrix, params)?;
    let candidates = params
        .band_ranges()
        .collect::<Vec<_>>()
        .into_par_iter()
        .fold(CandidateSet::new, |mut acc, window| {
            band_candidates(matrix, window, &mut acc);
            acc
        })
        .reduce(CandidateSet::new, |mut x, y| {
            x.merge(y);
            x
        });
    tracing::debug!("[candidate_pairs_in_parallel] #candidates={}", candidates.len());
    Ok(candidates)
}

fn check_params<K>(matrix: &SignatureMatrix<K>, params: LshParams) -> Result<()>
where
    K: Ord + Hash + Clone,
{
    if params.signature_len() != matrix.signature_len() {
        return Err(BandJoinError::ParamMismatch {
            bands: params.bands(),
            rows: params.rows(),
            length: matrix.signature_len(),
        });
    }
    Ok(())
}

fn band_candidates<K>(
    matrix: &SignatureMatrix<K>,
    window: Range<usize>,
    candidates: &mut CandidateSet<K>,
) where
    K: Ord + Hash + Clone,
{
    let ids = matrix.ids();
    for bucket in band_buckets(matrix, window) {
        for (k, &i) in bucket.iter().enumerate() {
            for &j in &bucket[k + 1..] {
                candidates.insert(ids[i].clone(), ids[j].clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Entities 1 and 2 share band 0; 3 and 4 collide with nobody.
    fn example_matrix() -> SignatureMatrix<u32> {
        let mut matrix = SignatureMatrix::new(6);
        matrix.add(1, [4, 4, 0, 1, 2, 3]).unwrap();
        matrix.add(2, [4, 4, 9, 8, 7, 6]).unwrap();
        matrix.add(3, [5, 4, 1, 1, 3, 3]).unwrap();
        matrix.add(4, [4, 5, 0, 2, 2, 4]).unwrap();
        matrix
    }

    #[test]
    fn test_shared_first_band() {
        let matrix = example_matrix();
        let candidates = candidate_pairs(&matrix, LshParams::new(3, 2).unwrap()).unwrap();
        assert_eq!(candidates.into_sorted_vec(), vec![(1, 2)]);
    }

    #[test]
    fn test_single_band_requires_full_match() {
        let matrix = example_matrix();
        let candidates = candidate_pairs(&matrix, LshParams::new(1, 6).unwrap()).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_single_row_bands() {
        let matrix = example_matrix();
        let candidates = candidate_pairs(&matrix, LshParams::new(6, 1).unwrap()).unwrap();
        let expected = vec![(1, 2), (1, 3), (1, 4), (2, 3), (2, 4)];
        assert_eq!(candidates.into_sorted_vec(), expected);
    }

    #[test]
    fn test_identical_signatures_always_candidates() {
        let mut matrix = SignatureMatrix::new(12);
        let sig = [3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5, 8];
        matrix.add("x", sig).unwrap();
        matrix.add("y", sig).unwrap();
        for (bands, rows) in [(1, 12), (2, 6), (3, 4), (4, 3), (6, 2), (12, 1)] {
            let params = LshParams::new(bands, rows).unwrap();
            let candidates = candidate_pairs(&matrix, params).unwrap();
            assert!(candidates.contains(&"y", &"x"));
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let matrix = example_matrix();
        for (bands, rows) in [(1, 6), (2, 3), (3, 2), (6, 1)] {
            let params = LshParams::new(bands, rows).unwrap();
            assert_eq!(
                candidate_pairs(&matrix, params).unwrap(),
                candidate_pairs_in_parallel(&matrix, params).unwrap()
            );
        }
    }

    #[test]
    fn test_param_mismatch() {
        let matrix = example_matrix();
        let params = LshParams::new(2, 2).unwrap();
        assert_eq!(
            candidate_pairs(&matrix, params),
            Err(BandJoinError::ParamMismatch {
                bands: 2,
                rows: 2,
                length: 6
            })
        );
    }

    #[test]
    fn test_invalid_params() {
        assert_eq!(
            LshParams::new(0, 4),
            Err(BandJoinError::InvalidParams { bands: 0, rows: 4 })
        );
    }

    #[test]
    fn test_band_ranges() {
        let params = LshParams::new(3, 4).unwrap();
        assert_eq!(params.band_ranges().collect::<Vec<_>>(), vec![0..4, 4..8, 8..12]);
    }

    #[test]
    fn test_band_buckets() {
        let matrix = example_matrix();
        let mut buckets = band_buckets(&matrix, 0..2);
        buckets.sort();
        assert_eq!(buckets, vec![vec![0, 1], vec![2], vec![3]]);
    }

    #[test]
    fn test_candidate_set() {
        let mut x: CandidateSet<u32> = [(2, 1), (3, 4)].into_iter().collect();
        assert!(x.contains(&1, &2));
        assert!(!x.insert(1, 2));
        let y: CandidateSet<u32> = [(1, 2), (5, 6), (7, 8)].into_iter().collect();
        x.merge(y);
        assert_eq!(x.into_sorted_vec(), vec![(1, 2), (3, 4), (5, 6), (7, 8)]);
    }

    #[test]
    fn test_probability_law() {
        let params = LshParams::new(20, 5).unwrap();
        let s: f64 = 0.6;
        let expected = 1. - (1. - s.powi(5)).powi(20);
        assert!((params.probability(s).unwrap() - expected).abs() < 1e-12);
    }
}
