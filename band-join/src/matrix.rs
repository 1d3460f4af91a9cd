//! Row-major storage of signatures keyed by entity identifiers.
use std::hash::Hash;

use hashbrown::HashMap;
use lsh::similarity::count_matches;
use rayon::prelude::*;

use crate::errors::{check_similarity, BandJoinError, Result};

/// Orders a pair of identifiers ascending.
#[inline(always)]
pub fn ordered_pair<K>(x: K, y: K) -> (K, K)
where
    K: Ord,
{
    if x <= y {
        (x, y)
    } else {
        (y, x)
    }
}

/// Signatures of many entities, row-aligned so that column `k` of every row
/// comes from the same hash function.
#[derive(Clone, Debug)]
pub struct SignatureMatrix<K> {
    ids: Vec<K>,
    index: HashMap<K, usize>,
    values: Vec<u64>,
    length: usize,
    shows_progress: bool,
}

impl<K> SignatureMatrix<K>
where
    K: Ord + Hash + Clone,
{
    /// Creates an empty matrix of signatures with `length` values.
    pub fn new(length: usize) -> Self {
        Self {
            ids: vec![],
            index: HashMap::new(),
            values: vec![],
            length,
            shows_progress: false,
        }
    }

    /// Logs the progress of joins?
    pub const fn shows_progress(mut self, yes: bool) -> Self {
        self.shows_progress = yes;
        self
    }

    /// Appends the signature of entity `id`.
    ///
    /// The input must yield exactly [`Self::signature_len()`] values. On error the
    /// matrix is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use band_join::SignatureMatrix;
    ///
    /// let mut matrix = SignatureMatrix::new(3);
    /// matrix.add("a", [1, 2, 3]).unwrap();
    /// assert!(matrix.add("b", [1, 2]).is_err());
    /// assert!(matrix.add("a", [4, 5, 6]).is_err());
    /// assert_eq!(matrix.num_entities(), 1);
    /// ```
    pub fn add<I>(&mut self, id: K, signature: I) -> Result<()>
    where
        I: IntoIterator<Item = u64>,
    {
        if self.index.contains_key(&id) {
            return Err(BandJoinError::DuplicateEntity);
        }
        let start = self.values.len();
        self.values.extend(signature);
        let actual = self.values.len() - start;
        if actual != self.length {
            self.values.truncate(start);
            return Err(BandJoinError::LengthMismatch {
                expected: self.length,
                actual,
            });
        }
        self.index.insert(id.clone(), self.ids.len());
        self.ids.push(id);
        Ok(())
    }

    /// Gets the signature length.
    pub const fn signature_len(&self) -> usize {
        self.length
    }

    /// Gets the number of stored signatures.
    pub fn num_entities(&self) -> usize {
        self.ids.len()
    }

    /// Checks if the matrix is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Gets the identifiers in row order.
    pub fn ids(&self) -> &[K] {
        &self.ids
    }

    /// Gets the signature at row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is not less than [`Self::num_entities()`]. Use [`Self::get()`]
    /// to look up by identifier instead.
    #[inline(always)]
    pub fn row(&self, i: usize) -> &[u64] {
        &self.values[i * self.length..(i + 1) * self.length]
    }

    /// Gets the signature of entity `id`.
    pub fn get(&self, id: &K) -> Option<&[u64]> {
        self.index.get(id).map(|&i| self.row(i))
    }

    /// Gets the row of entity `id`.
    pub fn position(&self, id: &K) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Creates an iterator over `(id, signature)` in row order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[u64])> + '_ {
        self.ids.iter().enumerate().map(|(i, id)| (id, self.row(i)))
    }

    /// Estimates the Jaccard similarity of rows `i` and `j`.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is not less than [`Self::num_entities()`]. Rows of
    /// identifiers are given by [`Self::position()`].
    #[inline(always)]
    pub fn estimate(&self, i: usize, j: usize) -> f64 {
        if self.length == 0 {
            return 1.;
        }
        count_matches(self.row(i), self.row(j)) as f64 / self.length as f64
    }

    /// Finds all pairs whose estimated similarity is at least `threshold` by comparing
    /// every pair of rows, returning triplets of the smaller id, the larger id, and the
    /// estimate, sorted by ids.
    ///
    /// # Examples
    ///
    /// ```
    /// use band_join::SignatureMatrix;
    ///
    /// let mut matrix = SignatureMatrix::new(4);
    /// matrix.add(2, [1, 2, 3, 4]).unwrap();
    /// matrix.add(1, [1, 2, 3, 0]).unwrap();
    /// matrix.add(3, [9, 9, 9, 9]).unwrap();
    /// assert_eq!(matrix.similar_pairs(0.5).unwrap(), vec![(1, 2, 0.75)]);
    /// ```
    pub fn similar_pairs(&self, threshold: f64) -> Result<Vec<(K, K, f64)>> {
        let threshold = check_similarity(threshold)?;
        let n = self.num_entities();
        let mut matched = vec![];
        for i in 0..n {
            if self.shows_progress && (i + 1) % 1000 == 0 {
                tracing::info!("[SignatureMatrix::similar_pairs] Processed {}/{}...", i + 1, n);
            }
            self.collect_similar(i, threshold, &mut matched);
        }
        Ok(self.finish(matched))
    }

    /// Parallel version of [`Self::similar_pairs()`], splitting the work by left rows.
    pub fn similar_pairs_in_parallel(&self, threshold: f64) -> Result<Vec<(K, K, f64)>>
    where
        K: Send + Sync,
    {
        let threshold = check_similarity(threshold)?;
        let matched = (0..self.num_entities())
            .into_par_iter()
            .fold(Vec::new, |mut acc, i| {
                self.collect_similar(i, threshold, &mut acc);
                acc
            })
            .reduce(Vec::new, |mut x, y| {
                x.extend(y);
                x
            });
        Ok(self.finish(matched))
    }

    /// Gets the memory usage of the signature values in bytes.
    pub fn memory_in_bytes(&self) -> usize {
        self.values.len() * std::mem::size_of::<u64>()
    }

    fn collect_similar(&self, i: usize, threshold: f64, matched: &mut Vec<(K, K, f64)>) {
        for j in i + 1..self.num_entities() {
            let sim = self.estimate(i, j);
            if sim >= threshold {
                let (x, y) = ordered_pair(self.ids[i].clone(), self.ids[j].clone());
                matched.push((x, y, sim));
            }
        }
    }

    fn finish(&self, mut matched: Vec<(K, K, f64)>) -> Vec<(K, K, f64)> {
        matched.sort_unstable_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        if self.shows_progress {
            tracing::info!("[SignatureMatrix::similar_pairs] #matched={}", matched.len());
        }
        matched
    }
}
