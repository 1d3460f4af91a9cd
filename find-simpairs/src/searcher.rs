//! Similar-pair search over sets of items.
use std::hash::Hash;

use band_join::banding::{candidate_pairs, candidate_pairs_in_parallel};
use band_join::errors::check_similarity;
use band_join::{CandidateSet, LshParams, SignatureMatrix};
use lsh::{Item, MinHasher};
use rayon::prelude::*;

use crate::config::MinHashConfig;
use crate::errors::Result;

/// Searcher in the Jaccard space using MinHash signatures.
pub struct SimilaritySearcher<K> {
    config: MinHashConfig,
    hasher: MinHasher,
    matrix: SignatureMatrix<K>,
    shows_progress: bool,
}

impl<K> SimilaritySearcher<K>
where
    K: Ord + Hash + Clone,
{
    /// Creates an instance with an empty database.
    pub fn new(config: MinHashConfig) -> Result<Self> {
        let hasher = config.hasher()?;
        let matrix = SignatureMatrix::new(hasher.num_hashes());
        Ok(Self {
            config,
            hasher,
            matrix,
            shows_progress: false,
        })
    }

    /// Shows the progress via the log?
    pub fn shows_progress(mut self, yes: bool) -> Self {
        self.shows_progress = yes;
        self.matrix = self.matrix.shows_progress(yes);
        self
    }

    /// Builds signatures of input entities, given as pairs of an identifier and its items.
    ///
    /// Identifiers must be unique. Empty item sets are allowed.
    ///
    /// # Examples
    ///
    /// ```
    /// use find_simpairs::{MinHashConfig, SimilaritySearcher};
    ///
    /// let searcher = SimilaritySearcher::new(MinHashConfig::new(64))
    ///     .unwrap()
    ///     .build_signatures([(1, vec![1u64, 2, 3]), (2, vec![1, 2, 3]), (3, vec![7, 8])])
    ///     .unwrap();
    /// assert_eq!(searcher.len(), 3);
    ///
    /// let pairs = searcher.search_similar_pairs(0.9).unwrap();
    /// assert_eq!(pairs, vec![(1, 2, 1.0)]);
    /// ```
    pub fn build_signatures<I, S, T>(mut self, entities: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, S)>,
        S: IntoIterator<Item = T>,
        T: Item,
    {
        for (i, (id, items)) in entities.into_iter().enumerate() {
            if self.shows_progress && (i + 1) % 1000 == 0 {
                tracing::info!("Processed {} entities...", i + 1);
            }
            let signature = self.hasher.signature(items);
            self.matrix.add(id, signature.into_inner())?;
        }
        Ok(self)
    }

    /// Parallel version of [`Self::build_signatures()`]. Rows keep the input order.
    pub fn build_signatures_in_parallel<I, S, T>(mut self, entities: I) -> Result<Self>
    where
        K: Send + Sync,
        I: IntoIterator<Item = (K, S)>,
        S: IntoIterator<Item = T> + Send,
        T: Item,
    {
        let entities: Vec<(K, S)> = entities.into_iter().collect();
        let hasher = &self.hasher;
        let mut signatures = Vec::with_capacity(entities.len());
        entities
            .into_par_iter()
            .map(|(id, items)| (id, hasher.signature(items)))
            .collect_into_vec(&mut signatures);
        for (id, signature) in signatures {
            self.matrix.add(id, signature.into_inner())?;
        }
        if self.shows_progress {
            tracing::info!("Processed {} entities", self.len());
        }
        Ok(self)
    }

    /// Finds all pairs whose estimated similarity is at least `threshold` by comparing
    /// all pairs of signatures.
    pub fn search_similar_pairs(&self, threshold: f64) -> Result<Vec<(K, K, f64)>>
    where
        K: Send + Sync,
    {
        Ok(self.matrix.similar_pairs_in_parallel(threshold)?)
    }

    /// Gets the candidate pairs of the banding.
    pub fn search_candidates(&self, params: LshParams) -> Result<CandidateSet<K>>
    where
        K: Send + Sync,
    {
        Ok(candidate_pairs_in_parallel(&self.matrix, params)?)
    }

    /// Finds candidate pairs of the banding whose estimated similarity is at least
    /// `threshold`, returning triplets sorted by ids.
    ///
    /// # Examples
    ///
    /// ```
    /// use band_join::LshParams;
    /// use find_simpairs::{MinHashConfig, SimilaritySearcher};
    ///
    /// let searcher = SimilaritySearcher::new(MinHashConfig::new(20))
    ///     .unwrap()
    ///     .build_signatures([("a", vec!["x", "y"]), ("b", vec!["y", "x"]), ("c", vec!["z"])])
    ///     .unwrap();
    /// let params = LshParams::new(4, 5).unwrap();
    /// assert_eq!(
    ///     searcher.search_with_banding(params, 0.5).unwrap(),
    ///     vec![("a", "b", 1.0)]
    /// );
    /// ```
    pub fn search_with_banding(
        &self,
        params: LshParams,
        threshold: f64,
    ) -> Result<Vec<(K, K, f64)>> {
        let threshold = check_similarity(threshold)?;
        let candidates = candidate_pairs(&self.matrix, params)?;
        let mut matched: Vec<(K, K, f64)> = candidates
            .into_iter()
            .filter_map(|(x, y)| {
                let i = self.matrix.position(&x)?;
                let j = self.matrix.position(&y)?;
                let sim = self.matrix.estimate(i, j);
                (sim >= threshold).then(|| (x, y, sim))
            })
            .collect();
        matched.sort_unstable_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        if self.shows_progress {
            tracing::info!(
                "[SimilaritySearcher::search_with_banding] #matched={}",
                matched.len()
            );
        }
        Ok(matched)
    }

    /// Gets the number of input entities.
    pub fn len(&self) -> usize {
        self.matrix.num_entities()
    }

    /// Checks if the database is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets the memory usage of signatures in bytes.
    pub fn memory_in_bytes(&self) -> usize {
        self.matrix.memory_in_bytes()
    }

    /// Gets the configuration.
    pub const fn config(&self) -> MinHashConfig {
        self.config
    }

    /// Gets the hasher.
    pub const fn hasher(&self) -> &MinHasher {
        &self.hasher
    }

    /// Gets the signatures.
    pub const fn matrix(&self) -> &SignatureMatrix<K> {
        &self.matrix
    }

    /// Consumes the searcher, returning the signatures.
    pub fn into_matrix(self) -> SignatureMatrix<K> {
        self.matrix
    }
}
