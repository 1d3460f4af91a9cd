//! Accuracy of estimated and candidate pairs against exact similarities.
//!
//! Signature construction is randomized by the seed, so accuracy is measured over
//! several independent runs: run `i` uses seed `base_seed + i` and shares nothing
//! with the other runs.
use std::collections::BTreeMap;
use std::hash::Hash;

use band_join::banding::candidate_pairs;
use band_join::{LshParams, SignatureMatrix};
use hashbrown::HashSet;
use lsh::{jaccard_of_sets, Item, MinHasher};
use rayon::prelude::*;

use crate::config::MinHashConfig;
use crate::errors::{FindSimpairsError, Result};

/// Unordered pair of identifiers stored as `(smaller, larger)`.
pub type Pair<K> = (K, K);

/// Numbers of wrongly predicted pairs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ErrorCounts {
    /// Predicted pairs that are not true pairs.
    pub false_positives: usize,
    /// True pairs that are not predicted.
    pub false_negatives: usize,
}

/// Compares predicted pairs with true pairs. Both must key pairs as `(smaller, larger)`.
///
/// # Examples
///
/// ```
/// use find_simpairs::evaluation::compare;
/// use hashbrown::HashSet;
///
/// let predicted: HashSet<_> = [(1, 2), (1, 3), (2, 4)].into_iter().collect();
/// let truth: HashSet<_> = [(1, 2), (3, 4)].into_iter().collect();
/// let counts = compare(&predicted, &truth);
/// assert_eq!(counts.false_positives, 2);
/// assert_eq!(counts.false_negatives, 1);
/// ```
pub fn compare<K>(predicted: &HashSet<Pair<K>>, truth: &HashSet<Pair<K>>) -> ErrorCounts
where
    K: Hash + Eq,
{
    ErrorCounts {
        false_positives: predicted.difference(truth).count(),
        false_negatives: truth.difference(predicted).count(),
    }
}

/// Computes the exact Jaccard similarity of every pair of entities.
pub fn exact_similarities<K, T>(entities: &[(K, HashSet<T>)]) -> BTreeMap<Pair<K>, f64>
where
    K: Ord + Clone,
    T: Hash + Eq,
{
    let mut results = BTreeMap::new();
    for (i, (x, xs)) in entities.iter().enumerate() {
        for (y, ys) in &entities[i + 1..] {
            results.insert(ordered(x, y), jaccard_of_sets(xs, ys));
        }
    }
    results
}

/// Parallel version of [`exact_similarities()`].
pub fn exact_similarities_in_parallel<K, T>(entities: &[(K, HashSet<T>)]) -> BTreeMap<Pair<K>, f64>
where
    K: Ord + Clone + Send + Sync,
    T: Hash + Eq + Sync,
{
    (0..entities.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let (x, xs) = &entities[i];
            entities[i + 1..]
                .iter()
                .map(move |(y, ys)| (ordered(x, y), jaccard_of_sets(xs, ys)))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

/// Gets the pairs whose similarity is at least `threshold`.
pub fn pairs_at_least<K>(similarities: &BTreeMap<Pair<K>, f64>, threshold: f64) -> HashSet<Pair<K>>
where
    K: Hash + Eq + Clone,
{
    similarities
        .iter()
        .filter(|(_, &sim)| sim >= threshold)
        .map(|(pair, _)| pair.clone())
        .collect()
}

fn ordered<K>(x: &K, y: &K) -> Pair<K>
where
    K: Ord + Clone,
{
    band_join::matrix::ordered_pair(x.clone(), y.clone())
}

/// The way pairs are predicted from a signature matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Predictor {
    /// Pairs whose signature estimate is at least the threshold, by comparing all pairs.
    Estimate {
        /// Similarity threshold in `[0, 1]`.
        threshold: f64,
    },
    /// Candidate pairs of the banding.
    Banding(LshParams),
}

/// Errors of every run for one predictor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrialSummary {
    /// Counts of each run in run order.
    pub per_run: Vec<ErrorCounts>,
}

impl TrialSummary {
    /// Mean number of false positives over runs.
    pub fn mean_false_positives(&self) -> f64 {
        self.mean(|c| c.false_positives)
    }

    /// Mean number of false negatives over runs.
    pub fn mean_false_negatives(&self) -> f64 {
        self.mean(|c| c.false_negatives)
    }

    fn mean<F>(&self, f: F) -> f64
    where
        F: Fn(&ErrorCounts) -> usize,
    {
        if self.per_run.is_empty() {
            return 0.;
        }
        self.per_run.iter().map(f).sum::<usize>() as f64 / self.per_run.len() as f64
    }
}

/// Signature matrices of the same entities built under independent seeds.
pub struct Trials<K> {
    config: MinHashConfig,
    matrices: Vec<SignatureMatrix<K>>,
}

impl<K> Trials<K>
where
    K: Ord + Hash + Clone + Send + Sync,
{
    /// Builds `runs` signature matrices. Run `i` uses the seed of `config` plus `i`.
    pub fn build<T>(entities: &[(K, HashSet<T>)], config: MinHashConfig, runs: usize) -> Result<Self>
    where
        T: Item,
    {
        check_runs(runs)?;
        let matrices = (0..runs)
            .map(|run| build_matrix(entities, run_config(config, run)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { config, matrices })
    }

    /// Parallel version of [`Self::build()`], building whole runs on the rayon pool.
    pub fn build_in_parallel<T>(
        entities: &[(K, HashSet<T>)],
        config: MinHashConfig,
        runs: usize,
    ) -> Result<Self>
    where
        T: Item + Sync,
    {
        check_runs(runs)?;
        let matrices = (0..runs)
            .into_par_iter()
            .map(|run| build_matrix(entities, run_config(config, run)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { config, matrices })
    }

    /// Gets the number of runs.
    pub fn runs(&self) -> usize {
        self.matrices.len()
    }

    /// Gets the seed of the run.
    pub const fn seed(&self, run: usize) -> u64 {
        self.config.get_seed().wrapping_add(run as u64)
    }

    /// Gets the configuration of the first run.
    pub const fn config(&self) -> MinHashConfig {
        self.config
    }

    /// Gets the signature matrix of the run.
    pub fn matrix(&self, run: usize) -> Option<&SignatureMatrix<K>> {
        self.matrices.get(run)
    }

    /// Predicts pairs in the run, returning triplets of ids and their estimates sorted by ids.
    ///
    /// Banding reports every candidate pair with its estimate.
    pub fn predict(&self, run: usize, predictor: Predictor) -> Result<Vec<(K, K, f64)>> {
        let matrix = self
            .matrix(run)
            .ok_or_else(|| FindSimpairsError::input("The run is out of range."))?;
        predict(matrix, predictor)
    }

    /// Counts errors of every run against the true pairs.
    pub fn evaluate(&self, predictor: Predictor, truth: &HashSet<Pair<K>>) -> Result<TrialSummary> {
        let per_run = self
            .matrices
            .iter()
            .map(|matrix| evaluate_run(matrix, predictor, truth))
            .collect::<Result<Vec<_>>>()?;
        Ok(TrialSummary { per_run })
    }

    /// Parallel version of [`Self::evaluate()`], evaluating runs on the rayon pool.
    pub fn evaluate_in_parallel(
        &self,
        predictor: Predictor,
        truth: &HashSet<Pair<K>>,
    ) -> Result<TrialSummary> {
        let per_run = self
            .matrices
            .par_iter()
            .map(|matrix| evaluate_run(matrix, predictor, truth))
            .collect::<Result<Vec<_>>>()?;
        Ok(TrialSummary { per_run })
    }
}

fn check_runs(runs: usize) -> Result<()> {
    if runs == 0 {
        return Err(FindSimpairsError::input("The number of runs must not be 0."));
    }
    Ok(())
}

fn run_config(config: MinHashConfig, run: usize) -> MinHashConfig {
    config.seed(config.get_seed().wrapping_add(run as u64))
}

fn build_matrix<K, T>(entities: &[(K, HashSet<T>)], config: MinHashConfig) -> Result<SignatureMatrix<K>>
where
    K: Ord + Hash + Clone,
    T: Item,
{
    let hasher: MinHasher = config.hasher()?;
    let mut matrix = SignatureMatrix::new(hasher.num_hashes());
    for (id, items) in entities {
        matrix.add(id.clone(), hasher.signature(items.iter()).into_inner())?;
    }
    tracing::debug!(
        "[Trials::build] seed={}, #entities={}",
        config.get_seed(),
        matrix.num_entities()
    );
    Ok(matrix)
}

fn predict<K>(matrix: &SignatureMatrix<K>, predictor: Predictor) -> Result<Vec<(K, K, f64)>>
where
    K: Ord + Hash + Clone,
{
    match predictor {
        Predictor::Estimate { threshold } => Ok(matrix.similar_pairs(threshold)?),
        Predictor::Banding(params) => {
            let mut pairs: Vec<(K, K, f64)> = candidate_pairs(matrix, params)?
                .into_iter()
                .filter_map(|(x, y)| {
                    let i = matrix.position(&x)?;
                    let j = matrix.position(&y)?;
                    Some((x, y, matrix.estimate(i, j)))
                })
                .collect();
            pairs.sort_unstable_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
            Ok(pairs)
        }
    }
}

fn evaluate_run<K>(
    matrix: &SignatureMatrix<K>,
    predictor: Predictor,
    truth: &HashSet<Pair<K>>,
) -> Result<ErrorCounts>
where
    K: Ord + Hash + Clone,
{
    let predicted: HashSet<Pair<K>> = match predictor {
        Predictor::Estimate { threshold } => matrix
            .similar_pairs(threshold)?
            .into_iter()
            .map(|(x, y, _)| (x, y))
            .collect(),
        Predictor::Banding(params) => candidate_pairs(matrix, params)?.into_iter().collect(),
    };
    Ok(compare(&predicted, truth))
}

/// Exact and estimated similarity of two sets for one signature length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EstimateRow {
    /// Signature length.
    pub num_hashes: usize,
    /// Signature estimate.
    pub estimate: f64,
    /// Exact Jaccard similarity.
    pub exact: f64,
    /// `|estimate - exact|`.
    pub abs_error: f64,
}

/// Estimates the similarity of two sets for each signature length.
///
/// Each length draws its own family from the seed of `config`.
pub fn estimate_curve<T>(
    lhs: &HashSet<T>,
    rhs: &HashSet<T>,
    num_hashes: &[usize],
    config: MinHashConfig,
) -> Result<Vec<EstimateRow>>
where
    T: Item + Hash + Eq,
{
    let exact = jaccard_of_sets(lhs, rhs);
    num_hashes
        .iter()
        .map(|&t| {
            let hasher = config.num_hashes(t).hasher()?;
            let estimate = hasher
                .signature(lhs.iter())
                .estimate_jaccard(&hasher.signature(rhs.iter()))?;
            Ok(EstimateRow {
                num_hashes: t,
                estimate,
                exact,
                abs_error: (estimate - exact).abs(),
            })
        })
        .collect()
}

/// Recommends the smallest signature length after which the error improves by less
/// than 0.01, or the largest length if it keeps improving.
///
/// # Examples
///
/// ```
/// use find_simpairs::evaluation::{recommend_num_hashes, EstimateRow};
///
/// let row = |t, e| EstimateRow { num_hashes: t, estimate: 0., exact: 0., abs_error: e };
/// let rows = [row(20, 0.10), row(60, 0.05), row(150, 0.045), row(300, 0.01)];
/// assert_eq!(recommend_num_hashes(&rows).unwrap(), 150);
/// ```
pub fn recommend_num_hashes(rows: &[EstimateRow]) -> Result<usize> {
    let mut rows = rows.to_vec();
    rows.sort_by_key(|row| row.num_hashes);
    let last = rows
        .last()
        .ok_or_else(|| FindSimpairsError::input("No rows to analyze."))?
        .num_hashes;
    for w in rows.windows(2) {
        if w[0].abs_error - w[1].abs_error < 0.01 {
            return Ok(w[1].num_hashes);
        }
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[u64]) -> HashSet<u64> {
        items.iter().copied().collect()
    }

    fn entities() -> Vec<(u32, HashSet<u64>)> {
        vec![
            (1, set(&[1, 2, 3, 4, 5, 6, 7, 8])),
            (2, set(&[1, 2, 3, 4, 5, 6, 7, 9])),
            (3, set(&[1, 2, 3, 4, 10, 11, 12, 13])),
            (4, set(&[20, 21, 22])),
            (5, set(&[])),
        ]
    }

    #[test]
    fn test_compare_identities() {
        let predicted: HashSet<Pair<u32>> = [(1, 2), (1, 3), (2, 3), (4, 5)].into_iter().collect();
        let truth: HashSet<Pair<u32>> = [(1, 2), (2, 3), (3, 4)].into_iter().collect();
        let counts = compare(&predicted, &truth);
        let both = predicted.intersection(&truth).count();
        assert_eq!(counts.false_positives + both, predicted.len());
        assert_eq!(counts.false_negatives + both, truth.len());
    }

    #[test]
    fn test_exact_similarities() {
        let sims = exact_similarities(&entities());
        assert_eq!(sims.len(), 10);
        assert_eq!(sims[&(1, 2)], 7. / 9.);
        assert_eq!(sims[&(1, 3)], 4. / 12.);
        assert_eq!(sims[&(4, 5)], 0.);
        assert_eq!(sims, exact_similarities_in_parallel(&entities()));

        let pairs = pairs_at_least(&sims, 0.5);
        assert_eq!(pairs, [(1, 2)].into_iter().collect());
    }

    #[test]
    fn test_trials_reproducible() {
        let entities = entities();
        let config = MinHashConfig::new(60).seed(100);
        let x = Trials::build(&entities, config, 3).unwrap();
        let y = Trials::build_in_parallel(&entities, config, 3).unwrap();
        assert_eq!(x.runs(), 3);
        assert_eq!(x.seed(2), 102);
        for run in 0..3 {
            let (a, b) = (x.matrix(run).unwrap(), y.matrix(run).unwrap());
            for i in 0..entities.len() {
                assert_eq!(a.row(i), b.row(i));
            }
        }
        assert_ne!(x.matrix(0).unwrap().row(0), x.matrix(1).unwrap().row(0));

        let truth = pairs_at_least(&exact_similarities(&entities), 0.5);
        let predictor = Predictor::Banding(LshParams::new(20, 3).unwrap());
        assert_eq!(
            x.evaluate(predictor, &truth).unwrap(),
            x.evaluate_in_parallel(predictor, &truth).unwrap()
        );
    }

    #[test]
    fn test_estimate_predictor() {
        let entities = entities();
        let trials = Trials::build(&entities, MinHashConfig::new(200), 2).unwrap();
        let predicted = trials
            .predict(0, Predictor::Estimate { threshold: 0.99 })
            .unwrap();
        // The empty set never agrees with a non-empty one.
        assert!(predicted.iter().all(|&(x, y, _)| x != 5 && y != 5));

        let truth = pairs_at_least(&exact_similarities(&entities), 0.5);
        let summary = trials
            .evaluate(Predictor::Estimate { threshold: 0.5 }, &truth)
            .unwrap();
        assert_eq!(summary.per_run.len(), 2);
        assert_eq!(summary.mean_false_negatives(), 0.);
        assert_eq!(summary.mean_false_positives(), 0.);
        assert!(trials.predict(2, Predictor::Estimate { threshold: 0.5 }).is_err());
    }

    #[test]
    fn test_banding_with_single_rows_finds_overlaps() {
        let entities = entities();
        let trials = Trials::build(&entities, MinHashConfig::new(100), 1).unwrap();
        let predicted = trials
            .predict(0, Predictor::Banding(LshParams::new(100, 1).unwrap()))
            .unwrap();
        let pairs: Vec<_> = predicted.iter().map(|&(x, y, _)| (x, y)).collect();
        assert!(pairs.contains(&(1, 2)));
        assert!(pairs.contains(&(1, 3)));
    }

    #[test]
    fn test_zero_runs() {
        assert!(Trials::build(&entities(), MinHashConfig::new(10), 0).is_err());
    }

    #[test]
    fn test_estimate_curve() {
        let x = set(&(0..100).collect::<Vec<_>>());
        let y = set(&(50..150).collect::<Vec<_>>());
        let rows = estimate_curve(&x, &y, &[20, 600], MinHashConfig::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].exact, 50. / 150.);
        assert!(rows[1].abs_error < 0.1);
    }

    #[test]
    fn test_recommend_last() {
        let row = |t, e| EstimateRow {
            num_hashes: t,
            estimate: 0.,
            exact: 0.,
            abs_error: e,
        };
        assert_eq!(
            recommend_num_hashes(&[row(60, 0.2), row(20, 0.5), row(150, 0.1)]).unwrap(),
            150
        );
        assert!(recommend_num_hashes(&[]).is_err());
    }

    #[test]
    fn test_trial_summary_mean() {
        let summary = TrialSummary {
            per_run: vec![
                ErrorCounts {
                    false_positives: 1,
                    false_negatives: 4,
                },
                ErrorCounts {
                    false_positives: 2,
                    false_negatives: 0,
                },
            ],
        };
        assert_eq!(summary.mean_false_positives(), 1.5);
        assert_eq!(summary.mean_false_negatives(), 2.);
        assert_eq!(TrialSummary::default().mean_false_positives(), 0.);
    }
}
