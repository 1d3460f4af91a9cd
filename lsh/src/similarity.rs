//! Exact and signature-based Jaccard similarities.
use std::hash::{BuildHasher, Hash};

use hashbrown::HashSet;

use crate::errors::{LshError, Result};

/// Computes the Jaccard similarity `|A∩B| / |A∪B|`.
///
/// Two empty sets are identical by convention.
///
/// # Examples
///
/// ```
/// use lsh::similarity::jaccard_similarity;
///
/// let x = vec![1, 2, 4];
/// let y = vec![1, 2, 5, 7];
/// assert_eq!(jaccard_similarity(x, y), 0.4);
/// assert_eq!(jaccard_similarity(Vec::<u32>::new(), vec![]), 1.0);
/// ```
pub fn jaccard_similarity<I, J, T>(lhs: I, rhs: J) -> f64
where
    I: IntoIterator<Item = T>,
    J: IntoIterator<Item = T>,
    T: Hash + Eq,
{
    let a = HashSet::<T>::from_iter(lhs);
    let b = HashSet::<T>::from_iter(rhs);
    jaccard_of_sets(&a, &b)
}

/// Computes the Jaccard similarity of two sets without copying them.
///
/// Two empty sets are identical by convention.
pub fn jaccard_of_sets<T, S>(lhs: &HashSet<T, S>, rhs: &HashSet<T, S>) -> f64
where
    T: Hash + Eq,
    S: BuildHasher,
{
    if lhs.is_empty() && rhs.is_empty() {
        return 1.;
    }
    let (small, large) = if lhs.len() <= rhs.len() {
        (lhs, rhs)
    } else {
        (rhs, lhs)
    };
    let inter = small.iter().filter(|x| large.contains(*x)).count();
    let union = lhs.len() + rhs.len() - inter;
    inter as f64 / union as f64
}

/// Computes the Jaccard distance, i.e., `1 - jaccard_similarity`.
///
/// # Examples
///
/// ```
/// use lsh::similarity::jaccard_distance;
///
/// let x = vec![1, 2, 4];
/// let y = vec![1, 2, 5, 7];
/// assert_eq!(jaccard_distance(x, y), 0.6);
/// ```
pub fn jaccard_distance<I, J, T>(lhs: I, rhs: J) -> f64
where
    I: IntoIterator<Item = T>,
    J: IntoIterator<Item = T>,
    T: Hash + Eq,
{
    1. - jaccard_similarity(lhs, rhs)
}

/// Counts positions where two equal-length slices agree.
#[inline(always)]
pub fn count_matches(lhs: &[u64], rhs: &[u64]) -> usize {
    debug_assert_eq!(lhs.len(), rhs.len());
    lhs.iter().zip(rhs).filter(|(x, y)| x == y).count()
}

/// Estimates the Jaccard similarity as the fraction of agreeing signature positions.
///
/// Zero-length signatures are identical by convention.
///
/// # Examples
///
/// ```
/// use lsh::similarity::estimate_jaccard;
///
/// assert_eq!(estimate_jaccard(&[1, 2, 3, 4], &[1, 0, 3, 0]).unwrap(), 0.5);
/// assert_eq!(estimate_jaccard(&[], &[]).unwrap(), 1.0);
/// assert!(estimate_jaccard(&[1], &[1, 2]).is_err());
/// ```
pub fn estimate_jaccard(lhs: &[u64], rhs: &[u64]) -> Result<f64> {
    if lhs.len() != rhs.len() {
        return Err(LshError::LengthMismatch {
            lhs: lhs.len(),
            rhs: rhs.len(),
        });
    }
    if lhs.is_empty() {
        return Ok(1.);
    }
    Ok(count_matches(lhs, rhs) as f64 / lhs.len() as f64)
}
