//! Choosing the banding of a signature length for a target similarity.
use crate::banding::LshParams;
use crate::errors::{check_similarity, BandJoinError, Result};

/// Computes the slope `r*b*s^(b-1)*(1-s^b)^(r-1)` of the candidate probability.
///
/// Defined as 0 at `s <= 0` and `s >= 1`.
pub fn lsh_slope(s: f64, bands: usize, rows: usize) -> f64 {
    if s <= 0. || s >= 1. {
        return 0.;
    }
    let r = bands as f64;
    let b = rows as f64;
    r * b * s.powf(b - 1.) * (1. - s.powf(b)).powf(r - 1.)
}

/// Enumerates `(bands, rows)` with `bands * rows == n` in increasing `bands`.
///
/// # Examples
///
/// ```
/// use band_join::params::factor_pairs;
///
/// let pairs: Vec<_> = factor_pairs(12).collect();
/// assert_eq!(pairs, vec![(1, 12), (2, 6), (3, 4), (4, 3), (6, 2), (12, 1)]);
/// ```
pub fn factor_pairs(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (1..=n).filter(move |r| n % r == 0).map(move |r| (r, n / r))
}

/// A banding together with the values that justify it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamChoice {
    /// The banding.
    pub params: LshParams,
    /// Candidate probability at the target similarity.
    pub probability: f64,
    /// Slope of the candidate probability at the target similarity.
    pub slope: f64,
}

impl ParamChoice {
    /// Distance of the candidate probability from 0.5.
    pub fn distance(&self) -> f64 {
        (self.probability - 0.5).abs()
    }
}

/// Chooses the banding whose S-curve crosses 0.5 closest to a target similarity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSelector {
    target: f64,
}

impl ParamSelector {
    /// Creates an instance for the target similarity in `[0, 1]`.
    pub fn new(target: f64) -> Result<Self> {
        Ok(Self {
            target: check_similarity(target)?,
        })
    }

    /// Gets the target similarity.
    pub const fn target(&self) -> f64 {
        self.target
    }

    /// Scores every banding of `signature_len` in increasing number of bands.
    pub fn score(&self, signature_len: usize) -> Result<Vec<ParamChoice>> {
        if signature_len == 0 {
            return Err(BandJoinError::NoValidParams(signature_len));
        }
        factor_pairs(signature_len)
            .map(|(bands, rows)| {
                let params = LshParams::new(bands, rows)?;
                Ok(ParamChoice {
                    params,
                    probability: params.probability(self.target)?,
                    slope: params.slope(self.target),
                })
            })
            .collect()
    }

    /// Chooses the banding of `signature_len`.
    ///
    /// The candidate whose probability at the target is closest to 0.5 wins; an exact
    /// tie goes to the larger slope, and remaining ties to the fewest bands.
    ///
    /// # Examples
    ///
    /// ```
    /// use band_join::params::ParamSelector;
    ///
    /// let choice = ParamSelector::new(0.7).unwrap().choose(160).unwrap();
    /// assert_eq!((choice.params.bands(), choice.params.rows()), (16, 10));
    /// ```
    pub fn choose(&self, signature_len: usize) -> Result<ParamChoice> {
        let mut best: Option<ParamChoice> = None;
        for choice in self.score(signature_len)? {
            best = match best {
                None => Some(choice),
                Some(b) if choice.distance() < b.distance() => Some(choice),
                Some(b) if choice.distance() == b.distance() && choice.slope > b.slope => {
                    Some(choice)
                }
                keep => keep,
            };
        }
        let best = best.ok_or(BandJoinError::NoValidParams(signature_len))?;
        tracing::debug!(
            "[ParamSelector::choose] t={signature_len}, tau={}, r={}, b={}, f={}, slope={}",
            self.target,
            best.params.bands(),
            best.params.rows(),
            best.probability,
            best.slope
        );
        Ok(best)
    }
}

/// Shorthand of [`ParamSelector::choose()`].
pub fn choose_params(signature_len: usize, target: f64) -> Result<ParamChoice> {
    ParamSelector::new(target)?.choose(signature_len)
}
