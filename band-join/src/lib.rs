//! This library finds candidate pairs of similar entities from MinHash signatures
//! with [locality-sensitive hashing by banding](http://www.mmds.org/), without
//! comparing all pairs, and chooses the banding for a target similarity.
//! An exhaustive join over signature estimates is also provided as a baseline.
#![deny(missing_docs)]

pub mod banding;
pub mod errors;
pub mod matrix;
pub mod params;

pub use banding::{candidate_pairs, CandidateSet, LshParams};
pub use matrix::SignatureMatrix;
pub use params::{choose_params, ParamChoice, ParamSelector};
