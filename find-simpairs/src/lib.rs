//! Fast all-pair similarity searches over sets with MinHash and LSH banding.
//!
//! Sets of items (shingles of documents, items rated by users, and so on) are
//! converted into MinHash signatures, from which similar pairs are found either
//! by comparing all pairs of signatures or by LSH banding.
//!
//! # Examples
//!
//! ```
//! use band_join::choose_params;
//! use find_simpairs::shingling::{KGramMode, ShingleConfig};
//! use find_simpairs::{MinHashConfig, SimilaritySearcher};
//!
//! let shingler = ShingleConfig::new(KGramMode::Char, 3).unwrap();
//! let documents = [
//!     "welcome to jimbocho, the town of books and curry!",
//!     "welcome to jimbocho, the town of books and curry.",
//!     "a completely unrelated sentence.",
//! ];
//! let entities = documents.iter().enumerate().map(|(i, d)| (i, shingler.extract(d)));
//!
//! let searcher = SimilaritySearcher::new(MinHashConfig::new(160))
//!     .unwrap()
//!     .build_signatures(entities)
//!     .unwrap();
//!
//! let choice = choose_params(160, 0.7).unwrap();
//! let pairs = searcher.search_with_banding(choice.params, 0.7).unwrap();
//! assert_eq!(pairs.len(), 1);
//! assert_eq!((pairs[0].0, pairs[0].1), (0, 1));
//! ```
#![deny(missing_docs)]

pub mod config;
pub mod dataset;
pub mod errors;
pub mod evaluation;
pub mod searcher;
pub mod shingling;

pub use config::MinHashConfig;
pub use evaluation::{ErrorCounts, Predictor, Trials};
pub use searcher::SimilaritySearcher;
