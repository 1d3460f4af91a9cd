//! Seeded hash families, MinHash signatures and Jaccard estimation.
#![deny(missing_docs)]

pub mod errors;
pub mod hash_family;
pub mod minhash;
pub mod similarity;

pub use hash_family::{HashFamily, HashFunction, PRIME};
pub use minhash::{MinHasher, Signature};
pub use similarity::{estimate_jaccard, jaccard_distance, jaccard_of_sets, jaccard_similarity};

use xxhash_rust::xxh3::xxh3_64;

/// Digests a token into a 64-bit value, stable across processes and platforms.
///
/// # Examples
///
/// ```
/// use lsh::hash_token;
///
/// assert_eq!(hash_token("the"), hash_token(String::from("the")));
/// assert_ne!(hash_token("the"), hash_token("thf"));
/// ```
#[inline(always)]
pub fn hash_token<S>(token: S) -> u64
where
    S: AsRef<str>,
{
    xxh3_64(token.as_ref().as_bytes())
}

/// An element of a set that can be fed to a [`MinHasher`].
pub trait Item {
    /// Maps the item to the 64-bit value hash functions are evaluated on.
    fn to_feature(&self) -> u64;
}

impl Item for str {
    #[inline(always)]
    fn to_feature(&self) -> u64 {
        hash_token(self)
    }
}

impl Item for String {
    #[inline(always)]
    fn to_feature(&self) -> u64 {
        hash_token(self)
    }
}

macro_rules! impl_item_for_int {
    ($($t:ty),*) => {
        $(
            impl Item for $t {
                #[inline(always)]
                fn to_feature(&self) -> u64 {
                    *self as u64
                }
            }
        )*
    };
}

impl_item_for_int!(u8, u16, u32, u64, usize, i32, i64);

impl<T> Item for &T
where
    T: Item + ?Sized,
{
    #[inline(always)]
    fn to_feature(&self) -> u64 {
        (**self).to_feature()
    }
}
