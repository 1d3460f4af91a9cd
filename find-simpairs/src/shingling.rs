//! k-gram shingling of documents.
use std::str::FromStr;

use hashbrown::HashSet;

use crate::errors::{FindSimpairsError, Result};

/// Tokens that shingles are built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KGramMode {
    /// Characters, including spaces.
    Char,
    /// Words delimited by a single space.
    Word,
}

impl FromStr for KGramMode {
    type Err = &'static str;
    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "char" => Ok(Self::Char),
            "word" => Ok(Self::Word),
            _ => Err("Could not parse a k-gram mode"),
        }
    }
}

/// Kind and window size of shingles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShingleConfig {
    mode: KGramMode,
    window_size: usize,
}

impl ShingleConfig {
    /// Creates an instance (`window_size` must be more than 0).
    pub fn new(mode: KGramMode, window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(FindSimpairsError::input("Window size must not be 0."));
        }
        Ok(Self { mode, window_size })
    }

    /// Gets the token kind.
    pub const fn mode(&self) -> KGramMode {
        self.mode
    }

    /// Gets the window size.
    pub const fn window_size(&self) -> usize {
        self.window_size
    }

    /// Gets a label such as `char_3`.
    pub fn label(&self) -> String {
        let mode = match self.mode {
            KGramMode::Char => "char",
            KGramMode::Word => "word",
        };
        format!("{mode}_{}", self.window_size)
    }

    /// Extracts the set of shingles of a text.
    ///
    /// # Examples
    ///
    /// ```
    /// use find_simpairs::shingling::{KGramMode, ShingleConfig};
    ///
    /// let config = ShingleConfig::new(KGramMode::Word, 2).unwrap();
    /// let mut shingles: Vec<_> = config.extract("a b a b").into_iter().collect();
    /// shingles.sort();
    /// assert_eq!(shingles, vec!["a b", "b a"]);
    /// ```
    pub fn extract(&self, text: &str) -> HashSet<String> {
        match self.mode {
            KGramMode::Char => {
                let chars: Vec<char> = text.chars().collect();
                ShingleIter::new(&chars, self.window_size)
                    .map(|window| window.iter().collect())
                    .collect()
            }
            KGramMode::Word => {
                if text.is_empty() {
                    return HashSet::new();
                }
                let words: Vec<&str> = text.split(' ').collect();
                ShingleIter::new(&words, self.window_size)
                    .map(|window| window.join(" "))
                    .collect()
            }
        }
    }
}

/// Trims, lowercases, and collapses every whitespace run into a single space.
///
/// # Examples
///
/// ```
/// use find_simpairs::shingling::normalize_document;
///
/// assert_eq!(normalize_document("  The\tCat \n sat "), "the cat sat");
/// ```
pub fn normalize_document(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Iterator over the windows of `window_size` consecutive tokens.
pub struct ShingleIter<'a, T> {
    tokens: &'a [T],
    window_size: usize,
    position: usize,
}

impl<'a, T> ShingleIter<'a, T> {
    /// Creates an iterator.
    pub fn new(tokens: &'a [T], window_size: usize) -> Self {
        Self {
            tokens,
            window_size,
            position: 0,
        }
    }
}

impl<'a, T> Iterator for ShingleIter<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        if self.tokens.len() < self.position + self.window_size {
            return None;
        }
        let window = &self.tokens[self.position..self.position + self.window_size];
        self.position += 1;
        Some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(set: HashSet<String>) -> Vec<String> {
        let mut v: Vec<_> = set.into_iter().collect();
        v.sort();
        v
    }

    #[test]
    fn test_q2() {
        let tokens = vec!["a", "b", "c"];
        let mut iter = ShingleIter::new(&tokens, 2);
        assert_eq!(iter.next(), Some(&tokens[0..2]));
        assert_eq!(iter.next(), Some(&tokens[1..3]));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_q4() {
        let tokens = vec!["a", "b", "c"];
        let mut iter = ShingleIter::new(&tokens, 4);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_char_trigram() {
        let config = ShingleConfig::new(KGramMode::Char, 3).unwrap();
        assert_eq!(
            sorted(config.extract("the cat")),
            vec![" ca", "cat", "e c", "he ", "the"]
        );
    }

    #[test]
    fn test_char_dedup() {
        let config = ShingleConfig::new(KGramMode::Char, 2).unwrap();
        assert_eq!(sorted(config.extract("aaaa")), vec!["aa"]);
    }

    #[test]
    fn test_short_text() {
        let config = ShingleConfig::new(KGramMode::Char, 3).unwrap();
        assert!(config.extract("ab").is_empty());
        let config = ShingleConfig::new(KGramMode::Word, 2).unwrap();
        assert!(config.extract("word").is_empty());
        assert!(config.extract("").is_empty());
    }

    #[test]
    fn test_word_bigram() {
        let config = ShingleConfig::new(KGramMode::Word, 2).unwrap();
        assert_eq!(
            sorted(config.extract("abc de fgh")),
            vec!["abc de", "de fgh"]
        );
    }

    #[test]
    fn test_zero_window() {
        assert!(ShingleConfig::new(KGramMode::Char, 0).is_err());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("char".parse::<KGramMode>(), Ok(KGramMode::Char));
        assert_eq!("word".parse::<KGramMode>(), Ok(KGramMode::Word));
        assert!("byte".parse::<KGramMode>().is_err());
        assert_eq!(
            ShingleConfig::new(KGramMode::Word, 2).unwrap().label(),
            "word_2"
        );
    }
}
