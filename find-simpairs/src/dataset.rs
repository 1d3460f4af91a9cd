//! Loading of documents and rating sets.
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use hashbrown::HashSet;

use crate::errors::{FindSimpairsError, Result};
use crate::shingling::normalize_document;

/// Name of the ratings file in a MovieLens 100k directory.
pub const RATINGS_FILENAME: &str = "u.data";

/// Reads documents `dir/name` for each name, keyed by the file stem, with normalized text.
pub fn load_documents<P, I, S>(dir: P, names: I) -> Result<BTreeMap<String, String>>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let dir = dir.as_ref();
    let mut documents = BTreeMap::new();
    for name in names {
        let path = dir.join(name.as_ref());
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| FindSimpairsError::input("Document names must have a UTF-8 stem."))?
            .to_string();
        let text = fs::read_to_string(&path)?;
        tracing::debug!("[load_documents] Loaded {} ({} bytes)", path.display(), text.len());
        documents.insert(id, normalize_document(&text));
    }
    Ok(documents)
}

/// Reads MovieLens ratings, given the `u.data` file or a directory containing it,
/// into the set of rated items per user.
pub fn load_rating_sets<P>(path: P) -> Result<BTreeMap<u64, HashSet<u64>>>
where
    P: AsRef<Path>,
{
    let path = resolve_ratings_path(path.as_ref())?;
    let sets = parse_rating_sets(File::open(&path)?)?;
    tracing::info!(
        "[load_rating_sets] Loaded {} users from {}",
        sets.len(),
        path.display()
    );
    Ok(sets)
}

/// Parses tab-separated `user item rating timestamp` lines.
///
/// Blank lines and lines with fewer than two fields are skipped.
///
/// # Examples
///
/// ```
/// use find_simpairs::dataset::parse_rating_sets;
///
/// let data = "1\t10\t5\t0\n1\t11\t3\t0\n\n2\t10\t4\t0\n";
/// let sets = parse_rating_sets(data.as_bytes()).unwrap();
/// assert_eq!(sets[&1].len(), 2);
/// assert!(sets[&2].contains(&10));
/// ```
pub fn parse_rating_sets<R>(rdr: R) -> Result<BTreeMap<u64, HashSet<u64>>>
where
    R: Read,
{
    let mut sets: BTreeMap<u64, HashSet<u64>> = BTreeMap::new();
    for (i, line) in BufReader::new(rdr).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (user, item) = match (fields.next(), fields.next()) {
            (Some(user), Some(item)) => (user, item),
            _ => continue,
        };
        let user = parse_id(user, i + 1)?;
        let item = parse_id(item, i + 1)?;
        sets.entry(user).or_default().insert(item);
    }
    Ok(sets)
}

fn parse_id(field: &str, line: usize) -> Result<u64> {
    field.trim().parse().map_err(|_| FindSimpairsError::Parse {
        line,
        msg: format!("invalid identifier {field:?}"),
    })
}

fn resolve_ratings_path(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        let candidate = path.join(RATINGS_FILENAME);
        if candidate.exists() {
            return Ok(candidate);
        }
        return Err(FindSimpairsError::input("u.data is not found in the directory."));
    }
    Ok(path.to_path_buf())
}
