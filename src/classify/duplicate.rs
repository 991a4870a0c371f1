//! Exact (byte-identical) duplicate scorer.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::warn;

use super::{Verdict, display_name};
use crate::store::hash_file;

/// Finds byte-identical files among `files`.
///
/// Files are visited in lexicographic filename order; the first of each hash
/// is canonical and every later copy gets a delete verdict naming it.
/// Unreadable files are skipped.
#[must_use]
pub fn find_duplicates(files: &[PathBuf]) -> Vec<Verdict> {
    let mut ordered: Vec<&PathBuf> = files.iter().collect();
    ordered.sort_by_key(|path| path.file_name().map(std::ffi::OsStr::to_os_string));

    let mut seen: HashMap<String, String> = HashMap::new();
    let mut verdicts = Vec::new();

    for path in ordered {
        let hash = match hash_file(path) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(file = %display_name(path), error = %e, "could not hash");
                continue;
            }
        };
        match seen.get(&hash) {
            Some(canonical) => {
                verdicts.push(Verdict::delete(path, format!("duplicate of {canonical}")));
            }
            None => {
                seen.insert(hash, display_name(path));
            }
        }
    }
    verdicts
}
