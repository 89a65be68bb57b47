use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Ordered ancestor chain of `start`, nearest parent first.
///
/// `find_parent` owns the on-disk lookup so the traversal stays testable
/// without a filesystem. The walk stops at the first `None` and also bounds
/// itself against cycles from hand-edited links: a repeated path ends the
/// chain as if the link were absent.
pub fn ancestor_chain<F>(start: &Path, mut find_parent: F) -> Vec<PathBuf>
where
    F: FnMut(&Path) -> Option<PathBuf>,
{
    let mut chain = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    seen.insert(start.to_path_buf());

    let mut current = start.to_path_buf();
    while let Some(parent) = find_parent(&current) {
        if !seen.insert(parent.clone()) {
            break;
        }
        chain.push(parent.clone());
        current = parent;
    }
    chain
}
