use std::path::{Path, PathBuf};

use crate::types::PackageInventory;

/// Merges ancestor inventories into the effective visible set for an
/// environment whose chain is `chain` (nearest parent first).
///
/// First write wins under near-to-far iteration, so a nearer ancestor's
/// version masks a farther one's. The environment's own inventory is never
/// part of the result; this is specifically "what is inherited".
pub fn inherited_packages<F>(chain: &[PathBuf], mut inventory_of: F) -> PackageInventory
where
    F: FnMut(&Path) -> PackageInventory,
{
    let mut visible = PackageInventory::new();
    for ancestor in chain {
        for (name, version) in inventory_of(ancestor) {
            visible.entry(name).or_insert(version);
        }
    }
    visible
}
