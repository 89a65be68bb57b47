use std::collections::BTreeSet;

use crate::constraints::parse_request;
use crate::types::{
    InstallPlan, PackageInventory, SkippedPackage, StillVisible, UninstallPlan, VersionConflict,
};

/// Partitions the requested specs and their dependency closure into
/// install/skip/conflict buckets against the effective visible set.
///
/// An empty `closure` means the dry-run resolution failed; planning then
/// degrades to name-only checks of the explicit requests, with no transitive
/// awareness and no constraint comparison.
pub fn build_install_plan(
    requests: &[String],
    visible: &PackageInventory,
    closure: &PackageInventory,
) -> InstallPlan {
    let mut plan = InstallPlan {
        degraded: closure.is_empty(),
        ..InstallPlan::default()
    };

    let mut explicit_names = BTreeSet::new();
    for spec in requests {
        let request = parse_request(spec);
        explicit_names.insert(request.name.clone());

        let Some(ancestor_version) = visible.get(&request.name) else {
            plan.to_install.push(request.raw);
            continue;
        };

        if plan.degraded {
            // Constraint text is not consulted in degraded mode; a name
            // match on an ancestor is enough to skip.
            plan.skipped.push(SkippedPackage {
                name: request.name,
                ancestor_version: ancestor_version.clone(),
                explicit: true,
            });
            continue;
        }

        match request.constraint {
            Some(constraint) if !constraint.satisfied_by(ancestor_version) => {
                plan.conflicts.push(VersionConflict {
                    name: request.name,
                    ancestor_version: ancestor_version.clone(),
                    requested: constraint,
                });
                plan.to_install.push(request.raw);
            }
            // No constraint, or the ancestor version satisfies it.
            _ => plan.skipped.push(SkippedPackage {
                name: request.name,
                ancestor_version: ancestor_version.clone(),
                explicit: true,
            }),
        }
    }

    if !plan.degraded {
        for (name, _version) in closure {
            if explicit_names.contains(name) {
                continue;
            }
            if let Some(ancestor_version) = visible.get(name) {
                plan.skipped.push(SkippedPackage {
                    name: name.clone(),
                    ancestor_version: ancestor_version.clone(),
                    explicit: false,
                });
            } else {
                plan.to_install.push(name.clone());
            }
        }
    }

    plan
}

/// Decides which requested names are actually removable from the current
/// environment, and notes which of those stay reachable from an ancestor.
pub fn build_uninstall_plan(
    requests: &[String],
    own_inventory: &PackageInventory,
    visible: &PackageInventory,
) -> UninstallPlan {
    let mut plan = UninstallPlan::default();

    for requested in requests {
        let lookup = requested.to_ascii_lowercase();
        if !own_inventory.contains_key(&lookup) {
            plan.not_found.push(requested.clone());
            continue;
        }

        plan.to_remove.push(requested.clone());
        if let Some(ancestor_version) = visible.get(&lookup) {
            plan.still_visible.push(StillVisible {
                name: requested.clone(),
                ancestor_version: ancestor_version.clone(),
            });
        }
    }

    plan
}
