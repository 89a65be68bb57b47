use std::collections::BTreeMap;

use crate::constraints::VersionConstraint;

/// Lowercase package name to version string, scoped to one environment.
pub type PackageInventory = BTreeMap<String, String>;

/// A package left out of the install invocation because an ancestor already
/// provides it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPackage {
    pub name: String,
    pub ancestor_version: String,
    /// True when the user asked for this package, false for a transitive
    /// dependency discovered through the dry-run closure.
    pub explicit: bool,
}

/// An ancestor provides the package at a version the request rejects; the
/// child installs its own copy and masks the ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    pub name: String,
    pub ancestor_version: String,
    pub requested: VersionConstraint,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    /// Original request specs plus bare names for unsatisfied dependencies,
    /// in request order followed by closure order.
    pub to_install: Vec<String>,
    pub skipped: Vec<SkippedPackage>,
    pub conflicts: Vec<VersionConflict>,
    /// Set when the dependency closure could not be computed and planning
    /// fell back to name-only checks of the explicit requests.
    pub degraded: bool,
}

impl InstallPlan {
    /// Whether the installer must run with dependency auto-resolution off.
    /// Once an inherited package is skipped, letting the installer expand
    /// dependencies again would re-pull it into the child.
    pub fn use_no_deps(&self) -> bool {
        !self.degraded && !self.skipped.is_empty()
    }
}

/// A package that stays reachable through an ancestor after removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StillVisible {
    pub name: String,
    pub ancestor_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallPlan {
    /// Requested names (original casing) present in the environment itself.
    pub to_remove: Vec<String>,
    /// Requested names not installed locally; informational, not an error.
    pub not_found: Vec<String>,
    pub still_visible: Vec<StillVisible>,
}
