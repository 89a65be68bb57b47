mod chain;
mod constraints;
mod plan;
mod types;
mod visibility;

pub use chain::ancestor_chain;
pub use constraints::{parse_request, ConstraintOp, PackageRequest, VersionConstraint};
pub use plan::{build_install_plan, build_uninstall_plan};
pub use types::{
    InstallPlan, PackageInventory, SkippedPackage, StillVisible, UninstallPlan, VersionConflict,
};
pub use visibility::inherited_packages;
