use std::fmt;

/// Comparison operators understood by the planner. Anything else in a spec
/// (extras, markers, `~=`, compound constraints) is treated as unconstrained
/// and therefore always satisfiable by an ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    Eq,
    Ge,
    Gt,
    Le,
    Lt,
}

impl ConstraintOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Lt => "<",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    pub op: ConstraintOp,
    pub version: String,
}

impl VersionConstraint {
    /// Plain lexicographic string comparison, deliberately not a version
    /// ordering: "1.5" >= "2.0" is false, but so is "10.0" >= "2.0".
    pub fn satisfied_by(&self, available: &str) -> bool {
        let required = self.version.as_str();
        match self.op {
            ConstraintOp::Eq => available == required,
            ConstraintOp::Ge => available >= required,
            ConstraintOp::Gt => available > required,
            ConstraintOp::Le => available <= required,
            ConstraintOp::Lt => available < required,
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)
    }
}

/// One requested package spec, split into a lowercase name and an optional
/// recognized constraint. `raw` keeps the exact text handed to the installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequest {
    pub name: String,
    pub constraint: Option<VersionConstraint>,
    pub raw: String,
}

/// Splits `numpy>=1.26` into name and constraint. Specs without a leading
/// name token fall back to the whole spec as the name with no constraint.
pub fn parse_request(spec: &str) -> PackageRequest {
    let trimmed = spec.trim();
    let name_len = trimmed
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || b"._-".contains(b))
        .count();

    if name_len == 0 {
        return PackageRequest {
            name: trimmed.to_ascii_lowercase(),
            constraint: None,
            raw: spec.to_string(),
        };
    }

    let name = trimmed[..name_len].to_ascii_lowercase();
    let constraint = parse_constraint(&trimmed[name_len..]);
    PackageRequest {
        name,
        constraint,
        raw: spec.to_string(),
    }
}

fn parse_constraint(rest: &str) -> Option<VersionConstraint> {
    let rest = rest.trim();
    // Two-character operators first so ">=" is not read as ">" plus "=1.0".
    let (op, version) = if let Some(version) = rest.strip_prefix(">=") {
        (ConstraintOp::Ge, version)
    } else if let Some(version) = rest.strip_prefix("<=") {
        (ConstraintOp::Le, version)
    } else if let Some(version) = rest.strip_prefix("==") {
        (ConstraintOp::Eq, version)
    } else if let Some(version) = rest.strip_prefix('>') {
        (ConstraintOp::Gt, version)
    } else if let Some(version) = rest.strip_prefix('<') {
        (ConstraintOp::Lt, version)
    } else {
        return None;
    };

    let version = version.trim();
    if version.is_empty() {
        return None;
    }
    Some(VersionConstraint {
        op,
        version: version.to_string(),
    })
}
