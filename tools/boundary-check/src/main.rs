//! Fails when a kopi crate depends on a workspace crate above its layer.

use cargo_metadata::{MetadataCommand, Package};
use std::collections::{BTreeMap, BTreeSet};

/// Workspace crates from the bottom layer up; each may depend only on the
/// crates listed before it.
const LAYERS: [&str; 5] = [
    "kopi-core",
    "kopi-periods",
    "kopi-analytics",
    "kopi-report",
    "kopi-cli",
];

const TOOLS: [&str; 1] = ["boundary-check"];

fn main() {
    let metadata = match MetadataCommand::new().exec() {
        Ok(metadata) => metadata,
        Err(err) => {
            eprintln!("boundary-check: failed to read cargo metadata: {err}");
            std::process::exit(2);
        }
    };

    let members: BTreeSet<_> = metadata.workspace_members.iter().cloned().collect();
    let packages: BTreeMap<String, Package> = metadata
        .packages
        .into_iter()
        .filter(|pkg| members.contains(&pkg.id))
        .map(|pkg| (pkg.name.clone(), pkg))
        .collect();

    let violations = check(&packages);
    if violations.is_empty() {
        println!("boundary-check: ok ({} crates)", packages.len());
    } else {
        eprintln!("boundary-check: forbidden workspace dependencies detected:");
        for item in violations {
            eprintln!("  {item}");
        }
        std::process::exit(1);
    }
}

fn check(packages: &BTreeMap<String, Package>) -> Vec<String> {
    let mut violations = Vec::new();
    for (name, pkg) in packages {
        if TOOLS.contains(&name.as_str()) {
            continue;
        }
        let Some(allowed) = allowed_deps(name) else {
            violations.push(format!("{name} is not assigned to a layer"));
            continue;
        };
        for dep in pkg.dependencies.iter().map(|d| d.name.as_str()) {
            if dep != name && packages.contains_key(dep) && !allowed.contains(dep) {
                violations.push(format!("{name} -> {dep}"));
            }
        }
    }
    violations
}

fn allowed_deps(name: &str) -> Option<BTreeSet<&'static str>> {
    let layer = LAYERS.iter().position(|l| *l == name)?;
    Some(LAYERS[..layer].iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_layers_are_allowed() {
        let report = allowed_deps("kopi-report").unwrap();
        assert!(report.contains("kopi-analytics"));
        assert!(!report.contains("kopi-cli"));
        assert!(allowed_deps("kopi-core").unwrap().is_empty());
        assert!(allowed_deps("kopi-unknown").is_none());
    }
}
