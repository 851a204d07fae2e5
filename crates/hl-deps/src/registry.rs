//! Symbolic dependency names and their repository coordinates.
//!
//! Both tables are pure data. [`lookup`] maps a name from the descriptor's
//! `dependencies` section to a [`Coordinate`]; [`expand`] adds the implicit
//! companions some libraries need, using a short declarative rule list.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use hl_core::{Coordinate, DependencySpec};
use rustc_hash::FxHashMap;

/// Known dependency names, in registration order.
const ENTRIES: &[(&str, Coordinate)] = &[
    ("postgresql", Coordinate::new("org.postgresql", "postgresql")),
    ("mysql", Coordinate::new("com.mysql", "mysql-connector-j")),
    ("redis", Coordinate::new("redis.clients", "jedis")),
    ("lombok", Coordinate::new("org.projectlombok", "lombok")),
    ("gson", Coordinate::new("com.google.code.gson", "gson")),
    ("jwt", Coordinate::new("com.auth0", "java-jwt")),
    ("mongodb", Coordinate::new("org.mongodb", "mongodb-driver-sync")),
    ("sqlite", Coordinate::new("org.xerial", "sqlite-jdbc")),
    ("jackson", Coordinate::new("com.fasterxml.jackson.core", "jackson-databind")),
    ("jackson-core", Coordinate::new("com.fasterxml.jackson.core", "jackson-core")),
    (
        "jackson-annotations",
        Coordinate::new("com.fasterxml.jackson.core", "jackson-annotations"),
    ),
];

static REGISTRY: LazyLock<FxHashMap<&'static str, Coordinate>> =
    LazyLock::new(|| ENTRIES.iter().copied().collect());

/// A name that implies companion specs at its own version.
struct ExpansionRule {
    trigger: &'static str,
    implies: &'static [&'static str],
}

const EXPANSION_RULES: &[ExpansionRule] = &[ExpansionRule {
    trigger: "jackson",
    implies: &["jackson-core", "jackson-annotations"],
}];

/// Returns the coordinate registered for `name`.
#[must_use]
pub fn lookup(name: &str) -> Option<Coordinate> {
    REGISTRY.get(name).copied()
}

/// Returns every registered name, in registration order.
pub fn known_names() -> impl Iterator<Item = &'static str> {
    ENTRIES.iter().map(|(name, _)| *name)
}

/// Expands declared dependencies with their implicit companions.
///
/// Rules are applied once against the declared set: a companion that was
/// declared explicitly keeps its declared version, and implied specs never
/// trigger further rules. The result is ordered by name.
#[must_use]
pub fn expand(declared: &BTreeMap<String, String>) -> Vec<DependencySpec> {
    let mut expanded = declared.clone();

    for rule in EXPANSION_RULES {
        let Some(version) = declared.get(rule.trigger) else {
            continue;
        };
        for companion in rule.implies {
            if !declared.contains_key(*companion) {
                tracing::debug!(
                    trigger = rule.trigger,
                    companion = *companion,
                    version = %version,
                    "Adding implied dependency"
                );
                expanded.insert((*companion).to_owned(), version.clone());
            }
        }
    }

    expanded
        .into_iter()
        .map(|(name, version)| DependencySpec::new(name, version))
        .collect()
}
