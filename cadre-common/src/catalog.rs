// cadre-common/src/catalog.rs
// Version catalog: dotted aliases to module coordinates, shared versions
// table, and ordered bundles. The file format itself is parsed elsewhere;
// this consumes the already-parsed data.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{CadreError, Result};
use super::model::dependency::{Dependency, ModuleDependency, ModuleId};
use super::model::version::VersionConstraint;

/// How a catalog entry selects its version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionSelector {
    /// A literal version.
    Exact(String),
    /// Indirection into the shared versions table.
    Ref {
        #[serde(rename = "ref")]
        reference: String,
    },
    /// A strict range, optionally with a preferred pick inside it. The
    /// range is the effective constraint; `prefer` is only a hint.
    Range {
        strictly: String,
        #[serde(default)]
        prefer: Option<String>,
    },
}

/// A registered alias target. Identical inputs produce identical entries
/// whether they arrive from parsed catalog data or the builder calls, so
/// the catalog's origin is not observable downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub group: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<VersionSelector>,
}

/// Already-parsed catalog data, as handed over by the front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub versions: HashMap<String, String>,
    #[serde(default)]
    pub libraries: HashMap<String, CatalogEntry>,
    #[serde(default)]
    pub bundles: HashMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
struct CatalogState {
    versions: HashMap<String, String>,
    entries: HashMap<String, CatalogEntry>,
    bundles: HashMap<String, Vec<String>>,
}

/// A shared handle over the catalog contents. Cheap to clone; deferred
/// lookups hold a handle so catalogs may keep being assembled until the
/// first resolution that needs a given alias.
#[derive(Debug, Clone, Default)]
pub struct VersionCatalog {
    inner: Arc<Mutex<CatalogState>>,
}

/// Alias segments may be joined by `.`, `-` or `_` in the DSL; the key
/// space is flat, keyed by the fully joined canonical path. Prefixes are
/// siblings of longer aliases, never parents.
fn canonical_path(path: &str) -> String {
    path.replace(['-', '_'], ".")
}

impl VersionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: CatalogData) -> Self {
        let catalog = Self::new();
        {
            let mut state = catalog.inner.lock().unwrap();
            for (key, version) in data.versions {
                state.versions.insert(key, version);
            }
            for (alias, entry) in data.libraries {
                state.entries.insert(canonical_path(&alias), entry);
            }
            for (alias, members) in data.bundles {
                state.bundles.insert(canonical_path(&alias), members);
            }
        }
        catalog
    }

    /// Register a shared version, usable via `VersionSelector::Ref`.
    pub fn set_version(&self, key: impl Into<String>, version: impl Into<String>) {
        self.inner
            .lock()
            .unwrap()
            .versions
            .insert(key.into(), version.into());
    }

    /// Register an alias programmatically. Produces the same entry the
    /// file-based path would for the same inputs.
    pub fn register_alias(
        &self,
        alias: &str,
        group: impl Into<String>,
        name: impl Into<String>,
        version: Option<VersionSelector>,
    ) {
        let entry = CatalogEntry {
            group: group.into(),
            name: name.into(),
            version,
        };
        debug!("Registering catalog alias '{}' -> {}:{}", alias, entry.group, entry.name);
        self.inner
            .lock()
            .unwrap()
            .entries
            .insert(canonical_path(alias), entry);
    }

    /// Register a bundle: an ordered list of member aliases expanded as a
    /// unit. Members are looked up lazily, at bundle resolution time.
    pub fn register_bundle(&self, alias: &str, members: Vec<String>) {
        debug!(
            "Registering catalog bundle '{}' with {} members",
            alias,
            members.len()
        );
        self.inner
            .lock()
            .unwrap()
            .bundles
            .insert(canonical_path(alias), members);
    }

    pub fn has_alias(&self, path: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .entries
            .contains_key(&canonical_path(path))
    }

    pub fn has_bundle(&self, path: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .bundles
            .contains_key(&canonical_path(path))
    }

    /// Resolve a single alias to its module dependency. Exact match on the
    /// canonical path only; no prefix fallback.
    pub fn resolve_alias(&self, path: &str) -> Result<Dependency> {
        self.resolve_with_context(path, "requested directly")
    }

    fn resolve_with_context(&self, path: &str, context: &str) -> Result<Dependency> {
        let key = canonical_path(path);
        let state = self.inner.lock().unwrap();
        let entry = state.entries.get(&key).ok_or_else(|| {
            debug!("Catalog alias '{}' not found ({})", path, context);
            CadreError::MissingAlias {
                alias: path.to_string(),
                context: context.to_string(),
            }
        })?;
        entry_to_dependency(&state, path, entry)
    }

    /// Resolve a bundle alias to its members' dependencies, preserving the
    /// bundle's declared order. A member naming a missing alias is a hard
    /// error; nothing is silently dropped.
    pub fn resolve_bundle(&self, path: &str) -> Result<Vec<Dependency>> {
        let key = canonical_path(path);
        let members = {
            let state = self.inner.lock().unwrap();
            state
                .bundles
                .get(&key)
                .cloned()
                .ok_or_else(|| CadreError::MissingAlias {
                    alias: path.to_string(),
                    context: "requested as a bundle".to_string(),
                })?
        };
        let context = format!("member of bundle '{path}'");
        members
            .iter()
            .map(|member| self.resolve_with_context(member, &context))
            .collect()
    }
}

fn entry_to_dependency(
    state: &CatalogState,
    alias: &str,
    entry: &CatalogEntry,
) -> Result<Dependency> {
    let constraint = match &entry.version {
        None => None,
        Some(VersionSelector::Exact(v)) => Some(VersionConstraint::required(v.clone())),
        Some(VersionSelector::Ref { reference }) => {
            let version = state.versions.get(reference).ok_or_else(|| {
                CadreError::MissingAlias {
                    alias: format!("versions.{reference}"),
                    context: format!("version reference of alias '{alias}'"),
                }
            })?;
            Some(VersionConstraint::required(version.clone()))
        }
        Some(VersionSelector::Range { strictly, prefer }) => Some(VersionConstraint::strictly(
            strictly.clone(),
            prefer.clone(),
        )),
    };
    Ok(Dependency::Module(ModuleDependency::new(
        ModuleId::new(entry.group.clone(), entry.name.clone()),
        constraint,
    )))
}
