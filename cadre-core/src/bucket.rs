// cadre-core/src/bucket.rs
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use cadre_common::catalog::VersionCatalog;
use cadre_common::error::{CadreError, Result};
use cadre_common::model::dependency::Dependency;
use cadre_common::model::kind::BucketRole;
use tracing::debug;

use crate::notation::{normalize, DependencyNotation, Normalized};
use crate::provider::DeferredDependency;

/// A per-entry refinement applied exactly once, immediately before the
/// entry first participates in a resolution request. Mutations are pure
/// with respect to the entry: they shape the effective dependency value
/// and nothing else.
pub type MutationAction = Arc<dyn Fn(&mut Dependency) + Send + Sync>;

enum EntrySource {
    Eager(Dependency),
    Deferred(DeferredDependency),
    Bundle {
        catalog: VersionCatalog,
        alias: String,
    },
}

/// One declared entry. Most expand to exactly one dependency; a bundle
/// entry expands to the bundle's members in their declared order.
pub struct BucketEntry {
    source: EntrySource,
    mutation: Option<MutationAction>,
    effective: OnceLock<Result<Vec<Dependency>>>,
}

impl BucketEntry {
    /// The effective dependencies this entry contributes. Providers are
    /// forced and bundles expanded at most once; the mutation action is
    /// applied once, to the result, and the outcome memoized across every
    /// domain that references the entry.
    pub fn effective(&self) -> Result<Vec<Dependency>> {
        self.effective.get_or_init(|| self.compute()).clone()
    }

    fn compute(&self) -> Result<Vec<Dependency>> {
        let mut deps = match &self.source {
            EntrySource::Eager(dep) => vec![dep.clone()],
            EntrySource::Deferred(thunk) => vec![thunk.force()?],
            EntrySource::Bundle { catalog, alias } => catalog.resolve_bundle(alias)?,
        };
        if let Some(mutation) = &self.mutation {
            for dep in &mut deps {
                mutation(dep);
            }
        }
        Ok(deps)
    }

    /// The declared value, for introspection without forcing. `None` while
    /// the entry's value is still deferred.
    pub fn declared(&self) -> Option<&Dependency> {
        match &self.source {
            EntrySource::Eager(dep) => Some(dep),
            _ => None,
        }
    }
}

impl fmt::Debug for BucketEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            EntrySource::Eager(dep) => write!(f, "BucketEntry({dep})"),
            EntrySource::Deferred(thunk) => write!(f, "BucketEntry({thunk:?})"),
            EntrySource::Bundle { alias, .. } => write!(f, "BucketEntry(bundle '{alias}')"),
        }
    }
}

struct BucketState {
    entries: Vec<Arc<BucketEntry>>,
    closed: bool,
}

/// An append-only collection of dependency declarations with a single
/// role, owned by one suite (or the production source set). Entries keep
/// declaration order; nothing is ever removed or reordered. Once the
/// owner's configuration closes, further declarations fail.
pub struct DependencyBucket {
    owner: String,
    role: BucketRole,
    state: Mutex<BucketState>,
}

impl DependencyBucket {
    pub(crate) fn new(owner: impl Into<String>, role: BucketRole) -> Self {
        Self {
            owner: owner.into(),
            role,
            state: Mutex::new(BucketState {
                entries: Vec::new(),
                closed: false,
            }),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn role(&self) -> BucketRole {
        self.role
    }

    /// Append one declaration. Normalization happens here, eagerly, for
    /// every shape except providers; a declaration that fails to normalize
    /// never enters the bucket.
    pub fn add(
        &self,
        notation: impl Into<DependencyNotation>,
        mutation: Option<MutationAction>,
    ) -> Result<()> {
        let notation = notation.into();
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(self.closed_error(format!("{notation:?}")));
        }
        let source = match normalize(notation)? {
            Normalized::Eager(dep) => EntrySource::Eager(dep),
            Normalized::Deferred(provider) => {
                EntrySource::Deferred(DeferredDependency::new(provider))
            }
        };
        state.entries.push(Arc::new(BucketEntry {
            source,
            mutation,
            effective: OnceLock::new(),
        }));
        debug!(
            "Added entry #{} to {} bucket of '{}'",
            state.entries.len(),
            self.role,
            self.owner
        );
        Ok(())
    }

    /// Append a catalog bundle. The members are looked up when the entry
    /// is first forced, so a missing member surfaces at the first
    /// resolution that needs it.
    pub fn add_bundle(
        &self,
        catalog: &VersionCatalog,
        alias: &str,
        mutation: Option<MutationAction>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(self.closed_error(format!("bundle '{alias}'")));
        }
        state.entries.push(Arc::new(BucketEntry {
            source: EntrySource::Bundle {
                catalog: catalog.clone(),
                alias: alias.to_string(),
            },
            mutation,
            effective: OnceLock::new(),
        }));
        debug!(
            "Added bundle '{}' to {} bucket of '{}'",
            alias, self.role, self.owner
        );
        Ok(())
    }

    pub(crate) fn close(&self) {
        let mut state = self.state.lock().unwrap();
        if !state.closed {
            state.closed = true;
            debug!(
                "Closed {} bucket of '{}' with {} entries",
                self.role,
                self.owner,
                state.entries.len()
            );
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// Snapshot of the entries in declaration order.
    pub fn entries(&self) -> Vec<Arc<BucketEntry>> {
        self.state.lock().unwrap().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn closed_error(&self, entry: String) -> CadreError {
        CadreError::ClosedBucket {
            owner: self.owner.clone(),
            role: self.role.to_string(),
            entry,
        }
    }
}

impl fmt::Debug for DependencyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DependencyBucket({} of '{}', {} entries)",
            self.role,
            self.owner,
            self.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn entries_keep_declaration_order() {
        let bucket = DependencyBucket::new("test", BucketRole::Implementation);
        bucket.add("org.example:a:1.0", None).unwrap();
        bucket.add("org.example:b:1.0", None).unwrap();
        let declared: Vec<_> = bucket
            .entries()
            .iter()
            .map(|e| e.declared().unwrap().to_string())
            .collect();
        assert_eq!(declared, vec!["org.example:a:1.0", "org.example:b:1.0"]);
    }

    #[test]
    fn bad_notation_never_enters_the_bucket() {
        let bucket = DependencyBucket::new("test", BucketRole::Implementation);
        assert!(bucket.add("only-one-segment", None).is_err());
        assert!(bucket.is_empty());
    }

    #[test]
    fn closed_buckets_reject_declarations() {
        let bucket = DependencyBucket::new("test", BucketRole::RuntimeOnly);
        bucket.add("org.example:a:1.0", None).unwrap();
        bucket.close();
        let err = bucket.add("org.example:b:1.0", None).unwrap_err();
        assert!(matches!(
            err,
            CadreError::ClosedBucket { owner, role, .. }
                if owner == "test" && role == "runtimeOnly"
        ));
        assert_eq!(bucket.len(), 1);
    }

    #[test]
    fn mutation_actions_run_once_per_entry() {
        let applications = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&applications);
        let mutation: MutationAction = Arc::new(move |dep| {
            counter.fetch_add(1, Ordering::SeqCst);
            dep.exclude("commons-collections", "commons-collections");
        });

        let bucket = DependencyBucket::new("test", BucketRole::Implementation);
        bucket
            .add("commons-beanutils:commons-beanutils:1.9.4", Some(mutation))
            .unwrap();
        let entry = &bucket.entries()[0];
        let first = entry.effective().unwrap();
        let second = entry.effective().unwrap();
        assert_eq!(first, second);
        assert_eq!(applications.load(Ordering::SeqCst), 1);
        match &first[0] {
            Dependency::Module(m) => assert_eq!(m.excludes.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bundle_members_surface_at_force_time() {
        let catalog = VersionCatalog::new();
        let bucket = DependencyBucket::new("test", BucketRole::Implementation);
        // Declaring against a still-empty catalog is fine.
        bucket.add_bundle(&catalog, "groovy", None).unwrap();
        let entry = &bucket.entries()[0];
        assert!(entry.effective().is_err());
    }
}
