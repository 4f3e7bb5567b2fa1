// cadre-core/src/compose.rs
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use cadre_common::error::{CadreError, Result};
use cadre_common::model::dependency::{
    Dependency, ModuleId, PlatformDependency, PlatformTarget,
};
use cadre_common::model::kind::{BucketRole, ClasspathKind};
use cadre_common::model::version::{compare_lenient, VersionConstraint};
use cadre_common::settings::ConflictMode;
use tracing::debug;

use crate::bucket::DependencyBucket;
use crate::files;
use crate::graph::{BucketGraph, BucketId, BucketOwner};
use crate::resolve::{
    ModuleRequest, ModuleResolver, RequestKind, ResolutionRequest,
};
use crate::suite::SuiteRegistry;

/// One effective dependency and the bucket it came from. Kept next to the
/// resolved files so a failing or surprising classpath can be traced back
/// to its declaration site.
#[derive(Debug, Clone)]
pub struct Contribution {
    pub bucket: BucketId,
    pub dependency: Dependency,
}

#[derive(Debug, Clone)]
pub struct ClasspathReport {
    pub suite: String,
    pub kind: RequestKind,
    pub contributions: Vec<Contribution>,
}

/// The ordered file sequence of one (suite, kind) domain, plus its
/// provenance report. Computed at most once per domain and shared.
#[derive(Debug)]
pub struct ResolvedClasspath {
    files: Vec<PathBuf>,
    report: ClasspathReport,
}

impl ResolvedClasspath {
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    pub fn contains(&self, path: &std::path::Path) -> bool {
        self.files.iter().any(|f| f == path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn report(&self) -> &ClasspathReport {
        &self.report
    }
}

type DomainSlot = Arc<OnceLock<Result<Arc<ResolvedClasspath>>>>;

/// Composes classpaths per (suite, kind) domain.
///
/// Each domain resolves independently: no version reconciliation ever
/// happens across suites, and one domain's failure leaves every other
/// domain untouched. A domain's result — success or failure — is computed
/// under an at-most-once guard, so concurrent callers observe exactly one
/// resolver invocation.
pub struct ClasspathComposer {
    registry: Arc<SuiteRegistry>,
    resolver: Arc<dyn ModuleResolver>,
    domains: Mutex<HashMap<(String, RequestKind), DomainSlot>>,
}

impl ClasspathComposer {
    pub fn new(registry: Arc<SuiteRegistry>, resolver: Arc<dyn ModuleResolver>) -> Self {
        Self {
            registry,
            resolver,
            domains: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<SuiteRegistry> {
        &self.registry
    }

    /// The compile or runtime classpath of a suite. First use closes the
    /// suite's configuration; repeated calls return the cached result.
    pub fn classpath(&self, suite: &str, kind: ClasspathKind) -> Result<Arc<ResolvedClasspath>> {
        self.domain(suite, kind.into())
    }

    /// The annotation-processor path of a suite: a separate single-purpose
    /// resolution consumed by the compiler invocation, never part of
    /// either classpath.
    pub fn annotation_processor_path(&self, suite: &str) -> Result<Arc<ResolvedClasspath>> {
        self.domain(suite, RequestKind::AnnotationProcessor)
    }

    fn domain(&self, suite: &str, kind: RequestKind) -> Result<Arc<ResolvedClasspath>> {
        let slot = {
            let mut domains = self.domains.lock().unwrap();
            Arc::clone(
                domains
                    .entry((suite.to_string(), kind))
                    .or_default(),
            )
        };
        slot.get_or_init(|| self.compute(suite, kind)).clone()
    }

    fn compute(&self, suite_name: &str, kind: RequestKind) -> Result<Arc<ResolvedClasspath>> {
        let suite = self.registry.suite(suite_name)?;
        // Closure point: the suite's configuration phase ends at its first
        // composition, whichever domain triggers it.
        suite.close_all_buckets();

        let graph = BucketGraph::for_registry(&self.registry);
        graph.validate()?;

        let bucket_ids = match kind {
            RequestKind::Compile => graph.buckets_for(suite_name, ClasspathKind::Compile)?,
            RequestKind::Runtime => graph.buckets_for(suite_name, ClasspathKind::Runtime)?,
            RequestKind::AnnotationProcessor => {
                vec![BucketId::suite(suite_name, BucketRole::AnnotationProcessor)]
            }
        };

        // Force entries exactly once, bucket merge order then declaration
        // order. Forcing is memoized per entry, so a second domain that
        // shares an entry reuses the already-forced value.
        let mut contributions = Vec::new();
        for id in &bucket_ids {
            let bucket = self.bucket(id)?;
            bucket.close();
            for entry in bucket.entries() {
                for dependency in entry.effective()? {
                    contributions.push(Contribution {
                        bucket: id.clone(),
                        dependency,
                    });
                }
            }
        }
        debug!(
            "Domain ({}, {}) collected {} contributions from {} buckets",
            suite_name,
            kind,
            contributions.len(),
            bucket_ids.len()
        );

        // Partition: file-contributing vs direct-file vs constraint-only.
        let mut modules = Vec::new();
        let mut projects: Vec<String> = Vec::new();
        let mut platforms: Vec<PlatformDependency> = Vec::new();
        let mut file_specs = Vec::new();
        for contribution in &contributions {
            match &contribution.dependency {
                Dependency::Module(m) => modules.push(ModuleRequest {
                    id: m.id.clone(),
                    version: m.version.clone(),
                    excludes: m.excludes.clone(),
                }),
                Dependency::Project(p) => {
                    if !projects.contains(&p.path) {
                        projects.push(p.path.clone());
                    }
                }
                Dependency::Files(f) => file_specs.extend(f.specs.iter().cloned()),
                Dependency::Platform(p) => platforms.push(p.clone()),
            }
        }

        let conflict_mode = self.registry.settings().conflict_mode;
        let modules = merge_module_requests(modules, &platforms, conflict_mode).map_err(
            |reason| CadreError::Resolution {
                suite: suite_name.to_string(),
                kind: kind.to_string(),
                reason,
            },
        )?;

        let request = ResolutionRequest {
            suite: suite_name.to_string(),
            kind,
            modules,
            projects,
            platforms,
        };
        debug!(
            "Dispatching resolution request for ({}, {}): {} modules, {} projects, {} platform hints",
            suite_name,
            kind,
            request.modules.len(),
            request.projects.len(),
            request.platforms.len()
        );
        let resolved =
            self.resolver
                .resolve(&request)
                .map_err(|e| CadreError::Resolution {
                    suite: suite_name.to_string(),
                    kind: kind.to_string(),
                    reason: e.to_string(),
                })?;

        // Resolver files first in graph order, then direct files in
        // declaration order; first occurrence keeps its position.
        let direct = files::expand_file_specs(&file_specs)?;
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for file in resolved.files.into_iter().chain(direct) {
            if seen.insert(file.clone()) {
                ordered.push(file);
            }
        }
        debug!(
            "Domain ({}, {}) resolved to {} files",
            suite_name,
            kind,
            ordered.len()
        );

        Ok(Arc::new(ResolvedClasspath {
            files: ordered,
            report: ClasspathReport {
                suite: suite_name.to_string(),
                kind,
                contributions,
            },
        }))
    }

    fn bucket(&self, id: &BucketId) -> Result<Arc<DependencyBucket>> {
        match &id.owner {
            BucketOwner::Production => Ok(self.registry.production_bucket(id.role)),
            BucketOwner::Suite(name) => Ok(self.registry.suite(name)?.bucket(id.role)),
        }
    }
}

/// Collapse duplicate direct declarations of one module into a single
/// request, applying the intra-domain conflict policy. Returns the merge
/// failure reason on a version disagreement in `Fail` mode.
fn merge_module_requests(
    requests: Vec<ModuleRequest>,
    platforms: &[PlatformDependency],
    mode: ConflictMode,
) -> std::result::Result<Vec<ModuleRequest>, String> {
    let enforced: HashMap<ModuleId, String> = platforms
        .iter()
        .filter(|p| p.enforced)
        .filter_map(|p| match &p.target {
            PlatformTarget::Module {
                id,
                version: Some(version),
            } => Some((id.clone(), version.clone())),
            _ => None,
        })
        .collect();

    let mut order = Vec::new();
    let mut merged: HashMap<ModuleId, ModuleRequest> = HashMap::new();
    for request in requests {
        match merged.get_mut(&request.id) {
            None => {
                order.push(request.id.clone());
                merged.insert(request.id.clone(), request);
            }
            Some(existing) => {
                // Excludes are edge-scoped: a second declaration without a
                // rule re-opens the path it would have cut, so only rules
                // shared by every declaration survive the merge.
                existing.excludes = existing
                    .excludes
                    .intersection(&request.excludes)
                    .cloned()
                    .collect();
                let settled = enforced.contains_key(&existing.id);
                existing.version = merge_versions(
                    &existing.id,
                    existing.version.take(),
                    request.version,
                    settled,
                    mode,
                )?;
            }
        }
    }

    // An enforced platform pins its target version unconditionally for
    // this domain, whatever was declared.
    for (id, version) in &enforced {
        if let Some(request) = merged.get_mut(id) {
            debug!("Enforced platform pins '{}' to {}", id, version);
            request.version = Some(VersionConstraint::strictly(version.clone(), None));
        }
    }

    Ok(order
        .into_iter()
        .map(|id| merged.remove(&id).expect("merged entry for ordered id"))
        .collect())
}

fn merge_versions(
    id: &ModuleId,
    left: Option<VersionConstraint>,
    right: Option<VersionConstraint>,
    settled_by_platform: bool,
    mode: ConflictMode,
) -> std::result::Result<Option<VersionConstraint>, String> {
    match (left, right) {
        (None, other) | (other, None) => Ok(other),
        (Some(a), Some(b)) if a == b => Ok(Some(a)),
        (Some(a), Some(b)) => {
            let highest = if compare_lenient(a.ordering_key(), b.ordering_key())
                == Ordering::Less
            {
                b.clone()
            } else {
                a.clone()
            };
            if settled_by_platform || mode == ConflictMode::HighestWins {
                debug!("Version conflict on '{}': {} vs {} -> {}", id, a, b, highest);
                Ok(Some(highest))
            } else {
                Err(format!(
                    "conflicting versions declared for '{id}': {a} vs {b}"
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use cadre_common::model::dependency::ExcludeRule;

    use super::*;

    fn request(group: &str, name: &str, version: Option<&str>) -> ModuleRequest {
        ModuleRequest {
            id: ModuleId::new(group, name),
            version: version.map(VersionConstraint::required),
            excludes: BTreeSet::new(),
        }
    }

    #[test]
    fn duplicate_declarations_merge_to_the_highest_version() {
        let merged = merge_module_requests(
            vec![
                request("org.example", "lib", Some("1.2")),
                request("org.example", "lib", Some("1.10")),
            ],
            &[],
            ConflictMode::HighestWins,
        )
        .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0].version,
            Some(VersionConstraint::required("1.10"))
        );
    }

    #[test]
    fn fail_mode_rejects_disagreements() {
        let err = merge_module_requests(
            vec![
                request("org.example", "lib", Some("1.2")),
                request("org.example", "lib", Some("1.10")),
            ],
            &[],
            ConflictMode::Fail,
        )
        .unwrap_err();
        assert!(err.contains("org.example:lib"));
    }

    #[test]
    fn unversioned_declarations_defer_to_versioned_ones() {
        let merged = merge_module_requests(
            vec![
                request("org.example", "lib", None),
                request("org.example", "lib", Some("2.0")),
            ],
            &[],
            ConflictMode::Fail,
        )
        .unwrap();
        assert_eq!(merged[0].version, Some(VersionConstraint::required("2.0")));
    }

    #[test]
    fn enforced_platforms_pin_versions_even_in_fail_mode() {
        let platform = PlatformDependency {
            target: PlatformTarget::Module {
                id: ModuleId::new("org.example", "lib"),
                version: Some("1.5".into()),
            },
            enforced: true,
        };
        let merged = merge_module_requests(
            vec![
                request("org.example", "lib", Some("1.2")),
                request("org.example", "lib", Some("1.10")),
            ],
            std::slice::from_ref(&platform),
            ConflictMode::Fail,
        )
        .unwrap();
        assert_eq!(
            merged[0].version,
            Some(VersionConstraint::strictly("1.5", None))
        );
    }

    #[test]
    fn non_enforced_platforms_stay_hints() {
        let platform = PlatformDependency {
            target: PlatformTarget::Module {
                id: ModuleId::new("org.example", "lib"),
                version: Some("1.5".into()),
            },
            enforced: false,
        };
        let merged = merge_module_requests(
            vec![request("org.example", "lib", Some("1.2"))],
            std::slice::from_ref(&platform),
            ConflictMode::HighestWins,
        )
        .unwrap();
        assert_eq!(merged[0].version, Some(VersionConstraint::required("1.2")));
    }

    #[test]
    fn only_shared_excludes_survive_a_merge() {
        let mut first = request("org.example", "lib", Some("1.0"));
        first
            .excludes
            .insert(ExcludeRule::new("commons-collections", "commons-collections"));
        let second = request("org.example", "lib", Some("1.0"));
        let merged =
            merge_module_requests(vec![first, second], &[], ConflictMode::HighestWins).unwrap();
        assert!(merged[0].excludes.is_empty());
    }

    #[test]
    fn distinct_modules_keep_declaration_order() {
        let merged = merge_module_requests(
            vec![
                request("org.example", "b", Some("1.0")),
                request("org.example", "a", Some("1.0")),
            ],
            &[],
            ConflictMode::HighestWins,
        )
        .unwrap();
        let names: Vec<_> = merged.iter().map(|m| m.id.name.clone()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
