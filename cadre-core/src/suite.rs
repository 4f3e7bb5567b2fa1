// cadre-core/src/suite.rs
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use cadre_common::catalog::VersionCatalog;
use cadre_common::error::{CadreError, Result};
use cadre_common::model::kind::BucketRole;
use cadre_common::settings::Settings;
use tracing::debug;

use crate::bucket::{DependencyBucket, MutationAction};
use crate::notation::DependencyNotation;

/// The production source set's owner label. Not a suite; only the default
/// suite's implementation bucket ever extends into it.
pub const PRODUCTION_SOURCE_SET: &str = "main";

/// A grouping of sources. The engine only needs the name and the
/// conventional directories; compilation itself lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
    pub name: String,
    pub src_dirs: Vec<PathBuf>,
}

impl SourceSet {
    pub fn conventional(name: &str) -> Self {
        Self {
            name: name.to_string(),
            src_dirs: vec![
                PathBuf::from(format!("src/{name}/java")),
                PathBuf::from(format!("src/{name}/resources")),
            ],
        }
    }
}

/// Whether a suite sees production code implicitly.
///
/// Exactly one suite — the default one — is `Leaking`; every other suite
/// is `Isolated` and only ever sees production code through an explicit
/// project dependency it declares itself. There is no implicit transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductionLink {
    Leaking,
    Isolated,
}

/// The four role buckets one owner (a suite or the production source set)
/// declares into.
pub struct BucketSet {
    implementation: Arc<DependencyBucket>,
    compile_only: Arc<DependencyBucket>,
    runtime_only: Arc<DependencyBucket>,
    annotation_processor: Arc<DependencyBucket>,
}

impl BucketSet {
    fn new(owner: &str) -> Self {
        Self {
            implementation: Arc::new(DependencyBucket::new(owner, BucketRole::Implementation)),
            compile_only: Arc::new(DependencyBucket::new(owner, BucketRole::CompileOnly)),
            runtime_only: Arc::new(DependencyBucket::new(owner, BucketRole::RuntimeOnly)),
            annotation_processor: Arc::new(DependencyBucket::new(
                owner,
                BucketRole::AnnotationProcessor,
            )),
        }
    }

    pub fn bucket(&self, role: BucketRole) -> Arc<DependencyBucket> {
        match role {
            BucketRole::Implementation => Arc::clone(&self.implementation),
            BucketRole::CompileOnly => Arc::clone(&self.compile_only),
            BucketRole::RuntimeOnly => Arc::clone(&self.runtime_only),
            BucketRole::AnnotationProcessor => Arc::clone(&self.annotation_processor),
        }
    }

    fn close_all(&self) {
        for role in BucketRole::ALL {
            self.bucket(role).close();
        }
    }
}

/// A named grouping of test sources with its own dependency buckets and
/// derived classpaths.
pub struct TestSuite {
    name: String,
    source_set: SourceSet,
    buckets: BucketSet,
    production_link: ProductionLink,
}

impl TestSuite {
    fn new(name: &str, production_link: ProductionLink) -> Self {
        Self {
            name: name.to_string(),
            source_set: SourceSet::conventional(name),
            buckets: BucketSet::new(name),
            production_link,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_set(&self) -> &SourceSet {
        &self.source_set
    }

    pub fn production_link(&self) -> ProductionLink {
        self.production_link
    }

    pub fn bucket(&self, role: BucketRole) -> Arc<DependencyBucket> {
        self.buckets.bucket(role)
    }

    pub(crate) fn close_all_buckets(&self) {
        self.buckets.close_all();
    }

    /// A suite is closed once its buckets no longer accept declarations;
    /// the buckets all close together.
    pub fn is_closed(&self) -> bool {
        self.bucket(BucketRole::Implementation).is_closed()
    }
}

/// Registry of test suites and the production source set's buckets.
///
/// The default suite is registered at construction; additional suites are
/// registered explicitly and start isolated from production.
pub struct SuiteRegistry {
    settings: Settings,
    production: BucketSet,
    suites: Mutex<Vec<Arc<TestSuite>>>,
}

impl SuiteRegistry {
    pub fn new(settings: Settings) -> Self {
        let default_suite = Arc::new(TestSuite::new(
            &settings.default_suite,
            ProductionLink::Leaking,
        ));
        debug!(
            "Suite registry created with default suite '{}'",
            default_suite.name()
        );
        Self {
            settings,
            production: BucketSet::new(PRODUCTION_SOURCE_SET),
            suites: Mutex::new(vec![default_suite]),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Register a custom suite. Custom suites start `Isolated`: nothing of
    /// production leaks in unless the suite declares a project dependency
    /// on it explicitly.
    pub fn register_suite(&self, name: &str) -> Result<Arc<TestSuite>> {
        if name == PRODUCTION_SOURCE_SET {
            return Err(CadreError::Config(format!(
                "suite name '{PRODUCTION_SOURCE_SET}' is reserved for the production source set"
            )));
        }
        let mut suites = self.suites.lock().unwrap();
        if suites.iter().any(|s| s.name() == name) {
            return Err(CadreError::DuplicateSuiteName(name.to_string()));
        }
        let link = if name == self.settings.default_suite {
            ProductionLink::Leaking
        } else {
            ProductionLink::Isolated
        };
        let suite = Arc::new(TestSuite::new(name, link));
        debug!("Registered suite '{}' ({:?})", name, link);
        suites.push(Arc::clone(&suite));
        Ok(suite)
    }

    pub fn suite(&self, name: &str) -> Result<Arc<TestSuite>> {
        self.suites
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.name() == name)
            .cloned()
            .ok_or_else(|| CadreError::UnknownSuite(name.to_string()))
    }

    /// Registered suites, in registration order.
    pub fn suites(&self) -> Vec<Arc<TestSuite>> {
        self.suites.lock().unwrap().clone()
    }

    pub fn default_suite(&self) -> Arc<TestSuite> {
        self.suite(&self.settings.default_suite)
            .expect("default suite is registered at construction")
    }

    pub fn production_bucket(&self, role: BucketRole) -> Arc<DependencyBucket> {
        self.production.bucket(role)
    }

    /// Declare one entry into a suite's bucket.
    pub fn declare(
        &self,
        suite: &str,
        role: BucketRole,
        notation: impl Into<DependencyNotation>,
        mutation: Option<MutationAction>,
    ) -> Result<()> {
        self.suite(suite)?.bucket(role).add(notation, mutation)
    }

    /// Declare a catalog bundle into a suite's bucket.
    pub fn declare_bundle(
        &self,
        suite: &str,
        role: BucketRole,
        catalog: &VersionCatalog,
        alias: &str,
        mutation: Option<MutationAction>,
    ) -> Result<()> {
        self.suite(suite)?
            .bucket(role)
            .add_bundle(catalog, alias, mutation)
    }

    /// Declare one entry into the production source set's bucket.
    pub fn declare_production(
        &self,
        role: BucketRole,
        notation: impl Into<DependencyNotation>,
        mutation: Option<MutationAction>,
    ) -> Result<()> {
        self.production.bucket(role).add(notation, mutation)
    }

    /// Irreversibly close a suite's configuration ahead of first use.
    pub fn close_configuration(&self, suite: &str) -> Result<()> {
        self.suite(suite)?.close_all_buckets();
        Ok(())
    }
}
