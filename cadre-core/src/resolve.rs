// cadre-core/src/resolve.rs
// The boundary to the external module-graph resolver. The engine shapes
// requests and interprets responses; metadata fetching, repository I/O and
// caching all live on the far side of `ModuleResolver`.
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use cadre_common::error::Result;
use cadre_common::model::dependency::{ExcludeRule, ModuleId, PlatformDependency};
use cadre_common::model::kind::ClasspathKind;
use cadre_common::model::version::VersionConstraint;

/// The resolution domains a suite owns: its two classpath kinds plus the
/// single-purpose annotation-processor path consumed by the compiler
/// invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Compile,
    Runtime,
    AnnotationProcessor,
}

impl From<ClasspathKind> for RequestKind {
    fn from(kind: ClasspathKind) -> Self {
        match kind {
            ClasspathKind::Compile => Self::Compile,
            ClasspathKind::Runtime => Self::Runtime,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile => write!(f, "compile"),
            Self::Runtime => write!(f, "runtime"),
            Self::AnnotationProcessor => write!(f, "annotationProcessor"),
        }
    }
}

/// One module coordinate of a resolution request, with its effective
/// version constraint and the edge-scoped excludes that apply to its own
/// transitive subgraph only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    pub id: ModuleId,
    pub version: Option<VersionConstraint>,
    pub excludes: BTreeSet<ExcludeRule>,
}

/// Everything the external resolver needs for one (suite, kind) domain.
/// Project references are passed through unvalidated; whether the target
/// project exists is the resolver's question.
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
    pub suite: String,
    pub kind: RequestKind,
    pub modules: Vec<ModuleRequest>,
    pub projects: Vec<String>,
    pub platforms: Vec<PlatformDependency>,
}

/// The resolver's answer: files in dependency-graph order.
#[derive(Debug, Clone, Default)]
pub struct ResolvedModuleGraph {
    pub files: Vec<PathBuf>,
}

/// External collaborator. Implementations carry their own conflict policy
/// for transitive version disagreements, their own retry/timeout behavior,
/// and everything repository-shaped.
pub trait ModuleResolver: Send + Sync {
    fn resolve(&self, request: &ResolutionRequest) -> Result<ResolvedModuleGraph>;
}
