pub mod dependency;
pub mod kind;
pub mod version;

pub use dependency::{
    Dependency, ExcludeRule, FileSetDependency, FileSpec, ModuleDependency, ModuleId,
    PlatformDependency, PlatformTarget, ProjectDependency,
};
pub use kind::{BucketRole, ClasspathKind, ClasspathScope};
pub use version::{compare_lenient, VersionConstraint};
