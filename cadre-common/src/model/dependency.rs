use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::version::VersionConstraint;

/// A module coordinate without its version: `group:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
    pub group: String,
    pub name: String,
}

impl ModuleId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// An edge-scoped exclusion: applies to the transitive subgraph of the one
/// dependency that carries it, never to siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExcludeRule {
    pub group: String,
    pub name: String,
}

impl ExcludeRule {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ExcludeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDependency {
    pub id: ModuleId,
    #[serde(default)]
    pub version: Option<VersionConstraint>,
    #[serde(default)]
    pub excludes: BTreeSet<ExcludeRule>,
}

impl ModuleDependency {
    pub fn new(id: ModuleId, version: Option<VersionConstraint>) -> Self {
        Self {
            id,
            version,
            excludes: BTreeSet::new(),
        }
    }

    pub fn exclude(&mut self, group: impl Into<String>, name: impl Into<String>) {
        self.excludes.insert(ExcludeRule::new(group, name));
    }
}

impl fmt::Display for ModuleDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{v}", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// A reference to another project in the build, by its project path.
/// Existence of the target is not validated here; the external resolver
/// does that when the graph is actually resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectDependency {
    pub path: String,
}

impl ProjectDependency {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// One element of a file-set dependency. Trees keep their include/exclude
/// patterns unexpanded: directory contents may change between declaration
/// and resolution, so expansion happens at resolution time only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileSpec {
    Path(PathBuf),
    Tree {
        root: PathBuf,
        includes: Vec<String>,
        excludes: Vec<String>,
    },
}

/// Files contributed directly to a classpath, without transitive
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSetDependency {
    pub specs: Vec<FileSpec>,
}

impl FileSetDependency {
    /// Paths are kept in declaration order, deduplicated.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut seen = BTreeSet::new();
        let specs = paths
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .map(FileSpec::Path)
            .collect();
        Self { specs }
    }

    pub fn tree(root: PathBuf, includes: Vec<String>, excludes: Vec<String>) -> Self {
        Self {
            specs: vec![FileSpec::Tree {
                root,
                includes,
                excludes,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformTarget {
    Module { id: ModuleId, version: Option<String> },
    Project { path: String },
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module {
                id,
                version: Some(v),
            } => write!(f, "{id}:{v}"),
            Self::Module { id, version: None } => write!(f, "{id}"),
            Self::Project { path } => write!(f, "project {path}"),
        }
    }
}

/// A constraint-only contribution: aligns versions in the resolution it
/// participates in but never contributes files itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformDependency {
    pub target: PlatformTarget,
    pub enforced: bool,
}

/// The canonical dependency value every supported declaration shape
/// normalizes into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dependency {
    Module(ModuleDependency),
    Project(ProjectDependency),
    Files(FileSetDependency),
    Platform(PlatformDependency),
}

impl Dependency {
    pub fn module(
        group: impl Into<String>,
        name: impl Into<String>,
        version: Option<&str>,
    ) -> Self {
        Self::Module(ModuleDependency::new(
            ModuleId::new(group, name),
            version.map(VersionConstraint::required),
        ))
    }

    pub fn project(path: impl Into<String>) -> Self {
        Self::Project(ProjectDependency::new(path))
    }

    pub fn files(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self::Files(FileSetDependency::from_paths(paths))
    }

    pub fn platform(group: impl Into<String>, name: impl Into<String>, version: &str) -> Self {
        Self::Platform(PlatformDependency {
            target: PlatformTarget::Module {
                id: ModuleId::new(group, name),
                version: Some(version.to_string()),
            },
            enforced: false,
        })
    }

    pub fn enforced_platform(
        group: impl Into<String>,
        name: impl Into<String>,
        version: &str,
    ) -> Self {
        Self::Platform(PlatformDependency {
            target: PlatformTarget::Module {
                id: ModuleId::new(group, name),
                version: Some(version.to_string()),
            },
            enforced: true,
        })
    }

    /// Refinement hook used by mutation actions. Excludes only make sense
    /// on module dependencies; on the other variants this is a no-op.
    pub fn exclude(&mut self, group: impl Into<String>, name: impl Into<String>) {
        if let Self::Module(m) = self {
            m.exclude(group, name);
        }
    }

    /// Short description for error context and logging.
    pub fn describe(&self) -> String {
        match self {
            Self::Module(m) => m.to_string(),
            Self::Project(p) => format!("project {}", p.path),
            Self::Files(f) => format!("file set ({} specs)", f.specs.len()),
            Self::Platform(p) => {
                if p.enforced {
                    format!("enforced platform {}", p.target)
                } else {
                    format!("platform {}", p.target)
                }
            }
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
