// cadre-core/src/notation.rs
// Normalizes every supported dependency declaration shape into the
// canonical `Dependency` value. Providers stay deferred; everything else
// normalizes eagerly at declaration time without triggering resolution.
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use cadre_common::catalog::VersionCatalog;
use cadre_common::error::{CadreError, Result};
use cadre_common::model::dependency::{
    Dependency, FileSetDependency, ModuleDependency, ModuleId,
};
use cadre_common::model::version::VersionConstraint;

/// A non-`String` textual value. `render` must return the full textual
/// content losslessly, whatever the implementation's internal buffering
/// looks like (ropes, chunked builders, interned slices).
pub trait TextValue: Send + Sync {
    fn render(&self) -> String;
}

impl TextValue for String {
    fn render(&self) -> String {
        self.clone()
    }
}

impl TextValue for &'static str {
    fn render(&self) -> String {
        (*self).to_string()
    }
}

impl TextValue for Arc<str> {
    fn render(&self) -> String {
        self.as_ref().to_string()
    }
}

impl TextValue for Cow<'static, str> {
    fn render(&self) -> String {
        self.as_ref().to_string()
    }
}

/// A deferred producer of a declaration shape. Invoked at most once per
/// bucket entry, strictly after the owning suite's configuration closes.
pub type NotationProvider = Arc<dyn Fn() -> Result<DependencyNotation> + Send + Sync>;

/// A `group`/`name`/`version` mapping, the map-literal declaration shape.
/// `group` and `name` are required at normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GavMap {
    pub group: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
}

/// The input side of dependency declaration: every shape a build file may
/// hand the engine.
#[derive(Clone)]
pub enum DependencyNotation {
    /// `"group:name"` or `"group:name:version"`.
    Gav(String),
    /// `group:`/`name:`/`version:` mapping.
    Map(GavMap),
    /// A project path such as `:lib`.
    Project(String),
    /// An already-constructed dependency; normalization is the identity.
    Direct(Dependency),
    /// A non-string textual value, coerced to text then parsed as a GAV.
    Text(Arc<dyn TextValue>),
    /// A flat file collection.
    Files(Vec<PathBuf>),
    /// A file tree with include/exclude patterns, expanded at resolution
    /// time only.
    FileTree {
        root: PathBuf,
        includes: Vec<String>,
        excludes: Vec<String>,
    },
    /// A lazily-evaluated provider of any of the above.
    Provider(NotationProvider),
}

impl fmt::Debug for DependencyNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gav(s) => f.debug_tuple("Gav").field(s).finish(),
            Self::Map(m) => f.debug_tuple("Map").field(m).finish(),
            Self::Project(p) => f.debug_tuple("Project").field(p).finish(),
            Self::Direct(d) => f.debug_tuple("Direct").field(d).finish(),
            Self::Text(_) => write!(f, "Text(..)"),
            Self::Files(paths) => f.debug_tuple("Files").field(paths).finish(),
            Self::FileTree {
                root,
                includes,
                excludes,
            } => f
                .debug_struct("FileTree")
                .field("root", root)
                .field("includes", includes)
                .field("excludes", excludes)
                .finish(),
            Self::Provider(_) => write!(f, "Provider(..)"),
        }
    }
}

impl DependencyNotation {
    pub fn gav(text: impl Into<String>) -> Self {
        Self::Gav(text.into())
    }

    pub fn project(path: impl Into<String>) -> Self {
        Self::Project(path.into())
    }

    pub fn text(value: impl TextValue + 'static) -> Self {
        Self::Text(Arc::new(value))
    }

    pub fn files(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self::Files(paths.into_iter().collect())
    }

    pub fn file_tree(
        root: impl Into<PathBuf>,
        includes: Vec<String>,
        excludes: Vec<String>,
    ) -> Self {
        Self::FileTree {
            root: root.into(),
            includes,
            excludes,
        }
    }

    pub fn provider<F>(f: F) -> Self
    where
        F: Fn() -> Result<DependencyNotation> + Send + Sync + 'static,
    {
        Self::Provider(Arc::new(f))
    }

    /// A provider that looks a catalog alias up when forced, so catalogs
    /// may keep being assembled until the first resolution that needs the
    /// alias.
    pub fn from_catalog(catalog: &VersionCatalog, alias: &str) -> Self {
        let catalog = catalog.clone();
        let alias = alias.to_string();
        Self::provider(move || catalog.resolve_alias(&alias).map(DependencyNotation::Direct))
    }
}

impl From<&str> for DependencyNotation {
    fn from(text: &str) -> Self {
        Self::Gav(text.to_string())
    }
}

impl From<String> for DependencyNotation {
    fn from(text: String) -> Self {
        Self::Gav(text)
    }
}

impl From<Dependency> for DependencyNotation {
    fn from(dep: Dependency) -> Self {
        Self::Direct(dep)
    }
}

impl From<GavMap> for DependencyNotation {
    fn from(map: GavMap) -> Self {
        Self::Map(map)
    }
}

impl From<Vec<PathBuf>> for DependencyNotation {
    fn from(paths: Vec<PathBuf>) -> Self {
        Self::Files(paths)
    }
}

/// The outcome of normalization: a canonical dependency, or a thunk for
/// provider-backed declarations whose evaluation must wait for resolution.
pub enum Normalized {
    Eager(Dependency),
    Deferred(NotationProvider),
}

impl fmt::Debug for Normalized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager(d) => f.debug_tuple("Eager").field(d).finish(),
            Self::Deferred(_) => write!(f, "Deferred(..)"),
        }
    }
}

/// Normalize one declaration shape. Total over the supported shapes;
/// anything else fails loudly rather than duck-typing its way in.
pub fn normalize(notation: DependencyNotation) -> Result<Normalized> {
    match notation {
        DependencyNotation::Provider(p) => Ok(Normalized::Deferred(p)),
        DependencyNotation::Gav(text) => parse_gav(&text).map(Normalized::Eager),
        DependencyNotation::Text(value) => parse_gav(&value.render()).map(Normalized::Eager),
        DependencyNotation::Map(map) => normalize_map(map).map(Normalized::Eager),
        DependencyNotation::Project(path) => Ok(Normalized::Eager(Dependency::project(path))),
        DependencyNotation::Direct(dep) => Ok(Normalized::Eager(dep)),
        DependencyNotation::Files(paths) => Ok(Normalized::Eager(Dependency::Files(
            FileSetDependency::from_paths(paths),
        ))),
        DependencyNotation::FileTree {
            root,
            includes,
            excludes,
        } => Ok(Normalized::Eager(Dependency::Files(
            FileSetDependency::tree(root, includes, excludes),
        ))),
    }
}

/// Strict `group:name[:version]` parsing. Any other colon count, or an
/// empty segment, is a format error.
fn parse_gav(text: &str) -> Result<Dependency> {
    let parts: Vec<&str> = text.split(':').collect();
    let (group, name, version) = match parts.as_slice() {
        [group, name] => (*group, *name, None),
        [group, name, version] => (*group, *name, Some(*version)),
        _ => {
            return Err(CadreError::ParseError(
                "dependency notation",
                format!("expected group:name[:version], got '{text}'"),
            ))
        }
    };
    if group.is_empty() || name.is_empty() || version.is_some_and(str::is_empty) {
        return Err(CadreError::ParseError(
            "dependency notation",
            format!("empty coordinate segment in '{text}'"),
        ));
    }
    Ok(Dependency::Module(ModuleDependency::new(
        ModuleId::new(group, name),
        version.map(VersionConstraint::required),
    )))
}

fn normalize_map(map: GavMap) -> Result<Dependency> {
    let (Some(group), Some(name)) = (map.group, map.name) else {
        return Err(CadreError::UnsupportedNotation(
            "GAV mapping requires both 'group' and 'name' keys".to_string(),
        ));
    };
    Ok(Dependency::Module(ModuleDependency::new(
        ModuleId::new(group, name),
        map.version.map(VersionConstraint::required),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eager(notation: DependencyNotation) -> Dependency {
        match normalize(notation).unwrap() {
            Normalized::Eager(dep) => dep,
            Normalized::Deferred(_) => panic!("expected eager normalization"),
        }
    }

    #[test]
    fn gav_strings_parse_with_and_without_version() {
        let dep = eager("org.apache.commons:commons-lang3:3.11".into());
        assert_eq!(dep.to_string(), "org.apache.commons:commons-lang3:3.11");
        let dep = eager("org.apache.commons:commons-lang3".into());
        assert_eq!(dep.to_string(), "org.apache.commons:commons-lang3");
    }

    #[test]
    fn wrong_colon_counts_are_format_errors() {
        for bad in ["commons-lang3", "a:b:c:d", "a::1.0", ":b:1.0", "a:b:"] {
            let err = normalize(bad.into()).unwrap_err();
            assert!(
                matches!(err, CadreError::ParseError(..)),
                "'{bad}' should be a parse error, got {err:?}"
            );
        }
    }

    #[test]
    fn maps_require_group_and_name() {
        let full = eager(
            GavMap {
                group: Some("org.apache.commons".into()),
                name: Some("commons-lang3".into()),
                version: Some("3.11".into()),
            }
            .into(),
        );
        assert_eq!(full.to_string(), "org.apache.commons:commons-lang3:3.11");

        let missing = normalize(
            GavMap {
                group: Some("org.apache.commons".into()),
                ..GavMap::default()
            }
            .into(),
        );
        assert!(matches!(
            missing,
            Err(CadreError::UnsupportedNotation(_))
        ));
    }

    /// A textual value stored in chunks, standing in for rope-like string
    /// builders. Rendering must be lossless across chunk boundaries.
    struct Chunked(Vec<&'static str>);

    impl TextValue for Chunked {
        fn render(&self) -> String {
            self.0.concat()
        }
    }

    #[test]
    fn text_values_coerce_losslessly_then_parse() {
        let dep = eager(DependencyNotation::text(Chunked(vec![
            "org.apache.commons:",
            "commons-",
            "lang3:3.11",
        ])));
        assert_eq!(dep.to_string(), "org.apache.commons:commons-lang3:3.11");
    }

    #[test]
    fn direct_dependencies_pass_through_unchanged() {
        let dep = Dependency::enforced_platform("org.springframework", "spring-bom", "5.3.0");
        assert_eq!(eager(dep.clone().into()), dep);
    }

    #[test]
    fn providers_stay_deferred_and_uninvoked() {
        let normalized = normalize(DependencyNotation::provider(|| {
            panic!("provider must not run during declaration")
        }))
        .unwrap();
        assert!(matches!(normalized, Normalized::Deferred(_)));
    }

    #[test]
    fn file_collections_keep_declaration_order() {
        let dep = eager(DependencyNotation::files(vec![
            PathBuf::from("libs/b.jar"),
            PathBuf::from("libs/a.jar"),
            PathBuf::from("libs/b.jar"),
        ]));
        match dep {
            Dependency::Files(f) => assert_eq!(f.specs.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
