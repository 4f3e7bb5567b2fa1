// cadre-core/src/files.rs
use std::collections::HashSet;
use std::path::PathBuf;

use cadre_common::error::{CadreError, Result};
use cadre_common::model::dependency::FileSpec;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Expand direct-file contributions at resolution time.
///
/// Plain paths pass through as declared; trees are walked now — not at
/// declaration — because directory contents may have changed in between.
/// The result keeps declaration order, deduplicated with the first
/// occurrence retaining its position.
pub fn expand_file_specs(specs: &[FileSpec]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();
    for spec in specs {
        match spec {
            FileSpec::Path(path) => push_unique(path.clone(), &mut files, &mut seen),
            FileSpec::Tree {
                root,
                includes,
                excludes,
            } => {
                if !root.is_dir() {
                    debug!(
                        "File tree root '{}' does not exist; contributing nothing",
                        root.display()
                    );
                    continue;
                }
                let include_set = build_globset(includes)?;
                let exclude_set = build_globset(excludes)?;
                for entry in WalkDir::new(root).sort_by_file_name() {
                    let entry = match entry {
                        Ok(entry) => entry,
                        Err(e) => {
                            warn!(
                                "Skipping unreadable entry under '{}': {}. Continuing.",
                                root.display(),
                                e
                            );
                            continue;
                        }
                    };
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
                    if let Some(include) = &include_set {
                        if !include.is_match(relative) {
                            continue;
                        }
                    }
                    if let Some(exclude) = &exclude_set {
                        if exclude.is_match(relative) {
                            continue;
                        }
                    }
                    push_unique(entry.into_path(), &mut files, &mut seen);
                }
            }
        }
    }
    Ok(files)
}

fn push_unique(path: PathBuf, files: &mut Vec<PathBuf>, seen: &mut HashSet<PathBuf>) {
    if seen.insert(path.clone()) {
        files.push(path);
    }
}

/// An empty pattern list means "match everything", so `None` here.
fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            CadreError::Config(format!("invalid file pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| CadreError::Config(format!("invalid file pattern set: {e}")))
}
