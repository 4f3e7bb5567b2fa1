use std::cmp::Ordering;
use std::fmt;

use semver::Version;
use serde::{Deserialize, Serialize};

/// The version side of a module dependency, as handed to the external
/// resolver.
///
/// `Required` is an ordinary "this version, unless something else wins"
/// declaration. `Strictly` carries a range the resolver must not leave;
/// `prefer` is only a hint for picking within the range when nothing else
/// constrains the choice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionConstraint {
    Required(String),
    Strictly {
        range: String,
        prefer: Option<String>,
    },
}

impl VersionConstraint {
    pub fn required(version: impl Into<String>) -> Self {
        Self::Required(version.into())
    }

    pub fn strictly(range: impl Into<String>, prefer: Option<String>) -> Self {
        Self::Strictly {
            range: range.into(),
            prefer,
        }
    }

    /// The version text used when ordering two constraints against each
    /// other (conflict policy). For a strict range the preferred version is
    /// the best stand-in we have; absent that, the range text itself.
    pub fn ordering_key(&self) -> &str {
        match self {
            Self::Required(v) => v,
            Self::Strictly {
                prefer: Some(p), ..
            } => p,
            Self::Strictly { range, .. } => range,
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strictly { .. })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required(v) => write!(f, "{v}"),
            Self::Strictly {
                range,
                prefer: Some(p),
            } => write!(f, "strictly {range} prefer {p}"),
            Self::Strictly {
                range,
                prefer: None,
            } => write!(f, "strictly {range}"),
        }
    }
}

/// Compare two version strings, leniently.
///
/// Versions that are plain dotted numerics are padded out to three
/// components and compared as semantic versions, so "3.11" orders above
/// "3.9". Anything that still fails to parse falls back to lexicographic
/// comparison.
pub fn compare_lenient(a: &str, b: &str) -> Ordering {
    match (parse_padded(a), parse_padded(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        _ => a.cmp(b),
    }
}

fn parse_padded(text: &str) -> Option<Version> {
    if let Ok(v) = Version::parse(text) {
        return Some(v);
    }
    // "3" and "3.11" are legal module versions but not complete semver.
    let numeric = !text.is_empty()
        && text
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
    if !numeric {
        return None;
    }
    let mut padded = text.to_string();
    for _ in text.split('.').count()..3 {
        padded.push_str(".0");
    }
    Version::parse(&padded).ok()
}
